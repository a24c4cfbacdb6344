//! Containers and scenarios exercising [`freepool`] from the outside.

pub mod containers;
