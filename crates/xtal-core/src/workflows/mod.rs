//! High-level procedures combining the core data types into complete tasks.

pub mod map2sf;
