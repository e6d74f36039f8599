//! Built-in checker implementations.

pub(crate) mod composite;
pub(crate) mod leaf;
pub(crate) mod patterns;
