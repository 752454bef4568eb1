//! Application services layer.

pub mod error;
pub mod reasons;
pub mod render;
