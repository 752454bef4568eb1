//! Infrastructure adapters and runtime bootstrap.

pub mod assets;
pub mod encode;
pub mod error;
pub mod fonts;
pub mod http;
pub mod telemetry;
