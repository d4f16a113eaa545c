//! Infrastructure adapters and runtime bootstrap.

pub mod assets;
pub mod error;
pub mod http;
pub mod local;
pub mod records;
pub mod strapi;
pub mod telemetry;
