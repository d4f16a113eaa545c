//! Data fetching, caching and RSS glue for a Strapi-backed, server-rendered blog.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
