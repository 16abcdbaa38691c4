//! Streamgate - media query resolution and range-proxy cache
//!
//! This library crate exposes the core functionality for integration testing.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod resolver;
pub mod selector;
pub mod server;
