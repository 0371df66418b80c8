//! HTTP request handlers.
//!
//! This module contains all the endpoint handlers for the gateway API.

pub mod config;
pub mod metrics;
pub mod tokens;
