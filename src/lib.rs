//! Calorie Flash Library
//!
//! Photo-based meal nutrition estimates with per-ingredient weight correction.

pub mod build_info;
pub mod config;
pub mod inference;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod session;
pub mod tools;
