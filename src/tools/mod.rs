//! Calorie Flash tools module
//!
//! Response shaping for the MCP tools.

pub mod session;
pub mod status;
