//! MCP protocol surface

pub mod server;

pub use server::CalflashService;
