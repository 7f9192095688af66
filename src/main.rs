//! Calorie Flash
//!
//! An MCP server that estimates a meal's calories and macros from photos.

use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use calflash::build_info;
use calflash::config::Config;
use calflash::inference::GeminiAnalyzer;
use calflash::mcp::CalflashService;
use calflash::session::{dictation, SessionController, SnapshotFileCamera};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("calflash=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;

    build_info::print_startup_banner(&config.model);
    eprintln!("Starting MCP server on stdio...");
    eprintln!("Camera frame path: {}", config.frame_path.display());

    let analyzer = GeminiAnalyzer::from_config(&config)?;

    let camera = SnapshotFileCamera::new(config.frame_path.clone());
    let session = SessionController::new(Box::new(camera), dictation::backend_for(config.dictation));

    let service = CalflashService::new(config.frame_path, session, Arc::new(analyzer));

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
