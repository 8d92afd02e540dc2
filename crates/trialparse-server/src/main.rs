//! trialparse Server binary
//!
//! Starts the HTTP server for batch eligibility parsing.

use std::env;
use std::process;
use trialparse_server::{config::ServerConfig, start_server, ServerError};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let args: Vec<String> = env::args().collect();

    let config = if args.len() > 2 && args[1] == "--config" {
        ServerConfig::from_file(&args[2])?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        eprintln!("Warning: No config file specified, using default test configuration");
        eprintln!("Usage: trialparse-server --config <path-to-config.toml>");
        eprintln!();
        ServerConfig::default_test_config()
    };

    start_server(config).await
}

fn print_help() {
    println!("trialparse server - clinical-trial eligibility parsing over HTTP");
    println!();
    println!("USAGE:");
    println!("    trialparse-server --config <path-to-config.toml>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("ROUTES:");
    println!("    POST /parse         JSON array of rows -> JSON array of relations");
    println!("    POST /parse/report  JSON array of rows -> batch report with metrics");
    println!("    GET  /health        Dictionary status");
    println!();
    println!("CONFIGURATION:");
    println!("    The TOML config file should contain:");
    println!("    - bind_address, bind_port: where to listen");
    println!("    - [resources] variable_file, unit_file: dictionary files");
    println!("    - [engine] kind = \"command\" | \"http\" plus program or endpoint");
    println!("    - [pipeline] error_policy, max_concurrency, batch_timeout_secs (optional)");
    println!();
}
