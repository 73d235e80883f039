//! CLI for the gateway binary

pub mod serve;

use clap::{Parser, Subcommand};

/// Nexus AI Gateway - OpenAI-compatible gateway for LLM and retrieval backends
#[derive(Parser)]
#[command(name = "nexus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the gateway server
    Serve(serve::ServeArgs),
}
