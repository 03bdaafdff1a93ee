//! Command-line interface.
//!
//! - `dev`: build, serve and rebuild on every change with live reload
//! - `build`: build once and check the route table
//! - `serve`: build once and serve without watching

mod tests;

use crate::config::ConfigOverrides;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "atoll",
    version,
    about = "Server-rendered pages with hydrated islands"
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Debug logging for every atoll crate (same as ATOLL_DEBUG=true)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file, relative to the project root (default: atoll.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the development server with watch mode and live reload
    Dev(DevArgs),

    /// Build server and client output once
    Build(BuildArgs),

    /// Build once and serve the result
    Serve(ServeArgs),
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Project root
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Source root holding pages/ (default: app)
    #[arg(long, value_name = "DIR")]
    pub src: Option<PathBuf>,

    /// Build output root (default: .atoll)
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DevArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// App server port (falls back to the next free port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Live-reload server port
    #[arg(long)]
    pub live_port: Option<u16>,

    #[arg(long)]
    pub host: Option<String>,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[arg(short, long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub host: Option<String>,
}

impl Cli {
    pub fn project(&self) -> &ProjectArgs {
        match &self.command {
            Command::Dev(args) => &args.project,
            Command::Build(args) => &args.project,
            Command::Serve(args) => &args.project,
        }
    }

    /// Command-line values as the top config layer
    pub fn overrides(&self) -> ConfigOverrides {
        let project = self.project();
        let (port, live_port, host) = match &self.command {
            Command::Dev(args) => (args.port, args.live_port, args.host.clone()),
            Command::Serve(args) => (args.port, None, args.host.clone()),
            Command::Build(_) => (None, None, None),
        };
        ConfigOverrides {
            src_dir: project.src.clone(),
            out_dir: project.out_dir.clone(),
            host,
            port,
            live_port,
            debug: self.debug.then_some(true),
        }
    }
}
