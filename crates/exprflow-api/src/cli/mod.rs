//! CLI command definitions for the `exprflow` binary.
//!
//! Uses clap derive macros for argument parsing. Long-running roles
//! (`serve`, `agent`) sit next to one-shot inspection commands.

pub mod agent;
pub mod expression;
pub mod serve;
pub mod user;

use clap::{Parser, Subcommand};

/// Distributed arithmetic expression evaluator.
#[derive(Parser)]
#[command(name = "exprflow", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Also export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log filter for the chosen verbosity. `RUST_LOG` overrides it.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "warn,exprflow_api=info,exprflow_core=info",
            1 => "info,exprflow_core=debug,exprflow_infra=debug,exprflow_api=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the orchestrator: REST API plus the agent RPC endpoints.
    Serve {
        /// Port to listen on (defaults to config).
        #[arg(long, short)]
        port: Option<u16>,

        /// Host to bind to (defaults to config).
        #[arg(long)]
        host: Option<String>,
    },

    /// Run a pool of workers that poll the orchestrator for tasks.
    Agent {
        /// Orchestrator base URL.
        #[arg(long, env = "ORCHESTRATOR_URL")]
        orchestrator_url: Option<String>,

        /// Number of concurrent workers.
        #[arg(long)]
        computing_power: Option<usize>,
    },

    /// Manage users and their API keys.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Compile and enqueue an expression.
    Submit {
        /// Infix expression, e.g. "2 + 3 * (4 - 1)".
        expression: String,

        /// Owning user id.
        #[arg(long)]
        user: i64,
    },

    /// List a user's expressions, newest first.
    #[command(alias = "ls")]
    List {
        /// Owning user id.
        #[arg(long)]
        user: i64,
    },

    /// Show one expression and its outstanding tasks.
    Show {
        /// Expression id.
        id: i64,

        /// Owning user id.
        #[arg(long)]
        user: i64,
    },

    /// Compile an expression without storing it and print its task graph.
    Check {
        /// Infix expression to compile.
        expression: String,
    },
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Create a user and print a new API key (shown once).
    Create {
        /// Unique user name.
        name: String,
    },
}
