mod users;

pub use users::UserCommands;

use clap::{Parser, Subcommand};

/// fintrack-server - Personal Finance Tracking API
#[derive(Parser)]
#[command(name = "fintrack-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the server (default)
    Serve,

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),
}
