//! Gatehouse CLI - Administer and inspect the RBAC engine
//!
//! Usage:
//!   gatehouse init [dir]                         - Write an example config and seed
//!   gatehouse catalog list                       - List modules, actions, permissions
//!   gatehouse role list                          - List roles
//!   gatehouse role tree <name>                   - Show a role's access tree
//!   gatehouse role grant <name> <keys>...        - Replace a role's permissions
//!   gatehouse check --principal <id> <mod> <act> - Run the authorization gate
//!   gatehouse login --principal <id>             - Print a login response

use clap::{Parser, Subcommand};

mod commands;

use commands::{CatalogCommand, CheckCommand, GlobalArgs, InitCommand, LoginCommand, RoleCommand};

#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(about = "Gatehouse - Role-based access control engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an example config and seed
    Init(InitCommand),
    /// Manage the permission catalog
    Catalog(CatalogCommand),
    /// Manage roles and their permissions
    Role(RoleCommand),
    /// Check whether a principal may perform an action
    Check(CheckCommand),
    /// Compute a principal's login response
    Login(LoginCommand),
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init(cmd) => cmd.run(),
        Commands::Catalog(cmd) => cmd.run(&cli.global),
        Commands::Role(cmd) => cmd.run(&cli.global),
        Commands::Check(cmd) => cmd.run(&cli.global),
        Commands::Login(cmd) => cmd.run(&cli.global),
    }
}
