pub mod client;
pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "cohort")]
#[command(about = "Cohort CLI - manage cohorts, classes and student projects")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Server URL and health")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Authentication and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Student projects")]
    Project {
        #[command(subcommand)]
        cmd: commands::project::ProjectCommands,
    },

    #[command(about = "Cohorts (admin for changes)")]
    Cohort {
        #[command(subcommand)]
        cmd: commands::cohort::CohortCommands,
    },

    #[command(about = "Classes within cohorts (admin for changes)")]
    Class {
        #[command(subcommand)]
        cmd: commands::class::ClassCommands,
    },

    #[command(about = "Project membership")]
    Member {
        #[command(subcommand)]
        cmd: commands::member::MemberCommands,
    },

    #[command(about = "Project to cohort assignments")]
    Assign {
        #[command(subcommand)]
        cmd: commands::assign::AssignCommands,
    },

    #[command(about = "User accounts")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Initialise the local database and create an admin account")]
    Seed(commands::seed::SeedArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Server { cmd } => commands::server::handle(cmd, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Project { cmd } => commands::project::handle(cmd, output_format).await,
        Commands::Cohort { cmd } => commands::cohort::handle(cmd, output_format).await,
        Commands::Class { cmd } => commands::class::handle(cmd, output_format).await,
        Commands::Member { cmd } => commands::member::handle(cmd, output_format).await,
        Commands::Assign { cmd } => commands::assign::handle(cmd, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, output_format).await,
        Commands::Seed(args) => commands::seed::handle(args, output_format).await,
    }
}
