pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "dashctl")]
#[command(about = "dashctl - Inspect the textile dashboard access gate")]
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
    #[command(about = "Show how the gate classifies a request path")]
    Classify {
        #[arg(help = "Request path, e.g. /dashboard/orders")]
        path: String,
    },

    #[command(about = "Look up an account's status and role in the profile store")]
    Status {
        #[arg(help = "Subject id (UUID) of the account")]
        subject_id: Uuid,
    },

    #[command(about = "Resolve a session against the identity provider")]
    Session {
        #[arg(long, help = "Access token (JWT)")]
        access_token: Option<String>,
        #[arg(long, help = "Refresh token")]
        refresh_token: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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
    let config = crate::config::AppConfig::load()?;

    match cli.command {
        Commands::Classify { path } => commands::classify::handle(&config, &path, output_format),
        Commands::Status { subject_id } => commands::status::handle(&config, subject_id, output_format).await,
        Commands::Session {
            access_token,
            refresh_token,
        } => commands::session::handle(&config, access_token, refresh_token, output_format).await,
    }
}
