use clap::Subcommand;
use serde_json::json;

use crate::cli::config::*;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Set the API server URL")]
    Set {
        #[arg(help = "Server URL, e.g. http://localhost:5000")]
        url: String,
    },

    #[command(about = "Show the configured server")]
    Show,

    #[command(about = "Health check the configured server")]
    Ping,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Set { url } => {
            let url = normalize_server_url(&url)?;
            save_server_config(&ServerConfig::new(url.clone()))?;

            output_success(
                output_format,
                &format!("Server set to {}", url),
                Some(json!({ "url": url })),
            )
        }
        ServerCommands::Show => {
            let config = load_server_config()?;
            output_record(output_format, &serde_json::to_value(&config)?)
        }
        ServerCommands::Ping => {
            let mut config = load_server_config()?;
            let status = ping_server(&config.url).await;
            config.update_ping(status);
            save_server_config(&config)?;

            match status {
                ServerStatus::Up => output_success(
                    output_format,
                    &format!("{} is up", config.url),
                    Some(json!({ "url": config.url, "status": status })),
                ),
                _ => anyhow::bail!("{} is not responding", config.url),
            }
        }
    }
}
