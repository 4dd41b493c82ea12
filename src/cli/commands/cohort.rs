use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum CohortCommands {
    #[command(about = "List cohorts")]
    List,

    #[command(about = "Show one cohort")]
    Show { id: i64 },

    #[command(about = "Create a cohort (admin)")]
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },

    #[command(about = "Update a cohort (admin)")]
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, help = "New description; empty string clears it")]
        description: Option<String>,
    },

    #[command(about = "Delete a cohort with its classes and their projects (admin)")]
    Delete { id: i64 },

    #[command(about = "List the classes of a cohort")]
    Classes { id: i64 },
}

pub async fn handle(cmd: CohortCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let (client, session) = ApiClient::authenticated()?;

    match cmd {
        CohortCommands::List => {
            let cohorts = client.get("/api/cohorts").await?;
            output_table(
                output_format,
                "cohorts",
                &cohorts,
                &[("id", "id"), ("name", "name"), ("description", "description")],
            )
        }
        CohortCommands::Show { id } => {
            let cohort = client.get(&format!("/api/cohorts/{}", id)).await?;
            output_record(output_format, &cohort)
        }
        CohortCommands::Create { name, description } => {
            require_admin(&session, "create cohorts")?;
            let cohort = client
                .post("/api/cohorts", &json!({ "name": name, "description": description }))
                .await?;
            output_success(output_format, &format!("Cohort '{}' created", name), Some(cohort))
        }
        CohortCommands::Update { id, name, description } => {
            require_admin(&session, "update cohorts")?;
            let changes = json_body(vec![
                ("name", name.map(Value::from)),
                ("description", description.map(Value::from)),
            ]);
            let cohort = client.patch(&format!("/api/cohorts/{}", id), &changes).await?;
            output_success(output_format, &format!("Cohort {} updated", id), Some(cohort))
        }
        CohortCommands::Delete { id } => {
            require_admin(&session, "delete cohorts")?;
            let result = client.delete(&format!("/api/cohorts/{}", id)).await?;
            output_success(output_format, &format!("Cohort {} deleted", id), Some(result))
        }
        CohortCommands::Classes { id } => {
            let classes = client.get(&format!("/api/cohorts/{}/classes", id)).await?;
            output_table(
                output_format,
                "classes",
                &classes,
                &[("id", "id"), ("name", "name"), ("description", "description")],
            )
        }
    }
}
