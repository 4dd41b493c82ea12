use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

const COLUMNS: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("cohort", "cohort_id"),
    ("description", "description"),
];

#[derive(Subcommand)]
pub enum ClassCommands {
    #[command(about = "List classes")]
    List {
        #[arg(long, help = "Only classes in this cohort id")]
        cohort: Option<i64>,
    },

    #[command(about = "Show one class")]
    Show { id: i64 },

    #[command(about = "Create a class in a cohort (admin)")]
    Create {
        name: String,
        cohort_id: i64,
        #[arg(long)]
        description: Option<String>,
    },

    #[command(about = "Update a class (admin)")]
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, help = "New description; empty string clears it")]
        description: Option<String>,
        #[arg(long, help = "Move the class to another cohort")]
        cohort_id: Option<i64>,
    },

    #[command(about = "Delete a class with its projects (admin)")]
    Delete { id: i64 },
}

pub async fn handle(cmd: ClassCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let (client, session) = ApiClient::authenticated()?;

    match cmd {
        ClassCommands::List { cohort } => {
            let path = format!("/api/classes{}", query_string(&[("cohort_id", cohort)]));
            let classes = client.get(&path).await?;
            output_table(output_format, "classes", &classes, COLUMNS)
        }
        ClassCommands::Show { id } => {
            let class = client.get(&format!("/api/classes/{}", id)).await?;
            output_record(output_format, &class)
        }
        ClassCommands::Create { name, cohort_id, description } => {
            require_admin(&session, "create classes")?;
            let class = client
                .post(
                    "/api/classes",
                    &json!({ "name": name, "cohort_id": cohort_id, "description": description }),
                )
                .await?;
            output_success(output_format, &format!("Class '{}' created", name), Some(class))
        }
        ClassCommands::Update { id, name, description, cohort_id } => {
            require_admin(&session, "update classes")?;
            let changes = json_body(vec![
                ("name", name.map(Value::from)),
                ("description", description.map(Value::from)),
                ("cohort_id", cohort_id.map(Value::from)),
            ]);
            let class = client.patch(&format!("/api/classes/{}", id), &changes).await?;
            output_success(output_format, &format!("Class {} updated", id), Some(class))
        }
        ClassCommands::Delete { id } => {
            require_admin(&session, "delete classes")?;
            let result = client.delete(&format!("/api/classes/{}", id)).await?;
            output_success(output_format, &format!("Class {} deleted", id), Some(result))
        }
    }
}
