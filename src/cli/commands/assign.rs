use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AssignCommands {
    #[command(about = "Assign a project you own to a cohort")]
    Add {
        project_id: i64,
        cohort_id: i64,
        #[arg(long, help = "Class within the cohort")]
        classroom_id: Option<i64>,
    },

    #[command(about = "Remove an assignment by its id")]
    Remove { id: i64 },

    #[command(about = "List project to cohort assignments")]
    List {
        #[arg(long, help = "Only assignments of this project id")]
        project: Option<i64>,
        #[arg(long, help = "Only assignments to this cohort id")]
        cohort: Option<i64>,
    },
}

pub async fn handle(cmd: AssignCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let (client, _) = ApiClient::authenticated()?;

    match cmd {
        AssignCommands::Add { project_id, cohort_id, classroom_id } => {
            let assignment = client
                .post(
                    "/api/project_cohorts",
                    &json!({ "project_id": project_id, "cohort_id": cohort_id, "classroom_id": classroom_id }),
                )
                .await?;
            output_success(
                output_format,
                &format!("Project {} assigned to cohort {}", project_id, cohort_id),
                Some(assignment),
            )
        }
        AssignCommands::Remove { id } => {
            client.delete(&format!("/api/project_cohorts/{}", id)).await?;
            output_success(output_format, &format!("Assignment {} removed", id), None)
        }
        AssignCommands::List { project, cohort } => {
            let path = format!(
                "/api/project_cohorts{}",
                query_string(&[("project_id", project), ("cohort_id", cohort)])
            );
            let assignments = client.get(&path).await?;
            output_table(
                output_format,
                "assignments",
                &assignments,
                &[
                    ("id", "id"),
                    ("project", "project_id"),
                    ("cohort", "cohort_id"),
                    ("class", "classroom_id"),
                ],
            )
        }
    }
}
