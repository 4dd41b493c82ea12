use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum MemberCommands {
    #[command(about = "Add a user to a project you own")]
    Add { project_id: i64, user_id: i64 },

    #[command(about = "Remove a membership by its id")]
    Remove { id: i64 },

    #[command(about = "List memberships")]
    List {
        #[arg(long, help = "Only memberships of this project id")]
        project: Option<i64>,
        #[arg(long, help = "Only memberships of this user id")]
        user: Option<i64>,
    },
}

pub async fn handle(cmd: MemberCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let (client, _) = ApiClient::authenticated()?;

    match cmd {
        MemberCommands::Add { project_id, user_id } => {
            let member = client
                .post("/api/project_members", &json!({ "project_id": project_id, "user_id": user_id }))
                .await?;
            output_success(
                output_format,
                &format!("User {} added to project {}", user_id, project_id),
                Some(member),
            )
        }
        MemberCommands::Remove { id } => {
            client.delete(&format!("/api/project_members/{}", id)).await?;
            output_success(output_format, &format!("Membership {} removed", id), None)
        }
        MemberCommands::List { project, user } => {
            let path = format!(
                "/api/project_members{}",
                query_string(&[("project_id", project), ("user_id", user)])
            );
            let members = client.get(&path).await?;
            output_table(
                output_format,
                "members",
                &members,
                &[("id", "id"), ("project", "project_id"), ("user", "user_id")],
            )
        }
    }
}
