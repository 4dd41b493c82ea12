use clap::{Args, Subcommand};
use serde_json::{Map, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

const COLUMNS: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("owner", "owner_id"),
    ("class", "class_id"),
    ("github", "github_link"),
];

#[derive(Args)]
pub struct ProjectFields {
    #[arg(long, help = "GitHub repository URL")]
    pub github_link: Option<String>,
    #[arg(long, help = "Live deployment URL")]
    pub deployed_link: Option<String>,
    #[arg(long, help = "Poster image URL")]
    pub poster_url: Option<String>,
    #[arg(long, help = "Class the project belongs to")]
    pub class_id: Option<i64>,
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    #[command(about = "List projects")]
    List {
        #[arg(long, help = "Only projects owned by this user id")]
        owner: Option<i64>,
        #[arg(long, help = "Only projects in this class id")]
        class: Option<i64>,
    },

    #[command(about = "Show one project")]
    Show {
        id: i64,
    },

    #[command(about = "Create a project owned by you (admins may pass --owner-id)")]
    Create {
        name: String,
        description: String,
        #[command(flatten)]
        fields: ProjectFields,
        #[arg(long, help = "Owner user id (admin only)")]
        owner_id: Option<i64>,
    },

    #[command(about = "Update a project you own; pass an empty string to clear a link")]
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        fields: ProjectFields,
    },

    #[command(about = "Delete a project with its memberships and cohort assignments")]
    Delete {
        id: i64,
    },

    #[command(about = "List the members of a project")]
    Members {
        id: i64,
    },
}

fn field_pairs(fields: ProjectFields) -> Vec<(&'static str, Option<Value>)> {
    vec![
        ("github_link", fields.github_link.map(Value::from)),
        ("deployed_link", fields.deployed_link.map(Value::from)),
        ("poster_url", fields.poster_url.map(Value::from)),
        ("class_id", fields.class_id.map(Value::from)),
    ]
}

pub async fn handle(cmd: ProjectCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let (client, session) = ApiClient::authenticated()?;

    match cmd {
        ProjectCommands::List { owner, class } => {
            let path = format!(
                "/api/projects{}",
                query_string(&[("owner_id", owner), ("class_id", class)])
            );
            let projects = client.get(&path).await?;
            output_table(output_format, "projects", &projects, COLUMNS)
        }
        ProjectCommands::Show { id } => {
            let project = client.get(&format!("/api/projects/{}", id)).await?;
            output_record(output_format, &project)
        }
        ProjectCommands::Create { name, description, fields, owner_id } => {
            if owner_id.is_some_and(|owner| owner != session.user_id) {
                require_admin(&session, "create projects for other users")?;
            }

            let mut pairs = vec![
                ("name", Some(Value::from(name))),
                ("description", Some(Value::from(description))),
                ("owner_id", owner_id.map(Value::from)),
            ];
            pairs.extend(field_pairs(fields));

            let project = client.post("/api/projects", &json_body(pairs)).await?;
            output_success(
                output_format,
                &format!("Project {} created", project["id"]),
                Some(project),
            )
        }
        ProjectCommands::Update { id, name, description, fields } => {
            let mut pairs = vec![
                ("name", name.map(Value::from)),
                ("description", description.map(Value::from)),
            ];
            pairs.extend(field_pairs(fields));
            let changes = json_body(pairs);
            if changes.as_object().is_some_and(Map::is_empty) {
                anyhow::bail!("Nothing to update; pass at least one field");
            }

            let project = client.patch(&format!("/api/projects/{}", id), &changes).await?;
            output_success(output_format, &format!("Project {} updated", id), Some(project))
        }
        ProjectCommands::Delete { id } => {
            let result = client.delete(&format!("/api/projects/{}", id)).await?;
            output_success(output_format, &format!("Project {} deleted", id), Some(result))
        }
        ProjectCommands::Members { id } => {
            let members = client.get(&format!("/api/projects/{}/members", id)).await?;
            output_table(
                output_format,
                "members",
                &members,
                &[("id", "id"), ("username", "username"), ("email", "email"), ("role", "role")],
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_given_fields_are_sent() {
        let fields = ProjectFields {
            github_link: Some(String::new()),
            deployed_link: None,
            poster_url: None,
            class_id: Some(3),
        };
        let mut pairs = vec![("name", Some(Value::from("Tracker"))), ("description", None)];
        pairs.extend(field_pairs(fields));

        assert_eq!(
            json_body(pairs),
            json!({ "name": "Tracker", "github_link": "", "class_id": 3 })
        );
    }
}
