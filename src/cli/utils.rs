use std::io::{self, BufRead, Write};

use serde_json::{json, Map, Value};

use super::config::Session;
use super::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let Some(data_value) = data {
                response["data"] = data_value;
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print a single object: pretty JSON, or `key: value` lines for text.
pub fn output_record(output_format: OutputFormat, record: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
        OutputFormat::Text => match record.as_object() {
            Some(fields) => {
                let width = fields.keys().map(String::len).max().unwrap_or(0);
                for (key, value) in fields {
                    println!("{:<width$}  {}", key, cell(value), width = width);
                }
            }
            None => println!("{}", cell(record)),
        },
    }
    Ok(())
}

/// Print an array of objects as a table with the given `(header, field)` columns.
pub fn output_table(
    output_format: OutputFormat,
    collection_name: &str,
    rows: &Value,
    columns: &[(&str, &str)],
) -> anyhow::Result<()> {
    let empty = Vec::new();
    let rows = rows.as_array().unwrap_or(&empty);

    if rows.is_empty() {
        return output_empty_collection(output_format, collection_name, &format!("No {} found", collection_name));
    }

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: rows }))?);
        }
        OutputFormat::Text => {
            let cells: Vec<Vec<String>> = rows
                .iter()
                .map(|row| columns.iter().map(|(_, field)| cell(&row[*field])).collect())
                .collect();
            let widths: Vec<usize> = columns
                .iter()
                .enumerate()
                .map(|(i, (header, _))| cells.iter().map(|r| r[i].len()).chain([header.len()]).max().unwrap_or(0))
                .collect();

            let header: Vec<String> = columns
                .iter()
                .zip(&widths)
                .map(|((h, _), w)| format!("{:<w$}", h.to_uppercase(), w = *w))
                .collect();
            println!("{}", header.join("  "));
            println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));

            for row in cells {
                let line: Vec<String> = row.iter().zip(&widths).map(|(c, w)| format!("{:<w$}", c, w = *w)).collect();
                println!("{}", line.join("  ").trim_end());
            }
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: [] }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Refuse locally before sending a request only admins may make.
pub fn require_admin(session: &Session, what: &str) -> anyhow::Result<()> {
    if session.is_admin() {
        Ok(())
    } else {
        anyhow::bail!(
            "Only admins can {}; you are logged in as '{}' with role '{}'",
            what,
            session.username,
            session.role
        )
    }
}

/// Use the given password or read one line from stdin.
pub fn resolve_password(provided: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = provided {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }
    Ok(password)
}

/// JSON object holding only the fields that were given.
pub fn json_body(pairs: Vec<(&str, Option<Value>)>) -> Value {
    let map: Map<String, Value> = pairs
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect();
    Value::Object(map)
}

/// Query string from optional integer filters, e.g. `?owner_id=3`.
pub fn query_string(params: &[(&str, Option<i64>)]) -> String {
    let pairs: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| value.map(|v| format!("{}={}", key, v)))
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}
