use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::identity::{CredentialUpdate, Rotation};

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
            if let Some(Value::Object(fields)) = data {
                for (key, value) in fields {
                    match value {
                        Value::String(s) => println!("  {}: {}", key, s),
                        Value::Null => println!("  {}: -", key),
                        other => println!("  {}: {}", key, other),
                    }
                }
            }
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Describe credential updates without echoing token values
pub fn describe_rotation(rotation: &Rotation) -> Value {
    let updates: Vec<Value> = rotation
        .updates()
        .iter()
        .map(|update| match update {
            CredentialUpdate::Set(cookie) => json!({ "cookie": cookie.name(), "action": "set" }),
            CredentialUpdate::Unset(cookie) => json!({ "cookie": cookie.name(), "action": "unset" }),
        })
        .collect();
    Value::Array(updates)
}
