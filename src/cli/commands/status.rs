use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::profile;

pub async fn handle(config: &AppConfig, subject_id: Uuid, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = profile::from_config(config)?;

    match store.lookup_account_status(subject_id).await? {
        Some(account) => output_success(
            &output_format,
            &format!("{} is {} ({})", subject_id, account.status, account.role),
            Some(json!({
                "subject_id": subject_id,
                "status": account.status,
                "role": account.role,
                "gate_allows": account.is_active(),
            })),
        ),
        None => output_error(
            &output_format,
            &format!("No profile for {} (the gate lets such sessions through)", subject_id),
            Some("PROFILE_NOT_FOUND"),
        ),
    }
}
