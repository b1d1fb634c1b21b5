use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::gate::{GatePaths, PathClass};

/// Classification label for `path`; `ungated` means the route filter skips it
pub fn classify_label(paths: &GatePaths, path: &str) -> &'static str {
    if !paths.is_gated(path) {
        return "ungated";
    }
    match paths.classify(path) {
        PathClass::Exempt => "exempt",
        PathClass::Public => "public",
        PathClass::Protected => "protected",
    }
}

pub fn handle(config: &AppConfig, path: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let paths = GatePaths::from_config(&config.gate);
    let class = classify_label(&paths, path);

    let login_redirect = match class {
        "protected" => Some(paths.login_redirect(path)),
        _ => None,
    };

    output_success(
        &output_format,
        &format!("{} is {}", path, class),
        Some(json!({
            "path": path,
            "class": class,
            "login_redirect": login_redirect,
        })),
    )
}
