//! JSON envelopes printed on stdout. Logs go to stderr.

use std::process::ExitCode;

use domains::AppError;
use serde::Serialize;
use serde_json::json;

pub fn success<T: Serialize>(data: &T, message: Option<&str>) -> anyhow::Result<ExitCode> {
    let mut body = json!({ "success": true, "data": data });
    if let Some(message) = message {
        body["message"] = json!(message);
    }
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(ExitCode::SUCCESS)
}

fn failure_body(err: &AppError) -> serde_json::Value {
    json!({ "success": false, "error": { "message": err.client_message() } })
}

/// Client-correctable errors exit with 1, server-side failures with 2.
pub fn failure(err: &AppError) -> anyhow::Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(&failure_body(err))?);
    if err.is_client_error() {
        tracing::debug!(error = %err, "request rejected");
        Ok(ExitCode::from(1))
    } else {
        tracing::error!(error = %err, "operation failed");
        Ok(ExitCode::from(2))
    }
}

/// Prints whichever envelope fits `result`.
pub fn render<T: Serialize>(result: domains::Result<T>, message: &str) -> anyhow::Result<ExitCode> {
    match result {
        Ok(data) => success(&data, Some(message)),
        Err(err) => failure(&err),
    }
}
