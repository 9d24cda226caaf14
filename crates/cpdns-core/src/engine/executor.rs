//! Update execution
//!
//! Applies each planned change through an authenticated [`PanelSession`],
//! using the record table scraped once at login. Every failure here is local
//! to its record: the result is recorded and the next plan entry runs.
//! Submissions are at-most-once; nothing is retried.

use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::report::Report;
use crate::traits::PanelSession;
use crate::types::{DesiredState, RecordPlan, RecordSpec, RecordTable, UpdateResult};

/// Case-insensitive marker the panel puts in `msg` on success
pub const SUCCESS_MARKER: &str = "aggiornato";

/// Message used when the response body is not the expected JSON object
pub const INVALID_RESPONSE: &str = "invalid response";

/// Response of the mutation endpoint
#[derive(Debug, Deserialize)]
struct MutationResponse {
    #[serde(default)]
    msg: Option<Value>,
    #[serde(default)]
    recordnewid: Option<Value>,
}

/// An accepted mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub message: String,
    pub new_id: Option<String>,
}

/// Interpret a raw mutation response body
///
/// # Returns
///
/// - `Ok(Accepted)`: `msg` contains [`SUCCESS_MARKER`] (any case)
/// - `Err(Error::Validation(msg))`: well-formed object without the marker,
///   carrying the literal `msg` (or `"N/A"` when absent)
/// - `Err(Error::Parse(_))`: body is not a JSON object
pub fn interpret_response(body: &str) -> Result<Accepted> {
    let value: Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(Error::parse("mutation response is not a JSON object"));
    }
    let response: MutationResponse = serde_json::from_value(value)?;

    let message = response.msg.as_ref().map(value_text);

    match message {
        Some(msg) if msg.to_lowercase().contains(SUCCESS_MARKER) => Ok(Accepted {
            message: msg,
            new_id: response.recordnewid.as_ref().map(value_text),
        }),
        Some(msg) => Err(Error::validation(msg)),
        None => Err(Error::validation("N/A")),
    }
}

/// Apply every plan entry in order
///
/// A plan entry whose name is missing from `table` fails with "not found"
/// and no request is sent for it.
pub async fn apply_plan(
    plan: &[RecordPlan],
    table: &RecordTable,
    desired: &DesiredState,
    panel: &mut dyn PanelSession,
    report: &mut Report,
) -> Vec<UpdateResult> {
    let mut results = Vec::with_capacity(plan.len());

    for entry in plan {
        let result = apply_one(&entry.record, table, desired, panel, report).await;
        results.push(result);
    }

    results
}

async fn apply_one(
    record: &RecordSpec,
    table: &RecordTable,
    desired: &DesiredState,
    panel: &mut dyn PanelSession,
    report: &mut Report,
) -> UpdateResult {
    let Some(row) = table.find(&record.name) else {
        warn!("Record {} not found in panel table", record);
        report.warn(format!("Record {} not found on the panel page", record));
        return failure(record, None, Error::not_found(record.name.clone()));
    };

    report.info(format!(
        "Updating {} (ID: {}, old value: {})",
        record,
        row.id,
        row.current_value.as_deref().unwrap_or("N/A")
    ));
    info!(
        "Submitting update for {} (id {}) -> {}",
        record, row.id, desired.ip
    );

    let body = match panel
        .submit_update(&row.id, &desired.ip, row.current_value.as_deref())
        .await
    {
        Ok(body) => body,
        Err(e) => {
            error!(kind = e.kind(), "Update request for {} failed: {}", record, e);
            report.error(format!("Update request for {} failed: {}", record, e));
            return failure(record, Some(&row.id), e);
        }
    };

    match interpret_response(&body) {
        Ok(accepted) => {
            let new_id = accepted.new_id.as_deref().unwrap_or("N/A");
            info!("Record {} updated, new id {}", record, new_id);
            report.ok(format!("{} updated successfully.", record));
            report.info(format!("New ID: {}", new_id));

            UpdateResult {
                record: record.clone(),
                id: Some(row.id.clone()),
                success: true,
                new_id: accepted.new_id,
                message: accepted.message,
            }
        }
        Err(e @ Error::Parse(_)) => {
            warn!(kind = e.kind(), "Unparseable update response for {}: {}", record, e);
            report.warn(format!("Invalid response for {}", record));
            failure(record, Some(&row.id), e)
        }
        Err(e) => {
            let kind = e.kind();
            let result = failure(record, Some(&row.id), e);
            warn!(kind, "Update rejected for {}: {}", record, result.message);
            report.error(format!(
                "Update failed for {}. Message: {}",
                record, result.message
            ));
            result
        }
    }
}

fn failure(record: &RecordSpec, id: Option<&str>, error: Error) -> UpdateResult {
    let message = match error {
        Error::Validation(msg) => msg,
        Error::Parse(_) => INVALID_RESPONSE.to_string(),
        Error::NotFound(_) => "record not found on panel page".to_string(),
        other => other.to_string(),
    };

    UpdateResult {
        record: record.clone(),
        id: id.map(str::to_string),
        success: false,
        new_id: None,
        message,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_with_new_id() {
        let accepted =
            interpret_response(r#"{"msg":"Record aggiornato","recordnewid":"55"}"#).unwrap();
        assert_eq!(accepted.new_id.as_deref(), Some("55"));
        assert_eq!(accepted.message, "Record aggiornato");
    }

    #[test]
    fn test_marker_is_case_insensitive() {
        assert!(interpret_response(r#"{"msg":"RECORD AGGIORNATO"}"#).is_ok());
    }

    #[test]
    fn test_numeric_new_id() {
        let accepted = interpret_response(r#"{"msg":"aggiornato","recordnewid":77}"#).unwrap();
        assert_eq!(accepted.new_id.as_deref(), Some("77"));
    }

    #[test]
    fn test_failure_keeps_literal_message() {
        let err = interpret_response(r#"{"msg":"Errore generico"}"#).unwrap_err();
        assert_eq!(err, Error::validation("Errore generico"));
    }

    #[test]
    fn test_missing_msg() {
        let err = interpret_response(r#"{"recordnewid":"1"}"#).unwrap_err();
        assert_eq!(err, Error::validation("N/A"));
    }

    #[test]
    fn test_html_body_is_parse_error() {
        let err = interpret_response("<html>login</html>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_non_object_json_is_parse_error() {
        for body in ["[]", r#"["aggiornato"]"#, r#""Record aggiornato""#, "null"] {
            let err = interpret_response(body).unwrap_err();
            assert!(matches!(err, Error::Parse(_)), "body {}", body);
        }
    }

    #[test]
    fn test_failure_messages() {
        let record = RecordSpec::new("esx1");
        assert_eq!(
            failure(&record, Some("1"), Error::parse("eof")).message,
            INVALID_RESPONSE
        );
        assert_eq!(
            failure(&record, Some("1"), Error::validation("Errore")).message,
            "Errore"
        );
        assert!(failure(&record, None, Error::not_found("esx1")).id.is_none());
    }
}
