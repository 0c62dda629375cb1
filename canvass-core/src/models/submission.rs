use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::sanitize::json_safe;

/// Column order of the flattened submission log.
pub const FLAT_HEADER: [&str; 10] = [
    "timestamp",
    "workerId",
    "assignmentId",
    "condition",
    "startedAt",
    "endedAt",
    "duration_ms",
    "exit_early",
    "num_trials",
    "uniqname",
];

/// Column order of the code-mapping log.
pub const CODE_HEADER: [&str; 6] = [
    "timestamp",
    "survey_code",
    "uniqname",
    "workerId",
    "assignmentId",
    "startedAt",
];

/// One participant's completed session, as logged.
///
/// The client controls the shape of its body; the server only merges in an
/// ingestion timestamp and a derived `duration_ms`. Everything the client
/// sent is kept verbatim, in its original key order.
#[derive(Debug, Clone)]
pub struct SubmissionRecord {
    fields: Map<String, Value>,
}

impl SubmissionRecord {
    /// Merge the ingestion timestamp into the client body and derive the
    /// session duration.
    ///
    /// Duration rule: an explicit numeric `total_ms` wins; otherwise
    /// `endedAt - startedAt` when both are numeric; otherwise the record
    /// carries no `duration_ms` key at all.
    pub fn from_body(body: Value, received_at: DateTime<Utc>) -> Self {
        let mut fields = Map::new();
        fields.insert(
            "timestamp".to_string(),
            Value::String(iso_timestamp(received_at)),
        );
        if let Value::Object(obj) = body {
            for (k, v) in obj {
                fields.insert(k, v);
            }
        }

        let duration_ms = explicit_total(&fields).or_else(|| elapsed(&fields));
        if let Some(ms) = duration_ms {
            fields.insert("duration_ms".to_string(), Value::from(ms));
        }

        Self { fields }
    }

    pub fn timestamp(&self) -> &str {
        self.fields
            .get("timestamp")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.fields.get("duration_ms").and_then(Value::as_i64)
    }

    /// A field rendered as text: strings come back as-is, other non-null
    /// scalars via their JSON rendering, null/absent as `None`.
    pub fn field_string(&self, key: &str) -> Option<String> {
        match self.fields.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    /// Length of the body's `trials` array; 0 when absent or not an array.
    pub fn trial_count(&self) -> usize {
        self.fields
            .get("trials")
            .and_then(Value::as_array)
            .map(|a| a.len())
            .unwrap_or(0)
    }

    /// Participant identifier used for survey-code derivation.
    pub fn code_identity(&self) -> String {
        self.field_string("workerId")
            .unwrap_or_else(|| "local".to_string())
    }

    /// The sanitized record, ready for the canonical JSONL log.
    pub fn as_json(&self) -> Value {
        json_safe(Value::Object(self.fields.clone()))
    }

    /// The fixed-column projection for the flattened log, in
    /// [`FLAT_HEADER`] order. Missing fields become empty cells.
    pub fn flat_row(&self) -> Vec<String> {
        vec![
            self.timestamp().to_string(),
            self.field_string("workerId").unwrap_or_default(),
            self.field_string("assignmentId").unwrap_or_default(),
            self.field_string("condition").unwrap_or_default(),
            self.field_string("startedAt").unwrap_or_default(),
            self.field_string("endedAt").unwrap_or_default(),
            self.duration_ms()
                .map(|ms| ms.to_string())
                .unwrap_or_default(),
            self.field_string("exit_early").unwrap_or_default(),
            self.trial_count().to_string(),
            self.field_string("uniqname").unwrap_or_default(),
        ]
    }
}

/// Associates a generated survey code with the participant's identifiers.
#[derive(Debug, Clone)]
pub struct CodeMapping {
    pub timestamp: String,
    pub survey_code: String,
    pub uniqname: Option<String>,
    pub worker_id: Option<String>,
    pub assignment_id: Option<String>,
    pub started_at: Option<String>,
}

impl CodeMapping {
    pub fn new(record: &SubmissionRecord, survey_code: &str) -> Self {
        Self {
            timestamp: record.timestamp().to_string(),
            survey_code: survey_code.to_string(),
            uniqname: record.field_string("uniqname"),
            worker_id: record.field_string("workerId"),
            assignment_id: record.field_string("assignmentId"),
            started_at: record.field_string("startedAt"),
        }
    }

    /// Row projection in [`CODE_HEADER`] order.
    pub fn row(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.survey_code.clone(),
            self.uniqname.clone().unwrap_or_default(),
            self.worker_id.clone().unwrap_or_default(),
            self.assignment_id.clone().unwrap_or_default(),
            self.started_at.clone().unwrap_or_default(),
        ]
    }
}

/// ISO-8601 UTC timestamp with microsecond precision.
fn iso_timestamp(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

fn explicit_total(fields: &Map<String, Value>) -> Option<i64> {
    fields.get("total_ms").and_then(Value::as_f64).map(|v| v as i64)
}

fn elapsed(fields: &Map<String, Value>) -> Option<i64> {
    let started = fields.get("startedAt").and_then(Value::as_f64)?;
    let ended = fields.get("endedAt").and_then(Value::as_f64)?;
    Some((ended - started) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap()
    }

    #[test]
    fn duration_from_start_and_end() {
        let record = SubmissionRecord::from_body(json!({"startedAt": 1000, "endedAt": 2500}), at());
        assert_eq!(record.duration_ms(), Some(1500));
    }

    #[test]
    fn explicit_total_wins_over_endpoints() {
        let record = SubmissionRecord::from_body(
            json!({"total_ms": 999, "startedAt": 1000, "endedAt": 2500}),
            at(),
        );
        assert_eq!(record.duration_ms(), Some(999));
    }

    #[test]
    fn no_timing_fields_means_no_duration_key() {
        let record = SubmissionRecord::from_body(json!({"workerId": "W1"}), at());
        assert_eq!(record.duration_ms(), None);
        assert!(record.as_json().get("duration_ms").is_none());
    }

    #[test]
    fn non_numeric_timing_is_ignored() {
        let record = SubmissionRecord::from_body(
            json!({"startedAt": "about noon", "endedAt": 2500}),
            at(),
        );
        assert_eq!(record.duration_ms(), None);
    }

    #[test]
    fn float_endpoints_truncate() {
        let record =
            SubmissionRecord::from_body(json!({"startedAt": 1000.25, "endedAt": 2500.75}), at());
        assert_eq!(record.duration_ms(), Some(1500));
    }

    #[test]
    fn timestamp_leads_and_client_fields_keep_their_order() {
        let record = SubmissionRecord::from_body(
            json!({"zeta": 1, "alpha": 2, "custom_widget_state": {"open": true}}),
            at(),
        );
        let value = record.as_json();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["timestamp", "zeta", "alpha", "custom_widget_state"]
        );
    }

    #[test]
    fn non_object_body_still_produces_a_record() {
        let record = SubmissionRecord::from_body(json!([1, 2, 3]), at());
        assert!(record.timestamp().starts_with("2026-08-07T12:00:00"));
        assert_eq!(record.trial_count(), 0);
    }

    #[test]
    fn flat_row_blanks_missing_fields() {
        let record = SubmissionRecord::from_body(
            json!({"workerId": "W9", "trials": [{}, {}, {}]}),
            at(),
        );
        let row = record.flat_row();
        assert_eq!(row.len(), FLAT_HEADER.len());
        assert_eq!(row[1], "W9");
        assert_eq!(row[2], "", "assignmentId missing");
        assert_eq!(row[8], "3", "num_trials from trials array");
    }

    #[test]
    fn numeric_identifiers_render_as_text() {
        let record = SubmissionRecord::from_body(json!({"workerId": 1234}), at());
        assert_eq!(record.field_string("workerId"), Some("1234".to_string()));
        assert_eq!(record.code_identity(), "1234");
    }

    #[test]
    fn code_mapping_row_matches_header_order() {
        let record = SubmissionRecord::from_body(
            json!({"workerId": "W1", "assignmentId": "A1", "uniqname": "pat", "startedAt": 1000}),
            at(),
        );
        let mapping = CodeMapping::new(&record, "0D1C2B3A");
        let row = mapping.row();
        assert_eq!(row.len(), CODE_HEADER.len());
        assert_eq!(row[1], "0D1C2B3A");
        assert_eq!(row[2], "pat");
        assert_eq!(row[3], "W1");
        assert_eq!(row[5], "1000");
    }
}
