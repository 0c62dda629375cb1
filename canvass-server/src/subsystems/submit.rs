//! Submission logging.
//!
//! Every submission lands in three append-only logs under the data
//! directory:
//! - `submissions.jsonl` — the canonical record, one sanitized JSON line
//!   per submission, preserving every client-supplied field;
//! - `submissions.csv` — a flattened fixed-column view for quick analysis;
//! - `codes.csv` — the survey code handed back to the participant, mapped
//!   to their identifiers.
//!
//! The three appends are independent and not transactional: a failure
//! partway leaves the earlier appends committed and skips the rest, and
//! surfaces as a request error. Nothing is retried.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde_json::Value;

use canvass_core::config::PathsConfig;
use canvass_core::models::submission::{CodeMapping, SubmissionRecord, CODE_HEADER, FLAT_HEADER};
use canvass_core::survey_code;

/// Log one submission body and return the generated survey code.
pub fn record_submission(paths: &PathsConfig, body: Value) -> anyhow::Result<String> {
    let now = Utc::now();
    let record = SubmissionRecord::from_body(body, now);

    append_jsonl(&paths.submissions_jsonl(), &record)?;
    append_csv_row(&paths.submissions_csv(), &FLAT_HEADER, record.flat_row())?;

    let code = survey_code(&record.code_identity(), now.timestamp_millis());
    let mapping = CodeMapping::new(&record, &code);
    append_csv_row(&paths.codes_csv(), &CODE_HEADER, mapping.row())?;

    tracing::info!(
        "Logged submission for {} ({} trials), code {}",
        mapping.worker_id.as_deref().unwrap_or("local"),
        record.trial_count(),
        code
    );
    Ok(code)
}

fn append_jsonl(path: &Path, record: &SubmissionRecord) -> anyhow::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let line = serde_json::to_string(&record.as_json())?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// Append one row; the header is written only when the file is first created.
fn append_csv_row(path: &Path, header: &[&str], row: Vec<String>) -> anyhow::Result<()> {
    let fresh = !path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if fresh {
        wtr.write_record(header)?;
    }
    wtr.write_record(&row)?;
    wtr.flush()?;
    Ok(())
}
