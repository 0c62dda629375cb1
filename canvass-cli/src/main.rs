//! canvass-cli — operator CLI for a running Canvass survey server
//!
//! Talks to the HTTP API the browser frontend uses, for smoke-testing a
//! deployment and pulling the collected data without shell access.
//!
//! # Subcommands
//! - `status`                 — show server health
//! - `trials [-n <count>]`    — fetch a trial sample as the frontend would
//! - `export [-o <path>]`     — download the data-directory archive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";
const DEFAULT_TRIALS: usize = 3;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "canvass-cli",
    version,
    about = "Canvass survey backend — operator CLI"
)]
struct Cli {
    /// Canvass HTTP server URL (overrides CANVASS_HTTP_URL env var)
    #[arg(long, env = "CANVASS_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch a random trial sample, as the frontend would
    Trials {
        /// Number of trials to request
        #[arg(short = 'n', long, default_value_t = DEFAULT_TRIALS)]
        count: usize,

        /// Experiment condition label to echo
        #[arg(long, default_value = "baseline")]
        condition: String,

        /// Print the raw response JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Download the persisted-data archive to a local file
    Export {
        /// Where to write the zip archive
        #[arg(short, long, default_value = "submissions_backup.zip")]
        output: PathBuf,
    },

    /// Show Canvass server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

/// The trial-sample response from GET /trials
#[derive(Debug, Deserialize)]
pub struct TrialsResponse {
    pub condition: String,
    pub n: usize,
    pub trials: Vec<Value>,
}

// ============================================================================
// Formatting
// ============================================================================

/// One-paragraph summary of a trial payload for human output.
pub fn summarize_trial(trial: &Value) -> String {
    let id = trial["id"].as_str().unwrap_or("?");
    let sentiment = trial["gold_sentiment"].as_str().unwrap_or("unlabeled");
    let img_url = trial["img_url"].as_str().unwrap_or("?");
    let caption: String = trial["meme_text"].as_str().unwrap_or("").chars().take(60).collect();
    format!("{} [{}] {}\n    {}", id, sentiment, img_url, caption)
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn do_trials(server: &str, count: usize, condition: &str, json_output: bool) -> anyhow::Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let url = format!("{}/trials", server);
    let count_param = count.to_string();
    let resp = client
        .get(&url)
        .query(&[("condition", condition), ("n", count_param.as_str())])
        .send();

    let resp = match resp {
        Ok(r) => r,
        Err(e) => {
            eprintln!("canvass-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!("canvass-cli: server returned {}: {}", status, body);
        std::process::exit(1);
    }

    if json_output {
        let body: Value = match resp.json() {
            Ok(v) => v,
            Err(e) => {
                eprintln!("canvass-cli: failed to parse trials response: {}", e);
                std::process::exit(1);
            }
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let body: TrialsResponse = match resp.json() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("canvass-cli: failed to parse trials response: {}", e);
            std::process::exit(1);
        }
    };

    println!("{} trials (condition: {})", body.n, body.condition);
    for trial in &body.trials {
        println!("{}", summarize_trial(trial));
    }

    Ok(())
}

fn do_export(server: &str, output: &PathBuf) -> anyhow::Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(60))
        .build()?;

    let url = format!("{}/download-data", server);
    let resp = match client.get(&url).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("canvass-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        eprintln!("canvass-cli: server returned {}", resp.status());
        std::process::exit(1);
    }

    let bytes = resp.bytes()?;
    std::fs::write(output, &bytes)?;
    println!("Wrote {} bytes to {}", bytes.len(), output.display());

    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;

    let url = format!("{}/health", server);
    let resp = client.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: Value = r.json().unwrap_or_default();
            println!("Canvass server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:        {}", body["version"].as_str().unwrap_or("?"));
            println!("Trials loaded:  {}", body["trials"].as_u64().unwrap_or(0));
            println!("Data dir:       {}", body["data_dir"].as_str().unwrap_or("?"));
        }
        Ok(r) => {
            let status = r.status();
            eprintln!("canvass-cli: server unhealthy (HTTP {})", status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("canvass-cli: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Trials { count, condition, json } => do_trials(&server, count, &condition, json),
        Commands::Export { output } => do_export(&server, &output),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("canvass-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_includes_id_label_and_url() {
        let trial = json!({
            "id": "t1",
            "gold_sentiment": "negative",
            "img_url": "/static/images/img_1.jpg",
            "meme_text": "a caption",
        });
        let line = summarize_trial(&trial);
        assert!(line.contains("t1"));
        assert!(line.contains("[negative]"));
        assert!(line.contains("/static/images/img_1.jpg"));
        assert!(line.contains("a caption"));
    }

    #[test]
    fn summary_truncates_long_captions() {
        let trial = json!({
            "id": "t1",
            "gold_sentiment": "neutral",
            "img_url": "/static/images/x.jpg",
            "meme_text": "C".repeat(200),
        });
        let line = summarize_trial(&trial);
        let caption = line.lines().nth(1).unwrap().trim();
        assert_eq!(caption.len(), 60);
    }

    #[test]
    fn summary_tolerates_null_fields() {
        let trial = json!({"id": "t1", "gold_sentiment": null, "img_url": null, "meme_text": null});
        let line = summarize_trial(&trial);
        assert!(line.contains("[unlabeled]"));
    }
}
