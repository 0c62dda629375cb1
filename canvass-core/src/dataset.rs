//! Trial table loading, normalization, and sampling.
//!
//! The table is read once at startup and never mutated afterwards; request
//! handlers share it behind an `Arc`. Load failures are fatal — the server
//! does not start on partial data.

use std::collections::HashMap;
use std::path::Path;

use csv::StringRecord;
use rand::seq::IndexedRandom;

use crate::error::CanvassError;
use crate::models::trial::TrialRecord;

/// Cell spellings tabular exports use for "no value".
const NA_SENTINELS: [&str; 7] = ["", "nan", "NaN", "NA", "N/A", "null", "None"];

/// Columns that must exist (or be derivable) before the server will start.
const REQUIRED_COLUMNS: [&str; 3] = ["id", "meme_text", "gold_sentiment"];

/// The loaded, immutable trial table.
#[derive(Debug)]
pub struct Dataset {
    trials: Vec<TrialRecord>,
}

/// Where each row's image filename comes from.
enum ImageSource {
    /// The canonical `img_filename` column.
    Filename(usize),
    /// A path-like column (`img_path` / `image_name`) reduced to its basename.
    Basename(usize),
}

impl Dataset {
    /// Read the trial table from `path`, normalizing column presence.
    ///
    /// Guarantees on success: every record has an image filename, and the
    /// required identifier/text/label columns existed in the source. Missing
    /// optional annotation columns load as `None` throughout.
    pub fn load(path: &Path) -> Result<Self, CanvassError> {
        if !path.is_file() {
            return Err(CanvassError::MissingTable(path.to_path_buf()));
        }

        let mut rdr = csv::Reader::from_path(path)?;
        let columns = column_index(rdr.headers()?);

        let image_source = if let Some(&i) = columns.get("img_filename") {
            ImageSource::Filename(i)
        } else if let Some(&i) = columns.get("img_path").or_else(|| columns.get("image_name")) {
            ImageSource::Basename(i)
        } else {
            return Err(CanvassError::Schema(
                "needs an 'img_filename' or 'img_path'/'image_name' column".to_string(),
            ));
        };

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !columns.contains_key(*c))
            .collect();
        if !missing.is_empty() {
            return Err(CanvassError::Schema(format!(
                "missing required columns: {:?}",
                missing
            )));
        }

        let mut trials = Vec::new();
        for result in rdr.records() {
            let rec = result?;
            trials.push(parse_row(&rec, &columns, &image_source));
        }

        tracing::info!("Loaded {} trial rows from {}", trials.len(), path.display());
        Ok(Self { trials })
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Draw `min(n, len)` distinct rows uniformly at random.
    ///
    /// Each call takes a fresh draw from the thread RNG — repeated calls in
    /// the same process return independent samples.
    pub fn sample(&self, n: usize) -> Vec<&TrialRecord> {
        let take = n.min(self.trials.len());
        self.trials
            .as_slice()
            .choose_multiple(&mut rand::rng(), take)
            .collect()
    }
}

fn column_index(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect()
}

fn parse_row(
    rec: &StringRecord,
    columns: &HashMap<String, usize>,
    image_source: &ImageSource,
) -> TrialRecord {
    let img_filename = match *image_source {
        ImageSource::Filename(i) => raw_cell(rec, Some(i)).trim().to_string(),
        ImageSource::Basename(i) => basename(raw_cell(rec, Some(i)).trim()),
    };

    TrialRecord {
        id: raw_cell(rec, columns.get("id").copied()).trim().to_string(),
        meme_text: raw_cell(rec, columns.get("meme_text").copied()).to_string(),
        gold_sentiment: opt_text(rec, columns, "gold_sentiment"),
        img_filename,
        mm_top1: opt_text(rec, columns, "mm_top1"),
        mm_p1: opt_number(rec, columns, "mm_p1"),
        mm_top2: opt_text(rec, columns, "mm_top2"),
        mm_p2: opt_number(rec, columns, "mm_p2"),
        mm_top3: opt_text(rec, columns, "mm_top3"),
        mm_p3: opt_number(rec, columns, "mm_p3"),
        mm_p_neg: opt_number(rec, columns, "mm_p_neg"),
        mm_p_neu: opt_number(rec, columns, "mm_p_neu"),
        mm_p_pos: opt_number(rec, columns, "mm_p_pos"),
        text_rationale: opt_text(rec, columns, "text_rationale"),
        neighbor_id_1: opt_text(rec, columns, "neighbor_id_1"),
        neighbor_id_2: opt_text(rec, columns, "neighbor_id_2"),
    }
}

fn raw_cell<'r>(rec: &'r StringRecord, idx: Option<usize>) -> &'r str {
    idx.and_then(|i| rec.get(i)).unwrap_or("")
}

/// Text cell with NA sentinels coalesced to `None`.
fn opt_text(rec: &StringRecord, columns: &HashMap<String, usize>, name: &str) -> Option<String> {
    let cell = raw_cell(rec, columns.get(name).copied()).trim();
    if NA_SENTINELS.contains(&cell) {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Numeric cell; anything that does not parse to a finite float is `None`.
fn opt_number(rec: &StringRecord, columns: &HashMap<String, usize>, name: &str) -> Option<f64> {
    opt_text(rec, columns, name)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Final path component, falling back to the input when there is none.
fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
