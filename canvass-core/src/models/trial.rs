use serde::{Deserialize, Serialize};

/// URL prefix the frontend resolves trial images under. The HTTP surface
/// mounts the static asset root at the matching route.
pub const IMAGE_URL_PREFIX: &str = "/static/images";

/// One row of the study's trial table, loaded once at startup and immutable
/// for the process lifetime.
///
/// `id`, `meme_text`, `gold_sentiment` and `img_filename` come from the
/// required columns; everything else is a precomputed model annotation that
/// may be absent from the source table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialRecord {
    pub id: String,
    pub meme_text: String,
    pub gold_sentiment: Option<String>,
    pub img_filename: String,

    // Model annotations: top-3 predicted labels with probabilities,
    // a class-probability triple, a rationale, and retrieval neighbors.
    pub mm_top1: Option<String>,
    pub mm_p1: Option<f64>,
    pub mm_top2: Option<String>,
    pub mm_p2: Option<f64>,
    pub mm_top3: Option<String>,
    pub mm_p3: Option<f64>,
    pub mm_p_neg: Option<f64>,
    pub mm_p_neu: Option<f64>,
    pub mm_p_pos: Option<f64>,
    pub text_rationale: Option<String>,
    pub neighbor_id_1: Option<String>,
    pub neighbor_id_2: Option<String>,
}

/// The externally visible projection of a [`TrialRecord`].
///
/// Every optional field serializes as an explicit `null` when unknown —
/// the frontend never has to probe for key presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialPayload {
    pub id: String,
    pub meme_text: String,
    pub gold_sentiment: Option<String>,
    pub img_url: String,
    pub mm_top1: Option<String>,
    pub mm_p1: Option<f64>,
    pub mm_top2: Option<String>,
    pub mm_p2: Option<f64>,
    pub mm_top3: Option<String>,
    pub mm_p3: Option<f64>,
    pub mm_p_neg: Option<f64>,
    pub mm_p_neu: Option<f64>,
    pub mm_p_pos: Option<f64>,
    pub text_rationale: Option<String>,
    pub neighbor_id_1: Option<String>,
    pub neighbor_id_2: Option<String>,
}

impl TrialRecord {
    /// Project this row into its public payload shape, resolving the image
    /// URL against the fixed static-asset prefix.
    pub fn payload(&self) -> TrialPayload {
        TrialPayload {
            id: self.id.clone(),
            meme_text: self.meme_text.clone(),
            gold_sentiment: self.gold_sentiment.clone(),
            img_url: format!("{}/{}", IMAGE_URL_PREFIX, self.img_filename),
            mm_top1: self.mm_top1.clone(),
            mm_p1: self.mm_p1,
            mm_top2: self.mm_top2.clone(),
            mm_p2: self.mm_p2,
            mm_top3: self.mm_top3.clone(),
            mm_p3: self.mm_p3,
            mm_p_neg: self.mm_p_neg,
            mm_p_neu: self.mm_p_neu,
            mm_p_pos: self.mm_p_pos,
            text_rationale: self.text_rationale.clone(),
            neighbor_id_1: self.neighbor_id_1.clone(),
            neighbor_id_2: self.neighbor_id_2.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_record() -> TrialRecord {
        TrialRecord {
            id: "t-1".to_string(),
            meme_text: "a caption".to_string(),
            gold_sentiment: Some("negative".to_string()),
            img_filename: "image_808.jpg".to_string(),
            mm_top1: None,
            mm_p1: None,
            mm_top2: None,
            mm_p2: None,
            mm_top3: None,
            mm_p3: None,
            mm_p_neg: None,
            mm_p_neu: None,
            mm_p_pos: None,
            text_rationale: None,
            neighbor_id_1: None,
            neighbor_id_2: None,
        }
    }

    #[test]
    fn payload_joins_image_url() {
        let payload = bare_record().payload();
        assert_eq!(payload.img_url, "/static/images/image_808.jpg");
        assert_eq!(payload.id, "t-1");
    }

    #[test]
    fn absent_annotations_serialize_as_null_not_omitted() {
        let value = serde_json::to_value(bare_record().payload()).unwrap();
        let obj = value.as_object().unwrap();
        for key in ["mm_top1", "mm_p1", "mm_p_pos", "text_rationale", "neighbor_id_2"] {
            assert!(obj.contains_key(key), "{} must be present", key);
            assert!(obj[key].is_null(), "{} must be null", key);
        }
    }
}
