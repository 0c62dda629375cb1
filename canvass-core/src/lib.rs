pub mod code;
pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod sanitize;

pub use code::survey_code;
pub use config::CanvassConfig;
pub use dataset::Dataset;
pub use error::CanvassError;
pub use models::submission::{CodeMapping, SubmissionRecord};
pub use models::trial::{TrialPayload, TrialRecord, IMAGE_URL_PREFIX};
pub use sanitize::json_safe;
