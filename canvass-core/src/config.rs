use std::path::PathBuf;

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CanvassConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub study: StudyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    pub frontend_dir: PathBuf,
    pub static_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            frontend_dir: PathBuf::from("frontend"),
            static_dir: PathBuf::from("static"),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl PathsConfig {
    pub fn images_dir(&self) -> PathBuf {
        self.static_dir.join("images")
    }

    /// The read-only trial table this system serves from.
    pub fn trials_csv(&self) -> PathBuf {
        self.data_dir.join("study_trials.csv")
    }

    /// Canonical schema-tolerant submission log, one JSON record per line.
    pub fn submissions_jsonl(&self) -> PathBuf {
        self.data_dir.join("submissions.jsonl")
    }

    /// Flattened fixed-column submission log.
    pub fn submissions_csv(&self) -> PathBuf {
        self.data_dir.join("submissions.csv")
    }

    /// Survey code ↔ participant identifier mapping.
    pub fn codes_csv(&self) -> PathBuf {
        self.data_dir.join("codes.csv")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StudyConfig {
    /// Trials handed out when the client does not ask for a specific count.
    pub default_trials: usize,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self { default_trials: 12 }
    }
}

impl CanvassConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let cfg = CanvassConfig::default();
        assert_eq!(cfg.http.port, 8080);
        assert_eq!(cfg.study.default_trials, 12);
        assert_eq!(cfg.paths.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn derived_paths_live_under_data_dir() {
        let paths = PathsConfig {
            data_dir: PathBuf::from("/srv/canvass/data"),
            ..Default::default()
        };
        assert_eq!(
            paths.submissions_jsonl(),
            PathBuf::from("/srv/canvass/data/submissions.jsonl")
        );
        assert_eq!(
            paths.codes_csv(),
            PathBuf::from("/srv/canvass/data/codes.csv")
        );
        assert_eq!(
            paths.trials_csv(),
            PathBuf::from("/srv/canvass/data/study_trials.csv")
        );
    }

    #[test]
    fn images_dir_nests_under_static() {
        let paths = PathsConfig::default();
        assert_eq!(paths.images_dir(), PathBuf::from("static/images"));
    }
}
