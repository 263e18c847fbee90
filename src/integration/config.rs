//! Session configuration, read from a JSON file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::data_io::TIMESTAMP_FORMAT;
use crate::error::ConfigError;
use crate::tracker::{BBox, DEFAULT_MAX_DISAPPEARED, TrackerKind};

const ARCHIVE_EXTENSION: &str = ".zip";

/// Parameters of one tracking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Camera index or path of a video file or session archive.
    #[serde(deserialize_with = "string_or_number")]
    pub input_source: String,
    pub tracking_algorithm: String,
    /// Disappearance threshold of the centroid tracker.
    pub max_disappeared: u32,
    /// Archive path; a timestamped name is used when absent.
    pub output: Option<String>,
    /// `[x, y, width, height]` selected without user interaction.
    pub roi: Option<[i32; 4]>,
    /// Frames discarded before the first frame is used, to let cameras settle.
    pub warm_up_frames: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            input_source: "0".to_string(),
            tracking_algorithm: "CSRTTracker".to_string(),
            max_disappeared: DEFAULT_MAX_DISAPPEARED,
            output: None,
            roi: None,
            warm_up_frames: 0,
        }
    }
}

impl SessionConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = Self::from_json_str(&fs::read_to_string(path)?)?;
        info!(path = %path.display(), algorithm = %config.tracking_algorithm, "loaded configuration");
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The configured tracker, with `max_disappeared` applied to the centroid variant.
    pub fn tracker_kind(&self) -> Result<TrackerKind, ConfigError> {
        let kind = match self.tracking_algorithm.parse::<TrackerKind>()? {
            TrackerKind::Centroid { .. } => TrackerKind::Centroid {
                max_disappeared: self.max_disappeared,
            },
            other => other,
        };
        Ok(kind)
    }

    pub fn roi_bbox(&self) -> Option<BBox> {
        self.roi.map(|[x, y, w, h]| BBox::new(x, y, w, h))
    }

    /// Whether the input is a previously recorded session archive.
    pub fn replays_archive(&self) -> bool {
        self.input_source.ends_with(ARCHIVE_EXTENSION)
    }

    /// Where the session archive goes.
    ///
    /// A configured name gets `.zip` appended when missing; otherwise the
    /// name is derived from `now`.
    pub fn output_path<Tz>(&self, now: &DateTime<Tz>) -> PathBuf
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        match &self.output {
            Some(name) if name.ends_with(ARCHIVE_EXTENSION) => PathBuf::from(name),
            Some(name) => PathBuf::from(format!("{name}{ARCHIVE_EXTENSION}")),
            None => PathBuf::from(format!(
                "{}{ARCHIVE_EXTENSION}",
                now.format(TIMESTAMP_FORMAT)
            )),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Source {
        Index(u64),
        Path(String),
    }

    Ok(match Source::deserialize(deserializer)? {
        Source::Index(i) => i.to_string(),
        Source::Path(p) => p,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::tracker::AppearanceAlgorithm;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(
            config.tracker_kind().unwrap(),
            TrackerKind::Appearance(AppearanceAlgorithm::Csrt)
        );
    }

    #[test]
    fn test_parse_full() {
        let config = SessionConfig::from_json_str(
            r#"{
                "input_source": 2,
                "tracking_algorithm": "CentroidTracker",
                "max_disappeared": 7,
                "output": "run",
                "roi": [1, 2, 30, 40],
                "warm_up_frames": 2
            }"#,
        )
        .unwrap();
        assert_eq!(config.input_source, "2");
        assert_eq!(
            config.tracker_kind().unwrap(),
            TrackerKind::Centroid { max_disappeared: 7 }
        );
        assert_eq!(config.roi_bbox(), Some(BBox::new(1, 2, 30, 40)));
        assert_eq!(config.warm_up_frames, 2);
        assert!(!config.replays_archive());
    }

    #[test]
    fn test_unknown_algorithm() {
        let config = SessionConfig {
            tracking_algorithm: "BoostingTracker".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.tracker_kind(), Err(ConfigError::Tracker(_))));
    }

    #[test]
    fn test_output_path() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let mut config = SessionConfig::default();
        assert_eq!(config.output_path(&now), PathBuf::from("20240305-14_07_09.zip"));

        config.output = Some("session".to_string());
        assert_eq!(config.output_path(&now), PathBuf::from("session.zip"));

        config.output = Some("session.zip".to_string());
        assert_eq!(config.output_path(&now), PathBuf::from("session.zip"));
    }

    #[test]
    fn test_archive_input() {
        let config = SessionConfig::from_json_str(r#"{"input_source": "old/run.zip"}"#).unwrap();
        assert!(config.replays_archive());
    }
}
