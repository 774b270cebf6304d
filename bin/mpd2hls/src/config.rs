use std::path::{Path, PathBuf};

use mpd2hls::TranscodeOptions;
use serde::Deserialize;

/// Contents of the `--config` file.
///
/// ```toml
/// hls_root = "/srv/hls"
///
/// [transcode]
/// default_segment_count = 500
/// target_duration_padding = 1
/// request_timeout = 30
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hls_root: Option<PathBuf>,
    pub transcode: TranscodeOptions,
}

impl Config {
    pub fn load(file: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(file)?;
        let config = toml::from_str(&data)?;
        Ok(config)
    }
}
