pub mod dash;
pub mod error;
pub mod hls;
pub mod options;
pub mod source;
pub mod transcode;
pub mod util;

pub use error::{ErrorKind, TranscodeError, TranscodeResult};
pub use options::TranscodeOptions;
pub use source::ManifestSource;
pub use transcode::{plan, TranscodePlan, TranscodeReport, Transcoder};
pub use util::{http::HttpClient, path::hls_folder_for};

/// ┌──────────────┐  load   ┌──────────┐  parse  ┌──────────────┐
/// │ManifestSource├────────►│ MPD text ├────────►│   Manifest   │
/// └──────────────┘         └──────────┘         └──────┬───────┘
///                                                      │ plan
///                                   ┌──────────────────▼──────────────────┐
///                                   │ per Representation:                 │
///                                   │   BaseUrl chain + SegmentEnumerator │
///                                   │   => MediaPlaylist <id>_<kind>.m3u8 │
///                                   │ all variants => MasterPlaylist      │
///                                   └──────────────────┬──────────────────┘
///                                                      │ write_plan
///                                                output directory
pub async fn transcode(
    source: &str,
    output_dir: impl AsRef<std::path::Path>,
    options: TranscodeOptions,
) -> TranscodeResult<TranscodeReport> {
    let source = ManifestSource::parse(source)?;
    Transcoder::new(options)?
        .transcode(&source, output_dir)
        .await
}
