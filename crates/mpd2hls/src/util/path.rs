use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{TranscodeError, TranscodeResult};

/// Output folder of a remote manifest under an HLS root, mirroring the
/// directory layout of the CDN.
///
/// `https://cdn/Normal/i1%20Thrift%20Shop/manifest.mpd` with root `/srv/hls`
/// maps to `/srv/hls/Normal/i1 Thrift Shop`.
pub fn hls_folder_for(manifest: &Url, hls_root: &Path) -> TranscodeResult<PathBuf> {
    let path = percent_decode_str(manifest.path())
        .decode_utf8()
        .map_err(|e| TranscodeError::InvalidOutputFolder(format!("{manifest}: {e}")))?;
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        return Err(TranscodeError::InvalidOutputFolder(format!(
            "{manifest} does not contain a path"
        )));
    }

    let (directory, file_name) = path.rsplit_once('/').unwrap_or(("", path));
    if !file_name.to_ascii_lowercase().ends_with(".mpd") {
        return Err(TranscodeError::InvalidOutputFolder(format!(
            "{file_name} is not an MPD file"
        )));
    }

    let relative = Path::new(directory.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(TranscodeError::InvalidOutputFolder(format!(
            "{directory} escapes the HLS root"
        )));
    }

    Ok(hls_root.join(relative))
}
