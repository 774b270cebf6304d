use std::fmt::Write;

use super::{media::escape_uri, HLS_VERSION};

pub const DEFAULT_AUDIO_CODECS: &str = "mp4a.40.2";
pub const DEFAULT_VIDEO_CODECS: &str = "avc1.640028";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    Audio,
    Video,
}

impl VariantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

/// One generated media playlist, as referenced from the master playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub kind: VariantKind,
    pub id: String,
    pub bandwidth: u64,
    /// `WxH`
    pub resolution: Option<String>,
    pub codecs: String,
    /// File name of the media playlist, relative to the master playlist.
    pub uri: String,
    /// `audio-<language>`, audio only.
    pub group_id: Option<String>,
    /// `und` when the manifest does not declare one.
    pub language: String,
}

impl Variant {
    pub fn playlist_name(id: &str, kind: VariantKind) -> String {
        format!("{id}_{}.m3u8", kind.as_str())
    }

    pub fn audio_group_id(language: &str) -> String {
        format!("audio-{language}")
    }
}

/// Master playlist over every generated media playlist.
///
/// Audio renditions are grouped per language. All video variants reference
/// the first audio group found: manifests offering several audio families
/// besides languages (commentary tracks, different codecs) are not told apart.
#[derive(Debug, Clone)]
pub struct MasterPlaylist<'a> {
    pub variants: &'a [Variant],
}

impl<'a> MasterPlaylist<'a> {
    /// Audio groups in the order their first variant appears.
    pub fn audio_groups(&self) -> Vec<(String, Vec<&'a Variant>)> {
        let mut groups: Vec<(String, Vec<&'a Variant>)> = Vec::new();
        for variant in self
            .variants
            .iter()
            .filter(|v| v.kind == VariantKind::Audio)
        {
            let group_id = variant
                .group_id
                .clone()
                .unwrap_or_else(|| Variant::audio_group_id(&variant.language));
            match groups.iter_mut().find(|(id, _)| *id == group_id) {
                Some((_, members)) => members.push(variant),
                None => groups.push((group_id, vec![variant])),
            }
        }
        groups
    }

    pub fn render(&self) -> String {
        let mut output = String::new();
        output.push_str("#EXTM3U\n");
        let _ = writeln!(output, "#EXT-X-VERSION:{HLS_VERSION}");

        let groups = self.audio_groups();
        for (group_id, members) in &groups {
            for (index, audio) in members.iter().enumerate() {
                let _ = writeln!(
                    output,
                    "#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"{group_id}\",NAME=\"{language}\",LANGUAGE=\"{language}\",AUTOSELECT=YES,DEFAULT={default},URI=\"{uri}\"",
                    language = audio.language,
                    default = if index == 0 { "YES" } else { "NO" },
                    uri = escape_uri(&audio.uri),
                );
            }
        }

        let audio_group = groups
            .first()
            .and_then(|(group_id, members)| Some((group_id, members.first()?)));
        let mut videos: Vec<&Variant> = self
            .variants
            .iter()
            .filter(|v| v.kind == VariantKind::Video)
            .collect();
        videos.sort_by_key(|v| v.bandwidth);

        for video in videos {
            let mut attributes = vec![format!("BANDWIDTH={}", video.bandwidth)];
            if let Some(resolution) = &video.resolution {
                attributes.push(format!("RESOLUTION={resolution}"));
            }
            match audio_group {
                Some((group_id, audio)) => {
                    attributes.push(format!("CODECS=\"{},{}\"", video.codecs, audio.codecs));
                    attributes.push(format!("AUDIO=\"{group_id}\""));
                }
                None => attributes.push(format!("CODECS=\"{}\"", video.codecs)),
            }

            let _ = writeln!(output, "#EXT-X-STREAM-INF:{}", attributes.join(","));
            output.push_str(&escape_uri(&video.uri));
            output.push('\n');
        }

        output.truncate(output.trim_end_matches('\n').len());
        output
    }
}
