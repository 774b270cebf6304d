use std::{
    collections::HashSet,
    io::ErrorKind as IoErrorKind,
    path::{Path, PathBuf},
};

use futures::future::try_join_all;

use crate::{
    dash::{
        mpd::{AdaptationSet, Manifest, Representation},
        parse, BaseUrl, SegmentEnumerator,
    },
    error::{EnumerationError, SkippedRepresentation, TranscodeError, TranscodeResult},
    hls::{
        master::{DEFAULT_AUDIO_CODECS, DEFAULT_VIDEO_CODECS},
        MasterPlaylist, MediaPlaylist, PlaylistType, Variant, VariantKind,
    },
    options::TranscodeOptions,
    source::ManifestSource,
    util::http::HttpClient,
};

pub const MASTER_PLAYLIST_NAME: &str = "master.m3u8";

/// A rendered media playlist waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPlaylist {
    pub file_name: String,
    pub contents: String,
}

/// Everything one run would write, computed without touching the disk.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodePlan {
    pub variants: Vec<Variant>,
    pub media_playlists: Vec<PlannedPlaylist>,
    /// `None` when no representation produced a media playlist.
    pub master: Option<String>,
    pub skipped: Vec<SkippedRepresentation>,
    /// Representations found in the manifest, skipped ones included.
    pub total: usize,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeReport {
    pub variants: Vec<Variant>,
    pub skipped: Vec<SkippedRepresentation>,
    pub total: usize,
    /// `None` when the manifest declared no representation at all.
    pub master_path: Option<PathBuf>,
}

impl TranscodeReport {
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

fn is_audio(adaptation_set: &AdaptationSet, representation: &Representation) -> bool {
    let audio_mime = |mime: &Option<String>| mime.as_deref().is_some_and(|m| m.starts_with("audio/"));

    adaptation_set.content_type.as_deref() == Some("audio")
        || representation.audio_sampling_rate.is_some()
        || audio_mime(&adaptation_set.mime_type)
        || audio_mime(&representation.mime_type)
}

/// Turns a parsed manifest into the playlists of one run.
///
/// `root_base` is the directory the manifest was loaded from. Representations
/// that can not be expanded are collected in [`TranscodePlan::skipped`].
pub fn plan(manifest: &Manifest, root_base: &BaseUrl, options: &TranscodeOptions) -> TranscodePlan {
    let playlist_type = if manifest.is_static() {
        PlaylistType::Vod
    } else {
        tracing::warn!("MPD is dynamic, the playlists only cover the segments listed right now");
        PlaylistType::Event
    };
    let enumerator = SegmentEnumerator {
        presentation_duration: manifest.media_presentation_duration,
        default_segment_count: options.default_segment_count,
    };

    let mut variants = Vec::new();
    let mut media_playlists = Vec::new();
    let mut skipped = Vec::new();
    let mut seen_ids = HashSet::new();

    let mpd_base = root_base.resolve(&manifest.base_urls);
    for (period_index, period) in manifest.periods.iter().enumerate() {
        let period_base = mpd_base.resolve(&period.base_urls);
        for adaptation_set in &period.adaptation_sets {
            let adaptation_base = period_base.resolve(&adaptation_set.base_urls);
            for representation in &adaptation_set.representations {
                let id = representation.id.clone().unwrap_or_default();
                let mut skip = |reason: EnumerationError| {
                    tracing::warn!(
                        "Skipping representation {id:?} in period {period_index}: {reason}"
                    );
                    skipped.push(SkippedRepresentation {
                        period: period_index,
                        id: id.clone(),
                        reason,
                    });
                };

                if !id.is_empty() && seen_ids.contains(&id) {
                    skip(EnumerationError::DuplicateId);
                    continue;
                }

                let base = adaptation_base.resolve(&representation.base_urls);
                let template = representation
                    .segment_template
                    .as_ref()
                    .or(adaptation_set.segment_template.as_ref());
                let segments = match enumerator.enumerate(representation, template, &base) {
                    Ok(segments) => segments,
                    Err(reason) => {
                        skip(reason);
                        continue;
                    }
                };
                seen_ids.insert(id.clone());

                let kind = if is_audio(adaptation_set, representation) {
                    VariantKind::Audio
                } else {
                    VariantKind::Video
                };
                let codecs = representation
                    .codecs
                    .clone()
                    .or_else(|| adaptation_set.codecs.clone())
                    .unwrap_or_else(|| match kind {
                        VariantKind::Audio => DEFAULT_AUDIO_CODECS.to_string(),
                        VariantKind::Video => DEFAULT_VIDEO_CODECS.to_string(),
                    });
                let language = adaptation_set
                    .lang
                    .clone()
                    .unwrap_or_else(|| "und".to_string());
                let file_name = Variant::playlist_name(&id, kind);

                let contents = MediaPlaylist {
                    initialization: &segments.initialization,
                    segments: &segments.segments,
                    playlist_type,
                    target_duration_padding: options.target_duration_padding,
                }
                .render();
                tracing::debug!(
                    "{file_name}: {} segments from {base}",
                    segments.segments.len()
                );

                variants.push(Variant {
                    kind,
                    group_id: (kind == VariantKind::Audio)
                        .then(|| Variant::audio_group_id(&language)),
                    bandwidth: representation.bandwidth,
                    resolution: match kind {
                        VariantKind::Audio => None,
                        VariantKind::Video => representation.resolution(),
                    },
                    codecs,
                    uri: file_name.clone(),
                    language,
                    id,
                });
                media_playlists.push(PlannedPlaylist {
                    file_name,
                    contents,
                });
            }
        }
    }

    let master = (!variants.is_empty()).then(|| {
        MasterPlaylist {
            variants: &variants,
        }
        .render()
    });

    TranscodePlan {
        variants,
        media_playlists,
        master,
        skipped,
        total: manifest.representation_count(),
    }
}

/// Loads a manifest and writes its HLS playlists to a directory.
#[derive(Debug, Clone)]
pub struct Transcoder {
    client: HttpClient,
    options: TranscodeOptions,
}

impl Transcoder {
    pub fn new(options: TranscodeOptions) -> TranscodeResult<Self> {
        let client = HttpClient::with_timeout(options.request_timeout)?;
        Ok(Self::with_client(client, options))
    }

    pub fn with_client(client: HttpClient, options: TranscodeOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &TranscodeOptions {
        &self.options
    }

    pub async fn transcode(
        &self,
        source: &ManifestSource,
        output_dir: impl AsRef<Path>,
    ) -> TranscodeResult<TranscodeReport> {
        let output_dir = output_dir.as_ref();
        remove_stale_master(output_dir).await?;

        let loaded = source.load(&self.client).await?;
        let manifest = parse(&loaded.text)?;
        tracing::info!(
            "MPD has {} period(s), {} representation(s)",
            manifest.periods.len(),
            manifest.representation_count()
        );

        let plan = plan(&manifest, &loaded.root_base, &self.options);
        write_plan(plan, output_dir).await
    }
}

/// Removes a `master.m3u8` left by an earlier run, so the master playlist
/// only exists after a successful one.
async fn remove_stale_master(output_dir: &Path) -> TranscodeResult<()> {
    let master_path = output_dir.join(MASTER_PLAYLIST_NAME);
    match tokio::fs::remove_file(&master_path).await {
        Ok(()) => {
            tracing::debug!("Removed stale {}", master_path.display());
            Ok(())
        }
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Writes the media playlists concurrently, then the master playlist.
async fn write_plan(plan: TranscodePlan, output_dir: &Path) -> TranscodeResult<TranscodeReport> {
    let TranscodePlan {
        variants,
        media_playlists,
        master,
        skipped,
        total,
    } = plan;

    if total == 0 {
        tracing::info!("MPD declares no representations, nothing to write");
        return Ok(TranscodeReport {
            variants,
            skipped,
            total,
            master_path: None,
        });
    }
    let Some(master) = master else {
        return Err(TranscodeError::AllRepresentationsSkipped(skipped));
    };

    tokio::fs::create_dir_all(output_dir).await?;
    let master_path = output_dir.join(MASTER_PLAYLIST_NAME);

    try_join_all(media_playlists.iter().map(|playlist| {
        tokio::fs::write(output_dir.join(&playlist.file_name), &playlist.contents)
    }))
    .await?;
    tokio::fs::write(&master_path, master).await?;

    tracing::info!(
        "Wrote {} of {} playlists to {}",
        variants.len(),
        total,
        output_dir.display()
    );

    Ok(TranscodeReport {
        variants,
        skipped,
        total,
        master_path: Some(master_path),
    })
}
