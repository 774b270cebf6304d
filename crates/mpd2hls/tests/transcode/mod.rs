use std::{path::Path, time::Duration};

use m3u8_rs::{MasterPlaylist, MediaPlaylist};
use mpd2hls::{
    dash::{parse, BaseUrl},
    error::EnumerationError,
    hls::VariantKind,
    hls_folder_for, plan, ErrorKind, ManifestSource, TranscodeError, TranscodeOptions,
    Transcoder,
};
use url::Url;

use crate::{
    init_test_tracing, source::setup_mock_server, AssertWrapper, BASE_CHAIN_MPD, BROKEN_MPD, CONSTANT_MPD,
    EMPTY_MPD, TIMELINE_MPD,
};

fn transcoder() -> Transcoder {
    Transcoder::new(TranscodeOptions::default().request_timeout(Duration::from_secs(5))).unwrap()
}

async fn read_media(path: impl AsRef<Path>) -> anyhow::Result<MediaPlaylist> {
    let text = tokio::fs::read(path).await?;
    Ok(m3u8_rs::parse_media_playlist_res(&text).map_err(|e| anyhow::anyhow!("{e:?}"))?)
}

async fn read_master(path: impl AsRef<Path>) -> anyhow::Result<MasterPlaylist> {
    let text = tokio::fs::read(path).await?;
    Ok(m3u8_rs::parse_master_playlist_res(&text).map_err(|e| anyhow::anyhow!("{e:?}"))?)
}

#[tokio::test]
async fn test_transcode_timeline() -> anyhow::Result<()> {
    init_test_tracing();
    let (url, _mock_server) = setup_mock_server(TIMELINE_MPD).await;
    let base = url.trim_end_matches("manifest.mpd").to_string();
    let output = tempfile::tempdir()?;

    let report = transcoder()
        .transcode(&ManifestSource::parse(&url)?, output.path())
        .await?;
    assert_eq!(report.total, 2);
    assert!(!report.is_partial());
    assert_eq!(report.master_path, Some(output.path().join("master.m3u8")));

    let video = read_media(output.path().join("video-720p_video.m3u8")).await?;
    assert_eq!(video.target_duration as u64, 2);
    assert!(video.end_list);
    let uris: Vec<_> = video.segments.iter().map(|s| s.uri.clone()).collect();
    assert_eq!(
        uris,
        (1..=4).map(|n| format!("{base}seg-{n}.m4s")).collect::<Vec<_>>()
    );
    assert!(video.segments.iter().all(|s| s.duration == 2.0));
    assert_eq!(
        video.segments[0].map.as_ref().assert_success().uri,
        format!("{base}init-video-720p.mp4")
    );

    let audio = read_media(output.path().join("audio-ja_audio.m3u8")).await?;
    let uris: Vec<_> = audio.segments.iter().map(|s| s.uri.clone()).collect();
    assert_eq!(
        uris,
        [0, 96000, 192000, 288000]
            .iter()
            .map(|t| format!("{base}audio/{t}.m4s"))
            .collect::<Vec<_>>()
    );

    for name in ["master.m3u8", "video-720p_video.m3u8", "audio-ja_audio.m3u8"] {
        let text = tokio::fs::read_to_string(output.path().join(name)).await?;
        assert!(!text.ends_with('\n'), "{name} ends with a newline");
    }
    let video_text = tokio::fs::read_to_string(output.path().join("video-720p_video.m3u8")).await?;
    assert!(video_text.ends_with("seg-4.m4s\n#EXT-X-ENDLIST"));

    let master = read_master(output.path().join("master.m3u8")).await?;
    assert_eq!(master.alternatives.len(), 1);
    assert_eq!(master.alternatives[0].group_id, "audio-ja");
    assert_eq!(master.alternatives[0].language.as_deref(), Some("ja"));
    assert_eq!(master.variants.len(), 1);
    assert_eq!(master.variants[0].uri, "video-720p_video.m3u8");
    assert_eq!(master.variants[0].bandwidth, 2_400_000);
    assert_eq!(master.variants[0].audio.as_deref(), Some("audio-ja"));
    assert_eq!(
        master.variants[0].codecs.as_deref(),
        Some("avc1.64001f,mp4a.40.2")
    );
    Ok(())
}

#[tokio::test]
async fn test_transcode_constant_duration_fallback() -> anyhow::Result<()> {
    init_test_tracing();
    let input = tempfile::tempdir()?;
    let manifest = input.path().join("manifest.mpd");
    tokio::fs::write(&manifest, CONSTANT_MPD).await?;
    let output = tempfile::tempdir()?;

    let report = transcoder()
        .transcode(&ManifestSource::Local(manifest), output.path())
        .await?;
    assert_eq!(report.variants.len(), 1);
    assert_eq!(report.variants[0].kind, VariantKind::Video);
    assert_eq!(report.variants[0].resolution.as_deref(), Some("1280x720"));

    let video = read_media(output.path().join("v1_video.m3u8")).await?;
    assert_eq!(video.segments.len(), 500);
    assert!(video.segments.iter().all(|s| s.duration == 4.0));
    assert_eq!(
        video.segments[0].uri,
        format!("{}/v1/00001.m4s", input.path().display())
    );
    assert_eq!(
        video.segments[499].uri,
        format!("{}/v1/00500.m4s", input.path().display())
    );
    Ok(())
}

#[tokio::test]
async fn test_segment_count_option() -> anyhow::Result<()> {
    let (url, _mock_server) = setup_mock_server(CONSTANT_MPD).await;
    let output = tempfile::tempdir()?;

    Transcoder::new(TranscodeOptions::default().default_segment_count(3))?
        .transcode(&ManifestSource::parse(&url)?, output.path())
        .await?;

    let video = read_media(output.path().join("v1_video.m3u8")).await?;
    assert_eq!(video.segments.len(), 3);
    Ok(())
}

#[test]
fn test_base_url_chain() {
    let manifest = parse(BASE_CHAIN_MPD).unwrap();
    let root = BaseUrl::Remote(Url::parse("https://origin.example/show/").unwrap());
    let plan = plan(&manifest, &root, &TranscodeOptions::default());

    let first_uri = |index: usize| {
        plan.media_playlists[index]
            .contents
            .lines()
            .find(|l| !l.starts_with('#'))
            .unwrap()
            .to_string()
    };
    assert_eq!(first_uri(0), "https://cdn.example/a/b/v1-1.m4s");
    assert_eq!(first_uri(1), "https://mirror.example/v2/v2-1.m4s");
    assert_eq!(first_uri(2), "https://cdn.example/a/b/hd/v3-1.m4s");
    assert!(plan.media_playlists[0]
        .contents
        .contains("#EXT-X-MAP:URI=\"https://cdn.example/a/b/init-v1.mp4\""));
}

#[tokio::test]
async fn test_all_representations_skipped() -> anyhow::Result<()> {
    init_test_tracing();
    let (url, _mock_server) = setup_mock_server(BROKEN_MPD).await;
    let output = tempfile::tempdir()?;
    tokio::fs::write(output.path().join("master.m3u8"), "#EXTM3U\n").await?;

    let error = transcoder()
        .transcode(&ManifestSource::parse(&url)?, output.path())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Enumeration);
    match error {
        TranscodeError::AllRepresentationsSkipped(skipped) => {
            let reasons: Vec<_> = skipped
                .iter()
                .map(|s| (s.id.as_str(), s.reason.clone()))
                .collect();
            assert_eq!(
                reasons,
                vec![
                    ("no-template", EnumerationError::MissingTemplate),
                    ("no-media", EnumerationError::MissingMedia),
                ]
            );
        }
        e => panic!("unexpected error: {e:?}"),
    }
    assert!(!output.path().join("master.m3u8").exists());
    Ok(())
}

#[tokio::test]
async fn test_failed_fetch_removes_stale_master() -> anyhow::Result<()> {
    let (_, mock_server) = setup_mock_server(TIMELINE_MPD).await;
    let output = tempfile::tempdir()?;
    tokio::fs::write(output.path().join("master.m3u8"), "#EXTM3U\n").await?;

    let url = format!("{}/missing.mpd", mock_server.uri());
    transcoder()
        .transcode(&ManifestSource::parse(&url)?, output.path())
        .await
        .assert_error();

    assert!(!output.path().join("master.m3u8").exists());
    Ok(())
}

#[tokio::test]
async fn test_empty_manifest() -> anyhow::Result<()> {
    let (url, _mock_server) = setup_mock_server(EMPTY_MPD).await;
    let output = tempfile::tempdir()?;
    let output_dir = output.path().join("out");

    let report = transcoder()
        .transcode(&ManifestSource::parse(&url)?, &output_dir)
        .await?;

    assert_eq!(report.total, 0);
    assert!(report.master_path.is_none());
    assert!(!output_dir.exists());
    Ok(())
}

#[tokio::test]
async fn test_malformed_manifest() -> anyhow::Result<()> {
    let (url, _mock_server) = setup_mock_server("<MPD><Period></MPD>").await;
    let output = tempfile::tempdir()?;

    let error = transcoder()
        .transcode(&ManifestSource::parse(&url)?, output.path())
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Parse);
    Ok(())
}

#[tokio::test]
async fn test_deterministic_output() -> anyhow::Result<()> {
    let (url, _mock_server) = setup_mock_server(TIMELINE_MPD).await;
    let source = ManifestSource::parse(&url)?;
    let first = tempfile::tempdir()?;
    let second = tempfile::tempdir()?;

    transcoder().transcode(&source, first.path()).await?;
    transcoder().transcode(&source, second.path()).await?;

    for name in ["master.m3u8", "video-720p_video.m3u8", "audio-ja_audio.m3u8"] {
        assert_eq!(
            tokio::fs::read(first.path().join(name)).await?,
            tokio::fs::read(second.path().join(name)).await?,
            "{name} differs between runs"
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_transcode_into_hls_folder() -> anyhow::Result<()> {
    let (url, _mock_server) = setup_mock_server(TIMELINE_MPD).await;
    let root = tempfile::tempdir()?;

    let folder = hls_folder_for(&Url::parse(&url)?, root.path())?;
    assert_eq!(folder, root.path().join("media"));

    transcoder()
        .transcode(&ManifestSource::parse(&url)?, &folder)
        .await?;
    assert!(folder.join("master.m3u8").exists());
    Ok(())
}
