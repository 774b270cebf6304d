use std::time::Duration;

use mpd2hls::{dash::BaseUrl, ErrorKind, HttpClient, ManifestSource, TranscodeError};
use wiremock::{
    matchers::{header_regex, method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::{AssertWrapper, TIMELINE_MPD};

pub(crate) async fn setup_mock_server(body: &str) -> (String, MockServer) {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/media/manifest.mpd"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    (format!("{}/media/manifest.mpd", mock_server.uri()), mock_server)
}

fn client() -> HttpClient {
    HttpClient::with_timeout(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_load_remote() -> anyhow::Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/manifest.mpd"))
        .and(header_regex("accept", r"application/dash\+xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TIMELINE_MPD))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/media/manifest.mpd?token=abc", mock_server.uri());
    let loaded = ManifestSource::parse(&url)?.load(&client()).await?;

    assert_eq!(loaded.text, TIMELINE_MPD);
    assert_eq!(
        loaded.root_base.as_str(),
        format!("{}/media/", mock_server.uri())
    );
    Ok(())
}

#[tokio::test]
async fn test_load_follows_redirect() -> anyhow::Result<()> {
    let (_, mock_server) = setup_mock_server(TIMELINE_MPD).await;
    Mock::given(method("GET"))
        .and(path("/old/manifest.mpd"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/media/manifest.mpd", mock_server.uri())),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/old/manifest.mpd", mock_server.uri());
    let loaded = ManifestSource::parse(&url)?.load(&client()).await?;

    assert_eq!(
        loaded.root_base,
        BaseUrl::Remote(format!("{}/media/", mock_server.uri()).parse()?)
    );
    Ok(())
}

#[tokio::test]
async fn test_load_http_error() -> anyhow::Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("x".repeat(2048)))
        .mount(&mock_server)
        .await;

    let url = format!("{}/media/manifest.mpd", mock_server.uri());
    let error = ManifestSource::parse(&url)?.load(&client()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Fetch);
    match error {
        TranscodeError::HttpError { status, body } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(body.assert_success().len(), 512);
        }
        e => panic!("unexpected error: {e:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_load_timeout() -> anyhow::Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(TIMELINE_MPD)
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_timeout(Duration::from_millis(200))?;
    let url = format!("{}/media/manifest.mpd", mock_server.uri());
    let error = ManifestSource::parse(&url)?.load(&client).await.unwrap_err();

    assert!(error.is_timeout());
    assert_eq!(error.kind(), ErrorKind::Fetch);
    Ok(())
}

#[tokio::test]
async fn test_load_local() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("manifest.mpd");
    tokio::fs::write(&file, TIMELINE_MPD).await?;

    let loaded = ManifestSource::parse(file.to_str().unwrap())?
        .load(&client())
        .await?;
    assert_eq!(loaded.text, TIMELINE_MPD);
    assert_eq!(
        loaded.root_base.as_str(),
        format!("{}/", dir.path().display())
    );

    let error = ManifestSource::parse(dir.path().join("missing.mpd").to_str().unwrap())?
        .load(&client())
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Io);
    Ok(())
}

#[tokio::test]
async fn test_load_invalid_utf8() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("manifest.mpd");
    tokio::fs::write(&file, [0xff, 0xfe, 0x3c]).await?;

    ManifestSource::Local(file)
        .load(&client())
        .await
        .assert_error();
    Ok(())
}
