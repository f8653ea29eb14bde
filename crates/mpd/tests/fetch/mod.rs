use iori_mpd::{fetch::load_manifest, HttpClient, MpdError};
use reqwest::{Client, Url};
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::AssertWrapper;

const MANIFEST: &str = include_str!("../fixtures/audio_only.mpd");

#[tokio::test]
async fn test_load_manifest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/live/manifest.mpd"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MANIFEST))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(Client::builder()).assert_success();
    let url = Url::parse(&format!("{}/live/manifest.mpd", server.uri())).assert_success();
    let (final_url, text) = load_manifest(&client, url.clone(), 3).await.assert_success();

    assert_eq!(final_url, url);
    assert_eq!(text, MANIFEST);

    let requests = server.received_requests().await.assert_success();
    let accept = requests[0]
        .headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .assert_success();
    assert_eq!(accept, "application/dash+xml,video/vnd.mpeg.dash.mpd");
}

#[tokio::test]
async fn test_load_manifest_follows_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old.mpd"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "/new/manifest.mpd"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new/manifest.mpd"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MANIFEST))
        .mount(&server)
        .await;

    let client = HttpClient::new(Client::builder()).assert_success();
    let url = Url::parse(&format!("{}/old.mpd", server.uri())).assert_success();
    let (final_url, _) = load_manifest(&client, url, 1).await.assert_success();

    assert_eq!(final_url.path(), "/new/manifest.mpd");
}

#[tokio::test]
async fn test_load_manifest_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manifest.mpd"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = HttpClient::new(Client::builder()).assert_success();
    let url = Url::parse(&format!("{}/manifest.mpd", server.uri())).assert_success();
    let result = load_manifest(&client, url.clone(), 3).await;

    assert!(matches!(result, Err(MpdError::ManifestFetch(failed)) if failed == url));
}

#[tokio::test]
async fn test_load_manifest_without_retries_still_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manifest.mpd"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MANIFEST))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(Client::builder()).assert_success();
    let url = Url::parse(&format!("{}/manifest.mpd", server.uri())).assert_success();
    let (_, text) = load_manifest(&client, url, 0).await.assert_success();
    assert_eq!(text, MANIFEST);
}

#[tokio::test]
async fn test_cookies_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manifest.mpd"))
        .and(header("cookie", "session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MANIFEST))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(Client::builder()).assert_success();
    let url = Url::parse(&format!("{}/manifest.mpd", server.uri())).assert_success();
    client
        .add_cookies(vec!["session=abc".to_string()], url.clone())
        .assert_success();
    load_manifest(&client, url, 1).await.assert_success();
}
