use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use awesome_video_catalog::error::CatalogError;
use awesome_video_catalog::fetcher::{ContentsClient, ProxyTemplate, RemoteFetcher, Source};

const PRIMARY: &str = "https://primary.test/contents.json";
const MIRROR: &str = "https://mirror.test/contents.json";

#[derive(Default)]
struct ScriptedClient {
    bodies: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn serve(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ContentsClient for ScriptedClient {
    fn get_text(&self, url: &str) -> Result<String, CatalogError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.bodies
            .get(url)
            .cloned()
            .ok_or(CatalogError::HttpStatus {
                status: 404,
                message: "not found".to_string(),
            })
    }
}

impl ContentsClient for &ScriptedClient {
    fn get_text(&self, url: &str) -> Result<String, CatalogError> {
        (**self).get_text(url)
    }
}

fn relay() -> ProxyTemplate {
    "https://relay.test/?{url}".parse().unwrap()
}

fn relayed(url: &str) -> String {
    relay().wrap(url)
}

#[test]
fn first_good_source_wins() {
    let client = ScriptedClient::default().serve(PRIMARY, r#"{"categories": []}"#);
    let fetcher = RemoteFetcher::new(&client, vec![Source::new(PRIMARY), Source::new(MIRROR)])
        .with_proxies(vec![relay()]);

    let fetched = fetcher.fetch().unwrap();
    assert_eq!(fetched.origin, PRIMARY);
    assert_eq!(client.calls(), vec![PRIMARY]);
}

#[test]
fn relay_is_tried_before_next_source() {
    let client = ScriptedClient::default().serve(MIRROR, r#"{"categories": []}"#);
    let fetcher = RemoteFetcher::new(&client, vec![Source::new(PRIMARY), Source::new(MIRROR)])
        .with_proxies(vec![relay()]);

    let fetched = fetcher.fetch().unwrap();
    assert_eq!(fetched.origin, MIRROR);
    assert_eq!(
        client.calls(),
        vec![PRIMARY.to_string(), relayed(PRIMARY), MIRROR.to_string()]
    );
}

#[test]
fn relay_can_rescue_a_source() {
    let client = ScriptedClient::default().serve(&relayed(PRIMARY), r#"{"categories": [1]}"#);
    let fetcher = RemoteFetcher::new(&client, vec![Source::new(PRIMARY)]).with_proxies(vec![relay()]);

    let fetched = fetcher.fetch().unwrap();
    assert_eq!(fetched.origin, relayed(PRIMARY));
    assert_eq!(fetched.document["categories"][0], 1);
}

#[test]
fn direct_only_sources_skip_relays() {
    let client = ScriptedClient::default();
    let fetcher =
        RemoteFetcher::new(&client, vec![Source::direct_only(PRIMARY)]).with_proxies(vec![relay()]);

    assert_matches!(
        fetcher.fetch(),
        Err(CatalogError::FetchFailed { attempts: 1, .. })
    );
    assert_eq!(client.calls(), vec![PRIMARY]);
}

#[test]
fn invalid_json_moves_on() {
    let client = ScriptedClient::default()
        .serve(PRIMARY, "<html>rate limited</html>")
        .serve(MIRROR, r#"{"categories": []}"#);
    let fetcher = RemoteFetcher::new(
        &client,
        vec![Source::direct_only(PRIMARY), Source::direct_only(MIRROR)],
    );

    assert_eq!(fetcher.fetch().unwrap().origin, MIRROR);
}

#[test]
fn local_bundle_is_last_resort() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contents.json");
    fs::write(&path, r#"{"categories": [], "projects": []}"#).unwrap();
    let path = Utf8PathBuf::from_path_buf(path).unwrap();

    let client = ScriptedClient::default();
    let fetcher = RemoteFetcher::new(&client, vec![Source::new(PRIMARY)])
        .with_proxies(vec![relay()])
        .with_local_bundle(Some(path.clone()));

    let fetched = fetcher.fetch().unwrap();
    assert_eq!(fetched.origin, path.as_str());
    assert_eq!(client.calls().len(), 2);
}

#[test]
fn total_failure_reports_attempts_and_last_error() {
    let client = ScriptedClient::default();
    let fetcher = RemoteFetcher::new(&client, vec![Source::new(PRIMARY), Source::new(MIRROR)])
        .with_proxies(vec![relay()])
        .with_local_bundle(Some(Utf8PathBuf::from("/nonexistent/contents.json")));

    let err = fetcher.fetch().unwrap_err();
    assert_matches!(
        &err,
        CatalogError::FetchFailed { attempts: 5, last_error } if last_error.contains("bundled contents")
    );
    assert!(err.is_transport());
}

#[test]
fn no_sources_is_a_failure() {
    let fetcher = RemoteFetcher::new(ScriptedClient::default(), Vec::new());
    assert_matches!(
        fetcher.fetch(),
        Err(CatalogError::FetchFailed { attempts: 0, last_error }) if last_error.contains("no contents sources")
    );
}
