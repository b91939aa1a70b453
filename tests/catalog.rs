use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use assert_matches::assert_matches;

use awesome_video_catalog::cache::CacheStore;
use awesome_video_catalog::catalog::Catalog;
use awesome_video_catalog::error::CatalogError;
use awesome_video_catalog::fetcher::{ContentsClient, RemoteFetcher, Source};

const SOURCE: &str = "https://contents.test/contents.json";

struct FixtureClient {
    body: Option<String>,
    calls: AtomicUsize,
}

impl FixtureClient {
    fn serving(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn fixture(name: &str) -> Self {
        Self::serving(&fs::read_to_string(format!("tests/fixtures/{name}")).unwrap())
    }

    fn offline() -> Self {
        Self {
            body: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ContentsClient for &FixtureClient {
    fn get_text(&self, _url: &str) -> Result<String, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.body
            .clone()
            .ok_or_else(|| CatalogError::Http("connection refused".to_string()))
    }
}

fn catalog(client: &FixtureClient) -> Catalog<&FixtureClient> {
    let fetcher = RemoteFetcher::new(client, vec![Source::direct_only(SOURCE)]);
    Catalog::new(fetcher, CacheStore::in_memory())
}

fn titles(resources: &[awesome_video_catalog::domain::VideoResource]) -> Vec<&str> {
    resources.iter().map(|r| r.title.as_str()).collect()
}

#[test]
fn categories_are_cached_after_first_fetch() {
    let client = FixtureClient::fixture("contents_flat.json");
    let catalog = catalog(&client);

    let first = catalog.list_categories().unwrap();
    let second = catalog.list_categories().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert_eq!(client.calls(), 1);

    catalog.refresh().unwrap();
    assert_eq!(client.calls(), 2);
}

#[test]
fn get_category_by_slug() {
    let client = FixtureClient::fixture("contents_flat.json");
    let catalog = catalog(&client);

    let category = catalog.get_category("streaming").unwrap().unwrap();
    assert_eq!(category.name, "Streaming");
    assert!(catalog.get_category("Streaming").unwrap().is_none());
    assert!(catalog.get_category("").unwrap().is_none());
}

#[test]
fn resources_follow_subcategory_paths() {
    let client = FixtureClient::fixture("contents_flat.json");
    let catalog = catalog(&client);

    let whole = catalog.list_resources("streaming", None).unwrap();
    assert_eq!(whole.len(), 5);
    assert_eq!(whole[0].subcategory, None);

    let nested = catalog
        .list_resources("streaming", Some("hls/low-latency"))
        .unwrap();
    assert_eq!(titles(&nested), ["LL-HLS Spec"]);
    assert_eq!(nested[0].category, "Streaming");
    assert_eq!(nested[0].subcategory.as_deref(), Some("Low Latency"));

    let hls = catalog.list_resources("streaming", Some("hls")).unwrap();
    assert_eq!(titles(&hls), ["hls.js", "Shaka Player"]);
}

#[test]
fn unresolved_paths_are_empty() {
    let client = FixtureClient::fixture("contents_flat.json");
    let catalog = catalog(&client);

    assert!(catalog.list_resources("streaming", Some("hls/nope")).unwrap().is_empty());
    assert!(catalog.list_resources("streaming", Some("nope/hls")).unwrap().is_empty());
    assert!(catalog.list_resources("nope", None).unwrap().is_empty());
}

#[test]
fn blank_search_does_not_fetch() {
    let client = FixtureClient::fixture("contents_flat.json");
    let catalog = catalog(&client);

    assert!(catalog.search("").unwrap().is_empty());
    assert!(catalog.search("   ").unwrap().is_empty());
    assert!(catalog.search("#").unwrap().is_empty());
    assert_eq!(client.calls(), 0);
}

#[test]
fn text_search_covers_description_and_tags() {
    let client = FixtureClient::fixture("contents_flat.json");
    let catalog = catalog(&client);

    let found = catalog.search("EVERYTHING about").unwrap();
    assert_eq!(titles(&found), ["Streaming Overview"]);

    let found = catalog.search("latency").unwrap();
    assert_eq!(titles(&found), ["LL-HLS Spec"]);
}

#[test]
fn tag_search_ignores_titles() {
    let doc = r#"{
        "categories": [{ "id": "web", "title": "Web" }],
        "projects": [
            { "title": "React Player", "category": "web", "tags": ["video"] },
            { "title": "Player kit", "category": "web", "tags": ["React"] }
        ]
    }"#;
    let client = FixtureClient::serving(doc);
    let catalog = catalog(&client);

    assert_eq!(titles(&catalog.search("#react").unwrap()), ["Player kit"]);
    assert_eq!(titles(&catalog.search("tag:react").unwrap()), ["Player kit"]);
    assert_eq!(catalog.search("react").unwrap().len(), 2);
}

#[test]
fn tags_are_counted_across_the_tree() {
    let client = FixtureClient::fixture("contents_flat.json");
    let catalog = catalog(&client);

    let tags = catalog.get_all_tags().unwrap();
    let top = tags
        .iter()
        .take(3)
        .map(|t| (t.tag.as_str(), t.count))
        .collect::<Vec<_>>();
    assert_eq!(top, [("hls", 4), ("javascript", 3), ("dash", 2)]);
}

#[test]
fn videos_by_tag_match_whole_tags() {
    let client = FixtureClient::fixture("contents_flat.json");
    let catalog = catalog(&client);

    let tagged = catalog.get_videos_by_tag("HLS").unwrap();
    assert_eq!(
        titles(&tagged),
        ["hls.js", "Shaka Player", "LL-HLS Spec", "Shaka Player"]
    );
    assert!(catalog.get_videos_by_tag("hl").unwrap().is_empty());
}

#[test]
fn offline_catalog_reports_fetch_failure() {
    let client = FixtureClient::offline();
    let catalog = catalog(&client);

    assert_matches!(
        catalog.list_categories(),
        Err(CatalogError::FetchFailed { attempts: 1, .. })
    );
    assert_matches!(catalog.search("hls"), Err(CatalogError::FetchFailed { .. }));
}

#[test]
fn empty_and_malformed_documents_are_errors() {
    let client = FixtureClient::serving(r#"{"categories": []}"#);
    let empty = catalog(&client);
    assert_matches!(empty.list_categories(), Err(CatalogError::EmptyCatalog));
    assert!(empty.cache().get().data.is_none());

    let client = FixtureClient::serving(r#"{"sections": []}"#);
    assert_matches!(
        catalog(&client).list_categories(),
        Err(CatalogError::SchemaMismatch)
    );
}
