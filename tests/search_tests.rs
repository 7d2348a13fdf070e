//! Search backend tests against a mocked MediaWiki API

use research_panel::tools::quality::encyclopedia_observation;
use research_panel::tools::{SearchBackend, WikipediaSearch};
use research_panel::types::{AppError, BackendKind};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn wiki_hits(titles: &[&str]) -> serde_json::Value {
    let hits: Vec<serde_json::Value> = titles
        .iter()
        .map(|t| {
            json!({
                "ns": 0,
                "title": t,
                "pageid": 1,
                "snippet": format!("<span class=\"searchmatch\">{}</span> &amp; more", t)
            })
        })
        .collect();
    json!({ "batchcomplete": "", "query": { "search": hits } })
}

#[tokio::test]
async fn test_wikipedia_search_maps_hits() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("list", "search"))
        .and(query_param("srsearch", "grid storage"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(wiki_hits(&[
                "Grid energy storage",
                "Battery storage power station",
                "Pumped-storage hydroelectricity",
            ])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let wiki = WikipediaSearch::new(mock_server.uri(), 2);
    assert_eq!(wiki.kind(), BackendKind::Wikipedia);

    let results = wiki.search("grid storage").await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, "Grid energy storage");
    assert_eq!(
        results[0].url,
        format!("{}/wiki/Grid_energy_storage", mock_server.uri())
    );
    assert_eq!(results[0].source_id, results[0].url);
    assert_eq!(results[0].snippet, "Grid energy storage & more");
    assert!(results[0].authority_score.is_some());

    let metrics = encyclopedia_observation("grid storage", &results);
    assert!(metrics.contains("Found 2 Wikipedia articles"));
}

#[tokio::test]
async fn test_wikipedia_search_without_hits() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "batchcomplete": "" })))
        .mount(&mock_server)
        .await;

    let wiki = WikipediaSearch::new(mock_server.uri(), 2);
    let results = wiki.search("zzzz unknown").await.unwrap();
    assert!(results.is_empty());
    assert_eq!(
        encyclopedia_observation("zzzz unknown", &results),
        "Found 0 Wikipedia articles"
    );
}

#[tokio::test]
async fn test_wikipedia_http_error_is_transport() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let wiki = WikipediaSearch::new(mock_server.uri(), 2);
    let err = wiki.search("solar").await.unwrap_err();
    assert!(matches!(err, AppError::Transport(_)));
}
