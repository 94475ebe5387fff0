//! Integration tests for TravelKit using wiremock

use std::path::Path;
use std::time::Duration;
use travelkit::fetchers::{CITY_PAGE_REFERER, CITY_PAGE_USER_AGENT};
use travelkit::{Config, Endpoint, ItemOutcome, Pipeline, TravelError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMBASSY_PATH: &str = "/EmbassyService2/getEmbassyList2";
const VISA_PATH: &str = "/EntranceVisaService2/getEntranceVisaList2";
const CONTACT_PATH: &str = "/LocalContactService2/getLocalContactList2";
const ISO_PARAM: &str = "cond[country_iso_alp2::EQ]";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn pipeline(server: &MockServer, root: &Path) -> Pipeline {
    init_tracing();
    let config = Config::builder("test-key")
        .gov_base_url(server.uri())
        .nomad_base_url(server.uri())
        .output_root(root)
        .pacing(Duration::ZERO)
        .build()
        .unwrap();
    Pipeline::new(config).unwrap()
}

fn write_digest(root: &Path, json: &str) {
    let dir = root.join("city_data_json");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("output.json"), json).unwrap();
}

async fn mount_country(server: &MockServer, api_path: &str, code: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(api_path))
        .and(query_param("serviceKey", "test-key"))
        .and(query_param(ISO_PARAM, code))
        .and(query_param("returnType", "JSON"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_embassy_info_written_per_country() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    write_digest(
        root.path(),
        r#"{
            "seoul": {"details": {"country": {"value": "South Korea"}}},
            "busan": {"details": {"country": {"value": "South Korea"}}},
            "tokyo": {"details": {"country": {"value": "Japan"}}},
            "nowhere": {"details": {"country": {"value": ""}}}
        }"#,
    );

    let kr_body = r#"{"response":{"body":{"items":{"item":[{"country_iso_alp2":"KR"}]}}}}"#;
    let jp_body = r#"{"response":{"body":{"items":{"item":[{"country_iso_alp2":"JP"}]}}}}"#;
    mount_country(&server, EMBASSY_PATH, "KR", 200, kr_body).await;
    mount_country(&server, EMBASSY_PATH, "JP", 200, jp_body).await;

    let report = pipeline(&server, root.path())
        .fetch_embassy_info()
        .await
        .unwrap();

    assert_eq!(report.category, "embassy");
    assert_eq!(report.items.len(), 2);
    assert_eq!(report.saved(), 2);

    let dir = root.path().join("embassy_info_json");
    assert_eq!(std::fs::read_to_string(dir.join("KR.json")).unwrap(), kr_body);
    assert_eq!(std::fs::read_to_string(dir.join("JP.json")).unwrap(), jp_body);
}

#[tokio::test]
async fn test_unresolvable_country_is_skipped() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    write_digest(
        root.path(),
        r#"{
            "atlantis": {"details": {"country": {"value": "Atlantis"}}},
            "paris": {"details": {"country": {"value": "France"}}}
        }"#,
    );
    mount_country(&server, VISA_PATH, "FR", 200, "{}").await;

    let report = pipeline(&server, root.path())
        .fetch_visa_info()
        .await
        .unwrap();

    assert!(report.outcome("Atlantis").unwrap().is_skipped());
    assert!(matches!(
        report.outcome("France"),
        Some(ItemOutcome::Saved { .. })
    ));
    assert!(report.is_clean());

    let dir = root.path().join("visa_info_json");
    let files: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(files, vec!["FR.json"]);
}

#[tokio::test]
async fn test_non_200_writes_nothing_and_continues() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    mount_country(&server, EMBASSY_PATH, "DE", 500, "Internal Server Error").await;
    mount_country(&server, EMBASSY_PATH, "IT", 200, r#"{"ok":true}"#).await;

    let countries = vec!["Germany".to_string(), "Italy".to_string()];
    let report = pipeline(&server, root.path())
        .fetch_info_for(&countries, Endpoint::Embassy)
        .await;

    assert_eq!(
        report.outcome("Germany"),
        Some(&ItemOutcome::Failed {
            error: "Unexpected status code: 500".to_string()
        })
    );
    assert!(matches!(
        report.outcome("Italy"),
        Some(ItemOutcome::Saved { bytes: 11, .. })
    ));

    let dir = root.path().join("embassy_info_json");
    assert!(!dir.join("DE.json").exists());
    assert!(dir.join("IT.json").exists());
}

#[tokio::test]
async fn test_rerun_overwrites_previous_file() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("emergency_contact_json");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("TH.json"), r#"{"stale":true,"extra":"field"}"#).unwrap();

    mount_country(&server, CONTACT_PATH, "TH", 200, r#"{"fresh":true}"#).await;

    let countries = vec!["Thailand".to_string()];
    let report = pipeline(&server, root.path())
        .fetch_info_for(&countries, Endpoint::EmergencyContact)
        .await;

    assert_eq!(report.saved(), 1);
    assert_eq!(
        std::fs::read_to_string(dir.join("TH.json")).unwrap(),
        r#"{"fresh":true}"#
    );
}

#[tokio::test]
async fn test_body_saved_byte_for_byte() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    let body: Vec<u8> = b"{\"name\":\"\xEB\x8C\x80\xED\x95\x9C\xEB\xAF\xBC\xEA\xB5\xAD\"}\n".to_vec();

    Mock::given(method("GET"))
        .and(path(EMBASSY_PATH))
        .and(query_param(ISO_PARAM, "VN"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let out = root.path().join("custom");
    let report = pipeline(&server, root.path())
        .fetch_info_into(&["Vietnam".to_string()], Endpoint::Embassy, &out)
        .await;

    assert_eq!(report.saved(), 1);
    assert_eq!(std::fs::read(out.join("VN.json")).unwrap(), body);
}

#[tokio::test]
async fn test_missing_digest_halts_before_any_request() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    let result = pipeline(&server, root.path()).fetch_embassy_info().await;

    assert!(matches!(result, Err(TravelError::Io { .. })));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_digest_is_parse_error() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    write_digest(root.path(), r#"["seoul", "tokyo"]"#);

    let result = pipeline(&server, root.path()).fetch_visa_info().await;

    assert!(matches!(result, Err(TravelError::Parse { .. })));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_slow_upstream_times_out_per_item() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(EMBASSY_PATH))
        .and(query_param(ISO_PARAM, "PE"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    mount_country(&server, EMBASSY_PATH, "CL", 200, "{}").await;

    let config = Config::builder("test-key")
        .gov_base_url(server.uri())
        .output_root(root.path())
        .request_timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let pipeline = Pipeline::new(config).unwrap();

    let countries = vec!["Peru".to_string(), "Chile".to_string()];
    let report = pipeline.fetch_info_for(&countries, Endpoint::Embassy).await;

    assert_eq!(
        report.outcome("Peru"),
        Some(&ItemOutcome::Failed {
            error: "Request timed out".to_string()
        })
    );
    assert!(matches!(
        report.outcome("Chile"),
        Some(ItemOutcome::Saved { .. })
    ));
}

#[tokio::test]
async fn test_concurrent_batch_reports_every_country() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    let codes = ["ES", "PT", "GR", "HR", "MX"];
    for code in codes {
        mount_country(&server, VISA_PATH, code, 200, &format!("{{\"code\":\"{}\"}}", code)).await;
    }

    let config = Config::builder("test-key")
        .gov_base_url(server.uri())
        .output_root(root.path())
        .concurrency(3)
        .build()
        .unwrap();
    let pipeline = Pipeline::new(config).unwrap();

    let countries: Vec<String> = ["Spain", "Portugal", "Greece", "Croatia", "Mexico"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let report = pipeline.fetch_info_for(&countries, Endpoint::Visa).await;

    assert_eq!(report.saved(), 5);
    let order: Vec<&str> = report.items.iter().map(|r| r.item.as_str()).collect();
    assert_eq!(order, vec!["Spain", "Portugal", "Greece", "Croatia", "Mexico"]);
    for code in codes {
        let saved = std::fs::read_to_string(root.path().join("visa_info_json").join(format!("{}.json", code)))
            .unwrap();
        assert!(saved.contains(code));
    }
}

#[tokio::test]
async fn test_city_pages_sent_with_browser_headers() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/modal/city/seoul"))
        .and(header("referer", CITY_PAGE_REFERER))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>Seoul</html>", "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/modal/city/tokyo"))
        .respond_with(ResponseTemplate::new(403).set_body_string("blocked"))
        .mount(&server)
        .await;

    let report = pipeline(&server, root.path())
        .fetch_city_pages()
        .await
        .unwrap();

    assert_eq!(report.category, "cities");
    assert_eq!(report.saved(), 1);
    assert_eq!(report.failed(), 1);

    let dir = root.path().join("city_data_json");
    assert_eq!(
        std::fs::read_to_string(dir.join("seoul_page.html")).unwrap(),
        "<html>Seoul</html>"
    );
    assert!(!dir.join("tokyo_page.html").exists());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url.query(), Some("2024-11-15"));
    for request in &requests {
        assert_eq!(
            request.headers.get("user-agent").unwrap().to_str().unwrap(),
            CITY_PAGE_USER_AGENT
        );
    }
}

#[tokio::test]
async fn test_city_pages_abort_when_output_dir_unusable() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    // A regular file where the output root directory should be
    let blocker = root.path().join("output");
    std::fs::write(&blocker, "not a directory").unwrap();

    let result = pipeline(&server, &blocker).fetch_city_pages().await;

    assert!(matches!(result, Err(TravelError::Io { .. })));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_collect_after_fetch() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    mount_country(&server, EMBASSY_PATH, "JP", 200, r#"{"embassy":"Tokyo"}"#).await;
    mount_country(&server, EMBASSY_PATH, "KR", 200, r#"{"embassy":"Seoul"}"#).await;

    let pipeline = pipeline(&server, root.path());
    let countries = vec!["Japan".to_string(), "South Korea".to_string()];
    pipeline.fetch_info_for(&countries, Endpoint::Embassy).await;

    let report = pipeline.collect_info(Endpoint::Embassy).await.unwrap();
    assert_eq!(report.saved(), 2);

    let digest: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(root.path().join("embassy_info_json").join("output.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(digest["JP"]["embassy"], "Tokyo");
    assert_eq!(digest["KR"]["embassy"], "Seoul");
}

fn city_page(country: &str) -> String {
    format!(
        r#"<html><body><table class="details">
            <tr data-key="overall" data-value="4.5"><td>Overall</td></tr>
            <tr><td class="key">🌍 Country</td><td class="value"><a href="https://nomads.com/x?ref=modal">{}</a></td></tr>
        </table></body></html>"#,
        country
    )
}

#[tokio::test]
async fn test_city_pages_to_digest_to_embassy_info() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/modal/city/seoul"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(city_page("Republic of Korea"), "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/modal/city/tokyo"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(city_page("Japan"), "text/html"))
        .mount(&server)
        .await;
    mount_country(&server, EMBASSY_PATH, "KR", 200, r#"{"embassy":"Seoul"}"#).await;
    mount_country(&server, EMBASSY_PATH, "JP", 200, r#"{"embassy":"Tokyo"}"#).await;

    let pipeline = pipeline(&server, root.path());
    let cities = pipeline.fetch_city_pages().await.unwrap();
    assert_eq!(cities.saved(), 2);

    let digest = pipeline.build_city_digest().await.unwrap();
    assert_eq!(digest.category, "digest");
    assert_eq!(digest.saved(), 2);

    let digest_json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(root.path().join("city_data_json").join("output.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(digest_json["seoul"]["details"]["country"]["value"], "Republic of Korea");
    assert_eq!(digest_json["tokyo"]["scores"]["overall"], "4.5");

    assert_eq!(
        pipeline.load_countries().unwrap(),
        vec!["Japan", "Republic of Korea"]
    );

    let report = pipeline.fetch_embassy_info().await.unwrap();
    assert_eq!(report.saved(), 2);
    assert!(report.is_clean());

    let dir = root.path().join("embassy_info_json");
    assert_eq!(
        std::fs::read_to_string(dir.join("KR.json")).unwrap(),
        r#"{"embassy":"Seoul"}"#
    );
    assert_eq!(
        std::fs::read_to_string(dir.join("JP.json")).unwrap(),
        r#"{"embassy":"Tokyo"}"#
    );
}

#[tokio::test]
async fn test_digest_without_city_pages_is_io_error() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    let result = pipeline(&server, root.path()).build_city_digest().await;

    assert!(matches!(result, Err(TravelError::Io { .. })));
}
