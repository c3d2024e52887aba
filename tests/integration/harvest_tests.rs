//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and test
//! complete walks and runs end-to-end, including the delimited output.

use greyharvest::config::{Config, Method};
use greyharvest::crawler::{
    build_http_client, Coordinator, Extractor, Plan, StopReason, WalkOptions, Walker,
};
use greyharvest::record::fields;
use greyharvest::RunCounter;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with no pauses and no redirect resolution
fn create_test_config(csv_path: Option<std::path::PathBuf>) -> Config {
    let mut config = Config::default();
    config.crawler.sleep_seconds = 0;
    config.crawler.resolve_redirects = false;
    config.output.csv_path = csv_path;
    config
}

fn walker(config: &Config) -> Walker {
    Walker::new(
        build_http_client(&config.crawler).expect("client"),
        Extractor::new().expect("selectors"),
        WalkOptions::from(config),
    )
}

fn article_page(titles: &[&str], previous: Option<&str>) -> String {
    let mut html = String::from("<html><body><main>");
    for title in titles {
        html.push_str(&format!(
            r#"<article>
                <h2><a href="/doc/{0}/" title="{0}" rel="bookmark">{0}</a></h2>
                <time class="entry-date published" datetime="2019-06-01T09:00:00+00:00">1 June 2019</time>
                <span class="category"><a href="/c/screening/">Screening</a>, <a href="/c/nhs/">NHS</a></span>
            </article>"#,
            title
        ));
    }
    html.push_str("</main>");
    if let Some(previous) = previous {
        html.push_str(&format!(
            r#"<nav><ul class="pager"><li class="previous"><a href="{}">&larr; Older posts</a></li></ul></nav>"#,
            previous
        ));
    }
    html.push_str("</body></html>");
    html
}

fn listing_page(rows: std::ops::RangeInclusive<u32>) -> String {
    let mut html = String::from("<html><body>");
    for n in rows {
        html.push_str(&format!(
            r#"<div class="weblib-item-row">
                <span class="weblib-item-index">{n}</span>
                <span class="weblib-item-thumb"></span>
                <span class="weblib-item-title"><a href="?barcode={n:016}">Report {n}</a></span>
                <br>Public Health England<br>Call Number:&nbsp;PHE-{n}
            </div>"#
        ));
    }
    html.push_str("</body></html>");
    html
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_listing(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/catalogue/"))
        .and(query_param("pagenum", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_walk_three_page_chain_in_order() {
    let server = MockServer::start().await;
    mount_page(&server, "/2019/06/", article_page(&["a", "b"], Some("/2019/06/page/2/"))).await;
    mount_page(&server, "/2019/06/page/2/", article_page(&["c"], Some("/2019/06/page/3/"))).await;
    mount_page(&server, "/2019/06/page/3/", article_page(&["d", "e"], None)).await;

    let config = create_test_config(None);
    let outcome = walker(&config)
        .walk(&format!("{}/2019/06/", server.uri()), RunCounter::new())
        .await;

    assert_eq!(outcome.stop, StopReason::Exhausted);
    assert_eq!(outcome.pages_visited, 3);

    let titles: Vec<&str> = outcome
        .records
        .iter()
        .map(|r| r.get(fields::TITLE).unwrap())
        .collect();
    assert_eq!(titles, vec!["a", "b", "c", "d", "e"]);

    let first = &outcome.records[0];
    assert_eq!(first.get(fields::DATE), Some("2019-06-01T09:00:00+00:00"));
    assert_eq!(first.get(fields::CATEGORIES), Some("Screening;NHS"));
    assert!(outcome.records.iter().all(|r| !r.has_error()));
}

#[tokio::test]
async fn test_walk_unreachable_page_keeps_earlier_records() {
    let server = MockServer::start().await;
    mount_page(&server, "/2019/06/", article_page(&["a", "b"], Some("/2019/06/page/2/"))).await;
    Mock::given(method("GET"))
        .and(path("/2019/06/page/2/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = create_test_config(None);
    let outcome = walker(&config)
        .walk(&format!("{}/2019/06/", server.uri()), RunCounter::new())
        .await;

    assert_eq!(
        outcome.stop,
        StopReason::Unreachable(format!("{}/2019/06/page/2/", server.uri()))
    );
    assert_eq!(outcome.records.len(), 2);
}

#[tokio::test]
async fn test_walk_malformed_article_does_not_drop_others() {
    let server = MockServer::start().await;
    let mut html = article_page(&["a", "b"], None);
    html = html.replace(
        "</main>",
        "<article><h2>No link here</h2></article></main>",
    );
    mount_page(&server, "/2019/06/", html).await;

    let config = create_test_config(None);
    let outcome = walker(&config)
        .walk(&format!("{}/2019/06/", server.uri()), RunCounter::new())
        .await;

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(
        outcome.records.iter().filter(|r| r.has_error()).count(),
        1
    );
}

#[tokio::test]
async fn test_catalogue_run_ten_rows_then_empty_page() {
    let server = MockServer::start().await;
    mount_listing(&server, "1", listing_page(1..=10)).await;
    mount_listing(&server, "2", listing_page(1..=0)).await;

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("catalogue.tsv");
    let mut config = create_test_config(Some(csv_path.clone()));
    config.site.catalogue_url = format!(
        "{}/catalogue/?searchby=title&pagenum={{page}}&per_page={{per-page}}",
        server.uri()
    );
    config.crawler.items_per_page = 10;
    config.crawler.fetch_details = false;

    let coordinator = Coordinator::new(config).unwrap();
    let plan = coordinator.plan(Method::Catalogue, None).await.unwrap();
    let summary = coordinator.run(&plan).await.unwrap();

    assert_eq!(summary.records_written, 10);
    assert_eq!(summary.records_with_errors, 0);
    assert_eq!(summary.pages_visited, 2);

    let content = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = content.split_terminator("\r\n").collect();
    assert_eq!(lines.len(), 11);
    assert_eq!(lines[0], "Index\tTitle\tSource\tCall Number\tURL\tError");
    assert!(lines[1].starts_with("1\tReport 1\tPublic Health England\tPHE-1\t"));
    assert!(lines[10].starts_with("10\tReport 10\t"));
}

#[tokio::test]
async fn test_catalogue_rerun_appends_without_header() {
    let server = MockServer::start().await;
    mount_listing(&server, "1", listing_page(1..=3)).await;
    mount_listing(&server, "2", listing_page(4..=5)).await;

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("catalogue.tsv");
    let mut config = create_test_config(Some(csv_path.clone()));
    config.site.catalogue_url = format!(
        "{}/catalogue/?pagenum={{page}}&per_page={{per-page}}",
        server.uri()
    );
    config.crawler.items_per_page = 3;
    config.crawler.fetch_details = false;

    config.crawler.end_page = 1;
    let first = Coordinator::new(config.clone()).unwrap();
    let plan = first.plan(Method::Catalogue, None).await.unwrap();
    first.run(&plan).await.unwrap();

    config.crawler.start_page = 2;
    config.crawler.end_page = 2;
    let second = Coordinator::new(config).unwrap();
    let plan = second.plan(Method::Catalogue, None).await.unwrap();
    second.run(&plan).await.unwrap();

    let content = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = content.split_terminator("\r\n").collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(
        lines.iter().filter(|l| l.starts_with("Index\t")).count(),
        1
    );
    // page 2 numbering starts after page 1's three entries
    assert!(lines[4].starts_with("4\tReport 4\t"));
    assert!(lines[5].starts_with("5\tReport 5\t"));
}

#[tokio::test]
async fn test_documents_run_counts_across_groups() {
    let server = MockServer::start().await;
    mount_page(&server, "/2019/06/", article_page(&["a", "b"], None)).await;
    mount_page(&server, "/2019/05/", article_page(&["c"], None)).await;

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("documents.tsv");
    let config = create_test_config(Some(csv_path.clone()));

    let coordinator = Coordinator::new(config).unwrap();
    let plan = Plan::Documents {
        seeds: vec![
            format!("{}/2019/06/", server.uri()),
            format!("{}/2019/05/", server.uri()),
            format!("{}/2019/04/", server.uri()),
        ],
    };
    let summary = coordinator.run(&plan).await.unwrap();

    assert_eq!(summary.groups, 3);
    assert_eq!(summary.records_written, 3);
    assert_eq!(summary.groups_cut_short, 1);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(&csv_path)
        .unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["Index", "Title", "Date", "Categories", "URL", "Download", "Error"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    let indices: Vec<&str> = rows.iter().map(|r| &r[0]).collect();
    assert_eq!(indices, vec!["1", "2", "3"]);
    assert_eq!(&rows[2][1], "c");
    assert_eq!(&rows[2][4], format!("{}/doc/c/", server.uri()).as_str());
    assert_eq!(&rows[2][5], "");
}

#[tokio::test]
async fn test_archive_discovery_run() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/archive/",
        r#"<div id="secondary"><h2>Archives</h2><ul>
            <li><a href="/2019/06/">June 2019</a></li>
            <li><a href="/2019/05/">May 2019</a></li>
        </ul></div>"#
            .to_string(),
    )
    .await;
    mount_page(&server, "/2019/06/", article_page(&["a"], None)).await;
    mount_page(&server, "/2019/05/", article_page(&["b"], None)).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(Some(dir.path().join("archive.tsv")));
    config.site.archive_url = format!("{}/archive/", server.uri());

    let coordinator = Coordinator::new(config).unwrap();
    let plan = coordinator.plan(Method::Archive, None).await.unwrap();
    assert_eq!(plan.group_count(), 2);

    let summary = coordinator.run(&plan).await.unwrap();
    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.groups_cut_short, 0);
}
