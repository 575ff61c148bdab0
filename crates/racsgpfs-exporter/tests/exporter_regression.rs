//! Exporter regression tests.
//!
//! Drives the full pipeline through the HTTP router: config → sources →
//! publisher → /metrics. Report commands are `/bin/sh` fixtures.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use racsgpfs_api::build_router;
use racsgpfs_metrics::MetricPublisher;
use racsgpfs_quota::QuotaConfig;

const REPORT_SCRIPT: &str = r#"cat <<'EOF'
*** Report for USR GRP FILESET quotas on fs1
                         Block Limits                                    |     File Limits
Name       fileset    type             GB      quota      limit   in_doubt    grace |    files   quota    limit in_doubt    grace
alice      root       USR               4         50         50          0     none |     1021       0        0        0     none
bob        root       USR              60         50        100          0   6 days |     2048       0        0        0     none
staff      root       GRP               7          0          0          0     none |       88       0        0        0     none
genomics   root       FILESET         512       1024       1024          0     none |   120034       0        0        0     none
EOF"#;

fn config_toml(sources: &[(&str, &str)]) -> String {
    let mut toml = String::from("namespace = \"racsgpfs\"\nlabels = \"name_and_category\"\n");
    for (name, script) in sources {
        toml.push_str(&format!(
            r#"
[[source]]
name = "{name}"
program = "/bin/sh"
args = ["-c", {script:?}]
timeout = "10s"
delimiter = "whitespace"
exclude = ["GRP", "Block Limits", "in_doubt"]
columns = {{ name = 0, category = 2, size = 3, quota = 4, inodes = {{ after = "|" }} }}
"#
        ));
    }
    toml
}

fn router_for(sources: &[(&str, &str)]) -> Router {
    let config = QuotaConfig::from_toml_str(&config_toml(sources)).unwrap();
    let publisher = MetricPublisher::new(
        &config.namespace,
        config.labels,
        config.build_sources().unwrap(),
    );
    build_router(Arc::new(publisher))
}

async fn get(router: Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn metrics_exposes_report_rows() {
    let router = router_for(&[("fs1", REPORT_SCRIPT)]);
    let (status, body) = get(router, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("# TYPE racsgpfs_size_gb gauge"));
    assert!(body.contains("racsgpfs_size_gb{name=\"genomics\",category=\"fileset\"} 512"));
    assert!(body.contains("racsgpfs_quota_gb{name=\"genomics\",category=\"fileset\"} 1024"));
    assert!(body.contains("racsgpfs_inodes{name=\"genomics\",category=\"fileset\"} 120034"));
    assert!(body.contains("racsgpfs_quota_gb{name=\"alice\",category=\"home\"} 50"));
    // Over-quota row whose grace period spans two words.
    assert!(body.contains("racsgpfs_size_gb{name=\"bob\",category=\"home\"} 60"));
    assert!(body.contains("racsgpfs_inodes{name=\"bob\",category=\"home\"} 2048"));

    // Group rows and report boilerplate never become series.
    assert!(!body.contains("staff"));
    assert!(!body.contains("name=\"Name\""));
    assert_eq!(body.lines().filter(|l| !l.starts_with('#')).count(), 9);
}

#[tokio::test]
async fn failing_source_leaves_others_published() {
    let router = router_for(&[
        ("broken", "echo 'mmrepquota: filesystem not mounted' >&2; exit 1"),
        ("fs1", REPORT_SCRIPT),
    ]);
    let (status, body) = get(router, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("racsgpfs_size_gb{name=\"genomics\",category=\"fileset\"} 512"));
}

#[tokio::test]
async fn every_source_failing_still_answers() {
    let router = router_for(&[("broken", "exit 1")]);
    let (status, body) = get(router, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("# HELP racsgpfs_inodes Current inode count"));
    assert_eq!(body.lines().filter(|l| !l.starts_with('#')).count(), 0);
}

#[tokio::test]
async fn scrapes_are_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("runs");
    // Each run appends to the counter file and reports the run count as size.
    let script = format!(
        "echo x >> {path}; n=$(wc -l < {path}); echo \"proj42 root FILESET $n 100 100 0 none | 4821 0 0 0 none\"",
        path = counter.display()
    );
    let router = router_for(&[("fs1", &script)]);

    let (_, first) = get(router.clone(), "/metrics").await;
    let (_, second) = get(router, "/metrics").await;

    assert!(first.contains("racsgpfs_size_gb{name=\"proj42\",category=\"fileset\"} 1\n"));
    assert!(second.contains("racsgpfs_size_gb{name=\"proj42\",category=\"fileset\"} 2\n"));
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let router = router_for(&[("fs1", "true")]);
    let (status, _) = get(router, "/api/v1/quotas").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
