//! HTTP handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use tracing::info;

use racsgpfs_metrics::{CONTENT_TYPE as EXPOSITION_CONTENT_TYPE, TextSink};

use crate::ApiState;

/// GET /metrics
///
/// Runs a full collection inline; nothing is cached between requests.
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let mut sink = TextSink::new();
    let summary = state.publisher.collect(&mut sink).await;

    if summary.sources_failed > 0 {
        info!(
            failed = summary.sources_failed,
            succeeded = summary.sources_ok,
            "scrape served with partial results"
        );
    }

    (
        StatusCode::OK,
        [(CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        sink.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use racsgpfs_metrics::MetricPublisher;
    use racsgpfs_quota::{
        Column, ColumnMap, Delimiter, LabelScheme, LineFilter, LineFormat, NumericPolicy,
        QuotaSource,
    };

    fn shell_source(name: &str, script: &str) -> QuotaSource {
        QuotaSource::new(
            name,
            "/bin/sh",
            vec!["-c".into(), script.into()],
            Duration::from_secs(10),
            LineFilter::default(),
            LineFormat {
                delimiter: Delimiter::Char('|'),
                columns: ColumnMap {
                    name: Column::Index(0),
                    size: Column::Index(1),
                    quota: Column::Index(2),
                    inodes: Column::Index(3),
                    category: None,
                    columns: Some(4),
                },
                numeric: NumericPolicy::Reject,
            },
        )
    }

    fn test_state(sources: Vec<QuotaSource>) -> ApiState {
        ApiState {
            publisher: Arc::new(MetricPublisher::new("racsgpfs", LabelScheme::Name, sources)),
        }
    }

    #[tokio::test]
    async fn prometheus_endpoint_returns_text() {
        let state = test_state(vec![shell_source("p", "printf 'proj42|12.5|100|4821\\n'")]);
        let resp = prometheus_metrics(State(state)).await.into_response();

        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.contains("text/plain"));
        assert!(content_type.contains("version=0.0.4"));

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("racsgpfs_size_gb{name=\"proj42\"} 12.5"));
    }

    #[tokio::test]
    async fn failed_source_still_returns_ok() {
        let state = test_state(vec![shell_source("broken", "exit 1")]);
        let resp = prometheus_metrics(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
