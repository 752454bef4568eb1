use std::{collections::HashSet, sync::Arc, time::Duration};

use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use metrics_util::debugging::DebuggingRecorder;
use naas::{
    application::{
        reasons::FixedReason,
        render::{DEFAULT_PADDING_FRACTION, Renderer},
    },
    domain::theme::Theme,
    infra::{
        assets::StaticFiles,
        fonts::FontRegistry,
        http::{HttpState, RateLimiter, build_router},
        telemetry,
    },
};
use tower::ServiceExt;

#[tokio::test]
async fn request_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    let public = tempfile::tempdir().expect("tempdir");
    let state = HttpState {
        renderer: Arc::new(Renderer::new(
            &FontRegistry::empty(),
            Arc::new(Theme::default()),
            DEFAULT_PADDING_FRACTION,
        )),
        reasons: Arc::new(FixedReason::new("No.")),
        static_files: Arc::new(StaticFiles::new(public.path())),
        rate_limiter: RateLimiter::new(Duration::from_secs(60), 3),
        images_enabled: true,
    };
    let app = build_router(state);

    let mut statuses = Vec::new();
    for uri in ["/no", "/S", "/img?style=plain", "/no"] {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request should build");
        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        statuses.push(response.status());
        // Drain image bodies so the render worker finishes before the snapshot.
        to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should collect");
    }
    assert_eq!(
        statuses,
        [
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::TOO_MANY_REQUESTS
        ]
    );

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        telemetry::IMAGES_RENDERED_TOTAL,
        telemetry::RENDER_MS,
        telemetry::RATE_LIMITED_TOTAL,
        telemetry::REASONS_SERVED_TOTAL,
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
