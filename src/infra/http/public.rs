use std::{sync::Arc, time::Instant};

use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State, rejection::QueryRejection},
    http::{
        HeaderValue, StatusCode, Uri,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    application::{
        reasons::ReasonSource,
        render::{RenderRequest, Renderer},
    },
    domain::{
        sanitize::sanitize,
        theme::{RenderProfile, Variant},
    },
    infra::{
        assets::StaticFiles,
        encode::{EncodeError, stream_png},
        telemetry::{IMAGES_RENDERED_TOTAL, REASONS_SERVED_TOTAL, RENDER_MS},
    },
};

use super::{
    error::ApiError,
    middleware::{cors, log_responses, set_request_context},
    rate_limit::{RateLimiter, rate_limit},
};

/// Everything a request handler needs; built once at startup.
#[derive(Clone)]
pub struct HttpState {
    pub renderer: Arc<Renderer>,
    pub reasons: Arc<dyn ReasonSource>,
    pub static_files: Arc<StaticFiles>,
    pub rate_limiter: RateLimiter,
    pub images_enabled: bool,
}

pub fn build_router(state: HttpState) -> Router {
    let mut router = Router::new()
        .route("/no", get(reason))
        .route("/_health", get(health));

    for variant in Variant::ALL {
        router = if state.images_enabled {
            router.route(
                variant.route(),
                get(
                    move |State(state): State<HttpState>,
                          query: Result<Query<ImageQuery>, QueryRejection>| {
                        card(state, variant, query)
                    },
                ),
            )
        } else {
            router.route(variant.route(), get(images_disabled))
        };
    }

    let limiter = state.rate_limiter.clone();
    router
        .fallback(get(static_file))
        .with_state(state)
        .layer(middleware::from_fn_with_state(limiter, rate_limit))
        .layer(middleware::from_fn(cors))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Serialize)]
struct ReasonBody {
    reason: String,
}

async fn reason(State(state): State<HttpState>) -> Json<ReasonBody> {
    counter!(REASONS_SERVED_TOTAL).increment(1);
    Json(ReasonBody {
        reason: state.reasons.next_reason(),
    })
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn images_disabled() -> ApiError {
    ApiError::feature_disabled()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageQuery {
    style: Option<String>,
}

async fn card(
    state: HttpState,
    variant: Variant,
    query: Result<Query<ImageQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            return ApiError::bad_request("Invalid query string", Some(rejection.body_text()))
                .into_response();
        }
    };
    let profile = match query.style.as_deref() {
        None => RenderProfile::default(),
        Some(raw) => match raw.parse::<RenderProfile>() {
            Ok(profile) => profile,
            Err(err) => {
                return ApiError::bad_request("Unknown style", Some(err.to_string()))
                    .into_response();
            }
        },
    };

    let text = sanitize(&state.reasons.next_reason());
    let request = RenderRequest::for_variant(variant, profile);
    let renderer = Arc::clone(&state.renderer);

    let produce = move || {
        let started = Instant::now();
        let surface = renderer.render(&request, &text);
        histogram!(RENDER_MS, "variant" => variant.as_str())
            .record(started.elapsed().as_secs_f64() * 1000.0);
        surface
    };
    let on_error = move |err: EncodeError| match err {
        EncodeError::Disconnected => {
            debug!(
                target = "naas::http::card",
                variant = variant.as_str(),
                "client disconnected mid-stream"
            );
        }
        EncodeError::Png(err) => {
            warn!(
                target = "naas::http::card",
                variant = variant.as_str(),
                error = %err,
                "png encoding failed"
            );
        }
    };

    counter!(
        IMAGES_RENDERED_TOTAL,
        "variant" => variant.as_str(),
        "style" => profile.as_str()
    )
    .increment(1);

    let mut response = Response::new(Body::from_stream(stream_png(produce, on_error)));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

async fn static_file(State(state): State<HttpState>, uri: Uri) -> Response {
    state.static_files.serve(uri.path()).await
}
