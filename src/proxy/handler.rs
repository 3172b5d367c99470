use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ALLOW, CONTENT_TYPE,
};
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::error::Error;
use crate::service::TrailerService;
use crate::trailer::ResolvedTrailer;

pub type SharedService = Arc<TrailerService>;

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Health,
    Trailer { media_type: &'a str, id: &'a str },
}

fn route(path: &str) -> Option<Route<'_>> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match segments[..] {
        ["health"] => Some(Route::Health),
        ["trailer", media_type, id] | ["api", "trailer", media_type, id] => Some(Route::Trailer {
            media_type,
            id,
        }),
        _ => None,
    }
}

#[derive(Serialize)]
struct TrailerBody<'a> {
    success: bool,
    #[serde(flatten)]
    trailer: &'a ResolvedTrailer,
}

fn json_response(status: StatusCode, body: &impl Serialize) -> Response<Full<Bytes>> {
    let payload = serde_json::to_vec(body)
        .unwrap_or_else(|_| br#"{"success":false,"error":"response encoding failed"}"#.to_vec());
    let mut response = Response::new(Full::new(Bytes::from(payload)));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

const ALLOWED_METHODS: &str = "GET, OPTIONS";

fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    headers.insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}

fn error_response(err: &Error) -> Response<Full<Bytes>> {
    let body = match err {
        Error::InvalidInput(message) => json!({
            "success": false,
            "error": message,
        }),
        Error::NotFound { media_type, .. } => json!({
            "success": false,
            "mediaType": media_type,
            "error": format!("No videos found for this {}.", media_type.label()),
        }),
        Error::Upstream {
            media_type, source, ..
        } => json!({
            "success": false,
            "error": format!("Error fetching video for {} from TMDB.", media_type.label()),
            "details": source.details(),
        }),
        Error::Config(_) => json!({
            "success": false,
            "error": "Internal server error.",
        }),
    };
    json_response(err.status(), &body)
}

/// Serves one request. Never fails at the hyper level; every outcome is a
/// JSON response.
pub async fn handle_request<B>(
    req: Request<B>,
    service: SharedService,
    semaphore: Arc<Semaphore>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let _permit = match semaphore.acquire().await {
        Ok(permit) => permit,
        Err(_) => {
            error!("request semaphore closed");
            return Ok(json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &json!({"success": false, "error": "Server is shutting down."}),
            ));
        }
    };

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!(%method, path = %path, "incoming request");

    let Some(route) = route(&path) else {
        return Ok(json_response(
            StatusCode::NOT_FOUND,
            &json!({"success": false, "error": format!("No route for {path}")}),
        ));
    };

    if method == Method::OPTIONS {
        return Ok(preflight_response());
    }

    if method != Method::GET {
        let mut response = json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &json!({"success": false, "error": format!("{method} is not allowed")}),
        );
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        return Ok(response);
    }

    let response = match route {
        Route::Health => json_response(StatusCode::OK, &json!({"status": "ok"})),
        Route::Trailer { media_type, id } => match service.lookup(media_type, id).await {
            Ok(trailer) => json_response(
                StatusCode::OK,
                &TrailerBody {
                    success: true,
                    trailer: &trailer,
                },
            ),
            Err(err) => error_response(&err),
        },
    };
    Ok(response)
}
