use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use tgcdn_core::FileUuid;
use tracing::warn;

use crate::error::ContentError;
use crate::mime;
use crate::state::AppState;

const CACHE_CONTROL: &str = "public, max-age=8640000";

pub async fn content(State(state): State<Arc<AppState>>, Path(file_uuid): Path<String>) -> Result<Response, ContentError> {
    let Ok(file_uuid) = FileUuid::parse(&file_uuid) else {
        return Err(ContentError::NotFound);
    };

    let resolved = state.resolver.resolve(file_uuid).await.map_err(|e| {
        warn!(%file_uuid, error = %e, "resolver unavailable");
        ContentError::ServiceUnavailable
    })?;
    let Some(resolved) = resolved else {
        return Err(ContentError::NotFound);
    };

    let upstream_resp = match state.http_client.get(&resolved.url).send().await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(%file_uuid, error = %e, "upstream content fetch failed");
            return Err(ContentError::GatewayTimeout);
        }
    };

    let status = upstream_resp.status();
    if status.is_client_error() || status.is_server_error() {
        return Ok(StatusCode::from_u16(status.as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY)
            .into_response());
    }

    let mut stream = upstream_resp.bytes_stream();
    let Some(first_chunk) = stream.next().await else {
        // An empty upstream body still gets a response rather than hanging
        // the connection open; 204 over 502 here is a judgment call, not
        // something the upstream API ever documents.
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    let first_chunk = first_chunk.map_err(|_| ContentError::GatewayTimeout)?;

    let content_type = mime::sniff(&first_chunk).unwrap_or("application/octet-stream");
    let disposition = format!("inline; filename=\"{file_uuid}\"");

    let body_stream = futures::stream::once(async move { Ok::<_, reqwest::Error>(first_chunk) }).chain(stream);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CACHE_CONTROL, CACHE_CONTROL)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Body::from_stream(body_stream))
        .expect("static headers are always valid");

    Ok(response)
}
