use crate::api::common::{relay, upstream_error};
use crate::backend::dicomweb::APPLICATION_DICOM_JSON;
use crate::AppState;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use serde_json::json;
use tracing::instrument;

/// Query parameters the upstream DICOMweb implementation is known not to
/// support; they are removed before forwarding.
const UNSUPPORTED_QUERY_PARAMS: &[&str] = &["limit", "offset", "fuzzymatching", "includefield"];

/// HTTP Router for the plain reverse-proxy surface: everything under
/// /dicom-web that is not intercepted for normalization, plus the upstream
/// server's own REST prefixes used by the viewer's upload and admin features.
#[rustfmt::skip]
pub fn routes() -> Router<AppState> {
	Router::new()
		.route("/dicom-web", any(dicomweb_passthrough))
		.route("/dicom-web/{*rest}", any(dicomweb_passthrough))
		.route("/studies", any(rest_passthrough))
		.route("/studies/{*rest}", any(rest_passthrough))
		.route("/series", any(rest_passthrough))
		.route("/series/{*rest}", any(rest_passthrough))
		.route("/instances", any(rest_passthrough))
		.route("/instances/{*rest}", any(rest_passthrough))
		.route("/patients", any(rest_passthrough))
		.route("/patients/{*rest}", any(rest_passthrough))
		.route("/modalities", any(rest_passthrough))
		.route("/modalities/{*rest}", any(rest_passthrough))
		.route("/peers", any(rest_passthrough))
		.route("/peers/{*rest}", any(rest_passthrough))
}

#[instrument(skip_all)]
async fn dicomweb_passthrough(State(state): State<AppState>, req: Request) -> Response {
	forward(state, req, APPLICATION_DICOM_JSON).await
}

#[instrument(skip_all)]
async fn rest_passthrough(State(state): State<AppState>, req: Request) -> Response {
	forward(state, req, mime::APPLICATION_JSON.as_ref()).await
}

/// Forwards method, path and body to the upstream origin. The client's
/// `accept-encoding` is intentionally not forwarded; the proxy cannot
/// transparently re-encode compressed upstream bodies.
async fn forward(state: AppState, req: Request, accept: &str) -> Response {
	let (parts, body) = req.into_parts();

	let body = match axum::body::to_bytes(body, state.config.http.max_body_size).await {
		Ok(bytes) => bytes,
		Err(err) => {
			return (
				StatusCode::BAD_REQUEST,
				Json(json!({
					"error": "Proxy error",
					"message": format!("Failed to read request body: {err}"),
				})),
			)
				.into_response();
		}
	};

	let path = parts.uri.path().trim_start_matches('/');
	let query = strip_unsupported_params(parts.uri.query().unwrap_or_default());
	let path_and_query = if query.is_empty() {
		path.to_string()
	} else {
		format!("{path}?{query}")
	};

	match state
		.upstream
		.forward(parts.method, &path_and_query, accept, body)
		.await
	{
		Ok(upstream) => relay(upstream),
		Err(err) => upstream_error(state.config.http.detailed_errors, &err),
	}
}

fn strip_unsupported_params(query: &str) -> String {
	let retained = url::form_urlencoded::parse(query.as_bytes())
		.filter(|(name, _)| !UNSUPPORTED_QUERY_PARAMS.contains(&name.as_ref()));

	url::form_urlencoded::Serializer::new(String::new())
		.extend_pairs(retained)
		.finish()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unsupported_params_are_stripped() {
		let stripped =
			strip_unsupported_params("limit=25&offset=0&fuzzymatching=true&includefield=all");
		assert_eq!(stripped, "");
	}

	#[test]
	fn supported_params_are_retained() {
		let stripped = strip_unsupported_params(
			"limit=25&StudyInstanceUID=1.2.3&PatientName=DOE&includefield=00100010",
		);
		assert_eq!(stripped, "StudyInstanceUID=1.2.3&PatientName=DOE");
	}

	#[test]
	fn empty_query_stays_empty() {
		assert_eq!(strip_unsupported_params(""), "");
	}
}
