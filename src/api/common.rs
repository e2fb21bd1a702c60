use crate::api::qido::SearchOutcome;
use crate::backend::dicomweb::UpstreamError;
use crate::dicomjson::DicomJsonObject;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{body::Body, Json};
use axum_streams::StreamBodyAs;
use serde_json::json;
use tracing::warn;

/// Renders DICOM-JSON records as a JSON array response.
pub fn json_array(records: Vec<DicomJsonObject>) -> Response {
	Response::builder()
		.status(StatusCode::OK)
		.header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
		.body(StreamBodyAs::json_array(futures::stream::iter(records)))
		.unwrap()
		.into_response()
}

/// Renders a search outcome for the metadata-shaped routes.
///
/// Upstream failure degrades to an empty result set so that one broken series
/// does not abort the viewer's hanging-protocol matching for the whole study.
/// The failure is still visible in the logs.
pub fn lenient_json_array(outcome: SearchOutcome) -> Response {
	let records = match outcome {
		SearchOutcome::Matches(records) => records,
		SearchOutcome::Empty => Vec::new(),
		SearchOutcome::UpstreamFailed(err) => {
			warn!("Upstream fetch failed, answering with an empty result set: {err}");
			Vec::new()
		}
	};
	json_array(records)
}

/// 500 response for failed pass-through proxying. The upstream error detail is
/// only included when `http.detailed_errors` is enabled.
pub fn upstream_error(detailed: bool, err: &UpstreamError) -> Response {
	let message = if detailed {
		err.to_string()
	} else {
		String::from("Upstream request failed")
	};

	(
		StatusCode::INTERNAL_SERVER_ERROR,
		Json(json!({
			"error": "Proxy error",
			"message": message,
		})),
	)
		.into_response()
}

/// Relays an upstream response to the client: status and body verbatim, with
/// the upstream content headers. The body is streamed, not buffered.
pub fn relay(upstream: reqwest::Response) -> Response {
	let mut builder = Response::builder().status(upstream.status());

	for name in [CONTENT_TYPE, CONTENT_LENGTH] {
		if let Some(value) = upstream.headers().get(&name) {
			builder = builder.header(&name, value);
		}
	}

	builder
		.body(Body::from_stream(upstream.bytes_stream()))
		.unwrap()
		.into_response()
}

#[cfg(test)]
mod tests {
	use super::*;

	async fn body_string(response: Response) -> String {
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		String::from_utf8(bytes.to_vec()).unwrap()
	}

	#[tokio::test]
	async fn upstream_failure_degrades_to_empty_array() {
		let outcome = SearchOutcome::UpstreamFailed(UpstreamError::Status {
			status: reqwest::StatusCode::BAD_GATEWAY,
		});
		let response = lenient_json_array(outcome);

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(body_string(response).await, "[]");
	}

	#[tokio::test]
	async fn empty_outcome_is_an_empty_array() {
		let response = lenient_json_array(SearchOutcome::Empty);

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(body_string(response).await, "[]");
	}

	#[tokio::test]
	async fn matches_render_as_json_array() {
		let mut record = DicomJsonObject::new();
		record.insert("00080060".to_string(), json!({"vr": "CS", "Value": ["CT"]}));

		let response = lenient_json_array(SearchOutcome::Matches(vec![record]));
		assert_eq!(response.status(), StatusCode::OK);

		let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
		assert_eq!(body[0]["00080060"]["Value"][0], "CT");
	}

	#[tokio::test]
	async fn error_detail_is_gated() {
		let err = UpstreamError::Status {
			status: reqwest::StatusCode::BAD_GATEWAY,
		};

		let detailed = upstream_error(true, &err);
		assert_eq!(detailed.status(), StatusCode::INTERNAL_SERVER_ERROR);
		let body: serde_json::Value =
			serde_json::from_str(&body_string(detailed).await).unwrap();
		assert_eq!(body["error"], "Proxy error");
		assert!(body["message"].as_str().unwrap().contains("502"));

		let opaque = upstream_error(false, &err);
		let body: serde_json::Value = serde_json::from_str(&body_string(opaque).await).unwrap();
		assert_eq!(body["message"], "Upstream request failed");
	}
}
