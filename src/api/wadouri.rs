use crate::api::common::{relay, upstream_error};
use crate::backend::dicomweb::APPLICATION_DICOM;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

/// HTTP Router for WADO-URI, the query-parameter based single-instance
/// retrieval protocol.
///
/// <https://dicom.nema.org/medical/dicom/current/output/chtml/part18/sect_9.5.html>
pub fn routes() -> Router<AppState> {
	Router::new().route("/wado", get(wado_uri))
}

/// The mandatory WADO-URI parameters. Everything else (`contentType`,
/// `transferSyntax`, ...) is forwarded verbatim without inspection.
#[derive(Debug, PartialEq, Eq, Deserialize)]
pub struct WadoUriParameters {
	#[serde(rename = "requestType")]
	pub request_type: Option<String>,
	#[serde(rename = "studyUID")]
	pub study_uid: Option<String>,
	#[serde(rename = "seriesUID")]
	pub series_uid: Option<String>,
	#[serde(rename = "objectUID")]
	pub object_uid: Option<String>,
}

impl WadoUriParameters {
	fn is_complete(&self) -> bool {
		self.request_type.is_some()
			&& self.study_uid.is_some()
			&& self.series_uid.is_some()
			&& self.object_uid.is_some()
	}
}

#[instrument(skip_all)]
async fn wado_uri(
	State(state): State<AppState>,
	Query(params): Query<WadoUriParameters>,
	uri: Uri,
) -> Response {
	if !params.is_complete() {
		return (
			StatusCode::BAD_REQUEST,
			Json(json!({"error": "Missing required WADO parameters"})),
		)
			.into_response();
	}

	// Forward the original query string untouched.
	let path_and_query = match uri.query() {
		Some(query) => format!("wado?{query}"),
		None => String::from("wado"),
	};

	match state
		.upstream
		.forward(Method::GET, &path_and_query, APPLICATION_DICOM, Bytes::new())
		.await
	{
		Ok(upstream) => relay(upstream),
		Err(err) => upstream_error(state.config.http.detailed_errors, &err),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn complete_parameter_set_is_accepted() {
		let uri = Uri::from_static(
			"http://test/wado?requestType=WADO&studyUID=1.2.3&seriesUID=4.5.6&objectUID=7.8.9",
		);
		let Query(params) = Query::<WadoUriParameters>::try_from_uri(&uri).unwrap();

		assert!(params.is_complete());
		assert_eq!(params.study_uid.as_deref(), Some("1.2.3"));
	}

	#[test]
	fn missing_object_uid_is_rejected() {
		let uri = Uri::from_static("http://test/wado?requestType=WADO&studyUID=1.2.3&seriesUID=4.5.6");
		let Query(params) = Query::<WadoUriParameters>::try_from_uri(&uri).unwrap();

		assert!(!params.is_complete());
	}

	#[test]
	fn unknown_parameters_are_tolerated() {
		let uri = Uri::from_static(
			"http://test/wado?requestType=WADO&studyUID=1&seriesUID=2&objectUID=3&contentType=application%2Fdicom",
		);
		let Query(params) = Query::<WadoUriParameters>::try_from_uri(&uri).unwrap();

		assert!(params.is_complete());
	}
}
