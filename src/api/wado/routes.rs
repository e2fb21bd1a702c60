use crate::api::common::lenient_json_array;
use crate::api::wado::MetadataRequest;
use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tracing::instrument;

/// HTTP Router for the intercepted metadata resources of the Retrieve
/// Transaction. Instance downloads and frame retrieval stay on the generic
/// pass-through route.
///
/// <https://dicom.nema.org/medical/dicom/current/output/chtml/part18/sect_10.4.html#sect_10.4.1.1.2>
#[rustfmt::skip]
pub fn routes() -> Router<AppState> {
	Router::new()
		.route("/dicom-web/studies/{study}/metadata", get(study_metadata))
		.route("/dicom-web/studies/{study}/series/{series}/metadata", get(series_metadata))
}

#[instrument(skip_all)]
async fn study_metadata(
	State(state): State<AppState>,
	request: MetadataRequest,
) -> impl IntoResponse {
	lenient_json_array(state.services.wado.metadata(request).await)
}

#[instrument(skip_all)]
async fn series_metadata(
	State(state): State<AppState>,
	request: MetadataRequest,
) -> impl IntoResponse {
	lenient_json_array(state.services.wado.metadata(request).await)
}
