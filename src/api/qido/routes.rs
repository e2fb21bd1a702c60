use crate::api::common::lenient_json_array;
use crate::api::qido::{ResourceQuery, SearchRequest};
use crate::types::RecordLevel;
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tracing::instrument;

/// HTTP Router for the intercepted Search Transaction resources.
///
/// Only the series list and the series' instance list are intercepted for
/// normalization; the study search stays on the generic pass-through route.
///
/// <https://dicom.nema.org/medical/dicom/current/output/html/part18.html#sect_10.6>
#[rustfmt::skip]
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dicom-web/studies/{study}/series", get(studys_series))
        .route("/dicom-web/studies/{study}/series/{series}/instances", get(studys_series_instances))
}

#[instrument(skip_all)]
async fn studys_series(State(state): State<AppState>, Path(study): Path<String>) -> impl IntoResponse {
	let request = SearchRequest {
		query: ResourceQuery {
			level: RecordLevel::Series,
			study_instance_uid: Some(study),
			series_instance_uid: None,
		},
	};
	lenient_json_array(state.services.qido.search(request).await)
}

#[instrument(skip_all)]
async fn studys_series_instances(
	State(state): State<AppState>,
	Path((study, series)): Path<(String, String)>,
) -> impl IntoResponse {
	let request = SearchRequest {
		query: ResourceQuery {
			level: RecordLevel::Instance,
			study_instance_uid: Some(study),
			series_instance_uid: Some(series),
		},
	};
	lenient_json_array(state.services.qido.search(request).await)
}
