use crate::api::common::upstream_error;
use crate::api::qido::{ResourceQuery, SearchOutcome, SearchRequest};
use crate::dicomjson::first_string;
use crate::types::RecordLevel;
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use dicom::dictionary_std::tags;
use serde_json::json;
use tracing::instrument;

/// Diagnostic routes for operators: traverse the upstream hierarchy and echo
/// raw, un-normalized data so injected defaults can be told apart from what
/// the PACS actually returns.
pub fn routes() -> Router<AppState> {
	Router::new()
		.route("/api/debug-studies", get(debug_studies))
		.route("/api/debug-study/{study}", get(debug_study))
}

#[instrument(skip_all)]
async fn debug_studies(State(state): State<AppState>) -> Response {
	let request = SearchRequest {
		query: ResourceQuery {
			level: RecordLevel::Study,
			study_instance_uid: None,
			series_instance_uid: None,
		},
	};

	match state.services.qido.search(request).await {
		SearchOutcome::Matches(studies) => Json(json!({
			"count": studies.len(),
			"studies": studies,
		}))
		.into_response(),
		SearchOutcome::Empty => Json(json!({"count": 0, "studies": []})).into_response(),
		SearchOutcome::UpstreamFailed(err) => {
			upstream_error(state.config.http.detailed_errors, &err)
		}
	}
}

#[instrument(skip_all)]
async fn debug_study(State(state): State<AppState>, Path(study): Path<String>) -> Response {
	let series = match state.upstream.series_of(&study).await {
		Ok(series) => series,
		Err(err) => return upstream_error(state.config.http.detailed_errors, &err),
	};

	let mut report = Vec::with_capacity(series.len());
	for record in &series {
		let Some(series_uid) = first_string(record, tags::SERIES_INSTANCE_UID) else {
			report.push(json!({"error": "Series record without Series Instance UID"}));
			continue;
		};

		let entry = match state.upstream.instances_of(&study, series_uid).await {
			Ok(instances) => json!({
				"seriesInstanceUid": series_uid,
				"instanceCount": instances.len(),
				"firstInstance": instances.first(),
			}),
			Err(err) => json!({
				"seriesInstanceUid": series_uid,
				"error": err.to_string(),
			}),
		};
		report.push(entry);
	}

	Json(json!({
		"studyInstanceUid": study,
		"seriesCount": series.len(),
		"series": report,
	}))
	.into_response()
}
