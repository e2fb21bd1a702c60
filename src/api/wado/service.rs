use crate::api::qido::SearchOutcome;
use crate::types::UI;
use crate::AppState;
use async_trait::async_trait;
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRef, FromRequestParts, Path};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

/// Provides the metadata resources of the Retrieve Transaction.
///
/// <https://dicom.nema.org/medical/dicom/current/output/html/part18.html#sect_10.4>
#[async_trait]
pub trait WadoService: Send + Sync {
	async fn metadata(&self, request: MetadataRequest) -> SearchOutcome;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRequest {
	pub query: ResourceQuery,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceQuery {
	#[serde(rename = "study")]
	pub study_instance_uid: UI,
	#[serde(rename = "series")]
	pub series_instance_uid: Option<UI>,
}

impl<S> FromRequestParts<S> for MetadataRequest
where
	AppState: FromRef<S>,
	S: Send + Sync,
{
	type Rejection = Response;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let Path(query): Path<ResourceQuery> = Path::from_request_parts(parts, state)
			.await
			.map_err(PathRejection::into_response)?;

		Ok(Self { query })
	}
}
