use crate::backend::dicomweb::UpstreamError;
use crate::dicomjson::DicomJsonObject;
use crate::types::{RecordLevel, UI};
use async_trait::async_trait;

/// Provides the functionality of a search transaction.
///
/// <https://dicom.nema.org/medical/dicom/current/output/chtml/part18/sect_10.6.html>
#[async_trait]
pub trait QidoService: Send + Sync {
	async fn search(&self, request: SearchRequest) -> SearchOutcome;
}

pub struct SearchRequest {
	pub query: ResourceQuery,
}

/// Data used to identify a specific search transaction resource.
///
/// As an example, the "Study's Series" resource searches for all series in a
/// specified study: `level` is [`RecordLevel::Series`] and
/// `study_instance_uid` carries the study UID.
#[derive(Debug, Clone)]
pub struct ResourceQuery {
	/// The record level of the requested resource.
	pub level: RecordLevel,
	/// The UID of the study.
	pub study_instance_uid: Option<UI>,
	/// The UID of the series.
	pub series_instance_uid: Option<UI>,
}

/// Typed outcome of an upstream search or metadata fetch.
///
/// Upstream failure is explicit here so the HTTP edge can decide per route
/// whether to surface it as an error or degrade to an empty result set.
pub enum SearchOutcome {
	/// The upstream answered and at least one record was produced.
	Matches(Vec<DicomJsonObject>),
	/// The upstream answered with no records.
	Empty,
	/// The upstream could not be reached or answered with a non-2xx status.
	UpstreamFailed(UpstreamError),
}

impl SearchOutcome {
	pub fn from_records(records: Vec<DicomJsonObject>) -> Self {
		if records.is_empty() {
			Self::Empty
		} else {
			Self::Matches(records)
		}
	}
}
