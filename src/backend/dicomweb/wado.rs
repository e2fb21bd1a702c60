use crate::api::qido::SearchOutcome;
use crate::api::wado::{MetadataRequest, WadoService};
use crate::backend::dicomweb::{normalize_instance, UpstreamClient};
use crate::config::NormalizationConfig;
use crate::dicomjson::{first_string, DicomJsonObject};
use async_trait::async_trait;
use dicom::dictionary_std::tags;
use futures::future::join_all;
use tracing::warn;

pub struct DicomWebWadoService {
	upstream: UpstreamClient,
	defaults: NormalizationConfig,
}

impl DicomWebWadoService {
	pub const fn new(upstream: UpstreamClient, defaults: NormalizationConfig) -> Self {
		Self { upstream, defaults }
	}

	/// Builds the study metadata as one flat, ordered instance list.
	///
	/// The upstream's native study-level metadata endpoint is unreliable, so
	/// the hierarchy is walked instead: series list first, then one
	/// instance-list fetch per series, issued concurrently. A failed series
	/// fetch contributes nothing rather than aborting the response.
	async fn study_metadata(&self, study: &str) -> SearchOutcome {
		let series = match self.upstream.series_of(study).await {
			Ok(series) => series,
			Err(err) => return SearchOutcome::UpstreamFailed(err),
		};

		let fetches = join_all(
			series
				.iter()
				.map(|record| self.series_instances(study, record)),
		)
		.await;

		let mut flattened: Vec<DicomJsonObject> = fetches.into_iter().flatten().collect();
		for (index, record) in flattened.iter_mut().enumerate() {
			normalize_instance(record, index + 1, &self.defaults);
		}

		SearchOutcome::from_records(flattened)
	}

	async fn series_instances(&self, study: &str, series: &DicomJsonObject) -> Vec<DicomJsonObject> {
		let Some(series_uid) = first_string(series, tags::SERIES_INSTANCE_UID) else {
			warn!("Series record without Series Instance UID, skipped in study metadata");
			return Vec::new();
		};

		match self.upstream.instances_of(study, series_uid).await {
			Ok(instances) => instances,
			Err(err) => {
				warn!(series_uid, "Failed to fetch instances of series: {err}");
				Vec::new()
			}
		}
	}

	async fn series_metadata(&self, study: &str, series: &str) -> SearchOutcome {
		let mut instances = match self.upstream.instances_of(study, series).await {
			Ok(instances) => instances,
			Err(err) => return SearchOutcome::UpstreamFailed(err),
		};

		for (index, record) in instances.iter_mut().enumerate() {
			normalize_instance(record, index + 1, &self.defaults);
		}

		SearchOutcome::from_records(instances)
	}
}

#[async_trait]
impl WadoService for DicomWebWadoService {
	async fn metadata(&self, request: MetadataRequest) -> SearchOutcome {
		let query = request.query;
		match query.series_instance_uid {
			Some(series) => self.series_metadata(&query.study_instance_uid, &series).await,
			None => self.study_metadata(&query.study_instance_uid).await,
		}
	}
}
