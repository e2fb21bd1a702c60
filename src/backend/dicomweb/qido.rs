use crate::api::qido::{QidoService, SearchOutcome, SearchRequest};
use crate::backend::dicomweb::{normalize_instance, normalize_series, UpstreamClient};
use crate::config::NormalizationConfig;
use crate::dicomjson::{first_string, DicomJsonObject};
use crate::types::RecordLevel;
use async_trait::async_trait;
use dicom::dictionary_std::tags;
use futures::future::join_all;
use tracing::warn;

pub struct DicomWebQidoService {
	upstream: UpstreamClient,
	defaults: NormalizationConfig,
}

impl DicomWebQidoService {
	pub const fn new(upstream: UpstreamClient, defaults: NormalizationConfig) -> Self {
		Self { upstream, defaults }
	}

	/// The series list needs the instance count of every series, which the
	/// upstream does not report reliably, so one instance-list fetch is fanned
	/// out per series. A failed fan-out fetch degrades that series to a count
	/// of zero instead of failing the whole response.
	async fn series_list(&self, study: &str) -> SearchOutcome {
		let mut series = match self.upstream.series_of(study).await {
			Ok(series) => series,
			Err(err) => return SearchOutcome::UpstreamFailed(err),
		};

		let counts = join_all(series.iter().map(|record| self.instance_count(study, record))).await;

		for (record, count) in series.iter_mut().zip(counts) {
			normalize_series(record, count, &self.defaults);
		}

		SearchOutcome::from_records(series)
	}

	async fn instance_count(&self, study: &str, series: &DicomJsonObject) -> usize {
		let Some(series_uid) = first_string(series, tags::SERIES_INSTANCE_UID) else {
			warn!("Series record without Series Instance UID, reporting zero instances");
			return 0;
		};

		match self.upstream.instances_of(study, series_uid).await {
			Ok(instances) => instances.len(),
			Err(err) => {
				warn!(series_uid, "Failed to count instances of series: {err}");
				0
			}
		}
	}

	async fn instance_list(&self, study: &str, series: &str) -> SearchOutcome {
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
impl QidoService for DicomWebQidoService {
	async fn search(&self, request: SearchRequest) -> SearchOutcome {
		let query = request.query;
		match query.level {
			// The study search is proxied without interception; this arm backs
			// the diagnostic routes that echo the raw upstream study list.
			RecordLevel::Study => match self.upstream.studies().await {
				Ok(studies) => SearchOutcome::from_records(studies),
				Err(err) => SearchOutcome::UpstreamFailed(err),
			},
			RecordLevel::Series => {
				let Some(study) = query.study_instance_uid else {
					warn!("Series search without a study UID");
					return SearchOutcome::Empty;
				};
				self.series_list(&study).await
			}
			RecordLevel::Instance => {
				let (Some(study), Some(series)) =
					(query.study_instance_uid, query.series_instance_uid)
				else {
					warn!("Instance search without study and series UIDs");
					return SearchOutcome::Empty;
				};
				self.instance_list(&study, &series).await
			}
		}
	}
}
