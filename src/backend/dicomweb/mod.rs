//! Backend speaking DICOMweb (QIDO-RS/WADO-RS JSON endpoints) to the upstream
//! origin, typically an Orthanc server with the DICOMweb plugin.

use crate::config::UpstreamConfig;
use crate::dicomjson::DicomJsonObject;
use axum::http::Method;
use bytes::Bytes;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use url::Url;

mod normalize;
pub mod qido;
pub mod wado;

pub use normalize::{normalize_instance, normalize_series};
pub use qido::DicomWebQidoService;
pub use wado::DicomWebWadoService;

pub const APPLICATION_DICOM_JSON: &str = "application/dicom+json";
pub const APPLICATION_DICOM: &str = "application/dicom";

#[derive(Debug, Error)]
pub enum UpstreamError {
	#[error("Invalid upstream origin: {0}")]
	InvalidOrigin(#[from] url::ParseError),
	#[error("Upstream request failed: {0}")]
	Transport(#[from] reqwest::Error),
	#[error("Upstream responded with status {status}")]
	Status { status: StatusCode },
	#[error("Upstream returned an unexpected payload, expected a DICOM-JSON array")]
	UnexpectedPayload,
}

/// HTTP client for the upstream DICOMweb origin.
#[derive(Clone)]
pub struct UpstreamClient {
	http: reqwest::Client,
	origin: String,
}

impl UpstreamClient {
	pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
		// Validated once here so later URL building can be plain string concatenation.
		Url::parse(&config.origin)?;

		let http = reqwest::Client::builder()
			.timeout(Duration::from_secs(config.timeout))
			.build()?;

		Ok(Self {
			http,
			origin: config.origin.trim_end_matches('/').to_string(),
		})
	}

	pub fn origin(&self) -> &str {
		&self.origin
	}

	/// Forwards a request to the upstream origin and returns the raw response.
	/// `path_and_query` must not begin with a slash.
	///
	/// The upstream status code is not inspected; pass-through callers relay
	/// it to the client unchanged.
	pub async fn forward(
		&self,
		method: Method,
		path_and_query: &str,
		accept: &str,
		body: Bytes,
	) -> Result<reqwest::Response, UpstreamError> {
		let response = self
			.http
			.request(method, format!("{}/{path_and_query}", self.origin))
			.header(ACCEPT, accept)
			.body(body)
			.send()
			.await?;
		Ok(response)
	}

	async fn get_json(&self, path: &str) -> Result<Value, UpstreamError> {
		let response = self
			.http
			.get(format!("{}/{path}", self.origin))
			.header(ACCEPT, APPLICATION_DICOM_JSON)
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			return Err(UpstreamError::Status { status });
		}
		if status == StatusCode::NO_CONTENT {
			return Ok(Value::Null);
		}

		Ok(response.json().await?)
	}

	/// Fetches a QIDO-RS search result and returns its DICOM-JSON records.
	/// A 204 upstream answer has no body and maps to an empty list.
	async fn get_records(&self, path: &str) -> Result<Vec<DicomJsonObject>, UpstreamError> {
		match self.get_json(path).await {
			Ok(Value::Array(values)) => values
				.into_iter()
				.map(|value| match value {
					Value::Object(record) => Ok(record),
					_ => Err(UpstreamError::UnexpectedPayload),
				})
				.collect(),
			Ok(Value::Null) => Ok(Vec::new()),
			Ok(_) => Err(UpstreamError::UnexpectedPayload),
			Err(err) => Err(err),
		}
	}

	pub async fn studies(&self) -> Result<Vec<DicomJsonObject>, UpstreamError> {
		self.get_records("dicom-web/studies").await
	}

	pub async fn series_of(&self, study: &str) -> Result<Vec<DicomJsonObject>, UpstreamError> {
		self.get_records(&format!("dicom-web/studies/{study}/series"))
			.await
	}

	pub async fn instances_of(
		&self,
		study: &str,
		series: &str,
	) -> Result<Vec<DicomJsonObject>, UpstreamError> {
		self.get_records(&format!(
			"dicom-web/studies/{study}/series/{series}/instances"
		))
		.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn client(origin: &str) -> UpstreamClient {
		UpstreamClient::new(&UpstreamConfig {
			origin: origin.to_string(),
			timeout: 5,
		})
		.unwrap()
	}

	#[test]
	fn origin_is_normalized() {
		assert_eq!(client("http://pacs:8042/").origin(), "http://pacs:8042");
		assert_eq!(client("http://pacs:8042").origin(), "http://pacs:8042");
	}

	#[test]
	fn invalid_origin_is_rejected() {
		let result = UpstreamClient::new(&UpstreamConfig {
			origin: "not a url".to_string(),
			timeout: 5,
		});
		assert!(matches!(result, Err(UpstreamError::InvalidOrigin(_))));
	}
}
