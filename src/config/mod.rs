use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
	pub telemetry: TelemetryConfig,
	pub http: HttpConfig,
	pub upstream: UpstreamConfig,
	pub normalization: NormalizationConfig,
	pub viewer: ViewerConfig,
}

impl ApplicationConfig {
	pub fn new() -> Result<Self, config::ConfigError> {
		use config::Config;
		let s = Config::builder()
			.add_source(config::File::from_str(
				include_str!("defaults.toml"),
				config::FileFormat::Toml,
			))
			.add_source(config::File::with_name("config.toml").required(false))
			.add_source(config::Environment::with_prefix("DICOMWEB_PROXY").separator("_"))
			.build()?;

		let mut config: Self = s.try_deserialize()?;

		// The deployment environments use a plain PORT variable to select the listen port.
		if let Ok(port) = std::env::var("PORT") {
			config.http.port = port
				.parse()
				.map_err(|err| config::ConfigError::Message(format!("Invalid PORT: {err}")))?;
		}

		Ok(config)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
	/// Configurable logging level. Also configurable via the RUST_LOG env var.
	pub level: String,
	/// Sentry DSN. Sentry is disabled if unset.
	#[serde(default)]
	pub sentry: Option<String>,
}

impl TelemetryConfig {
	pub fn tracing_level(&self) -> Level {
		self.level.parse().unwrap_or(Level::INFO)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
	/// The interface the proxy will be listening on
	pub interface: IpAddr,
	/// The port for the proxy. The PORT env var takes precedence.
	pub port: u16,
	/// Timeout for inbound requests in seconds
	pub request_timeout: u64,
	pub graceful_shutdown: bool,
	/// Maximum accepted request body size in bytes
	pub max_body_size: usize,
	/// Whether 500 responses include the upstream error message
	pub detailed_errors: bool,
	/// When set, DICOM files from this directory are served under /dicom
	#[serde(default)]
	pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
	/// The origin of the upstream DICOMweb server, e.g. http://localhost:8042.
	/// DICOMweb is expected under {origin}/dicom-web and WADO-URI under {origin}/wado.
	pub origin: String,
	/// Timeout for outbound upstream requests in seconds
	pub timeout: u64,
}

/// Default values injected into DICOM-JSON records when the upstream omits a tag
/// the viewer's display-set builder requires.
///
/// These are guesses tuned for a CT-centric Orthanc deployment. Sites serving
/// other modalities or matrix sizes should override them per deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizationConfig {
	/// SOP Class UID (0008,0016) fallback
	pub sop_class_uid: String,
	/// Transfer Syntax UID (0002,0010) fallback
	pub transfer_syntax_uid: String,
	/// Photometric Interpretation (0028,0004) fallback
	pub photometric_interpretation: String,
	/// Modality (0008,0060) fallback for series records
	pub modality: String,
	/// Samples per Pixel (0028,0002) fallback
	pub samples_per_pixel: u16,
	/// Rows (0028,0010) fallback
	pub rows: u16,
	/// Columns (0028,0011) fallback
	pub columns: u16,
	/// Pixel Spacing (0028,0030) fallback
	pub pixel_spacing: Vec<String>,
	/// Image Type (0008,0008) fallback
	pub image_type: Vec<String>,
}

/// Data-source document served at /api/config. The serialized field names follow
/// the viewer's configuration schema.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ViewerConfig {
	pub friendly_name: String,
	pub qido_root: String,
	pub wado_root: String,
	pub wado_uri_root: String,
	pub qido_supports_include_field: bool,
	pub supports_fuzzy_matching: bool,
	pub supports_wildcard: bool,
	pub enable_study_lazy_load: bool,
	pub image_rendering: String,
	pub thumbnail_rendering: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn defaults() -> ApplicationConfig {
		config::Config::builder()
			.add_source(config::File::from_str(
				include_str!("defaults.toml"),
				config::FileFormat::Toml,
			))
			.build()
			.unwrap()
			.try_deserialize()
			.unwrap()
	}

	#[test]
	fn defaults_deserialize() {
		let config = defaults();

		assert_eq!(config.http.port, 4000);
		assert!(config.http.detailed_errors);
		assert!(config.http.static_dir.is_none());
		assert_eq!(config.upstream.origin, "http://localhost:8042");
		assert_eq!(config.telemetry.tracing_level(), Level::INFO);
	}

	#[test]
	fn default_tag_values_match_viewer_requirements() {
		let config = defaults().normalization;

		// CT Image Storage and Explicit VR Little Endian
		assert_eq!(config.sop_class_uid, "1.2.840.10008.5.1.4.1.1.2");
		assert_eq!(config.transfer_syntax_uid, "1.2.840.10008.1.2.1");
		assert_eq!(config.photometric_interpretation, "MONOCHROME2");
		assert_eq!(config.samples_per_pixel, 1);
		assert_eq!((config.rows, config.columns), (512, 512));
		assert_eq!(config.pixel_spacing, vec!["1.0", "1.0"]);
		assert_eq!(config.image_type, vec!["ORIGINAL", "PRIMARY", "AXIAL"]);
		assert_eq!(config.modality, "CT");
	}

	#[test]
	fn viewer_config_serializes_camel_case() {
		let viewer = defaults().viewer;
		let json = serde_json::to_value(&viewer).unwrap();

		assert_eq!(json["qidoRoot"], "/dicom-web");
		assert_eq!(json["wadoUriRoot"], "/wado");
		assert_eq!(json["supportsWildcard"], true);
		assert_eq!(json["enableStudyLazyLoad"], true);
	}
}
