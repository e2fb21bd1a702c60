use crate::api::qido::QidoService;
use crate::api::wado::WadoService;
use crate::backend::dicomweb::{DicomWebQidoService, DicomWebWadoService, UpstreamClient};
use crate::config::NormalizationConfig;
use std::sync::Arc;

pub mod dicomweb;

/// The set of DICOMweb transaction services backing the HTTP API.
///
/// There is exactly one upstream origin per deployment, so the services are
/// built once at startup and shared behind the application state.
#[derive(Clone)]
pub struct Services {
	pub qido: Arc<dyn QidoService>,
	pub wado: Arc<dyn WadoService>,
}

impl Services {
	pub fn dicomweb(upstream: &UpstreamClient, normalization: &NormalizationConfig) -> Self {
		Self {
			qido: Arc::new(DicomWebQidoService::new(
				upstream.clone(),
				normalization.clone(),
			)),
			wado: Arc::new(DicomWebWadoService::new(
				upstream.clone(),
				normalization.clone(),
			)),
		}
	}
}
