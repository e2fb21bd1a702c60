pub(crate) mod api;
pub(crate) mod backend;
pub(crate) mod config;
pub(crate) mod dicomjson;
pub(crate) mod types;

use crate::backend::dicomweb::UpstreamClient;
use crate::backend::Services;
use crate::config::{ApplicationConfig, HttpConfig};
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::response::Response;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace;
use tracing::{error, info, level_filters::LevelFilter, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const SERVER_NAME: &str = concat!("DICOMweb-Proxy/", env!("CARGO_PKG_VERSION"));

fn init_logger(level: Level) {
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::fmt::layer()
				.compact()
				.with_ansi(true)
				.with_file(false)
				.with_line_number(false)
				.with_target(false),
		)
		.with(
			EnvFilter::builder()
				.with_default_directive(LevelFilter::from_level(level).into())
				.from_env_lossy(),
		)
		.with(sentry::integrations::tracing::layer())
		.init();
}

#[derive(Clone)]
pub struct AppState {
	pub config: ApplicationConfig,
	pub upstream: UpstreamClient,
	pub services: Services,
}

fn init_sentry(config: &ApplicationConfig) -> sentry::ClientInitGuard {
	let guard = sentry::init((
		// An empty string will disable Sentry
		config.telemetry.sentry.as_deref().unwrap_or_default(),
		sentry::ClientOptions {
			release: sentry::release_name!(),
			traces_sample_rate: 1.0,
			..Default::default()
		},
	));

	if let Some(dsn) = &config.telemetry.sentry {
		info!(dsn, "Enabled Sentry for tracing and error tracking");
	};

	guard
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let config = ApplicationConfig::new()?;
	init_logger(config.telemetry.tracing_level());

	// Manually create the Tokio runtime because the Sentry client needs to be created *before* the
	// Tokio runtime, which prevents us from using the #[tokio::main] macro.
	// See https://docs.sentry.io/platforms/rust/#async-main-function
	let _sentry = init_sentry(&config);

	tokio::runtime::Builder::new_multi_thread()
		.enable_all()
		.build()?
		.block_on(async move {
			if let Err(error) = run(config).await {
				error!("Failed to start application due to error: {error}");
			}
		});
	Ok(())
}

async fn run(config: ApplicationConfig) -> anyhow::Result<()> {
	let upstream = UpstreamClient::new(&config.upstream)?;
	let services = Services::dicomweb(&upstream, &config.normalization);

	let app_state = AppState {
		config: config.clone(),
		upstream,
		services,
	};

	let cors = CorsLayer::new()
		.allow_origin(Any)
		.allow_methods([
			Method::GET,
			Method::POST,
			Method::PUT,
			Method::DELETE,
			Method::OPTIONS,
		])
		.allow_headers([CONTENT_TYPE, AUTHORIZATION, ACCEPT]);

	let mut router = api::routes();
	if let Some(static_dir) = &config.http.static_dir {
		info!(path = %static_dir.display(), "Serving static DICOM files under /dicom");
		router = router.nest_service("/dicom", ServeDir::new(static_dir));
	}

	let app = router
		.layer(cors)
		.layer(axum::middleware::from_fn(add_common_headers))
		.layer(
			tower_http::trace::TraceLayer::new_for_http()
				.make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
				.on_request(trace::DefaultOnRequest::new().level(Level::INFO))
				.on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
		)
		.layer(DefaultBodyLimit::max(config.http.max_body_size))
		.layer(TimeoutLayer::new(Duration::from_secs(
			config.http.request_timeout,
		)))
		.with_state(app_state);

	let HttpConfig {
		interface: host,
		port,
		..
	} = &config.http;
	let addr = SocketAddr::from((*host, *port));
	let listener = TcpListener::bind(addr).await?;

	info!(
		"Started DICOMweb proxy on http://{addr} (upstream: {origin})",
		origin = config.upstream.origin
	);
	if config.http.graceful_shutdown {
		axum::serve(listener, app)
			.with_graceful_shutdown(shutdown_signal())
			.await?;
	} else {
		axum::serve(listener, app).await?;
	}

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async { signal::ctrl_c().await.unwrap() };

	#[cfg(unix)]
	let terminate = async {
		signal::unix::signal(signal::unix::SignalKind::terminate())
			.unwrap()
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}

async fn add_common_headers(req: Request, next: axum::middleware::Next) -> Response {
	let mut response = next.run(req).await;
	let headers = response.headers_mut();
	headers.insert("Server", axum::http::HeaderValue::from_static(SERVER_NAME));
	response
}
