use crate::AppState;
use axum::Router;

pub mod common;
mod debug;
mod home;
mod proxy;
pub mod qido;
mod status;
pub mod wado;
mod wadouri;

pub fn routes() -> Router<AppState> {
	Router::new()
		.merge(home::routes())
		.merge(status::routes())
		.merge(debug::routes())
		.merge(qido::routes())
		.merge(wado::routes())
		.merge(wadouri::routes())
		.merge(proxy::routes())
}
