//! The six gym collections share one CRUD implementation, parameterized by
//! [`kind::ResourceKind`].

pub mod handlers;
pub mod kind;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    kind::RESOURCES
        .iter()
        .fold(Router::new(), |router, kind| {
            router.merge(handlers::resource_routes(kind))
        })
}
