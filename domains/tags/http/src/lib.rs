pub mod auth;
pub mod handlers;

use axum::Router;
pub use auth::AuthService;
pub use handlers::*;
use memory_cache::MemoryCache;
use sql_connection::SqlConnect;

pub fn tag_routes(db: SqlConnect, cache: MemoryCache) -> Router {
    let services = TagServices::new(db, cache);
    TagHandlers::routes().with_state(services)
}
