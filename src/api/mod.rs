pub mod error;
mod tokens;
mod uploads;

use axum::Router;
use std::sync::Arc;

use crate::auth::AuthBackend;

pub use tokens::TokensState;
pub use uploads::UploadsState;

/// Create the API router.
pub fn create_api_router(auth: Arc<AuthBackend>) -> Router {
    let tokens_state = tokens::TokensState { auth: auth.clone() };
    let uploads_state = uploads::UploadsState { auth };

    Router::new()
        .nest("/auth", tokens::router(tokens_state))
        .nest("/uploads", uploads::router(uploads_state))
}
