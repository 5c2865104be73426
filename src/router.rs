use std::sync::Arc;

use axum::{
    Extension, Router, middleware,
    routing::{get, post},
};

use crate::{
    auth::auth_middleware,
    config::AppConfig,
    routes,
    srs::Clock,
    store::FlashcardStore,
};

pub struct AppState<S> {
    pub store: S,
    pub clock: Arc<dyn Clock>,
}

pub fn init_router<S: FlashcardStore>(state: AppState<S>, config: AppConfig) -> Router {
    let state = Arc::new(state);
    let public_routes = Router::new().route("/health", get(routes::health_handler));
    let auth_routes = Router::new()
        .route(
            "/flashcards",
            get(routes::list_flashcards::<S>).post(routes::create_flashcard::<S>),
        )
        .route("/flashcards/import", post(routes::import_flashcards::<S>))
        .route("/flashcards/due", get(routes::due_flashcards::<S>))
        .route("/flashcards/stats", get(routes::flashcard_stats::<S>))
        .route(
            "/flashcards/{id}",
            get(routes::get_flashcard::<S>).delete(routes::delete_flashcard::<S>),
        )
        .route(
            "/flashcards/{id}/review",
            post(routes::review_flashcard::<S>),
        )
        .layer(middleware::from_fn(auth_middleware))
        .with_state(state);
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .layer(Extension(config))
}
