use axum::middleware::map_response_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api::response::{ok, ApiSuccess};
use crate::api::{auth, categories, errors, questions, users};
use crate::state::AppState;

async fn health_handler() -> ApiSuccess<&'static str> {
    ok("ok")
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register_handler))
        .route("/login", post(auth::login_handler))
        .route("/refresh-token", post(auth::refresh_handler))
        .route("/link-discord-account", post(auth::link_discord_handler))
        .route("/unlink-discord-account", post(auth::unlink_discord_handler))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(users::me_handler))
        .route("/me/questions", get(users::my_questions_handler))
        .route("/me/answers", get(users::my_answers_handler))
        .route("/{id}", get(users::get_user_handler))
        .route("/{id}/questions", get(users::user_questions_handler))
        .route("/{id}/answers", get(users::user_answers_handler))
}

fn question_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(questions::list_questions_handler).post(questions::create_question_handler),
        )
        .route("/local", post(questions::create_local_question_handler))
        .route(
            "/{id}",
            get(questions::get_question_handler)
                .put(questions::update_question_handler)
                .delete(questions::delete_question_handler),
        )
        .route(
            "/{id}/answer",
            get(questions::my_answer_handler).post(questions::submit_answer_handler),
        )
        .route("/{id}/answers", get(questions::list_answers_handler))
        .route("/{id}/concense", post(questions::consensus_handler))
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(categories::list_categories_handler).post(categories::create_category_handler),
        )
        .route(
            "/{id}",
            get(categories::get_category_handler)
                .put(categories::update_category_handler)
                .delete(categories::delete_category_handler),
        )
}

/// Build the full HTTP router over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/auth/v1", auth_routes())
        .nest("/users/v1", user_routes())
        .nest("/questions/v1", question_routes())
        .nest("/categories/v1", category_routes())
        .fallback(errors::route_not_found)
        .layer(map_response_with_state(
            state.clone(),
            errors::attach_error_details,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
