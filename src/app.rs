use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/data.json", get(handlers::data_file))
        .route("/save", post(handlers::save_document))
        .route("/heartbeat", post(handlers::heartbeat))
        .route("/api/load", get(handlers::load))
        .route("/api/save", post(handlers::save))
        .route("/api/score/:date", get(handlers::get_score))
        .route("/api/week", get(handlers::get_week))
        .route("/api/history", get(handlers::get_history))
        .route("/api/record", post(handlers::set_record))
        .route("/api/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route("/api/tasks/:index", put(handlers::update_task).delete(handlers::delete_task))
        .route("/api/tasks/:index/move", post(handlers::move_task))
        .with_state(state)
}
