pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod heartbeat;
pub mod models;
pub mod scorer;
pub mod state;
pub mod stats;
pub mod storage;
pub mod tasks;
pub mod ui;

pub use app::router;
pub use config::Settings;
pub use scorer::{compute_day_score, score_date};
pub use state::AppState;
pub use storage::{load_data, load_or_init, persist_data};
