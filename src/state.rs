use crate::config::Settings;
use crate::heartbeat::Heartbeat;
use crate::models::AppData;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub heartbeat: Heartbeat,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: AppData) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            heartbeat: Heartbeat::new(),
        }
    }

    pub fn from_settings(settings: &Settings, data: AppData) -> Self {
        Self::new(settings.data_path.clone(), data)
    }
}
