use crate::errors::AppError;
use crate::models::AppData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file {}: {err}", path.display());
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file {}: {err}", path.display());
            AppData::default()
        }
    }
}

/// Loads the document, seeding the default configuration to disk on first run.
pub async fn load_or_init(path: &Path) -> AppData {
    if fs::try_exists(path).await.unwrap_or(false) {
        return load_data(path).await;
    }

    let data = AppData::default();
    match persist_data(path, &data).await {
        Ok(()) => info!("created {} with the default task list", path.display()),
        Err(err) => warn!("could not write initial data file: {}", err.message),
    }
    data
}

/// Replaces the whole document on disk via a sibling temp file and rename.
pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(AppError::internal)?;
    }

    let staging = staging_path(path);
    if let Err(err) = fs::write(&staging, payload).await {
        error!("failed to write {}: {err}", staging.display());
        return Err(AppError::internal(err));
    }
    if let Err(err) = fs::rename(&staging, path).await {
        error!("failed to replace {}: {err}", path.display());
        let _ = fs::remove_file(&staging).await;
        return Err(AppError::internal(err));
    }
    Ok(())
}

/// Raw bytes of the persisted file, or `None` when nothing has been saved yet.
pub async fn read_raw(path: &Path) -> Result<Option<Vec<u8>>, AppError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(AppError::internal(err)),
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
