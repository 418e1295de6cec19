use crate::errors::{AppError, EmissionError};
use crate::repository::Repository;
use crate::storage::JsonFileStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Mutex<Repository<JsonFileStore>>>,
}

impl AppState {
    pub fn new(repo: Repository<JsonFileStore>) -> Self {
        Self {
            repo: Arc::new(Mutex::new(repo)),
        }
    }

    /// Runs a mutation on the blocking pool. Every mutation rewrites the data file.
    pub async fn write<T, F>(&self, work: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Repository<JsonFileStore>) -> Result<T, EmissionError> + Send + 'static,
        T: Send + 'static,
    {
        let repo = Arc::clone(&self.repo);
        let outcome = tokio::task::spawn_blocking(move || {
            let mut repo = repo.blocking_lock();
            work(&mut repo)
        })
        .await;
        match outcome {
            Ok(result) => result.map_err(AppError::from),
            Err(err) => {
                error!("repository task failed: {err}");
                Err(AppError::internal("repository task failed"))
            }
        }
    }
}
