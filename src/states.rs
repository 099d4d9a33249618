use crate::{
    api::ApiClient,
    config::ClientConfig,
    errors::ClientError,
    storage::{FileStorage, Storage},
    stores::{ContentStore, SessionStore},
};
use std::sync::Arc;

// ============================================================================
// APPLICATION STATE - Both stores, sharing one client
// ============================================================================
/// Explicit container handed to whatever drives the UI. Cloning is cheap and
/// every clone sees the same stores.
///
/// The two stores share one `ApiClient`, so the credential the session store
/// sets is carried by the content store's requests too.
#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub session: Arc<SessionStore>,
    pub content: Arc<ContentStore>,
}

impl AppState {
    pub fn new(config: &ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, ClientError> {
        let api = ApiClient::from_config(config)?;
        let session = SessionStore::restore(api.clone(), storage, config.locale);
        let content = ContentStore::new(api.clone(), config.locale, config.page_size);

        Ok(Self {
            api,
            session: Arc::new(session),
            content: Arc::new(content),
        })
    }

    /// Uses on-disk storage under `config.storage_dir`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let storage = FileStorage::open(&config.storage_dir)?;
        Self::new(config, Arc::new(storage))
    }
}
