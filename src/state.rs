use crate::config::Config;
use crate::error::Result;
use crate::remote::client::ApiClient;
use crate::session::broadcaster::SessionBroadcaster;
use crate::session::store::SessionStore;
use crate::storage::kv::SharedStorage;

/// The application's state.
///
/// One `AppState` corresponds to one independently rendered region: it owns
/// its own storage context, so session writes made through another
/// `AppState` over the same storage reach it as cross-context changes.
#[derive(Clone)]
pub struct AppState {
    /// The remote API client.
    pub api: ApiClient,
    /// The session store.
    pub session: SessionStore,
    /// The session change broadcaster.
    pub broadcaster: SessionBroadcaster,
    /// The application's configuration.
    pub config: Config,
}

impl AppState {
    /// Creates a new `AppState` backed by the configured storage file.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        let storage = SharedStorage::open(&config.storage_path)?;
        Self::with_storage(config, &storage)
    }

    /// Creates a new `AppState` attached to existing storage.
    pub fn with_storage(config: &Config, storage: &SharedStorage) -> Result<Self> {
        let api = ApiClient::new(config)?;
        tracing::debug!("API client ready: {}", api.base_url());

        Ok(AppState {
            api,
            session: SessionStore::new(storage.context()),
            broadcaster: SessionBroadcaster::new(),
            config: config.clone(),
        })
    }
}
