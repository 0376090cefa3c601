use crate::config::Config;
use crate::functions::FunctionsState;
use crate::functions::completion::ChatClient;
use crate::journal::{
    ChangeFeed, JournalBackend, JournalWatcher, MemoryJournalTable, RestJournalTable,
};
use crate::storage::{LocalStore, load_app_data};
use crate::store::Store;
use crate::tips::{FunctionsClient, InProcessTips, TipBackend, TipGenerator};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub storage: LocalStore,
    pub store: Arc<Store>,
    pub tips: Arc<TipGenerator<TipBackend>>,
    pub journal: Arc<JournalWatcher<JournalBackend>>,
    pub journal_feed: ChangeFeed,
    pub functions: FunctionsState,
}

impl AppState {
    /// Opens local storage, hydrates the store and wires the remote collaborators
    /// selected by `config`.
    pub async fn build(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let storage = LocalStore::open(&config.data_dir).await?;
        let data = load_app_data(&storage).await;
        let store = Arc::new(Store::new(storage.clone(), data));

        let chat = ChatClient::new(&config.completion)?;
        if !chat.has_api_key() {
            info!("OPENAI_API_KEY not set, functions will answer with fallback payloads");
        }
        let functions = FunctionsState::new(chat.clone(), config.fallback_status);

        let backend = match &config.functions_url {
            Some(url) => {
                info!(%url, "tips come from remote functions");
                let key = config.supabase.as_ref().map(|supabase| supabase.anon_key.clone());
                TipBackend::Remote(FunctionsClient::new(url.clone(), key)?)
            }
            None => TipBackend::InProcess(InProcessTips::new(chat)),
        };
        let tips = Arc::new(TipGenerator::load(backend, storage.clone()).await);

        let journal_feed = ChangeFeed::default();
        let table = match &config.supabase {
            Some(supabase) => {
                info!(url = %supabase.url, "journal backed by remote table");
                JournalBackend::Rest(RestJournalTable::new(supabase, journal_feed.clone())?)
            }
            None => JournalBackend::Memory(MemoryJournalTable::new(journal_feed.clone())),
        };
        let journal = Arc::new(JournalWatcher::start(Arc::new(table), config.user_id.clone()));

        Ok(Self {
            storage,
            store,
            tips,
            journal,
            journal_feed,
            functions,
        })
    }
}
