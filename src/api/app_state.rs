use crate::compositor::CatCompositor;
use crate::config::AppConfig;
use crate::llm::ChatModel;
use crate::services::CatGenerator;
use crate::store::KeyValueStore;
use std::sync::Arc;

/// Application state shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Profile generation backed by the chat model
    pub generator: Arc<CatGenerator>,
    /// Portrait compositor over the asset tree
    pub compositor: Arc<CatCompositor>,
    /// Backstory cache keyed by cat name
    pub store: Arc<dyn KeyValueStore>,
    /// Loaded configuration
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("generator", &self.generator)
            .field("compositor", &self.compositor)
            .field("store", &"Arc<dyn KeyValueStore>")
            .field("config", &self.config.app_name)
            .finish()
    }
}

impl AppState {
    /// Create new application state; the generator and handlers share one store
    pub fn new(
        config: AppConfig,
        model: Arc<dyn ChatModel>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let generator = CatGenerator::new(model, store.clone(), config.timeline.clone());
        let compositor = CatCompositor::new(&config.assets);
        Self {
            generator: Arc::new(generator),
            compositor: Arc::new(compositor),
            store,
            config: Arc::new(config),
        }
    }
}
