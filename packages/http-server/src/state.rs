use std::sync::Arc;

use engine_contract::EngineRegistry;
use result_cache::ResultCache;

/// Shared, cloneable application state threaded into every handler. The
/// registry is immutable after start-up; the cache is the only process-wide
/// writable state (spec §5).
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EngineRegistry>,
    pub cache: Arc<ResultCache>,
}
