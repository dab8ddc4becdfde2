/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - PopGateway (鍵ペアは起動時に一度だけ読み込み)、リプレイ対策ストア、公開 URL
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::PopGateway;
use crate::services::auth::replay::ReplayStore;

#[derive(Clone)]
pub struct AppState {
    pub pop: Arc<PopGateway>,
    pub replay: Option<Arc<dyn ReplayStore>>,
    pub public_base_url: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        pop: Arc<PopGateway>,
        replay: Option<Arc<dyn ReplayStore>>,
        public_base_url: Option<String>,
    ) -> Self {
        Self {
            pop,
            replay,
            public_base_url: public_base_url.map(Arc::from),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("pop", &self.pop)
            .field(
                "replay",
                &self.replay.as_ref().map(|store| store.backend_name()),
            )
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}
