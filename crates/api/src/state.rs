use alumnet_config::Settings;
use alumnet_services::{
    AuthService, FeedService, LifecycleEngine, RecordStore, TrackerService, dao::Daos,
};
use std::sync::Arc;

use crate::ws::storage::WsStorage;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub store: Arc<dyn RecordStore>,
    pub auth: Arc<AuthService>,
    pub daos: Arc<Daos>,
    pub lifecycle: Arc<LifecycleEngine>,
    pub feeds: Arc<FeedService>,
    pub tracker: Arc<TrackerService>,
    pub ws_storage: Arc<WsStorage>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let daos = Arc::new(Daos::new(store.clone()));
        let lifecycle = Arc::new(LifecycleEngine::new(daos.clone(), settings.lifecycle.clone()));
        let feeds = Arc::new(FeedService::new(
            daos.clone(),
            &settings.lifecycle,
            settings.feed.channel_capacity,
        ));
        let tracker = Arc::new(TrackerService::new(daos.clone()));
        let ws_storage = Arc::new(WsStorage::new());

        Self {
            settings,
            store,
            auth,
            daos,
            lifecycle,
            feeds,
            tracker,
            ws_storage,
        }
    }
}
