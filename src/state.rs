//! Estado compartido entre workers de Actix

use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::config::AppConfig;
use crate::db::MongoRepo;
use crate::services::{assistant, mailer, Assistant, Mailer, UploadStore};

#[derive(Clone)]
pub struct AppState {
    pub repo: MongoRepo,
    pub mailer: Arc<dyn Mailer>,
    pub assistant: Option<Arc<dyn Assistant>>,
    pub uploads: UploadStore,
    pub room_locks: RoomLocks,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(repo: MongoRepo, config: &AppConfig) -> Self {
        Self {
            repo,
            mailer: Arc::from(mailer::from_config(config)),
            assistant: assistant::from_config(config).map(Arc::from),
            uploads: UploadStore::new(config.upload_dir.clone(), config.max_upload_bytes),
            room_locks: RoomLocks::default(),
            cookie_secure: config.cookie_secure,
        }
    }
}

/// Un mutex asíncrono por habitación.
///
/// Se mantiene durante comprobación de disponibilidad + inserción, de modo que
/// dos reservas de la misma habitación en este proceso no se cruzan.
#[derive(Clone, Default)]
pub struct RoomLocks {
    inner: Arc<Mutex<HashMap<ObjectId, Arc<AsyncMutex<()>>>>>,
}

impl RoomLocks {
    pub async fn lock(&self, room_id: ObjectId) -> OwnedMutexGuard<()> {
        let room_lock = {
            let mut locks = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.entry(room_id).or_default().clone()
        };
        room_lock.lock_owned().await
    }
}
