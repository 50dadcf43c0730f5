use rocket::tokio::sync::RwLock;

use super::{NominationsData, Persistence, Store};
use crate::error::Result;

/// Keeps everything in process memory; lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<NominationsData>,
}

impl MemoryStore {
    pub fn new(data: NominationsData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }
}

#[rocket::async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self) -> Result<NominationsData> {
        Ok(self.data.read().await.clone())
    }

    async fn save(&self, data: &NominationsData) -> Result<Persistence> {
        *self.data.write().await = data.clone();
        Ok(Persistence::Durable)
    }
}
