use std::io::ErrorKind;
use std::path::PathBuf;

use log::{debug, info};
use rocket::{serde::json::serde_json, tokio::fs};

use super::{NominationsData, Persistence, Store};
use crate::error::Result;

/// Keeps the whole document in a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[rocket::async_trait]
impl Store for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn load(&self) -> Result<NominationsData> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No data at {}, starting empty", self.path.display());
                return Ok(NominationsData::default());
            }
            Err(e) => return Err(e.into()),
        };
        let mut data: NominationsData = serde_json::from_str(&raw)?;
        data.recompute();
        Ok(data)
    }

    async fn save(&self, data: &NominationsData) -> Result<Persistence> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, raw).await?;
        debug!(
            "Wrote {} submissions to {}",
            data.nominations.len(),
            self.path.display()
        );
        Ok(Persistence::Durable)
    }
}
