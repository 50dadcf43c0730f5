use std::collections::HashMap;

use log::{debug, warn};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
};
use rocket::{
    serde::json::{json, serde_json},
    tokio::sync::RwLock,
};
use serde::Deserialize;

use super::{NominationsData, Persistence, Store};
use crate::error::Result;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Where the document lives on GitHub.
#[derive(Debug, Clone)]
pub struct GistSettings {
    /// Base URL of the GitHub REST API.
    pub api_url: String,
    pub gist_id: String,
    pub token: String,
    /// Name of the file within the gist holding the document.
    pub filename: String,
}

impl GistSettings {
    fn gist_url(&self) -> String {
        format!("{}/gists/{}", self.api_url.trim_end_matches('/'), self.gist_id)
    }
}

/// Keeps the document as a file in a GitHub Gist, with a local copy that is
/// served whenever GitHub cannot be reached.
pub struct GistStore {
    settings: GistSettings,
    client: Client,
    cache: RwLock<Cache>,
}

/// The local copy of the document.
#[derive(Default)]
struct Cache {
    data: NominationsData,
    /// Whether the last read of the gist succeeded. Until it does, `data` may
    /// be missing submissions held remotely and must not be pushed over them.
    synced: bool,
}

#[derive(Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    raw_url: Option<String>,
}

impl GistStore {
    pub fn new(settings: GistSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            settings,
            client,
            cache: RwLock::default(),
        })
    }

    async fn fetch(&self) -> Result<NominationsData> {
        let gist: GistResponse = self
            .client
            .get(self.settings.gist_url())
            .bearer_auth(&self.settings.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(file) = gist.files.get(&self.settings.filename) else {
            debug!("Gist has no {}, starting empty", self.settings.filename);
            return Ok(NominationsData::default());
        };
        // Large files are cut short in the gist listing and must be fetched raw.
        let content = match (&file.content, file.truncated, &file.raw_url) {
            (_, true, Some(raw_url)) => {
                self.client
                    .get(raw_url)
                    .bearer_auth(&self.settings.token)
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?
            }
            (Some(content), _, _) => content.clone(),
            (None, _, _) => return Ok(NominationsData::default()),
        };
        if content.trim().is_empty() {
            return Ok(NominationsData::default());
        }
        let mut data: NominationsData = serde_json::from_str(&content)?;
        data.recompute();
        Ok(data)
    }

    async fn push(&self, data: &NominationsData) -> Result<()> {
        let content = serde_json::to_string_pretty(data)?;
        let mut files = serde_json::Map::new();
        files.insert(self.settings.filename.clone(), json!({ "content": content }));
        let body = json!({ "files": files });
        self.client
            .patch(self.settings.gist_url())
            .bearer_auth(&self.settings.token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[rocket::async_trait]
impl Store for GistStore {
    fn name(&self) -> &'static str {
        "gist"
    }

    async fn load(&self) -> Result<NominationsData> {
        match self.fetch().await {
            Ok(data) => {
                *self.cache.write().await = Cache {
                    data: data.clone(),
                    synced: true,
                };
                Ok(data)
            }
            Err(e) => {
                warn!("Could not read gist {}, using local copy: {e}", self.settings.gist_id);
                let mut cache = self.cache.write().await;
                cache.synced = false;
                Ok(cache.data.clone())
            }
        }
    }

    async fn save(&self, data: &NominationsData) -> Result<Persistence> {
        let mut cache = self.cache.write().await;
        cache.data = data.clone();
        if !cache.synced {
            warn!(
                "Not updating gist {} until it can be read again",
                self.settings.gist_id
            );
            return Ok(Persistence::LocalOnly);
        }
        match self.push(data).await {
            Ok(()) => Ok(Persistence::Durable),
            Err(e) => {
                warn!("Could not update gist {}: {e}", self.settings.gist_id);
                Ok(Persistence::LocalOnly)
            }
        }
    }
}
