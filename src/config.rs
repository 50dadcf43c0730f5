use chrono::Duration;
use hmac::{Hmac, Mac};
use log::{error, info, warn};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    http::SameSite,
    serde::json::serde_json,
    Build, Rocket,
};
use serde::Deserialize;
use sha2::Sha256;

use crate::model::{
    roster::Roster,
    store::{DynStore, FileStore, GistSettings, GistStore, MemoryStore, MongoStore},
};

type HmacSha256 = Hmac<Sha256>;

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    #[serde(default)]
    cookie_same_site: CookieSameSite,
    #[serde(flatten)]
    limits: Limits,
    // secrets
    jwt_secret: String,
    admin_password: String,
}

/// `SameSite` policy for the admin cookie. Use `none` when the dashboard is
/// served from a different site than the API; the cookie is then marked
/// `Secure` as browsers require.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieSameSite {
    #[default]
    Strict,
    Lax,
    None,
}

impl From<CookieSameSite> for SameSite {
    fn from(policy: CookieSameSite) -> Self {
        match policy {
            CookieSameSite::Strict => SameSite::Strict,
            CookieSameSite::Lax => SameSite::Lax,
            CookieSameSite::None => SameSite::None,
        }
    }
}

/// Optional caps on the size of a ballot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Limits {
    pub max_nominations_per_position: Option<usize>,
    pub max_submitter_name_length: Option<usize>,
}

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    pub fn cookie_same_site(&self) -> CookieSameSite {
        self.cookie_same_site
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Check a password against the shared admin password.
    ///
    /// Both sides are reduced to HMAC tags first so the final comparison runs
    /// in constant time.
    pub fn verify_admin_password(&self, password: &str) -> bool {
        let expected = self.admin_password_tag().finalize().into_bytes();
        let mut candidate = HmacSha256::new_from_slice(self.jwt_secret())
            .expect("HMAC can take key of any size");
        candidate.update(password.as_bytes());
        candidate.verify_slice(&expected).is_ok()
    }

    fn admin_password_tag(&self) -> HmacSha256 {
        let mut hmac = HmacSha256::new_from_slice(self.jwt_secret())
            .expect("HMAC can take key of any size");
        hmac.update(self.admin_password.as_bytes());
        hmac
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Where to find the roster of candidates.
#[derive(Deserialize)]
struct RosterConfig {
    roster: Option<Roster>,
    roster_path: Option<String>,
}

/// A fairing that loads the candidate roster, either inline from the config
/// or from a JSON file, and places it into managed state.
pub struct RosterFairing;

#[rocket::async_trait]
impl Fairing for RosterFairing {
    fn info(&self) -> Info {
        Info {
            name: "Roster",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<RosterConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load roster config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let roster = match (config.roster, config.roster_path) {
            (Some(roster), _) => roster,
            (None, Some(path)) => {
                let parsed = rocket::tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| e.to_string())
                    .and_then(|raw| serde_json::from_str::<Roster>(&raw).map_err(|e| e.to_string()));
                match parsed {
                    Ok(roster) => roster,
                    Err(e) => {
                        error!("Failed to load roster from {path}: {e}");
                        return Err(rocket);
                    }
                }
            }
            (None, None) => {
                warn!("No roster configured; the admin summary will be empty");
                Roster::default()
            }
        };
        info!("Loaded roster of {} positions", roster.positions().len());

        // Manage the state.
        rocket = rocket.manage(roster);
        Ok(rocket)
    }
}

/// The available storage backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    File,
    Gist,
    Mongodb,
}

/// Configuration for the storage backend.
#[derive(Deserialize)]
struct StoreConfig {
    // non-secrets
    #[serde(default)]
    store: StoreKind,
    store_path: Option<String>,
    gist_id: Option<String>,
    gist_filename: Option<String>,
    gist_api_url: Option<String>,
    db_name: Option<String>,
    // secrets
    gist_token: Option<String>,
    db_uri: Option<String>,
}

/// A fairing that builds the configured store and places it into managed state
/// as a [`DynStore`].
pub struct StoreFairing;

impl StoreFairing {
    async fn connect(config: StoreConfig) -> Result<DynStore, String> {
        let store: DynStore = match config.store {
            StoreKind::Memory => Box::new(MemoryStore::default()),
            StoreKind::File => {
                let path = config
                    .store_path
                    .ok_or("`store_path` must be set for the file store")?;
                Box::new(FileStore::new(path))
            }
            StoreKind::Gist => {
                let settings = GistSettings {
                    api_url: config
                        .gist_api_url
                        .unwrap_or_else(|| "https://api.github.com".to_string()),
                    gist_id: config
                        .gist_id
                        .ok_or("`gist_id` must be set for the gist store")?,
                    token: config
                        .gist_token
                        .ok_or("`gist_token` must be set for the gist store")?,
                    filename: config
                        .gist_filename
                        .unwrap_or_else(|| "nominations.json".to_string()),
                };
                Box::new(GistStore::new(settings).map_err(|e| e.to_string())?)
            }
            StoreKind::Mongodb => {
                let uri = config
                    .db_uri
                    .ok_or("`db_uri` must be set for the mongodb store")?;
                let client = MongoClient::with_uri_str(uri)
                    .await
                    .map_err(|e| e.to_string())?;
                let db = client.database(config.db_name.as_deref().unwrap_or("nominations"));
                Box::new(MongoStore::new(&db))
            }
        };
        Ok(store)
    }
}

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<StoreConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load store config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        let kind = config.store;
        info!("Loaded store config, setting up {kind:?} store...");

        // Construct the store.
        let store = match Self::connect(config).await {
            Ok(store) => store,
            Err(e) => {
                error!("Failed to set up store: {e}");
                return Err(rocket);
            }
        };
        info!("...{} store ready!", store.name());

        // Manage the state.
        rocket = rocket.manage(store);
        Ok(rocket)
    }
}

/// Example data for tests.
#[cfg(test)]
pub mod examples {
    use super::*;

    impl Config {
        pub fn example() -> Self {
            Self {
                auth_ttl: 3600,
                cookie_same_site: CookieSameSite::Strict,
                limits: Limits {
                    max_nominations_per_position: Some(5),
                    max_submitter_name_length: Some(60),
                },
                jwt_secret: "test-jwt-secret".to_string(),
                admin_password: "zetakappa".to_string(),
            }
        }

        pub fn with_cookie_same_site(self, cookie_same_site: CookieSameSite) -> Self {
            Self {
                cookie_same_site,
                ..self
            }
        }
    }
}
