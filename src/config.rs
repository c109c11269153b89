use crate::scoring::Method;
use crate::storage::{self, StorageManager};
use serde::{Deserialize, Serialize};

const DEFAULT_API_KEY: &str = "prospecta-demo";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REGION: &str = "Lima";

/// Default embedding model for the semantic scoring method
const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";
/// Vocabulary caps for the tf-idf method
const DEFAULT_SEARCH_MAX_TERMS: usize = 600;
const DEFAULT_RADAR_MAX_TERMS: usize = 500;

const DEFAULT_PROXY_ENDPOINT: &str = "http://api.scraperapi.com";
const DEFAULT_COUNTRY_CODE: &str = "pe";
const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_SOURCES: usize = 3;
const DEFAULT_MAX_ITEMS: usize = 50;

/// Configuration for similarity scoring
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Default scoring method: "tfidf" or "embedding"
    #[serde(default = "default_method")]
    pub default_method: String,

    /// Vocabulary cap for prospect search
    #[serde(default = "default_search_max_terms")]
    pub search_max_terms: usize,

    /// Vocabulary cap for the dashboard radar
    #[serde(default = "default_radar_max_terms")]
    pub radar_max_terms: usize,

    /// Model name for embeddings (e.g., "all-MiniLM-L6-v2")
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

impl ScoringConfig {
    /// Configured fallback for requests that don't pass a method.
    pub fn method(&self) -> Method {
        Method::parse(&self.default_method)
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_method: default_method(),
            search_max_terms: DEFAULT_SEARCH_MAX_TERMS,
            radar_max_terms: DEFAULT_RADAR_MAX_TERMS,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

/// Configuration for the discovery proxy
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Scraping proxy endpoint. The target search url is passed as
    /// a `url` query parameter.
    #[serde(default = "default_proxy_endpoint")]
    pub endpoint: String,

    /// Proxy api key, passed as an `api_key` query parameter
    #[serde(default)]
    pub api_key: Option<String>,

    /// Pre-encoded Basic authorization token
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Basic auth credentials, used when no pre-encoded token is set
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Per-source fetch timeout. No retries, no backoff.
    #[serde(default = "default_source_timeout_secs")]
    pub timeout_secs: u64,

    /// Max search queries executed per discovery run
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    /// Max candidates returned per discovery run
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_proxy_endpoint(),
            api_key: None,
            auth_token: None,
            username: None,
            password: None,
            country_code: default_country_code(),
            timeout_secs: DEFAULT_SOURCE_TIMEOUT_SECS,
            max_sources: DEFAULT_MAX_SOURCES,
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}

fn default_method() -> String {
    "tfidf".to_string()
}

fn default_search_max_terms() -> usize {
    DEFAULT_SEARCH_MAX_TERMS
}

fn default_radar_max_terms() -> usize {
    DEFAULT_RADAR_MAX_TERMS
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_proxy_endpoint() -> String {
    DEFAULT_PROXY_ENDPOINT.to_string()
}

fn default_country_code() -> String {
    DEFAULT_COUNTRY_CODE.to_string()
}

fn default_source_timeout_secs() -> u64 {
    DEFAULT_SOURCE_TIMEOUT_SECS
}

fn default_max_sources() -> usize {
    DEFAULT_MAX_SOURCES
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}

fn default_api_key() -> String {
    DEFAULT_API_KEY.to_string()
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Shared secret required on every endpoint (`api_key` query parameter)
    #[serde(default = "default_api_key")]
    pub api_key: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Region assumed when a request doesn't pass one
    #[serde(default = "default_region")]
    pub default_region: String,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            listen_addr: default_listen_addr(),
            default_region: default_region(),
            scoring: ScoringConfig::default(),
            discovery: DiscoveryConfig::default(),
            base_path: String::new(),
        }
    }
}

impl Config {
    fn validate(&mut self) {
        if self.api_key.is_empty() {
            panic!("api_key must not be empty");
        }

        let scoring = &self.scoring;
        if scoring.default_method != "tfidf" && scoring.default_method != "embedding" {
            panic!(
                "scoring.default_method must be 'tfidf' or 'embedding', got '{}'",
                scoring.default_method
            );
        }
        if scoring.search_max_terms == 0 || scoring.radar_max_terms == 0 {
            panic!("scoring vocabulary caps must be greater than 0");
        }

        let discovery = &self.discovery;
        if discovery.timeout_secs == 0 {
            panic!("discovery.timeout_secs must be greater than 0");
        }
        if discovery.max_sources == 0 {
            panic!("discovery.max_sources must be greater than 0");
        }
        if discovery.auth_token.is_some() && discovery.username.is_some() {
            panic!("discovery auth: set either auth_token or username/password, not both");
        }
    }

    pub fn load_with(base_path: &str) -> Self {
        let store = storage::BackendLocal::new(base_path).expect("couldnt create config dir");

        // create new if does not exist
        if !store.exists("config.yaml") {
            store
                .write(
                    "config.yaml",
                    serde_yml::to_string(&Self::default()).unwrap().as_bytes(),
                )
                .expect("couldnt write default config");
        }

        let config_str = String::from_utf8(store.read("config.yaml").expect("couldnt read config"))
            .expect("config file is not valid utf8");
        let mut config: Self = serde_yml::from_str(&config_str).expect("config is malformed");

        config.base_path = base_path.to_string();

        config.validate();

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config).unwrap() {
            config.save();
        }

        config
    }

    pub fn save(&self) {
        let store = storage::BackendLocal::new(&self.base_path).expect("couldnt create config dir");

        let config_str = serde_yml::to_string(&self).unwrap();
        store
            .write("config.yaml", config_str.as_bytes())
            .expect("couldnt write config");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_creates_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_with(dir.path().to_str().unwrap());

        assert_eq!(config.api_key, "prospecta-demo");
        assert_eq!(config.default_region, "Lima");
        assert_eq!(config.scoring.default_method, "tfidf");
        assert_eq!(config.scoring.search_max_terms, 600);
        assert_eq!(config.scoring.radar_max_terms, 500);
        assert_eq!(config.discovery.timeout_secs, 30);
        assert_eq!(config.discovery.max_sources, 3);
        assert_eq!(config.discovery.max_items, 50);
        assert!(dir.path().join("config.yaml").exists());
    }

    #[test]
    fn configured_method_is_the_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "scoring:\n  default_method: embedding\n",
        )
        .unwrap();

        let config = Config::load_with(dir.path().to_str().unwrap());
        assert_eq!(config.scoring.method(), Method::Embedding);
        assert_eq!(Config::default().scoring.method(), Method::Tfidf);
    }

    #[test]
    #[should_panic(expected = "default_method")]
    fn rejects_unknown_method() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "scoring:\n  default_method: cosine\n",
        )
        .unwrap();
        let _ = Config::load_with(dir.path().to_str().unwrap());
    }
}
