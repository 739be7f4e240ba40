use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Static bearer token guarding the analyze endpoints. Auth is
    /// disabled when unset.
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub virustotal_api_key: Option<String>,
    #[serde(default)]
    pub safebrowsing_api_key: Option<String>,
    #[serde(default)]
    pub phishtank_api_key: Option<String>,
    #[serde(default = "default_virustotal_requests_per_minute")]
    pub virustotal_requests_per_minute: usize,
    #[serde(default = "default_reputation_timeout_seconds")]
    pub reputation_timeout_seconds: u64,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_virustotal_requests_per_minute() -> usize {
    4
}

fn default_reputation_timeout_seconds() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: default_listen_addr(),
            auth_token: None,
            virustotal_api_key: None,
            safebrowsing_api_key: None,
            phishtank_api_key: None,
            virustotal_requests_per_minute: default_virustotal_requests_per_minute(),
            reputation_timeout_seconds: default_reputation_timeout_seconds(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.apply_env_overrides();
        config.normalize();
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Config loaded without a file: defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config.normalize();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("PHISHBUSTER_LISTEN_ADDR") {
            self.listen_addr = value;
        }
        if let Ok(value) = std::env::var("PHISHBUSTER_AUTH_TOKEN") {
            self.auth_token = Some(value);
        }
        if let Ok(value) = std::env::var("VIRUSTOTAL_API_KEY") {
            self.virustotal_api_key = Some(value);
        }
        if let Ok(value) = std::env::var("GOOGLE_SAFE_BROWSING_API_KEY") {
            self.safebrowsing_api_key = Some(value);
        }
        if let Ok(value) = std::env::var("PHISHTANK_API_KEY") {
            self.phishtank_api_key = Some(value);
        }
    }

    /// Empty-string credentials count as unset.
    fn normalize(&mut self) {
        for key in [
            &mut self.auth_token,
            &mut self.virustotal_api_key,
            &mut self.safebrowsing_api_key,
            &mut self.phishtank_api_key,
        ] {
            if key.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *key = None;
            }
        }
    }

    /// Which reputation credentials are present, for the health endpoint.
    pub fn configured_services(&self) -> serde_json::Value {
        serde_json::json!({
            "virustotal": self.virustotal_api_key.is_some(),
            "google_safe_browsing": self.safebrowsing_api_key.is_some(),
            "phishtank": self.phishtank_api_key.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.virustotal_requests_per_minute, 4);
        assert_eq!(config.reputation_timeout_seconds, 10);
        assert!(config.virustotal_api_key.is_none());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("virustotal_api_key: abc123\n").unwrap();
        assert_eq!(config.virustotal_api_key.as_deref(), Some("abc123"));
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_configured_services() {
        let mut config = Config::default();
        config.virustotal_api_key = Some("k".to_string());
        let services = config.configured_services();
        assert_eq!(services["virustotal"], true);
        assert_eq!(services["google_safe_browsing"], false);
        assert_eq!(services["phishtank"], false);
    }

    #[test]
    fn test_empty_key_normalized_away() {
        let mut config = Config::default();
        config.phishtank_api_key = Some("  ".to_string());
        config.normalize();
        assert!(config.phishtank_api_key.is_none());
    }

    #[test]
    fn test_roundtrip_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.listen_addr, config.listen_addr);
    }
}
