use crate::error::{EngineError, Result};
use crate::utils::validation::{validate_learning_config, validate_scoring_config};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub learning: LearningConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: num_cpus::get(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| EngineError::InvalidConfig(format!("server address: {}", e)))
    }
}

/// Preference learning and hybrid ranking policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Below this many interactions the popularity ranking is used.
    pub cold_start_threshold: usize,
    /// Interactions at which confidence reaches 1.
    pub confidence_saturation: usize,
    pub popularity_limit: usize,
    pub collaborative_weight: f64,
    pub content_weight: f64,
    pub similar_actor_limit: usize,
    /// Similar actors must score strictly above this.
    pub min_actor_similarity: f64,
    pub top_preferences: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            cold_start_threshold: 5,
            confidence_saturation: 50,
            popularity_limit: 20,
            collaborative_weight: 0.3,
            content_weight: 0.7,
            similar_actor_limit: 10,
            min_actor_similarity: 0.1,
            top_preferences: 10,
        }
    }
}

/// Venue scoring factor weights, swipe adjustments and the threshold ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub quality_weight: f64,
    pub interest_weight: f64,
    pub trait_weight: f64,
    pub budget_weight: f64,
    pub similarity_weight: f64,
    pub liked_category_boost: f64,
    pub liked_tag_boost: f64,
    pub disliked_category_penalty: f64,
    pub disliked_tag_penalty: f64,
    pub novelty_bonus: f64,
    pub strict_threshold: f64,
    pub default_threshold: f64,
    pub relaxed_threshold: f64,
    /// More liked venues than this selects the strict threshold.
    pub strict_after_likes: usize,
    pub min_before_relax: usize,
    pub min_before_fallback: usize,
    pub fallback_limit: usize,
    pub default_limit: usize,
    /// Price level assumed for venues that do not report one.
    pub default_price_level: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            quality_weight: 0.25,
            interest_weight: 0.30,
            trait_weight: 0.20,
            budget_weight: 0.15,
            similarity_weight: 0.10,
            liked_category_boost: 0.2,
            liked_tag_boost: 0.15,
            disliked_category_penalty: 0.3,
            disliked_tag_penalty: 0.2,
            novelty_bonus: 0.05,
            strict_threshold: 0.4,
            default_threshold: 0.3,
            relaxed_threshold: 0.2,
            strict_after_likes: 3,
            min_before_relax: 10,
            min_before_fallback: 5,
            fallback_limit: 20,
            default_limit: 20,
            default_price_level: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of per-actor profile files. In-memory only when unset.
    #[serde(default)]
    pub profile_dir: Option<String>,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("TRIPMUSE").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.workers == 0 {
            return Err(EngineError::InvalidConfig(
                "server.workers must be greater than 0".to_string(),
            ));
        }
        validate_learning_config(&self.learning)?;
        validate_scoring_config(&self.scoring)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.learning.cold_start_threshold, 5);
        assert_eq!(config.scoring.default_limit, 20);
        assert!(config.storage.profile_dir.is_none());
    }

    #[test]
    fn test_socket_addr() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            workers: 1,
        };
        assert_eq!(server.socket_addr().unwrap().port(), 9000);

        let bad = ServerConfig {
            host: "not a host".to_string(),
            ..server
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nhost = \"127.0.0.1\"\nport = 3000\nworkers = 2\n").unwrap();
        writeln!(file, "[scoring]\nnovelty_bonus = 0.1\n").unwrap();

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.scoring.novelty_bonus, 0.1);
        assert_eq!(config.scoring.liked_tag_boost, 0.15);
        assert_eq!(config.learning, LearningConfig::default());
    }

    #[test]
    fn test_from_file_rejects_inverted_ladder() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[scoring]\nstrict_threshold = 0.1\n").unwrap();
        assert!(Config::from_file(file.path().to_str().unwrap()).is_err());
    }
}
