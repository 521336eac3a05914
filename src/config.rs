use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Prediction service endpoint the pipeline POSTs email bodies to.
    pub model_endpoint: String,
    /// Timeout applied to the prediction request.
    pub request_timeout_seconds: u64,
    /// Flagged-keyword lexicon. Matches are collected in lexicon order.
    pub lexicon: Vec<String>,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Points added per extracted URL.
    pub url_weight: i32,
    /// Points added per flagged keyword.
    pub keyword_weight: i32,
    /// Scores at or above this band as High.
    pub high_threshold: i32,
    /// Scores at or above this (and below high_threshold) band as Medium.
    pub medium_threshold: i32,
    /// Which classifier supplies the final label and base score. The other
    /// classifier's confidence is kept in the report for audit only.
    pub authoritative_model: AuthoritativeModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthoritativeModel {
    /// The logistic-regression classifier.
    Primary,
    /// The random-forest classifier.
    Secondary,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model_endpoint: "http://localhost:8000/predict".to_string(),
            request_timeout_seconds: 10,
            lexicon: vec![
                "urgent".to_string(),
                "verify".to_string(),
                "password".to_string(),
                "login".to_string(),
                "click here".to_string(),
                "account".to_string(),
                "security".to_string(),
            ],
            scoring: ScoringConfig::default(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            url_weight: 2,
            keyword_weight: 3,
            high_threshold: 80,
            medium_threshold: 50,
            authoritative_model: AuthoritativeModel::Secondary,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        Url::parse(&self.model_endpoint)
            .map_err(|e| anyhow::anyhow!("invalid model_endpoint '{}': {e}", self.model_endpoint))?;
        if self.scoring.url_weight < 0 || self.scoring.keyword_weight < 0 {
            anyhow::bail!("scoring weights must be non-negative");
        }
        if self.scoring.medium_threshold >= self.scoring.high_threshold {
            anyhow::bail!(
                "medium_threshold ({}) must be below high_threshold ({})",
                self.scoring.medium_threshold,
                self.scoring.high_threshold
            );
        }
        Ok(())
    }
}
