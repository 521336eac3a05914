use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Signals extracted from one email body. `urls` holds unique matches in
/// first-occurrence order; `keywords` holds lexicon hits in lexicon order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFeatures {
    pub urls: Vec<String>,
    pub keywords: Vec<String>,
}

pub struct FeatureExtractor {
    url_regex: Regex,
    lexicon: Vec<String>,
}

impl FeatureExtractor {
    pub fn new(lexicon: &[String]) -> Self {
        Self {
            // A URL token ends at whitespace or one of " < > ( ).
            url_regex: Regex::new(r#"(?i)(https?://[^\s"<>()]+)|(www\.[^\s"<>()]+)"#).unwrap(),
            lexicon: lexicon.to_vec(),
        }
    }

    pub fn extract(&self, body_text: &str) -> ExtractedFeatures {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for m in self.url_regex.find_iter(body_text) {
            let url = m.as_str().to_string();
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }

        let lowered = body_text.to_lowercase();
        let keywords = self
            .lexicon
            .iter()
            .filter(|entry| lowered.contains(entry.to_lowercase().as_str()))
            .cloned()
            .collect();

        ExtractedFeatures { urls, keywords }
    }
}
