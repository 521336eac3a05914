use crate::config::{AuthoritativeModel, ScoringConfig};
use crate::error::AnalysisError;
use crate::features::ExtractedFeatures;
use crate::model_gateway::{ModelVerdict, VerdictLabel};
use serde::{Deserialize, Serialize};

pub const PHISHING_SUGGESTION: &str = "Do not click links or respond";
pub const LEGITIMATE_SUGGESTION: &str = "No action needed";

/// Coarse bucket derived from the numeric risk score. Band lower bounds
/// are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// The reconciled verdict for one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub is_phishing: bool,
    pub risk_score: i32,
    pub risk_level: RiskLevel,
    pub suggestion: String,
}

/// Merges the authoritative classifier's confidence with extracted-feature
/// counts into a bounded score and band. Stateless; identical inputs yield
/// identical output.
pub struct RiskReconciler {
    url_weight: i32,
    keyword_weight: i32,
    high_threshold: i32,
    medium_threshold: i32,
    authority: AuthoritativeModel,
}

impl RiskReconciler {
    pub fn new(scoring: &ScoringConfig) -> Self {
        Self {
            url_weight: scoring.url_weight,
            keyword_weight: scoring.keyword_weight,
            high_threshold: scoring.high_threshold,
            medium_threshold: scoring.medium_threshold,
            authority: scoring.authoritative_model,
        }
    }

    /// The verdict the final label and base score are taken from.
    pub fn authoritative_verdict<'a>(
        &self,
        secondary: &'a ModelVerdict,
        primary: &'a ModelVerdict,
    ) -> &'a ModelVerdict {
        match self.authority {
            AuthoritativeModel::Primary => primary,
            AuthoritativeModel::Secondary => secondary,
        }
    }

    pub fn reconcile(
        &self,
        secondary: &ModelVerdict,
        primary: &ModelVerdict,
        features: &ExtractedFeatures,
    ) -> Result<RiskAssessment, AnalysisError> {
        // An out-of-range confidence is malformed input, never silently
        // floored into a valid score.
        for verdict in [secondary, primary] {
            if !(0.0..=1.0).contains(&verdict.confidence) {
                return Err(AnalysisError::Input(format!(
                    "model confidence {} outside [0, 1]",
                    verdict.confidence
                )));
            }
        }

        let verdict = self.authoritative_verdict(secondary, primary);
        let base = (verdict.confidence * 100.0).round() as i32;
        let adjusted = base
            + self.url_weight * features.urls.len() as i32
            + self.keyword_weight * features.keywords.len() as i32;
        let risk_score = adjusted.clamp(0, 100);

        let risk_level = if risk_score >= self.high_threshold {
            RiskLevel::High
        } else if risk_score >= self.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        let is_phishing = verdict.label == VerdictLabel::Phishing;
        let suggestion = if is_phishing {
            PHISHING_SUGGESTION
        } else {
            LEGITIMATE_SUGGESTION
        }
        .to_string();

        log::debug!(
            "Reconciled score {base} -> {risk_score} ({} urls, {} keywords)",
            features.urls.len(),
            features.keywords.len()
        );

        Ok(RiskAssessment {
            is_phishing,
            risk_score,
            risk_level,
            suggestion,
        })
    }
}
