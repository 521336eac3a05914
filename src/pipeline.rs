use crate::config::Config;
use crate::error::AnalysisError;
use crate::features::FeatureExtractor;
use crate::model_gateway::ModelGateway;
use crate::normalizer::EmailNormalizer;
use crate::reconciler::{RiskLevel, RiskReconciler};
use crate::report::{Report, ReportStore};
use serde::Serialize;

/// One inbound submission: the raw payload, the declared filename (only
/// its suffix is inspected), and the authenticated submitter.
#[derive(Debug, Clone)]
pub struct Submission {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub submitter_id: String,
}

/// The analysis fields surfaced to the caller alongside the report id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub phishing_detected: bool,
    /// The authoritative model's confidence.
    pub confidence: f64,
    pub rf_confidence: f64,
    pub lr_confidence: f64,
    pub risk_score: i32,
    pub risk_level: RiskLevel,
    pub suggestion: String,
    pub flagged_keywords: Vec<String>,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub message: String,
    pub report_id: String,
    pub analysis_result: AnalysisResult,
}

/// The full feature-extraction and risk-reconciliation pipeline. Every
/// stage is a pure or input-isolated function; the only suspension point
/// is the model gateway call. No state is shared across invocations, so
/// concurrent submissions need no locking here.
pub struct AnalysisPipeline<G, S> {
    normalizer: EmailNormalizer,
    extractor: FeatureExtractor,
    reconciler: RiskReconciler,
    gateway: G,
    store: S,
}

impl<G: ModelGateway, S: ReportStore> AnalysisPipeline<G, S> {
    pub fn new(config: &Config, gateway: G, store: S) -> Self {
        Self {
            normalizer: EmailNormalizer::new(),
            extractor: FeatureExtractor::new(&config.lexicon),
            reconciler: RiskReconciler::new(&config.scoring),
            gateway,
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one submission through normalize -> extract -> predict ->
    /// reconcile -> assemble. Any fatal condition aborts the invocation
    /// before a report is persisted.
    pub async fn analyze(&self, submission: Submission) -> Result<AnalysisOutcome, AnalysisError> {
        if submission.submitter_id.trim().is_empty() {
            return Err(AnalysisError::Authorization(
                "missing submitter identity".to_string(),
            ));
        }

        log::info!(
            "Analyzing {} for submitter {}",
            submission.filename,
            submission.submitter_id
        );

        let email = self
            .normalizer
            .normalize(&submission.bytes, &submission.filename)?;
        let features = self.extractor.extract(&email.body_text);
        log::debug!(
            "Extracted {} urls and {} flagged keywords",
            features.urls.len(),
            features.keywords.len()
        );

        let predictions = self.gateway.predict(&email.body_text).await?;
        let assessment = self.reconciler.reconcile(
            predictions.secondary(),
            predictions.primary(),
            &features,
        )?;
        let confidence = self
            .reconciler
            .authoritative_verdict(predictions.secondary(), predictions.primary())
            .confidence;

        let analysis_result = AnalysisResult {
            phishing_detected: assessment.is_phishing,
            confidence,
            rf_confidence: predictions.random_forest.confidence,
            lr_confidence: predictions.logistic_regression.confidence,
            risk_score: assessment.risk_score,
            risk_level: assessment.risk_level,
            suggestion: assessment.suggestion.clone(),
            flagged_keywords: features.keywords.clone(),
            urls: features.urls.clone(),
        };

        let report = Report::assemble(
            &submission.submitter_id,
            &email,
            features,
            assessment,
            predictions,
        );
        let report_id = self.store.save(report)?;
        log::info!(
            "Report {report_id} saved with risk level {:?}",
            analysis_result.risk_level
        );

        Ok(AnalysisOutcome {
            message: "File analyzed and report saved successfully".to_string(),
            report_id,
            analysis_result,
        })
    }
}
