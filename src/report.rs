use crate::error::AnalysisError;
use crate::features::ExtractedFeatures;
use crate::model_gateway::ModelPredictions;
use crate::normalizer::NormalizedEmail;
use crate::reconciler::RiskAssessment;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

/// The persisted analysis record. Assembled once at the end of the
/// pipeline and never updated afterwards; the persisted identifier is
/// generated by the store, not carried here.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub submitter_id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub sender: String,
    pub assessment: RiskAssessment,
    pub features: ExtractedFeatures,
    pub model_results: ModelPredictions,
}

impl Report {
    /// Pure composition of the upstream artifacts plus a creation
    /// timestamp. Any invalid input has already failed in an earlier stage.
    pub fn assemble(
        submitter_id: &str,
        email: &NormalizedEmail,
        features: ExtractedFeatures,
        assessment: RiskAssessment,
        model_results: ModelPredictions,
    ) -> Self {
        Report {
            submitter_id: submitter_id.to_string(),
            created_at: Utc::now(),
            title: email.subject.clone(),
            sender: email.sender.clone(),
            assessment,
            features,
            model_results,
        }
    }
}

/// Persistence seam. Takes ownership of the report exactly once and
/// returns the generated identifier; the pipeline treats that identifier
/// as opaque.
pub trait ReportStore: Send + Sync {
    fn save(&self, report: Report) -> Result<String, AnalysisError>;
}

/// In-memory store backing the CLI and tests. Document-store persistence
/// lives behind the same trait elsewhere.
pub struct MemoryReportStore {
    reports: Mutex<Vec<(String, Report)>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
        }
    }

    pub fn get(&self, id: &str) -> Option<Report> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .find(|(report_id, _)| report_id == id)
            .map(|(_, report)| report.clone())
    }

    pub fn len(&self) -> usize {
        self.reports.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryReportStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportStore for MemoryReportStore {
    fn save(&self, report: Report) -> Result<String, AnalysisError> {
        let mut reports = self.reports.lock().unwrap();
        let id = format!("report-{:04}", reports.len() + 1);
        reports.push((id.clone(), report));
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_gateway::{ModelVerdict, VerdictLabel};
    use crate::reconciler::{RiskLevel, LEGITIMATE_SUGGESTION};

    fn sample_report() -> Report {
        let email = NormalizedEmail {
            sender: "alice@example.com".to_string(),
            subject: "Invoice".to_string(),
            body_text: "see attachment".to_string(),
        };
        let predictions = ModelPredictions {
            logistic_regression: ModelVerdict {
                label: VerdictLabel::Legitimate,
                confidence: 0.2,
            },
            random_forest: ModelVerdict {
                label: VerdictLabel::Legitimate,
                confidence: 0.1,
            },
        };
        let assessment = RiskAssessment {
            is_phishing: false,
            risk_score: 10,
            risk_level: RiskLevel::Low,
            suggestion: LEGITIMATE_SUGGESTION.to_string(),
        };
        Report::assemble(
            "user-1",
            &email,
            ExtractedFeatures::default(),
            assessment,
            predictions,
        )
    }

    #[test]
    fn test_assemble_copies_submission_metadata() {
        let report = sample_report();
        assert_eq!(report.submitter_id, "user-1");
        assert_eq!(report.title, "Invoice");
        assert_eq!(report.sender, "alice@example.com");
        assert_eq!(report.assessment.risk_score, 10);
    }

    #[test]
    fn test_memory_store_returns_distinct_ids() {
        let store = MemoryReportStore::new();
        let first = store.save(sample_report()).unwrap();
        let second = store.save(sample_report()).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.len(), 2);
        assert!(store.get(&first).is_some());
        assert!(store.get("missing").is_none());
    }
}
