use crate::error::AnalysisError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A classifier's output label. The prediction service historically emits
/// "non-phishing" for clean mail, so that spelling is accepted as an alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictLabel {
    Phishing,
    #[serde(alias = "non-phishing")]
    Legitimate,
}

/// One classifier's verdict: a label plus a confidence in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVerdict {
    #[serde(rename = "prediction")]
    pub label: VerdictLabel,
    pub confidence: f64,
}

/// The two independent verdicts returned by the prediction service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPredictions {
    pub logistic_regression: ModelVerdict,
    pub random_forest: ModelVerdict,
}

impl ModelPredictions {
    pub fn primary(&self) -> &ModelVerdict {
        &self.logistic_regression
    }

    pub fn secondary(&self) -> &ModelVerdict {
        &self.random_forest
    }
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    body: &'a str,
}

/// Capability seam for the external classification service, so the
/// reconciliation logic can be exercised with deterministic stub verdicts.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn predict(&self, body_text: &str) -> Result<ModelPredictions, AnalysisError>;
}

/// HTTP client for the prediction service. One blocking request per
/// invocation, no retry; any transport failure or malformed payload is
/// fatal for the request.
pub struct HttpModelGateway {
    client: Client,
    endpoint: String,
}

impl HttpModelGateway {
    pub fn new(endpoint: &str, timeout_seconds: u64) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("phishguard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AnalysisError::Upstream(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl ModelGateway for HttpModelGateway {
    async fn predict(&self, body_text: &str) -> Result<ModelPredictions, AnalysisError> {
        log::debug!("Requesting model predictions from {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&PredictRequest { body: body_text })
            .send()
            .await
            .map_err(|e| AnalysisError::Upstream(format!("prediction service unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Upstream(format!(
                "prediction service returned {status}"
            )));
        }

        response
            .json::<ModelPredictions>()
            .await
            .map_err(|e| AnalysisError::Upstream(format!("malformed prediction response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predictions_deserialize() {
        let payload = r#"{
            "logistic_regression": {"prediction": "phishing", "confidence": 0.91},
            "random_forest": {"prediction": "legitimate", "confidence": 0.42}
        }"#;
        let predictions: ModelPredictions = serde_json::from_str(payload).unwrap();
        assert_eq!(predictions.primary().label, VerdictLabel::Phishing);
        assert_eq!(predictions.secondary().label, VerdictLabel::Legitimate);
        assert!((predictions.secondary().confidence - 0.42).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_phishing_alias_accepted() {
        let payload = r#"{"prediction": "non-phishing", "confidence": 0.2}"#;
        let verdict: ModelVerdict = serde_json::from_str(payload).unwrap();
        assert_eq!(verdict.label, VerdictLabel::Legitimate);
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let payload = r#"{
            "logistic_regression": {"prediction": "phishing"},
            "random_forest": {"prediction": "legitimate", "confidence": 0.4}
        }"#;
        assert!(serde_json::from_str::<ModelPredictions>(payload).is_err());
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let payload = r#"{"prediction": "spam", "confidence": 0.5}"#;
        assert!(serde_json::from_str::<ModelVerdict>(payload).is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let request = PredictRequest { body: "hello" };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"body":"hello"}"#);
    }
}
