pub mod config;
pub mod error;
pub mod features;
pub mod model_gateway;
pub mod normalizer;
pub mod pipeline;
pub mod reconciler;
pub mod report;

pub use config::{AuthoritativeModel, Config, ScoringConfig};
pub use error::AnalysisError;
pub use features::{ExtractedFeatures, FeatureExtractor};
pub use model_gateway::{
    HttpModelGateway, ModelGateway, ModelPredictions, ModelVerdict, VerdictLabel,
};
pub use normalizer::{EmailNormalizer, NormalizedEmail};
pub use pipeline::{AnalysisOutcome, AnalysisPipeline, AnalysisResult, Submission};
pub use reconciler::{RiskAssessment, RiskLevel, RiskReconciler};
pub use report::{MemoryReportStore, Report, ReportStore};
