//! BDI Common - Symptom severity estimation core
//!
//! Estimates depression symptom severity from free text by asking a local LLM
//! about each of the 21 inventory items, extracting a 0-3 level from every
//! answer and aggregating the levels into a total score and severity band.
//!
//! Pipeline per symptom: prompt -> llm_client -> parser -> analyzer.
//! The assessment module drives the pipeline over the whole catalog.

pub mod analyzer;
pub mod assessment;
pub mod catalog;
pub mod config;
pub mod error;
pub mod llm_client;
pub mod parser;
pub mod prompt;
pub mod types;

pub use analyzer::SymptomAnalyzer;
pub use assessment::{Aggregator, AnalysisRun, CancelToken, SeverityBand, SymptomStream};
pub use catalog::{SymptomDescriptor, BDI_SYMPTOMS};
pub use config::{AnalysisConfig, BdiConfig, ModelConfig};
pub use error::{AnalysisError, InferenceError, ValidationError};
pub use llm_client::{FakeLlmClient, HttpLlmClient, LlmClient};
pub use parser::{parse_response, ParsedResponse, RuleKind};
pub use prompt::build_prompt;
pub use types::{Level, SymptomResult};
