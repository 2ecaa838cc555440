pub mod analysis;
pub mod chat;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod gemini;
pub mod models;
pub mod prompts;
pub mod service;
pub mod session;
pub mod upload;
pub mod workflow;

pub use analysis::{AnalysisError, AnalysisInvoker, AnalysisModel, AnalysisRequest, ModelError};
pub use config::{ConfigError, ServiceConfig};
pub use context::ConversationContext;
pub use models::*;
pub use service::{AppState, build_router, create_app};
pub use workflow::UploadWorkflow;
