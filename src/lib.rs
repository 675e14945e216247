pub mod api;
pub mod assistant;
pub mod auth;
pub mod coercion;
pub mod config;
pub mod database;
pub mod errors;
pub mod explainer;
pub mod extraction;
pub mod logging;
pub mod mentor;
pub mod model_client;
pub mod models;
pub mod quiz;
pub mod summarizer;

pub use assistant::AssistantService;
pub use auth::AuthService;
pub use coercion::{CoerceError, ExpectedShape};
pub use config::Config;
pub use database::Database;
pub use errors::*;
pub use explainer::ExplainerService;
pub use mentor::MentorService;
pub use model_client::{GenerativeProvider, ProviderKind};
pub use models::*;
pub use summarizer::SummaryMode;
