pub mod agent;
pub mod system_prompt;

pub use agent::{parse_health_response, HealthAnalyzer};
