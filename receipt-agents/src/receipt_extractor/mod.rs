pub mod agent;
pub mod system_prompt;
pub mod types;

pub use agent::{complete_with_rotation, parse_response, strip_code_fences, ModelReceiptExtractor};
pub use types::{default_model_sequence, ModelClient, DEFAULT_MODEL_SEQUENCE};
