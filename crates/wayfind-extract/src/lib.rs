//! AI extraction: Gemini structured output, strict decoding, and the
//! place rules re-applied in code.

pub mod engine;
pub mod error;
pub mod gemini;
pub mod grounding;
pub(crate) mod media;
pub(crate) mod prompts;
pub mod rules;
pub(crate) mod schema;
pub mod text;

pub use engine::{ExtractConfig, GeminiExtractor};
pub use error::ExtractionError;
pub use gemini::GeminiClient;
pub use grounding::MAX_SUGGESTIONS;
pub use rules::{enforce, normalize_name, place_key};
pub use text::truncate_to_char_boundary;
