//! Conversational query engine: retrieval, bounded context, session memory.

pub mod engine;
pub mod prompt;
pub mod session;

pub use engine::{extract_file_references, QueryEngine};
pub use session::{Session, SessionStore};
