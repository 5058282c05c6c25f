mod knowledge;
mod types;

pub use knowledge::{InferenceMode, KnowledgeBase, Move};
pub use types::{Cell, InconsistencyError, Statement};
