//! A minesweeper player that only moves where logic says it's safe.
//!
//! Every revealed cell becomes a [`Statement`]: "exactly N of these cells are
//! mines". The [`KnowledgeBase`] shrinks statements as cells are proven mines
//! or safe, derives new statements from pairs where one statement's cells are a
//! subset of another's, and repeats until nothing more can be learned. When no
//! cell is proven safe, the caller falls back to a random move.
//!
//! ```
//! use minesweeper_kb::{Cell, KnowledgeBase};
//!
//! let mut kb = KnowledgeBase::new(3, 3);
//! kb.record_observation(Cell::new(0, 0), 0).unwrap();
//! assert_eq!(kb.request_safe_move(), Some(Cell::new(0, 1)));
//! ```
mod internal_util;
pub mod play;
mod solve;
pub mod util;

pub use solve::{Cell, InconsistencyError, InferenceMode, KnowledgeBase, Move, Statement};
