//! Interactive redaction editor: store, history, and the pointer-driven
//! interaction state machine.

mod gestures;
mod history;
mod redaction;
mod session;

pub use crate::geometry::{Handle, Point, Rect};
pub use gestures::MIN_DRAW_SIZE;
pub use history::History;
pub use redaction::{Redaction, RedactionKind, RedactionStore};
pub use session::{EditorSession, Effect, SessionError, SessionResult};
