mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod render;

pub use document::{DocumentError, SourceImage};
pub use editor::{EditorSession, Effect, Redaction, RedactionKind, SessionError};
pub use error::{AppError, AppResult};
pub use render::{ImageFilter, WatermarkOptions};
