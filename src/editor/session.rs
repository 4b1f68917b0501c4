use image::RgbaImage;
use thiserror::Error;

use super::history::History;
use super::redaction::{Redaction, RedactionKind, RedactionStore};
use crate::document::SourceImage;
use crate::geometry::{Handle, Point, Rect};
use crate::render::{self, ImageFilter, Scene, WatermarkOptions};

pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no image loaded")]
    NoImageLoaded,
}

/// What the shell must do after a command. Commands that changed nothing
/// visible return `Effect::None`; everything else asks for one
/// recomposition pass.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    Recompose,
}

impl Effect {
    pub const fn recompose_needed(self) -> bool {
        matches!(self, Self::Recompose)
    }
}

/// Pointer gesture currently in flight. Selection is tracked separately;
/// drag and resize always act on the selected redaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Gesture {
    Idle,
    Drawing { anchor: Point, preview: Option<Rect> },
    Dragging { offset: Point },
    Resizing { handle: Handle },
}

/// One editing session over one loaded image.
///
/// Owns the redaction store, the undo history, the transient selection and
/// gesture state, and the configuration surface values the composition
/// pipeline reads on demand. All commands are synchronous and inert until
/// an image has been loaded.
#[derive(Debug)]
pub struct EditorSession {
    pub(super) source: Option<SourceImage>,
    pub(super) store: RedactionStore,
    pub(super) history: History,
    pub(super) selection: Option<u64>,
    pub(super) gesture: Gesture,
    pub(super) redaction_mode: bool,
    pub(super) active_kind: RedactionKind,
    filter: ImageFilter,
    watermark: WatermarkOptions,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        Self {
            source: None,
            store: RedactionStore::new(),
            history: History::new(),
            selection: None,
            gesture: Gesture::Idle,
            redaction_mode: false,
            active_kind: RedactionKind::default(),
            filter: ImageFilter::None,
            watermark: WatermarkOptions::default(),
        }
    }

    /// Session seeded with the watermark defaults from the user's
    /// `config.json`, when one exists.
    pub fn with_user_config() -> Self {
        let mut session = Self::new();
        crate::config::load_app_config().apply_to(&mut session.watermark);
        session
    }

    /// Installs a freshly decoded image, discarding all redactions, undo
    /// history and selection state from the previous one.
    pub fn load(&mut self, source: SourceImage) -> Effect {
        tracing::info!(
            width = source.width(),
            height = source.height(),
            "image loaded, resetting session"
        );
        self.source = Some(source);
        self.store.clear();
        self.history.reset();
        self.selection = None;
        self.gesture = Gesture::Idle;
        Effect::Recompose
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.source
            .as_ref()
            .map(|source| (source.width(), source.height()))
    }

    pub fn redactions(&self) -> &[Redaction] {
        self.store.redactions()
    }

    pub fn selection(&self) -> Option<u64> {
        self.selection
    }

    pub fn selected_redaction(&self) -> Option<&Redaction> {
        self.selection.and_then(|id| self.store.get(id))
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn redaction_mode(&self) -> bool {
        self.redaction_mode
    }

    pub fn active_kind(&self) -> RedactionKind {
        self.active_kind
    }

    pub fn filter(&self) -> ImageFilter {
        self.filter
    }

    pub fn watermark(&self) -> &WatermarkOptions {
        &self.watermark
    }

    pub(super) fn commit(&mut self) {
        self.history.commit(self.store.snapshot());
    }

    fn recompose_if_loaded(&self) -> Effect {
        if self.source.is_some() {
            Effect::Recompose
        } else {
            Effect::None
        }
    }

    /// Flips redaction mode. Leaving the mode drops the selection and any
    /// gesture in flight without touching the store.
    pub fn toggle_redaction_mode(&mut self) -> Effect {
        self.redaction_mode = !self.redaction_mode;
        tracing::debug!(enabled = self.redaction_mode, "redaction mode toggled");
        if self.redaction_mode {
            return Effect::None;
        }
        self.selection = None;
        self.gesture = Gesture::Idle;
        self.recompose_if_loaded()
    }

    pub fn set_filter(&mut self, filter: ImageFilter) -> Effect {
        self.filter = filter;
        self.recompose_if_loaded()
    }

    pub fn set_watermark(&mut self, watermark: WatermarkOptions) -> Effect {
        self.watermark = watermark;
        self.recompose_if_loaded()
    }

    pub fn set_watermark_text(&mut self, text: impl Into<String>) -> Effect {
        self.watermark.text = text.into();
        self.recompose_if_loaded()
    }

    pub fn set_watermark_font_size(&mut self, font_size: f32) -> Effect {
        self.watermark.font_size = font_size;
        self.recompose_if_loaded()
    }

    pub fn set_watermark_opacity(&mut self, opacity: f32) -> Effect {
        self.watermark.opacity = opacity.clamp(0.0, 1.0);
        self.recompose_if_loaded()
    }

    pub fn set_watermark_density(&mut self, density: f32) -> Effect {
        self.watermark.density = density;
        self.recompose_if_loaded()
    }

    /// Changes the active redaction kind. When a redaction is selected it
    /// is retyped immediately and the change is committed to history.
    pub fn set_active_kind(&mut self, kind: RedactionKind) -> Effect {
        self.active_kind = kind;
        let Some(id) = self.selection else {
            return Effect::None;
        };
        if !self.store.update(id, |redaction| redaction.kind = kind) {
            return Effect::None;
        }
        self.commit();
        self.recompose_if_loaded()
    }

    /// Empties the store and commits. A no-op unless redaction mode is
    /// active and an image is loaded.
    pub fn clear_redactions(&mut self) -> Effect {
        if !self.redaction_mode || self.source.is_none() {
            return Effect::None;
        }
        self.store.clear();
        self.selection = None;
        self.commit();
        Effect::Recompose
    }

    /// Restores the previous history snapshot. A no-op at the bottom of
    /// the stack or outside redaction mode.
    pub fn undo(&mut self) -> Effect {
        if !self.redaction_mode || self.source.is_none() {
            return Effect::None;
        }
        let Some(snapshot) = self.history.undo().map(<[Redaction]>::to_vec) else {
            tracing::debug!("undo requested at the bottom of history");
            return Effect::None;
        };
        self.store.restore(snapshot);
        self.selection = None;
        Effect::Recompose
    }

    /// Removes the selected redaction and commits. A no-op without a
    /// selection or outside redaction mode.
    pub fn delete_selected(&mut self) -> Effect {
        if !self.redaction_mode || self.source.is_none() {
            return Effect::None;
        }
        let Some(id) = self.selection.take() else {
            return Effect::None;
        };
        if self.store.remove(id).is_none() {
            return Effect::None;
        }
        self.commit();
        Effect::Recompose
    }

    /// Runs the composition pipeline over the current state.
    pub fn compose(&self) -> SessionResult<RgbaImage> {
        let source = self.source.as_ref().ok_or(SessionError::NoImageLoaded)?;
        let selection = if self.redaction_mode {
            self.selected_redaction()
        } else {
            None
        };
        let preview = match self.gesture {
            Gesture::Drawing { preview, .. } => preview,
            _ => None,
        };
        Ok(render::compose(&Scene {
            base: source.pixels(),
            filter: self.filter,
            redactions: self.store.redactions(),
            selection,
            preview,
            watermark: &self.watermark,
        }))
    }

    /// Composes the raster for export. Redaction mode is forced off and
    /// the selection dropped first, so exported output never contains
    /// selection-handle decoration.
    pub fn export_raster(&mut self) -> SessionResult<RgbaImage> {
        if self.source.is_none() {
            return Err(SessionError::NoImageLoaded);
        }
        self.redaction_mode = false;
        self.selection = None;
        self.gesture = Gesture::Idle;
        self.compose()
    }
}

/// Loaded session with redaction mode on, shared by editor tests.
#[cfg(test)]
pub(super) fn loaded_session(width: u32, height: u32) -> EditorSession {
    let mut session = EditorSession::new();
    let effect = session.load(SourceImage::from_pixels(RgbaImage::new(width, height)));
    assert_eq!(effect, Effect::Recompose);
    let _ = session.toggle_redaction_mode();
    assert!(session.redaction_mode());
    session
}
