use super::session::{EditorSession, Effect, Gesture};
use crate::geometry::{self, Point, Rect, HANDLE_TOLERANCE};

/// A draw gesture must exceed this extent on both axes to create a
/// redaction; anything smaller is treated as a stray click.
pub const MIN_DRAW_SIZE: f32 = 5.0;

impl EditorSession {
    /// Pointer pressed at `point`. Resolves, in priority order: grabbing a
    /// resize handle of the selection, selecting (and starting to drag) the
    /// topmost redaction under the pointer, or anchoring a new draw.
    pub fn pointer_down(&mut self, point: Point) -> Effect {
        if !self.redaction_mode || self.source.is_none() {
            return Effect::None;
        }

        if let Some(selected) = self.selected_redaction() {
            if let Some(handle) =
                geometry::handle_at_point(point, selected.region, HANDLE_TOLERANCE)
            {
                tracing::debug!(?handle, id = selected.id, "resize gesture started");
                self.gesture = Gesture::Resizing { handle };
                return Effect::None;
            }
        }

        if let Some(id) = self.store.redaction_at(point) {
            let redaction = self.store.get(id).expect("hit test returned a live id");
            self.selection = Some(id);
            self.active_kind = redaction.kind;
            self.gesture = Gesture::Dragging {
                offset: Point::new(
                    point.x - redaction.region.x,
                    point.y - redaction.region.y,
                ),
            };
            tracing::debug!(id, "drag gesture started");
        } else {
            self.selection = None;
            self.gesture = Gesture::Drawing {
                anchor: point,
                preview: None,
            };
            tracing::debug!("draw gesture started");
        }
        Effect::Recompose
    }

    /// Pointer moved to `point` while a gesture is in flight. Updates the
    /// gesture's rectangle; transient negative extents are allowed until
    /// the gesture commits.
    pub fn pointer_move(&mut self, point: Point) -> Effect {
        if !self.redaction_mode || self.source.is_none() {
            return Effect::None;
        }

        match self.gesture {
            Gesture::Idle => Effect::None,
            Gesture::Resizing { handle } => {
                let Some(id) = self.selection else {
                    return Effect::None;
                };
                self.store.update(id, |redaction| {
                    redaction.region =
                        geometry::resize_with_handle(redaction.region, handle, point);
                });
                Effect::Recompose
            }
            Gesture::Dragging { offset } => {
                let Some(id) = self.selection else {
                    return Effect::None;
                };
                self.store.update(id, |redaction| {
                    redaction.region.x = point.x - offset.x;
                    redaction.region.y = point.y - offset.y;
                });
                Effect::Recompose
            }
            Gesture::Drawing { anchor, .. } => {
                self.gesture = Gesture::Drawing {
                    anchor,
                    preview: Some(Rect::from_drag(anchor, point)),
                };
                Effect::Recompose
            }
        }
    }

    /// Pointer released. Commits the gesture to the store and history,
    /// then returns to idle.
    pub fn pointer_up(&mut self) -> Effect {
        if !self.redaction_mode {
            return Effect::None;
        }

        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle => return Effect::None,
            Gesture::Drawing { preview, .. } => {
                if let Some(transient) = preview {
                    if transient.width.abs() > MIN_DRAW_SIZE
                        && transient.height.abs() > MIN_DRAW_SIZE
                    {
                        let id = self
                            .store
                            .add(transient.normalized(), self.active_kind);
                        self.selection = Some(id);
                        self.commit();
                        tracing::debug!(id, "draw gesture committed");
                    } else {
                        tracing::debug!("draw gesture below minimum size, discarded");
                    }
                }
            }
            Gesture::Resizing { .. } => {
                if let Some(id) = self.selection {
                    self.store.update(id, |redaction| {
                        redaction.region = redaction.region.normalized();
                    });
                }
                self.commit();
            }
            Gesture::Dragging { .. } => {
                self.commit();
            }
        }
        Effect::Recompose
    }
}
