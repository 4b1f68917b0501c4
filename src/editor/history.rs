use super::redaction::Redaction;

/// Linear snapshot stack over the redaction list.
///
/// The bottom entry is the empty state captured right after image load and
/// can never be popped, so undo always has a floor to land on. There is no
/// redo direction.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Vec<Redaction>>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self {
            snapshots: vec![Vec::new()],
        }
    }

    /// Pushes a snapshot. Called once per completed gesture, never on
    /// intermediate pointer moves.
    pub fn commit(&mut self, snapshot: Vec<Redaction>) {
        self.snapshots.push(snapshot);
    }

    /// Pops the most recent snapshot and returns the new top, or `None`
    /// when already at the post-load state.
    pub fn undo(&mut self) -> Option<&[Redaction]> {
        if self.snapshots.len() <= 1 {
            return None;
        }
        self.snapshots.pop();
        self.snapshots.last().map(Vec::as_slice)
    }

    /// Drops everything and starts over from a single empty snapshot.
    /// Used when a new image is loaded.
    pub fn reset(&mut self) {
        self.snapshots.clear();
        self.snapshots.push(Vec::new());
    }

    /// Number of snapshots on the stack, the initial empty one included.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// The stack always holds at least the post-load snapshot.
    pub fn is_empty(&self) -> bool {
        false
    }
}
