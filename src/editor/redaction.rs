use crate::geometry::{Point, Rect};

/// How a redaction region obscures the pixels underneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedactionKind {
    Solid,
    Blur,
    Pixelate,
}

impl RedactionKind {
    pub const ALL: [RedactionKind; 3] = [Self::Solid, Self::Blur, Self::Pixelate];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Blur => "blur",
            Self::Pixelate => "pixelate",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }
}

impl Default for RedactionKind {
    fn default() -> Self {
        Self::Solid
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Redaction {
    pub id: u64,
    pub region: Rect,
    pub kind: RedactionKind,
}

/// Ordered collection of redactions. Order is paint order: later entries
/// draw on top and win hit tests.
#[derive(Debug, Clone, Default)]
pub struct RedactionStore {
    redactions: Vec<Redaction>,
    next_id: u64,
}

impl RedactionStore {
    pub fn new() -> Self {
        Self {
            redactions: Vec::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Appends a redaction with a fresh id and returns the id.
    pub fn add(&mut self, region: Rect, kind: RedactionKind) -> u64 {
        let id = self.allocate_id();
        self.redactions.push(Redaction { id, region, kind });
        id
    }

    pub fn get(&self, id: u64) -> Option<&Redaction> {
        self.redactions
            .iter()
            .find(|redaction| redaction.id == id)
    }

    /// Applies `mutate` to the redaction with the given id. Returns false
    /// if no such redaction exists.
    pub fn update(&mut self, id: u64, mutate: impl FnOnce(&mut Redaction)) -> bool {
        match self
            .redactions
            .iter_mut()
            .find(|redaction| redaction.id == id)
        {
            Some(redaction) => {
                mutate(redaction);
                true
            }
            None => false,
        }
    }

    /// Removes the redaction with the given id, leaving the relative order
    /// of the remaining entries untouched.
    pub fn remove(&mut self, id: u64) -> Option<Redaction> {
        let index = self
            .redactions
            .iter()
            .position(|redaction| redaction.id == id)?;
        Some(self.redactions.remove(index))
    }

    pub fn clear(&mut self) {
        self.redactions.clear();
    }

    pub fn redactions(&self) -> &[Redaction] {
        &self.redactions
    }

    pub fn len(&self) -> usize {
        self.redactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.redactions.is_empty()
    }

    /// Topmost-wins hit test: scans from the last entry backwards and
    /// returns the id of the first redaction containing the point.
    pub fn redaction_at(&self, point: Point) -> Option<u64> {
        self.redactions
            .iter()
            .rev()
            .find(|redaction| redaction.region.contains(point))
            .map(|redaction| redaction.id)
    }

    /// Value copy of the current contents, suitable for a history snapshot.
    pub fn snapshot(&self) -> Vec<Redaction> {
        self.redactions.clone()
    }

    /// Replaces the contents from a snapshot and advances the id watermark
    /// past every restored id so ids are never reused.
    pub fn restore(&mut self, snapshot: Vec<Redaction>) {
        self.redactions = snapshot;
        self.next_id = self
            .redactions
            .iter()
            .map(|redaction| redaction.id)
            .max()
            .unwrap_or(0)
            .saturating_add(1)
            .max(self.next_id);
    }
}
