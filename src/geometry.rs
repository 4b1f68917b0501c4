/// Shared geometric primitives used across editor and render modules.
///
/// All coordinates are in image pixel space. Rectangles may carry negative
/// extents while a draw or resize gesture is in flight; `Rect::normalized`
/// folds them back into a top-left origin with non-negative size.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Handle {
    pub const ALL: [Handle; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];
}

/// Corner handle pick-up radius, in pixels (Chebyshev distance).
pub const HANDLE_TOLERANCE: f32 = 8.0;

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanned from a fixed anchor to the current pointer
    /// position. Extents are signed and record the drag direction.
    pub fn from_drag(anchor: Point, pointer: Point) -> Self {
        Self {
            x: anchor.x,
            y: anchor.y,
            width: pointer.x - anchor.x,
            height: pointer.y - anchor.y,
        }
    }

    pub const fn origin(self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Folds negative extents into the origin. Idempotent.
    pub fn normalized(self) -> Self {
        let mut rect = self;
        if rect.width < 0.0 {
            rect.x += rect.width;
            rect.width = -rect.width;
        }
        if rect.height < 0.0 {
            rect.y += rect.height;
            rect.height = -rect.height;
        }
        rect
    }

    /// Inclusive containment test against the normalized bounds.
    pub fn contains(self, point: Point) -> bool {
        let rect = self.normalized();
        point.x >= rect.x
            && point.x <= rect.x + rect.width
            && point.y >= rect.y
            && point.y <= rect.y + rect.height
    }

    pub fn corner(self, handle: Handle) -> Point {
        match handle {
            Handle::TopLeft => Point::new(self.x, self.y),
            Handle::TopRight => Point::new(self.x + self.width, self.y),
            Handle::BottomLeft => Point::new(self.x, self.y + self.height),
            Handle::BottomRight => Point::new(self.x + self.width, self.y + self.height),
        }
    }

    pub fn corners(self) -> [(Handle, Point); 4] {
        [
            (Handle::TopLeft, self.corner(Handle::TopLeft)),
            (Handle::TopRight, self.corner(Handle::TopRight)),
            (Handle::BottomLeft, self.corner(Handle::BottomLeft)),
            (Handle::BottomRight, self.corner(Handle::BottomRight)),
        ]
    }
}

/// Scans rectangles from last (topmost) to first and returns the index of
/// the first one containing the point.
pub fn topmost_hit(point: Point, rects: &[Rect]) -> Option<usize> {
    rects
        .iter()
        .enumerate()
        .rev()
        .find(|(_, rect)| rect.contains(point))
        .map(|(index, _)| index)
}

/// Returns the first corner handle within `tolerance` of the point,
/// checked in `Handle::ALL` order.
pub fn handle_at_point(point: Point, rect: Rect, tolerance: f32) -> Option<Handle> {
    for (handle, corner) in rect.corners() {
        if (point.x - corner.x).abs() <= tolerance && (point.y - corner.y).abs() <= tolerance {
            return Some(handle);
        }
    }
    None
}

/// Recomputes a rectangle from the dragged handle and the pointer position,
/// holding the diagonally opposite corner fixed. Extents may go negative;
/// callers normalize when the gesture ends.
pub fn resize_with_handle(rect: Rect, handle: Handle, pointer: Point) -> Rect {
    let Rect {
        x,
        y,
        width,
        height,
    } = rect;
    match handle {
        Handle::TopLeft => Rect::new(
            pointer.x,
            pointer.y,
            width + (x - pointer.x),
            height + (y - pointer.y),
        ),
        Handle::TopRight => Rect::new(x, pointer.y, pointer.x - x, height + (y - pointer.y)),
        Handle::BottomLeft => Rect::new(pointer.x, y, width + (x - pointer.x), pointer.y - y),
        Handle::BottomRight => Rect::new(x, y, pointer.x - x, pointer.y - y),
    }
}
