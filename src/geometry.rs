//! Box and point math shared by the layout provider and the relation router.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn mid_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Translates this box into the coordinate space of `origin`, i.e. the
    /// equivalent of subtracting the container's top-left corner.
    pub fn relative_to(&self, origin: Point) -> Rect {
        Rect::new(self.x - origin.x, self.y - origin.y, self.width, self.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Estimates how many rendered lines a box covers.
///
/// A malformed line height (zero, negative, NaN) degrades to a single line so
/// the caller falls back to midpoint anchoring instead of failing the pass.
pub fn estimate_line_count(box_height: f32, line_height: f32) -> f32 {
    if !line_height.is_finite() || line_height <= 0.0 {
        return 1.0;
    }
    let lines = box_height / line_height;
    if lines.is_finite() && lines > 0.0 { lines } else { 1.0 }
}
