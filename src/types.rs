/*
 * Platform-agnostic geometry and configuration types used across the crate.
 * Everything here is plain data: integer pixel coordinates, margins that may be
 * negative (to let a frame overlap its target window), the snapshot a host
 * window reports on every geometry change, and the construction-time
 * configuration of a layered frame.
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub const fn area(self) -> i64 {
        self.width as i64 * self.height as i64
    }
}

/// Integer rectangle stored as origin plus extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn from_parts(location: Point, size: Size) -> Self {
        Self::new(location.x, location.y, size.width, size.height)
    }

    pub const fn left(&self) -> i32 {
        self.x
    }

    pub const fn top(&self) -> i32 {
        self.y
    }

    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub const fn location(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub const fn area(&self) -> i64 {
        self.size().area()
    }

    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Per-edge spacing. Negative values pull the frame inwards over the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Margin {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Margin {
    pub const ZERO: Margin = Margin::new(0, 0, 0, 0);

    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn horizontal(&self) -> i32 {
        self.left + self.right
    }

    pub const fn vertical(&self) -> i32 {
        self.top + self.bottom
    }
}

impl std::ops::Add for Margin {
    type Output = Margin;

    fn add(self, rhs: Margin) -> Margin {
        Margin::new(
            self.left + rhs.left,
            self.top + rhs.top,
            self.right + rhs.right,
            self.bottom + rhs.bottom,
        )
    }
}

/*
 * What a host window reports about itself: outer screen location, outer size
 * and whether it is currently shown. The compositor recomputes the frame purely
 * from the latest snapshot plus its own state.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeometrySnapshot {
    pub location: Point,
    pub size: Size,
    pub visible: bool,
}

impl GeometrySnapshot {
    pub const fn new(location: Point, size: Size, visible: bool) -> Self {
        Self {
            location,
            size,
            visible,
        }
    }
}

/*
 * Construction-time configuration of a `LayeredWindow`.
 * `maximum_size` is the largest size the target window is expected to reach;
 * the side surfaces are allocated once from it and never grow afterwards.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    pub maximum_size: Size,
    pub margin: Margin,
    pub opacity: u8,
}

impl FrameConfig {
    pub fn new(maximum_size: Size) -> Self {
        Self {
            maximum_size,
            ..Self::default()
        }
    }

    pub fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            maximum_size: Size::new(0, 0),
            margin: Margin::ZERO,
            opacity: u8::MAX,
        }
    }
}
