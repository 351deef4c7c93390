/*
 * Nine-patch slicing of a theme bitmap. From a single inner rectangle (the
 * undecorated center of the bitmap) this module derives the four edge slices
 * and two corner tables. The vertical table is used when painting the left and
 * right sides, the horizontal table when painting the top and bottom sides, so
 * each side can draw the corners it touches without coordinating with its
 * neighbours.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::types::{Rect, Size};

/// Corner slices used by one orientation of sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Corners {
    pub top_left: Rect,
    pub top_right: Rect,
    pub bottom_left: Rect,
    pub bottom_right: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
    pub left: Rect,
    pub top: Rect,
    pub right: Rect,
    pub bottom: Rect,
    pub vertical: Corners,
    pub horizontal: Corners,
    bitmap_size: Size,
    inner: Rect,
}

impl Metrics {
    /*
     * Derives all slices from the bitmap size and the inner rectangle.
     * The inner rectangle must have a non-negative extent and lie inside the
     * bitmap, otherwise the slices would reference pixels that do not exist.
     */
    pub fn new(bitmap_size: Size, inner: Rect) -> PlatformResult<Self> {
        if inner.width < 0
            || inner.height < 0
            || inner.left() < 0
            || inner.top() < 0
            || inner.right() > bitmap_size.width
            || inner.bottom() > bitmap_size.height
        {
            return Err(PlatformError::Configuration(format!(
                "Inner rectangle {inner:?} does not fit a bitmap of {bitmap_size:?}"
            )));
        }

        let b = bitmap_size;
        let left = Rect::new(0, inner.top(), inner.left(), inner.bottom() - inner.top());
        let top = Rect::new(inner.left(), 0, inner.right() - inner.left(), inner.top());
        let right = Rect::new(
            inner.right(),
            inner.top(),
            b.width - inner.right(),
            inner.bottom() - inner.top(),
        );
        let bottom = Rect::new(
            inner.left(),
            inner.bottom(),
            inner.right() - inner.left(),
            b.height - inner.bottom(),
        );

        let vertical = Corners {
            top_left: Rect::new(0, 0, inner.left(), inner.top()),
            top_right: Rect::new(inner.right(), 0, b.width - inner.right(), inner.top()),
            bottom_left: Rect::new(0, inner.bottom(), inner.left(), b.height - inner.bottom()),
            bottom_right: Rect::new(inner.right(), inner.bottom(), right.width, bottom.height),
        };

        // The horizontal corner variants live inside the bitmap's center area.
        let horizontal = Corners {
            top_left: Rect::new(inner.left(), inner.top(), inner.left(), inner.top()),
            top_right: Rect::new(
                inner.right() - vertical.top_right.width,
                inner.top(),
                vertical.top_right.width,
                vertical.top_right.height,
            ),
            bottom_left: Rect::new(
                inner.left(),
                inner.top() * 2,
                inner.left(),
                inner.bottom() - inner.top() * 2,
            ),
            bottom_right: Rect::new(
                right.x - right.width,
                bottom.y - bottom.height,
                right.width,
                bottom.height,
            ),
        };

        Ok(Self {
            left,
            top,
            right,
            bottom,
            vertical,
            horizontal,
            bitmap_size,
            inner,
        })
    }

    pub fn bitmap_size(&self) -> Size {
        self.bitmap_size
    }

    pub fn inner_rect(&self) -> Rect {
        self.inner
    }

    /// Combined thickness of the left and right edges.
    pub fn horizontal_thickness(&self) -> i32 {
        self.left.width + self.right.width
    }

    /// Combined thickness of the top and bottom edges.
    pub fn vertical_thickness(&self) -> i32 {
        self.top.height + self.bottom.height
    }
}
