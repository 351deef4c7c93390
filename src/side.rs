/*
 * One of the four native windows that together form the decorative frame.
 *
 * A side owns a layered window and an off-screen surface allocated once at the
 * largest size the frame can reach. Painting copies slices of the theme bitmap
 * into that surface and then composites the used part of it onto the screen.
 * Only the painted extent changes between ticks, never the surface itself.
 *
 * Redraw is incremental: a full redraw paints both corners and the edge between
 * them, while a resize along the side's axis repaints only a strip as long as
 * the change, plus the far corner at its new position.
 */
use crate::backend::{
    BlendFunction, DcHandle, GraphicsBackend, PendingPositionChange, PositionChangeHandler,
    PositionDecision, WindowHandle, decide_position_change,
};
use crate::error::Result as PlatformResult;
use crate::metrics::Metrics;
use crate::pixels::PixelFormat;
use crate::surface::Surface;
use crate::theme::{EdgeFill, Theme};
use crate::types::{Point, Rect, Size};

use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Left,
    Top,
    Right,
    Bottom,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Left, Edge::Top, Edge::Right, Edge::Bottom];

    /// Left and right sides run along the y axis.
    pub const fn is_vertical(self) -> bool {
        matches!(self, Edge::Left | Edge::Right)
    }
}

/// A single pixel transfer from the theme surface into a side surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlitOp {
    Copy { src: Rect, dst: Rect },
    Stretch { src: Rect, dst: Rect },
}

impl BlitOp {
    #[cfg(test)]
    pub(crate) fn dst(&self) -> Rect {
        match self {
            BlitOp::Copy { dst, .. } | BlitOp::Stretch { dst, .. } => *dst,
        }
    }
}

// Theme slices a side draws: the corner at its start, the one at its end, and the edge.
struct EdgeSlices {
    near: Rect,
    far: Rect,
    edge: Rect,
}

fn slices_for(edge: Edge, metrics: &Metrics) -> EdgeSlices {
    match edge {
        Edge::Left => EdgeSlices {
            near: metrics.vertical.top_left,
            far: metrics.vertical.bottom_left,
            edge: metrics.left,
        },
        Edge::Right => EdgeSlices {
            near: metrics.vertical.top_right,
            far: metrics.vertical.bottom_right,
            edge: metrics.right,
        },
        Edge::Top => EdgeSlices {
            near: metrics.horizontal.top_left,
            far: metrics.horizontal.top_right,
            edge: metrics.top,
        },
        Edge::Bottom => EdgeSlices {
            near: metrics.horizontal.bottom_left,
            far: metrics.horizontal.bottom_right,
            edge: metrics.bottom,
        },
    }
}

fn along(edge: Edge, size: Size) -> i32 {
    if edge.is_vertical() {
        size.height
    } else {
        size.width
    }
}

fn across(edge: Edge, size: Size) -> i32 {
    if edge.is_vertical() {
        size.width
    } else {
        size.height
    }
}

// Rectangle starting `offset` pixels along the side's axis.
fn place(edge: Edge, offset: i32, length: i32, thickness: i32) -> Rect {
    if edge.is_vertical() {
        Rect::new(0, offset, thickness, length)
    } else {
        Rect::new(offset, 0, length, thickness)
    }
}

// Sub-slice of `slice` starting `offset` pixels along the axis.
fn sub_slice(edge: Edge, slice: Rect, offset: i32, length: i32) -> Rect {
    if edge.is_vertical() {
        Rect::new(slice.x, slice.y + offset, slice.width, length)
    } else {
        Rect::new(slice.x + offset, slice.y, length, slice.height)
    }
}

fn push_corner(ops: &mut Vec<BlitOp>, edge: Edge, corner: Rect, offset: i32) {
    let dst = place(edge, offset, along(edge, corner.size()), across(edge, corner.size()));
    if !dst.is_empty() {
        ops.push(BlitOp::Copy { src: corner, dst });
    }
}

/*
 * Covers `length` pixels starting at `offset` with the edge slice. Spans that
 * fit inside the slice are copied. Longer spans are stretched or tiled; tiles
 * are phased from `origin` so a strip painted later continues the pattern of a
 * full redraw.
 */
fn push_edge_fill(
    ops: &mut Vec<BlitOp>,
    edge: Edge,
    slice: Rect,
    offset: i32,
    length: i32,
    origin: i32,
    fill: EdgeFill,
) {
    let slice_len = along(edge, slice.size());
    let thickness = across(edge, slice.size());
    if length <= 0 || slice_len <= 0 || thickness <= 0 {
        return;
    }

    if fill == EdgeFill::Stretch {
        let dst = place(edge, offset, length, thickness);
        if length > slice_len {
            ops.push(BlitOp::Stretch { src: slice, dst });
        } else {
            ops.push(BlitOp::Copy {
                src: sub_slice(edge, slice, 0, length),
                dst,
            });
        }
        return;
    }

    let mut phase = (offset - origin).rem_euclid(slice_len);
    let mut position = offset;
    let mut remaining = length;
    while remaining > 0 {
        let chunk = (slice_len - phase).min(remaining);
        ops.push(BlitOp::Copy {
            src: sub_slice(edge, slice, phase, chunk),
            dst: place(edge, position, chunk, thickness),
        });
        position += chunk;
        remaining -= chunk;
        phase = 0;
    }
}

/*
 * Computes the transfers needed to bring a side from `previous_len` to
 * `new_len` pixels along its axis.
 */
pub(crate) fn plan_paint(
    edge: Edge,
    metrics: &Metrics,
    fill: EdgeFill,
    previous_len: i32,
    new_len: i32,
    full_redraw: bool,
) -> Vec<BlitOp> {
    let slices = slices_for(edge, metrics);
    let near_len = along(edge, slices.near.size());
    let far_len = along(edge, slices.far.size());
    let far_offset = new_len - far_len;
    let mut ops = Vec::new();

    let (mut offset, mut length) = if full_redraw {
        push_corner(&mut ops, edge, slices.near, 0);
        (near_len, far_offset - near_len)
    } else {
        let delta = (new_len - previous_len).abs();
        (far_offset - delta, delta)
    };
    if offset < near_len {
        length -= near_len - offset;
        offset = near_len;
    }

    push_edge_fill(&mut ops, edge, slices.edge, offset, length, near_len, fill);
    push_corner(&mut ops, edge, slices.far, far_offset);
    ops
}

// Receives the side window's position-changing notifications.
struct SideNotificationHandler {
    max_size: Size,
    visible: Rc<Cell<bool>>,
}

impl PositionChangeHandler for SideNotificationHandler {
    fn on_position_changing(&self, pending: PendingPositionChange) -> PositionDecision {
        let decision = decide_position_change(pending, self.max_size);
        if let Some(visible) = decision.visibility {
            self.visible.set(visible);
        }
        decision
    }
}

/// Inputs shared by every side during one paint pass.
pub(crate) struct PaintContext<'a> {
    pub theme: &'a Theme,
    pub screen_dc: DcHandle,
    pub blend: BlendFunction,
}

pub(crate) struct Side {
    edge: Edge,
    backend: Rc<dyn GraphicsBackend>,
    window: WindowHandle,
    surface: Surface,
    size: Size,
    location: Point,
    // Written by the window's notification handler, possibly mid-update.
    visible: Rc<Cell<bool>>,
}

impl Side {
    pub(crate) fn new(
        backend: Rc<dyn GraphicsBackend>,
        edge: Edge,
        max_size: Size,
    ) -> PlatformResult<Self> {
        let surface = Surface::allocate(backend.clone(), max_size, PixelFormat::PremultipliedArgb32)?;
        let visible = Rc::new(Cell::new(false));
        let window = backend.create_side_window(Box::new(SideNotificationHandler {
            max_size,
            visible: visible.clone(),
        }))?;
        log::debug!("Side: created {edge:?} side {window:?} with surface {max_size:?}");
        Ok(Self {
            edge,
            backend,
            window,
            surface,
            size: Size::default(),
            location: Point::default(),
            visible,
        })
    }

    pub(crate) fn handle(&self) -> WindowHandle {
        self.window
    }

    pub(crate) fn location(&self) -> Point {
        self.location
    }

    pub(crate) fn set_location(&mut self, location: Point) {
        self.location = location;
    }

    /// Extent painted by the last successful paint.
    #[cfg(test)]
    pub(crate) fn size(&self) -> Size {
        self.size
    }

    pub(crate) fn max_size(&self) -> Size {
        self.surface.size()
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.visible.get()
    }

    #[cfg(test)]
    pub(crate) fn device_context(&self) -> DcHandle {
        self.surface
            .device_context()
            .expect("side surface always holds a device context")
    }

    pub(crate) fn paint_left(
        &mut self,
        cx: i32,
        cy: i32,
        full_redraw: bool,
        ctx: &PaintContext<'_>,
    ) -> PlatformResult<bool> {
        self.paint_edge(Edge::Left, Size::new(cx, cy), full_redraw, ctx)
    }

    pub(crate) fn paint_top(
        &mut self,
        cx: i32,
        cy: i32,
        full_redraw: bool,
        ctx: &PaintContext<'_>,
    ) -> PlatformResult<bool> {
        self.paint_edge(Edge::Top, Size::new(cx, cy), full_redraw, ctx)
    }

    pub(crate) fn paint_right(
        &mut self,
        cx: i32,
        cy: i32,
        full_redraw: bool,
        ctx: &PaintContext<'_>,
    ) -> PlatformResult<bool> {
        self.paint_edge(Edge::Right, Size::new(cx, cy), full_redraw, ctx)
    }

    pub(crate) fn paint_bottom(
        &mut self,
        cx: i32,
        cy: i32,
        full_redraw: bool,
        ctx: &PaintContext<'_>,
    ) -> PlatformResult<bool> {
        self.paint_edge(Edge::Bottom, Size::new(cx, cy), full_redraw, ctx)
    }

    /*
     * Repaints the side for a new extent and pushes it to the screen. Returns
     * `Ok(false)` without touching anything when the extent along the side's
     * axis is unchanged and no full redraw was requested.
     */
    fn paint_edge(
        &mut self,
        edge: Edge,
        new_size: Size,
        full_redraw: bool,
        ctx: &PaintContext<'_>,
    ) -> PlatformResult<bool> {
        debug_assert_eq!(edge, self.edge, "side painted with another side's routine");
        let max = self.surface.size();
        if new_size.width > max.width || new_size.height > max.height {
            log::warn!("Side: {edge:?} extent {new_size:?} exceeds its surface {max:?}, clamping");
        }
        let new_size = Size::new(new_size.width.min(max.width), new_size.height.min(max.height));
        let previous_len = along(edge, self.size);
        let new_len = along(edge, new_size);
        if new_len == previous_len && !full_redraw {
            return Ok(false);
        }

        let theme_dc = ctx.theme.device_context()?;
        let side_dc = self.surface.device_context()?;
        let ops = plan_paint(
            edge,
            ctx.theme.metrics(),
            ctx.theme.edge_fill(),
            previous_len,
            new_len,
            full_redraw,
        );
        for op in &ops {
            match *op {
                BlitOp::Copy { src, dst } => {
                    self.backend.bit_blt(side_dc, dst, theme_dc, src.location())?
                }
                BlitOp::Stretch { src, dst } => {
                    self.backend.stretch_blt(side_dc, dst, theme_dc, src)?
                }
            }
        }

        self.backend.update_layered_window(
            self.window,
            ctx.screen_dc,
            self.location,
            new_size,
            side_dc,
            ctx.blend,
        )?;
        self.size = new_size;
        log::debug!(
            "Side: {edge:?} painted {} transfers ({previous_len} -> {new_len}, full: {full_redraw})",
            ops.len()
        );
        Ok(true)
    }
}

impl Drop for Side {
    fn drop(&mut self) {
        if let Err(err) = self.backend.destroy_window(self.window) {
            log::error!("Side: failed to destroy {:?} window: {err}", self.edge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::PixelBuffer;
    use crate::test_support::{Call, CallKind, RecordingBackend};
    use crate::types::Margin;

    // 40x30 bitmap, inner (8,5)-(28,20): edges 8/12 wide, 5/10 high.
    fn metrics() -> Metrics {
        Metrics::new(Size::new(40, 30), Rect::new(8, 5, 20, 15)).unwrap()
    }

    fn span_along(edge: Edge, ops: &[BlitOp]) -> i32 {
        ops.iter().map(|op| along(edge, op.dst().size())).sum()
    }

    #[test]
    fn full_redraw_covers_the_whole_side_once() {
        let m = metrics();
        for edge in Edge::ALL {
            for fill in [EdgeFill::Tile, EdgeFill::Stretch] {
                let ops = plan_paint(edge, &m, fill, 0, 200, true);
                if fill == EdgeFill::Tile {
                    assert_eq!(span_along(edge, &ops), 200, "{edge:?} tiles must not overlap");
                }
                let first = ops.first().unwrap().dst();
                let last = ops.last().unwrap().dst();
                assert_eq!(if edge.is_vertical() { first.y } else { first.x }, 0);
                assert_eq!(
                    if edge.is_vertical() {
                        last.bottom()
                    } else {
                        last.right()
                    },
                    200
                );
            }
        }
    }

    #[test]
    fn left_side_full_redraw_layout() {
        let m = metrics();
        let ops = plan_paint(Edge::Left, &m, EdgeFill::Stretch, 0, 100, true);
        assert_eq!(
            ops,
            vec![
                BlitOp::Copy {
                    src: m.vertical.top_left,
                    dst: Rect::new(0, 0, 8, 5)
                },
                BlitOp::Stretch {
                    src: m.left,
                    dst: Rect::new(0, 5, 8, 85)
                },
                BlitOp::Copy {
                    src: m.vertical.bottom_left,
                    dst: Rect::new(0, 90, 8, 10)
                },
            ]
        );
    }

    #[test]
    fn short_edge_span_is_copied_not_stretched() {
        let m = metrics();
        // Left edge slice is 15 high; 5 + 10 + 15 = 30.
        let ops = plan_paint(Edge::Left, &m, EdgeFill::Stretch, 0, 25, true);
        assert!(ops.iter().all(|op| matches!(op, BlitOp::Copy { .. })));
        assert_eq!(
            ops[1],
            BlitOp::Copy {
                src: Rect::new(0, 5, 8, 10),
                dst: Rect::new(0, 5, 8, 10)
            }
        );
    }

    #[test]
    fn partial_redraw_cost_is_proportional_to_delta() {
        let m = metrics();
        for delta in [1, 7, 33] {
            let grow = plan_paint(Edge::Top, &m, EdgeFill::Tile, 300, 300 + delta, false);
            let far = m.horizontal.top_right.width;
            assert_eq!(span_along(Edge::Top, &grow), delta + far);

            let shrink = plan_paint(Edge::Right, &m, EdgeFill::Stretch, 300, 300 - delta, false);
            let far = m.vertical.bottom_right.height;
            assert_eq!(span_along(Edge::Right, &shrink), delta + far);
        }
    }

    #[test]
    fn growing_strip_ends_at_new_far_corner() {
        let m = metrics();
        let ops = plan_paint(Edge::Bottom, &m, EdgeFill::Stretch, 100, 130, false);
        let far = m.horizontal.bottom_right;
        assert_eq!(
            ops,
            vec![
                BlitOp::Stretch {
                    src: m.bottom,
                    dst: Rect::new(100 - far.width, 0, 30, m.bottom.height)
                },
                BlitOp::Copy {
                    src: far,
                    dst: Rect::new(130 - far.width, 0, far.width, far.height)
                },
            ]
        );
    }

    #[test]
    fn tiled_strip_continues_the_full_redraw_pattern() {
        let m = metrics();
        // Top edge slice is 20 wide and starts after an 8 px corner.
        let full = plan_paint(Edge::Top, &m, EdgeFill::Tile, 0, 100, true);
        let strip = plan_paint(Edge::Top, &m, EdgeFill::Tile, 100, 110, false);
        let source_x_at = |ops: &[BlitOp], x: i32| {
            ops.iter().find_map(|op| match *op {
                BlitOp::Copy { src, dst } if src.y == m.top.y && dst.contains(x, 0) => {
                    Some(src.x + (x - dst.x))
                }
                _ => None,
            })
        };
        // Pixel 88 held the far corner; the strip paints it with the next edge tile.
        let expected = m.top.x + (88 - 8) % 20;
        assert_eq!(source_x_at(&full, 80), Some(m.top.x + (80 - 8) % 20));
        assert_eq!(source_x_at(&strip, 88), Some(expected));
    }

    #[test]
    fn strip_never_overwrites_near_corner() {
        let m = metrics();
        // Strip would start at 12 - 10 = 2, inside the 5 px top corner.
        let ops = plan_paint(Edge::Left, &m, EdgeFill::Tile, 12, 60, false);
        assert!(ops.iter().all(|op| op.dst().y >= m.vertical.top_left.height));
        assert_eq!(span_along(Edge::Left, &ops), 45 + 10);
    }

    fn theme_and_side(edge: Edge) -> (Rc<RecordingBackend>, Theme, Side) {
        let recording = Rc::new(RecordingBackend::new());
        let template =
            PixelBuffer::new(Size::new(40, 30), PixelFormat::Argb32, vec![0xFF_00_00_00; 1200])
                .unwrap();
        let theme = Theme::new(
            recording.clone(),
            &template,
            Rect::new(8, 5, 20, 15),
            Margin::ZERO,
        )
        .unwrap();
        let side = Side::new(recording.clone(), edge, Size::new(12, 500)).unwrap();
        (recording, theme, side)
    }

    #[test]
    fn unchanged_axis_without_full_redraw_is_a_no_op() {
        let (recording, theme, mut side) = theme_and_side(Edge::Left);
        let ctx = PaintContext {
            theme: &theme,
            screen_dc: DcHandle(999),
            blend: BlendFunction::default(),
        };
        assert!(side.paint_left(8, 120, true, &ctx).unwrap());
        recording.clear_calls();

        assert!(!side.paint_left(8, 120, false, &ctx).unwrap());
        // Width is not the left side's axis.
        assert!(!side.paint_left(9, 120, false, &ctx).unwrap());
        assert!(recording.calls().is_empty());
    }

    #[test]
    fn paint_pushes_surface_with_shared_blend() {
        let (recording, theme, mut side) = theme_and_side(Edge::Right);
        side.set_location(Point::new(300, 40));
        let blend = BlendFunction {
            source_constant_alpha: 128,
            per_pixel_alpha: true,
        };
        let ctx = PaintContext {
            theme: &theme,
            screen_dc: DcHandle(999),
            blend,
        };
        side.paint_right(12, 80, true, &ctx).unwrap();

        let last = recording.calls().last().cloned().unwrap();
        assert_eq!(
            last,
            Call::UpdateLayeredWindow {
                window: side.handle(),
                location: Point::new(300, 40),
                size: Size::new(12, 80),
                src_dc: side.device_context(),
                blend,
            }
        );
        assert_eq!(side.size(), Size::new(12, 80));
        assert!(!recording.blits_into(side.device_context()).is_empty());
    }

    #[test]
    fn failed_blit_leaves_painted_size_untouched() {
        let (recording, theme, mut side) = theme_and_side(Edge::Left);
        let ctx = PaintContext {
            theme: &theme,
            screen_dc: DcHandle(999),
            blend: BlendFunction::default(),
        };
        recording.fail_on(CallKind::BitBlt);
        assert!(side.paint_left(8, 100, true, &ctx).is_err());
        assert_eq!(side.size(), Size::default());
        assert_eq!(recording.count(CallKind::UpdateLayeredWindow), 0);
    }

    #[test]
    fn notifications_track_visibility_and_clamp_size() {
        let (recording, _theme, side) = theme_and_side(Edge::Left);
        assert!(!side.is_visible());

        let decision = recording
            .simulate_position_changing(
                side.handle(),
                PendingPositionChange {
                    size: Size::new(50, 800),
                    show_window: true,
                    hide_window: false,
                },
            )
            .unwrap();
        assert_eq!(decision.clamped_size, Size::new(12, 500));
        assert!(side.is_visible());

        recording.simulate_position_changing(
            side.handle(),
            PendingPositionChange {
                size: Size::new(1, 1),
                show_window: false,
                hide_window: true,
            },
        );
        assert!(!side.is_visible());
    }

    #[test]
    fn drop_destroys_window_and_surface() {
        let (recording, theme, side) = theme_and_side(Edge::Top);
        assert_eq!(side.max_size(), Size::new(12, 500));
        assert_eq!(recording.live_windows(), 1);
        drop(side);
        assert_eq!(recording.live_windows(), 0);
        // Only the theme's DC remains.
        assert_eq!(recording.live_device_contexts(), 1);
        drop(theme);
    }
}
