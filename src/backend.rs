/*
 * The Graphics Backend capability consumed by the compositor. It covers the
 * off-screen drawing primitives (device contexts, bitmaps, bit-block copies),
 * the layered-window composite call and the handful of native window
 * operations the four frame sides need. Handles are opaque integers so the
 * portable core never sees an OS type; the Win32 implementation lives in
 * `crate::win32`.
 *
 * This module also defines the explicit message-handler interface that the
 * windowing layer invokes when a side window is about to change position,
 * together with the pure decision function that answers it.
 */
use crate::error::Result as PlatformResult;
use crate::pixels::{PixelBuffer, PixelFormat};
use crate::types::{Point, Rect, Size};

/// Off-screen or screen device context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DcHandle(pub isize);

/// Graphics object that can be selected into a device context (bitmaps and
/// the stock placeholder a context holds before a bitmap is selected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GdiObject(pub isize);

/// Native top-level window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/*
 * Blend parameters passed to the layered-window update. Always source-over with
 * per-pixel alpha; only the constant alpha (the frame opacity) varies.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendFunction {
    pub source_constant_alpha: u8,
    pub per_pixel_alpha: bool,
}

impl Default for BlendFunction {
    fn default() -> Self {
        Self {
            source_constant_alpha: u8::MAX,
            per_pixel_alpha: true,
        }
    }
}

/// Show/hide request attached to a reposition call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowCommand {
    Show,
    Hide,
}

/*
 * A reposition that never resizes and never activates the window, optionally
 * toggling its visibility. This is the only kind of move the compositor makes.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reposition {
    pub location: Point,
    pub show: ShowCommand,
}

/// Contents of a pending "position changing" notification for a side window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPositionChange {
    pub size: Size,
    pub show_window: bool,
    pub hide_window: bool,
}

/// Answer to a `PendingPositionChange`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionDecision {
    pub clamped_size: Size,
    /// `Some(true)` on show, `Some(false)` on hide, `None` when unchanged.
    pub visibility: Option<bool>,
}

/*
 * Decides how a side window reacts to a pending position change: explicit
 * show/hide flags become the new visibility, and the requested size is clamped
 * to the side's fixed surface size.
 */
pub fn decide_position_change(pending: PendingPositionChange, max_size: Size) -> PositionDecision {
    let visibility = if pending.show_window {
        Some(true)
    } else if pending.hide_window {
        Some(false)
    } else {
        None
    };
    PositionDecision {
        clamped_size: Size::new(
            pending.size.width.min(max_size.width),
            pending.size.height.min(max_size.height),
        ),
        visibility,
    }
}

/// Message handler the windowing layer calls for side windows.
pub trait PositionChangeHandler {
    fn on_position_changing(&self, pending: PendingPositionChange) -> PositionDecision;
}

pub trait GraphicsBackend {
    /// Creates a memory device context compatible with the screen.
    fn create_device_context(&self) -> PlatformResult<DcHandle>;
    fn delete_device_context(&self, dc: DcHandle) -> PlatformResult<()>;

    /*
     * Creates a 32-bit bitmap. With `pixels` the bitmap is initialised from the
     * buffer (which is already in `format`); without, it starts transparent.
     */
    fn create_bitmap(
        &self,
        size: Size,
        format: PixelFormat,
        pixels: Option<&PixelBuffer>,
    ) -> PlatformResult<GdiObject>;
    fn delete_object(&self, object: GdiObject) -> PlatformResult<()>;

    /// Selects `object` into `dc`, returning the object it displaced.
    fn select_object(&self, dc: DcHandle, object: GdiObject) -> PlatformResult<GdiObject>;

    /// Copies `dst.size()` pixels from `src_origin` in `src` to `dst` in `dst_dc`.
    fn bit_blt(&self, dst_dc: DcHandle, dst: Rect, src_dc: DcHandle, src_origin: Point)
    -> PlatformResult<()>;

    /// Scales the `src` region of `src_dc` into the `dst` region of `dst_dc`.
    fn stretch_blt(&self, dst_dc: DcHandle, dst: Rect, src_dc: DcHandle, src: Rect)
    -> PlatformResult<()>;

    fn acquire_screen_dc(&self) -> PlatformResult<DcHandle>;
    fn release_screen_dc(&self, dc: DcHandle);

    /// Composites the top-left `size` pixels of `src_dc` onto the screen at `location`.
    fn update_layered_window(
        &self,
        window: WindowHandle,
        screen_dc: DcHandle,
        location: Point,
        size: Size,
        src_dc: DcHandle,
        blend: BlendFunction,
    ) -> PlatformResult<()>;

    /*
     * Creates a borderless, click-through, topmost-capable, per-pixel-alpha
     * window that is initially hidden. `handler` must be invoked for every
     * position-changing notification the window receives.
     */
    fn create_side_window(
        &self,
        handler: Box<dyn PositionChangeHandler>,
    ) -> PlatformResult<WindowHandle>;
    fn destroy_window(&self, window: WindowHandle) -> PlatformResult<()>;

    /// Moves `window` directly behind `insert_after` without resizing or activating it.
    fn set_window_pos(
        &self,
        window: WindowHandle,
        insert_after: WindowHandle,
        reposition: Reposition,
    ) -> PlatformResult<()>;
}
