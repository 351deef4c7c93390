/*
 * Provides the public entry point for the skinframe crate: a decorative,
 * per-pixel-alpha frame ("skin") drawn around an existing top-level window
 * using four layered side windows that follow the target as it moves, resizes,
 * shows and hides.
 *
 * The compositor, the nine-patch metrics and the incremental side painter are
 * platform-agnostic and talk to the OS only through the `GraphicsBackend` and
 * `HostWindow` traits, so they build and test on every platform. The Win32
 * implementation of both traits is compiled on Windows only.
 */
pub mod backend;
pub mod compositor;
pub mod error;
pub mod host;
pub mod metrics;
pub mod pixels;
pub(crate) mod side;
pub(crate) mod surface;
pub mod theme;
pub mod types;
#[cfg(target_os = "windows")]
pub mod win32;

#[cfg(test)]
pub(crate) mod test_support;

pub use backend::{
    BlendFunction, DcHandle, GdiObject, GraphicsBackend, PendingPositionChange,
    PositionChangeHandler, PositionDecision, Reposition, ShowCommand, WindowHandle,
    decide_position_change,
};
pub use compositor::{LayeredWindow, SharedLayeredWindow, frame_bounds};
pub use error::{PlatformError, Result as PlatformResult};
pub use host::{GeometryListener, HostWindow};
pub use metrics::{Corners, Metrics};
pub use pixels::{PixelBuffer, PixelFormat};
pub use side::Edge;
pub use surface::Surface;
pub use theme::{EdgeFill, Theme};
pub use types::{FrameConfig, GeometrySnapshot, Margin, Point, Rect, Size};
