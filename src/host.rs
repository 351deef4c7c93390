/*
 * The target window a frame decorates. The host toolkit exposes its native
 * handle, a geometry snapshot, and a single geometry subscription: while a
 * listener is installed, the host calls it with a fresh snapshot after every
 * move, resize, show or hide of the window.
 */
use crate::backend::WindowHandle;
use crate::error::Result as PlatformResult;
use crate::types::GeometrySnapshot;

/// Receives the target's geometry after each change. Must not change the subscription itself.
pub type GeometryListener = Box<dyn Fn(GeometrySnapshot)>;

pub trait HostWindow {
    fn handle(&self) -> WindowHandle;

    /// Current outer location, size and visibility.
    fn snapshot(&self) -> PlatformResult<GeometrySnapshot>;

    /// Installs (`Some`) or removes (`None`) the geometry listener, replacing any previous one.
    fn watch_geometry(&self, listener: Option<GeometryListener>) -> PlatformResult<()>;
}
