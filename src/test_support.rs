/*
 * In-memory Graphics Backend used by the unit tests. It hands out increasing
 * integer handles, tracks which native resources are alive, records every call
 * in order, and invokes side-window handlers synchronously from
 * `set_window_pos`, the way the OS delivers WM_WINDOWPOSCHANGING.
 */
use crate::backend::{
    BlendFunction, DcHandle, GdiObject, GraphicsBackend, PendingPositionChange,
    PositionChangeHandler, PositionDecision, Reposition, ShowCommand, WindowHandle,
};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::host::{GeometryListener, HostWindow};
use crate::pixels::{PixelBuffer, PixelFormat};
use crate::types::{GeometrySnapshot, Point, Rect, Size};

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallKind {
    CreateDeviceContext,
    DeleteDeviceContext,
    CreateBitmap,
    DeleteObject,
    SelectObject,
    BitBlt,
    StretchBlt,
    AcquireScreenDc,
    ReleaseScreenDc,
    UpdateLayeredWindow,
    CreateSideWindow,
    DestroyWindow,
    SetWindowPos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    CreateDeviceContext(DcHandle),
    DeleteDeviceContext(DcHandle),
    CreateBitmap {
        object: GdiObject,
        size: Size,
    },
    DeleteObject(GdiObject),
    SelectObject {
        dc: DcHandle,
        object: GdiObject,
    },
    BitBlt {
        dst_dc: DcHandle,
        dst: Rect,
        src_dc: DcHandle,
        src_origin: Point,
    },
    StretchBlt {
        dst_dc: DcHandle,
        dst: Rect,
        src_dc: DcHandle,
        src: Rect,
    },
    AcquireScreenDc(DcHandle),
    ReleaseScreenDc(DcHandle),
    UpdateLayeredWindow {
        window: WindowHandle,
        location: Point,
        size: Size,
        src_dc: DcHandle,
        blend: BlendFunction,
    },
    CreateSideWindow(WindowHandle),
    DestroyWindow(WindowHandle),
    SetWindowPos {
        window: WindowHandle,
        insert_after: WindowHandle,
        reposition: Reposition,
    },
}

impl Call {
    pub(crate) fn kind(&self) -> CallKind {
        match self {
            Call::CreateDeviceContext(_) => CallKind::CreateDeviceContext,
            Call::DeleteDeviceContext(_) => CallKind::DeleteDeviceContext,
            Call::CreateBitmap { .. } => CallKind::CreateBitmap,
            Call::DeleteObject(_) => CallKind::DeleteObject,
            Call::SelectObject { .. } => CallKind::SelectObject,
            Call::BitBlt { .. } => CallKind::BitBlt,
            Call::StretchBlt { .. } => CallKind::StretchBlt,
            Call::AcquireScreenDc(_) => CallKind::AcquireScreenDc,
            Call::ReleaseScreenDc(_) => CallKind::ReleaseScreenDc,
            Call::UpdateLayeredWindow { .. } => CallKind::UpdateLayeredWindow,
            Call::CreateSideWindow(_) => CallKind::CreateSideWindow,
            Call::DestroyWindow(_) => CallKind::DestroyWindow,
            Call::SetWindowPos { .. } => CallKind::SetWindowPos,
        }
    }
}

#[derive(Default)]
pub(crate) struct RecordingBackend {
    calls: RefCell<Vec<Call>>,
    next_handle: Cell<isize>,
    live_dcs: RefCell<HashSet<DcHandle>>,
    live_objects: RefCell<HashSet<GdiObject>>,
    selected: RefCell<HashMap<DcHandle, GdiObject>>,
    handlers: RefCell<HashMap<WindowHandle, Box<dyn PositionChangeHandler>>>,
    uploads: RefCell<Vec<Vec<u32>>>,
    fail_next: Cell<Option<CallKind>>,
}

impl RecordingBackend {
    pub(crate) fn new() -> Self {
        Self {
            next_handle: Cell::new(1),
            ..Self::default()
        }
    }

    /// Makes the next call of `kind` fail with `NativeCallFailed`.
    pub(crate) fn fail_on(&self, kind: CallKind) {
        self.fail_next.set(Some(kind));
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub(crate) fn count(&self, kind: CallKind) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.kind() == kind)
            .count()
    }

    /// Number of bit-block copies (plain and stretched) that drew into `dc`.
    pub(crate) fn blits_into(&self, dc: DcHandle) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| match c {
                Call::BitBlt { dst_dc, .. } | Call::StretchBlt { dst_dc, .. } => *dst_dc == dc,
                _ => false,
            })
            .cloned()
            .collect()
    }

    pub(crate) fn live_device_contexts(&self) -> usize {
        self.live_dcs.borrow().len()
    }

    pub(crate) fn live_objects(&self) -> usize {
        self.live_objects.borrow().len()
    }

    pub(crate) fn live_windows(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub(crate) fn uploaded_pixels(&self) -> Vec<Vec<u32>> {
        self.uploads.borrow().clone()
    }

    /// Delivers a position-changing notification as the OS would.
    pub(crate) fn simulate_position_changing(
        &self,
        window: WindowHandle,
        pending: PendingPositionChange,
    ) -> Option<PositionDecision> {
        self.handlers
            .borrow()
            .get(&window)
            .map(|handler| handler.on_position_changing(pending))
    }

    fn next(&self) -> isize {
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        handle
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn check(&self, kind: CallKind) -> PlatformResult<()> {
        if self.fail_next.get() == Some(kind) {
            self.fail_next.set(None);
            return Err(PlatformError::NativeCallFailed(format!(
                "injected failure for {kind:?}"
            )));
        }
        Ok(())
    }
}

impl GraphicsBackend for RecordingBackend {
    fn create_device_context(&self) -> PlatformResult<DcHandle> {
        self.check(CallKind::CreateDeviceContext)?;
        let dc = DcHandle(self.next());
        self.live_dcs.borrow_mut().insert(dc);
        self.record(Call::CreateDeviceContext(dc));
        Ok(dc)
    }

    fn delete_device_context(&self, dc: DcHandle) -> PlatformResult<()> {
        self.check(CallKind::DeleteDeviceContext)?;
        self.live_dcs.borrow_mut().remove(&dc);
        self.selected.borrow_mut().remove(&dc);
        self.record(Call::DeleteDeviceContext(dc));
        Ok(())
    }

    fn create_bitmap(
        &self,
        size: Size,
        _format: PixelFormat,
        pixels: Option<&PixelBuffer>,
    ) -> PlatformResult<GdiObject> {
        self.check(CallKind::CreateBitmap)?;
        let object = GdiObject(self.next());
        self.live_objects.borrow_mut().insert(object);
        if let Some(pixels) = pixels {
            self.uploads.borrow_mut().push(pixels.pixels().to_vec());
        }
        self.record(Call::CreateBitmap { object, size });
        Ok(object)
    }

    fn delete_object(&self, object: GdiObject) -> PlatformResult<()> {
        self.check(CallKind::DeleteObject)?;
        self.live_objects.borrow_mut().remove(&object);
        self.record(Call::DeleteObject(object));
        Ok(())
    }

    fn select_object(&self, dc: DcHandle, object: GdiObject) -> PlatformResult<GdiObject> {
        self.check(CallKind::SelectObject)?;
        // A fresh DC holds a stock one-pixel bitmap, modelled as the negated DC handle.
        let previous = self
            .selected
            .borrow_mut()
            .insert(dc, object)
            .unwrap_or(GdiObject(-dc.0));
        self.record(Call::SelectObject { dc, object });
        Ok(previous)
    }

    fn bit_blt(
        &self,
        dst_dc: DcHandle,
        dst: Rect,
        src_dc: DcHandle,
        src_origin: Point,
    ) -> PlatformResult<()> {
        self.check(CallKind::BitBlt)?;
        self.record(Call::BitBlt {
            dst_dc,
            dst,
            src_dc,
            src_origin,
        });
        Ok(())
    }

    fn stretch_blt(
        &self,
        dst_dc: DcHandle,
        dst: Rect,
        src_dc: DcHandle,
        src: Rect,
    ) -> PlatformResult<()> {
        self.check(CallKind::StretchBlt)?;
        self.record(Call::StretchBlt {
            dst_dc,
            dst,
            src_dc,
            src,
        });
        Ok(())
    }

    fn acquire_screen_dc(&self) -> PlatformResult<DcHandle> {
        self.check(CallKind::AcquireScreenDc)?;
        let dc = DcHandle(self.next());
        self.record(Call::AcquireScreenDc(dc));
        Ok(dc)
    }

    fn release_screen_dc(&self, dc: DcHandle) {
        self.record(Call::ReleaseScreenDc(dc));
    }

    fn update_layered_window(
        &self,
        window: WindowHandle,
        _screen_dc: DcHandle,
        location: Point,
        size: Size,
        src_dc: DcHandle,
        blend: BlendFunction,
    ) -> PlatformResult<()> {
        self.check(CallKind::UpdateLayeredWindow)?;
        self.record(Call::UpdateLayeredWindow {
            window,
            location,
            size,
            src_dc,
            blend,
        });
        Ok(())
    }

    fn create_side_window(
        &self,
        handler: Box<dyn PositionChangeHandler>,
    ) -> PlatformResult<WindowHandle> {
        self.check(CallKind::CreateSideWindow)?;
        let window = WindowHandle(self.next());
        self.handlers.borrow_mut().insert(window, handler);
        self.record(Call::CreateSideWindow(window));
        Ok(window)
    }

    fn destroy_window(&self, window: WindowHandle) -> PlatformResult<()> {
        self.check(CallKind::DestroyWindow)?;
        self.handlers.borrow_mut().remove(&window);
        self.record(Call::DestroyWindow(window));
        Ok(())
    }

    fn set_window_pos(
        &self,
        window: WindowHandle,
        insert_after: WindowHandle,
        reposition: Reposition,
    ) -> PlatformResult<()> {
        self.check(CallKind::SetWindowPos)?;
        self.record(Call::SetWindowPos {
            window,
            insert_after,
            reposition,
        });
        self.simulate_position_changing(
            window,
            PendingPositionChange {
                size: Size::default(),
                show_window: reposition.show == ShowCommand::Show,
                hide_window: reposition.show == ShowCommand::Hide,
            },
        );
        Ok(())
    }
}

/*
 * Host window whose geometry the tests move around by hand. Geometry changes
 * are silent until `notify` hands the current snapshot to the listener, the
 * way the OS reports a window change after it happened.
 */
pub(crate) struct FakeHost {
    handle: WindowHandle,
    snapshot: Cell<GeometrySnapshot>,
    listener: RefCell<Option<GeometryListener>>,
    watch_toggles: Cell<usize>,
    fail_snapshot: Cell<bool>,
}

impl FakeHost {
    pub(crate) fn new(handle: isize, location: Point, size: Size, visible: bool) -> Self {
        Self {
            handle: WindowHandle(handle),
            snapshot: Cell::new(GeometrySnapshot::new(location, size, visible)),
            listener: RefCell::new(None),
            watch_toggles: Cell::new(0),
            fail_snapshot: Cell::new(false),
        }
    }

    pub(crate) fn resize(&self, size: Size) {
        let mut snapshot = self.snapshot.get();
        snapshot.size = size;
        self.snapshot.set(snapshot);
    }

    pub(crate) fn move_to(&self, location: Point) {
        let mut snapshot = self.snapshot.get();
        snapshot.location = location;
        self.snapshot.set(snapshot);
    }

    pub(crate) fn set_visible(&self, visible: bool) {
        let mut snapshot = self.snapshot.get();
        snapshot.visible = visible;
        self.snapshot.set(snapshot);
    }

    /// Makes every `snapshot` call fail until reset.
    pub(crate) fn fail_snapshots(&self, fail: bool) {
        self.fail_snapshot.set(fail);
    }

    /// Delivers the current geometry to the listener. Returns whether one was installed.
    pub(crate) fn notify(&self) -> bool {
        match self.listener.borrow().as_ref() {
            Some(listener) => {
                listener(self.snapshot.get());
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_watched(&self) -> bool {
        self.listener.borrow().is_some()
    }

    pub(crate) fn watch_toggles(&self) -> usize {
        self.watch_toggles.get()
    }
}

impl HostWindow for FakeHost {
    fn handle(&self) -> WindowHandle {
        self.handle
    }

    fn snapshot(&self) -> PlatformResult<GeometrySnapshot> {
        if self.fail_snapshot.get() {
            return Err(PlatformError::NativeCallFailed(
                "GetWindowRect (simulated)".to_string(),
            ));
        }
        Ok(self.snapshot.get())
    }

    fn watch_geometry(&self, listener: Option<GeometryListener>) -> PlatformResult<()> {
        *self.listener.borrow_mut() = listener;
        self.watch_toggles.set(self.watch_toggles.get() + 1);
        Ok(())
    }
}
