/*
 * `HostWindow` for an existing Win32 top-level window.
 *
 * Watching subclasses the target: the original window procedure is saved in a
 * context stored under a window property (the target's `GWLP_USERDATA` belongs
 * to its owner), every message is forwarded to it, and after each
 * WM_WINDOWPOSCHANGED the listener receives a fresh snapshot. Unwatching
 * restores the original procedure when ours is still on top of the chain;
 * otherwise only the listener is cleared and the context is freed on
 * WM_NCDESTROY.
 */
use super::{hwnd, window_handle};
use crate::backend::WindowHandle;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::host::{GeometryListener, HostWindow};
use crate::types::{GeometrySnapshot, Point, Size};

use std::cell::{Cell, RefCell};
use std::ffi::c_void;
use windows::Win32::Foundation::{GetLastError, HANDLE, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    CallWindowProcW, DefWindowProcW, GWLP_WNDPROC, GetPropW, GetWindowLongPtrW, GetWindowRect,
    IsWindowVisible, RemovePropW, SetPropW, SetWindowLongPtrW, WM_NCDESTROY,
    WM_WINDOWPOSCHANGED, WNDPROC,
};
use windows::core::{PCWSTR, w};

const WATCH_PROPERTY: PCWSTR = w!("SkinFrame.GeometryWatch");

struct WatchContext {
    previous_proc: isize,
    listener: RefCell<Option<GeometryListener>>,
}

fn read_snapshot(window: HWND) -> PlatformResult<GeometrySnapshot> {
    let mut rect = RECT::default();
    unsafe { GetWindowRect(window, &mut rect) }.map_err(|err| {
        log::error!("Win32HostWindow: GetWindowRect failed for {window:?}: {err:?}");
        PlatformError::from(err)
    })?;
    Ok(GeometrySnapshot::new(
        Point::new(rect.left, rect.top),
        Size::new(rect.right - rect.left, rect.bottom - rect.top),
        unsafe { IsWindowVisible(window) }.as_bool(),
    ))
}

fn watch_context(window: HWND) -> *mut WatchContext {
    unsafe { GetPropW(window, WATCH_PROPERTY) }.0 as *mut WatchContext
}

unsafe fn call_previous(
    previous: isize,
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    unsafe {
        let previous_proc: WNDPROC = std::mem::transmute(previous);
        CallWindowProcW(previous_proc, hwnd, msg, wparam, lparam)
    }
}

unsafe extern "system" fn watch_subclass_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let context_ptr = watch_context(hwnd);
    if context_ptr.is_null() {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }
    let previous = unsafe { (*context_ptr).previous_proc };

    if msg == WM_NCDESTROY {
        unsafe {
            SetWindowLongPtrW(hwnd, GWLP_WNDPROC, previous);
            let _ = RemovePropW(hwnd, WATCH_PROPERTY);
            drop(Box::from_raw(context_ptr));
            return call_previous(previous, hwnd, msg, wparam, lparam);
        }
    }

    let result = unsafe { call_previous(previous, hwnd, msg, wparam, lparam) };
    if msg == WM_WINDOWPOSCHANGED {
        let context = unsafe { &*context_ptr };
        if let Ok(listener) = context.listener.try_borrow() {
            if let Some(listener) = listener.as_ref() {
                match read_snapshot(hwnd) {
                    Ok(snapshot) => listener(snapshot),
                    Err(err) => log::warn!("Win32HostWindow: geometry change not delivered: {err}"),
                }
            }
        }
    }
    result
}

#[derive(Debug)]
pub struct Win32HostWindow {
    handle: WindowHandle,
    watching: Cell<bool>,
}

impl Win32HostWindow {
    pub fn new(hwnd: HWND) -> Self {
        Self {
            handle: window_handle(hwnd),
            watching: Cell::new(false),
        }
    }

    pub fn is_watched(&self) -> bool {
        self.watching.get()
    }

    fn install(&self, window: HWND, listener: GeometryListener) -> PlatformResult<()> {
        let previous = unsafe { GetWindowLongPtrW(window, GWLP_WNDPROC) };
        if previous == 0 {
            let error = unsafe { GetLastError() };
            log::error!("Win32HostWindow: GetWindowLongPtrW failed for {window:?}: {error:?}");
            return Err(PlatformError::NativeCallFailed(format!(
                "GetWindowLongPtrW failed: {error:?}"
            )));
        }
        let context = Box::into_raw(Box::new(WatchContext {
            previous_proc: previous,
            listener: RefCell::new(Some(listener)),
        }));
        unsafe {
            if let Err(err) = SetPropW(window, WATCH_PROPERTY, Some(HANDLE(context as *mut c_void))) {
                drop(Box::from_raw(context));
                log::error!("Win32HostWindow: SetPropW failed for {window:?}: {err:?}");
                return Err(err.into());
            }
            #[allow(clippy::fn_to_numeric_cast)]
            SetWindowLongPtrW(window, GWLP_WNDPROC, watch_subclass_proc as isize);
        }
        log::debug!("Win32HostWindow: watching geometry of {window:?}");
        Ok(())
    }

    fn uninstall(&self, window: HWND, context_ptr: *mut WatchContext) {
        let ours = watch_subclass_proc as usize as isize;
        unsafe {
            if GetWindowLongPtrW(window, GWLP_WNDPROC) == ours {
                SetWindowLongPtrW(window, GWLP_WNDPROC, (*context_ptr).previous_proc);
                let _ = RemovePropW(window, WATCH_PROPERTY);
                drop(Box::from_raw(context_ptr));
                log::debug!("Win32HostWindow: stopped watching {window:?}");
            } else {
                log::debug!("Win32HostWindow: {window:?} subclassed again, keeping inert subclass");
            }
        }
    }
}

impl HostWindow for Win32HostWindow {
    fn handle(&self) -> WindowHandle {
        self.handle
    }

    fn snapshot(&self) -> PlatformResult<GeometrySnapshot> {
        read_snapshot(hwnd(self.handle))
    }

    fn watch_geometry(&self, listener: Option<GeometryListener>) -> PlatformResult<()> {
        let window = hwnd(self.handle);
        let context_ptr = watch_context(window);
        if context_ptr.is_null() {
            if let Some(listener) = listener {
                self.install(window, listener)?;
                self.watching.set(true);
            }
            return Ok(());
        }

        let context = unsafe { &*context_ptr };
        let Ok(mut slot) = context.listener.try_borrow_mut() else {
            return Err(PlatformError::ResourceState(
                "Geometry subscription changed from inside its own listener".to_string(),
            ));
        };
        let watching = listener.is_some();
        *slot = listener;
        drop(slot);
        if !watching {
            self.uninstall(window, context_ptr);
        }
        self.watching.set(watching);
        Ok(())
    }
}

impl Drop for Win32HostWindow {
    fn drop(&mut self) {
        if self.watching.get() {
            if let Err(err) = self.watch_geometry(None) {
                log::error!("Win32HostWindow: failed to stop watching {:?}: {err}", self.handle);
            }
        }
    }
}
