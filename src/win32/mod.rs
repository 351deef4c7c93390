/*
 * Win32 implementation of the platform traits: a GDI-backed `GraphicsBackend`
 * that owns the side window class, and a `HostWindow` wrapper around any
 * existing top-level `HWND`.
 */
mod backend;
mod host;
mod side_window;

pub use backend::Win32Backend;
pub use host::Win32HostWindow;

use crate::backend::{DcHandle, GdiObject, WindowHandle};

use std::ffi::c_void;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{HDC, HGDIOBJ};

#[inline]
pub(crate) fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.0 as *mut c_void)
}

#[inline]
pub(crate) fn window_handle(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0 as isize)
}

#[inline]
pub(crate) fn hdc(dc: DcHandle) -> HDC {
    HDC(dc.0 as *mut c_void)
}

#[inline]
pub(crate) fn dc_handle(hdc: HDC) -> DcHandle {
    DcHandle(hdc.0 as isize)
}

#[inline]
pub(crate) fn hgdiobj(object: GdiObject) -> HGDIOBJ {
    HGDIOBJ(object.0 as *mut c_void)
}

#[inline]
pub(crate) fn gdi_object(object: HGDIOBJ) -> GdiObject {
    GdiObject(object.0 as isize)
}
