/*
 * Window class and window procedure shared by every frame side.
 *
 * Side windows are layered, click-through tool windows without any non-client
 * area. Each one carries its `PositionChangeHandler` in `GWLP_USERDATA`: the
 * handler is boxed, handed to WM_NCCREATE through a `PendingHandler` in
 * `lpCreateParams`, and freed on WM_NCDESTROY. A handler no window adopted is
 * freed by the `PendingHandler` itself. WM_WINDOWPOSCHANGING is answered by the handler, which
 * clamps the requested size and tracks visibility.
 */
use crate::backend::{PendingPositionChange, PositionChangeHandler};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::types::Size;

use std::cell::Cell;
use std::ffi::c_void;
use windows::Win32::Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::*;
use windows::core::{HSTRING, PCWSTR, w};

pub(crate) const SIDE_WINDOW_CLASS: PCWSTR = w!("SkinFrame_SideWindowClass");

type HandlerBox = Box<dyn PositionChangeHandler>;

// Owns a boxed handler until WM_NCCREATE adopts it.
struct PendingHandler {
    raw: *mut HandlerBox,
    adopted: Cell<bool>,
}

impl PendingHandler {
    fn new(handler: HandlerBox) -> Self {
        Self {
            raw: Box::into_raw(Box::new(handler)),
            adopted: Cell::new(false),
        }
    }

    fn create_params(&self) -> *const c_void {
        self as *const Self as *const c_void
    }

    // Hands the handler to the window; from now on WM_NCDESTROY frees it.
    fn adopt(&self) -> *mut HandlerBox {
        self.adopted.set(true);
        self.raw
    }
}

impl Drop for PendingHandler {
    fn drop(&mut self) {
        if !self.adopted.get() {
            drop(unsafe { Box::from_raw(self.raw) });
        }
    }
}

/*
 * Registers the side window class for `instance` unless a previous backend in
 * this process already did.
 */
pub(crate) fn register_side_window_class(instance: HINSTANCE) -> PlatformResult<()> {
    unsafe {
        let mut existing = WNDCLASSEXW::default();
        if GetClassInfoExW(Some(instance), SIDE_WINDOW_CLASS, &mut existing).is_ok() {
            log::debug!("SideWindow: window class already registered.");
            return Ok(());
        }

        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: WNDCLASS_STYLES(0),
            lpfnWndProc: Some(side_wnd_proc),
            hInstance: instance,
            hCursor: LoadCursorW(None, IDC_ARROW)?,
            lpszClassName: SIDE_WINDOW_CLASS,
            ..Default::default()
        };

        if RegisterClassExW(&wc) == 0 {
            let error = GetLastError();
            log::error!("SideWindow: RegisterClassExW failed: {error:?}");
            Err(PlatformError::NativeCallFailed(format!(
                "RegisterClassExW failed: {error:?}"
            )))
        } else {
            log::debug!("SideWindow: window class registered.");
            Ok(())
        }
    }
}

/// Creates a hidden side window owning `handler` for its whole lifetime.
pub(crate) fn create_side_window(instance: HINSTANCE, handler: HandlerBox) -> PlatformResult<HWND> {
    let pending = PendingHandler::new(handler);
    unsafe {
        let created = CreateWindowExW(
            WS_EX_LAYERED | WS_EX_TRANSPARENT | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE,
            SIDE_WINDOW_CLASS,
            &HSTRING::new(),
            WS_POPUP,
            0,
            0,
            0,
            0,
            None,
            None,
            Some(instance),
            Some(pending.create_params()),
        );
        match created {
            Ok(hwnd) => Ok(hwnd),
            Err(err) => {
                log::error!("SideWindow: CreateWindowExW failed: {err:?}");
                Err(err.into())
            }
        }
    }
}

fn pending_from(pos: &WINDOWPOS) -> PendingPositionChange {
    PendingPositionChange {
        size: Size::new(pos.cx, pos.cy),
        show_window: pos.flags.0 & SWP_SHOWWINDOW.0 != 0,
        hide_window: pos.flags.0 & SWP_HIDEWINDOW.0 != 0,
    }
}

unsafe extern "system" fn side_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let context_ptr = if msg == WM_NCCREATE {
        let create_struct = unsafe { &*(lparam.0 as *const CREATESTRUCTW) };
        let pending = unsafe { &*(create_struct.lpCreateParams as *const PendingHandler) };
        let context_raw_ptr = pending.adopt();
        unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, context_raw_ptr as isize) };
        context_raw_ptr
    } else {
        unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut HandlerBox }
    };

    if context_ptr.is_null() {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }

    match msg {
        WM_WINDOWPOSCHANGING => {
            let pos = unsafe { &mut *(lparam.0 as *mut WINDOWPOS) };
            let handler = unsafe { &*context_ptr };
            let decision = handler.on_position_changing(pending_from(pos));
            pos.cx = decision.clamped_size.width;
            pos.cy = decision.clamped_size.height;
            LRESULT(0)
        }
        WM_NCDESTROY => {
            unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) };
            let _ = unsafe { Box::from_raw(context_ptr) };
            unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}
