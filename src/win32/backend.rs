/*
 * GDI implementation of `GraphicsBackend`.
 *
 * Bitmaps are top-down 32 bpp DIB sections so the pixel buffers handed in by
 * the portable code can be copied row for row. Every failing call is logged
 * with its name and turned into `PlatformError::NativeCallFailed`.
 */
use super::side_window::{create_side_window, register_side_window_class};
use super::{dc_handle, gdi_object, hdc, hgdiobj, hwnd, window_handle};
use crate::backend::{
    BlendFunction, DcHandle, GdiObject, GraphicsBackend, PositionChangeHandler, Reposition,
    ShowCommand, WindowHandle,
};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::pixels::{PixelBuffer, PixelFormat};
use crate::types::{Point, Rect, Size};

use std::ffi::c_void;
use windows::Win32::Foundation::{COLORREF, GetLastError, HINSTANCE, POINT, SIZE};
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    DestroyWindow, SWP_HIDEWINDOW, SWP_NOACTIVATE, SWP_NOSIZE, SWP_SHOWWINDOW, SetWindowPos,
    UpdateLayeredWindow, ULW_ALPHA,
};

fn native_failure(call: &str) -> PlatformError {
    let error = unsafe { GetLastError() };
    log::error!("Win32Backend: {call} failed: {error:?}");
    PlatformError::NativeCallFailed(format!("{call} failed: {error:?}"))
}

#[derive(Debug)]
pub struct Win32Backend {
    instance: HINSTANCE,
}

impl Win32Backend {
    /// Registers the side window class for the current module.
    pub fn new() -> PlatformResult<Self> {
        let module = unsafe { GetModuleHandleW(None)? };
        let instance: HINSTANCE = module.into();
        register_side_window_class(instance)?;
        Ok(Self { instance })
    }
}

impl GraphicsBackend for Win32Backend {
    fn create_device_context(&self) -> PlatformResult<DcHandle> {
        let dc = unsafe { CreateCompatibleDC(None) };
        if dc.is_invalid() {
            return Err(native_failure("CreateCompatibleDC"));
        }
        Ok(dc_handle(dc))
    }

    fn delete_device_context(&self, dc: DcHandle) -> PlatformResult<()> {
        if unsafe { DeleteDC(hdc(dc)) }.as_bool() {
            Ok(())
        } else {
            Err(native_failure("DeleteDC"))
        }
    }

    fn create_bitmap(
        &self,
        size: Size,
        _format: PixelFormat,
        pixels: Option<&PixelBuffer>,
    ) -> PlatformResult<GdiObject> {
        let bmi = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: size.width,
                biHeight: -size.height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let mut bits: *mut c_void = std::ptr::null_mut();
        let bitmap = unsafe { CreateDIBSection(None, &bmi, DIB_RGB_COLORS, &mut bits, None, 0) }
            .map_err(|err| {
                log::error!("Win32Backend: CreateDIBSection {size:?} failed: {err:?}");
                PlatformError::from(err)
            })?;

        // A fresh DIB section is zeroed, which is fully transparent.
        if let Some(buffer) = pixels {
            if bits.is_null() {
                let _ = unsafe { DeleteObject(bitmap.into()) };
                return Err(native_failure("CreateDIBSection (no pixel storage)"));
            }
            let source = buffer.pixels();
            let count = source.len().min(size.area() as usize);
            unsafe {
                std::ptr::copy_nonoverlapping(source.as_ptr(), bits as *mut u32, count);
            }
        }
        Ok(gdi_object(bitmap.into()))
    }

    fn delete_object(&self, object: GdiObject) -> PlatformResult<()> {
        if unsafe { DeleteObject(hgdiobj(object)) }.as_bool() {
            Ok(())
        } else {
            Err(native_failure("DeleteObject"))
        }
    }

    fn select_object(&self, dc: DcHandle, object: GdiObject) -> PlatformResult<GdiObject> {
        let previous = unsafe { SelectObject(hdc(dc), hgdiobj(object)) };
        if previous.is_invalid() {
            return Err(native_failure("SelectObject"));
        }
        Ok(gdi_object(previous))
    }

    fn bit_blt(
        &self,
        dst_dc: DcHandle,
        dst: Rect,
        src_dc: DcHandle,
        src_origin: Point,
    ) -> PlatformResult<()> {
        unsafe {
            BitBlt(
                hdc(dst_dc),
                dst.x,
                dst.y,
                dst.width,
                dst.height,
                Some(hdc(src_dc)),
                src_origin.x,
                src_origin.y,
                SRCCOPY,
            )
        }
        .map_err(|err| {
            log::error!("Win32Backend: BitBlt into {dst:?} failed: {err:?}");
            PlatformError::from(err)
        })
    }

    fn stretch_blt(
        &self,
        dst_dc: DcHandle,
        dst: Rect,
        src_dc: DcHandle,
        src: Rect,
    ) -> PlatformResult<()> {
        let ok = unsafe {
            // Halftoning would drop the alpha channel.
            let _ = SetStretchBltMode(hdc(dst_dc), COLORONCOLOR);
            StretchBlt(
                hdc(dst_dc),
                dst.x,
                dst.y,
                dst.width,
                dst.height,
                Some(hdc(src_dc)),
                src.x,
                src.y,
                src.width,
                src.height,
                SRCCOPY,
            )
        };
        if ok.as_bool() {
            Ok(())
        } else {
            Err(native_failure("StretchBlt"))
        }
    }

    fn acquire_screen_dc(&self) -> PlatformResult<DcHandle> {
        let dc = unsafe { GetDC(None) };
        if dc.is_invalid() {
            return Err(native_failure("GetDC"));
        }
        Ok(dc_handle(dc))
    }

    fn release_screen_dc(&self, dc: DcHandle) {
        if unsafe { ReleaseDC(None, hdc(dc)) } == 0 {
            log::warn!("Win32Backend: ReleaseDC did not release the screen DC {dc:?}");
        }
    }

    fn update_layered_window(
        &self,
        window: WindowHandle,
        screen_dc: DcHandle,
        location: Point,
        size: Size,
        src_dc: DcHandle,
        blend: BlendFunction,
    ) -> PlatformResult<()> {
        let pt_dst = POINT {
            x: location.x,
            y: location.y,
        };
        let pt_src = POINT { x: 0, y: 0 };
        let extent = SIZE {
            cx: size.width,
            cy: size.height,
        };
        let blend = BLENDFUNCTION {
            BlendOp: AC_SRC_OVER as u8,
            BlendFlags: 0,
            SourceConstantAlpha: blend.source_constant_alpha,
            AlphaFormat: if blend.per_pixel_alpha {
                AC_SRC_ALPHA as u8
            } else {
                0
            },
        };
        unsafe {
            UpdateLayeredWindow(
                hwnd(window),
                Some(hdc(screen_dc)),
                Some(&pt_dst),
                Some(&extent),
                Some(hdc(src_dc)),
                Some(&pt_src),
                COLORREF(0),
                Some(&blend),
                ULW_ALPHA,
            )
        }
        .map_err(|err| {
            log::error!("Win32Backend: UpdateLayeredWindow for {window:?} failed: {err:?}");
            PlatformError::from(err)
        })
    }

    fn create_side_window(
        &self,
        handler: Box<dyn PositionChangeHandler>,
    ) -> PlatformResult<WindowHandle> {
        let hwnd = create_side_window(self.instance, handler)?;
        log::debug!("Win32Backend: created side window {hwnd:?}");
        Ok(window_handle(hwnd))
    }

    fn destroy_window(&self, window: WindowHandle) -> PlatformResult<()> {
        unsafe { DestroyWindow(hwnd(window)) }.map_err(|err| {
            log::error!("Win32Backend: DestroyWindow for {window:?} failed: {err:?}");
            PlatformError::from(err)
        })
    }

    fn set_window_pos(
        &self,
        window: WindowHandle,
        insert_after: WindowHandle,
        reposition: Reposition,
    ) -> PlatformResult<()> {
        let show = match reposition.show {
            ShowCommand::Show => SWP_SHOWWINDOW,
            ShowCommand::Hide => SWP_HIDEWINDOW,
        };
        unsafe {
            SetWindowPos(
                hwnd(window),
                Some(hwnd(insert_after)),
                reposition.location.x,
                reposition.location.y,
                0,
                0,
                SWP_NOACTIVATE | SWP_NOSIZE | show,
            )
        }
        .map_err(|err| {
            log::error!("Win32Backend: SetWindowPos for {window:?} failed: {err:?}");
            PlatformError::from(err)
        })
    }
}
