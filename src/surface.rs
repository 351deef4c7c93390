/*
 * Off-screen drawing target: a memory device context with one 32-bit bitmap
 * selected into it. The native resources follow a strict lifecycle:
 *
 *   Empty -> DC created -> bitmap created -> bitmap selected
 *         -> bitmap deselected -> bitmap deleted -> DC deleted
 *
 * Every transition checks its precondition at runtime and reports
 * `PlatformError::ResourceState` when called out of order. Dropping a
 * `Surface` releases whatever is still alive, in the reverse order.
 */
use crate::backend::{DcHandle, GdiObject, GraphicsBackend};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::pixels::{PixelBuffer, PixelFormat};
use crate::types::Size;

use std::rc::Rc;

pub struct Surface {
    backend: Rc<dyn GraphicsBackend>,
    size: Size,
    device_context: Option<DcHandle>,
    object: Option<GdiObject>,
    // Object the DC held before ours was selected; restoring it deselects ours.
    placeholder: Option<GdiObject>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("size", &self.size)
            .field("device_context", &self.device_context)
            .field("object", &self.object)
            .field("placeholder", &self.placeholder)
            .finish()
    }
}

impl Surface {
    /// An empty surface with no native resources.
    pub fn new(backend: Rc<dyn GraphicsBackend>) -> Self {
        Self {
            backend,
            size: Size::default(),
            device_context: None,
            object: None,
            placeholder: None,
        }
    }

    /*
     * Creates a DC plus a blank bitmap of `size` and selects it, leaving the
     * surface ready for drawing. Partially created resources are released if
     * any step fails.
     */
    pub fn allocate(
        backend: Rc<dyn GraphicsBackend>,
        size: Size,
        format: PixelFormat,
    ) -> PlatformResult<Self> {
        let mut surface = Self::new(backend);
        surface.create_device_context()?;
        surface.create_surface(size.width, size.height, format)?;
        surface.select_surface()?;
        Ok(surface)
    }

    /// Same as `allocate`, but the bitmap is initialised from `pixels`.
    pub(crate) fn from_pixels(
        backend: Rc<dyn GraphicsBackend>,
        pixels: &PixelBuffer,
    ) -> PlatformResult<Self> {
        let mut surface = Self::new(backend);
        surface.create_device_context()?;
        surface.create_surface_from(pixels)?;
        surface.select_surface()?;
        Ok(surface)
    }

    pub fn width(&self) -> i32 {
        self.size.width
    }

    pub fn height(&self) -> i32 {
        self.size.height
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_device_context_created(&self) -> bool {
        self.device_context.is_some()
    }

    pub fn is_object_created(&self) -> bool {
        self.object.is_some()
    }

    pub fn is_object_selected(&self) -> bool {
        self.placeholder.is_some()
    }

    pub fn device_context(&self) -> PlatformResult<DcHandle> {
        self.device_context.ok_or_else(|| {
            PlatformError::ResourceState("Surface has no device context".to_string())
        })
    }

    pub fn create_device_context(&mut self) -> PlatformResult<()> {
        if self.is_device_context_created() {
            return Err(PlatformError::ResourceState(
                "Attempt to create a device context while the previous one is not deleted"
                    .to_string(),
            ));
        }
        let dc = self.backend.create_device_context()?;
        log::debug!("Surface: created device context {dc:?}");
        self.device_context = Some(dc);
        Ok(())
    }

    pub fn delete_device_context(&mut self) -> PlatformResult<()> {
        let Some(dc) = self.device_context else {
            return Err(PlatformError::ResourceState(
                "Attempt to delete a device context that was never created or is already deleted"
                    .to_string(),
            ));
        };
        if self.is_object_selected() {
            return Err(PlatformError::ResourceState(
                "Attempt to delete a device context that still holds a selected object".to_string(),
            ));
        }
        self.backend.delete_device_context(dc)?;
        log::debug!("Surface: deleted device context {dc:?}");
        self.device_context = None;
        Ok(())
    }

    /// Creates a blank bitmap. Both dimensions must be positive.
    pub fn create_surface(
        &mut self,
        width: i32,
        height: i32,
        format: PixelFormat,
    ) -> PlatformResult<()> {
        self.ensure_no_object()?;
        if width <= 0 || height <= 0 {
            return Err(PlatformError::Configuration(format!(
                "Attempt to create a surface with non-positive size (width: {width}, height: {height})"
            )));
        }
        let size = Size::new(width, height);
        let object = self.backend.create_bitmap(size, format, None)?;
        self.object = Some(object);
        self.size = size;
        Ok(())
    }

    /*
     * Creates the bitmap from a decoded image. The layered-window API blends
     * premultiplied pixels, so straight-alpha input is converted first.
     */
    pub(crate) fn create_surface_from(&mut self, pixels: &PixelBuffer) -> PlatformResult<()> {
        self.ensure_no_object()?;
        let premultiplied = pixels.premultiplied();
        let object = self.backend.create_bitmap(
            premultiplied.size(),
            PixelFormat::PremultipliedArgb32,
            Some(&premultiplied),
        )?;
        self.object = Some(object);
        self.size = premultiplied.size();
        Ok(())
    }

    pub fn delete_surface(&mut self) -> PlatformResult<()> {
        let Some(object) = self.object else {
            return Err(PlatformError::ResourceState(
                "Attempt to delete a surface that was never created or is already deleted"
                    .to_string(),
            ));
        };
        if self.is_object_selected() {
            return Err(PlatformError::ResourceState(
                "Attempt to delete a surface that is selected into its device context".to_string(),
            ));
        }
        self.backend.delete_object(object)?;
        self.object = None;
        self.size = Size::default();
        Ok(())
    }

    pub fn select_surface(&mut self) -> PlatformResult<()> {
        let (dc, object) = self.dc_and_object("select")?;
        if self.is_object_selected() {
            return Err(PlatformError::ResourceState(
                "Attempt to select a surface that is already selected".to_string(),
            ));
        }
        let placeholder = self.backend.select_object(dc, object)?;
        self.placeholder = Some(placeholder);
        Ok(())
    }

    pub fn deselect_surface(&mut self) -> PlatformResult<()> {
        let (dc, _) = self.dc_and_object("deselect")?;
        let Some(placeholder) = self.placeholder else {
            return Err(PlatformError::ResourceState(
                "Attempt to deselect a surface that is not selected".to_string(),
            ));
        };
        let object = self.backend.select_object(dc, placeholder)?;
        self.object = Some(object);
        self.placeholder = None;
        Ok(())
    }

    /*
     * Releases every native resource that is still alive: deselect, delete the
     * bitmap, delete the DC. Safe to call any number of times.
     */
    pub fn dispose(&mut self) -> PlatformResult<()> {
        if self.is_object_selected() {
            self.deselect_surface()?;
        }
        if self.is_object_created() {
            self.delete_surface()?;
        }
        if self.is_device_context_created() {
            self.delete_device_context()?;
        }
        Ok(())
    }

    fn ensure_no_object(&self) -> PlatformResult<()> {
        if self.is_object_created() {
            return Err(PlatformError::ResourceState(
                "Attempt to create a surface without deleting the previous one".to_string(),
            ));
        }
        Ok(())
    }

    fn dc_and_object(&self, action: &str) -> PlatformResult<(DcHandle, GdiObject)> {
        let dc = self.device_context.ok_or_else(|| {
            PlatformError::ResourceState(format!(
                "Attempt to {action} a surface while no device context exists"
            ))
        })?;
        let object = self.object.ok_or_else(|| {
            PlatformError::ResourceState(format!(
                "Attempt to {action} a surface that is not created"
            ))
        })?;
        Ok((dc, object))
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            log::error!("Surface: failed to release native resources on drop: {err}");
        }
    }
}
