/*
 * A theme is the visual asset of a frame: the decorative bitmap uploaded into
 * its own surface, the nine-patch metrics describing how to slice it, and the
 * default margin between the frame and the target window. Themes are
 * immutable once built and are shared between frames through `Rc`, so a
 * theme cannot be released while a frame still references it.
 */
use crate::backend::{DcHandle, GraphicsBackend};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::metrics::Metrics;
use crate::pixels::{PixelBuffer, PixelFormat};
use crate::surface::Surface;
use crate::types::{Margin, Rect, Size};

use std::rc::Rc;

/// How an edge slice covers spans longer than itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeFill {
    /// Repeat the slice. Keeps the pattern crisp on long edges.
    #[default]
    Tile,
    /// Scale the slice to the span.
    Stretch,
}

#[derive(Debug)]
pub struct Theme {
    surface: Surface,
    margin: Margin,
    metrics: Metrics,
    edge_fill: EdgeFill,
}

impl Theme {
    /// Builds a theme from a straight-alpha template and its inner rectangle.
    pub fn new(
        backend: Rc<dyn GraphicsBackend>,
        template: &PixelBuffer,
        inner_rect: Rect,
        margin: Margin,
    ) -> PlatformResult<Self> {
        let metrics = Metrics::new(template.size(), inner_rect)?;
        Self::from_metrics(backend, template, metrics, margin)
    }

    pub fn from_metrics(
        backend: Rc<dyn GraphicsBackend>,
        template: &PixelBuffer,
        metrics: Metrics,
        margin: Margin,
    ) -> PlatformResult<Self> {
        if template.format() != PixelFormat::Argb32 {
            return Err(PlatformError::Configuration(
                "Theme template must be a 32-bit ARGB image with straight alpha".to_string(),
            ));
        }
        if metrics.bitmap_size() != template.size() {
            return Err(PlatformError::Configuration(format!(
                "Metrics were computed for {:?} but the template is {:?}",
                metrics.bitmap_size(),
                template.size()
            )));
        }

        let surface = Surface::from_pixels(backend, template)?;
        log::debug!(
            "Theme: loaded {:?} template, inner rect {:?}, margin {margin:?}",
            template.size(),
            metrics.inner_rect()
        );
        Ok(Self {
            surface,
            margin,
            metrics,
            edge_fill: EdgeFill::default(),
        })
    }

    pub fn with_edge_fill(mut self, edge_fill: EdgeFill) -> Self {
        self.edge_fill = edge_fill;
        self
    }

    pub fn width(&self) -> i32 {
        self.surface.width()
    }

    pub fn height(&self) -> i32 {
        self.surface.height()
    }

    pub fn size(&self) -> Size {
        self.surface.size()
    }

    pub fn margin(&self) -> Margin {
        self.margin
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn edge_fill(&self) -> EdgeFill {
        self.edge_fill
    }

    pub(crate) fn device_context(&self) -> PlatformResult<DcHandle> {
        self.surface.device_context()
    }
}
