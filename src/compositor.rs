/*
 * The compositor: four layered side windows kept glued around a target window.
 *
 * On every tick (`update`) the frame's outer rectangle is recomputed from the
 * target's latest geometry snapshot, the theme's edge metrics and the two
 * margins. The tick is then classified:
 *
 * - size changed, or a full redraw is pending, while the target is visible:
 *   the sides are repainted (incrementally unless a full redraw is pending)
 *   and pushed with the layered-window update, which also moves them;
 * - visibility changed, the size did not change, or only one axis changed:
 *   all four sides are repositioned (never resized or activated) in a fixed
 *   chain directly behind the target: Left, Top, Right, Bottom.
 *
 * Property changes (opacity, margin, theme, target) trigger a tick unless
 * updates are suspended; `resume(true)` folds everything changed while
 * suspended into a single tick. The frame is shared (`SharedLayeredWindow`)
 * so the target's geometry listener can tick it through a weak reference.
 */
use crate::backend::{
    BlendFunction, DcHandle, GraphicsBackend, Reposition, ShowCommand, WindowHandle,
};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::host::{GeometryListener, HostWindow};
use crate::metrics::Metrics;
use crate::side::{Edge, PaintContext, Side};
use crate::theme::Theme;
use crate::types::{FrameConfig, GeometrySnapshot, Margin, Point, Rect, Size};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/*
 * Outer rectangle of the frame around a target: the target grown by the edge
 * thickness of the theme and by `margin` (theme margin plus instance margin).
 */
pub fn frame_bounds(target: &GeometrySnapshot, metrics: &Metrics, margin: Margin) -> Rect {
    Rect::new(
        target.location.x - metrics.left.width - margin.left,
        target.location.y - metrics.top.height - margin.top,
        target.size.width + metrics.horizontal_thickness() + margin.horizontal(),
        target.size.height + metrics.vertical_thickness() + margin.vertical(),
    )
}

// Screen device context held for the duration of one paint pass.
struct ScreenDc<'a> {
    backend: &'a dyn GraphicsBackend,
    dc: DcHandle,
}

impl<'a> ScreenDc<'a> {
    fn acquire(backend: &'a dyn GraphicsBackend) -> PlatformResult<Self> {
        let dc = backend.acquire_screen_dc()?;
        Ok(Self { backend, dc })
    }
}

impl Drop for ScreenDc<'_> {
    fn drop(&mut self) {
        self.backend.release_screen_dc(self.dc);
    }
}

pub type SharedLayeredWindow = Rc<RefCell<LayeredWindow>>;

pub struct LayeredWindow {
    this: Weak<RefCell<LayeredWindow>>,
    backend: Rc<dyn GraphicsBackend>,
    left: Side,
    top: Side,
    right: Side,
    bottom: Side,
    target: Option<Rc<dyn HostWindow>>,
    theme: Option<Rc<Theme>>,
    maximum_size: Size,
    margin: Margin,
    opacity: u8,
    blend: BlendFunction,
    previous_size: Size,
    full_redrawing: bool,
    suspended: bool,
}

impl LayeredWindow {
    /*
     * Creates the four sides for a target that never grows beyond
     * `config.maximum_size` and subscribes to the target's geometry. Nothing
     * is drawn until the first tick.
     */
    pub fn new(
        backend: Rc<dyn GraphicsBackend>,
        target: Rc<dyn HostWindow>,
        theme: Rc<Theme>,
        config: FrameConfig,
    ) -> PlatformResult<SharedLayeredWindow> {
        let maximum_size = config.maximum_size;
        if maximum_size.width < theme.width() || maximum_size.height < theme.height() {
            return Err(PlatformError::Configuration(format!(
                "Maximum size {maximum_size:?} must not be smaller than the theme bitmap {:?}",
                theme.size()
            )));
        }

        // The frame as a whole is larger than the target it surrounds.
        let metrics = *theme.metrics();
        let margin = theme.margin() + config.margin;
        let frame_max = Size::new(
            maximum_size.width + metrics.horizontal_thickness() + margin.horizontal().abs(),
            maximum_size.height + metrics.vertical_thickness() + margin.vertical().abs(),
        );

        let left = Side::new(
            backend.clone(),
            Edge::Left,
            Size::new(metrics.left.width, frame_max.height),
        )?;
        let top = Side::new(
            backend.clone(),
            Edge::Top,
            Size::new(frame_max.width, metrics.top.height),
        )?;
        let right = Side::new(
            backend.clone(),
            Edge::Right,
            Size::new(metrics.right.width, frame_max.height),
        )?;
        let bottom = Side::new(
            backend.clone(),
            Edge::Bottom,
            Size::new(frame_max.width, metrics.bottom.height),
        )?;

        log::debug!(
            "LayeredWindow: created frame for {:?}, maximum target size {maximum_size:?}",
            target.handle()
        );

        let window = Rc::new_cyclic(|this| {
            RefCell::new(Self {
                this: this.clone(),
                backend,
                left,
                top,
                right,
                bottom,
                target: Some(target.clone()),
                theme: Some(theme),
                maximum_size,
                margin: config.margin,
                opacity: config.opacity,
                blend: BlendFunction::default(),
                previous_size: Size::default(),
                full_redrawing: true,
                suspended: true,
            })
        });
        {
            let mut frame = window.borrow_mut();
            target.watch_geometry(Some(frame.geometry_listener()))?;
            frame.resume(false)?;
        }
        Ok(window)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn margin(&self) -> Margin {
        self.margin
    }

    pub fn theme(&self) -> Option<&Rc<Theme>> {
        self.theme.as_ref()
    }

    pub fn target(&self) -> Option<&Rc<dyn HostWindow>> {
        self.target.as_ref()
    }

    /// Stops ticks until `resume` is called.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /*
     * Re-enables ticks, running one immediately when `perform_layout` is set.
     * Fails if the frame has no target or no theme to work with.
     */
    pub fn resume(&mut self, perform_layout: bool) -> PlatformResult<()> {
        if self.target.is_none() {
            return Err(PlatformError::Configuration(
                "Cannot resume a layered window without a target window".to_string(),
            ));
        }
        if self.theme.is_none() {
            return Err(PlatformError::Configuration(
                "Cannot resume a layered window without a theme".to_string(),
            ));
        }
        self.suspended = false;
        if perform_layout {
            self.update()?;
        }
        Ok(())
    }

    /// Changes the frame opacity. Always repaints every side.
    pub fn set_opacity(&mut self, opacity: u8) -> PlatformResult<()> {
        self.opacity = opacity;
        self.full_redrawing = true;
        self.update_unless_suspended()
    }

    /*
     * Changes the instance margin. Only the affected strips are repainted. A
     * margin that would make the frame around a maximum-size target larger
     * than the side surfaces is rejected.
     */
    pub fn set_margin(&mut self, margin: Margin) -> PlatformResult<()> {
        if let Some(theme) = &self.theme {
            self.ensure_frame_fits(theme, margin)?;
        }
        self.margin = margin;
        self.update_unless_suspended()
    }

    /*
     * Replaces the theme and requests a full redraw. The side surfaces were
     * sized for the first theme, so a replacement must not have thicker edges
     * or a larger bitmap.
     */
    pub fn set_theme(&mut self, theme: Option<Rc<Theme>>) -> PlatformResult<()> {
        if let Some(theme) = &theme {
            self.ensure_theme_fits(theme)?;
        }
        self.theme = theme;
        self.full_redrawing = true;
        if self.theme.is_some() {
            self.update_unless_suspended()?;
        }
        Ok(())
    }

    /// Follows another target window, moving the geometry subscription with it.
    pub fn set_target(&mut self, target: Option<Rc<dyn HostWindow>>) -> PlatformResult<()> {
        if let Some(previous) = self.target.take() {
            if let Err(err) = previous.watch_geometry(None) {
                log::warn!("LayeredWindow: failed to unwatch {:?}: {err}", previous.handle());
            }
        }
        self.target = target;
        let Some(target) = &self.target else {
            return Ok(());
        };
        target.watch_geometry(Some(self.geometry_listener()))?;
        log::debug!("LayeredWindow: now following {:?}", target.handle());
        self.update_unless_suspended()
    }

    /// Requests a full redraw of every side.
    pub fn invalidate(&mut self) -> PlatformResult<()> {
        self.full_redrawing = true;
        self.update_unless_suspended()
    }

    /*
     * Runs one tick against the target's current geometry. A failing native
     * call aborts the tick before the new size is recorded, so the next tick
     * retries the same work instead of assuming it happened.
     */
    pub fn update(&mut self) -> PlatformResult<()> {
        if self.suspended {
            return Ok(());
        }
        let (target, theme) = self.tick_inputs()?;
        let snapshot = target.snapshot()?;
        self.tick(target.as_ref(), &theme, snapshot)
    }

    // Listener path: the host already delivered the snapshot.
    fn update_with(&mut self, snapshot: GeometrySnapshot) -> PlatformResult<()> {
        if self.suspended {
            return Ok(());
        }
        let (target, theme) = self.tick_inputs()?;
        self.tick(target.as_ref(), &theme, snapshot)
    }

    fn tick_inputs(&self) -> PlatformResult<(Rc<dyn HostWindow>, Rc<Theme>)> {
        match (self.target.clone(), self.theme.clone()) {
            (Some(target), Some(theme)) => Ok((target, theme)),
            _ => {
                log::warn!("LayeredWindow: update requested without a target or theme");
                Err(PlatformError::Configuration(
                    "A layered window needs both a target window and a theme to update"
                        .to_string(),
                ))
            }
        }
    }

    fn tick(
        &mut self,
        target: &dyn HostWindow,
        theme: &Theme,
        snapshot: GeometrySnapshot,
    ) -> PlatformResult<()> {
        let metrics = theme.metrics();
        let bounds = frame_bounds(&snapshot, metrics, theme.margin() + self.margin);
        let (x, y) = (bounds.x, bounds.y);
        let (cx, cy) = (bounds.width, bounds.height);

        self.left.set_location(Point::new(x, y));
        self.top.set_location(Point::new(x, y));
        self.right
            .set_location(Point::new(x + cx - metrics.right.width, y));
        self.bottom
            .set_location(Point::new(x, y + cy - metrics.bottom.height));

        let visibility_changed = snapshot.visible != self.left.is_visible();
        let width_changed = cx != self.previous_size.width;
        let height_changed = cy != self.previous_size.height;
        let size_changed = width_changed || height_changed;
        let partial_change = width_changed != height_changed;

        let mut painted = false;
        if (size_changed || self.full_redrawing) && snapshot.visible {
            self.blend.source_constant_alpha = self.opacity;
            let screen = ScreenDc::acquire(self.backend.as_ref())?;
            let ctx = PaintContext {
                theme,
                screen_dc: screen.dc,
                blend: self.blend,
            };
            let full = self.full_redrawing;
            self.left.paint_left(metrics.left.width, cy, full, &ctx)?;
            self.top.paint_top(cx, metrics.top.height, full, &ctx)?;
            self.right.paint_right(metrics.right.width, cy, full, &ctx)?;
            self.bottom
                .paint_bottom(cx, metrics.bottom.height, full, &ctx)?;
            drop(screen);
            self.full_redrawing = false;
            painted = true;
        }

        if visibility_changed || !size_changed || partial_change {
            self.reposition_sides(target.handle(), snapshot.visible)?;
        }

        // A hidden target skips painting; keep the old size so showing it repaints.
        if painted || !size_changed {
            self.previous_size = Size::new(cx, cy);
        }
        log::debug!(
            "LayeredWindow: tick at ({x}, {y}) {cx}x{cy}, painted: {painted}, visibility changed: {visibility_changed}"
        );
        Ok(())
    }

    // Ticks this frame whenever the target reports new geometry.
    fn geometry_listener(&self) -> GeometryListener {
        let this = self.this.clone();
        Box::new(move |snapshot| {
            let Some(shared) = this.upgrade() else {
                return;
            };
            let Ok(mut window) = shared.try_borrow_mut() else {
                log::debug!("LayeredWindow: geometry change during a tick, skipped");
                return;
            };
            if let Err(err) = window.update_with(snapshot) {
                log::error!("LayeredWindow: tick after geometry change failed: {err}");
            }
        })
    }

    fn update_unless_suspended(&mut self) -> PlatformResult<()> {
        if self.suspended {
            Ok(())
        } else {
            self.update()
        }
    }

    // Moves the sides behind the target in chain order, showing or hiding them.
    fn reposition_sides(&self, target: WindowHandle, visible: bool) -> PlatformResult<()> {
        let show = if visible {
            ShowCommand::Show
        } else {
            ShowCommand::Hide
        };
        let mut insert_after = target;
        for side in [&self.left, &self.top, &self.right, &self.bottom] {
            self.backend.set_window_pos(
                side.handle(),
                insert_after,
                Reposition {
                    location: side.location(),
                    show,
                },
            )?;
            insert_after = side.handle();
        }
        Ok(())
    }

    fn ensure_frame_fits(&self, theme: &Theme, margin: Margin) -> PlatformResult<()> {
        let m = theme.metrics();
        let combined = theme.margin() + margin;
        let width = self.maximum_size.width + m.horizontal_thickness() + combined.horizontal();
        let height = self.maximum_size.height + m.vertical_thickness() + combined.vertical();
        if width > self.top.max_size().width || height > self.left.max_size().height {
            return Err(PlatformError::Configuration(format!(
                "Margin {margin:?} makes the frame {width}x{height}, larger than its side surfaces"
            )));
        }
        Ok(())
    }

    fn ensure_theme_fits(&self, theme: &Theme) -> PlatformResult<()> {
        let m = theme.metrics();
        let fits = theme.width() <= self.maximum_size.width
            && theme.height() <= self.maximum_size.height
            && m.left.width <= self.left.max_size().width
            && m.right.width <= self.right.max_size().width
            && m.top.height <= self.top.max_size().height
            && m.bottom.height <= self.bottom.max_size().height;
        if !fits {
            return Err(PlatformError::Configuration(format!(
                "Theme {:?} does not fit the side surfaces allocated for this window",
                theme.size()
            )));
        }
        self.ensure_frame_fits(theme, self.margin)
    }

    #[cfg(test)]
    fn side(&self, edge: Edge) -> &Side {
        match edge {
            Edge::Left => &self.left,
            Edge::Top => &self.top,
            Edge::Right => &self.right,
            Edge::Bottom => &self.bottom,
        }
    }
}

impl Drop for LayeredWindow {
    fn drop(&mut self) {
        self.suspended = true;
        if let Some(target) = self.target.take() {
            if let Err(err) = target.watch_geometry(None) {
                log::error!("LayeredWindow: failed to unwatch {:?}: {err}", target.handle());
            }
        }
        log::debug!("LayeredWindow: dropped, destroying side windows");
    }
}
