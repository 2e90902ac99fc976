use crate::animator::{RotationAnimator, RunId, TickOutcome, TickScheduler};
use crate::config::{self, ConfigError, Configuration};
use crate::events::CarouselEvent;
use crate::geometry::{Size, SlotGeometry};
use crate::gesture::DragPhase;
use crate::host::{CarouselHost, ChildLayout};
use crate::ordering;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

pub trait CarouselDelegate {
    fn did_swipe_to_item(&self, index: usize);
    fn item_tapped(&self, index: usize);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ChildRecord {
    pub(crate) tag: usize,
    pub(crate) layout: ChildLayout,
}

/// Children arranged around a virtual circle, turned by drags and settled by the animator.
///
/// All mutation happens on the thread that owns the carousel. Timer ticks arrive as
/// [`CarouselEvent::Tick`] and are applied through [`Carousel::handle_event`].
pub struct Carousel<H: CarouselHost> {
    pub(crate) host: H,
    pub(crate) configuration: Configuration,
    /// File reloaded on [`CarouselEvent::ConfigReload`]. `None` means the user config.
    pub(crate) config_source: Option<PathBuf>,
    pub(crate) delegate: Option<Weak<dyn CarouselDelegate>>,
    pub(crate) bounds: Size,
    pub(crate) children: Vec<ChildRecord>,
    pub(crate) current_index: usize,
    pub(crate) rotation_angle: f64,
    pub(crate) current_slot_size: Option<Size>,
    pub(crate) animator: RotationAnimator,
    pub(crate) drag: DragPhase,
    pub(crate) needs_layout: bool,
}

impl<H: CarouselHost> Carousel<H> {
    pub fn new(host: H, scheduler: Box<dyn TickScheduler>) -> Self {
        Self {
            host,
            configuration: Configuration::default(),
            config_source: None,
            delegate: None,
            bounds: Size::ZERO,
            children: Vec::new(),
            current_index: 0,
            rotation_angle: 0.0,
            current_slot_size: None,
            animator: RotationAnimator::new(scheduler),
            drag: DragPhase::Idle,
            needs_layout: true,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Invalid configurations are rejected and the current one stays in effect.
    pub fn set_configuration(&mut self, configuration: Configuration) -> Result<(), ConfigError> {
        if let Err(e) = configuration.validate() {
            log::warn!("Rejected configuration: {}", e);
            return Err(e);
        }
        self.configuration = configuration;
        self.set_needs_layout();
        self.layout_if_needed();
        Ok(())
    }

    pub fn config_source(&self) -> Option<&Path> {
        self.config_source.as_deref()
    }

    pub fn set_config_source(&mut self, path: impl Into<PathBuf>) {
        self.config_source = Some(path.into());
    }

    /// The carousel only keeps a weak reference; the caller owns the delegate.
    pub fn set_delegate<D: CarouselDelegate + 'static>(&mut self, delegate: &Rc<D>) {
        let delegate: Rc<dyn CarouselDelegate> = delegate.clone();
        self.delegate = Some(Rc::downgrade(&delegate));
    }

    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Size) {
        if self.bounds != bounds {
            self.bounds = bounds;
            self.set_needs_layout();
        }
        self.layout_if_needed();
    }

    /// Appends a child and returns its tag, which is its insertion index.
    pub fn add_child(&mut self) -> usize {
        let tag = self.children.len();
        self.host.apply_shadow(tag, &self.configuration.shadow);
        if let Some(size) = self.current_slot_size {
            self.host.set_child_size(tag, size);
        }
        self.children.push(ChildRecord {
            tag,
            layout: ChildLayout::default(),
        });
        log::debug!("Child {} added", tag);

        self.set_needs_layout();
        self.layout_if_needed();
        tag
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child_layout(&self, tag: usize) -> Option<ChildLayout> {
        self.children.get(tag).map(|c| c.layout)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }

    pub fn slot_size(&self) -> Option<Size> {
        self.current_slot_size
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.animator.active_run()
    }

    pub fn geometry(&self) -> SlotGeometry {
        SlotGeometry::calculate(
            self.bounds,
            &self.configuration.geometry,
            self.children.len(),
        )
    }

    pub(crate) fn one_pixel(&self) -> f64 {
        let scale = self.host.screen_scale();
        if scale > 0.0 && scale.is_finite() {
            1.0 / scale
        } else {
            1.0
        }
    }

    pub fn set_needs_layout(&mut self) {
        self.needs_layout = true;
    }

    pub fn layout_if_needed(&mut self) {
        if self.needs_layout {
            self.layout();
        }
    }

    /// Places every child for the current rotation angle and picks the new current item.
    pub fn layout(&mut self) {
        self.needs_layout = false;

        let geometry = self.geometry();
        let stride = geometry.angle_stride;
        let previous_index = self.current_index;

        self.update_slot_size_if_needed(geometry.slot_size);

        let order = ordering::visible_order(
            self.current_index,
            geometry.slots_per_circle,
            self.children.len(),
        );

        for tag in 0..self.children.len() {
            let Some(slot) = ordering::slot_of(&order, tag) else {
                let layout = ChildLayout {
                    hidden: true,
                    ..self.children[tag].layout
                };
                self.apply_layout(tag, layout);
                continue;
            };

            let angle = geometry.slot_angle(slot, self.rotation_angle);
            self.apply_layout(
                tag,
                ChildLayout {
                    center: geometry.slot_center(angle),
                    scale: geometry.slot_scale(angle),
                    hidden: geometry.is_hidden(angle),
                },
            );

            if geometry.is_frontmost(angle) {
                self.host.bring_to_front(tag);
                self.set_current_index(tag);
            }
        }

        if self.current_index != previous_index {
            self.compensate_rotation_angle(stride);
        }
    }

    fn apply_layout(&mut self, tag: usize, layout: ChildLayout) {
        self.children[tag].layout = layout;
        self.host.apply_child_layout(tag, &layout);
    }

    fn update_slot_size_if_needed(&mut self, slot_size: Size) {
        if self.current_slot_size == Some(slot_size) {
            return;
        }
        for child in &self.children {
            self.host.set_child_size(child.tag, slot_size);
        }
        log::debug!(
            "Slot size {:.1}x{:.1}",
            slot_size.width,
            slot_size.height
        );
        self.current_slot_size = Some(slot_size);
    }

    fn set_current_index(&mut self, index: usize) {
        if self.current_index == index {
            return;
        }
        log::debug!("Current item {} -> {}", self.current_index, index);
        self.current_index = index;
        self.notify(|d| d.did_swipe_to_item(index));
    }

    /// Keeps the angle within one stride of the new current item.
    fn compensate_rotation_angle(&mut self, stride: f64) {
        if self.rotation_angle > 0.0 {
            self.rotation_angle -= stride;
        } else {
            self.rotation_angle += stride;
        }
    }

    pub(crate) fn notify(&self, f: impl FnOnce(&dyn CarouselDelegate)) {
        if let Some(delegate) = self.delegate.as_ref().and_then(Weak::upgrade) {
            f(delegate.as_ref());
        }
    }

    /// Applies one animation tick and lays out again.
    pub fn tick(&mut self, run: RunId) -> TickOutcome {
        let radius = self.geometry().rotation_radius;
        let one_pixel = self.one_pixel();
        let outcome = self
            .animator
            .tick(run, &mut self.rotation_angle, radius, one_pixel);

        if outcome != TickOutcome::Stale {
            self.set_needs_layout();
            self.layout_if_needed();
        }
        outcome
    }

    /// Ticks the active animation until it ends or `max_ticks` is reached. Returns the number
    /// of ticks applied.
    pub fn settle(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks {
            let Some(run) = self.animator.active_run() else {
                break;
            };
            self.tick(run);
            ticks += 1;
        }
        if self.is_animating() {
            log::warn!("Animation still running after {} ticks", ticks);
        }
        ticks
    }

    pub fn handle_event(&mut self, event: CarouselEvent) {
        match event {
            CarouselEvent::Tick(run) => {
                self.tick(run);
            }
            CarouselEvent::ConfigReload => {
                let loaded = match &self.config_source {
                    Some(path) => config::load_config_from(path),
                    None => config::load_config(),
                };
                match loaded {
                    Ok(configuration) => {
                        if self.set_configuration(configuration).is_ok() {
                            log::info!("Configuration reloaded");
                        }
                    }
                    Err(e) => log::error!("Failed to reload config: {}", e),
                }
            }
        }
    }
}
