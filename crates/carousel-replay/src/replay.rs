use crate::trace::{Trace, TraceEvent};
use carousel::{
    Carousel, Configuration, HeadlessHost, ManualScheduler, Notification, RecordingDelegate, Size,
};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplaySettings {
    pub children: usize,
    pub bounds: Size,
    pub screen_scale: f64,
    pub max_ticks: usize,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            children: 5,
            bounds: Size::new(375.0, 200.0),
            screen_scale: 2.0,
            max_ticks: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub notifications: Vec<Notification>,
    pub current_index: usize,
    pub rotation_angle: f64,
    pub ticks: usize,
    pub animating: bool,
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for notification in &self.notifications {
            writeln!(f, "{}", notification)?;
        }
        write!(
            f,
            "current item {}, angle {:.6}, {} ticks",
            self.current_index, self.rotation_angle, self.ticks
        )?;
        if self.animating {
            write!(f, " (still animating)")?;
        }
        Ok(())
    }
}

/// Drives a headless carousel through a recorded trace with a hand-cranked timer.
pub struct Replay {
    carousel: Carousel<HeadlessHost>,
    delegate: Rc<RecordingDelegate>,
    max_ticks: usize,
    ticks: usize,
}

impl Replay {
    pub fn new(configuration: Configuration, settings: ReplaySettings) -> anyhow::Result<Self> {
        let mut carousel = Carousel::new(
            HeadlessHost::new(settings.screen_scale),
            Box::new(ManualScheduler::new()),
        );
        carousel.set_configuration(configuration)?;

        let delegate = Rc::new(RecordingDelegate::default());
        carousel.set_delegate(&delegate);
        carousel.set_bounds(settings.bounds);
        for _ in 0..settings.children {
            carousel.add_child();
        }
        carousel.layout_if_needed();

        Ok(Self {
            carousel,
            delegate,
            max_ticks: settings.max_ticks,
            ticks: 0,
        })
    }

    pub fn carousel(&self) -> &Carousel<HeadlessHost> {
        &self.carousel
    }

    pub fn apply(&mut self, event: TraceEvent) {
        log::trace!("Replaying {:?}", event);
        match event {
            TraceEvent::Drag(sample) => self.carousel.handle_drag(sample),
            TraceEvent::Tap(sample) => self.carousel.handle_tap(sample),
            TraceEvent::LongPress(sample) => self.carousel.handle_long_press(sample),
            TraceEvent::Ticks(count) => {
                for _ in 0..count {
                    let Some(run) = self.carousel.active_run() else {
                        break;
                    };
                    self.carousel.tick(run);
                    self.ticks += 1;
                }
            }
            TraceEvent::Settle => self.ticks += self.carousel.settle(self.max_ticks),
        }
    }

    pub fn run(mut self, events: impl IntoIterator<Item = TraceEvent>) -> ReplayReport {
        for event in events {
            self.apply(event);
        }
        self.report()
    }

    pub fn report(&self) -> ReplayReport {
        ReplayReport {
            notifications: self.delegate.notifications(),
            current_index: self.carousel.current_index(),
            rotation_angle: self.carousel.rotation_angle(),
            ticks: self.ticks,
            animating: self.carousel.is_animating(),
        }
    }
}

/// Settings from the command line, overridden by whatever the trace itself records.
pub fn settings_for(trace: &Trace, defaults: ReplaySettings) -> ReplaySettings {
    ReplaySettings {
        children: trace.children.unwrap_or(defaults.children),
        bounds: trace.bounds.unwrap_or(defaults.bounds),
        ..defaults
    }
}
