pub mod animator;
pub mod config;
pub mod events;
pub mod geometry;
pub mod gesture;
pub mod host;
pub mod ordering;
pub mod sys;
pub mod view;

pub use crate::animator::{ManualScheduler, RotationAnimator, RunId, TickOutcome, TickScheduler};
pub use crate::config::Configuration;
pub use crate::events::CarouselEvent;
pub use crate::geometry::{Point, Size, SlotGeometry};
pub use crate::gesture::{DragSample, GestureState, LongPressSample, TapSample};
pub use crate::host::{CarouselHost, ChildLayout, HeadlessHost, Notification, RecordingDelegate};
pub use crate::view::{Carousel, CarouselDelegate};
