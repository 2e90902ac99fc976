use crate::animator::Direction;
use crate::geometry::Point;
use crate::host::CarouselHost;
use crate::view::Carousel;
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use strum::{Display as StrumDisplay, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GestureState {
    Began,
    Changed,
    Ended,
    #[strum(to_string = "cancelled", serialize = "canceled")]
    Cancelled,
    Failed,
}

/// One pan sample. `translation` is the movement since the previous sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragSample {
    pub state: GestureState,
    #[serde(default)]
    pub translation: Point,
    #[serde(default)]
    pub velocity: Point,
}

impl DragSample {
    pub fn new(state: GestureState, translation_x: f64, velocity_x: f64) -> Self {
        Self {
            state,
            translation: Point::new(translation_x, 0.0),
            velocity: Point::new(velocity_x, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TapSample {
    pub state: GestureState,
    pub location: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LongPressSample {
    pub state: GestureState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
pub enum Recognizer {
    Drag,
    Tap,
    LongPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Tracking,
    /// Began mostly vertical; ignored until it ends so scrolling containers keep it.
    Rejected,
}

/// Only mostly-horizontal drags turn the carousel.
pub fn should_begin_drag(velocity: Point) -> bool {
    velocity.x.abs() > velocity.y.abs()
}

/// Whether `recognizer` may run while `other` is also recognizing.
pub fn recognizes_simultaneously(recognizer: Recognizer, other: Recognizer) -> bool {
    match (recognizer, other) {
        (Recognizer::Tap, Recognizer::Drag) | (Recognizer::Drag, Recognizer::Tap) => false,
        (a, b) => a != b,
    }
}

impl<H: CarouselHost> Carousel<H> {
    pub fn handle_drag(&mut self, sample: DragSample) {
        match sample.state {
            GestureState::Began => {
                if !should_begin_drag(sample.velocity) {
                    log::trace!("Drag rejected, velocity {:?}", sample.velocity);
                    self.drag = DragPhase::Rejected;
                    return;
                }
                self.drag = DragPhase::Tracking;
                self.cancel_auto_rotation();
            }
            GestureState::Changed => {
                if self.drag == DragPhase::Tracking {
                    self.rotate(sample.translation.x);
                }
            }
            GestureState::Ended | GestureState::Cancelled => {
                let tracking = self.drag == DragPhase::Tracking;
                self.drag = DragPhase::Idle;
                if !tracking {
                    return;
                }

                self.rotate(sample.translation.x);
                if sample.velocity.x.abs() > self.configuration.gestures.swipe_velocity_threshold
                {
                    self.complete_position(sample.velocity.x);
                } else {
                    self.center_position();
                }
            }
            GestureState::Failed => self.drag = DragPhase::Idle,
        }
    }

    pub fn handle_tap(&mut self, sample: TapSample) {
        if sample.state != GestureState::Ended {
            return;
        }
        if self.drag == DragPhase::Tracking {
            log::trace!("Tap suppressed by drag");
            return;
        }

        let Some(child) = self.children.get(self.current_index) else {
            return;
        };
        let Some(size) = self.current_slot_size else {
            return;
        };

        if child.layout.contains(size, sample.location) {
            let tag = child.tag;
            log::debug!("Item {} tapped", tag);
            self.notify(|d| d.item_tapped(tag));
        }
    }

    pub fn handle_long_press(&mut self, sample: LongPressSample) {
        match sample.state {
            GestureState::Began => {
                self.cancel_auto_rotation();
            }
            GestureState::Ended | GestureState::Cancelled | GestureState::Failed => {
                if self.animator.interruption().is_some() {
                    self.center_position();
                }
            }
            GestureState::Changed => {}
        }
    }

    /// Stops any auto-rotation where it is. Returns whether one was running.
    pub fn cancel_auto_rotation(&mut self) -> bool {
        self.animator.cancel()
    }

    pub fn rotate(&mut self, points: f64) {
        if self.children.len() < 2 {
            return;
        }
        self.rotation_angle += self.geometry().angle_for_points(points);
        self.set_needs_layout();
        self.layout_if_needed();
    }

    /// Inertial snap to the neighbour in the direction of `velocity` (points per second).
    pub fn complete_position(&mut self, velocity: f64) {
        let geometry = self.geometry();
        if self.rotation_angle == 0.0 || self.children.len() < 2 || !geometry.can_rotate() {
            return;
        }

        let gestures = &self.configuration.gestures;
        let width = self.bounds.width;
        let stride = geometry.angle_stride;

        let velocity = velocity / gestures.reference_round_width * width;
        let direction = Direction::of(velocity);
        // flicked against the lean of the angle, which already crossed to the new item
        let compensated = direction != Direction::of(self.rotation_angle);

        let effective_angle = if compensated {
            self.rotation_angle.abs() - stride
        } else {
            self.rotation_angle
        };
        let mut distance_to_complete = stride - effective_angle.abs();

        let interrupted = self.animator.take_interruption();
        if compensated && interrupted == Some(direction) {
            distance_to_complete += stride;
        }

        let min_velocity = gestures.min_velocity * width;
        let linear_velocity = match direction {
            Direction::Positive => velocity.max(min_velocity),
            Direction::Negative => velocity.min(-min_velocity),
        };

        let interval = gestures.timer_interval();
        let angle_increment =
            linear_velocity * interval.as_secs_f64() / geometry.rotation_radius;

        log::debug!(
            "Completing {} (compensated {}, interrupted {:?})",
            direction,
            compensated,
            interrupted
        );
        self.animator
            .start(angle_increment, distance_to_complete, 0.0, interval);
    }

    /// Snap back to the current item.
    pub fn center_position(&mut self) {
        let geometry = self.geometry();
        if self.animator.is_animating()
            || self.children.len() < 2
            || self.rotation_angle == 0.0
            || !geometry.can_rotate()
        {
            return;
        }

        let gestures = &self.configuration.gestures;
        let stride = geometry.angle_stride;
        let interval = gestures.timer_interval();

        let angle_increment = gestures.centering_velocity * self.bounds.width
            * interval.as_secs_f64()
            / geometry.rotation_radius;
        let signed_increment = if self.rotation_angle < 0.0 {
            angle_increment
        } else {
            -angle_increment
        };

        log::debug!("Centering from {:.4}", self.rotation_angle);
        self.animator.start(
            signed_increment,
            stride,
            stride - self.rotation_angle.abs(),
            interval,
        );
    }
}
