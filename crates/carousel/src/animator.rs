use crate::geometry::QUARTER_CIRCLE;
use derive_more::{Display, From, Into};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use strum::Display as StrumDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("run#{_0}")]
pub struct RunId(u64);

/// Sign of a rotation. Positive angles move slots to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    pub fn of(value: f64) -> Self {
        if value < 0.0 {
            Self::Negative
        } else {
            Self::Positive
        }
    }

    pub fn signum(&self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }
}

/// Source of repeating ticks for an animation run. Each tick must come back to the owner as
/// `tick(run)` on the UI thread.
pub trait TickScheduler {
    fn schedule(&mut self, run: RunId, interval: Duration);
    fn cancel(&mut self, run: RunId);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleLog {
    pub active: Vec<RunId>,
    pub scheduled: Vec<(RunId, Duration)>,
    pub cancelled: Vec<RunId>,
}

/// Scheduler that never fires on its own. Whoever holds a clone decides when ticks happen,
/// which makes replays and tests deterministic.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    log: Arc<Mutex<ScheduleLog>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.log.lock().active.last().copied()
    }

    pub fn active_count(&self) -> usize {
        self.log.lock().active.len()
    }

    pub fn log(&self) -> ScheduleLog {
        self.log.lock().clone()
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule(&mut self, run: RunId, interval: Duration) {
        let mut log = self.log.lock();
        log.active.push(run);
        log.scheduled.push((run, interval));
    }

    fn cancel(&mut self, run: RunId) {
        let mut log = self.log.lock();
        log.active.retain(|r| *r != run);
        log.cancelled.push(run);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationRun {
    pub id: RunId,
    pub distance_to_complete: f64,
    pub distance_passed: f64,
    /// Magnitude of the undamped per-tick increment.
    pub increment: f64,
    pub direction: Direction,
}

impl AnimationRun {
    pub fn is_complete(&self) -> bool {
        self.distance_passed >= self.distance_to_complete
    }

    /// Cosine ease-out. Never steps past the target, never below `floor`.
    fn next_step(&self, floor: f64) -> f64 {
        let passed = self.distance_passed / self.distance_to_complete;
        let remaining = self.distance_to_complete - self.distance_passed;
        let eased = self.increment * (QUARTER_CIRCLE * passed).cos();
        eased.min(remaining).max(floor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick belongs to a run that is no longer active.
    Stale,
    Continue,
    Finished,
}

pub struct RotationAnimator {
    scheduler: Box<dyn TickScheduler>,
    run: Option<AnimationRun>,
    next_id: u64,
    interrupted: Option<Direction>,
}

impl std::fmt::Debug for RotationAnimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationAnimator")
            .field("run", &self.run)
            .field("interrupted", &self.interrupted)
            .finish_non_exhaustive()
    }
}

impl RotationAnimator {
    pub fn new(scheduler: Box<dyn TickScheduler>) -> Self {
        Self {
            scheduler,
            run: None,
            next_id: 0,
            interrupted: None,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.run.is_some()
    }

    pub fn run(&self) -> Option<&AnimationRun> {
        self.run.as_ref()
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.run.map(|r| r.id)
    }

    /// Direction of the last run stopped by `cancel`, until a run finishes or the value is taken.
    pub fn interruption(&self) -> Option<Direction> {
        self.interrupted
    }

    pub fn take_interruption(&mut self) -> Option<Direction> {
        self.interrupted.take()
    }

    /// Replaces any running animation. Returns `None` when there is nothing left to cover.
    pub fn start(
        &mut self,
        angle_increment: f64,
        distance_to_complete: f64,
        already_passed: f64,
        interval: Duration,
    ) -> Option<RunId> {
        if let Some(previous) = self.run.take() {
            log::debug!("{} replaced before finishing", previous.id);
            self.scheduler.cancel(previous.id);
        }

        let already_passed = already_passed.max(0.0);
        if !(distance_to_complete > 0.0)
            || !distance_to_complete.is_finite()
            || already_passed >= distance_to_complete
            || !(angle_increment.abs() > 0.0)
            || !angle_increment.is_finite()
        {
            log::debug!(
                "Nothing to animate (increment {}, distance {}, passed {})",
                angle_increment,
                distance_to_complete,
                already_passed
            );
            return None;
        }

        let id = RunId(self.next_id);
        self.next_id += 1;

        self.run = Some(AnimationRun {
            id,
            distance_to_complete,
            distance_passed: already_passed,
            increment: angle_increment.abs(),
            direction: Direction::of(angle_increment),
        });
        self.scheduler.schedule(id, interval);

        log::debug!(
            "{} started: {} {:.4} rad, step {:.4}",
            id,
            Direction::of(angle_increment),
            distance_to_complete - already_passed,
            angle_increment.abs()
        );
        Some(id)
    }

    /// Advances `rotation_angle` by one step of the active run. `one_pixel` is the length of a
    /// device pixel in points.
    pub fn tick(
        &mut self,
        id: RunId,
        rotation_angle: &mut f64,
        rotation_radius: f64,
        one_pixel: f64,
    ) -> TickOutcome {
        let Some(run) = self.run.as_mut().filter(|r| r.id == id) else {
            log::trace!("Ignoring stale tick of {}", id);
            return TickOutcome::Stale;
        };

        if !(rotation_radius > 0.0) || !rotation_radius.is_finite() {
            log::debug!("{} stopped, geometry collapsed", id);
            self.finish();
            return TickOutcome::Finished;
        }

        let step = run.next_step(one_pixel / rotation_radius);
        *rotation_angle += run.direction.signum() * step;
        run.distance_passed += step;

        log::trace!(
            "{} tick: angle {:.5}, passed {:.5}/{:.5}",
            id,
            rotation_angle,
            run.distance_passed,
            run.distance_to_complete
        );

        // a resumed flick can carry the angle through zero mid-run, so rest also needs the
        // remaining distance to be under a pixel
        let remaining = run.distance_to_complete - run.distance_passed;
        if rotation_angle.abs() * rotation_radius < one_pixel
            && remaining * rotation_radius < one_pixel
        {
            *rotation_angle = 0.0;
            self.finish();
            TickOutcome::Finished
        } else if run.is_complete() {
            self.finish();
            TickOutcome::Finished
        } else {
            TickOutcome::Continue
        }
    }

    /// Stops the active run where it is and remembers its direction.
    pub fn cancel(&mut self) -> bool {
        match self.run.take() {
            Some(run) => {
                self.scheduler.cancel(run.id);
                self.interrupted = Some(run.direction);
                log::debug!("{} cancelled", run.id);
                true
            }
            None => false,
        }
    }

    fn finish(&mut self) {
        if let Some(run) = self.run.take() {
            self.scheduler.cancel(run.id);
            self.interrupted = None;
            log::debug!("{} finished", run.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(16);

    fn animator() -> (RotationAnimator, ManualScheduler) {
        let scheduler = ManualScheduler::new();
        (RotationAnimator::new(Box::new(scheduler.clone())), scheduler)
    }

    fn run_to_end(
        animator: &mut RotationAnimator,
        angle: &mut f64,
        radius: f64,
    ) -> (TickOutcome, usize) {
        let mut ticks = 0;
        while let Some(id) = animator.active_run() {
            ticks += 1;
            let outcome = animator.tick(id, angle, radius, 1.0);
            if outcome == TickOutcome::Finished {
                return (outcome, ticks);
            }
            assert!(ticks < 10_000, "animation never terminated");
        }
        (TickOutcome::Stale, ticks)
    }

    #[test]
    fn test_centering_snaps_to_zero() {
        let (mut animator, scheduler) = animator();
        let mut angle = -0.4;
        let stride = std::f64::consts::FRAC_PI_2;

        animator.start(0.05, stride, stride - 0.4, INTERVAL);
        assert_eq!(scheduler.active_count(), 1);

        let (outcome, _) = run_to_end(&mut animator, &mut angle, 400.0);
        assert_eq!(outcome, TickOutcome::Finished);
        assert_eq!(angle, 0.0);
        assert!(!animator.is_animating());
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_steps_decelerate_without_overshoot() {
        let (mut animator, _) = animator();
        let mut angle = 0.6;
        let id = animator.start(-0.1, 0.6, 0.0, INTERVAL).unwrap();

        let mut previous_step = f64::MAX;
        let mut previous_angle = angle;
        while animator.tick(id, &mut angle, 400.0, 1.0) == TickOutcome::Continue {
            let step = previous_angle - angle;
            assert!(step > 0.0);
            assert!(step <= previous_step + 1e-12);
            assert!(angle > -1e-9);
            previous_step = step;
            previous_angle = angle;
        }
        assert_eq!(angle, 0.0);
    }

    #[test]
    fn test_pixel_floor_guarantees_progress() {
        let (mut animator, _) = animator();
        // a tiny increment would crawl forever without the one pixel floor
        let mut angle = 0.2;
        animator.start(-1e-9, 0.2, 0.0, INTERVAL);

        let (outcome, ticks) = run_to_end(&mut animator, &mut angle, 100.0);
        assert_eq!(outcome, TickOutcome::Finished);
        assert!(ticks <= 21, "took {ticks} ticks");
        assert_eq!(angle, 0.0);
    }

    #[test]
    fn test_zero_distance_is_complete() {
        let (mut animator, scheduler) = animator();
        assert_eq!(animator.start(0.1, 0.0, 0.0, INTERVAL), None);
        assert_eq!(animator.start(0.1, 1.0, 1.0, INTERVAL), None);
        assert_eq!(animator.start(0.0, 1.0, 0.0, INTERVAL), None);
        assert_eq!(animator.start(f64::NAN, 1.0, 0.0, INTERVAL), None);
        assert!(!animator.is_animating());
        assert!(scheduler.log().scheduled.is_empty());
    }

    #[test]
    fn test_second_start_replaces_first() {
        let (mut animator, scheduler) = animator();
        let first = animator.start(0.2, 1.0, 0.0, INTERVAL).unwrap();
        let second = animator.start(-0.05, 1.0, 0.0, Duration::from_millis(8)).unwrap();

        assert_ne!(first, second);
        assert_eq!(scheduler.active_count(), 1);
        assert_eq!(scheduler.active_run(), Some(second));
        assert_eq!(scheduler.log().cancelled, vec![first]);

        let mut angle = 0.5;
        assert_eq!(
            animator.tick(first, &mut angle, 400.0, 1.0),
            TickOutcome::Stale
        );
        assert_eq!(angle, 0.5);

        assert_eq!(
            animator.tick(second, &mut angle, 400.0, 1.0),
            TickOutcome::Continue
        );
        assert!((angle - 0.45).abs() < 1e-12);
        // a replaced run is not an interruption
        assert_eq!(animator.interruption(), None);
    }

    #[test]
    fn test_cancel_keeps_partial_angle() {
        let (mut animator, scheduler) = animator();
        let id = animator.start(-0.1, 1.0, 0.0, INTERVAL).unwrap();
        let mut angle = 0.8;
        animator.tick(id, &mut angle, 400.0, 1.0);
        let partial = angle;

        assert!(animator.cancel());
        assert_eq!(animator.interruption(), Some(Direction::Negative));
        assert_eq!(scheduler.active_count(), 0);
        assert_eq!(animator.tick(id, &mut angle, 400.0, 1.0), TickOutcome::Stale);
        assert_eq!(angle, partial);
        assert!(!animator.cancel());
    }

    #[test]
    fn test_finish_clears_interruption() {
        let (mut animator, _) = animator();
        animator.start(0.1, 1.0, 0.0, INTERVAL);
        animator.cancel();
        assert!(animator.interruption().is_some());

        let mut angle = -0.05;
        animator.start(0.1, 1.0, 0.95, INTERVAL);
        run_to_end(&mut animator, &mut angle, 400.0);
        assert_eq!(animator.interruption(), None);
    }

    #[test]
    fn test_collapsed_geometry_stops_run() {
        let (mut animator, _) = animator();
        let id = animator.start(0.1, 1.0, 0.0, INTERVAL).unwrap();
        let mut angle = 0.3;
        assert_eq!(
            animator.tick(id, &mut angle, 0.0, 1.0),
            TickOutcome::Finished
        );
        assert_eq!(angle, 0.3);
    }

    #[test]
    fn test_direction_of() {
        assert_eq!(Direction::of(-0.1), Direction::Negative);
        assert_eq!(Direction::of(0.3), Direction::Positive);
        assert_eq!(Direction::Negative.to_string(), "negative");
    }
}
