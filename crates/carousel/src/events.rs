use crate::animator::RunId;

/// Events fed back into the carousel from outside the UI thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselEvent {
    Tick(RunId),
    ConfigReload,
}
