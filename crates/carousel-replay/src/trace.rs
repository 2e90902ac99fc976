use carousel::{DragSample, LongPressSample, Size, TapSample};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Trace parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("No trace named '{0}' in the data directories")]
    NotFound(String),
}

/// One recorded input, applied in order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEvent {
    Drag(DragSample),
    Tap(TapSample),
    LongPress(LongPressSample),
    /// Deliver this many timer ticks to whatever run is active.
    Ticks(usize),
    /// Tick until the carousel comes to rest.
    Settle,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub children: Option<usize>,
    #[serde(default)]
    pub bounds: Option<Size>,
    #[serde(default)]
    pub events: Vec<TraceEvent>,
}

pub fn parse_trace(text: &str) -> Result<Trace, TraceError> {
    Ok(serde_json::from_str(text)?)
}

/// Anything that is not an existing file is looked up under `carousel/traces/` in the XDG
/// data directories, with and without a `.json` extension.
pub fn resolve_trace(name: &str) -> Result<PathBuf, TraceError> {
    let path = Path::new(name);
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    let dirs = xdg::BaseDirectories::with_prefix("carousel");
    [format!("traces/{}", name), format!("traces/{}.json", name)]
        .iter()
        .find_map(|candidate| dirs.find_data_file(candidate))
        .ok_or_else(|| TraceError::NotFound(name.to_string()))
}

pub fn load_trace(name: &str) -> Result<Trace, TraceError> {
    let path = resolve_trace(name)?;
    log::debug!("Loading trace from {:?}", path);
    parse_trace(&fs_err::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carousel::{GestureState, Point};
    use std::io::Write;

    #[test]
    fn test_parse_trace() {
        let trace = parse_trace(
            r#"{
                "children": 5,
                "bounds": {"width": 1000.0, "height": 600.0},
                "events": [
                    {"drag": {"state": "began", "velocity": {"x": -900.0, "y": 0.0}}},
                    {"drag": {"state": "changed", "translation": {"x": -400.0, "y": 0.0}}},
                    {"drag": {"state": "ended", "velocity": {"x": -900.0, "y": 0.0}}},
                    {"ticks": 3},
                    "settle",
                    {"tap": {"state": "ended", "location": {"x": 500.0, "y": 300.0}}},
                    {"long_press": {"state": "Canceled"}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(trace.children, Some(5));
        assert_eq!(trace.bounds, Some(Size::new(1000.0, 600.0)));
        assert_eq!(trace.events.len(), 7);
        assert_eq!(
            trace.events[1],
            TraceEvent::Drag(DragSample::new(GestureState::Changed, -400.0, 0.0))
        );
        assert_eq!(trace.events[3], TraceEvent::Ticks(3));
        assert_eq!(trace.events[4], TraceEvent::Settle);
        assert_eq!(
            trace.events[5],
            TraceEvent::Tap(TapSample {
                state: GestureState::Ended,
                location: Point::new(500.0, 300.0),
            })
        );
        assert_eq!(
            trace.events[6],
            TraceEvent::LongPress(LongPressSample {
                state: GestureState::Cancelled,
            })
        );
    }

    #[test]
    fn test_empty_trace() {
        let trace = parse_trace("{}").unwrap();
        assert_eq!(trace, Trace::default());
    }

    #[test]
    fn test_bad_event_is_parse_error() {
        let err = parse_trace(r#"{"events": [{"pinch": 2}]}"#).unwrap_err();
        assert!(matches!(err, TraceError::Parse(_)));
    }

    #[test]
    fn test_load_trace_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"children": 3, "events": ["settle"]}}"#).unwrap();

        let trace = load_trace(file.path().to_str().unwrap()).unwrap();
        assert_eq!(trace.children, Some(3));
        assert_eq!(trace.events, vec![TraceEvent::Settle]);
    }

    #[test]
    fn test_missing_trace_not_found() {
        let err = load_trace("no-such-trace-7c1e5f").unwrap_err();
        assert!(matches!(err, TraceError::NotFound(name) if name == "no-such-trace-7c1e5f"));
    }
}
