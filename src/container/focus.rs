//! Focus window state shared by all time-series containers.
//!
//! A focus window is a half-open `[start, stop)` sub-range of a container's
//! time axis. It describes which part of the stored matrix read operations
//! should see, without touching the stored data itself. The invariant is
//! `0 <= start <= stop <= length`: endpoints are clamped into range and a
//! reversed pair is automatically swapped, so the window is always
//! non-decreasing.

/// How to turn a time stamp in seconds into a frame index.
///
/// The asymmetry matters for overlap computations: selecting exactly the
/// frames an event occupies uses [`Rounding::Floor`] for the onset and
/// [`Rounding::Ceil`] for the offset, so a sub-frame event never loses its
/// only frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Truncate toward zero.
    Truncate,
    /// Round down.
    Floor,
    /// Round up.
    Ceil,
}

/// A focus request, in frames or in seconds.
///
/// Exactly one combination is expressible by construction; second-based
/// variants are converted through the container's time resolution.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusRange {
    /// Start and stop frame indices.
    Frames { start: usize, stop: usize },
    /// Start frame index plus frame count.
    FrameSpan { start: usize, duration: usize },
    /// Start and stop time stamps in seconds.
    Seconds { start: f64, stop: f64 },
    /// Start time stamp plus duration in seconds.
    SecondsSpan { start: f64, duration: f64 },
}

/// Per-container focus window state.
///
/// Unset endpoints mean full extent. The window is resolved against the
/// container's current length at read time, so shrinking the data after
/// setting a window cannot produce an out-of-range view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusWindow {
    start: Option<usize>,
    stop: Option<usize>,
}

impl FocusWindow {
    /// Create an unset window (full extent).
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a window has been set.
    pub fn is_set(&self) -> bool {
        self.start.is_some() || self.stop.is_some()
    }

    /// Window start, if set.
    pub fn start(&self) -> Option<usize> {
        self.start
    }

    /// Window stop, if set.
    pub fn stop(&self) -> Option<usize> {
        self.stop
    }

    /// Set the window to `[start, stop)`, clamped into `[0, length]`.
    ///
    /// A reversed pair is swapped, keeping the two values non-decreasing.
    pub fn set(&mut self, start: usize, stop: usize, length: usize) {
        let mut start = start.min(length);
        let mut stop = stop.min(length);

        if stop < start {
            std::mem::swap(&mut start, &mut stop);
        }

        self.start = Some(start);
        self.stop = Some(stop);
    }

    /// Clear the window, returning to full extent.
    pub fn clear(&mut self) {
        self.start = None;
        self.stop = None;
    }

    /// Resolve the window against the container length.
    ///
    /// Unset endpoints default to `0` and `length`.
    pub fn resolve(&self, length: usize) -> (usize, usize) {
        let start = self.start.unwrap_or(0).min(length);
        let stop = self.stop.unwrap_or(length).min(length);

        if stop < start {
            (stop, start)
        } else {
            (start, stop)
        }
    }
}
