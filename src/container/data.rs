//! Labeled-axis data container for time-indexed numeric matrices.
//!
//! A [`DataContainer`] is a numeric matrix of any rank plus an ordered list
//! of [`AxisRole`]s naming what each axis means. The classic layouts are:
//!
//! - `[Time]` — a plain per-frame value array
//! - `[Data, Time]` — a feature matrix (rows = features, columns = frames)
//! - `[Data, Time, Sequence]` — a stack of fixed-length windows
//!
//! One generic container parameterized by axis roles replaces a per-rank
//! type hierarchy: axis relabeling is a physical transpose plus a swap in
//! the role list, and every time-axis operation (focus, statistics, frame
//! gather) looks the axis up by role.
//!
//! # Mutation discipline
//!
//! The matrix and the focus window are owned exclusively by the container.
//! The data setter invalidates the statistics cache; callers must not
//! mutate the matrix in place and expect the cache to stay valid.

use ndarray::{Array1, Array2, ArrayD, Axis, Slice};

use crate::container::focus::{FocusRange, FocusWindow, Rounding};
use crate::error::{PipelineError, Result};
use crate::processing::{Params, ProcessingChain};

/// Role of one matrix axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisRole {
    /// Feature dimension.
    Data,
    /// Frame (time) dimension.
    Time,
    /// Window index dimension added by sequencing.
    Sequence,
    /// Audio channel dimension.
    Channel,
}

impl std::fmt::Display for AxisRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AxisRole::Data => "data",
            AxisRole::Time => "time",
            AxisRole::Sequence => "sequence",
            AxisRole::Channel => "channel",
        };
        f.write_str(name)
    }
}

/// Basic statistics along the time axis.
///
/// Sum and sum-of-squares are kept alongside mean/std so accumulating
/// normalizers can merge statistics from many containers without a second
/// pass over the data.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    /// Per-feature mean.
    pub mean: ArrayD<f64>,
    /// Per-feature population standard deviation (ddof 0).
    pub std: ArrayD<f64>,
    /// Frame count the statistics were computed over.
    pub n: usize,
    /// Per-feature sum.
    pub s1: ArrayD<f64>,
    /// Per-feature sum of squares.
    pub s2: ArrayD<f64>,
}

/// Named, shaped numeric matrix with a time axis.
///
/// Carries a time resolution (seconds per frame, optional), a focus window,
/// a lazily computed statistics cache, free-form metadata, and a processing
/// chain recording how the data was produced.
#[derive(Debug, Clone)]
pub struct DataContainer {
    data: ArrayD<f64>,
    axes: Vec<AxisRole>,
    time_resolution: Option<f64>,
    focus: FocusWindow,
    stats: Option<Stats>,
    metadata: Params,
    processing_chain: ProcessingChain,
}

impl DataContainer {
    /// Create a container from a matrix and its axis roles.
    ///
    /// The role list must match the matrix rank and contain exactly one
    /// [`AxisRole::Time`]; no role may repeat.
    pub fn new(
        data: ArrayD<f64>,
        axes: Vec<AxisRole>,
        time_resolution: Option<f64>,
    ) -> Result<Self> {
        if axes.len() != data.ndim() {
            return Err(PipelineError::configuration(format!(
                "axis role count ({}) does not match matrix rank ({})",
                axes.len(),
                data.ndim()
            )));
        }

        for (i, role) in axes.iter().enumerate() {
            if axes[i + 1..].contains(role) {
                return Err(PipelineError::configuration(format!(
                    "duplicate axis role [{role}]"
                )));
            }
        }

        if !axes.contains(&AxisRole::Time) {
            return Err(PipelineError::configuration(
                "container requires a time axis",
            ));
        }

        Ok(Self {
            data,
            axes,
            time_resolution,
            focus: FocusWindow::new(),
            stats: None,
            metadata: Params::new(),
            processing_chain: ProcessingChain::new(),
        })
    }

    /// Create a rank-1 container (`[Time]`) from a value array.
    pub fn from_array(data: Array1<f64>, time_resolution: Option<f64>) -> Self {
        Self::new(data.into_dyn(), vec![AxisRole::Time], time_resolution)
            .expect("rank-1 time layout is always valid")
    }

    /// Create a rank-2 container (`[Data, Time]`) from a feature matrix.
    ///
    /// Rows are features, columns are frames.
    pub fn from_matrix(data: Array2<f64>, time_resolution: Option<f64>) -> Self {
        Self::new(
            data.into_dyn(),
            vec![AxisRole::Data, AxisRole::Time],
            time_resolution,
        )
        .expect("rank-2 data/time layout is always valid")
    }

    /// Attach a processing chain recording this container's provenance.
    pub fn with_chain(mut self, chain: ProcessingChain) -> Self {
        self.processing_chain = chain;
        self
    }

    /// Attach free-form metadata.
    pub fn with_metadata(mut self, metadata: Params) -> Self {
        self.metadata = metadata;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Raw data matrix.
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Replace the data matrix, invalidating the statistics cache.
    ///
    /// The new matrix must have the same rank as the current axis roles.
    pub fn set_data(&mut self, data: ArrayD<f64>) -> Result<()> {
        if data.ndim() != self.axes.len() {
            return Err(PipelineError::configuration(format!(
                "replacement matrix rank ({}) does not match axis roles ({})",
                data.ndim(),
                self.axes.len()
            )));
        }

        self.data = data;
        self.stats = None;
        Ok(())
    }

    /// Matrix shape.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Matrix rank.
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Ordered axis roles.
    pub fn axes(&self) -> &[AxisRole] {
        &self.axes
    }

    /// Index of the axis carrying the given role.
    pub fn axis_of(&self, role: AxisRole) -> Option<usize> {
        self.axes.iter().position(|r| *r == role)
    }

    /// Index of the time axis.
    pub fn time_axis(&self) -> usize {
        self.axis_of(AxisRole::Time)
            .expect("container invariant: time axis present")
    }

    /// Index of the feature axis, if any.
    pub fn data_axis(&self) -> Option<usize> {
        self.axis_of(AxisRole::Data)
    }

    /// Index of the sequence axis, if any.
    pub fn sequence_axis(&self) -> Option<usize> {
        self.axis_of(AxisRole::Sequence)
    }

    /// Number of frames (extent of the time axis).
    pub fn length(&self) -> usize {
        self.data.shape()[self.time_axis()]
    }

    /// Feature vector length (extent of the data axis, 1 for rank-1 data).
    pub fn vector_length(&self) -> usize {
        match self.data_axis() {
            Some(axis) => self.data.shape()[axis],
            None => 1,
        }
    }

    /// Seconds per frame, if tracked.
    pub fn time_resolution(&self) -> Option<f64> {
        self.time_resolution
    }

    /// Set the time resolution (seconds per frame).
    pub fn set_time_resolution(&mut self, time_resolution: Option<f64>) {
        self.time_resolution = time_resolution;
    }

    /// Free-form metadata.
    pub fn metadata(&self) -> &Params {
        &self.metadata
    }

    /// Mutable free-form metadata.
    pub fn metadata_mut(&mut self) -> &mut Params {
        &mut self.metadata
    }

    /// Processing chain recording this container's provenance.
    pub fn processing_chain(&self) -> &ProcessingChain {
        &self.processing_chain
    }

    /// Mutable processing chain.
    pub fn processing_chain_mut(&mut self) -> &mut ProcessingChain {
        &mut self.processing_chain
    }

    // ------------------------------------------------------------------
    // Time <-> frame conversion
    // ------------------------------------------------------------------

    /// Convert a time stamp in seconds to a frame index.
    ///
    /// The result is clamped into `[0, length]`. Fails when no time
    /// resolution is tracked.
    pub fn time_to_frame(&self, time: f64, rounding: Rounding) -> Result<usize> {
        let resolution = self.time_resolution.ok_or_else(|| {
            PipelineError::configuration("no time resolution set for time based conversion")
        })?;

        let raw = time / resolution;
        let frame = match rounding {
            Rounding::Truncate => raw.trunc(),
            Rounding::Floor => raw.floor(),
            Rounding::Ceil => raw.ceil(),
        };

        if frame <= 0.0 {
            Ok(0)
        } else {
            Ok((frame as usize).min(self.length()))
        }
    }

    /// Convert a frame index to a time stamp in seconds.
    pub fn frame_to_time(&self, frame: usize) -> Result<f64> {
        let resolution = self.time_resolution.ok_or_else(|| {
            PipelineError::configuration("no time resolution set for time based conversion")
        })?;

        Ok(frame as f64 * resolution)
    }

    // ------------------------------------------------------------------
    // Focus window
    // ------------------------------------------------------------------

    /// Current focus window state.
    pub fn focus(&self) -> &FocusWindow {
        &self.focus
    }

    /// Set the focus window from a frame- or second-based range.
    pub fn set_focus(&mut self, range: FocusRange) -> Result<()> {
        let length = self.length();

        let (start, stop) = match range {
            FocusRange::Frames { start, stop } => (start, stop),
            FocusRange::FrameSpan { start, duration } => (start, start + duration),
            FocusRange::Seconds { start, stop } => (
                self.time_to_frame(start, Rounding::Truncate)?,
                self.time_to_frame(stop, Rounding::Truncate)?,
            ),
            FocusRange::SecondsSpan { start, duration } => (
                self.time_to_frame(start, Rounding::Truncate)?,
                self.time_to_frame(start + duration, Rounding::Truncate)?,
            ),
        };

        self.focus.set(start, stop, length);
        Ok(())
    }

    /// Clear the focus window without altering the data.
    pub fn reset_focus(&mut self) {
        self.focus.clear();
    }

    /// Data restricted to the focus window along the time axis.
    ///
    /// Returns the full matrix when no window is set.
    pub fn get_focused(&self) -> ArrayD<f64> {
        if self.focus.is_set() {
            let (start, stop) = self.focus.resolve(self.length());
            self.data
                .slice_axis(Axis(self.time_axis()), Slice::from(start..stop))
                .to_owned()
        } else {
            self.data.clone()
        }
    }

    /// Commit the focus window: the focused view becomes the container's
    /// data and the window is cleared. Irreversible.
    pub fn freeze(&mut self) {
        if self.focus.is_set() {
            self.data = self.get_focused();
            self.stats = None;
            self.focus.clear();
        }
    }

    // ------------------------------------------------------------------
    // Frame access
    // ------------------------------------------------------------------

    /// Gather the given frames along the time axis, in order.
    ///
    /// Indices may repeat, and indices past the end clamp to the last
    /// frame (edge replication).
    pub fn get_frames(&self, frame_ids: &[usize]) -> Result<ArrayD<f64>> {
        let length = self.length();
        if length == 0 && !frame_ids.is_empty() {
            return Err(PipelineError::configuration(
                "cannot gather frames from empty data",
            ));
        }

        let ids: Vec<usize> = frame_ids.iter().map(|&id| id.min(length - 1)).collect();
        Ok(self.data.select(Axis(self.time_axis()), &ids))
    }

    /// Every `hop`-th frame along the time axis.
    pub fn get_frames_hopped(&self, hop: usize) -> Result<ArrayD<f64>> {
        if hop == 0 {
            return Err(PipelineError::configuration("frame hop must be > 0"));
        }

        Ok(self
            .data
            .slice_axis(Axis(self.time_axis()), Slice::new(0, None, hop as isize))
            .to_owned())
    }

    // ------------------------------------------------------------------
    // Axis relabeling
    // ------------------------------------------------------------------

    /// Swap two axes: physical transpose plus role-list bookkeeping.
    pub fn swap_axes(&mut self, a: usize, b: usize) -> Result<()> {
        let rank = self.ndim();
        for axis in [a, b] {
            if axis >= rank {
                return Err(PipelineError::AxisOutOfRank { axis, rank });
            }
        }

        self.data.swap_axes(a, b);
        self.axes.swap(a, b);
        self.stats = None;
        Ok(())
    }

    /// Transposed copy of a rank-2 container, with axis roles flipped.
    pub fn transposed(&self) -> Result<DataContainer> {
        if self.ndim() != 2 {
            return Err(PipelineError::configuration(
                "transpose is defined for rank-2 containers only",
            ));
        }

        let mut out = self.clone();
        out.swap_axes(0, 1)?;
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    /// Basic statistics along the time axis, computed lazily and cached
    /// until the data matrix is reassigned.
    pub fn stats(&mut self) -> &Stats {
        if self.stats.is_none() {
            self.stats = Some(self.calculate_stats());
        }

        self.stats.as_ref().expect("stats just computed")
    }

    fn calculate_stats(&self) -> Stats {
        let time_axis = Axis(self.time_axis());
        let n = self.length();

        let reduced_shape: Vec<usize> = self
            .data
            .shape()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.time_axis())
            .map(|(_, &d)| d)
            .collect();

        let mean = self
            .data
            .mean_axis(time_axis)
            .unwrap_or_else(|| ArrayD::zeros(reduced_shape.clone()));
        let std = if n > 0 {
            self.data.std_axis(time_axis, 0.0)
        } else {
            ArrayD::zeros(reduced_shape.clone())
        };
        let s1 = self.data.sum_axis(time_axis);
        let s2 = self.data.mapv(|v| v * v).sum_axis(time_axis);

        Stats {
            mean,
            std,
            n,
            s1,
            s2,
        }
    }
}
