//! Fixed-length window extraction from feature matrices.
//!
//! The [`Sequencer`] cuts a `[Data, Time]` matrix into fixed-length
//! windows placed every `hop` frames and stacks them along a new trailing
//! sequence axis, producing a `[Data, Time, Sequence]` container. Window
//! placement can be shifted between runs for augmentation, either by
//! rotating the matrix (`roll`) or by offsetting the first window start
//! (`shift`). Windows running past the end of the data are dropped,
//! zero-filled or edge-replicated depending on the padding mode.

use ndarray::{Array2, ArrayView2, Axis};

use crate::container::{AxisRole, DataContainer};
use crate::error::{PipelineError, Result};

/// How to handle windows extending past the end of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// Drop windows that do not fully fit.
    #[default]
    None,
    /// Fill out-of-range columns with zeros.
    Zero,
    /// Replicate the last in-range frame.
    Repeat,
}

/// How the shift offset moves window placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftBorder {
    /// Rotate the matrix by the shift amount, then place windows from
    /// frame 0. Every frame stays reachable.
    #[default]
    Roll,
    /// Place the first window at the shift offset, discarding the frames
    /// before it.
    Shift,
}

/// Windowing parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Window length in frames.
    pub frames: usize,
    /// Hop between window starts in frames; defaults to `frames`
    /// (non-overlapping windows).
    pub hop_length_frames: Option<usize>,
    /// Out-of-range handling.
    pub padding: Padding,
    /// Frames added per [`Sequencer::increase_shifting`] call.
    pub shift_step: usize,
    /// How the shift offset is applied.
    pub shift_border: ShiftBorder,
    /// Largest allowed shift; exceeding it wraps the shift back to 0.
    /// Defaults to `frames - 1`.
    pub shift_max: Option<usize>,
    /// Minimum fraction of real (in-range) frames a padded window must
    /// contain, exclusive. Windows at or below the threshold are dropped.
    pub required_data_amount_per_segment: f64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            frames: 10,
            hop_length_frames: None,
            padding: Padding::None,
            shift_step: 1,
            shift_border: ShiftBorder::Roll,
            shift_max: None,
            required_data_amount_per_segment: 0.9,
        }
    }
}

impl SequencerConfig {
    /// Effective hop length in frames.
    pub fn hop(&self) -> usize {
        self.hop_length_frames.unwrap_or(self.frames)
    }

    /// Effective shift wrap limit.
    pub fn shift_max(&self) -> usize {
        self.shift_max.unwrap_or(self.frames.saturating_sub(1))
    }

    /// Check parameter consistency.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.frames == 0 {
            return Err("frames must be > 0".into());
        }
        if self.hop() == 0 {
            return Err("hop must be > 0".into());
        }
        if !(0.0..=1.0).contains(&self.required_data_amount_per_segment) {
            return Err(format!(
                "required_data_amount_per_segment must be within [0, 1], got {}",
                self.required_data_amount_per_segment
            ));
        }
        Ok(())
    }
}

/// Stateful window extractor.
///
/// The only run-to-run state is the current shift offset; the input
/// container is never mutated.
#[derive(Debug, Clone)]
pub struct Sequencer {
    config: SequencerConfig,
    shift: usize,
}

impl Sequencer {
    /// Create a sequencer from validated parameters.
    pub fn new(config: SequencerConfig) -> Result<Self> {
        config.validate().map_err(PipelineError::configuration)?;
        Ok(Self { config, shift: 0 })
    }

    /// Windowing parameters.
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Current shift offset in frames.
    pub fn shift(&self) -> usize {
        self.shift
    }

    /// Set the shift offset directly.
    pub fn set_shift(&mut self, shift: usize) {
        self.shift = shift;
    }

    /// Advance the shift offset by `step` frames (the configured
    /// `shift_step` when `None`), wrapping to 0 past the shift limit.
    pub fn increase_shifting(&mut self, step: Option<usize>) {
        self.shift += step.unwrap_or(self.config.shift_step);
        if self.shift > self.config.shift_max() {
            self.shift = 0;
        }
    }

    /// Cut the focused view of a `[Data, Time]` container into windows.
    ///
    /// Returns a `[Data, Time, Sequence]` container; fails with
    /// [`PipelineError::EmptySequence`] when no window can be formed.
    pub fn sequence(&self, container: &DataContainer) -> Result<DataContainer> {
        if container.axes() != [AxisRole::Data, AxisRole::Time] {
            return Err(PipelineError::configuration(
                "sequencing requires a [data, time] container",
            ));
        }

        let frames = self.config.frames;
        let hop = self.config.hop();
        let source = container
            .get_focused()
            .into_dimensionality::<ndarray::Ix2>()?;
        let length = source.ncols();

        if length == 0 {
            return Err(PipelineError::EmptySequence {
                frames,
                hop,
                length,
            });
        }

        // Resolve the shift into either a matrix rotation or an offset for
        // the first window start.
        let (source, first_start) = match self.config.shift_border {
            ShiftBorder::Roll => {
                if self.shift % length == 0 {
                    (source, 0)
                } else {
                    let shift = self.shift % length;
                    let ids: Vec<usize> = (0..length).map(|i| (i + shift) % length).collect();
                    (source.select(Axis(1), &ids), 0)
                }
            }
            ShiftBorder::Shift => (source, self.shift),
        };

        let starts = self.window_starts(first_start, length);
        if starts.is_empty() {
            return Err(PipelineError::EmptySequence {
                frames,
                hop,
                length,
            });
        }

        let windows: Vec<Array2<f64>> = starts
            .iter()
            .map(|&start| self.cut_window(&source, start))
            .collect();
        let views: Vec<ArrayView2<f64>> = windows.iter().map(|window| window.view()).collect();
        let stacked = ndarray::stack(Axis(2), &views)?;

        log::debug!(
            "sequenced {} frames into {} windows of {} frames",
            length,
            starts.len(),
            frames
        );

        let mut out = DataContainer::new(
            stacked.into_dyn(),
            vec![AxisRole::Data, AxisRole::Time, AxisRole::Sequence],
            None,
        )?;
        *out.processing_chain_mut() = container.processing_chain().clone();
        Ok(out)
    }

    /// Accepted window start frames.
    fn window_starts(&self, first_start: usize, length: usize) -> Vec<usize> {
        let frames = self.config.frames;
        let hop = self.config.hop();
        let required = self.config.required_data_amount_per_segment;

        let mut starts = Vec::new();
        let mut start = first_start;
        while start < length {
            match self.config.padding {
                Padding::None => {
                    if start + frames <= length {
                        starts.push(start);
                    }
                }
                Padding::Zero | Padding::Repeat => {
                    let in_range = frames.min(length - start);
                    if in_range as f64 / frames as f64 > required {
                        starts.push(start);
                    }
                }
            }
            start += hop;
        }

        // With padding enabled a short input still yields one window.
        if starts.is_empty() && self.config.padding != Padding::None {
            starts.push(0);
        }

        starts
    }

    /// Extract one window, applying the padding mode for out-of-range
    /// columns.
    fn cut_window(&self, source: &Array2<f64>, start: usize) -> Array2<f64> {
        let frames = self.config.frames;
        let length = source.ncols();

        match self.config.padding {
            Padding::Zero => {
                let mut window = Array2::zeros((source.nrows(), frames));
                for (col, id) in (start..start + frames).enumerate() {
                    if id < length {
                        window.column_mut(col).assign(&source.column(id));
                    }
                }
                window
            }
            Padding::None | Padding::Repeat => {
                let ids: Vec<usize> = (start..start + frames)
                    .map(|id| id.min(length - 1))
                    .collect();
                source.select(Axis(1), &ids)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::FocusRange;
    use ndarray::Array2;

    fn ramp(frames: usize) -> DataContainer {
        // Feature f at frame t holds value (f * 100 + t).
        let data = Array2::from_shape_fn((2, frames), |(f, t)| (f * 100 + t) as f64);
        DataContainer::from_matrix(data, Some(0.02))
    }

    fn sequencer(config: SequencerConfig) -> Sequencer {
        Sequencer::new(config).unwrap()
    }

    #[test]
    fn test_non_overlapping_windows() {
        let seq = sequencer(SequencerConfig {
            frames: 4,
            ..Default::default()
        });
        let out = seq.sequence(&ramp(10)).unwrap();

        // 10 frames, window 4, hop 4: starts 0 and 4; frame 8 does not fit.
        assert_eq!(out.shape(), &[2, 4, 2]);
        assert_eq!(
            out.axes(),
            &[AxisRole::Data, AxisRole::Time, AxisRole::Sequence]
        );
        assert_eq!(out.data()[[0, 0, 0]], 0.0);
        assert_eq!(out.data()[[0, 0, 1]], 4.0);
        assert_eq!(out.data()[[1, 3, 1]], 107.0);
    }

    #[test]
    fn test_overlapping_windows() {
        let seq = sequencer(SequencerConfig {
            frames: 4,
            hop_length_frames: Some(2),
            ..Default::default()
        });
        let out = seq.sequence(&ramp(10)).unwrap();

        // Starts 0, 2, 4, 6.
        assert_eq!(out.shape(), &[2, 4, 4]);
        assert_eq!(out.data()[[0, 0, 3]], 6.0);
    }

    #[test]
    fn test_short_input_without_padding_fails() {
        let seq = sequencer(SequencerConfig {
            frames: 4,
            ..Default::default()
        });
        let err = seq.sequence(&ramp(3)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::EmptySequence {
                frames: 4,
                hop: 4,
                length: 3,
            }
        ));
    }

    #[test]
    fn test_repeat_padding_forces_single_window() {
        let seq = sequencer(SequencerConfig {
            frames: 4,
            padding: Padding::Repeat,
            ..Default::default()
        });
        // 3 of 4 frames in range gives 0.75, below the 0.9 default, so the
        // start is filtered and the single forced window remains.
        let out = seq.sequence(&ramp(3)).unwrap();

        assert_eq!(out.shape(), &[2, 4, 1]);
        assert_eq!(out.data()[[0, 2, 0]], 2.0);
        // Last column replicates the final frame.
        assert_eq!(out.data()[[0, 3, 0]], 2.0);
    }

    #[test]
    fn test_zero_padding_fills_out_of_range() {
        let seq = sequencer(SequencerConfig {
            frames: 4,
            hop_length_frames: Some(8),
            padding: Padding::Zero,
            required_data_amount_per_segment: 0.4,
            ..Default::default()
        });
        let out = seq.sequence(&ramp(10)).unwrap();

        // Starts 0 and 8; the second window has 2 of 4 frames in range
        // (0.5 > 0.4) with its tail zero-filled.
        assert_eq!(out.shape(), &[2, 4, 2]);
        assert_eq!(out.data()[[0, 0, 1]], 8.0);
        assert_eq!(out.data()[[0, 1, 1]], 9.0);
        assert_eq!(out.data()[[0, 2, 1]], 0.0);
        assert_eq!(out.data()[[0, 3, 1]], 0.0);
    }

    #[test]
    fn test_required_data_amount_is_exclusive() {
        let seq = sequencer(SequencerConfig {
            frames: 4,
            hop_length_frames: Some(8),
            padding: Padding::Zero,
            required_data_amount_per_segment: 0.5,
            ..Default::default()
        });
        let out = seq.sequence(&ramp(10)).unwrap();

        // The window at frame 8 holds exactly 0.5 of its frames; equality
        // does not pass the threshold.
        assert_eq!(out.shape(), &[2, 4, 1]);
    }

    #[test]
    fn test_roll_shift_rotates_frames() {
        let mut seq = sequencer(SequencerConfig {
            frames: 3,
            ..Default::default()
        });
        seq.set_shift(2);
        let out = seq.sequence(&ramp(6)).unwrap();

        // Rotated frame order 2,3,4,5,0,1; windows at 0 and 3.
        assert_eq!(out.shape(), &[2, 3, 2]);
        assert_eq!(out.data()[[0, 0, 0]], 2.0);
        assert_eq!(out.data()[[0, 2, 0]], 4.0);
        assert_eq!(out.data()[[0, 0, 1]], 5.0);
        assert_eq!(out.data()[[0, 1, 1]], 0.0);
        assert_eq!(out.data()[[0, 2, 1]], 1.0);
    }

    #[test]
    fn test_shift_border_offsets_first_window() {
        let mut seq = sequencer(SequencerConfig {
            frames: 3,
            shift_border: ShiftBorder::Shift,
            ..Default::default()
        });
        seq.set_shift(2);
        let out = seq.sequence(&ramp(8)).unwrap();

        // Starts 2 and 5; frames 0 and 1 are discarded.
        assert_eq!(out.shape(), &[2, 3, 2]);
        assert_eq!(out.data()[[0, 0, 0]], 2.0);
        assert_eq!(out.data()[[0, 0, 1]], 5.0);
    }

    #[test]
    fn test_increase_shifting_wraps() {
        let mut seq = sequencer(SequencerConfig {
            frames: 4,
            shift_step: 2,
            ..Default::default()
        });

        seq.increase_shifting(None);
        assert_eq!(seq.shift(), 2);
        seq.increase_shifting(None);
        // 4 exceeds the default limit of frames - 1 = 3.
        assert_eq!(seq.shift(), 0);

        seq.increase_shifting(Some(3));
        assert_eq!(seq.shift(), 3);
    }

    #[test]
    fn test_sequence_respects_focus() {
        let mut container = ramp(12);
        container
            .set_focus(FocusRange::Frames { start: 4, stop: 10 })
            .unwrap();

        let seq = sequencer(SequencerConfig {
            frames: 3,
            ..Default::default()
        });
        let out = seq.sequence(&container).unwrap();

        assert_eq!(out.shape(), &[2, 3, 2]);
        assert_eq!(out.data()[[0, 0, 0]], 4.0);
        assert_eq!(out.data()[[0, 0, 1]], 7.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(SequencerConfig {
            frames: 0,
            ..Default::default()
        }
        .validate()
        .is_err());

        assert!(SequencerConfig {
            required_data_amount_per_segment: 1.5,
            ..Default::default()
        }
        .validate()
        .is_err());

        assert!(SequencerConfig::default().validate().is_ok());
    }
}
