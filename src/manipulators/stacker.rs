//! Feature stacking across repository streams.
//!
//! The [`Stacker`] assembles one `[Data, Time]` matrix out of several
//! repository streams by concatenating their feature rows in recipe
//! order. A recipe part can take a stream's full vector or a sub-range of
//! it, and a hop greater than one keeps only every hop-th frame of every
//! source. All source containers must agree on frame count and time
//! resolution before any rows are taken.

use ndarray::Axis;

use crate::container::{DataContainer, DataRepository};
use crate::error::{PipelineError, Result};
use crate::manipulators::assert_aligned;

/// One source of stacked rows: a repository stream plus an optional
/// feature sub-range.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StackPart {
    /// Repository label to read.
    pub label: String,
    /// Stream id; the repository default when `None`.
    #[serde(default)]
    pub stream_id: Option<u32>,
    /// Inclusive start and exclusive stop row of the source vector; the
    /// full vector when `None`.
    #[serde(default)]
    pub vector_range: Option<(usize, usize)>,
}

impl StackPart {
    /// Take a stream's full feature vector.
    pub fn full<S: Into<String>>(label: S) -> Self {
        Self {
            label: label.into(),
            stream_id: None,
            vector_range: None,
        }
    }

    /// Take rows `[start, stop)` of a stream's feature vector.
    pub fn range<S: Into<String>>(label: S, start: usize, stop: usize) -> Self {
        Self {
            label: label.into(),
            stream_id: None,
            vector_range: Some((start, stop)),
        }
    }

    /// Read from a specific stream.
    pub fn with_stream_id(mut self, stream_id: u32) -> Self {
        self.stream_id = Some(stream_id);
        self
    }
}

/// Stacking parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StackerConfig {
    /// Sources in output row order.
    pub recipe: Vec<StackPart>,
    /// Keep every hop-th frame of every source.
    pub hop: usize,
}

impl Default for StackerConfig {
    fn default() -> Self {
        Self {
            recipe: Vec::new(),
            hop: 1,
        }
    }
}

impl StackerConfig {
    /// Check parameter consistency.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.recipe.is_empty() {
            return Err("stacking recipe is empty".into());
        }
        if self.hop == 0 {
            return Err("hop must be > 0".into());
        }
        for part in &self.recipe {
            if let Some((start, stop)) = part.vector_range {
                if start >= stop {
                    return Err(format!(
                        "empty vector range [{start}, {stop}) for label [{}]",
                        part.label
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Stateless multi-stream row stacker.
#[derive(Debug, Clone)]
pub struct Stacker {
    config: StackerConfig,
}

impl Stacker {
    /// Create a stacker from validated parameters.
    pub fn new(config: StackerConfig) -> Result<Self> {
        config.validate().map_err(PipelineError::configuration)?;
        Ok(Self { config })
    }

    /// Stacking parameters.
    pub fn config(&self) -> &StackerConfig {
        &self.config
    }

    /// Assemble the stacked `[Data, Time]` container from a repository.
    pub fn stack(&self, repository: &DataRepository) -> Result<DataContainer> {
        let sources: Vec<&DataContainer> = self
            .config
            .recipe
            .iter()
            .map(|part| {
                repository
                    .get_container(&part.label, part.stream_id)
                    .ok_or_else(|| PipelineError::UnknownLabel(part.label.clone()))
            })
            .collect::<Result<_>>()?;

        assert_aligned(sources.iter().copied())?;

        let mut blocks = Vec::with_capacity(sources.len());
        for (part, source) in self.config.recipe.iter().zip(&sources) {
            let hopped = source
                .get_frames_hopped(self.config.hop)?
                .into_dimensionality::<ndarray::Ix2>()?;

            let block = match part.vector_range {
                Some((start, stop)) => {
                    if stop > hopped.nrows() {
                        return Err(PipelineError::configuration(format!(
                            "vector range [{start}, {stop}) exceeds vector length ({}) \
                             for label [{}]",
                            hopped.nrows(),
                            part.label
                        )));
                    }
                    hopped.slice_axis(Axis(0), ndarray::Slice::from(start..stop)).to_owned()
                }
                None => hopped,
            };
            blocks.push(block);
        }

        let views: Vec<_> = blocks.iter().map(|block| block.view()).collect();
        let stacked = ndarray::concatenate(Axis(0), &views)?;

        let resolution = sources
            .first()
            .and_then(|source| source.time_resolution())
            .map(|resolution| resolution * self.config.hop as f64);

        let mut out = DataContainer::from_matrix(stacked, resolution);
        *out.processing_chain_mut() = repository.processing_chain().clone();
        Ok(out)
    }
}
