//! Data manipulators: windowing, aggregation, normalization, stacking and
//! event-driven masking. All of them consume containers by reference and
//! return new containers; inputs are never mutated.

pub mod aggregator;
pub mod masker;
pub mod normalizer;
pub mod sequencer;
pub mod stacker;

pub use aggregator::{AggregationRecipe, Aggregator, AggregatorConfig};
pub use masker::{Masker, Selector};
pub use normalizer::{Normalizer, RepositoryNormalizer};
pub use sequencer::{Padding, Sequencer, SequencerConfig, ShiftBorder};
pub use stacker::{StackPart, Stacker, StackerConfig};

use crate::container::DataContainer;
use crate::error::{PipelineError, Result};

/// Check that a set of containers agrees on frame count and time
/// resolution. Fan-out operations call this before touching any data so
/// the error can name every offending value at once.
pub(crate) fn assert_aligned<'a, I>(containers: I) -> Result<()>
where
    I: Iterator<Item = &'a DataContainer>,
{
    let mut counts = Vec::new();
    let mut resolutions = Vec::new();

    for container in containers {
        counts.push(container.length());
        if let Some(resolution) = container.time_resolution() {
            resolutions.push(resolution);
        }
    }

    if counts.windows(2).any(|pair| pair[0] != pair[1]) {
        let err = PipelineError::FrameCountMismatch(counts);
        log::error!("{err}");
        return Err(err);
    }

    if resolutions
        .windows(2)
        .any(|pair| (pair[0] - pair[1]).abs() > 1e-12)
    {
        let err = PipelineError::TimeResolutionMismatch(resolutions);
        log::error!("{err}");
        return Err(err);
    }

    Ok(())
}
