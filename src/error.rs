//! Error types for the processing pipeline.
//!
//! All fallible operations in the crate route through [`PipelineError`].
//! The taxonomy is deliberately small:
//!
//! - **Configuration**: unresolvable processor name, invalid enumerated
//!   option, empty aggregation recipe, unreachable windowing parameters.
//! - **Connection**: adjacent chain items whose declared data kinds do not
//!   match.
//! - **Bounds / invariant**: inconsistent frame counts or time resolutions
//!   across a repository operation, axis index outside the container rank.
//! - **Type**: wrong entity kind passed into a processor expecting another.
//!
//! Errors are raised immediately at the point of detection; there is no
//! silent coercion and no retry logic anywhere in the core.

use crate::processing::ChainItemKind;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Central error enum for the feature pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Invalid configuration value or unresolvable reference.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Processor name not present in the registry.
    #[error("processor not found in registry [{0}]")]
    UnknownProcessor(String),

    /// Adjacent chain items do not connect.
    #[error(
        "chain connection invalid between [{from}]({output_type}) -> [{to}]({input_type})"
    )]
    Connection {
        /// Name of the upstream item.
        from: String,
        /// Name of the downstream item.
        to: String,
        /// Output kind declared by the upstream item.
        output_type: ChainItemKind,
        /// Input kind declared by the downstream item.
        input_type: ChainItemKind,
    },

    /// Chain item declares a kind outside the valid set.
    #[error("invalid {direction} type [{kind}] for processor [{processor_name}]")]
    InvalidKind {
        /// "input" or "output".
        direction: &'static str,
        /// Offending kind.
        kind: ChainItemKind,
        /// Item the kind was declared on.
        processor_name: String,
    },

    /// Windowing produced zero valid segments.
    #[error(
        "cannot create valid segment (frames={frames}, hop={hop}, data_length={length}); \
         adjust segment length and hop size, or enable padding"
    )]
    EmptySequence {
        /// Configured segment length.
        frames: usize,
        /// Configured hop length.
        hop: usize,
        /// Frame count of the input data.
        length: usize,
    },

    /// Containers visited by a fan-out operation disagree on frame count.
    #[error("data matrices should have same number of frames {0:?}")]
    FrameCountMismatch(Vec<usize>),

    /// Containers visited by a fan-out operation disagree on time resolution.
    #[error("data matrices should have same time resolution {0:?}")]
    TimeResolutionMismatch(Vec<f64>),

    /// Axis index outside the container's rank.
    #[error("axis [{axis}] out of rank [{rank}]")]
    AxisOutOfRank {
        /// Requested axis index.
        axis: usize,
        /// Rank of the container.
        rank: usize,
    },

    /// A processor received data of the wrong kind.
    #[error("unexpected data kind: expected {expected}, got {got}")]
    UnexpectedData {
        /// Kind the processor declares as input.
        expected: ChainItemKind,
        /// Kind of the value actually threaded through.
        got: ChainItemKind,
    },

    /// Label not present in an encoder's label list.
    #[error("unknown label [{0}]")]
    UnknownLabel(String),

    /// Shape mismatch from the underlying matrix library.
    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Parameter maps that fail to deserialize into a processor config.
    #[error("parameter error: {0}")]
    Parameters(#[from] serde_json::Error),
}

impl PipelineError {
    /// Convenience constructor for configuration errors.
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }
}
