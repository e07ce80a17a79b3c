//! Feature Pipeline
//!
//! Typed processing chains, windowing and aggregation for time-indexed
//! feature matrices.
//!
//! # Overview
//!
//! This library provides the data plumbing of a feature extraction
//! pipeline: containers that keep a numeric matrix together with its axis
//! meaning, time resolution and provenance, plus the manipulators that
//! reshape such containers into model-ready form:
//!
//! - **Sequencer**: fixed-length window extraction with roll/shift
//!   augmentation and padding policies
//! - **Aggregator**: sliding-window statistics (mean, std, cov, kurtosis,
//!   skew, flatten)
//! - **Normalizer**: streaming mean/std accumulation and application
//! - **Stacker / Masker**: multi-stream repository fan-out
//! - **EventRollEncoder**: annotated events to binary activity matrices
//!
//! Steps compose into a [`ProcessingChain`]: a serializable, type-checked
//! list of processor invocations that both drives execution and records
//! provenance on everything it produces.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Feature Pipeline                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  container/    - Focused matrices, metadata, stream repository  │
//! │  processing/   - Chains, the processor seam, name registry      │
//! │  manipulators/ - Sequencer, aggregator, normalizer, stacker     │
//! │  encoders      - Event roll encoding                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use feature_pipeline::prelude::*;
//!
//! let registry = ProcessorRegistry::with_builtins();
//! let mut chain = ProcessingChain::new();
//! chain.push_processor(
//!     "sequencing", &registry,
//!     params, Params::new(), Vec::new(), None,
//! )?;
//!
//! let windows = chain.process(
//!     &registry,
//!     Some(ProcessData::Container(features)),
//!     &Params::new(),
//! )?;
//! ```

pub mod container;
pub mod encoders;
pub mod error;
pub mod manipulators;
pub mod prelude;
pub mod processing;

// Re-exports - Containers
pub use container::{
    AxisRole, DataContainer, DataRepository, FocusRange, FocusWindow, MetaDataContainer, MetaItem,
    Rounding, Stats,
};

// Re-exports - Processing
pub use processing::{
    Callback, ChainItem, ChainItemKind, Params, ProcessData, ProcessingChain, Processor,
    ProcessorRegistry,
};

// Re-exports - Manipulators
pub use manipulators::{
    AggregationRecipe, Aggregator, AggregatorConfig, Masker, Normalizer, Padding,
    RepositoryNormalizer, Selector, Sequencer, SequencerConfig, ShiftBorder, StackPart, Stacker,
    StackerConfig,
};

// Re-exports - Encoders
pub use encoders::{EventRollEncoder, EventRollEncoderConfig};

// Re-exports - Errors
pub use error::{PipelineError, Result};
