//! Prelude module for convenient imports.
//!
//! Re-exports the most commonly used types for ergonomic usage of the
//! pipeline library.
//!
//! # Usage
//!
//! ```ignore
//! use feature_pipeline::prelude::*;
//!
//! let registry = ProcessorRegistry::with_builtins();
//! let mut chain = ProcessingChain::new();
//! chain.push_processor("sequencing", &registry, init, Params::new(), Vec::new(), None)?;
//! let out = chain.process(&registry, Some(ProcessData::Container(data)), &Params::new())?;
//! ```

// ============================================================================
// Containers
// ============================================================================

pub use crate::container::{
    AxisRole, DataContainer, DataRepository, FocusRange, FocusWindow, MetaDataContainer, MetaItem,
    Rounding, Stats,
};

// ============================================================================
// Processing
// ============================================================================

pub use crate::processing::{
    Callback, ChainItem, ChainItemKind, Params, ProcessData, ProcessingChain, Processor,
    ProcessorRegistry,
};

// ============================================================================
// Manipulators
// ============================================================================

pub use crate::manipulators::{
    AggregationRecipe, Aggregator, AggregatorConfig, Masker, Normalizer, Padding,
    RepositoryNormalizer, Selector, Sequencer, SequencerConfig, ShiftBorder, StackPart, Stacker,
    StackerConfig,
};

// ============================================================================
// Encoders
// ============================================================================

pub use crate::encoders::{EventRollEncoder, EventRollEncoderConfig};

// ============================================================================
// Error handling
// ============================================================================

pub use crate::error::{PipelineError, Result};
