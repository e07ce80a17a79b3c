//! Processing chains, the processor seam and the name registry.

pub mod chain;
pub mod processor;
pub mod processors;
pub mod registry;

pub use chain::{Callback, ChainItem, ChainItemKind, Params, ProcessingChain};
pub use processor::{ProcessData, Processor};
pub use processors::{
    AggregationProcessor, EventRollEncodingProcessor, NormalizationProcessor,
    RepositoryMaskingProcessor, RepositoryNormalizationProcessor, SequencingProcessor,
    StackingProcessor,
};
pub use registry::ProcessorRegistry;
