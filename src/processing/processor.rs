//! The processor seam: what a chain step actually runs.

use ndarray::ArrayD;

use crate::container::{DataContainer, DataRepository, MetaDataContainer};
use crate::error::{PipelineError, Result};
use crate::processing::chain::{ChainItemKind, Params};

/// Value threaded between chain steps.
///
/// `Audio` and `Container` carry the same container type; the distinction
/// is the declared kind, so a chain can refuse to feed raw audio into a
/// step expecting extracted features.
#[derive(Debug, Clone)]
pub enum ProcessData {
    /// No data; what the first step of a generator chain receives.
    None,
    /// Audio signal container.
    Audio(DataContainer),
    /// Feature data container.
    Container(DataContainer),
    /// Multi-stream repository.
    Repository(DataRepository),
    /// Event metadata.
    Metadata(MetaDataContainer),
    /// Bare numeric matrix with no axis bookkeeping.
    Matrix(ArrayD<f64>),
}

impl ProcessData {
    /// Chain kind of the carried value.
    pub fn kind(&self) -> ChainItemKind {
        match self {
            ProcessData::None => ChainItemKind::None,
            ProcessData::Audio(_) => ChainItemKind::Audio,
            ProcessData::Container(_) => ChainItemKind::DataContainer,
            ProcessData::Repository(_) => ChainItemKind::DataRepository,
            ProcessData::Metadata(_) => ChainItemKind::Metadata,
            ProcessData::Matrix(_) => ChainItemKind::Matrix,
        }
    }

    /// Unwrap a feature container, failing on any other kind.
    pub fn into_container(self) -> Result<DataContainer> {
        match self {
            ProcessData::Container(container) => Ok(container),
            other => Err(PipelineError::UnexpectedData {
                expected: ChainItemKind::DataContainer,
                got: other.kind(),
            }),
        }
    }

    /// Unwrap a repository, failing on any other kind.
    pub fn into_repository(self) -> Result<DataRepository> {
        match self {
            ProcessData::Repository(repository) => Ok(repository),
            other => Err(PipelineError::UnexpectedData {
                expected: ChainItemKind::DataRepository,
                got: other.kind(),
            }),
        }
    }

    /// Unwrap event metadata, failing on any other kind.
    pub fn into_metadata(self) -> Result<MetaDataContainer> {
        match self {
            ProcessData::Metadata(metadata) => Ok(metadata),
            other => Err(PipelineError::UnexpectedData {
                expected: ChainItemKind::Metadata,
                got: other.kind(),
            }),
        }
    }
}

/// A single executable chain step.
///
/// Implementations are constructed fresh for every chain execution by a
/// registry factory, so they may keep per-run state without leaking it
/// across runs.
pub trait Processor {
    /// Kind this processor consumes.
    fn input_kind(&self) -> ChainItemKind;

    /// Kind this processor produces.
    fn output_kind(&self) -> ChainItemKind;

    /// Transform the input into the output.
    ///
    /// Must not mutate the input in place; the result is a new value.
    fn process(&mut self, data: ProcessData, parameters: &Params) -> Result<ProcessData>;

    /// Invoke a named preprocessing method.
    ///
    /// The default rejects every name; processors with adjustable run
    /// state override it.
    fn call_method(&mut self, method_name: &str, _parameters: &Params) -> Result<()> {
        Err(PipelineError::configuration(format!(
            "unsupported preprocessing callback [{method_name}]"
        )))
    }
}
