//! Name to processor-factory registry.
//!
//! Chains store processor names, not processors; the registry turns a name
//! plus construction parameters into a fresh [`Processor`] instance. It
//! also answers kind queries without constructing anything, which is what
//! `push_processor` uses to default an item's input/output declaration.
//!
//! [`ProcessorRegistry::with_builtins`] registers every processor shipped
//! with the crate; applications extend the same registry with their own
//! factories.

use ahash::AHashMap;

use crate::error::{PipelineError, Result};
use crate::processing::chain::{ChainItemKind, Params};
use crate::processing::processor::Processor;
use crate::processing::processors::{
    AggregationProcessor, EventRollEncodingProcessor, NormalizationProcessor,
    RepositoryMaskingProcessor, RepositoryNormalizationProcessor, SequencingProcessor,
    StackingProcessor,
};

type Factory = Box<dyn Fn(&Params) -> Result<Box<dyn Processor>> + Send + Sync>;

struct RegistryEntry {
    input_kind: ChainItemKind,
    output_kind: ChainItemKind,
    factory: Factory,
}

/// Maps processor names to kind declarations and construction factories.
#[derive(Default)]
pub struct ProcessorRegistry {
    entries: AHashMap<String, RegistryEntry>,
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl ProcessorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all builtin processors registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register(
            "sequencing",
            ChainItemKind::DataContainer,
            ChainItemKind::DataContainer,
            |params| Ok(Box::new(SequencingProcessor::from_params(params)?)),
        );
        registry.register(
            "aggregation",
            ChainItemKind::DataContainer,
            ChainItemKind::DataContainer,
            |params| Ok(Box::new(AggregationProcessor::from_params(params)?)),
        );
        registry.register(
            "normalization",
            ChainItemKind::DataContainer,
            ChainItemKind::DataContainer,
            |params| Ok(Box::new(NormalizationProcessor::from_params(params)?)),
        );
        registry.register(
            "repository_normalization",
            ChainItemKind::DataRepository,
            ChainItemKind::DataRepository,
            |params| Ok(Box::new(RepositoryNormalizationProcessor::from_params(params)?)),
        );
        registry.register(
            "stacking",
            ChainItemKind::DataRepository,
            ChainItemKind::DataContainer,
            |params| Ok(Box::new(StackingProcessor::from_params(params)?)),
        );
        registry.register(
            "repository_masking",
            ChainItemKind::DataRepository,
            ChainItemKind::DataRepository,
            |params| Ok(Box::new(RepositoryMaskingProcessor::from_params(params)?)),
        );
        registry.register(
            "event_roll_encoding",
            ChainItemKind::Metadata,
            ChainItemKind::DataContainer,
            |params| Ok(Box::new(EventRollEncodingProcessor::from_params(params)?)),
        );

        registry
    }

    /// Register a factory under a name, replacing any previous entry.
    pub fn register<F>(
        &mut self,
        name: &str,
        input_kind: ChainItemKind,
        output_kind: ChainItemKind,
        factory: F,
    ) where
        F: Fn(&Params) -> Result<Box<dyn Processor>> + Send + Sync + 'static,
    {
        self.entries.insert(
            name.to_string(),
            RegistryEntry {
                input_kind,
                output_kind,
                factory: Box::new(factory),
            },
        );
    }

    /// True when a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Declared `(input, output)` kinds for a name, without construction.
    pub fn kinds(&self, name: &str) -> Result<(ChainItemKind, ChainItemKind)> {
        let entry = self.lookup(name)?;
        Ok((entry.input_kind, entry.output_kind))
    }

    /// Construct a fresh processor from its registered factory.
    pub fn create(&self, name: &str, init_parameters: &Params) -> Result<Box<dyn Processor>> {
        (self.lookup(name)?.factory)(init_parameters)
    }

    fn lookup(&self, name: &str) -> Result<&RegistryEntry> {
        self.entries.get(name).ok_or_else(|| {
            let err = PipelineError::UnknownProcessor(name.to_string());
            log::error!("{err}");
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::processor::ProcessData;

    struct Doubler;

    impl Processor for Doubler {
        fn input_kind(&self) -> ChainItemKind {
            ChainItemKind::DataContainer
        }

        fn output_kind(&self) -> ChainItemKind {
            ChainItemKind::DataContainer
        }

        fn process(&mut self, data: ProcessData, _parameters: &Params) -> Result<ProcessData> {
            let mut container = data.into_container()?;
            let doubled = container.data().mapv(|v| v * 2.0);
            container.set_data(doubled)?;
            Ok(ProcessData::Container(container))
        }
    }

    #[test]
    fn test_unknown_name() {
        let registry = ProcessorRegistry::new();
        let err = registry.kinds("missing").unwrap_err();
        assert!(matches!(err, PipelineError::UnknownProcessor(name) if name == "missing"));
    }

    #[test]
    fn test_builtins_registered() {
        let registry = ProcessorRegistry::with_builtins();
        for name in [
            "sequencing",
            "aggregation",
            "normalization",
            "repository_normalization",
            "stacking",
            "repository_masking",
            "event_roll_encoding",
        ] {
            assert!(registry.contains(name), "missing builtin [{name}]");
        }

        assert_eq!(
            registry.kinds("stacking").unwrap(),
            (ChainItemKind::DataRepository, ChainItemKind::DataContainer)
        );
        assert_eq!(
            registry.kinds("event_roll_encoding").unwrap(),
            (ChainItemKind::Metadata, ChainItemKind::DataContainer)
        );
    }

    #[test]
    fn test_custom_registration_and_create() {
        let mut registry = ProcessorRegistry::new();
        registry.register(
            "doubling",
            ChainItemKind::DataContainer,
            ChainItemKind::DataContainer,
            |_params| Ok(Box::new(Doubler)),
        );

        let processor = registry.create("doubling", &Params::new()).unwrap();
        assert_eq!(processor.input_kind(), ChainItemKind::DataContainer);
    }
}
