//! Typed processing chains.
//!
//! A [`ProcessingChain`] is an ordered list of [`ChainItem`]s, each naming
//! a processor plus its construction-time and call-time parameters. Items
//! declare the data kind they consume and produce; the chain refuses to
//! grow in ways that cannot execute (adjacent kinds must match) and
//! refuses items with an unresolvable kind. Processor names resolve
//! through a [`ProcessorRegistry`](crate::processing::ProcessorRegistry)
//! at push and execution time, never through ambient global state.
//!
//! Chains serialize to a plain JSON structure, so a pipeline definition
//! can live in a config file and round-trip without loss.

use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::processing::processor::ProcessData;
use crate::processing::registry::ProcessorRegistry;

/// Parameter map threaded through processors and chain items.
pub type Params = serde_json::Map<String, Value>;

/// Kind of entity flowing between chain items.
///
/// `Unknown` exists only as a decoding fallback for foreign chain
/// definitions; an item declaring it is rejected at push time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ChainItemKind {
    /// No data; valid input for the first item of a chain.
    #[serde(rename = "NONE")]
    None,
    /// Audio signal.
    #[serde(rename = "AUDIO")]
    Audio,
    /// Single data container.
    #[serde(rename = "DATA_CONTAINER")]
    DataContainer,
    /// Multi-stream data repository.
    #[serde(rename = "DATA_REPOSITORY")]
    DataRepository,
    /// Event metadata.
    #[serde(rename = "METADATA")]
    Metadata,
    /// Bare numeric matrix.
    #[serde(rename = "MATRIX")]
    Matrix,
    /// Unresolvable kind; never valid on an item.
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl ChainItemKind {
    /// True for kinds an item may declare.
    pub fn is_valid_for_item(&self) -> bool {
        !matches!(self, ChainItemKind::Unknown)
    }
}

impl std::fmt::Display for ChainItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChainItemKind::None => "NONE",
            ChainItemKind::Audio => "AUDIO",
            ChainItemKind::DataContainer => "DATA_CONTAINER",
            ChainItemKind::DataRepository => "DATA_REPOSITORY",
            ChainItemKind::Metadata => "METADATA",
            ChainItemKind::Matrix => "MATRIX",
            ChainItemKind::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// A named processor method to invoke before processing, with parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Callback {
    /// Method name understood by the target processor.
    pub method_name: String,
    /// Parameters handed to the method.
    #[serde(default)]
    pub parameters: Params,
}

/// One step of a processing chain.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChainItem {
    /// Registry name of the processor.
    pub processor_name: String,
    /// Parameters used when constructing the processor.
    #[serde(default)]
    pub init_parameters: Params,
    /// Parameters merged into every process call.
    #[serde(default)]
    pub process_parameters: Params,
    /// Methods invoked on the freshly constructed processor before
    /// processing starts.
    #[serde(default)]
    pub preprocessing_callbacks: Vec<Callback>,
    /// Kind this item consumes.
    pub input_type: ChainItemKind,
    /// Kind this item produces.
    pub output_type: ChainItemKind,
}

impl ChainItem {
    /// Create an item with empty parameter maps.
    pub fn new<S: Into<String>>(
        processor_name: S,
        input_type: ChainItemKind,
        output_type: ChainItemKind,
    ) -> Self {
        Self {
            processor_name: processor_name.into(),
            init_parameters: Params::new(),
            process_parameters: Params::new(),
            preprocessing_callbacks: Vec::new(),
            input_type,
            output_type,
        }
    }

    /// Set construction-time parameters.
    pub fn with_init_parameters(mut self, parameters: Params) -> Self {
        self.init_parameters = parameters;
        self
    }

    /// Set call-time parameters.
    pub fn with_process_parameters(mut self, parameters: Params) -> Self {
        self.process_parameters = parameters;
        self
    }

    /// Add a preprocessing callback.
    pub fn with_callback(mut self, callback: Callback) -> Self {
        self.preprocessing_callbacks.push(callback);
        self
    }

    /// Reject items whose declared kinds cannot execute.
    pub fn validate(&self) -> Result<()> {
        for (direction, kind) in [("input", self.input_type), ("output", self.output_type)] {
            if !kind.is_valid_for_item() {
                return Err(PipelineError::InvalidKind {
                    direction,
                    kind,
                    processor_name: self.processor_name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Ordered, connection-checked list of chain items.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ProcessingChain {
    items: Vec<ChainItem>,
}

impl ProcessingChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Items in execution order.
    pub fn items(&self) -> &[ChainItem] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the chain has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when an item with the given processor name is present.
    pub fn chain_item_exists(&self, processor_name: &str) -> bool {
        self.chain_item(processor_name).is_some()
    }

    /// First item with the given processor name.
    pub fn chain_item(&self, processor_name: &str) -> Option<&ChainItem> {
        self.items
            .iter()
            .find(|item| item.processor_name == processor_name)
    }

    /// Push an item onto the chain.
    ///
    /// When an item with the same processor name already exists, the new
    /// item's parameters are merged into it (later keys win) instead of
    /// appending a duplicate step. Otherwise the item is validated and its
    /// input kind checked against the current tail's output kind.
    pub fn push(&mut self, item: ChainItem) -> Result<()> {
        item.validate()?;

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|existing| existing.processor_name == item.processor_name)
        {
            for (key, value) in item.init_parameters {
                existing.init_parameters.insert(key, value);
            }
            for (key, value) in item.process_parameters {
                existing.process_parameters.insert(key, value);
            }
            existing
                .preprocessing_callbacks
                .extend(item.preprocessing_callbacks);
            return existing.validate();
        }

        if let Some(last) = self.items.last() {
            if last.output_type != item.input_type {
                let err = PipelineError::Connection {
                    from: last.processor_name.clone(),
                    to: item.processor_name.clone(),
                    output_type: last.output_type,
                    input_type: item.input_type,
                };
                log::error!("{err}");
                return Err(err);
            }
        }

        self.items.push(item);
        Ok(())
    }

    /// Push a processor by registry name.
    ///
    /// Kinds default to the registry's declaration for the name; an
    /// explicit pair overrides it (for processors whose kinds depend on
    /// configuration).
    pub fn push_processor(
        &mut self,
        processor_name: &str,
        registry: &ProcessorRegistry,
        init_parameters: Params,
        process_parameters: Params,
        preprocessing_callbacks: Vec<Callback>,
        kinds: Option<(ChainItemKind, ChainItemKind)>,
    ) -> Result<()> {
        let (input_type, output_type) = match kinds {
            Some(pair) => pair,
            None => registry.kinds(processor_name)?,
        };

        self.push(ChainItem {
            processor_name: processor_name.to_string(),
            init_parameters,
            process_parameters,
            preprocessing_callbacks,
            input_type,
            output_type,
        })
    }

    /// Execute the chain over the given data.
    ///
    /// A `None` input is only accepted when the first item declares `NONE`
    /// input; the first processor then synthesizes its output from its
    /// parameters alone. Call-time `overrides` are merged over each item's
    /// stored process parameters, overrides winning.
    pub fn process(
        &self,
        registry: &ProcessorRegistry,
        data: Option<ProcessData>,
        overrides: &Params,
    ) -> Result<ProcessData> {
        let mut current = match data {
            Some(data) => data,
            None => ProcessData::None,
        };

        for item in &self.items {
            let got = current.kind();
            if got != item.input_type {
                return Err(PipelineError::UnexpectedData {
                    expected: item.input_type,
                    got,
                });
            }

            let mut processor = registry.create(&item.processor_name, &item.init_parameters)?;

            for callback in &item.preprocessing_callbacks {
                processor.call_method(&callback.method_name, &callback.parameters)?;
            }

            let mut parameters = item.process_parameters.clone();
            for (key, value) in overrides {
                parameters.insert(key.clone(), value.clone());
            }

            log::debug!("processing chain step [{}]", item.processor_name);
            current = processor.process(current, &parameters)?;
        }

        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, input: ChainItemKind, output: ChainItemKind) -> ChainItem {
        ChainItem::new(name, input, output)
    }

    #[test]
    fn test_push_connected_items() {
        let mut chain = ProcessingChain::new();
        chain
            .push(item(
                "extraction",
                ChainItemKind::Audio,
                ChainItemKind::DataContainer,
            ))
            .unwrap();
        chain
            .push(item(
                "normalization",
                ChainItemKind::DataContainer,
                ChainItemKind::DataContainer,
            ))
            .unwrap();
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_push_rejects_mismatched_connection() {
        let mut chain = ProcessingChain::new();
        chain
            .push(item(
                "extraction",
                ChainItemKind::Audio,
                ChainItemKind::DataContainer,
            ))
            .unwrap();

        let err = chain
            .push(item(
                "encoding",
                ChainItemKind::Metadata,
                ChainItemKind::DataContainer,
            ))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Connection { .. }));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_push_rejects_unknown_kind() {
        let mut chain = ProcessingChain::new();
        let err = chain
            .push(item(
                "mystery",
                ChainItemKind::Unknown,
                ChainItemKind::DataContainer,
            ))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidKind { .. }));
    }

    #[test]
    fn test_push_merges_by_processor_name() {
        let mut chain = ProcessingChain::new();

        let mut init = Params::new();
        init.insert("frames".into(), 10.into());
        init.insert("hop".into(), 10.into());
        chain
            .push(
                item(
                    "sequencing",
                    ChainItemKind::DataContainer,
                    ChainItemKind::DataContainer,
                )
                .with_init_parameters(init),
            )
            .unwrap();

        let mut update = Params::new();
        update.insert("hop".into(), 5.into());
        chain
            .push(
                item(
                    "sequencing",
                    ChainItemKind::DataContainer,
                    ChainItemKind::DataContainer,
                )
                .with_init_parameters(update),
            )
            .unwrap();

        assert_eq!(chain.len(), 1);
        let merged = chain.chain_item("sequencing").unwrap();
        assert_eq!(merged.init_parameters["frames"], 10);
        assert_eq!(merged.init_parameters["hop"], 5);
    }

    #[test]
    fn test_chain_item_lookup() {
        let mut chain = ProcessingChain::new();
        chain
            .push(item(
                "sequencing",
                ChainItemKind::DataContainer,
                ChainItemKind::DataContainer,
            ))
            .unwrap();

        assert!(chain.chain_item_exists("sequencing"));
        assert!(!chain.chain_item_exists("aggregation"));
    }

    #[test]
    fn test_serde_round_trip_wire_names() {
        let mut chain = ProcessingChain::new();
        let mut init = Params::new();
        init.insert("frames".into(), 4.into());
        chain
            .push(
                item(
                    "sequencing",
                    ChainItemKind::DataContainer,
                    ChainItemKind::DataContainer,
                )
                .with_init_parameters(init)
                .with_callback(Callback {
                    method_name: "reset".into(),
                    parameters: Params::new(),
                }),
            )
            .unwrap();

        let json = serde_json::to_string(&chain).unwrap();
        assert!(json.contains("\"DATA_CONTAINER\""));

        let restored: ProcessingChain = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, chain);
    }
}
