//! Builtin processors.
//!
//! Thin [`Processor`] wrappers around the manipulators and the event roll
//! encoder. Each wrapper parses its construction parameters into the
//! underlying component's config, runs the component, and records a
//! provenance item on the result's processing chain so the output carries
//! a replayable description of how it was made.

use std::collections::BTreeMap;

use ndarray::Array1;
use serde_json::Value;

use crate::container::{MetaDataContainer, MetaItem};
use crate::encoders::{EventRollEncoder, EventRollEncoderConfig};
use crate::error::{PipelineError, Result};
use crate::manipulators::{
    Aggregator, AggregatorConfig, Masker, Normalizer, RepositoryNormalizer, Selector, Sequencer,
    SequencerConfig, Stacker, StackerConfig,
};
use crate::processing::chain::{ChainItem, ChainItemKind, Params, ProcessingChain};
use crate::processing::processor::{ProcessData, Processor};

/// Deserialize a parameter map into a typed config.
fn parse_config<T: serde::de::DeserializeOwned>(parameters: &Params) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(parameters.clone()))?)
}

/// Append a provenance item describing a completed processing step.
fn record_step(
    chain: &mut ProcessingChain,
    processor_name: &str,
    init_parameters: &Params,
    input_type: ChainItemKind,
    output_type: ChainItemKind,
) -> Result<()> {
    chain.push(
        ChainItem::new(processor_name, input_type, output_type)
            .with_init_parameters(init_parameters.clone()),
    )
}

/// Window extraction step; see [`Sequencer`].
#[derive(Debug)]
pub struct SequencingProcessor {
    sequencer: Sequencer,
    init_parameters: Params,
}

impl SequencingProcessor {
    /// Build from a [`SequencerConfig`] parameter map.
    pub fn from_params(parameters: &Params) -> Result<Self> {
        let config: SequencerConfig = parse_config(parameters)?;
        Ok(Self {
            sequencer: Sequencer::new(config)?,
            init_parameters: parameters.clone(),
        })
    }
}

impl Processor for SequencingProcessor {
    fn input_kind(&self) -> ChainItemKind {
        ChainItemKind::DataContainer
    }

    fn output_kind(&self) -> ChainItemKind {
        ChainItemKind::DataContainer
    }

    fn process(&mut self, data: ProcessData, _parameters: &Params) -> Result<ProcessData> {
        let container = data.into_container()?;
        let mut out = self.sequencer.sequence(&container)?;
        record_step(
            out.processing_chain_mut(),
            "sequencing",
            &self.init_parameters,
            self.input_kind(),
            self.output_kind(),
        )?;
        Ok(ProcessData::Container(out))
    }

    fn call_method(&mut self, method_name: &str, parameters: &Params) -> Result<()> {
        match method_name {
            "increase_shifting" => {
                let step = parameters
                    .get("shift_step")
                    .and_then(Value::as_u64)
                    .map(|step| step as usize);
                self.sequencer.increase_shifting(step);
                Ok(())
            }
            "set_shift" => {
                let shift = parameters.get("shift").and_then(Value::as_u64).ok_or_else(|| {
                    PipelineError::configuration("set_shift requires a [shift] parameter")
                })?;
                self.sequencer.set_shift(shift as usize);
                Ok(())
            }
            other => Err(PipelineError::configuration(format!(
                "unsupported preprocessing callback [{other}]"
            ))),
        }
    }
}

/// Window statistics step; see [`Aggregator`].
#[derive(Debug)]
pub struct AggregationProcessor {
    aggregator: Aggregator,
    init_parameters: Params,
}

impl AggregationProcessor {
    /// Build from an [`AggregatorConfig`] parameter map.
    pub fn from_params(parameters: &Params) -> Result<Self> {
        let config: AggregatorConfig = parse_config(parameters)?;
        Ok(Self {
            aggregator: Aggregator::new(config)?,
            init_parameters: parameters.clone(),
        })
    }
}

impl Processor for AggregationProcessor {
    fn input_kind(&self) -> ChainItemKind {
        ChainItemKind::DataContainer
    }

    fn output_kind(&self) -> ChainItemKind {
        ChainItemKind::DataContainer
    }

    fn process(&mut self, data: ProcessData, _parameters: &Params) -> Result<ProcessData> {
        let container = data.into_container()?;
        let mut out = self.aggregator.aggregate(&container)?;
        record_step(
            out.processing_chain_mut(),
            "aggregation",
            &self.init_parameters,
            self.input_kind(),
            self.output_kind(),
        )?;
        Ok(ProcessData::Container(out))
    }
}

#[derive(Debug, serde::Deserialize)]
struct NormalizationConfig {
    mean: Vec<f64>,
    std: Vec<f64>,
}

/// Mean/std normalization step with precomputed statistics.
#[derive(Debug)]
pub struct NormalizationProcessor {
    normalizer: Normalizer,
    init_parameters: Params,
}

impl NormalizationProcessor {
    /// Build from a parameter map with `mean` and `std` arrays.
    pub fn from_params(parameters: &Params) -> Result<Self> {
        let config: NormalizationConfig = parse_config(parameters)?;
        Ok(Self {
            normalizer: Normalizer::from_mean_std(
                Array1::from(config.mean),
                Array1::from(config.std),
            )?,
            init_parameters: parameters.clone(),
        })
    }
}

impl Processor for NormalizationProcessor {
    fn input_kind(&self) -> ChainItemKind {
        ChainItemKind::DataContainer
    }

    fn output_kind(&self) -> ChainItemKind {
        ChainItemKind::DataContainer
    }

    fn process(&mut self, data: ProcessData, _parameters: &Params) -> Result<ProcessData> {
        let container = data.into_container()?;
        let mut out = self.normalizer.normalize(&container)?;
        record_step(
            out.processing_chain_mut(),
            "normalization",
            &self.init_parameters,
            self.input_kind(),
            self.output_kind(),
        )?;
        Ok(ProcessData::Container(out))
    }
}

#[derive(Debug, serde::Deserialize)]
struct StreamStatistics {
    mean: Vec<f64>,
    std: Vec<f64>,
}

#[derive(Debug, serde::Deserialize)]
struct RepositoryNormalizationConfig {
    normalizers: BTreeMap<String, StreamStatistics>,
}

/// Per-label normalization fan-out step; see [`RepositoryNormalizer`].
#[derive(Debug)]
pub struct RepositoryNormalizationProcessor {
    normalizer: RepositoryNormalizer,
    init_parameters: Params,
}

impl RepositoryNormalizationProcessor {
    /// Build from a parameter map with per-label `mean`/`std` entries.
    pub fn from_params(parameters: &Params) -> Result<Self> {
        let config: RepositoryNormalizationConfig = parse_config(parameters)?;
        let mut normalizer = RepositoryNormalizer::new();
        for (label, statistics) in config.normalizers {
            normalizer.set_normalizer(
                label,
                Normalizer::from_mean_std(
                    Array1::from(statistics.mean),
                    Array1::from(statistics.std),
                )?,
            );
        }
        Ok(Self {
            normalizer,
            init_parameters: parameters.clone(),
        })
    }
}

impl Processor for RepositoryNormalizationProcessor {
    fn input_kind(&self) -> ChainItemKind {
        ChainItemKind::DataRepository
    }

    fn output_kind(&self) -> ChainItemKind {
        ChainItemKind::DataRepository
    }

    fn process(&mut self, data: ProcessData, _parameters: &Params) -> Result<ProcessData> {
        let repository = data.into_repository()?;
        let mut out = self.normalizer.normalize(&repository)?;
        record_step(
            out.processing_chain_mut(),
            "repository_normalization",
            &self.init_parameters,
            self.input_kind(),
            self.output_kind(),
        )?;
        Ok(ProcessData::Repository(out))
    }
}

/// Multi-stream stacking step; see [`Stacker`].
#[derive(Debug)]
pub struct StackingProcessor {
    stacker: Stacker,
    init_parameters: Params,
}

impl StackingProcessor {
    /// Build from a [`StackerConfig`] parameter map.
    pub fn from_params(parameters: &Params) -> Result<Self> {
        let config: StackerConfig = parse_config(parameters)?;
        Ok(Self {
            stacker: Stacker::new(config)?,
            init_parameters: parameters.clone(),
        })
    }
}

impl Processor for StackingProcessor {
    fn input_kind(&self) -> ChainItemKind {
        ChainItemKind::DataRepository
    }

    fn output_kind(&self) -> ChainItemKind {
        ChainItemKind::DataContainer
    }

    fn process(&mut self, data: ProcessData, _parameters: &Params) -> Result<ProcessData> {
        let repository = data.into_repository()?;
        let mut out = self.stacker.stack(&repository)?;
        record_step(
            out.processing_chain_mut(),
            "stacking",
            &self.init_parameters,
            self.input_kind(),
            self.output_kind(),
        )?;
        Ok(ProcessData::Container(out))
    }
}

#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
enum MaskMode {
    /// Remove the event-covered frames.
    #[default]
    Remove,
    /// Keep only the event-covered frames.
    Select,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct MaskingConfig {
    mode: MaskMode,
}

/// Event-driven frame masking fan-out step; see [`Masker`] and
/// [`Selector`]. The events to apply arrive in the process parameters
/// under `mask_events`.
#[derive(Debug)]
pub struct RepositoryMaskingProcessor {
    mode: MaskMode,
    init_parameters: Params,
}

impl RepositoryMaskingProcessor {
    /// Build from a parameter map with an optional `mode`.
    pub fn from_params(parameters: &Params) -> Result<Self> {
        let config: MaskingConfig = parse_config(parameters)?;
        Ok(Self {
            mode: config.mode,
            init_parameters: parameters.clone(),
        })
    }
}

impl Processor for RepositoryMaskingProcessor {
    fn input_kind(&self) -> ChainItemKind {
        ChainItemKind::DataRepository
    }

    fn output_kind(&self) -> ChainItemKind {
        ChainItemKind::DataRepository
    }

    fn process(&mut self, data: ProcessData, parameters: &Params) -> Result<ProcessData> {
        let repository = data.into_repository()?;

        let events = parameters.get("mask_events").ok_or_else(|| {
            PipelineError::configuration("masking requires a [mask_events] parameter")
        })?;
        let items: Vec<MetaItem> = serde_json::from_value(events.clone())?;
        let events = MetaDataContainer::from_items(items);

        let mut out = match self.mode {
            MaskMode::Remove => Masker::new().mask(&repository, &events)?,
            MaskMode::Select => Selector::new().select(&repository, &events)?,
        };
        record_step(
            out.processing_chain_mut(),
            "repository_masking",
            &self.init_parameters,
            self.input_kind(),
            self.output_kind(),
        )?;
        Ok(ProcessData::Repository(out))
    }
}

/// Event roll encoding step; see [`EventRollEncoder`].
#[derive(Debug)]
pub struct EventRollEncodingProcessor {
    encoder: EventRollEncoder,
    init_parameters: Params,
}

impl EventRollEncodingProcessor {
    /// Build from an [`EventRollEncoderConfig`] parameter map.
    pub fn from_params(parameters: &Params) -> Result<Self> {
        let config: EventRollEncoderConfig = parse_config(parameters)?;
        Ok(Self {
            encoder: EventRollEncoder::new(config)?,
            init_parameters: parameters.clone(),
        })
    }
}

impl Processor for EventRollEncodingProcessor {
    fn input_kind(&self) -> ChainItemKind {
        ChainItemKind::Metadata
    }

    fn output_kind(&self) -> ChainItemKind {
        ChainItemKind::DataContainer
    }

    fn process(&mut self, data: ProcessData, _parameters: &Params) -> Result<ProcessData> {
        let events = data.into_metadata()?;
        let mut out = self.encoder.encode(&events)?;
        record_step(
            out.processing_chain_mut(),
            "event_roll_encoding",
            &self.init_parameters,
            self.input_kind(),
            self.output_kind(),
        )?;
        Ok(ProcessData::Container(out))
    }
}
