//! Event roll encoding: annotated events to a binary activity matrix.

use ndarray::Array2;

use crate::container::{AxisRole, DataContainer, MetaDataContainer};
use crate::error::{PipelineError, Result};

/// Event roll parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EventRollEncoderConfig {
    /// Output row per label, in this order.
    pub label_list: Vec<String>,
    /// Seconds per output frame.
    pub time_resolution: f64,
    /// Fixed output length in frames.
    #[serde(default)]
    pub length_frames: Option<usize>,
    /// Fixed output length in seconds, ceiled to frames. Ignored when
    /// `length_frames` is set.
    #[serde(default)]
    pub length_seconds: Option<f64>,
}

impl EventRollEncoderConfig {
    /// Check parameter consistency.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.label_list.is_empty() {
            return Err("label list is empty".into());
        }
        if self.time_resolution <= 0.0 {
            return Err(format!(
                "time_resolution must be > 0, got {}",
                self.time_resolution
            ));
        }
        Ok(())
    }
}

/// Encodes annotated events into a binary `[labels x frames]` matrix.
///
/// Each event marks `[floor(onset), ceil(offset))` on its label's row, so
/// a sub-frame event still occupies one frame. When no explicit length is
/// configured, the roll extends to the ceiled largest event offset.
#[derive(Debug, Clone)]
pub struct EventRollEncoder {
    config: EventRollEncoderConfig,
}

impl EventRollEncoder {
    /// Create an encoder from validated parameters.
    pub fn new(config: EventRollEncoderConfig) -> Result<Self> {
        config.validate().map_err(PipelineError::configuration)?;
        Ok(Self { config })
    }

    /// Encoder parameters.
    pub fn config(&self) -> &EventRollEncoderConfig {
        &self.config
    }

    /// Output length in frames for a set of events.
    fn length_frames(&self, events: &MetaDataContainer) -> Result<usize> {
        if let Some(frames) = self.config.length_frames {
            return Ok(frames);
        }
        if let Some(seconds) = self.config.length_seconds {
            return Ok((seconds / self.config.time_resolution).ceil() as usize);
        }
        match events.max_offset() {
            Some(offset) => Ok((offset / self.config.time_resolution).ceil() as usize),
            None => Err(PipelineError::configuration(
                "event roll length undefined: no explicit length and no event offsets",
            )),
        }
    }

    /// Encode events into a binary activity container.
    ///
    /// Fails on a label missing from the configured label list.
    pub fn encode(&self, events: &MetaDataContainer) -> Result<DataContainer> {
        let length = self.length_frames(events)?;
        let mut roll = Array2::zeros((self.config.label_list.len(), length));

        for item in events.items() {
            let label = match &item.label {
                Some(label) => label,
                None => continue,
            };
            let row = self
                .config
                .label_list
                .iter()
                .position(|candidate| candidate == label)
                .ok_or_else(|| PipelineError::UnknownLabel(label.clone()))?;

            let (onset, offset) = match (item.onset, item.offset) {
                (Some(onset), Some(offset)) => (onset, offset),
                _ => continue,
            };
            let start = ((onset / self.config.time_resolution).floor().max(0.0) as usize)
                .min(length);
            let stop = ((offset / self.config.time_resolution).ceil().max(0.0) as usize)
                .min(length);

            for frame in start..stop {
                roll[[row, frame]] = 1.0;
            }
        }

        let mut out = DataContainer::new(
            roll.into_dyn(),
            vec![AxisRole::Data, AxisRole::Time],
            Some(self.config.time_resolution),
        )?;
        out.metadata_mut().insert(
            "label_list".into(),
            serde_json::Value::from(self.config.label_list.clone()),
        );
        *out.processing_chain_mut() = events.processing_chain().clone();
        Ok(out)
    }
}
