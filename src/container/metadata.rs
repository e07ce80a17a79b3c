//! Event metadata: labeled time regions driving encoders and maskers.

use crate::processing::ProcessingChain;

/// A single annotated event: optional onset/offset in seconds and an
/// optional class label.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct MetaItem {
    /// Event start in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset: Option<f64>,
    /// Event end in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
    /// Class label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl MetaItem {
    /// Create an event with onset, offset and label all set.
    pub fn new<S: Into<String>>(onset: f64, offset: f64, label: S) -> Self {
        Self {
            onset: Some(onset),
            offset: Some(offset),
            label: Some(label.into()),
        }
    }
}

/// Ordered list of annotated events.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct MetaDataContainer {
    items: Vec<MetaItem>,
    #[serde(skip)]
    processing_chain: ProcessingChain,
}

impl MetaDataContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container from a list of events.
    pub fn from_items(items: Vec<MetaItem>) -> Self {
        Self {
            items,
            processing_chain: ProcessingChain::new(),
        }
    }

    /// Events in insertion order.
    pub fn items(&self) -> &[MetaItem] {
        &self.items
    }

    /// Append an event.
    pub fn push(&mut self, item: MetaItem) {
        self.items.push(item);
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no events are stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Largest offset across all events, if any event has one.
    pub fn max_offset(&self) -> Option<f64> {
        self.items
            .iter()
            .filter_map(|item| item.offset)
            .fold(None, |acc, offset| match acc {
                Some(best) if best >= offset => Some(best),
                _ => Some(offset),
            })
    }

    /// Sorted, deduplicated labels across all events.
    pub fn unique_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .items
            .iter()
            .filter_map(|item| item.label.clone())
            .collect();
        labels.sort();
        labels.dedup();
        labels
    }

    /// Processing chain recording this container's provenance.
    pub fn processing_chain(&self) -> &ProcessingChain {
        &self.processing_chain
    }

    /// Mutable processing chain.
    pub fn processing_chain_mut(&mut self) -> &mut ProcessingChain {
        &mut self.processing_chain
    }
}
