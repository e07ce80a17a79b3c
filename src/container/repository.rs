//! Multi-stream container repository.
//!
//! A [`DataRepository`] keys [`DataContainer`]s by `(label, stream_id)`:
//! the label names a data type ("mel", "mfcc") and the stream id numbers
//! parallel sources (microphone channels, file variants). Fan-out
//! operations such as stacking and repository-wide normalization walk this
//! two-level map; both levels iterate in sorted order so their output is
//! deterministic.

use std::collections::BTreeMap;

use crate::container::data::DataContainer;
use crate::processing::ProcessingChain;

/// Two-level `(label, stream_id)` map of data containers.
#[derive(Debug, Clone, Default)]
pub struct DataRepository {
    streams: BTreeMap<String, BTreeMap<u32, DataContainer>>,
    default_stream_id: u32,
    processing_chain: ProcessingChain,
}

impl DataRepository {
    /// Create an empty repository with default stream id 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the stream id used when none is given.
    pub fn with_default_stream_id(mut self, stream_id: u32) -> Self {
        self.default_stream_id = stream_id;
        self
    }

    /// Stream id used when none is given.
    pub fn default_stream_id(&self) -> u32 {
        self.default_stream_id
    }

    /// Store a container under `(label, stream_id)`, replacing any
    /// previous entry.
    pub fn set_container<S: Into<String>>(
        &mut self,
        label: S,
        stream_id: Option<u32>,
        container: DataContainer,
    ) {
        let stream_id = stream_id.unwrap_or(self.default_stream_id);
        self.streams
            .entry(label.into())
            .or_default()
            .insert(stream_id, container);
    }

    /// Look up the container under `(label, stream_id)`.
    pub fn get_container(&self, label: &str, stream_id: Option<u32>) -> Option<&DataContainer> {
        let stream_id = stream_id.unwrap_or(self.default_stream_id);
        self.streams.get(label)?.get(&stream_id)
    }

    /// Mutable lookup under `(label, stream_id)`.
    pub fn get_container_mut(
        &mut self,
        label: &str,
        stream_id: Option<u32>,
    ) -> Option<&mut DataContainer> {
        let stream_id = stream_id.unwrap_or(self.default_stream_id);
        self.streams.get_mut(label)?.get_mut(&stream_id)
    }

    /// All labels, sorted.
    pub fn labels(&self) -> Vec<&str> {
        self.streams.keys().map(String::as_str).collect()
    }

    /// Stream ids stored under a label, sorted.
    pub fn stream_ids(&self, label: &str) -> Vec<u32> {
        self.streams
            .get(label)
            .map(|streams| streams.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Total number of stored containers.
    pub fn container_count(&self) -> usize {
        self.streams.values().map(BTreeMap::len).sum()
    }

    /// True when no containers are stored.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Iterate all containers in `(label, stream_id)` order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32, &DataContainer)> {
        self.streams.iter().flat_map(|(label, streams)| {
            streams
                .iter()
                .map(move |(&stream_id, container)| (label.as_str(), stream_id, container))
        })
    }

    /// Iterate all containers mutably in `(label, stream_id)` order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, u32, &mut DataContainer)> {
        self.streams.iter_mut().flat_map(|(label, streams)| {
            streams
                .iter_mut()
                .map(move |(&stream_id, container)| (label.as_str(), stream_id, container))
        })
    }

    /// Processing chain recording this repository's provenance.
    pub fn processing_chain(&self) -> &ProcessingChain {
        &self.processing_chain
    }

    /// Mutable processing chain.
    pub fn processing_chain_mut(&mut self) -> &mut ProcessingChain {
        &mut self.processing_chain
    }
}
