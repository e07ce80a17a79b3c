//! Event-driven frame selection and removal.
//!
//! [`Selector`] keeps only the frames covered by a set of annotated
//! events; [`Masker`] removes them. Both fan out over every stream of a
//! repository and convert event times with the onset-floor / offset-ceil
//! convention, so a sub-frame event still touches at least one frame.
//! Events lacking an onset or an offset are ignored.

use crate::container::{DataContainer, DataRepository, MetaDataContainer, Rounding};
use crate::error::Result;
use crate::manipulators::assert_aligned;

/// Frames covered by the events, onset floored and offset ceiled, clipped
/// into the container's range.
fn event_frame_spans(
    container: &DataContainer,
    events: &MetaDataContainer,
) -> Result<Vec<(usize, usize)>> {
    let mut spans = Vec::new();
    for item in events.items() {
        let (onset, offset) = match (item.onset, item.offset) {
            (Some(onset), Some(offset)) => (onset, offset),
            _ => continue,
        };
        let start = container.time_to_frame(onset, Rounding::Floor)?;
        let stop = container.time_to_frame(offset, Rounding::Ceil)?;
        if start < stop {
            spans.push((start, stop));
        }
    }
    Ok(spans)
}

fn apply_to_repository<F>(repository: &DataRepository, op: F) -> Result<DataRepository>
where
    F: Fn(&DataContainer) -> Result<DataContainer>,
{
    assert_aligned(repository.iter().map(|(_, _, container)| container))?;

    let mut out = DataRepository::new().with_default_stream_id(repository.default_stream_id());
    *out.processing_chain_mut() = repository.processing_chain().clone();

    for (label, stream_id, container) in repository.iter() {
        out.set_container(label, Some(stream_id), op(container)?);
    }

    Ok(out)
}

/// Keeps the frames covered by events, in event order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selector;

impl Selector {
    /// Create a selector.
    pub fn new() -> Self {
        Self
    }

    /// Keep the event-covered frames of one container.
    pub fn select_container(
        &self,
        container: &DataContainer,
        events: &MetaDataContainer,
    ) -> Result<DataContainer> {
        let mut ids = Vec::new();
        for (start, stop) in event_frame_spans(container, events)? {
            ids.extend(start..stop);
        }

        let mut out = DataContainer::new(
            container.get_frames(&ids)?,
            container.axes().to_vec(),
            container.time_resolution(),
        )?;
        *out.processing_chain_mut() = container.processing_chain().clone();
        Ok(out)
    }

    /// Keep the event-covered frames of every stream in a repository.
    pub fn select(
        &self,
        repository: &DataRepository,
        events: &MetaDataContainer,
    ) -> Result<DataRepository> {
        apply_to_repository(repository, |container| {
            self.select_container(container, events)
        })
    }
}

/// Removes the frames covered by events.
#[derive(Debug, Clone, Copy, Default)]
pub struct Masker;

impl Masker {
    /// Create a masker.
    pub fn new() -> Self {
        Self
    }

    /// Remove the event-covered frames of one container.
    pub fn mask_container(
        &self,
        container: &DataContainer,
        events: &MetaDataContainer,
    ) -> Result<DataContainer> {
        let mut keep = vec![true; container.length()];
        for (start, stop) in event_frame_spans(container, events)? {
            for flag in &mut keep[start..stop] {
                *flag = false;
            }
        }

        let ids: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(id, &kept)| kept.then_some(id))
            .collect();

        let mut out = DataContainer::new(
            container.get_frames(&ids)?,
            container.axes().to_vec(),
            container.time_resolution(),
        )?;
        *out.processing_chain_mut() = container.processing_chain().clone();
        Ok(out)
    }

    /// Remove the event-covered frames of every stream in a repository.
    pub fn mask(
        &self,
        repository: &DataRepository,
        events: &MetaDataContainer,
    ) -> Result<DataRepository> {
        apply_to_repository(repository, |container| {
            self.mask_container(container, events)
        })
    }
}
