//! Mean/standard-deviation normalization with streaming accumulation.
//!
//! A [`Normalizer`] is built in two phases: feed it any number of
//! containers with [`Normalizer::accumulate`], then call
//! [`Normalizer::finalize`] to turn the accumulated sums into per-feature
//! mean and standard deviation. Only `n`, `sum` and `sum of squares` are
//! stored between calls, so a corpus of any size normalizes in one pass
//! per container. [`RepositoryNormalizer`] fans the same operation out
//! over every stream of a repository, one normalizer per label.

use std::collections::BTreeMap;

use ndarray::{Array1, Axis};

use crate::container::{AxisRole, DataContainer, DataRepository};
use crate::error::{PipelineError, Result};
use crate::manipulators::assert_aligned;

/// Streaming per-feature mean/std normalizer.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    n: usize,
    s1: Option<Array1<f64>>,
    s2: Option<Array1<f64>>,
    mean: Option<Array1<f64>>,
    std: Option<Array1<f64>>,
}

impl Normalizer {
    /// Create an empty normalizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a normalizer from precomputed statistics.
    pub fn from_mean_std(mean: Array1<f64>, std: Array1<f64>) -> Result<Self> {
        if mean.len() != std.len() {
            return Err(PipelineError::configuration(format!(
                "mean length ({}) does not match std length ({})",
                mean.len(),
                std.len()
            )));
        }
        Ok(Self {
            n: 0,
            s1: None,
            s2: None,
            mean: Some(mean),
            std: Some(std),
        })
    }

    /// Frames accumulated so far.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Finalized per-feature mean, if available.
    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.mean.as_ref()
    }

    /// Finalized per-feature standard deviation, if available.
    pub fn std(&self) -> Option<&Array1<f64>> {
        self.std.as_ref()
    }

    /// Fold a `[Data, Time]` container into the accumulated sums.
    pub fn accumulate(&mut self, container: &DataContainer) -> Result<()> {
        if container.axes() != [AxisRole::Data, AxisRole::Time] {
            return Err(PipelineError::configuration(
                "normalization requires a [data, time] container",
            ));
        }

        let data = container
            .get_focused()
            .into_dimensionality::<ndarray::Ix2>()?;
        let s1 = data.sum_axis(Axis(1));
        let s2 = data.mapv(|v| v * v).sum_axis(Axis(1));

        match (&mut self.s1, &mut self.s2) {
            (Some(acc1), Some(acc2)) => {
                if acc1.len() != s1.len() {
                    return Err(PipelineError::configuration(format!(
                        "accumulated vector length ({}) does not match container ({})",
                        acc1.len(),
                        s1.len()
                    )));
                }
                *acc1 += &s1;
                *acc2 += &s2;
            }
            _ => {
                self.s1 = Some(s1);
                self.s2 = Some(s2);
            }
        }

        self.n += data.ncols();
        Ok(())
    }

    /// Turn the accumulated sums into mean and sample standard deviation
    /// (ddof 1).
    pub fn finalize(&mut self) -> Result<()> {
        let (s1, s2) = match (self.s1.clone(), self.s2.clone()) {
            (Some(s1), Some(s2)) => (s1, s2),
            _ => {
                return Err(PipelineError::configuration(
                    "no data accumulated before finalize",
                ))
            }
        };
        if self.n < 2 {
            return Err(PipelineError::configuration(format!(
                "normalization statistics require at least 2 frames, got {}",
                self.n
            )));
        }

        let n = self.n as f64;
        self.std = Some(
            (s2 * n - s1.mapv(|v| v * v)).mapv(|v| (v / (n * (n - 1.0))).sqrt()),
        );
        self.mean = Some(s1 / n);
        Ok(())
    }

    /// Discard all state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply `(x - mean) / std` per feature to a `[Data, Time]` container.
    ///
    /// The input is not mutated; a normalized copy is returned.
    pub fn normalize(&self, container: &DataContainer) -> Result<DataContainer> {
        let (mean, std) = match (&self.mean, &self.std) {
            (Some(mean), Some(std)) => (mean, std),
            _ => {
                return Err(PipelineError::configuration(
                    "normalizer has no finalized statistics",
                ))
            }
        };
        if container.axes() != [AxisRole::Data, AxisRole::Time] {
            return Err(PipelineError::configuration(
                "normalization requires a [data, time] container",
            ));
        }
        if container.vector_length() != mean.len() {
            return Err(PipelineError::configuration(format!(
                "container vector length ({}) does not match statistics ({})",
                container.vector_length(),
                mean.len()
            )));
        }

        let data = container
            .get_focused()
            .into_dimensionality::<ndarray::Ix2>()?;
        let normalized = (&data - &mean.clone().insert_axis(Axis(1)))
            / &std.clone().insert_axis(Axis(1));

        let mut out = DataContainer::from_matrix(normalized, container.time_resolution());
        *out.processing_chain_mut() = container.processing_chain().clone();
        Ok(out)
    }
}

/// Per-label normalization across every stream of a repository.
#[derive(Debug, Clone, Default)]
pub struct RepositoryNormalizer {
    normalizers: BTreeMap<String, Normalizer>,
}

impl RepositoryNormalizer {
    /// Create an empty fan-out normalizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the normalizer used for a label.
    pub fn set_normalizer<S: Into<String>>(&mut self, label: S, normalizer: Normalizer) {
        self.normalizers.insert(label.into(), normalizer);
    }

    /// Normalize every container of the repository with its label's
    /// normalizer. All containers must agree on frame count and time
    /// resolution.
    pub fn normalize(&self, repository: &DataRepository) -> Result<DataRepository> {
        assert_aligned(repository.iter().map(|(_, _, container)| container))?;

        let mut out = DataRepository::new().with_default_stream_id(repository.default_stream_id());
        *out.processing_chain_mut() = repository.processing_chain().clone();

        for (label, stream_id, container) in repository.iter() {
            let normalizer = self.normalizers.get(label).ok_or_else(|| {
                PipelineError::configuration(format!("no normalizer assigned for label [{label}]"))
            })?;
            out.set_container(label, Some(stream_id), normalizer.normalize(container)?);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn container(values: &[[f64; 2]; 1]) -> DataContainer {
        DataContainer::from_matrix(arr2(values), Some(0.02))
    }

    #[test]
    fn test_accumulate_finalize_normalize() {
        let mut normalizer = Normalizer::new();
        normalizer.accumulate(&container(&[[1.0, 2.0]])).unwrap();
        normalizer.accumulate(&container(&[[3.0, 4.0]])).unwrap();
        normalizer.finalize().unwrap();

        assert_eq!(normalizer.n(), 4);
        assert!((normalizer.mean().unwrap()[0] - 2.5).abs() < 1e-9);
        // Sample std (ddof 1) of [1, 2, 3, 4].
        assert!((normalizer.std().unwrap()[0] - 1.2909944487358056).abs() < 1e-9);

        let out = normalizer.normalize(&container(&[[2.5, 4.0]])).unwrap();
        assert!(out.data()[[0, 0]].abs() < 1e-9);
        assert!((out.data()[[0, 1]] - 1.5 / 1.2909944487358056).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_requires_finalized_statistics() {
        let mut normalizer = Normalizer::new();
        normalizer.accumulate(&container(&[[1.0, 2.0]])).unwrap();
        assert!(normalizer.normalize(&container(&[[1.0, 2.0]])).is_err());
    }

    #[test]
    fn test_vector_length_mismatch_rejected() {
        let mut normalizer = Normalizer::new();
        normalizer.accumulate(&container(&[[1.0, 2.0]])).unwrap();

        let wider = DataContainer::from_matrix(arr2(&[[1.0, 2.0], [3.0, 4.0]]), None);
        assert!(normalizer.accumulate(&wider).is_err());
    }

    #[test]
    fn test_reset() {
        let mut normalizer = Normalizer::new();
        normalizer.accumulate(&container(&[[1.0, 2.0]])).unwrap();
        normalizer.reset();
        assert_eq!(normalizer.n(), 0);
        assert!(normalizer.finalize().is_err());
    }

    #[test]
    fn test_repository_normalization() {
        let normalizer = Normalizer::from_mean_std(
            Array1::from(vec![1.0]),
            Array1::from(vec![2.0]),
        )
        .unwrap();

        let mut fanout = RepositoryNormalizer::new();
        fanout.set_normalizer("mel", normalizer);

        let mut repo = DataRepository::new();
        repo.set_container("mel", Some(0), container(&[[3.0, 5.0]]));
        repo.set_container("mel", Some(1), container(&[[1.0, 1.0]]));

        let out = fanout.normalize(&repo).unwrap();
        let first = out.get_container("mel", Some(0)).unwrap();
        assert!((first.data()[[0, 0]] - 1.0).abs() < 1e-9);
        assert!((first.data()[[0, 1]] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_repository_missing_label_rejected() {
        let fanout = RepositoryNormalizer::new();
        let mut repo = DataRepository::new();
        repo.set_container("mel", None, container(&[[1.0, 2.0]]));
        assert!(fanout.normalize(&repo).is_err());
    }

    #[test]
    fn test_repository_frame_count_guard() {
        let mut fanout = RepositoryNormalizer::new();
        fanout.set_normalizer(
            "mel",
            Normalizer::from_mean_std(Array1::from(vec![0.0]), Array1::from(vec![1.0])).unwrap(),
        );

        let mut repo = DataRepository::new();
        repo.set_container("mel", Some(0), container(&[[1.0, 2.0]]));
        repo.set_container(
            "mel",
            Some(1),
            DataContainer::from_matrix(arr2(&[[1.0, 2.0, 3.0]]), Some(0.02)),
        );

        let err = fanout.normalize(&repo).unwrap_err();
        assert!(matches!(err, PipelineError::FrameCountMismatch(counts) if counts == vec![2, 3]));
    }
}
