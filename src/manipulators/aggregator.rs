//! Sliding-window statistics over feature matrices.
//!
//! The [`Aggregator`] replaces each window of a `[Data, Time]` matrix with
//! a recipe of per-feature statistics, producing a new `[Data, Time]`
//! matrix with one column per window. The output time resolution scales by
//! the hop length. Statistics always appear in a fixed canonical order
//! (mean, std, cov, kurtosis, skew, flatten) regardless of recipe order,
//! so the output row layout is a function of the recipe set alone.

use ndarray::{Array1, Array2, Axis};

use crate::container::{AxisRole, DataContainer};
use crate::error::{PipelineError, Result};

/// One statistic computable over a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationRecipe {
    /// Per-feature mean.
    Mean,
    /// Per-feature population standard deviation (ddof 0).
    Std,
    /// Flattened sample covariance matrix of the features (ddof 1).
    Cov,
    /// Per-feature excess kurtosis (biased).
    Kurtosis,
    /// Per-feature skewness (biased).
    Skew,
    /// Window frames concatenated in time order, each frame's feature
    /// vector contiguous.
    Flatten,
}

/// Canonical output order of the statistics.
const RECIPE_ORDER: [AggregationRecipe; 6] = [
    AggregationRecipe::Mean,
    AggregationRecipe::Std,
    AggregationRecipe::Cov,
    AggregationRecipe::Kurtosis,
    AggregationRecipe::Skew,
    AggregationRecipe::Flatten,
];

/// Aggregation parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Statistics to compute per window.
    pub recipe: Vec<AggregationRecipe>,
    /// Window length in frames.
    pub win_length_frames: usize,
    /// Hop between window centers in frames.
    pub hop_length_frames: usize,
    /// Center windows on the hop position instead of starting there.
    pub center: bool,
    /// Edge-replicate out-of-range frames instead of skipping the window.
    pub padding: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            recipe: Vec::new(),
            win_length_frames: 10,
            hop_length_frames: 1,
            center: true,
            padding: true,
        }
    }
}

impl AggregatorConfig {
    /// Check parameter consistency.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.recipe.is_empty() {
            return Err("aggregation recipe is empty".into());
        }
        if self.win_length_frames == 0 {
            return Err("win_length_frames must be > 0".into());
        }
        if self.hop_length_frames == 0 {
            return Err("hop_length_frames must be > 0".into());
        }
        Ok(())
    }
}

/// Stateless window statistics engine.
#[derive(Debug, Clone)]
pub struct Aggregator {
    config: AggregatorConfig,
}

impl Aggregator {
    /// Create an aggregator from validated parameters.
    pub fn new(config: AggregatorConfig) -> Result<Self> {
        config.validate().map_err(PipelineError::configuration)?;
        Ok(Self { config })
    }

    /// Aggregation parameters.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Aggregate the focused view of a `[Data, Time]` container.
    pub fn aggregate(&self, container: &DataContainer) -> Result<DataContainer> {
        if container.axes() != [AxisRole::Data, AxisRole::Time] {
            return Err(PipelineError::configuration(
                "aggregation requires a [data, time] container",
            ));
        }

        let source = container
            .get_focused()
            .into_dimensionality::<ndarray::Ix2>()?;
        let rows = source.nrows();
        let length = source.ncols();
        let win = self.config.win_length_frames;
        let hop = self.config.hop_length_frames;

        let mut columns: Vec<Vec<f64>> = Vec::new();
        let mut position = 0;
        while position < length {
            if let Some(ids) = self.window_frame_ids(position, length) {
                let window = source.select(Axis(1), &ids);
                columns.push(self.aggregate_window(&window));
            }
            position += hop;
        }

        if columns.is_empty() {
            return Err(PipelineError::configuration(format!(
                "no valid aggregation window (win_length_frames={win}, data_length={length}); \
                 shorten the window or enable padding"
            )));
        }

        let out_rows = self.output_rows(rows, win);
        let mut out = Array2::zeros((out_rows, columns.len()));
        for (i, column) in columns.into_iter().enumerate() {
            out.column_mut(i).assign(&Array1::from(column));
        }

        let mut result = DataContainer::from_matrix(
            out,
            container.time_resolution().map(|res| res * hop as f64),
        );
        *result.processing_chain_mut() = container.processing_chain().clone();
        Ok(result)
    }

    /// Frame ids of the window at a hop position, or `None` when the
    /// window runs out of range and padding is disabled.
    fn window_frame_ids(&self, position: usize, length: usize) -> Option<Vec<usize>> {
        let win = self.config.win_length_frames as isize;
        let position = position as isize;

        let (start, stop) = if self.config.center {
            (position - win / 2, position + (win + 1) / 2)
        } else {
            (position, position + win)
        };

        if !self.config.padding && (start < 0 || stop > length as isize) {
            return None;
        }

        Some(
            (start..stop)
                .map(|id| id.clamp(0, length as isize - 1) as usize)
                .collect(),
        )
    }

    /// Output column for one window, statistics in canonical order.
    fn aggregate_window(&self, window: &Array2<f64>) -> Vec<f64> {
        let mut column = Vec::new();

        for statistic in RECIPE_ORDER {
            if !self.config.recipe.contains(&statistic) {
                continue;
            }
            match statistic {
                AggregationRecipe::Mean => {
                    column.extend(window.mean_axis(Axis(1)).into_iter().flatten());
                }
                AggregationRecipe::Std => {
                    column.extend(window.std_axis(Axis(1), 0.0));
                }
                AggregationRecipe::Cov => {
                    column.extend(Self::covariance(window));
                }
                AggregationRecipe::Kurtosis => {
                    for row in window.rows() {
                        let (m2, _, m4) = Self::central_moments(&row.to_owned());
                        column.push(m4 / (m2 * m2) - 3.0);
                    }
                }
                AggregationRecipe::Skew => {
                    for row in window.rows() {
                        let (m2, m3, _) = Self::central_moments(&row.to_owned());
                        column.push(m3 / m2.powf(1.5));
                    }
                }
                AggregationRecipe::Flatten => {
                    // Time-major: each frame's feature vector contiguous.
                    for frame in window.columns() {
                        column.extend(frame.iter().copied());
                    }
                }
            }
        }

        column
    }

    /// Flattened sample covariance matrix of the window rows.
    fn covariance(window: &Array2<f64>) -> Vec<f64> {
        let n = window.ncols() as f64;
        let mean = window
            .mean_axis(Axis(1))
            .unwrap_or_else(|| Array1::zeros(window.nrows()));
        let centered = window - &mean.insert_axis(Axis(1));
        let cov = centered.dot(&centered.t()) / (n - 1.0);
        cov.iter().copied().collect()
    }

    /// Second, third and fourth central moments of one feature row.
    fn central_moments(row: &Array1<f64>) -> (f64, f64, f64) {
        let n = row.len() as f64;
        let mean = row.sum() / n;
        let mut m2 = 0.0;
        let mut m3 = 0.0;
        let mut m4 = 0.0;
        for &value in row {
            let d = value - mean;
            m2 += d * d;
            m3 += d * d * d;
            m4 += d * d * d * d;
        }
        (m2 / n, m3 / n, m4 / n)
    }

    /// Output row count for a given input height and window length.
    fn output_rows(&self, rows: usize, win: usize) -> usize {
        RECIPE_ORDER
            .iter()
            .filter(|statistic| self.config.recipe.contains(statistic))
            .map(|statistic| match statistic {
                AggregationRecipe::Mean
                | AggregationRecipe::Std
                | AggregationRecipe::Kurtosis
                | AggregationRecipe::Skew => rows,
                AggregationRecipe::Cov => rows * rows,
                AggregationRecipe::Flatten => rows * win,
            })
            .sum()
    }
}
