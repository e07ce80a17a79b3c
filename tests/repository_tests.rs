//! Integration tests for multi-stream repositories and their fan-out
//! operations.
//!
//! # Test Categories
//!
//! 1. **Repository**: sorted views, stream addressing
//! 2. **Stacking**: recipe assembly, alignment guards
//! 3. **Normalization**: corpus statistics applied per label
//! 4. **Masking / Encoding**: event-driven frame ops through chains

use feature_pipeline::prelude::*;
use ndarray::Array2;
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

/// Parameter map from a JSON object literal.
fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

/// Feature matrix where feature f at frame t holds (base + f * 10 + t).
fn features(base: usize, rows: usize, frames: usize) -> DataContainer {
    DataContainer::from_matrix(
        Array2::from_shape_fn((rows, frames), |(f, t)| (base + f * 10 + t) as f64),
        Some(0.1),
    )
}

/// Repository with mel (3 rows) and mfcc (2 rows) streams of 6 frames.
fn repository() -> DataRepository {
    let mut repo = DataRepository::new();
    repo.set_container("mel", Some(0), features(0, 3, 6));
    repo.set_container("mfcc", Some(0), features(100, 2, 6));
    repo
}

// =============================================================================
// Repository
// =============================================================================

#[test]
fn test_sorted_views_and_stream_addressing() {
    let mut repo = repository();
    repo.set_container("mel", Some(2), features(200, 3, 6));

    assert_eq!(repo.labels(), vec!["mel", "mfcc"]);
    assert_eq!(repo.stream_ids("mel"), vec![0, 2]);
    assert_eq!(repo.container_count(), 3);

    let second = repo.get_container("mel", Some(2)).unwrap();
    assert_eq!(second.data()[[0, 0]], 200.0);
}

// =============================================================================
// Stacking
// =============================================================================

#[test]
fn test_stacking_through_chain() {
    let registry = ProcessorRegistry::with_builtins();
    let mut chain = ProcessingChain::new();
    chain
        .push_processor(
            "stacking",
            &registry,
            params(json!({
                "recipe": [
                    { "label": "mfcc" },
                    { "label": "mel", "vector_range": [0, 2] },
                ],
            })),
            Params::new(),
            Vec::new(),
            None,
        )
        .unwrap();

    let out = chain
        .process(
            &registry,
            Some(ProcessData::Repository(repository())),
            &Params::new(),
        )
        .unwrap()
        .into_container()
        .unwrap();

    // mfcc rows first, then mel rows 0..2, in recipe order.
    assert_eq!(out.shape(), &[4, 6]);
    assert_eq!(out.data()[[0, 0]], 100.0);
    assert_eq!(out.data()[[2, 0]], 0.0);
    assert_eq!(out.data()[[3, 5]], 15.0);
    assert!(out.processing_chain().chain_item_exists("stacking"));
}

#[test]
fn test_stacking_guard_names_every_frame_count() {
    let mut repo = repository();
    repo.set_container("mfcc", Some(0), features(100, 2, 9));

    let stacker = Stacker::new(StackerConfig {
        recipe: vec![StackPart::full("mel"), StackPart::full("mfcc")],
        hop: 1,
    })
    .unwrap();

    let err = stacker.stack(&repo).unwrap_err();
    assert!(matches!(err, PipelineError::FrameCountMismatch(counts) if counts == vec![6, 9]));
}

#[test]
fn test_stacking_guard_on_time_resolution() {
    let mut repo = repository();
    let mut off_grid = features(100, 2, 6);
    off_grid.set_time_resolution(Some(0.2));
    repo.set_container("mfcc", Some(0), off_grid);

    let stacker = Stacker::new(StackerConfig {
        recipe: vec![StackPart::full("mel"), StackPart::full("mfcc")],
        hop: 1,
    })
    .unwrap();

    assert!(matches!(
        stacker.stack(&repo).unwrap_err(),
        PipelineError::TimeResolutionMismatch(_)
    ));
}

// =============================================================================
// Normalization
// =============================================================================

#[test]
fn test_corpus_statistics_applied_per_label() {
    // Accumulate statistics over a two-file corpus, then normalize a
    // repository through the chain.
    let mut mel_normalizer = Normalizer::new();
    mel_normalizer.accumulate(&features(0, 3, 6)).unwrap();
    mel_normalizer.accumulate(&features(6, 3, 6)).unwrap();
    mel_normalizer.finalize().unwrap();

    let mean = mel_normalizer.mean().unwrap().to_vec();
    let std = mel_normalizer.std().unwrap().to_vec();

    let registry = ProcessorRegistry::with_builtins();
    let mut chain = ProcessingChain::new();
    chain
        .push_processor(
            "repository_normalization",
            &registry,
            params(json!({
                "normalizers": {
                    "mel": { "mean": mean, "std": std },
                    "mfcc": { "mean": [0.0, 0.0], "std": [1.0, 1.0] },
                },
            })),
            Params::new(),
            Vec::new(),
            None,
        )
        .unwrap();

    let out = chain
        .process(
            &registry,
            Some(ProcessData::Repository(repository())),
            &Params::new(),
        )
        .unwrap()
        .into_repository()
        .unwrap();

    let mel = out.get_container("mel", Some(0)).unwrap();
    // The corpus mean per feature row sits 3 above this repository's
    // row means, so normalized values center below zero.
    let row_mean = mel.data().to_owned().mean_axis(ndarray::Axis(1)).unwrap();
    assert!(row_mean[[0]] < 0.0);

    // mfcc used identity statistics and passes through unchanged.
    let mfcc = out.get_container("mfcc", Some(0)).unwrap();
    assert_eq!(mfcc.data()[[0, 0]], 100.0);
}

#[test]
fn test_normalizer_round_trip_centers_its_own_corpus() {
    let corpus = features(0, 2, 6);
    let mut normalizer = Normalizer::new();
    normalizer.accumulate(&corpus).unwrap();
    normalizer.finalize().unwrap();

    let mut out = normalizer.normalize(&corpus).unwrap();
    let stats = out.stats();
    assert!(stats.mean[[0]].abs() < 1e-9);
    assert!(stats.mean[[1]].abs() < 1e-9);
}

// =============================================================================
// Masking / Encoding
// =============================================================================

#[test]
fn test_masking_chain_drops_event_frames_everywhere() {
    let registry = ProcessorRegistry::with_builtins();
    let mut chain = ProcessingChain::new();
    chain
        .push_processor(
            "repository_masking",
            &registry,
            Params::new(),
            params(json!({
                "mask_events": [
                    { "onset": 0.0, "offset": 0.2, "label": "glitch" },
                ],
            })),
            Vec::new(),
            None,
        )
        .unwrap();

    let out = chain
        .process(
            &registry,
            Some(ProcessData::Repository(repository())),
            &Params::new(),
        )
        .unwrap()
        .into_repository()
        .unwrap();

    // Frames 0 and 1 are removed from every stream.
    for label in ["mel", "mfcc"] {
        let container = out.get_container(label, Some(0)).unwrap();
        assert_eq!(container.length(), 4);
    }
    assert_eq!(out.get_container("mel", Some(0)).unwrap().data()[[0, 0]], 2.0);
}

#[test]
fn test_event_roll_chain_from_metadata() {
    let registry = ProcessorRegistry::with_builtins();
    let mut chain = ProcessingChain::new();
    chain
        .push_processor(
            "event_roll_encoding",
            &registry,
            params(json!({
                "label_list": ["music", "speech"],
                "time_resolution": 0.1,
            })),
            Params::new(),
            Vec::new(),
            None,
        )
        .unwrap();

    let events = MetaDataContainer::from_items(vec![
        MetaItem::new(0.0, 0.25, "music"),
        MetaItem::new(0.2, 0.5, "speech"),
    ]);

    let out = chain
        .process(
            &registry,
            Some(ProcessData::Metadata(events)),
            &Params::new(),
        )
        .unwrap()
        .into_container()
        .unwrap();

    assert_eq!(out.shape(), &[2, 5]);
    assert_eq!(out.data()[[0, 0]], 1.0);
    assert_eq!(out.data()[[0, 3]], 0.0);
    assert_eq!(out.data()[[1, 2]], 1.0);
    assert_eq!(out.data()[[1, 4]], 1.0);
}

#[test]
fn test_metadata_into_container_chain_is_rejected() {
    let registry = ProcessorRegistry::with_builtins();
    let mut chain = ProcessingChain::new();
    chain
        .push_processor(
            "sequencing",
            &registry,
            params(json!({ "frames": 2 })),
            Params::new(),
            Vec::new(),
            None,
        )
        .unwrap();

    let err = chain
        .process(
            &registry,
            Some(ProcessData::Metadata(MetaDataContainer::new())),
            &Params::new(),
        )
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnexpectedData { .. }));
}
