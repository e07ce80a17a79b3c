//! Data containers: focused matrices, event metadata, multi-stream maps.

pub mod data;
pub mod focus;
pub mod metadata;
pub mod repository;

pub use data::{AxisRole, DataContainer, Stats};
pub use focus::{FocusRange, FocusWindow, Rounding};
pub use metadata::{MetaDataContainer, MetaItem};
pub use repository::DataRepository;
