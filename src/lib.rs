pub mod dedup;
pub mod error;
pub mod fs;
pub mod group;
pub mod metadata;
pub mod relocate;
pub mod resolve;
pub mod track;

pub use dedup::{Options, RunSummary, run};
pub use error::{Error, Result};
pub use group::{DuplicateGroup, Grouping};
pub use metadata::{LoftyReader, MemorySource, MetadataKey, MetadataSource, TrackProfile, TrackTags};
pub use relocate::{Quarantine, ResolutionRecord};
pub use track::TrackHandle;
