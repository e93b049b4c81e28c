//! Identity recognition and unknown-face deduplication over feature vectors.

mod metric;
mod record;
mod registry;
mod seed;

pub use metric::{argmin, distance_batch, euclidean, face_confidence, format_confidence};
pub use record::{IdentityLabel, IdentityRecord};
pub use registry::{
    BestMatch, Identification, IdentityRegistry, RegistryConfig, SharedIdentityRegistry,
    UNKNOWN_LABEL,
};
pub use seed::{IdentitySeedLoader, JsonSeedFile, SeedEntry, StaticSeed};
