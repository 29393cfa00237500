pub mod loader;
pub mod types;

pub use loader::{
    load_candidates, load_pool, CatalogError, CatalogWarning, InvalidReason, LoadedCatalog,
    LoadedPool, ValidationPolicy,
};
pub use types::{Candidate, PoolEntry, RawCandidateRecord, RawPoolRecord};
