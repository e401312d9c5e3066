//! Core data model shared by the mirvar crates.
//!
//! Holds the reference/variant/read types produced by library expansion and
//! consumed by alignment resolution, the pipeline-wide error enum, and small
//! file utilities (gz-aware readers).

pub mod errors;
pub mod models;
pub mod utils;

pub use errors::MirvarError;
pub use models::consistency::Consistency;
pub use models::read::{AlignmentRecord, Mismatch, ResolvedRead, ScoredAlignment, UniqueRead};
pub use models::reference::{ReferenceSequence, Strand};
pub use models::variant::{Genotype, VariantSite};
