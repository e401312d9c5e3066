pub mod consistency;
pub mod read;
pub mod reference;
pub mod variant;

// re-export for cleaner imports
pub use self::consistency::Consistency;
pub use self::read::{AlignmentRecord, Mismatch, ResolvedRead, ScoredAlignment, UniqueRead};
pub use self::reference::{ReferenceSequence, Strand};
pub use self::variant::{Genotype, VariantSite};
