use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

///
/// How an alignment (and, after resolution, a read) relates to the sample's
/// called genotype.
///
/// `Ambiguous` marks a read whose minimal alignment score is tied across more
/// than one reference sequence; ties are preserved, never broken.
/// `NotApplicable` covers runs without genotypes and alignments that touch no
/// variant site.
///
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consistency {
    Consistent,
    Inconsistent,
    Ambiguous,
    NotApplicable,
}

impl Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Consistency::Consistent => "consistent",
            Consistency::Inconsistent => "inconsistent",
            Consistency::Ambiguous => "ambiguous",
            Consistency::NotApplicable => "not_applicable",
        };
        write!(f, "{}", label)
    }
}
