use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Genomic strand of an annotated feature.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn parse(s: &str) -> Option<Strand> {
        match s {
            "+" => Some(Strand::Forward),
            "-" => Some(Strand::Reverse),
            _ => None,
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

///
/// One sequence in the expanded alignment library.
///
/// Several entries may share a locus and differ only by allele; the allele
/// combination is recorded in `variant_tag` (`None` for the canonical
/// sequence). Sequences are stored uppercase in the DNA alphabet (U→T
/// normalized on load).
///
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSequence {
    pub id: String,
    pub chrom: String,
    /// 1-based inclusive genomic interval, as annotated.
    pub start: u32,
    pub end: u32,
    pub strand: Strand,
    /// Accession of the hairpin this mature miRNA derives from.
    pub hairpin: Option<String>,
    pub sequence: String,
    /// Allele combination carried by this entry, e.g. `rs2168518:A`.
    pub variant_tag: Option<String>,
}

impl ReferenceSequence {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// The locus this entry belongs to: its id with any allele tag removed.
    pub fn locus(&self) -> &str {
        match self.id.split_once('@') {
            Some((locus, _)) => locus,
            None => &self.id,
        }
    }

    /// Hairpin accession used for hairpin-level aggregation. A hairpin entry
    /// is its own parent.
    pub fn hairpin_id(&self) -> &str {
        self.hairpin.as_deref().unwrap_or_else(|| self.locus())
    }
}
