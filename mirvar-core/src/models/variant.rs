use std::collections::HashMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// A diploid genotype call as an unordered pair of allele indices
/// (0 = REF, 1.. = ALT in VCF order).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Genotype {
    pub alleles: (u8, u8),
}

impl Genotype {
    pub fn new(a: u8, b: u8) -> Genotype {
        Genotype { alleles: (a.min(b), a.max(b)) }
    }

    /// Parse a VCF GT value like `0/1`, `1|1` or `0`. Missing calls (`./.`)
    /// return `None`.
    pub fn parse(gt: &str) -> Option<Genotype> {
        let mut parts = gt.split(['/', '|']);
        let a = parts.next()?.parse::<u8>().ok()?;
        let b = match parts.next() {
            Some(p) => p.parse::<u8>().ok()?,
            None => a,
        };
        Some(Genotype::new(a, b))
    }

    pub fn contains(&self, allele: u8) -> bool {
        self.alleles.0 == allele || self.alleles.1 == allele
    }

    pub fn is_het(&self) -> bool {
        self.alleles.0 != self.alleles.1
    }
}

impl Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.alleles.0, self.alleles.1)
    }
}

///
/// A variant position overlapping one or more miRNA loci.
///
/// Positions are 1-based genomic coordinates. `affected` lists the ids of
/// every expanded [ReferenceSequence](super::reference::ReferenceSequence)
/// carrying an allele of this site. Genotypes are keyed by VCF sample name.
///
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VariantSite {
    pub id: String,
    pub chrom: String,
    pub pos: u32,
    pub ref_allele: String,
    pub alt_alleles: Vec<String>,
    pub affected: Vec<String>,
    pub genotypes: HashMap<String, Genotype>,
}

impl VariantSite {
    /// All alleles of the site, REF first; index order matches genotype
    /// allele indices.
    pub fn alleles(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.ref_allele.as_str()).chain(self.alt_alleles.iter().map(|a| a.as_str()))
    }

    pub fn allele_count(&self) -> usize {
        1 + self.alt_alleles.len()
    }

    /// Index of `allele` in VCF order, if it is a known allele of the site.
    pub fn allele_index(&self, allele: &str) -> Option<u8> {
        self.alleles().position(|a| a == allele).map(|i| i as u8)
    }

    pub fn genotype_of(&self, sample: &str) -> Option<Genotype> {
        self.genotypes.get(sample).copied()
    }
}
