use std::collections::BTreeMap;

use mirvar_core::{Consistency, ResolvedRead};
use mirvar_library::ExpandedLibrary;
use mirvar_resolve::site_calls;

use crate::isomir::isomir_signature;

///
/// What to do with the counts of reads whose minimal score ties across
/// loci. The default reports them in their own table and nowhere else;
/// splitting them evenly across tied loci (hairpin and mature tables only)
/// is an explicit opt-in, never a silent fallback.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguousPolicy {
    #[default]
    Report,
    SplitEqually,
}

/// Read counts per classification bucket. Every resolved read lands in
/// exactly one bucket with its whole collapsed count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassificationTotals {
    pub consistent: u64,
    pub inconsistent: u64,
    pub ambiguous: u64,
    pub not_applicable: u64,
}

impl ClassificationTotals {
    pub fn total(&self) -> u64 {
        self.consistent + self.inconsistent + self.ambiguous + self.not_applicable
    }
}

/// One ambiguous read and the references its minimal score tied across.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbiguousEntry {
    pub read_id: String,
    pub sequence: String,
    pub count: u64,
    pub references: Vec<String>,
}

/// The four expression granularities plus the ambiguous-read table.
#[derive(Debug, Default, PartialEq)]
pub struct AbundanceTables {
    /// hairpin accession -> count
    pub hairpins: BTreeMap<String, f64>,
    /// mature locus -> count
    pub matures: BTreeMap<String, f64>,
    /// (locus, site id, allele) -> count; split by classification bucket
    pub alleles: BTreeMap<(String, String, String), AlleleCount>,
    /// (locus, isomiR signature) -> count
    pub isomirs: BTreeMap<(String, String), u64>,
    pub ambiguous: Vec<AmbiguousEntry>,
    pub totals: ClassificationTotals,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlleleCount {
    pub consistent: u64,
    pub inconsistent: u64,
    pub not_applicable: u64,
}

impl AlleleCount {
    pub fn total(&self) -> u64 {
        self.consistent + self.inconsistent + self.not_applicable
    }
}

///
/// Re-expand resolved reads into the expression tables.
///
/// Unambiguous reads attribute their whole count to their winning
/// reference's hairpin, locus, covered variant alleles and isomiR
/// signature. Ambiguous reads go to the ambiguous table; they still count
/// toward a hairpin when every tied reference derives from that one
/// hairpin, and are otherwise excluded from attribution unless
/// `AmbiguousPolicy::SplitEqually` divides them across tied loci.
///
pub fn aggregate(
    resolved: &[ResolvedRead],
    library: &ExpandedLibrary,
    sample: Option<&str>,
    policy: AmbiguousPolicy,
) -> AbundanceTables {
    let mut tables = AbundanceTables::default();

    for read in resolved {
        match read.classification {
            Consistency::Ambiguous => aggregate_ambiguous(read, library, policy, &mut tables),
            classification => {
                let winner = read
                    .winner()
                    .expect("unambiguous resolved read always has a winner");
                let count = read.read.count;

                match classification {
                    Consistency::Consistent => tables.totals.consistent += count,
                    Consistency::Inconsistent => tables.totals.inconsistent += count,
                    _ => tables.totals.not_applicable += count,
                }

                let Some(reference) = library.reference_by_id(&winner.record.reference_id) else {
                    continue;
                };
                let locus = reference.locus().to_string();

                *tables
                    .hairpins
                    .entry(reference.hairpin_id().to_string())
                    .or_default() += count as f64;
                *tables.matures.entry(locus.clone()).or_default() += count as f64;

                let signature = isomir_signature(&read.read, &winner.record, reference.len());
                *tables.isomirs.entry((locus.clone(), signature)).or_default() += count;

                for call in site_calls(&read.read, &winner.record, library, sample) {
                    let Some(implied) = call.implied else {
                        continue;
                    };
                    let Some(site) = library.site_by_id(&call.site_id) else {
                        continue;
                    };
                    let allele = site
                        .alleles()
                        .nth(implied as usize)
                        .unwrap_or("?")
                        .to_string();
                    let entry = tables
                        .alleles
                        .entry((locus.clone(), call.site_id.clone(), allele))
                        .or_default();
                    match call.verdict {
                        Consistency::Consistent => entry.consistent += count,
                        Consistency::Inconsistent => entry.inconsistent += count,
                        _ => entry.not_applicable += count,
                    }
                }
            }
        }
    }

    tables
}

fn aggregate_ambiguous(
    read: &ResolvedRead,
    library: &ExpandedLibrary,
    policy: AmbiguousPolicy,
    tables: &mut AbundanceTables,
) {
    let count = read.read.count;
    tables.totals.ambiguous += count;

    let references = read.tied_references();
    tables.ambiguous.push(AmbiguousEntry {
        read_id: read.read.id.clone(),
        sequence: read.read.sequence.clone(),
        count,
        references: references.iter().map(|r| r.to_string()).collect(),
    });

    let mut hairpins: Vec<String> = Vec::new();
    let mut loci: Vec<String> = Vec::new();
    for id in &references {
        if let Some(reference) = library.reference_by_id(id) {
            let hairpin = reference.hairpin_id().to_string();
            if !hairpins.contains(&hairpin) {
                hairpins.push(hairpin);
            }
            let locus = reference.locus().to_string();
            if !loci.contains(&locus) {
                loci.push(locus);
            }
        }
    }

    // a tie confined to one hairpin still identifies that hairpin
    if let [hairpin] = hairpins.as_slice() {
        *tables.hairpins.entry(hairpin.clone()).or_default() += count as f64;
    } else if policy == AmbiguousPolicy::SplitEqually && !hairpins.is_empty() {
        let share = count as f64 / hairpins.len() as f64;
        for hairpin in hairpins {
            *tables.hairpins.entry(hairpin).or_default() += share;
        }
    }

    if policy == AmbiguousPolicy::SplitEqually && loci.len() > 1 {
        let share = count as f64 / loci.len() as f64;
        for locus in loci {
            *tables.matures.entry(locus).or_default() += share;
        }
    }
}
