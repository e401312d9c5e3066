use fxhash::FxHashMap;

use mirvar_core::{Consistency, ResolvedRead};
use mirvar_library::ExpandedLibrary;

use crate::annotate::site_calls;

/// Per-site genotype-consistency summary. A suspicious site signals a
/// possible genotyping error, contamination, or annotation error; it never
/// triggers read exclusion.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteReport {
    pub site_id: String,
    pub consistent: u64,
    pub inconsistent: u64,
    pub rate: f64,
    pub suspicious: bool,
}

impl SiteReport {
    pub fn classified(&self) -> u64 {
        self.consistent + self.inconsistent
    }
}

///
/// Recompute per-site inconsistency rates from the resolved reads.
///
/// Only winning alignments of unambiguous reads contribute, so every read
/// counts at most once per covered site. The rate is derived, never stored:
/// rerunning over the same resolved reads always reproduces it. Sites are
/// flagged on rate strictly greater than `threshold`.
///
pub fn site_reports(
    resolved: &[ResolvedRead],
    library: &ExpandedLibrary,
    sample: Option<&str>,
    threshold: f64,
) -> Vec<SiteReport> {
    if !library.genotypes_available || sample.is_none() {
        return Vec::new();
    }

    let mut tallies: FxHashMap<&str, (u64, u64)> = FxHashMap::default();
    for site in &library.sites {
        tallies.insert(site.id.as_str(), (0, 0));
    }

    for read in resolved {
        let Some(winner) = read.winner() else {
            continue;
        };
        for call in site_calls(&read.read, &winner.record, library, sample) {
            let Some(tally) = tallies.get_mut(call.site_id.as_str()) else {
                continue;
            };
            match call.verdict {
                Consistency::Consistent => tally.0 += read.read.count,
                Consistency::Inconsistent => tally.1 += read.read.count,
                _ => {}
            }
        }
    }

    library
        .sites
        .iter()
        .map(|site| {
            let (consistent, inconsistent) = tallies[site.id.as_str()];
            let classified = consistent + inconsistent;
            let rate = if classified == 0 {
                0.0
            } else {
                inconsistent as f64 / classified as f64
            };
            SiteReport {
                site_id: site.id.clone(),
                consistent,
                inconsistent,
                rate,
                suspicious: rate > threshold,
            }
        })
        .collect()
}
