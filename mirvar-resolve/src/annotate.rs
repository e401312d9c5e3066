use rayon::prelude::*;

use mirvar_core::utils::reverse_complement;
use mirvar_core::{
    AlignmentRecord, Consistency, ResolvedRead, ScoredAlignment, Strand, UniqueRead,
};
use mirvar_library::ExpandedLibrary;

use crate::score::{ScoringParams, score_alignment};

/// Verdict for one variant site covered by one alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteCall {
    pub site_id: String,
    /// VCF-order index of the allele the read carries at the site, if the
    /// read bases match a known allele.
    pub implied: Option<u8>,
    pub verdict: Consistency,
}

fn reference_oriented(read: &UniqueRead, strand: Strand) -> String {
    match strand {
        Strand::Forward => read.sequence.clone(),
        Strand::Reverse => reverse_complement(&read.sequence),
    }
}

///
/// Compare the read bases against every variant site the aligned span
/// covers.
///
/// The implied allele is the longest fully-observable allele whose bases
/// match the read at the site's entry-local offset. With `sample` set, each
/// call is Consistent when the implied allele is present in that sample's
/// genotype and Inconsistent otherwise (a read carrying no known allele is
/// inconsistent by definition). Without a genotype the verdict stays
/// NotApplicable.
///
pub fn site_calls(
    read: &UniqueRead,
    record: &AlignmentRecord,
    library: &ExpandedLibrary,
    sample: Option<&str>,
) -> Vec<SiteCall> {
    let Some(site_offsets) = library.site_offsets.get(&record.reference_id) else {
        return Vec::new();
    };

    let oriented = reference_oriented(read, record.strand);
    let aligned = &oriented[record.read_start..];
    let mut calls = Vec::new();

    for site in site_offsets {
        if site.offset < record.offset || site.offset >= record.end() {
            continue;
        }
        let local = site.offset - record.offset;

        let observable: Vec<(usize, &String)> = site
            .alleles
            .iter()
            .enumerate()
            .filter(|(_, allele)| local + allele.len() <= aligned.len())
            .collect();
        if observable.is_empty() {
            continue;
        }

        let implied = observable
            .iter()
            .filter(|(_, allele)| &aligned[local..local + allele.len()] == allele.as_str())
            .max_by_key(|(_, allele)| allele.len())
            .map(|(index, _)| *index as u8);

        let verdict = match sample
            .and_then(|s| library.site_by_id(&site.site_id).and_then(|site| site.genotype_of(s)))
        {
            Some(genotype) => {
                if implied.is_some_and(|allele| genotype.contains(allele)) {
                    Consistency::Consistent
                } else {
                    Consistency::Inconsistent
                }
            }
            None => Consistency::NotApplicable,
        };

        calls.push(SiteCall {
            site_id: site.site_id.clone(),
            implied,
            verdict,
        });
    }

    calls
}

/// Fold the per-site verdicts of one alignment into its classification:
/// any inconsistent site makes the alignment inconsistent; otherwise one
/// consistent site suffices; an alignment touching no genotyped site is
/// not-applicable.
pub fn classify_alignment(
    read: &UniqueRead,
    record: &AlignmentRecord,
    library: &ExpandedLibrary,
    sample: Option<&str>,
) -> Consistency {
    let mut verdict = Consistency::NotApplicable;
    for call in site_calls(read, record, library, sample) {
        match call.verdict {
            Consistency::Inconsistent => return Consistency::Inconsistent,
            Consistency::Consistent => verdict = Consistency::Consistent,
            _ => {}
        }
    }
    verdict
}

fn resolve_one(
    read: UniqueRead,
    records: Vec<AlignmentRecord>,
    library: &ExpandedLibrary,
    params: &ScoringParams,
    sample: Option<&str>,
) -> Option<ResolvedRead> {
    // discard over-threshold alignments; the read keeps its survivors
    let mut alignments: Vec<ScoredAlignment> = records
        .into_iter()
        .filter_map(|record| {
            let score = score_alignment(&record, params);
            (score <= params.score_threshold).then_some(ScoredAlignment {
                record,
                score,
                consistency: Consistency::NotApplicable,
            })
        })
        .collect();

    if alignments.is_empty() {
        return None;
    }

    for alignment in alignments.iter_mut() {
        alignment.consistency = classify_alignment(&read, &alignment.record, library, sample);
    }

    let minimum = alignments.iter().map(|a| a.score).min().unwrap();
    let best: Vec<usize> = alignments
        .iter()
        .enumerate()
        .filter(|(_, a)| a.score == minimum)
        .map(|(i, _)| i)
        .collect();

    let mut resolved = ResolvedRead {
        read,
        alignments,
        best,
        classification: Consistency::NotApplicable,
    };
    resolved.classification = if resolved.tied_references().len() > 1 {
        // minimal score tied across references: preserved, never broken
        Consistency::Ambiguous
    } else {
        resolved.alignments[resolved.best[0]].consistency
    };

    Some(resolved)
}

///
/// Resolve every collapsed read of a sample.
///
/// Per-read work is independent and side-effect-free, so reads are processed
/// in parallel; the output keeps the input read order and each read's
/// alignment order, making tie detection deterministic. Reads whose
/// alignments were all discarded drop out entirely (they are unaligned as
/// far as downstream accounting is concerned).
///
pub fn resolve_reads(
    groups: Vec<(UniqueRead, Vec<AlignmentRecord>)>,
    library: &ExpandedLibrary,
    params: &ScoringParams,
    sample: Option<&str>,
) -> Vec<ResolvedRead> {
    groups
        .into_par_iter()
        .filter_map(|(read, records)| resolve_one(read, records, library, params, sample))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirvar_core::{Genotype, Mismatch, ReferenceSequence, VariantSite};
    use mirvar_library::SiteOffset;
    use pretty_assertions::assert_eq;

    // canonical miR-x: ACGTGCGTAC with rs1 G/A at offset 4
    fn fixture_library() -> ExpandedLibrary {
        let reference = |id: &str, seq: &str, tag: Option<&str>| ReferenceSequence {
            id: id.to_string(),
            chrom: "chr1".to_string(),
            start: 101,
            end: 110,
            strand: Strand::Forward,
            hairpin: Some("mir-x".to_string()),
            sequence: seq.to_string(),
            variant_tag: tag.map(|t| t.to_string()),
        };

        let mut library = ExpandedLibrary {
            vcf_available: true,
            genotypes_available: true,
            samples: vec!["S1".to_string(), "S2".to_string()],
            ..Default::default()
        };
        library.references = vec![
            reference("miR-x", "ACGTGCGTAC", None),
            reference("miR-x@rs1:A", "ACGTACGTAC", Some("rs1:A")),
            reference("miR-z", "TTTTGGGGCCCC", None),
        ];
        library.sites = vec![VariantSite {
            id: "rs1".to_string(),
            chrom: "chr1".to_string(),
            pos: 105,
            ref_allele: "G".to_string(),
            alt_alleles: vec!["A".to_string()],
            affected: vec!["miR-x".to_string(), "miR-x@rs1:A".to_string()],
            genotypes: [
                ("S1".to_string(), Genotype::new(0, 1)),
                ("S2".to_string(), Genotype::new(0, 0)),
            ]
            .into_iter()
            .collect(),
        }];
        for id in ["miR-x", "miR-x@rs1:A"] {
            library.site_offsets.insert(
                id.to_string(),
                vec![SiteOffset {
                    site_id: "rs1".to_string(),
                    offset: 4,
                    alleles: vec!["G".to_string(), "A".to_string()],
                }],
            );
        }
        library
    }

    fn read(id: &str, seq: &str, count: u64) -> UniqueRead {
        UniqueRead {
            id: id.to_string(),
            sequence: seq.to_string(),
            count,
        }
    }

    fn full_record(reference: &str, seq: &str, ref_seq: &str) -> AlignmentRecord {
        let mismatches = seq
            .bytes()
            .zip(ref_seq.bytes())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, (read_base, ref_base))| Mismatch {
                read_pos: i,
                ref_pos: i,
                ref_base,
                read_base,
            })
            .collect();
        AlignmentRecord {
            read_id: "r".to_string(),
            reference_id: reference.to_string(),
            offset: 0,
            read_start: 0,
            span: seq.len(),
            strand: Strand::Forward,
            mismatches,
        }
    }

    #[test]
    fn het_sample_is_consistent_with_either_allele() {
        let library = fixture_library();
        let alt_read = read("r", "ACGTACGTAC", 7);
        let record = full_record("miR-x@rs1:A", &alt_read.sequence, "ACGTACGTAC");
        assert_eq!(
            classify_alignment(&alt_read, &record, &library, Some("S1")),
            Consistency::Consistent
        );
        // hom-ref S2 never carries the alt allele
        assert_eq!(
            classify_alignment(&alt_read, &record, &library, Some("S2")),
            Consistency::Inconsistent
        );
    }

    #[test]
    fn unknown_allele_is_inconsistent() {
        let library = fixture_library();
        // T at the site matches neither G nor A
        let odd_read = read("r", "ACGTTCGTAC", 3);
        let record = full_record("miR-x", &odd_read.sequence, "ACGTGCGTAC");
        let calls = site_calls(&odd_read, &record, &library, Some("S1"));
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].implied, None);
        assert_eq!(calls[0].verdict, Consistency::Inconsistent);
    }

    #[test]
    fn no_sample_degrades_to_not_applicable() {
        let library = fixture_library();
        let alt_read = read("r", "ACGTACGTAC", 5);
        let record = full_record("miR-x@rs1:A", &alt_read.sequence, "ACGTACGTAC");
        assert_eq!(
            classify_alignment(&alt_read, &record, &library, None),
            Consistency::NotApplicable
        );
    }

    #[test]
    fn alignment_outside_the_site_is_not_applicable() {
        let library = fixture_library();
        let short_read = read("r", "ACG", 2);
        let mut record = full_record("miR-x", "ACG", "ACG");
        record.span = 3;
        assert_eq!(
            classify_alignment(&short_read, &record, &library, Some("S1")),
            Consistency::NotApplicable
        );
    }

    #[test]
    fn tie_across_references_is_ambiguous() {
        let library = fixture_library();
        let r = read("r", "ACGTGCGTAC", 11);
        let on_canonical = full_record("miR-x", &r.sequence, "ACGTGCGTAC");
        let mut on_z = full_record("miR-z", &r.sequence, "TTTTGGGGCC");
        // force an identical score by pretending miR-z also matched cleanly
        on_z.mismatches.clear();

        let resolved = resolve_reads(
            vec![(r, vec![on_canonical, on_z])],
            &library,
            &ScoringParams::default(),
            Some("S1"),
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].classification, Consistency::Ambiguous);
        assert_eq!(resolved[0].tied_references(), vec!["miR-x", "miR-z"]);
        assert!(resolved[0].winner().is_none());
    }

    #[test]
    fn equal_scores_on_one_reference_are_not_ambiguous() {
        let library = fixture_library();
        let r = read("r", "ACGTGCGTAC", 4);
        let a = full_record("miR-x", &r.sequence, "ACGTGCGTAC");
        let b = full_record("miR-x", &r.sequence, "ACGTGCGTAC");

        let resolved = resolve_reads(
            vec![(r, vec![a, b])],
            &library,
            &ScoringParams::default(),
            Some("S1"),
        );
        assert_eq!(resolved[0].classification, Consistency::Consistent);
    }

    #[test]
    fn over_threshold_alignments_are_discarded_per_alignment() {
        let library = fixture_library();
        let r = read("r", "ACGTGCGTAC", 9);

        // six mismatches, two in the 5' window: score 12 > 9 -> discarded
        let bad = full_record("miR-z", &r.sequence, "TTTTGGGGCC");
        let good = full_record("miR-x", &r.sequence, "ACGTGCGTAC");

        let resolved = resolve_reads(
            vec![(r, vec![bad, good])],
            &library,
            &ScoringParams::default(),
            Some("S2"),
        );
        // the read keeps its surviving alignment
        assert_eq!(resolved[0].alignments.len(), 1);
        assert_eq!(resolved[0].alignments[0].record.reference_id, "miR-x");
        assert_eq!(resolved[0].classification, Consistency::Consistent);
    }

    #[test]
    fn score_equal_to_threshold_survives() {
        let library = fixture_library();
        let r = read("r", "ACGTGCGTAC", 1);
        let mut record = full_record("miR-x", &r.sequence, "ACGTGCGTAC");
        // two window mismatches + one outside = 4 + 4 + 1 = 9
        record.mismatches = vec![
            Mismatch { read_pos: 0, ref_pos: 0, ref_base: b'A', read_base: b'C' },
            Mismatch { read_pos: 1, ref_pos: 1, ref_base: b'C', read_base: b'A' },
            Mismatch { read_pos: 9, ref_pos: 9, ref_base: b'C', read_base: b'A' },
        ];

        let resolved = resolve_reads(
            vec![(r, vec![record])],
            &library,
            &ScoringParams::default(),
            Some("S1"),
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].alignments[0].score, 9);
    }

    #[test]
    fn reads_with_no_survivors_drop_out() {
        let library = fixture_library();
        let r = read("r", "ACGTGCGTAC", 2);
        let mut record = full_record("miR-z", &r.sequence, "TTTTGGGGCC");
        record.mismatches.truncate(4); // 4+4+1+1 = 10 > 9

        let resolved = resolve_reads(
            vec![(r, vec![record])],
            &library,
            &ScoringParams::default(),
            Some("S1"),
        );
        assert!(resolved.is_empty());
    }
}
