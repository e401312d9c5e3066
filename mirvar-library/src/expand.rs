use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use mirvar_core::utils::{chrom_key, normalize_to_dna, reverse_complement};
use mirvar_core::{ReferenceSequence, Strand, VariantSite};

use crate::coords::CoordinateMap;
use crate::fasta::FastaRecord;
use crate::genotypes::{GenotypePanel, VcfRecord};

/// The four library input paths, VCF optional.
#[derive(Debug, Clone)]
pub struct LibraryInputs {
    pub matures: PathBuf,
    pub hairpins: PathBuf,
    pub coords: PathBuf,
    pub vcf: Option<PathBuf>,
}

/// Placement of one variant site within one expanded reference entry.
///
/// `offset` is entry-local: an upstream indel allele shifts the offsets of
/// the sites after it, so the same site can sit at different offsets in
/// different entries of the same locus. `alleles` are transcript-space
/// (strand-adjusted), VCF index order, REF first.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SiteOffset {
    pub site_id: String,
    pub offset: usize,
    pub alleles: Vec<String>,
}

///
/// The allele-expanded reference produced by variant incorporation.
///
/// `references` holds every alignment target (canonical mature sequences
/// plus one entry per non-canonical allele combination). `sites` is the
/// deduplicated variant-site set; `site_offsets` maps each reference id to
/// the sites it carries and their entry-local offsets.
///
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ExpandedLibrary {
    pub references: Vec<ReferenceSequence>,
    pub sites: Vec<VariantSite>,
    pub site_offsets: HashMap<String, Vec<SiteOffset>>,
    /// A variant file was supplied (allele expansion happened).
    pub vcf_available: bool,
    /// The variant file carried per-sample genotype calls.
    pub genotypes_available: bool,
    pub samples: Vec<String>,
    #[serde(skip, default)]
    pub warnings: Vec<String>,
}

impl ExpandedLibrary {
    pub fn reference_by_id(&self, id: &str) -> Option<&ReferenceSequence> {
        self.references.iter().find(|r| r.id == id)
    }

    pub fn site_by_id(&self, id: &str) -> Option<&VariantSite> {
        self.sites.iter().find(|s| s.id == id)
    }
}

/// A VCF record pinned to one mature miRNA, in transcript space.
struct LocalSite {
    site_index: usize,
    /// Offset within the canonical entry.
    base_offset: usize,
    /// Transcript-space alleles, VCF order (REF first).
    alleles: Vec<String>,
    /// Genomic-alphabet alleles, for entry naming.
    genomic_alleles: Vec<String>,
}

fn transcript_allele(allele: &str, strand: Strand) -> String {
    match strand {
        Strand::Forward => allele.to_ascii_uppercase(),
        Strand::Reverse => reverse_complement(allele),
    }
}

/// Every assignment of one allele index per site.
fn allele_combinations(counts: &[usize]) -> Vec<Vec<u8>> {
    let mut combos: Vec<Vec<u8>> = vec![Vec::new()];
    for &n in counts {
        combos = combos
            .into_iter()
            .flat_map(|prefix| {
                (0..n as u8).map(move |allele| {
                    let mut next = prefix.clone();
                    next.push(allele);
                    next
                })
            })
            .collect();
    }
    combos
}

///
/// Expand the baseline mature sequences with the sample genotypes' variant
/// alleles.
///
/// For every mature interval overlapping one or more variant positions, the
/// cartesian product of alleles across those sites is enumerated and one
/// reference entry is emitted per non-canonical combination, with each
/// allele substituted at its transcript-relative offset (strand-aware,
/// reverse-complemented on minus-strand loci). A single biallelic site thus
/// yields two entries differing at exactly one offset.
///
/// Without a genotype file only canonical entries are emitted and the run is
/// marked genotype-unavailable; classification downstream degrades to
/// not-applicable instead of failing.
///
pub fn incorporate_variants(
    matures: &[FastaRecord],
    coords: &CoordinateMap,
    panel: Option<&GenotypePanel>,
) -> ExpandedLibrary {
    let mut lib = ExpandedLibrary {
        vcf_available: panel.is_some(),
        genotypes_available: panel.is_some_and(|p| !p.samples.is_empty()),
        samples: panel.map(|p| p.samples.clone()).unwrap_or_default(),
        ..Default::default()
    };

    // dedup key for sites shared by overlapping mature annotations
    let mut site_index: HashMap<(String, u32, String), usize> = HashMap::new();

    for record in matures {
        let sequence = normalize_to_dna(&record.sequence);

        let Some(feature) = coords.matures.get(&record.id) else {
            lib.warnings.push(format!(
                "no coordinates for {}; canonical sequence kept, variants not checked",
                record.id
            ));
            lib.references.push(ReferenceSequence {
                id: record.id.clone(),
                chrom: String::new(),
                start: 0,
                end: 0,
                strand: Strand::Forward,
                hairpin: None,
                sequence,
                variant_tag: None,
            });
            continue;
        };

        let mut local = match panel {
            Some(panel) => {
                collect_local_sites(record, feature, &sequence, panel, &mut site_index, &mut lib)
            }
            None => Vec::new(),
        };
        local.sort_by_key(|site| site.base_offset);

        let make_entry = |id: String, sequence: String, tag: Option<String>| ReferenceSequence {
            id,
            chrom: feature.chrom.clone(),
            start: feature.start,
            end: feature.end,
            strand: feature.strand,
            hairpin: feature.hairpin.clone(),
            sequence,
            variant_tag: tag,
        };

        // canonical entry first; its site offsets are the base offsets
        lib.references
            .push(make_entry(record.id.clone(), sequence.clone(), None));
        if !local.is_empty() {
            let offsets: Vec<SiteOffset> = local
                .iter()
                .map(|site| SiteOffset {
                    site_id: lib.sites[site.site_index].id.clone(),
                    offset: site.base_offset,
                    alleles: site.alleles.clone(),
                })
                .collect();
            lib.site_offsets.insert(record.id.clone(), offsets);
            for site in &local {
                lib.sites[site.site_index].affected.push(record.id.clone());
            }
        }

        let counts: Vec<usize> = local.iter().map(|site| site.alleles.len()).collect();
        for combo in allele_combinations(&counts) {
            if combo.iter().all(|&allele| allele == 0) {
                continue;
            }

            let mut expanded = sequence.clone();
            let mut shift: isize = 0;
            let mut offsets = Vec::with_capacity(local.len());
            for (site, &allele) in local.iter().zip(&combo) {
                let offset = (site.base_offset as isize + shift) as usize;
                let ref_len = site.alleles[0].len();
                let substituted = &site.alleles[allele as usize];
                expanded.replace_range(offset..offset + ref_len, substituted);
                offsets.push(SiteOffset {
                    site_id: lib.sites[site.site_index].id.clone(),
                    offset,
                    alleles: site.alleles.clone(),
                });
                shift += substituted.len() as isize - ref_len as isize;
            }

            let tag = local
                .iter()
                .zip(&combo)
                .filter(|(_, &allele)| allele > 0)
                .map(|(site, &allele)| {
                    format!(
                        "{}:{}",
                        lib.sites[site.site_index].id, site.genomic_alleles[allele as usize]
                    )
                })
                .collect::<Vec<_>>()
                .join("&");
            let id = format!("{}@{}", record.id, tag);

            lib.site_offsets.insert(id.clone(), offsets);
            for site in &local {
                lib.sites[site.site_index].affected.push(id.clone());
            }
            lib.references.push(make_entry(id, expanded, Some(tag)));
        }
    }

    lib
}

/// Variant records overlapping one mature feature, validated against its
/// canonical sequence.
fn collect_local_sites(
    record: &FastaRecord,
    feature: &crate::coords::MirnaFeature,
    sequence: &str,
    panel: &GenotypePanel,
    site_index: &mut HashMap<(String, u32, String), usize>,
    lib: &mut ExpandedLibrary,
) -> Vec<LocalSite> {
    let mut local = Vec::new();

    for vcf_rec in &panel.records {
        if chrom_key(&vcf_rec.chrom) != chrom_key(&feature.chrom) {
            continue;
        }
        let ref_len = vcf_rec.ref_allele.len() as u32;
        let contained =
            vcf_rec.pos >= feature.start && vcf_rec.pos + ref_len - 1 <= feature.end;
        if !contained {
            continue;
        }

        let base_offset = match feature.strand {
            Strand::Forward => (vcf_rec.pos - feature.start) as usize,
            Strand::Reverse => (feature.end - (vcf_rec.pos + ref_len - 1)) as usize,
        };

        let tx_ref = transcript_allele(&vcf_rec.ref_allele, feature.strand);
        if base_offset + tx_ref.len() > sequence.len() {
            lib.warnings.push(format!(
                "{}: annotated interval of {} is longer than its sequence; site skipped",
                vcf_rec.id, record.id
            ));
            continue;
        }
        let observed = &sequence[base_offset..base_offset + tx_ref.len()];
        if observed != tx_ref {
            lib.warnings.push(format!(
                "{}: REF {} does not match {} at offset {} of {}; site skipped",
                vcf_rec.id, tx_ref, observed, base_offset, record.id
            ));
            continue;
        }

        let index = register_site(vcf_rec, panel, site_index, lib);
        let genomic_alleles: Vec<String> = std::iter::once(vcf_rec.ref_allele.clone())
            .chain(vcf_rec.alt_alleles.iter().cloned())
            .collect();
        let alleles = genomic_alleles
            .iter()
            .map(|allele| transcript_allele(allele, feature.strand))
            .collect();

        local.push(LocalSite {
            site_index: index,
            base_offset,
            alleles,
            genomic_alleles,
        });
    }

    local
}

fn register_site(
    vcf_rec: &VcfRecord,
    panel: &GenotypePanel,
    site_index: &mut HashMap<(String, u32, String), usize>,
    lib: &mut ExpandedLibrary,
) -> usize {
    let key = (
        chrom_key(&vcf_rec.chrom).to_string(),
        vcf_rec.pos,
        vcf_rec.ref_allele.clone(),
    );
    if let Some(&index) = site_index.get(&key) {
        return index;
    }
    lib.sites.push(VariantSite {
        id: vcf_rec.id.clone(),
        chrom: vcf_rec.chrom.clone(),
        pos: vcf_rec.pos,
        ref_allele: vcf_rec.ref_allele.clone(),
        alt_alleles: vcf_rec.alt_alleles.clone(),
        affected: Vec::new(),
        genotypes: panel.genotype_map(vcf_rec),
    });
    let index = lib.sites.len() - 1;
    site_index.insert(key, index);
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::MirnaFeature;
    use crate::genotypes::read_genotypes;
    use pretty_assertions::assert_eq;

    fn fasta(id: &str, seq: &str) -> FastaRecord {
        FastaRecord {
            id: id.to_string(),
            description: None,
            sequence: seq.to_string(),
        }
    }

    fn coords_with(entries: &[(&str, &str, u32, u32, Strand)]) -> CoordinateMap {
        let mut map = CoordinateMap::default();
        for (name, chrom, start, end, strand) in entries {
            map.matures.insert(
                name.to_string(),
                MirnaFeature {
                    chrom: chrom.to_string(),
                    start: *start,
                    end: *end,
                    strand: *strand,
                    hairpin: Some(format!("{}-hairpin", name)),
                },
            );
        }
        map
    }

    fn panel_from(vcf_body: &str) -> GenotypePanel {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.vcf");
        std::fs::write(&path, vcf_body).unwrap();
        read_genotypes(&path).unwrap()
    }

    const HEADER: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n";

    #[test]
    fn biallelic_site_yields_two_entries_differing_at_offset() {
        // mature at chr1:101-110 (+), variant G>A at pos 105 -> offset 4
        let matures = [fasta("miR-x", "ACGTGCGTAC")];
        let coords = coords_with(&[("miR-x", "chr1", 101, 110, Strand::Forward)]);
        let panel = panel_from(&format!("{HEADER}chr1\t105\trs1\tG\tA\t.\t.\t.\tGT\t0/1\n"));

        let lib = incorporate_variants(&matures, &coords, Some(&panel));

        assert_eq!(lib.references.len(), 2);
        assert_eq!(lib.references[0].sequence, "ACGTGCGTAC");
        assert_eq!(lib.references[1].id, "miR-x@rs1:A");
        assert_eq!(lib.references[1].sequence, "ACGTACGTAC");
        // entries differ at exactly the variant offset
        let diffs: Vec<usize> = lib.references[0]
            .sequence
            .bytes()
            .zip(lib.references[1].sequence.bytes())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(diffs, vec![4]);

        assert_eq!(lib.sites.len(), 1);
        assert_eq!(lib.sites[0].affected, vec!["miR-x", "miR-x@rs1:A"]);
        assert_eq!(lib.site_offsets["miR-x"][0].offset, 4);
    }

    #[test]
    fn multiallelic_site_fully_enumerated() {
        let matures = [fasta("miR-x", "ACGTGCGTAC")];
        let coords = coords_with(&[("miR-x", "chr1", 101, 110, Strand::Forward)]);
        let panel = panel_from(&format!("{HEADER}chr1\t105\trs1\tG\tA,T\t.\t.\t.\tGT\t1/2\n"));

        let lib = incorporate_variants(&matures, &coords, Some(&panel));

        // K = 3 alleles -> exactly K entries for the locus
        assert_eq!(lib.references.len(), 3);
        let ids: Vec<&str> = lib.references.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["miR-x", "miR-x@rs1:A", "miR-x@rs1:T"]);
    }

    #[test]
    fn minus_strand_substitutes_reverse_complement_at_mirrored_offset() {
        // mature at chr2:201-210 (-): transcript = revcomp(genomic).
        // genomic variant C>T at pos 203 -> transcript offset 210 - 203 = 7,
        // transcript alleles revcomp: C->G, T->A
        let matures = [fasta("miR-m", "ACGTACGGTA")]; // transcript space
        let coords = coords_with(&[("miR-m", "chr2", 201, 210, Strand::Reverse)]);
        let panel = panel_from(&format!("{HEADER}chr2\t203\trs9\tC\tT\t.\t.\t.\tGT\t0/1\n"));

        let lib = incorporate_variants(&matures, &coords, Some(&panel));

        assert_eq!(lib.references.len(), 2);
        assert_eq!(lib.site_offsets["miR-m"][0].offset, 7);
        assert_eq!(lib.site_offsets["miR-m"][0].alleles, vec!["G", "A"]);
        let expanded = &lib.references[1].sequence;
        assert_eq!(&expanded[..7], "ACGTACG");
        assert_eq!(expanded.as_bytes()[7], b'A');
        // tag keeps the genomic alphabet
        assert_eq!(lib.references[1].variant_tag.as_deref(), Some("rs9:T"));
    }

    #[test]
    fn ref_mismatch_is_skipped_with_warning() {
        let matures = [fasta("miR-x", "ACGTGCGTAC")];
        let coords = coords_with(&[("miR-x", "chr1", 101, 110, Strand::Forward)]);
        // claims REF=T at offset 4 but the sequence has G there
        let panel = panel_from(&format!("{HEADER}chr1\t105\trs1\tT\tA\t.\t.\t.\tGT\t0/1\n"));

        let lib = incorporate_variants(&matures, &coords, Some(&panel));

        assert_eq!(lib.references.len(), 1);
        assert!(lib.sites.is_empty());
        assert_eq!(lib.warnings.len(), 1);
        assert!(lib.warnings[0].contains("rs1"));
    }

    #[test]
    fn two_sites_enumerate_cartesian_product() {
        let matures = [fasta("miR-x", "ACGTGCGTAC")];
        let coords = coords_with(&[("miR-x", "chr1", 101, 110, Strand::Forward)]);
        let panel = panel_from(&format!(
            "{HEADER}chr1\t103\trs1\tG\tC\t.\t.\t.\tGT\t0/1\nchr1\t108\trs2\tT\tG\t.\t.\t.\tGT\t0/1\n"
        ));

        let lib = incorporate_variants(&matures, &coords, Some(&panel));

        let ids: Vec<&str> = lib.references.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["miR-x", "miR-x@rs2:G", "miR-x@rs1:C", "miR-x@rs1:C&rs2:G"]
        );
        let both = lib.reference_by_id("miR-x@rs1:C&rs2:G").unwrap();
        assert_eq!(both.sequence, "ACCTGCGGAC");
    }

    #[test]
    fn no_genotype_input_emits_canonical_only() {
        let matures = [fasta("miR-x", "ACGTGCGTAC"), fasta("miR-y", "TTTTGGGGCC")];
        let coords = coords_with(&[("miR-x", "chr1", 101, 110, Strand::Forward)]);

        let lib = incorporate_variants(&matures, &coords, None);

        assert_eq!(lib.references.len(), 2);
        assert!(lib.sites.is_empty());
        assert!(!lib.vcf_available);
        assert!(!lib.genotypes_available);
        // the record without coordinates is kept but flagged
        assert_eq!(lib.warnings.len(), 1);
    }

    #[test]
    fn u_bases_are_normalized_to_dna() {
        let matures = [fasta("miR-x", "acguGCGUAC")];
        let coords = coords_with(&[("miR-x", "chr1", 101, 110, Strand::Forward)]);
        let lib = incorporate_variants(&matures, &coords, None);
        assert_eq!(lib.references[0].sequence, "ACGTGCGTAC");
    }
}
