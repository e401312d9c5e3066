use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};

use mirvar_core::Genotype;
use mirvar_core::utils::get_dynamic_reader;

/// One data line of the genotype VCF, restricted to what variant
/// incorporation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct VcfRecord {
    pub chrom: String,
    /// 1-based.
    pub pos: u32,
    pub id: String,
    pub ref_allele: String,
    pub alt_alleles: Vec<String>,
    /// Per-sample calls, index-aligned with `GenotypePanel::samples`.
    /// `None` for missing calls (`./.`).
    pub genotypes: Vec<Option<Genotype>>,
}

/// All genotype calls of the run, plus the sample names declared in the VCF
/// header.
#[derive(Debug, Default)]
pub struct GenotypePanel {
    pub samples: Vec<String>,
    pub records: Vec<VcfRecord>,
}

impl GenotypePanel {
    pub fn has_sample(&self, sample: &str) -> bool {
        self.samples.iter().any(|s| s == sample)
    }

    /// Genotype map (sample name -> call) for one record.
    pub fn genotype_map(&self, record: &VcfRecord) -> HashMap<String, Genotype> {
        self.samples
            .iter()
            .zip(record.genotypes.iter())
            .filter_map(|(sample, gt)| gt.map(|g| (sample.clone(), g)))
            .collect()
    }
}

///
/// Read genotype calls from a (possibly gzipped) VCF.
///
/// Only CHROM/POS/ID/REF/ALT and the GT field of each sample column are
/// consumed. Records without an ALT allele are skipped. A VCF without sample
/// columns yields an empty sample list, which downstream treats as
/// genotype-unavailable.
///
pub fn read_genotypes(path: &Path) -> Result<GenotypePanel> {
    use std::io::BufRead;

    let reader = get_dynamic_reader(path)?;
    let mut panel = GenotypePanel::default();
    let mut saw_header = false;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.starts_with("##") || line.trim().is_empty() {
            continue;
        }
        if line.starts_with("#CHROM") {
            let columns: Vec<&str> = line.split('\t').collect();
            // CHROM POS ID REF ALT QUAL FILTER INFO [FORMAT sample..]
            panel.samples = columns.iter().skip(9).map(|s| s.to_string()).collect();
            saw_header = true;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        if !saw_header {
            bail!("{}: data line {} before #CHROM header", path.display(), line_num + 1);
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 8 {
            bail!(
                "{}: line {} has {} fields, expected at least 8",
                path.display(),
                line_num + 1,
                fields.len()
            );
        }

        let alt = fields[4];
        if alt == "." || alt.is_empty() {
            continue;
        }

        let pos: u32 = fields[1]
            .parse()
            .with_context(|| format!("{}: bad POS on line {}", path.display(), line_num + 1))?;

        let id = match fields[2] {
            "." | "" => format!("{}:{}", fields[0], pos),
            rsid => rsid.to_string(),
        };

        let genotypes = if fields.len() > 9 {
            let format = fields[8];
            let gt_index = format
                .split(':')
                .position(|key| key == "GT")
                .with_context(|| {
                    format!("{}: no GT key in FORMAT on line {}", path.display(), line_num + 1)
                })?;
            fields[9..]
                .iter()
                .map(|sample_field| {
                    sample_field
                        .split(':')
                        .nth(gt_index)
                        .and_then(Genotype::parse)
                })
                .collect()
        } else {
            Vec::new()
        };

        panel.records.push(VcfRecord {
            chrom: fields[0].to_string(),
            pos,
            id,
            ref_allele: fields[3].to_string(),
            alt_alleles: alt.split(',').map(|a| a.to_string()).collect(),
            genotypes,
        });
    }

    Ok(panel)
}
