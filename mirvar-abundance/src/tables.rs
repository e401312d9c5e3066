use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use mirvar_library::ExpandedLibrary;
use mirvar_resolve::SiteReport;

use crate::aggregate::AbundanceTables;

///
/// Which optional reports to produce, selected with one letter each:
/// `h` expressed hairpins, `p` polymiR table, `i` consistency table,
/// `c` remaining ambiguous reads, `s` isomiR distribution.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSelection {
    pub hairpins: bool,
    pub polymirs: bool,
    pub consistency: bool,
    pub ambiguous: bool,
    pub isomirs: bool,
}

impl Default for TableSelection {
    fn default() -> TableSelection {
        TableSelection::all()
    }
}

impl TableSelection {
    pub fn all() -> TableSelection {
        TableSelection {
            hairpins: true,
            polymirs: true,
            consistency: true,
            ambiguous: true,
            isomirs: true,
        }
    }

    pub fn parse(selection: &str) -> Result<TableSelection> {
        let mut parsed = TableSelection {
            hairpins: false,
            polymirs: false,
            consistency: false,
            ambiguous: false,
            isomirs: false,
        };
        for letter in selection.chars() {
            match letter {
                'h' => parsed.hairpins = true,
                'p' => parsed.polymirs = true,
                'i' => parsed.consistency = true,
                'c' => parsed.ambiguous = true,
                's' => parsed.isomirs = true,
                other => bail!("unknown table selector '{}' (expected letters from \"hpics\")", other),
            }
        }
        Ok(parsed)
    }
}

/// Counts are integral unless an explicit split policy divided them; print
/// whole numbers without a trailing `.0` so the common case stays clean.
fn format_count(count: f64) -> String {
    if count.fract() == 0.0 {
        format!("{}", count as u64)
    } else {
        format!("{:.3}", count)
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(
        File::create(path).with_context(|| format!("Failed to create {:?}", path))?,
    ))
}

///
/// Write the selected TSV reports for one sample into `results_dir`.
///
/// The mature abundance table is always written; the rest follow the
/// selection. Returns the paths written, in write order.
///
pub fn write_tables(
    results_dir: &Path,
    sample: &str,
    tables: &AbundanceTables,
    reports: &[SiteReport],
    library: &ExpandedLibrary,
    selection: &TableSelection,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    let target = |name: &str| results_dir.join(format!("{}_{}.tsv", sample, name));

    let path = target("abundances");
    let mut out = create(&path)?;
    writeln!(out, "mature_miRNA\tsample\tcount")?;
    for (locus, count) in &tables.matures {
        writeln!(out, "{}\t{}\t{}", locus, sample, format_count(*count))?;
    }
    written.push(path);

    if selection.hairpins {
        let path = target("expressed_hairpins");
        let mut out = create(&path)?;
        writeln!(out, "hairpin\tsample\tcount")?;
        for (hairpin, count) in &tables.hairpins {
            writeln!(out, "{}\t{}\t{}", hairpin, sample, format_count(*count))?;
        }
        written.push(path);
    }

    if selection.polymirs {
        let path = target("polymiRs");
        let mut out = create(&path)?;
        writeln!(
            out,
            "mature_miRNA\tsite\tallele\tgenotype\tconsistent\tinconsistent\tnot_applicable"
        )?;
        for ((locus, site_id, allele), counts) in &tables.alleles {
            let genotype = library
                .site_by_id(site_id)
                .and_then(|site| site.genotype_of(sample))
                .map(|g| g.to_string())
                .unwrap_or_else(|| "NA".to_string());
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                locus, site_id, allele, genotype, counts.consistent, counts.inconsistent,
                counts.not_applicable
            )?;
        }
        written.push(path);
    }

    if selection.consistency {
        let path = target("consistency");
        let mut out = create(&path)?;
        writeln!(out, "site\tconsistent\tinconsistent\trate\tstatus")?;
        for report in reports {
            writeln!(
                out,
                "{}\t{}\t{}\t{:.4}\t{}",
                report.site_id,
                report.consistent,
                report.inconsistent,
                report.rate,
                if report.suspicious { "highly_suspicious" } else { "ok" }
            )?;
        }
        written.push(path);
    }

    if selection.ambiguous {
        let path = target("remaining_ambiguous");
        let mut out = create(&path)?;
        writeln!(out, "read\tsequence\tcount\treferences")?;
        for entry in &tables.ambiguous {
            writeln!(
                out,
                "{}\t{}\t{}\t{}",
                entry.read_id,
                entry.sequence,
                entry.count,
                entry.references.join(",")
            )?;
        }
        written.push(path);
    }

    if selection.isomirs {
        let path = target("isomiRs_dist");
        let mut out = create(&path)?;
        writeln!(out, "mature_miRNA\tisomiR\tcount")?;
        for ((locus, signature), count) in &tables.isomirs {
            writeln!(out, "{}\t{}\t{}", locus, signature, count)?;
        }
        written.push(path);
    }

    Ok(written)
}
