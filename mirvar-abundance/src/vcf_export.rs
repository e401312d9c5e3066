use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use mirvar_library::ExpandedLibrary;
use mirvar_resolve::SiteReport;

///
/// Secondary export: one VCF line per genotyped variant site, annotated
/// with the sample's consistency tallies. Suspicious sites carry the SUSP
/// flag so they are easy to filter downstream.
///
pub fn write_consistency_vcf(
    path: &Path,
    sample: &str,
    library: &ExpandedLibrary,
    reports: &[SiteReport],
) -> Result<()> {
    let mut out = BufWriter::new(
        File::create(path).with_context(|| format!("Failed to create {:?}", path))?,
    );

    writeln!(out, "##fileformat=VCFv4.2")?;
    writeln!(out, "##source=mirvar")?;
    writeln!(out, "##sample={}", sample)?;
    writeln!(
        out,
        "##INFO=<ID=CONS,Number=1,Type=Integer,Description=\"Reads consistent with the sample genotype\">"
    )?;
    writeln!(
        out,
        "##INFO=<ID=INCONS,Number=1,Type=Integer,Description=\"Reads carrying an allele absent from the sample genotype\">"
    )?;
    writeln!(
        out,
        "##INFO=<ID=RATE,Number=1,Type=Float,Description=\"Inconsistent fraction of classified reads\">"
    )?;
    writeln!(
        out,
        "##INFO=<ID=SUSP,Number=0,Type=Flag,Description=\"Inconsistency rate above the flagging threshold\">"
    )?;
    writeln!(out, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO")?;

    for report in reports {
        let Some(site) = library.site_by_id(&report.site_id) else {
            continue;
        };
        let mut info = format!(
            "CONS={};INCONS={};RATE={:.4}",
            report.consistent, report.inconsistent, report.rate
        );
        if report.suspicious {
            info.push_str(";SUSP");
        }
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t.\t.\t{}",
            site.chrom,
            site.pos,
            site.id,
            site.ref_allele,
            site.alt_alleles.join(","),
            info
        )?;
    }

    Ok(())
}
