use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use fxhash::FxHashMap;
use indicatif::{ProgressBar, ProgressStyle};
use seq_io::fastq::{Reader, Record};

use mirvar_core::UniqueRead;
use mirvar_core::utils::get_dynamic_reader;

/// Collapsed unique reads keyed by their generated id, plus the sample's
/// total (pre-collapse) read count.
#[derive(Debug, Default)]
pub struct CollapseTable {
    pub reads: FxHashMap<String, UniqueRead>,
    pub total_reads: u64,
}

///
/// Deduplicate identical trimmed reads into unique sequences with counts.
///
/// Unique reads are named `seq{rank}_x{count}` with ranks assigned by
/// descending count (ties broken by sequence) so output is deterministic and
/// the count survives inside the read name across the external alignment
/// step. The collapsed FASTA at `output` is what the aligner receives.
///
pub fn collapse_reads(input: &Path, output: &Path) -> Result<CollapseTable> {
    let mut reader = Reader::new(get_dynamic_reader(input)?);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg}")
            .unwrap()
            .tick_strings(&["-", "\\", "|", "/"]),
    );
    spinner.set_message("Collapsing reads...");

    let mut counts: FxHashMap<String, u64> = FxHashMap::default();
    let mut total_reads: u64 = 0;
    while let Some(record) = reader.next() {
        let record = record.with_context(|| format!("Failed to parse FASTQ: {:?}", input))?;
        let sequence = std::str::from_utf8(record.seq())?.to_ascii_uppercase();
        *counts.entry(sequence).or_insert(0) += 1;
        total_reads += 1;
        if total_reads % 10_000 == 0 {
            spinner.set_message(format!("Collapsed {} reads", total_reads));
        }
        spinner.inc(1);
    }
    spinner.finish_with_message(format!("Collapsed {} reads", total_reads));

    let mut ordered: Vec<(String, u64)> = counts.into_iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut writer = BufWriter::new(
        File::create(output).with_context(|| format!("Failed to create {:?}", output))?,
    );
    let mut table = CollapseTable {
        total_reads,
        ..Default::default()
    };
    for (rank, (sequence, count)) in ordered.into_iter().enumerate() {
        let id = format!("seq{}_x{}", rank + 1, count);
        writeln!(writer, ">{}", id)?;
        writeln!(writer, "{}", sequence)?;
        table.reads.insert(
            id.clone(),
            UniqueRead {
                id,
                sequence,
                count,
            },
        );
    }
    writer.flush()?;

    Ok(table)
}

///
/// Rebuild the collapse table from a previously written collapsed FASTA,
/// recovering each count from the `seq{rank}_x{count}` id. Lets a run whose
/// collapse output is still fresh skip re-reading the trimmed FASTQ.
///
pub fn load_collapsed(path: &Path) -> Result<CollapseTable> {
    use seq_io::fasta::{Reader as FastaReader, Record as FastaRecord};

    let mut reader = FastaReader::new(get_dynamic_reader(path)?);
    let mut table = CollapseTable::default();

    while let Some(record) = reader.next() {
        let record = record.with_context(|| format!("Failed to parse FASTA: {:?}", path))?;
        let id = record.id()?.to_string();
        let count: u64 = id
            .rsplit_once("_x")
            .and_then(|(_, count)| count.parse().ok())
            .with_context(|| format!("collapsed read id without a count suffix: {}", id))?;
        let sequence = std::str::from_utf8(record.full_seq().as_ref())?.to_string();
        table.total_reads += count;
        table.reads.insert(
            id.clone(),
            UniqueRead {
                id,
                sequence,
                count,
            },
        );
    }

    Ok(table)
}
