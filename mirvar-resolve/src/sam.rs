use std::path::Path;

use anyhow::{Context, Result, bail};
use fxhash::FxHashMap;
use noodles::bam;
use noodles::sam::{self, alignment::record::cigar::op::Kind};

use mirvar_core::utils::reverse_complement;
use mirvar_core::{AlignmentRecord, Mismatch, Strand, UniqueRead};
use mirvar_library::ExpandedLibrary;

///
/// Load the aligner's SAM (or BAM) output for one sample and regroup it as
/// per-read alignment records.
///
/// Multi-mapping records of one read are kept together in file order, which
/// downstream tie detection relies on. Unmapped records are skipped;
/// secondary records whose SEQ the aligner omitted are reconstructed from
/// the collapsed-read table.
///
pub fn read_alignments(
    path: &Path,
    library: &ExpandedLibrary,
    collapse: &FxHashMap<String, UniqueRead>,
) -> Result<Vec<(UniqueRead, Vec<AlignmentRecord>)>> {
    let mut groups: Vec<(UniqueRead, Vec<AlignmentRecord>)> = Vec::new();
    let mut by_name: FxHashMap<String, usize> = FxHashMap::default();

    if path.extension().is_some_and(|ext| ext == "bam") {
        let mut reader = bam::io::reader::Builder
            .build_from_path(path)
            .with_context(|| format!("Failed to open alignments: {:?}", path))?;
        let header = reader.read_header()?;
        for result in reader.records() {
            let record = result?;
            ingest(&record, &header, library, collapse, &mut groups, &mut by_name)?;
        }
    } else {
        let mut reader = sam::io::reader::Builder::default()
            .build_from_path(path)
            .with_context(|| format!("Failed to open alignments: {:?}", path))?;
        let header = reader.read_header()?;
        for result in reader.records() {
            let record = result?;
            ingest(&record, &header, library, collapse, &mut groups, &mut by_name)?;
        }
    }

    Ok(groups)
}

fn ingest<R: sam::alignment::Record>(
    record: &R,
    header: &sam::Header,
    library: &ExpandedLibrary,
    collapse: &FxHashMap<String, UniqueRead>,
    groups: &mut Vec<(UniqueRead, Vec<AlignmentRecord>)>,
    by_name: &mut FxHashMap<String, usize>,
) -> Result<()> {
    let flags = record.flags()?;
    if flags.is_unmapped() {
        return Ok(());
    }

    let name = record.name().context("mapped record without a read name")?;
    let name = std::str::from_utf8(name.as_ref())?.to_string();
    let read = collapse
        .get(&name)
        .with_context(|| format!("read {} is missing from the collapse table", name))?;

    let reference_index = record
        .reference_sequence_id(header)
        .transpose()?
        .with_context(|| format!("mapped record {} without a reference", name))?;
    let (reference_name, _) = header
        .reference_sequences()
        .get_index(reference_index)
        .with_context(|| format!("reference index {} out of bounds", reference_index))?;
    let reference_name = std::str::from_utf8(reference_name.as_ref())?.to_string();
    let reference = library
        .reference_by_id(&reference_name)
        .with_context(|| format!("aligned to {}, which the library does not contain", reference_name))?;

    let start = record
        .alignment_start()
        .transpose()?
        .with_context(|| format!("mapped record {} without a position", name))?;
    let offset = start.get() - 1;

    let strand = if flags.is_reverse_complemented() {
        Strand::Reverse
    } else {
        Strand::Forward
    };

    let mut seq: Vec<u8> = record.sequence().iter().collect();
    if seq.is_empty() {
        // SEQ "*": reconstruct the aligner's view from the collapsed read
        seq = match strand {
            Strand::Forward => read.sequence.clone().into_bytes(),
            Strand::Reverse => reverse_complement(&read.sequence).into_bytes(),
        };
    }
    let seq_len = seq.len();

    let reference_bytes = reference.sequence.as_bytes();
    let mut mismatches = Vec::new();
    let mut read_index = 0usize;
    let mut ref_index = offset;
    let mut read_start: Option<usize> = None;

    for op in record.cigar().iter() {
        let op = op?;
        match op.kind() {
            Kind::SoftClip | Kind::Insertion => read_index += op.len(),
            Kind::Deletion | Kind::Skip => ref_index += op.len(),
            Kind::HardClip | Kind::Pad => {}
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                read_start.get_or_insert(read_index);
                for k in 0..op.len() {
                    let ref_base = match reference_bytes.get(ref_index + k) {
                        Some(&base) => base,
                        None => bail!(
                            "alignment of {} runs past the end of {}",
                            name,
                            reference_name
                        ),
                    };
                    let read_base = seq
                        .get(read_index + k)
                        .copied()
                        .with_context(|| format!("CIGAR of {} overruns its sequence", name))?
                        .to_ascii_uppercase();
                    if read_base != ref_base {
                        let read_pos = match strand {
                            Strand::Forward => read_index + k,
                            Strand::Reverse => seq_len - 1 - (read_index + k),
                        };
                        mismatches.push(Mismatch {
                            read_pos,
                            ref_pos: ref_index + k,
                            ref_base,
                            read_base,
                        });
                    }
                }
                read_index += op.len();
                ref_index += op.len();
            }
        }
    }

    let alignment = AlignmentRecord {
        read_id: name.clone(),
        reference_id: reference_name,
        offset,
        read_start: read_start.unwrap_or(0),
        span: ref_index - offset,
        strand,
        mismatches,
    };

    let slot = *by_name.entry(name).or_insert_with(|| {
        groups.push((read.clone(), Vec::new()));
        groups.len() - 1
    });
    groups[slot].1.push(alignment);

    Ok(())
}
