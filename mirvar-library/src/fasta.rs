use std::path::Path;

use anyhow::{Result, bail};

use mirvar_core::utils::get_dynamic_reader;

/// One FASTA entry. The id is the first whitespace-delimited word of the
/// header; the rest is kept as the description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub id: String,
    pub description: Option<String>,
    pub sequence: String,
}

/// Parse a FASTA header line (without the leading '>') into id and
/// description.
pub fn parse_fasta_header(header: &str) -> (String, Option<String>) {
    let header = header.trim();
    match header.split_once(char::is_whitespace) {
        Some((id, desc)) => (id.to_string(), Some(desc.trim().to_string())),
        None => (header.to_string(), None),
    }
}

///
/// Read a (possibly gzipped) FASTA file into memory.
///
/// Sequence lines are concatenated verbatim; alphabet normalization is the
/// caller's concern. miRNA reference files are small enough that streaming
/// is not worth the complexity here.
///
pub fn read_fasta(path: &Path) -> Result<Vec<FastaRecord>> {
    use std::io::BufRead;

    let reader = get_dynamic_reader(path)?;
    let mut records: Vec<FastaRecord> = Vec::new();
    let mut current: Option<FastaRecord> = None;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            if let Some(record) = current.take() {
                records.push(record);
            }
            let (id, description) = parse_fasta_header(header);
            current = Some(FastaRecord {
                id,
                description,
                sequence: String::new(),
            });
        } else {
            match current.as_mut() {
                Some(record) => record.sequence.push_str(line),
                None => bail!(
                    "{}: line {} contains sequence data before any header",
                    path.display(),
                    line_num + 1
                ),
            }
        }
    }
    if let Some(record) = current.take() {
        records.push(record);
    }

    Ok(records)
}
