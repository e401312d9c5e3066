use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

use crate::errors::MirvarError;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

/// Eager existence check for a required input; the pipeline runs this for
/// every input path before any stage starts.
pub fn check_input_exists(path: &Path) -> Result<(), MirvarError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(MirvarError::MissingInput(path.to_path_buf()))
    }
}

pub fn remove_all_extensions(path: &Path) -> String {
    let mut stem = path.file_stem().unwrap().to_string_lossy().to_string();

    let mut parent_path = path.with_file_name(stem.clone());
    while parent_path.extension().is_some() {
        parent_path = parent_path.with_extension("");
        stem = parent_path
            .file_stem()
            .unwrap()
            .to_string_lossy()
            .to_string();
    }

    stem
}

/// Sample name = file name with every extension stripped, matching how the
/// sample column of a genotype file is expected to be named.
pub fn sample_name_from_path(path: &Path) -> String {
    remove_all_extensions(&PathBuf::from(path))
}

/// Chromosome name with any `chr` prefix stripped, so annotation and
/// genotype files using different conventions still match.
pub fn chrom_key(chrom: &str) -> &str {
    chrom.strip_prefix("chr").unwrap_or(chrom)
}

/// Reverse complement in the DNA alphabet; non-ACGT bytes map to `N`.
pub fn reverse_complement(seq: &str) -> String {
    seq.bytes()
        .rev()
        .map(|b| match b {
            b'A' | b'a' => b'T',
            b'C' | b'c' => b'G',
            b'G' | b'g' => b'C',
            b'T' | b't' | b'U' | b'u' => b'A',
            _ => b'N',
        })
        .map(char::from)
        .collect()
}

/// Uppercase a sequence and normalize RNA U's to T's so reference and reads
/// share one alphabet.
pub fn normalize_to_dna(seq: &str) -> String {
    seq.bytes()
        .map(|b| match b.to_ascii_uppercase() {
            b'U' => b'T',
            other => other,
        })
        .map(char::from)
        .collect()
}
