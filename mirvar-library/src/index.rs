use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use mirvar_core::MirvarError;
use mirvar_core::utils::check_input_exists;

use crate::coords::read_coordinates;
use crate::digest::digest_files;
use crate::expand::{ExpandedLibrary, LibraryInputs, incorporate_variants};
use crate::fasta::read_fasta;
use crate::genotypes::read_genotypes;

pub const MANIFEST_VERSION: u32 = 1;

/// Versioned, content-hash-keyed record describing a published library
/// directory. Serialized as `manifest.json` at the library root.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LibraryManifest {
    pub version: u32,
    pub content_digest: String,
    pub sequence_count: usize,
    pub site_count: usize,
    pub vcf_available: bool,
    pub genotypes_available: bool,
    pub samples: Vec<String>,
}

/// Whether `prepare_library` found a current cache or had to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryStatus {
    Reused,
    Built,
}

/// On-disk layout of one library directory.
#[derive(Debug, Clone)]
pub struct LibraryPaths {
    pub root: PathBuf,
}

impl LibraryPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> LibraryPaths {
        LibraryPaths {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn fasta(&self) -> PathBuf {
        self.root.join("fasta").join("library.fa")
    }

    /// Basename handed to the index builder and later to the aligner.
    pub fn index_prefix(&self) -> PathBuf {
        self.root.join("index").join("library")
    }

    pub fn manifest(&self) -> PathBuf {
        self.root.join("manifest.json")
    }

    pub fn records(&self) -> PathBuf {
        self.root.join("library.json")
    }
}

///
/// Wrapper around the external index-builder binary (bowtie2-build).
///
/// The binary is probed with `--version` before any build so a missing
/// collaborator is reported up front, and an abnormal exit aborts the run
/// rather than leaving a partial index behind.
///
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    pub program: PathBuf,
}

impl IndexBuilder {
    pub fn new<P: Into<PathBuf>>(program: P) -> IndexBuilder {
        IndexBuilder {
            program: program.into(),
        }
    }

    fn tool_error(&self, detail: String) -> MirvarError {
        MirvarError::ExternalTool {
            program: self.program.display().to_string(),
            detail,
        }
    }

    pub fn verify(&self) -> Result<(), MirvarError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| self.tool_error(format!("cannot invoke: {}", e)))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(self.tool_error(format!("--version probe failed: {}", output.status)))
        }
    }

    pub fn build(&self, fasta: &Path, index_prefix: &Path) -> Result<(), MirvarError> {
        let output = Command::new(&self.program)
            .arg("-q")
            .arg(fasta)
            .arg(index_prefix)
            .output()
            .map_err(|e| self.tool_error(format!("cannot invoke: {}", e)))?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(self.tool_error(format!(
                "{} ({})",
                output.status,
                stderr.lines().last().unwrap_or("no stderr")
            )))
        }
    }
}

fn write_fasta(library: &ExpandedLibrary, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for reference in &library.references {
        writeln!(writer, ">{}", reference.id)?;
        writeln!(writer, "{}", reference.sequence)?;
    }
    writer.flush()?;
    Ok(())
}

fn try_reuse(paths: &LibraryPaths, digest: &str) -> Option<ExpandedLibrary> {
    let manifest: LibraryManifest =
        serde_json::from_reader(File::open(paths.manifest()).ok()?).ok()?;
    if manifest.version != MANIFEST_VERSION || manifest.content_digest != digest {
        return None;
    }
    serde_json::from_reader(File::open(paths.records()).ok()?).ok()
}

///
/// Build — or reuse — the allele-expanded alignment library at `root`.
///
/// The library is keyed by a content digest of the four inputs; when the
/// published manifest carries the same digest the expanded records are
/// loaded back from `library.json` and no index is rebuilt. On a cache miss
/// everything is built in a temporary sibling directory and published with a
/// single rename, so concurrent runs sharing `root` never see a partial
/// library and a failed build leaves no cached artifact.
///
pub fn prepare_library(
    inputs: &LibraryInputs,
    root: &Path,
    builder: &IndexBuilder,
) -> Result<(ExpandedLibrary, LibraryStatus)> {
    check_input_exists(&inputs.matures)?;
    check_input_exists(&inputs.hairpins)?;
    check_input_exists(&inputs.coords)?;
    if let Some(vcf) = &inputs.vcf {
        check_input_exists(vcf)?;
    }

    let digest = digest_files(
        &inputs.matures,
        &inputs.hairpins,
        &inputs.coords,
        inputs.vcf.as_deref(),
    )?;

    let paths = LibraryPaths::new(root);
    if let Some(library) = try_reuse(&paths, &digest) {
        return Ok((library, LibraryStatus::Reused));
    }

    let matures = read_fasta(&inputs.matures)?;
    let panel = match &inputs.vcf {
        Some(vcf) => Some(read_genotypes(vcf)?),
        None => None,
    };
    let coords = read_coordinates(&inputs.coords)?;
    let library = incorporate_variants(&matures, &coords, panel.as_ref());

    let staging = staging_dir(root)?;
    let result = build_into(&staging, &digest, &library, builder);
    if result.is_err() {
        let _ = fs::remove_dir_all(&staging);
        result?;
    }

    // publish: the library becomes visible in one rename
    if root.exists() {
        fs::remove_dir_all(root)
            .with_context(|| format!("Failed to clear stale library at {:?}", root))?;
    }
    fs::rename(&staging, root)
        .with_context(|| format!("Failed to publish library to {:?}", root))?;

    Ok((library, LibraryStatus::Built))
}

fn staging_dir(root: &Path) -> Result<PathBuf> {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "library".to_string());
    let staging = root.with_file_name(format!(".{}.build-{}", name, std::process::id()));
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    Ok(staging)
}

fn build_into(
    staging: &Path,
    digest: &str,
    library: &ExpandedLibrary,
    builder: &IndexBuilder,
) -> Result<()> {
    let paths = LibraryPaths::new(staging);
    fs::create_dir_all(paths.fasta().parent().unwrap())?;
    fs::create_dir_all(paths.index_prefix().parent().unwrap())?;

    write_fasta(library, &paths.fasta())?;
    builder.build(&paths.fasta(), &paths.index_prefix())?;

    serde_json::to_writer(BufWriter::new(File::create(paths.records())?), library)?;
    let manifest = LibraryManifest {
        version: MANIFEST_VERSION,
        content_digest: digest.to_string(),
        sequence_count: library.references.len(),
        site_count: library.sites.len(),
        vcf_available: library.vcf_available,
        genotypes_available: library.genotypes_available,
        samples: library.samples.clone(),
    };
    serde_json::to_writer_pretty(BufWriter::new(File::create(paths.manifest())?), &manifest)?;
    Ok(())
}
