use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha512};

/// Label used in place of the genotype file when none is supplied, so a run
/// with and without genotypes can never share a digest.
const NO_GENOTYPES: &str = "no-genotypes";

/// GA4GH-style truncated digest: SHA-512, first 24 bytes, base64url.
fn sha512t24u(hasher: Sha512) -> String {
    let digest = hasher.finalize();
    base64_url::encode(&digest[..24])
}

///
/// Content digest over the library input files, in fixed order.
///
/// Each file contributes its role label and raw bytes, so renaming a file
/// does not invalidate the cache but changing its content does. The digest
/// keys the cached library directory: an unchanged digest means the expanded
/// reference and its alignment index can be reused as-is.
///
pub fn digest_files(
    matures: &Path,
    hairpins: &Path,
    coords: &Path,
    vcf: Option<&Path>,
) -> Result<String> {
    let mut hasher = Sha512::new();

    let mut feed = |label: &str, path: &Path| -> Result<()> {
        hasher.update(label.as_bytes());
        hasher.update([0u8]);
        let mut file =
            File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        hasher.update([0u8]);
        Ok(())
    };

    feed("matures", matures)?;
    feed("hairpins", hairpins)?;
    feed("coords", coords)?;
    match vcf {
        Some(path) => feed("vcf", path)?,
        None => {
            hasher.update(NO_GENOTYPES.as_bytes());
            hasher.update([0u8]);
        }
    }

    Ok(sha512t24u(hasher))
}
