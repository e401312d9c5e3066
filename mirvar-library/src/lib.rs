//! Construction of the allele-expanded miRNA alignment library.
//!
//! The library is built once per distinct set of inputs and cached on disk
//! under a content digest of (genotype VCF, mature FASTA, hairpin FASTA,
//! coordinate GFF3). An unchanged digest skips both variant incorporation and
//! index building. The on-disk layout is published atomically so concurrent
//! sample runs sharing one library directory never observe a partial build.

pub mod coords;
pub mod digest;
pub mod expand;
pub mod fasta;
pub mod genotypes;
pub mod index;

pub use coords::{CoordinateMap, MirnaFeature, read_coordinates};
pub use digest::digest_files;
pub use expand::{ExpandedLibrary, LibraryInputs, SiteOffset, incorporate_variants};
pub use fasta::{FastaRecord, read_fasta};
pub use genotypes::{GenotypePanel, VcfRecord, read_genotypes};
pub use index::{IndexBuilder, LibraryManifest, LibraryPaths, LibraryStatus, prepare_library};
