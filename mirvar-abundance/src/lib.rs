//! Count aggregation for resolved reads.
//!
//! Re-expands each read's collapsed count into expression tables at four
//! granularities (hairpin, mature, polymiR allele, isomiR), keeps ambiguous
//! reads in their own table, and writes the selected TSV reports plus the
//! optional per-site consistency VCF.

pub mod aggregate;
pub mod isomir;
pub mod tables;
pub mod vcf_export;

pub use aggregate::{
    AbundanceTables, AmbiguousEntry, AmbiguousPolicy, ClassificationTotals, aggregate,
};
pub use isomir::isomir_signature;
pub use tables::{TableSelection, write_tables};
pub use vcf_export::write_consistency_vcf;
