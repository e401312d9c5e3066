//! Post-alignment resolution engine.
//!
//! Consumes the external aligner's SAM/BAM output for one sample, scores
//! every alignment, resolves each collapsed read to its minimal-score
//! alignment (preserving ties as ambiguous), classifies genotype
//! consistency against the sample's calls, and recomputes per-site
//! inconsistency rates.

pub mod annotate;
pub mod consistency;
pub mod sam;
pub mod score;

pub use annotate::{SiteCall, classify_alignment, resolve_reads, site_calls};
pub use consistency::{SiteReport, site_reports};
pub use sam::read_alignments;
pub use score::{ScoringParams, score_alignment};
