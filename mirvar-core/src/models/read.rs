use serde::{Deserialize, Serialize};

use super::consistency::Consistency;
use super::reference::Strand;

/// One collapsed unique read sequence and its total occurrence count in the
/// sample being processed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UniqueRead {
    pub id: String,
    pub sequence: String,
    pub count: u64,
}

/// A single mismatch between a read and the reference it aligned to.
/// `read_pos` is 0-based from the 5' end of the read; `ref_pos` is 0-based
/// on the reference entry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub read_pos: usize,
    pub ref_pos: usize,
    pub ref_base: u8,
    pub read_base: u8,
}

///
/// One alignment of a unique read against one reference sequence, as reported
/// by the external aligner.
///
/// `offset` is the 0-based reference position where the aligned span begins;
/// `read_start` is where that span begins within the reference-oriented read
/// sequence (nonzero when the aligner soft-clipped the read's start), and
/// `span` is the length of the aligned span on the reference.
///
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub read_id: String,
    pub reference_id: String,
    pub offset: usize,
    pub read_start: usize,
    pub span: usize,
    pub strand: Strand,
    pub mismatches: Vec<Mismatch>,
}

impl AlignmentRecord {
    /// 0-based end (exclusive) of the aligned span on the reference.
    pub fn end(&self) -> usize {
        self.offset + self.span
    }
}

/// An alignment with its score and genotype-consistency classification.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScoredAlignment {
    pub record: AlignmentRecord,
    pub score: u32,
    pub consistency: Consistency,
}

///
/// A unique read after per-read resolution: its surviving scored alignments,
/// the indices of those attaining the minimal score, and the single
/// classification bucket its whole collapsed count lands in.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRead {
    pub read: UniqueRead,
    pub alignments: Vec<ScoredAlignment>,
    /// Indices into `alignments` attaining the minimal score, in input order.
    pub best: Vec<usize>,
    pub classification: Consistency,
}

impl ResolvedRead {
    /// The winning alignment when the read is unambiguous.
    pub fn winner(&self) -> Option<&ScoredAlignment> {
        match self.best.as_slice() {
            [single] => Some(&self.alignments[*single]),
            _ => match self.classification {
                // tie confined to a single reference id
                Consistency::Ambiguous => None,
                _ => self.best.first().map(|i| &self.alignments[*i]),
            },
        }
    }

    /// Reference ids of the minimal-score alignments, deduplicated, in input
    /// order.
    pub fn tied_references(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for &i in &self.best {
            let id = self.alignments[i].record.reference_id.as_str();
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
        seen
    }
}
