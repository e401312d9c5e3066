use mirvar_core::AlignmentRecord;

///
/// Alignment scoring knobs.
///
/// Mismatches close to the read's 5' end are more likely true allelic signal
/// than sequencing noise, so they are weighted up instead of being treated
/// like any other mismatch. Alignments scoring strictly above
/// `score_threshold` are discarded (per alignment, never per read).
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringParams {
    /// Number of 5'-proximal read positions the weight applies to.
    pub five_prime_window: usize,
    /// Weight of a mismatch inside the window; mismatches outside count 1.
    pub five_prime_weight: u32,
    pub score_threshold: u32,
}

impl Default for ScoringParams {
    fn default() -> ScoringParams {
        ScoringParams {
            five_prime_window: 2,
            five_prime_weight: 4,
            score_threshold: 9,
        }
    }
}

/// Score = weighted mismatch count over the aligned span.
pub fn score_alignment(record: &AlignmentRecord, params: &ScoringParams) -> u32 {
    record
        .mismatches
        .iter()
        .map(|m| {
            if m.read_pos < params.five_prime_window {
                params.five_prime_weight
            } else {
                1
            }
        })
        .sum()
}
