use mirvar_core::{AlignmentRecord, UniqueRead};

///
/// isomiR signature of one alignment, relative to the reference entry it
/// aligned to.
///
/// The signature is the concatenation of end offsets and internal
/// substitutions: `5p:-n` / `3p:-n` for trimmed bases, `5p:+n` / `3p:+n`
/// for non-templated additions beyond the reference boundary, and
/// `sub:<pos><ref>><read>` (1-based reference position) for substitutions.
/// A canonical-length exact match is `ref`.
///
/// Additions are only called when the aligned span reaches the respective
/// reference boundary; soft-clipped bases next to an internal start are
/// alignment noise, not tailing, and are ignored.
///
pub fn isomir_signature(
    read: &UniqueRead,
    record: &AlignmentRecord,
    reference_len: usize,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if record.offset > 0 {
        parts.push(format!("5p:-{}", record.offset));
    } else if record.read_start > 0 {
        parts.push(format!("5p:+{}", record.read_start));
    }

    let three_trim = reference_len.saturating_sub(record.end());
    if three_trim > 0 {
        parts.push(format!("3p:-{}", three_trim));
    } else {
        let trailing = read
            .sequence
            .len()
            .saturating_sub(record.read_start + record.span);
        if trailing > 0 {
            parts.push(format!("3p:+{}", trailing));
        }
    }

    if !record.mismatches.is_empty() {
        let subs: Vec<String> = record
            .mismatches
            .iter()
            .map(|m| {
                format!(
                    "{}{}>{}",
                    m.ref_pos + 1,
                    m.ref_base as char,
                    m.read_base as char
                )
            })
            .collect();
        parts.push(format!("sub:{}", subs.join(",")));
    }

    if parts.is_empty() {
        "ref".to_string()
    } else {
        parts.join("|")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirvar_core::{Mismatch, Strand};
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn fixture(seq: &str, offset: usize, read_start: usize, span: usize) -> (UniqueRead, AlignmentRecord) {
        (
            UniqueRead {
                id: "r".to_string(),
                sequence: seq.to_string(),
                count: 1,
            },
            AlignmentRecord {
                read_id: "r".to_string(),
                reference_id: "miR-x".to_string(),
                offset,
                read_start,
                span,
                strand: Strand::Forward,
                mismatches: Vec::new(),
            },
        )
    }

    // reference length 22 throughout
    #[rstest]
    #[case(22, 0, 0, 22, "ref")]
    #[case(20, 2, 0, 20, "5p:-2")]
    #[case(21, 0, 0, 21, "3p:-1")]
    #[case(19, 2, 0, 19, "5p:-2|3p:-1")]
    #[case(24, 0, 2, 22, "5p:+2")]
    #[case(24, 0, 0, 22, "3p:+2")]
    fn end_offsets(
        #[case] read_len: usize,
        #[case] offset: usize,
        #[case] read_start: usize,
        #[case] span: usize,
        #[case] expected: &str,
    ) {
        let (read, record) = fixture(&"A".repeat(read_len), offset, read_start, span);
        assert_eq!(isomir_signature(&read, &record, 22), expected);
    }

    #[test]
    fn substitutions_use_one_based_reference_positions() {
        let (read, mut record) = fixture(&"A".repeat(22), 0, 0, 22);
        record.mismatches = vec![
            Mismatch { read_pos: 6, ref_pos: 6, ref_base: b'G', read_base: b'A' },
            Mismatch { read_pos: 14, ref_pos: 14, ref_base: b'C', read_base: b'T' },
        ];
        assert_eq!(isomir_signature(&read, &record, 22), "sub:7G>A,15C>T");
    }

    #[test]
    fn trimming_and_substitution_combine() {
        let (read, mut record) = fixture(&"A".repeat(20), 1, 0, 20);
        record.mismatches = vec![Mismatch {
            read_pos: 3,
            ref_pos: 4,
            ref_base: b'G',
            read_base: b'A',
        }];
        assert_eq!(isomir_signature(&read, &record, 22), "5p:-1|3p:-1|sub:5G>A");
    }
}
