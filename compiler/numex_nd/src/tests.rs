use super::*;
use numex_diagnostic::EvalErrorKind;
use pretty_assertions::assert_eq;

#[test]
fn valid_counts_follow_chunk_truncation() {
    let geometry = Geometry::new(&[10, 7], &[4, 4], &[3, 2]).unwrap();
    // Interior chunk, interior block.
    assert_eq!(valid_nitems(&geometry, 0, 0).unwrap(), 6);
    // Chunk rows 0..4 hold a second block row of one.
    assert_eq!(valid_nitems(&geometry, 0, 2).unwrap(), 2);
    // Last chunk: rows 8..10 and columns 4..7.
    assert_eq!(valid_nitems(&geometry, 5, 0).unwrap(), 4);
    assert_eq!(valid_nitems(&geometry, 5, 1).unwrap(), 2);
    assert_eq!(valid_nitems(&geometry, 5, 2).unwrap(), 0);
}

#[test]
fn out_of_range_indices_are_rejected() {
    let geometry = Geometry::new(&[10, 7], &[4, 4], &[3, 2]).unwrap();
    assert_eq!(geometry.nchunks(), 6);
    assert_eq!(geometry.nblocks(), 4);
    let err = valid_nitems(&geometry, 6, 0).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::InvalidArg);
    let err = valid_nitems(&geometry, 0, 4).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::InvalidArg);
}

#[test]
fn block_size_must_match_the_geometry() {
    let geometry = Geometry::new(&[8], &[8], &[4]).unwrap();
    assert!(block(&geometry, 4, 0, 1).is_ok());
    let err = block(&geometry, 8, 0, 1).unwrap_err();
    assert!(err.message.contains("block holds 4 elements, 8 given"));
}
