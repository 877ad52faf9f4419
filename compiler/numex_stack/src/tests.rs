use super::*;

/// Depth of a right-nested chain such as `-(-(-(...)))`.
fn nested_depth(depth: u32) -> u32 {
    ensure_sufficient_stack(|| if depth == 0 { 0 } else { nested_depth(depth - 1) + 1 })
}

#[test]
fn shallow_nesting_passes_through() {
    assert_eq!(nested_depth(16), 16);
}

#[test]
fn deep_nesting_grows_the_stack() {
    assert_eq!(nested_depth(200_000), 200_000);
}

#[test]
fn propagates_results() {
    let parsed: Result<u8, String> = ensure_sufficient_stack(|| "7".parse().map_err(|_| String::new()));
    assert_eq!(parsed, Ok(7));
}
