use std::ops::Range;

/// Binary dilation with the three-element structuring element repeated `iterations` times
///
/// Every `true` element spreads over `iterations` neighbours on both sides, elements outside of
/// the mask are `false`. Zero iterations return the mask unchanged.
pub fn binary_dilation(mask: &[bool], iterations: usize) -> Vec<bool> {
    let len = mask.len();
    let mut dilated = vec![false; len];
    for i in (0..len).filter(|&i| mask[i]) {
        let lower = i.saturating_sub(iterations);
        let upper = i.saturating_add(iterations).saturating_add(1).min(len);
        dilated[lower..upper].fill(true);
    }
    dilated
}

/// Maximal runs of consecutive `true` elements
pub fn label(mask: &[bool]) -> Vec<Range<usize>> {
    let mut regions = vec![];
    let mut start = None;
    for (i, &x) in mask.iter().enumerate() {
        match (x, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                regions.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        regions.push(s..mask.len());
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(s: &str) -> Vec<bool> {
        s.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn dilation() {
        assert_eq!(
            binary_dilation(&mask("0000100000"), 2),
            mask("0011111000")
        );
        assert_eq!(binary_dilation(&mask("1000000001"), 1), mask("1100000011"));
        assert_eq!(binary_dilation(&mask("0100"), 0), mask("0100"));
        assert_eq!(binary_dilation(&mask("0100"), 10), mask("1111"));
        assert!(binary_dilation(&[], 5).is_empty());
    }

    #[test]
    fn dilation_merges_close_regions() {
        let dilated = binary_dilation(&mask("01000100"), 2);
        assert_eq!(label(&dilated), vec![0..8]);
        let dilated = binary_dilation(&mask("0100000001"), 2);
        assert_eq!(label(&dilated), vec![0..4, 7..10]);
    }

    #[test]
    fn labels() {
        assert_eq!(label(&mask("0110011101")), vec![1..3, 5..8, 9..10]);
        assert_eq!(label(&mask("1111")), vec![0..4]);
        assert!(label(&mask("0000")).is_empty());
        assert!(label(&[]).is_empty());
    }
}
