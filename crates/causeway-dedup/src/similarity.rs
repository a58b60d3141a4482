//! Edit-distance similarity between titles and descriptions.

/// Levenshtein distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rolling rows instead of the full matrix.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `1 - distance / longer_length`, in `[0, 1]`. Two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Per-field similarity and the weighted total for one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub total: f64,
    pub title: f64,
    pub description: f64,
}

/// Weighted similarity of two already-normalized `(title, description)` pairs.
///
/// When neither side has a description the title score stands alone, so
/// two empty descriptions cannot lift unrelated titles over a threshold.
pub fn weighted(
    title_a: &str,
    description_a: &str,
    title_b: &str,
    description_b: &str,
    title_weight: f64,
    description_weight: f64,
) -> Score {
    let title = ratio(title_a, title_b);
    if description_a.is_empty() && description_b.is_empty() {
        return Score {
            total: title,
            title,
            description: 1.0,
        };
    }
    let description = ratio(description_a, description_b);
    Score {
        total: title * title_weight + description * description_weight,
        title,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_distances() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn ratio_bounds() {
        assert_eq!(ratio("", ""), 1.0);
        assert_eq!(ratio("abc", "abc"), 1.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn description_only_counts_when_present() {
        let s = weighted("buy milk", "", "buy milk", "", 0.7, 0.3);
        assert_eq!(s.total, 1.0);

        let s = weighted("buy milk", "two litres", "buy milk", "", 0.7, 0.3);
        assert!((s.total - 0.7).abs() < 1e-9);
    }
}
