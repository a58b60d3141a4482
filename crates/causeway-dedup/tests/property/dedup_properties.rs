//! Property tests for normalization, origin hashes, and similarity.

use proptest::prelude::*;

use causeway_dedup::similarity::{ratio, weighted};
use causeway_dedup::{normalize, origin_hash};

proptest! {
    #[test]
    fn normalize_is_idempotent(s in ".{0,80}") {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn hash_ignores_case_and_spacing(words in prop::collection::vec("[a-zA-Z]{1,8}", 1..6)) {
        let tight = words.join(" ");
        let loose = format!("  {}  ", words.join("   ")).to_uppercase();
        prop_assert_eq!(origin_hash(&tight, "", None), origin_hash(&loose, "", None));
    }

    #[test]
    fn hash_is_deterministic(t in ".{0,40}", d in ".{0,40}", a in prop::option::of("[a-z]{1,8}")) {
        prop_assert_eq!(
            origin_hash(&t, &d, a.as_deref()),
            origin_hash(&t, &d, a.as_deref())
        );
    }

    #[test]
    fn ratio_is_symmetric_and_bounded(a in "[a-z ]{0,30}", b in "[a-z ]{0,30}") {
        let r = ratio(&a, &b);
        prop_assert!((0.0..=1.0).contains(&r));
        prop_assert!((r - ratio(&b, &a)).abs() < 1e-12);
    }

    #[test]
    fn identical_pairs_score_one(t in "[a-z ]{0,30}", d in "[a-z ]{0,30}") {
        let s = weighted(&t, &d, &t, &d, 0.7, 0.3);
        prop_assert!((s.total - 1.0).abs() < 1e-9);
    }
}
