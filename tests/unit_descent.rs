// tests/unit_descent.rs
//! k-NN descent invariants on points along a line.

use std::collections::HashSet;

use prank_core::config::DescentConfig;
use prank_core::descent::KnnDescent;
use prank_core::error::PrankError;
use prank_core::random::RandomContext;
use prank_core::ranking::{ByScore, RankingSystem};
use proptest::prelude::*;

fn by_distance() -> impl RankingSystem<i64> {
    ByScore::new(|x: &i64, y: &i64| (x - y).abs() as f64)
}

fn line(n: i64) -> Vec<i64> {
    (0..n).map(|i| i * 3).collect()
}

fn assert_well_formed<R: RankingSystem<i64>>(descent: &KnnDescent<i64, R>) {
    for (x, friends) in descent.friend_lists() {
        assert_eq!(friends.len(), descent.k(), "point {x}");
        assert!(!friends.contains(&x), "point {x} befriended itself");
        let unique: HashSet<_> = friends.iter().collect();
        assert_eq!(unique.len(), friends.len(), "point {x} has duplicate friends");
        for pair in friends.windows(2) {
            assert!(
                descent.ranking().prefers(&x, &pair[0], &pair[1]),
                "friends of {x} out of order"
            );
        }
    }
}

#[test]
fn test_initial_friend_sets_are_well_formed() {
    let descent = KnnDescent::new(line(60), by_distance(), 5, RandomContext::seeded(1)).unwrap();
    assert_well_formed(&descent);
    assert_eq!(descent.friend_stats().min, 5.0);
    assert_eq!(descent.friend_stats().max, 5.0);
    let co = descent.co_friend_stats();
    assert!((co.mean - 5.0).abs() < 1e-12);
}

#[test]
fn test_refresh_keeps_sets_well_formed() {
    let mut descent =
        KnnDescent::new(line(80), by_distance(), 4, RandomContext::seeded(2)).unwrap();
    for _ in 0..3 {
        descent.refresh_friend_sets();
        assert_well_formed(&descent);
    }
}

#[test]
fn test_zero_k_is_rejected() {
    let result = KnnDescent::new(line(10), by_distance(), 0, RandomContext::seeded(0));
    assert!(matches!(result, Err(PrankError::InvalidNeighborCount(0))));
}

#[test]
fn test_too_few_distinct_points() {
    let points = vec![1, 1, 2, 2, 3];
    let result = KnnDescent::new(points, by_distance(), 3, RandomContext::seeded(0));
    assert!(matches!(
        result,
        Err(PrankError::TooFewPoints { points: 3, k: 3 })
    ));
}

#[test]
fn test_duplicates_are_dropped() {
    let points = vec![5, 1, 5, 9, 1, 13];
    let descent = KnnDescent::new(points, by_distance(), 2, RandomContext::seeded(0)).unwrap();
    assert_eq!(descent.points(), &[5, 1, 9, 13]);
}

#[test]
fn test_minimum_size_is_exact() {
    // With k + 1 points every other point is a friend.
    let descent = KnnDescent::new(line(4), by_distance(), 3, RandomContext::seeded(8)).unwrap();
    let map = descent.friend_map();
    assert_eq!(map.get(&0), Some(&vec![3, 6, 9]));
    assert_eq!(map.get(&6), Some(&vec![3, 9, 0]));
}

#[test]
fn test_descent_recovers_line_neighbours() {
    let mut descent =
        KnnDescent::new(line(100), by_distance(), 6, RandomContext::seeded(42)).unwrap();
    for _ in 0..12 {
        descent.refresh_friend_sets();
    }
    let quality = descent.quality_assessment(30);
    assert_eq!(quality.count, 30);
    assert!(quality.mean >= 0.9, "mean recall {}", quality.mean);
    assert!(quality.max <= 1.0);
}

#[test]
fn test_quality_never_drops_between_rounds() {
    // Three well-separated blocks; every point is checked, so there is no sampling noise.
    let points: Vec<i64> = (0..240).map(|i| (i / 80) * 10_000 + (i % 80) * 3).collect();
    for seed in 0..5 {
        let mut descent =
            KnnDescent::new(points.clone(), by_distance(), 6, RandomContext::seeded(seed))
                .unwrap();
        let mut previous = descent.quality_assessment(points.len()).mean;
        for round in 1..=6 {
            descent.refresh_friend_sets();
            let current = descent.quality_assessment(points.len()).mean;
            assert!(
                current >= previous - 1e-12,
                "seed {seed}, round {round}: recall fell from {previous} to {current}"
            );
            previous = current;
        }
    }
}

#[test]
fn test_friends_of_known_and_unknown_points() {
    let mut descent =
        KnnDescent::new(line(40), by_distance(), 3, RandomContext::seeded(8)).unwrap();
    descent.refresh_friend_sets();
    let lists = descent.friend_lists();
    for (point, friends) in &lists {
        let found: Vec<i64> = descent.friends_of(point).unwrap().into_iter().copied().collect();
        assert_eq!(&found, friends);
    }
    assert!(descent.friends_of(&1).is_none());
}

#[test]
fn test_run_report_is_consistent() {
    let mut descent =
        KnnDescent::new(line(200), by_distance(), 8, RandomContext::seeded(7)).unwrap();
    let cap = 2 * descent.expander_round_count();
    let report = descent.run(cap, 0.5);
    assert!(report.rounds >= 1);
    assert!(report.rounds <= cap);
    assert_eq!(report.max_rounds, cap);
    assert_eq!(report.clustering_rates.len(), report.rounds);
    assert!(report.clustering_rates.iter().all(|r| (0.0..=1.0).contains(r)));
    assert_well_formed(&descent);
}

#[test]
fn test_single_friend_stops_after_one_round() {
    let mut descent =
        KnnDescent::new(line(30), by_distance(), 1, RandomContext::seeded(3)).unwrap();
    let report = descent.run(10, 1.0);
    assert_eq!(report.rounds, 1);
    assert_eq!(report.clustering_rates, vec![0.0]);
}

#[test]
fn test_zero_round_cap_does_nothing() {
    let mut descent =
        KnnDescent::new(line(30), by_distance(), 3, RandomContext::seeded(3)).unwrap();
    let before = descent.friend_lists();
    let report = descent.run(0, 0.5);
    assert_eq!(report.rounds, 0);
    assert_eq!(descent.friend_lists(), before);
}

#[test]
fn test_same_seed_same_result() {
    let run = |seed| {
        let mut d =
            KnnDescent::new(line(120), by_distance(), 5, RandomContext::seeded(seed)).unwrap();
        d.run(6, 0.5);
        d.friend_lists()
    };
    assert_eq!(run(11), run(11));
}

#[test]
fn test_from_config_uses_seed_and_rounds() {
    let config = DescentConfig {
        k: 4,
        max_rounds: 3,
        seed: Some(9),
        ..DescentConfig::default()
    };
    let mut descent = KnnDescent::from_config(line(50), by_distance(), &config).unwrap();
    let report = descent.run_with(&config);
    assert!(report.rounds <= 3);
    assert_eq!(report.max_rounds, 3);

    let bad = DescentConfig {
        sample_rate: 0.0,
        ..DescentConfig::default()
    };
    assert!(KnnDescent::from_config(line(50), by_distance(), &bad).is_err());
}

#[test]
fn test_co_friends_mirror_friends() {
    let descent = KnnDescent::new(line(40), by_distance(), 3, RandomContext::seeded(5)).unwrap();
    let friends = descent.friend_map();
    let co = descent.co_friend_map();
    for (x, list) in &friends {
        for y in list {
            assert!(co[y].contains(x), "{x} -> {y} missing from co-friends");
        }
    }
    let co_total: usize = co.values().map(Vec::len).sum();
    assert_eq!(co_total, 40 * 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_friend_sets_have_exactly_k(n in 6i64..60, k in 1usize..5, seed in any::<u64>()) {
        let mut descent =
            KnnDescent::new(line(n), by_distance(), k, RandomContext::seeded(seed)).unwrap();
        descent.run(3, 0.5);
        for (x, friends) in descent.friend_lists() {
            prop_assert_eq!(friends.len(), k);
            prop_assert!(!friends.contains(&x));
        }
    }
}
