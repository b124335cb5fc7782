// tests/unit_cohesion.rs
//! Cohesion scores, thresholds, and cluster graphs.

use prank_core::cohesion::{CohesionGraph, FocusStatistics};
use prank_core::descent::KnnDescent;
use prank_core::error::PrankError;
use prank_core::random::RandomContext;
use prank_core::ranking::ByScore;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

const TOL: f64 = 1e-12;

// Five points on a line at 0, 1, 2, 4, 8 with k = 2, friends best first.
fn line() -> Vec<(u32, Vec<u32>)> {
    vec![
        (0, vec![1, 2]),
        (1, vec![0, 2]),
        (2, vec![1, 0]),
        (4, vec![2, 1]),
        (8, vec![4, 2]),
    ]
}

fn two_triangles() -> Vec<(char, Vec<char>)> {
    vec![
        ('a', vec!['b', 'c']),
        ('b', vec!['a', 'c']),
        ('c', vec!['a', 'b']),
        ('d', vec!['e', 'f']),
        ('e', vec!['d', 'f']),
        ('f', vec!['d', 'e']),
    ]
}

fn close(a: Option<f64>, b: f64) -> bool {
    a.is_some_and(|a| (a - b).abs() < TOL)
}

#[test]
fn test_line_scores() {
    let g = CohesionGraph::build(line()).unwrap();
    assert!(close(g.cohesion(&0, &0), 37.0 / 30.0));
    assert!(close(g.cohesion(&0, &1), 59.0 / 60.0));
    assert!(close(g.cohesion(&0, &2), 17.0 / 30.0));
    assert!(close(g.cohesion(&2, &1), 0.9));
    assert!(close(g.cohesion(&2, &2), 16.0 / 15.0));
    assert!(close(g.cohesion(&4, &2), 0.7));
    assert!(close(g.cohesion(&4, &1), 0.5));
    assert!(close(g.cohesion(&8, &8), 0.8));
    assert_eq!(g.cohesion(&2, &4), None);
    assert!(close(g.normalized_cohesion(&0, &0), 37.0 / 120.0));
}

#[test]
fn test_line_thresholds_and_clusters() {
    let g = CohesionGraph::build(line()).unwrap();
    assert!((g.empirical_mean_cohesion() - 77.0 / 150.0).abs() < TOL);
    assert!((g.theoretical_mean_cohesion() - 77.0 / 150.0).abs() < TOL);
    assert_eq!(g.cohesion_graph().edge_count(), 15);

    let cluster = g.cluster_graph();
    assert_eq!(cluster.node_count(), 5);
    assert_eq!(cluster.edge_count(), 6);
    for (x, y) in [(0, 1), (0, 2), (1, 2)] {
        assert!(cluster.has_edge(&x, &y) && cluster.has_edge(&y, &x));
    }
    assert!(!cluster.has_edge(&4, &2));

    let comps = g.components().unwrap();
    assert_eq!(comps.len(), 3);
    assert!(comps.same_component(&0, &2));
    assert!(!comps.same_component(&4, &8));
    assert_eq!(comps.singleton_count(), 2);
}

#[test]
fn test_two_triangles_split() {
    let g = CohesionGraph::build(two_triangles()).unwrap();
    assert!((g.empirical_mean_cohesion() - 23.0 / 36.0).abs() < TOL);
    assert!(close(g.cohesion(&'a', &'b'), 13.0 / 12.0));
    assert!(close(g.cohesion(&'c', &'a'), 1.0));
    assert_eq!(g.cluster_graph().edge_count(), 12);

    let comps = g.components().unwrap();
    assert_eq!(comps.len(), 2);
    assert!(comps.same_component(&'a', &'c'));
    assert!(comps.same_component(&'d', &'f'));
    assert!(!comps.same_component(&'a', &'d'));
    assert_eq!(comps.size_tally().get(&3), Some(&2));
}

#[test]
fn test_one_way_friends_never_cluster() {
    // A directed ring: nobody is a mutual friend.
    let ring: Vec<(u8, Vec<u8>)> = (0..6u8).map(|i| (i, vec![(i + 1) % 6])).collect();
    let g = CohesionGraph::build(ring).unwrap();
    assert_eq!(g.mutual_friend_graph().edge_count(), 0);
    assert_eq!(g.cluster_graph().edge_count(), 0);
    let comps = g.components().unwrap();
    assert_eq!(comps.len(), 6);
    assert_eq!(comps.singleton_count(), 6);
}

#[test]
fn test_neighborhood_depths() {
    let g = CohesionGraph::build(line()).unwrap();
    let one = g.neighborhood(&8, 1).unwrap();
    assert_eq!(one.node_count(), 3);
    assert!(one.has_edge(&8, &4));
    assert!(one.has_edge(&8, &8));
    assert!(!one.has_edge(&4, &2));

    let two = g.neighborhood(&8, 2).unwrap();
    assert!(two.has_edge(&4, &2));
    assert!(two.has_edge(&2, &0));
    assert_eq!(two.edge_value(&8, &4), g.cohesion_graph().edge_value(&8, &4));

    assert!(matches!(g.neighborhood(&99, 1), Err(PrankError::UnknownPoint)));
}

#[test]
fn test_invalid_friend_maps() {
    let empty: Vec<(u8, Vec<u8>)> = Vec::new();
    assert!(matches!(CohesionGraph::build(empty), Err(PrankError::EmptyGraph)));
    assert!(matches!(
        CohesionGraph::build(vec![(1u8, vec![2u8])]),
        Err(PrankError::UnknownPoint)
    ));
    assert!(matches!(
        CohesionGraph::build(vec![(1u8, vec![1u8])]),
        Err(PrankError::SelfLoop)
    ));
}

#[test]
fn test_repeated_points_are_rejected() {
    let repeated_key = vec![(0u8, vec![1u8]), (1, vec![0]), (0, vec![1])];
    assert!(matches!(
        CohesionGraph::build(repeated_key),
        Err(PrankError::DuplicatePoint)
    ));

    let repeated_friend = vec![(0u8, vec![1u8, 1]), (1, vec![0]), (2, vec![0])];
    assert!(matches!(
        CohesionGraph::build(repeated_friend),
        Err(PrankError::DuplicatePoint)
    ));
    assert!(matches!(
        FocusStatistics::new(vec![(0u8, vec![1u8, 2, 1]), (1, vec![0]), (2, vec![0])]),
        Err(PrankError::DuplicatePoint)
    ));
}

#[test]
fn test_from_descent_covers_every_point() {
    let points: Vec<i64> = (0..90).map(|i| (i / 30) * 1_000 + i % 30).collect();
    let ranking = ByScore::new(|x: &i64, y: &i64| (x - y).abs() as f64);
    let mut descent = KnnDescent::new(points, ranking, 5, RandomContext::seeded(17)).unwrap();
    for _ in 0..6 {
        descent.refresh_friend_sets();
    }

    let g = CohesionGraph::from_descent(&descent).unwrap();
    assert_eq!(g.point_count(), 90);
    assert_eq!(g.cohesion_graph().edge_count(), 90 * 6);
    let comps = g.components().unwrap();
    let total: usize = comps.components().iter().map(Vec::len).sum();
    assert_eq!(total, 90);
    // Blocks a thousand apart never share a component.
    assert!(!comps.same_component(&0, &1_000));
    assert!(!comps.same_component(&1_000, &2_000));
}

fn random_lists(n: usize, k: usize, seed: u64) -> Vec<(usize, Vec<usize>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|x| {
            let friends = index::sample(&mut rng, n - 1, k)
                .into_iter()
                .map(|i| if i >= x { i + 1 } else { i })
                .collect();
            (x, friends)
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_cohesion_invariants(n in 5usize..30, k in 1usize..4, seed in any::<u64>()) {
        let lists = random_lists(n, k, seed);
        let g = CohesionGraph::build(lists.clone()).unwrap();

        prop_assert!((g.empirical_mean_cohesion() - g.theoretical_mean_cohesion()).abs() < 1e-9);
        prop_assert_eq!(g.cohesion_graph().edge_count(), n * (k + 1));
        prop_assert_eq!(g.cluster_graph().node_count(), n);

        let threshold = g.empirical_mean_cohesion();
        let scaled = threshold / (n - 1) as f64;
        prop_assert!(scaled > 0.0 && scaled <= 1.0, "scaled mean cohesion {}", scaled);
        for (x, y, _) in g.cluster_graph().edges() {
            prop_assert!(g.cluster_graph().has_edge(y, x));
            prop_assert!(x != y);
            let forward = g.cohesion(x, y).unwrap_or(0.0);
            let backward = g.cohesion(y, x).unwrap_or(0.0);
            prop_assert!(forward.min(backward) > threshold);
        }
        for (x, y, w) in g.cohesion_graph().edges() {
            prop_assert!(*w > 0.0);
            prop_assert!(*w <= (n - 1) as f64 + 1e-9);
            if x != y {
                prop_assert!(g.cohesion(x, y) < g.cohesion(x, x));
            }
        }

        let stats: &FocusStatistics<usize> = g.focus_statistics();
        for (x, friends) in &lists {
            for y in friends {
                let forward = stats.focus_count(x, y).unwrap();
                prop_assert!(forward >= 1);
                if stats.is_mutual(x, y) {
                    prop_assert_eq!(Some(forward), stats.focus_count(y, x));
                }
            }
        }
    }
}
