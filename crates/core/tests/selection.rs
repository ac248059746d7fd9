//! Draw order properties.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::SeedableRng;
use verse_clock_core::{draw_order, draw_order_with};

#[test]
fn yields_each_candidate_exactly_once() {
    let mut rng = StdRng::seed_from_u64(7);
    for n in 0..40 {
        for _ in 0..25 {
            let input: Vec<usize> = (0..n).collect();
            let order = draw_order_with(input, &mut rng);
            assert_eq!(order.len(), n);
            let drawn: Vec<usize> = order.collect();
            assert_eq!(drawn.len(), n);
            let unique: HashSet<_> = drawn.iter().copied().collect();
            assert_eq!(unique.len(), n);
            assert!(drawn.iter().all(|x| *x < n));
        }
    }
}

#[test]
fn thread_rng_variant_is_a_permutation() {
    let books = vec!["Genesis".to_string(), "Exodus".into(), "Ruth".into()];
    let mut drawn: Vec<String> = draw_order(books.clone()).collect();
    drawn.sort();
    let mut expected = books;
    expected.sort();
    assert_eq!(drawn, expected);
}

#[test]
fn first_draw_is_spread_across_candidates() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut firsts: HashMap<u8, usize> = HashMap::new();
    for _ in 0..4000 {
        let first = draw_order_with(vec![0u8, 1, 2, 3], &mut rng).next().unwrap();
        *firsts.entry(first).or_default() += 1;
    }
    assert_eq!(firsts.len(), 4);
    for (k, count) in firsts {
        assert!((800..1200).contains(&count), "candidate {k} drawn first {count} times");
    }
}
