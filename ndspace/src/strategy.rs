/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Property-based generators for shapes, coordinates and index lists.
//!
//! These strategies are used in `proptest`-based tests across the
//! crate to construct randomized arrays and selections.
//!
//! Example usage:
//!
//! ```ignore
//! use proptest::prelude::*;
//!
//! use crate::strategy::gen_shape_and_indices;
//!
//! proptest! {
//!     #[test]
//!     fn test_slice((shape, indices) in gen_shape_and_indices(3, 5)) {
//!         // Use `indices` to slice an array of `shape`
//!     }
//! }
//! ```
//!
//! This module is only included in test builds (`#[cfg(test)]`).

use proptest::prelude::*;

use crate::space::Index;

/// Generates a shape of rank `0..=max_rank` whose sizes lie in
/// `1..=max_size`.
pub fn gen_shape(max_rank: usize, max_size: usize) -> BoxedStrategy<Vec<usize>> {
    prop::collection::vec(1..=max_size, 0..=max_rank).boxed()
}

/// Generates a full, in-bounds coordinate of `shape`.
pub fn gen_coords(shape: Vec<usize>) -> BoxedStrategy<Vec<usize>> {
    shape
        .into_iter()
        .map(|size| 0..size)
        .collect::<Vec<_>>()
        .boxed()
}

/// Generates a shape together with one of its coordinates.
pub fn gen_shape_and_coords(
    max_rank: usize,
    max_size: usize,
) -> BoxedStrategy<(Vec<usize>, Vec<usize>)> {
    gen_shape(max_rank, max_size)
        .prop_flat_map(|shape| (Just(shape.clone()), gen_coords(shape)))
        .boxed()
}

/// Generates a valid index over a dimension of `size`: a point, a
/// nonempty stepped range, or the whole dimension.
pub fn gen_index(size: usize) -> BoxedStrategy<Index> {
    let point = (0..size).prop_map(Index::Point).boxed();

    let range = (0..size)
        .prop_flat_map(move |start| {
            (start + 1..=size, 1..=size)
                .prop_map(move |(end, step)| Index::Range(start, Some(end), step))
        })
        .boxed();

    let open = (0..size, 1..=size)
        .prop_map(|(start, step)| Index::Range(start, None, step))
        .boxed();

    prop_oneof![
        3 => point,
        3 => range,
        1 => open,
        2 => Just(Index::All),
    ]
    .boxed()
}

/// Generates a shape of rank `1..=max_rank` and a valid index list
/// over a nonempty prefix of its dimensions.
pub fn gen_shape_and_indices(
    max_rank: usize,
    max_size: usize,
) -> BoxedStrategy<(Vec<usize>, Vec<Index>)> {
    prop::collection::vec(1..=max_size, 1..=max_rank.max(1))
        .prop_flat_map(|shape| {
            let indices: Vec<_> = shape.iter().map(|&size| gen_index(size)).collect();
            let rank = shape.len();
            (Just(shape), indices, 1..=rank)
        })
        .prop_map(|(shape, mut indices, len)| {
            indices.truncate(len);
            (shape, indices)
        })
        .boxed()
}

mod tests {
    use proptest::strategy::ValueTree;
    use proptest::test_runner::Config;
    use proptest::test_runner::TestRunner;

    use super::*;
    use crate::space::DimensionalSpace;

    #[test]
    fn sample_many() {
        let mut runner = TestRunner::new(Config::default());

        for _ in 0..256 {
            let strat = gen_shape_and_indices(3, 5);
            let (shape, indices) = strat.new_tree(&mut runner).unwrap().current();
            assert!(!indices.is_empty() && indices.len() <= shape.len());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256, ..ProptestConfig::default()
        })]
        // Every generated index list is accepted by `map_to`, and the
        // derived space addresses only positions of the parent.
        #[test]
        fn generated_indices_map((shape, indices) in gen_shape_and_indices(3, 6)) {
            let space = DimensionalSpace::new_row_major(shape);
            let sub = space.map_to(&indices).unwrap();
            prop_assert!(sub.num_elements() >= 1);
            for position in sub.iter() {
                prop_assert!(position < space.num_elements());
            }
        }
    }
}
