/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use crate::space::DimensionalSpace;

mod sealed {
    // Private trait: only types in this crate can implement it
    pub trait Sealed {}
}

/// Affine maps `f(x) = offset + dot(strides, x)` that can recover the
/// coordinate of a linear position.
pub trait AffineMapInverse: sealed::Sealed {
    /// Computes the coordinate for a linear position, or `None` if
    /// the position is not addressed by the map.
    fn coord_of(&self, position: usize) -> Option<Vec<usize>>;
}

impl sealed::Sealed for DimensionalSpace {}

impl AffineMapInverse for DimensionalSpace {
    fn coord_of(&self, position: usize) -> Option<Vec<usize>> {
        let mut pos = position.checked_sub(self.offset())?;
        let mut result = vec![0; self.num_dimensions()];

        let mut dims: Vec<_> = self
            .strides()
            .iter()
            .zip(DimensionalSpace::sizes(self).iter().enumerate())
            .collect();

        dims.sort_by_key(|&(stride, _)| *stride);

        // Invert: position = offset + ∑ᵢ (strideᵢ × coordᵢ)
        // by peeling off the largest strides first:
        //   coordᵢ = ⌊pos / strideᵢ⌋
        //   pos   -= coordᵢ × strideᵢ
        // If any coordᵢ ≥ sizeᵢ or pos ≠ 0 at the end, the position
        // is not in the space.
        for &(&stride, (i, &size)) in dims.iter().rev() {
            let index = if size > 1 && stride > 0 {
                pos / stride
            } else {
                0
            };
            if index >= size {
                return None;
            }
            result[i] = index;
            pos -= index * stride;
        }

        (pos == 0).then_some(result)
    }
}
