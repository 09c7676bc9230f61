/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Dimensional spaces: the addressing half of a dense array.
//!
//! A [`DimensionalSpace`] maps coordinates in an n-dimensional shape
//! onto linear positions of a flat buffer:
//!
//! ```text
//! position(x) = offset + Σᵢ xᵢ × strideᵢ
//! ```
//!
//! Spaces are immutable. Indexing and slicing never modify a space;
//! they derive a new one (see [`DimensionalSpace::map_to`] and
//! [`DimensionalSpace::from_dim`]) that addresses a subset of the
//! same positions.

use std::fmt;

use itertools::izip;
use serde::Deserialize;
use serde::Serialize;

use crate::affine::AffineMapInverse;

/// Errors raised while deriving or addressing a [`DimensionalSpace`].
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SpaceError {
    #[error("invalid dims: expected {expected}, got {got}")]
    InvalidDims { expected: usize, got: usize },

    #[error("rank mismatch: {got} indices for a space of rank {rank}")]
    Rank { rank: usize, got: usize },

    #[error("{index} out of range for dimension {dim} of size {size}")]
    IndexOutOfRange {
        index: usize,
        dim: usize,
        size: usize,
    },

    #[error("range {range} out of bounds for dimension {dim} of size {size}")]
    RangeOutOfBounds {
        range: Index,
        dim: usize,
        size: usize,
    },

    #[error("invalid step in {index}: step must be at least 1")]
    InvalidStep { index: Index },

    #[error("value {value} not in space")]
    ValueNotInSpace { value: usize },
}

/// Shape and addressing metadata of a dense array: a base offset
/// plus one (size, stride) pair per dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DimensionalSpace {
    offset: usize,
    sizes: Vec<usize>,
    strides: Vec<usize>,
}

impl DimensionalSpace {
    /// Creates a space from explicit parts. Only the arity of `sizes`
    /// and `strides` is validated; reachability inside a buffer is
    /// checked when elements are accessed.
    pub fn new(offset: usize, sizes: Vec<usize>, strides: Vec<usize>) -> Result<Self, SpaceError> {
        if sizes.len() != strides.len() {
            return Err(SpaceError::InvalidDims {
                expected: sizes.len(),
                got: strides.len(),
            });
        }
        Ok(Self {
            offset,
            sizes,
            strides,
        })
    }

    /// Creates a C-order (row-major) space at offset 0: the last
    /// dimension varies fastest.
    pub fn new_row_major(sizes: impl Into<Vec<usize>>) -> Self {
        let sizes = sizes.into();
        let mut strides = vec![1; sizes.len()];
        for dim in (0..sizes.len().saturating_sub(1)).rev() {
            strides[dim] = strides[dim + 1] * sizes[dim + 1];
        }
        Self {
            offset: 0,
            sizes,
            strides,
        }
    }

    /// Number of dimensions.
    pub fn num_dimensions(&self) -> usize {
        self.sizes.len()
    }

    /// Alias of [`DimensionalSpace::num_dimensions`].
    pub fn rank(&self) -> usize {
        self.num_dimensions()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Total number of addressable elements.
    pub fn num_elements(&self) -> usize {
        self.sizes.iter().product()
    }

    /// The same dimensions, rooted at another base position.
    pub fn with_offset(&self, offset: usize) -> Self {
        Self {
            offset,
            sizes: self.sizes.clone(),
            strides: self.strides.clone(),
        }
    }

    /// Linear position of a (possibly partial) coordinate. A prefix
    /// of `k` coordinates addresses the origin of the sub-space over
    /// dimensions `[k..rank)`. Coordinate values are not checked
    /// against the sizes.
    pub fn position_of(&self, coords: &[usize]) -> Result<usize, SpaceError> {
        if coords.len() > self.rank() {
            return Err(SpaceError::Rank {
                rank: self.rank(),
                got: coords.len(),
            });
        }
        Ok(self.location(coords))
    }

    // Dot product ∑ᵢ (strideᵢ × coordᵢ) over the given prefix.
    pub(crate) fn location(&self, coords: &[usize]) -> usize {
        self.offset
            + coords
                .iter()
                .zip(&self.strides)
                .map(|(coord, stride)| coord * stride)
                .sum::<usize>()
    }

    /// The sub-space over dimensions `[k..rank)`, keeping this
    /// space's offset. `k >= rank` yields a rank-0 space.
    pub fn from_dim(&self, k: usize) -> Self {
        let k = k.min(self.rank());
        Self {
            offset: self.offset,
            sizes: self.sizes[k..].to_vec(),
            strides: self.strides[k..].to_vec(),
        }
    }

    /// Derives the space selected by `indices`, one per leading
    /// dimension; trailing dimensions without an index are kept
    /// whole. The result's offset is the absolute position of its
    /// origin.
    ///
    /// - [`Index::Point`] fixes the dimension and removes it.
    /// - [`Index::Range`] keeps the dimension with the selected count
    ///   of positions and a stride scaled by the step.
    /// - [`Index::All`] passes the dimension through.
    pub fn map_to(&self, indices: &[Index]) -> Result<Self, SpaceError> {
        if indices.len() > self.rank() {
            return Err(SpaceError::Rank {
                rank: self.rank(),
                got: indices.len(),
            });
        }

        let mut offset = self.offset;
        let mut sizes = Vec::with_capacity(self.rank());
        let mut strides = Vec::with_capacity(self.rank());
        for (dim, &size, &stride) in izip!(0.., &self.sizes, &self.strides) {
            match indices.get(dim).unwrap_or(&Index::All) {
                &Index::Point(index) => {
                    if index >= size {
                        return Err(SpaceError::IndexOutOfRange { index, dim, size });
                    }
                    offset += index * stride;
                }
                range @ Index::Range(..) => {
                    let (begin, len, step) = range.resolve(dim, size)?;
                    offset += begin * stride;
                    sizes.push(len);
                    // A single selected position never advances.
                    let stride = if len <= 1 {
                        stride
                    } else {
                        stride
                            .checked_mul(step)
                            .ok_or_else(|| SpaceError::InvalidStep {
                                index: range.clone(),
                            })?
                    };
                    strides.push(stride);
                }
                Index::All => {
                    sizes.push(size);
                    strides.push(stride);
                }
            }
        }

        Ok(Self {
            offset,
            sizes,
            strides,
        })
    }

    /// The coordinate addressing `position`, if any.
    pub fn coordinates(&self, position: usize) -> Result<Vec<usize>, SpaceError> {
        self.coord_of(position)
            .ok_or(SpaceError::ValueNotInSpace { value: position })
    }

    /// Highest position reachable in this space, or `None` when the
    /// space has no elements.
    pub fn max_position(&self) -> Option<usize> {
        if self.sizes.contains(&0) {
            return None;
        }
        let last: Vec<usize> = self.sizes.iter().map(|size| size - 1).collect();
        Some(self.location(&last))
    }

    /// Index of the first dimension of the trailing block whose
    /// positions form one run of consecutive offsets. Dimensions of
    /// size 1 never break a run. A fully dense row-major space
    /// returns 0; a space whose last stride is not 1 returns `rank`.
    pub fn contiguous_dims(&self) -> usize {
        let mut run = 1;
        let mut dim = self.rank();
        while dim > 0 {
            let (size, stride) = (self.sizes[dim - 1], self.strides[dim - 1]);
            if size != 1 && stride != run {
                break;
            }
            run *= size;
            dim -= 1;
        }
        dim
    }

    /// Whether every element lies in one run of consecutive offsets.
    pub fn is_contiguous(&self) -> bool {
        self.contiguous_dims() == 0
    }

    /// Iterates coordinates in row-major order: dimension 0 varies
    /// slowest, the last dimension fastest.
    pub fn coords(&self) -> Coords {
        Coords::new(self.sizes.clone())
    }

    /// Iterates linear positions in the order of [`Self::coords`].
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.coords().map(move |coord| self.location(&coord))
    }
}

impl fmt::Display for DimensionalSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[off={} sz={:?} st={:?}]",
            self.offset, self.sizes, self.strides
        )
    }
}

/// Row-major iterator over every coordinate of a shape. A rank-0
/// shape yields a single empty coordinate; a shape with a zero-sized
/// dimension yields nothing.
#[derive(Debug, Clone)]
pub struct Coords {
    sizes: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl Coords {
    pub fn new(sizes: Vec<usize>) -> Self {
        let next = (!sizes.contains(&0)).then(|| vec![0; sizes.len()]);
        Self { sizes, next }
    }
}

impl Iterator for Coords {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let mut succ = current.clone();
        for dim in (0..succ.len()).rev() {
            succ[dim] += 1;
            if succ[dim] < self.sizes[dim] {
                self.next = Some(succ);
                break;
            }
            succ[dim] = 0;
        }
        Some(current)
    }
}

/// A selector over one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Index {
    /// A single position; the dimension is removed.
    Point(usize),
    /// Positions `start, start + step, ...` below the (optional,
    /// exclusive) end, which is clamped to the dimension size.
    Range(usize, Option<usize>, usize),
    /// The whole dimension.
    All,
}

impl Index {
    pub fn at(position: usize) -> Self {
        Index::Point(position)
    }

    pub fn all() -> Self {
        Index::All
    }

    pub fn range(start: usize, end: usize) -> Self {
        Index::Range(start, Some(end), 1)
    }

    pub fn range_step(start: usize, end: usize, step: usize) -> Self {
        Index::Range(start, Some(end), step)
    }

    pub fn from_start(start: usize) -> Self {
        Index::Range(start, None, 1)
    }

    pub fn to_end(end: usize) -> Self {
        Index::Range(0, Some(end), 1)
    }

    /// Every `step`-th position from 0.
    pub fn step(step: usize) -> Self {
        Index::Range(0, None, step)
    }

    pub fn even() -> Self {
        Index::Range(0, None, 2)
    }

    pub fn odd() -> Self {
        Index::Range(1, None, 2)
    }

    /// Resolves a range against a dimension of `size` into
    /// `(begin, count, step)`.
    fn resolve(&self, dim: usize, size: usize) -> Result<(usize, usize, usize), SpaceError> {
        match *self {
            Index::Range(_, _, 0) => Err(SpaceError::InvalidStep {
                index: self.clone(),
            }),
            Index::Range(begin, _, _) if begin > size => Err(SpaceError::RangeOutOfBounds {
                range: self.clone(),
                dim,
                size,
            }),
            Index::Range(begin, end, step) => {
                let end = end.map_or(size, |end| end.min(size)).max(begin);
                Ok((begin, (end - begin).div_ceil(step), step))
            }
            Index::Point(position) => Ok((position, 1, 1)),
            Index::All => Ok((0, size, 1)),
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::Point(position) => write!(f, "{}", position),
            Index::Range(begin, None, step) => write!(f, "{}::{}", begin, step),
            Index::Range(begin, Some(end), step) => write!(f, "{}:{}:{}", begin, end, step),
            Index::All => write!(f, ":"),
        }
    }
}

impl From<usize> for Index {
    fn from(position: usize) -> Self {
        Index::Point(position)
    }
}

impl From<std::ops::Range<usize>> for Index {
    fn from(r: std::ops::Range<usize>) -> Self {
        Index::Range(r.start, Some(r.end), 1)
    }
}

impl From<std::ops::RangeInclusive<usize>> for Index {
    fn from(r: std::ops::RangeInclusive<usize>) -> Self {
        Index::Range(*r.start(), r.end().checked_add(1), 1)
    }
}

impl From<std::ops::RangeFrom<usize>> for Index {
    fn from(r: std::ops::RangeFrom<usize>) -> Self {
        Index::Range(r.start, None, 1)
    }
}

impl From<std::ops::RangeTo<usize>> for Index {
    fn from(r: std::ops::RangeTo<usize>) -> Self {
        Index::Range(0, Some(r.end), 1)
    }
}

impl From<std::ops::RangeFull> for Index {
    fn from(_: std::ops::RangeFull) -> Self {
        Index::All
    }
}
