/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Dense array views.
//!
//! A [`DenseArray`] pairs a [`DimensionalSpace`] with a borrowed
//! [`ElementBuffer`]. The buffer belongs to whoever created the root
//! array; every view derived from it (by [`DenseArray::slice`],
//! [`DenseArray::get`], ...) holds the same `&'a B` plus its own
//! space, so deriving a view is O(1) and writes through any view are
//! visible through all others:
//!
//! ```
//! use ndspace::ArrayBuffer;
//! use ndspace::DenseArray;
//! use ndspace::NdArray;
//!
//! let buf = ArrayBuffer::from(vec![1, 2, 3, 4, 5, 6]);
//! let array = DenseArray::row_major(&buf, vec![2, 3]);
//! let row = array.get(&[1]).unwrap();
//! assert_eq!(row.get_object(&[2]).unwrap(), 6);
//!
//! row.set_object(60, &[2]).unwrap();
//! assert_eq!(array.get_object(&[1, 2]).unwrap(), 60);
//! ```
//!
//! ## Coordinates
//!
//! Two families of accessors take coordinate tuples, and they treat
//! short tuples differently:
//!
//! - [`DenseArray::get`] accepts up to `rank` coordinates and returns
//!   the sub-array they root; an empty tuple returns the whole view.
//! - [`NdArray::get_object`] and [`NdArray::set_object`] address a
//!   single element and require exactly `rank` coordinates.
//!
//! ## Copies
//!
//! [`NdArray::copy_to`] is the single entry point for array-to-array
//! copies. A dense source probes the destination with
//! [`NdArray::dense_parts`]: dense destinations are filled by
//! [`transfer::copy_between`], any other implementation by
//! [`transfer::copy_scalars`].

use std::fmt;

use crate::buffer::BufferError;
use crate::buffer::ElementBuffer;
use crate::space::Coords;
use crate::space::DimensionalSpace;
use crate::space::Index;
use crate::space::SpaceError;
use crate::transfer;
use crate::validate;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ArrayError {
    #[error("rank mismatch: expected {expected} coordinates, got {got}")]
    Rank { expected: usize, got: usize },

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// More coordinates than the array has dimensions.
    #[error("{got} coordinates exceed rank {rank}")]
    IndexOutOfBounds { got: usize, rank: usize },

    /// A coordinate past the size of its dimension.
    #[error("{index} out of range for dimension {dim} of size {size}")]
    CoordinateOutOfRange {
        index: usize,
        dim: usize,
        size: usize,
    },

    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("incompatible shapes: cannot copy {src:?} into {dst:?}")]
    IncompatibleShapes { src: Vec<usize>, dst: Vec<usize> },

    #[error(transparent)]
    Space(#[from] SpaceError),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// The buffer and space behind a dense array, exposed to copies that
/// can address it directly.
pub struct DenseParts<'a, T> {
    pub buffer: &'a dyn ElementBuffer<Elem = T>,
    pub space: &'a DimensionalSpace,
}

/// An n-dimensional array of `T`, whatever its storage.
pub trait NdArray<T> {
    fn shape(&self) -> &[usize];

    fn rank(&self) -> usize {
        self.shape().len()
    }

    /// Total number of elements.
    fn size(&self) -> usize {
        self.shape().iter().product()
    }

    /// The element at a full coordinate.
    fn get_object(&self, coords: &[usize]) -> Result<T, ArrayError>;

    /// Stores the element at a full coordinate.
    fn set_object(&self, value: T, coords: &[usize]) -> Result<(), ArrayError>;

    /// `Some` when this array is a dense view whose buffer can be
    /// addressed directly.
    fn dense_parts(&self) -> Option<DenseParts<'_, T>> {
        None
    }

    /// Copies every element into `destination`, which must have the
    /// same shape.
    fn copy_to(&self, destination: &dyn NdArray<T>) -> Result<(), ArrayError> {
        transfer::copy_scalars(self, destination)
    }
}

/// A shaped window over a shared element buffer.
pub struct DenseArray<'a, B: ElementBuffer> {
    buffer: &'a B,
    space: DimensionalSpace,
}

impl<'a, B: ElementBuffer> DenseArray<'a, B> {
    pub fn new(buffer: &'a B, space: DimensionalSpace) -> Self {
        Self { buffer, space }
    }

    /// A row-major array over the start of `buffer`.
    pub fn row_major(buffer: &'a B, sizes: impl Into<Vec<usize>>) -> Self {
        Self::new(buffer, DimensionalSpace::new_row_major(sizes))
    }

    pub fn space(&self) -> &DimensionalSpace {
        &self.space
    }

    pub fn buffer(&self) -> &'a B {
        self.buffer
    }

    /// The view over `space` rooted at `position` of the shared buffer.
    pub fn slice_at(&self, position: usize, space: DimensionalSpace) -> Self {
        Self::new(self.buffer, space.with_offset(position))
    }

    /// The view selected by `indices`, one per leading dimension.
    pub fn slice(&self, indices: &[Index]) -> Result<Self, ArrayError> {
        if indices.is_empty() {
            return Err(ArrayError::InvalidArgument {
                reason: "slicing requires at least one index".to_string(),
            });
        }
        let space = self.space.map_to(indices)?;
        Ok(self.slice_at(space.offset(), space))
    }

    /// The sub-array rooted at `coords`, which may name fewer
    /// dimensions than the rank.
    pub fn get(&self, coords: &[usize]) -> Result<Self, ArrayError> {
        let position = self.position_of(coords, false)?;
        Ok(self.slice_at(position, self.space.from_dim(coords.len())))
    }

    /// Copies `source` into the sub-array rooted at `coords`, or into
    /// this whole view when `coords` is empty.
    pub fn set<S>(&self, source: &S, coords: &[usize]) -> Result<(), ArrayError>
    where
        S: NdArray<B::Elem> + ?Sized,
    {
        if coords.is_empty() {
            source.copy_to(self)
        } else {
            source.copy_to(&self.get(coords)?)
        }
    }

    /// Reads every element, in row-major order, into `destination`.
    pub fn read<D>(&self, destination: &D) -> Result<(), ArrayError>
    where
        D: ElementBuffer<Elem = B::Elem> + ?Sized,
    {
        validate::check_read_compatible(&self.space, destination)?;
        transfer::read_into(self.buffer, &self.space, destination)
    }

    /// Overwrites every element, in row-major order, from `source`.
    pub fn write<S>(&self, source: &S) -> Result<(), ArrayError>
    where
        S: ElementBuffer<Elem = B::Elem> + ?Sized,
    {
        validate::check_write_compatible(&self.space, source)?;
        transfer::write_from(source, self.buffer, &self.space)
    }

    /// The elements in row-major order.
    pub fn to_vec(&self) -> Result<Vec<B::Elem>, ArrayError> {
        validate::check_within(&self.space, self.buffer)?;
        let mut out = Vec::with_capacity(self.space.num_elements());
        for position in self.space.iter() {
            out.push(self.buffer.get(position)?);
        }
        Ok(out)
    }

    /// Rank-0 views of every element, in row-major order.
    pub fn scalars(&self) -> impl Iterator<Item = DenseArray<'a, B>> + '_ {
        let scalar = self.space.from_dim(self.space.rank());
        self.space
            .iter()
            .map(move |position| self.slice_at(position, scalar.clone()))
    }

    /// The sub-arrays obtained by fixing dimensions `0..=dim`, in
    /// row-major order.
    pub fn elements(
        &self,
        dim: usize,
    ) -> Result<impl Iterator<Item = DenseArray<'a, B>> + '_, ArrayError> {
        if dim >= self.space.rank() {
            return Err(ArrayError::IndexOutOfBounds {
                got: dim + 1,
                rank: self.space.rank(),
            });
        }
        let inner = self.space.from_dim(dim + 1);
        Ok(Coords::new(self.space.sizes()[..=dim].to_vec())
            .map(move |coord| self.slice_at(self.space.location(&coord), inner.clone())))
    }

    // Scalar accesses must name every dimension; sub-array accesses
    // may name a prefix.
    fn position_of(&self, coords: &[usize], scalar: bool) -> Result<usize, ArrayError> {
        let rank = self.space.rank();
        if scalar && coords.len() != rank {
            return Err(ArrayError::Rank {
                expected: rank,
                got: coords.len(),
            });
        }
        if coords.len() > rank {
            return Err(ArrayError::IndexOutOfBounds {
                got: coords.len(),
                rank,
            });
        }
        for (dim, (&index, &size)) in coords.iter().zip(self.space.sizes()).enumerate() {
            if index >= size {
                return Err(ArrayError::CoordinateOutOfRange { index, dim, size });
            }
        }
        Ok(self.space.position_of(coords)?)
    }
}

impl<B: ElementBuffer> Clone for DenseArray<'_, B> {
    fn clone(&self) -> Self {
        Self::new(self.buffer, self.space.clone())
    }
}

impl<B: ElementBuffer> fmt::Debug for DenseArray<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseArray")
            .field("space", &self.space)
            .finish()
    }
}

impl<B: ElementBuffer> NdArray<B::Elem> for DenseArray<'_, B> {
    fn shape(&self) -> &[usize] {
        self.space.sizes()
    }

    fn get_object(&self, coords: &[usize]) -> Result<B::Elem, ArrayError> {
        Ok(self.buffer.get(self.position_of(coords, true)?)?)
    }

    fn set_object(&self, value: B::Elem, coords: &[usize]) -> Result<(), ArrayError> {
        Ok(self.buffer.set(value, self.position_of(coords, true)?)?)
    }

    fn dense_parts(&self) -> Option<DenseParts<'_, B::Elem>> {
        Some(DenseParts {
            buffer: self.buffer,
            space: &self.space,
        })
    }

    fn copy_to(&self, destination: &dyn NdArray<B::Elem>) -> Result<(), ArrayError> {
        validate::check_copy_compatible(self.shape(), destination.shape())?;
        match destination.dense_parts() {
            Some(parts) => {
                transfer::copy_between(self.buffer, &self.space, parts.buffer, parts.space)
            }
            None => {
                tracing::debug!(
                    shape = ?self.shape(),
                    "destination is not dense; copying scalar by scalar"
                );
                transfer::copy_scalars(self, destination)
            }
        }
    }
}
