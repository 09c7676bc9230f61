/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Dense strided n-dimensional arrays over shared element buffers.
//!
//! Provides [`DimensionalSpace`], the affine map from coordinates to
//! buffer positions, and [`DenseArray`], a view that pairs a space with
//! a borrowed [`ElementBuffer`]. Slicing and indexing derive new views
//! in O(1) without copying; every view of a buffer observes writes made
//! through any other.
//!
//! Bulk transfers between views and flat buffers are planned by
//! [`transfer`], which moves contiguous runs as blocks when both sides
//! allow it and falls back to one element at a time otherwise.

mod affine;
pub use affine::AffineMapInverse;

/// Array views and the [`NdArray`] interface.
pub mod array;

/// Element storage.
pub mod buffer;

/// Transfer settings, read from the environment.
pub mod config;

/// Dimensional spaces, coordinates and index expressions.
pub mod space;

pub mod transfer;
pub mod validate;

#[cfg(test)]
mod strategy;

#[cfg(test)]
mod test_utils;

pub use array::ArrayError;
pub use array::DenseArray;
pub use array::DenseParts;
pub use array::NdArray;
pub use buffer::ArrayBuffer;
pub use buffer::BufferError;
pub use buffer::BufferWindow;
pub use buffer::ElementBuffer;
pub use config::Config;
/// Row-major coordinate iterator.
pub use space::Coords;
pub use space::DimensionalSpace;
/// A per-dimension selection: a point, a stepped range or everything.
pub use space::Index;
pub use space::SpaceError;
pub use transfer::Strategy;
