/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Pre-conditions of bulk transfers. Every check here runs before a
//! transfer moves its first element.

use crate::array::ArrayError;
use crate::buffer::BufferError;
use crate::buffer::ElementBuffer;
use crate::space::DimensionalSpace;

/// `destination` must hold exactly the elements of `space`.
pub fn check_read_compatible<B>(space: &DimensionalSpace, destination: &B) -> Result<(), ArrayError>
where
    B: ElementBuffer + ?Sized,
{
    check_element_count(space, destination.len())
}

/// `source` must hold exactly the elements of `space`.
pub fn check_write_compatible<B>(space: &DimensionalSpace, source: &B) -> Result<(), ArrayError>
where
    B: ElementBuffer + ?Sized,
{
    check_element_count(space, source.len())
}

fn check_element_count(space: &DimensionalSpace, len: usize) -> Result<(), ArrayError> {
    let expected = space.num_elements();
    if expected != len {
        return Err(ArrayError::ShapeMismatch {
            expected,
            actual: len,
        });
    }
    Ok(())
}

/// Array-to-array copies require identical shapes.
pub fn check_copy_compatible(source: &[usize], destination: &[usize]) -> Result<(), ArrayError> {
    if source != destination {
        return Err(ArrayError::IncompatibleShapes {
            src: source.to_vec(),
            dst: destination.to_vec(),
        });
    }
    Ok(())
}

/// Every position of `space` must be addressable in `buffer`.
pub fn check_within<B>(space: &DimensionalSpace, buffer: &B) -> Result<(), ArrayError>
where
    B: ElementBuffer + ?Sized,
{
    match space.max_position() {
        Some(position) if position >= buffer.len() => Err(BufferError::OutOfBounds {
            position,
            len: buffer.len(),
        }
        .into()),
        _ => Ok(()),
    }
}
