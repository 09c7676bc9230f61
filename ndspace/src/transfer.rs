/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Bulk data transfer between dimensional spaces.
//!
//! A transfer walks two spaces of identical sizes in lock-step,
//! row-major order (dimension 0 slowest, the last dimension fastest)
//! and moves one element per pair of positions. A flat buffer takes
//! part as the row-major space over the same sizes.
//!
//! Two strategies implement the walk:
//!
//! - [`Strategy::Blocks`]: when both spaces share a trailing block of
//!   consecutive positions, whole runs are moved with
//!   [`ElementBuffer::read_run`] and [`ElementBuffer::write_run`].
//! - [`Strategy::Scalars`]: one [`of_value`] call per element.
//!
//! Both visit the same pairs in the same order; [`plan`] only decides
//! how many elements move per step. Every entry point checks shapes
//! and buffer reach (see [`crate::validate`]) before the first element
//! moves. When source and destination overlap in one storage, the
//! source is staged first so that every element is read before any is
//! overwritten, whichever strategy runs.

use crate::array::ArrayError;
use crate::array::NdArray;
use crate::buffer::ArrayBuffer;
use crate::buffer::BufferError;
use crate::buffer::ElementBuffer;
use crate::config;
use crate::space::Coords;
use crate::space::DimensionalSpace;
use crate::validate;

/// How a transfer moves its elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// For every coordinate over the leading `outer` dimensions, copy
    /// one run of `run` consecutive elements.
    Blocks { outer: usize, run: usize },
    /// Copy one element at a time.
    Scalars,
}

/// Chooses the strategy for moving `source` into `destination`, which
/// must have the same sizes.
pub fn plan(source: &DimensionalSpace, destination: &DimensionalSpace) -> Strategy {
    let config = config::global::get();
    let strategy = if !config.fast_copy || source.num_elements() == 0 {
        Strategy::Scalars
    } else {
        let outer = source.contiguous_dims().max(destination.contiguous_dims());
        let run = source.sizes()[outer..].iter().product::<usize>();
        if run >= config.min_block_len.max(1) {
            Strategy::Blocks { outer, run }
        } else {
            Strategy::Scalars
        }
    };
    tracing::trace!(%source, %destination, ?strategy, "planned transfer");
    strategy
}

/// Walks `source_space` and `destination_space` in lock-step and calls
/// `accessor` once per pair of positions, in row-major order.
pub fn execute<S, D, F>(
    source: &S,
    source_space: &DimensionalSpace,
    destination: &D,
    destination_space: &DimensionalSpace,
    mut accessor: F,
) -> Result<(), ArrayError>
where
    S: ElementBuffer + ?Sized,
    D: ElementBuffer + ?Sized,
    F: FnMut(&S, usize, &D, usize) -> Result<(), BufferError>,
{
    validate::check_copy_compatible(source_space.sizes(), destination_space.sizes())?;
    validate::check_within(source_space, source)?;
    validate::check_within(destination_space, destination)?;
    for (src, dst) in source_space.iter().zip(destination_space.iter()) {
        accessor(source, src, destination, dst)?;
    }
    Ok(())
}

/// The element accessor that moves one value.
pub fn of_value<S, D>(source: &S, src: usize, destination: &D, dst: usize) -> Result<(), BufferError>
where
    S: ElementBuffer + ?Sized,
    D: ElementBuffer<Elem = S::Elem> + ?Sized,
{
    destination.set(source.get(src)?, dst)
}

/// Copies the elements of `source_space` into `destination_space`.
pub fn copy_between<S, D>(
    source: &S,
    source_space: &DimensionalSpace,
    destination: &D,
    destination_space: &DimensionalSpace,
) -> Result<(), ArrayError>
where
    S: ElementBuffer + ?Sized,
    D: ElementBuffer<Elem = S::Elem> + ?Sized,
{
    validate::check_copy_compatible(source_space.sizes(), destination_space.sizes())?;
    validate::check_within(source_space, source)?;
    validate::check_within(destination_space, destination)?;

    if overlaps(source, source_space, destination, destination_space) {
        tracing::debug!(
            source = %source_space,
            destination = %destination_space,
            "source and destination overlap; staging source"
        );
        let staged: ArrayBuffer<S::Elem> = source_space
            .iter()
            .map(|position| source.get(position))
            .collect::<Result<Vec<_>, _>>()?
            .into();
        let flat = DimensionalSpace::new_row_major(source_space.sizes().to_vec());
        return copy_planned(&staged, &flat, destination, destination_space);
    }
    copy_planned(source, source_space, destination, destination_space)
}

// Whether some position written through `destination_space` may also
// be read through `source_space`.
fn overlaps<S, D>(
    source: &S,
    source_space: &DimensionalSpace,
    destination: &D,
    destination_space: &DimensionalSpace,
) -> bool
where
    S: ElementBuffer + ?Sized,
    D: ElementBuffer + ?Sized,
{
    let (src_storage, src_base) = source.origin();
    let (dst_storage, dst_base) = destination.origin();
    if !std::ptr::eq(src_storage, dst_storage) {
        return false;
    }
    match (source_space.max_position(), destination_space.max_position()) {
        (Some(src_max), Some(dst_max)) => {
            src_base + source_space.offset() <= dst_base + dst_max
                && dst_base + destination_space.offset() <= src_base + src_max
        }
        _ => false,
    }
}

fn copy_planned<S, D>(
    source: &S,
    source_space: &DimensionalSpace,
    destination: &D,
    destination_space: &DimensionalSpace,
) -> Result<(), ArrayError>
where
    S: ElementBuffer + ?Sized,
    D: ElementBuffer<Elem = S::Elem> + ?Sized,
{
    match plan(source_space, destination_space) {
        Strategy::Blocks { outer, run } => copy_blocks(
            source,
            source_space,
            destination,
            destination_space,
            outer,
            run,
        ),
        Strategy::Scalars => execute(
            source,
            source_space,
            destination,
            destination_space,
            of_value,
        ),
    }
}

fn copy_blocks<S, D>(
    source: &S,
    source_space: &DimensionalSpace,
    destination: &D,
    destination_space: &DimensionalSpace,
    outer: usize,
    run: usize,
) -> Result<(), ArrayError>
where
    S: ElementBuffer + ?Sized,
    D: ElementBuffer<Elem = S::Elem> + ?Sized,
{
    let mut scratch = Vec::with_capacity(run);
    for coord in Coords::new(source_space.sizes()[..outer].to_vec()) {
        scratch.clear();
        source.read_run(source_space.location(&coord), run, &mut scratch)?;
        destination.write_run(destination_space.location(&coord), &scratch)?;
    }
    Ok(())
}

/// Reads the elements of `space` into the flat buffer `destination`.
pub fn read_into<S, D>(source: &S, space: &DimensionalSpace, destination: &D) -> Result<(), ArrayError>
where
    S: ElementBuffer + ?Sized,
    D: ElementBuffer<Elem = S::Elem> + ?Sized,
{
    let flat = DimensionalSpace::new_row_major(space.sizes().to_vec());
    copy_between(source, space, destination, &flat)
}

/// Writes the flat buffer `source` into the elements of `space`.
pub fn write_from<S, D>(source: &S, destination: &D, space: &DimensionalSpace) -> Result<(), ArrayError>
where
    S: ElementBuffer + ?Sized,
    D: ElementBuffer<Elem = S::Elem> + ?Sized,
{
    let flat = DimensionalSpace::new_row_major(space.sizes().to_vec());
    copy_between(source, &flat, destination, space)
}

/// Copies between arrays of any implementation by visiting every
/// scalar of `source` in row-major order and storing it through
/// `destination`'s [`NdArray::set_object`].
pub fn copy_scalars<T, S, D>(source: &S, destination: &D) -> Result<(), ArrayError>
where
    S: NdArray<T> + ?Sized,
    D: NdArray<T> + ?Sized,
{
    validate::check_copy_compatible(source.shape(), destination.shape())?;
    for coord in Coords::new(source.shape().to_vec()) {
        destination.set_object(source.get_object(&coord)?, &coord)?;
    }
    Ok(())
}
