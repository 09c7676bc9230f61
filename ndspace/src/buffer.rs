/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Flat element storage behind dense arrays.
//!
//! Arrays never own their elements: they address an [`ElementBuffer`]
//! owned by the caller. Writes go through `&self`, so any number of
//! views may alias one buffer and observe each other's writes.
//! [`ArrayBuffer`] keeps its elements in a `RefCell` and is therefore
//! `!Sync`; sharing it across threads does not compile.

use std::cell::RefCell;
use std::fmt;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("position {position} out of bounds for buffer of length {len}")]
    OutOfBounds { position: usize, len: usize },
}

/// Randomly addressable storage of elements at linear positions.
pub trait ElementBuffer {
    type Elem: Clone;

    /// Number of addressable positions.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, position: usize) -> Result<Self::Elem, BufferError>;

    fn set(&self, value: Self::Elem, position: usize) -> Result<(), BufferError>;

    /// Appends the `len` elements starting at `position` to `out`.
    /// Nothing is appended if the run does not fit.
    fn read_run(
        &self,
        position: usize,
        len: usize,
        out: &mut Vec<Self::Elem>,
    ) -> Result<(), BufferError> {
        check_run(position, len, self.len())?;
        out.reserve(len);
        for i in 0..len {
            out.push(self.get(position + i)?);
        }
        Ok(())
    }

    /// Writes `src` to consecutive positions starting at `position`.
    /// Nothing is written if the run does not fit.
    fn write_run(&self, position: usize, src: &[Self::Elem]) -> Result<(), BufferError> {
        check_run(position, src.len(), self.len())?;
        for (i, value) in src.iter().enumerate() {
            self.set(value.clone(), position + i)?;
        }
        Ok(())
    }

    /// The storage behind this buffer and where this buffer's position
    /// 0 lies in it. Buffers reporting the same storage may alias.
    fn origin(&self) -> (*const (), usize) {
        (self as *const Self as *const (), 0)
    }

    /// A zero-copy view of this buffer whose position 0 is
    /// `position` here. Use [`BufferWindow::shift`] to move an existing
    /// window without nesting it.
    fn offset(&self, position: usize) -> BufferWindow<'_, Self>
    where
        Self: Sized,
    {
        BufferWindow::new(self, position)
    }
}

fn check_run(position: usize, len: usize, buffer_len: usize) -> Result<(), BufferError> {
    match position.checked_add(len) {
        Some(end) if end <= buffer_len => Ok(()),
        _ => Err(BufferError::OutOfBounds {
            position: position.saturating_add(len.max(1) - 1),
            len: buffer_len,
        }),
    }
}

/// The reference buffer: a growable vector of cloneable elements.
#[derive(Default)]
pub struct ArrayBuffer<T> {
    data: RefCell<Vec<T>>,
}

impl<T: Clone> ArrayBuffer<T> {
    /// A buffer of `len` copies of `value`.
    pub fn new(len: usize, value: T) -> Self {
        Self::from(vec![value; len])
    }

    /// A snapshot of the current contents.
    pub fn to_vec(&self) -> Vec<T> {
        self.data.borrow().clone()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data.into_inner()
    }
}

impl<T> From<Vec<T>> for ArrayBuffer<T> {
    fn from(data: Vec<T>) -> Self {
        Self {
            data: RefCell::new(data),
        }
    }
}

impl<T> FromIterator<T> for ArrayBuffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T: fmt::Debug> fmt::Debug for ArrayBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayBuffer")
            .field("data", &self.data.borrow())
            .finish()
    }
}

impl<T: Clone> ElementBuffer for ArrayBuffer<T> {
    type Elem = T;

    fn len(&self) -> usize {
        self.data.borrow().len()
    }

    fn get(&self, position: usize) -> Result<T, BufferError> {
        let data = self.data.borrow();
        data.get(position)
            .cloned()
            .ok_or(BufferError::OutOfBounds {
                position,
                len: data.len(),
            })
    }

    fn set(&self, value: T, position: usize) -> Result<(), BufferError> {
        let mut data = self.data.borrow_mut();
        let len = data.len();
        let slot = data
            .get_mut(position)
            .ok_or(BufferError::OutOfBounds { position, len })?;
        *slot = value;
        Ok(())
    }

    fn read_run(&self, position: usize, len: usize, out: &mut Vec<T>) -> Result<(), BufferError> {
        let data = self.data.borrow();
        check_run(position, len, data.len())?;
        out.extend_from_slice(&data[position..position + len]);
        Ok(())
    }

    fn write_run(&self, position: usize, src: &[T]) -> Result<(), BufferError> {
        let mut data = self.data.borrow_mut();
        check_run(position, src.len(), data.len())?;
        data[position..position + src.len()].clone_from_slice(src);
        Ok(())
    }
}

/// A buffer shifted by a base position, as returned by
/// [`ElementBuffer::offset`]. Position `i` of the window is position
/// `base + i` of the underlying buffer.
pub struct BufferWindow<'a, B: ?Sized> {
    inner: &'a B,
    base: usize,
}

impl<'a, B: ?Sized> BufferWindow<'a, B> {
    pub fn new(inner: &'a B, base: usize) -> Self {
        Self { inner, base }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// Shifts the window further without nesting windows.
    pub fn shift(&self, position: usize) -> Self {
        Self::new(self.inner, self.base + position)
    }
}

impl<B: ?Sized> Clone for BufferWindow<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: ?Sized> Copy for BufferWindow<'_, B> {}

impl<B: ElementBuffer + ?Sized> ElementBuffer for BufferWindow<'_, B> {
    type Elem = B::Elem;

    fn len(&self) -> usize {
        self.inner.len().saturating_sub(self.base)
    }

    fn origin(&self) -> (*const (), usize) {
        let (storage, base) = self.inner.origin();
        (storage, base + self.base)
    }

    fn get(&self, position: usize) -> Result<B::Elem, BufferError> {
        check_run(position, 1, self.len())?;
        self.inner.get(self.base + position)
    }

    fn set(&self, value: B::Elem, position: usize) -> Result<(), BufferError> {
        check_run(position, 1, self.len())?;
        self.inner.set(value, self.base + position)
    }

    fn read_run(
        &self,
        position: usize,
        len: usize,
        out: &mut Vec<B::Elem>,
    ) -> Result<(), BufferError> {
        check_run(position, len, self.len())?;
        self.inner.read_run(self.base + position, len, out)
    }

    fn write_run(&self, position: usize, src: &[B::Elem]) -> Result<(), BufferError> {
        check_run(position, src.len(), self.len())?;
        self.inner.write_run(self.base + position, src)
    }
}
