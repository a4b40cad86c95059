//! Dense row-major matrices backed by a memory resource.
//!
//! Row access is a debug-checked contract: out-of-range rows trip a `debug_assert!` and
//! otherwise fall through to slice bounds checks. Dimensions only change by resetting
//! the whole matrix.

use std::fmt;
use std::ops::{Index, IndexMut};

use bumpalo::collections::Vec as BumpVec;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::{Result, SpliceError};
use crate::MemoryResource;

/// Number of `block_size` wide blocks needed to hold `count` elements.
#[inline]
pub fn block_count(count: usize, block_size: usize) -> usize {
    (count + block_size - 1) / block_size
}

/// `count` rounded up to the next multiple of `block_size`.
#[inline]
pub fn padded_len(count: usize, block_size: usize) -> usize {
    block_count(count, block_size) * block_size
}

/// Owning `[row][column]` matrix.
pub struct Matrix2D<'a, T> {
    rows: usize,
    columns: usize,
    data: BumpVec<'a, T>,
    mem_res: &'a MemoryResource,
}

/// Matrix whose storage honours the alignment of `T`.
///
/// Arena allocations always respect `align_of::<T>()`, so alignment is carried by the
/// element type (see [`crate::tiled::Block16`]) rather than by a separate allocator.
pub type AlignedMatrix2D<'a, T> = Matrix2D<'a, T>;

impl<'a, T: Clone + Default> Matrix2D<'a, T> {
    /// Allocate `rows * columns` default-valued elements.
    pub fn new(rows: usize, columns: usize, mem_res: &'a MemoryResource) -> Self {
        let mut data = BumpVec::with_capacity_in(rows * columns, mem_res);
        data.resize(rows * columns, T::default());
        Self {
            rows,
            columns,
            data,
            mem_res,
        }
    }

    /// Copy a flat row-major buffer into a new matrix.
    pub fn from_slice(
        rows: usize,
        columns: usize,
        values: &[T],
        mem_res: &'a MemoryResource,
    ) -> Result<Self> {
        if values.len() != rows * columns {
            return Err(SpliceError::ShapeMismatch {
                what: "matrix element count",
                expected: rows * columns,
                actual: values.len(),
            });
        }
        Ok(Self {
            rows,
            columns,
            data: BumpVec::from_iter_in(values.iter().cloned(), mem_res),
            mem_res,
        })
    }

    /// Replace the contents with a default-valued `rows x columns` matrix, reusing the
    /// existing allocation when it is large enough.
    pub fn reset(&mut self, rows: usize, columns: usize) {
        self.data.clear();
        self.data.resize(rows * columns, T::default());
        self.rows = rows;
        self.columns = columns;
    }
}

impl<'a, T> Matrix2D<'a, T> {
    /// Zero-sized matrix that still remembers its memory resource.
    pub fn empty(mem_res: &'a MemoryResource) -> Self {
        Self {
            rows: 0,
            columns: 0,
            data: BumpVec::new_in(mem_res),
            mem_res,
        }
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[T] {
        debug_assert!(row < self.rows, "row {row} out of range ({})", self.rows);
        let start = row * self.columns;
        &self.data[start..start + self.columns]
    }

    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        debug_assert!(row < self.rows, "row {row} out of range ({})", self.rows);
        let start = row * self.columns;
        &mut self.data[start..start + self.columns]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn view(&self) -> Matrix2DView<'_, T> {
        Matrix2DView {
            rows: self.rows,
            columns: self.columns,
            data: &self.data,
        }
    }

    /// Release the elements and drop to zero rows, keeping the memory resource.
    pub fn clear(&mut self) {
        self.data = BumpVec::new_in(self.mem_res);
        self.rows = 0;
        self.columns = 0;
    }

    pub fn memory_resource(&self) -> &'a MemoryResource {
        self.mem_res
    }

    /// Whether the backing storage starts on an `align` byte boundary.
    pub fn is_aligned_to(&self, align: usize) -> bool {
        self.data.as_ptr() as usize % align == 0
    }
}

impl<'a, T> Index<usize> for Matrix2D<'a, T> {
    type Output = [T];

    #[inline]
    fn index(&self, row: usize) -> &[T] {
        self.row(row)
    }
}

impl<'a, T> IndexMut<usize> for Matrix2D<'a, T> {
    #[inline]
    fn index_mut(&mut self, row: usize) -> &mut [T] {
        self.row_mut(row)
    }
}

impl<'a, T: Clone> Clone for Matrix2D<'a, T> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows,
            columns: self.columns,
            data: BumpVec::from_iter_in(self.data.iter().cloned(), self.mem_res),
            mem_res: self.mem_res,
        }
    }
}

impl<'a, T: fmt::Debug> fmt::Debug for Matrix2D<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix2D")
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .field("data", &&self.data[..])
            .finish()
    }
}

impl<'a, T: Serialize> Serialize for Matrix2D<'a, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.view().serialize(serializer)
    }
}

/// Non-owning `[row][column]` view over a flat slice.
pub struct Matrix2DView<'v, T> {
    rows: usize,
    columns: usize,
    data: &'v [T],
}

impl<'v, T> Clone for Matrix2DView<'v, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'v, T> Copy for Matrix2DView<'v, T> {}

impl<'v, T> Matrix2DView<'v, T> {
    pub fn new(data: &'v [T], rows: usize, columns: usize) -> Result<Self> {
        if data.len() != rows * columns {
            return Err(SpliceError::ShapeMismatch {
                what: "matrix view element count",
                expected: rows * columns,
                actual: data.len(),
            });
        }
        Ok(Self {
            rows,
            columns,
            data,
        })
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn row(&self, row: usize) -> &'v [T] {
        debug_assert!(row < self.rows, "row {row} out of range ({})", self.rows);
        let start = row * self.columns;
        &self.data[start..start + self.columns]
    }

    pub fn as_slice(&self) -> &'v [T] {
        self.data
    }

    pub fn rows(&self) -> impl Iterator<Item = &'v [T]> + 'v {
        let columns = self.columns.max(1);
        self.data.chunks(columns).take(self.rows)
    }
}

impl<'v, T> Index<usize> for Matrix2DView<'v, T> {
    type Output = [T];

    #[inline]
    fn index(&self, row: usize) -> &[T] {
        self.row(row)
    }
}

impl<'v, T: fmt::Debug> fmt::Debug for Matrix2DView<'v, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix2DView")
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .field("data", &self.data)
            .finish()
    }
}

impl<'v, T: Serialize> Serialize for Matrix2DView<'v, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Matrix2D", 3)?;
        state.serialize_field("rows", &self.rows)?;
        state.serialize_field("columns", &self.columns)?;
        state.serialize_field("values", self.data)?;
        state.end()
    }
}

/// Owning `[slice][row][column]` matrix.
pub struct Matrix3D<'a, T> {
    slices: usize,
    rows: usize,
    columns: usize,
    data: BumpVec<'a, T>,
}

impl<'a, T: Clone + Default> Matrix3D<'a, T> {
    pub fn new(slices: usize, rows: usize, columns: usize, mem_res: &'a MemoryResource) -> Self {
        let len = slices * rows * columns;
        let mut data = BumpVec::with_capacity_in(len, mem_res);
        data.resize(len, T::default());
        Self {
            slices,
            rows,
            columns,
            data,
        }
    }
}

impl<'a, T> Matrix3D<'a, T> {
    #[inline]
    pub fn slice_count(&self) -> usize {
        self.slices
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns
    }

    /// View of one `[row][column]` slice.
    pub fn slice(&self, slice: usize) -> Matrix2DView<'_, T> {
        debug_assert!(slice < self.slices, "slice {slice} out of range ({})", self.slices);
        let stride = self.rows * self.columns;
        let start = slice * stride;
        Matrix2DView {
            rows: self.rows,
            columns: self.columns,
            data: &self.data[start..start + stride],
        }
    }

    #[inline]
    pub fn row(&self, slice: usize, row: usize) -> &[T] {
        let start = self.offset(slice, row);
        &self.data[start..start + self.columns]
    }

    #[inline]
    pub fn row_mut(&mut self, slice: usize, row: usize) -> &mut [T] {
        let start = self.offset(slice, row);
        &mut self.data[start..start + self.columns]
    }

    fn offset(&self, slice: usize, row: usize) -> usize {
        debug_assert!(slice < self.slices, "slice {slice} out of range ({})", self.slices);
        debug_assert!(row < self.rows, "row {row} out of range ({})", self.rows);
        (slice * self.rows + row) * self.columns
    }
}

impl<'a, T: fmt::Debug> fmt::Debug for Matrix3D<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix3D")
            .field("slices", &self.slices)
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}
