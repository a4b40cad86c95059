//! Ragged matrix: rows of differing widths packed into one buffer.

use std::fmt;

use bumpalo::collections::Vec as BumpVec;
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::MemoryResource;

pub struct VariableWidthMatrix<'a, T> {
    /// `offsets[row]..offsets[row + 1]` spans a row; always starts with 0.
    offsets: BumpVec<'a, usize>,
    values: BumpVec<'a, T>,
}

impl<'a, T> VariableWidthMatrix<'a, T> {
    pub fn new(mem_res: &'a MemoryResource) -> Self {
        let mut offsets = BumpVec::new_in(mem_res);
        offsets.push(0);
        Self {
            offsets,
            values: BumpVec::new_in(mem_res),
        }
    }

    pub fn with_capacity(rows: usize, values: usize, mem_res: &'a MemoryResource) -> Self {
        let mut offsets = BumpVec::with_capacity_in(rows + 1, mem_res);
        offsets.push(0);
        Self {
            offsets,
            values: BumpVec::with_capacity_in(values, mem_res),
        }
    }

    pub fn append_row<I: IntoIterator<Item = T>>(&mut self, row: I) {
        self.values.extend(row);
        self.offsets.push(self.values.len());
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Total number of values across all rows.
    #[inline]
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[T] {
        debug_assert!(row < self.row_count(), "row {row} out of range ({})", self.row_count());
        &self.values[self.offsets[row]..self.offsets[row + 1]]
    }

    /// Row by index, or `None` when out of range.
    pub fn get(&self, row: usize) -> Option<&[T]> {
        if row < self.row_count() {
            Some(self.row(row))
        } else {
            None
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.offsets
            .windows(2)
            .map(move |w| &self.values[w[0]..w[1]])
    }

    pub fn shrink_to_fit(&mut self) {
        self.offsets.shrink_to_fit();
        self.values.shrink_to_fit();
    }
}

impl<'a, T: fmt::Debug> fmt::Debug for VariableWidthMatrix<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows()).finish()
    }
}

impl<'a, T: Serialize> Serialize for VariableWidthMatrix<'a, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.row_count()))?;
        for row in self.rows() {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_keep_their_widths() {
        let arena = MemoryResource::new();
        let mut m = VariableWidthMatrix::new(&arena);
        m.append_row([1u32, 2, 3]);
        m.append_row(std::iter::empty());
        m.append_row([7u32]);
        assert_eq!(m.row_count(), 3);
        assert_eq!(m.value_count(), 4);
        assert_eq!(m.row(0), &[1, 2, 3]);
        assert!(m.row(1).is_empty());
        assert_eq!(m.row(2), &[7]);
        assert_eq!(m.get(3), None);
        m.shrink_to_fit();
        assert_eq!(m.rows().count(), 3);
    }

    #[test]
    fn serializes_as_nested_lists() {
        let arena = MemoryResource::new();
        let mut m = VariableWidthMatrix::new(&arena);
        m.append_row([4u32, 5]);
        m.append_row([6u32]);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "[[4,5],[6]]");
    }
}
