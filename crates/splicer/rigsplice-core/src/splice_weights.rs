//! Per-source, per-region splice weights: the control signal driving a blend.

use serde::Serialize;

use crate::error::{Result, SpliceError};
use crate::matrix::{Matrix2D, Matrix2DView};
use crate::MemoryResource;

/// Dense `[source][region]` weight matrix, zero-initialized.
#[derive(Debug, Serialize)]
pub struct SpliceWeights<'a> {
    weights: Matrix2D<'a, f32>,
}

impl<'a> SpliceWeights<'a> {
    pub fn new(source_count: u16, region_count: u16, mem_res: &'a MemoryResource) -> Self {
        Self {
            weights: Matrix2D::new(usize::from(source_count), usize::from(region_count), mem_res),
        }
    }

    /// Copy a flat row-major block of weights starting at row `source_start`.
    ///
    /// `flat.len()` must be a whole number of rows that fits below the source count.
    pub fn set(&mut self, source_start: u16, flat: &[f32]) -> Result<()> {
        let region_count = self.weights.column_count();
        let source_count = self.weights.row_count();
        let start = usize::from(source_start);
        if flat.is_empty() {
            return Ok(());
        }
        if region_count == 0 || flat.len() % region_count != 0 {
            return Err(SpliceError::WeightLength {
                len: flat.len(),
                region_count,
            });
        }
        let rows = flat.len() / region_count;
        if start + rows > source_count {
            return Err(SpliceError::SourceRangeOverflow {
                start,
                rows,
                source_count,
            });
        }
        let offset = start * region_count;
        self.weights.as_mut_slice()[offset..offset + flat.len()].copy_from_slice(flat);
        Ok(())
    }

    /// Weights of one source, one entry per region.
    #[inline]
    pub fn get(&self, source_index: u16) -> &[f32] {
        self.weights.row(usize::from(source_index))
    }

    #[inline]
    pub fn data(&self) -> Matrix2DView<'_, f32> {
        self.weights.view()
    }

    #[inline]
    pub fn source_count(&self) -> u16 {
        self.weights.row_count() as u16
    }

    #[inline]
    pub fn region_count(&self) -> u16 {
        self.weights.column_count() as u16
    }
}
