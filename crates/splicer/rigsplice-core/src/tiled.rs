//! SIMD tiles: 16-lane aligned blocks and the tiled layouts built from them.
//!
//! A tiled matrix is indexed `[block][source]`; each cell holds the lanes of
//! `BLOCK_SIZE` consecutive elements, so one source's contribution to a block is a
//! single contiguous, 64-byte aligned load.

use std::ops::{Index, IndexMut};

use bumpalo::collections::Vec as BumpVec;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpliceError};
use crate::matrix::{block_count, padded_len, Matrix2D, Matrix2DView};
use crate::{MemoryResource, BLOCK_SIZE};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[repr(C, align(64))]
pub struct Block16(pub [f32; BLOCK_SIZE]);

impl Block16 {
    pub const ZERO: Block16 = Block16([0.0; BLOCK_SIZE]);

    #[inline]
    pub fn lanes(&self) -> &[f32; BLOCK_SIZE] {
        &self.0
    }

    #[inline]
    pub fn lanes_mut(&mut self) -> &mut [f32; BLOCK_SIZE] {
        &mut self.0
    }
}

impl Index<usize> for Block16 {
    type Output = f32;

    #[inline]
    fn index(&self, lane: usize) -> &f32 {
        &self.0[lane]
    }
}

impl IndexMut<usize> for Block16 {
    #[inline]
    fn index_mut(&mut self, lane: usize) -> &mut f32 {
        &mut self.0[lane]
    }
}

/// One block of 3-component vectors stored component-wise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct XyzBlock {
    pub xs: Block16,
    pub ys: Block16,
    pub zs: Block16,
}

impl XyzBlock {
    #[inline]
    pub fn set(&mut self, lane: usize, v: [f32; 3]) {
        self.xs[lane] = v[0];
        self.ys[lane] = v[1];
        self.zs[lane] = v[2];
    }

    #[inline]
    pub fn get(&self, lane: usize) -> [f32; 3] {
        [self.xs[lane], self.ys[lane], self.zs[lane]]
    }
}

/// Per-element scalar weights, `[block][source] -> 16 lanes`.
pub type TiledMatrix2D<'a> = Matrix2D<'a, Block16>;

/// Per-element vectors, `[block][source] -> 16 xyz lanes`.
pub type TiledXyzMatrix<'a> = Matrix2D<'a, XyzBlock>;

pub type TiledView<'v> = Matrix2DView<'v, Block16>;
pub type TiledXyzView<'v> = Matrix2DView<'v, XyzBlock>;

/// Tile per-source vector arrays into `[block][source]` layout.
///
/// Every source must carry exactly `element_count` vectors; trailing lanes of the last
/// block stay zero.
pub fn tile_sources<'a>(
    sources: &[&[[f32; 3]]],
    element_count: usize,
    mem_res: &'a MemoryResource,
) -> Result<TiledXyzMatrix<'a>> {
    let blocks = block_count(element_count, BLOCK_SIZE);
    let mut tiled = TiledXyzMatrix::new(blocks, sources.len(), mem_res);
    for (source_index, values) in sources.iter().enumerate() {
        if values.len() != element_count {
            return Err(SpliceError::ShapeMismatch {
                what: "source element count",
                expected: element_count,
                actual: values.len(),
            });
        }
        for (element, v) in values.iter().enumerate() {
            tiled[element / BLOCK_SIZE][source_index].set(element % BLOCK_SIZE, *v);
        }
    }
    Ok(tiled)
}

/// Padded structure-of-arrays buffer of 3-component vectors.
///
/// `len` is the logical element count; the component arrays are padded with zeros up
/// to the next block boundary so block-wise kernels never read past the end.
#[derive(Debug)]
pub struct XyzBuffer<'a> {
    len: usize,
    pub xs: BumpVec<'a, f32>,
    pub ys: BumpVec<'a, f32>,
    pub zs: BumpVec<'a, f32>,
}

impl<'a> XyzBuffer<'a> {
    pub fn zeroed(len: usize, mem_res: &'a MemoryResource) -> Self {
        let padded = padded_len(len, BLOCK_SIZE);
        let zeros = || {
            let mut v = BumpVec::with_capacity_in(padded, mem_res);
            v.resize(padded, 0.0f32);
            v
        };
        Self {
            len,
            xs: zeros(),
            ys: zeros(),
            zs: zeros(),
        }
    }

    /// Zero-padded component-wise copy of `values`.
    pub fn from_vec3s(values: &[[f32; 3]], mem_res: &'a MemoryResource) -> Self {
        let mut buffer = Self::zeroed(values.len(), mem_res);
        for (i, v) in values.iter().enumerate() {
            buffer.xs[i] = v[0];
            buffer.ys[i] = v[1];
            buffer.zs[i] = v[2];
        }
        buffer
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Capacity in lanes, always a multiple of the block size.
    #[inline]
    pub fn padded_len(&self) -> usize {
        self.xs.len().min(self.ys.len()).min(self.zs.len())
    }

    #[inline]
    pub fn get(&self, index: usize) -> [f32; 3] {
        [self.xs[index], self.ys[index], self.zs[index]]
    }

    /// Unpadded results.
    pub fn to_vec3s(&self) -> Vec<[f32; 3]> {
        (0..self.len).map(|i| self.get(i)).collect()
    }
}
