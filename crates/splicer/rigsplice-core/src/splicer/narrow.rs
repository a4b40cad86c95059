//! 128-bit variant: each 16-lane block as four chunks of 4.

use super::{check_inputs, BlockSplicer};
use crate::error::Result;
use crate::tiled::{TiledView, TiledXyzView, XyzBuffer};

#[derive(Clone, Copy, Debug, Default)]
pub struct Narrow128;

impl BlockSplicer for Narrow128 {
    fn splice(
        &self,
        dnas: TiledXyzView<'_>,
        weights: TiledView<'_>,
        source_indices: &[u16],
        result: &mut XyzBuffer<'_>,
        scale: f32,
    ) -> Result<()> {
        check_inputs(dnas, weights, source_indices, result)?;
        #[cfg(target_arch = "x86_64")]
        {
            // SAFETY: SSE is part of the x86_64 baseline; shapes were checked above.
            unsafe { sse::splice(dnas, weights, source_indices, result, scale) };
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            super::splice_lanes::<4>(dnas, weights, source_indices, result, scale);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "narrow128"
    }
}

#[cfg(target_arch = "x86_64")]
mod sse {
    use std::arch::x86_64::*;

    use crate::tiled::{TiledView, TiledXyzView, XyzBuffer};
    use crate::BLOCK_SIZE;

    /// # Safety
    /// `result` must hold `weights.row_count() * BLOCK_SIZE` lanes and all source indices
    /// must be in range for both matrices.
    #[target_feature(enable = "sse")]
    pub(super) unsafe fn splice(
        dnas: TiledXyzView<'_>,
        weights: TiledView<'_>,
        source_indices: &[u16],
        result: &mut XyzBuffer<'_>,
        scale: f32,
    ) {
        let scale_v = _mm_set1_ps(scale);
        let xs = result.xs.as_mut_ptr();
        let ys = result.ys.as_mut_ptr();
        let zs = result.zs.as_mut_ptr();
        for block in 0..weights.row_count() {
            let weight_row = weights.row(block);
            let data_row = dnas.row(block);
            let base = block * BLOCK_SIZE;
            for chunk in [0usize, 4, 8, 12] {
                let offset = base + chunk;
                let mut x = _mm_loadu_ps(xs.add(offset));
                let mut y = _mm_loadu_ps(ys.add(offset));
                let mut z = _mm_loadu_ps(zs.add(offset));
                for &source in source_indices {
                    let source = usize::from(source);
                    let w = _mm_mul_ps(_mm_load_ps(weight_row[source].lanes().as_ptr().add(chunk)), scale_v);
                    let d = &data_row[source];
                    x = _mm_add_ps(x, _mm_mul_ps(w, _mm_load_ps(d.xs.lanes().as_ptr().add(chunk))));
                    y = _mm_add_ps(y, _mm_mul_ps(w, _mm_load_ps(d.ys.lanes().as_ptr().add(chunk))));
                    z = _mm_add_ps(z, _mm_mul_ps(w, _mm_load_ps(d.zs.lanes().as_ptr().add(chunk))));
                }
                _mm_storeu_ps(xs.add(offset), x);
                _mm_storeu_ps(ys.add(offset), y);
                _mm_storeu_ps(zs.add(offset), z);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splicer::splice_lanes;
    use crate::tiled::{tile_sources, TiledMatrix2D};
    use crate::MemoryResource;

    #[test]
    fn intrinsics_match_portable_path() {
        let arena = MemoryResource::new();
        let a: Vec<[f32; 3]> = (0..37).map(|i| [i as f32 * 0.5, 1.0, -(i as f32)]).collect();
        let b: Vec<[f32; 3]> = (0..37).map(|i| [1.0, i as f32 * 0.25, 2.0]).collect();
        let dnas = tile_sources(&[&a[..], &b[..]], 37, &arena).unwrap();
        let mut weights = TiledMatrix2D::new(3, 2, &arena);
        for (i, block) in weights.as_mut_slice().iter_mut().enumerate() {
            for lane in 0..16 {
                block[lane] = (i * 16 + lane) as f32 / 100.0;
            }
        }
        let mut fast = XyzBuffer::zeroed(37, &arena);
        let mut slow = XyzBuffer::zeroed(37, &arena);
        Narrow128.splice(dnas.view(), weights.view(), &[0, 1], &mut fast, 0.5).unwrap();
        splice_lanes::<4>(dnas.view(), weights.view(), &[0, 1], &mut slow, 0.5);
        for i in 0..37 {
            let (f, s) = (fast.get(i), slow.get(i));
            for c in 0..3 {
                assert!((f[c] - s[c]).abs() <= 1e-5, "lane {i}: {f:?} vs {s:?}");
            }
        }
    }
}
