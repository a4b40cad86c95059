//! 256-bit variant: each 16-lane block as two chunks of 8.

use super::{check_inputs, splice_lanes, BlockSplicer};
use crate::error::Result;
use crate::tiled::{TiledView, TiledXyzView, XyzBuffer};

#[derive(Clone, Copy, Debug, Default)]
pub struct Wide256;

impl BlockSplicer for Wide256 {
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
            if std::arch::is_x86_feature_detected!("avx") {
                // SAFETY: AVX support was just detected; shapes were checked above.
                unsafe { avx::splice(dnas, weights, source_indices, result, scale) };
                return Ok(());
            }
        }
        splice_lanes::<8>(dnas, weights, source_indices, result, scale);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "wide256"
    }
}

#[cfg(target_arch = "x86_64")]
mod avx {
    use std::arch::x86_64::*;

    use crate::tiled::{TiledView, TiledXyzView, XyzBuffer};
    use crate::BLOCK_SIZE;

    /// # Safety
    /// Requires AVX. `result` must hold `weights.row_count() * BLOCK_SIZE` lanes and all
    /// source indices must be in range for both matrices.
    #[target_feature(enable = "avx")]
    pub(super) unsafe fn splice(
        dnas: TiledXyzView<'_>,
        weights: TiledView<'_>,
        source_indices: &[u16],
        result: &mut XyzBuffer<'_>,
        scale: f32,
    ) {
        let scale_v = _mm256_set1_ps(scale);
        let xs = result.xs.as_mut_ptr();
        let ys = result.ys.as_mut_ptr();
        let zs = result.zs.as_mut_ptr();
        for block in 0..weights.row_count() {
            let weight_row = weights.row(block);
            let data_row = dnas.row(block);
            let base = block * BLOCK_SIZE;
            for chunk in [0usize, 8] {
                let offset = base + chunk;
                let mut x = _mm256_loadu_ps(xs.add(offset));
                let mut y = _mm256_loadu_ps(ys.add(offset));
                let mut z = _mm256_loadu_ps(zs.add(offset));
                for &source in source_indices {
                    let source = usize::from(source);
                    // Blocks are 64-byte aligned, so both 8-lane halves are 32-byte aligned.
                    let w = _mm256_mul_ps(
                        _mm256_load_ps(weight_row[source].lanes().as_ptr().add(chunk)),
                        scale_v,
                    );
                    let d = &data_row[source];
                    x = _mm256_add_ps(x, _mm256_mul_ps(w, _mm256_load_ps(d.xs.lanes().as_ptr().add(chunk))));
                    y = _mm256_add_ps(y, _mm256_mul_ps(w, _mm256_load_ps(d.ys.lanes().as_ptr().add(chunk))));
                    z = _mm256_add_ps(z, _mm256_mul_ps(w, _mm256_load_ps(d.zs.lanes().as_ptr().add(chunk))));
                }
                _mm256_storeu_ps(xs.add(offset), x);
                _mm256_storeu_ps(ys.add(offset), y);
                _mm256_storeu_ps(zs.add(offset), z);
            }
        }
    }
}
