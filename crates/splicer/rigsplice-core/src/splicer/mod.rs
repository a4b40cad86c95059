//! Block splicer: weighted sum of tiled source vectors into a padded destination.
//!
//! For every block `b`, lane `l` and selected source `s` the kernels compute
//! `dst[b*16 + l] += (weights[b][s][l] * scale) * data[b][s][l]`, accumulating sources in
//! the order given. Both widths perform the same per-lane operations; results are
//! still compared with a tolerance since vendor kernels are free to regroup the
//! reduction.

mod narrow;
mod wide;

pub use narrow::Narrow128;
pub use wide::Wide256;

use crate::config::SplicerKind;
use crate::error::{Result, SpliceError};
use crate::tiled::{TiledView, TiledXyzView, XyzBuffer};
use crate::BLOCK_SIZE;

pub trait BlockSplicer: Send + Sync {
    /// Add `Σ_s weights[b][s] * scale * dnas[b][s]` into `result` for every block.
    fn splice(
        &self,
        dnas: TiledXyzView<'_>,
        weights: TiledView<'_>,
        source_indices: &[u16],
        result: &mut XyzBuffer<'_>,
        scale: f32,
    ) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Resolve a configured kind to an implementation, probing the CPU for `Auto`.
pub fn select_block_splicer(kind: SplicerKind) -> Box<dyn BlockSplicer> {
    let chosen: Box<dyn BlockSplicer> = match kind {
        SplicerKind::Wide => Box::new(Wide256),
        SplicerKind::Narrow => Box::new(Narrow128),
        SplicerKind::Auto => {
            if has_wide_lanes() {
                Box::new(Wide256)
            } else {
                Box::new(Narrow128)
            }
        }
    };
    log::debug!("block splicer: {:?} -> {}", kind, chosen.name());
    chosen
}

/// Whether 256-bit float vectors are available on this CPU.
pub fn has_wide_lanes() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        std::arch::is_x86_feature_detected!("avx")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

pub(crate) fn check_inputs(
    dnas: TiledXyzView<'_>,
    weights: TiledView<'_>,
    source_indices: &[u16],
    result: &XyzBuffer<'_>,
) -> Result<()> {
    if weights.row_count() != dnas.row_count() {
        return Err(SpliceError::ShapeMismatch {
            what: "block count",
            expected: weights.row_count(),
            actual: dnas.row_count(),
        });
    }
    let source_count = weights.column_count().min(dnas.column_count());
    if let Some(&bad) = source_indices.iter().find(|&&s| usize::from(s) >= source_count) {
        return Err(SpliceError::SourceOutOfRange {
            index: usize::from(bad),
            source_count,
        });
    }
    let required = weights.row_count() * BLOCK_SIZE;
    if result.padded_len() < required {
        return Err(SpliceError::BufferTooShort {
            required,
            actual: result.padded_len(),
        });
    }
    Ok(())
}

/// Portable kernel processing each block as `BLOCK_SIZE / W` chunks of `W` lanes.
pub(crate) fn splice_lanes<const W: usize>(
    dnas: TiledXyzView<'_>,
    weights: TiledView<'_>,
    source_indices: &[u16],
    result: &mut XyzBuffer<'_>,
    scale: f32,
) {
    for block in 0..weights.row_count() {
        let weight_row = weights.row(block);
        let data_row = dnas.row(block);
        let base = block * BLOCK_SIZE;
        for chunk in (0..BLOCK_SIZE).step_by(W) {
            let start = base + chunk;
            let mut xs = [0.0f32; W];
            let mut ys = [0.0f32; W];
            let mut zs = [0.0f32; W];
            xs.copy_from_slice(&result.xs[start..start + W]);
            ys.copy_from_slice(&result.ys[start..start + W]);
            zs.copy_from_slice(&result.zs[start..start + W]);
            for &source in source_indices {
                let source = usize::from(source);
                let w = &weight_row[source].lanes()[chunk..chunk + W];
                let d = &data_row[source];
                for lane in 0..W {
                    let ws = w[lane] * scale;
                    xs[lane] += ws * d.xs[chunk + lane];
                    ys[lane] += ws * d.ys[chunk + lane];
                    zs[lane] += ws * d.zs[chunk + lane];
                }
            }
            result.xs[start..start + W].copy_from_slice(&xs);
            result.ys[start..start + W].copy_from_slice(&ys);
            result.zs[start..start + W].copy_from_slice(&zs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiled::{tile_sources, TiledMatrix2D};
    use crate::MemoryResource;

    #[test]
    fn explicit_kinds_are_honoured() {
        assert_eq!(select_block_splicer(SplicerKind::Wide).name(), "wide256");
        assert_eq!(select_block_splicer(SplicerKind::Narrow).name(), "narrow128");
        let auto = select_block_splicer(SplicerKind::Auto).name();
        assert!(auto == "wide256" || auto == "narrow128");
    }

    #[test]
    fn eight_lane_fallback_matches_narrow() {
        let arena = MemoryResource::new();
        let a: Vec<[f32; 3]> = (0..29).map(|i| [i as f32, 0.5, -(i as f32) * 0.25]).collect();
        let b: Vec<[f32; 3]> = (0..29).map(|i| [2.0, i as f32 * 0.125, 1.0]).collect();
        let dnas = tile_sources(&[&a[..], &b[..]], 29, &arena).unwrap();
        let mut weights = TiledMatrix2D::new(2, 2, &arena);
        for (i, block) in weights.as_mut_slice().iter_mut().enumerate() {
            for lane in 0..BLOCK_SIZE {
                block[lane] = ((i * BLOCK_SIZE + lane) % 5) as f32 * 0.2;
            }
        }
        let mut portable = XyzBuffer::zeroed(29, &arena);
        let mut narrow = XyzBuffer::zeroed(29, &arena);
        splice_lanes::<8>(dnas.view(), weights.view(), &[1, 0], &mut portable, 1.5);
        Narrow128.splice(dnas.view(), weights.view(), &[1, 0], &mut narrow, 1.5).unwrap();
        for i in 0..29 {
            let (p, n) = (portable.get(i), narrow.get(i));
            for c in 0..3 {
                assert!((p[c] - n[c]).abs() <= 1e-5, "lane {i}: {p:?} vs {n:?}");
            }
        }
    }

    #[test]
    fn shape_checks() {
        let arena = MemoryResource::new();
        let data = [[1.0f32, 1.0, 1.0]; 20];
        let dnas = tile_sources(&[&data[..]], 20, &arena).unwrap();
        let weights = TiledMatrix2D::new(1, 1, &arena);
        let mut out = XyzBuffer::zeroed(20, &arena);
        let err = Wide256.splice(dnas.view(), weights.view(), &[0], &mut out, 1.0).unwrap_err();
        assert!(matches!(err, SpliceError::ShapeMismatch { what: "block count", .. }));

        let weights = TiledMatrix2D::new(2, 1, &arena);
        let err = Narrow128.splice(dnas.view(), weights.view(), &[1], &mut out, 1.0).unwrap_err();
        assert_eq!(err, SpliceError::SourceOutOfRange { index: 1, source_count: 1 });

        let mut short = XyzBuffer::zeroed(10, &arena);
        let err = Narrow128.splice(dnas.view(), weights.view(), &[0], &mut short, 1.0).unwrap_err();
        assert_eq!(err, SpliceError::BufferTooShort { required: 32, actual: 16 });
    }
}
