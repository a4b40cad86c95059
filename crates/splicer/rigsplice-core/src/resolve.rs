//! Region affiliation x splice weights -> tiled per-element weights.

use crate::error::{Result, SpliceError};
use crate::matrix::block_count;
use crate::region::RegionAffiliation;
use crate::splice_weights::SpliceWeights;
use crate::tiled::{Block16, TiledMatrix2D};
use crate::BLOCK_SIZE;

pub(crate) fn check_source_indices(source_indices: &[u16], source_count: u16) -> Result<()> {
    match source_indices.iter().find(|&&s| s >= source_count) {
        Some(&index) => Err(SpliceError::SourceOutOfRange {
            index: usize::from(index),
            source_count: usize::from(source_count),
        }),
        None => Ok(()),
    }
}

/// Splice weights must carry a column for every region the rig declares.
pub(crate) fn check_region_count(splice_weights: &SpliceWeights<'_>, region_count: u16) -> Result<()> {
    if splice_weights.region_count() < region_count {
        return Err(SpliceError::ShapeMismatch {
            what: "splice weight region count",
            expected: usize::from(region_count),
            actual: usize::from(splice_weights.region_count()),
        });
    }
    Ok(())
}

/// Fill `out` with `[block][source]` weights for every affiliation.
///
/// `out` is reset to `ceil(len / 16) x source_count`; lanes of sources not listed in
/// `source_indices`, and trailing lanes of the last block, stay zero.
pub(crate) fn resolve_into<const N: usize>(
    affiliations: &[RegionAffiliation<N>],
    splice_weights: &SpliceWeights<'_>,
    source_indices: &[u16],
    out: &mut TiledMatrix2D<'_>,
) {
    let element_count = affiliations.len();
    if element_count == 0 {
        out.clear();
        return;
    }
    let blocks = block_count(element_count, BLOCK_SIZE);
    out.reset(blocks, usize::from(splice_weights.source_count()));

    let full_blocks = element_count / BLOCK_SIZE;
    for block_index in 0..full_blocks {
        let chunk = &affiliations[block_index * BLOCK_SIZE..(block_index + 1) * BLOCK_SIZE];
        let row = out.row_mut(block_index);
        for &source in source_indices {
            let per_region = splice_weights.get(source);
            fill_full_block(&mut row[usize::from(source)], chunk, per_region);
        }
    }

    let remainder = element_count % BLOCK_SIZE;
    if remainder != 0 {
        let chunk = &affiliations[full_blocks * BLOCK_SIZE..];
        let row = out.row_mut(full_blocks);
        for &source in source_indices {
            let per_region = splice_weights.get(source);
            let block = &mut row[usize::from(source)];
            for (lane, affiliation) in chunk.iter().enumerate() {
                block[lane] = affiliation.total_weight_across_regions(per_region);
            }
        }
    }
}

#[inline]
fn fill_full_block<const N: usize>(
    block: &mut Block16,
    chunk: &[RegionAffiliation<N>],
    per_region: &[f32],
) {
    // Four lanes per step.
    for (lanes, affiliations) in block.lanes_mut().chunks_exact_mut(4).zip(chunk.chunks_exact(4)) {
        lanes[0] = affiliations[0].total_weight_across_regions(per_region);
        lanes[1] = affiliations[1].total_weight_across_regions(per_region);
        lanes[2] = affiliations[2].total_weight_across_regions(per_region);
        lanes[3] = affiliations[3].total_weight_across_regions(per_region);
    }
}
