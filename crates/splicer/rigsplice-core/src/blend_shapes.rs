//! Blend-shape pool: per-target vertex-index unions across sources, the source deltas
//! scattered into that union ordering, and the splicer that blends them.
//!
//! Sources may drive different vertex subsets for the same target. The pool keeps one
//! ascending union per `(mesh, target)`; [`BlendShapeDeltas`] relies on that ordering
//! to place each source's deltas by binary search.

use bumpalo::collections::Vec as BumpVec;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Serialize as DeriveSerialize;

use crate::config::SplicerConfig;
use crate::error::{Result, SpliceError};
use crate::matrix::block_count;
use crate::reader::DnaReader;
use crate::splicer::BlockSplicer;
use crate::tiled::{TiledMatrix2D, TiledXyzMatrix, XyzBuffer};
use crate::variable_width::VariableWidthMatrix;
use crate::vertex_weights::VertexWeights;
use crate::{MemoryResource, BLOCK_SIZE};

#[derive(Debug)]
pub struct BlendShapePool<'a> {
    /// `[mesh] -> [target] -> ascending vertex indices`
    vertex_indices: BumpVec<'a, VariableWidthMatrix<'a, u32>>,
    deltas: BlendShapeDeltas<'a>,
}

impl<'a> BlendShapePool<'a> {
    pub fn new(
        archetype: &dyn DnaReader,
        sources: &[&dyn DnaReader],
        mem_res: &'a MemoryResource,
    ) -> Result<Self> {
        Self::with_config(archetype, sources, &SplicerConfig::default(), mem_res)
    }

    /// Build the unions from `archetype`'s meshes and targets, then tile every
    /// source's deltas against them.
    pub fn with_config(
        archetype: &dyn DnaReader,
        sources: &[&dyn DnaReader],
        cfg: &SplicerConfig,
        mem_res: &'a MemoryResource,
    ) -> Result<Self> {
        let vertex_indices = fill_vertex_indices(archetype, sources, cfg, mem_res)?;
        let deltas = BlendShapeDeltas::build(&vertex_indices, sources, mem_res)?;
        log::debug!(
            "blend shape pool: {} meshes, {} sources",
            vertex_indices.len(),
            sources.len()
        );
        Ok(Self {
            vertex_indices,
            deltas,
        })
    }

    #[inline]
    pub fn mesh_count(&self) -> usize {
        self.vertex_indices.len()
    }

    /// Number of targets on `mesh_index`, 0 when out of range.
    pub fn blend_shape_count(&self, mesh_index: u16) -> usize {
        self.vertex_indices
            .get(usize::from(mesh_index))
            .map_or(0, |m| m.row_count())
    }

    /// Union of vertex indices for one target; empty when out of range.
    pub fn vertex_indices(&self, mesh_index: u16, blend_shape_index: u16) -> &[u32] {
        self.vertex_indices
            .get(usize::from(mesh_index))
            .and_then(|m| m.get(usize::from(blend_shape_index)))
            .unwrap_or(&[])
    }

    pub fn deltas(&self) -> &BlendShapeDeltas<'a> {
        &self.deltas
    }
}

fn fill_vertex_indices<'a>(
    archetype: &dyn DnaReader,
    sources: &[&dyn DnaReader],
    cfg: &SplicerConfig,
    mem_res: &'a MemoryResource,
) -> Result<BumpVec<'a, VariableWidthMatrix<'a, u32>>> {
    let mesh_count = archetype.mesh_count();
    let mut per_mesh = BumpVec::with_capacity_in(usize::from(mesh_count), mem_res);
    let mut present: Vec<bool> = Vec::new();
    for mesh in 0..mesh_count {
        let vertex_count = archetype.vertex_position_count(mesh) as usize;
        let target_count = archetype.blend_shape_target_count(mesh);
        let mut matrix = VariableWidthMatrix::new(mem_res);
        for target in 0..target_count {
            present.clear();
            present.resize(vertex_count, false);
            for source in sources {
                for &vertex in source.blend_shape_target_vertex_indices(mesh, target) {
                    let slot = present
                        .get_mut(vertex as usize)
                        .ok_or(SpliceError::VertexOutOfRange {
                            mesh: usize::from(mesh),
                            vertex,
                            vertex_count,
                        })?;
                    *slot = true;
                }
            }
            matrix.append_row(
                present
                    .iter()
                    .enumerate()
                    .filter(|&(_, &p)| p)
                    .map(|(i, _)| i as u32),
            );
        }
        if cfg.shrink_pools {
            matrix.shrink_to_fit();
        }
        log::trace!(
            "blend shape pool: mesh {mesh} has {target_count} targets, {} pooled vertices",
            matrix.value_count()
        );
        per_mesh.push(matrix);
    }
    Ok(per_mesh)
}

impl<'a> Serialize for BlendShapePool<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BlendShapePool", 2)?;
        state.serialize_field("vertex_indices", &self.vertex_indices[..])?;
        state.serialize_field("deltas", &self.deltas)?;
        state.end()
    }
}

/// Per-source target deltas laid out along each target's vertex union.
///
/// `[mesh][target] -> [union block][source]`; vertices a source does not drive stay zero.
#[derive(Debug)]
pub struct BlendShapeDeltas<'a> {
    deltas: BumpVec<'a, BumpVec<'a, TiledXyzMatrix<'a>>>,
}

impl<'a> BlendShapeDeltas<'a> {
    fn build(
        vertex_indices: &[VariableWidthMatrix<'a, u32>],
        sources: &[&dyn DnaReader],
        mem_res: &'a MemoryResource,
    ) -> Result<Self> {
        let mut deltas = BumpVec::with_capacity_in(vertex_indices.len(), mem_res);
        for (mesh, unions) in vertex_indices.iter().enumerate() {
            let mesh_id = mesh as u16;
            let mut targets = BumpVec::with_capacity_in(unions.row_count(), mem_res);
            for (target, union) in unions.rows().enumerate() {
                let target_id = target as u16;
                let mut tiled = TiledXyzMatrix::new(
                    block_count(union.len(), BLOCK_SIZE),
                    sources.len(),
                    mem_res,
                );
                for (source_index, source) in sources.iter().enumerate() {
                    let indices = source.blend_shape_target_vertex_indices(mesh_id, target_id);
                    let values = source.blend_shape_target_deltas(mesh_id, target_id);
                    if indices.len() != values.len() {
                        return Err(SpliceError::ShapeMismatch {
                            what: "blend shape deltas",
                            expected: indices.len(),
                            actual: values.len(),
                        });
                    }
                    for (&vertex, delta) in indices.iter().zip(values) {
                        // Every source index was folded into the union.
                        let position = union.binary_search(&vertex).map_err(|_| {
                            SpliceError::VertexOutOfRange {
                                mesh,
                                vertex,
                                vertex_count: union.len(),
                            }
                        })?;
                        tiled[position / BLOCK_SIZE][source_index].set(position % BLOCK_SIZE, *delta);
                    }
                }
                targets.push(tiled);
            }
            deltas.push(targets);
        }
        Ok(Self { deltas })
    }

    /// Tiled deltas of one target, `None` when out of range.
    pub fn get(&self, mesh_index: u16, blend_shape_index: u16) -> Option<&TiledXyzMatrix<'a>> {
        self.deltas
            .get(usize::from(mesh_index))?
            .get(usize::from(blend_shape_index))
    }

    pub fn mesh_count(&self) -> usize {
        self.deltas.len()
    }
}

impl<'a> Serialize for BlendShapeDeltas<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let per_mesh: Vec<&[TiledXyzMatrix<'a>]> = self.deltas.iter().map(|m| &m[..]).collect();
        per_mesh.serialize(serializer)
    }
}

/// One blended target: union vertex indices and the spliced delta for each.
#[derive(Clone, Debug, Default, PartialEq, DeriveSerialize)]
pub struct SplicedBlendShape {
    pub vertex_indices: Vec<u32>,
    pub deltas: Vec<[f32; 3]>,
}

/// Blends pooled deltas with per-vertex splice weights.
pub struct BlendShapeSplicer<'s> {
    splicer: &'s dyn BlockSplicer,
}

impl<'s> BlendShapeSplicer<'s> {
    pub fn new(splicer: &'s dyn BlockSplicer) -> Self {
        Self { splicer }
    }

    /// Splice every target of `mesh_index`.
    ///
    /// Weights are gathered at each target's union indices into a scratch tile
    /// allocated from `scratch`; `vertex_weights` must have been computed for the mesh.
    pub fn splice(
        &self,
        pool: &BlendShapePool<'_>,
        vertex_weights: &VertexWeights<'_>,
        source_indices: &[u16],
        mesh_index: u16,
        scratch: &MemoryResource,
    ) -> Result<Vec<SplicedBlendShape>> {
        let mesh = usize::from(mesh_index);
        if mesh >= pool.mesh_count() {
            return Err(SpliceError::MeshOutOfRange {
                index: mesh,
                mesh_count: pool.mesh_count(),
            });
        }
        let weights = vertex_weights
            .data(mesh_index)
            .ok_or(SpliceError::MeshOutOfRange {
                index: mesh,
                mesh_count: vertex_weights.mesh_count(),
            })?;
        let vertex_count = vertex_weights.vertex_count(mesh_index);
        if weights.row_count() != block_count(vertex_count, BLOCK_SIZE) {
            return Err(SpliceError::WeightsNotComputed {
                domain: "mesh",
                index: mesh,
            });
        }

        let target_count = pool.blend_shape_count(mesh_index);
        let mut spliced = Vec::with_capacity(target_count);
        for target in 0..target_count as u16 {
            let union = pool.vertex_indices(mesh_index, target);
            let Some(deltas) = pool.deltas().get(mesh_index, target) else {
                continue;
            };
            let source_count = weights.column_count().min(deltas.column_count());
            if let Some(&bad) = source_indices.iter().find(|&&s| usize::from(s) >= source_count) {
                return Err(SpliceError::SourceOutOfRange {
                    index: usize::from(bad),
                    source_count,
                });
            }

            let mut gathered = TiledMatrix2D::new(deltas.row_count(), weights.column_count(), scratch);
            for (position, &vertex) in union.iter().enumerate() {
                let vertex = vertex as usize;
                if vertex >= vertex_count {
                    return Err(SpliceError::VertexOutOfRange {
                        mesh,
                        vertex: vertex as u32,
                        vertex_count,
                    });
                }
                let from = &weights[vertex / BLOCK_SIZE];
                let to = &mut gathered[position / BLOCK_SIZE];
                for &source in source_indices {
                    let source = usize::from(source);
                    to[source][position % BLOCK_SIZE] = from[source][vertex % BLOCK_SIZE];
                }
            }

            let mut result = XyzBuffer::zeroed(union.len(), scratch);
            self.splicer
                .splice(deltas.view(), gathered.view(), source_indices, &mut result, 1.0)?;
            spliced.push(SplicedBlendShape {
                vertex_indices: union.to_vec(),
                deltas: result.to_vec3s(),
            });
        }
        log::trace!("blend shapes: spliced {} targets on mesh {mesh}", spliced.len());
        Ok(spliced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{RawBlendShapeTarget, RawDna, RawMesh};

    fn rig(targets: Vec<(Vec<u32>, Vec<[f32; 3]>)>) -> RawDna {
        RawDna {
            regions: vec!["all".into()],
            meshes: vec![RawMesh {
                positions: vec![[0.0; 3]; 40],
                blend_shape_targets: targets
                    .into_iter()
                    .map(|(vertex_indices, deltas)| RawBlendShapeTarget {
                        vertex_indices,
                        deltas,
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn union_is_sorted_and_deduplicated() {
        let arena = MemoryResource::new();
        let a = rig(vec![(vec![7, 2, 33], vec![[1.0; 3]; 3])]);
        let b = rig(vec![(vec![2, 5], vec![[2.0; 3]; 2])]);
        let pool = BlendShapePool::new(&a, &[&a, &b], &arena).unwrap();
        assert_eq!(pool.blend_shape_count(0), 1);
        assert_eq!(pool.vertex_indices(0, 0), &[2, 5, 7, 33]);
        assert_eq!(pool.blend_shape_count(3), 0);
        assert!(pool.vertex_indices(0, 9).is_empty());

        let deltas = pool.deltas().get(0, 0).unwrap();
        assert_eq!(deltas.row_count(), 1);
        assert_eq!(deltas[0][0].get(0), [1.0; 3]);
        assert_eq!(deltas[0][1].get(0), [2.0; 3]);
        assert_eq!(deltas[0][0].get(1), [0.0; 3]);
        assert_eq!(deltas[0][1].get(1), [2.0; 3]);
    }

    #[test]
    fn vertex_beyond_archetype_is_rejected() {
        let arena = MemoryResource::new();
        let a = rig(vec![(vec![1], vec![[0.0; 3]])]);
        let b = rig(vec![(vec![40], vec![[0.0; 3]])]);
        let err = BlendShapePool::new(&a, &[&b], &arena).unwrap_err();
        assert_eq!(
            err,
            SpliceError::VertexOutOfRange {
                mesh: 0,
                vertex: 40,
                vertex_count: 40
            }
        );
    }

    #[test]
    fn mismatched_delta_count_is_rejected() {
        let arena = MemoryResource::new();
        let a = rig(vec![(vec![1, 2], vec![[0.0; 3]])]);
        let err = BlendShapePool::new(&a, &[&a], &arena).unwrap_err();
        assert!(matches!(err, SpliceError::ShapeMismatch { what: "blend shape deltas", .. }));
    }
}
