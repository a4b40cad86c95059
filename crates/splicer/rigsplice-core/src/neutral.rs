//! Neutral pose splicing: vertex positions per mesh and joint translations/rotations.

use bumpalo::collections::Vec as BumpVec;
use serde::Serialize;

use crate::error::{Result, SpliceError};
use crate::joint_weights::JointWeights;
use crate::matrix::{block_count, Matrix3D};
use crate::reader::DnaReader;
use crate::splicer::BlockSplicer;
use crate::tiled::{tile_sources, TiledXyzMatrix, XyzBlock, XyzBuffer};
use crate::vertex_weights::VertexWeights;
use crate::{MemoryResource, BLOCK_SIZE};

/// Source vertex positions tiled per mesh, `[mesh] -> [vertex block][source]`.
#[derive(Debug)]
pub struct NeutralMeshSplicer<'a> {
    positions: BumpVec<'a, TiledXyzMatrix<'a>>,
    vertex_counts: BumpVec<'a, usize>,
}

impl<'a> NeutralMeshSplicer<'a> {
    /// Every source must carry the archetype's vertex count on every mesh.
    pub fn new(
        archetype: &dyn DnaReader,
        sources: &[&dyn DnaReader],
        mem_res: &'a MemoryResource,
    ) -> Result<Self> {
        let mesh_count = archetype.mesh_count();
        let mut positions = BumpVec::with_capacity_in(usize::from(mesh_count), mem_res);
        let mut vertex_counts = BumpVec::with_capacity_in(usize::from(mesh_count), mem_res);
        for mesh in 0..mesh_count {
            let vertex_count = archetype.vertex_position_count(mesh) as usize;
            let per_source: Vec<&[[f32; 3]]> = sources.iter().map(|s| s.vertex_positions(mesh)).collect();
            positions.push(tile_sources(&per_source, vertex_count, mem_res)?);
            vertex_counts.push(vertex_count);
        }
        log::debug!("neutral meshes: {mesh_count} meshes from {} sources", sources.len());
        Ok(Self {
            positions,
            vertex_counts,
        })
    }

    #[inline]
    pub fn mesh_count(&self) -> usize {
        self.positions.len()
    }

    /// Blend the selected sources' neutral positions of `mesh_index`.
    pub fn splice(
        &self,
        splicer: &dyn BlockSplicer,
        vertex_weights: &VertexWeights<'_>,
        source_indices: &[u16],
        mesh_index: u16,
        scratch: &MemoryResource,
    ) -> Result<Vec<[f32; 3]>> {
        let mesh = usize::from(mesh_index);
        let (Some(positions), Some(&vertex_count)) = (self.positions.get(mesh), self.vertex_counts.get(mesh)) else {
            return Err(SpliceError::MeshOutOfRange {
                index: mesh,
                mesh_count: self.mesh_count(),
            });
        };
        let weighted = vertex_weights.vertex_count(mesh_index);
        if weighted != vertex_count {
            return Err(SpliceError::ShapeMismatch {
                what: "vertex weight count",
                expected: vertex_count,
                actual: weighted,
            });
        }
        let weights = vertex_weights
            .data(mesh_index)
            .filter(|w| w.row_count() == positions.row_count())
            .ok_or(SpliceError::WeightsNotComputed {
                domain: "mesh",
                index: mesh,
            })?;
        let mut result = XyzBuffer::zeroed(vertex_count, scratch);
        splicer.splice(positions.view(), weights.view(), source_indices, &mut result, 1.0)?;
        Ok(result.to_vec3s())
    }
}

/// Spliced neutral joint transforms, one entry per joint.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NeutralJoints {
    pub translations: Vec<[f32; 3]>,
    pub rotations: Vec<[f32; 3]>,
}

const TRANSLATION: usize = 0;
const ROTATION: usize = 1;

/// Neutral joint data of every source, `[attribute][joint block][source]`.
#[derive(Debug)]
pub struct NeutralJointSplicer<'a> {
    joint_count: usize,
    data: Matrix3D<'a, XyzBlock>,
}

impl<'a> NeutralJointSplicer<'a> {
    pub fn new(
        archetype: &dyn DnaReader,
        sources: &[&dyn DnaReader],
        mem_res: &'a MemoryResource,
    ) -> Result<Self> {
        let joint_count = usize::from(archetype.joint_count());
        let blocks = block_count(joint_count, BLOCK_SIZE);
        let mut data: Matrix3D<'a, XyzBlock> = Matrix3D::new(2, blocks, sources.len(), mem_res);
        for (source_index, source) in sources.iter().enumerate() {
            let attributes = [
                (TRANSLATION, "neutral joint translations", source.neutral_joint_translations()),
                (ROTATION, "neutral joint rotations", source.neutral_joint_rotations()),
            ];
            for (attribute, what, values) in attributes {
                if values.len() != joint_count {
                    return Err(SpliceError::ShapeMismatch {
                        what,
                        expected: joint_count,
                        actual: values.len(),
                    });
                }
                for (joint, v) in values.iter().enumerate() {
                    data.row_mut(attribute, joint / BLOCK_SIZE)[source_index].set(joint % BLOCK_SIZE, *v);
                }
            }
        }
        log::debug!("neutral joints: {joint_count} joints from {} sources", sources.len());
        Ok(Self { joint_count, data })
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.joint_count
    }

    pub fn splice(
        &self,
        splicer: &dyn BlockSplicer,
        joint_weights: &JointWeights<'_>,
        source_indices: &[u16],
        scratch: &MemoryResource,
    ) -> Result<NeutralJoints> {
        if self.joint_count == 0 {
            return Ok(NeutralJoints::default());
        }
        if joint_weights.joint_count() != self.joint_count {
            return Err(SpliceError::ShapeMismatch {
                what: "joint weight count",
                expected: self.joint_count,
                actual: joint_weights.joint_count(),
            });
        }
        let weights = joint_weights.data();
        if weights.row_count() != self.data.row_count() {
            return Err(SpliceError::WeightsNotComputed {
                domain: "joints",
                index: 0,
            });
        }
        let mut translations = XyzBuffer::zeroed(self.joint_count, scratch);
        let mut rotations = XyzBuffer::zeroed(self.joint_count, scratch);
        splicer.splice(
            self.data.slice(TRANSLATION),
            weights.view(),
            source_indices,
            &mut translations,
            1.0,
        )?;
        splicer.splice(
            self.data.slice(ROTATION),
            weights.view(),
            source_indices,
            &mut rotations,
            1.0,
        )?;
        Ok(NeutralJoints {
            translations: translations.to_vec3s(),
            rotations: rotations.to_vec3s(),
        })
    }
}
