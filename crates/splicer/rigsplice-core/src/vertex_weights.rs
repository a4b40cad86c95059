//! Per-vertex splice weights, one tiled matrix per mesh.

use bumpalo::collections::Vec as BumpVec;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::config::SplicerConfig;
use crate::error::{Result, SpliceError};
use crate::reader::DnaReader;
use crate::region::RegionAffiliation;
use crate::resolve::{check_region_count, check_source_indices, resolve_into};
use crate::splice_weights::SpliceWeights;
use crate::tiled::TiledMatrix2D;
use crate::{MemoryResource, BLOCK_SIZE};

#[derive(Debug)]
pub struct VertexWeights<'a> {
    /// `[mesh][vertex]`
    affiliations: BumpVec<'a, BumpVec<'a, RegionAffiliation>>,
    /// `[mesh] -> [vertex block][source]`
    weights: BumpVec<'a, TiledMatrix2D<'a>>,
    region_count: u16,
}

impl<'a> VertexWeights<'a> {
    pub fn new(reader: &dyn DnaReader, mem_res: &'a MemoryResource) -> Result<Self> {
        Self::with_config(reader, &SplicerConfig::default(), mem_res)
    }

    pub fn with_config(
        reader: &dyn DnaReader,
        cfg: &SplicerConfig,
        mem_res: &'a MemoryResource,
    ) -> Result<Self> {
        let mesh_count = reader.mesh_count();
        let region_count = reader.region_count();
        let mut affiliations = BumpVec::with_capacity_in(usize::from(mesh_count), mem_res);
        let mut weights = BumpVec::with_capacity_in(usize::from(mesh_count), mem_res);
        for mesh in 0..mesh_count {
            let vertex_count = reader.vertex_position_count(mesh);
            let mut per_vertex = BumpVec::with_capacity_in(vertex_count as usize, mem_res);
            for vertex in 0..vertex_count {
                per_vertex.push(cfg.region_affiliation(
                    reader.vertex_region_indices(mesh, vertex),
                    reader.vertex_region_affiliation(mesh, vertex),
                    region_count,
                    || format!("mesh {mesh} vertex {vertex}"),
                )?);
            }
            log::trace!("vertex weights: mesh {mesh} has {vertex_count} vertices");
            affiliations.push(per_vertex);
            weights.push(TiledMatrix2D::empty(mem_res));
        }
        log::debug!("vertex weights: {mesh_count} meshes over {region_count} regions");
        Ok(Self {
            affiliations,
            weights,
            region_count,
        })
    }

    /// Recompute the tiled matrices of `mesh_indices` for `source_indices`.
    ///
    /// Every mesh is cleared first, so meshes not listed end up empty.
    pub fn compute(
        &mut self,
        splice_weights: &SpliceWeights<'_>,
        source_indices: &[u16],
        mesh_indices: &[u16],
    ) -> Result<()> {
        self.clear();
        check_region_count(splice_weights, self.region_count)?;
        check_source_indices(source_indices, splice_weights.source_count())?;
        let mesh_count = self.mesh_count();
        if let Some(&bad) = mesh_indices.iter().find(|&&m| usize::from(m) >= mesh_count) {
            return Err(SpliceError::MeshOutOfRange {
                index: usize::from(bad),
                mesh_count,
            });
        }
        for &mesh in mesh_indices {
            let mesh = usize::from(mesh);
            resolve_into(
                &self.affiliations[mesh][..],
                splice_weights,
                source_indices,
                &mut self.weights[mesh],
            );
        }
        Ok(())
    }

    /// Recompute every mesh.
    pub fn compute_all(&mut self, splice_weights: &SpliceWeights<'_>, source_indices: &[u16]) -> Result<()> {
        let meshes: Vec<u16> = (0..self.mesh_count() as u16).collect();
        self.compute(splice_weights, source_indices, &meshes)
    }

    pub fn clear(&mut self) {
        for matrix in self.weights.iter_mut() {
            matrix.clear();
        }
    }

    /// True when no mesh holds computed weights.
    pub fn is_empty(&self) -> bool {
        self.weights.iter().all(|m| m.row_count() == 0)
    }

    #[inline]
    pub fn region_count(&self) -> u16 {
        self.region_count
    }

    #[inline]
    pub fn mesh_count(&self) -> usize {
        self.affiliations.len()
    }

    pub fn vertex_count(&self, mesh_index: u16) -> usize {
        self.affiliations
            .get(usize::from(mesh_index))
            .map_or(0, |a| a.len())
    }

    /// Tiled weights of one mesh; empty if the mesh was not part of the last compute.
    pub fn data(&self, mesh_index: u16) -> Option<&TiledMatrix2D<'a>> {
        self.weights.get(usize::from(mesh_index))
    }

    pub fn weight(&self, mesh_index: u16, vertex: usize, source: usize) -> Option<f32> {
        let matrix = self.data(mesh_index)?;
        if vertex >= self.vertex_count(mesh_index) || matrix.is_empty() || source >= matrix.column_count() {
            return None;
        }
        Some(matrix[vertex / BLOCK_SIZE][source][vertex % BLOCK_SIZE])
    }
}

impl<'a> Serialize for VertexWeights<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let affiliations: Vec<&[RegionAffiliation]> = self.affiliations.iter().map(|a| &a[..]).collect();
        let mut state = serializer.serialize_struct("VertexWeights", 2)?;
        state.serialize_field("affiliations", &affiliations)?;
        state.serialize_field("weights", &self.weights[..])?;
        state.end()
    }
}
