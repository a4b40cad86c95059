//! In-memory rig definition implementing [`DnaReader`].
//!
//! Hosts holding already-decoded rig data (and the JSON fixtures used in tests) load
//! into this model directly.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpliceError};
use crate::reader::DnaReader;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawRegionAffiliation {
    #[serde(default)]
    pub regions: Vec<u16>,
    #[serde(default)]
    pub values: Vec<f32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawJoint {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub affiliation: RawRegionAffiliation,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawBlendShapeTarget {
    #[serde(default)]
    pub name: String,
    pub vertex_indices: Vec<u32>,
    pub deltas: Vec<[f32; 3]>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawMesh {
    #[serde(default)]
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// One entry per vertex; missing trailing entries mean "no affiliation".
    #[serde(default)]
    pub vertex_affiliations: Vec<RawRegionAffiliation>,
    #[serde(default)]
    pub blend_shape_targets: Vec<RawBlendShapeTarget>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawDna {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub joints: Vec<RawJoint>,
    #[serde(default)]
    pub meshes: Vec<RawMesh>,
    /// One entry per joint.
    #[serde(default)]
    pub neutral_joint_translations: Vec<[f32; 3]>,
    /// Euler angles, one entry per joint.
    #[serde(default)]
    pub neutral_joint_rotations: Vec<[f32; 3]>,
}

impl RawDna {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SpliceError::Config(e.to_string()))
    }

    fn mesh(&self, mesh_index: u16) -> Option<&RawMesh> {
        self.meshes.get(usize::from(mesh_index))
    }

    fn vertex_affiliation(&self, mesh_index: u16, vertex_index: u32) -> Option<&RawRegionAffiliation> {
        self.mesh(mesh_index)?
            .vertex_affiliations
            .get(vertex_index as usize)
    }

    fn target(&self, mesh_index: u16, target_index: u16) -> Option<&RawBlendShapeTarget> {
        self.mesh(mesh_index)?
            .blend_shape_targets
            .get(usize::from(target_index))
    }
}

impl DnaReader for RawDna {
    fn region_count(&self) -> u16 {
        self.regions.len() as u16
    }

    fn joint_count(&self) -> u16 {
        self.joints.len() as u16
    }

    fn joint_region_indices(&self, joint_index: u16) -> &[u16] {
        self.joints
            .get(usize::from(joint_index))
            .map_or(&[][..], |j| &j.affiliation.regions[..])
    }

    fn joint_region_affiliation(&self, joint_index: u16) -> &[f32] {
        self.joints
            .get(usize::from(joint_index))
            .map_or(&[][..], |j| &j.affiliation.values[..])
    }

    fn neutral_joint_translations(&self) -> &[[f32; 3]] {
        &self.neutral_joint_translations
    }

    fn neutral_joint_rotations(&self) -> &[[f32; 3]] {
        &self.neutral_joint_rotations
    }

    fn mesh_count(&self) -> u16 {
        self.meshes.len() as u16
    }

    fn vertex_position_count(&self, mesh_index: u16) -> u32 {
        self.mesh(mesh_index).map_or(0, |m| m.positions.len() as u32)
    }

    fn vertex_region_indices(&self, mesh_index: u16, vertex_index: u32) -> &[u16] {
        self.vertex_affiliation(mesh_index, vertex_index)
            .map_or(&[][..], |a| &a.regions[..])
    }

    fn vertex_region_affiliation(&self, mesh_index: u16, vertex_index: u32) -> &[f32] {
        self.vertex_affiliation(mesh_index, vertex_index)
            .map_or(&[][..], |a| &a.values[..])
    }

    fn vertex_positions(&self, mesh_index: u16) -> &[[f32; 3]] {
        self.mesh(mesh_index).map_or(&[][..], |m| &m.positions[..])
    }

    fn blend_shape_target_count(&self, mesh_index: u16) -> u16 {
        self.mesh(mesh_index)
            .map_or(0, |m| m.blend_shape_targets.len() as u16)
    }

    fn blend_shape_target_vertex_indices(&self, mesh_index: u16, target_index: u16) -> &[u32] {
        self.target(mesh_index, target_index)
            .map_or(&[][..], |t| &t.vertex_indices[..])
    }

    fn blend_shape_target_deltas(&self, mesh_index: u16, target_index: u16) -> &[[f32; 3]] {
        self.target(mesh_index, target_index)
            .map_or(&[][..], |t| &t.deltas[..])
    }
}
