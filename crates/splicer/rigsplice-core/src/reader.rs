//! Read-only view of a rig definition.
//!
//! Readers are external collaborators (file-format decoders, in-memory rigs). They are
//! queried any time during construction and must answer out-of-range queries with empty
//! results rather than failing.

/// Rig data consumed by the splicing core.
pub trait DnaReader {
    fn region_count(&self) -> u16;

    fn joint_count(&self) -> u16;
    fn joint_region_indices(&self, joint_index: u16) -> &[u16];
    fn joint_region_affiliation(&self, joint_index: u16) -> &[f32];
    fn neutral_joint_translations(&self) -> &[[f32; 3]];
    fn neutral_joint_rotations(&self) -> &[[f32; 3]];

    fn mesh_count(&self) -> u16;
    fn vertex_position_count(&self, mesh_index: u16) -> u32;
    fn vertex_region_indices(&self, mesh_index: u16, vertex_index: u32) -> &[u16];
    fn vertex_region_affiliation(&self, mesh_index: u16, vertex_index: u32) -> &[f32];
    fn vertex_positions(&self, mesh_index: u16) -> &[[f32; 3]];

    fn blend_shape_target_count(&self, mesh_index: u16) -> u16;
    fn blend_shape_target_vertex_indices(&self, mesh_index: u16, target_index: u16) -> &[u32];
    fn blend_shape_target_deltas(&self, mesh_index: u16, target_index: u16) -> &[[f32; 3]];
}
