//! Errors reported at the splicing API boundary.
//!
//! Inputs originate from external rig data that may be malformed, so size and index
//! contracts are checked and reported here instead of trapping.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpliceError {
    #[error("region indices ({indices}) and affiliation values ({values}) differ in length")]
    AffiliationLength { indices: usize, values: usize },
    #[error("region index {region} out of range (region count {region_count})")]
    RegionOutOfRange { region: u16, region_count: u16 },
    #[error("region index {region} listed more than once")]
    DuplicateRegion { region: u16 },
    #[error("flat weight block of {len} values is not a multiple of region count {region_count}")]
    WeightLength { len: usize, region_count: usize },
    #[error("writing {rows} rows at source {start} exceeds source count {source_count}")]
    SourceRangeOverflow {
        start: usize,
        rows: usize,
        source_count: usize,
    },
    #[error("source index {index} out of range (source count {source_count})")]
    SourceOutOfRange { index: usize, source_count: usize },
    #[error("mesh index {index} out of range (mesh count {mesh_count})")]
    MeshOutOfRange { index: usize, mesh_count: usize },
    #[error("joint index {index} out of range (joint count {joint_count})")]
    JointOutOfRange { index: usize, joint_count: usize },
    #[error("vertex index {vertex} out of range on mesh {mesh} (vertex count {vertex_count})")]
    VertexOutOfRange {
        mesh: usize,
        vertex: u32,
        vertex_count: usize,
    },
    #[error("{what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("result buffer holds {actual} lanes but {required} are required")]
    BufferTooShort { required: usize, actual: usize },
    #[error("{domain} {index} has no computed weights")]
    WeightsNotComputed { domain: &'static str, index: usize },
    #[error("output index {output_index} not present in target output indices")]
    OutputIndexNotFound { output_index: u16 },
    #[error("target offset {position} for output index {output_index} does not fit in a byte")]
    OffsetOverflow { output_index: u16, position: usize },
    #[error("config parse error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SpliceError>;
