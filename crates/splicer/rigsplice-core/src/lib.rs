//! rigsplice-core: region-weighted splicing of rig definitions (engine-agnostic).
//!
//! Source rigs ("DNAs") describe how strongly each joint and vertex belongs to a set of
//! regions. Given per-source, per-region splice weights, this crate resolves dense
//! per-element weights, tiles them into 16-wide blocks and blends source deformation
//! data with a vectorized block splicer.

pub mod blend_shapes;
pub mod config;
pub mod error;
pub mod joint_weights;
pub mod matrix;
pub mod neutral;
pub mod output_offsets;
pub mod raw;
pub mod reader;
pub mod region;
pub mod splice_weights;
pub mod splicer;
pub mod tiled;
pub mod variable_width;
pub mod vertex_weights;
mod resolve;

/// Arena handle injected into every owning structure. Buffers allocated from it live
/// as long as the borrow, so the resource always outlives what it backs.
pub type MemoryResource = bumpalo::Bump;

/// Number of per-element scalars packed into one tile.
pub const BLOCK_SIZE: usize = 16;

/// Scalar output channels per joint: translation xyz, rotation xyz, scale xyz.
pub const JOINT_ATTRIBUTE_COUNT: usize = 9;

pub use blend_shapes::{BlendShapeDeltas, BlendShapePool, BlendShapeSplicer, SplicedBlendShape};
pub use config::{SplicerConfig, SplicerKind};
pub use error::{Result, SpliceError};
pub use joint_weights::JointWeights;
pub use matrix::{AlignedMatrix2D, Matrix2D, Matrix2DView, Matrix3D};
pub use neutral::{NeutralJointSplicer, NeutralJoints, NeutralMeshSplicer};
pub use output_offsets::OutputIndexTargetOffsets;
pub use raw::RawDna;
pub use reader::DnaReader;
pub use region::RegionAffiliation;
pub use splice_weights::SpliceWeights;
pub use splicer::{select_block_splicer, BlockSplicer, Narrow128, Wide256};
pub use tiled::{
    tile_sources, Block16, TiledMatrix2D, TiledView, TiledXyzMatrix, TiledXyzView, XyzBlock, XyzBuffer,
};
pub use variable_width::VariableWidthMatrix;
pub use vertex_weights::VertexWeights;
