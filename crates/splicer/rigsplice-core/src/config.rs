//! Core configuration for rigsplice-core.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpliceError};
use crate::region::RegionAffiliation;

/// Which block splicer implementation to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplicerKind {
    /// Detect CPU features once and pick the widest supported variant.
    #[default]
    Auto,
    /// 256-bit lanes: each block as two chunks of 8.
    Wide,
    /// 128-bit lanes: each block as four chunks of 4.
    Narrow,
}

/// Configuration for splicing structures.
/// Keep this minimal; new fields need a serde default.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SplicerConfig {
    pub block_splicer: SplicerKind,
    /// Reject invalid region affiliations read from a rig. When false they are dropped
    /// with a warning.
    pub strict_regions: bool,
    /// Compact ragged index storage once pools are built.
    pub shrink_pools: bool,
}

impl Default for SplicerConfig {
    fn default() -> Self {
        Self {
            block_splicer: SplicerKind::Auto,
            strict_regions: true,
            shrink_pools: true,
        }
    }
}

impl SplicerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SpliceError::Config(e.to_string()))
    }

    /// Build one element's affiliation according to `strict_regions`.
    pub(crate) fn region_affiliation<F: FnOnce() -> String>(
        &self,
        region_indices: &[u16],
        values: &[f32],
        region_count: u16,
        element: F,
    ) -> Result<RegionAffiliation> {
        if self.strict_regions {
            return RegionAffiliation::new(region_indices, values, region_count);
        }
        let (affiliation, dropped) =
            RegionAffiliation::new_lenient(region_indices, values, region_count);
        if dropped > 0 {
            log::warn!("{}: dropped {dropped} invalid region affiliation(s)", element());
        }
        Ok(affiliation)
    }
}
