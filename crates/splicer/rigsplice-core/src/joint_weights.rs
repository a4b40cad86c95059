//! Per-joint splice weights resolved from region affiliations.

use bumpalo::collections::Vec as BumpVec;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::config::SplicerConfig;
use crate::error::Result;
use crate::reader::DnaReader;
use crate::region::RegionAffiliation;
use crate::resolve::{check_region_count, check_source_indices, resolve_into};
use crate::splice_weights::SpliceWeights;
use crate::tiled::TiledMatrix2D;
use crate::MemoryResource;

/// Resolves `[joint block][source]` weights from each joint's region affiliation.
#[derive(Debug)]
pub struct JointWeights<'a> {
    affiliations: BumpVec<'a, RegionAffiliation>,
    weights: TiledMatrix2D<'a>,
    region_count: u16,
}

impl<'a> JointWeights<'a> {
    pub fn new(reader: &dyn DnaReader, mem_res: &'a MemoryResource) -> Result<Self> {
        Self::with_config(reader, &SplicerConfig::default(), mem_res)
    }

    pub fn with_config(
        reader: &dyn DnaReader,
        cfg: &SplicerConfig,
        mem_res: &'a MemoryResource,
    ) -> Result<Self> {
        let joint_count = reader.joint_count();
        let region_count = reader.region_count();
        let mut affiliations = BumpVec::with_capacity_in(usize::from(joint_count), mem_res);
        for joint in 0..joint_count {
            let affiliation = cfg.region_affiliation(
                reader.joint_region_indices(joint),
                reader.joint_region_affiliation(joint),
                region_count,
                || format!("joint {joint}"),
            )?;
            affiliations.push(affiliation);
        }
        log::debug!("joint weights: {joint_count} joints over {region_count} regions");
        Ok(Self {
            affiliations,
            weights: TiledMatrix2D::empty(mem_res),
            region_count,
        })
    }

    /// Recompute the whole tiled matrix for `source_indices`.
    ///
    /// Lanes of sources not listed stay zero. Not incremental: previous results are
    /// discarded first.
    pub fn compute(&mut self, splice_weights: &SpliceWeights<'_>, source_indices: &[u16]) -> Result<()> {
        self.clear();
        check_region_count(splice_weights, self.region_count)?;
        check_source_indices(source_indices, splice_weights.source_count())?;
        resolve_into(&self.affiliations[..], splice_weights, source_indices, &mut self.weights);
        log::trace!(
            "joint weights computed: {} blocks x {} sources",
            self.weights.row_count(),
            self.weights.column_count()
        );
        Ok(())
    }

    pub fn clear(&mut self) {
        self.weights.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.row_count() == 0
    }

    #[inline]
    pub fn data(&self) -> &TiledMatrix2D<'a> {
        &self.weights
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.affiliations.len()
    }

    /// Regions declared by the rig; splice weights need at least this many columns.
    #[inline]
    pub fn region_count(&self) -> u16 {
        self.region_count
    }

    pub fn affiliations(&self) -> &[RegionAffiliation] {
        &self.affiliations
    }

    /// Resolved weight of `joint` for `source`, or `None` outside the computed range.
    pub fn weight(&self, joint: usize, source: usize) -> Option<f32> {
        if joint >= self.joint_count() || self.is_empty() || source >= self.weights.column_count() {
            return None;
        }
        Some(self.weights[joint / crate::BLOCK_SIZE][source][joint % crate::BLOCK_SIZE])
    }
}

impl<'a> Serialize for JointWeights<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("JointWeights", 2)?;
        state.serialize_field("affiliations", &self.affiliations[..])?;
        state.serialize_field("weights", &self.weights)?;
        state.end()
    }
}
