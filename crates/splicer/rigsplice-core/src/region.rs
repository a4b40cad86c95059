//! Sparse per-element region affiliation.
//!
//! Most joints and vertices belong to only a handful of regions, so the pairs live in
//! inline storage and only spill to the heap past `N` entries.

use serde::Serialize;
use smallvec::SmallVec;

use crate::error::{Result, SpliceError};

/// `(region index, affiliation value)` pairs for one element.
///
/// Region indices are unique within an element. Values are not normalized here.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RegionAffiliation<const N: usize = 4> {
    regions: SmallVec<[u16; N]>,
    values: SmallVec<[f32; N]>,
}

impl<const N: usize> RegionAffiliation<N> {
    /// Build from parallel lists, validating every index against `region_count`.
    pub fn new(region_indices: &[u16], values: &[f32], region_count: u16) -> Result<Self> {
        if region_indices.len() != values.len() {
            return Err(SpliceError::AffiliationLength {
                indices: region_indices.len(),
                values: values.len(),
            });
        }
        for (i, &region) in region_indices.iter().enumerate() {
            if region >= region_count {
                return Err(SpliceError::RegionOutOfRange {
                    region,
                    region_count,
                });
            }
            if region_indices[..i].contains(&region) {
                return Err(SpliceError::DuplicateRegion { region });
            }
        }
        Ok(Self {
            regions: SmallVec::from_slice(region_indices),
            values: SmallVec::from_slice(values),
        })
    }

    /// Lenient variant: keeps the valid pairs and reports how many were dropped.
    ///
    /// Pairs beyond the shorter of the two lists, out-of-range regions and repeated
    /// regions are skipped.
    pub fn new_lenient(region_indices: &[u16], values: &[f32], region_count: u16) -> (Self, usize) {
        let mut out = Self::default();
        let mut dropped = region_indices.len().max(values.len()) - region_indices.len().min(values.len());
        for (&region, &value) in region_indices.iter().zip(values) {
            if region >= region_count || out.regions.contains(&region) {
                dropped += 1;
                continue;
            }
            out.regions.push(region);
            out.values.push(value);
        }
        (out, dropped)
    }

    /// `Σ value * per_region_weights[region]` over the affiliation list.
    ///
    /// `per_region_weights` must cover every region referenced here; construction
    /// checks indices against the declared region count, which is the row width of the
    /// splice weights.
    #[inline]
    pub fn total_weight_across_regions(&self, per_region_weights: &[f32]) -> f32 {
        self.regions
            .iter()
            .zip(self.values.iter())
            .fold(0.0, |acc, (&region, &value)| {
                acc + value * per_region_weights[usize::from(region)]
            })
    }

    #[inline]
    pub fn region_indices(&self) -> &[u16] {
        &self.regions
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Whether the pairs fit in inline storage.
    pub fn is_inline(&self) -> bool {
        !self.regions.spilled() && !self.values.spilled()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, f32)> + '_ {
        self.regions.iter().copied().zip(self.values.iter().copied())
    }
}
