//! Remap table from a pool's joint output channels to a target archetype's ordering.
//!
//! Output indices use the flat numbering `joint * 9 + channel`, channels being
//! translation xyz, rotation xyz and scale xyz.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::{Result, SpliceError};
use crate::matrix::{Matrix2D, Matrix2DView};
use crate::{MemoryResource, JOINT_ATTRIBUTE_COUNT};

/// `offsets[joint][channel]` = position of that output in the target list.
///
/// Unmapped entries read 0, which is also a valid position; callers track which
/// joints belong to a mapped group themselves.
#[derive(Debug, Clone)]
pub struct OutputIndexTargetOffsets<'a> {
    offsets: Matrix2D<'a, u8>,
}

impl<'a> OutputIndexTargetOffsets<'a> {
    pub fn new(joint_count: u16, mem_res: &'a MemoryResource) -> Self {
        Self {
            offsets: Matrix2D::new(usize::from(joint_count), JOINT_ATTRIBUTE_COUNT, mem_res),
        }
    }

    /// Record where each of `output_indices` sits within `target_output_indices`.
    ///
    /// The table is left untouched when any index fails to map.
    pub fn map_joint_group(&mut self, output_indices: &[u16], target_output_indices: &[u16]) -> Result<()> {
        let mut mapped = Vec::with_capacity(output_indices.len());
        for &output_index in output_indices {
            let (joint, channel) = split(output_index);
            if joint >= self.joint_count() {
                return Err(SpliceError::JointOutOfRange {
                    index: joint,
                    joint_count: self.joint_count(),
                });
            }
            let position = target_output_indices
                .iter()
                .position(|&t| t == output_index)
                .ok_or(SpliceError::OutputIndexNotFound { output_index })?;
            let offset = u8::try_from(position).map_err(|_| SpliceError::OffsetOverflow {
                output_index,
                position,
            })?;
            mapped.push((joint, channel, offset));
        }
        for (joint, channel, offset) in mapped {
            self.offsets[joint][channel] = offset;
        }
        log::trace!("output offsets: mapped {} joint outputs", output_indices.len());
        Ok(())
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.offsets.row_count()
    }

    pub fn offset(&self, joint_index: usize, channel: usize) -> Option<u8> {
        if joint_index < self.joint_count() && channel < JOINT_ATTRIBUTE_COUNT {
            Some(self.offsets[joint_index][channel])
        } else {
            None
        }
    }

    pub fn row(&self, joint_index: usize) -> Option<&[u8]> {
        (joint_index < self.joint_count()).then(|| self.offsets.row(joint_index))
    }

    pub fn data(&self) -> Matrix2DView<'_, u8> {
        self.offsets.view()
    }

    /// Write pool-ordered `values` into `target`, which is laid out in target order.
    pub fn scatter(&self, output_indices: &[u16], values: &[f32], target: &mut [f32]) -> Result<()> {
        if output_indices.len() != values.len() {
            return Err(SpliceError::ShapeMismatch {
                what: "joint output values",
                expected: output_indices.len(),
                actual: values.len(),
            });
        }
        for (&output_index, &value) in output_indices.iter().zip(values) {
            let (joint, channel) = split(output_index);
            let offset = self
                .offset(joint, channel)
                .ok_or(SpliceError::JointOutOfRange {
                    index: joint,
                    joint_count: self.joint_count(),
                })?;
            let offset = usize::from(offset);
            let actual = target.len();
            let slot = target.get_mut(offset).ok_or(SpliceError::BufferTooShort {
                required: offset + 1,
                actual,
            })?;
            *slot = value;
        }
        Ok(())
    }
}

#[inline]
fn split(output_index: u16) -> (usize, usize) {
    let index = usize::from(output_index);
    (index / JOINT_ATTRIBUTE_COUNT, index % JOINT_ATTRIBUTE_COUNT)
}

impl<'a> Serialize for OutputIndexTargetOffsets<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("OutputIndexTargetOffsets", 1)?;
        state.serialize_field("offsets", &self.offsets)?;
        state.end()
    }
}
