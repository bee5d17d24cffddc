//! Re-anchoring dependent objects when the origin moves.

use glam::DMat3;

use crate::anchor::{AnchoredObject, PositionAuthority};
use crate::config::GeoreferenceConfig;
use crate::decompose::matrix_to_rotation_and_scale;
use crate::local_frame::LocalFrame;

/// Outcome of [`OriginRelocator::on_origin_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    /// The new origin produced an identical frame; nothing was touched.
    Unchanged,
    /// The frame was replaced and `anchors` objects were re-oriented.
    Relocated { anchors: usize },
}

/// Holds the current local frame and corrects anchored objects when it is
/// replaced.
///
/// Moving the origin rotates the local axes relative to the globe. Each
/// anchor is rotated by the inverse amount so that it keeps its orientation
/// relative to the globe, and its position is recomputed from its
/// authoritative representation.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginRelocator {
    frame: LocalFrame,
}

impl OriginRelocator {
    /// Build the first frame from `config`.
    #[must_use]
    pub fn initialize(config: &GeoreferenceConfig) -> Self {
        Self {
            frame: LocalFrame::from_origin(config.origin()),
        }
    }

    #[must_use]
    pub fn frame(&self) -> &LocalFrame {
        &self.frame
    }

    /// Rebuild the frame from `config` and correct every anchor.
    pub fn on_origin_changed<I>(&mut self, config: &GeoreferenceConfig, anchors: I) -> Relocation
    where
        I: IntoIterator,
        I::Item: AnchoredObject,
    {
        let new_frame = LocalFrame::from_origin(config.origin());
        if new_frame.local_to_ecef() == self.frame.local_to_ecef() {
            return Relocation::Unchanged;
        }

        let old_frame = std::mem::replace(&mut self.frame, new_frame);
        let old_to_new = DMat3::from_mat4(self.frame.ecef_to_local())
            * DMat3::from_mat4(old_frame.local_to_ecef());

        let mut count = 0;
        for mut anchor in anchors {
            let model_to_new = old_to_new * DMat3::from_mat4(anchor.model_to_world());
            anchor.set_rotation_and_scale(matrix_to_rotation_and_scale(model_to_new));

            // World coordinates are relative to the old origin, so they can no
            // longer be trusted.
            let authority = match anchor.position_authority() {
                PositionAuthority::WorldCoordinates => PositionAuthority::EarthCenteredEarthFixed,
                authority => authority,
            };
            anchor.set_position_authority(authority);
            count += 1;
        }

        tracing::debug!(
            "Relocated georeference origin to {} ({count} anchors)",
            self.frame.origin_ecef()
        );
        Relocation::Relocated { anchors: count }
    }
}
