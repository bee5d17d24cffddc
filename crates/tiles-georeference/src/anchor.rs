//! Objects whose placement follows the georeference.

use glam::DMat4;

use crate::decompose::RotationAndScale;

/// The coordinate space an anchored object's position is defined in.
///
/// When an object's authority is re-assigned, its owner recomputes the other
/// representations of its position from the authoritative one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum PositionAuthority {
    #[default]
    None,
    LongitudeLatitudeHeight,
    EarthCenteredEarthFixed,
    /// The scene's world space, which moves with the georeference origin.
    WorldCoordinates,
    /// The space of the object's parent.
    LocalCoordinates,
}

/// An object whose orientation is kept consistent with the globe when the
/// georeference origin moves.
///
/// Implemented by engine-side adapters; the georeference never owns anchors.
pub trait AnchoredObject {
    /// The object's current model→world transform.
    fn model_to_world(&self) -> DMat4;

    /// Overwrite the object's rotation and scale. Its position is untouched.
    fn set_rotation_and_scale(&mut self, rotation_and_scale: RotationAndScale);

    fn position_authority(&self) -> PositionAuthority;

    /// Assign the authority, recomputing the position from it.
    fn set_position_authority(&mut self, authority: PositionAuthority);
}

impl<T: AnchoredObject + ?Sized> AnchoredObject for &mut T {
    fn model_to_world(&self) -> DMat4 {
        (**self).model_to_world()
    }

    fn set_rotation_and_scale(&mut self, rotation_and_scale: RotationAndScale) {
        (**self).set_rotation_and_scale(rotation_and_scale);
    }

    fn position_authority(&self) -> PositionAuthority {
        (**self).position_authority()
    }

    fn set_position_authority(&mut self, authority: PositionAuthority) {
        (**self).set_position_authority(authority);
    }
}
