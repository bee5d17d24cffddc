//! Conversions between scene space and ECEF.

use glam::{DMat4, DVec3};

use crate::anchor::AnchoredObject;
use crate::config::GeoreferenceConfig;
use crate::local_frame::LocalFrame;
use crate::relocate::{OriginRelocator, Relocation};

/// The scene's georeference: its origin configuration and the local frame
/// built from it.
///
/// "World" space is the local east-up-north frame at the origin. "Local"
/// space is the space of some object's parent, given as a transform to or
/// from world space; `None` means the parent is the world.
#[derive(Debug, Clone, PartialEq)]
pub struct Georeference {
    config: GeoreferenceConfig,
    relocator: OriginRelocator,
}

impl Georeference {
    #[must_use]
    pub fn new(config: GeoreferenceConfig) -> Self {
        let relocator = OriginRelocator::initialize(&config);
        tracing::info!(
            "Georeference origin at {} (ECEF)",
            relocator.frame().origin_ecef()
        );
        Self { config, relocator }
    }

    #[must_use]
    pub fn config(&self) -> &GeoreferenceConfig {
        &self.config
    }

    #[must_use]
    pub fn frame(&self) -> &LocalFrame {
        self.relocator.frame()
    }

    /// Replace the configuration and relocate `anchors` to the new origin.
    pub fn set_config<I>(&mut self, config: GeoreferenceConfig, anchors: I) -> Relocation
    where
        I: IntoIterator,
        I::Item: AnchoredObject,
    {
        self.config = config;
        self.recalculate_origin(anchors)
    }

    /// Rebuild the frame from the current configuration, relocating `anchors`
    /// if it changed.
    pub fn recalculate_origin<I>(&mut self, anchors: I) -> Relocation
    where
        I: IntoIterator,
        I::Item: AnchoredObject,
    {
        self.relocator.on_origin_changed(&self.config, anchors)
    }

    #[must_use]
    pub fn world_position_to_ecef(&self, position: DVec3) -> DVec3 {
        self.frame().local_position_to_ecef(position)
    }

    #[must_use]
    pub fn local_position_to_ecef(
        &self,
        parent_local_to_world: Option<DMat4>,
        position: DVec3,
    ) -> DVec3 {
        let world = parent_local_to_world.map_or(position, |m| m.transform_point3(position));
        self.world_position_to_ecef(world)
    }

    #[must_use]
    pub fn ecef_position_to_world(&self, position: DVec3) -> DVec3 {
        self.frame().ecef_position_to_local(position)
    }

    #[must_use]
    pub fn ecef_position_to_local(
        &self,
        parent_world_to_local: Option<DMat4>,
        position: DVec3,
    ) -> DVec3 {
        let world = self.ecef_position_to_world(position);
        parent_world_to_local.map_or(world, |m| m.transform_point3(world))
    }

    #[must_use]
    pub fn world_direction_to_ecef(&self, direction: DVec3) -> DVec3 {
        self.frame().local_direction_to_ecef(direction)
    }

    #[must_use]
    pub fn ecef_direction_to_world(&self, direction: DVec3) -> DVec3 {
        self.frame().ecef_direction_to_local(direction)
    }
}

impl Default for Georeference {
    fn default() -> Self {
        Self::new(GeoreferenceConfig::default())
    }
}
