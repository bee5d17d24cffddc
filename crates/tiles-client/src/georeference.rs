//! Georeferenced scene roots and the objects anchored beneath them.
//!
//! A scene root carries a [`GeoreferenceOrigin`]. Its local space is the
//! east-up-north frame at that origin. Entities below it with a
//! [`GlobeAnchor`] have a position on the globe. When the origin changes,
//! anchors are re-oriented so they keep their orientation relative to the
//! globe, and repositioned from their authoritative coordinates.

use std::collections::HashMap;

use bevy::prelude::*;
use glam::{DMat3, DMat4, DVec3};
use tiles_georeference::{
    AnchoredObject, Cartographic, Ellipsoid, GeoreferenceConfig, LocalFrame, PositionAuthority,
    Relocation, RotationAndScale, matrix_to_rotation_and_scale,
};

/// Plugin for georeferenced scenes.
pub struct GeoreferencePlugin;

impl Plugin for GeoreferencePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                init_georeferences,
                relocate_anchors,
                sync_anchor_positions,
            )
                .chain(),
        );
    }
}

/// User-editable origin of a georeferenced scene root.
#[derive(Component, Debug, Clone, Default, PartialEq)]
#[require(Transform)]
pub struct GeoreferenceOrigin(pub GeoreferenceConfig);

/// The frame currently applied to a scene root, built from its
/// [`GeoreferenceOrigin`].
#[derive(Component, Debug, Clone)]
pub struct Georeference(pub tiles_georeference::Georeference);

/// A position on the globe for an entity below a georeferenced root.
#[derive(Component, Debug, Clone, PartialEq)]
#[require(Transform)]
pub struct GlobeAnchor {
    pub authority: PositionAuthority,
    /// Earth-Centered-Earth-Fixed position in meters.
    pub ecef: DVec3,
    /// Longitude and latitude in degrees, height in meters.
    pub longitude_latitude_height: DVec3,
}

impl Default for GlobeAnchor {
    fn default() -> Self {
        Self {
            authority: PositionAuthority::WorldCoordinates,
            ecef: DVec3::ZERO,
            longitude_latitude_height: DVec3::ZERO,
        }
    }
}

impl GlobeAnchor {
    /// Anchor at an ECEF position.
    pub fn from_ecef(ecef: DVec3) -> Self {
        let mut anchor = Self::default();
        anchor.set_ecef(ecef);
        anchor.authority = PositionAuthority::EarthCenteredEarthFixed;
        anchor
    }

    /// Anchor at a geodetic position (degrees, meters).
    pub fn from_longitude_latitude_height(longitude: f64, latitude: f64, height: f64) -> Self {
        let ecef = Ellipsoid::WGS84
            .cartographic_to_cartesian(Cartographic::from_degrees(longitude, latitude, height));
        Self {
            authority: PositionAuthority::LongitudeLatitudeHeight,
            ecef,
            longitude_latitude_height: DVec3::new(longitude, latitude, height),
        }
    }

    /// Update the stored position without changing the authority.
    fn set_ecef(&mut self, ecef: DVec3) {
        self.ecef = ecef;
        if let Some(cartographic) = Ellipsoid::WGS84.cartesian_to_cartographic(ecef) {
            self.longitude_latitude_height = cartographic.to_degrees();
        }
    }
}

/// Build a frame for every newly configured scene root.
#[allow(clippy::needless_pass_by_value)]
fn init_georeferences(
    mut commands: Commands,
    roots: Query<(Entity, &GeoreferenceOrigin), Without<Georeference>>,
) {
    for (entity, origin) in &roots {
        commands.entity(entity).insert(Georeference(
            tiles_georeference::Georeference::new(origin.0.clone()),
        ));
    }
}

/// An anchor's state captured for relocation, written back afterwards.
struct PendingAnchor {
    entity: Entity,
    /// Model transform in the root's space.
    model_to_root: DMat4,
    authority: PositionAuthority,
    rotation_and_scale: Option<RotationAndScale>,
    authority_assigned: bool,
}

impl AnchoredObject for PendingAnchor {
    fn model_to_world(&self) -> DMat4 {
        self.model_to_root
    }

    fn set_rotation_and_scale(&mut self, rotation_and_scale: RotationAndScale) {
        self.rotation_and_scale = Some(rotation_and_scale);
    }

    fn position_authority(&self) -> PositionAuthority {
        self.authority
    }

    fn set_position_authority(&mut self, authority: PositionAuthority) {
        self.authority = authority;
        self.authority_assigned = true;
    }
}

fn to_dmat4(transform: &GlobalTransform) -> DMat4 {
    Mat4::from(transform.affine()).as_dmat4()
}

/// Re-orient and re-authorize the anchors below roots whose origin changed.
#[allow(clippy::needless_pass_by_value, clippy::type_complexity)]
fn relocate_anchors(
    mut roots: Query<
        (Entity, &GeoreferenceOrigin, &mut Georeference, &GlobalTransform),
        Changed<GeoreferenceOrigin>,
    >,
    children: Query<&Children>,
    parents: Query<&ChildOf>,
    globals: Query<&GlobalTransform>,
    mut anchors: Query<(&mut Transform, &mut GlobeAnchor)>,
) {
    for (root, origin, mut georeference, root_global) in &mut roots {
        let root_inverse = to_dmat4(root_global).inverse();
        let model_to_root = |entity: Entity| {
            globals
                .get(entity)
                .map_or(DMat4::IDENTITY, |global| root_inverse * to_dmat4(global))
        };

        // Breadth-first, so parents come before their children.
        let mut pending: Vec<PendingAnchor> = children
            .iter_descendants(root)
            .filter_map(|entity| {
                let (_, anchor) = anchors.get(entity).ok()?;
                Some(PendingAnchor {
                    entity,
                    model_to_root: model_to_root(entity),
                    authority: anchor.authority,
                    rotation_and_scale: None,
                    authority_assigned: false,
                })
            })
            .collect();

        let old_frame = *georeference.0.frame();
        let relocation = georeference
            .0
            .set_config(origin.0.clone(), pending.iter_mut());
        let Relocation::Relocated { anchors: count } = relocation else {
            continue;
        };
        tracing::info!("Georeference origin moved; relocated {count} anchors");

        // Anchors below another anchor keep their local orientation, since
        // their parent is corrected by the same rotation.
        let correction = DMat3::from_mat4(georeference.0.frame().ecef_to_local())
            * DMat3::from_mat4(old_frame.local_to_ecef());
        let mut new_linear: HashMap<Entity, DMat3> = HashMap::new();

        for anchor in pending {
            let Ok((mut transform, mut globe_anchor)) = anchors.get_mut(anchor.entity) else {
                continue;
            };

            if let Some(rotation_and_scale) = anchor.rotation_and_scale {
                let world_linear = rotation_and_scale.to_mat3();
                new_linear.insert(anchor.entity, world_linear);

                let parent_linear = parent_linear_in_root(
                    anchor.entity,
                    root,
                    &parents,
                    &new_linear,
                    correction,
                    &model_to_root,
                );
                let local = matrix_to_rotation_and_scale(parent_linear.inverse() * world_linear);
                transform.rotation = local.rotation.as_quat();
                transform.scale = local.scale.as_vec3();
            }

            if anchor.authority_assigned {
                globe_anchor.authority = anchor.authority;
            }
        }
    }
}

/// The linear part of `entity`'s parent in root space, after relocation.
fn parent_linear_in_root(
    entity: Entity,
    root: Entity,
    parents: &Query<&ChildOf>,
    new_linear: &HashMap<Entity, DMat3>,
    correction: DMat3,
    model_to_root: &impl Fn(Entity) -> DMat4,
) -> DMat3 {
    let Ok(child_of) = parents.get(entity) else {
        return DMat3::IDENTITY;
    };
    let parent = child_of.parent();
    if parent == root {
        return DMat3::IDENTITY;
    }

    let old_parent = DMat3::from_mat4(model_to_root(parent));
    let moved_by_anchor = parents
        .iter_ancestors(entity)
        .take_while(|&ancestor| ancestor != root)
        .any(|ancestor| new_linear.contains_key(&ancestor));
    if moved_by_anchor {
        correction * old_parent
    } else {
        old_parent
    }
}

/// Apply each anchor's authoritative position.
///
/// ECEF and geodetic anchors move their transform; world and local anchors
/// update their stored globe position from the transform.
#[allow(clippy::needless_pass_by_value, clippy::type_complexity)]
fn sync_anchor_positions(
    roots: Query<(&Georeference, &GlobalTransform)>,
    parents: Query<&ChildOf>,
    globals: Query<&GlobalTransform>,
    mut anchors: Query<
        (Entity, &mut GlobeAnchor, &mut Transform),
        Or<(Changed<GlobeAnchor>, Changed<Transform>)>,
    >,
) {
    for (entity, mut anchor, mut transform) in &mut anchors {
        if anchor.authority == PositionAuthority::None {
            continue;
        }

        let Some((georeference, root_global)) = parents
            .iter_ancestors(entity)
            .find_map(|ancestor| roots.get(ancestor).ok())
        else {
            continue;
        };

        let root_inverse = to_dmat4(root_global).inverse();
        let parent_to_root = parents
            .get(entity)
            .ok()
            .and_then(|child_of| globals.get(child_of.parent()).ok())
            .map_or(DMat4::IDENTITY, |global| root_inverse * to_dmat4(global));

        match anchor.authority {
            PositionAuthority::LongitudeLatitudeHeight
            | PositionAuthority::EarthCenteredEarthFixed => {
                let local = georeference
                    .0
                    .ecef_position_to_local(Some(parent_to_root.inverse()), anchor.ecef)
                    .as_vec3();
                if transform.translation != local {
                    transform.translation = local;
                }
            }
            PositionAuthority::WorldCoordinates | PositionAuthority::LocalCoordinates => {
                let ecef = georeference
                    .0
                    .local_position_to_ecef(Some(parent_to_root), transform.translation.as_dvec3());
                if anchor.ecef != ecef {
                    anchor.bypass_change_detection().set_ecef(ecef);
                }
            }
            PositionAuthority::None => {}
        }
    }
}
