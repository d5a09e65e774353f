//! Scene construction from a loaded model.
//!
//! Building runs in two stages so a failed load never leaves a partially
//! attached hierarchy: a fallible *planning* pass walks the model tables
//! and synthesizes meshes, materials, and node descriptions without touching
//! the ECS, then an infallible *spawn* pass materializes the plan under a
//! fresh root entity. Any integrity failure aborts before the first entity
//! exists; the caller keeps the previous scene.

use std::collections::HashMap;

use bevy::pbr::{NotShadowCaster, NotShadowReceiver};
use bevy::prelude::*;
use rig_model::{GeomKind, ModelIntegrityError, RawModel};
use thiserror::Error;
use tracing::{debug, warn};

use crate::components::{
    BodyIndex, GeomVisual, LightIndex, SimSceneRoot, TendonJoint, TendonSegment, VisGroup,
};
use crate::convert::{render_pos, render_quat};
use crate::material::{expand_texture, GeomAppearance, MaterialMemo};
use crate::mesh;
use crate::tendon::TENDON_POOL_CAPACITY;

/// Geoms with a visibility group at or above this are never built.
pub const VISIBLE_GROUP_LIMIT: i32 = 3;

/// Illuminance of model-driven and synthesized directional lights.
const DEFAULT_ILLUMINANCE: f32 = 10_000.0;

/// Errors that abort a scene build.
#[derive(Error, Debug)]
pub enum SceneBuildError {
    /// The model failed an integrity check (name table, buffer sub-ranges).
    #[error("scene build aborted: {0}")]
    Integrity(#[from] ModelIntegrityError),
}

/// Handle to a built scene: the root entity plus index lookup tables.
///
/// Dropped wholesale on reload via [`SpawnedScene::despawn`]; the mesh cache
/// and material memo live only inside the build call, so nothing leaks
/// across reloads.
#[derive(Resource, Debug)]
pub struct SpawnedScene {
    /// Root entity; every scene node is a descendant.
    pub root: Entity,
    /// Body id to entity.
    bodies: HashMap<usize, Entity>,
    /// Light entities, model order (the synthesized default light, when
    /// present, is the single entry).
    pub lights: Vec<Entity>,
    /// Tendon segment pool, slot order.
    pub segments: Vec<Entity>,
    /// Tendon joint pool, slot order.
    pub joints: Vec<Entity>,
}

impl SpawnedScene {
    /// Entity for a body id, if one was materialized.
    #[must_use]
    pub fn body_entity(&self, body_id: usize) -> Option<Entity> {
        self.bodies.get(&body_id).copied()
    }

    /// Number of materialized body nodes.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Detach and despawn the whole hierarchy.
    pub fn despawn(&self, world: &mut World) {
        if let Ok(root) = world.get_entity_mut(self.root) {
            root.despawn();
        }
    }
}

struct GeomPlan {
    body_id: usize,
    kind: GeomKind,
    from_mesh_data: bool,
    mesh: usize,
    material: usize,
    translation: Vec3,
    rotation: Option<Quat>,
    scale: Vec3,
    cast_shadows: bool,
    receive_shadows: bool,
    group: i32,
}

struct LightPlan {
    directional: bool,
    /// Index into the state's light arrays; `None` for the synthesized
    /// default light, which the synchronizer must leave alone.
    index: Option<usize>,
}

#[derive(Default)]
struct ScenePlan {
    /// Body ids in first-seen order, with display names.
    bodies: Vec<(usize, String)>,
    geoms: Vec<GeomPlan>,
    meshes: Vec<Mesh>,
    materials: Vec<GeomAppearance>,
    material_images: Vec<Option<Image>>,
    lights: Vec<LightPlan>,
}

impl ScenePlan {
    fn ensure_body(&mut self, model: &RawModel, body_id: usize) {
        if !self.bodies.iter().any(|(id, _)| *id == body_id) {
            self.bodies.push((body_id, model.body_name(body_id)));
        }
    }
}

/// Build the renderable scene for `model`.
///
/// Returns a [`SpawnedScene`] handle on success. The caller owns inserting
/// it as a resource and despawning it on reload.
///
/// # Errors
///
/// [`SceneBuildError::Integrity`] when the name blob is absent/empty or a
/// mesh/texture sub-range is out of bounds. On error no entities have been
/// spawned and no assets added.
pub fn build_scene(world: &mut World, model: &RawModel) -> Result<SpawnedScene, SceneBuildError> {
    let plan = plan_scene(model)?;
    Ok(spawn_plan(world, plan))
}

/// Fallible planning pass: walk the geometry, light, and body tables once,
/// synthesizing everything the spawn pass needs. Pure with respect to the
/// ECS and the asset store.
#[allow(clippy::too_many_lines)]
fn plan_scene(model: &RawModel) -> Result<ScenePlan, SceneBuildError> {
    model.validate()?;

    let mut plan = ScenePlan::default();
    let mut mesh_cache: HashMap<usize, usize> = HashMap::new();
    let mut unit_sphere: Option<usize> = None;
    let mut memo = MaterialMemo::default();
    let mut any_emitted = false;

    for g in 0..model.ngeom {
        let group = model.geom_group[g];
        if group >= VISIBLE_GROUP_LIMIT {
            continue;
        }

        let body_id = usize::try_from(model.geom_bodyid[g]).unwrap_or(0);
        plan.ensure_body(model, body_id);

        let size = [
            model.geom_size[3 * g],
            model.geom_size[3 * g + 1],
            model.geom_size[3 * g + 2],
        ];

        let raw_kind = GeomKind::from_raw(model.geom_type[g]);
        if raw_kind == Some(GeomKind::HeightField) {
            // Height-field visualization is a no-op placeholder.
            continue;
        }

        let mut from_mesh_data = false;
        let (kind, mesh_index) = match raw_kind {
            Some(GeomKind::Mesh) => {
                let mesh_id = usize::try_from(model.geom_dataid[g]).unwrap_or(usize::MAX);
                let index = if let Some(&cached) = mesh_cache.get(&mesh_id) {
                    cached
                } else {
                    let built = mesh::triangle_mesh(model, mesh_id)?;
                    plan.meshes.push(built);
                    let index = plan.meshes.len() - 1;
                    mesh_cache.insert(mesh_id, index);
                    index
                };
                from_mesh_data = true;
                (GeomKind::Mesh, index)
            }
            Some(GeomKind::Ellipsoid) => {
                let index = *unit_sphere.get_or_insert_with(|| {
                    plan.meshes.push(mesh::unit_sphere_mesh());
                    plan.meshes.len() - 1
                });
                (GeomKind::Ellipsoid, index)
            }
            Some(GeomKind::Plane) => {
                plan.meshes.push(mesh::plane_mesh(size));
                (GeomKind::Plane, plan.meshes.len() - 1)
            }
            Some(GeomKind::Sphere) => {
                plan.meshes.push(mesh::sphere_mesh(size[0]));
                (GeomKind::Sphere, plan.meshes.len() - 1)
            }
            Some(GeomKind::Capsule) => {
                plan.meshes.push(mesh::capsule_mesh(size[0], size[1]));
                (GeomKind::Capsule, plan.meshes.len() - 1)
            }
            Some(GeomKind::Cylinder) => {
                plan.meshes.push(mesh::cylinder_mesh(size[0], size[1]));
                (GeomKind::Cylinder, plan.meshes.len() - 1)
            }
            Some(GeomKind::Box) => {
                plan.meshes.push(mesh::box_mesh(size));
                (GeomKind::Box, plan.meshes.len() - 1)
            }
            Some(GeomKind::HeightField) => unreachable!("filtered above"),
            None => {
                warn!(
                    geom = g,
                    tag = model.geom_type[g],
                    "unsupported geom type, falling back to default sphere"
                );
                plan.meshes.push(mesh::default_sphere_mesh(size[0]));
                (GeomKind::Sphere, plan.meshes.len() - 1)
            }
        };

        let appearance = GeomAppearance::resolve(model, g);
        let texid = appearance.texid;
        let material = memo.intern(appearance, &mut plan.materials);
        if plan.material_images.len() < plan.materials.len() {
            let image = match usize::try_from(texid) {
                Ok(tex) => Some(expand_texture(model, tex)?),
                Err(_) => None,
            };
            plan.material_images.push(image);
        }

        let is_plane = kind == GeomKind::Plane;
        #[allow(clippy::cast_possible_truncation)]
        let scale = if kind == GeomKind::Ellipsoid {
            Vec3::new(size[0] as f32, size[2] as f32, size[1] as f32)
        } else {
            Vec3::ONE
        };

        plan.geoms.push(GeomPlan {
            body_id,
            kind,
            from_mesh_data,
            mesh: mesh_index,
            material,
            translation: render_pos(&model.geom_pos, g),
            rotation: (!is_plane).then(|| render_quat(&model.geom_quat, g)),
            scale,
            // The very first geometry never casts (legacy ground convention);
            // only planes skip shadow receiving.
            cast_shadows: any_emitted,
            receive_shadows: !is_plane,
            group,
        });
        any_emitted = true;
    }

    if model.nlight == 0 {
        plan.lights.push(LightPlan {
            directional: true,
            index: None,
        });
    } else {
        for i in 0..model.nlight {
            plan.lights.push(LightPlan {
                directional: model.light_directional[i] != 0,
                index: Some(i),
            });
        }
    }

    // Bodies never referenced by a visible geometry still get an empty
    // named node rather than failing the load.
    for body_id in 0..model.nbody {
        plan.ensure_body(model, body_id);
    }

    debug!(
        bodies = plan.bodies.len(),
        geoms = plan.geoms.len(),
        lights = plan.lights.len(),
        "scene planned"
    );

    Ok(plan)
}

/// Infallible spawn pass: add assets, then materialize the hierarchy.
fn spawn_plan(world: &mut World, plan: ScenePlan) -> SpawnedScene {
    let ScenePlan {
        bodies,
        geoms,
        meshes,
        materials,
        material_images,
        lights,
    } = plan;

    let (mesh_handles, unit_cylinder, unit_joint_sphere) = {
        let mut assets = world.resource_mut::<Assets<Mesh>>();
        let handles: Vec<Handle<Mesh>> = meshes.into_iter().map(|m| assets.add(m)).collect();
        let cylinder = assets.add(mesh::unit_cylinder_mesh());
        let sphere = assets.add(mesh::unit_sphere_mesh());
        (handles, cylinder, sphere)
    };

    let image_handles: Vec<Option<Handle<Image>>> = {
        let mut assets = world.resource_mut::<Assets<Image>>();
        material_images
            .into_iter()
            .map(|image| image.map(|i| assets.add(i)))
            .collect()
    };

    let (material_handles, tendon_material) = {
        let mut assets = world.resource_mut::<Assets<StandardMaterial>>();
        let handles: Vec<Handle<StandardMaterial>> = materials
            .iter()
            .zip(image_handles)
            .map(|(appearance, image)| assets.add(appearance.to_standard_material(image)))
            .collect();
        let tendon = assets.add(StandardMaterial {
            base_color: Color::srgb(0.2, 0.8, 0.8),
            ..Default::default()
        });
        (handles, tendon)
    };

    let root = world
        .spawn((
            SimSceneRoot,
            Name::new("simulation_root"),
            Transform::default(),
            Visibility::default(),
        ))
        .id();

    let mut body_entities: HashMap<usize, Entity> = HashMap::new();
    for (body_id, name) in &bodies {
        let entity = world
            .spawn((
                BodyIndex(*body_id),
                Name::new(name.clone()),
                Transform::default(),
                Visibility::default(),
            ))
            .id();
        body_entities.insert(*body_id, entity);
    }

    // Body 0 (or every body, when body 0 is absent) hangs off the root;
    // all other bodies hang off body 0's node.
    let anchor = body_entities.get(&0).copied();
    for (&body_id, &entity) in &body_entities {
        let parent = match anchor {
            Some(anchor_entity) if body_id != 0 => anchor_entity,
            _ => root,
        };
        world.entity_mut(entity).insert(ChildOf(parent));
    }

    for geom in &geoms {
        let parent = body_entities.get(&geom.body_id).copied().unwrap_or(root);
        let mut entity = world.spawn((
            GeomVisual {
                kind: geom.kind,
                from_mesh_data: geom.from_mesh_data,
            },
            VisGroup(geom.group),
            Mesh3d(mesh_handles[geom.mesh].clone()),
            MeshMaterial3d(material_handles[geom.material].clone()),
            Transform {
                translation: geom.translation,
                rotation: geom.rotation.unwrap_or(Quat::IDENTITY),
                scale: geom.scale,
            },
            Visibility::default(),
            ChildOf(parent),
        ));
        if !geom.cast_shadows {
            entity.insert(NotShadowCaster);
        }
        if !geom.receive_shadows {
            entity.insert(NotShadowReceiver);
        }
    }

    let mut segments = Vec::with_capacity(TENDON_POOL_CAPACITY);
    let mut joints = Vec::with_capacity(TENDON_POOL_CAPACITY);
    for slot in 0..TENDON_POOL_CAPACITY {
        segments.push(
            world
                .spawn((
                    TendonSegment(slot),
                    Mesh3d(unit_cylinder.clone()),
                    MeshMaterial3d(tendon_material.clone()),
                    Transform::default(),
                    Visibility::Hidden,
                    ChildOf(root),
                ))
                .id(),
        );
        joints.push(
            world
                .spawn((
                    TendonJoint(slot),
                    Mesh3d(unit_joint_sphere.clone()),
                    MeshMaterial3d(tendon_material.clone()),
                    Transform::default(),
                    Visibility::Hidden,
                    ChildOf(root),
                ))
                .id(),
        );
    }

    let light_anchor = anchor.unwrap_or(root);
    let mut light_entities = Vec::with_capacity(lights.len());
    for light in &lights {
        let mut entity = if light.directional {
            world.spawn((
                DirectionalLight {
                    illuminance: DEFAULT_ILLUMINANCE,
                    shadows_enabled: true,
                    ..Default::default()
                },
                Transform::default(),
                Visibility::default(),
            ))
        } else {
            world.spawn((
                SpotLight {
                    shadows_enabled: true,
                    ..Default::default()
                },
                Transform::default(),
                Visibility::default(),
            ))
        };
        match light.index {
            Some(i) => {
                entity.insert((LightIndex(i), ChildOf(light_anchor)));
            }
            None => {
                // Synthesized default light: fixed tilt, attached to the root.
                entity.insert((
                    Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.5, 0.5, 0.0)),
                    ChildOf(root),
                ));
            }
        }
        light_entities.push(entity.id());
    }

    SpawnedScene {
        root,
        bodies: body_entities,
        lights: light_entities,
        segments,
        joints,
    }
}
