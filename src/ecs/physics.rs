use super::types::{BodyShape, SpringParams};
use bevy_ecs::prelude::*;
use glam::Vec2;
use rapier2d::prelude::{
    CCDSolver, ColliderBuilder, ColliderHandle, ColliderSet, DefaultBroadPhase, ImpulseJointHandle,
    ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, Point,
    Real, RigidBody, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, RigidBodyType, Rotation, SharedShape,
    SpringJointBuilder, Vector,
};
use std::collections::HashMap;

/// Spring stiffness per unit of the 0..1 editor stiffness.
pub const SPRING_STIFFNESS_SCALE: f32 = 40.0;

#[derive(Resource, Clone, Copy)]
pub struct PhysicsParams {
    pub gravity: Vec2,
}

#[derive(Resource, Clone, Copy)]
pub struct WorldBounds {
    pub min: Vec2,
    pub max: Vec2,
    pub thickness: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct BodyParams {
    pub position: Vec2,
    pub angle: f32,
    pub shape: BodyShape,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub is_static: bool,
}

#[derive(Resource)]
pub struct RapierState {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    collider_entities: HashMap<ColliderHandle, Entity>,
    boundary_entity: Entity,
    bounds: WorldBounds,
}

impl RapierState {
    pub fn new(params: &PhysicsParams, bounds: &WorldBounds, boundary_entity: Entity) -> Self {
        let mut state = Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vec_to_rapier(params.gravity),
            integration_parameters: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collider_entities: HashMap::new(),
            boundary_entity,
            bounds: *bounds,
        };
        state.init_bounds();
        state
    }

    // Walls sit just outside the viewport and map to the shared boundary entity.
    fn init_bounds(&mut self) {
        let thickness = self.bounds.thickness;
        let min = self.bounds.min;
        let max = self.bounds.max;
        let center = (min + max) * 0.5;
        let horizontal_half = Vector::new((max.x - min.x) * 0.5 + thickness, thickness);
        let vertical_half = Vector::new(thickness, (max.y - min.y) * 0.5 + thickness);

        let centers = [
            Vector::new(center.x, min.y - thickness),
            Vector::new(center.x, max.y + thickness),
            Vector::new(min.x - thickness, center.y),
            Vector::new(max.x + thickness, center.y),
        ];
        let half_extents = [horizontal_half, horizontal_half, vertical_half, vertical_half];

        for (center, half) in centers.into_iter().zip(half_extents) {
            self.insert_static_collider(center, half);
        }
    }

    fn insert_static_collider(&mut self, center: Vector<Real>, half: Vector<Real>) {
        let body = RigidBodyBuilder::fixed().translation(center).build();
        let body_handle = self.bodies.insert(body);
        let collider = ColliderBuilder::cuboid(half.x, half.y).restitution(0.4).friction(0.8).build();
        let handle = self.colliders.insert_with_parent(collider, body_handle, &mut self.bodies);
        self.collider_entities.insert(handle, self.boundary_entity);
    }

    pub fn spawn_body(&mut self, params: &BodyParams) -> (RigidBodyHandle, ColliderHandle) {
        let builder = if params.is_static { RigidBodyBuilder::fixed() } else { RigidBodyBuilder::dynamic() };
        let body = builder
            .translation(Vector::new(params.position.x, params.position.y))
            .rotation(params.angle)
            .build();
        let body_handle = self.bodies.insert(body);
        let collider = match params.shape {
            BodyShape::Rectangle { width, height } => ColliderBuilder::cuboid(width * 0.5, height * 0.5),
            BodyShape::Circle { radius } => ColliderBuilder::ball(radius),
        }
        .density(params.density)
        .friction(params.friction)
        .restitution(params.restitution)
        .build();
        let collider_handle = self.colliders.insert_with_parent(collider, body_handle, &mut self.bodies);
        self.recompute_mass(body_handle);
        (body_handle, collider_handle)
    }

    /// Relative scale of a collider. Mass goes back to being derived from density and the new area.
    pub fn scale_collider(
        &mut self,
        body: RigidBodyHandle,
        collider: ColliderHandle,
        sx: f32,
        sy: f32,
        density: f32,
    ) -> bool {
        let Some(target) = self.colliders.get_mut(collider) else {
            return false;
        };
        let scaled = if let Some(cuboid) = target.shape().as_cuboid() {
            SharedShape::cuboid(cuboid.half_extents.x * sx, cuboid.half_extents.y * sy)
        } else if let Some(ball) = target.shape().as_ball() {
            SharedShape::ball(ball.radius * sx)
        } else {
            return false;
        };
        target.set_shape(scaled);
        target.set_density(density);
        self.recompute_mass(body);
        true
    }

    pub fn shape_extents(&self, collider: ColliderHandle) -> Option<BodyShape> {
        let shape = self.colliders.get(collider)?.shape();
        if let Some(cuboid) = shape.as_cuboid() {
            Some(BodyShape::Rectangle {
                width: cuboid.half_extents.x * 2.0,
                height: cuboid.half_extents.y * 2.0,
            })
        } else {
            shape.as_ball().map(|ball| BodyShape::Circle { radius: ball.radius })
        }
    }

    pub fn set_mass(&mut self, body: RigidBodyHandle, collider: ColliderHandle, mass: f32) -> bool {
        match self.colliders.get_mut(collider) {
            Some(target) => target.set_mass(mass),
            None => return false,
        }
        self.recompute_mass(body)
    }

    fn recompute_mass(&mut self, handle: RigidBodyHandle) -> bool {
        match self.bodies.get_mut(handle) {
            Some(body) => {
                body.recompute_mass_properties_from_colliders(&self.colliders);
                true
            }
            None => false,
        }
    }

    pub fn mass(&self, handle: RigidBodyHandle) -> Option<f32> {
        self.bodies.get(handle).map(|body| body.mass())
    }

    pub fn set_material(&mut self, collider: ColliderHandle, friction: f32, restitution: f32) -> bool {
        if let Some(target) = self.colliders.get_mut(collider) {
            target.set_friction(friction);
            target.set_restitution(restitution);
            true
        } else {
            false
        }
    }

    pub fn set_static(&mut self, handle: RigidBodyHandle, is_static: bool) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };
        let body_type = if is_static { RigidBodyType::Fixed } else { RigidBodyType::Dynamic };
        body.set_body_type(body_type, true);
        if !is_static {
            body.wake_up(true);
        }
        true
    }

    pub fn is_static(&self, handle: RigidBodyHandle) -> bool {
        self.bodies.get(handle).map(|body| body.is_fixed()).unwrap_or(false)
    }

    pub fn set_translation(&mut self, handle: RigidBodyHandle, translation: Vec2) -> bool {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_translation(vec_to_rapier(translation), true);
            true
        } else {
            false
        }
    }

    pub fn set_angle(&mut self, handle: RigidBodyHandle, angle: f32) -> bool {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_rotation(Rotation::new(angle), true);
            true
        } else {
            false
        }
    }

    pub fn set_linvel(&mut self, handle: RigidBodyHandle, velocity: Vec2) -> bool {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_linvel(vec_to_rapier(velocity), true);
            true
        } else {
            false
        }
    }

    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec2) -> bool {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.apply_impulse(vec_to_rapier(impulse), true);
            true
        } else {
            false
        }
    }

    pub fn insert_anchor(&mut self, point: Vec2) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed().translation(vec_to_rapier(point)).build();
        self.bodies.insert(body)
    }

    pub fn insert_spring(
        &mut self,
        first: RigidBodyHandle,
        second: RigidBodyHandle,
        params: &SpringParams,
    ) -> ImpulseJointHandle {
        let joint =
            SpringJointBuilder::new(params.length, params.stiffness * SPRING_STIFFNESS_SCALE, params.damping)
                .build();
        self.impulse_joints.insert(first, second, joint, true)
    }

    pub fn remove_joint(&mut self, handle: ImpulseJointHandle) {
        let _ = self.impulse_joints.remove(handle, true);
    }

    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }

    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        let collider_handles: Vec<ColliderHandle> = self
            .bodies
            .get(handle)
            .map(|body| body.colliders().iter().copied().collect())
            .unwrap_or_default();
        for collider in collider_handles {
            self.collider_entities.remove(&collider);
        }
        let _ = self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = vec_to_rapier(gravity);
    }

    pub fn gravity(&self) -> Vec2 {
        Vec2::new(self.gravity.x, self.gravity.y)
    }

    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        let hooks = ();
        let events = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &hooks,
            &events,
        );
    }

    /// Entities whose collider contains `point`, boundary included.
    pub fn hits(&self, point: Vec2) -> Vec<Entity> {
        let point = Point::new(point.x, point.y);
        let mut hits = Vec::new();
        for (handle, collider) in self.colliders.iter() {
            // Collider poses only sync on step; derive from the parent so teleports are pickable at once.
            let position = match (collider.parent().and_then(|parent| self.bodies.get(parent)), collider.position_wrt_parent())
            {
                (Some(body), Some(relative)) => body.position() * relative,
                _ => *collider.position(),
            };
            if !collider.shape().contains_point(&position, &point) {
                continue;
            }
            if let Some(entity) = self.collider_entities.get(&handle).copied() {
                if !hits.contains(&entity) {
                    hits.push(entity);
                }
            }
        }
        hits
    }

    pub fn register_collider_entity(&mut self, collider: ColliderHandle, entity: Entity) {
        self.collider_entities.insert(collider, entity);
    }

    pub fn boundary_entity(&self) -> Entity {
        self.boundary_entity
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

}

fn vec_to_rapier(v: Vec2) -> Vector<Real> {
    Vector::new(v.x, v.y)
}
