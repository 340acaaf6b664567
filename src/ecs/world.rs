use super::*;
use crate::events::{EventBus, SandboxEvent};
use crate::schema::{
    PropertySchema, ScaleAxis, DAMPING_KEY, FRICTION_KEY, LENGTH_KEY, MASS_KEY, NAME_KEY, RESTITUTION_KEY,
    STATIC_KEY, STIFFNESS_KEY,
};
use bevy_ecs::prelude::{Entity, With, World};
use glam::Vec2;

/// Opacity hint for parts pinned in place.
pub const STATIC_OPACITY: f32 = 0.5;

/// Everything needed to put a new body part into the world.
#[derive(Clone, Debug)]
pub struct BodySpawn {
    pub position: Vec2,
    pub shape: BodyShape,
    pub material: PartMaterial,
    pub display_name: String,
    pub schema: PropertySchema,
}

// ---------- World container ----------
pub struct SandboxWorld {
    pub world: World,
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self::new(
            WorldBounds { min: Vec2::ZERO, max: Vec2::new(1280.0, 720.0), thickness: 50.0 },
            PhysicsParams { gravity: Vec2::ZERO },
        )
    }
}

impl SandboxWorld {
    pub fn new(bounds: WorldBounds, params: PhysicsParams) -> Self {
        let mut world = World::new();
        world.insert_resource(bounds);
        world.insert_resource(params);
        let boundary_entity = world.spawn_empty().id();
        world.insert_resource(RapierState::new(&params, &bounds, boundary_entity));
        world.insert_resource(EventBus::default());
        world.insert_resource(SpawnSequence::default());
        Self { world }
    }

    fn emit(&mut self, event: SandboxEvent) {
        self.world.resource_mut::<EventBus>().push(event);
    }

    pub fn drain_events(&mut self) -> Vec<SandboxEvent> {
        self.world.resource_mut::<EventBus>().drain()
    }

    pub fn boundary_entity(&self) -> Entity {
        self.world.resource::<RapierState>().boundary_entity()
    }

    pub fn rapier(&self) -> &RapierState {
        self.world.resource::<RapierState>()
    }

    pub fn entity_exists(&self, entity: Entity) -> bool {
        self.world.entities().contains(entity)
    }

    pub fn spawn_body_part(&mut self, spawn: BodySpawn) -> Entity {
        let params = BodyParams {
            position: spawn.position,
            angle: 0.0,
            shape: spawn.shape,
            density: spawn.material.density,
            friction: spawn.material.friction,
            restitution: spawn.material.restitution,
            is_static: false,
        };
        let (body_handle, collider_handle) = {
            let mut rapier = self.world.resource_mut::<RapierState>();
            rapier.spawn_body(&params)
        };
        let order = self.world.resource_mut::<SpawnSequence>().issue();
        let entity = self
            .world
            .spawn((
                order,
                RapierBody { handle: body_handle },
                RapierCollider { handle: collider_handle },
                DisplayName(spawn.display_name),
                spawn.schema,
                spawn.shape.default_baselines(),
                spawn.material,
                RenderHints::default(),
                AttributeBag::default(),
            ))
            .id();
        {
            let mut rapier = self.world.resource_mut::<RapierState>();
            rapier.register_collider_entity(collider_handle, entity);
        }
        entity
    }

    /// Records which factory built `entity`. Untagged entities are never persisted.
    pub fn tag_provenance(&mut self, entity: Entity, part: &str) -> bool {
        if !self.entity_exists(entity) {
            return false;
        }
        self.world.entity_mut(entity).insert(Provenance(part.to_string()));
        self.emit(SandboxEvent::PartSpawned { entity, part: part.to_string() });
        true
    }

    pub fn provenance(&self, entity: Entity) -> Option<&str> {
        self.world.get::<Provenance>(entity).map(Provenance::as_str)
    }

    pub fn schema(&self, entity: Entity) -> Option<&PropertySchema> {
        self.world.get::<PropertySchema>(entity)
    }

    pub fn display_name(&self, entity: Entity) -> Option<&str> {
        self.world.get::<DisplayName>(entity).map(|name| name.0.as_str())
    }

    pub fn set_display_name(&mut self, entity: Entity, name: &str) -> bool {
        if let Some(mut display) = self.world.get_mut::<DisplayName>(entity) {
            display.0 = name.to_string();
            true
        } else if self.entity_exists(entity) {
            self.world.entity_mut(entity).insert(DisplayName(name.to_string()));
            true
        } else {
            false
        }
    }

    pub fn baselines(&self, entity: Entity) -> Option<ScaleBaselines> {
        self.world.get::<ScaleBaselines>(entity).copied()
    }

    pub fn render_hints(&self, entity: Entity) -> Option<RenderHints> {
        self.world.get::<RenderHints>(entity).copied()
    }

    pub fn set_highlight(&mut self, entity: Entity, highlight: Option<Highlight>) {
        if let Some(mut hints) = self.world.get_mut::<RenderHints>(entity) {
            hints.highlight = highlight;
        }
    }

    fn body_handle(&self, entity: Entity) -> Option<rapier2d::prelude::RigidBodyHandle> {
        self.world.get::<RapierBody>(entity).map(|b| b.handle)
    }

    fn collider_handle(&self, entity: Entity) -> Option<rapier2d::prelude::ColliderHandle> {
        self.world.get::<RapierCollider>(entity).map(|c| c.handle)
    }

    pub fn position(&self, entity: Entity) -> Option<Vec2> {
        let handle = self.body_handle(entity)?;
        let body = self.rapier().body(handle)?;
        Some(Vec2::new(body.translation().x, body.translation().y))
    }

    pub fn velocity(&self, entity: Entity) -> Option<Vec2> {
        let handle = self.body_handle(entity)?;
        let body = self.rapier().body(handle)?;
        Some(Vec2::new(body.linvel().x, body.linvel().y))
    }

    pub fn angle(&self, entity: Entity) -> Option<f32> {
        let handle = self.body_handle(entity)?;
        self.rapier().body(handle).map(|body| body.rotation().angle())
    }

    pub fn mass(&self, entity: Entity) -> Option<f32> {
        let handle = self.body_handle(entity)?;
        self.rapier().mass(handle)
    }

    pub fn is_static(&self, entity: Entity) -> bool {
        self.body_handle(entity).map(|handle| self.rapier().is_static(handle)).unwrap_or(false)
    }

    pub fn shape(&self, entity: Entity) -> Option<BodyShape> {
        let handle = self.collider_handle(entity)?;
        self.rapier().shape_extents(handle)
    }

    pub fn set_translation(&mut self, entity: Entity, translation: Vec2) -> bool {
        let Some(handle) = self.body_handle(entity) else {
            return false;
        };
        self.world.resource_mut::<RapierState>().set_translation(handle, translation)
    }

    pub fn set_angle(&mut self, entity: Entity, angle: f32) -> bool {
        let Some(handle) = self.body_handle(entity) else {
            return false;
        };
        self.world.resource_mut::<RapierState>().set_angle(handle, angle)
    }

    pub fn set_velocity(&mut self, entity: Entity, velocity: Vec2) -> bool {
        let Some(handle) = self.body_handle(entity) else {
            return false;
        };
        self.world.resource_mut::<RapierState>().set_linvel(handle, velocity)
    }

    /// Overrides the density-derived mass. Non-positive masses are refused.
    pub fn set_mass(&mut self, entity: Entity, mass: f32) -> bool {
        if !(mass.is_finite() && mass > 0.0) {
            return false;
        }
        let (Some(body), Some(collider)) = (self.body_handle(entity), self.collider_handle(entity)) else {
            return false;
        };
        self.world.resource_mut::<RapierState>().set_mass(body, collider, mass)
    }

    /// Sets the engine static flag together with the matching opacity hint.
    pub fn set_static(&mut self, entity: Entity, is_static: bool) -> bool {
        let Some(handle) = self.body_handle(entity) else {
            return false;
        };
        if !self.world.resource_mut::<RapierState>().set_static(handle, is_static) {
            return false;
        }
        if let Some(mut hints) = self.world.get_mut::<RenderHints>(entity) {
            hints.opacity = if is_static { STATIC_OPACITY } else { 1.0 };
        }
        true
    }

    pub fn set_friction(&mut self, entity: Entity, friction: f32) -> bool {
        self.update_material(entity, |material| material.friction = friction.max(0.0))
    }

    pub fn set_restitution(&mut self, entity: Entity, restitution: f32) -> bool {
        self.update_material(entity, |material| material.restitution = restitution.max(0.0))
    }

    fn update_material(&mut self, entity: Entity, edit: impl FnOnce(&mut PartMaterial)) -> bool {
        let Some(collider) = self.collider_handle(entity) else {
            return false;
        };
        let material = {
            let Some(mut material) = self.world.get_mut::<PartMaterial>(entity) else {
                return false;
            };
            edit(&mut *material);
            *material
        };
        self.world.resource_mut::<RapierState>().set_material(collider, material.friction, material.restitution)
    }

    pub fn apply_impulse(&mut self, entity: Entity, impulse: Vec2) -> bool {
        let Some(handle) = self.body_handle(entity) else {
            return false;
        };
        let applied = self.world.resource_mut::<RapierState>().apply_impulse(handle, impulse);
        if applied {
            self.emit(SandboxEvent::ImpulseApplied { entity, impulse });
        }
        applied
    }

    pub(crate) fn write_baseline(&mut self, entity: Entity, axis: ScaleAxis, value: f32) {
        if let Some(mut baselines) = self.world.get_mut::<ScaleBaselines>(entity) {
            baselines.set(axis, value);
        } else if self.entity_exists(entity) {
            let mut baselines = ScaleBaselines::default();
            baselines.set(axis, value);
            self.world.entity_mut(entity).insert(baselines);
        }
    }

    pub(crate) fn scale_body(&mut self, entity: Entity, sx: f32, sy: f32) -> bool {
        let (Some(body), Some(collider)) = (self.body_handle(entity), self.collider_handle(entity)) else {
            return false;
        };
        let density = self.world.get::<PartMaterial>(entity).map(|m| m.density).unwrap_or_default();
        self.world.resource_mut::<RapierState>().scale_collider(body, collider, sx, sy, density)
    }

    /// Numeric value currently backing `key`, engine state first, then the attribute bag.
    pub fn number_attribute(&self, entity: Entity, key: &str) -> Option<f32> {
        if let Some(connection) = self.world.get::<Connection>(entity) {
            match key {
                STIFFNESS_KEY => return Some(connection.params.stiffness),
                LENGTH_KEY => return Some(connection.params.length),
                DAMPING_KEY => return Some(connection.params.damping),
                _ => {}
            }
        }
        match key {
            MASS_KEY => return self.mass(entity),
            FRICTION_KEY => return self.world.get::<PartMaterial>(entity).map(|m| m.friction),
            RESTITUTION_KEY => return self.world.get::<PartMaterial>(entity).map(|m| m.restitution),
            _ => {}
        }
        if let Some(axis) = self.schema(entity).and_then(|s| s.get(key)).and_then(|e| e.descriptor.scale_axis()) {
            return self.baselines(entity).map(|b| b.get_or_nominal(axis));
        }
        match self.world.get::<AttributeBag>(entity)?.0.get(key)? {
            AttributeValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn text_attribute(&self, entity: Entity, key: &str) -> Option<String> {
        if key == NAME_KEY {
            return self.display_name(entity).map(str::to_string);
        }
        match self.world.get::<AttributeBag>(entity)?.0.get(key)? {
            AttributeValue::Text(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn flag_attribute(&self, entity: Entity, key: &str) -> Option<bool> {
        if key == STATIC_KEY {
            return self.body_handle(entity).map(|handle| self.rapier().is_static(handle));
        }
        match self.world.get::<AttributeBag>(entity)?.0.get(key)? {
            AttributeValue::Flag(value) => Some(*value),
            _ => None,
        }
    }

    pub fn set_bag_value(&mut self, entity: Entity, key: &str, value: AttributeValue) -> bool {
        if let Some(mut bag) = self.world.get_mut::<AttributeBag>(entity) {
            bag.0.insert(key.to_string(), value);
            true
        } else if self.entity_exists(entity) {
            let mut bag = AttributeBag::default();
            bag.0.insert(key.to_string(), value);
            self.world.entity_mut(entity).insert(bag);
            true
        } else {
            false
        }
    }

    /// Entities that carry provenance, in spawn order.
    pub fn part_entities(&mut self) -> Vec<Entity> {
        let mut query =
            self.world.query_filtered::<(Entity, &SpawnOrder), (With<Provenance>, With<RapierBody>)>();
        let mut entities: Vec<(Entity, SpawnOrder)> =
            query.iter(&self.world).map(|(entity, order)| (entity, *order)).collect();
        entities.sort_by_key(|(_, order)| *order);
        entities.into_iter().map(|(entity, _)| entity).collect()
    }

    pub fn entity_info(&self, entity: Entity) -> Option<EntityInfo> {
        let handle = self.body_handle(entity)?;
        let rapier = self.rapier();
        let body = rapier.body(handle)?;
        Some(EntityInfo {
            provenance: self.provenance(entity).map(str::to_string),
            display_name: self.display_name(entity).map(str::to_string),
            position: Vec2::new(body.translation().x, body.translation().y),
            velocity: Vec2::new(body.linvel().x, body.linvel().y),
            angle: body.rotation().angle(),
            mass: body.mass(),
            is_static: body.is_fixed(),
            baselines: self.baselines(entity).unwrap_or_default(),
        })
    }

    /// Most recently spawned part under `point`. The walls only win when nothing else is hit.
    pub fn pick_entity(&self, point: Vec2) -> Option<Entity> {
        let boundary = self.boundary_entity();
        let hits = self.rapier().hits(point);
        hits.iter()
            .copied()
            .filter(|entity| *entity != boundary)
            .filter_map(|entity| self.world.get::<SpawnOrder>(entity).map(|order| (*order, entity)))
            .max_by_key(|(order, _)| *order)
            .map(|(_, entity)| entity)
            .or_else(|| hits.contains(&boundary).then_some(boundary))
    }

    pub fn spawn_connection(
        &mut self,
        tool: &str,
        first: Entity,
        second: ConnectionEnd,
        params: SpringParams,
        schema: PropertySchema,
    ) -> Option<Entity> {
        let first_body = self.body_handle(first)?;
        let second_body = match second {
            ConnectionEnd::Entity(entity) if entity == first => return None,
            ConnectionEnd::Entity(entity) => Some(self.body_handle(entity)?),
            ConnectionEnd::Anchor(_) => None,
        };
        let (joint, anchor_body) = {
            let mut rapier = self.world.resource_mut::<RapierState>();
            let (target, anchor) = match (second_body, second) {
                (Some(handle), _) => (handle, None),
                (None, ConnectionEnd::Anchor(point)) => {
                    let anchor = rapier.insert_anchor(point);
                    (anchor, Some(anchor))
                }
                (None, ConnectionEnd::Entity(_)) => return None,
            };
            (rapier.insert_spring(first_body, target, &params), anchor)
        };
        let connection = Connection { tool: tool.to_string(), first, second, params, joint, anchor_body };
        let order = self.world.resource_mut::<SpawnSequence>().issue();
        let entity = self.world.spawn((order, connection, schema, AttributeBag::default())).id();
        let second_entity = match second {
            ConnectionEnd::Entity(entity) => Some(entity),
            ConnectionEnd::Anchor(_) => None,
        };
        self.emit(SandboxEvent::connection_created(entity, first, second_entity));
        Some(entity)
    }

    pub fn connection(&self, entity: Entity) -> Option<&Connection> {
        self.world.get::<Connection>(entity)
    }

    pub fn connections(&mut self) -> Vec<(Entity, Connection)> {
        let mut query = self.world.query::<(Entity, &SpawnOrder, &Connection)>();
        let mut connections: Vec<(SpawnOrder, Entity, Connection)> = query
            .iter(&self.world)
            .map(|(entity, order, connection)| (*order, entity, connection.clone()))
            .collect();
        connections.sort_by_key(|(order, _, _)| *order);
        connections.into_iter().map(|(_, entity, connection)| (entity, connection)).collect()
    }

    /// Rebuilds the joint with new spring parameters.
    pub fn set_connection_params(&mut self, entity: Entity, params: SpringParams) -> bool {
        let Some(connection) = self.world.get::<Connection>(entity).cloned() else {
            return false;
        };
        let Some(first_body) = self.body_handle(connection.first) else {
            return false;
        };
        let second_body = match (connection.second, connection.anchor_body) {
            (_, Some(anchor)) => anchor,
            (ConnectionEnd::Entity(other), None) => match self.body_handle(other) {
                Some(handle) => handle,
                None => return false,
            },
            (ConnectionEnd::Anchor(_), None) => return false,
        };
        let joint = {
            let mut rapier = self.world.resource_mut::<RapierState>();
            rapier.remove_joint(connection.joint);
            rapier.insert_spring(first_body, second_body, &params)
        };
        if let Some(mut stored) = self.world.get_mut::<Connection>(entity) {
            stored.params = params;
            stored.joint = joint;
        }
        true
    }

    pub fn remove_connection(&mut self, entity: Entity) -> bool {
        let Some(connection) = self.world.get::<Connection>(entity).cloned() else {
            return false;
        };
        {
            let mut rapier = self.world.resource_mut::<RapierState>();
            rapier.remove_joint(connection.joint);
            if let Some(anchor) = connection.anchor_body {
                rapier.remove_body(anchor);
            }
        }
        let _ = self.world.despawn(entity);
        self.emit(SandboxEvent::ConnectionRemoved { entity });
        true
    }

    /// Removes a part and every connection attached to it.
    pub fn despawn_part(&mut self, entity: Entity) -> bool {
        if entity == self.boundary_entity() || !self.entity_exists(entity) {
            return false;
        }
        if self.world.get::<Connection>(entity).is_some() {
            return self.remove_connection(entity);
        }
        let attached: Vec<Entity> = self
            .connections()
            .into_iter()
            .filter(|(_, connection)| connection.involves(entity))
            .map(|(connection_entity, _)| connection_entity)
            .collect();
        for connection in attached {
            self.remove_connection(connection);
        }
        if let Some(handle) = self.body_handle(entity) {
            self.world.resource_mut::<RapierState>().remove_body(handle);
        }
        let removed = self.world.despawn(entity);
        if removed {
            self.emit(SandboxEvent::PartDespawned { entity });
        }
        removed
    }

    /// Removes every part and connection, keeping the boundary walls.
    pub fn clear_parts(&mut self) -> usize {
        let connections: Vec<Entity> = self.connections().into_iter().map(|(entity, _)| entity).collect();
        for connection in connections {
            self.remove_connection(connection);
        }
        let mut query = self.world.query_filtered::<Entity, With<RapierBody>>();
        let bodies: Vec<Entity> = query.iter(&self.world).collect();
        let mut removed = 0;
        for entity in bodies {
            if let Some(handle) = self.body_handle(entity) {
                self.world.resource_mut::<RapierState>().remove_body(handle);
            }
            if self.world.despawn(entity) {
                removed += 1;
            }
        }
        self.emit(SandboxEvent::SceneCleared { removed });
        removed
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.world.resource_mut::<PhysicsParams>().gravity = gravity;
        self.world.resource_mut::<RapierState>().set_gravity(gravity);
    }

    pub fn gravity(&self) -> Vec2 {
        self.rapier().gravity()
    }

    pub fn step(&mut self, dt: f32) {
        self.world.resource_mut::<RapierState>().step(dt);
    }

    pub fn joint_count(&self) -> usize {
        self.rapier().joint_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PropertySchema;

    fn spawn_box(world: &mut SandboxWorld, position: Vec2) -> Entity {
        world.spawn_body_part(BodySpawn {
            position,
            shape: BodyShape::Rectangle { width: 80.0, height: 80.0 },
            material: PartMaterial::default(),
            display_name: "Box 1".to_string(),
            schema: PropertySchema::new(),
        })
    }

    #[test]
    fn density_mass_matches_area() {
        let mut world = SandboxWorld::default();
        let entity = spawn_box(&mut world, Vec2::new(400.0, 100.0));
        let mass = world.mass(entity).expect("mass");
        assert!((mass - 6.4).abs() < 1e-3, "mass {mass}");
    }

    #[test]
    fn static_toggle_sets_opacity() {
        let mut world = SandboxWorld::default();
        let entity = spawn_box(&mut world, Vec2::new(200.0, 200.0));
        assert!(world.set_static(entity, true));
        assert!(world.is_static(entity));
        assert_eq!(world.render_hints(entity).map(|h| h.opacity), Some(STATIC_OPACITY));
        assert!(world.set_static(entity, false));
        assert_eq!(world.render_hints(entity).map(|h| h.opacity), Some(1.0));
    }

    #[test]
    fn pick_prefers_parts_and_falls_back_to_nothing() {
        let mut world = SandboxWorld::default();
        let entity = spawn_box(&mut world, Vec2::new(300.0, 300.0));
        assert_eq!(world.pick_entity(Vec2::new(310.0, 290.0)), Some(entity));
        assert_eq!(world.pick_entity(Vec2::new(600.0, 600.0)), None);
        assert_eq!(world.pick_entity(Vec2::new(640.0, -20.0)), Some(world.boundary_entity()));
    }

    #[test]
    fn despawn_part_drops_attached_connections() {
        let mut world = SandboxWorld::default();
        let a = spawn_box(&mut world, Vec2::new(100.0, 100.0));
        let b = spawn_box(&mut world, Vec2::new(300.0, 100.0));
        let params = SpringParams { stiffness: 0.5, length: 150.0, damping: 0.1 };
        world
            .spawn_connection("Rope", a, ConnectionEnd::Entity(b), params, PropertySchema::new())
            .expect("connection");
        assert_eq!(world.joint_count(), 1);
        assert!(world.despawn_part(b));
        assert!(world.connections().is_empty());
        assert_eq!(world.joint_count(), 0);
    }
}
