//! Physics world
//!
//! A rapier2d simulation of circle bodies inside the scene's edge loop.
//! Category masks become collision and solver groups, the rotating field is
//! the pipeline gravity, wells are per-step forces and sticky attachments are
//! fixed joints. Begin-contacts come back from the collision event channel.
//!
//! Bodies are addressed by [`BodyId`] and iterated in id order so the
//! simulation stays deterministic.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyId, RadialField, category, field};
use super::collision::circle_circle_collision;
use crate::error::PhysicsError;

/// Longest single solver step; longer ticks are split
const MAX_STEP_DT: f32 = 1.0 / 60.0;
/// Solver length scale (scene units per "metre")
const LENGTH_UNIT: f32 = 20.0;
/// Thickness of the walls forming the edge loop
const EDGE_THICKNESS: f32 = 40.0;
/// Collider user data marking the edge loop
const EDGE_USER_DATA: u128 = 0;

/// Handle to a fixed joint
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JointId(pub u32);

/// Rigidly links `attached` to `anchor` at the point where they met
#[derive(Debug, Clone)]
pub struct FixedJoint {
    pub id: JointId,
    pub anchor: BodyId,
    pub attached: BodyId,
    /// World-space point both bodies are pinned at
    pub anchor_point: Vec2,
    handle: ImpulseJointHandle,
}

/// A pair of bodies that just started touching
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: BodyId,
    pub b: BodyId,
    pub point: Vec2,
}

impl Contact {
    /// The other body of the pair, if `id` is part of it
    pub fn other(&self, id: BodyId) -> Option<BodyId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }

    pub fn involves(&self, id: BodyId) -> bool {
        self.a == id || self.b == id
    }
}

struct BodyEntry {
    /// Configuration the body was inserted with, kept in sync by the setters
    desc: Body,
    handle: RigidBodyHandle,
}

/// Rigid-body simulation for one level
pub struct PhysicsWorld {
    /// Global field applied to gravity-affected bodies (units/s²)
    pub gravity: Vec2,
    /// Scene edge loop
    pub bounds_min: Vec2,
    pub bounds_max: Vec2,
    integration_params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    entries: BTreeMap<BodyId, BodyEntry>,
    fields: Vec<RadialField>,
    joints: BTreeMap<JointId, FixedJoint>,
    next_body_id: u32,
    next_joint_id: u32,
}

impl fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("gravity", &self.gravity)
            .field("bodies", &self.entries.len())
            .field("fields", &self.fields.len())
            .field("joints", &self.joints.len())
            .finish()
    }
}

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn groups(memberships: u32, filter: u32) -> InteractionGroups {
    InteractionGroups::new(
        Group::from_bits_truncate(memberships),
        Group::from_bits_truncate(filter),
    )
}

fn body_type(dynamic: bool) -> RigidBodyType {
    if dynamic {
        RigidBodyType::Dynamic
    } else {
        RigidBodyType::KinematicPositionBased
    }
}

impl PhysicsWorld {
    pub fn new(bounds_min: Vec2, bounds_max: Vec2) -> Self {
        let mut world = Self {
            gravity: Vec2::ZERO,
            bounds_min,
            bounds_max,
            integration_params: IntegrationParameters {
                length_unit: LENGTH_UNIT,
                ..IntegrationParameters::default()
            },
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            entries: BTreeMap::new(),
            fields: Vec::new(),
            joints: BTreeMap::new(),
            next_body_id: 1,
            next_joint_id: 1,
        };
        world.build_edges();
        world
    }

    /// Four fixed walls just outside the bounds
    fn build_edges(&mut self) {
        let (min, max) = (self.bounds_min, self.bounds_max);
        let center = (min + max) * 0.5;
        let half = (max - min) * 0.5;
        let t = EDGE_THICKNESS * 0.5;

        let walls = [
            (Vec2::new(min.x - t, center.y), Vec2::new(t, half.y + EDGE_THICKNESS)),
            (Vec2::new(max.x + t, center.y), Vec2::new(t, half.y + EDGE_THICKNESS)),
            (Vec2::new(center.x, min.y - t), Vec2::new(half.x + EDGE_THICKNESS, t)),
            (Vec2::new(center.x, max.y + t), Vec2::new(half.x + EDGE_THICKNESS, t)),
        ];

        let edge = self.rigid_body_set.insert(RigidBodyBuilder::fixed().build());
        for (pos, half_extents) in walls {
            let wall = ColliderBuilder::cuboid(half_extents.x, half_extents.y)
                .translation(to_vector(pos))
                .restitution(0.0)
                .restitution_combine_rule(CoefficientCombineRule::Max)
                .friction(0.0)
                .collision_groups(groups(category::EDGE, u32::MAX))
                .solver_groups(groups(category::EDGE, u32::MAX))
                .user_data(EDGE_USER_DATA)
                .build();
            self.collider_set
                .insert_with_parent(wall, edge, &mut self.rigid_body_set);
        }
    }

    /// Allocate an id for a body about to be inserted
    pub fn next_body_id(&mut self) -> BodyId {
        let id = BodyId(self.next_body_id);
        self.next_body_id += 1;
        id
    }

    /// Insert a body (ids come from [`Self::next_body_id`])
    pub fn insert(&mut self, body: Body) -> BodyId {
        let id = body.id;
        if self.entries.contains_key(&id) {
            self.remove(id);
        }

        let rb = RigidBodyBuilder::new(body_type(body.dynamic))
            .translation(to_vector(body.pos))
            .linvel(to_vector(body.vel))
            .additional_mass(body.mass)
            .gravity_scale(body.gravity_scale())
            .linear_damping(body.damping_coefficient())
            .lock_rotations()
            .user_data(id.0 as u128)
            .build();
        let handle = self.rigid_body_set.insert(rb);

        let solver_filter = if body.collision_mask == category::NONE {
            category::NONE
        } else {
            body.collision_mask | category::EDGE
        };
        let events = if body.contact_mask == category::NONE {
            ActiveEvents::empty()
        } else {
            ActiveEvents::COLLISION_EVENTS
        };
        // Bodies that never bounce off anything only report overlaps
        let collider = ColliderBuilder::ball(body.radius)
            .sensor(body.collision_mask == category::NONE)
            .density(0.0)
            .restitution(body.restitution)
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .friction(0.0)
            .collision_groups(groups(body.category, body.interaction_filter()))
            .solver_groups(groups(body.category, solver_filter))
            .active_events(events)
            .user_data(id.0 as u128)
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.entries.insert(id, BodyEntry { desc: body, handle });
        id
    }

    /// Snapshot of a body's configuration and current motion
    pub fn body(&self, id: BodyId) -> Option<Body> {
        let entry = self.entries.get(&id)?;
        let rb = self.rigid_body_set.get(entry.handle)?;
        let mut body = entry.desc.clone();
        body.pos = to_vec2(rb.translation());
        body.vel = to_vec2(rb.linvel());
        body.dynamic = rb.is_dynamic();
        Some(body)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Snapshots of every body in id order
    pub fn bodies(&self) -> impl Iterator<Item = Body> + '_ {
        self.entries.keys().filter_map(|&id| self.body(id))
    }

    pub fn body_count(&self) -> usize {
        self.entries.len()
    }

    fn rigid_body_mut(&mut self, id: BodyId) -> Result<(&mut Body, &mut RigidBody), PhysicsError> {
        let entry = self.entries.get_mut(&id).ok_or(PhysicsError::StaleBody(id))?;
        let rb = self
            .rigid_body_set
            .get_mut(entry.handle)
            .ok_or(PhysicsError::StaleBody(id))?;
        Ok((&mut entry.desc, rb))
    }

    /// Switch between dynamic and kinematic, keeping the current velocity
    pub fn set_dynamic(&mut self, id: BodyId, dynamic: bool) -> Result<(), PhysicsError> {
        let (desc, rb) = self.rigid_body_mut(id)?;
        desc.dynamic = dynamic;
        rb.set_body_type(body_type(dynamic), true);
        if !dynamic {
            let here = *rb.translation();
            rb.set_next_kinematic_translation(here);
        }
        Ok(())
    }

    /// Stop all motion and take the body out of force integration
    pub fn freeze(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        {
            let (_, rb) = self.rigid_body_mut(id)?;
            rb.set_linvel(Vector::zeros(), false);
            rb.reset_forces(false);
        }
        self.set_dynamic(id, false)
    }

    pub fn set_gravity_enabled(&mut self, id: BodyId, enabled: bool) -> Result<(), PhysicsError> {
        let (desc, rb) = self.rigid_body_mut(id)?;
        desc.affected_by_gravity = enabled;
        rb.set_gravity_scale(desc.gravity_scale(), true);
        Ok(())
    }

    pub fn set_mass(&mut self, id: BodyId, mass: f32) -> Result<(), PhysicsError> {
        let (desc, rb) = self.rigid_body_mut(id)?;
        desc.mass = mass;
        rb.set_additional_mass(mass, true);
        Ok(())
    }

    pub fn set_position(&mut self, id: BodyId, pos: Vec2) -> Result<(), PhysicsError> {
        let (_, rb) = self.rigid_body_mut(id)?;
        rb.set_translation(to_vector(pos), true);
        Ok(())
    }

    pub fn set_velocity(&mut self, id: BodyId, vel: Vec2) -> Result<(), PhysicsError> {
        let (_, rb) = self.rigid_body_mut(id)?;
        rb.set_linvel(to_vector(vel), true);
        Ok(())
    }

    /// Instantaneous velocity change of `impulse / mass` (ignored while not dynamic)
    pub fn apply_impulse(&mut self, id: BodyId, impulse: Vec2) -> Result<(), PhysicsError> {
        let (desc, rb) = self.rigid_body_mut(id)?;
        if rb.is_dynamic() && desc.mass > 0.0 {
            let vel = to_vec2(rb.linvel()) + impulse / desc.mass;
            rb.set_linvel(to_vector(vel), true);
        }
        Ok(())
    }

    /// Remove a body along with any joints and fields that reference it
    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        let snapshot = self.body(id)?;
        let entry = self.entries.remove(&id)?;
        self.rigid_body_set.remove(
            entry.handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        self.joints.retain(|_, j| j.anchor != id && j.attached != id);
        self.fields.retain(|f| f.anchor != id);
        Some(snapshot)
    }

    /// Remove everything, keeping bounds and gravity
    pub fn clear(&mut self) {
        self.island_manager = IslandManager::new();
        self.broad_phase = DefaultBroadPhase::new();
        self.narrow_phase = NarrowPhase::new();
        self.rigid_body_set = RigidBodySet::new();
        self.collider_set = ColliderSet::new();
        self.impulse_joint_set = ImpulseJointSet::new();
        self.multibody_joint_set = MultibodyJointSet::new();
        self.ccd_solver = CCDSolver::new();
        self.entries.clear();
        self.fields.clear();
        self.joints.clear();
        self.build_edges();
    }

    pub fn add_field(&mut self, field: RadialField) {
        self.fields.push(field);
    }

    pub fn fields(&self) -> &[RadialField] {
        &self.fields
    }

    /// Fuse `attached` to `anchor`, both pinned at `anchor_point` in their current placement
    pub fn create_fixed_joint(
        &mut self,
        anchor: BodyId,
        attached: BodyId,
        anchor_point: Vec2,
    ) -> Result<JointId, PhysicsError> {
        let anchor_handle = self
            .entries
            .get(&anchor)
            .ok_or(PhysicsError::StaleBody(anchor))?
            .handle;
        let attached_handle = self
            .entries
            .get(&attached)
            .ok_or(PhysicsError::StaleBody(attached))?
            .handle;
        let anchor_pose = *self
            .rigid_body_set
            .get(anchor_handle)
            .ok_or(PhysicsError::StaleBody(anchor))?
            .position();
        let attached_pose = *self
            .rigid_body_set
            .get(attached_handle)
            .ok_or(PhysicsError::StaleBody(attached))?
            .position();

        let pin = Isometry::<Real>::translation(anchor_point.x, anchor_point.y);
        let joint = FixedJointBuilder::new()
            .local_frame1(anchor_pose.inverse() * pin)
            .local_frame2(attached_pose.inverse() * pin)
            .contacts_enabled(false)
            .build();
        let handle = self
            .impulse_joint_set
            .insert(anchor_handle, attached_handle, joint, true);

        let id = JointId(self.next_joint_id);
        self.next_joint_id += 1;
        self.joints.insert(
            id,
            FixedJoint {
                id,
                anchor,
                attached,
                anchor_point,
                handle,
            },
        );
        Ok(id)
    }

    /// Break a joint; returns whether it existed
    pub fn remove_joint(&mut self, id: JointId) -> bool {
        match self.joints.remove(&id) {
            Some(joint) => {
                self.impulse_joint_set.remove(joint.handle, true);
                true
            }
            None => false,
        }
    }

    pub fn joint(&self, id: JointId) -> Option<&FixedJoint> {
        self.joints.get(&id)
    }

    /// Live world position of the attached end of a joint
    pub fn joint_position(&self, id: JointId) -> Option<Vec2> {
        let joint = self.joint(id)?;
        self.body(joint.attached).map(|b| b.pos)
    }

    /// Advance the simulation by `dt` seconds and return contacts that began during it
    pub fn step(&mut self, dt: f32) -> Vec<Contact> {
        if dt <= 0.0 {
            return Vec::new();
        }
        let substeps = (dt / MAX_STEP_DT).ceil().max(1.0) as u32;
        self.integration_params.dt = dt / substeps as f32;

        let mut contacts = Vec::new();
        for _ in 0..substeps {
            self.apply_fields();
            contacts.extend(self.step_once());
            self.clamp_speeds();
        }
        contacts
    }

    /// Replace last step's well forces with the pull at the current positions
    fn apply_fields(&mut self) {
        let wells: Vec<(RadialField, Vec2)> = self
            .fields
            .iter()
            .filter_map(|f| self.body(f.anchor).map(|b| (f.clone(), b.pos)))
            .collect();

        for (&id, entry) in &self.entries {
            let Some(rb) = self.rigid_body_set.get_mut(entry.handle) else {
                continue;
            };
            rb.reset_forces(false);
            if !rb.is_dynamic() || entry.desc.field_mask & field::GRAVITY_WELL == 0 {
                continue;
            }

            let pos = to_vec2(rb.translation());
            let accel: Vec2 = wells
                .iter()
                .filter(|(well, _)| well.anchor != id && well.mask & entry.desc.field_mask != 0)
                .map(|(well, center)| well.acceleration(*center, pos))
                .sum();
            if accel != Vec2::ZERO {
                rb.add_force(to_vector(accel * entry.desc.mass), true);
            }
        }
    }

    fn step_once(&mut self) -> Vec<Contact> {
        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &to_vector(self.gravity),
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &event_handler,
        );

        let mut contacts = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _) = event {
                if let Some(contact) = self.contact_between(h1, h2) {
                    contacts.push(contact);
                }
            }
        }
        // Channel order is not guaranteed
        contacts.sort_by_key(|c| (c.a.min(c.b), c.a.max(c.b)));
        contacts
    }

    /// Turn a collider pair into a reportable contact, lower id first
    fn contact_between(&self, h1: ColliderHandle, h2: ColliderHandle) -> Option<Contact> {
        let id_of = |handle: ColliderHandle| {
            let data = self.collider_set.get(handle)?.user_data;
            (data != EDGE_USER_DATA).then_some(BodyId(data as u32))
        };
        let (first, second) = (id_of(h1)?, id_of(h2)?);
        let (a, b) = if first < second {
            (self.body(first)?, self.body(second)?)
        } else {
            (self.body(second)?, self.body(first)?)
        };
        if !a.reports_contact_with(&b) {
            return None;
        }

        let hit = circle_circle_collision(a.pos, a.radius, b.pos, b.radius);
        let point = if hit.hit {
            hit.point
        } else {
            a.pos + (b.pos - a.pos).normalize_or_zero() * a.radius
        };
        Some(Contact {
            a: a.id,
            b: b.id,
            point,
        })
    }

    fn clamp_speeds(&mut self) {
        for entry in self.entries.values() {
            let Some(max) = entry.desc.max_speed else {
                continue;
            };
            let Some(rb) = self.rigid_body_set.get_mut(entry.handle) else {
                continue;
            };
            if !rb.is_dynamic() {
                continue;
            }
            let vel = to_vec2(rb.linvel());
            if vel.length_squared() > max * max {
                rb.set_linvel(to_vector(vel.clamp_length_max(max)), false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(Vec2::ZERO, Vec2::new(400.0, 800.0))
    }

    fn dynamic_ball(world: &mut PhysicsWorld, pos: Vec2) -> BodyId {
        let id = world.next_body_id();
        let mut body = Body::circle(id, pos, 10.0)
            .with_category(category::ROCKET, category::OBSTACLE, category::ASTRONAUT)
            .with_fields(field::GLOBAL_GRAVITY | field::GRAVITY_WELL)
            .with_max_speed(300.0);
        body.dynamic = true;
        body.affected_by_gravity = true;
        world.insert(body)
    }

    fn target(world: &mut PhysicsWorld, pos: Vec2) -> BodyId {
        let id = world.next_body_id();
        world.insert(Body::circle(id, pos, 24.0).with_category(
            category::ASTRONAUT,
            category::NONE,
            category::ROCKET,
        ))
    }

    fn rock(world: &mut PhysicsWorld, pos: Vec2, dynamic: bool) -> BodyId {
        let id = world.next_body_id();
        let mut body = Body::circle(id, pos, 20.0)
            .with_category(category::OBSTACLE, category::ROCKET | category::OBSTACLE, category::NONE)
            .with_max_speed(150.0);
        body.dynamic = dynamic;
        world.insert(body)
    }

    #[test]
    fn test_gravity_accelerates_dynamic_bodies_only() {
        let mut w = world();
        w.gravity = Vec2::new(0.0, -100.0);
        let ball = dynamic_ball(&mut w, Vec2::new(200.0, 400.0));
        let still = rock(&mut w, Vec2::new(100.0, 100.0), false);
        let drifting = rock(&mut w, Vec2::new(300.0, 600.0), true);

        w.step(0.5);
        assert!(w.body(ball).unwrap().vel.y < 0.0);
        assert_eq!(w.body(still).unwrap().pos, Vec2::new(100.0, 100.0));
        // Obstacles carry no gravity field
        assert_eq!(w.body(drifting).unwrap().vel, Vec2::ZERO);
    }

    #[test]
    fn test_speed_clamp_enforced_every_step() {
        let mut w = world();
        w.gravity = Vec2::new(0.0, 10_000.0);
        let ball = dynamic_ball(&mut w, Vec2::new(200.0, 100.0));
        w.step(0.2);
        assert!(w.body(ball).unwrap().vel.length() <= 300.0 + 1e-3);
    }

    #[test]
    fn test_contact_reported_once_per_touch() {
        let mut w = world();
        let ball = dynamic_ball(&mut w, Vec2::new(200.0, 380.0));
        let target = target(&mut w, Vec2::new(200.0, 400.0));

        let first = w.step(1.0 / 60.0);
        assert_eq!(first.len(), 1);
        assert!(first[0].involves(ball));
        assert_eq!(first[0].other(ball), Some(target));

        // Still overlapping: no new begin-contact, and no bounce either
        let second = w.step(1.0 / 60.0);
        assert!(second.is_empty());
        assert!((w.body(ball).unwrap().pos.x - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_unreported_pair_still_bounces() {
        let mut w = world();
        let ball = dynamic_ball(&mut w, Vec2::new(200.0, 300.0));
        w.set_velocity(ball, Vec2::new(0.0, 200.0)).unwrap();
        rock(&mut w, Vec2::new(200.0, 360.0), false);

        let mut contacts = Vec::new();
        for _ in 0..30 {
            contacts.extend(w.step(1.0 / 60.0));
        }
        assert!(contacts.is_empty());
        assert!(w.body(ball).unwrap().vel.y < 0.0);
    }

    #[test]
    fn test_well_pulls_only_field_bodies() {
        let mut w = world();
        let well = rock(&mut w, Vec2::new(200.0, 400.0), false);
        w.add_field(RadialField {
            anchor: well,
            strength: 200.0,
            radius: 150.0,
            mask: field::GRAVITY_WELL,
        });
        let ball = dynamic_ball(&mut w, Vec2::new(300.0, 400.0));
        let drifting = rock(&mut w, Vec2::new(100.0, 400.0), true);

        w.step(0.1);
        assert!(w.body(ball).unwrap().vel.x < 0.0);
        assert_eq!(w.body(drifting).unwrap().vel, Vec2::ZERO);
    }

    #[test]
    fn test_fixed_joint_drags_attached_body() {
        let mut w = world();
        let anchor = rock(&mut w, Vec2::new(100.0, 100.0), true);
        let attached = target(&mut w, Vec2::new(140.0, 100.0));
        w.set_dynamic(attached, true).unwrap();
        w.set_mass(attached, 0.001).unwrap();

        let joint = w
            .create_fixed_joint(anchor, attached, Vec2::new(120.0, 100.0))
            .unwrap();
        assert_eq!(w.joint(joint).unwrap().anchor_point, Vec2::new(120.0, 100.0));
        w.set_velocity(anchor, Vec2::new(60.0, 0.0)).unwrap();
        w.step(0.5);

        let anchor_pos = w.body(anchor).unwrap().pos;
        assert!(anchor_pos.x > 110.0);
        let attached_pos = w.joint_position(joint).unwrap();
        assert!((attached_pos - anchor_pos - Vec2::new(40.0, 0.0)).length() < 0.5);
    }

    #[test]
    fn test_joint_on_removed_body_fails() {
        let mut w = world();
        let anchor = dynamic_ball(&mut w, Vec2::new(100.0, 100.0));
        let attached = target(&mut w, Vec2::new(120.0, 100.0));
        w.remove(anchor);

        let err = w.create_fixed_joint(anchor, attached, Vec2::ZERO).unwrap_err();
        assert_eq!(err, PhysicsError::StaleBody(anchor));
        assert_eq!(w.freeze(anchor).unwrap_err(), PhysicsError::StaleBody(anchor));
    }

    #[test]
    fn test_removing_body_breaks_its_joint() {
        let mut w = world();
        let anchor = rock(&mut w, Vec2::new(100.0, 100.0), true);
        let attached = target(&mut w, Vec2::new(130.0, 100.0));
        let joint = w.create_fixed_joint(anchor, attached, Vec2::new(115.0, 100.0)).unwrap();
        w.remove(anchor);
        assert!(w.joint(joint).is_none());
        assert!(!w.remove_joint(joint));
    }

    #[test]
    fn test_edges_keep_bodies_inside() {
        let mut w = world();
        let ball = dynamic_ball(&mut w, Vec2::new(30.0, 400.0));
        w.set_velocity(ball, Vec2::new(-300.0, 0.0)).unwrap();
        for _ in 0..30 {
            w.step(1.0 / 60.0);
        }
        let body = w.body(ball).unwrap();
        assert!(body.pos.x >= body.radius - 1.0);
        assert!(body.vel.x > 0.0);
    }

    #[test]
    fn test_freeze_and_impulse() {
        let mut w = world();
        let ball = dynamic_ball(&mut w, Vec2::new(200.0, 400.0));
        w.freeze(ball).unwrap();
        w.apply_impulse(ball, Vec2::new(50.0, 0.0)).unwrap();
        let body = w.body(ball).unwrap();
        assert!(!body.dynamic);
        assert_eq!(body.vel, Vec2::ZERO);

        w.set_dynamic(ball, true).unwrap();
        w.set_mass(ball, 2.0).unwrap();
        w.apply_impulse(ball, Vec2::new(50.0, 0.0)).unwrap();
        assert!((w.body(ball).unwrap().vel.x - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_bodies_in_id_order() {
        let mut w = world();
        let a = w.next_body_id();
        let b = w.next_body_id();
        w.insert(Body::circle(b, Vec2::new(50.0, 50.0), 1.0));
        w.insert(Body::circle(a, Vec2::new(60.0, 60.0), 1.0));
        let ids: Vec<_> = w.bodies().map(|b| b.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_clear_keeps_edges() {
        let mut w = world();
        dynamic_ball(&mut w, Vec2::new(200.0, 400.0));
        w.clear();
        assert_eq!(w.body_count(), 0);

        let ball = dynamic_ball(&mut w, Vec2::new(30.0, 400.0));
        w.set_velocity(ball, Vec2::new(-300.0, 0.0)).unwrap();
        for _ in 0..30 {
            w.step(1.0 / 60.0);
        }
        assert!(w.body(ball).unwrap().vel.x > 0.0);
    }
}
