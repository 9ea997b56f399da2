//! Rigid circle bodies and collision categories
//!
//! Every body in the level is a circle. Interaction is filtered by bitmasks:
//! - `category`: what the body is
//! - `collision_mask`: categories it physically bounces off
//! - `contact_mask`: categories whose touch is reported to the contact resolver
//! - `field_mask`: which force fields may act on it
//!
//! A pair only interacts when each side's masks admit the other's category.
//! [`Body`] is both the description handed to [`super::PhysicsWorld::insert`]
//! and the snapshot returned by [`super::PhysicsWorld::body`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Collision category bits
pub mod category {
    pub const NONE: u32 = 0;
    pub const ROCKET: u32 = 1 << 0;
    pub const ASTRONAUT: u32 = 1 << 1;
    /// Every obstacle carries this bit
    pub const OBSTACLE: u32 = 1 << 2;
    /// Normal obstacles only; the rocket reports touching these
    pub const NORMAL_OBSTACLE: u32 = 1 << 3;
    /// Sticky obstacles only; the astronaut reports touching these
    pub const STICKY_OBSTACLE: u32 = 1 << 4;
    /// The scene edge loop
    pub const EDGE: u32 = 1 << 5;
}

/// Force field bits
pub mod field {
    pub const NONE: u32 = 0;
    /// The rotating global gravity
    pub const GLOBAL_GRAVITY: u32 = 1 << 0;
    /// Radial pull of gravity wells
    pub const GRAVITY_WELL: u32 = 1 << 1;
}

/// Stable handle to a body in a [`super::PhysicsWorld`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// A circular rigid body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub mass: f32,
    /// Bounciness used in collision response
    pub restitution: f32,
    /// Fraction of velocity kept per second (1.0 = no damping)
    pub linear_damping: f32,
    /// Dynamic bodies integrate forces; kinematic ones only collide
    pub dynamic: bool,
    /// Whether the global field acts on this body
    pub affected_by_gravity: bool,
    pub category: u32,
    pub collision_mask: u32,
    pub contact_mask: u32,
    pub field_mask: u32,
    /// Speed clamp applied after every step
    pub max_speed: Option<f32>,
}

impl Body {
    /// A kinematic circle with no interactions; configure with the builder methods
    pub fn circle(id: BodyId, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius,
            mass: 1.0,
            restitution: 0.5,
            linear_damping: 1.0,
            dynamic: false,
            affected_by_gravity: false,
            category: category::NONE,
            collision_mask: category::NONE,
            contact_mask: category::NONE,
            field_mask: field::NONE,
            max_speed: None,
        }
    }

    pub fn with_category(mut self, category: u32, collision_mask: u32, contact_mask: u32) -> Self {
        self.category = category;
        self.collision_mask = collision_mask;
        self.contact_mask = contact_mask;
        self
    }

    pub fn with_fields(mut self, field_mask: u32) -> Self {
        self.field_mask = field_mask;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_damping(mut self, linear_damping: f32) -> Self {
        self.linear_damping = linear_damping;
        self
    }

    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = Some(max_speed);
        self
    }

    /// Whether the two bodies physically bounce off each other
    pub fn collides_with(&self, other: &Body) -> bool {
        self.collision_mask & other.category != 0 && other.collision_mask & self.category != 0
    }

    /// Whether touching should be reported to the contact resolver
    ///
    /// Either side asking is enough, as long as the pair interacts at all.
    pub fn reports_contact_with(&self, other: &Body) -> bool {
        let interacts = self.interaction_filter() & other.category != 0
            && other.interaction_filter() & self.category != 0;
        interacts
            && (self.contact_mask & other.category != 0 || other.contact_mask & self.category != 0)
    }

    /// Every category this body interacts with in any way
    pub fn interaction_filter(&self) -> u32 {
        let mut filter = self.collision_mask | self.contact_mask;
        if self.collision_mask != category::NONE {
            filter |= category::EDGE;
        }
        filter
    }

    /// Global gravity scale for the solver
    pub fn gravity_scale(&self) -> f32 {
        if self.affected_by_gravity && self.field_mask & field::GLOBAL_GRAVITY != 0 {
            1.0
        } else {
            0.0
        }
    }

    /// Damping coefficient equivalent to keeping `linear_damping` of the velocity per second
    pub fn damping_coefficient(&self) -> f32 {
        if self.linear_damping >= 1.0 {
            0.0
        } else {
            -self.linear_damping.max(1e-3).ln()
        }
    }
}

/// A radial attractor (gravity well)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadialField {
    /// Body the field is centred on
    pub anchor: BodyId,
    /// Acceleration at the centre (units/s²)
    pub strength: f32,
    /// Beyond this distance the field has no effect
    pub radius: f32,
    /// Bodies whose `field_mask` intersects this are pulled
    pub mask: u32,
}

impl RadialField {
    /// Acceleration on a body at `pos`, given the field centre
    pub fn acceleration(&self, center: Vec2, pos: Vec2) -> Vec2 {
        let to_center = center - pos;
        let dist = to_center.length();
        if dist >= self.radius || dist < 1.0 {
            return Vec2::ZERO;
        }
        // Linear falloff to zero at the edge
        let falloff = 1.0 - dist / self.radius;
        to_center / dist * self.strength * falloff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rocket() -> Body {
        Body::circle(BodyId(1), Vec2::ZERO, 10.0).with_category(
            category::ROCKET,
            category::OBSTACLE,
            category::ASTRONAUT | category::NORMAL_OBSTACLE,
        )
    }

    fn astronaut() -> Body {
        Body::circle(BodyId(2), Vec2::ZERO, 10.0).with_category(
            category::ASTRONAUT,
            category::NONE,
            category::ROCKET | category::STICKY_OBSTACLE,
        )
    }

    fn obstacle(kind_bit: u32, contact: u32) -> Body {
        Body::circle(BodyId(3), Vec2::ZERO, 10.0).with_category(
            category::OBSTACLE | kind_bit,
            category::ROCKET | category::OBSTACLE,
            contact,
        )
    }

    #[test]
    fn test_mask_pairs() {
        let normal = obstacle(category::NORMAL_OBSTACLE, category::ROCKET);
        let sticky = obstacle(category::STICKY_OBSTACLE, category::ASTRONAUT);

        assert!(!rocket().collides_with(&astronaut()));
        assert!(rocket().reports_contact_with(&astronaut()));
        assert!(astronaut().reports_contact_with(&rocket()));

        assert!(rocket().collides_with(&normal));
        assert!(normal.collides_with(&rocket()));
        assert!(rocket().reports_contact_with(&normal));
        assert!(!rocket().reports_contact_with(&sticky));

        assert!(astronaut().reports_contact_with(&sticky));
        assert!(!astronaut().reports_contact_with(&normal));
        assert!(normal.collides_with(&sticky));
    }

    #[test]
    fn test_edge_only_for_colliding_bodies() {
        assert_ne!(rocket().interaction_filter() & category::EDGE, 0);
        assert_eq!(astronaut().interaction_filter() & category::EDGE, 0);
    }

    #[test]
    fn test_gravity_scale_needs_flag_and_field() {
        let mut body = rocket().with_fields(field::GLOBAL_GRAVITY);
        assert_eq!(body.gravity_scale(), 0.0);
        body.affected_by_gravity = true;
        assert_eq!(body.gravity_scale(), 1.0);
        body.field_mask = field::GRAVITY_WELL;
        assert_eq!(body.gravity_scale(), 0.0);
    }

    #[test]
    fn test_damping_coefficient() {
        assert_eq!(rocket().damping_coefficient(), 0.0);
        let damped = rocket().with_damping(0.9);
        // exp(-c) of the velocity survives one second
        assert!(((-damped.damping_coefficient()).exp() - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_radial_field_falloff() {
        let well = RadialField {
            anchor: BodyId(9),
            strength: 100.0,
            radius: 200.0,
            mask: field::GRAVITY_WELL,
        };
        let center = Vec2::ZERO;
        let near = well.acceleration(center, Vec2::new(50.0, 0.0));
        let far = well.acceleration(center, Vec2::new(150.0, 0.0));
        assert!(near.x < 0.0, "pull points toward the centre");
        assert!(near.length() > far.length());
        assert_eq!(well.acceleration(center, Vec2::new(250.0, 0.0)), Vec2::ZERO);
    }
}
