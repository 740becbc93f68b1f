//! Shared entity model.
//!
//! Every entity in the tank is a circular [`Body`] plus a kind-specific part
//! ([`EntityKind`]). During the interaction pass entities only ever see each
//! other through read-only [`BodyView`] snapshots.

use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use tracing::debug;

use super::error::MiscarriageError;
use super::food::{FoodType, Pellet};
use super::genome::Genome;
use super::geometric_utils::Vector2;
use super::organism::Protozoa;
use super::params::Params;
use super::rng::SimRng;

new_key_type! {
    /// Stable handle of an entity in the tank.
    pub struct EntityId;
}

/// Named statistics shown by the HUD.
pub type Stats = BTreeMap<&'static str, f32>;

/// Health below which an entity is dead.
pub const DEATH_HEALTH: f32 = 0.1;
/// Smallest radius a body can have.
pub const MIN_RADIUS: f32 = 1e-3;
const DEGRADED_SHADE: f32 = 0.7;

/// RGB colour with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Colour {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
}

impl Colour {
    /// Creates a colour, clamping each channel.
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    /// Linear interpolation towards `other`; `t = 0` gives `self`.
    pub fn lerp(self, other: Colour, t: f32) -> Colour {
        Colour::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    /// Every channel multiplied by `factor`.
    pub fn scaled(self, factor: f32) -> Colour {
        Colour::new(self.r * factor, self.g * factor, self.b * factor)
    }
}

/// Physical state shared by all entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    /// Centre position.
    pub pos: Vector2,
    radius: f32,
    /// Facing angle in radians.
    pub direction: f32,
    /// Speed along the facing direction.
    pub speed: f32,
    health: f32,
    /// Relative growth per second applied in the prepare phase.
    pub growth_rate: f32,
    /// Seconds since birth.
    pub time_alive: f32,
    /// Accumulated crowding from neighbours this tick.
    pub crowding_factor: f32,
    dead: bool,
    death_handled: bool,
    /// Energy per unit mass released when eaten.
    pub nutrition: f32,
    /// Colour at full health.
    pub healthy_colour: Colour,
    /// Colour at zero health; `None` keeps the healthy colour.
    pub degraded_colour: Option<Colour>,
}

impl Body {
    /// Creates a healthy, motionless body.
    pub fn new(pos: Vector2, radius: f32, colour: Colour) -> Self {
        Self {
            pos,
            radius: radius.max(MIN_RADIUS),
            direction: 0.0,
            speed: 0.0,
            health: 1.0,
            growth_rate: 0.0,
            time_alive: 0.0,
            crowding_factor: 0.0,
            dead: false,
            death_handled: false,
            nutrition: 0.0,
            healthy_colour: colour,
            degraded_colour: Some(colour.scaled(DEGRADED_SHADE)),
        }
    }

    /// Radius, always positive.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Sets the radius, keeping it positive.
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(MIN_RADIUS);
    }

    /// Health in `[0, 1]`.
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Sets health, clamped to `[0, 1]`. Falling below [`DEATH_HEALTH`] kills.
    pub fn set_health(&mut self, health: f32) {
        self.health = health.clamp(0.0, 1.0);
        if self.health < DEATH_HEALTH {
            self.dead = true;
        }
    }

    /// Whether the entity is dead.
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Marks the entity dead.
    pub fn kill(&mut self) {
        self.dead = true;
    }

    /// Whether death handling already ran.
    pub fn death_handled(&self) -> bool {
        self.death_handled
    }

    /// Marks the body dead and claims its death handling.
    ///
    /// Returns `false` when handling was already claimed.
    pub fn claim_death(&mut self) -> bool {
        self.dead = true;
        if self.death_handled {
            return false;
        }
        self.death_handled = true;
        true
    }

    /// Unit vector of the facing direction.
    pub fn dir(&self) -> Vector2 {
        Vector2::from_angle(self.direction)
    }

    /// Velocity vector.
    pub fn velocity(&self) -> Vector2 {
        self.dir() * self.speed
    }

    /// Momentum proxy used to decide who yields in a collision.
    pub fn momentum(&self) -> f32 {
        self.speed.abs() * self.radius
    }

    /// Mass of the body.
    pub fn mass(&self, params: &Params) -> f32 {
        params.mass_of(self.radius)
    }

    /// Colour shown by renderers and retinas.
    pub fn display_colour(&self) -> Colour {
        match self.degraded_colour {
            Some(degraded) => self.healthy_colour.lerp(degraded, 1.0 - self.health),
            None => self.healthy_colour,
        }
    }

    /// Whether the circles overlap.
    pub fn is_colliding_with(&self, other: &BodyView) -> bool {
        let r = self.radius + other.radius;
        self.pos.distance2_to(other.pos) < r * r
    }

    /// Whether the circles are close enough to feed or mate.
    pub fn is_touching(&self, other: &BodyView) -> bool {
        0.95 * self.pos.distance_to(other.pos) < self.radius + other.radius
    }
}

/// Read-only snapshot of another entity taken after the prepare phase.
#[derive(Debug, Clone)]
pub struct BodyView {
    /// Entity handle.
    pub id: EntityId,
    /// Centre position.
    pub pos: Vector2,
    /// Radius.
    pub radius: f32,
    /// Speed.
    pub speed: f32,
    /// Facing angle.
    pub direction: f32,
    /// Health.
    pub health: f32,
    /// Display colour.
    pub colour: Colour,
    /// Whether the entity was dead at snapshot time.
    pub dead: bool,
    /// Food type of pellets.
    pub food: Option<FoodType>,
    /// Organism details of protozoa.
    pub organism: Option<OrganismView>,
}

/// Organism part of a [`BodyView`].
#[derive(Debug, Clone)]
pub struct OrganismView {
    /// Defence multiplier.
    pub shield_factor: f32,
    /// Mating consent at snapshot time.
    pub wants_to_mate: bool,
    /// Genome, shared.
    pub genome: Arc<Genome>,
}

impl BodyView {
    /// Momentum proxy.
    pub fn momentum(&self) -> f32 {
        self.speed.abs() * self.radius
    }

    /// Whether the entity can be eaten.
    pub fn is_edible(&self) -> bool {
        self.food.is_some() && !self.dead
    }
}

/// Kind-specific part of an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntityKind {
    /// A living organism.
    Protozoa(Box<Protozoa>),
    /// A plant or meat pellet.
    Pellet(Pellet),
}

/// An entity in the tank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Physical state.
    pub body: Body,
    /// Kind-specific state.
    pub kind: EntityKind,
}

/// What triggered a burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurstCause {
    /// A protozoan split into offspring.
    Split,
    /// A dead protozoan fell apart into meat.
    Decomposition,
    /// A plant grew too large and divided.
    PlantSplit,
    /// A pellet expired without leaving anything behind.
    Expired,
}

/// Result of a burst or death handling.
#[derive(Debug, Clone)]
pub struct BurstOutcome {
    /// Trigger of the burst.
    pub cause: BurstCause,
    /// Entities to add at commit.
    pub children: Vec<Entity>,
    /// Children whose genome could not be expressed.
    pub miscarriages: usize,
}

impl BurstOutcome {
    /// Outcome without children.
    pub fn empty(cause: BurstCause) -> Self {
        Self {
            cause,
            children: Vec::new(),
            miscarriages: 0,
        }
    }
}

/// Bursts `body` into 2 to 4 children arranged around it.
///
/// The body is marked dead and its death handled; a body whose death was
/// already handled produces nothing. `create_child` receives the parent body,
/// the child radius and the RNG, and may fail, in which case the child is
/// skipped.
///
/// # Arguments
///
/// * `body` - Body of the bursting entity
/// * `cause` - Recorded trigger of the burst
/// * `rng` - Random stream of the bursting entity
/// * `create_child` - Builds one child of the given radius
///
/// # Returns
///
/// The children positioned `2·r_child` from the parent centre, each facing away
/// from it.
pub fn burst<F>(body: &mut Body, cause: BurstCause, rng: &mut SimRng, mut create_child: F) -> BurstOutcome
where
    F: FnMut(&Body, f32, &mut SimRng) -> Result<Entity, MiscarriageError>,
{
    let mut outcome = BurstOutcome::empty(cause);
    if !body.claim_death() {
        return outcome;
    }

    let mut angle = TAU * rng.random::<f32>();
    let n = 2 + rng.random_range(0..3usize);
    for _ in 0..n {
        let p = 0.3 + 0.7 * rng.random::<f32>() / n as f32;
        match create_child(body, body.radius * p, rng) {
            Ok(mut child) => {
                let dir = Vector2::from_angle(angle);
                child.body.pos = body.pos + dir * (2.0 * child.body.radius);
                child.body.direction = angle;
                outcome.children.push(child);
            }
            Err(err) => {
                debug!(?cause, %err, "child could not be expressed");
                outcome.miscarriages += 1;
            }
        }
        angle += TAU / n as f32;
    }
    outcome
}

impl Entity {
    /// The organism, if this is a protozoan.
    pub fn as_protozoa(&self) -> Option<&Protozoa> {
        match &self.kind {
            EntityKind::Protozoa(p) => Some(p),
            EntityKind::Pellet(_) => None,
        }
    }

    /// Mutable organism, if this is a protozoan.
    pub fn as_protozoa_mut(&mut self) -> Option<&mut Protozoa> {
        match &mut self.kind {
            EntityKind::Protozoa(p) => Some(p),
            EntityKind::Pellet(_) => None,
        }
    }

    /// The pellet, if this is food.
    pub fn as_pellet(&self) -> Option<&Pellet> {
        match &self.kind {
            EntityKind::Pellet(p) => Some(p),
            EntityKind::Protozoa(_) => None,
        }
    }

    /// Food type of pellets.
    pub fn food_type(&self) -> Option<FoodType> {
        self.as_pellet().map(|p| p.food)
    }

    /// Whether the entity can be eaten.
    pub fn is_edible(&self) -> bool {
        self.food_type().is_some() && !self.body.is_dead()
    }

    /// Read-only snapshot under handle `id`.
    pub fn view(&self, id: EntityId) -> BodyView {
        BodyView {
            id,
            pos: self.body.pos,
            radius: self.body.radius(),
            speed: self.body.speed,
            direction: self.body.direction,
            health: self.body.health(),
            colour: self.body.display_colour(),
            dead: self.body.is_dead(),
            food: self.food_type(),
            organism: self.as_protozoa().map(|p| OrganismView {
                shield_factor: p.shield_factor(),
                wants_to_mate: p.brain().wants_to_mate(),
                genome: Arc::clone(p.genome()),
            }),
        }
    }

    /// Runs death handling once for a dead entity.
    ///
    /// Protozoa decompose into meat; pellets just disappear. Returns `None`
    /// for living entities and for deaths that were already handled.
    pub fn handle_death(&mut self, params: &Params, rng: &mut SimRng) -> Option<BurstOutcome> {
        if !self.body.is_dead() || self.body.death_handled() {
            return None;
        }
        match &self.kind {
            EntityKind::Protozoa(_) => Some(Protozoa::decompose(&mut self.body, params, rng)),
            EntityKind::Pellet(_) => {
                self.body.claim_death();
                Some(BurstOutcome::empty(BurstCause::Expired))
            }
        }
    }

    /// Statistics for the HUD.
    pub fn stats(&self, params: &Params) -> Stats {
        let mut stats = Stats::new();
        stats.insert("Age", self.body.time_alive);
        stats.insert("Health", self.body.health());
        stats.insert("Size", self.body.radius());
        stats.insert("Speed", self.body.speed);
        stats.insert("Crowding Factor", self.body.crowding_factor);
        if let Some(protozoa) = self.as_protozoa() {
            protozoa.add_stats(&self.body, params, &mut stats);
        }
        stats
    }
}
