//! Plant and meat pellets that protozoa eat.
//!
//! Plants are spawned at random and grow until they divide. Meat is left
//! behind by dead protozoa and slowly decays.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Body, BurstCause, BurstOutcome, Colour, Entity, EntityKind, burst};
use super::geometric_utils::Vector2;
use super::params::Params;
use super::rng::SimRng;

const PLANT_COLOUR: Colour = Colour {
    r: 0.25,
    g: 0.75,
    b: 0.3,
};
const MEAT_COLOUR: Colour = Colour {
    r: 0.8,
    g: 0.25,
    b: 0.25,
};

/// What a pellet is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoodType {
    /// Grows on its own; digested by herbivores.
    Plant,
    /// Remains of a protozoan; digested by carnivores.
    Meat,
}

/// A food pellet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pellet {
    /// Food type.
    pub food: FoodType,
}

impl Pellet {
    /// Creates a plant pellet entity.
    pub fn plant(pos: Vector2, radius: f32, params: &Params) -> Entity {
        Self::entity(FoodType::Plant, pos, radius, params)
    }

    /// Creates a meat pellet entity.
    pub fn meat(pos: Vector2, radius: f32, params: &Params) -> Entity {
        Self::entity(FoodType::Meat, pos, radius, params)
    }

    /// Creates a plant at a random position with a random spawn radius.
    ///
    /// # Arguments
    ///
    /// * `params` - Tank size and plant spawn radius range
    /// * `rng` - Random stream used for position and size
    ///
    /// # Returns
    ///
    /// A new plant entity fully inside the tank.
    pub fn new_random_plant(params: &Params, rng: &mut SimRng) -> Entity {
        let (min_r, max_r) = params.plant_spawn_radius;
        let radius = if min_r < max_r {
            rng.random_range(min_r..max_r)
        } else {
            min_r
        };
        let pos = Vector2::new(
            rng.random::<f32>() * params.tank_width,
            rng.random::<f32>() * params.tank_height,
        );
        let mut entity = Self::plant(pos, radius, params);
        entity.body.direction = rng.random::<f32>() * std::f32::consts::TAU;
        entity
    }

    fn entity(food: FoodType, pos: Vector2, radius: f32, params: &Params) -> Entity {
        let colour = match food {
            FoodType::Plant => PLANT_COLOUR,
            FoodType::Meat => MEAT_COLOUR,
        };
        let mut body = Body::new(pos, radius, colour);
        body.nutrition = Self::nutrition(food, params);
        Entity {
            body,
            kind: EntityKind::Pellet(Pellet { food }),
        }
    }

    /// Energy per unit mass of `food`.
    pub fn nutrition(food: FoodType, params: &Params) -> f32 {
        match food {
            FoodType::Plant => params.plant_nutrition,
            FoodType::Meat => params.meat_nutrition,
        }
    }

    /// Post-interaction update: plants set their growth rate from crowding and
    /// divide when too large; meat decays.
    ///
    /// Returns the burst outcome when a plant divided.
    pub fn update(&self, body: &mut Body, params: &Params, dt: f32, rng: &mut SimRng) -> Option<BurstOutcome> {
        match self.food {
            FoodType::Plant => {
                body.growth_rate = params.plant_growth_rate * (1.0 - body.crowding_factor.min(1.0));
                if body.radius() > params.plant_split_radius {
                    return Some(burst(body, BurstCause::PlantSplit, rng, |parent, radius, _| {
                        Ok(Self::plant(parent.pos, radius, params))
                    }));
                }
                None
            }
            FoodType::Meat => {
                body.growth_rate = 0.0;
                body.set_health(body.health() - params.meat_decay_rate * dt);
                None
            }
        }
    }

    /// Removes up to `mass` from a pellet body.
    ///
    /// A pellet left smaller than `min_pellet_radius` is consumed entirely: it
    /// dies with its death already handled, so it leaves nothing behind.
    ///
    /// # Returns
    ///
    /// The mass actually removed.
    pub fn consume(body: &mut Body, mass: f32, params: &Params) -> f32 {
        let available = body.mass(params);
        let taken = mass.clamp(0.0, available);
        let remaining = available - taken;
        let radius = params.radius_of(remaining);
        if radius < params.min_pellet_radius {
            body.claim_death();
            return available;
        }
        body.set_radius(radius);
        taken
    }
}
