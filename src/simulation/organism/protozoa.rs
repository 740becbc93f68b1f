//! Protozoa: genome-expressed organisms with a brain, retina and spikes.

use std::f32::consts::TAU;
use std::sync::{Arc, LazyLock};

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::super::brain::{Brain, NeuralNetwork, OUTPUT_SIZE};
use super::super::entity::{
    Body, BodyView, BurstCause, BurstOutcome, Entity, EntityId, EntityKind, Stats, burst,
};
use super::super::error::MiscarriageError;
use super::super::food::{FoodType, Pellet};
use super::super::genome::{Genome, MAX_RETINA_CELLS, TraitKind, sensor_count};
use super::super::geometric_utils::{Vector2, point_in_circle};
use super::super::params::Params;
use super::super::rng::SimRng;
use super::contact::ContactSensor;
use super::perception::Perception;
use super::retina::Retina;
use super::spike::Spike;

static PERCEPTION: LazyLock<Perception> = LazyLock::new(Perception::default);

/// A living organism.
///
/// The physical state lives in the owning entity's [`Body`]; methods that need
/// it take the body as an argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Protozoa {
    genome: Arc<Genome>,
    crossover_genome: Option<Arc<Genome>>,
    mate: Option<EntityId>,
    time_mating: f32,
    retina: Retina,
    brain: Brain,
    spikes: Vec<Spike>,
    contact_sensors: Vec<ContactSensor>,
    split_radius: f32,
    shield_factor: f32,
    herbivore_factor: f32,
    max_turn: f32,
    death_rate: f32,
    was_just_damaged: bool,
    energy: f32,
}

impl Protozoa {
    /// Expresses a genome into a new organism and its body.
    ///
    /// The body is placed at the origin with a random facing direction.
    ///
    /// # Errors
    ///
    /// Returns a [`MiscarriageError`] when the retina is out of range or the
    /// network gene does not form a valid brain for this phenotype.
    pub fn from_genome(
        genome: Arc<Genome>,
        params: &Params,
        rng: &mut SimRng,
    ) -> Result<(Body, Protozoa), MiscarriageError> {
        let cells = genome.retina().cells;
        if cells > MAX_RETINA_CELLS {
            return Err(MiscarriageError::InvalidRetina(cells));
        }
        let sensors = sensor_count(cells, params.num_contact_sensors);
        let network = NeuralNetwork::from_gene(genome.network(), sensors, OUTPUT_SIZE)?;

        let max_turn = genome.trait_value(TraitKind::MaxTurn);
        let mut body = Body::new(Vector2::ZERO, genome.trait_value(TraitKind::Radius), genome.colour());
        body.direction = TAU * rng.random::<f32>();
        body.growth_rate = genome.trait_value(TraitKind::GrowthRate);
        body.nutrition = params.meat_nutrition;

        let protozoa = Protozoa {
            retina: Retina::new(
                cells,
                genome.trait_value(TraitKind::RetinaFov),
                params.retina_rays_per_cell,
            ),
            brain: Brain::neural(network, max_turn),
            spikes: genome.spikes().iter().map(Spike::from_gene).collect(),
            contact_sensors: ContactSensor::ring(params.num_contact_sensors),
            split_radius: genome.trait_value(TraitKind::SplitRadius),
            shield_factor: params.shield_factor,
            herbivore_factor: genome.trait_value(TraitKind::HerbivoreFactor),
            max_turn,
            death_rate: 0.0,
            was_just_damaged: false,
            energy: params.initial_energy_density * body.mass(params),
            crossover_genome: None,
            mate: None,
            time_mating: 0.0,
            genome,
        };
        Ok((body, protozoa))
    }

    /// Random founder placed uniformly inside the tank.
    ///
    /// # Errors
    ///
    /// Propagates [`Protozoa::from_genome`] failures.
    pub fn new_random(params: &Params, rng: &mut SimRng) -> Result<Entity, MiscarriageError> {
        let genome = Arc::new(Genome::random(params, rng));
        let (mut body, protozoa) = Self::from_genome(genome, params, rng)?;
        body.pos = Vector2::new(
            rng.random::<f32>() * params.tank_width,
            rng.random::<f32>() * params.tank_height,
        );
        Ok(protozoa.into_entity(body))
    }

    /// Wraps the organism and its body into an entity.
    pub fn into_entity(self, body: Body) -> Entity {
        Entity {
            body,
            kind: EntityKind::Protozoa(Box::new(self)),
        }
    }

    /// Genome.
    pub fn genome(&self) -> &Arc<Genome> {
        &self.genome
    }

    /// Genome captured from the last completed mating.
    pub fn crossover_genome(&self) -> Option<&Arc<Genome>> {
        self.crossover_genome.as_ref()
    }

    /// Current mating partner.
    pub fn mate(&self) -> Option<EntityId> {
        self.mate
    }

    /// Seconds spent mating with the current partner.
    pub fn time_mating(&self) -> f32 {
        self.time_mating
    }

    /// Retina.
    pub fn retina(&self) -> &Retina {
        &self.retina
    }

    /// Brain.
    pub fn brain(&self) -> &Brain {
        &self.brain
    }

    /// Replaces the brain.
    pub fn set_brain(&mut self, brain: Brain) {
        self.brain = brain;
    }

    /// Spikes.
    pub fn spikes(&self) -> &[Spike] {
        &self.spikes
    }

    /// Contact sensors.
    pub fn contact_sensors(&self) -> &[ContactSensor] {
        &self.contact_sensors
    }

    /// Radius above which the organism splits.
    pub fn split_radius(&self) -> f32 {
        self.split_radius
    }

    /// Defence multiplier.
    pub fn shield_factor(&self) -> f32 {
        self.shield_factor
    }

    /// Plant digestion multiplier.
    pub fn herbivore_factor(&self) -> f32 {
        self.herbivore_factor
    }

    /// Largest turn command.
    pub fn max_turn(&self) -> f32 {
        self.max_turn
    }

    /// Relative health lost in the last ageing step.
    pub fn death_rate(&self) -> f32 {
        self.death_rate
    }

    /// Whether the organism was damaged at the end of the previous tick.
    pub fn was_just_damaged(&self) -> bool {
        self.was_just_damaged
    }

    /// Stored energy.
    pub fn energy(&self) -> f32 {
        self.energy
    }

    /// Overwrites the stored energy.
    pub fn set_energy(&mut self, energy: f32) {
        self.energy = energy.max(0.0);
    }

    /// Largest energy the body can store.
    pub fn energy_capacity(&self, body: &Body, params: &Params) -> f32 {
        body.mass(params) * params.energy_capacity_density
    }

    /// Digestion rate of a food type.
    pub fn digestion_rate(&self, food: FoodType) -> f32 {
        match food {
            FoodType::Plant => self.herbivore_factor,
            FoodType::Meat => 1.0 / self.herbivore_factor,
        }
    }

    /// Extraction multiplier for `food`, including the spike penalty on plants.
    pub fn extraction(&self, food: FoodType, params: &Params) -> f32 {
        let rate = self.digestion_rate(food);
        match food {
            FoodType::Plant => rate * params.spike_plant_consumption_penalty.powi(self.spikes.len() as i32),
            FoodType::Meat => rate,
        }
    }

    /// Whether the organism should split this tick.
    pub fn should_split(&self, body: &Body, params: &Params) -> bool {
        body.radius() > self.split_radius && body.health() > params.min_health_to_split
    }

    /// Effective growth rate after size, spike and retina upkeep.
    pub fn effective_growth_rate(&self, body: &Body, params: &Params) -> f32 {
        let mut rate = self.genome.trait_value(TraitKind::GrowthRate);
        if body.radius() > self.split_radius {
            rate *= body.health() * self.split_radius / (5.0 * body.radius());
        }
        for spike in &self.spikes {
            rate -= params.spike_growth_penalty * spike.growth_rate();
        }
        rate - params.retina_cell_growth_cost * self.retina.number_of_cells() as f32
    }

    /// Grows the body for one tick, paying for new mass with stored energy.
    ///
    /// Growth stops where the energy runs out. A negative growth rate shrinks
    /// the body at no cost.
    pub fn grow(&mut self, body: &mut Body, params: &Params, dt: f32) {
        let rate = self.effective_growth_rate(body, params);
        body.growth_rate = rate;
        let old_mass = body.mass(params);
        let target_radius = body.radius() * (1.0 + rate * dt);
        if rate <= 0.0 {
            body.set_radius(target_radius);
            return;
        }
        let mut gained = params.mass_of(target_radius) - old_mass;
        let cost = gained * params.growth_energy_cost;
        if cost > self.energy {
            gained = if params.growth_energy_cost > 0.0 {
                self.energy / params.growth_energy_cost
            } else {
                gained
            };
            self.energy = 0.0;
        } else {
            self.energy -= cost;
        }
        body.set_radius(params.radius_of(old_mass + gained));
    }

    /// Clears the retina before the interaction pass.
    pub fn reset_retina(&mut self) {
        self.retina.reset();
    }

    /// Records contact with `other` on every sensor whose tip lies inside it.
    pub fn sense_contact(&mut self, body: &Body, other: &BodyView) {
        for sensor in &mut self.contact_sensors {
            if point_in_circle(sensor.tip(body), other.pos, other.radius) {
                sensor.set_contact(other.id);
            }
        }
    }

    /// Lets the retina look at `other`.
    pub fn see(&mut self, body: &Body, other: &BodyView, params: &Params) {
        if self.retina.number_of_cells() > 0 {
            self.retina
                .see(body.pos, body.direction, params.protozoa_interact_range, other);
        }
    }

    /// Effective spike length, scaled by the body's size.
    pub fn spike_length(&self, body: &Body, spike: &Spike) -> f32 {
        spike.current_length() * body.radius() / self.split_radius
    }

    /// World position of a spike tip.
    pub fn spike_tip(&self, body: &Body, spike: &Spike) -> Vector2 {
        let reach = body.radius() + self.spike_length(body, spike);
        body.pos + Vector2::from_angle(body.direction + spike.angle()) * reach
    }

    /// Whether a spike currently pierces `other`.
    pub fn spike_in_contact(&self, body: &Body, spike: &Spike, other: &BodyView) -> bool {
        let reach = body.radius() + other.radius + self.spike_length(body, spike);
        body.pos.distance2_to(other.pos) < reach * reach
            && point_in_circle(self.spike_tip(body, spike), other.pos, other.radius)
    }

    /// Health damage dealt to the organism `other` this tick.
    ///
    /// Every spike in contact rolls attack against defence; the winning margin
    /// scaled by `dt·attack_factor` adds to the damage.
    pub fn attack(&self, body: &Body, other: &BodyView, params: &Params, dt: f32, rng: &mut SimRng) -> f32 {
        let Some(organism) = &other.organism else {
            return 0.0;
        };
        let mut damage = 0.0;
        for spike in &self.spikes {
            if !self.spike_in_contact(body, spike, other) {
                continue;
            }
            let attack = 2.0 * body.health()
                + params.spike_damage * self.spike_length(body, spike)
                + 2.0 * rng.random::<f32>();
            let defense = 2.0 * other.health + 0.3 * other.radius + 2.0 * rng.random::<f32>();
            let shielded = organism.shield_factor * defense;
            if attack > shielded {
                damage += dt * params.attack_factor * (attack - shielded);
            }
        }
        damage
    }

    /// Advances the mating counter with `partner`.
    ///
    /// A new partner restarts the counter at zero. Once the same partner has
    /// been held for `mating_time` seconds its genome is captured for the
    /// next split.
    ///
    /// # Returns
    ///
    /// `true` when a genome not already held was captured this tick.
    pub fn register_mating_tick(
        &mut self,
        partner: EntityId,
        genome: &Arc<Genome>,
        dt: f32,
        mating_time: f32,
    ) -> bool {
        if self.mate != Some(partner) {
            self.mate = Some(partner);
            self.time_mating = 0.0;
            return false;
        }
        self.time_mating += dt;
        if self.time_mating < mating_time {
            return false;
        }
        let fresh = self
            .crossover_genome
            .as_ref()
            .is_none_or(|held| !Arc::ptr_eq(held, genome));
        self.crossover_genome = Some(Arc::clone(genome));
        fresh
    }

    /// Mass this organism asks to take from the edible `other` this tick.
    pub fn feed_request(&self, other: &BodyView, params: &Params, dt: f32) -> Option<f32> {
        let food = other.food.filter(|_| other.is_edible())?;
        let mass = params.consume_rate * self.extraction(food, params) * dt;
        (mass > 0.0).then_some(mass)
    }

    /// Digests `mass` eaten from a pellet with `nutrition` energy per mass.
    pub fn eat(&mut self, body: &mut Body, mass: f32, nutrition: f32, params: &Params) {
        let capacity = self.energy_capacity(body, params);
        self.energy = (self.energy + mass * nutrition).min(capacity);
        body.set_health(body.health() + mass * params.food_health_gain);
    }

    /// Applies combat damage.
    pub fn damage(&mut self, body: &mut Body, amount: f32) {
        body.set_health(body.health() - amount);
        self.was_just_damaged = true;
    }

    /// Starvation: health decays with size, speed and spikes carried.
    pub fn age(&mut self, body: &mut Body, params: &Params, dt: f32) {
        let mut death_rate = body.radius() * dt * params.starvation_factor;
        death_rate *= 0.75 + 0.25 * body.speed;
        death_rate *= params.spike_death_rate_penalty.powi(self.spikes.len() as i32);
        self.death_rate = death_rate;
        body.set_health(body.health() * (1.0 - death_rate));
    }

    /// Brain inputs from the current senses.
    pub fn sensor_inputs(&self, body: &Body, params: &Params) -> Array1<f32> {
        PERCEPTION.perceive(self, body, params)
    }

    /// Ticks the brain, turns and sets the speed used in the next movement.
    ///
    /// Motion costs `kinetic_work_factor·½·m·v²` energy. When the store cannot
    /// pay for it the organism stays still this tick.
    pub fn think(&mut self, body: &mut Body, params: &Params, dt: f32) {
        let inputs = self.sensor_inputs(body, params);
        self.brain.tick(&inputs);
        body.direction = (body.direction + dt * params.turn_rate * self.brain.turn()).rem_euclid(TAU);

        let spike_decay = params.spike_movement_penalty.powi(self.spikes.len() as i32);
        let size_penalty = body.radius() / self.split_radius;
        let speed = self.brain.speed().abs() * params.max_speed * size_penalty * spike_decay;
        let work = params.kinetic_work_factor * 0.5 * body.mass(params) * speed * speed;
        if work <= self.energy {
            self.energy -= work;
            body.speed = speed;
        } else {
            body.speed = 0.0;
        }
    }

    /// Grows every spike towards its target length.
    pub fn update_spikes(&mut self, dt: f32) {
        self.spikes.iter_mut().for_each(|s| s.update(dt));
    }

    /// Clears every contact sensor and the damage flag at the end of a tick.
    pub fn reset_contacts(&mut self) {
        self.contact_sensors.iter_mut().for_each(ContactSensor::reset);
        self.was_just_damaged = false;
    }

    /// Splits into offspring.
    ///
    /// Every child genome derives from this genome, crossed with the captured
    /// mate genome when one is held. Children are stunted by the fraction of the
    /// parent they receive and share the parent's energy by mass.
    pub fn split(&self, body: &mut Body, params: &Params, rng: &mut SimRng) -> BurstOutcome {
        let mate = self.crossover_genome.as_deref();
        let mut outcome = burst(body, BurstCause::Split, rng, |parent, radius, rng| {
            let genome = Arc::new(self.genome.create_child(mate, params, rng));
            let (mut child_body, child) = Protozoa::from_genome(genome, params, rng)?;
            let stunting = radius / parent.radius();
            child_body.set_radius(stunting * child_body.radius());
            Ok(child.into_entity(child_body))
        });

        let total_mass: f32 = outcome.children.iter().map(|c| c.body.mass(params)).sum();
        if total_mass > 0.0 {
            for child in &mut outcome.children {
                let share = self.energy * child.body.mass(params) / total_mass;
                let Entity { body, kind } = child;
                if let EntityKind::Protozoa(protozoa) = kind {
                    let capacity = protozoa.energy_capacity(body, params);
                    protozoa.energy = share.min(capacity);
                }
            }
        }
        outcome
    }

    /// Breaks a dead body into meat pellets.
    pub fn decompose(body: &mut Body, params: &Params, rng: &mut SimRng) -> BurstOutcome {
        burst(body, BurstCause::Decomposition, rng, |_, radius, _| {
            Ok(Pellet::meat(Vector2::ZERO, radius, params))
        })
    }

    /// Adds organism statistics to `stats`.
    pub fn add_stats(&self, body: &Body, params: &Params, stats: &mut Stats) {
        stats.insert("Death Rate", 100.0 * self.death_rate / params.dt);
        stats.insert("Split Radius", self.split_radius);
        stats.insert("Max Turning", self.max_turn);
        stats.insert("Mutations", self.genome.mutations() as f32);
        stats.insert("Generation", self.genome.generation() as f32);
        stats.insert("Genetic Size", (self.genome.network().neurons.len() + self.genome.network().synapses.len()) as f32);
        stats.insert("Has Mated", if self.crossover_genome.is_some() { 1.0 } else { 0.0 });
        stats.insert("Energy", self.energy);
        stats.insert("Energy Capacity", self.energy_capacity(body, params));
        stats.insert("Herbivore Factor", self.herbivore_factor);
        if !self.spikes.is_empty() {
            stats.insert("Num Spikes", self.spikes.len() as f32);
        }
        if let Some(network) = self.brain.network() {
            stats.insert("Network Depth", network.depth() as f32);
            stats.insert("Network Size", network.size() as f32);
        }
        if self.retina.number_of_cells() > 0 {
            stats.insert("Retina Cells", self.retina.number_of_cells() as f32);
            stats.insert("Retina FoV", self.retina.fov().to_degrees());
        }
    }
}
