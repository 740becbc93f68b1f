use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::SimulationError;

/// Simulation parameters that control tank behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Seed for every random draw in the simulation.
    pub seed: u64,
    /// Tank width.
    pub tank_width: f32,
    /// Tank height.
    pub tank_height: f32,
    /// Edge length of a spatial chunk. Must cover the interact range.
    pub chunk_size: f32,
    /// Simulated seconds per tick.
    pub dt: f32,
    /// Protozoa seeded at creation.
    pub initial_protozoa: usize,
    /// Below this population random protozoa are seeded again.
    pub min_protozoa: usize,
    /// Plant pellets seeded at creation.
    pub initial_plants: usize,
    /// Plants are topped up towards this count.
    pub min_plants: usize,
    /// Plants spawned per second while below `min_plants`.
    pub plant_spawn_rate: f32,
    /// Hard cap on live entities; births beyond it are dropped.
    pub max_entities: usize,
    /// Distance within which protozoa see and interact with others.
    pub protozoa_interact_range: f32,
    /// Number of contact sensors around each protozoan.
    pub num_contact_sensors: usize,
    /// Rays cast by every retina cell.
    pub retina_rays_per_cell: usize,
    /// Minimum health required to split.
    pub min_health_to_split: f32,
    /// Seconds of mutual consent with one partner before its genome is captured.
    pub mating_time: f32,
    /// Attack bonus per unit of spike length.
    pub spike_damage: f32,
    /// Multiplier turning excess attack into health damage per second.
    pub attack_factor: f32,
    /// Defence multiplier of a freshly expressed protozoan.
    pub shield_factor: f32,
    /// Plant extraction multiplier per spike carried.
    pub spike_plant_consumption_penalty: f32,
    /// Speed multiplier per spike carried.
    pub spike_movement_penalty: f32,
    /// Growth rate lost per unit of spike growth rate.
    pub spike_growth_penalty: f32,
    /// Death rate multiplier per spike carried.
    pub spike_death_rate_penalty: f32,
    /// Growth rate lost per retina cell.
    pub retina_cell_growth_cost: f32,
    /// Health loss per unit radius per second.
    pub starvation_factor: f32,
    /// Radians turned per second at full turn output.
    pub turn_rate: f32,
    /// Top speed at full speed output and full size.
    pub max_speed: f32,
    /// Scales the kinetic work `m v^2 / 2` charged per tick of motion.
    pub kinetic_work_factor: f32,
    /// Mass per unit area.
    pub cell_density: f32,
    /// Energy per unit mass a protozoan is born with.
    pub initial_energy_density: f32,
    /// Maximum energy per unit mass a protozoan can store.
    pub energy_capacity_density: f32,
    /// Energy spent per unit of mass grown.
    pub growth_energy_cost: f32,
    /// Mass per second extracted from food at unit extraction.
    pub consume_rate: f32,
    /// Health restored per unit of mass eaten.
    pub food_health_gain: f32,
    /// Energy per unit mass of plant food.
    pub plant_nutrition: f32,
    /// Energy per unit mass of meat.
    pub meat_nutrition: f32,
    /// Base relative growth rate of plants.
    pub plant_growth_rate: f32,
    /// Radius range of freshly spawned plants.
    pub plant_spawn_radius: (f32, f32),
    /// Radius above which a plant bursts into smaller plants.
    pub plant_split_radius: f32,
    /// Health lost by meat pellets per second.
    pub meat_decay_rate: f32,
    /// Pellets eaten below this radius disappear.
    pub min_pellet_radius: f32,
    /// Per-gene chance of mutating when a child genome is made.
    pub mutation_chance: f32,
    /// Relative size of a float gene perturbation.
    pub mutation_scale: f32,
    /// Absolute size of a synapse weight perturbation.
    pub weight_mutation_scale: f32,
    /// Hidden neurons in a freshly seeded network.
    pub initial_hidden_neurons: usize,
    /// Capacity of the recent event log.
    pub event_log_size: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            seed: 42,
            tank_width: 120.0,
            tank_height: 120.0,
            chunk_size: 10.0,
            dt: 0.05,
            initial_protozoa: 60,
            min_protozoa: 10,
            initial_plants: 250,
            min_plants: 150,
            plant_spawn_rate: 20.0,
            max_entities: 2000,
            protozoa_interact_range: 8.0,
            num_contact_sensors: 6,
            retina_rays_per_cell: 3,
            min_health_to_split: 0.5,
            mating_time: 0.3,
            spike_damage: 1.0,
            attack_factor: 10.0,
            shield_factor: 1.3,
            spike_plant_consumption_penalty: 0.8,
            spike_movement_penalty: 0.9,
            spike_growth_penalty: 0.02,
            spike_death_rate_penalty: 1.05,
            retina_cell_growth_cost: 0.002,
            starvation_factor: 0.01,
            turn_rate: 8.0,
            max_speed: 6.0,
            kinetic_work_factor: 0.001,
            cell_density: 1.0,
            initial_energy_density: 0.5,
            energy_capacity_density: 2.0,
            growth_energy_cost: 0.5,
            consume_rate: 4.0,
            food_health_gain: 0.1,
            plant_nutrition: 1.0,
            meat_nutrition: 2.0,
            plant_growth_rate: 0.05,
            plant_spawn_radius: (0.3, 0.8),
            plant_split_radius: 1.2,
            meat_decay_rate: 0.02,
            min_pellet_radius: 0.15,
            mutation_chance: 0.1,
            mutation_scale: 0.2,
            weight_mutation_scale: 0.5,
            initial_hidden_neurons: 4,
            event_log_size: 20,
        }
    }
}

impl Params {
    /// Checks that the parameters describe a usable tank.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(self.tank_width > 0.0 && self.tank_height > 0.0) {
            return Err(SimulationError::InvalidConfig("tank dimensions must be positive"));
        }
        if !(self.chunk_size > 0.0) {
            return Err(SimulationError::InvalidConfig("chunk_size must be positive"));
        }
        if self.chunk_size < self.protozoa_interact_range {
            return Err(SimulationError::InvalidConfig(
                "chunk_size must be at least protozoa_interact_range",
            ));
        }
        if !(self.dt > 0.0) {
            return Err(SimulationError::InvalidConfig("dt must be positive"));
        }
        if self.retina_rays_per_cell == 0 {
            return Err(SimulationError::InvalidConfig(
                "retina_rays_per_cell must be at least 1",
            ));
        }
        if !(self.cell_density > 0.0) {
            return Err(SimulationError::InvalidConfig("cell_density must be positive"));
        }
        let (min_r, max_r) = self.plant_spawn_radius;
        if !(min_r > 0.0 && min_r <= max_r) {
            return Err(SimulationError::InvalidConfig(
                "plant_spawn_radius must be a positive, ordered range",
            ));
        }
        Ok(())
    }

    /// Loads parameters from a JSON file. Missing fields take their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let json = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }

    /// Saves the parameters to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SimulationError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Mass of a circle of `radius` at the configured density.
    pub fn mass_of(&self, radius: f32) -> f32 {
        std::f32::consts::PI * radius * radius * self.cell_density
    }

    /// Radius of a circle holding `mass` at the configured density.
    pub fn radius_of(&self, mass: f32) -> f32 {
        (mass.max(0.0) / (std::f32::consts::PI * self.cell_density)).sqrt()
    }
}
