//! # Protozoa - Evolving Microorganisms in a Tank
//!
//! A simulation of circular protozoa and food pellets in a bounded 2D tank.
//! Protozoa see through a retina, think with an evolved neural network, eat,
//! fight with spikes, mate and split. Offspring inherit a mutated (and
//! possibly crossed-over) genome.
//!
//! ## Features
//!
//! - Incremental spatial chunk index for neighbour queries
//! - Staged pairwise interactions: crowding, collisions, contact, vision,
//!   combat, mating and feeding
//! - Feed-forward neural brains with synchronous two-phase evaluation
//! - Bounded genomes with mutation and crossover
//! - Parallel, seed-reproducible ticks
//! - Save/load of the complete tank state
//!
//! ## Core Modules
//!
//! - [`simulation::tank`] - Tick orchestration and entity ownership
//! - [`simulation::spatial`] - Chunk manager
//! - [`simulation::interaction`] - Pairwise interaction resolver
//! - [`simulation::organism`] - Protozoa, retina, spikes and senses
//! - [`simulation::brain`] - Neural networks and brains
//! - [`simulation::genome`] - Genes, mutation and crossover
//! - [`simulation::events`] - Event system for thread-safe updates

/// Core simulation logic and data structures.
pub mod simulation {
    /// Neural networks and the brains built on them.
    pub mod brain;
    /// Entities, bodies and the burst helper.
    pub mod entity;
    /// Error types.
    pub mod error;
    /// Recent event log.
    pub mod event_log;
    /// Event system for thread-safe state updates.
    pub mod events;
    /// Plant and meat pellets.
    pub mod food;
    /// Genomes and reproduction.
    pub mod genome;
    /// Vector maths and circle geometry.
    pub mod geometric_utils;
    /// Pairwise interaction resolver.
    pub mod interaction;
    /// Per-entity phases of a tick.
    pub mod lifecycle;
    /// Protozoa and their senses.
    pub mod organism;
    /// Simulation parameters.
    pub mod params;
    /// Reproduction statistics tracking.
    pub mod reproduction;
    /// Seeded random streams.
    pub mod rng;
    /// Spatial chunk manager.
    pub mod spatial;
    /// The tank and its tick.
    pub mod tank;
}
