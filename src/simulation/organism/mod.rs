//! Protozoa and the parts they are built from.

mod contact;
mod perception;
mod proprioception;
mod protozoa;
mod retina;
mod sense;
mod spike;

pub use contact::{ContactSensor, Touch};
pub use perception::Perception;
pub use proprioception::Proprioception;
pub use protozoa::Protozoa;
pub use retina::{RayHit, Retina, RetinaCell, Sight};
pub use sense::Sense;
pub use spike::Spike;
