//! Contact sensors around the membrane and the touch sense built on them.

use std::f32::consts::TAU;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::super::entity::{Body, EntityId};
use super::super::geometric_utils::Vector2;
use super::super::params::Params;
use super::Protozoa;
use super::sense::Sense;

/// Distance of a sensor tip from the centre, relative to the radius.
const TIP_OFFSET: f32 = 1.01;

/// Sensor at a fixed angle just outside the membrane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactSensor {
    angle: f32,
    contact: Option<EntityId>,
}

impl ContactSensor {
    /// Creates a sensor at `angle` relative to the facing direction.
    pub fn new(angle: f32) -> Self {
        Self {
            angle,
            contact: None,
        }
    }

    /// Evenly spaced ring of `n` sensors at angles `2πi/n`.
    pub fn ring(n: usize) -> Vec<Self> {
        (0..n).map(|i| Self::new(TAU * i as f32 / n as f32)).collect()
    }

    /// Angle relative to the facing direction.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Entity touched this tick.
    pub fn contact(&self) -> Option<EntityId> {
        self.contact
    }

    /// Whether anything touched the sensor this tick.
    pub fn in_contact(&self) -> bool {
        self.contact.is_some()
    }

    /// Records a contact; the last one recorded in a tick wins.
    pub fn set_contact(&mut self, id: EntityId) {
        self.contact = Some(id);
    }

    /// Clears the contact.
    pub fn reset(&mut self) {
        self.contact = None;
    }

    /// World position of the sensor tip.
    pub fn tip(&self, body: &Body) -> Vector2 {
        body.pos + Vector2::from_angle(body.direction + self.angle) * (TIP_OFFSET * body.radius())
    }
}

/// One input per contact sensor: 1 when in contact, 0 otherwise.
pub struct Touch;

impl Sense for Touch {
    fn sense(&self, protozoa: &Protozoa, _body: &Body, _params: &Params) -> Array1<f32> {
        protozoa
            .contact_sensors()
            .iter()
            .map(|s| if s.in_contact() { 1.0 } else { 0.0 })
            .collect()
    }

    fn input_size(&self, protozoa: &Protozoa, _params: &Params) -> usize {
        protozoa.contact_sensors().len()
    }

    fn name(&self) -> &'static str {
        "Touch"
    }
}
