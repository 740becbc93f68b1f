//! Retina: a fan of colour-sensitive cells, each casting a few rays.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::super::entity::{Body, BodyView, Colour};
use super::super::genome::INPUTS_PER_RETINA_CELL;
use super::super::geometric_utils::{Vector2, segment_circle_intersections};
use super::super::params::Params;
use super::Protozoa;
use super::sense::Sense;

/// Nearest thing a ray hit this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayHit {
    /// Display colour of the entity hit.
    pub colour: Colour,
    /// Squared distance from the retina origin to the hit point.
    pub sq_distance: f32,
}

/// One retina cell covering a slice of the field of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetinaCell {
    angle: f32,
    rays: Vec<f32>,
    hits: Vec<Option<RayHit>>,
}

impl RetinaCell {
    fn new(angle: f32, width: f32, rays: usize) -> Self {
        let rays: Vec<f32> = (0..rays)
            .map(|j| angle - width / 2.0 + (j as f32 + 0.5) * width / rays as f32)
            .collect();
        let hits = vec![None; rays.len()];
        Self { angle, rays, hits }
    }

    /// Centre angle relative to the facing direction.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Ray angles relative to the facing direction.
    pub fn rays(&self) -> &[f32] {
        &self.rays
    }

    /// Hit recorded by ray `ray` this tick.
    pub fn hit(&self, ray: usize) -> Option<&RayHit> {
        self.hits.get(ray).and_then(Option::as_ref)
    }

    /// Nearest hit over all rays.
    pub fn nearest(&self) -> Option<&RayHit> {
        self.hits
            .iter()
            .flatten()
            .min_by(|a, b| a.sq_distance.total_cmp(&b.sq_distance))
    }

    fn reset(&mut self) {
        self.hits.iter_mut().for_each(|h| *h = None);
    }
}

/// The retina of a protozoan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retina {
    fov: f32,
    cells: Vec<RetinaCell>,
}

impl Retina {
    /// Creates a retina of `cells` cells spread evenly over `fov` radians,
    /// centred on the facing direction.
    pub fn new(cells: usize, fov: f32, rays_per_cell: usize) -> Self {
        let width = if cells > 0 { fov / cells as f32 } else { 0.0 };
        let cells = (0..cells)
            .map(|i| RetinaCell::new(-fov / 2.0 + (i as f32 + 0.5) * width, width, rays_per_cell))
            .collect();
        Self { fov, cells }
    }

    /// Field of view in radians.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Number of cells.
    pub fn number_of_cells(&self) -> usize {
        self.cells.len()
    }

    /// The cells, left to right.
    pub fn cells(&self) -> &[RetinaCell] {
        &self.cells
    }

    /// Forgets every hit.
    pub fn reset(&mut self) {
        self.cells.iter_mut().for_each(RetinaCell::reset);
    }

    /// Casts every ray from `origin` and records `other` where it is the
    /// nearest thing the ray has hit this tick.
    ///
    /// # Arguments
    ///
    /// * `origin` - Centre of the seeing organism
    /// * `facing` - Facing angle of the seeing organism
    /// * `range` - Ray length
    /// * `other` - Snapshot of the entity being looked at
    pub fn see(&mut self, origin: Vector2, facing: f32, range: f32, other: &BodyView) {
        for cell in &mut self.cells {
            for (ray, hit) in cell.rays.iter().zip(cell.hits.iter_mut()) {
                let end = origin + Vector2::from_angle(facing + ray) * range;
                let nearest = segment_circle_intersections(origin, end, other.pos, other.radius)
                    .into_iter()
                    .map(|p| (p - origin).len2())
                    .min_by(f32::total_cmp);
                let Some(sq_distance) = nearest else {
                    continue;
                };
                if hit.is_none_or(|h| sq_distance < h.sq_distance) {
                    *hit = Some(RayHit {
                        colour: other.colour,
                        sq_distance,
                    });
                }
            }
        }
    }

    /// Brain inputs: colour and proximity `1 - d/range` of each cell's nearest
    /// hit, zeros for cells that saw nothing.
    pub fn inputs(&self, range: f32) -> Array1<f32> {
        let mut inputs = Array1::zeros(INPUTS_PER_RETINA_CELL * self.cells.len());
        for (i, cell) in self.cells.iter().enumerate() {
            if let Some(hit) = cell.nearest() {
                let offset = INPUTS_PER_RETINA_CELL * i;
                let proximity = if range > 0.0 {
                    (1.0 - hit.sq_distance.sqrt() / range).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                inputs[offset] = hit.colour.r;
                inputs[offset + 1] = hit.colour.g;
                inputs[offset + 2] = hit.colour.b;
                inputs[offset + 3] = proximity;
            }
        }
        inputs
    }
}

/// Sight sense reading the retina.
pub struct Sight;

impl Sense for Sight {
    fn sense(&self, protozoa: &Protozoa, _body: &Body, params: &Params) -> Array1<f32> {
        protozoa.retina().inputs(params.protozoa_interact_range)
    }

    fn input_size(&self, protozoa: &Protozoa, _params: &Params) -> usize {
        INPUTS_PER_RETINA_CELL * protozoa.retina().number_of_cells()
    }

    fn name(&self) -> &'static str {
        "Sight"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::entity::EntityId;

    fn view_at(pos: Vector2, radius: f32, colour: Colour) -> BodyView {
        BodyView {
            id: EntityId::default(),
            pos,
            radius,
            speed: 0.0,
            direction: 0.0,
            health: 1.0,
            colour,
            dead: false,
            food: None,
            organism: None,
        }
    }

    #[test]
    fn retina_keeps_nearest_hit() {
        let mut retina = Retina::new(1, 0.5, 3);
        let far = view_at(Vector2::new(6.0, 0.0), 1.0, Colour::new(1.0, 0.0, 0.0));
        let near = view_at(Vector2::new(3.0, 0.0), 1.0, Colour::new(0.0, 1.0, 0.0));

        retina.see(Vector2::ZERO, 0.0, 8.0, &near);
        retina.see(Vector2::ZERO, 0.0, 8.0, &far);

        let hit = retina.cells()[0].nearest().copied();
        let hit = hit.expect("centre ray should hit");
        assert_eq!(hit.colour, Colour::new(0.0, 1.0, 0.0));
        assert!((hit.sq_distance - 4.0).abs() < 1e-3);

        let inputs = retina.inputs(8.0);
        assert!((inputs[3] - 0.75).abs() < 1e-3);
    }

    #[test]
    fn objects_behind_are_not_seen() {
        let mut retina = Retina::new(2, 1.0, 2);
        let behind = view_at(Vector2::new(-4.0, 0.0), 1.0, Colour::new(1.0, 1.0, 1.0));
        retina.see(Vector2::ZERO, 0.0, 8.0, &behind);
        assert!(retina.inputs(8.0).iter().all(|&v| v == 0.0));
    }
}
