//! Parametric surface builder.
//!
//! Maps each `(u, v)` grid sample to a 3D point by composing the base radius,
//! waveform modulation, twist, surface noise and the two user formulas. The
//! grid has `radial_segments + 1` columns so the seam column at `u = 1` is a
//! separate vertex that lands on the same ring as `u = 0`.
//!
//! Vertex `(i, j)` is stored at index `j * (radial_segments + 1) + i`, so ring
//! `j = 0` is the bottom ring and ring `j = vertical_segments` the top.

use std::f64::consts::{PI, TAU};

use glam::Vec3;
use tracing::{debug, warn};
use vase_config::{TwistRate, VaseParameters};

use crate::cache::FormulaPair;
use crate::formula::SurfaceSample;
use crate::mesh::Mesh;
use crate::noise_source::NoiseSource;
use crate::waveform;

/// Accumulated twist in degrees at height fraction `height_factor`.
pub fn twist_amount(rate: TwistRate, height_factor: f64, twist_angle_degrees: f64) -> f64 {
    match rate {
        TwistRate::Linear => height_factor * twist_angle_degrees,
        TwistRate::Exponential => height_factor * height_factor * twist_angle_degrees,
    }
}

/// Radius interpolated between the bottom and top diameters.
pub fn base_radius(params: &VaseParameters, height_factor: f64) -> f64 {
    let bottom = params.bottom_diameter as f64 / 2.0;
    let top = params.top_diameter as f64 / 2.0;
    bottom + (top - bottom) * height_factor
}

/// One evaluated surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Vec3,
    /// Whether a formula failed here and the geometric fallback was used
    pub fell_back: bool,
}

/// Evaluates single surface points for one parameter set.
pub struct SurfaceSampler<'a> {
    params: &'a VaseParameters,
    formulas: &'a FormulaPair,
    noise: &'a NoiseSource,
}

impl<'a> SurfaceSampler<'a> {
    pub fn new(
        params: &'a VaseParameters,
        formulas: &'a FormulaPair,
        noise: &'a NoiseSource,
    ) -> Self {
        Self {
            params,
            formulas,
            noise,
        }
    }

    /// Compute the surface point at normalized coordinates `(u, v)`.
    pub fn point(&self, u: f64, v: f64) -> SurfacePoint {
        let p = self.params;
        let height = p.height as f64;

        let angle = u * TAU;
        let height_factor = v;

        let radius = base_radius(p, height_factor)
            + p.radial_amplitude as f64
                * waveform::evaluate(p.radial_wave_type, angle * p.radial_frequency as f64);

        let vertical_offset = p.vertical_amplitude as f64
            * waveform::evaluate(
                p.vertical_wave_type,
                height_factor * p.vertical_frequency as f64 * TAU,
            );

        let twist = twist_amount(p.twist_rate, height_factor, p.twist_angle_degrees as f64);
        let twisted_angle = angle + p.twist_direction.sign() * twist * PI / 180.0;

        let noise_offset = if self.noise.is_none() {
            0.0
        } else {
            self.noise
                .sample_surface(u, v, p.surface_noise_scale as f64)
                * p.surface_noise_amount as f64
        };

        let base_y = height * height_factor;
        let scope = SurfaceSample::new(radius, base_y, height, twisted_angle);

        let overrides = self.formulas.radius.evaluate(&scope).and_then(|r| {
            let deformed_y = self.formulas.vertical.evaluate(&scope)?;
            Ok((r, deformed_y))
        });

        let place = |radius: f64, y: f64| {
            let r = radius + noise_offset;
            Vec3::new(
                (r * twisted_angle.cos()) as f32,
                y as f32,
                (r * twisted_angle.sin()) as f32,
            )
        };
        let fallback = || SurfacePoint {
            position: place(radius, base_y + vertical_offset),
            fell_back: true,
        };

        match overrides {
            Ok((r, deformed_y)) => {
                // The vertical formula returns a deformed y, the deformation
                // is its displacement from the undeformed height
                let vertical_def = deformed_y - base_y;
                let position = place(r, base_y + vertical_def + vertical_offset);
                // Finite in f64 but out of f32 range
                if !position.is_finite() {
                    return fallback();
                }
                SurfacePoint {
                    position,
                    fell_back: false,
                }
            }
            Err(_) => fallback(),
        }
    }
}

/// Result of building the raw surface grid.
#[derive(Debug, Clone)]
pub struct SurfaceGrid {
    pub mesh: Mesh,
    /// Number of points that used the formula-free fallback
    pub fallback_points: usize,
}

/// Build the vertex grid and triangle indices for the untabbed surface.
///
/// Parameters must already satisfy [`VaseParameters::validate`].
pub fn build_surface(
    params: &VaseParameters,
    formulas: &FormulaPair,
    noise: &NoiseSource,
) -> SurfaceGrid {
    let radial = params.radial_segments as usize;
    let vertical = params.vertical_segments as usize;
    let ring_len = radial + 1;
    let sampler = SurfaceSampler::new(params, formulas, noise);

    let mut positions = Vec::with_capacity(ring_len * (vertical + 1));
    let mut fallback_points = 0usize;

    for j in 0..=vertical {
        let v = j as f64 / vertical as f64;
        for i in 0..=radial {
            let u = i as f64 / radial as f64;
            let point = sampler.point(u, v);
            if point.fell_back {
                if fallback_points == 0 {
                    warn!(
                        "Formula evaluation failed at (u={:.4}, v={:.4}), using geometric fallback",
                        u, v
                    );
                }
                fallback_points += 1;
            }
            positions.push(point.position);
        }
    }

    let indices = grid_indices(radial, vertical);

    if fallback_points > 0 {
        warn!(
            "{} of {} surface points used the geometric fallback",
            fallback_points,
            positions.len()
        );
    }
    debug!(
        "Built surface grid: {} vertices, {} triangles",
        positions.len(),
        indices.len() / 3
    );

    SurfaceGrid {
        mesh: Mesh::new(positions, indices),
        fallback_points,
    }
}

/// Two outward-facing triangles per grid quad.
///
/// With `a = (i, j)`, `b = (i + 1, j)`, `c = (i, j + 1)` and
/// `d = (i + 1, j + 1)` the triangles are `a c b` and `b c d`, which face away
/// from the axis because the angle increases with `i`.
pub fn grid_indices(radial: usize, vertical: usize) -> Vec<u32> {
    let ring_len = radial + 1;
    let mut indices = Vec::with_capacity(radial * vertical * 6);
    for j in 0..vertical {
        for i in 0..radial {
            let a = (j * ring_len + i) as u32;
            let b = a + 1;
            let c = a + ring_len as u32;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use vase_config::{NoiseType, TwistDirection, WaveType};

    fn plain_parameters() -> VaseParameters {
        VaseParameters {
            height: 80.0,
            top_diameter: 50.0,
            bottom_diameter: 30.0,
            radial_amplitude: 0.0,
            vertical_amplitude: 0.0,
            twist_angle_degrees: 0.0,
            surface_noise_type: NoiseType::None,
            radial_segments: 16,
            vertical_segments: 4,
            ..Default::default()
        }
    }

    fn build(params: &VaseParameters) -> SurfaceGrid {
        let formulas = FormulaPair::compile(
            &params.radius_formula,
            &params.vertical_deformation_formula,
        );
        let noise = NoiseSource::new(params.surface_noise_type, params.noise_seed);
        build_surface(params, &formulas, &noise)
    }

    fn radius_xz(p: Vec3) -> f32 {
        (p.x * p.x + p.z * p.z).sqrt()
    }

    #[test]
    fn test_twist_amount() {
        assert_eq!(twist_amount(TwistRate::Linear, 0.0, 270.0), 0.0);
        assert_eq!(twist_amount(TwistRate::Exponential, 1.0, 270.0), 270.0);
        assert_eq!(twist_amount(TwistRate::Linear, 0.5, 90.0), 45.0);
        assert_eq!(twist_amount(TwistRate::Exponential, 0.5, 90.0), 22.5);
    }

    #[test]
    fn test_grid_sizes() {
        let grid = build(&plain_parameters());
        assert_eq!(grid.mesh.vertex_count(), 17 * 5);
        assert_eq!(grid.mesh.triangle_count(), 16 * 4 * 2);
        assert!(grid.mesh.indices_in_range());
        assert_eq!(grid.fallback_points, 0);
    }

    #[test]
    fn test_identity_rings_match_diameters() {
        let params = plain_parameters();
        let grid = build(&params);
        let ring_len = params.ring_len();
        let top = params.vertical_segments as usize * ring_len;

        for i in 0..ring_len {
            let bottom = grid.mesh.positions[i];
            assert!((radius_xz(bottom) - 15.0).abs() < 1e-4);
            assert!(bottom.y.abs() < 1e-6);

            let top = grid.mesh.positions[top + i];
            assert!((radius_xz(top) - 25.0).abs() < 1e-4);
            assert!((top.y - 80.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_seam_column_is_closed() {
        let params = VaseParameters {
            radial_amplitude: 3.0,
            radial_wave_type: WaveType::Square,
            vertical_amplitude: 2.0,
            twist_angle_degrees: 75.0,
            twist_direction: TwistDirection::Counterclockwise,
            surface_noise_type: NoiseType::Perlin,
            surface_noise_amount: 1.5,
            ..plain_parameters()
        };
        let grid = build(&params);
        let ring_len = params.ring_len();
        for j in 0..params.ring_count() {
            let first = grid.mesh.positions[j * ring_len];
            let last = grid.mesh.positions[j * ring_len + ring_len - 1];
            assert!(first.distance(last) < 1e-3, "seam open on ring {}", j);
        }
    }

    #[test]
    fn test_winding_faces_outward() {
        let grid = build(&plain_parameters());
        for [a, b, c] in grid.mesh.triangles() {
            let (pa, pb, pc) = (
                grid.mesh.positions[a as usize],
                grid.mesh.positions[b as usize],
                grid.mesh.positions[c as usize],
            );
            let normal = (pb - pa).cross(pc - pa);
            let centroid = (pa + pb + pc) / 3.0;
            let outward = Vec3::new(centroid.x, 0.0, centroid.z);
            assert!(normal.dot(outward) > 0.0);
        }
    }

    #[test]
    fn test_radial_wave_modulates_radius() {
        let params = VaseParameters {
            radial_amplitude: 2.0,
            radial_frequency: 4.0,
            radial_wave_type: WaveType::Square,
            ..plain_parameters()
        };
        let grid = build(&params);
        // Square wave is +1 at angle 0, so the bottom radius grows by 2
        assert!((radius_xz(grid.mesh.positions[0]) - 17.0).abs() < 1e-4);
    }

    #[test]
    fn test_vertical_formula_deforms_height() {
        let params = VaseParameters {
            vertical_deformation_formula: "y + 5".to_string(),
            ..plain_parameters()
        };
        let grid = build(&params);
        assert!((grid.mesh.positions[0].y - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_runtime_failure_uses_geometric_fallback() {
        // Valid on the validation scope but divides by zero at angle 0
        let params = VaseParameters {
            radius_formula: "r * 2 + 1 / angle".to_string(),
            ..plain_parameters()
        };
        let grid = build(&params);
        assert_eq!(grid.mesh.vertex_count(), 17 * 5);
        // Only the i = 0 column has angle exactly 0
        assert_eq!(grid.fallback_points, 5);
        assert!((radius_xz(grid.mesh.positions[0]) - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_out_of_range_result_uses_geometric_fallback() {
        // Finite as f64 everywhere, beyond f32::MAX only on the seam column
        let params = VaseParameters {
            radius_formula: "r + 1e40 * max(0, angle - 6)".to_string(),
            ..plain_parameters()
        };
        let grid = build(&params);
        assert_eq!(grid.fallback_points, 5);
        assert!(grid.mesh.positions.iter().all(|p| p.is_finite()));

        let seam = params.radial_segments as usize;
        assert!((radius_xz(grid.mesh.positions[seam]) - 15.0).abs() < 1e-4);
        assert!((radius_xz(grid.mesh.positions[seam - 1]) - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_twist_rotates_top_ring() {
        let params = VaseParameters {
            twist_angle_degrees: 90.0,
            ..plain_parameters()
        };
        let grid = build(&params);
        let top = params.vertical_segments as usize * params.ring_len();
        let p = grid.mesh.positions[top];
        // angle 0 twisted by +90 degrees lands on +z
        assert!(p.x.abs() < 1e-3);
        assert!((p.z - 25.0).abs() < 1e-3);
    }
}
