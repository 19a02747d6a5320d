//! Coherent 2-D noise used to roughen the surface.
//!
//! The source is built once per generation from an explicit seed, so two
//! generations with the same parameters produce the same mesh.

use noise::{NoiseFn, OpenSimplex, Perlin, Worley};
use vase_config::NoiseType;

/// Seeded noise sampler for one generation pass.
pub enum NoiseSource {
    None,
    Perlin(Perlin),
    Simplex(OpenSimplex),
    Voronoi(Worley),
}

impl NoiseSource {
    pub fn new(kind: NoiseType, seed: u32) -> Self {
        match kind {
            NoiseType::None => NoiseSource::None,
            NoiseType::Perlin => NoiseSource::Perlin(Perlin::new(seed)),
            NoiseType::Simplex => NoiseSource::Simplex(OpenSimplex::new(seed)),
            NoiseType::Voronoi => NoiseSource::Voronoi(Worley::new(seed)),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, NoiseSource::None)
    }

    /// Raw noise value at `(x, y)`, roughly in [-1, 1].
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let value = match self {
            NoiseSource::None => 0.0,
            NoiseSource::Perlin(n) => n.get([x, y]),
            NoiseSource::Simplex(n) => n.get([x, y]),
            NoiseSource::Voronoi(n) => n.get([x, y]),
        };
        if value.is_finite() { value } else { 0.0 }
    }

    /// Sample at surface coordinates `(u, v)` with the noise tiled across u.
    ///
    /// Coordinates are scaled by `scale * 10`. The value at `u` is blended
    /// with the value one period to the left so that `u = 0` and `u = 1`
    /// return the same sample and the seam column stays closed.
    ///
    /// Only `u = 0` matches a direct [`sample`](Self::sample) at
    /// `(u * scale * 10, v * scale * 10)`. Interior points mix two unrelated
    /// samples, so their texture is smoother and lower in contrast than the
    /// raw noise at the same coordinates.
    pub fn sample_surface(&self, u: f64, v: f64, scale: f64) -> f64 {
        if self.is_none() {
            return 0.0;
        }
        let period = scale * 10.0;
        let y = v * period;
        let here = self.sample(u * period, y);
        let wrapped = self.sample((u - 1.0) * period, y);
        here * (1.0 - u) + wrapped * u
    }
}
