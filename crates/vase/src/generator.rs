//! Full generation pipeline.
//!
//! Parameters → formula cache → surface grid → tabs → normals. Only the
//! structural parameter check can fail; once geometry building starts every
//! problem is recovered locally and a complete mesh is returned.

use tracing::info;
use vase_config::VaseParameters;

use crate::cache::FormulaCache;
use crate::error::GenerateError;
use crate::mesh::Mesh;
use crate::noise_source::NoiseSource;
use crate::normals::compute_vertex_normals_with_seams;
use crate::surface::build_surface;
use crate::tabs::{TabRings, TabSpec, extrude_tabs};

/// What happened during one generation, for hosts that surface warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationStats {
    /// The radius formula did not compile and its fallback was used
    pub radius_formula_fell_back: bool,
    /// The vertical formula did not compile and its fallback was used
    pub vertical_formula_fell_back: bool,
    /// Surface points where a formula failed and the geometric fallback was used
    pub fallback_points: usize,
    /// Vertex count of the untabbed surface grid
    pub surface_vertices: usize,
    /// Triangle count of the untabbed surface grid
    pub surface_triangles: usize,
    pub tab_rings: TabRings,
}

/// A finished mesh together with its generation stats.
#[derive(Debug, Clone)]
pub struct Generation {
    pub mesh: Mesh,
    pub stats: GenerationStats,
}

/// Generates vase meshes, reusing compiled formulas between calls.
///
/// The cache is the only state kept between calls. Each call takes its own
/// snapshot of the parameters and returns an owned mesh.
#[derive(Debug, Default)]
pub struct VaseGenerator {
    formulas: FormulaCache,
}

impl VaseGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Formula cache, for inspecting hit counts or forcing recompilation
    pub fn formula_cache(&mut self) -> &mut FormulaCache {
        &mut self.formulas
    }

    /// Generate a mesh with normals from a parameter set.
    pub fn generate(&mut self, params: &VaseParameters) -> Result<Generation, GenerateError> {
        params.validate()?;

        let formulas = self
            .formulas
            .get_or_compile(&params.radius_formula, &params.vertical_deformation_formula);

        let noise = NoiseSource::new(params.surface_noise_type, params.noise_seed);
        let surface = build_surface(params, &formulas, &noise);

        let mut stats = GenerationStats {
            radius_formula_fell_back: formulas.radius.used_fallback(),
            vertical_formula_fell_back: formulas.vertical.used_fallback(),
            fallback_points: surface.fallback_points,
            surface_vertices: surface.mesh.vertex_count(),
            surface_triangles: surface.mesh.triangle_count(),
            tab_rings: TabRings::default(),
        };

        let mut mesh = if !params.has_top_tab() && !params.has_bottom_tab() {
            surface.mesh
        } else {
            let tabs = TabSpec {
                radial_segments: params.radial_segments,
                vertical_segments: params.vertical_segments,
                top_height: params.top_tab_height,
                bottom_height: params.bottom_tab_height,
            };
            let (mesh, rings) = extrude_tabs(&surface.mesh, &tabs);
            stats.tab_rings = rings;
            mesh
        };

        let ring_len = params.ring_len();
        let ring_starts: Vec<usize> = (0..params.ring_count())
            .map(|j| j * ring_len)
            .chain(stats.tab_rings.bottom)
            .chain(stats.tab_rings.top)
            .collect();
        compute_vertex_normals_with_seams(&mut mesh, &ring_starts, ring_len);

        info!(
            "Generated vase: {} vertices, {} triangles ({} fallback points)",
            mesh.vertex_count(),
            mesh.triangle_count(),
            stats.fallback_points
        );

        Ok(Generation { mesh, stats })
    }
}

/// Generate a mesh without keeping a formula cache.
pub fn generate(params: &VaseParameters) -> Result<Mesh, GenerateError> {
    VaseGenerator::new().generate(params).map(|g| g.mesh)
}
