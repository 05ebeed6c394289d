// Indexing convention for solids arrays, used throughout the crate:
// slot 0 is the running total over all classes and classes occupy slots
// 1..=nsolids, so a per-class vector always has length nsolids + 1.

use crate::grid::GRAVITY;

/// Kinematic viscosity of water at ~20 C (m2/s), used for the Stokes
/// fallback when no settling velocity is given.
const KINEMATIC_VISCOSITY: f64 = 1.0e-6;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Cohesion {
    #[default]
    NonCohesive,
    Cohesive,
}

/// One suspended-solids (particle) class.
#[derive(Debug, Clone, Default)]
pub struct SolidsClass {
    pub name: String,
    pub ds: f64,               //grain diameter (m)
    pub specific_gravity: f64, //dimensionless
    pub settling_velocity: f64, //ws (m/s)
    pub tce: f64,              //critical shear stress for erosion (N/m2)
    pub tcd: f64,              //critical shear stress for deposition (N/m2)
    pub z_age: f64,            //erosion depth scale (m)
    pub cohesion: Cohesion,
    pub group: usize, //reporting group (1-based; group 0 reports the sum)
}

impl SolidsClass {
    /// Stokes settling velocity for the class grain size. Used when the
    /// deck does not specify a settling velocity directly.
    pub fn stokes_settling_velocity(ds: f64, specific_gravity: f64) -> f64 {
        GRAVITY * (specific_gravity - 1.0) * ds * ds / (18.0 * KINEMATIC_VISCOSITY)
    }

    /// Dry bulk density of this class packed at the given porosity (kg/m3).
    pub fn bulk_density(&self, porosity: f64) -> f64 {
        self.specific_gravity * 1000.0 * (1.0 - porosity)
    }
}

/// The full set of solids classes for a run.
#[derive(Debug, Clone, Default)]
pub struct SolidsCatalog {
    pub classes: Vec<SolidsClass>, //0-based storage; class s lives at classes[s - 1]
    pub n_groups: usize,
}

impl SolidsCatalog {
    pub fn new(classes: Vec<SolidsClass>) -> SolidsCatalog {
        let n_groups = classes.iter().map(|c| c.group).max().unwrap_or(0);
        SolidsCatalog { classes, n_groups }
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Class by 1-based index (the indexing used in all per-class arrays).
    pub fn class(&self, s: usize) -> &SolidsClass {
        &self.classes[s - 1]
    }
}
