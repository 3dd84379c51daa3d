//! A single parasite clone inside one host (§3 "ClonalParasitePopulation").
use crate::genotype::GenotypeId;
use crate::host::density_update::DensityUpdateFunction;

/// Default density floor, in log10 parasites/uL, used before a clone's first
/// density is set.
pub const LOG_ZERO: f64 = -1000.0;

/// A clone's index into its owning [`super::shcpp::SingleHostClonalParasitePopulations`]
/// vector; kept in sync by the owner on every swap-remove.
#[derive(Debug, Clone)]
pub struct ClonalParasitePopulation {
    index: usize,
    /// Stable identity surviving swap-removal elsewhere in the vector, used
    /// by scheduled events (e.g. `ProgressToClinicalEvent`) to check the
    /// causative clone is still present (§4.6).
    pub token: u64,
    pub genotype_id: GenotypeId,
    pub last_update_log10_parasite_density: f64,
    pub gametocyte_level: f64,
    pub first_date_in_blood: i64,
    pub update_function: DensityUpdateFunction,
}

impl ClonalParasitePopulation {
    pub fn new(index: usize, token: u64, genotype_id: GenotypeId, first_date_in_blood: i64) -> Self {
        Self {
            index,
            token,
            genotype_id,
            last_update_log10_parasite_density: LOG_ZERO,
            gametocyte_level: 0.0,
            first_date_in_blood,
            update_function: DensityUpdateFunction::None,
        }
    }

    pub fn get_index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn set_gametocyte_level(&mut self, level: f64) {
        self.gametocyte_level = level.clamp(0.0, 1.0 - f64::EPSILON);
    }

    pub fn is_cured(&self, cured_threshold: f64) -> bool {
        self.last_update_log10_parasite_density <= cured_threshold + 1e-5
    }
}
