//! The three per-clone density update variants (§4.5), dispatched as a
//! small enum over otherwise-independent behaviors rather than trait
//! objects, since the variant set is closed.
use crate::config::{ImmuneSystemParameters, ParasiteDensityLevels};
use crate::host::clone::ClonalParasitePopulation;
use crate::host::drug_action;
use crate::host::immune_system::ImmuneSystem;
use crate::random::Random;

#[derive(Debug, Clone, Copy, Default)]
pub enum DensityUpdateFunction {
    #[default]
    None,
    ClinicalProgression,
    ImmuneClearance,
    HavingDrug,
}

impl DensityUpdateFunction {
    /// Runs with `(clone, duration)` where `duration = current_time -
    /// SHCPP.latest_update_time`. If `None`, the density is left unchanged.
    /// `combined_kill_rate` is only consulted by `HavingDrug`, where it is
    /// the daily kill fraction from every drug currently in the host's
    /// blood against this clone's genotype (§4.3, §4.6).
    pub fn apply(
        &self,
        clone: &mut ClonalParasitePopulation,
        duration: i64,
        fitness: f64,
        immune_system: &ImmuneSystem,
        immune_theta: f64,
        immune_params: &ImmuneSystemParameters,
        density_levels: &ParasiteDensityLevels,
        combined_kill_rate: f64,
        rng: &mut Random,
    ) {
        match self {
            DensityUpdateFunction::None => {}
            DensityUpdateFunction::ClinicalProgression => {
                clone.last_update_log10_parasite_density = rng
                    .uniform(
                        density_levels.log_parasite_density_clinical_from,
                        density_levels.log_parasite_density_clinical_to,
                    )
                    .unwrap_or(density_levels.log_parasite_density_clinical_from);
            }
            DensityUpdateFunction::ImmuneClearance => {
                clone.last_update_log10_parasite_density = immune_system.get_parasite_size_after_t_days(
                    duration as f64,
                    clone.last_update_log10_parasite_density,
                    fitness,
                    immune_theta,
                    immune_params,
                );
            }
            DensityUpdateFunction::HavingDrug => {
                clone.last_update_log10_parasite_density = drug_action::perform_drug_action(
                    clone.last_update_log10_parasite_density,
                    combined_kill_rate,
                    density_levels.log_parasite_density_cured,
                );
            }
        }
    }
}
