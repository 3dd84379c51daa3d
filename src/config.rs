//! Plain `Deserialize` models of the YAML schema in spec §6. Loading a
//! document from disk is the CLI's job ([`crate::bin`]); the core only
//! consumes these types. Field coverage follows the sections named in §6 one
//! for one; sections the core doesn't directly read (e.g. `rasters`) are
//! still modeled so a document round-trips, but are not interpreted here.
use crate::genotype::Genotype;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub model_settings: ModelSettings,
    pub simulation_timeframe: SimulationTimeframe,
    #[serde(default)]
    pub transmission_settings: TransmissionSettings,
    pub population_demographic: PopulationDemographic,
    pub spatial_settings: SpatialSettings,
    #[serde(default)]
    pub seasonality_settings: SeasonalitySettings,
    pub movement_settings: MovementSettings,
    pub parasite_parameters: ParasiteParameters,
    pub immune_system_parameters: ImmuneSystemParameters,
    pub genotype_parameters: GenotypeParameters,
    pub drug_parameters: DrugParameters,
    pub therapy_parameters: TherapyParameters,
    pub strategy_parameters: StrategyParameters,
    pub epidemiological_parameters: EpidemiologicalParameters,
    pub mosquito_parameters: MosquitoParameters,
    #[serde(default)]
    pub population_events: PopulationEventsConfig,
    #[serde(default)]
    pub treatment_coverage_settings: TreatmentCoverageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    #[serde(default)]
    pub initial_seed_number: u64,
    #[serde(default = "default_days_between_stdout")]
    pub days_between_stdout_output: u32,
    #[serde(default)]
    pub record_genome_db: bool,
}
fn default_days_between_stdout() -> u32 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationTimeframe {
    pub starting_date: String,
    pub ending_date: String,
    pub start_collect_data_day: i64,
    pub start_of_comparison_period: i64,
    pub total_time: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransmissionSettings {
    #[serde(default = "default_transmission_rate")]
    pub transmission_rate: f64,
}
fn default_transmission_rate() -> f64 {
    0.5
}

#[derive(Debug, Clone, Deserialize)]
pub struct PopulationDemographic {
    pub age_structure: Vec<f64>,
    pub number_of_age_classes: usize,
    #[serde(default)]
    pub birth_rate: f64,
    #[serde(default)]
    pub death_rate_by_age_class: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SpatialSettings {
    LocationBased { location_db: Vec<LocationConfig> },
    GridBased { rasters: RasterPaths },
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    pub id: usize,
    pub population_size: u64,
    pub beta: f64,
    pub p_treatment_under_5: f64,
    pub p_treatment_over_5: f64,
    pub prmc_size: usize,
    pub interrupted_feeding_rate: f64,
    #[serde(default)]
    pub movement_weights: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RasterPaths {
    pub population: String,
    pub district: String,
    pub beta: String,
    pub treatment_under_5: String,
    pub treatment_over_5: String,
    pub mosquito_ifr: String,
    pub mosquito_size: String,
}

/// ESRI ASCII grid (`.asc`), NODATA cells skipped. Parsing from disk is a
/// non-core collaborator; this is the in-memory shape the core would read.
#[derive(Debug, Clone)]
pub struct AscGrid {
    pub ncols: usize,
    pub nrows: usize,
    pub xllcorner: f64,
    pub yllcorner: f64,
    pub cellsize: f64,
    pub nodata_value: f64,
    pub cells: Vec<f64>,
}
impl AscGrid {
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        let v = *self.cells.get(row * self.ncols + col)?;
        if v == self.nodata_value {
            None
        } else {
            Some(v)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonalitySettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_one")]
    pub a: f64,
    #[serde(default)]
    pub phi: f64,
    #[serde(default = "default_one")]
    pub min_value: f64,
}
fn default_one() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovementSettings {
    pub spatial_model: String,
    pub circulation_info: CirculationInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CirculationInfo {
    pub number_of_moving_levels: usize,
    pub length_of_stay_theta: f64,
    pub length_of_stay_k: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParasiteParameters {
    pub parasite_density_levels: ParasiteDensityLevels,
    pub recombination_parameters: RecombinationParameters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParasiteDensityLevels {
    pub log_parasite_density_cured: f64,
    pub log_parasite_density_asymptomatic: f64,
    pub log_parasite_density_clinical_from: f64,
    pub log_parasite_density_clinical_to: f64,
    pub log_parasite_density_detectable: f64,
    pub log_parasite_density_detectable_pfpr: f64,
    pub log_parasite_density_from_liver: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecombinationParameters {
    pub within_chromosome_recombination_rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImmuneSystemParameters {
    pub alpha_immune: f64,
    pub beta_immune: f64,
    pub acquire_rate: f64,
    pub acquire_rate_by_age: Vec<(f64, f64)>,
    pub decay_rate: f64,
    pub duration_for_fully_immune: f64,
    pub min_clinical_probability: f64,
    pub max_clinical_probability: f64,
    pub immune_effect_on_progression_to_clinical: f64,
    pub infant_immune_decay_rate: f64,
    pub infant_age_threshold_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenotypeParameters {
    pub chromosome_infos: Vec<ChromosomeInfo>,
    pub mutation_mask: String,
    pub mutation_probability_per_locus: f64,
    #[serde(default)]
    pub override_ec50_patterns: Vec<OverrideEc50Pattern>,
    #[serde(default)]
    pub initial_parasite_info: Vec<InitialParasiteInfo>,
    #[serde(default)]
    pub fitness_costs: Vec<FitnessCost>,
    #[serde(default)]
    pub amino_acid_multipliers: Vec<AaMultiplier>,
    pub max_copies_default: usize,
}

impl GenotypeParameters {
    pub fn aa_multiplier(&self, loc: &ResistantAaLocation, c: char) -> f64 {
        self.amino_acid_multipliers
            .iter()
            .find(|m| {
                m.chromosome == loc.chromosome && m.gene == loc.gene && m.aa_position == loc.aa_position && m.amino_acid == c
            })
            .map(|m| m.multiplier)
            .unwrap_or(1.0)
    }

    /// Absolute index of `loc` within the flattened mutation mask: walks
    /// chromosomes/genes in order, counting one slot per aa-position plus
    /// one trailing slot for the copy-number digit on genes that carry one,
    /// the same concatenation order the `|`/`,`-delimited sequence itself
    /// uses (§4.2 "masked-on by the global mutation mask").
    pub fn absolute_locus_index(&self, loc: &ResistantAaLocation) -> usize {
        let mut index = 0usize;
        for (chrom_idx, chrom_info) in self.chromosome_infos.iter().enumerate() {
            for (gene_idx, gene_info) in chrom_info.genes.iter().enumerate() {
                let has_copy_number = gene_info.max_copies > 1;
                if chrom_idx == loc.chromosome && gene_idx == loc.gene {
                    return index
                        + if loc.is_copy_number {
                            gene_info.aa_positions.len()
                        } else {
                            loc.aa_position
                        };
                }
                index += gene_info.aa_positions.len() + usize::from(has_copy_number);
            }
        }
        index
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AaMultiplier {
    pub chromosome: usize,
    pub gene: usize,
    pub aa_position: usize,
    pub amino_acid: char,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChromosomeInfo {
    pub genes: Vec<GeneInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneInfo {
    pub max_copies: usize,
    pub aa_positions: Vec<AaPositionInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AaPositionInfo {
    pub amino_acids: Vec<char>,
}

/// A resistant amino-acid location referenced by a drug (§3 "DrugType").
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResistantAaLocation {
    pub chromosome: usize,
    pub gene: usize,
    pub aa_position: usize,
    pub is_copy_number: bool,
}

/// Override pattern: a string of amino acids or `.` wildcards per position;
/// any match multiplies the corresponding drug's EC50^n by `multiplier`.
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideEc50Pattern {
    pub drug_id: usize,
    pub pattern: String,
    pub multiplier: f64,
}
impl OverrideEc50Pattern {
    pub fn matches(&self, chromosomes: &[Vec<String>; 14]) -> bool {
        let flat: String = chromosomes
            .iter()
            .map(|genes| genes.join(","))
            .collect::<Vec<_>>()
            .join("|");
        if flat.len() != self.pattern.len() {
            return false;
        }
        flat.chars()
            .zip(self.pattern.chars())
            .all(|(a, b)| b == '.' || a == b)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitialParasiteInfo {
    pub location: usize,
    pub aa_sequence: String,
    pub prevalence: f64,
}

/// Fitness cost of carrying a non-wild-type amino acid at one locus. The
/// product over all loci gives `daily_fitness_multiple_infection`.
#[derive(Debug, Clone, Deserialize)]
pub struct FitnessCost {
    pub chromosome: usize,
    pub gene: usize,
    pub aa_position: usize,
    pub wild_type: char,
    pub cost: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrugParameters {
    pub drug_db: Vec<DrugTypeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrugTypeConfig {
    pub id: usize,
    pub name: String,
    pub drug_half_life: f64,
    pub k_max: f64,
    pub n: f64,
    pub k: f64,
    pub base_ec50: f64,
    pub dosing_days: u32,
    pub mean_drug_absorption: f64,
    pub sd_drug_absorption: f64,
    #[serde(default)]
    pub resistant_aa_locations: Vec<ResistantAaLocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TherapyParameters {
    pub therapy_db: Vec<TherapyConfig>,
    pub recurrence_therapy_id: usize,
    pub tf_testing_day: i64,
    pub tf_rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TherapyConfig {
    pub id: usize,
    pub name: String,
    /// SCTherapy: one entry per drug. MACTherapy: >1 entries scheduled
    /// across `dosing_days`, retaining partial compliance.
    pub drug_ids: Vec<usize>,
    pub dosing_days: Vec<u32>,
    #[serde(default = "default_compliance")]
    pub compliance_probability: f64,
}
fn default_compliance() -> f64 {
    0.9
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyParameters {
    pub initial_strategy_id: usize,
    pub strategy_db: Vec<StrategyConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum StrategyConfig {
    Sft {
        id: usize,
        therapy_id: usize,
    },
    Mft {
        id: usize,
        therapy_ids: Vec<usize>,
        distribution: Vec<f64>,
    },
    MftAgeBased {
        id: usize,
        therapy_ids: Vec<usize>,
        age_boundaries: Vec<f64>,
    },
    Cycling {
        id: usize,
        therapy_ids: Vec<usize>,
        cycle_period_days: i64,
    },
    AdaptiveCycling {
        id: usize,
        therapy_ids: Vec<usize>,
        tf_threshold: f64,
    },
    NestedMft {
        id: usize,
        child_strategy_ids: Vec<usize>,
        start_distribution: Vec<f64>,
        peak_distribution: Vec<f64>,
        peak_after_days: i64,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct EpidemiologicalParameters {
    pub number_of_tracking_days: usize,
    pub tf_window_size: usize,
    pub days_to_clinical_under_five: i64,
    pub days_to_clinical_over_five: i64,
    pub gametocyte_level_full: f64,
    pub inflation_factor: f64,
    pub allow_new_coinfection_to_cause_symptoms: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MosquitoParameters {
    pub mosquito_size: usize,
    pub mosquito_ifr: f64,
    pub record_recombination_events: bool,
    pub within_host_induced_free_recombination: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PopulationEventsConfig {
    #[serde(default)]
    pub events: Vec<PopulationEventConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind")]
pub enum PopulationEventConfig {
    ImportationPeriodically {
        start_day: i64,
        location: usize,
        duration_days: i64,
        daily_rate: f64,
        aa_sequence: String,
    },
    ImportationPeriodicallyV2 {
        start_day: i64,
        location: usize,
        duration_days: i64,
        number_of_cases: u64,
        aa_sequence: String,
    },
    ImportationPeriodicallyRandom {
        start_day: i64,
        location: usize,
        duration_days: i64,
        daily_rate: f64,
    },
    IntroduceMutant {
        start_day: i64,
        location: usize,
        allele_pattern: String,
        mutant_pattern: String,
        target_fraction: f64,
    },
    TreatmentCoverageChange {
        start_day: i64,
        location: usize,
        new_p_treatment_under_5: f64,
        new_p_treatment_over_5: f64,
    },
    StrategyChange {
        start_day: i64,
        new_strategy_id: usize,
    },
}

/// Which treatment-coverage curve a run uses, independent of therapy
/// selection (§4.9). Defaults to `Steady`, reading straight through to each
/// location's configured `p_treatment_under_5`/`p_treatment_over_5`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum TreatmentCoverageConfig {
    #[default]
    Steady,
    Inflated {
        start_day: i64,
        monthly_inflation_factor: f64,
    },
    Linear {
        start_day: i64,
        end_day: i64,
        start_value_under_5: f64,
        start_value_over_5: f64,
        end_value_under_5: f64,
        end_value_over_5: f64,
    },
}

pub(crate) fn genotype_matches_allele(genotype: &Genotype, allele_pattern: &str) -> bool {
    OverrideEc50Pattern {
        drug_id: 0,
        pattern: allele_pattern.to_string(),
        multiplier: 1.0,
    }
    .matches(&genotype.pf_genotype_str)
}

#[cfg(test)]
pub mod test_fixtures {
    use super::*;
    use crate::drug::DrugDb;

    pub fn sample_genotype_parameters() -> GenotypeParameters {
        let mut chromosome_infos = Vec::new();
        for i in 0..14 {
            let max_copies = if i == 0 { 2 } else { 1 };
            chromosome_infos.push(ChromosomeInfo {
                genes: vec![GeneInfo {
                    max_copies,
                    aa_positions: vec![AaPositionInfo {
                        amino_acids: vec!['A', 'C'],
                    }],
                }],
            });
        }
        GenotypeParameters {
            chromosome_infos,
            mutation_mask: "1".repeat(14),
            mutation_probability_per_locus: 1e-3,
            override_ec50_patterns: vec![],
            initial_parasite_info: vec![],
            fitness_costs: vec![FitnessCost {
                chromosome: 0,
                gene: 0,
                aa_position: 0,
                wild_type: 'A',
                cost: 0.1,
            }],
            amino_acid_multipliers: vec![AaMultiplier {
                chromosome: 0,
                gene: 0,
                aa_position: 0,
                amino_acid: 'C',
                multiplier: 4.0,
            }],
            max_copies_default: 1,
        }
    }

    pub fn sample_drug_db() -> DrugDb {
        DrugDb::from_config(&DrugParameters {
            drug_db: vec![DrugTypeConfig {
                id: 0,
                name: "artemisinin".to_string(),
                drug_half_life: 0.5,
                k_max: 0.9,
                n: 15.0,
                k: 4.0,
                base_ec50: 0.5,
                dosing_days: 3,
                mean_drug_absorption: 1.0,
                sd_drug_absorption: 0.1,
                resistant_aa_locations: vec![ResistantAaLocation {
                    chromosome: 0,
                    gene: 0,
                    aa_position: 0,
                    is_copy_number: false,
                }],
            }],
        })
    }
}
