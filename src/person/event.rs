//! Scheduled per-person events (§4.6) and the context they execute against.
//! A plain enum dispatched by a free function rather than a trait object,
//! since the event set is closed and each variant needs a different slice
//! of shared state.
use crate::config::{
    EpidemiologicalParameters, ImmuneSystemParameters, ParasiteDensityLevels, TherapyConfig,
};
use crate::drug::DrugDb;
use crate::genotype::GenotypeDb;
use crate::location::Location;
use crate::mdc::ModelDataCollector;
use crate::person::Person;
use crate::random::Random;
use crate::strategy::coverage::CoverageModel;
use crate::strategy::StrategyDb;

#[derive(Debug, Clone)]
pub enum PersonEvent {
    MoveParasiteToBlood {
        genotype_id: crate::genotype::GenotypeId,
    },
    ProgressToClinical {
        clone_token: u64,
    },
    EndClinical {
        clone_token: u64,
    },
    ReceiveTherapy {
        therapy_id: usize,
        is_recrudescence: bool,
    },
    TestTreatmentFailure {
        therapy_id: usize,
        clone_token: u64,
    },
    ReturnToResidence,
    CirculateToTargetLocation {
        target_location: usize,
    },
    /// A treated clinical case died anyway: counts against the therapy's
    /// rolling treatment-failure rate, not just as a malaria death (§4.11).
    ReportTreatmentFailureDeath {
        therapy_id: usize,
    },
}

/// Bundles the process-wide collaborators an event needs without giving it
/// mutable access to the whole [`crate::population::Population`].
pub struct EventContext<'a> {
    pub genotype_db: &'a mut GenotypeDb,
    pub drug_db: &'a DrugDb,
    pub therapy_db: &'a [TherapyConfig],
    pub strategy_db: &'a StrategyDb,
    pub coverage_model: &'a CoverageModel,
    pub locations: &'a [Location],
    pub immune_params: &'a ImmuneSystemParameters,
    pub density_levels: &'a ParasiteDensityLevels,
    pub epi_params: &'a EpidemiologicalParameters,
    pub mdc: &'a mut ModelDataCollector,
    pub rng: &'a mut Random,
    pub current_day: i64,
    pub current_strategy_id: usize,
}

/// Executes one due event against `person`. Errors from malformed genotype
/// operations are logged and the event is dropped; they never abort the
/// day's tick (§7 per-event error policy).
pub fn execute(person: &mut Person, event: PersonEvent, ctx: &mut EventContext) {
    match event {
        PersonEvent::MoveParasiteToBlood { genotype_id } => {
            person.move_parasite_to_blood(genotype_id, ctx);
        }
        PersonEvent::ProgressToClinical { clone_token } => {
            person.progress_to_clinical(clone_token, ctx);
        }
        PersonEvent::EndClinical { clone_token } => {
            person.end_clinical(clone_token, ctx);
        }
        PersonEvent::ReceiveTherapy {
            therapy_id,
            is_recrudescence,
        } => {
            person.receive_therapy(therapy_id, is_recrudescence, ctx);
        }
        PersonEvent::TestTreatmentFailure {
            therapy_id,
            clone_token,
        } => {
            person.test_treatment_failure(therapy_id, clone_token, ctx);
        }
        PersonEvent::ReturnToResidence => {
            person.return_to_residence();
        }
        PersonEvent::CirculateToTargetLocation { target_location } => {
            person.circulate_to(target_location, ctx.current_day);
        }
        PersonEvent::ReportTreatmentFailureDeath { therapy_id } => {
            person.report_treatment_failure_death(therapy_id, ctx);
        }
    }
}
