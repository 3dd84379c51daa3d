//! Therapy application (§4.6 "Therapy application"). A therapy is a list of
//! drugs with dosing days; SCTherapy is the one-drug-per-course case,
//! MACTherapy the multi-drug case — both share the same compliance model.
use crate::config::TherapyConfig;
use crate::drug::DrugDb;
use crate::host::drugs_in_blood::DrugsInBlood;
use crate::random::Random;

/// Adds each constituent drug to blood with its dosing days. Compliance is
/// drawn once per drug (Bernoulli on `compliance_probability`); a
/// non-compliant drug is simply never added, so its contribution to the
/// combined kill rate across the course is zero from day one, retaining
/// partial-compliance semantics for multi-agent courses.
pub fn apply_therapy(
    blood: &mut DrugsInBlood,
    therapy: &TherapyConfig,
    _drug_db: &DrugDb,
    current_time: i64,
    rng: &mut Random,
) {
    for (drug_id, &dosing_days) in therapy.drug_ids.iter().zip(therapy.dosing_days.iter()) {
        if rng.uniform_01() < therapy.compliance_probability {
            blood.add(*drug_id, dosing_days, current_time, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_fixtures::sample_drug_db;

    #[test]
    fn full_compliance_adds_every_drug() {
        let drugs = sample_drug_db();
        let mut blood = DrugsInBlood::new();
        let therapy = TherapyConfig {
            id: 0,
            name: "AS".to_string(),
            drug_ids: vec![0],
            dosing_days: vec![3],
            compliance_probability: 1.0,
        };
        let mut rng = Random::new(1);
        apply_therapy(&mut blood, &therapy, &drugs, 0, &mut rng);
        assert!(blood.get(0).is_some());
    }

    #[test]
    fn zero_compliance_adds_nothing() {
        let drugs = sample_drug_db();
        let mut blood = DrugsInBlood::new();
        let therapy = TherapyConfig {
            id: 0,
            name: "AS".to_string(),
            drug_ids: vec![0],
            dosing_days: vec![3],
            compliance_probability: 0.0,
        };
        let mut rng = Random::new(1);
        apply_therapy(&mut blood, &therapy, &drugs, 0, &mut rng);
        assert!(blood.get(0).is_none());
    }
}
