//! Mutation of a clone's genotype under drug pressure (§4.2 "Mutation under
//! drug"). One candidate is drawn per (clone, drug, day); it is adopted only
//! if it confers strictly more resistance than the current genotype.
use super::{GenotypeDb, GenotypeId};
use crate::config::{GenotypeParameters, ResistantAaLocation};
use crate::drug::DrugDb;
use crate::error::DomainError;
use crate::random::Random;

/// Returns `Some(new_genotype)` if a mutation was drawn and adopted for
/// `drug_id` at `mutation_probability_per_locus`, else `None`.
pub fn try_mutate_under_drug(
    db: &mut GenotypeDb,
    params: &GenotypeParameters,
    current: GenotypeId,
    drug_id: usize,
    drug_db: &DrugDb,
    mutation_probability_per_locus: f64,
    rng: &mut Random,
) -> Result<Option<GenotypeId>, DomainError> {
    let drug = &drug_db.at(drug_id);
    let mutation_mask: Vec<char> = params.mutation_mask.chars().collect();
    let mut adopted: Option<GenotypeId> = None;
    for loc in drug.resistant_aa_locations.iter() {
        let locus_idx = params.absolute_locus_index(loc);
        if mutation_mask.get(locus_idx).copied().unwrap_or('0') != '1' {
            continue;
        }
        if rng.uniform_01() >= mutation_probability_per_locus {
            continue;
        }
        let current_genotype = db.at(current).clone();
        let candidate_seq = mutate_one_locus(&current_genotype.pf_genotype_str, loc, params, rng)?;
        let candidate_id = db.get(&candidate_seq, drug_db)?;
        let candidate = db.at(candidate_id);
        let current_ec50 = db.at(current).ec50_power_n[drug.id];
        if candidate.ec50_power_n[drug.id] > current_ec50 {
            adopted = Some(candidate_id);
            break; // at most one adoption per (clone, drug, day)
        }
    }
    Ok(adopted)
}

fn mutate_one_locus(
    chromosomes: &[Vec<String>; 14],
    loc: &ResistantAaLocation,
    params: &GenotypeParameters,
    rng: &mut Random,
) -> Result<String, DomainError> {
    let mut chromosomes = chromosomes.clone();
    let gene_info = &params.chromosome_infos[loc.chromosome].genes[loc.gene];
    let mut chars: Vec<char> = chromosomes[loc.chromosome][loc.gene].chars().collect();
    if loc.is_copy_number {
        let last = chars.len() - 1;
        let current = chars[last].to_digit(10).unwrap_or(1) as i32;
        let step = if rng.uniform_01() < 0.5 { 1 } else { -1 };
        let next = (current + step).clamp(1, gene_info.max_copies as i32);
        chars[last] = std::char::from_digit(next as u32, 10).unwrap();
    } else {
        let alphabet = &gene_info.aa_positions[loc.aa_position].amino_acids;
        let current = chars[loc.aa_position];
        let choices: Vec<char> = alphabet.iter().copied().filter(|&c| c != current).collect();
        if choices.is_empty() {
            return Err(DomainError::MalformedSequence(
                "no alternate amino acid available for mutation".to_string(),
            ));
        }
        let pick = choices[rng.uniform_usize(choices.len())];
        chars[loc.aa_position] = pick;
    }
    chromosomes[loc.chromosome][loc.gene] = chars.into_iter().collect();
    Ok(chromosomes
        .iter()
        .map(|genes| genes.join(","))
        .collect::<Vec<_>>()
        .join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_fixtures::{sample_drug_db, sample_genotype_parameters};

    #[test]
    fn mutation_only_adopted_when_more_resistant() {
        let params = sample_genotype_parameters();
        let mut db = GenotypeDb::new(params.clone());
        let drugs = sample_drug_db();
        let wild = db.get("A1|A|A|A|A|A|A|A|A|A|A|A|A|A", &drugs).unwrap();
        let mut rng = Random::new(99);
        let mut any_adopted = false;
        for _ in 0..500 {
            if let Some(new_id) =
                try_mutate_under_drug(&mut db, &params, wild, 0, &drugs, 1.0, &mut rng).unwrap()
            {
                assert!(db.at(new_id).ec50_power_n[0] > db.at(wild).ec50_power_n[0]);
                any_adopted = true;
            }
        }
        assert!(any_adopted);
    }
}
