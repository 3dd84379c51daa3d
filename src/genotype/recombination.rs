//! Free recombination of two parental genotypes in the mosquito midgut
//! (§4.2 "Free recombination").
use super::Genotype;
use crate::error::DomainError;
use crate::random::Random;

/// For each chromosome independently: a single gene flips a coin between
/// parents; multiple genes either cut-and-splice with probability
/// `within_chromosome_recombination_rate` or are copied whole from one
/// parent. Returns the interned-ready child sequence.
pub fn free_recombination(
    father: &Genotype,
    mother: &Genotype,
    within_chromosome_recombination_rate: f64,
    rng: &mut Random,
) -> Result<String, DomainError> {
    let mut child_chromosomes: Vec<String> = Vec::with_capacity(14);
    for i in 0..14 {
        let father_genes = &father.pf_genotype_str[i];
        let mother_genes = &mother.pf_genotype_str[i];
        let gene_count = father_genes.len();
        let chromosome_str = if gene_count <= 1 {
            let from_father = rng.uniform_01() < 0.5;
            if from_father {
                father_genes.join(",")
            } else {
                mother_genes.join(",")
            }
        } else if rng.uniform_01() < within_chromosome_recombination_rate {
            let cut = 1 + rng.uniform_usize(gene_count.saturating_sub(1).max(1));
            let father_first = rng.uniform_01() < 0.5;
            let (top, bottom) = if father_first {
                (father_genes, mother_genes)
            } else {
                (mother_genes, father_genes)
            };
            let mut genes: Vec<String> = top[..cut].to_vec();
            genes.extend_from_slice(&bottom[cut..]);
            genes.join(",")
        } else {
            let from_father = rng.uniform_01() < 0.5;
            if from_father {
                father_genes.join(",")
            } else {
                mother_genes.join(",")
            }
        };
        child_chromosomes.push(chromosome_str);
    }
    Ok(child_chromosomes.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_fixtures::{sample_drug_db, sample_genotype_parameters};
    use crate::genotype::GenotypeDb;

    #[test]
    fn zero_rate_reproduces_a_whole_parent_chromosome() {
        let mut db = GenotypeDb::new(sample_genotype_parameters());
        let drugs = sample_drug_db();
        let father = db.get("A1|A|A|A|A|A|A|A|A|A|A|A|A|A", &drugs).unwrap();
        let mother = db.get("C1|A|A|A|A|A|A|A|A|A|A|A|A|A", &drugs).unwrap();
        let mut rng = Random::new(5);
        for _ in 0..20 {
            let child_seq = free_recombination(db.at(father), db.at(mother), 0.0, &mut rng).unwrap();
            assert!(child_seq == "A1|A|A|A|A|A|A|A|A|A|A|A|A|A" || child_seq == "C1|A|A|A|A|A|A|A|A|A|A|A|A|A");
        }
    }
}
