//! Canonical pool of amino-acid-sequence genotypes (§3 "Genotype", §4.2).
//!
//! Mirrors the interning discipline of a value-like `Genotype` owned by a
//! process-wide database: a [`Genotype`] is only ever constructed by
//! [`GenotypeDb::get`], which guarantees pointer/id equality for
//! equal sequences.
pub mod mutation;
pub mod recombination;

use crate::config::GenotypeParameters;
use crate::drug::DrugDb;
use crate::error::DomainError;
use crate::random::Random;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Opaque handle into [`GenotypeDb`]. Two clones of the same id are the same
/// genotype: comparisons and hashing go through `id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenotypeId(pub u32);

/// A single interned genotype. `EC50_power_n` is indexed by `drug_id`.
#[derive(Debug, Clone)]
pub struct Genotype {
    pub id: GenotypeId,
    pub aa_sequence: String,
    /// `pf_genotype_str[chromosome][gene]`, chromosomes split on `|`, genes on `,`.
    pub pf_genotype_str: [Vec<String>; 14],
    pub daily_fitness_multiple_infection: f64,
    pub ec50_power_n: Vec<f64>,
}

impl Genotype {
    /// Parses the `|`-then-`,` syntax of §6 "Genotype syntax" without
    /// validating it against a schema (validation is [`GenotypeDb::get`]'s job).
    fn parse_structure(aa_sequence: &str) -> [Vec<String>; 14] {
        let mut chromosomes: [Vec<String>; 14] = Default::default();
        for (i, chrom_str) in aa_sequence.split('|').enumerate().take(14) {
            chromosomes[i] = chrom_str.split(',').map(|s| s.to_string()).collect();
        }
        chromosomes
    }

    pub fn resists(&self, drug_id: usize, base_ec50_power_n: f64) -> bool {
        self.ec50_power_n[drug_id] > base_ec50_power_n
    }
}

/// Process-wide interning store keyed by `aa_sequence` (§4.2).
pub struct GenotypeDb {
    by_sequence: FxHashMap<String, GenotypeId>,
    by_id: Vec<Arc<Genotype>>,
    params: GenotypeParameters,
}

impl GenotypeDb {
    pub fn new(params: GenotypeParameters) -> Self {
        Self {
            by_sequence: FxHashMap::default(),
            by_id: Vec::new(),
            params,
        }
    }

    pub fn size(&self) -> usize {
        self.by_id.len()
    }

    pub fn params(&self) -> &GenotypeParameters {
        &self.params
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Genotype>> {
        self.by_id.iter()
    }

    pub fn at(&self, id: GenotypeId) -> &Arc<Genotype> {
        &self.by_id[id.0 as usize]
    }

    /// Validates `seq` against the configured chromosome/gene/aa-position
    /// schema: per-gene length, allowed alphabet, and copy-number
    /// digit in `[1, max_copies]`.
    fn validate(&self, chromosomes: &[Vec<String>; 14]) -> Result<(), DomainError> {
        for (chrom_idx, chrom_info) in self.params.chromosome_infos.iter().enumerate() {
            let genes = &chromosomes[chrom_idx];
            if genes.len() != chrom_info.genes.len() {
                return Err(DomainError::MalformedSequence(format!(
                    "chromosome {chrom_idx}: expected {} genes, found {}",
                    chrom_info.genes.len(),
                    genes.len()
                )));
            }
            for (gene_idx, gene_info) in chrom_info.genes.iter().enumerate() {
                let gene_str = &genes[gene_idx];
                let chars: Vec<char> = gene_str.chars().collect();
                let has_copy_number = gene_info.max_copies > 1;
                let max_aa_pos = if has_copy_number {
                    chars.len().saturating_sub(1)
                } else {
                    chars.len()
                };
                if max_aa_pos != gene_info.aa_positions.len() {
                    return Err(DomainError::MalformedSequence(format!(
                        "gene {gene_str}: aa-position count mismatch"
                    )));
                }
                for (aa_idx, aa_info) in gene_info.aa_positions.iter().enumerate() {
                    let c = chars[aa_idx];
                    if !aa_info.amino_acids.contains(&c) {
                        return Err(DomainError::MalformedSequence(format!(
                            "illegal amino acid '{c}' at position {aa_idx} of gene {gene_str}"
                        )));
                    }
                }
                if has_copy_number {
                    let copy_digit = *chars.last().unwrap();
                    let copies = copy_digit.to_digit(10).ok_or_else(|| {
                        DomainError::MalformedSequence(format!(
                            "missing copy-number digit in gene {gene_str}"
                        ))
                    })?;
                    if copies < 1 || copies as usize > gene_info.max_copies {
                        return Err(DomainError::MalformedSequence(format!(
                            "copy number {copies} out of [1,{}] in gene {gene_str}",
                            gene_info.max_copies
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// (baseEC50 . aa-multipliers . cnv-multipliers)^n for every drug, then
    /// applies matching override patterns.
    fn compute_ec50_power_n(&self, chromosomes: &[Vec<String>; 14], drug_db: &DrugDb) -> Vec<f64> {
        let mut out = Vec::with_capacity(drug_db.len());
        for drug in drug_db.iter() {
            let mut multiplier = 1.0f64;
            for loc in &drug.resistant_aa_locations {
                if let Some(gene_str) = chromosomes
                    .get(loc.chromosome)
                    .and_then(|g| g.get(loc.gene))
                {
                    let chars: Vec<char> = gene_str.chars().collect();
                    if loc.is_copy_number {
                        if let Some(c) = chars.last() {
                            let copies = c.to_digit(10).unwrap_or(1) as f64;
                            multiplier *= copies;
                        }
                    } else if let Some(&c) = chars.get(loc.aa_position) {
                        multiplier *= self.params.aa_multiplier(loc, c);
                    }
                }
            }
            let base = drug.base_ec50.powf(drug.n);
            let mut ec50_n = (drug.base_ec50 * multiplier).powf(drug.n).max(base);
            for pattern in &self.params.override_ec50_patterns {
                if pattern.drug_id == drug.id && pattern.matches(chromosomes) {
                    ec50_n *= pattern.multiplier;
                }
            }
            out.push(ec50_n);
        }
        out
    }

    fn compute_daily_fitness(&self, chromosomes: &[Vec<String>; 14]) -> f64 {
        let mut fitness = 1.0f64;
        for cost in &self.params.fitness_costs {
            if let Some(gene_str) = chromosomes
                .get(cost.chromosome)
                .and_then(|g| g.get(cost.gene))
            {
                if let Some(&c) = gene_str.as_bytes().get(cost.aa_position) {
                    if c as char != cost.wild_type {
                        fitness *= 1.0 - cost.cost;
                    }
                }
            }
        }
        fitness.clamp(f64::EPSILON, 1.0)
    }

    /// Idempotent lookup-or-create. Validates the sequence, computes
    /// fitness and EC50^n, and interns the result.
    pub fn get(&mut self, seq: &str, drug_db: &DrugDb) -> Result<GenotypeId, DomainError> {
        if let Some(id) = self.by_sequence.get(seq) {
            return Ok(*id);
        }
        let chromosomes = Genotype::parse_structure(seq);
        self.validate(&chromosomes)?;
        let id = GenotypeId(self.by_id.len() as u32);
        let genotype = Genotype {
            id,
            aa_sequence: seq.to_string(),
            daily_fitness_multiple_infection: self.compute_daily_fitness(&chromosomes),
            ec50_power_n: self.compute_ec50_power_n(&chromosomes, drug_db),
            pf_genotype_str: chromosomes,
        };
        self.by_id.push(Arc::new(genotype));
        self.by_sequence.insert(seq.to_string(), id);
        Ok(id)
    }

    /// Recombines a child sequence from `father`/`mother` via
    /// [`recombination::free_recombination`] and interns it.
    pub fn recombine(
        &mut self,
        father: GenotypeId,
        mother: GenotypeId,
        within_chromosome_recombination_rate: f64,
        drug_db: &DrugDb,
        rng: &mut Random,
    ) -> Result<GenotypeId, DomainError> {
        let father_g = self.at(father).clone();
        let mother_g = self.at(mother).clone();
        let child_seq = recombination::free_recombination(
            &father_g,
            &mother_g,
            within_chromosome_recombination_rate,
            rng,
        )?;
        self.get(&child_seq, drug_db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_fixtures::{sample_drug_db, sample_genotype_parameters};

    #[test]
    fn interning_is_idempotent() {
        let mut db = GenotypeDb::new(sample_genotype_parameters());
        let drugs = sample_drug_db();
        let seq = "A1|A|A|A|A|A|A|A|A|A|A|A|A|A";
        let id1 = db.get(seq, &drugs).unwrap();
        let id2 = db.get(seq, &drugs).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(db.size(), 1);
    }

    #[test]
    fn distinct_sequences_get_distinct_ids() {
        let mut db = GenotypeDb::new(sample_genotype_parameters());
        let drugs = sample_drug_db();
        let id1 = db.get("A1|A|A|A|A|A|A|A|A|A|A|A|A|A", &drugs).unwrap();
        let id2 = db.get("C1|A|A|A|A|A|A|A|A|A|A|A|A|A", &drugs).unwrap();
        assert_ne!(id1, id2);
    }

    #[test]
    fn rejects_illegal_amino_acid() {
        let mut db = GenotypeDb::new(sample_genotype_parameters());
        let drugs = sample_drug_db();
        assert!(db.get("Z1|A|A|A|A|A|A|A|A|A|A|A|A|A", &drugs).is_err());
    }
}
