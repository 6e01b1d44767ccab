//! Process-wide species bookkeeping consumed by the outer simulator.
//!
//! The singleton instance lives in [`crate::SPECIES_TRACKER`]. It must stay
//! reentrant from synchronous signal slots, so callers lock it per call and
//! never hold the lock across an emission.

use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Debug, Default, Serialize)]
pub struct SpeciesTracker {
    species: HashMap<String, i64>,
    ribo_per_gene: HashMap<String, i64>,
    transcripts_per_gene: HashMap<String, i64>,
}

impl SpeciesTracker {
    pub fn new() -> Self {
        SpeciesTracker::default()
    }

    pub fn increment_species(&mut self, name: &str, delta: i64) {
        *self.species.entry(name.to_string()).or_insert(0) += delta;
    }

    pub fn increment_ribo(&mut self, gene: &str, delta: i64) {
        *self.ribo_per_gene.entry(gene.to_string()).or_insert(0) += delta;
    }

    pub fn increment_transcript(&mut self, gene: &str, delta: i64) {
        *self.transcripts_per_gene.entry(gene.to_string()).or_insert(0) += delta;
    }

    /// Apply a polymer's per-step species log.
    pub fn update(&mut self, log: &HashMap<String, i64>) {
        for (name, delta) in log {
            self.increment_species(name, *delta);
        }
    }

    pub fn species(&self, name: &str) -> i64 {
        self.species.get(name).copied().unwrap_or(0)
    }

    pub fn ribo(&self, gene: &str) -> i64 {
        self.ribo_per_gene.get(gene).copied().unwrap_or(0)
    }

    pub fn transcripts(&self, gene: &str) -> i64 {
        self.transcripts_per_gene.get(gene).copied().unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.species.clear();
        self.ribo_per_gene.clear();
        self.transcripts_per_gene.clear();
    }
}
