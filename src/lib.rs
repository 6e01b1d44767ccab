use lazy_static::lazy_static;
use std::sync::Mutex;
use tracker::SpeciesTracker;

pub mod error;
pub mod genome;
pub mod interval_index;
pub mod polymer;
pub mod polymerase;
pub mod sampling;
pub mod signal;
pub mod site;
pub mod tracker;

lazy_static! {
    // Process-wide counts of free species, ribosomes per gene and transcripts
    // per gene. Locked per call, never across calls.
    pub static ref SPECIES_TRACKER: Mutex<SpeciesTracker> = Mutex::new(SpeciesTracker::new());
}
