//! Binding sites, release sites and the movable mask.
//!
//! Promoters and terminators carry cover state that is shared between a
//! polymer's interval indexes and its occupants; the polymer mutates it
//! through `Rc<RefCell<_>>` handles.

use crate::error::PolysomeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn check_span(name: &str, start: i32, stop: i32) -> Result<(), PolysomeError> {
    if start < 0 || stop < 0 {
        return Err(PolysomeError::InvalidSite(format!(
            "site {name} has negative coordinates ({start}, {stop})"
        )));
    }
    if start > stop {
        return Err(PolysomeError::InvalidSite(format!(
            "site {name} has start {start} beyond stop {stop}"
        )));
    }
    Ok(())
}

/// A binding site: a promoter on a genome or a ribosome binding site on a
/// transcript.
#[derive(Debug, Serialize, Deserialize)]
pub struct Promoter {
    name: String,
    start: i32,
    stop: i32,
    interactions: HashMap<String, f64>,
    gene: Option<String>,
    covered: bool,
    previously_covered: bool,
    first_exposure: bool,
}

impl Promoter {
    pub fn new(
        name: &str,
        start: i32,
        stop: i32,
        interactions: HashMap<String, f64>,
    ) -> Result<Self, PolysomeError> {
        check_span(name, start, stop)?;
        for (species, strength) in &interactions {
            if *strength < 0.0 {
                return Err(PolysomeError::InvalidSite(format!(
                    "site {name} has negative interaction strength {strength} for {species}"
                )));
            }
        }
        Ok(Promoter {
            name: name.to_string(),
            start,
            stop,
            interactions,
            gene: None,
            covered: false,
            previously_covered: false,
            first_exposure: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn stop(&self) -> i32 {
        self.stop
    }

    pub fn interactions(&self) -> &HashMap<String, f64> {
        &self.interactions
    }

    pub fn gene(&self) -> Option<&String> {
        self.gene.as_ref()
    }

    pub fn set_gene(&mut self, gene: &str) {
        self.gene = Some(gene.to_string());
    }

    pub fn check_interaction(&self, species: &str) -> bool {
        self.interactions.contains_key(species)
    }

    pub fn cover(&mut self) {
        self.covered = true;
    }

    pub fn uncover(&mut self) {
        self.covered = false;
    }

    pub fn is_covered(&self) -> bool {
        self.covered
    }

    pub fn save_state(&mut self) {
        self.previously_covered = self.covered;
    }

    pub fn was_covered(&self) -> bool {
        self.covered && !self.previously_covered
    }

    pub fn was_uncovered(&self) -> bool {
        !self.covered && self.previously_covered
    }

    pub fn first_exposure(&self) -> bool {
        self.first_exposure
    }

    pub fn set_first_exposure(&mut self, first_exposure: bool) {
        self.first_exposure = first_exposure;
    }

    /// Deep copy with cover state reset. Transcripts own independent site
    /// states, so template sites are never handed out directly.
    pub fn fresh_clone(&self) -> Promoter {
        Promoter {
            name: self.name.clone(),
            start: self.start,
            stop: self.stop,
            interactions: self.interactions.clone(),
            gene: self.gene.clone(),
            covered: false,
            previously_covered: false,
            first_exposure: false,
        }
    }
}

/// A release site: a terminator on a genome or a stop codon on a transcript.
#[derive(Debug, Serialize, Deserialize)]
pub struct Terminator {
    name: String,
    start: i32,
    stop: i32,
    efficiencies: HashMap<String, f64>,
    reading_frame: Option<i32>,
    gene: Option<String>,
    covered: bool,
    previously_covered: bool,
    readthrough: bool,
}

impl Terminator {
    pub fn new(
        name: &str,
        start: i32,
        stop: i32,
        efficiencies: HashMap<String, f64>,
    ) -> Result<Self, PolysomeError> {
        check_span(name, start, stop)?;
        for (species, efficiency) in &efficiencies {
            if !(0.0..=1.0).contains(efficiency) {
                return Err(PolysomeError::InvalidSite(format!(
                    "site {name} has efficiency {efficiency} for {species}, outside [0, 1]"
                )));
            }
        }
        Ok(Terminator {
            name: name.to_string(),
            start,
            stop,
            efficiencies,
            reading_frame: None,
            gene: None,
            covered: false,
            previously_covered: false,
            readthrough: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn stop(&self) -> i32 {
        self.stop
    }

    pub fn gene(&self) -> Option<&String> {
        self.gene.as_ref()
    }

    pub fn set_gene(&mut self, gene: &str) {
        self.gene = Some(gene.to_string());
    }

    pub fn reading_frame(&self) -> Option<i32> {
        self.reading_frame
    }

    pub fn set_reading_frame(&mut self, frame: i32) {
        self.reading_frame = Some(frame);
    }

    /// True iff the species terminates here and, for frame-sensitive sites
    /// (stop codons), the occupant reads in the matching frame.
    pub fn check_interaction(&self, species: &str, frame: i32) -> bool {
        if !self.efficiencies.contains_key(species) {
            return false;
        }
        match self.reading_frame {
            Some(site_frame) => site_frame == frame,
            None => true,
        }
    }

    pub fn efficiency(&self, species: &str) -> f64 {
        self.efficiencies.get(species).copied().unwrap_or(0.0)
    }

    pub fn readthrough(&self) -> bool {
        self.readthrough
    }

    pub fn set_readthrough(&mut self, readthrough: bool) {
        self.readthrough = readthrough;
    }

    pub fn cover(&mut self) {
        self.covered = true;
    }

    pub fn uncover(&mut self) {
        self.covered = false;
    }

    pub fn is_covered(&self) -> bool {
        self.covered
    }

    pub fn save_state(&mut self) {
        self.previously_covered = self.covered;
    }

    pub fn was_covered(&self) -> bool {
        self.covered && !self.previously_covered
    }

    pub fn was_uncovered(&self) -> bool {
        !self.covered && self.previously_covered
    }

    pub fn fresh_clone(&self) -> Terminator {
        Terminator {
            name: self.name.clone(),
            start: self.start,
            stop: self.stop,
            efficiencies: self.efficiencies.clone(),
            reading_frame: self.reading_frame,
            gene: self.gene.clone(),
            covered: false,
            previously_covered: false,
            readthrough: false,
        }
    }
}

/// A movable site hiding the not-yet-exposed part of a polymer. Species in
/// the interaction map push the mask aside; all others collide with it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mask {
    start: i32,
    stop: i32,
    interactions: HashMap<String, f64>,
}

impl Mask {
    pub fn new(start: i32, stop: i32, interactions: HashMap<String, f64>) -> Self {
        Mask {
            start,
            stop,
            interactions,
        }
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn stop(&self) -> i32 {
        self.stop
    }

    pub fn check_interaction(&self, species: &str) -> bool {
        self.interactions.contains_key(species)
    }

    pub fn recede(&mut self) {
        self.start += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interactions(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries
            .iter()
            .map(|(name, strength)| (name.to_string(), *strength))
            .collect()
    }

    #[test]
    fn test_promoter_validation() {
        assert!(Promoter::new("p", -1, 10, HashMap::new()).is_err());
        assert!(Promoter::new("p", 1, -10, HashMap::new()).is_err());
        assert!(Promoter::new("p", 10, 1, HashMap::new()).is_err());
        assert!(Promoter::new("p", 1, 10, interactions(&[("rnapol", -2.0)])).is_err());
        assert!(Promoter::new("p", 1, 10, interactions(&[("rnapol", 1.0)])).is_ok());
    }

    #[test]
    fn test_coverings() {
        let mut site = Promoter::new("p", 1, 10, interactions(&[("rnapol", 1.0)])).unwrap();
        assert!(!site.is_covered());
        assert!(!site.was_covered());
        assert!(!site.was_uncovered());

        site.cover();
        assert!(site.is_covered());
        assert!(site.was_covered());
        assert!(!site.was_uncovered());

        site.save_state();
        assert!(site.is_covered());
        assert!(!site.was_covered());
        assert!(!site.was_uncovered());

        site.uncover();
        assert!(!site.is_covered());
        assert!(!site.was_covered());
        assert!(site.was_uncovered());

        site.save_state();
        assert!(!site.was_covered());
        assert!(!site.was_uncovered());
    }

    #[test]
    fn test_promoter_interaction() {
        let site = Promoter::new("p", 1, 10, interactions(&[("rnapol", 1.0)])).unwrap();
        assert!(site.check_interaction("rnapol"));
        assert!(!site.check_interaction("otherpol"));
    }

    #[test]
    fn test_first_exposure() {
        let mut site = Promoter::new("p", 1, 10, HashMap::new()).unwrap();
        assert!(!site.first_exposure());
        site.set_first_exposure(true);
        assert!(site.first_exposure());
    }

    #[test]
    fn test_fresh_clone_is_independent() {
        let mut site = Promoter::new("p", 1, 10, interactions(&[("rnapol", 1.0)])).unwrap();
        site.set_gene("g");
        site.cover();
        let clone = site.fresh_clone();
        assert!(!clone.is_covered());
        assert_eq!(clone.gene(), Some(&"g".to_string()));
        // Mutating the original leaves the clone untouched.
        site.uncover();
        assert!(!clone.was_uncovered());
    }

    #[test]
    fn test_terminator_validation() {
        assert!(Terminator::new("t", 1, 10, interactions(&[("rnapol", 2.0)])).is_err());
        assert!(Terminator::new("t", 1, 10, interactions(&[("rnapol", -0.5)])).is_err());
        assert!(Terminator::new("t", 1, 10, interactions(&[("rnapol", 0.8)])).is_ok());
    }

    #[test]
    fn test_terminator_efficiency() {
        let site =
            Terminator::new("t", 1, 10, interactions(&[("rnapol", 0.8), ("ecolipol", 0.3)]))
                .unwrap();
        assert_eq!(site.efficiency("rnapol"), 0.8);
        assert_eq!(site.efficiency("ecolipol"), 0.3);
        assert_eq!(site.efficiency("ribosome"), 0.0);
    }

    #[test]
    fn test_terminator_frame_matching() {
        let mut site = Terminator::new("stop_codon", 9, 10, interactions(&[("ribosome", 1.0)]))
            .unwrap();
        // Frame-insensitive until a reading frame is assigned.
        assert!(site.check_interaction("ribosome", 0));
        assert!(site.check_interaction("ribosome", 2));
        site.set_reading_frame(1);
        assert!(site.check_interaction("ribosome", 1));
        assert!(!site.check_interaction("ribosome", 0));
        assert!(!site.check_interaction("rnapol", 1));
    }

    #[test]
    fn test_readthrough_flag() {
        let mut site = Terminator::new("t", 1, 10, interactions(&[("rnapol", 0.8)])).unwrap();
        assert!(!site.readthrough());
        site.set_readthrough(true);
        assert!(site.readthrough());
        let clone = site.fresh_clone();
        assert!(!clone.readthrough());
    }

    #[test]
    fn test_mask() {
        let mut mask = Mask::new(20, 100, interactions(&[("rnapol", 1.0)]));
        assert!(mask.check_interaction("rnapol"));
        assert!(!mask.check_interaction("ribosome"));
        mask.recede();
        assert_eq!(mask.start(), 21);
        assert_eq!(mask.stop(), 100);
    }
}
