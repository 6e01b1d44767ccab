//! The polymer engine: occupants, propensities, the uncovered-site cache and
//! the bind/execute/terminate protocol shared by genomes and transcripts.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::PolysomeError;
use crate::interval_index::IntervalIndex;
use crate::polymerase::PolymerasePtr;
use crate::sampling;
use crate::signal::Signal;
use crate::site::{Mask, Promoter, Terminator};
use crate::SPECIES_TRACKER;

pub type PromoterPtr = Rc<RefCell<Promoter>>;
pub type TerminatorPtr = Rc<RefCell<Terminator>>;

/// A linear coordinate space `[start, stop]` (1-indexed, inclusive) carrying
/// binding sites, release sites, a mask and moving polymerases.
pub struct Polymer {
    name: String,
    start: i32,
    stop: i32,
    index: usize,
    mask: Mask,
    weights: Vec<f64>,
    binding_intervals: Vec<(i32, i32, PromoterPtr)>,
    release_intervals: Vec<(i32, i32, TerminatorPtr)>,
    binding_sites: IntervalIndex<PromoterPtr>,
    release_sites: IntervalIndex<TerminatorPtr>,
    occupants: Vec<PolymerasePtr>,
    propensities: Vec<f64>,
    prop_sum: f64,
    uncovered: HashMap<String, i64>,
    species_log: HashMap<String, i64>,
    /// `(polymer index, polymerase name, gene name)` per termination.
    pub termination_signal: Signal<(usize, String, String)>,
}

impl Polymer {
    pub fn new(name: &str, start: i32, stop: i32) -> Self {
        Polymer {
            name: name.to_string(),
            start,
            stop,
            index: 0,
            mask: Mask::new(stop + 1, stop, HashMap::new()),
            weights: vec![1.0; (stop - start + 1) as usize],
            binding_intervals: Vec::new(),
            release_intervals: Vec::new(),
            binding_sites: IntervalIndex::default(),
            release_sites: IntervalIndex::default(),
            occupants: Vec::new(),
            propensities: Vec::new(),
            prop_sum: 0.0,
            uncovered: HashMap::new(),
            species_log: HashMap::new(),
            termination_signal: Signal::new(),
        }
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

    pub fn index(&self) -> usize {
        self.index
    }

    /// The polymer's slot in the outer simulator, echoed in the termination
    /// signal.
    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn prop_sum(&self) -> f64 {
        self.prop_sum
    }

    pub fn occupants(&self) -> &[PolymerasePtr] {
        &self.occupants
    }

    pub fn propensities(&self) -> &[f64] {
        &self.propensities
    }

    /// Count of currently exposed binding sites with this name.
    pub fn uncovered(&self, name: &str) -> i64 {
        self.uncovered.get(name).copied().unwrap_or(0)
    }

    /// Signed per-name exposure deltas since the last `execute`.
    pub fn species_log(&self) -> &HashMap<String, i64> {
        &self.species_log
    }

    pub(crate) fn set_mask(&mut self, mask: Mask) {
        self.mask = mask;
    }

    pub(crate) fn set_weights(&mut self, weights: Vec<f64>) {
        self.weights = weights;
    }

    pub(crate) fn add_binding_site(&mut self, promoter: PromoterPtr) {
        let (start, stop) = {
            let site = promoter.borrow();
            (site.start(), site.stop())
        };
        self.binding_intervals.push((start, stop, promoter));
    }

    pub(crate) fn add_release_site(&mut self, terminator: TerminatorPtr) {
        let (start, stop) = {
            let site = terminator.borrow();
            (site.start(), site.stop())
        };
        self.release_intervals.push((start, stop, terminator));
    }

    /// Build the interval indexes and reconcile the mask with initial cover
    /// state. Sites behind the mask start covered; their cache entry is
    /// seeded at zero so later covers can never drive the count negative.
    pub fn initialize(&mut self) {
        self.binding_sites = IntervalIndex::new(&self.binding_intervals);
        self.release_sites = IntervalIndex::new(&self.release_intervals);

        for hit in self
            .binding_sites
            .find_overlapping(self.mask.start(), self.mask.stop())
        {
            let mut site = hit.value.borrow_mut();
            self.uncovered.entry(site.name().to_string()).or_insert(0);
            site.cover();
            site.save_state();
        }

        for hit in self.binding_sites.find_overlapping(self.start, self.mask.start()) {
            let mut site = hit.value.borrow_mut();
            if site.is_covered() {
                continue;
            }
            site.uncover();
            site.save_state();
            *self.uncovered.entry(site.name().to_string()).or_insert(0) += 1;
        }
    }

    /// Bind a polymerase to a free binding site named `promoter_name`,
    /// sampled uniformly. No polymer state is mutated on error.
    pub fn bind(&mut self, pol: &PolymerasePtr, promoter_name: &str) -> Result<(), PolysomeError> {
        let choices: Vec<PromoterPtr> = self
            .binding_sites
            .find_overlapping(self.start, self.mask.start())
            .into_iter()
            .map(|hit| hit.value)
            .filter(|site| {
                let site = site.borrow();
                site.name() == promoter_name && !site.is_covered()
            })
            .collect();
        if choices.is_empty() {
            return Err(PolysomeError::NoFreePromoter {
                pol: pol.borrow().name().to_string(),
                promoter: promoter_name.to_string(),
                polymer: self.name.clone(),
            });
        }
        let site = Rc::clone(sampling::choice(&choices)?);

        if !site.borrow().check_interaction(pol.borrow().name()) {
            return Err(PolysomeError::NoInteraction {
                pol: pol.borrow().name().to_string(),
                site: promoter_name.to_string(),
            });
        }

        // Snap the polymerase to the site.
        {
            let mut pol = pol.borrow_mut();
            let site_start = site.borrow().start();
            let footprint = pol.footprint();
            pol.set_start(site_start);
            pol.set_stop(site_start + footprint - 1);
        }
        if pol.borrow().stop() >= self.mask.start() {
            return Err(PolysomeError::MaskOverlap {
                pol: pol.borrow().name().to_string(),
                polymer: self.name.clone(),
            });
        }

        {
            let mut site = site.borrow_mut();
            site.cover();
            site.save_state();
        }
        self.cover_binding_site(promoter_name);
        self.insert(pol);
        debug!(
            "{} bound at {}..{} on polymer {}",
            pol.borrow().name(),
            pol.borrow().start(),
            pol.borrow().stop(),
            self.name
        );

        let site = site.borrow();
        if site.check_interaction("ribosome") {
            if let Some(gene) = site.gene() {
                SPECIES_TRACKER.lock().unwrap().increment_ribo(gene, 1);
            }
        }
        Ok(())
    }

    /// Advance one occupant, sampled by propensity.
    pub fn execute(&mut self) -> Result<(), PolysomeError> {
        if self.prop_sum == 0.0 {
            return Err(PolysomeError::NoPropensity(self.name.clone()));
        }
        let index = sampling::weighted_choice_index(&self.propensities)?;
        self.species_log.clear();
        self.advance_occupant(index);
        Ok(())
    }

    /// Recede the mask one position and expose whatever it no longer hides.
    pub fn shift_mask(&mut self) {
        if self.mask.start() > self.mask.stop() {
            return;
        }
        let old_start = self.mask.start();
        self.mask.recede();
        self.check_behind(old_start, self.mask.start());
    }

    /// Release a polymerase. Fatal if it is not bound to this polymer.
    pub fn terminate(&mut self, pol: &PolymerasePtr, last_gene: &str) {
        let index = self
            .occupants
            .iter()
            .position(|occupant| Rc::ptr_eq(occupant, pol))
            .unwrap_or_else(|| {
                panic!(
                    "terminating polymerase {} that is not bound to polymer {}",
                    pol.borrow().name(),
                    self.name
                )
            });
        self.prop_sum -= self.propensities[index];
        let pol_name = pol.borrow().name().to_string();
        debug!("{} released from polymer {} at gene {:?}", pol_name, self.name, last_gene);
        self.termination_signal
            .emit((self.index, pol_name, last_gene.to_string()));
        self.occupants.remove(index);
        self.propensities.remove(index);
        self.assert_parallel_arrays();
    }

    fn insert(&mut self, pol: &PolymerasePtr) {
        let pol_start = pol.borrow().start();
        let index = self
            .occupants
            .partition_point(|occupant| occupant.borrow().start() <= pol_start);
        let propensity = self.position_weight(pol.borrow().stop()) * pol.borrow().speed();
        self.occupants.insert(index, Rc::clone(pol));
        self.propensities.insert(index, propensity);
        self.prop_sum += propensity;
        self.assert_parallel_arrays();
    }

    fn advance_occupant(&mut self, index: usize) {
        let pol = Rc::clone(&self.occupants[index]);
        let (old_start, old_stop) = {
            let pol = pol.borrow();
            (pol.start(), pol.stop())
        };

        pol.borrow_mut().advance();

        if self.check_pol_collisions(index) {
            pol.borrow_mut().move_back();
            return;
        }
        if self.check_mask_collision(&pol) {
            pol.borrow_mut().move_back();
            return;
        }
        if self.check_termination(&pol) {
            return;
        }

        let (new_start, new_stop) = {
            let pol = pol.borrow();
            (pol.start(), pol.stop())
        };
        self.check_behind(old_start, new_start);
        self.check_ahead(old_stop, new_stop);

        let new_propensity = self.position_weight(new_stop) * pol.borrow().speed();
        self.prop_sum += new_propensity - self.propensities[index];
        self.propensities[index] = new_propensity;
    }

    /// Per-position speed multiplier under the occupant's trailing edge.
    fn position_weight(&self, pol_stop: i32) -> f64 {
        let index = pol_stop - self.start - 1;
        if index < 0 || index as usize >= self.weights.len() {
            panic!(
                "no speed weight for position {} on polymer {}",
                pol_stop, self.name
            );
        }
        self.weights[index as usize]
    }

    fn check_pol_collisions(&self, index: usize) -> bool {
        if index + 1 >= self.occupants.len() {
            return false;
        }
        let current = self.occupants[index].borrow();
        let next = self.occupants[index + 1].borrow();
        if current.stop() >= next.start() && next.stop() >= current.start() {
            if current.stop() - next.start() > 0 {
                panic!(
                    "polymerase {} ({}..{}) overlaps polymerase {} ({}..{}) by more than one \
                     position on polymer {}",
                    current.name(),
                    current.start(),
                    current.stop(),
                    next.name(),
                    next.start(),
                    next.stop(),
                    self.name
                );
            }
            return true;
        }
        false
    }

    fn check_mask_collision(&mut self, pol: &PolymerasePtr) -> bool {
        let (pol_stop, admitted) = {
            let pol = pol.borrow();
            (pol.stop(), self.mask.check_interaction(pol.name()))
        };
        if self.mask.start() <= self.stop && pol_stop >= self.mask.start() {
            if pol_stop - self.mask.start() > 0 {
                panic!(
                    "polymerase {} overlaps the mask by more than one position on polymer {}",
                    pol.borrow().name(),
                    self.name
                );
            }
            if admitted {
                self.shift_mask();
            } else {
                return true;
            }
        }
        false
    }

    fn check_termination(&mut self, pol: &PolymerasePtr) -> bool {
        let (pol_start, pol_stop, pol_name, frame) = {
            let pol = pol.borrow();
            (
                pol.start(),
                pol.stop(),
                pol.name().to_string(),
                pol.reading_frame(),
            )
        };
        for hit in self.release_sites.find_overlapping(pol_start, pol_stop) {
            let (admits, readthrough, efficiency, site_stop, gene) = {
                let site = hit.value.borrow();
                (
                    site.check_interaction(&pol_name, frame),
                    site.readthrough(),
                    site.efficiency(&pol_name),
                    site.stop(),
                    site.gene().cloned().unwrap_or_default(),
                )
            };
            if !admits || readthrough {
                continue;
            }
            if sampling::random() <= efficiency {
                // Walk any bound child polymer's mask over the rest of the
                // terminator. A negative distance fires zero times.
                let distance = site_stop - pol_stop + 1;
                for _ in 0..distance {
                    pol.borrow_mut().move_signal.emit(());
                }
                self.terminate(pol, &gene);
                return true;
            }
            hit.value.borrow_mut().set_readthrough(true);
        }
        false
    }

    fn check_ahead(&mut self, old_stop: i32, new_stop: i32) {
        for hit in self.binding_sites.find_overlapping(old_stop, new_stop) {
            let mut newly_covered = None;
            {
                let mut site = hit.value.borrow_mut();
                if site.start() < new_stop {
                    site.cover();
                    if site.was_covered() {
                        newly_covered = Some(site.name().to_string());
                    }
                    site.save_state();
                }
            }
            if let Some(name) = newly_covered {
                self.cover_binding_site(&name);
            }
        }
    }

    fn check_behind(&mut self, old_start: i32, new_start: i32) {
        for hit in self.binding_sites.find_overlapping(old_start, new_start) {
            let mut newly_uncovered = None;
            {
                let mut site = hit.value.borrow_mut();
                if site.stop() < new_start {
                    site.uncover();
                    if site.was_uncovered() {
                        newly_uncovered = Some(site.name().to_string());
                    }
                    site.save_state();
                }
            }
            if let Some(name) = newly_uncovered {
                self.uncover_binding_site(&name);
            }
        }
        // An occupant that has passed a terminator gets a fresh termination
        // attempt on its next encounter.
        for hit in self.release_sites.find_overlapping(old_start, new_start) {
            let mut site = hit.value.borrow_mut();
            if site.stop() < new_start && site.readthrough() {
                site.set_readthrough(false);
            }
        }
    }

    fn cover_binding_site(&mut self, name: &str) {
        match self.uncovered.get_mut(name) {
            Some(count) => *count -= 1,
            None => {
                self.uncovered.insert(name.to_string(), 0);
            }
        }
        if self.uncovered[name] < 0 {
            panic!(
                "cached count of uncovered site {} on polymer {} went negative",
                name, self.name
            );
        }
        *self.species_log.entry(name.to_string()).or_insert(0) -= 1;
    }

    fn uncover_binding_site(&mut self, name: &str) {
        match self.uncovered.get_mut(name) {
            Some(count) => *count += 1,
            None => {
                self.uncovered.insert(name.to_string(), 1);
            }
        }
        *self.species_log.entry(name.to_string()).or_insert(0) += 1;
    }

    fn assert_parallel_arrays(&self) {
        if self.occupants.len() != self.propensities.len() {
            panic!(
                "occupant and propensity arrays out of step on polymer {} ({} vs {})",
                self.name,
                self.occupants.len(),
                self.propensities.len()
            );
        }
    }
}
