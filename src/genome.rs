//! Genome and transcript polymers.
//!
//! A genome holds transcript templates next to its own sites. Binding an RNA
//! polymerase spawns a transcript covering the not-yet-transcribed subrange,
//! whose mask recedes one position per parent step through the polymerase's
//! move signal.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::PolysomeError;
use crate::interval_index::IntervalIndex;
use crate::polymer::{Polymer, PromoterPtr, TerminatorPtr};
use crate::polymerase::PolymerasePtr;
use crate::signal::Signal;
use crate::site::{Mask, Promoter, Terminator};

pub type TranscriptPtr = Rc<RefCell<Transcript>>;

/// An RNA polymer. Binding sites are RBSes, release sites are stop codons;
/// a bound ribosome reads in the frame of its start position.
pub struct Transcript {
    core: Polymer,
}

impl Transcript {
    pub fn new(
        name: &str,
        start: i32,
        stop: i32,
        rbs_intervals: Vec<(i32, i32, PromoterPtr)>,
        stop_intervals: Vec<(i32, i32, TerminatorPtr)>,
        mask: Mask,
        weights: Vec<f64>,
    ) -> Self {
        let mut core = Polymer::new(name, start, stop);
        core.set_mask(mask);
        core.set_weights(weights);
        for (_, _, rbs) in rbs_intervals {
            core.add_binding_site(rbs);
        }
        for (_, _, stop_codon) in stop_intervals {
            core.add_release_site(stop_codon);
        }
        Transcript { core }
    }

    pub fn initialize(&mut self) {
        self.core.initialize();
    }

    pub fn bind(&mut self, pol: &PolymerasePtr, promoter_name: &str) -> Result<(), PolysomeError> {
        self.core.bind(pol, promoter_name)?;
        let mut pol = pol.borrow_mut();
        let frame = pol.start() % 3;
        pol.set_reading_frame(frame);
        Ok(())
    }

    pub fn execute(&mut self) -> Result<(), PolysomeError> {
        self.core.execute()
    }

    /// Expose one more position. Wired to the parent polymerase's move
    /// signal while the transcript is being synthesized.
    pub fn shift_mask(&mut self) {
        self.core.shift_mask();
    }

    pub fn prop_sum(&self) -> f64 {
        self.core.prop_sum()
    }

    pub fn uncovered(&self, name: &str) -> i64 {
        self.core.uncovered(name)
    }

    pub fn species_log(&self) -> &HashMap<String, i64> {
        self.core.species_log()
    }

    pub fn mask(&self) -> &Mask {
        self.core.mask()
    }

    pub fn polymer(&self) -> &Polymer {
        &self.core
    }

    pub fn polymer_mut(&mut self) -> &mut Polymer {
        &mut self.core
    }
}

/// A DNA polymer over `[1, length]` that spawns transcripts.
pub struct Genome {
    core: Polymer,
    transcript_rbs_intervals: Vec<(i32, i32, PromoterPtr)>,
    transcript_stop_intervals: Vec<(i32, i32, TerminatorPtr)>,
    transcript_rbs: IntervalIndex<PromoterPtr>,
    transcript_stop_sites: IntervalIndex<TerminatorPtr>,
    transcript_weights: Vec<f64>,
    bindings: HashMap<String, HashMap<String, f64>>,
    /// Fires with every newly constructed transcript.
    pub transcript_signal: Signal<TranscriptPtr>,
}

impl Genome {
    pub fn new(name: &str, length: i32) -> Self {
        Genome {
            core: Polymer::new(name, 1, length),
            transcript_rbs_intervals: Vec::new(),
            transcript_stop_intervals: Vec::new(),
            transcript_rbs: IntervalIndex::default(),
            transcript_stop_sites: IntervalIndex::default(),
            transcript_weights: vec![1.0; length as usize],
            bindings: HashMap::new(),
            transcript_signal: Signal::new(),
        }
    }

    pub fn add_mask(&mut self, start: i32, interactions: &[&str]) {
        let interaction_map = interactions
            .iter()
            .map(|name| (name.to_string(), 1.0))
            .collect();
        let stop = self.core.stop();
        self.core.set_mask(Mask::new(start, stop, interaction_map));
    }

    pub fn add_promoter(
        &mut self,
        name: &str,
        start: i32,
        stop: i32,
        interactions: HashMap<String, f64>,
    ) -> Result<(), PolysomeError> {
        let promoter = Promoter::new(name, start, stop, interactions.clone())?;
        self.bindings.insert(name.to_string(), interactions);
        self.core.add_binding_site(Rc::new(RefCell::new(promoter)));
        Ok(())
    }

    pub fn add_terminator(
        &mut self,
        name: &str,
        start: i32,
        stop: i32,
        efficiencies: HashMap<String, f64>,
    ) -> Result<(), PolysomeError> {
        let terminator = Terminator::new(name, start, stop, efficiencies)?;
        self.core.add_release_site(Rc::new(RefCell::new(terminator)));
        Ok(())
    }

    /// Register a coding gene: an RBS template upstream and a stop-codon
    /// template on the gene's last two positions, in the gene's frame.
    pub fn add_gene(
        &mut self,
        name: &str,
        start: i32,
        stop: i32,
        rbs_start: i32,
        rbs_stop: i32,
        rbs_strength: f64,
    ) -> Result<(), PolysomeError> {
        let rbs_name = format!("{name}_rbs");
        let binding: HashMap<String, f64> =
            HashMap::from([("ribosome".to_string(), rbs_strength)]);
        let mut rbs = Promoter::new(&rbs_name, rbs_start, rbs_stop, binding.clone())?;
        rbs.set_gene(name);
        self.transcript_rbs_intervals
            .push((rbs_start, rbs_stop, Rc::new(RefCell::new(rbs))));
        self.bindings.insert(rbs_name, binding);

        let release: HashMap<String, f64> = HashMap::from([("ribosome".to_string(), 1.0)]);
        let mut stop_codon = Terminator::new("stop_codon", stop - 1, stop, release)?;
        stop_codon.set_reading_frame(start % 3);
        stop_codon.set_gene(name);
        self.transcript_stop_intervals
            .push((stop - 1, stop, Rc::new(RefCell::new(stop_codon))));
        Ok(())
    }

    /// Per-position speed multipliers inherited by every spawned transcript.
    pub fn add_weights(&mut self, weights: Vec<f64>) -> Result<(), PolysomeError> {
        let expected = (self.core.stop() - self.core.start() + 1) as usize;
        if weights.len() != expected {
            return Err(PolysomeError::WeightsLength {
                expected,
                got: weights.len(),
            });
        }
        self.transcript_weights = weights;
        Ok(())
    }

    /// Accumulated map from binding-site name to its interaction strengths.
    pub fn bindings(&self) -> &HashMap<String, HashMap<String, f64>> {
        &self.bindings
    }

    pub fn initialize(&mut self) {
        self.core.initialize();
        self.transcript_rbs = IntervalIndex::new(&self.transcript_rbs_intervals);
        self.transcript_stop_sites = IntervalIndex::new(&self.transcript_stop_intervals);
    }

    /// Bind an RNA polymerase and spawn the transcript it will synthesize.
    pub fn bind(&mut self, pol: &PolymerasePtr, promoter_name: &str) -> Result<(), PolysomeError> {
        self.core.bind(pol, promoter_name)?;

        let transcript = self.build_transcript(pol.borrow().stop(), self.core.stop());
        let transcript = Rc::new(RefCell::new(transcript));
        // The slot holds a weak handle: the transcript outlives its parent
        // polymerase, and a dropped transcript silently unhooks itself.
        let weak = Rc::downgrade(&transcript);
        pol.borrow_mut().move_signal.connect(move |_| {
            if let Some(transcript) = weak.upgrade() {
                transcript.borrow_mut().shift_mask();
            }
        });
        debug!(
            "transcript spawned behind {} on genome {}",
            pol.borrow().name(),
            self.core.name()
        );
        self.transcript_signal.emit(Rc::clone(&transcript));
        Ok(())
    }

    fn build_transcript(&self, start: i32, stop: i32) -> Transcript {
        let rbs_intervals: Vec<(i32, i32, PromoterPtr)> = self
            .transcript_rbs
            .find_contained(start, stop)
            .into_iter()
            .map(|hit| {
                let clone = hit.value.borrow().fresh_clone();
                (hit.start, hit.stop, Rc::new(RefCell::new(clone)))
            })
            .collect();
        let stop_intervals: Vec<(i32, i32, TerminatorPtr)> = self
            .transcript_stop_sites
            .find_contained(start, stop)
            .into_iter()
            .map(|hit| {
                let clone = hit.value.borrow().fresh_clone();
                (hit.start, hit.stop, Rc::new(RefCell::new(clone)))
            })
            .collect();
        let mask = Mask::new(start, stop, HashMap::new());
        // The transcript spans the genome's whole coordinate space; the mask
        // hides everything the polymerase has not yet synthesized.
        Transcript::new(
            "rna",
            self.core.start(),
            self.core.stop(),
            rbs_intervals,
            stop_intervals,
            mask,
            self.transcript_weights.clone(),
        )
    }

    pub fn execute(&mut self) -> Result<(), PolysomeError> {
        self.core.execute()
    }

    pub fn prop_sum(&self) -> f64 {
        self.core.prop_sum()
    }

    pub fn uncovered(&self, name: &str) -> i64 {
        self.core.uncovered(name)
    }

    pub fn species_log(&self) -> &HashMap<String, i64> {
        self.core.species_log()
    }

    pub fn mask(&self) -> &Mask {
        self.core.mask()
    }

    pub fn polymer(&self) -> &Polymer {
        &self.core
    }

    pub fn polymer_mut(&mut self) -> &mut Polymer {
        &mut self.core
    }
}
