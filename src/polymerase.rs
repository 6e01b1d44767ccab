//! Moving agents: RNA polymerases on genomes, ribosomes on transcripts.

use crate::error::PolysomeError;
use crate::signal::Signal;
use std::cell::RefCell;
use std::rc::Rc;

pub type PolymerasePtr = Rc<RefCell<Polymerase>>;

#[derive(Debug)]
pub struct Polymerase {
    name: String,
    footprint: i32,
    speed: f64,
    start: i32,
    stop: i32,
    reading_frame: i32,
    /// Fires once per single-position advance. A genome wires this to the
    /// spawned transcript's mask so the transcript exposes one position per
    /// parent step.
    pub move_signal: Signal<()>,
}

impl Polymerase {
    pub fn new(name: &str, footprint: i32, speed: f64) -> Result<Self, PolysomeError> {
        if footprint < 1 {
            return Err(PolysomeError::InvalidPolymerase(format!(
                "polymerase {name} has non-positive footprint {footprint}"
            )));
        }
        if speed < 0.0 {
            return Err(PolysomeError::InvalidPolymerase(format!(
                "polymerase {name} has negative speed {speed}"
            )));
        }
        Ok(Polymerase {
            name: name.to_string(),
            footprint,
            speed,
            start: 0,
            stop: footprint - 1,
            reading_frame: 0,
            move_signal: Signal::new(),
        })
    }

    pub fn new_ptr(name: &str, footprint: i32, speed: f64) -> Result<PolymerasePtr, PolysomeError> {
        Ok(Rc::new(RefCell::new(Polymerase::new(name, footprint, speed)?)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn footprint(&self) -> i32 {
        self.footprint
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn stop(&self) -> i32 {
        self.stop
    }

    pub fn set_start(&mut self, start: i32) {
        self.start = start;
    }

    pub fn set_stop(&mut self, stop: i32) {
        self.stop = stop;
    }

    pub fn reading_frame(&self) -> i32 {
        self.reading_frame
    }

    pub fn set_reading_frame(&mut self, frame: i32) {
        self.reading_frame = frame;
    }

    /// Advance one position and notify listeners.
    pub fn advance(&mut self) {
        self.start += 1;
        self.stop += 1;
        self.move_signal.emit(());
    }

    /// Roll back a speculative advance. Does not emit.
    pub fn move_back(&mut self) {
        if self.start <= 0 {
            panic!("polymerase {} cannot move back below the first position", self.name);
        }
        self.start -= 1;
        self.stop -= 1;
    }
}
