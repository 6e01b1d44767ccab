//! Synchronous one-to-many callback fan-out.
//!
//! A signal owns zero or more slots. `emit` invokes every slot in insertion
//! order on the caller's stack. Slots cannot disconnect themselves during an
//! emission; `emit` holds the exclusive borrow for its whole duration.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotId(usize);

pub struct Signal<A = ()> {
    slots: Vec<(usize, Box<dyn FnMut(A)>)>,
    next_id: usize,
}

impl<A: Clone> Signal<A> {
    pub fn new() -> Self {
        Signal {
            slots: Vec::new(),
            next_id: 0,
        }
    }

    pub fn connect<F>(&mut self, slot: F) -> SlotId
    where
        F: FnMut(A) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.slots.push((id, Box::new(slot)));
        SlotId(id)
    }

    pub fn disconnect(&mut self, id: SlotId) {
        self.slots.retain(|(slot_id, _)| *slot_id != id.0);
    }

    pub fn emit(&mut self, args: A) {
        for (_, slot) in &mut self.slots {
            slot(args.clone());
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

impl<A: Clone> Default for Signal<A> {
    fn default() -> Self {
        Signal::new()
    }
}

// A signal is tied to its owning object; cloning yields a signal with no slots.
impl<A: Clone> Clone for Signal<A> {
    fn clone(&self) -> Self {
        Signal::new()
    }
}

impl<A> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Signal({} slots)", self.slots.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_emit_in_insertion_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut signal: Signal<i32> = Signal::new();
        for tag in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            signal.connect(move |value| order.borrow_mut().push((tag, value)));
        }
        signal.emit(7);
        assert_eq!(
            *order.borrow(),
            vec![("first", 7), ("second", 7), ("third", 7)]
        );
    }

    #[test]
    fn test_disconnect_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut signal: Signal<()> = Signal::new();
        let id = {
            let count = Rc::clone(&count);
            signal.connect(move |_| *count.borrow_mut() += 1)
        };
        signal.emit(());
        signal.disconnect(id);
        signal.emit(());
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_clone_has_no_slots() {
        let mut signal: Signal<()> = Signal::new();
        signal.connect(|_| {});
        assert_eq!(signal.slot_count(), 1);
        let cloned = signal.clone();
        assert_eq!(cloned.slot_count(), 0);
    }

    #[test]
    fn test_tuple_payload() {
        let seen = Rc::new(RefCell::new(None));
        let mut signal: Signal<(usize, String)> = Signal::new();
        {
            let seen = Rc::clone(&seen);
            signal.connect(move |args| *seen.borrow_mut() = Some(args));
        }
        signal.emit((3, "rnapol".to_string()));
        assert_eq!(*seen.borrow(), Some((3, "rnapol".to_string())));
    }
}
