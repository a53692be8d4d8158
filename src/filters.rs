//! Owned year/round selection with change notification.
//!
//! One owner mutates the selection; dependents hold a `Receiver` and re-query
//! whenever a new selection arrives.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::domain::{ElectionYear, Filters, Round};

#[derive(Debug, Default)]
pub struct FilterContext {
    current: Filters,
    subscribers: Vec<Sender<Filters>>,
}

impl FilterContext {
    pub fn new(initial: Filters) -> Self {
        Self {
            current: initial,
            subscribers: Vec::new(),
        }
    }

    pub fn current(&self) -> Filters {
        self.current
    }

    /// Receive every future change of the selection.
    pub fn subscribe(&mut self) -> Receiver<Filters> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn set_year(&mut self, year: ElectionYear) {
        self.update(Filters { year, ..self.current });
    }

    pub fn set_round(&mut self, round: Round) {
        self.update(Filters { round, ..self.current });
    }

    pub fn next_year(&mut self) {
        self.set_year(self.current.year.next());
    }

    pub fn prev_year(&mut self) {
        self.set_year(self.current.year.prev());
    }

    pub fn toggle_round(&mut self) {
        self.set_round(self.current.round.toggle());
    }

    fn update(&mut self, next: Filters) {
        if next == self.current {
            return;
        }
        self.current = next;
        // Dropped receivers are pruned on the way.
        self.subscribers.retain(|tx| tx.send(next).is_ok());
    }
}
