//! Shared helpers for the cellflow integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::error::Error;

use cellflow::Reporter;

/// A diagnostic captured by [`RecordingReporter`]
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Undefined { cell: String, candidate: String },
    Failed { cell: String, message: String },
    Suppressed { cell: String, message: String },
}

/// Reporter that keeps every event for later inspection
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: RefCell<Vec<Event>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn undefined_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Undefined { .. }))
            .count()
    }
}

impl Reporter for RecordingReporter {
    fn undefined(&self, cell: &str, candidate: &str) {
        self.events.borrow_mut().push(Event::Undefined {
            cell: cell.to_string(),
            candidate: candidate.to_string(),
        });
    }

    fn failed(&self, cell: &str, error: &dyn Error) {
        self.events.borrow_mut().push(Event::Failed {
            cell: cell.to_string(),
            message: error.to_string(),
        });
    }

    fn suppressed(&self, cell: &str, error: &dyn Error) {
        self.events.borrow_mut().push(Event::Suppressed {
            cell: cell.to_string(),
            message: error.to_string(),
        });
    }
}
