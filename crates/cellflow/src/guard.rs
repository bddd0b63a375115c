//! Per-thread bookkeeping for nested resolution

use std::cell::{Cell as StdCell, RefCell};

use crate::cell::Cell;
use crate::error::{EvalResult, EvaluationError};
use crate::MAX_RESOLUTION_DEPTH;

thread_local! {
    static DEPTH: StdCell<usize> = StdCell::new(0);
    static ACTIVE: RefCell<Vec<(usize, String)>> = RefCell::new(Vec::new());
}

/// Counts one level of nested resolution for as long as it lives
pub(crate) struct DepthGuard(());

impl DepthGuard {
    pub(crate) fn enter() -> EvalResult<Self> {
        DEPTH.with(|depth| {
            let next = depth.get() + 1;
            if next > MAX_RESOLUTION_DEPTH {
                return Err(EvaluationError::DepthExceeded(MAX_RESOLUTION_DEPTH));
            }
            depth.set(next);
            Ok(DepthGuard(()))
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Records a cell as being evaluated so a reentrant borrow can be named
pub(crate) struct ActiveCell(());

impl ActiveCell {
    pub(crate) fn enter(cell: &Cell) -> Self {
        let key = cell as *const Cell as usize;
        ACTIVE.with(|active| active.borrow_mut().push((key, cell.name().to_string())));
        ActiveCell(())
    }
}

impl Drop for ActiveCell {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            active.borrow_mut().pop();
        });
    }
}

/// Name of the cell at `ptr` if it is being evaluated on this thread
pub(crate) fn active_name(ptr: *const Cell) -> Option<String> {
    let key = ptr as usize;
    ACTIVE.with(|active| {
        active
            .borrow()
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, name)| name.clone())
    })
}
