//! Shared owner of the live field
//!
//! The store hands out immutable `Arc` snapshots and swaps the whole field on
//! commit, so a reader never sees half of one field and half of another. Its
//! mutex is held only while a snapshot is cloned, a region is written, or a
//! field is swapped in; stencil computation runs outside the lock.
//!
//! Region writes that land between [`GridStore::begin_step`] and
//! [`GridStore::commit_step`] modify the live field copy-on-write (the step's
//! snapshot is untouched) and are journalled. Commit replays the journal onto
//! the stepped field, which orders every racing write strictly after the step.

use super::field::{ScalarField, Temperature};
use super::region::Region;
use crate::error::GridError;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

#[derive(Debug)]
struct StoreState {
    current: Arc<ScalarField>,
    /// Region writes made while a step is computing; `None` when idle
    journal: Option<Vec<(Region, Temperature)>>,
}

/// Thread-safe holder of the current [`ScalarField`]
#[derive(Debug)]
pub struct GridStore {
    state: Mutex<StoreState>,
}

impl GridStore {
    /// Create a store holding a zeroed `width` x `height` field
    ///
    /// # Errors
    ///
    /// [`GridError::InvalidDimensions`] if either dimension is zero.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        Ok(Self::from_field(ScalarField::new(width, height)?))
    }

    pub fn from_field(field: ScalarField) -> Self {
        Self {
            state: Mutex::new(StoreState {
                current: Arc::new(field),
                journal: None,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, GridError> {
        self.state.lock().map_err(|_| GridError::LockPoisoned)
    }

    /// Read-only view of the field as it is right now
    pub fn snapshot(&self) -> Result<Arc<ScalarField>, GridError> {
        Ok(Arc::clone(&self.lock()?.current))
    }

    /// `(width, height)` of the live field
    pub fn dimensions(&self) -> Result<(usize, usize), GridError> {
        Ok(self.lock()?.current.dimensions())
    }

    /// Swap in `field` as the live field
    ///
    /// # Errors
    ///
    /// [`GridError::DimensionMismatch`] unless `field` has the live field's
    /// dimensions; the live field is left untouched in that case.
    pub fn replace(&self, field: ScalarField) -> Result<(), GridError> {
        let mut state = self.lock()?;
        check_dimensions(&state.current, &field)?;
        state.current = Arc::new(field);
        Ok(())
    }

    /// Set every cell of `region` (clipped to the field) to `value`
    ///
    /// Returns the number of cells written.
    pub fn set_region(&self, region: &Region, value: Temperature) -> Result<usize, GridError> {
        let mut state = self.lock()?;
        let written = Arc::make_mut(&mut state.current).fill_region(region, value);
        if let Some(journal) = state.journal.as_mut() {
            journal.push((*region, value));
        }
        Ok(written)
    }

    /// Destroy the live field and start over with a zeroed field of new size
    ///
    /// # Errors
    ///
    /// [`GridError::InvalidDimensions`] for a zero dimension; the old field is
    /// kept in that case.
    pub fn reset(&self, width: usize, height: usize) -> Result<(), GridError> {
        let field = ScalarField::new(width, height)?;
        let mut state = self.lock()?;
        state.current = Arc::new(field);
        state.journal = None;
        Ok(())
    }

    /// Take the snapshot a step computes from and start journalling region writes
    pub(crate) fn begin_step(&self) -> Result<Arc<ScalarField>, GridError> {
        let mut state = self.lock()?;
        state.journal = Some(Vec::new());
        Ok(Arc::clone(&state.current))
    }

    /// Replay journalled writes onto `next` and make it the live field
    pub(crate) fn commit_step(&self, mut next: ScalarField) -> Result<(), GridError> {
        let mut state = self.lock()?;
        let journal = state.journal.take().unwrap_or_default();
        check_dimensions(&state.current, &next)?;

        if !journal.is_empty() {
            trace!(writes = journal.len(), "replaying region writes onto stepped field");
        }
        for (region, value) in &journal {
            next.fill_region(region, *value);
        }

        state.current = Arc::new(next);
        Ok(())
    }

    /// Stop journalling after a failed step; the live field already holds
    /// every region write.
    pub(crate) fn abort_step(&self) -> Result<(), GridError> {
        self.lock()?.journal = None;
        Ok(())
    }
}

fn check_dimensions(current: &ScalarField, offered: &ScalarField) -> Result<(), GridError> {
    if current.dimensions() == offered.dimensions() {
        Ok(())
    } else {
        Err(GridError::DimensionMismatch {
            expected: current.dimensions(),
            actual: offered.dimensions(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Rect, MAX_TEMP};

    #[test]
    fn test_new_store_is_zeroed() {
        let store = GridStore::new(6, 4).unwrap();
        let field = store.snapshot().unwrap();
        assert_eq!(field.dimensions(), (6, 4));
        assert_eq!(field.total_heat(), 0);
    }

    #[test]
    fn test_new_store_rejects_zero() {
        assert!(matches!(
            GridStore::new(0, 4),
            Err(GridError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let store = GridStore::new(5, 5).unwrap();
        let before = store.snapshot().unwrap();
        store
            .set_region(&Region::from(Rect::new(0, 0, 4, 4)), 10)
            .unwrap();
        assert_eq!(before.total_heat(), 0);
        assert_eq!(store.snapshot().unwrap().total_heat(), 250);
    }

    #[test]
    fn test_replace_checks_dimensions() {
        let store = GridStore::new(5, 5).unwrap();
        let err = store.replace(ScalarField::new(4, 5).unwrap()).unwrap_err();
        assert_eq!(
            err,
            GridError::DimensionMismatch {
                expected: (5, 5),
                actual: (4, 5)
            }
        );

        store
            .replace(ScalarField::with_value(5, 5, 3).unwrap())
            .unwrap();
        assert_eq!(store.snapshot().unwrap().get(2, 2), 3);
    }

    #[test]
    fn test_reset_changes_dimensions() {
        let store = GridStore::new(5, 5).unwrap();
        store.set_region(&Region::disk(2, 2, 1), MAX_TEMP).unwrap();
        store.reset(8, 3).unwrap();
        let field = store.snapshot().unwrap();
        assert_eq!(field.dimensions(), (8, 3));
        assert_eq!(field.total_heat(), 0);

        assert!(store.reset(0, 3).is_err());
        assert_eq!(store.dimensions().unwrap(), (8, 3));
    }

    #[test]
    fn test_writes_during_step_are_replayed_on_commit() {
        let store = GridStore::new(5, 5).unwrap();
        let snapshot = store.begin_step().unwrap();

        store.set_region(&Region::disk(2, 2, 0), MAX_TEMP).unwrap();
        assert_eq!(snapshot.get(2, 2), 0, "snapshot must not see the write");

        let stepped = ScalarField::with_value(5, 5, 1).unwrap();
        store.commit_step(stepped).unwrap();

        let live = store.snapshot().unwrap();
        assert_eq!(live.get(2, 2), MAX_TEMP);
        assert_eq!(live.get(1, 1), 1);
    }

    #[test]
    fn test_abort_stops_journalling() {
        let store = GridStore::new(3, 3).unwrap();
        let _snapshot = store.begin_step().unwrap();
        store.set_region(&Region::disk(1, 1, 0), 7).unwrap();
        store.abort_step().unwrap();

        // A later commit with no step in flight replays nothing
        store.replace(ScalarField::new(3, 3).unwrap()).unwrap();
        store.begin_step().unwrap();
        store.commit_step(ScalarField::new(3, 3).unwrap()).unwrap();
        assert_eq!(store.snapshot().unwrap().get(1, 1), 0);
    }

    #[test]
    fn test_abort_reports_poisoned_lock() {
        let store = GridStore::new(3, 3).unwrap();
        store.begin_step().unwrap();

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.state.lock().unwrap();
            panic!("writer died holding the store lock");
        }));

        assert_eq!(store.abort_step(), Err(GridError::LockPoisoned));
        assert_eq!(store.snapshot().unwrap_err(), GridError::LockPoisoned);
    }
}
