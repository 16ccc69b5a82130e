use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::OrchestratorError;

/// Counting admission gate bounding concurrently in-flight task executions.
///
/// Built on a fair `tokio::sync::Semaphore`, so waiters are admitted in FIFO
/// order relative to arrival. Permits release on drop, which guarantees a
/// matching release on every exit path of a dispatch, success or failure.
#[derive(Debug)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyGate {
    pub fn new(capacity: usize) -> Arc<Self> {
        let capacity = capacity.max(1);
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    /// Wait for a free slot. The returned permit holds the slot until drop.
    pub async fn acquire(self: &Arc<Self>) -> Result<GatePermit, OrchestratorError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| OrchestratorError::GateClosed)?;

        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);

        Ok(GatePermit {
            _permit: permit,
            gate: Arc::clone(self),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of permits currently held
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of simultaneously held permits observed so far
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }
}

/// RAII slot handle returned by [`ConcurrencyGate::acquire`]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    gate: Arc<ConcurrencyGate>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        let prev = self.gate.in_flight.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "gate released more times than acquired");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn holders_never_exceed_capacity() {
        let gate = ConcurrencyGate::new(2);

        let p1 = gate.acquire().await.unwrap();
        let p2 = gate.acquire().await.unwrap();
        assert_eq!(gate.in_flight(), 2);

        // Third acquire must block while both permits are held.
        let blocked = tokio::time::timeout(Duration::from_millis(50), gate.acquire()).await;
        assert!(blocked.is_err());

        drop(p1);
        let p3 = tokio::time::timeout(Duration::from_millis(50), gate.acquire())
            .await
            .expect("slot should free after release")
            .unwrap();

        assert_eq!(gate.in_flight(), 2);
        drop(p2);
        drop(p3);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn peak_tracks_maximum_holders() {
        let gate = ConcurrencyGate::new(4);
        assert_eq!(gate.peak(), 0);

        let p1 = gate.acquire().await.unwrap();
        let p2 = gate.acquire().await.unwrap();
        let p3 = gate.acquire().await.unwrap();
        assert_eq!(gate.peak(), 3);

        drop(p2);
        drop(p3);
        let _p4 = gate.acquire().await.unwrap();

        // Peak stays at the high-water mark.
        assert_eq!(gate.peak(), 3);
        drop(p1);
        assert_eq!(gate.peak(), 3);
    }

    #[tokio::test]
    async fn zero_capacity_is_clamped_to_one() {
        let gate = ConcurrencyGate::new(0);
        assert_eq!(gate.capacity(), 1);
        let _p = gate.acquire().await.unwrap();
        assert_eq!(gate.in_flight(), 1);
    }
}
