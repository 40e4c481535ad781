//! Shared, lock-free handles that let two pipeline stages coordinate state
//! without the message-only channel between them, mirroring the teacher's
//! pattern of a small `Arc<Atomic*>` passed to both sides at wiring time
//! (see also `oee-exporters`'s `SinkBackpressureHandle`, the same pattern
//! applied to sink congestion).
//!
//! The Sparkplug Codec's encoder (C2) and the edge MQTT publisher (C3) are
//! split across a processor and an exporter, which the engine never lets
//! exchange messages directly, so the two coordination facts they need to
//! share — "a rebirth is due" and "what `bd_seq` the current birth used" —
//! are carried here instead.

use std::sync::{
    atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
    Arc,
};

/// Raised by the MQTT publisher when a reconnect means the next frame
/// published MUST be a fresh NBIRTH, and cleared by the encoder once it has
/// emitted one, per §4.3 ("on reconnect, the session MUST republish NBIRTH
/// before any NDATA").
#[derive(Clone)]
pub struct RebirthRequestHandle(Arc<AtomicBool>);

impl RebirthRequestHandle {
    /// Creates a handle with no rebirth currently requested.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Marks a rebirth as due.
    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Atomically reads and clears the pending flag; `true` means the
    /// caller is now responsible for emitting a fresh NBIRTH.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}

impl Default for RebirthRequestHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// The `bd_seq` value declared by the encoder's most recent NBIRTH, read by
/// the MQTT publisher when it registers the session's Last Will (NDEATH
/// must carry the same `bd_seq` as the birth it kills, per the Sparkplug B
/// spec referenced in §6).
#[derive(Clone)]
pub struct BdSeqHandle(Arc<AtomicU64>);

impl BdSeqHandle {
    /// Creates a handle starting at `bd_seq` 0.
    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(0)))
    }

    /// Assigns the next `bd_seq`, wrapping per the Sparkplug B convention,
    /// and returns it.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// Reads the current `bd_seq` without advancing it.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for BdSeqHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// The Backpressure Controller's (C5) current verdict, read by the PLC
/// Drivers (C1) it throttles.
///
/// C5 is co-located with the Store-and-Forward Buffer (C4) it reads, inside
/// the edge MQTT publisher's exporter task; C1 runs as one or more separate
/// receiver tasks. An exporter can only log, never emit pipeline messages
/// (see module docs), and a receiver has no inbound message channel at all
/// — so, as with rebirth coordination above, the fill-ratio-driven sampling
/// multiplier and low-priority-suppression flag are shared through a plain
/// handle instead of round-tripping through the pipeline, per §4.5's "control
/// flow for backpressure runs from C4 buffer depth back to C5, which
/// throttles C1".
#[derive(Clone)]
pub struct BackpressureHandle {
    multiplier: Arc<AtomicU32>,
    suppress_low_priority: Arc<AtomicBool>,
}

impl BackpressureHandle {
    /// Creates a handle starting in the nominal regime (multiplier 1, no
    /// suppression).
    pub fn new() -> Self {
        Self {
            multiplier: Arc::new(AtomicU32::new(1)),
            suppress_low_priority: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Publishes the controller's current regime.
    pub fn set(&self, multiplier: u32, suppress_low_priority: bool) {
        self.multiplier.store(multiplier, Ordering::Relaxed);
        self.suppress_low_priority.store(suppress_low_priority, Ordering::Relaxed);
    }

    /// The sampling-interval multiplier a PLC driver should apply to its
    /// configured base interval.
    pub fn multiplier(&self) -> u32 {
        self.multiplier.load(Ordering::Relaxed)
    }

    /// Whether low-priority signal types should currently be suppressed.
    pub fn suppresses_low_priority(&self) -> bool {
        self.suppress_low_priority.load(Ordering::Relaxed)
    }
}

impl Default for BackpressureHandle {
    fn default() -> Self {
        Self::new()
    }
}
