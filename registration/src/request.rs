//! Last-writer-wins request tokens.
//!
//! Each async action takes a ticket before its first await and checks it
//! after its last. A newer ticket of the same kind makes older ones stale;
//! stale results are dropped without touching state or reporting an error.
//! An action that replaces the whole working map can also retire tickets of
//! other kinds with [`LatestRequest::supersede`]. Nothing is aborted.

use std::cell::Cell;

/// Independent token streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Compute,
    Save,
    LoadMap,
    Upload,
}

impl RequestKind {
    const COUNT: usize = 4;

    fn slot(self) -> usize {
        match self {
            Self::Compute => 0,
            Self::Save => 1,
            Self::LoadMap => 2,
            Self::Upload => 3,
        }
    }
}

/// Proof of which request an async result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    kind: RequestKind,
    id: u64,
}

impl RequestTicket {
    #[must_use]
    pub fn kind(self) -> RequestKind {
        self.kind
    }
}

/// Monotonic counters, one per [`RequestKind`]. Shared by reference; uses
/// interior mutability so tickets can be issued across awaits.
#[derive(Debug, Default)]
pub struct LatestRequest {
    latest: [Cell<u64>; RequestKind::COUNT],
}

impl LatestRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket that supersedes every earlier one of `kind`.
    pub fn begin(&self, kind: RequestKind) -> RequestTicket {
        let counter = &self.latest[kind.slot()];
        let id = counter.get() + 1;
        counter.set(id);
        RequestTicket { kind, id }
    }

    /// Make every outstanding ticket of `kinds` stale without issuing new ones.
    pub fn supersede(&self, kinds: &[RequestKind]) {
        for kind in kinds {
            let counter = &self.latest[kind.slot()];
            counter.set(counter.get() + 1);
        }
    }

    /// Whether no newer ticket of the same kind has been issued.
    #[must_use]
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest[ticket.kind.slot()].get() == ticket.id
    }
}
