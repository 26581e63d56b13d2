use crate::app::event::CommandKind;

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    latest: u64,
    in_flight: bool,
}

/// Bookkeeping for in-flight commands, one slot per [`CommandKind`].
///
/// Each slot remembers the sequence number of the most recently issued
/// command of its kind. A result is accepted only if it echoes that number.
#[derive(Debug, Clone, Default)]
pub struct PendingCommands {
    next_seq: u64,
    slots: [Slot; CommandKind::ALL.len()],
}

impl PendingCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a command of `kind`, superseding any one still in flight.
    pub fn issue(&mut self, kind: CommandKind) -> u64 {
        self.next_seq += 1;
        let slot = &mut self.slots[kind.index()];
        slot.latest = self.next_seq;
        slot.in_flight = true;
        self.next_seq
    }

    /// Like [`issue`](Self::issue), but refuses while one is in flight.
    pub fn try_issue(&mut self, kind: CommandKind) -> Option<u64> {
        if self.in_flight(kind) {
            return None;
        }
        Some(self.issue(kind))
    }

    /// Settles a result. Returns `false` for a superseded (stale) result.
    pub fn complete(&mut self, kind: CommandKind, seq: u64) -> bool {
        let slot = &mut self.slots[kind.index()];
        if !slot.in_flight || slot.latest != seq {
            return false;
        }
        slot.in_flight = false;
        true
    }

    /// Drops whatever is in flight for `kind` without issuing a replacement.
    pub fn invalidate(&mut self, kind: CommandKind) {
        self.next_seq += 1;
        let slot = &mut self.slots[kind.index()];
        slot.latest = self.next_seq;
        slot.in_flight = false;
    }

    pub fn in_flight(&self, kind: CommandKind) -> bool {
        self.slots[kind.index()].in_flight
    }
}
