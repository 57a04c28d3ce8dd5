//! Last-request-wins ordering for overlapping requests.
//!
//! Every request against a state holder is tagged with a [`Ticket`] from that
//! holder's [`SequenceGate`]. When the response settles, the holder asks the
//! gate to [`admit`](SequenceGate::admit) the ticket: only the most recently
//! issued ticket is admitted, so a slower response from a superseded request
//! is discarded instead of overwriting newer state. There is no real
//! cancellation; discarding is the whole mechanism.

use crate::error::Result;

/// Sequence number of one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn seq(self) -> u64 {
        self.0
    }
}

/// Result of settling a tagged response against a state holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// The response belonged to the latest request and was applied.
    Applied,
    /// A newer request was issued meanwhile; the response was dropped.
    Stale,
}

impl Settled {
    pub fn is_applied(self) -> bool {
        self == Settled::Applied
    }
}

/// Monotonic issue counter plus the last admitted sequence number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceGate {
    issued: u64,
    applied: u64,
}

impl SequenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag a new request. Tickets are strictly increasing.
    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// True while no later request has been issued.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    /// Admit `ticket` if it is still current, recording it as applied.
    pub fn admit(&mut self, ticket: Ticket) -> bool {
        if self.is_current(ticket) && ticket.0 > self.applied {
            self.applied = ticket.0;
            true
        } else {
            false
        }
    }

    /// Settle a response for `ticket`.
    ///
    /// A superseded ticket settles as [`Settled::Stale`] whether the call
    /// succeeded or failed. A current failure is returned unchanged and
    /// `apply` is not run, so the holder's state is left untouched.
    pub fn settle<T>(
        &mut self,
        ticket: Ticket,
        result: Result<T>,
        apply: impl FnOnce(T),
    ) -> Result<Settled> {
        if !self.is_current(ticket) {
            return Ok(Settled::Stale);
        }
        let value = result?;
        if self.admit(ticket) {
            apply(value);
            Ok(Settled::Applied)
        } else {
            Ok(Settled::Stale)
        }
    }

    /// Supersede every in-flight request without issuing a new one.
    pub fn invalidate(&mut self) {
        self.issued += 1;
    }

    pub fn last_issued(&self) -> u64 {
        self.issued
    }

    pub fn last_applied(&self) -> u64 {
        self.applied
    }
}
