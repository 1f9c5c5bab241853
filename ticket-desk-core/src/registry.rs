//! In-memory registry of live tickets keyed by channel id.
//!
//! Every state change goes through [`TicketState::apply`] while the registry
//! lock is held, so two close clicks racing on the same channel cannot both
//! win. The lock is never held across an await point.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::ticket::{Ticket, TicketError, TicketEvent, TicketState};

#[derive(Default)]
pub struct TicketRegistry {
    tickets: Mutex<HashMap<u64, Ticket>>,
}

impl TicketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ticket, replacing any entry for the same channel.
    pub fn insert(&self, ticket: Ticket) {
        let mut tickets = self.tickets.lock().expect("TicketRegistry lock poisoned");
        tickets.insert(ticket.channel_id, ticket);
    }

    pub fn get(&self, channel_id: u64) -> Option<Ticket> {
        let tickets = self.tickets.lock().expect("TicketRegistry lock poisoned");
        tickets.get(&channel_id).cloned()
    }

    pub fn state(&self, channel_id: u64) -> Option<TicketState> {
        self.get(channel_id).map(|ticket| ticket.state)
    }

    pub fn len(&self) -> usize {
        self.tickets.lock().expect("TicketRegistry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tickets currently in the `Open` state, ordered by number.
    pub fn open_tickets(&self) -> Vec<Ticket> {
        let tickets = self.tickets.lock().expect("TicketRegistry lock poisoned");
        let mut open: Vec<Ticket> = tickets
            .values()
            .filter(|ticket| ticket.state == TicketState::Open)
            .cloned()
            .collect();
        open.sort_by_key(|ticket| ticket.number);
        open
    }

    /// Move a ticket from `Open` to `Closing`.
    ///
    /// Channels the registry has never seen are attached from `fallback`
    /// first (tickets opened before a restart that recovery missed).
    pub fn begin_close(
        &self,
        channel_id: u64,
        fallback: Option<Ticket>,
    ) -> Result<Ticket, TicketError> {
        let mut tickets = self.tickets.lock().expect("TicketRegistry lock poisoned");

        if !tickets.contains_key(&channel_id) {
            let ticket = fallback.ok_or(TicketError::NotATicket(channel_id))?;
            tickets.insert(channel_id, ticket);
        }

        let ticket = tickets
            .get_mut(&channel_id)
            .ok_or(TicketError::NotATicket(channel_id))?;
        ticket.state = ticket.state.apply(TicketEvent::Close)?;
        Ok(ticket.clone())
    }

    /// Move a ticket from `Closing` to `Deleted` and forget it.
    pub fn mark_deleted(&self, channel_id: u64) -> Result<Ticket, TicketError> {
        let mut tickets = self.tickets.lock().expect("TicketRegistry lock poisoned");

        let ticket = tickets
            .get_mut(&channel_id)
            .ok_or(TicketError::NotATicket(channel_id))?;
        ticket.state = ticket.state.apply(TicketEvent::Delete)?;

        let deleted = ticket.clone();
        tickets.remove(&channel_id);
        Ok(deleted)
    }

    /// Forget a ticket whose channel is gone, whatever its state.
    pub fn remove(&self, channel_id: u64) -> Option<Ticket> {
        let mut tickets = self.tickets.lock().expect("TicketRegistry lock poisoned");
        tickets.remove(&channel_id)
    }

    /// Attach tickets discovered at startup. Existing entries win.
    ///
    /// Returns how many tickets were attached.
    pub fn recover(&self, discovered: impl IntoIterator<Item = Ticket>) -> usize {
        let mut tickets = self.tickets.lock().expect("TicketRegistry lock poisoned");
        let mut attached = 0;
        for ticket in discovered {
            if let std::collections::hash_map::Entry::Vacant(slot) =
                tickets.entry(ticket.channel_id)
            {
                slot.insert(ticket);
                attached += 1;
            }
        }
        attached
    }
}
