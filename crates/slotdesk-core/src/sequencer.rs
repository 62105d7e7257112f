use tracing::debug;

/// Position of a request in the issue order of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Hands out increasing tickets for one resource and decides whether a
/// response may still be applied. Only the newest issued ticket is current.
#[derive(Debug, Clone)]
pub struct RequestSequencer {
    resource: &'static str,
    issued: u64,
}

impl RequestSequencer {
    pub fn new(resource: &'static str) -> Self {
        Self {
            resource,
            issued: 0,
        }
    }

    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    /// Returns true when the response for `ticket` should be applied.
    pub fn accept(&self, ticket: Ticket) -> bool {
        let current = self.is_current(ticket);
        if !current {
            debug!(
                resource = self.resource,
                ticket = ticket.0,
                latest = self.issued,
                "discarding stale response"
            );
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::RequestSequencer;

    #[test]
    fn only_latest_ticket_is_accepted() {
        let mut seq = RequestSequencer::new("tasks");
        let first = seq.issue();
        let second = seq.issue();
        assert!(first < second);
        assert!(!seq.accept(first));
        assert!(seq.accept(second));
    }
}
