/// Identifies one advice request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceTicket {
    seq: u64,
    client_id: String,
}

impl AdviceTicket {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

#[derive(Debug, Default)]
enum Panel {
    #[default]
    Idle,
    Pending(AdviceTicket),
    Ready(String),
}

/// State of the advice panel on the details screen.
///
/// Only one request may be in flight. Results are accepted only for the
/// ticket that is currently pending, so an answer for a client the user has
/// already left is dropped.
#[derive(Debug, Default)]
pub struct AdviceTracker {
    last_seq: u64,
    panel: Panel,
}

impl AdviceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request for `client_id`. Returns `None` while another request
    /// is still pending.
    pub fn begin(&mut self, client_id: &str) -> Option<AdviceTicket> {
        if self.is_pending() {
            return None;
        }

        self.last_seq += 1;
        let ticket = AdviceTicket {
            seq: self.last_seq,
            client_id: client_id.to_string(),
        };
        self.panel = Panel::Pending(ticket.clone());
        Some(ticket)
    }

    /// Store the answer for `ticket`. Returns false if the ticket is stale.
    pub fn resolve(&mut self, ticket: &AdviceTicket, text: String) -> bool {
        match &self.panel {
            Panel::Pending(current) if current == ticket => {
                self.panel = Panel::Ready(text);
                true
            }
            _ => false,
        }
    }

    /// Forget the panel content and any request in flight.
    pub fn reset(&mut self) {
        self.panel = Panel::Idle;
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.panel, Panel::Pending(_))
    }

    pub fn advice(&self) -> Option<&str> {
        match &self.panel {
            Panel::Ready(text) => Some(text),
            _ => None,
        }
    }
}
