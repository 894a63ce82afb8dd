//! The pending-request table.
//!
//! Owned by the dispatch loop alone, so it needs no locking. An entry is
//! created when the loop accepts a request and removed exactly once:
//! either when its response arrives or when the loop drains the table
//! on shutdown.

use std::collections::HashMap;

use obsws_protocol::MessageId;

use crate::ClientError;

/// Completes one waiting caller.
///
/// Receives the raw response frame (or the reason there will never be
/// one), decodes it into the caller's response type, and hands the
/// result over. Called at most once.
pub(crate) type Responder = Box<dyn FnOnce(Result<&[u8], ClientError>) + Send>;

pub(crate) struct PendingTable {
    next_id: u64,
    entries: HashMap<MessageId, Responder>,
}

impl PendingTable {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 1,
            entries: HashMap::new(),
        }
    }

    /// Allocates the next correlation id. Ids are strictly increasing,
    /// so an id is never reused while it is outstanding.
    pub(crate) fn allocate_id(&mut self) -> MessageId {
        let id = MessageId::from(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn insert(&mut self, id: MessageId, responder: Responder) {
        let previous = self.entries.insert(id, responder);
        debug_assert!(previous.is_none(), "correlation id reused while outstanding");
    }

    pub(crate) fn remove(&mut self, id: &MessageId) -> Option<Responder> {
        self.entries.remove(id)
    }

    /// Removes every entry, leaving the table empty.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (MessageId, Responder)> + '_ {
        self.entries.drain()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
