//! Queue between the runtime's event bus and the outbound sender.
//!
//! The bus delivers synchronously while the runtime lock is held, so the
//! subscriber half only clones the event into a channel.  The session loop
//! drains the receiver half after releasing the lock and does the slow I/O.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::error::SubscriberError;
use crate::runtime::ChangeEvent;
use crate::runtime::bus::EventSubscriber;

/// Subscriber half; register it on [`Topic::Any`](crate::runtime::Topic::Any).
pub struct ChangeForwarder {
    tx: Sender<ChangeEvent>,
}

/// Receiver half, owned by the session loop.
pub struct ChangeQueue {
    rx: Receiver<ChangeEvent>,
}

pub fn change_queue() -> (ChangeForwarder, ChangeQueue) {
    let (tx, rx) = mpsc::channel();
    (ChangeForwarder { tx }, ChangeQueue { rx })
}

impl EventSubscriber for ChangeForwarder {
    fn on_event(&mut self, event: &ChangeEvent) -> Result<(), SubscriberError> {
        self.tx
            .send(event.clone())
            .map_err(|_| SubscriberError("change queue receiver dropped".into()))
    }
}

impl ChangeQueue {
    /// Everything queued so far, oldest first.  Never blocks.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.rx.try_iter().collect()
    }
}
