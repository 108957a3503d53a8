/// Carries jump requests from the output pane to the editor.
use std::sync::mpsc::{self, Receiver, Sender};

use crate::position::JumpTarget;

/// Publishing end, held by whatever renders clickable output.
#[derive(Debug, Clone)]
pub struct JumpSender {
    tx: Sender<JumpTarget>,
}

impl JumpSender {
    /// Publishes `target`. Returns false if the editor side is gone.
    pub fn send(&self, target: JumpTarget) -> bool {
        self.tx.send(target).is_ok()
    }

    /// Parses a link payload (`"row,column"`) and publishes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is malformed.
    pub fn send_payload(&self, payload: &str) -> anyhow::Result<bool> {
        Ok(self.send(payload.parse()?))
    }
}

/// Receiving end, drained by the editor on its own schedule.
#[derive(Debug)]
pub struct JumpReceiver {
    rx: Receiver<JumpTarget>,
}

impl JumpReceiver {
    /// Returns every pending target, oldest first.
    pub fn drain(&self) -> Vec<JumpTarget> {
        self.rx.try_iter().collect()
    }

    /// Returns only the most recent pending target; earlier ones are stale.
    pub fn latest(&self) -> Option<JumpTarget> {
        self.rx.try_iter().last()
    }
}

/// Creates a connected sender/receiver pair.
pub fn channel() -> (JumpSender, JumpReceiver) {
    let (tx, rx) = mpsc::channel();
    (JumpSender { tx }, JumpReceiver { rx })
}
