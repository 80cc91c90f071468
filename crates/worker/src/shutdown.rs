//! Two-stage Ctrl-C handling, same shape as the wrapper/coordinator binaries:
//! first press asks for a graceful drain, a second press exits immediately.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

pub struct ShutdownController {
    presses: AtomicU8,
}

#[derive(Debug, Clone, Copy)]
pub enum ShutdownEvent {
    Graceful,
    Immediate,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self {
            presses: AtomicU8::new(0),
        }
    }

    fn bump(&self) -> u8 {
        self.presses.fetch_add(1, Ordering::SeqCst) + 1
    }
}

pub fn spawn_ctrl_c_handler(shutdown: Arc<ShutdownController>, tx: mpsc::UnboundedSender<ShutdownEvent>) {
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            if shutdown.bump() == 1 {
                let _ = tx.send(ShutdownEvent::Graceful);
            } else {
                let _ = tx.send(ShutdownEvent::Immediate);
                return;
            }
        }
    });
}
