// src/refresh.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info};

use crate::book::ProspectBook;
use crate::store::Backend;

enum Signal {
    Regained,
    Stop,
}

/// Handle to the background poller. Dropping it stops the thread.
pub struct Refresher {
    tx: Sender<Signal>,
    foreground: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Refresher {
    /// Poll `book` every `interval` while in the foreground. The local cache
    /// is never polled; the thread still runs so visibility calls stay cheap.
    pub fn spawn(book: ProspectBook, interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let foreground = Arc::new(AtomicBool::new(true));
        let visible = foreground.clone();
        let polls = book.backend() == Backend::Remote;

        let handle = std::thread::spawn(move || {
            info!(?interval, polls, "refresher started");
            loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if polls && visible.load(Ordering::SeqCst) {
                            book.refresh_in_background();
                        }
                    }
                    Ok(Signal::Regained) => {
                        debug!("back in the foreground");
                        if polls {
                            book.refresh_in_background();
                        }
                    }
                    Ok(Signal::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("refresher stopped");
        });

        Self {
            tx,
            foreground,
            handle: Some(handle),
        }
    }

    /// Foreground/background switch from the UI. Coming back to the
    /// foreground refreshes right away.
    pub fn set_visible(&self, visible: bool) {
        let was_visible = self.foreground.swap(visible, Ordering::SeqCst);
        if visible && !was_visible {
            let _ = self.tx.send(Signal::Regained);
        }
    }

    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }

    fn shutdown(&mut self) {
        let _ = self.tx.send(Signal::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
