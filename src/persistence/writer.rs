//! Background score writer
//!
//! The frame loop hands finished runs to a bounded queue; a dedicated thread
//! drains it into the [`ScoreStore`]. Submitting never blocks: a full or
//! closed queue drops the score with a warning.

use std::thread;

use crossbeam_channel::{Sender, TrySendError, bounded};
use log::{debug, info, warn};

use super::{ScoreStore, SharedStore, StoreError};
use crate::highscores::ScoreRecord;

/// Pending saves allowed before new scores are dropped
pub const WRITER_QUEUE_CAPACITY: usize = 16;

enum WriterCommand {
    Save(ScoreRecord),
    Shutdown,
}

/// Owns the persistence thread
pub struct ScoreWriter {
    sender: Option<Sender<WriterCommand>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ScoreWriter {
    /// Start the writer thread with the default queue capacity
    pub fn spawn(store: SharedStore) -> Result<Self, StoreError> {
        Self::with_capacity(store, WRITER_QUEUE_CAPACITY)
    }

    pub fn with_capacity(mut store: SharedStore, capacity: usize) -> Result<Self, StoreError> {
        let (sender, receiver) = bounded::<WriterCommand>(capacity);

        let handle = thread::Builder::new()
            .name("score-writer".into())
            .spawn(move || {
                // Exits on Shutdown or when every sender is gone
                while let Ok(command) = receiver.recv() {
                    match command {
                        WriterCommand::Save(record) => match store.save_score(&record) {
                            Ok(()) => debug!("Saved score {} for {}", record.score, record.name),
                            Err(e) => warn!("Score save failed: {}", e),
                        },
                        WriterCommand::Shutdown => break,
                    }
                }
                info!("Score writer exiting.");
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue a record for saving without waiting
    pub fn submit(&self, record: ScoreRecord) -> Result<(), StoreError> {
        let sender = self.sender.as_ref().ok_or(StoreError::WriterDisconnected)?;
        match sender.try_send(WriterCommand::Save(record)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(WriterCommand::Save(record))) => {
                warn!("Score queue full, dropping score {}", record.score);
                Ok(())
            }
            Err(TrySendError::Full(_)) => Ok(()),
            Err(TrySendError::Disconnected(_)) => Err(StoreError::WriterDisconnected),
        }
    }

    /// Flush queued saves and stop the thread
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(sender) = self.sender.take() {
            // Blocking send so queued saves ahead of it still run
            let _ = sender.send(WriterCommand::Shutdown);
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Score writer panicked");
            }
        }
    }
}

impl Drop for ScoreWriter {
    fn drop(&mut self) {
        self.stop();
    }
}
