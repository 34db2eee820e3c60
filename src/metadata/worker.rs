use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use crate::disc::TableOfContents;

use super::client::MetadataSource;
use super::model::{AlbumMetadata, MetadataError};

/// Look up the disc inserted as `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRequest {
    pub generation: u64,
    pub toc: TableOfContents,
}

#[derive(Debug, Clone)]
pub struct MetadataResult {
    pub generation: u64,
    pub outcome: Result<AlbumMetadata, MetadataError>,
}

/// Background thread running lookups one at a time.
///
/// Requests queued while a lookup is in flight collapse to the newest one;
/// older discs are gone by then.
pub struct MetadataWorker {
    tx: Option<Sender<MetadataRequest>>,
    join: Option<JoinHandle<()>>,
}

impl MetadataWorker {
    pub fn spawn<S, F>(mut source: S, deliver: F) -> std::io::Result<Self>
    where
        S: MetadataSource + 'static,
        F: Fn(MetadataResult) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<MetadataRequest>();
        let join = thread::Builder::new()
            .name("metadata".into())
            .spawn(move || {
                while let Ok(mut request) = rx.recv() {
                    while let Ok(newer) = rx.try_recv() {
                        request = newer;
                    }

                    let outcome =
                        panic::catch_unwind(AssertUnwindSafe(|| source.lookup(&request.toc)))
                            .unwrap_or_else(|_| {
                                Err(MetadataError::Other("metadata lookup panicked".into()))
                            });
                    match &outcome {
                        Ok(album) => log::info!("Album: {}", album.display_line()),
                        Err(e) => log::warn!("Metadata lookup failed: {e}"),
                    }
                    deliver(MetadataResult {
                        generation: request.generation,
                        outcome,
                    });
                }
                log::debug!("Metadata worker stopped");
            })?;

        Ok(Self {
            tx: Some(tx),
            join: Some(join),
        })
    }

    /// Queue a lookup. Returns false once the worker is gone.
    pub fn request(&self, request: MetadataRequest) -> bool {
        self.tx
            .as_ref()
            .is_some_and(|tx| tx.send(request).is_ok())
    }

    /// Close the queue. The thread exits after any in-flight lookup; its
    /// result is dropped if nobody is listening.
    pub fn shutdown(&mut self) {
        self.tx = None;
        self.join = None;
    }

    /// Close the queue and wait for the thread to exit.
    #[cfg(test)]
    pub fn join(mut self) {
        self.tx = None;
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}

impl Drop for MetadataWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
