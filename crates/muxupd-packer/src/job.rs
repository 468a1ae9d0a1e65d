use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use muxupd::{CompressionOptions, ProgressEvent, Session};

use crate::{pack_session, Error};

pub enum PackOutcome {
    Success { output_path: PathBuf },
    Error { output_dir: PathBuf, error: Error },
}

/// Archive build running on a worker thread. The session is moved into the
/// job, so selections cannot change while it runs.
pub struct PackJob {
    events: Receiver<ProgressEvent>,
    handle: Option<thread::JoinHandle<Result<PathBuf, Error>>>,
    output_dir: PathBuf,
    last: Option<ProgressEvent>,
}

impl PackJob {
    pub fn spawn(session: Session, output_dir: PathBuf, options: CompressionOptions) -> Self {
        let (mut sender, events) = mpsc::channel::<ProgressEvent>();
        let thread_output_dir = output_dir.clone();

        let handle = thread::spawn(move || {
            pack_session(&session, &thread_output_dir, &options, &mut sender)
        });

        Self {
            events,
            handle: Some(handle),
            output_dir,
            last: None,
        }
    }

    /// Most recent progress event seen by [`PackJob::poll`] or [`PackJob::wait`].
    pub fn last_progress(&self) -> Option<ProgressEvent> {
        self.last
    }

    /// Drains pending progress into `on_progress`. Returns the outcome once the
    /// worker is done, `None` while it is still running.
    pub fn poll(&mut self, mut on_progress: impl FnMut(ProgressEvent)) -> Option<PackOutcome> {
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.last = Some(event);
                    on_progress(event);
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => return Some(self.join()),
            }
        }
    }

    /// Blocks until the worker finishes, forwarding progress as it arrives.
    pub fn wait(mut self, mut on_progress: impl FnMut(ProgressEvent)) -> PackOutcome {
        while let Ok(event) = self.events.recv() {
            self.last = Some(event);
            on_progress(event);
        }
        self.join()
    }

    fn join(&mut self) -> PackOutcome {
        let result = match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                Err(Error::IOError(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "pack worker panicked",
                )))
            }),
            None => Err(Error::IOError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "pack job already finished",
            ))),
        };

        match result {
            Ok(output_path) => PackOutcome::Success { output_path },
            Err(error) => PackOutcome::Error {
                output_dir: self.output_dir.clone(),
                error,
            },
        }
    }
}
