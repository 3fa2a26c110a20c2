//! Background normalization.
//!
//! One worker thread takes jobs in submission order, so two runs never write
//! into the output directories at the same time. Completions queue up until
//! the picker drains them on the host's thread.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use super::state::RunId;
use crate::normalize::{NormalizeError, NormalizedImage, Normalizer};

pub struct Job {
    pub run: RunId,
    pub source: Vec<u8>,
}

pub struct Completion {
    pub run: RunId,
    pub result: Result<NormalizedImage, NormalizeError>,
}

pub struct NormalizeWorker {
    jobs: Option<Sender<Job>>,
    completions: Receiver<Completion>,
    handle: Option<JoinHandle<()>>,
}

impl NormalizeWorker {
    pub fn spawn(normalizer: Normalizer) -> io::Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (done_tx, done_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("imagepick-normalize".to_string())
            .spawn(move || {
                for job in job_rx {
                    debug!(run = %job.run, bytes = job.source.len(), "normalizing");
                    let result = normalizer.normalize(&job.source);
                    if done_tx.send(Completion { run: job.run, result }).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            jobs: Some(job_tx),
            completions: done_rx,
            handle: Some(handle),
        })
    }

    /// Queue a job. Hands the job back if the worker has gone away.
    pub fn submit(&self, job: Job) -> Result<(), Job> {
        match &self.jobs {
            Some(jobs) => jobs.send(job).map_err(|e| e.0),
            None => Err(job),
        }
    }

    pub fn try_next(&self) -> Option<Completion> {
        self.completions.try_recv().ok()
    }

    /// Block up to `timeout` for the next completion.
    pub fn wait_next(&self, timeout: Duration) -> Option<Completion> {
        match self.completions.recv_timeout(timeout) {
            Ok(completion) => Some(completion),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for NormalizeWorker {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop
        drop(self.jobs.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("normalize worker panicked");
            }
        }
    }
}
