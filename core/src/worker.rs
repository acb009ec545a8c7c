//! Encode worker: one job in flight at a time.
//!
//! The caller submits a job and gets a handle back; a second submit while a
//! job is active fails fast with `Busy` instead of queueing. Cancellation is
//! cooperative and coarse: the pipeline polls the token between effects and
//! frame loops, and the pending result then resolves to `Cancelled`,
//! distinct from any encode failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use crate::{
    command::Command,
    config::PipelineOptions,
    error::{Error, Result},
    pipeline::{modify_image, Output},
};

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

pub struct Job {
    pub bytes: Vec<u8>,
    pub commands: Vec<Command>,
    pub options: PipelineOptions,
}

pub struct Worker {
    busy: Arc<AtomicBool>,
}

impl Worker {
    pub fn new() -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn submit(&self, job: Job) -> Result<JobHandle> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(Error::Busy);
        }

        let token = CancelToken::new();
        let job_token = token.clone();
        let busy = Arc::clone(&self.busy);
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = modify_image(&job.bytes, &job.commands, &job.options, &job_token);
            busy.store(false, Ordering::SeqCst);
            let _ = tx.send(result);
        });

        Ok(JobHandle { token, rx })
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}

pub struct JobHandle {
    token: CancelToken,
    rx: mpsc::Receiver<Result<Output>>,
}

impl JobHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Blocks until the job resolves.
    pub fn wait(self) -> Result<Output> {
        self.rx.recv().unwrap_or(Err(Error::WorkerGone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::GifEncoder;
    use image::{Rgba, RgbaImage};

    fn sample_gif(frame_count: usize, size: u32) -> Vec<u8> {
        let mut encoder = GifEncoder::new(size, size);
        encoder.set_repeat(0);
        encoder.start().unwrap();
        for i in 0..frame_count {
            encoder.set_delay(10);
            let shade = (i * 60 % 256) as u8;
            encoder
                .add_frame(&RgbaImage::from_pixel(size, size, Rgba([shade, 100, 180, 255])))
                .unwrap();
        }
        encoder.finish().unwrap();
        encoder.get_and_reset_buffer()
    }

    fn slow_job() -> Job {
        // A rainbow cycle is a few hundred frames of work; plenty of time
        // for a second submit or a cancel to land first.
        Job {
            bytes: sample_gif(4, 48),
            commands: vec![Command::Rainbow { step: 8 }],
            options: PipelineOptions::default(),
        }
    }

    #[test]
    fn second_submit_is_rejected_while_busy() {
        let worker = Worker::new();
        let handle = worker.submit(slow_job()).unwrap();
        let second = worker.submit(Job {
            bytes: sample_gif(1, 8),
            commands: vec![],
            options: PipelineOptions::default(),
        });
        assert!(matches!(second, Err(Error::Busy)));

        // The first job is unaffected by the rejected submit.
        let output = handle.wait().unwrap();
        assert!(!output.bytes.is_empty());
    }

    #[test]
    fn worker_is_reusable_after_completion() {
        let worker = Worker::new();
        let first = worker
            .submit(Job {
                bytes: sample_gif(2, 8),
                commands: vec![Command::Reverse],
                options: PipelineOptions::default(),
            })
            .unwrap();
        first.wait().unwrap();

        let second = worker
            .submit(Job {
                bytes: sample_gif(2, 8),
                commands: vec![Command::Reverse],
                options: PipelineOptions::default(),
            })
            .unwrap();
        second.wait().unwrap();
    }

    #[test]
    fn cancel_resolves_distinctly_from_failure() {
        let worker = Worker::new();
        let handle = worker.submit(slow_job()).unwrap();
        handle.cancel();
        match handle.wait() {
            Err(Error::Cancelled) => {}
            other => panic!("expected Cancelled, got {:?}", other.map(|o| o.bytes.len())),
        }
    }
}
