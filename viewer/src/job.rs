use arrows_core::{
    generator::{generate_puzzle, GenerateError, GeneratorConfig},
    progress::CancelToken,
    snake::Snake,
};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    sync::mpsc::{self, RecvTimeoutError},
    thread::{self, JoinHandle},
    time::Duration,
};

/// Puzzle generation off the calling thread.
#[derive(new)]
pub struct GenerationJob {
    config: GeneratorConfig,
    seed: u64,
}

pub struct RunningJob {
    cancel: CancelToken,
    done: mpsc::Receiver<()>,
    handle: JoinHandle<Result<Vec<Snake>, GenerateError>>,
}

impl GenerationJob {
    pub fn spawn(self) -> RunningJob {
        let cancel = CancelToken::new();
        let (done_tx, done) = mpsc::channel();
        let worker_cancel = cancel.clone();
        let handle = thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(self.seed);
            let result = generate_puzzle(&mut rng, &self.config, &worker_cancel, |progress| {
                debug!("{} {}%: {}", progress.phase, progress.percent, progress.message)
            });
            // The receiver may be gone if the caller stopped waiting.
            let _ = done_tx.send(());
            result
        });
        RunningJob {
            cancel,
            done,
            handle,
        }
    }
}

impl RunningJob {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the puzzle, cancelling the generation once `timeout` has elapsed.
    pub fn wait(self, timeout: Option<Duration>) -> Result<Vec<Snake>, GenerateError> {
        if let Some(timeout) = timeout {
            match self.done.recv_timeout(timeout) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
                Err(RecvTimeoutError::Timeout) => {
                    warn!("generation timed out after {:?}", timeout);
                    self.cancel();
                }
            }
        }
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => {
                error!("generation thread panicked");
                Err(GenerateError::Cancelled)
            }
        }
    }
}

#[test]
fn test_job_generates_a_puzzle() {
    let config = GeneratorConfig {
        rows: 8,
        cols: 8,
        max_len: 6,
        target_coverage: 0.4,
        ..GeneratorConfig::default()
    };
    let snakes = GenerationJob::new(config, 1).spawn().wait(None).unwrap();
    assert!(!snakes.is_empty());
}

#[test]
fn test_cancelled_job() {
    let job = GenerationJob::new(GeneratorConfig::default(), 1).spawn();
    job.cancel();
    // The job may have finished before the flag was seen.
    if let Err(err) = job.wait(None) {
        assert_eq!(err, GenerateError::Cancelled);
    }
}
