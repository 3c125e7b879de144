// Gmetric - A Ganglia gmetric client for Rust!
//
// Copyright 2026 The gmetric developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::error;

/// Statistics about the job being run by the `execute` method.
#[derive(Debug, Default)]
pub struct ExecuteStats {
    panics: AtomicU64,
}

impl ExecuteStats {
    fn incr_panic(&self) {
        self.panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn panics(&self) -> u64 {
        self.panics.load(Ordering::Relaxed)
    }
}

/// Handle to a job started by `execute`.
#[derive(Debug)]
pub struct Execution {
    stats: Arc<ExecuteStats>,
    done: Receiver<()>,
}

impl Execution {
    pub fn panics(&self) -> u64 {
        self.stats.panics()
    }

    /// Block until the job returns without panicking.
    pub fn wait(&self) {
        let _ = self.done.recv();
    }

    /// Block until the job returns or the timeout expires, returning
    /// `true` if the job finished.
    #[cfg(test)]
    pub fn wait_timeout(&self, timeout: std::time::Duration) -> bool {
        use crossbeam_channel::RecvTimeoutError;
        !matches!(self.done.recv_timeout(timeout), Err(RecvTimeoutError::Timeout))
    }
}

/// Execute the task `f` in a new thread until completion, restarting it if the
/// task panics.
///
/// Since a new thread is created for each task executed, this should only be used for
/// long-running tasks.
pub fn execute<F>(name: &str, f: F) -> Execution
where
    F: Fn() + Send + Sync + 'static,
{
    let stats = Arc::new(ExecuteStats::default());
    let (tx, rx) = bounded(1);
    spawn_in_thread(name.to_owned(), Arc::new(f), stats.clone(), tx);

    Execution { stats, done: rx }
}

/// Create a thread and run the job in it to completion
///
/// This function uses a `Sentinel` struct to make sure that any panics from
/// running the job result in another thread being spawned to start running
/// the job again.
fn spawn_in_thread<F>(name: String, job: Arc<F>, stats: Arc<ExecuteStats>, done: Sender<()>)
where
    F: Fn() + Send + Sync + 'static,
{
    let builder = thread::Builder::new().name(name.clone());
    let res = builder.spawn(move || {
        let mut sentinel = Sentinel::new(&name, &job, &stats, &done);
        job();
        sentinel.cancel();
        let _ = done.try_send(());
    });

    if let Err(e) = res {
        error!("unable to spawn background thread: {}", e);
    }
}

/// Struct for ensuring a job runs to completion correctly, without
/// panicking.
///
/// The sentinel will spawn a new thread to continue running the job
/// in its destructor unless the `.cancel()` method is called after the
/// job completes (which won't happen if the job panics).
struct Sentinel<'a, F>
where
    F: Fn() + Send + Sync + 'static,
{
    name: &'a str,
    job: &'a Arc<F>,
    stats: &'a Arc<ExecuteStats>,
    done: &'a Sender<()>,
    active: bool,
}

impl<'a, F> Sentinel<'a, F>
where
    F: Fn() + Send + Sync + 'static,
{
    fn new(name: &'a str, job: &'a Arc<F>, stats: &'a Arc<ExecuteStats>, done: &'a Sender<()>) -> Self {
        Sentinel {
            name,
            job,
            stats,
            done,
            active: true,
        }
    }

    fn cancel(&mut self) {
        self.active = false;
    }
}

impl<'a, F> Drop for Sentinel<'a, F>
where
    F: Fn() + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if self.active {
            // The job panicked, run it again in a fresh thread
            self.stats.incr_panic();
            error!("{} thread panicked, restarting it", self.name);
            spawn_in_thread(
                self.name.to_owned(),
                self.job.clone(),
                self.stats.clone(),
                self.done.clone(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::execute;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_execute_runs_job() {
        let runs = Arc::new(AtomicU64::new(0));
        let runs_ref = runs.clone();

        let execution = execute("test-job", move || {
            runs_ref.fetch_add(1, Ordering::Relaxed);
        });

        assert!(execution.wait_timeout(Duration::from_secs(5)));
        assert_eq!(1, runs.load(Ordering::Relaxed));
        assert_eq!(0, execution.panics());
    }

    #[test]
    fn test_execute_restarts_after_panic() {
        let runs = Arc::new(AtomicU64::new(0));
        let runs_ref = runs.clone();

        let execution = execute("test-panic", move || {
            if runs_ref.fetch_add(1, Ordering::Relaxed) < 2 {
                panic!("job failed");
            }
        });

        assert!(execution.wait_timeout(Duration::from_secs(5)));
        assert_eq!(3, runs.load(Ordering::Relaxed));
        assert_eq!(2, execution.panics());
    }
}
