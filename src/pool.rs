//! Fixed-size worker pool with a FIFO job queue and a barrier.

use log::{error, warn};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Lifecycle of a single worker. A worker oscillates between `Idle` and
/// `Working` until it observes `Sigterm`, after which it moves to
/// `Terminating` and is never reused; `start` adds fresh workers instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Starting,
    Idle,
    Working,
    Sigterm,
    Terminating,
}

const MAX_CAPTURED_ERRORS: usize = 64;

struct PoolState {
    queue: VecDeque<Job>,
    signals: Vec<WorkerState>,
    busy: usize,
    errors: VecDeque<String>,
}

struct Shared {
    state: Mutex<PoolState>,
    /// Notified when a job arrives or a SIGTERM is posted.
    work_ready: Condvar,
    /// Notified when the queue drains and the last busy worker goes idle.
    all_idle: Condvar,
}

pub struct WorkerPool {
    shared: Arc<Shared>,
    threads: Vec<JoinHandle<()>>,
    capacity: usize,
}

impl WorkerPool {
    /// Creates a pool sized for `capacity` workers. Threads are not started
    /// until [`start`](Self::start) or [`start_all`](Self::start_all).
    pub fn new(capacity: usize) -> Self {
        WorkerPool {
            shared: Arc::new(Shared {
                state: Mutex::new(PoolState {
                    queue: VecDeque::new(),
                    signals: Vec::new(),
                    busy: 0,
                    errors: VecDeque::new(),
                }),
                work_ready: Condvar::new(),
                all_idle: Condvar::new(),
            }),
            threads: Vec::new(),
            capacity,
        }
    }

    pub fn start_all(&mut self) -> bool {
        self.start(self.capacity)
    }

    /// Grows the pool to `n` running workers. Returns `false` when `n` is
    /// below the number already running; the pool never shrinks in place.
    pub fn start(&mut self, n: usize) -> bool {
        if n < self.threads.len() {
            return false;
        }
        if n > self.capacity {
            self.capacity = n;
        }
        let mut state = self.shared.state.lock().unwrap();
        for id in self.threads.len()..n {
            state.signals.push(WorkerState::Starting);
            let shared = Arc::clone(&self.shared);
            self.threads.push(thread::spawn(move || worker_loop(&shared, id)));
        }
        true
    }

    /// Appends a job to the queue.
    pub fn add_job(&self, job: Job) {
        let mut state = self.shared.state.lock().unwrap();
        state.queue.push_back(job);
        drop(state);
        self.shared.work_ready.notify_one();
    }

    /// Blocks until the queue is empty and no worker is mid-job.
    pub fn synchronize(&self) {
        let mut state = self.shared.state.lock().unwrap();
        while !(state.queue.is_empty() && state.busy == 0) {
            state = self.shared.all_idle.wait(state).unwrap();
        }
    }

    /// Signals every worker to terminate, optionally synchronizing first,
    /// then joins them. In-flight jobs finish; queued jobs stay queued and
    /// need an explicit [`empty_queue`](Self::empty_queue).
    pub fn kill_all(&mut self, sync_first: bool) {
        if sync_first {
            self.synchronize();
        }
        {
            let mut state = self.shared.state.lock().unwrap();
            for signal in state.signals.iter_mut() {
                *signal = WorkerState::Sigterm;
            }
        }
        self.shared.work_ready.notify_all();
        for thread in self.threads.drain(..) {
            if thread.join().is_err() {
                warn!("worker thread panicked during shutdown");
            }
        }
        let mut state = self.shared.state.lock().unwrap();
        state.signals.clear();
        state.busy = 0;
    }

    /// Discards every queued job.
    pub fn empty_queue(&self) {
        self.shared.state.lock().unwrap().queue.clear();
    }

    pub fn queue_len(&self) -> usize {
        self.shared.state.lock().unwrap().queue.len()
    }

    pub fn running(&self) -> usize {
        self.threads.len()
    }

    /// Drains the messages of jobs that panicked since the last call. At
    /// most the most recent [`MAX_CAPTURED_ERRORS`] are retained.
    pub fn take_errors(&self) -> Vec<String> {
        let mut state = self.shared.state.lock().unwrap();
        state.errors.drain(..).collect()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.threads.is_empty() {
            self.kill_all(false);
        }
    }
}

fn worker_loop(shared: &Shared, id: usize) {
    loop {
        let job = {
            let mut state = shared.state.lock().unwrap();
            loop {
                if state.signals[id] == WorkerState::Sigterm {
                    state.signals[id] = WorkerState::Terminating;
                    return;
                }
                if let Some(job) = state.queue.pop_front() {
                    state.signals[id] = WorkerState::Working;
                    state.busy += 1;
                    break job;
                }
                state.signals[id] = WorkerState::Idle;
                state = shared.work_ready.wait(state).unwrap();
            }
        };
        // a panicking job must not take the worker down with it
        let outcome = catch_unwind(AssertUnwindSafe(job));
        let mut state = shared.state.lock().unwrap();
        state.busy -= 1;
        // a SIGTERM posted mid-job must not be clobbered
        if state.signals[id] == WorkerState::Working {
            state.signals[id] = WorkerState::Idle;
        }
        if let Err(payload) = outcome {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "job panicked".to_string());
            error!("worker {}: job failed: {}", id, message);
            if state.errors.len() < MAX_CAPTURED_ERRORS {
                state.errors.push_back(message);
            }
        }
        if state.queue.is_empty() && state.busy == 0 {
            shared.all_idle.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn runs_all_jobs_before_synchronize_returns() {
        let mut pool = WorkerPool::new(4);
        pool.start_all();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            pool.add_job(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        pool.synchronize();
        assert_eq!(counter.load(Ordering::SeqCst), 100);
        assert_eq!(pool.queue_len(), 0);
        pool.kill_all(false);
        assert_eq!(pool.running(), 0);
    }

    #[test]
    fn start_cannot_shrink_a_running_pool() {
        let mut pool = WorkerPool::new(3);
        assert!(pool.start_all());
        assert_eq!(pool.running(), 3);
        assert!(!pool.start(1));
        assert!(pool.start(5));
        assert_eq!(pool.running(), 5);
        pool.kill_all(true);
    }

    #[test]
    fn panicking_job_is_captured_and_workers_survive() {
        let mut pool = WorkerPool::new(1);
        pool.start_all();
        pool.add_job(Box::new(|| panic!("boom")));
        let ran_after = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&ran_after);
        pool.add_job(Box::new(move || {
            flag.fetch_add(1, Ordering::SeqCst);
        }));
        pool.synchronize();
        assert_eq!(ran_after.load(Ordering::SeqCst), 1);
        let errors = pool.take_errors();
        assert_eq!(errors, vec!["boom".to_string()]);
        assert!(pool.take_errors().is_empty());
    }

    #[test]
    fn kill_all_leaves_queued_jobs_in_place() {
        let mut pool = WorkerPool::new(1);
        pool.start_all();
        // a slow job keeps the worker busy while more jobs queue up
        pool.add_job(Box::new(|| thread::sleep(Duration::from_millis(50))));
        for _ in 0..3 {
            pool.add_job(Box::new(|| thread::sleep(Duration::from_millis(50))));
        }
        pool.kill_all(false);
        assert!(pool.queue_len() > 0);
        pool.empty_queue();
        assert_eq!(pool.queue_len(), 0);
    }

    #[test]
    fn pool_can_restart_after_kill_all() {
        let mut pool = WorkerPool::new(2);
        pool.start_all();
        pool.kill_all(true);
        assert_eq!(pool.running(), 0);
        assert!(pool.start_all());
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        pool.add_job(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        pool.synchronize();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        pool.kill_all(false);
    }
}
