//! Fixed-size worker pool: a mutex+condvar task queue executed FIFO by
//! `std::thread` workers, with panic capture so a faulting task cannot take
//! down a worker or corrupt shared state.

use crate::error::PoolError;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

type Task = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    queue: Mutex<VecDeque<Task>>,
    condvar: Condvar,
    stopping: Mutex<bool>,
}

/// A fixed-size pool of OS threads executing submitted tasks FIFO.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

/// Handle to a task's eventual result, returned by [`WorkerPool::assign_task`].
pub struct TaskHandle<T> {
    rx: Receiver<Result<T, PoolError>>,
}

impl<T> TaskHandle<T> {
    /// Blocks until the task completes. Returns `Err(PoolError::Panicked)` if
    /// the task unwound.
    pub fn join(self) -> Result<T, PoolError> {
        self.rx
            .recv()
            .unwrap_or(Err(PoolError::Panicked("worker dropped the task".into())))
    }
}

impl WorkerPool {
    pub fn new(worker_count: usize) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            stopping: Mutex::new(false),
        });
        let workers = Self::spawn_workers(&shared, worker_count);
        Self {
            shared,
            workers: Mutex::new(workers),
            worker_count,
        }
    }

    fn spawn_workers(shared: &Arc<Shared>, count: usize) -> Vec<JoinHandle<()>> {
        (0..count)
            .map(|_| {
                let shared = Arc::clone(shared);
                thread::spawn(move || Self::worker_loop(&shared))
            })
            .collect()
    }

    fn worker_loop(shared: &Arc<Shared>) {
        loop {
            let task = {
                let mut queue = shared.queue.lock().unwrap();
                loop {
                    if let Some(task) = queue.pop_front() {
                        break Some(task);
                    }
                    if *shared.stopping.lock().unwrap() {
                        break None;
                    }
                    queue = shared.condvar.wait(queue).unwrap();
                }
            };
            match task {
                Some(task) => task(),
                None => return,
            }
        }
    }

    /// Enqueues `f`, returning a [`TaskHandle`] for its eventual result.
    ///
    /// Returns `Err(PoolError::ShuttingDown)` synchronously, without queuing,
    /// if the pool is currently stopped.
    pub fn assign_task<F, T>(&self, f: F) -> Result<TaskHandle<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if *self.shared.stopping.lock().unwrap() {
            return Err(PoolError::ShuttingDown);
        }
        let (tx, rx) = mpsc::channel();
        let wrapped: Task = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(f));
            let sent = match result {
                Ok(value) => tx.send(Ok(value)),
                Err(payload) => {
                    let message = describe_panic(&payload);
                    eprintln!("worker pool task panicked: {message}");
                    tx.send(Err(PoolError::Panicked(message)))
                }
            };
            let _ = sent;
        });
        self.shared.queue.lock().unwrap().push_back(wrapped);
        self.shared.condvar.notify_one();
        Ok(TaskHandle { rx })
    }

    /// Signals stop, wakes all workers, and joins them. Already-queued tasks
    /// run to completion before workers exit.
    pub fn shutdown(&self) {
        *self.shared.stopping.lock().unwrap() = true;
        self.shared.condvar.notify_all();
        let mut workers = self.workers.lock().unwrap();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
    }

    /// Shuts down then re-spawns `N` fresh workers with an empty queue.
    pub fn restart(&self) {
        self.shutdown();
        *self.shared.stopping.lock().unwrap() = false;
        let mut workers = self.workers.lock().unwrap();
        *workers = Self::spawn_workers(&self.shared, self.worker_count);
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn describe_panic(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn tasks_run_and_complete() {
        let pool = WorkerPool::new(3);
        let counter = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            handles.push(
                pool.assign_task(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap(),
            );
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        pool.shutdown();
    }

    #[test]
    fn panicking_task_is_captured_not_fatal() {
        let pool = WorkerPool::new(2);
        let handle = pool.assign_task(|| -> i32 { panic!("boom") }).unwrap();
        assert!(matches!(handle.join(), Err(PoolError::Panicked(_))));

        let ok_handle = pool.assign_task(|| 7).unwrap();
        assert_eq!(ok_handle.join().unwrap(), 7);
        pool.shutdown();
    }

    #[test]
    fn shutdown_then_restart_accepts_new_tasks() {
        let pool = WorkerPool::new(2);
        let before = pool.assign_task(|| 1).unwrap();
        assert_eq!(before.join().unwrap(), 1);
        pool.shutdown();
        assert!(pool.assign_task(|| 0).is_err());

        pool.restart();
        let after = pool.assign_task(|| 2).unwrap();
        assert_eq!(after.join().unwrap(), 2);
        pool.shutdown();
    }
}
