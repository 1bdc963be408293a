// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::Error;
use std::cell::RefCell;
use std::sync::mpsc::Receiver;
use std::sync::Mutex;

/// A unit of work scheduled by the parallel join.
pub(crate) type Task<'env> = Box<dyn FnOnce() + Send + 'env>;

/// How the parallel join driver executes its tasks.
///
/// All variants satisfy the same contract: every task submitted during a
/// join has completed when the driver returns, and the first task failure
/// is surfaced as [`Error::TaskFailed`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskRuntime {
    /// Runs every task at submission, on the calling thread.
    ///
    /// No parallelism; useful for deterministic debugging. Task panics
    /// propagate directly to the caller.
    Inline,

    /// Spawns one thread per task.
    ///
    /// Unbounded parallelism; fine for small recursion depths.
    SpawnPerTask,

    /// A bounded pool of workers draining a task queue.
    ///
    /// A worker count of zero is treated as one.
    Pool(usize),
}

impl TaskRuntime {
    /// Runs `produce`, handing it a submission function; returns once every
    /// submitted task has completed.
    ///
    /// Tasks may borrow anything that outlives the call ('env). Submission
    /// is eager: spawned and pooled tasks start executing while `produce`
    /// is still submitting.
    pub(crate) fn execute<'env, F>(&self, produce: F) -> crate::Result<()>
    where
        F: FnOnce(&dyn Fn(Task<'env>)),
    {
        match *self {
            Self::Inline => {
                produce(&|task: Task<'env>| task());
                Ok(())
            }

            Self::SpawnPerTask => {
                let mut failed = false;

                std::thread::scope(|scope| {
                    let handles = RefCell::new(Vec::new());

                    let submit = |task: Task<'env>| {
                        handles.borrow_mut().push(scope.spawn(task));
                    };
                    produce(&submit);

                    for handle in handles.into_inner() {
                        if handle.join().is_err() {
                            failed = true;
                        }
                    }
                });

                if failed {
                    Err(Error::TaskFailed)
                } else {
                    Ok(())
                }
            }

            Self::Pool(workers) => {
                let (tx, rx) = std::sync::mpsc::channel::<Task<'env>>();
                let rx = Mutex::new(rx);
                let mut failed = false;

                std::thread::scope(|scope| {
                    let handles: Vec<_> = (0..workers.max(1))
                        .map(|_| scope.spawn(|| pool_worker(&rx)))
                        .collect();

                    let submit = move |task: Task<'env>| {
                        // A send failure means every worker died; the task
                        // is dropped and the failure surfaces below.
                        let _ = tx.send(task);
                    };
                    produce(&submit);

                    // Closing the channel lets the workers drain and exit.
                    drop(submit);

                    for handle in handles {
                        if handle.join().is_err() {
                            failed = true;
                        }
                    }
                });

                if failed {
                    Err(Error::TaskFailed)
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn pool_worker(rx: &Mutex<Receiver<Task<'_>>>) {
    loop {
        let task = match rx.lock() {
            Ok(guard) => guard.recv(),
            // A sibling worker panicked while receiving.
            Err(_) => return,
        };

        match task {
            Ok(task) => task(),
            // Channel closed, queue drained.
            Err(_) => return,
        }
    }
}
