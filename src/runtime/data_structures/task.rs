use crate::runtime::{ data_structures::value::Value,
                      error::{ self,
                               ScriptError } };
use lazy_static::lazy_static;
use std::{ sync::{ Arc,
                   Condvar,
                   Mutex,
                   MutexGuard,
                   atomic::{ AtomicU64,
                             Ordering } },
           thread::{ self,
                     JoinHandle } };



/// Stack size given to the worker threads running child interpreters.  Deeply recursive scripts
/// need more than the platform default.
pub const TASK_STACK_SIZE: usize = 16 * 1024 * 1024;



lazy_static!
{
    static ref TASK_COUNTER: AtomicU64 = AtomicU64::new(1);
}



/// What a finished child evaluation produced, an optional captured value or the error it raised.
pub type TaskOutcome = error::Result<Option<Value>>;



/// A child evaluation running on its own worker thread.
pub struct Task
{
    id: u64,
    handle: Mutex<Option<JoinHandle<TaskOutcome>>>,
    outcome: Mutex<Option<TaskOutcome>>,
    joined: Condvar
}


/// Tasks are shared between the stack and anywhere else the script stores the handle.
pub type TaskHandle = Arc<Task>;


/// A poisoned lock only means another thread panicked while joining, the data is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T>
{
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}


impl Task
{
    /// Start running the body on a new worker thread.
    pub fn start<F>(body: F) -> error::Result<TaskHandle>
        where
            F: FnOnce() -> TaskOutcome + Send + 'static
    {
        let id = TASK_COUNTER.fetch_add(1, Ordering::SeqCst);

        let handle = thread::Builder::new()
            .name(format!("stackweave-task-{}", id))
            .stack_size(TASK_STACK_SIZE)
            .spawn(body)?;

        Ok(Arc::new(Task
            {
                id,
                handle: Mutex::new(Some(handle)),
                outcome: Mutex::new(None),
                joined: Condvar::new()
            }))
    }

    /// Unique id of the task, used for identity and display.
    pub fn id(&self) -> u64
    {
        self.id
    }

    /// Check without blocking if the task has completed.  Neither lock is held while a join is
    /// waiting on the worker.
    pub fn is_finished(&self) -> bool
    {
        if lock(&self.outcome).is_some()
        {
            return true;
        }

        match lock(&self.handle).as_ref()
        {
            Some(handle) => handle.is_finished(),
            None => false
        }
    }

    /// Block until the task completes and return its outcome.  The outcome is kept so joining
    /// the same task again reports the same result.  When another thread is already joining, wait
    /// for it to record the outcome.
    pub fn join(&self) -> TaskOutcome
    {
        if let Some(finished) = lock(&self.outcome).as_ref()
        {
            return finished.clone();
        }

        let Some(handle) = lock(&self.handle).take()
        else
        {
            return self.wait_for_outcome();
        };

        let result = match handle.join()
            {
                Ok(result) => result,
                Err(_) => Err(ScriptError::new(None,
                                               format!("Task {} panicked.", self.id),
                                               None))
            };

        *lock(&self.outcome) = Some(result.clone());
        self.joined.notify_all();

        result
    }

    fn wait_for_outcome(&self) -> TaskOutcome
    {
        let mut outcome = lock(&self.outcome);

        loop
        {
            if let Some(finished) = outcome.as_ref()
            {
                return finished.clone();
            }

            outcome = self.joined
                          .wait(outcome)
                          .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }
}


#[cfg(test)]
mod tests
{
    use super::*;
    use std::{ sync::mpsc::channel,
               time::Duration };

    #[test]
    fn join_returns_the_captured_value()
    {
        let task = Task::start(|| Ok(Some(Value::Int(7)))).unwrap();

        assert_eq!(task.join().unwrap(), Some(Value::Int(7)));
        assert!(task.is_finished());

        // A second join hands back the same result.
        assert_eq!(task.join().unwrap(), Some(Value::Int(7)));
    }

    #[test]
    fn panics_become_host_errors()
    {
        let task = Task::start(|| panic!("worker failed")).unwrap();
        let error = task.join().unwrap_err();

        assert_eq!(error.catch_code(), 1);
    }

    #[test]
    fn tasks_get_distinct_ids()
    {
        let a = Task::start(|| Ok(None)).unwrap();
        let b = Task::start(|| Ok(None)).unwrap();

        assert_ne!(a.id(), b.id());

        let _ = a.join();
        let _ = b.join();
    }

    #[test]
    fn polling_does_not_wait_for_another_join()
    {
        let ( release, gate ) = channel::<()>();
        let task = Task::start(move ||
            {
                let _ = gate.recv();
                Ok(Some(Value::Int(3)))
            }).unwrap();

        let joiner =
            {
                let task = task.clone();
                thread::spawn(move || task.join())
            };

        thread::sleep(Duration::from_millis(50));

        // The worker is still waiting on the gate while the other thread is blocked joining it.
        assert!(!task.is_finished());

        release.send(()).unwrap();

        assert_eq!(joiner.join().unwrap().unwrap(), Some(Value::Int(3)));
        assert_eq!(task.join().unwrap(), Some(Value::Int(3)));
        assert!(task.is_finished());
    }

    #[test]
    fn concurrent_joins_see_the_same_outcome()
    {
        let ( release, gate ) = channel::<()>();
        let task = Task::start(move ||
            {
                let _ = gate.recv();
                Ok(Some(Value::Int(9)))
            }).unwrap();

        let joiners: Vec<_> = (0..3).map(|_|
            {
                let task = task.clone();
                thread::spawn(move || task.join())
            })
            .collect();

        release.send(()).unwrap();

        for joiner in joiners
        {
            assert_eq!(joiner.join().unwrap().unwrap(), Some(Value::Int(9)));
        }
    }
}
