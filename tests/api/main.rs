mod wait_api;

// -----------------------------------------------------------------------------

mod helpers {
    use async_trait::async_trait;
    use pve_tasks::prelude::{Error, JobStatusFetcher, Result};
    use pve_tasks::proxmox::types::{JobStatus, UniqueProcessId};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub const FAKE_UPID: &str = "UPID:pve:00001A2B:0003C4D5:6512ABCD:qmclone:100:root@pam:";

    /// One scripted answer of [`ScriptedFetcher`].
    ///
    #[derive(Debug, Clone)]
    pub enum Step {
        Running,
        Stopped(&'static str),
        TransportError,
    }

    /// Fetcher replaying a fixed sequence of answers. The last answer repeats
    /// once the sequence is exhausted.
    ///
    pub struct ScriptedFetcher {
        steps: Mutex<VecDeque<Step>>,
        last: Mutex<Option<Step>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        pub fn new(steps: &[Step]) -> Self {
            Self {
                steps: Mutex::new(steps.iter().cloned().collect()),
                last: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobStatusFetcher for ScriptedFetcher {
        async fn fetch(&self, _job: &UniqueProcessId) -> Result<JobStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let step = {
                let mut last = self.last.lock().unwrap();
                if let Some(step) = self.steps.lock().unwrap().pop_front() {
                    *last = Some(step);
                }
                last.clone().expect("scripted fetcher needs at least one step")
            };

            match step {
                Step::Running => Ok(JobStatus::running()),
                Step::Stopped(exit_code) => Ok(JobStatus::stopped(exit_code)),
                Step::TransportError => Err(Error::InputOutput(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ))),
            }
        }
    }
}
