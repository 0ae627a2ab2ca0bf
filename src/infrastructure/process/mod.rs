pub mod model_download;

pub use model_download::{DownloadError, ModelDownloader, PIPER_VOICES_URL};

use std::future::Future;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, RwLock};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// How to launch a child server and tell when it is up
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    /// Short name used in logs
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    /// Any HTTP response from this URL counts as "listening"
    pub health_url: String,
    /// How long the child may take to start answering before it is unresponsive
    pub warmup: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessState {
    NotStarted,
    /// Prerequisites (e.g. a model download) still running; no child yet
    Provisioning { retry_after_secs: u64 },
    /// Could not be launched at all
    Failed(String),
    Starting { retry_after_secs: u64 },
    Ready,
    Unresponsive,
    Exited(String),
}

/// A child server owned by this process.
///
/// The child is killed when the supervisor is dropped; call `shutdown` for an
/// orderly stop.
pub struct SupervisedProcess {
    spec: ProcessSpec,
    child: Mutex<Option<Child>>,
    started_at: Instant,
    http: reqwest::Client,
}

impl SupervisedProcess {
    pub fn spawn(spec: ProcessSpec) -> std::io::Result<Self> {
        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(stdout) = child.stdout.take() {
            forward_output(spec.name.clone(), stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            forward_output(spec.name.clone(), stderr);
        }

        tracing::info!(
            name = %spec.name,
            program = %spec.program,
            pid = ?child.id(),
            "Child process started"
        );

        let http = reqwest::Client::builder()
            .timeout(HEALTH_CHECK_TIMEOUT)
            .build()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        Ok(Self {
            spec,
            child: Mutex::new(Some(child)),
            started_at: Instant::now(),
            http,
        })
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Child alive and its HTTP endpoint answering
    pub async fn health_check(&self) -> ProcessState {
        {
            let mut guard = self.child.lock().await;
            let Some(child) = guard.as_mut() else {
                return ProcessState::NotStarted;
            };
            match child.try_wait() {
                Ok(Some(status)) => return ProcessState::Exited(status.to_string()),
                Ok(None) => {}
                Err(e) => return ProcessState::Exited(e.to_string()),
            }
        }

        if self.http.get(&self.spec.health_url).send().await.is_ok() {
            return ProcessState::Ready;
        }

        let elapsed = self.started_at.elapsed();
        if elapsed < self.spec.warmup {
            let remaining = self.spec.warmup - elapsed;
            ProcessState::Starting {
                retry_after_secs: remaining.as_secs().max(1),
            }
        } else {
            ProcessState::Unresponsive
        }
    }

    pub async fn shutdown(&self) {
        let Some(mut child) = self.child.lock().await.take() else {
            return;
        };

        if let Err(e) = child.start_kill() {
            tracing::warn!(name = %self.spec.name, error = %e, "Failed to signal child process");
        }
        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!(name = %self.spec.name, status = %status, "Child process stopped")
            }
            Ok(Err(e)) => {
                tracing::warn!(name = %self.spec.name, error = %e, "Failed to reap child process")
            }
            Err(_) => tracing::warn!(name = %self.spec.name, "Child process did not exit in time"),
        }
    }
}

enum Slot {
    Provisioning { since: Instant, estimate: Duration },
    Running(Arc<SupervisedProcess>),
    Failed(String),
    Stopped,
}

/// A child server that may still be waiting on its prerequisites.
///
/// Callers see `Provisioning` until the preparation future resolves, then
/// the state of the launched child.
pub struct ManagedProcess {
    name: String,
    slot: RwLock<Slot>,
}

impl ManagedProcess {
    pub fn running(process: SupervisedProcess) -> Arc<Self> {
        Arc::new(Self {
            name: process.name().to_string(),
            slot: RwLock::new(Slot::Running(Arc::new(process))),
        })
    }

    /// Run `prepare` on a background task and spawn the spec it yields.
    ///
    /// `estimate` is how long preparation is expected to take; it drives the
    /// retry hint reported while provisioning.
    pub fn spawn_after<F>(name: &str, estimate: Duration, prepare: F) -> Arc<Self>
    where
        F: Future<Output = Result<ProcessSpec, String>> + Send + 'static,
    {
        let managed = Arc::new(Self {
            name: name.to_string(),
            slot: RwLock::new(Slot::Provisioning {
                since: Instant::now(),
                estimate,
            }),
        });

        let handle = managed.clone();
        tokio::spawn(async move {
            let prepared = prepare.await;

            let mut slot = handle.slot.write().await;
            if !matches!(*slot, Slot::Provisioning { .. }) {
                tracing::info!(name = %handle.name, "Shut down during provisioning, not starting");
                return;
            }
            *slot = match prepared.and_then(|spec| SupervisedProcess::spawn(spec).map_err(|e| e.to_string())) {
                Ok(process) => Slot::Running(Arc::new(process)),
                Err(reason) => {
                    tracing::error!(name = %handle.name, reason = %reason, "Process could not be provisioned");
                    Slot::Failed(reason)
                }
            };
        });

        managed
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn health_check(&self) -> ProcessState {
        let process = match &*self.slot.read().await {
            Slot::Provisioning { since, estimate } => {
                return ProcessState::Provisioning {
                    retry_after_secs: estimate.saturating_sub(since.elapsed()).as_secs().max(1),
                }
            }
            Slot::Running(process) => process.clone(),
            Slot::Failed(reason) => return ProcessState::Failed(reason.clone()),
            Slot::Stopped => return ProcessState::NotStarted,
        };
        process.health_check().await
    }

    pub async fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.slot.write().await, Slot::Stopped);
        if let Slot::Running(process) = previous {
            process.shutdown().await;
        }
    }
}

fn forward_output<R>(name: String, stream: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!(process = %name, "{}", line);
        }
    });
}
