//! Debounced saving with a maximum wait.
//!
//! An [`Autosave`] owns a background task holding the latest unsaved value. Every
//! [`Autosave::edit`] replaces that value and rearms an inactivity timer; the value is saved when
//! the editor has been idle for `idle`, or when `max_wait` has passed since the first unsaved
//! edit, whichever comes first. [`Autosave::flush`] saves immediately. Dropping the handle saves
//! whatever is still pending.
use std::{future::Future, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{sleep_until, Instant},
};

use crate::{
    config::VaultConfig,
    error::VaultError,
    repository::NoteRepository,
    service::VaultService,
};

enum Command<T> {
    Edit(T),
    Flush(oneshot::Sender<Result<(), VaultError>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveTiming {
    pub idle: Duration,
    pub max_wait: Duration,
}

impl AutosaveTiming {
    pub fn from_config(config: &VaultConfig) -> AutosaveTiming {
        AutosaveTiming {
            idle: config.autosave_idle(),
            max_wait: config.autosave_max_wait(),
        }
    }
}

pub struct Autosave<T> {
    tx: mpsc::UnboundedSender<Command<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Autosave<T> {
    /// Must be called inside a tokio runtime.
    pub fn spawn<S, Fut>(timing: AutosaveTiming, save: S) -> Autosave<T>
    where
        S: Fn(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), VaultError>> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(timing, save, rx));
        Autosave { tx, task }
    }

    /// Replace the pending value and rearm the inactivity timer.
    pub fn edit(&self, value: T) -> Result<(), VaultError> {
        self.tx
            .send(Command::Edit(value))
            .map_err(|_| VaultError::Custom("autosave task has stopped".to_string()))
    }

    /// Save the pending value now, if any.
    pub async fn flush(&self) -> Result<(), VaultError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply_tx))
            .map_err(|_| VaultError::Custom("autosave task has stopped".to_string()))?;
        reply_rx
            .await
            .map_err(|_| VaultError::Custom("autosave task dropped a flush".to_string()))?
    }

    /// Save anything pending and wait for the background task to finish.
    pub async fn close(self) -> Result<(), VaultError> {
        let Autosave { tx, task } = self;
        drop(tx);
        task.await
            .map_err(|e| VaultError::Custom(format!("autosave task failed: {e}")))
    }
}

async fn run<T, S, Fut>(
    timing: AutosaveTiming,
    save: S,
    mut rx: mpsc::UnboundedReceiver<Command<T>>,
) where
    S: Fn(T) -> Fut,
    Fut: Future<Output = Result<(), VaultError>>,
{
    let mut pending: Option<T> = None;
    let mut idle_deadline: Option<Instant> = None;
    let mut hard_deadline: Option<Instant> = None;

    loop {
        let deadline = match (idle_deadline, hard_deadline) {
            (Some(idle), Some(hard)) => Some(idle.min(hard)),
            (idle, hard) => idle.or(hard),
        };
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Edit(value)) => {
                    let now = Instant::now();
                    pending = Some(value);
                    idle_deadline = Some(now + timing.idle);
                    hard_deadline.get_or_insert(now + timing.max_wait);
                }
                Some(Command::Flush(reply)) => {
                    idle_deadline = None;
                    hard_deadline = None;
                    let result = match pending.take() {
                        Some(value) => save(value).await,
                        None => Ok(()),
                    };
                    reply.send(result).ok();
                }
                None => break,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                idle_deadline = None;
                hard_deadline = None;
                if let Some(value) = pending.take() {
                    if let Err(e) = save(value).await {
                        tracing::warn!("Autosave failed: {}", e);
                    }
                }
            }
        }
    }

    if let Some(value) = pending.take() {
        tracing::debug!("Autosave: saving pending edit on close");
        if let Err(e) = save(value).await {
            tracing::warn!("Autosave on close failed: {}", e);
        }
    }
}

/// Autosave for one note through a [`VaultService`], carrying the revision forward across saves
/// so each write is checked against the previous one.
pub fn note_autosave<R>(
    service: Arc<VaultService<R>>,
    path: String,
    revision: String,
) -> Autosave<String>
where
    R: NoteRepository + Send + 'static,
{
    let timing = AutosaveTiming::from_config(service.config());
    let path = Arc::new(path);
    let revision = Arc::new(Mutex::new(revision));
    Autosave::spawn(timing, move |content: String| {
        let service = service.clone();
        let path = path.clone();
        let revision = revision.clone();
        async move {
            let current = revision.lock().clone();
            let receipt = service.update_note(&path, &content, &current).await?;
            tracing::debug!("Autosaved {} at {}", receipt.path, receipt.revision);
            *revision.lock() = receipt.revision;
            Ok(())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{content_revision, MemoryRepository};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, AutosaveTiming) {
        (
            Arc::new(Mutex::new(Vec::new())),
            AutosaveTiming {
                idle: Duration::from_secs(15),
                max_wait: Duration::from_secs(300),
            },
        )
    }

    fn spawn(saved: &Arc<Mutex<Vec<String>>>, timing: AutosaveTiming) -> Autosave<String> {
        let saved = saved.clone();
        Autosave::spawn(timing, move |value: String| {
            let saved = saved.clone();
            async move {
                saved.lock().push(value);
                Ok(())
            }
        })
    }

    async fn sleep_secs(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn saves_latest_value_after_idle() {
        let (saved, timing) = recorder();
        let autosave = spawn(&saved, timing);
        autosave.edit("a".to_string()).unwrap();
        sleep_secs(5).await;
        autosave.edit("ab".to_string()).unwrap();
        sleep_secs(5).await;
        autosave.edit("abc".to_string()).unwrap();
        sleep_secs(14).await;
        assert!(saved.lock().is_empty());
        sleep_secs(2).await;
        assert_eq!(*saved.lock(), vec!["abc".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn max_wait_bounds_continuous_editing() {
        let (saved, timing) = recorder();
        let autosave = spawn(&saved, timing);
        for i in 0..34 {
            autosave.edit(i.to_string()).unwrap();
            sleep_secs(9).await;
        }
        assert_eq!(*saved.lock(), vec!["33".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_saves_immediately() {
        let (saved, timing) = recorder();
        let autosave = spawn(&saved, timing);
        autosave.flush().await.unwrap();
        assert!(saved.lock().is_empty());

        autosave.edit("draft".to_string()).unwrap();
        autosave.flush().await.unwrap();
        assert_eq!(*saved.lock(), vec!["draft".to_string()]);

        sleep_secs(400).await;
        assert_eq!(saved.lock().len(), 1, "flushed content is not saved twice");
    }

    #[tokio::test(start_paused = true)]
    async fn closing_saves_pending_edit() {
        let (saved, timing) = recorder();
        let autosave = spawn(&saved, timing);
        autosave.edit("unsaved".to_string()).unwrap();
        autosave.close().await.unwrap();
        assert_eq!(*saved.lock(), vec!["unsaved".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_saves_pending_edit() {
        let (saved, timing) = recorder();
        let autosave = spawn(&saved, timing);
        autosave.edit("unsaved".to_string()).unwrap();
        drop(autosave);
        sleep_secs(1).await;
        assert_eq!(*saved.lock(), vec!["unsaved".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn note_autosave_tracks_revisions() {
        let repo = MemoryRepository::from_notes([("a.md", "v0")]);
        let service = Arc::new(VaultService::new(repo.clone(), VaultConfig::default()).unwrap());
        let autosave = note_autosave(service.clone(), "a.md".to_string(), content_revision("v0"));

        autosave.edit("v1".to_string()).unwrap();
        autosave.flush().await.unwrap();
        autosave.edit("v2".to_string()).unwrap();
        sleep_secs(16).await;

        let note = service.read_note("a.md").await.unwrap();
        assert_eq!(note.text, "v2");
        assert_eq!(note.revision, content_revision("v2"));
    }
}
