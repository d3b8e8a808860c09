use compute::{DescentConfig, DescentPath};
use foundation::{BalloonId, GeoError};
use scene::Balloon;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::event_bus::{AnimationEnd, AnimationEvent, AnimationOutcome, AnimationSink};

#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("cannot animate balloon: {0}")]
    InvalidBalloon(#[from] GeoError),
    #[error("animation task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Plays one balloon's descent into `sink`.
///
/// The cancellation flag is checked before every frame and raced against every
/// inter-frame wait. Once it is raised (or its sender is dropped) no further
/// frames are emitted; in particular the landing frame is never delivered by a
/// cancelled run. Exactly one [`AnimationEvent::Ended`] closes every run.
pub async fn run_descent<S>(
    balloon: &Balloon,
    config: DescentConfig,
    sink: &mut S,
    cancel: &mut watch::Receiver<bool>,
) -> AnimationOutcome
where
    S: AnimationSink + ?Sized,
{
    let path = DescentPath::new(balloon, config);
    let outcome = play(&path, &balloon.id, sink, cancel).await;
    sink.emit(AnimationEvent::Ended(AnimationEnd {
        id: balloon.id.clone(),
        outcome,
    }));
    outcome
}

async fn play<S>(
    path: &DescentPath,
    id: &BalloonId,
    sink: &mut S,
    cancel: &mut watch::Receiver<bool>,
) -> AnimationOutcome
where
    S: AnimationSink + ?Sized,
{
    let config = path.config();
    let last = config.steps.max(1);
    let interval = config.frame_interval();
    let mut delivered = 0u32;

    for index in 0..=last {
        if is_cancelled(cancel) {
            return AnimationOutcome::Cancelled {
                frames_delivered: delivered,
            };
        }
        sink.emit(AnimationEvent::Frame {
            id: id.clone(),
            frame: path.frame(index),
        });
        delivered += 1;

        if index == last {
            break;
        }
        tokio::select! {
            biased;
            _ = cancelled(cancel) => {
                return AnimationOutcome::Cancelled { frames_delivered: delivered };
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }

    AnimationOutcome::Completed
}

fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow() || cancel.has_changed().is_err()
}

/// Resolves once the flag is raised or its sender is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|c| *c).await;
}

struct ActiveRun {
    id: BalloonId,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<AnimationOutcome>,
}

/// Owns the single in-flight descent animation.
///
/// Starting a run first cancels and awaits the previous one, so two runs
/// never emit frames concurrently.
pub struct Sequencer {
    config: DescentConfig,
    active: Option<ActiveRun>,
}

impl Sequencer {
    pub fn new(config: DescentConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    pub fn config(&self) -> DescentConfig {
        self.config
    }

    /// Id of the balloon whose run has been started and not yet awaited.
    pub fn active_id(&self) -> Option<&BalloonId> {
        self.active.as_ref().map(|run| &run.id)
    }

    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|run| !run.handle.is_finished())
    }

    /// Starts animating `balloon`, cancelling any run still in flight.
    ///
    /// Returns the end of the displaced run, if there was one.
    pub async fn start<S>(
        &mut self,
        balloon: Balloon,
        sink: S,
    ) -> Result<Option<AnimationEnd>, SequencerError>
    where
        S: AnimationSink + 'static,
    {
        balloon.validate()?;
        let displaced = self.cancel().await?;

        let (cancel, mut cancel_rx) = watch::channel(false);
        let id = balloon.id.clone();
        let config = self.config;
        info!(balloon = %id, steps = config.steps, "descent animation started");

        let handle = tokio::spawn(async move {
            let mut sink = sink;
            run_descent(&balloon, config, &mut sink, &mut cancel_rx).await
        });
        self.active = Some(ActiveRun { id, cancel, handle });
        Ok(displaced)
    }

    /// Raises the cancellation flag of the in-flight run and waits for it to
    /// wind down. A run that already finished reports its real outcome.
    pub async fn cancel(&mut self) -> Result<Option<AnimationEnd>, SequencerError> {
        let Some(run) = self.active.take() else {
            return Ok(None);
        };
        // The receiver is gone once the run has finished; nothing to signal then.
        let _ = run.cancel.send(true);
        let outcome = run.handle.await?;
        debug!(balloon = %run.id, ?outcome, "descent animation cancelled");
        Ok(Some(AnimationEnd {
            id: run.id,
            outcome,
        }))
    }

    /// Waits for the in-flight run to finish on its own.
    pub async fn wait(&mut self) -> Result<Option<AnimationEnd>, SequencerError> {
        let Some(run) = self.active.take() else {
            return Ok(None);
        };
        let outcome = run.handle.await?;
        info!(balloon = %run.id, ?outcome, "descent animation finished");
        // Keep the sender alive until here so the run is never cancelled by the drop.
        drop(run.cancel);
        Ok(Some(AnimationEnd {
            id: run.id,
            outcome,
        }))
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(DescentConfig::default())
    }
}
