use foundation::BalloonId;
use scene::{Action, Registry, RegistryError};
use thiserror::Error;

use crate::event_bus::{AnimationEnd, AnimationSink};
use crate::sequencer::{Sequencer, SequencerError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
    #[error("the animating balloon follows the sequencer; use pop or cancel")]
    AnimationManaged,
}

/// Live tracker state: the registry and the one animation sequencer.
///
/// Keeps the registry's animating pointer in step with the sequencer: it is
/// set when a run starts and cleared when that same run ends.
pub struct TrackerSession {
    registry: Registry,
    sequencer: Sequencer,
}

impl TrackerSession {
    pub fn new(registry: Registry, sequencer: Sequencer) -> Self {
        Self {
            registry,
            sequencer,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Applies a registry action.
    ///
    /// Animation actions are refused; the pointer only moves through
    /// [`TrackerSession::pop`], [`TrackerSession::wait`] and
    /// [`TrackerSession::cancel`]. A balloon that leaves the registry while it
    /// is animating has its run cancelled first. A rejected action changes
    /// nothing and cancels nothing.
    pub async fn apply(&mut self, action: Action) -> Result<(), SessionError> {
        if matches!(
            action,
            Action::StartAnimating(_) | Action::FinishAnimating(_)
        ) {
            return Err(SessionError::AnimationManaged);
        }

        let mut next = self.registry.clone();
        next.apply(action)?;
        let orphaned = self
            .sequencer
            .active_id()
            .is_some_and(|id| !next.contains(id));
        if orphaned {
            self.cancel().await?;
        }
        self.registry = next;
        Ok(())
    }

    pub fn select(&mut self, id: Option<BalloonId>) -> Result<(), SessionError> {
        self.registry.apply(Action::Select(id))?;
        Ok(())
    }

    /// Pops balloon `id`: cancels whatever is animating, then starts its descent.
    pub async fn pop<S>(&mut self, id: &BalloonId, sink: S) -> Result<(), SessionError>
    where
        S: AnimationSink + 'static,
    {
        let balloon = self
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownBalloon(id.clone()))?;

        if let Some(end) = self.sequencer.cancel().await? {
            self.registry.apply(Action::FinishAnimating(end.id))?;
        }
        self.sequencer.start(balloon, sink).await?;
        self.registry.apply(Action::StartAnimating(id.clone()))?;
        Ok(())
    }

    /// Waits for the current descent to land.
    pub async fn wait(&mut self) -> Result<Option<AnimationEnd>, SessionError> {
        let end = self.sequencer.wait().await?;
        self.finish(end)
    }

    pub async fn cancel(&mut self) -> Result<Option<AnimationEnd>, SessionError> {
        let end = self.sequencer.cancel().await?;
        self.finish(end)
    }

    fn finish(&mut self, end: Option<AnimationEnd>) -> Result<Option<AnimationEnd>, SessionError> {
        if let Some(end) = &end {
            self.registry.apply(Action::FinishAnimating(end.id.clone()))?;
        }
        Ok(end)
    }
}
