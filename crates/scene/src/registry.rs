use crate::balloon::Balloon;
use crate::focus::Focus;
use foundation::{BalloonId, GeoError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("balloon {id}: {source}")]
    Geo {
        id: BalloonId,
        #[source]
        source: GeoError,
    },
    #[error("duplicate balloon id {0}")]
    DuplicateId(BalloonId),
    #[error("unknown balloon {0}")]
    UnknownBalloon(BalloonId),
}

/// State transitions accepted by [`Registry::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace the whole fleet. Focus pointers to vanished ids are cleared.
    SetBalloons(Vec<Balloon>),
    Select(Option<BalloonId>),
    StartAnimating(BalloonId),
    FinishAnimating(BalloonId),
    Remove(BalloonId),
}

/// In-memory fleet plus the user's focus.
///
/// Owned by the composition root and passed by reference; every mutation goes
/// through [`Registry::apply`]. Iteration order is insertion order.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    balloons: Vec<Balloon>,
    focus: Focus,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balloons(balloons: Vec<Balloon>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.apply(Action::SetBalloons(balloons))?;
        Ok(registry)
    }

    pub fn balloons(&self) -> &[Balloon] {
        &self.balloons
    }

    pub fn len(&self) -> usize {
        self.balloons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balloons.is_empty()
    }

    pub fn get(&self, id: &BalloonId) -> Option<&Balloon> {
        self.balloons.iter().find(|b| &b.id == id)
    }

    pub fn contains(&self, id: &BalloonId) -> bool {
        self.get(id).is_some()
    }

    pub fn focus(&self) -> &Focus {
        &self.focus
    }

    pub fn selected(&self) -> Option<&Balloon> {
        self.focus.selected().and_then(|id| self.get(id))
    }

    pub fn animating(&self) -> Option<&Balloon> {
        self.focus.animating().and_then(|id| self.get(id))
    }

    /// Applies one action. On error the registry is left unchanged.
    pub fn apply(&mut self, action: Action) -> Result<(), RegistryError> {
        match action {
            Action::SetBalloons(balloons) => {
                let balloons = validate_fleet(balloons)?;
                debug!(count = balloons.len(), "registry: fleet replaced");
                self.balloons = balloons;
                let Self { balloons, focus } = self;
                focus.retain(|id| balloons.iter().any(|b| &b.id == id));
            }
            Action::Select(id) => {
                if let Some(id) = &id {
                    self.require(id)?;
                }
                self.focus.select(id);
            }
            Action::StartAnimating(id) => {
                self.require(&id)?;
                if let Some(prev) = self.focus.start_animating(id) {
                    debug!(%prev, "registry: animation focus replaced");
                }
            }
            Action::FinishAnimating(id) => {
                self.focus.finish_animating(&id);
            }
            Action::Remove(id) => {
                let before = self.balloons.len();
                self.balloons.retain(|b| b.id != id);
                if self.balloons.len() == before {
                    return Err(RegistryError::UnknownBalloon(id));
                }
                self.focus.retain(|other| other != &id);
            }
        }
        Ok(())
    }

    fn require(&self, id: &BalloonId) -> Result<(), RegistryError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(RegistryError::UnknownBalloon(id.clone()))
        }
    }
}

fn validate_fleet(balloons: Vec<Balloon>) -> Result<Vec<Balloon>, RegistryError> {
    let mut out: Vec<Balloon> = Vec::with_capacity(balloons.len());
    for balloon in balloons {
        if out.iter().any(|b| b.id == balloon.id) {
            return Err(RegistryError::DuplicateId(balloon.id));
        }
        let id = balloon.id.clone();
        let balloon = balloon
            .normalized()
            .map_err(|source| RegistryError::Geo { id, source })?;
        out.push(balloon);
    }
    Ok(out)
}
