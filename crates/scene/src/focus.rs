use foundation::BalloonId;

/// The user's current focus: at most one selected balloon and, independently,
/// at most one balloon whose descent is being animated.
///
/// Both are weak references by id. They own nothing and must be dropped when
/// the balloon they point at leaves the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Focus {
    selected: Option<BalloonId>,
    animating: Option<BalloonId>,
}

impl Focus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&BalloonId> {
        self.selected.as_ref()
    }

    pub fn animating(&self) -> Option<&BalloonId> {
        self.animating.as_ref()
    }

    pub fn is_selected(&self, id: &BalloonId) -> bool {
        self.selected.as_ref() == Some(id)
    }

    pub fn is_animating(&self, id: &BalloonId) -> bool {
        self.animating.as_ref() == Some(id)
    }

    /// Replaces the selection.
    ///
    /// Returns `true` if the focus changed.
    pub fn select(&mut self, id: Option<BalloonId>) -> bool {
        if self.selected == id {
            return false;
        }
        self.selected = id;
        true
    }

    /// Marks `id` as the animating balloon, returning the one it displaced.
    pub fn start_animating(&mut self, id: BalloonId) -> Option<BalloonId> {
        self.animating.replace(id)
    }

    /// Clears the animating pointer, but only if it still points at `id`.
    ///
    /// A cancelled run finishing late must not clear the pointer of the run
    /// that replaced it.
    pub fn finish_animating(&mut self, id: &BalloonId) -> bool {
        if self.is_animating(id) {
            self.animating = None;
            return true;
        }
        false
    }

    /// Drops every pointer for which `exists` returns `false`.
    pub fn retain(&mut self, mut exists: impl FnMut(&BalloonId) -> bool) {
        if self.selected.as_ref().is_some_and(|id| !exists(id)) {
            self.selected = None;
        }
        if self.animating.as_ref().is_some_and(|id| !exists(id)) {
            self.animating = None;
        }
    }
}
