use serde::{Deserialize, Serialize};

/// Opaque, stable balloon identifier (e.g. `balloon-3`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalloonId(String);

impl BalloonId {
    pub fn new(id: impl Into<String>) -> Self {
        BalloonId(id.into())
    }

    /// Id used for the `index`-th synthetic balloon.
    pub fn seeded(index: usize) -> Self {
        BalloonId(format!("balloon-{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BalloonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BalloonId {
    fn from(value: &str) -> Self {
        BalloonId::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::BalloonId;

    #[test]
    fn seeded_ids_are_prefixed() {
        assert_eq!(BalloonId::seeded(3).as_str(), "balloon-3");
        assert_eq!(BalloonId::from("balloon-3"), BalloonId::seeded(3));
    }
}
