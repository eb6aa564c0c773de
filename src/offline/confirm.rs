use crate::offline::operation::CacheKind;
use async_trait::async_trait;

/// What the user is asked before a save or remove runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub layer_name: String,
    pub kind: CacheKind,
    /// Tiles a save would fetch; `None` for removals
    pub tile_count: Option<usize>,
}

impl ConfirmPrompt {
    pub fn message(&self) -> String {
        match (self.kind, self.tile_count) {
            (CacheKind::Save, Some(count)) => format!(
                "Save the visible area of {} for offline use ({} tiles)?",
                self.layer_name, count
            ),
            (CacheKind::Save, None) => {
                format!("Save the visible area of {} for offline use?", self.layer_name)
            }
            (CacheKind::Remove, _) => format!("Delete the saved tiles of {}?", self.layer_name),
        }
    }
}

/// The user confirmation gate.
///
/// Only an explicit `true` lets the operation proceed.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// Answers every prompt with a fixed decision
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl AutoConfirm {
    pub fn accept() -> Self {
        Self(true)
    }

    pub fn decline() -> Self {
        Self(false)
    }
}

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        log::debug!("{} -> {}", prompt.message(), self.0);
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_messages() {
        let save = ConfirmPrompt {
            layer_name: "地理院地図".into(),
            kind: CacheKind::Save,
            tile_count: Some(120),
        };
        assert_eq!(
            save.message(),
            "Save the visible area of 地理院地図 for offline use (120 tiles)?"
        );

        let remove = ConfirmPrompt {
            kind: CacheKind::Remove,
            tile_count: None,
            ..save
        };
        assert_eq!(remove.message(), "Delete the saved tiles of 地理院地図?");
    }
}
