use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Lifecycle of the embedding of the loaded image.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingStatus {
    /// No image.
    #[default]
    NotLoaded,
    /// Image painted, embedding requested.
    Loading,
    /// Embedding cached; clicks are accepted.
    Loaded,
    /// Embedding request failed; dropping the image again retries.
    Failed,
}

impl EmbeddingStatus {
    pub fn accepts_clicks(self) -> bool {
        self == EmbeddingStatus::Loaded
    }
}

impl Display for EmbeddingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EmbeddingStatus::NotLoaded => "Not Loaded",
            EmbeddingStatus::Loading => "Loading",
            EmbeddingStatus::Loaded => "Loaded",
            EmbeddingStatus::Failed => "Failed",
        })
    }
}
