use crate::error::EntityFailure;
use catsync_types::Key;
use serde::{Deserialize, Serialize};

/// What happened to one category during a run.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// No target category had the key; it was created.
    Created { key: Key },
    /// The target category was updated with `actions` update actions.
    Updated { key: Key, actions: usize },
    /// The target category already matched; nothing was written.
    Unchanged { key: Key },
    /// The category could not be synced.
    Failed { subject: String, error: EntityFailure },
    /// The category was skipped or synced with a non-fatal issue.
    Warned { subject: String, reason: String },
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Created { .. } => OutcomeKind::Created,
            Outcome::Updated { .. } => OutcomeKind::Updated,
            Outcome::Unchanged { .. } => OutcomeKind::Unchanged,
            Outcome::Failed { .. } => OutcomeKind::Failed,
            Outcome::Warned { .. } => OutcomeKind::Warned,
        }
    }

    /// The key or label of the category the outcome belongs to.
    pub fn subject(&self) -> String {
        match self {
            Outcome::Created { key } | Outcome::Updated { key, .. } | Outcome::Unchanged { key } => {
                key.to_string()
            }
            Outcome::Failed { subject, .. } | Outcome::Warned { subject, .. } => subject.clone(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.kind() == OutcomeKind::Failed
    }

    pub fn is_warned(&self) -> bool {
        self.kind() == OutcomeKind::Warned
    }

    /// The failure cause, for failed outcomes.
    pub fn failure(&self) -> Option<&EntityFailure> {
        match self {
            Outcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// The kind of an [`Outcome`], without its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Created,
    Updated,
    Unchanged,
    Failed,
    Warned,
}
