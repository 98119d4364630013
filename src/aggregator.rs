//! Folds a fragment stream into display snapshots.
//!
//! Every fragment produces an [`UpdateState::InProgress`] snapshot of the full
//! text so far. Exhausting the stream produces exactly one
//! [`UpdateState::Complete`] snapshot, after which the aggregator is frozen.
//! Gathered references are joined only into the `Complete` snapshot.

use futures::{Stream, StreamExt};

use crate::core::{Fragment, LlmError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    InProgress,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub text: String,
    pub state: UpdateState,
    /// References joined by a blank line. Always empty while in progress.
    pub references: String,
}

#[derive(Debug, Default)]
pub struct Aggregator {
    text: String,
    references: Vec<String>,
    completed: bool,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment and returns the running text. Returns `None` once
    /// the aggregator has completed; the fragment is discarded.
    pub fn push(&mut self, fragment: Fragment) -> Option<Snapshot> {
        if self.completed {
            tracing::warn!("Fragment received after completion, ignoring");
            return None;
        }
        self.text.push_str(&fragment.text);
        self.references.extend(fragment.references);
        Some(Snapshot {
            text: self.text.clone(),
            state: UpdateState::InProgress,
            references: String::new(),
        })
    }

    /// Freezes the text. Calling this again returns the same snapshot and
    /// changes nothing.
    pub fn finish(&mut self) -> Snapshot {
        self.completed = true;
        Snapshot {
            text: self.text.clone(),
            state: UpdateState::Complete,
            references: self.references.join("\n\n"),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Drives `stream` to the end, calling `on_update` with each snapshot.
///
/// The final call is always the `Complete` snapshot, which is also returned.
/// A transport error from the stream stops consumption and is returned without
/// a `Complete` snapshot.
pub async fn aggregate<S, F>(stream: S, mut on_update: F) -> Result<Snapshot, LlmError>
where
    S: Stream<Item = Result<Fragment, LlmError>>,
    F: FnMut(&Snapshot),
{
    let mut aggregator = Aggregator::new();
    let mut stream = std::pin::pin!(stream);

    while let Some(item) = stream.next().await {
        if let Some(snapshot) = aggregator.push(item?) {
            on_update(&snapshot);
        }
    }

    let snapshot = aggregator.finish();
    tracing::debug!(chars = snapshot.text.chars().count(), "Stream aggregated");
    on_update(&snapshot);
    Ok(snapshot)
}
