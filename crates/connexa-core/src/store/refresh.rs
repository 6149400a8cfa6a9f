// ── Refresh bookkeeping ──
//
// Outcome of a single resource load and the fan-in report of a full
// dashboard refresh. A full refresh never fails as a whole; the report
// says which panels moved.

use serde::Serialize;

use crate::navigation::Resource;

/// How one resource load settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// New data was applied to the panel.
    Updated,
    /// The load failed; the panel kept its previous data.
    Failed(String),
    /// The session changed while the load was in flight; the result
    /// was dropped without touching the panel.
    Discarded,
}

impl LoadOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated)
    }
}

/// Fan-in result of a full dashboard refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub outcomes: Vec<(Resource, LoadOutcome)>,
}

impl RefreshReport {
    pub(crate) fn push(&mut self, resource: Resource, outcome: LoadOutcome) {
        self.outcomes.push((resource, outcome));
    }

    pub fn succeeded(&self) -> impl Iterator<Item = Resource> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_updated())
            .map(|(r, _)| *r)
    }

    pub fn failed(&self) -> impl Iterator<Item = (Resource, &str)> + '_ {
        self.outcomes.iter().filter_map(|(r, o)| match o {
            LoadOutcome::Failed(msg) => Some((*r, msg.as_str())),
            _ => None,
        })
    }

    pub fn outcome(&self, resource: Resource) -> Option<&LoadOutcome> {
        self.outcomes
            .iter()
            .find(|(r, _)| *r == resource)
            .map(|(_, o)| o)
    }

    /// Every load applied new data.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|(_, o)| o.is_updated())
    }
}
