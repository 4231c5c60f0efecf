//! Plan and credit state — the only entity that outlives a single submission.
//!
//! Invariant: `credits` is only ever decremented by exactly 1, only for the
//! free plan, and only after both artifacts of a submission are retrieved.

use serde::{Deserialize, Serialize};

/// Subscription tier. `Free` is metered by credits; `Premium` is unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
        }
    }

    /// Parses the persisted plan string. Unknown values read as `Free` —
    /// plan and credits are trusted client-side values with safe defaults.
    pub fn parse(raw: &str) -> Plan {
        match raw {
            "premium" => Plan::Premium,
            _ => Plan::Free,
        }
    }
}

/// Persisted usage state: plan plus remaining credit balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageState {
    pub plan: Plan,
    pub credits: u32,
}

impl Default for UsageState {
    /// First-run state when nothing has been persisted yet.
    fn default() -> Self {
        UsageState {
            plan: Plan::Free,
            credits: 1,
        }
    }
}

impl UsageState {
    /// The credit gate: premium is always allowed; free requires a positive
    /// balance.
    pub fn allows_generation(&self) -> bool {
        match self.plan {
            Plan::Premium => true,
            Plan::Free => self.credits > 0,
        }
    }

    /// The state to persist after both artifacts of a submission succeeded:
    /// one credit consumed on the free plan, untouched on premium. Saturating
    /// — the balance never goes negative.
    pub fn after_successful_generation(&self) -> UsageState {
        match self.plan {
            Plan::Premium => *self,
            Plan::Free => UsageState {
                plan: self.plan,
                credits: self.credits.saturating_sub(1),
            },
        }
    }

    /// What the credit-count display shows: "∞" for premium, the numeric
    /// balance otherwise.
    pub fn credit_display(&self) -> String {
        match self.plan {
            Plan::Premium => "∞".to_string(),
            Plan::Free => self.credits.to_string(),
        }
    }
}
