// Pre-ranking scope: which lots are worth ranking at all.
use crate::model::RawLot;
use chrono::{DateTime, Duration, Utc};

pub struct ScopeFilter {
    now: DateTime<Utc>,
    horizon: Duration,
    states: Vec<String>,
}

impl ScopeFilter {
    /// `states` empty means every state is in scope.
    pub fn new(now: DateTime<Utc>, since_days: i64, states: &[String]) -> Self {
        Self {
            now,
            horizon: Duration::days(since_days),
            states: states.iter().map(|s| s.trim().to_uppercase()).collect(),
        }
    }

    /// Upcoming within the horizon and located in a target state.
    pub fn in_scope(&self, lot: &RawLot) -> bool {
        let upcoming = lot.sale_date_utc >= self.now && lot.sale_date_utc <= self.now + self.horizon;
        let state = lot.location_state.trim().to_uppercase();
        upcoming && (self.states.is_empty() || self.states.contains(&state))
    }

    pub fn apply(&self, lots: Vec<RawLot>) -> Vec<RawLot> {
        lots.into_iter().filter(|l| self.in_scope(l)).collect()
    }
}
