use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HistoryUsage {
    pub added: u64,
    pub undos: u64,
    pub redos: u64,
    pub jumps: u64,
    pub clears: u64,
    /// Records dropped because a new record was added while the cursor sat mid-list.
    pub discarded: u64,
    /// Records dropped to stay within capacity.
    pub evicted: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ManipulationUsage {
    pub sessions_armed: u64,
    pub sessions_committed: u64,
    pub sessions_cancelled: u64,
    /// Commits where nothing moved, so no record was produced.
    pub empty_commits: u64,
    pub records_emitted: u64,
    pub pointer_moves: u64,
    pub missed_presses: u64,
}
