//! Winner records and the rules applied when a draw result is recorded.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::clock;

/// Reward label for animated-tier winners.
pub const GIF_LABEL: &str = "Gif";
/// Reward label for illustration-tier winners.
pub const ILLUST_LABEL: &str = "Illustration";

/// Outcome tier of a single draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Ordinary win ("0" on the wire).
    Hit,
    /// Jackpot win ("1" on the wire).
    Jackpot,
}

impl Outcome {
    /// Parse the two accepted flag values; anything else is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "0" => Some(Outcome::Hit),
            "1" => Some(Outcome::Jackpot),
            _ => None,
        }
    }

    /// Numeric form used by audit event files.
    pub fn as_flag(self) -> u8 {
        match self {
            Outcome::Hit => 0,
            Outcome::Jackpot => 1,
        }
    }
}

/// Manual workflow status a record moves through while its reward is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum RecordStatus {
    /// Reward work not started.
    #[default]
    None,
    /// Reward work in progress.
    Progress,
    /// Reward delivered.
    Done,
}

impl From<String> for RecordStatus {
    // Legacy state files carry empty strings here; treat anything unknown as None.
    fn from(value: String) -> Self {
        match value.as_str() {
            "progress" => RecordStatus::Progress,
            "done" => RecordStatus::Done,
            _ => RecordStatus::None,
        }
    }
}

impl RecordStatus {
    /// Strict parser for API input; unknown values are rejected instead of coerced.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "none" => Some(RecordStatus::None),
            "progress" => Some(RecordStatus::Progress),
            "done" => Some(RecordStatus::Done),
            _ => None,
        }
    }
}

/// Eligibility flags derived from the win counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RewardFlags {
    /// Illustration reward unlocked (at least one ordinary win).
    #[serde(default)]
    pub illust: bool,
    /// Animated reward unlocked (three ordinary wins or one jackpot).
    #[serde(default)]
    pub gif: bool,
}

/// One winner's tallied results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    /// Unique winner name, exact-match key.
    pub name: String,
    /// Ordinary win count.
    #[serde(default)]
    pub hit: u32,
    /// Jackpot win count.
    #[serde(default)]
    pub jackpot: u32,
    /// Derived eligibility flags.
    #[serde(default)]
    pub flags: RewardFlags,
    /// Manually settable completion flag.
    #[serde(default)]
    pub done: bool,
    /// First-win sequence number; 0 until the first win is recorded.
    #[serde(default)]
    pub order: u32,
    /// Manual workflow status.
    #[serde(default)]
    pub status: RecordStatus,
    /// Reward label derived from the flags.
    #[serde(default)]
    pub present: String,
}

impl UserRecord {
    /// Fresh record for a name that has not won anything yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hit: 0,
            jackpot: 0,
            flags: RewardFlags::default(),
            done: false,
            order: 0,
            status: RecordStatus::None,
            present: String::new(),
        }
    }

    /// Recompute the derived flags and reward label from the counters.
    ///
    /// Gif takes priority over Illustration when both apply.
    pub fn recompute_reward(&mut self) {
        self.flags.illust = self.hit >= 1;
        self.flags.gif = self.hit >= 3 || self.jackpot >= 1;
        self.present = if self.flags.gif {
            GIF_LABEL.to_string()
        } else if self.flags.illust {
            ILLUST_LABEL.to_string()
        } else {
            String::new()
        };
    }

    /// Reward label, falling back to the flags when `present` was never
    /// populated (records written before the label existed).
    pub fn effective_label(&self) -> &str {
        if !self.present.trim().is_empty() {
            &self.present
        } else if self.flags.gif {
            GIF_LABEL
        } else if self.flags.illust {
            ILLUST_LABEL
        } else {
            ""
        }
    }
}

/// The full tally: ordered winner records plus a last-updated timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TallyState {
    /// Winner records in insertion order.
    #[serde(default)]
    pub users: Vec<UserRecord>,
    /// RFC 3339 UTC timestamp of the last mutation.
    #[serde(default)]
    pub updated_at: String,
}

impl TallyState {
    /// Empty state stamped with the current time.
    pub fn empty_now() -> Self {
        Self {
            users: Vec::new(),
            updated_at: clock::now_utc_rfc3339(),
        }
    }

    /// Refresh the last-updated timestamp.
    pub fn touch(&mut self) {
        self.updated_at = clock::now_utc_rfc3339();
    }

    /// Apply one win to the named record, creating it on first sight.
    ///
    /// Increments exactly one counter, assigns the next order number on the
    /// record's first win, recomputes the derived reward, and stamps
    /// `updated_at`. The name must already be validated by the caller.
    pub fn record_win(&mut self, winner: &str, outcome: Outcome) {
        let idx = match self.users.iter().position(|u| u.name == winner) {
            Some(idx) => idx,
            None => {
                self.users.push(UserRecord::new(winner));
                self.users.len() - 1
            }
        };

        match outcome {
            Outcome::Hit => self.users[idx].hit += 1,
            Outcome::Jackpot => self.users[idx].jackpot += 1,
        }

        if self.users[idx].order == 0 {
            let max = self.users.iter().map(|u| u.order).max().unwrap_or(0);
            self.users[idx].order = max + 1;
        }

        self.users[idx].recompute_reward();
        self.touch();
    }

    /// Set the completion flag on a record; the status field follows suit.
    ///
    /// Returns `false` when no record matches the name.
    pub fn set_done(&mut self, name: &str, done: bool) -> bool {
        let Some(user) = self.users.iter_mut().find(|u| u.name == name) else {
            return false;
        };
        user.done = done;
        user.status = if done {
            RecordStatus::Done
        } else {
            RecordStatus::None
        };
        self.touch();
        true
    }

    /// Set the workflow status on a record; the done flag follows suit.
    ///
    /// Returns `false` when no record matches the name.
    pub fn set_status(&mut self, name: &str, status: RecordStatus) -> bool {
        let Some(user) = self.users.iter_mut().find(|u| u.name == name) else {
            return false;
        };
        user.status = status;
        user.done = status == RecordStatus::Done;
        self.touch();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(users: Vec<UserRecord>) -> TallyState {
        TallyState {
            users,
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_first_win_creates_record_and_assigns_order() {
        let mut state = state_with(vec![]);
        state.record_win("alice", Outcome::Hit);

        assert_eq!(state.users.len(), 1);
        let alice = &state.users[0];
        assert_eq!(alice.hit, 1);
        assert_eq!(alice.jackpot, 0);
        assert_eq!(alice.order, 1);
        assert!(!state.updated_at.is_empty());
    }

    #[test]
    fn test_win_increments_exactly_one_counter() {
        let mut state = state_with(vec![]);
        state.record_win("alice", Outcome::Hit);
        state.record_win("alice", Outcome::Jackpot);

        let alice = &state.users[0];
        assert_eq!(alice.hit, 1);
        assert_eq!(alice.jackpot, 1);
    }

    #[test]
    fn test_order_is_monotonic_and_stable() {
        let mut state = state_with(vec![]);
        state.record_win("alice", Outcome::Hit);
        state.record_win("bob", Outcome::Hit);
        state.record_win("alice", Outcome::Hit);
        state.record_win("carol", Outcome::Jackpot);

        let order_of = |name: &str| {
            state
                .users
                .iter()
                .find(|u| u.name == name)
                .map(|u| u.order)
                .unwrap()
        };
        assert_eq!(order_of("alice"), 1);
        assert_eq!(order_of("bob"), 2);
        assert_eq!(order_of("carol"), 3);
    }

    #[test]
    fn test_order_survives_gaps_from_existing_records() {
        let mut seeded = UserRecord::new("old");
        seeded.hit = 2;
        seeded.order = 7;
        let mut state = state_with(vec![seeded]);

        state.record_win("new", Outcome::Hit);
        assert_eq!(state.users[1].order, 8);
    }

    #[test]
    fn test_reward_derivation_table() {
        let cases: &[(u32, u32, bool, bool, &str)] = &[
            (0, 0, false, false, ""),
            (1, 0, true, false, ILLUST_LABEL),
            (2, 0, true, false, ILLUST_LABEL),
            (3, 0, true, true, GIF_LABEL),
            (0, 1, false, true, GIF_LABEL),
            (5, 2, true, true, GIF_LABEL),
        ];
        for &(hit, jackpot, illust, gif, label) in cases {
            let mut user = UserRecord::new("x");
            user.hit = hit;
            user.jackpot = jackpot;
            user.recompute_reward();
            assert_eq!(user.flags.illust, illust, "hit={hit} jackpot={jackpot}");
            assert_eq!(user.flags.gif, gif, "hit={hit} jackpot={jackpot}");
            assert_eq!(user.present, label, "hit={hit} jackpot={jackpot}");
        }
    }

    #[test]
    fn test_jackpot_alone_unlocks_top_tier() {
        let mut state = state_with(vec![]);
        state.record_win("alice", Outcome::Jackpot);

        let alice = &state.users[0];
        assert!(alice.flags.illust == false);
        assert!(alice.flags.gif);
        assert_eq!(alice.present, GIF_LABEL);
    }

    #[test]
    fn test_outcome_parse_rejects_other_values() {
        assert_eq!(Outcome::parse("0"), Some(Outcome::Hit));
        assert_eq!(Outcome::parse("1"), Some(Outcome::Jackpot));
        assert_eq!(Outcome::parse("2"), None);
        assert_eq!(Outcome::parse(""), None);
        assert_eq!(Outcome::parse("jackpot"), None);
    }

    #[test]
    fn test_status_parse_and_legacy_deserialization() {
        assert_eq!(RecordStatus::parse("done"), Some(RecordStatus::Done));
        assert_eq!(RecordStatus::parse(" Progress "), Some(RecordStatus::Progress));
        assert_eq!(RecordStatus::parse("finished"), None);

        // Legacy files carry empty status strings.
        let user: UserRecord = serde_json::from_str(r#"{"name":"a","status":""}"#).unwrap();
        assert_eq!(user.status, RecordStatus::None);
    }

    #[test]
    fn test_set_done_and_status_follow_each_other() {
        let mut state = state_with(vec![UserRecord::new("alice")]);
        assert!(state.set_done("alice", true));
        assert_eq!(state.users[0].status, RecordStatus::Done);

        assert!(state.set_status("alice", RecordStatus::Progress));
        assert!(!state.users[0].done);

        assert!(!state.set_done("nobody", true));
        assert!(!state.set_status("nobody", RecordStatus::Done));
    }

    #[test]
    fn test_effective_label_falls_back_to_flags() {
        let mut user = UserRecord::new("a");
        user.flags.gif = true;
        assert_eq!(user.effective_label(), GIF_LABEL);
        user.flags.gif = false;
        user.flags.illust = true;
        assert_eq!(user.effective_label(), ILLUST_LABEL);
        user.present = "Gif".into();
        assert_eq!(user.effective_label(), "Gif");
    }
}
