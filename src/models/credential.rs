// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API credential bookkeeping for the nutrition inference provider.
//!
//! The pool state is plain data: the rotation rules live here so they can be
//! tested without any I/O, while `services::key_pool` owns locking and
//! persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quota budget given to every freshly configured credential.
pub const DEFAULT_QUOTA: u32 = 100;

/// One API token plus its locally tracked (advisory) quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub token: String,
    pub remaining_quota: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<DateTime<Utc>>,
}

impl Credential {
    /// Create a credential with the default quota budget.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            remaining_quota: DEFAULT_QUOTA,
            reset_time: None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_quota == 0
    }

    /// Token with everything but the last four characters hidden.
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.token.chars().collect();
        if chars.len() <= 4 {
            return "****".to_string();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{}", tail)
    }
}

/// Ordered credentials plus the index of the one currently in use.
///
/// Persisted as `{ "credentials": [...], "activeIndex": n }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolState {
    pub credentials: Vec<Credential>,
    pub active_index: usize,
}

impl PoolState {
    /// Fresh state: every token gets the default quota, the first one is active.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            credentials: tokens.into_iter().map(Credential::new).collect(),
            active_index: 0,
        }
    }

    /// A state loaded from storage is only usable if it is non-empty and
    /// its index points at a credential.
    pub fn is_valid(&self) -> bool {
        !self.credentials.is_empty() && self.active_index < self.credentials.len()
    }

    pub fn active(&self) -> Option<&Credential> {
        self.credentials.get(self.active_index)
    }

    /// Indices visited when rotating away from the active credential:
    /// `(i+1) mod n, (i+2) mod n, ...`, exactly `n` of them.
    pub fn scan_order(&self) -> impl Iterator<Item = usize> + '_ {
        let n = self.credentials.len();
        (1..=n).map(move |step| (self.active_index + step) % n)
    }

    /// Zero the active credential's quota and move to the next credential
    /// that still has quota.
    ///
    /// Returns the new active index, or `None` when every credential is
    /// exhausted. In that case `active_index` is left where it was.
    pub fn exhaust_active_and_rotate(&mut self) -> Option<usize> {
        if let Some(active) = self.credentials.get_mut(self.active_index) {
            active.remaining_quota = 0;
        }

        let next = self
            .scan_order()
            .find(|&idx| self.credentials[idx].remaining_quota > 0)?;
        self.active_index = next;
        Some(next)
    }

    pub fn exhausted_count(&self) -> usize {
        self.credentials.iter().filter(|c| c.is_exhausted()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(quotas: &[u32], active_index: usize) -> PoolState {
        PoolState {
            credentials: quotas
                .iter()
                .enumerate()
                .map(|(i, &q)| Credential {
                    token: format!("sk-{}", i),
                    remaining_quota: q,
                    reset_time: None,
                })
                .collect(),
            active_index,
        }
    }

    #[test]
    fn test_from_tokens_uses_default_quota() {
        let state = PoolState::from_tokens(["a", "b", "c"]);
        assert_eq!(state.active_index, 0);
        assert_eq!(state.credentials.len(), 3);
        assert!(state
            .credentials
            .iter()
            .all(|c| c.remaining_quota == DEFAULT_QUOTA));
    }

    #[test]
    fn test_scan_order_is_circular() {
        let state = pool(&[1, 1, 1, 1, 1], 3);
        let order: Vec<usize> = state.scan_order().collect();
        assert_eq!(order, vec![4, 0, 1, 2, 3]);
    }

    #[test]
    fn test_rotation_skips_exhausted() {
        let mut state = pool(&[100, 0, 0, 50], 0);
        assert_eq!(state.exhaust_active_and_rotate(), Some(3));
        assert_eq!(state.active_index, 3);
        assert_eq!(state.credentials[0].remaining_quota, 0);
    }

    #[test]
    fn test_rotation_wraps_around() {
        let mut state = pool(&[10, 0, 100], 2);
        assert_eq!(state.exhaust_active_and_rotate(), Some(0));
    }

    #[test]
    fn test_all_exhausted_leaves_index_unchanged() {
        let mut state = pool(&[0, 100, 0], 1);
        assert_eq!(state.exhaust_active_and_rotate(), None);
        assert_eq!(state.active_index, 1);
        assert_eq!(state.exhausted_count(), 3);
    }

    #[test]
    fn test_single_credential_pool() {
        let mut state = pool(&[100], 0);
        assert_eq!(state.exhaust_active_and_rotate(), None);
        assert_eq!(state.active_index, 0);
    }

    #[test]
    fn test_validity() {
        assert!(pool(&[1, 2], 1).is_valid());
        assert!(!pool(&[1, 2], 2).is_valid());
        assert!(!pool(&[], 0).is_valid());
    }

    #[test]
    fn test_persisted_shape() {
        let state = pool(&[7], 0);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["activeIndex"], 0);
        assert_eq!(json["credentials"][0]["token"], "sk-0");
        assert_eq!(json["credentials"][0]["remainingQuota"], 7);
        assert!(json["credentials"][0].get("resetTime").is_none());
    }

    #[test]
    fn test_masked_token() {
        assert_eq!(Credential::new("sk-proj-abcdef1234").masked_token(), "****1234");
        assert_eq!(Credential::new("abc").masked_token(), "****");
    }
}
