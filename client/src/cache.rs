//! Client-side read cache with explicit optimistic-write state.

use shared_types::ContentKey;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
enum Slot {
    /// Value as last seen on (or written to) the server.
    Confirmed {
        value: serde_json::Value,
        stored_at: Instant,
    },
    /// Locally staged write that has not been flushed yet. `base` is the
    /// confirmed value to restore if the flush fails.
    Pending {
        value: serde_json::Value,
        base: Option<(serde_json::Value, Instant)>,
    },
}

/// Per-key cache state. Pending values are always served (the session sees
/// its own edits); confirmed values only while younger than the TTL.
#[derive(Debug, Default)]
pub struct ReadCache {
    slots: HashMap<ContentKey, Slot>,
}

impl ReadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&self, key: ContentKey, ttl: Duration, now: Instant) -> Option<serde_json::Value> {
        match self.slots.get(&key)? {
            Slot::Pending { value, .. } => Some(value.clone()),
            Slot::Confirmed { value, stored_at } => {
                (now.saturating_duration_since(*stored_at) < ttl).then(|| value.clone())
            }
        }
    }

    /// Record a value read from the server. A pending write stays in front;
    /// the fetched value only becomes its rollback base.
    pub fn record_fetch(&mut self, key: ContentKey, value: serde_json::Value, now: Instant) {
        match self.slots.get_mut(&key) {
            Some(Slot::Pending { base, .. }) => *base = Some((value, now)),
            _ => {
                self.slots.insert(
                    key,
                    Slot::Confirmed {
                        value,
                        stored_at: now,
                    },
                );
            }
        }
    }

    /// Stage an optimistic write.
    pub fn stage(&mut self, key: ContentKey, value: serde_json::Value) {
        let base = match self.slots.remove(&key) {
            Some(Slot::Confirmed { value, stored_at }) => Some((value, stored_at)),
            Some(Slot::Pending { base, .. }) => base,
            None => None,
        };
        self.slots.insert(key, Slot::Pending { value, base });
    }

    /// A flush wrote `written` successfully.
    pub fn confirm(&mut self, key: ContentKey, written: &serde_json::Value, now: Instant) {
        let superseded = matches!(
            self.slots.get(&key),
            Some(Slot::Pending { value, .. }) if value != written
        );

        if superseded {
            // A newer edit was staged while this one was in flight
            if let Some(Slot::Pending { base, .. }) = self.slots.get_mut(&key) {
                *base = Some((written.clone(), now));
            }
        } else {
            self.slots.insert(
                key,
                Slot::Confirmed {
                    value: written.clone(),
                    stored_at: now,
                },
            );
        }
    }

    /// A flush failed to write `attempted`; undo the optimistic value.
    pub fn roll_back(&mut self, key: ContentKey, attempted: &serde_json::Value) {
        let Some(Slot::Pending { value, .. }) = self.slots.get(&key) else {
            return;
        };
        if value != attempted {
            return;
        }

        if let Some(Slot::Pending {
            base: Some((value, stored_at)),
            ..
        }) = self.slots.remove(&key)
        {
            self.slots.insert(key, Slot::Confirmed { value, stored_at });
        }
    }

    /// Drop confirmed entries. Pending writes survive until their flush settles.
    pub fn clear(&mut self, key: Option<ContentKey>) {
        match key {
            Some(key) => {
                if matches!(self.slots.get(&key), Some(Slot::Confirmed { .. })) {
                    self.slots.remove(&key);
                }
            }
            None => self
                .slots
                .retain(|_, slot| matches!(slot, Slot::Pending { .. })),
        }
    }

    pub fn is_pending(&self, key: ContentKey) -> bool {
        matches!(self.slots.get(&key), Some(Slot::Pending { .. }))
    }

    pub fn contains(&self, key: ContentKey) -> bool {
        self.slots.contains_key(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_confirmed_value_expires() {
        let start = Instant::now();
        let mut cache = ReadCache::new();
        cache.record_fetch(ContentKey::NewsData, json!([]), start);

        assert_eq!(cache.fresh(ContentKey::NewsData, TTL, start), Some(json!([])));
        assert_eq!(
            cache.fresh(ContentKey::NewsData, TTL, start + TTL - Duration::from_millis(1)),
            Some(json!([]))
        );
        assert!(cache.fresh(ContentKey::NewsData, TTL, start + TTL).is_none());
    }

    #[test]
    fn test_pending_value_never_expires() {
        let start = Instant::now();
        let mut cache = ReadCache::new();
        cache.stage(ContentKey::HeroSubtitle, json!("draft"));

        assert_eq!(
            cache.fresh(ContentKey::HeroSubtitle, TTL, start + TTL * 10),
            Some(json!("draft"))
        );
        assert!(cache.is_pending(ContentKey::HeroSubtitle));
    }

    #[test]
    fn test_confirm_promotes_pending() {
        let now = Instant::now();
        let mut cache = ReadCache::new();
        cache.stage(ContentKey::HeroSubtitle, json!("new"));
        cache.confirm(ContentKey::HeroSubtitle, &json!("new"), now);

        assert!(!cache.is_pending(ContentKey::HeroSubtitle));
        assert_eq!(cache.fresh(ContentKey::HeroSubtitle, TTL, now), Some(json!("new")));
    }

    #[test]
    fn test_roll_back_restores_confirmed_value() {
        let now = Instant::now();
        let mut cache = ReadCache::new();
        cache.record_fetch(ContentKey::HeroSubtitle, json!("old"), now);
        cache.stage(ContentKey::HeroSubtitle, json!("new"));
        cache.roll_back(ContentKey::HeroSubtitle, &json!("new"));

        assert_eq!(cache.fresh(ContentKey::HeroSubtitle, TTL, now), Some(json!("old")));
    }

    #[test]
    fn test_roll_back_without_base_forgets_key() {
        let mut cache = ReadCache::new();
        cache.stage(ContentKey::HeroSubtitle, json!("new"));
        cache.roll_back(ContentKey::HeroSubtitle, &json!("new"));

        assert!(!cache.contains(ContentKey::HeroSubtitle));
    }

    #[test]
    fn test_newer_stage_survives_older_flush() {
        let now = Instant::now();
        let mut cache = ReadCache::new();
        cache.stage(ContentKey::HeroSubtitle, json!("first"));
        cache.stage(ContentKey::HeroSubtitle, json!("second"));

        cache.roll_back(ContentKey::HeroSubtitle, &json!("first"));
        assert!(cache.is_pending(ContentKey::HeroSubtitle));

        cache.confirm(ContentKey::HeroSubtitle, &json!("first"), now);
        assert_eq!(
            cache.fresh(ContentKey::HeroSubtitle, TTL, now),
            Some(json!("second"))
        );
        assert!(cache.is_pending(ContentKey::HeroSubtitle));
    }

    #[test]
    fn test_fetch_does_not_clobber_pending() {
        let now = Instant::now();
        let mut cache = ReadCache::new();
        cache.stage(ContentKey::StatsData, json!([1]));
        cache.record_fetch(ContentKey::StatsData, json!([0]), now);

        assert_eq!(cache.fresh(ContentKey::StatsData, TTL, now), Some(json!([1])));

        cache.roll_back(ContentKey::StatsData, &json!([1]));
        assert_eq!(cache.fresh(ContentKey::StatsData, TTL, now), Some(json!([0])));
    }

    #[test]
    fn test_clear_keeps_pending() {
        let now = Instant::now();
        let mut cache = ReadCache::new();
        cache.record_fetch(ContentKey::NewsData, json!([]), now);
        cache.record_fetch(ContentKey::MarketsData, json!([]), now);
        cache.stage(ContentKey::HeroSubtitle, json!("draft"));

        cache.clear(Some(ContentKey::NewsData));
        assert!(!cache.contains(ContentKey::NewsData));
        assert!(cache.contains(ContentKey::MarketsData));

        cache.clear(None);
        assert!(!cache.contains(ContentKey::MarketsData));
        assert!(cache.is_pending(ContentKey::HeroSubtitle));
    }
}
