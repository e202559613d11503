use std::collections::HashMap;

use crate::clock::Millis;
use crate::types::EntityId;

/// Point-lookup results, kept only to display a selection's label.
#[derive(Debug, Default)]
pub(crate) struct LabelCache {
    entries: HashMap<EntityId, Entry>,
}

#[derive(Debug)]
struct Entry {
    /// `None` when the lookup failed.
    label: Option<String>,
    stored_at: Millis,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Cached<'a> {
    Label(&'a str),
    /// A recent lookup failed; do not retry yet.
    Unavailable,
    Miss,
}

impl LabelCache {
    pub(crate) fn get(&self, id: &EntityId, now: Millis, ttl: Millis) -> Cached<'_> {
        match self.entries.get(id) {
            Some(entry) if now - entry.stored_at < ttl => match &entry.label {
                Some(label) => Cached::Label(label),
                None => Cached::Unavailable,
            },
            _ => Cached::Miss,
        }
    }

    /// Last known label regardless of age.
    pub(crate) fn last_known(&self, id: &EntityId) -> Option<&str> {
        self.entries.get(id).and_then(|e| e.label.as_deref())
    }

    pub(crate) fn store(&mut self, id: EntityId, label: Option<String>, now: Millis) {
        // A failed refresh keeps a previously resolved label.
        if label.is_none()
            && let Some(existing) = self.entries.get_mut(&id)
            && existing.label.is_some()
        {
            existing.stored_at = now;
            return;
        }
        self.entries.insert(
            id,
            Entry {
                label,
                stored_at: now,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Millis = 300_000;

    #[test]
    fn fresh_then_stale() {
        let mut cache = LabelCache::default();
        let id = EntityId::from(4_i64);
        cache.store(id.clone(), Some("Bodega Sur".into()), 0);

        assert_eq!(cache.get(&id, TTL - 1, TTL), Cached::Label("Bodega Sur"));
        assert_eq!(cache.get(&id, TTL, TTL), Cached::Miss);
        assert_eq!(cache.last_known(&id), Some("Bodega Sur"));
    }

    #[test]
    fn failures_are_remembered_without_erasing_labels() {
        let mut cache = LabelCache::default();
        let id = EntityId::from(4_i64);

        cache.store(id.clone(), None, 0);
        assert_eq!(cache.get(&id, 1, TTL), Cached::Unavailable);

        cache.store(id.clone(), Some("Bodega Sur".into()), 10);
        cache.store(id.clone(), None, 20);
        assert_eq!(cache.get(&id, 21, TTL), Cached::Label("Bodega Sur"));
    }
}
