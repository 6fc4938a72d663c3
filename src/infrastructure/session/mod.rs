// src/infrastructure/session/mod.rs
// In-memory draft store

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::domain::errors::{IntakeError, IntakeResult};
use crate::domain::models::{Draft, UserId};
use crate::domain::repository::SessionStore;

/// Keeps drafts in a map keyed by user. Contents are lost on restart.
///
/// Drafts idle for longer than `ttl` are treated as abandoned: `get` and
/// `update` stop seeing them and `evict_expired` drops them.
pub struct InMemorySessionStore {
    drafts: HashMap<UserId, Draft>,
    ttl: Option<Duration>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            drafts: HashMap::new(),
            ttl,
        }
    }
}

fn is_live(ttl: Option<Duration>, draft: &Draft, now: DateTime<Utc>) -> bool {
    match ttl {
        Some(ttl) => now - draft.touched_at <= ttl,
        None => true,
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&mut self, user: UserId) -> Draft {
        let draft = Draft::new(user, Utc::now());
        if self.drafts.insert(user, draft.clone()).is_some() {
            log::debug!("Discarded previous draft of user {}", user);
        }
        draft
    }

    fn get(&self, user: UserId) -> Option<Draft> {
        let now = Utc::now();
        self.drafts
            .get(&user)
            .filter(|draft| is_live(self.ttl, draft, now))
            .cloned()
    }

    fn touch(&mut self, user: UserId) -> Option<Draft> {
        let now = Utc::now();
        let ttl = self.ttl;
        let draft = self
            .drafts
            .get_mut(&user)
            .filter(|draft| is_live(ttl, draft, now))?;
        draft.touched_at = now;
        Some(draft.clone())
    }

    fn update(
        &mut self,
        user: UserId,
        mutator: &mut dyn FnMut(&mut Draft) -> IntakeResult<()>,
    ) -> IntakeResult<Draft> {
        let mut draft = self.get(user).ok_or(IntakeError::NoActiveDraft)?;
        mutator(&mut draft)?;
        draft.touched_at = Utc::now();
        self.drafts.insert(user, draft.clone());
        Ok(draft)
    }

    fn clear(&mut self, user: UserId) -> Option<Draft> {
        self.drafts.remove(&user)
    }

    fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let before = self.drafts.len();
        self.drafts.retain(|_, draft| is_live(Some(ttl), draft, now));
        before - self.drafts.len()
    }

    fn len(&self) -> usize {
        self.drafts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Product;

    fn add_burger(draft: &mut Draft) -> IntakeResult<()> {
        draft.add_product(&Product::new("Burger", 25000))
    }

    #[test]
    fn get_or_create_starts_empty_and_discards_previous_draft() {
        let mut store = InMemorySessionStore::default();
        let user = UserId(5);

        let draft = store.get_or_create(user);
        assert!(draft.cart().is_empty());
        assert_eq!(draft.total(), 0);

        store.update(user, &mut add_burger).unwrap();
        assert_eq!(store.get(user).unwrap().total(), 25000);

        let fresh = store.get_or_create(user);
        assert!(fresh.cart().is_empty());
        assert!(store.get(user).unwrap().cart().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn failed_mutation_is_not_kept() {
        let mut store = InMemorySessionStore::default();
        let user = UserId(5);
        store.get_or_create(user);
        store.update(user, &mut add_burger).unwrap();
        store.update(user, &mut |d: &mut Draft| d.close_selection()).unwrap();

        let before = store.get(user).unwrap();
        let result = store.update(user, &mut |d: &mut Draft| -> IntakeResult<()> {
            d.set_delivery(crate::domain::models::DeliveryPoint::Address("Chorsu".into()))?;
            d.set_phone("12345")
        });
        assert!(matches!(result, Err(IntakeError::InvalidPhone(_))));

        let after = store.get(user).unwrap();
        assert_eq!(after.delivery(), before.delivery());
        assert!(after.phone().is_none());
    }

    #[test]
    fn users_are_isolated() {
        let mut store = InMemorySessionStore::default();
        store.get_or_create(UserId(1));
        store.update(UserId(1), &mut add_burger).unwrap();

        assert!(store.get(UserId(2)).is_none());
        assert!(matches!(
            store.update(UserId(2), &mut add_burger),
            Err(IntakeError::NoActiveDraft)
        ));
        assert!(store.clear(UserId(2)).is_none());
        assert!(store.clear(UserId(1)).is_some());
        assert!(store.get(UserId(1)).is_none());
    }

    #[test]
    fn idle_drafts_expire() {
        let mut store = InMemorySessionStore::new(Some(Duration::minutes(30)));
        store.get_or_create(UserId(1));
        store.get_or_create(UserId(2));

        assert_eq!(store.evict_expired(Utc::now()), 0);
        assert_eq!(store.evict_expired(Utc::now() + Duration::minutes(31)), 2);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn touching_keeps_an_active_draft_alive() {
        let mut store = InMemorySessionStore::new(Some(Duration::minutes(30)));
        store.get_or_create(UserId(1));
        if let Some(draft) = store.drafts.get_mut(&UserId(1)) {
            draft.touched_at = Utc::now() - Duration::minutes(29);
        }

        let touched = store.touch(UserId(1)).unwrap();
        assert!(Utc::now() - touched.touched_at < Duration::minutes(1));
        assert_eq!(store.evict_expired(Utc::now() + Duration::minutes(2)), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn expired_draft_cannot_be_touched_back_to_life() {
        let mut store = InMemorySessionStore::new(Some(Duration::minutes(30)));
        store.get_or_create(UserId(1));
        if let Some(draft) = store.drafts.get_mut(&UserId(1)) {
            draft.touched_at = Utc::now() - Duration::hours(1);
        }

        assert!(store.touch(UserId(1)).is_none());
        assert!(store.touch(UserId(2)).is_none());
        assert_eq!(store.evict_expired(Utc::now()), 1);
    }

    #[test]
    fn expired_draft_is_invisible_before_sweep() {
        let mut store = InMemorySessionStore::new(Some(Duration::minutes(30)));
        store.get_or_create(UserId(1));
        if let Some(draft) = store.drafts.get_mut(&UserId(1)) {
            draft.touched_at = Utc::now() - Duration::hours(1);
        }

        assert!(store.get(UserId(1)).is_none());
        assert!(matches!(
            store.update(UserId(1), &mut add_burger),
            Err(IntakeError::NoActiveDraft)
        ));
    }
}
