//! The session authority: the single source of truth for "who is logged in".
//!
//! Exactly one [`SessionAuthority`] exists per client. It owns the
//! [`SessionRecord`] and is the only thing allowed to change it; everyone
//! else either reads a snapshot or subscribes to changes.
//!
//! # Notification ordering
//!
//! The stored value changes *synchronously* inside [`set_identity`],
//! [`renew`] and [`clear`]: a `current_identity()` call on the next line
//! already sees the new value. Subscribers hold a `watch::Receiver` and
//! observe the change the next time they poll it (`changed().await` wakes,
//! `borrow()` returns the new value). Receivers only ever see the latest
//! value, never a queue of intermediate ones. A `clear()` on an already
//! empty record does not wake anyone.
//!
//! # Stale reauthorization responses
//!
//! A reauthorization is a round trip, and the world can change while it is
//! in flight. Every explicit mutation (`set_identity`, `clear`) advances an
//! epoch. A response is applied only if the epoch is still the one it was
//! sent under, so a slow "yes, you're logged in" can't resurrect a session
//! the user logged out of in the meantime. Among concurrent
//! reauthorizations with no explicit mutation in between, the last response
//! to arrive wins.
//!
//! [`set_identity`]: SessionAuthority::set_identity
//! [`renew`]: SessionAuthority::renew
//! [`clear`]: SessionAuthority::clear

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use feedline_protocol::UserProfile;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::{AuthApi, AuthOutcome, SessionRecord};

/// Owns the session record and the auth collaborator used to re-validate it.
///
/// Shared as `Arc<SessionAuthority<A>>`. All methods take `&self`; the
/// record lives in a `watch` channel, whose internal lock also serializes
/// epoch checks against mutations.
pub struct SessionAuthority<A: AuthApi> {
    api: Arc<A>,
    record: watch::Sender<Option<SessionRecord>>,
    /// Advanced on every explicit mutation. Only read or written while the
    /// `record` lock is held (inside `send_*` closures).
    epoch: AtomicU64,
}

impl<A: AuthApi> SessionAuthority<A> {
    /// Creates an authority with no session.
    pub fn new(api: Arc<A>) -> Self {
        let (record, _) = watch::channel(None);
        Self {
            api,
            record,
            epoch: AtomicU64::new(0),
        }
    }

    /// The auth collaborator, for components that need to call refresh or
    /// logout themselves.
    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Replaces the session record with a fresh one for `identity`.
    pub fn set_identity(&self, identity: UserProfile) {
        let user_id = identity.id.clone();
        let record = SessionRecord::new(identity);
        self.record.send_modify(|slot| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *slot = Some(record);
        });
        tracing::info!(%user_id, "session identity set");
    }

    /// Marks the current session as confirmed again (after a refresh)
    /// without changing who it belongs to.
    ///
    /// Returns `false` and does nothing if there is no session to renew.
    pub fn renew(&self) -> bool {
        let renewed = self.record.send_if_modified(|slot| match slot {
            Some(record) => {
                record.valid_since = Instant::now();
                true
            }
            None => false,
        });
        if renewed {
            tracing::debug!("session renewed");
        }
        renewed
    }

    /// Drops the session.
    ///
    /// Idempotent: clearing an empty record is a no-op, not an error, and
    /// does not notify subscribers. Returns `true` if a session was
    /// actually dropped.
    pub fn clear(&self) -> bool {
        let cleared = self.record.send_if_modified(|slot| {
            // Advance even when already empty: an explicit clear still has
            // to invalidate any reauthorization in flight.
            self.epoch.fetch_add(1, Ordering::SeqCst);
            slot.take().is_some()
        });
        if cleared {
            tracing::info!("session cleared");
        }
        cleared
    }

    /// The current identity, without side effects.
    pub fn current_identity(&self) -> Option<UserProfile> {
        self.record
            .borrow()
            .as_ref()
            .map(|record| record.identity.clone())
    }

    /// A copy of the whole record.
    pub fn snapshot(&self) -> Option<SessionRecord> {
        self.record.borrow().clone()
    }

    /// `true` while a session is held.
    pub fn is_live(&self) -> bool {
        self.record.borrow().is_some()
    }

    /// `true` if the current identity has the admin profile.
    pub fn is_admin(&self) -> bool {
        self.record
            .borrow()
            .as_ref()
            .is_some_and(|record| record.identity.is_admin())
    }

    /// Subscribes to changes of the session record.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionRecord>> {
        self.record.subscribe()
    }

    /// Asks the backend whether the session is still valid and applies the
    /// answer.
    ///
    /// Never fails: network errors, server errors and explicit rejections
    /// all resolve to `None`, since "no session" is the only safe degraded
    /// state. If an explicit `set_identity`/`clear` happened while the
    /// request was in flight, the response is discarded and the current
    /// identity is returned instead.
    pub async fn reauthorize(&self) -> Option<UserProfile> {
        let epoch = self.current_epoch();

        let outcome = AuthOutcome::classify(self.api.reauthorize().await);
        match &outcome {
            AuthOutcome::Authenticated(user) => {
                tracing::debug!(user_id = %user.id, "reauthorization confirmed session");
            }
            AuthOutcome::Unauthenticated => {
                tracing::debug!("reauthorization found no session");
            }
            AuthOutcome::AuthFailure => {
                tracing::warn!("reauthorization rejected: cookie invalid or expired");
            }
            AuthOutcome::TransportFailure => {
                tracing::error!("reauthorization failed, treating as no session");
            }
        }
        let identity = outcome.into_identity();

        let mut applied = false;
        self.record.send_if_modified(|slot| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            applied = true;
            match &identity {
                Some(user) => {
                    *slot = Some(SessionRecord::new(user.clone()));
                    true
                }
                None => slot.take().is_some(),
            }
        });

        if applied {
            identity
        } else {
            tracing::debug!("discarding stale reauthorization response");
            self.current_identity()
        }
    }

    fn current_epoch(&self) -> u64 {
        // Held across the load so it can't interleave with a mutation that
        // is halfway through its closure.
        let _record = self.record.borrow();
        self.epoch.load(Ordering::SeqCst)
    }
}

// =========================================================================
// Tests
// =========================================================================
