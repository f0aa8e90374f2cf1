use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::task::JoinHandle;

use crate::{
    session::store::{SessionStore, TOKEN_KEY, USER_KEY},
    storage::kv::StorageChange,
};

/// The name of the same-context session signal.
pub const AUTH_CHANGE: &str = "authChange";

type Handler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

/// Tells interested observers that the session may have changed.
///
/// Two channels feed the same handlers: `publish()`, which writers call right
/// after mutating the `SessionStore`, and the storage change notifications
/// from other contexts, forwarded by `listen()`. The signal carries no
/// payload; observers re-read the store.
#[derive(Clone, Default)]
pub struct SessionBroadcaster {
    registry: Arc<Mutex<Registry>>,
}

impl SessionBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` and returns the guard that keeps it registered.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.handlers.push((id, Arc::new(handler)));

        tracing::debug!("{} subscriber registered: {}", AUTH_CHANGE, id);

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Signals `authChange` to every current subscriber.
    ///
    /// Dispatch is synchronous and in registration order. Handlers run without
    /// the registry lock held, so they may subscribe or unsubscribe.
    pub fn publish(&self) {
        let handlers: Vec<Handler> = self
            .registry()
            .handlers
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        tracing::debug!("Publishing {} to {} subscribers", AUTH_CHANGE, handlers.len());

        for handler in handlers {
            handler();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().handlers.len()
    }

    /// Forwards session changes made by other contexts to the subscribers.
    ///
    /// Only the `token` and `user` slots are relayed. A lagged stream is
    /// relayed once, since something changed in the gap. The task ends when
    /// the storage goes away; abort the handle to stop it earlier.
    ///
    /// # Arguments
    ///
    /// * `store` - The session store whose storage context to watch.
    pub fn listen(&self, store: &SessionStore) -> JoinHandle<()> {
        let mut changes = store.changes();
        let broadcaster = self.clone();

        tokio::spawn(async move {
            while let Some(change) = changes.next().await {
                match change {
                    StorageChange::Changed(event)
                        if event.key == TOKEN_KEY || event.key == USER_KEY =>
                    {
                        tracing::debug!("Session slot '{}' changed in another context", event.key);
                        broadcaster.publish();
                    }
                    StorageChange::Changed(_) => {}
                    StorageChange::Lagged(missed) => {
                        tracing::warn!("Session listener missed {} storage events", missed);
                        broadcaster.publish();
                    }
                }
            }
            tracing::debug!("Storage closed, session listener stopped");
        })
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps a handler subscribed. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Removes the handler now.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            // The handler is dropped after the lock is released; its captures
            // may own other subscriptions.
            let removed = {
                let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
                registry
                    .handlers
                    .iter()
                    .position(|(id, _)| *id == self.id)
                    .map(|index| registry.handlers.remove(index))
            };
            if removed.is_some() {
                tracing::debug!("{} subscriber removed: {}", AUTH_CHANGE, self.id);
            }
        }
    }
}
