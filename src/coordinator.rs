use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::store::AliasStore;
use crate::{LogLevel, Logger, Notifier};

type Listener = Box<dyn FnMut()>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
    /// Nesting depth of `notify` calls in progress.
    running: usize,
    /// Ids released while their listener was taken out to run.
    released: Vec<u64>,
}

/// Configuration-change notifications. Listeners run in subscription order.
#[derive(Clone, Default)]
pub struct ChangeFeed {
    inner: Rc<RefCell<Listeners>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl FnMut() + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.push((id, Box::new(listener)));
        Subscription {
            id,
            feed: Rc::downgrade(&self.inner),
        }
    }

    pub fn notify(&self) {
        // Listeners are taken out while they run so one may subscribe or
        // release without a double borrow.
        let mut running = {
            let mut inner = self.inner.borrow_mut();
            inner.running += 1;
            std::mem::take(&mut inner.entries)
        };
        for (id, listener) in running.iter_mut() {
            if self.inner.borrow().released.contains(id) {
                continue;
            }
            listener();
        }
        let mut inner = self.inner.borrow_mut();
        inner.running -= 1;
        let added = std::mem::take(&mut inner.entries);
        running.extend(added);
        let (kept, gone): (Vec<_>, Vec<_>) = running
            .into_iter()
            .partition(|(id, _)| !inner.released.contains(id));
        if inner.running == 0 {
            inner.released.clear();
        }
        inner.entries = kept;
        // Released listeners may own subscriptions of their own.
        drop(inner);
        drop(gone);
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }
}

/// Keeps a listener registered until released or dropped.
pub struct Subscription {
    id: u64,
    feed: Weak<RefCell<Listeners>>,
}

impl Subscription {
    pub fn release(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(feed) = self.feed.upgrade() {
            let mut feed = feed.borrow_mut();
            feed.entries.retain(|(id, _)| *id != self.id);
            if feed.running > 0 {
                feed.released.push(self.id);
            }
        }
    }
}

/// Re-syncs the alias store whenever the settings change.
pub struct ChangeCoordinator {
    subscription: Subscription,
}

impl ChangeCoordinator {
    pub fn new(
        store: Rc<RefCell<AliasStore>>,
        feed: &ChangeFeed,
        logger: Rc<dyn Logger>,
        notifier: Rc<dyn Notifier>,
    ) -> Self {
        let subscription = feed.subscribe(move || {
            logger.log(LogLevel::Debug, "configuration changed, syncing aliases");
            if let Err(e) = store.borrow_mut().sync_from_external_config() {
                logger.log(LogLevel::Error, &format!("alias sync failed: {e}"));
                notifier.notify(&format!("alias sync failed: {e}"));
            }
        });
        Self { subscription }
    }

    pub fn dispose(self) {
        self.subscription.release();
    }
}
