//! Listener registry shared by every event-emitting part of the app.
//!
//! Each emitter (Region, Selection, the Taskwarrior wrapper, the menu loop)
//! owns one `Listeners<E>` per event type. Subscribers run in registration
//! order; the same closure may be registered twice and will run twice.

/// Handle returned by [`Listeners::register`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

/// Ordered collection of subscribers for events of type `E`.
pub struct Listeners<E> {
    next_id: u64,
    subscribers: Vec<(ListenerId, Box<dyn FnMut(&E)>)>,
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Listeners {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    /// Add a subscriber; it is called for every subsequent [`notify`](Self::notify).
    pub fn register(&mut self, listener: impl FnMut(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(listener)));
        id
    }

    /// Remove the subscriber registered under `id`. Unknown ids are ignored.
    pub fn remove(&mut self, id: ListenerId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    /// Deliver `event` to every subscriber, in registration order.
    pub fn notify(&mut self, event: &E) {
        for (_, listener) in &mut self.subscribers {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn notifies_in_registration_order() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut listeners: Listeners<u32> = Listeners::new();

        let c1 = calls.clone();
        listeners.register(move |e| c1.borrow_mut().push(("first", *e)));
        let c2 = calls.clone();
        listeners.register(move |e| c2.borrow_mut().push(("second", *e)));

        listeners.notify(&7);

        assert_eq!(*calls.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn removal_is_by_identity() {
        let calls = Rc::new(RefCell::new(0));
        let mut listeners: Listeners<()> = Listeners::new();

        let c1 = calls.clone();
        let keep = listeners.register(move |_| *c1.borrow_mut() += 1);
        let c2 = calls.clone();
        let removed = listeners.register(move |_| *c2.borrow_mut() += 10);

        listeners.remove(removed);
        listeners.notify(&());

        assert_eq!(*calls.borrow(), 1);
        listeners.remove(keep);
        assert!(listeners.is_empty());
    }

    #[test]
    fn duplicate_subscribers_both_run() {
        let calls = Rc::new(RefCell::new(0));
        let mut listeners: Listeners<()> = Listeners::new();
        for _ in 0..2 {
            let c = calls.clone();
            listeners.register(move |_| *c.borrow_mut() += 1);
        }
        listeners.notify(&());
        assert_eq!(*calls.borrow(), 2);
    }
}
