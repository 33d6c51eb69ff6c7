use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::{Observer, ObserverId};

pub(crate) struct Observers<S> {
    observers: Vec<(ObserverId, Box<dyn Observer<S>>)>,
    last_id: ObserverId,
    ids_to_remove: Vec<ObserverId>,
}

impl<S> Observers<S> {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
            last_id: 0,
            ids_to_remove: Vec::with_capacity(4),
        }
    }

    pub fn add(&mut self, observer: Box<dyn Observer<S>>) -> ObserverId {
        let id = self.last_id;
        self.observers.push((id, observer));
        self.last_id = self.last_id.wrapping_add(1);
        id
    }

    pub fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Runs `f` on every observer in registration order. Observers that panic
    /// are dropped.
    pub fn notify(&mut self, machine: &str, mut f: impl FnMut(&mut dyn Observer<S>)) {
        if self.observers.is_empty() {
            return;
        }
        for (id, observer) in self.observers.iter_mut() {
            let result = catch_unwind(AssertUnwindSafe(|| f(observer.as_mut())));
            if result.is_err() {
                tracing::error!(%machine, observer_id = %id, "Observer panicked, removing");
                self.ids_to_remove.push(*id);
            }
        }

        for id in self.ids_to_remove.drain(..) {
            self.observers.retain(|(oid, _)| *oid != id);
        }
    }
}
