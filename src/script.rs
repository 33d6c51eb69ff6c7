use std::{
    fmt,
    hash::Hash,
    sync::{
        Arc, Mutex, TryLockError,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{Error, Result, Scope, Step};

static NEXT_SCRIPT_ID: AtomicU64 = AtomicU64::new(1);

/// Interned identity of a [`Script`].
///
/// Every call to [`Script::new`] allocates a fresh id; clones of a script
/// share it. Labels bind ids, never captured data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScriptId(u64);

impl ScriptId {
    fn next() -> Self {
        Self(NEXT_SCRIPT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Body<S> = Box<dyn FnMut(&mut Scope<'_, S>) -> Result<Step<S>> + Send>;

/// A unit of work run by a [`Machine`](crate::Machine).
///
/// A script runs to completion every time it is invoked and tells the machine
/// what to do next by returning a [`Step`]. Scripts usually return further
/// scripts, which is how a chain is built:
///
/// ```rust
/// use stepchain::{Chain, Script, Step};
///
/// let mut chain = Chain::new(Script::new(|_| {
///     Ok(Step::next(Script::new(|_| Ok(Step::complete()))))
/// }));
///
/// chain.pulse().unwrap();
/// chain.pulse().unwrap();
/// assert!(chain.completed());
/// ```
///
/// Handles are cheap to clone. Two handles are equal only when they come from
/// the same `Script::new` call.
pub struct Script<S = ()> {
    id: ScriptId,
    body: Arc<Mutex<Body<S>>>,
}

impl<S> Script<S> {
    pub fn new<F>(body: F) -> Self
    where
        F: FnMut(&mut Scope<'_, S>) -> Result<Step<S>> + Send + 'static,
    {
        Self {
            id: ScriptId::next(),
            body: Arc::new(Mutex::new(Box::new(body))),
        }
    }

    #[inline]
    pub fn id(&self) -> ScriptId {
        self.id
    }

    /// Runs the script body once.
    ///
    /// A body poisoned by an earlier panic is still runnable; the machine has
    /// already reported that panic as a fault.
    pub(crate) fn invoke(&self, scope: &mut Scope<'_, S>) -> Result<Step<S>> {
        let mut body = match self.body.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return Err(Error::ScriptBusy(self.id)),
        };
        (&mut **body)(scope)
    }
}

impl<S: 'static> Script<S> {
    /// Combines two scripts into one that runs `self`, then `then`, within a
    /// single invocation.
    ///
    /// The combined result is the result of `self`, unless `self` asked for a
    /// deferred repeat, in which case `then` decides. A deferred repeat is the
    /// "nothing to report" answer, so `then` gets the last word; an immediate
    /// [`Step::again`] from `self` still wins.
    pub fn and_then(self, then: Script<S>) -> Script<S> {
        Script::new(move |scope| {
            let first = self.invoke(scope)?;
            let second = then.invoke(scope)?;
            Ok(if first.is_deferred_repeat() {
                second
            } else {
                first
            })
        })
    }

    /// Alias of [`and_then`](Script::and_then) that reads better when
    /// `on_exit` is cleanup work.
    pub fn on_exit(self, on_exit: Script<S>) -> Script<S> {
        self.and_then(on_exit)
    }
}

impl<S> Clone for Script<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            body: self.body.clone(),
        }
    }
}

impl<S> PartialEq for Script<S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S> Eq for Script<S> {}

impl<S> Hash for Script<S> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<S> fmt::Debug for Script<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Script").field(&self.id.0).finish()
    }
}

impl<S> fmt::Display for Script<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "script{}", self.id)
    }
}
