//! Per-invocation context for predicate evaluation
//!
//! Every top-level `test()` call creates a fresh [`Context`]: the argument
//! tuple it was called with plus a [`Scratchpad`] that all predicates taking
//! part in that call share. A predicate can stash a value that a sibling
//! evaluated later in the same call reads back, while separate calls never
//! see each other's data.
//!
//! The context is handed to leaf callables explicitly. In addition, each
//! thread keeps a stack of active invocations so code that was not given the
//! context (helpers, nested rule lookups) can still reach the innermost one
//! through [`with_current`] or [`current`]. Nested `test()` calls push a new
//! frame and the frame is popped when the call returns, including during
//! unwinding.

use crate::predicate::Args;
use ahash::AHashMap;
use std::any::Any;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;
use std::rc::Rc;

thread_local! {
    static FRAMES: RefCell<Vec<NonNull<Context<'static>>>> = const { RefCell::new(Vec::new()) };
}

/// Key/value scratch space shared by the predicates of one invocation
#[derive(Default)]
pub struct Scratchpad {
    entries: RefCell<AHashMap<String, Box<dyn Any>>>,
}

impl Scratchpad {
    fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous value under `key`
    pub fn insert<T: Any>(&self, key: impl Into<String>, value: T) {
        self.entries.borrow_mut().insert(key.into(), Box::new(value));
    }

    /// Clone out the value under `key` if it exists and is a `T`
    pub fn get<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.entries
            .borrow()
            .get(key)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Remove the value under `key`, returning whether one was present
    pub fn remove(&self, key: &str) -> bool {
        self.entries.borrow_mut().remove(key).is_some()
    }

    /// Memoise `init()` under `key` for the rest of the invocation
    ///
    /// `init` runs without any borrow held, so it may itself use the
    /// scratchpad or evaluate other predicates.
    pub fn get_or_insert_with<T, F>(&self, key: &str, init: F) -> T
    where
        T: Any + Clone,
        F: FnOnce() -> T,
    {
        if let Some(value) = self.get::<T>(key) {
            return value;
        }
        let value = init();
        self.insert(key, value.clone());
        value
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// Pops the thread's innermost frame when dropped
struct Frame {
    _not_send: PhantomData<Rc<()>>,
}

impl Frame {
    fn push(ctx: &Context<'_>) -> Self {
        let ptr = NonNull::from(ctx).cast::<Context<'static>>();
        FRAMES.with(|frames| frames.borrow_mut().push(ptr));
        Frame {
            _not_send: PhantomData,
        }
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        // try_with: the thread-local may already be gone during thread teardown
        let _ = FRAMES.try_with(|frames| {
            frames.borrow_mut().pop();
        });
    }
}

/// The active invocation: supplied arguments plus shared scratch space
pub struct Context<'a> {
    args: Args<'a>,
    scratchpad: Rc<Scratchpad>,
}

impl<'a> Context<'a> {
    /// Fresh invocation with an empty scratchpad
    pub(crate) fn new(args: Args<'a>) -> Self {
        Context {
            args,
            scratchpad: Rc::new(Scratchpad::new()),
        }
    }

    /// Run `f` with this context as the current one on this thread
    pub(crate) fn enter<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        let _frame = Frame::push(self);
        f(self)
    }

    /// Arguments exactly as passed to the top-level call
    pub fn args(&self) -> &Args<'a> {
        &self.args
    }

    pub fn scratchpad(&self) -> &Rc<Scratchpad> {
        &self.scratchpad
    }
}

impl Deref for Context<'_> {
    type Target = Scratchpad;

    fn deref(&self) -> &Scratchpad {
        &self.scratchpad
    }
}

/// Run `f` against the innermost active invocation on this thread
///
/// Returns `None` when no `test()` is running. The reference handed to `f`
/// cannot outlive the call, and neither can the arguments borrowed from it.
///
/// # Examples
///
/// ```
/// use rulekit::{context, Predicate};
///
/// fn supplied() -> usize {
///     context::with_current(|ctx| ctx.args().len()).unwrap_or(0)
/// }
///
/// let two_args = Predicate::nullary(|| supplied() == 2);
/// assert!(two_args.test((&"alice", &"doc")));
/// assert!(!two_args.test((&"alice",)));
/// assert_eq!(supplied(), 0);
/// ```
pub fn with_current<R>(f: impl for<'c> FnOnce(&'c Context<'c>) -> R) -> Option<R> {
    let frame = FRAMES.with(|frames| frames.borrow().last().copied())?;
    // SAFETY: a frame is on the stack only while `Context::enter` runs on this
    // thread, and the context it points at is borrowed for that whole call.
    // The lifetime is shortened to one `f` cannot leak.
    let ctx = unsafe { frame.as_ref() };
    Some(f(ctx))
}

/// Innermost active scratchpad on this thread, if a `test()` is running
pub fn current() -> Option<Rc<Scratchpad>> {
    with_current(|ctx| Rc::clone(ctx.scratchpad()))
}

/// Number of nested invocations active on this thread
pub fn depth() -> usize {
    FRAMES.with(|frames| frames.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratchpad_roundtrip() {
        let pad = Scratchpad::new();
        assert!(pad.is_empty());

        pad.insert("k", 1u32);
        assert_eq!(pad.get::<u32>("k"), Some(1));
        assert_eq!(pad.get::<String>("k"), None);
        assert!(pad.contains("k"));
        assert_eq!(pad.len(), 1);

        assert!(pad.remove("k"));
        assert!(!pad.remove("k"));
    }

    #[test]
    fn test_get_or_insert_with_runs_once() {
        let pad = Scratchpad::new();
        let mut calls = 0;

        let first = pad.get_or_insert_with("groups", || {
            calls += 1;
            vec!["editors".to_string()]
        });
        let second: Vec<String> = pad.get_or_insert_with("groups", || {
            calls += 1;
            Vec::new()
        });

        assert_eq!(first, second);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_frames_push_and_pop() {
        assert_eq!(depth(), 0);
        assert!(current().is_none());

        Context::new(Args::none()).enter(|outer| {
            outer.insert("level", "outer");
            assert_eq!(depth(), 1);

            Context::new(Args::none()).enter(|_| {
                assert_eq!(depth(), 2);
                let pad = current().unwrap();
                assert!(!pad.contains("level"));
            });

            assert_eq!(depth(), 1);
            let pad = current().unwrap();
            assert_eq!(pad.get::<&str>("level"), Some("outer"));
        });

        assert_eq!(depth(), 0);
    }

    #[test]
    fn test_with_current_sees_arguments() {
        let subject = 7u32;
        let target = "doc";

        assert!(with_current(|ctx| ctx.args().len()).is_none());

        Context::new(Args::two(&subject, &target)).enter(|_| {
            let seen = with_current(|ctx| {
                let args = ctx.args();
                (args.len(), args.get(0).downcast::<u32>().copied())
            });
            assert_eq!(seen, Some((2, Some(7))));

            Context::new(Args::none()).enter(|_| {
                assert_eq!(with_current(|ctx| ctx.args().len()), Some(0));
            });

            assert_eq!(with_current(|ctx| ctx.args().len()), Some(2));
        });
    }

    #[test]
    fn test_frame_popped_on_panic() {
        let result = std::panic::catch_unwind(|| {
            Context::new(Args::none()).enter(|_| {
                assert_eq!(depth(), 1);
                panic!("predicate failed");
            })
        });

        assert!(result.is_err());
        assert_eq!(depth(), 0);
    }
}
