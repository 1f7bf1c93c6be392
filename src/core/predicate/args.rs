//! Positional context values handed to predicates
//!
//! A predicate sees at most two values: the subject (usually a user) and the
//! target object. Values are type-erased so that predicates over unrelated
//! types can share one registry; callables downcast to what they expect.

use crate::error::{Result, RulesError};
use std::any::Any;
use std::fmt;

/// Largest number of positional values a predicate can ask for
pub const MAX_ARITY: usize = 2;

/// A single positional value, or the absence of one
///
/// When a predicate declares more parameters than the caller supplied, the
/// missing trailing slots are filled with [`Arg::NOT_GIVEN`]. This marker is
/// distinct from every caller value, so a predicate can tell "called with one
/// argument" apart from "called with an explicit null".
#[derive(Clone, Copy, Default)]
pub struct Arg<'a>(Option<&'a (dyn Any + 'static)>);

impl Arg<'static> {
    /// Marker for a slot the caller did not fill
    pub const NOT_GIVEN: Self = Arg(None);
}

impl<'a> Arg<'a> {
    /// Wrap a borrowed value
    pub fn new<T: Any>(value: &'a T) -> Self {
        Arg(Some(value))
    }

    /// Whether the caller supplied this slot
    pub fn is_given(&self) -> bool {
        self.0.is_some()
    }

    /// Borrow the value as `T`, or `None` if absent or of another type
    pub fn downcast<T: Any>(&self) -> Option<&'a T> {
        self.0.and_then(|value| value.downcast_ref::<T>())
    }

    /// Raw type-erased view of the value
    pub fn as_any(&self) -> Option<&'a (dyn Any + 'static)> {
        self.0
    }
}

impl fmt::Debug for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_given() {
            write!(f, "Arg(..)")
        } else {
            write!(f, "Arg(NOT_GIVEN)")
        }
    }
}

/// The argument tuple supplied to a top-level `test()` call
#[derive(Clone, Copy, Default, Debug)]
pub struct Args<'a> {
    slots: [Arg<'a>; MAX_ARITY],
    len: usize,
}

impl<'a> Args<'a> {
    /// No arguments
    pub fn none() -> Self {
        Args::default()
    }

    /// Subject only
    pub fn one<A: Any>(obj: &'a A) -> Self {
        Args {
            slots: [Arg::new(obj), Arg::NOT_GIVEN],
            len: 1,
        }
    }

    /// Subject and target
    pub fn two<A: Any, B: Any>(obj: &'a A, target: &'a B) -> Self {
        Args {
            slots: [Arg::new(obj), Arg::new(target)],
            len: 2,
        }
    }

    /// Build from an arbitrary slice of arguments
    ///
    /// # Errors
    ///
    /// Returns `ArityTooLarge` if more than two arguments are given.
    pub fn from_slice(args: &[Arg<'a>]) -> Result<Self> {
        if args.len() > MAX_ARITY {
            return Err(RulesError::ArityTooLarge(args.len()));
        }
        let mut slots = [Arg::NOT_GIVEN; MAX_ARITY];
        slots[..args.len()].copy_from_slice(args);
        Ok(Args {
            slots,
            len: args.len(),
        })
    }

    /// Number of arguments the caller supplied
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Argument at `index`, `NOT_GIVEN` past the supplied ones
    pub fn get(&self, index: usize) -> Arg<'a> {
        if index < self.len {
            self.slots[index]
        } else {
            Arg::NOT_GIVEN
        }
    }

    /// The supplied arguments, unpadded
    pub fn as_slice(&self) -> &[Arg<'a>] {
        &self.slots[..self.len]
    }

    /// First `count` positions, padding missing ones with `NOT_GIVEN`
    pub(crate) fn positional(&self, count: usize) -> Args<'a> {
        let count = count.min(MAX_ARITY);
        let mut slots = [Arg::NOT_GIVEN; MAX_ARITY];
        for (index, slot) in slots.iter_mut().enumerate().take(count) {
            *slot = self.get(index);
        }
        Args { slots, len: count }
    }
}

impl From<()> for Args<'_> {
    fn from(_: ()) -> Self {
        Args::none()
    }
}

impl<'a, A: Any> From<(&'a A,)> for Args<'a> {
    fn from((obj,): (&'a A,)) -> Self {
        Args::one(obj)
    }
}

impl<'a, A: Any, B: Any> From<(&'a A, &'a B)> for Args<'a> {
    fn from((obj, target): (&'a A, &'a B)) -> Self {
        Args::two(obj, target)
    }
}

impl<'a> From<Arg<'a>> for Args<'a> {
    fn from(obj: Arg<'a>) -> Self {
        Args {
            slots: [obj, Arg::NOT_GIVEN],
            len: 1,
        }
    }
}

impl<'a> From<(Arg<'a>, Arg<'a>)> for Args<'a> {
    fn from((obj, target): (Arg<'a>, Arg<'a>)) -> Self {
        Args {
            slots: [obj, target],
            len: 2,
        }
    }
}
