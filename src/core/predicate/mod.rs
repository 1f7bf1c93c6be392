//! Composable predicates with three-valued logic
//!
//! A [`Predicate`] wraps a callable over zero, one or two context values
//! (typically a user and a target object). Predicates combine with `&`, `|`,
//! `^` and `!` into new predicates. A callable may abstain by returning
//! [`Verdict::Abstain`] (or `None` from an `Option<bool>`); combinators treat
//! an abstaining operand as absent rather than false, and a top-level
//! [`Predicate::test`] that resolves to nothing at all denies.

mod args;
pub mod builtin;

pub use args::{Arg, Args, MAX_ARITY};

use crate::context::Context;
use crate::error::{Result, RulesError};
use serde::{Deserialize, Serialize};
use std::any::type_name;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};
use std::sync::Arc;
use tracing::trace;

/// Outcome of applying a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    True,
    False,
    /// No opinion for these arguments
    Abstain,
}

impl Verdict {
    pub fn is_true(self) -> bool {
        self == Verdict::True
    }

    pub fn is_abstain(self) -> bool {
        self == Verdict::Abstain
    }

    /// `Some(bool)` for a resolved verdict, `None` for abstention
    pub fn resolved(self) -> Option<bool> {
        match self {
            Verdict::True => Some(true),
            Verdict::False => Some(false),
            Verdict::Abstain => None,
        }
    }

    /// Logical negation; abstention stays abstention
    pub fn invert(self) -> Verdict {
        match self {
            Verdict::True => Verdict::False,
            Verdict::False => Verdict::True,
            Verdict::Abstain => Verdict::Abstain,
        }
    }
}

impl From<bool> for Verdict {
    fn from(value: bool) -> Self {
        if value {
            Verdict::True
        } else {
            Verdict::False
        }
    }
}

impl From<Option<bool>> for Verdict {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Verdict::Abstain, Verdict::from)
    }
}

/// How many positional values a predicate's callable takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signature {
    Nullary,
    Unary,
    Binary,
    /// Receives the caller's arguments unmodified, however many there are
    Variadic,
}

impl Signature {
    /// Signature for a callable taking `arity` positional values
    ///
    /// # Errors
    ///
    /// Returns `ArityTooLarge` for more than two; only a subject and a target
    /// are ever supplied.
    pub fn for_arity(arity: usize) -> Result<Self> {
        match arity {
            0 => Ok(Signature::Nullary),
            1 => Ok(Signature::Unary),
            2 => Ok(Signature::Binary),
            n => Err(RulesError::ArityTooLarge(n)),
        }
    }

    /// Declared positional arity; variadic callables declare none
    pub fn arity(self) -> usize {
        match self {
            Signature::Nullary | Signature::Variadic => 0,
            Signature::Unary => 1,
            Signature::Binary => 2,
        }
    }

    fn select<'a>(self, args: &Args<'a>) -> Args<'a> {
        match self {
            Signature::Variadic => *args,
            fixed => args.positional(fixed.arity()),
        }
    }
}

type Callable = dyn for<'a> Fn(&Context<'a>, &[Arg<'a>]) -> Verdict + Send + Sync;

fn callable<F>(f: F) -> Box<Callable>
where
    F: for<'a> Fn(&Context<'a>, &[Arg<'a>]) -> Verdict + Send + Sync + 'static,
{
    Box::new(f)
}

enum Node {
    Leaf {
        signature: Signature,
        call: Box<Callable>,
    },
    And(Predicate, Predicate),
    Or(Predicate, Predicate),
    Xor(Predicate, Predicate),
    Invert(Predicate),
}

/// A stateful predicate source implemented by user types
///
/// Wrapped with [`Predicate::from_check`], the predicate takes the name of
/// the implementing type.
pub trait Check: Send + Sync + 'static {
    /// Which positional values `check` receives
    fn signature(&self) -> Signature;

    fn check<'a>(&self, ctx: &Context<'a>, args: &[Arg<'a>]) -> Verdict;
}

/// A named, composable boolean (or abstaining) function
#[derive(Clone)]
pub struct Predicate {
    name: Arc<str>,
    node: Arc<Node>,
}

impl Predicate {
    /// Wrap a callable that receives the active context explicitly
    ///
    /// The slice handed to `f` holds exactly `signature.arity()` values
    /// (padded with [`Arg::NOT_GIVEN`]), or the caller's full argument list
    /// for [`Signature::Variadic`].
    ///
    /// # Examples
    ///
    /// ```
    /// use rulekit::{Predicate, Signature};
    ///
    /// let first_call = Predicate::new(Signature::Nullary, |ctx, _| {
    ///     let seen = ctx.contains("seen");
    ///     ctx.insert("seen", true);
    ///     !seen
    /// });
    ///
    /// assert!(first_call.test(()));
    /// assert!(!first_call.and(&first_call).test(()));
    /// ```
    pub fn new<F, R>(signature: Signature, f: F) -> Self
    where
        F: for<'a> Fn(&Context<'a>, &[Arg<'a>]) -> R + Send + Sync + 'static,
        R: Into<Verdict>,
    {
        Self::leaf(
            derive_name::<F>(),
            signature,
            callable(move |ctx, args| f(ctx, args).into()),
        )
    }

    /// Wrap a callable that ignores every argument
    pub fn nullary<F, R>(f: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: Into<Verdict>,
    {
        Self::leaf(
            derive_name::<F>(),
            Signature::Nullary,
            callable(move |_, _| f().into()),
        )
    }

    /// Wrap a callable over the subject
    pub fn unary<F, R>(f: F) -> Self
    where
        F: for<'a> Fn(Arg<'a>) -> R + Send + Sync + 'static,
        R: Into<Verdict>,
    {
        Self::leaf(
            derive_name::<F>(),
            Signature::Unary,
            callable(move |_, args| f(args[0]).into()),
        )
    }

    /// Wrap a callable over the subject and the target
    pub fn binary<F, R>(f: F) -> Self
    where
        F: for<'a> Fn(Arg<'a>, Arg<'a>) -> R + Send + Sync + 'static,
        R: Into<Verdict>,
    {
        Self::leaf(
            derive_name::<F>(),
            Signature::Binary,
            callable(move |_, args| f(args[0], args[1]).into()),
        )
    }

    /// Wrap a callable that receives whatever the caller supplied
    pub fn variadic<F, R>(f: F) -> Self
    where
        F: for<'a> Fn(&[Arg<'a>]) -> R + Send + Sync + 'static,
        R: Into<Verdict>,
    {
        Self::leaf(
            derive_name::<F>(),
            Signature::Variadic,
            callable(move |_, args| f(args).into()),
        )
    }

    /// Typed predicate over the subject
    ///
    /// An absent subject, or one that is not a `U`, yields `false`.
    pub fn on_subject<U, F, R>(f: F) -> Self
    where
        U: 'static,
        F: Fn(&U) -> R + Send + Sync + 'static,
        R: Into<Verdict>,
    {
        Self::leaf(
            derive_name::<F>(),
            Signature::Unary,
            callable(move |_, args| match args[0].downcast::<U>() {
                Some(subject) => f(subject).into(),
                None => Verdict::False,
            }),
        )
    }

    /// Typed predicate over the subject and the target
    ///
    /// If either value is absent or of the wrong type the result is `false`.
    pub fn on_pair<U, T, F, R>(f: F) -> Self
    where
        U: 'static,
        T: 'static,
        F: Fn(&U, &T) -> R + Send + Sync + 'static,
        R: Into<Verdict>,
    {
        Self::leaf(
            derive_name::<F>(),
            Signature::Binary,
            callable(
                move |_, args| match (args[0].downcast::<U>(), args[1].downcast::<T>()) {
                    (Some(subject), Some(target)) => f(subject, target).into(),
                    _ => Verdict::False,
                },
            ),
        )
    }

    /// Wrap a [`Check`] implementation, named after its type
    ///
    /// # Examples
    ///
    /// ```
    /// use rulekit::{Arg, Check, Context, Predicate, Signature, Verdict};
    ///
    /// struct MaxLength(usize);
    ///
    /// impl Check for MaxLength {
    ///     fn signature(&self) -> Signature {
    ///         Signature::Unary
    ///     }
    ///
    ///     fn check<'a>(&self, _ctx: &Context<'a>, args: &[Arg<'a>]) -> Verdict {
    ///         args[0].downcast::<&str>().map(|s| s.len() <= self.0).into()
    ///     }
    /// }
    ///
    /// let short = Predicate::from_check(MaxLength(5));
    /// assert_eq!(short.name(), "MaxLength");
    /// assert!(short.test((&"alice",)));
    /// assert!(!short.test((&"carolyn",)));
    /// ```
    pub fn from_check<T: Check>(check: T) -> Self {
        let signature = check.signature();
        Self::leaf(
            derive_name::<T>(),
            signature,
            callable(move |ctx, args| check.check(ctx, args)),
        )
    }

    fn leaf(name: String, signature: Signature, call: Box<Callable>) -> Self {
        Predicate {
            name: name.into(),
            node: Arc::new(Node::Leaf { signature, call }),
        }
    }

    fn combine(name: String, node: Node) -> Self {
        Predicate {
            name: name.into(),
            node: Arc::new(node),
        }
    }

    /// Same predicate under another name
    pub fn named(&self, name: impl Into<String>) -> Self {
        let name: String = name.into();
        Predicate {
            name: name.into(),
            node: Arc::clone(&self.node),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> Signature {
        match self.node.as_ref() {
            Node::Leaf { signature, .. } => *signature,
            _ => Signature::Variadic,
        }
    }

    /// Number of positional values the callable declares
    pub fn arity(&self) -> usize {
        self.signature().arity()
    }

    pub fn is_variadic(&self) -> bool {
        self.signature() == Signature::Variadic
    }

    /// Both must hold; `other` is skipped once `self` is false
    pub fn and(&self, other: &Predicate) -> Predicate {
        Self::combine(
            format!("({} & {})", self.name, other.name),
            Node::And(self.clone(), other.clone()),
        )
    }

    /// Either must hold; `other` is skipped once `self` is true
    pub fn or(&self, other: &Predicate) -> Predicate {
        Self::combine(
            format!("({} | {})", self.name, other.name),
            Node::Or(self.clone(), other.clone()),
        )
    }

    /// Exactly one must hold
    pub fn xor(&self, other: &Predicate) -> Predicate {
        Self::combine(
            format!("({} ^ {})", self.name, other.name),
            Node::Xor(self.clone(), other.clone()),
        )
    }

    /// Negation; `~~p` carries `p`'s name again
    pub fn invert(&self) -> Predicate {
        let name = match self.name.strip_prefix('~') {
            Some(inner) => inner.to_string(),
            None => format!("~{}", self.name),
        };
        Self::combine(name, Node::Invert(self.clone()))
    }

    /// Evaluate with a fresh invocation context, keeping abstention visible
    pub fn evaluate<'a>(&self, args: impl Into<Args<'a>>) -> Verdict {
        let ctx = Context::new(args.into());
        let verdict = ctx.enter(|ctx| self.apply(ctx));
        trace!("Predicate {} evaluated to {:?}", self.name, verdict);
        verdict
    }

    /// Evaluate with a fresh invocation context
    ///
    /// Abstention is resolved to `false`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rulekit::Predicate;
    ///
    /// struct User { name: &'static str }
    /// struct Doc { owner: &'static str }
    ///
    /// let is_owner = Predicate::on_pair(|user: &User, doc: &Doc| user.name == doc.owner)
    ///     .named("is_owner");
    ///
    /// let alice = User { name: "alice" };
    /// let doc = Doc { owner: "alice" };
    /// assert!(is_owner.test((&alice, &doc)));
    /// assert!(!is_owner.test((&alice,)));
    /// ```
    pub fn test<'a>(&self, args: impl Into<Args<'a>>) -> bool {
        self.evaluate(args).is_true()
    }

    /// Apply within an already active context, without opening a new one
    pub fn apply(&self, ctx: &Context<'_>) -> Verdict {
        match self.node.as_ref() {
            Node::Leaf { signature, call } => {
                let args = signature.select(ctx.args());
                call(ctx, args.as_slice())
            }
            Node::And(lhs, rhs) => match lhs.apply(ctx) {
                Verdict::Abstain => rhs.apply(ctx),
                Verdict::False => Verdict::False,
                Verdict::True => match rhs.apply(ctx) {
                    Verdict::Abstain => Verdict::True,
                    verdict => verdict,
                },
            },
            Node::Or(lhs, rhs) => match lhs.apply(ctx) {
                Verdict::Abstain => rhs.apply(ctx),
                Verdict::True => Verdict::True,
                Verdict::False => match rhs.apply(ctx) {
                    Verdict::Abstain => Verdict::False,
                    verdict => verdict,
                },
            },
            Node::Xor(lhs, rhs) => match (lhs.apply(ctx), rhs.apply(ctx)) {
                (Verdict::Abstain, verdict) | (verdict, Verdict::Abstain) => verdict,
                (a, b) => Verdict::from(a != b),
            },
            Node::Invert(inner) => inner.apply(ctx).invert(),
        }
    }
}

/// Declared name of `F`, or `<closure>` for anonymous closures
///
/// Generic arguments and qualified-path brackets (`<Type as Trait>`) are
/// dropped before taking the last path segment.
fn derive_name<F>() -> String {
    let full = type_name::<F>();
    if full.contains("{{closure}}") {
        return "<closure>".to_string();
    }
    if full.starts_with("fn(") {
        return "<fn>".to_string();
    }

    let mut depth = 0usize;
    let mut path = String::with_capacity(full.len());
    for ch in full.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => path.push(ch),
            _ => {}
        }
    }
    path.rsplit("::").next().unwrap_or_default().to_string()
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Predicate:{}>", self.name)
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Predicate) -> Predicate {
        self.and(&rhs)
    }
}

impl BitAnd for &Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: &Predicate) -> Predicate {
        self.and(rhs)
    }
}

impl BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Predicate) -> Predicate {
        self.or(&rhs)
    }
}

impl BitOr for &Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: &Predicate) -> Predicate {
        self.or(rhs)
    }
}

impl BitXor for Predicate {
    type Output = Predicate;

    fn bitxor(self, rhs: Predicate) -> Predicate {
        self.xor(&rhs)
    }
}

impl BitXor for &Predicate {
    type Output = Predicate;

    fn bitxor(self, rhs: &Predicate) -> Predicate {
        self.xor(rhs)
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        self.invert()
    }
}

impl Not for &Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        self.invert()
    }
}
