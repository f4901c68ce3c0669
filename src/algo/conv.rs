//! Converters.
//!
//! A converter is a function taking a term `e`, and returning an
//! `Option<Thm>`. It returns `Some(… |- e = e2)` if `e` can be converted
//! into `e2`, `None` otherwise. Returning `None` instead of an error for
//! "no progress" lets traversals skip rebuilding unchanged subterms;
//! [`Converter::conv`] closes the result with `refl` when a theorem is
//! unconditionally needed.
//!
//! The contract every converter and combinator preserves: when
//! `try_conv(ctx, e)` returns `Some(th)`, the conclusion of `th` is an
//! equation whose left side is alpha-equivalent to `e`.

use crate::kernel::{alpha_eq, alpha_hash, term::Vars, Ctx, Subst, Term, TermView, Thm};
use crate::{
    error::{Error, Result},
    fnv,
};
use std::{cell::RefCell, fmt};

/// `converter.try_conv(ctx, e)` is called on a term `e` and can trigger
/// a rewrite step.
///
/// If it returns `Some(A |- e=e2)`, then the term rewrites into `e2`
/// with the given proof.
pub trait Converter: fmt::Debug {
    /// The core function.
    fn try_conv(&self, _: &mut Ctx, e: &Term) -> Result<Option<Thm>>;

    /// Unconditionally produce a theorem, using `refl` to produce
    /// `|- e = e` if nothing else is found.
    fn conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Thm> {
        let th = self.try_conv(ctx, e)?;
        Ok(get_or_refl(ctx, e, th))
    }
}

impl<'a, T: Converter + ?Sized> Converter for &'a T {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        (**self).try_conv(ctx, e)
    }
}

/// Normalize the conclusion of `th` using the given converter.
pub fn thm_conv_concl(ctx: &mut Ctx, th: Thm, conv: &dyn Converter) -> Result<Thm> {
    let c = th.concl().clone();
    if let Some(th2) = conv.try_conv(ctx, &c)? {
        let th3 = ctx.thm_bool_eq(th, th2)?;
        Ok(th3)
    } else {
        Ok(th)
    }
}

/// Given `th` of the form `A |- l = r`, rewrite `r` with `conv` and
/// return `A |- l = r'`.
pub fn conv_rhs(ctx: &mut Ctx, conv: &dyn Converter, th: Thm) -> Result<Thm> {
    let (_, r) = th
        .concl()
        .unfold_eq()
        .ok_or_else(|| Error::new("conv_rhs: expected an equation"))?;
    let r = r.clone();
    match conv.try_conv(ctx, &r)? {
        None => Ok(th),
        Some(th2) => ctx.thm_trans(th, th2),
    }
}

/// Return the theorem `th`, or `refl e` if `th.is_none()`.
fn get_or_refl(ctx: &mut Ctx, e: &Term, th: Option<Thm>) -> Thm {
    match th {
        Some(th) => th,
        None => ctx.thm_refl(e.clone()),
    }
}

/// The right-hand side of the (equational) conclusion of `th`.
fn rhs_of(th: &Thm) -> Result<Term> {
    let (_, b) = th
        .concl()
        .unfold_eq()
        .ok_or_else(|| Error::new("converter yielded a non-equational theorem"))?;
    Ok(b.clone())
}

/// Chain `res1` and `res2` into a single theorem, or `None` if both are none.
fn chain_res(ctx: &mut Ctx, res1: Option<Thm>, res2: Option<Thm>) -> Result<Option<Thm>> {
    if let Some(th1) = res1 {
        if let Some(th2) = res2 {
            // transitivity here
            ctx.thm_trans(th1, th2).map(Some)
        } else {
            Ok(Some(th1))
        }
    } else {
        Ok(res2)
    }
}

/// The identity converter: never changes anything.
///
/// `try_conv` returns `None`; `conv` therefore returns `refl`.
#[derive(Clone, Copy, Debug)]
pub struct AllConv;

impl Converter for AllConv {
    fn try_conv(&self, _: &mut Ctx, _: &Term) -> Result<Option<Thm>> {
        Ok(None)
    }
}

/// The converter that applies to nothing.
#[derive(Clone, Copy, Debug)]
pub struct NoConv;

impl Converter for NoConv {
    fn try_conv(&self, _: &mut Ctx, _: &Term) -> Result<Option<Thm>> {
        Err(Error::no_apply("no_conv"))
    }
}

/// Apply beta-reduction at root.
#[derive(Clone, Copy, Debug)]
pub struct BetaConv;

impl Converter for BetaConv {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        Ok(ctx.thm_beta_conv(e).ok())
    }
}

/// Reduce the application spine of a term until its head is no longer a
/// beta-redex (weak head normalization). Does not look inside the
/// arguments or under the final head.
#[derive(Clone, Copy, Debug)]
pub struct BetaWhnfConv;

impl Converter for BetaWhnfConv {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        let mut e = e.clone();
        let mut r = None;
        loop {
            match whnf_step_(ctx, &e)? {
                None => break,
                Some(th) => {
                    e = rhs_of(&th)?;
                    r = chain_res(ctx, r, Some(th))?;
                }
            }
        }
        Ok(r)
    }
}

/// Like [`BetaWhnfConv`], but performs at most `n` head steps. Used by
/// derived rules that know exactly how many reductions a definitional
/// unfolding takes, so user subterms are never reduced by accident.
#[derive(Clone, Copy, Debug)]
pub struct BetaWhnfConvN(pub usize);

impl Converter for BetaWhnfConvN {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        let mut e = e.clone();
        let mut r = None;
        for _ in 0..self.0 {
            match whnf_step_(ctx, &e)? {
                None => break,
                Some(th) => {
                    e = rhs_of(&th)?;
                    r = chain_res(ctx, r, Some(th))?;
                }
            }
        }
        Ok(r)
    }
}

// One leftmost-outermost beta step on the application spine.
fn whnf_step_(ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
    match e.view() {
        TermView::EApp(f, a) => {
            if f.as_lambda().is_some() {
                Ok(Some(ctx.thm_beta_conv(e)?))
            } else {
                match whnf_step_(ctx, f)? {
                    None => Ok(None),
                    Some(th_f) => {
                        let th_a = ctx.thm_refl(a.clone());
                        Ok(Some(ctx.thm_congr(th_f, th_a)?))
                    }
                }
            }
        }
        _ => Ok(None),
    }
}

/// Sequence: apply the first converter, then the second on its result.
#[derive(Clone, Copy, Debug)]
pub struct SeqConv<A, B>(pub A, pub B);

impl<A: Converter, B: Converter> Converter for SeqConv<A, B> {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        let r1 = self.0.try_conv(ctx, e)?;
        let e2 = match &r1 {
            Some(th) => rhs_of(th)?,
            None => e.clone(),
        };
        let r2 = self.1.try_conv(ctx, &e2)?;
        chain_res(ctx, r1, r2)
    }
}

/// Try the first converter; if it does not apply, try the second.
#[derive(Clone, Copy, Debug)]
pub struct OrElseConv<A, B>(pub A, pub B);

impl<A: Converter, B: Converter> Converter for OrElseConv<A, B> {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        match self.0.try_conv(ctx, e) {
            Ok(Some(th)) => Ok(Some(th)),
            Ok(None) => self.1.try_conv(ctx, e),
            Err(err) if err.is_recoverable() => self.1.try_conv(ctx, e),
            Err(err) => Err(err),
        }
    }
}

/// Turn a converter's recoverable failure into "no change".
#[derive(Clone, Copy, Debug)]
pub struct TryConv<C>(pub C);

impl<C: Converter> Converter for TryConv<C> {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        match self.0.try_conv(ctx, e) {
            Ok(r) => Ok(r),
            Err(err) if err.is_recoverable() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Apply the converter until it no longer applies. Never fails; reduces
/// to the identity if the inner converter never applies.
///
/// A step whose two sides are alpha-equivalent counts as "no longer
/// applies", so a `refl`-like inner converter cannot loop it.
#[derive(Clone, Copy, Debug)]
pub struct RepeatConv<C>(pub C);

impl<C: Converter> Converter for RepeatConv<C> {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        let mut e = e.clone();
        let mut r = None;
        loop {
            let step = match self.0.try_conv(ctx, &e) {
                Ok(s) => s,
                Err(err) if err.is_recoverable() => None,
                Err(err) => return Err(err),
            };
            match step {
                None => break,
                Some(th) => {
                    let e2 = rhs_of(&th)?;
                    if alpha_eq(&e, &e2) {
                        break; // no progress
                    }
                    e = e2;
                    r = chain_res(ctx, r, Some(th))?;
                }
            }
        }
        Ok(r)
    }
}

/// Fail (with "no change") unless the inner conversion made actual
/// progress, i.e. produced an equation whose sides are not
/// alpha-equivalent.
#[derive(Clone, Copy, Debug)]
pub struct ChangedConv<C>(pub C);

impl<C: Converter> Converter for ChangedConv<C> {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        match self.0.try_conv(ctx, e)? {
            None => Ok(None),
            Some(th) => {
                let (a, b) = th
                    .concl()
                    .unfold_eq()
                    .ok_or_else(|| Error::new("converter yielded a non-equational theorem"))?;
                if alpha_eq(a, b) {
                    Ok(None)
                } else {
                    Ok(Some(th))
                }
            }
        }
    }
}

/// Apply the converter to the function part of an application.
#[derive(Clone, Copy, Debug)]
pub struct RatorConv<C>(pub C);

impl<C: Converter> Converter for RatorConv<C> {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        let (f, a) = e
            .as_app()
            .ok_or_else(|| Error::no_apply("rator_conv: not an application"))?;
        match self.0.try_conv(ctx, f)? {
            None => Ok(None),
            Some(th) => {
                let th_a = ctx.thm_refl(a.clone());
                Ok(Some(ctx.thm_congr(th, th_a)?))
            }
        }
    }
}

/// Apply the converter to the argument part of an application.
#[derive(Clone, Copy, Debug)]
pub struct RandConv<C>(pub C);

impl<C: Converter> Converter for RandConv<C> {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        let (f, a) = e
            .as_app()
            .ok_or_else(|| Error::no_apply("rand_conv: not an application"))?;
        match self.0.try_conv(ctx, a)? {
            None => Ok(None),
            Some(th) => {
                let th_f = ctx.thm_refl(f.clone());
                Ok(Some(ctx.thm_congr(th_f, th)?))
            }
        }
    }
}

/// Apply the converter to both operands of a binary operator
/// `(op a) b`, leaving `op` alone.
#[derive(Clone, Copy, Debug)]
pub struct BinopConv<C>(pub C);

impl<C: Converter> Converter for BinopConv<C> {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        let (fa, b) = e
            .as_app()
            .ok_or_else(|| Error::no_apply("binop_conv: not a binary application"))?;
        let (op, a) = fa
            .as_app()
            .ok_or_else(|| Error::no_apply("binop_conv: not a binary application"))?;
        let ra = self.0.try_conv(ctx, a)?;
        let rb = self.0.try_conv(ctx, b)?;
        if ra.is_none() && rb.is_none() {
            return Ok(None);
        }
        let th_a = get_or_refl(ctx, a, ra);
        let th_b = get_or_refl(ctx, b, rb);
        let th_op = ctx.thm_refl(op.clone());
        let th_fa = ctx.thm_congr(th_op, th_a)?;
        Ok(Some(ctx.thm_congr(th_fa, th_b)?))
    }
}

/// Apply the converter under a lambda binder.
///
/// If the direct `abs` application is blocked (the bound variable is
/// free in a hypothesis of the inner result), the bound variable is
/// generalized to a fresh variant first and the lambda realigned by an
/// alpha step.
#[derive(Clone, Copy, Debug)]
pub struct AbsConv<C>(pub C);

impl<C: Converter> Converter for AbsConv<C> {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        abs_conv_dyn(ctx, &self.0, e)
    }
}

fn abs_conv_dyn(ctx: &mut Ctx, c: &dyn Converter, e: &Term) -> Result<Option<Thm>> {
    let (v, body) = match e.as_lambda() {
        Some(x) => x,
        None => return Err(Error::no_apply("abs_conv: not a lambda")),
    };
    let th_b = match c.try_conv(ctx, body)? {
        None => return Ok(None),
        Some(th) => th,
    };
    match ctx.thm_abs(v, th_b.clone()) {
        Ok(th) => Ok(Some(th)),
        Err(_) => {
            // `v` is free in a hypothesis: generalize the binder first
            let mut avoid: Vars = body.free_vars();
            for h in th_b.hyps() {
                for w in h.free_vars() {
                    if !avoid.contains(&w) {
                        avoid.push(w)
                    }
                }
            }
            let v2 = ctx.variant(&avoid, v);
            let mut ren = Subst::new();
            ren.add_binding(v.clone(), ctx.mk_var(v2.clone()));
            let body_r = ctx.subst(body, &ren)?;
            let th_b2 = match c.try_conv(ctx, &body_r)? {
                None => return Ok(None),
                Some(th) => th,
            };
            let th_abs = ctx.thm_abs(&v2, th_b2)?;
            // realign the left side with the original binder name
            let lam_r = ctx.mk_lambda(v2, body_r)?;
            let th_e = ctx.thm_refl(e.clone());
            let th_l = ctx.thm_refl(lam_r);
            let alpha = ctx.thm_trans(th_e, th_l)?;
            Ok(Some(ctx.thm_trans(alpha, th_abs)?))
        }
    }
}

/// Apply the converter to the immediate subterms, once each.
#[derive(Clone, Copy, Debug)]
pub struct SubConv<C>(pub C);

impl<C: Converter> Converter for SubConv<C> {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        sub_conv_dyn(ctx, &self.0, e)
    }
}

fn sub_conv_dyn(ctx: &mut Ctx, c: &dyn Converter, e: &Term) -> Result<Option<Thm>> {
    match e.view() {
        TermView::EApp(f, a) => {
            let rf = c.try_conv(ctx, f)?;
            let ra = c.try_conv(ctx, a)?;
            if rf.is_none() && ra.is_none() {
                return Ok(None);
            }
            let th_f = get_or_refl(ctx, f, rf);
            let th_a = get_or_refl(ctx, a, ra);
            Ok(Some(ctx.thm_congr(th_f, th_a)?))
        }
        TermView::ELambda(..) => abs_conv_dyn(ctx, c, e),
        _ => Ok(None),
    }
}

macro_rules! depth_struct {
    ($(#[$m:meta])* $name: ident, $f: ident) => {
        $(#[$m])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<C>(pub C);

        impl<C: Converter> Converter for $name<C> {
            fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
                $f(ctx, &self.0, e)
            }
        }
    };
}

depth_struct! {
    /// Apply the converter to the topmost applicable subterms, without
    /// retraversing anything it changed.
    OnceDepthConv, once_depth_
}
depth_struct! {
    /// Bottom-up traversal; at each node the converter is repeated until
    /// it no longer applies, but changed subterms are not retraversed.
    DepthConv, depth_
}
depth_struct! {
    /// Bottom-up traversal that retraverses a subterm after it changes,
    /// until a fixpoint. Diverges on rule sets that loop.
    RedepthConv, redepth_
}
depth_struct! {
    /// Top-down traversal that retraverses after changes, until a
    /// fixpoint. Diverges on rule sets that loop.
    TopDepthConv, top_depth_
}
depth_struct! {
    /// Top-down single sweep: repeat at the node, then recurse into the
    /// result's subterms, without coming back up.
    TopSweepConv, top_sweep_
}

fn once_depth_(ctx: &mut Ctx, c: &dyn Converter, e: &Term) -> Result<Option<Thm>> {
    match c.try_conv(ctx, e) {
        Ok(Some(th)) => return Ok(Some(th)),
        Ok(None) => (),
        Err(err) if err.is_recoverable() => (),
        Err(err) => return Err(err),
    }
    sub_conv_dyn(ctx, &OnceDepthDyn(c), e)
}

// dyn-friendly wrappers so the recursive traversals can be passed
// through `sub_conv_dyn` without monomorphizing on themselves
#[derive(Clone, Copy)]
struct OnceDepthDyn<'a>(&'a dyn Converter);
#[derive(Clone, Copy)]
struct DepthDyn<'a>(&'a dyn Converter);
#[derive(Clone, Copy)]
struct RedepthDyn<'a>(&'a dyn Converter);
#[derive(Clone, Copy)]
struct TopDepthDyn<'a>(&'a dyn Converter);
#[derive(Clone, Copy)]
struct TopSweepDyn<'a>(&'a dyn Converter);

macro_rules! dyn_impls {
    ($name: ident, $f: ident) => {
        impl<'a> fmt::Debug for $name<'a> {
            fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
                write!(out, concat!(stringify!($name), "({:?})"), self.0)
            }
        }
        impl<'a> Converter for $name<'a> {
            fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
                $f(ctx, self.0, e)
            }
        }
    };
}
dyn_impls!(OnceDepthDyn, once_depth_);
dyn_impls!(DepthDyn, depth_);
dyn_impls!(RedepthDyn, redepth_);
dyn_impls!(TopDepthDyn, top_depth_);
dyn_impls!(TopSweepDyn, top_sweep_);

// repeat `c` at the root of `e`, starting from an already-chained result
fn repeat_at_root_(
    ctx: &mut Ctx,
    c: &dyn Converter,
    e: &Term,
    mut r: Option<Thm>,
) -> Result<(Option<Thm>, Term)> {
    let mut e = e.clone();
    loop {
        let step = match c.try_conv(ctx, &e) {
            Ok(s) => s,
            Err(err) if err.is_recoverable() => None,
            Err(err) => return Err(err),
        };
        match step {
            None => break,
            Some(th) => {
                let e2 = rhs_of(&th)?;
                if alpha_eq(&e, &e2) {
                    break;
                }
                e = e2;
                r = chain_res(ctx, r, Some(th))?;
            }
        }
    }
    Ok((r, e))
}

fn depth_(ctx: &mut Ctx, c: &dyn Converter, e: &Term) -> Result<Option<Thm>> {
    let r1 = sub_conv_dyn(ctx, &DepthDyn(c), e)?;
    let e2 = match &r1 {
        Some(th) => rhs_of(th)?,
        None => e.clone(),
    };
    let (r, _) = repeat_at_root_(ctx, c, &e2, r1)?;
    Ok(r)
}

fn redepth_(ctx: &mut Ctx, c: &dyn Converter, e: &Term) -> Result<Option<Thm>> {
    let r1 = sub_conv_dyn(ctx, &RedepthDyn(c), e)?;
    let e2 = match &r1 {
        Some(th) => rhs_of(th)?,
        None => e.clone(),
    };
    // try the converter at the root; if it applies, retraverse the result
    match c.try_conv(ctx, &e2) {
        Ok(Some(th)) => {
            let e3 = rhs_of(&th)?;
            if alpha_eq(&e2, &e3) {
                return chain_res(ctx, r1, Some(th));
            }
            let r2 = chain_res(ctx, r1, Some(th))?;
            let r3 = redepth_(ctx, c, &e3)?;
            chain_res(ctx, r2, r3)
        }
        Ok(None) => Ok(r1),
        Err(err) if err.is_recoverable() => Ok(r1),
        Err(err) => Err(err),
    }
}

fn top_depth_(ctx: &mut Ctx, c: &dyn Converter, e: &Term) -> Result<Option<Thm>> {
    let (r1, e2) = repeat_at_root_(ctx, c, e, None)?;
    // descend; if anything below changed, give the root another chance
    match sub_conv_dyn(ctx, &TopDepthDyn(c), &e2)? {
        None => Ok(r1),
        Some(th_sub) => {
            let e3 = rhs_of(&th_sub)?;
            let changed = !alpha_eq(&e2, &e3);
            let r2 = chain_res(ctx, r1, Some(th_sub))?;
            if !changed {
                return Ok(r2);
            }
            match c.try_conv(ctx, &e3) {
                Ok(Some(th)) => {
                    let e4 = rhs_of(&th)?;
                    if alpha_eq(&e3, &e4) {
                        return chain_res(ctx, r2, Some(th));
                    }
                    let r3 = chain_res(ctx, r2, Some(th))?;
                    let r4 = top_depth_(ctx, c, &e4)?;
                    chain_res(ctx, r3, r4)
                }
                Ok(None) => Ok(r2),
                Err(err) if err.is_recoverable() => Ok(r2),
                Err(err) => Err(err),
            }
        }
    }
}

fn top_sweep_(ctx: &mut Ctx, c: &dyn Converter, e: &Term) -> Result<Option<Thm>> {
    let (r1, e2) = repeat_at_root_(ctx, c, e, None)?;
    let r2 = sub_conv_dyn(ctx, &TopSweepDyn(c), &e2)?;
    chain_res(ctx, r1, r2)
}

/// Memoizing wrapper around a converter.
///
/// Results are keyed by alpha-equivalence; a hit on a syntactically
/// different but alpha-equivalent query is realigned with an alpha step
/// (`trans` of two `refl`s). The cache is interior-mutable and
/// single-session; it must not be shared across threads (it is not
/// `Sync`) nor across unrelated contexts.
pub struct CacheConv<C> {
    c: C,
    cache: RefCell<fnv::FnvHashMap<AlphaKey, Option<Thm>>>,
}

struct AlphaKey(Term);

impl std::hash::Hash for AlphaKey {
    fn hash<H: std::hash::Hasher>(&self, h: &mut H) {
        alpha_hash(&self.0, h)
    }
}
impl PartialEq for AlphaKey {
    fn eq(&self, other: &Self) -> bool {
        alpha_eq(&self.0, &other.0)
    }
}
impl Eq for AlphaKey {}

impl<C> CacheConv<C> {
    pub fn new(c: C) -> Self {
        CacheConv {
            c,
            cache: RefCell::new(fnv::new_table_with_cap(64)),
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

impl<C: fmt::Debug> fmt::Debug for CacheConv<C> {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        write!(out, "CacheConv({:?})", self.c)
    }
}

impl<C: Converter> Converter for CacheConv<C> {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        let hit = self.cache.borrow().get(&AlphaKey(e.clone())).cloned();
        if let Some(r) = hit {
            return match r {
                None => Ok(None),
                Some(th) => {
                    let (l, _) = th
                        .concl()
                        .unfold_eq()
                        .ok_or_else(|| Error::new("cache_conv: cached non-equation"))?;
                    if l == e {
                        Ok(Some(th.clone()))
                    } else {
                        // alpha-rename the cached answer to the query
                        let th_e = ctx.thm_refl(e.clone());
                        let th_l = ctx.thm_refl(l.clone());
                        let alpha = ctx.thm_trans(th_e, th_l)?;
                        Ok(Some(ctx.thm_trans(alpha, th)?))
                    }
                }
            };
        }
        let r = self.c.try_conv(ctx, e)?;
        self.cache
            .borrow_mut()
            .insert(AlphaKey(e.clone()), r.clone());
        Ok(r)
    }
}

/// An equation seen as a left-to-right rewrite rule.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    /// the LHS of the theorem's conclusion.
    lhs: Term,
    /// A theorem `|- lhs = rhs`
    th: Thm,
}

impl Converter for RewriteRule {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        crate::logtrace!("rw-rule.try-conv {:?} with rule {:?}", e, self);
        match super::unif::term_match(&self.lhs, e) {
            None => Ok(None),
            Some(m) => {
                // match happened, instantiate to get an equality.
                let th = m.apply(ctx, &self.th)?;
                Ok(Some(th))
            }
        }
    }
}

impl RewriteRule {
    /// Create a rewrite rule from a theorem `|- lhs = rhs`.
    ///
    /// Will fail if the theorem is not an equation, or if some free
    /// (term or type) variables of `rhs` are not in `lhs`, or if the
    /// theorem has assumptions.
    pub fn new(th: &Thm) -> Result<Self> {
        let (lhs, rhs) = th
            .concl()
            .unfold_eq()
            .ok_or_else(|| Error::new("rewrite rule conclusion must be an equation"))?;
        if !th.hyps().is_empty() {
            return Err(Error::new("rewrite rule must have no hypothesis"));
        }
        let vl = lhs.free_vars();
        for v in rhs.free_vars() {
            if !vl.contains(&v) {
                return Err(crate::errorstr!(
                    "variable {:?} occurs freely in RHS of rule but not LHS",
                    v
                ));
            }
        }
        let tvl = lhs.ty_vars();
        for tv in rhs.ty_vars() {
            if !tvl.contains(&tv) {
                return Err(crate::errorstr!(
                    "type variable {} occurs in RHS of rule but not LHS",
                    tv
                ));
            }
        }
        Ok(Self {
            lhs: lhs.clone(),
            th: th.clone(),
        })
    }
}

/// A set of rewrite rules.
///
/// Implementation details are hidden, but this implements `Converter`.
#[derive(Debug, Clone)]
pub struct RewriteRuleSet {
    // TODO(perf): index rules by head symbol
    rules: Vec<RewriteRule>,
}

impl Converter for RewriteRuleSet {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        for r in &self.rules {
            if let Some(th) = r.try_conv(ctx, e)? {
                return Ok(Some(th));
            }
        }
        Ok(None)
    }
}

impl RewriteRuleSet {
    /// New rule set.
    pub fn new() -> Self {
        Self { rules: vec![] }
    }

    /// Add a single rule.
    pub fn add_rule(&mut self, r: RewriteRule) {
        self.rules.push(r)
    }

    /// Add a set of rules.
    pub fn add_rules<I>(&mut self, i: I)
    where
        I: Iterator<Item = RewriteRule>,
    {
        for r in i {
            self.rules.push(r)
        }
    }

    /// Is the set of rules empty?
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of rules in the set.
    pub fn size(&self) -> usize {
        self.rules.len()
    }
}

impl Default for RewriteRuleSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::iter::FromIterator<RewriteRule> for RewriteRuleSet {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = RewriteRule>,
    {
        let mut s = Self::new();
        s.add_rules(iter.into_iter());
        s
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kernel::{Type, Var};

    fn setup() -> (Ctx, Type) {
        let ctx = Ctx::new();
        let b = ctx.mk_bool();
        (ctx, b)
    }

    // `(\x. x) ((\y. y) a)`: two nested redexes
    fn nested_redex(ctx: &Ctx, b: &Type) -> (Term, Term) {
        let a = ctx.mk_var_str("a", b.clone());
        let mk_id = |n: &str| {
            let v = Var::from_str(n, b.clone());
            let e = ctx.mk_var(v.clone());
            ctx.mk_lambda(v, e).unwrap()
        };
        let inner = ctx.mk_app(mk_id("y"), a.clone()).unwrap();
        let e = ctx.mk_app(mk_id("x"), inner).unwrap();
        (e, a)
    }

    #[test]
    fn test_beta_conv_lhs_alpha() {
        let (mut ctx, b) = setup();
        let (e, _) = nested_redex(&ctx, &b);
        let th = BetaConv.try_conv(&mut ctx, &e).unwrap().unwrap();
        let (l, _) = th.concl().unfold_eq().unwrap();
        assert!(alpha_eq(l, &e));
    }

    #[test]
    fn test_redepth_normalizes() {
        let (mut ctx, b) = setup();
        let (e, a) = nested_redex(&ctx, &b);
        let th = RedepthConv(BetaConv).try_conv(&mut ctx, &e).unwrap().unwrap();
        let (l, r) = th.concl().unfold_eq().unwrap();
        assert!(alpha_eq(l, &e));
        assert_eq!(r, &a);
    }

    #[test]
    fn test_top_depth_normalizes() {
        let (mut ctx, b) = setup();
        let (e, a) = nested_redex(&ctx, &b);
        let th = TopDepthConv(BetaConv).try_conv(&mut ctx, &e).unwrap().unwrap();
        let (_, r) = th.concl().unfold_eq().unwrap();
        assert_eq!(r, &a);
    }

    #[test]
    fn test_once_depth_single_layer() {
        let (mut ctx, b) = setup();
        let (e, a) = nested_redex(&ctx, &b);
        // once-depth reduces the topmost redex only: the inner redex
        // (which sits under the outer one's argument) is reduced by the
        // substitution position, not retraversed
        let th = OnceDepthConv(BetaConv).try_conv(&mut ctx, &e).unwrap().unwrap();
        let (_, r) = th.concl().unfold_eq().unwrap();
        // the result is `(\y. y) a`, still one redex away from `a`
        assert!(r.as_app().is_some());
        let th2 = OnceDepthConv(BetaConv).try_conv(&mut ctx, r).unwrap().unwrap();
        let (_, r2) = th2.concl().unfold_eq().unwrap();
        assert_eq!(r2, &a);
    }

    #[test]
    fn test_repeat_conv_idempotent() {
        let (mut ctx, b) = setup();
        let (e, a) = nested_redex(&ctx, &b);
        let c = RepeatConv(OnceDepthConv(BetaConv));
        let th = c.try_conv(&mut ctx, &e).unwrap().unwrap();
        let (_, r) = th.concl().unfold_eq().unwrap();
        assert_eq!(r, &a);
        // applying again to the normal form makes no further change
        assert!(c.try_conv(&mut ctx, r).unwrap().is_none());
    }

    #[test]
    fn test_changed_conv() {
        let (mut ctx, b) = setup();
        let a = ctx.mk_var_str("a", b.clone());
        assert!(ChangedConv(AllConv).try_conv(&mut ctx, &a).unwrap().is_none());
    }

    #[test]
    fn test_orelse_no_conv() {
        let (mut ctx, b) = setup();
        let (e, _) = nested_redex(&ctx, &b);
        let th = OrElseConv(NoConv, BetaConv).try_conv(&mut ctx, &e).unwrap();
        assert!(th.is_some());
    }

    #[test]
    fn test_whnf_stops_at_head() {
        let (mut ctx, b) = setup();
        // `(\f. f a) (\x. x)` -> `(\x. x) a` -> `a`
        let a = ctx.mk_var_str("a", b.clone());
        let id = {
            let v = Var::from_str("x", b.clone());
            let e = ctx.mk_var(v.clone());
            ctx.mk_lambda(v, e).unwrap()
        };
        let f = Var::from_str("f", ctx.mk_arrow(b.clone(), b.clone()));
        let body = {
            let ef = ctx.mk_var(f.clone());
            ctx.mk_app(ef, a.clone()).unwrap()
        };
        let lam = ctx.mk_lambda(f, body).unwrap();
        let e = ctx.mk_app(lam, id).unwrap();
        let th = BetaWhnfConv.try_conv(&mut ctx, &e).unwrap().unwrap();
        let (_, r) = th.concl().unfold_eq().unwrap();
        assert_eq!(r, &a);
    }

    #[test]
    fn test_cache_conv_alpha_hit() {
        let (mut ctx, b) = setup();
        let mk_redex = |n: &str| {
            let v = Var::from_str(n, b.clone());
            let e = ctx.mk_var(v.clone());
            let id = ctx.mk_lambda(v, e).unwrap();
            let a = ctx.mk_var_str("a", b.clone());
            ctx.mk_app(id, a).unwrap()
        };
        let e1 = mk_redex("x");
        let e2 = mk_redex("y");
        let c = CacheConv::new(BetaConv);
        let th1 = c.try_conv(&mut ctx, &e1).unwrap().unwrap();
        assert_eq!(c.len(), 1);
        let th2 = c.try_conv(&mut ctx, &e2).unwrap().unwrap();
        // still a single entry: the second query hit the cache
        assert_eq!(c.len(), 1);
        let (l1, r1) = th1.concl().unfold_eq().unwrap();
        let (l2, r2) = th2.concl().unfold_eq().unwrap();
        assert_eq!(l1, &e1);
        // the cached answer was realigned to the new query
        assert_eq!(l2, &e2);
        assert_eq!(r1, r2);
    }
}
