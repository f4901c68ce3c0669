//! Recursion admissibility analysis.
//!
//! Given a proposed clausal recursive definition `f p_i = rhs_i`, this
//! module decides whether the recursion pattern is one it recognizes
//! (structural recursion over a registered datatype, tail recursion, or
//! well-founded recursion along a declared order) and, when it is,
//! synthesizes an existence theorem `?f. /\_i !vars. f p_i = rhs_i` by
//! instantiating a registered proforma theorem and normalizing with
//! beta conversion.
//!
//! The classifier is deliberately incomplete: shapes it does not
//! recognize fail with a `NotAdmissible` error, never with a wrong
//! theorem. Every success path is an ordinary composition of kernel
//! calls from the proforma and the registered datatype facts.

use super::conv::{self, BetaWhnfConvN, Converter, TopDepthConv, TopSweepConv};
use super::unif::{apply_unifier, term_match, unify_terms};
use crate::error::{Error, Result};
use crate::kernel::{alpha_eq, Ctx, Subst, Symbol, Term, TermView, Thm, Var, Vars};
use crate::logic::{self, Logic};

/// Facts about one datatype, registered by the caller (ordinarily
/// produced by a datatype package; here they may come from named
/// axioms, auditable through `Ctx::axioms`).
#[derive(Debug, Clone)]
pub struct DatatypeFacts {
    /// Name of the type constructor.
    pub ty_name: Symbol,
    /// The constructors, as constant terms.
    pub constructors: Vec<Term>,
    /// `|- !… ~(C1 … = C2 …)` for distinct constructors.
    pub distinctness: Vec<Thm>,
    /// `|- !… (C x… = C y…) = (x = y /\ …)` per constructor.
    pub injectivity: Vec<Thm>,
    /// The primitive-recursion existence theorem, of the shape
    /// `!z1 … zk. ?fn. /\_i !vars_i. fn (Ci vars_i) = z_i (fn v) … v …`.
    pub recursion: Thm,
}

/// The analyzer's environment: datatype facts, "strictly smaller"
/// lemmas for declared orders, and the generic recursion proformas.
#[derive(Debug, Clone, Default)]
pub struct RecEnv {
    pub datatypes: Vec<DatatypeFacts>,
    /// Lemmas of the form `|- !… r ≺ x` used to discharge termination
    /// side conditions.
    pub smaller: Vec<Thm>,
    /// `|- !R. WF R ==> !H. (!f g x. (!z. R z x ==> f z = g z) ==>
    /// H f x = H g x) ==> ?fn. !x. fn x = H fn x`.
    pub wf_rec: Option<Thm>,
    /// `|- !P G H. ?f. !x. f x = COND (P x) (f (G x)) (H x)`.
    pub wf_rec_tail: Option<Thm>,
    /// Name of the conditional constant (`COND` by convention).
    pub cond_name: Option<Symbol>,
    /// Bounded-sum aggregation operators.
    pub sum_ops: Vec<Symbol>,
    /// List-map style operators.
    pub map_ops: Vec<Symbol>,
    /// Case-dispatch operators.
    pub case_ops: Vec<Symbol>,
}

/// A proposed definition: the function variable, the clause list
/// `(lhs, rhs)` with `lhs = f p1 … pk`, and optionally a well-founded
/// order with its `WF` theorem.
#[derive(Debug, Clone)]
pub struct ClauseSpec {
    pub f: Var,
    pub clauses: Vec<(Term, Term)>,
    pub order: Option<Term>,
    pub wf_thm: Option<Thm>,
}

/// The recognized shape of one clause body. One recognizer per
/// variant; anything else is not (yet) admissible.
#[derive(Debug, Clone)]
pub enum Shape {
    /// No recursive call.
    Base,
    /// Exactly `f arg`, in tail position.
    TailCall { arg: Term },
    /// `COND c a b` with a recursion-free condition.
    Cond {
        cond: Term,
        then: Box<Shape>,
        els: Box<Shape>,
    },
    /// A registered case-dispatch operator applied to branches.
    CaseSplit { branches: Vec<Shape> },
    /// A registered bounded-sum operator over a lambda body.
    BoundedSum { body: Box<Shape> },
    /// A registered list-map operator over a lambda body.
    ListMap { body: Box<Shape> },
    /// A recursion-free head applied to classified arguments.
    Compose { args: Vec<Shape> },
}

/// A successful justification: the existence theorem, the recognized
/// shapes, and any side conditions that were left to the caller.
#[derive(Debug, Clone)]
pub struct RecJustification {
    pub thm: Thm,
    pub shapes: Vec<Shape>,
    pub obligations: Vec<Term>,
}

// ---- classifier ----

fn is_const_named(t: &Term, name: &Symbol) -> bool {
    matches!(t.as_const(), Some((s, _)) if s == name)
}

/// Classify the clause body `t` with respect to the recursive function
/// variable `f`. Sound and incomplete: unknown shapes are errors.
pub fn classify(env: &RecEnv, f: &Var, t: &Term) -> Result<Shape> {
    if !t.var_free_in(f) {
        return Ok(Shape::Base);
    }
    if let Some(v) = t.as_var() {
        debug_assert!(v == f);
        return Err(Error::not_admissible(
            "bare (unapplied) recursive occurrence".into(),
        ));
    }
    let (hd, args) = t.unfold_app();
    if let Some(v) = hd.as_var() {
        if v == f && args.len() == 1 && !args[0].var_free_in(f) {
            return Ok(Shape::TailCall {
                arg: args[0].clone(),
            });
        }
        return Err(Error::not_admissible(
            "recursive occurrence in an unrecognized position".into(),
        ));
    }
    if let Some((s, _)) = hd.as_const() {
        if Some(s) == env.cond_name.as_ref() && args.len() == 3 {
            if args[0].var_free_in(f) {
                return Err(Error::not_admissible(
                    "recursive call inside a conditional guard".into(),
                ));
            }
            return Ok(Shape::Cond {
                cond: args[0].clone(),
                then: Box::new(classify(env, f, args[1])?),
                els: Box::new(classify(env, f, args[2])?),
            });
        }
        if env.case_ops.contains(s) {
            let branches = args
                .iter()
                .map(|a| classify_arg(env, f, a))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Shape::CaseSplit { branches });
        }
        if env.sum_ops.contains(s) {
            if let Some(last) = args.last() {
                return Ok(Shape::BoundedSum {
                    body: Box::new(classify_arg(env, f, last)?),
                });
            }
        }
        if env.map_ops.contains(s) {
            if let Some(first) = args.first() {
                return Ok(Shape::ListMap {
                    body: Box::new(classify_arg(env, f, first)?),
                });
            }
        }
    }
    if hd.var_free_in(f) {
        return Err(Error::not_admissible(
            "recursive occurrence in head position".into(),
        ));
    }
    let shapes = args
        .iter()
        .map(|a| classify_arg(env, f, a))
        .collect::<Result<Vec<_>>>()?;
    Ok(Shape::Compose { args: shapes })
}

// classify through an (optional) lambda wrapper
fn classify_arg(env: &RecEnv, f: &Var, t: &Term) -> Result<Shape> {
    match t.view() {
        TermView::ELambda(v, body) => {
            if v == f {
                return Ok(Shape::Base); // shadowed
            }
            classify_arg(env, f, body)
        }
        _ => classify(env, f, t),
    }
}

/// Collect every recursive call argument with the conditional guards
/// in scope at its position.
fn collect_calls(
    env: &RecEnv,
    ctx: &Ctx,
    f: &Var,
    t: &Term,
    guards: &mut Vec<Term>,
    out: &mut Vec<(Term, Vec<Term>)>,
) -> Result<()> {
    if !t.var_free_in(f) {
        return Ok(());
    }
    let (hd, args) = t.unfold_app();
    if let Some(v) = hd.as_var() {
        if v == f && args.len() == 1 {
            out.push((args[0].clone(), guards.clone()));
            return collect_calls(env, ctx, f, args[0], guards, out);
        }
    }
    if let Some((s, _)) = hd.as_const() {
        if Some(s) == env.cond_name.as_ref() && args.len() == 3 {
            collect_calls(env, ctx, f, args[0], guards, out)?;
            guards.push(args[0].clone());
            collect_calls(env, ctx, f, args[1], guards, out)?;
            guards.pop();
            let neg = logic::mk_not(ctx, args[0].clone())?;
            guards.push(neg);
            collect_calls(env, ctx, f, args[2], guards, out)?;
            guards.pop();
            return Ok(());
        }
    }
    match t.view() {
        TermView::EApp(a, b) => {
            collect_calls(env, ctx, f, a, guards, out)?;
            collect_calls(env, ctx, f, b, guards, out)
        }
        TermView::ELambda(_, body) => collect_calls(env, ctx, f, body, guards, out),
        _ => Ok(()),
    }
}

// ---- helpers ----

// exact structural replacement of a subterm (no binder in `t` may
// capture a free variable of `target`; callers arrange this)
fn replace_subterm(ctx: &Ctx, t: &Term, target: &Term, repl: &Term) -> Result<Term> {
    if t == target {
        return Ok(repl.clone());
    }
    match t.view() {
        TermView::EApp(a, b) => {
            let a2 = replace_subterm(ctx, a, target, repl)?;
            let b2 = replace_subterm(ctx, b, target, repl)?;
            if &a2 == a && &b2 == b {
                Ok(t.clone())
            } else {
                ctx.mk_app(a2, b2)
            }
        }
        TermView::ELambda(v, body) => {
            if target.var_free_in(v) {
                return Ok(t.clone()); // occurrence shadowed, leave alone
            }
            let body2 = replace_subterm(ctx, body, target, repl)?;
            if &body2 == body {
                Ok(t.clone())
            } else {
                ctx.mk_lambda(v.clone(), body2)
            }
        }
        _ => Ok(t.clone()),
    }
}

// beta-reduce exactly the application spines headed by one of the
// given lambdas (each with its arity), leaving user redexes alone
#[derive(Debug)]
struct SolutionBeta(Vec<(Term, usize)>);

impl Converter for SolutionBeta {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        let (hd, args) = e.unfold_app();
        for (lam, arity) in &self.0 {
            if hd == lam && args.len() == *arity {
                return BetaWhnfConvN(*arity).try_conv(ctx, e);
            }
        }
        Ok(None)
    }
}

/// The case-distinctness rewriter: drives constructor distinctness and
/// injectivity facts (plus the trivial boolean clauses) through the
/// conversion engine to simplify the side conditions generated by
/// overlapping patterns.
#[derive(Debug)]
pub struct CaseRewriter {
    lg: Logic,
    distinct: Vec<Thm>,
    inject: Vec<Thm>,
}

impl CaseRewriter {
    pub fn new(lg: Logic, env: &RecEnv) -> Self {
        let mut distinct = vec![];
        let mut inject = vec![];
        for d in &env.datatypes {
            distinct.extend(d.distinctness.iter().cloned());
            inject.extend(d.injectivity.iter().cloned());
        }
        CaseRewriter {
            lg,
            distinct,
            inject,
        }
    }

    /// Simplify a side condition as far as the registered facts allow.
    pub fn simplify(&self, ctx: &mut Ctx, t: &Term) -> Result<Term> {
        match TopDepthConv(self).try_conv(ctx, t)? {
            None => Ok(t.clone()),
            Some(th) => {
                let (_, r) = th
                    .concl()
                    .unfold_eq()
                    .ok_or_else(|| Error::new("case rewriter produced a non-equation"))?;
                Ok(r.clone())
            }
        }
    }
}

impl Converter for CaseRewriter {
    fn try_conv(&self, ctx: &mut Ctx, e: &Term) -> Result<Option<Thm>> {
        let lg = &self.lg;
        if let Some((a, b)) = e.unfold_eq() {
            if alpha_eq(a, b) {
                return Ok(Some(lg.refl_clause(ctx, a)?));
            }
            // distinctness, in both orientations
            for d in &self.distinct {
                let d_i = lg.spec_all(ctx, d.clone())?;
                let neg = match logic::dest_neg(d_i.concl()) {
                    Some(n) => n.clone(),
                    None => continue,
                };
                for flip in [false, true] {
                    let pat = if !flip {
                        neg.clone()
                    } else {
                        match neg.unfold_eq() {
                            Some((l, r)) => ctx.mk_eq_app(r.clone(), l.clone())?,
                            None => continue,
                        }
                    };
                    if let Some(m) = term_match(&pat, e) {
                        let th_neg = if !flip {
                            d_i.clone()
                        } else {
                            // from ~(l = r) derive ~(r = l)
                            let rl = ctx.thm_assume(pat.clone())?;
                            let lr = logic::sym(ctx, rl)?;
                            let ne = lg.not_elim(ctx, d_i.clone())?;
                            let ff = lg.mp(ctx, ne, lr)?;
                            let di = lg.disch(ctx, &pat, ff)?;
                            lg.not_intro(ctx, di)?
                        };
                        let inst = m.apply(ctx, &th_neg)?;
                        return Ok(Some(lg.eqf_intro(ctx, inst)?));
                    }
                }
            }
            // injectivity: `(C xs = C ys) = (xs = ys /\ …)` rules
            for i in &self.inject {
                let i_i = lg.spec_all(ctx, i.clone())?;
                if let Some((pat, _)) = i_i.concl().unfold_eq() {
                    if let Some(m) = term_match(pat, e) {
                        return Ok(Some(m.apply(ctx, &i_i)?));
                    }
                }
            }
            return Ok(None);
        }
        // (F ==> p) = T
        if let Some((a, b)) = logic::dest_imp(e) {
            if logic::is_false(a) {
                let b = b.clone();
                return Ok(Some(lg.imp_false_clause(ctx, &b)?));
            }
        }
        Ok(None)
    }
}

// ---- validation and overlap analysis ----

struct ClauseInfo {
    pat_args: Vec<Term>,
    pat_vars: Vars,
    rhs: Term,
}

fn validate_clauses(spec: &ClauseSpec) -> Result<Vec<ClauseInfo>> {
    if spec.clauses.is_empty() {
        return Err(Error::malformed("recursive definition with no clauses"));
    }
    let mut out = vec![];
    for (lhs, rhs) in &spec.clauses {
        let (hd, args) = lhs.unfold_app();
        match hd.as_var() {
            Some(v) if v == &spec.f => (),
            _ => {
                return Err(Error::malformed(
                    "clause head is not the function being defined",
                ))
            }
        }
        if lhs.ty() != rhs.ty() {
            return Err(Error::malformed("clause sides have different types"));
        }
        if args.is_empty() {
            return Err(Error::malformed("clause has no argument pattern"));
        }
        if args.iter().any(|a| a.var_free_in(&spec.f)) {
            return Err(Error::malformed("recursive call inside a pattern"));
        }
        let pat_args: Vec<Term> = args.into_iter().cloned().collect();
        let mut pat_vars: Vars = Vars::new();
        for a in &pat_args {
            for v in a.free_vars() {
                if pat_vars.contains(&v) {
                    return Err(Error::malformed("non-linear pattern variable"));
                }
                pat_vars.push(v);
            }
        }
        out.push(ClauseInfo {
            pat_args,
            pat_vars,
            rhs: rhs.clone(),
        });
    }
    Ok(out)
}

// pairwise overlap analysis; returns leftover obligations
fn check_overlaps(
    ctx: &mut Ctx,
    lg: &Logic,
    env: &RecEnv,
    infos: &[ClauseInfo],
) -> Result<Vec<Term>> {
    let rewriter = CaseRewriter::new(lg.clone(), env);
    let mut obligations = vec![];
    for i in 0..infos.len() {
        for j in i + 1..infos.len() {
            // rename the second clause's pattern variables apart
            let mut avoid: Vars = infos[i].pat_vars.clone();
            let mut ren = Subst::new();
            for v in &infos[j].pat_vars {
                let v2 = ctx.variant(&avoid, v);
                avoid.push(v2.clone());
                ren.add_binding(v.clone(), ctx.mk_var(v2));
            }
            let pats_j: Vec<Term> = infos[j]
                .pat_args
                .iter()
                .map(|p| ctx.subst(p, &ren))
                .collect::<Result<_>>()?;
            let rhs_j = ctx.subst(&infos[j].rhs, &ren)?;

            if infos[i].pat_args.len() != pats_j.len() {
                return Err(Error::malformed("clauses have different arities"));
            }
            let p_i = tuple_of(ctx, &infos[i].pat_args)?;
            let p_j = tuple_of(ctx, &pats_j)?;
            match unify_terms(&p_i, &p_j) {
                Some(u) => {
                    let r1 = apply_unifier(ctx, &u, &infos[i].rhs)?;
                    let r2 = apply_unifier(ctx, &u, &rhs_j)?;
                    if !alpha_eq(&r1, &r2) {
                        return Err(Error::not_admissible(format!(
                            "overlapping clauses {} and {} disagree on the overlap",
                            i, j
                        )));
                    }
                }
                None => {
                    // disjoint: run the side condition through the
                    // distinctness rewriter; anything unresolved is a
                    // residual obligation for the caller
                    let eq = ctx.mk_eq_app(p_i.clone(), p_j.clone())?;
                    let rhs_eq = ctx.mk_eq_app(infos[i].rhs.clone(), rhs_j.clone())?;
                    let side = logic::mk_imp(ctx, eq, rhs_eq)?;
                    let simplified = rewriter.simplify(ctx, &side)?;
                    if !logic::is_true(&simplified) {
                        obligations.push(simplified);
                    }
                }
            }
        }
    }
    Ok(obligations)
}

// patterns are compared componentwise through a synthetic spine so a
// single unification call covers multi-argument clauses
fn tuple_of(ctx: &Ctx, args: &[Term]) -> Result<Term> {
    if args.len() == 1 {
        return Ok(args[0].clone());
    }
    // fold into nested applications of a fresh head variable; only used
    // for unification, never for theorems
    let mut ty = ctx.mk_bool();
    for a in args.iter().rev() {
        ty = ctx.mk_arrow(a.ty().clone(), ty);
    }
    let hd = ctx.mk_var_str(" pat", ty);
    ctx.mk_app_l(hd, args)
}

// ---- termination ----

fn is_strict_subterm(arg: &Term, pats: &[Term]) -> bool {
    fn occurs_strictly(arg: &Term, t: &Term) -> bool {
        match t.view() {
            TermView::EApp(a, b) => {
                a == arg || b == arg || occurs_strictly(arg, a) || occurs_strictly(arg, b)
            }
            _ => false,
        }
    }
    pats.iter().any(|p| occurs_strictly(arg, p))
}

fn discharge_smaller(ctx: &mut Ctx, lg: &Logic, env: &RecEnv, target: &Term) -> Option<Thm> {
    for lemma in &env.smaller {
        if let Ok(th) = lg.part_match(ctx, lemma.clone(), target) {
            return Some(th);
        }
    }
    None
}

// ---- synthesis paths ----

/// Analyze the definition and synthesize its existence theorem.
///
/// Hard errors (`Malformed`) mean the definition itself is broken;
/// `NotAdmissible` means the (incomplete) classifier gave up.
pub fn justify_recursion(
    ctx: &mut Ctx,
    lg: &Logic,
    env: &RecEnv,
    spec: &ClauseSpec,
) -> Result<RecJustification> {
    let infos = validate_clauses(spec)?;
    let shapes = infos
        .iter()
        .map(|c| classify(env, &spec.f, &c.rhs))
        .collect::<Result<Vec<_>>>()?;
    let mut obligations = check_overlaps(ctx, lg, env, &infos)?;

    // structural recursion over a datatype?
    if let Some(dt) = constructor_datatype(env, &infos) {
        let thm = structural_existence(ctx, lg, &dt, spec, &infos)?;
        return Ok(RecJustification {
            thm,
            shapes,
            obligations,
        });
    }

    // single clause over a plain variable pattern
    if infos.len() == 1 && infos[0].pat_args.len() == 1 && infos[0].pat_args[0].as_var().is_some()
    {
        let info = &infos[0];
        let x = info.pat_args[0].as_var().expect("checked").clone();

        // base case: no recursion at all
        if matches!(shapes[0], Shape::Base) {
            let thm = nonrecursive_existence(ctx, lg, spec, &x, &info.rhs)?;
            return Ok(RecJustification {
                thm,
                shapes,
                obligations,
            });
        }

        // tail-admissible: COND guard with a single tail call
        if let Shape::Cond { then, els, .. } = &shapes[0] {
            let tail_form = matches!(
                (&**then, &**els),
                (Shape::TailCall { .. }, Shape::Base) | (Shape::Base, Shape::TailCall { .. })
            );
            if tail_form {
                if let Some(proforma) = &env.wf_rec_tail {
                    let thm =
                        tail_existence(ctx, lg, proforma.clone(), spec, &x, &info.rhs, env)?;
                    return Ok(RecJustification {
                        thm,
                        shapes,
                        obligations,
                    });
                }
            }
        }

        // general well-founded recursion
        if let (Some(order), Some(wf_thm), Some(proforma)) =
            (&spec.order, &spec.wf_thm, &env.wf_rec)
        {
            let thm = wf_existence(
                ctx,
                lg,
                env,
                proforma.clone(),
                order,
                wf_thm.clone(),
                spec,
                &x,
                &info.rhs,
                &mut obligations,
            )?;
            return Ok(RecJustification {
                thm,
                shapes,
                obligations,
            });
        }
    }

    Err(Error::not_admissible(
        "recursion pattern not recognized by any registered proforma".into(),
    ))
}

// every clause pattern is a single constructor application of the same
// datatype?
fn constructor_datatype(env: &RecEnv, infos: &[ClauseInfo]) -> Option<DatatypeFacts> {
    let mut found: Option<&DatatypeFacts> = None;
    for info in infos {
        if info.pat_args.len() != 1 {
            return None;
        }
        let (hd, args) = info.pat_args[0].unfold_app();
        let (name, _) = hd.as_const()?;
        if !args.iter().all(|a| a.as_var().is_some()) {
            return None;
        }
        let dt = env.datatypes.iter().find(|d| {
            d.constructors
                .iter()
                .any(|c| matches!(c.as_const(), Some((n, _)) if n == name))
        })?;
        match found {
            None => found = Some(dt),
            Some(prev) if prev.ty_name == dt.ty_name => (),
            Some(_) => return None,
        }
    }
    found.cloned()
}

// the expected final statement `?f. /\_i !pat_vars_i. f p_i = rhs_i`,
// with the clause order given by `order_idx`
fn target_statement(
    ctx: &Ctx,
    spec: &ClauseSpec,
    infos: &[ClauseInfo],
    order_idx: &[usize],
) -> Result<Term> {
    let mut cls = vec![];
    for &i in order_idx {
        let info = &infos[i];
        let f_tm = ctx.mk_var(spec.f.clone());
        let lhs = ctx.mk_app_l(f_tm, &info.pat_args)?;
        let eq = ctx.mk_eq_app(lhs, info.rhs.clone())?;
        cls.push(logic::mk_forall_l(ctx, &info.pat_vars, eq)?);
    }
    let conj = logic::list_mk_conj(ctx, &cls)?;
    logic::mk_exists(ctx, spec.f.clone(), conj)
}

fn align_to(ctx: &mut Ctx, th: Thm, target: &Term) -> Result<Thm> {
    if th.concl() == target {
        return Ok(th);
    }
    let al = logic::alpha_thm(ctx, th.concl(), target).map_err(|e| {
        Error::not_admissible("synthesized statement does not match the clauses".into())
            .with_source(e)
    })?;
    ctx.thm_bool_eq(th, al)
}

// `?f. !x. f x = rhs` for a non-recursive body: witness `\x. rhs`
fn nonrecursive_existence(
    ctx: &mut Ctx,
    lg: &Logic,
    spec: &ClauseSpec,
    x: &Var,
    rhs: &Term,
) -> Result<Thm> {
    let lam = ctx.mk_lambda(x.clone(), rhs.clone())?;
    let eq = {
        let app = ctx.mk_app(lam.clone(), ctx.mk_var(x.clone()))?;
        ctx.thm_beta_conv(&app)?
    };
    let all = lg.gen(ctx, x, eq)?; // |- !x. (\x. rhs) x = rhs
    let infos = validate_clauses(spec)?;
    let target = target_statement(ctx, spec, &infos, &[0])?;
    let ex = lg.exists_intro(ctx, &target, &lam, all)?;
    Ok(ex)
}

// instantiate the universal frontier of a proforma with solved terms,
// then reduce exactly the solution redexes
fn instantiate_proforma(
    ctx: &mut Ctx,
    lg: &Logic,
    proforma: Thm,
    solutions: &[Term],
) -> Result<Thm> {
    let mut th = proforma;
    let mut lams = vec![];
    for sol in solutions {
        if sol.as_lambda().is_some() {
            let mut arity = 0;
            let mut t = sol.clone();
            while let Some((_, b)) = t.as_lambda() {
                arity += 1;
                let b = b.clone();
                t = b;
            }
            lams.push((sol.clone(), arity));
        }
        th = lg.spec(ctx, sol, th)?;
    }
    if lams.is_empty() {
        return Ok(th);
    }
    conv::thm_conv_concl(ctx, th, &TopSweepConv(SolutionBeta(lams)))
}

// structural recursion: match the clauses against the datatype's
// primitive-recursion theorem and solve for its universal parameters
fn structural_existence(
    ctx: &mut Ctx,
    lg: &Logic,
    dt: &DatatypeFacts,
    spec: &ClauseSpec,
    infos: &[ClauseInfo],
) -> Result<Thm> {
    // align the proforma's types with the function being defined
    let proforma = {
        let (_, body) = logic::strip_forall(dt.recursion.concl());
        let (fn_v, _) = logic::dest_exists(&body)
            .ok_or_else(|| Error::malformed("recursion proforma is not an existence theorem"))?;
        let mut tys = vec![];
        crate::kernel::type_match(&fn_v.ty, &spec.f.ty, &mut tys).map_err(|e| {
            Error::not_admissible("function type does not fit the recursion proforma".into())
                .with_source(e)
        })?;
        let tys: crate::kernel::TySubst = tys.into_iter().collect();
        ctx.thm_instantiate_ty(dt.recursion.clone(), &tys)?
    };

    let (univ_vars, body) = logic::strip_forall(proforma.concl());
    let (fn_v, conj_body) = logic::dest_exists(&body)
        .map(|(v, b)| (v.clone(), b.clone()))
        .ok_or_else(|| Error::malformed("recursion proforma is not an existence theorem"))?;
    let pro_clauses = logic::conjuncts(&conj_body);

    // pair each proforma clause with the user clause for its constructor
    let mut solutions: Vec<Option<Term>> = vec![None; univ_vars.len()];
    let mut order_idx = vec![];
    for pc in &pro_clauses {
        let (_cvars, eq) = logic::strip_forall(pc);
        let (lhs, template) = eq
            .unfold_eq()
            .ok_or_else(|| Error::malformed("recursion proforma clause is not an equation"))?;
        let (hd_fn, pargs) = lhs.unfold_app();
        if hd_fn.as_var() != Some(&fn_v) || pargs.len() != 1 {
            return Err(Error::malformed("unexpected proforma clause head"));
        }
        let (ctor, ctor_args) = pargs[0].unfold_app();
        let ctor_name = ctor
            .as_const()
            .map(|(s, _)| s.clone())
            .ok_or_else(|| Error::malformed("proforma pattern head is not a constructor"))?;

        // find the user's clause for this constructor
        let (uidx, uinfo) = infos
            .iter()
            .enumerate()
            .find(|(_, info)| {
                let (hd, _) = info.pat_args[0].unfold_app();
                matches!(hd.as_const(), Some((n, _)) if n == &ctor_name)
            })
            .ok_or_else(|| {
                Error::not_admissible(format!("no clause for constructor `{}`", ctor_name))
            })?;
        order_idx.push(uidx);

        // rename: proforma pattern vars -> user pattern vars, fn -> f
        let (_, u_ctor_args) = uinfo.pat_args[0].unfold_app();
        if ctor_args.len() != u_ctor_args.len() {
            return Err(Error::not_admissible("constructor arity mismatch".into()));
        }
        let mut ren = Subst::new();
        for (pv, uv) in ctor_args.iter().zip(u_ctor_args.iter()) {
            let pv = pv
                .as_var()
                .ok_or_else(|| Error::malformed("proforma pattern argument is not a variable"))?;
            ren.add_binding(pv.clone(), (*uv).clone());
        }
        ren.add_binding(fn_v.clone(), ctx.mk_var(spec.f.clone()));
        let template_u = ctx.subst(template, &ren)?;

        // solve the universal parameter this template is headed by
        let (t_hd, t_args) = template_u.unfold_app();
        let head_var = t_hd
            .as_var()
            .ok_or_else(|| Error::malformed("proforma template head is not a parameter"))?
            .clone();
        let k = univ_vars
            .iter()
            .position(|u| u == &head_var)
            .ok_or_else(|| Error::malformed("proforma template head is not universal"))?;

        let sol = if t_args.is_empty() {
            uinfo.rhs.clone()
        } else {
            // binders for each template argument, then abstract the
            // corresponding pieces of the user's right-hand side
            let mut avoid: Vars = uinfo.rhs.free_vars();
            let mut binders = vec![];
            for (n, a) in t_args.iter().enumerate() {
                let u = ctx.variant(
                    &avoid,
                    &Var::from_str(&format!("u{}", n), a.ty().clone()),
                );
                avoid.push(u.clone());
                binders.push(u);
            }
            let mut body = uinfo.rhs.clone();
            // recursive-call arguments first (they contain pattern vars)
            for (a, u) in t_args.iter().zip(binders.iter()) {
                if a.as_var().is_none() {
                    let u_tm = ctx.mk_var(u.clone());
                    body = replace_subterm(ctx, &body, a, &u_tm)?;
                }
            }
            let mut plain = Subst::new();
            for (a, u) in t_args.iter().zip(binders.iter()) {
                if let Some(v) = a.as_var() {
                    plain.add_binding(v.clone(), ctx.mk_var(u.clone()));
                }
            }
            body = ctx.subst(&body, &plain)?;
            if body.var_free_in(&spec.f) {
                return Err(Error::not_admissible(
                    "a recursive call is not in the form the proforma provides".into(),
                ));
            }
            ctx.mk_lambda_l(&binders, body)?
        };
        if let Some(ty_sol) = solutions.get(k).and_then(|s| s.as_ref()) {
            if !alpha_eq(ty_sol, &sol) {
                return Err(Error::not_admissible(
                    "conflicting solutions for a proforma parameter".into(),
                ));
            }
        }
        solutions[k] = Some(sol);
    }

    if order_idx.len() != infos.len() {
        return Err(Error::not_admissible(
            "some clauses have no matching proforma clause".into(),
        ));
    }
    let mut seen = vec![false; infos.len()];
    for &i in &order_idx {
        if seen[i] {
            return Err(Error::not_admissible(
                "two proforma clauses map to the same user clause".into(),
            ));
        }
        seen[i] = true;
    }
    let solutions: Vec<Term> = solutions
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| Error::not_admissible("unused proforma parameter".into()))?;

    let inst = instantiate_proforma(ctx, lg, proforma, &solutions)?;
    let target = target_statement(ctx, spec, infos, &order_idx)?;
    align_to(ctx, inst, &target)
}

// tail recursion through the `WF_REC_TAIL`-style proforma
fn tail_existence(
    ctx: &mut Ctx,
    lg: &Logic,
    proforma: Thm,
    spec: &ClauseSpec,
    x: &Var,
    rhs: &Term,
    env: &RecEnv,
) -> Result<Thm> {
    // rhs = COND c (f g) h  (or mirrored); extract the P/G/H triple
    let cond_name = env
        .cond_name
        .as_ref()
        .ok_or_else(|| Error::not_admissible("no conditional constant registered".into()))?;
    let (hd, args) = rhs.unfold_app();
    if !is_const_named(hd, cond_name) || args.len() != 3 {
        return Err(Error::not_admissible("not a conditional tail form".into()));
    }
    let (cond, br_then, br_els) = (args[0].clone(), args[1].clone(), args[2].clone());
    let f_tm = ctx.mk_var(spec.f.clone());

    let (p_body, g_arg, h_body) = {
        let dest_call = |t: &Term| -> Option<Term> {
            let (h, a) = t.as_app()?;
            if h == &f_tm {
                Some(a.clone())
            } else {
                None
            }
        };
        if let Some(g) = dest_call(&br_then) {
            (cond.clone(), g, br_els.clone())
        } else if dest_call(&br_els).is_some() {
            // the proforma fixes the call to the `then` branch
            return Err(Error::not_admissible(
                "tail call in the else branch is not supported by the proforma".into(),
            ));
        } else {
            return Err(Error::not_admissible("no direct tail call".into()));
        }
    };
    if g_arg.var_free_in(&spec.f) || h_body.var_free_in(&spec.f) || p_body.var_free_in(&spec.f) {
        return Err(Error::not_admissible(
            "recursion outside the tail position".into(),
        ));
    }

    // P = \x. c, G = \x. g, H = \x. h
    let p_sol = ctx.mk_lambda(x.clone(), p_body)?;
    let g_sol = ctx.mk_lambda(x.clone(), g_arg)?;
    let h_sol = ctx.mk_lambda(x.clone(), h_body)?;

    // align proforma types with the definition
    let proforma = {
        let (uv, _) = logic::strip_forall(proforma.concl());
        if uv.len() != 3 {
            return Err(Error::malformed("tail-recursion proforma must bind P, G, H"));
        }
        let mut tys = vec![];
        crate::kernel::type_match(&uv[1].ty, g_sol.ty(), &mut tys)
            .and_then(|_| crate::kernel::type_match(&uv[2].ty, h_sol.ty(), &mut tys))
            .map_err(|e| {
                Error::not_admissible("definition does not fit the tail proforma".into())
                    .with_source(e)
            })?;
        let tys: crate::kernel::TySubst = tys.into_iter().collect();
        ctx.thm_instantiate_ty(proforma, &tys)?
    };

    let inst = instantiate_proforma(ctx, lg, proforma, &[p_sol, g_sol, h_sol])?;
    let infos = validate_clauses(spec)?;
    let target = target_statement(ctx, spec, &infos, &[0])?;
    align_to(ctx, inst, &target)
}

// general well-founded recursion: instantiate `WF_REC`, proving its
// continuity antecedent by a congruence walk over the body
#[allow(clippy::too_many_arguments)]
fn wf_existence(
    ctx: &mut Ctx,
    lg: &Logic,
    env: &RecEnv,
    proforma: Thm,
    order: &Term,
    wf_thm: Thm,
    spec: &ClauseSpec,
    x: &Var,
    rhs: &Term,
    _obligations: &mut Vec<Term>,
) -> Result<Thm> {
    // align the proforma's relation type with the order
    let proforma = {
        let (uv, _) = logic::strip_forall(proforma.concl());
        let rel_v = uv
            .first()
            .ok_or_else(|| Error::malformed("WF proforma must bind the relation"))?;
        let mut tys = vec![];
        crate::kernel::type_match(&rel_v.ty, order.ty(), &mut tys).map_err(|e| {
            Error::not_admissible("order does not fit the WF proforma".into()).with_source(e)
        })?;
        let tys: crate::kernel::TySubst = tys.into_iter().collect();
        ctx.thm_instantiate_ty(proforma, &tys)?
    };

    let th1 = lg.spec(ctx, order, proforma)?; // WF ord ==> !H. …
    let th2 = lg.mp(ctx, th1, wf_thm)?; // !H. cont ==> ?fn…

    // the step functional
    let h_sol = {
        let inner = ctx.mk_lambda(x.clone(), rhs.clone())?;
        ctx.mk_lambda(spec.f.clone(), inner)?
    };
    // fix the codomain type: match the bound H against our functional
    let th2 = {
        let (hv, _) = logic::dest_forall(th2.concl())
            .ok_or_else(|| Error::malformed("WF proforma: expected !H"))?;
        let mut tys = vec![];
        crate::kernel::type_match(&hv.ty, h_sol.ty(), &mut tys).map_err(|e| {
            Error::not_admissible("functional does not fit the WF proforma".into()).with_source(e)
        })?;
        let tys: crate::kernel::TySubst = tys.into_iter().collect();
        ctx.thm_instantiate_ty(th2, &tys)?
    };
    let th3 = lg.spec(ctx, &h_sol, th2)?; // cont[H] ==> ?fn. !x. fn x = H fn x

    let (cont, _) = logic::dest_imp(th3.concl())
        .map(|(a, b)| (a.clone(), b.clone()))
        .ok_or_else(|| Error::malformed("WF proforma: expected an implication"))?;
    let cont_th = prove_continuity(ctx, lg, env, order, &cont, spec, x, rhs)?;
    let th4 = lg.mp(ctx, th3, cont_th)?; // ?fn. !x. fn x = H fn x

    let h_arity_reduce = {
        let lams = vec![(h_sol.clone(), 2)];
        conv::thm_conv_concl(ctx, th4, &TopSweepConv(SolutionBeta(lams)))?
    };
    let infos = validate_clauses(spec)?;
    let target = target_statement(ctx, spec, &infos, &[0])?;
    align_to(ctx, h_arity_reduce, &target)
}

// prove `!f g x. (!z. ord z x ==> f z = g z) ==> H f x = H g x` for the
// functional `H = \f x. body`
#[allow(clippy::too_many_arguments)]
fn prove_continuity(
    ctx: &mut Ctx,
    lg: &Logic,
    env: &RecEnv,
    order: &Term,
    cont: &Term,
    spec: &ClauseSpec,
    x: &Var,
    rhs: &Term,
) -> Result<Thm> {
    // destructure the expected statement
    let (fv, rest1) = logic::dest_forall(cont)
        .map(|(v, b)| (v.clone(), b.clone()))
        .ok_or_else(|| Error::malformed("continuity: expected !f"))?;
    let (gv, rest2) = logic::dest_forall(&rest1)
        .map(|(v, b)| (v.clone(), b.clone()))
        .ok_or_else(|| Error::malformed("continuity: expected !g"))?;
    let (xv, rest3) = logic::dest_forall(&rest2)
        .map(|(v, b)| (v.clone(), b.clone()))
        .ok_or_else(|| Error::malformed("continuity: expected !x"))?;
    let (hyp_a, concl_eq) = logic::dest_imp(&rest3)
        .map(|(a, b)| (a.clone(), b.clone()))
        .ok_or_else(|| Error::malformed("continuity: expected an implication"))?;

    let a_th = ctx.thm_assume(hyp_a.clone())?;

    // the two instantiated bodies
    let body_f = {
        let mut s = Subst::new();
        s.add_binding(spec.f.clone(), ctx.mk_var(fv.clone()));
        s.add_binding(x.clone(), ctx.mk_var(xv.clone()));
        ctx.subst(rhs, &s)?
    };

    let g_of = |ctx: &Ctx, t: &Term| -> Result<Term> {
        let mut s = Subst::new();
        s.add_binding(fv.clone(), ctx.mk_var(gv.clone()));
        ctx.subst(t, &s)
    };

    // congruence walk: |- t = t[g/f]
    fn walk(
        ctx: &mut Ctx,
        lg: &Logic,
        env: &RecEnv,
        order: &Term,
        a_th: &Thm,
        fv: &Var,
        gv: &Var,
        xv: &Var,
        t: &Term,
    ) -> Result<Thm> {
        if !t.var_free_in(fv) {
            return Ok(ctx.thm_refl(t.clone()));
        }
        match t.view() {
            TermView::EVar(_) => Err(Error::not_admissible(
                "bare recursive occurrence in the body".into(),
            )),
            TermView::EApp(a, b) => {
                if a.as_var() == Some(fv) {
                    // recursive call site: f b = g b' via the assumption
                    let th_b = walk(ctx, lg, env, order, a_th, fv, gv, xv, b)?;
                    let (_, b_g) = th_b.concl().unfold_eq().expect("walk returns equations");
                    let b_g = b_g.clone();
                    let f_tm = ctx.mk_var(fv.clone());
                    let th1 = logic::ap_term(ctx, f_tm, th_b)?; // f b = f b_g
                    let smaller_t = {
                        let o1 = ctx.mk_app(order.clone(), b_g.clone())?;
                        ctx.mk_app(o1, ctx.mk_var(xv.clone()))?
                    };
                    let sm = discharge_smaller(ctx, lg, env, &smaller_t).ok_or_else(|| {
                        Error::not_admissible(format!(
                            "cannot discharge termination condition {:?}",
                            smaller_t
                        ))
                    })?;
                    let sp = lg.spec(ctx, &b_g, a_th.clone())?; // ord b_g x ==> f b_g = g b_g
                    let step = lg.mp(ctx, sp, sm)?;
                    ctx.thm_trans(th1, step)
                } else {
                    let th_a = walk(ctx, lg, env, order, a_th, fv, gv, xv, a)?;
                    let th_b = walk(ctx, lg, env, order, a_th, fv, gv, xv, b)?;
                    ctx.thm_congr(th_a, th_b)
                }
            }
            TermView::ELambda(v, body) => {
                let th_b = walk(ctx, lg, env, order, a_th, fv, gv, xv, body)?;
                ctx.thm_abs(v, th_b).map_err(|e| {
                    Error::not_admissible("binder blocks the congruence walk".into()).with_source(e)
                })
            }
            _ => Ok(ctx.thm_refl(t.clone())),
        }
    }

    let core = walk(ctx, lg, env, order, &a_th, &fv, &gv, &xv, &body_f)?;
    // core : |- body_f = body_f[g/f]; check the right side is body_g
    let (_, got_g) = core.concl().unfold_eq().expect("walk returns equations");
    let body_g = g_of(ctx, &body_f)?;
    if !alpha_eq(got_g, &body_g) {
        return Err(Error::not_admissible(
            "congruence walk lost track of the body".into(),
        ));
    }

    // H f x = body_f and H g x = body_g by beta
    let (lhs_t, rhs_t) = concl_eq
        .unfold_eq()
        .map(|(a, b)| (a.clone(), b.clone()))
        .ok_or_else(|| Error::malformed("continuity: expected an equation"))?;
    let beta_l = BetaWhnfConvN(2).conv(ctx, &lhs_t)?; // |- H f x = body_f
    let beta_r = BetaWhnfConvN(2).conv(ctx, &rhs_t)?; // |- H g x = body_g
    let step = ctx.thm_trans(beta_l, core)?;
    let beta_r_sym = logic::sym(ctx, beta_r)?;
    let eq_th = ctx.thm_trans(step, beta_r_sym)?; // {A} |- H f x = H g x

    let d = lg.disch(ctx, &hyp_a, eq_th)?;
    let g1 = lg.gen(ctx, &xv, d)?;
    let g2 = lg.gen(ctx, &gv, g1)?;
    let g3 = lg.gen(ctx, &fv, g2)?;
    align_to(ctx, g3, cont)
}

// strict-subterm recursion is currently justified through the
// registered datatype or smaller-lemma machinery; the raw structural
// check is still exported for callers that only want the analysis
pub fn calls_structurally_smaller(
    env: &RecEnv,
    ctx: &Ctx,
    spec: &ClauseSpec,
) -> Result<bool> {
    let infos = validate_clauses(spec)?;
    for info in &infos {
        let mut out = vec![];
        let mut guards = vec![];
        collect_calls(env, ctx, &spec.f, &info.rhs, &mut guards, &mut out)?;
        for (arg, _) in out {
            if !is_strict_subterm(&arg, &info.pat_args) {
                return Ok(false);
            }
        }
    }
    Ok(true)
}
