//! MESON: first-order proof search by model elimination.
//!
//! The search runs over a shadow first-order representation with
//! integer-coded symbols, far away from kernel terms: clauses become
//! contrapositive rules indexed by signed predicate code, unification
//! keeps a graph instantiation (an association table resolved lazily),
//! fresh instances are made by offsetting variable codes, and the
//! search is iterative deepening with ancestor-list loop checking.
//!
//! Nothing found by the search is trusted: the raw refutation tree is
//! replayed through the kernel, each rule node instantiating a
//! contrapositive theorem that was itself derived from the input
//! clauses by ordinary rules. The result is sound by construction.
//!
//! The input is expected in first-order form already; negation-normal
//! form, Skolemization and clausification are the caller's business.
//! Quantifier/implication/conjunction structure is only stripped
//! structurally.

use super::tactic::{Goal, Progress, Tactic};
use crate::error::{Error, Result};
use crate::fnv::{self, FnvHashMap};
use crate::kernel::{alpha_eq, Ctx, Subst, Term, Thm, Var, Vars};
use crate::logic::{self, Logic};
use std::rc::Rc;

/// Search parameters.
///
/// The bound is a resource metric: inference count by default, proof
/// depth when `depth` is set. Iterative deepening runs from `min_size`
/// to `max_size` by `step`; exhausting `max_size` reports
/// `SearchExhausted`, which is *not* a disproof.
#[derive(Debug, Clone)]
pub struct MesonParams {
    pub min_size: usize,
    pub max_size: usize,
    pub step: usize,
    /// Use proof-tree depth instead of inference count as the metric.
    pub depth: bool,
    /// Conjunctive goal lists at least this long are split.
    pub split_limit: usize,
    /// Budget skew between the two halves of a split.
    pub skew: usize,
    /// Add reflexivity/congruence axioms for every symbol in the
    /// problem (the weaker, always-applicable equality handling).
    pub eq_axioms: bool,
}

impl Default for MesonParams {
    fn default() -> Self {
        MesonParams {
            min_size: 0,
            max_size: 50,
            step: 1,
            depth: false,
            split_limit: 8,
            skew: 3,
            eq_axioms: false,
        }
    }
}

// variable codes are rule-local below OFF_INC; each rule instance adds
// a fresh multiple of OFF_INC, which is the freshness mechanism
const OFF_INC: i64 = 10_000;
// reserved predicate code for the refutation head
const FALSE_CODE: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
enum FolTerm {
    V(i64),
    Fn(i64, Vec<FolTerm>),
}

/// A literal: signed predicate code plus arguments. Negative code
/// means negated atom.
type FolLit = (i64, Vec<FolTerm>);

fn offset_term(t: &FolTerm, off: i64) -> FolTerm {
    match t {
        FolTerm::V(v) => FolTerm::V(v + off),
        FolTerm::Fn(c, args) => {
            FolTerm::Fn(*c, args.iter().map(|a| offset_term(a, off)).collect())
        }
    }
}

fn offset_lit(l: &FolLit, off: i64) -> FolLit {
    (l.0, l.1.iter().map(|a| offset_term(a, off)).collect())
}

fn negate_lit(l: &FolLit) -> FolLit {
    (-l.0, l.1.clone())
}

// ---- interning ----

struct Interner {
    /// code -> head term (a constant, or a free variable used as a
    /// fixed symbol). Codes start at FALSE_CODE + 1.
    fns: Vec<Term>,
    fmap: FnvHashMap<Term, i64>,
}

impl Interner {
    fn new() -> Self {
        Interner {
            fns: vec![],
            fmap: fnv::new_table_with_cap(32),
        }
    }

    fn intern_fn(&mut self, t: &Term) -> i64 {
        if let Some(c) = self.fmap.get(t) {
            return *c;
        }
        let c = self.fns.len() as i64 + FALSE_CODE + 1;
        self.fns.push(t.clone());
        self.fmap.insert(t.clone(), c);
        c
    }

    fn head_term(&self, code: i64) -> &Term {
        &self.fns[(code - FALSE_CODE - 1) as usize]
    }

    // `locals` maps the rule's quantified variables to local codes;
    // every other variable is an opaque symbol of the problem
    fn fol_of_term(
        &mut self,
        locals: &FnvHashMap<Var, i64>,
        t: &Term,
    ) -> Result<FolTerm> {
        if let Some(v) = t.as_var() {
            if let Some(c) = locals.get(v) {
                return Ok(FolTerm::V(*c));
            }
            return Ok(FolTerm::Fn(self.intern_fn(t), vec![]));
        }
        let (hd, args) = t.unfold_app();
        if hd.as_lambda().is_some() {
            return Err(Error::no_apply("meson: lambda in a first-order position"));
        }
        if let Some(v) = hd.as_var() {
            if locals.contains_key(v) {
                return Err(Error::no_apply("meson: variable in function position"));
            }
        }
        let code = self.intern_fn(hd);
        let args = args
            .iter()
            .map(|a| self.fol_of_term(locals, a))
            .collect::<Result<Vec<_>>>()?;
        Ok(FolTerm::Fn(code, args))
    }

    fn fol_of_atom(&mut self, locals: &FnvHashMap<Var, i64>, t: &Term) -> Result<FolLit> {
        let (hd, args) = t.unfold_app();
        if hd.as_lambda().is_some() {
            return Err(Error::no_apply("meson: lambda at predicate position"));
        }
        if let Some(v) = hd.as_var() {
            if locals.contains_key(v) {
                return Err(Error::no_apply("meson: quantified predicate"));
            }
        }
        let code = self.intern_fn(hd);
        let args = args
            .iter()
            .map(|a| self.fol_of_term(locals, a))
            .collect::<Result<Vec<_>>>()?;
        Ok((code, args))
    }

    fn fol_of_literal(
        &mut self,
        locals: &FnvHashMap<Var, i64>,
        t: &Term,
    ) -> Result<FolLit> {
        match logic::dest_neg(t) {
            Some(a) => Ok(negate_lit(&self.fol_of_atom(locals, a)?)),
            None => self.fol_of_atom(locals, t),
        }
    }
}

// ---- rules ----

struct FolRule {
    /// Subgoal literals, local variable codes.
    asms: Vec<FolLit>,
    /// Head literal, local variable codes.
    concl: FolLit,
    /// Local code -> HOL variable.
    vars: Vec<Var>,
    /// `hyps(asms) |- concl` (plus ambient hypotheses that ride along).
    thm: Thm,
}

#[derive(Default)]
struct RuleDb {
    rules: Vec<FolRule>,
    index: FnvHashMap<i64, Vec<usize>>,
}

impl RuleDb {
    fn push(&mut self, r: FolRule) {
        let code = r.concl.0;
        let idx = self.rules.len();
        self.rules.push(r);
        self.index.entry(code).or_default().push(idx);
    }

    fn candidates(&self, code: i64) -> &[usize] {
        self.index.get(&code).map(|v| &v[..]).unwrap_or(&[])
    }
}

/// `~t`, or `m` when `t` is already `~m`.
fn neg_term(ctx: &Ctx, t: &Term) -> Result<Term> {
    match logic::dest_neg(t) {
        Some(m) => Ok(m.clone()),
        None => logic::mk_not(ctx, t.clone()),
    }
}

// `{lit, neg lit} |- F`
fn lit_contra(ctx: &mut Ctx, lg: &Logic, lit: &Term) -> Result<Thm> {
    let (neg, pos) = match logic::dest_neg(lit) {
        Some(m) => (lit.clone(), m.clone()),
        None => (logic::mk_not(ctx, lit.clone())?, lit.clone()),
    };
    let a_neg = ctx.thm_assume(neg)?;
    let ne = lg.not_elim(ctx, a_neg)?;
    let a_pos = ctx.thm_assume(pos)?;
    lg.mp(ctx, ne, a_pos)
}

// from `A |- l1 \/ … \/ ln`, derive `A, neg l1, …, neg ln |- F`
fn refute_thm(ctx: &mut Ctx, lg: &Logic, th: Thm) -> Result<Thm> {
    match logic::dest_disj(th.concl()) {
        Some((a, b)) => {
            let (a, b) = (a.clone(), b.clone());
            let th_a = lit_contra(ctx, lg, &a)?;
            let a_b = ctx.thm_assume(b)?;
            let th_b = refute_thm(ctx, lg, a_b)?;
            lg.disj_cases(ctx, th, th_a, th_b)
        }
        None => {
            let lit = th.concl().clone();
            match logic::dest_neg(&lit) {
                Some(m) => {
                    // th proves ~m; contradiction with assumed m
                    let m = m.clone();
                    let ne = lg.not_elim(ctx, th)?;
                    let a_m = ctx.thm_assume(m)?;
                    lg.mp(ctx, ne, a_m)
                }
                None => {
                    let n = logic::mk_not(ctx, lit.clone())?;
                    let a_n = ctx.thm_assume(n)?;
                    let ne = lg.not_elim(ctx, a_n)?;
                    lg.mp(ctx, ne, th)
                }
            }
        }
    }
}

// `(a /\ b) ==> c`  becomes  `a ==> b ==> c`
fn curry_imp(ctx: &mut Ctx, lg: &Logic, th: Thm) -> Result<Thm> {
    let (ab, _) = logic::dest_imp(th.concl())
        .ok_or_else(|| Error::new("curry: expected an implication"))?;
    let (a, b) = logic::dest_conj(ab)
        .ok_or_else(|| Error::new("curry: expected a conjunctive antecedent"))?;
    let (a, b) = (a.clone(), b.clone());
    let th_a = ctx.thm_assume(a.clone())?;
    let th_b = ctx.thm_assume(b.clone())?;
    let cj = lg.conj(ctx, th_a, th_b)?;
    let m = lg.mp(ctx, th, cj)?;
    let d1 = lg.disch(ctx, &b, m)?;
    lg.disch(ctx, &a, d1)
}

// compile one clause theorem into its contrapositive rules
fn rules_of_thm(
    ctx: &mut Ctx,
    lg: &Logic,
    intern: &mut Interner,
    db: &mut RuleDb,
    th: Thm,
    support: bool,
) -> Result<()> {
    let ambient: Vec<Term> = th.hyps().to_vec();
    let mut qvars: Vec<Var> = vec![];
    let mut th1 = th;
    loop {
        let c = th1.concl().clone();
        if let Some((v, _)) = logic::dest_forall(&c) {
            let v = v.clone();
            let u = ctx.mk_var(v.clone());
            th1 = lg.spec(ctx, &u, th1)?;
            qvars.push(v);
            continue;
        }
        if let Some((a, _)) = logic::dest_imp(&c) {
            if logic::dest_conj(a).is_some() {
                th1 = curry_imp(ctx, lg, th1)?;
            } else {
                th1 = lg.undisch(ctx, th1)?;
            }
            continue;
        }
        break;
    }
    let lit_hyps: Vec<Term> = th1
        .hyps()
        .iter()
        .filter(|h| !ambient.iter().any(|a| alpha_eq(a, h)))
        .cloned()
        .collect();
    let disj = logic::disjuncts(th1.concl());

    let f_thm = refute_thm(ctx, lg, th1.clone())?;

    // the clause literals: negated hypotheses, then the disjuncts
    let mut clause_lits: Vec<Term> = vec![];
    for h in &lit_hyps {
        clause_lits.push(neg_term(ctx, h)?);
    }
    clause_lits.extend(disj.iter().cloned());

    let locals: FnvHashMap<Var, i64> = qvars
        .iter()
        .enumerate()
        .map(|(i, v)| (v.clone(), i as i64))
        .collect();

    let fol_lits = clause_lits
        .iter()
        .map(|l| intern.fol_of_literal(&locals, l))
        .collect::<Result<Vec<_>>>()?;

    // one contrapositive per literal
    for (i, lit) in clause_lits.iter().enumerate() {
        let thm_i = match logic::dest_neg(lit) {
            Some(m) => {
                let m = m.clone();
                let d = lg.disch(ctx, &m, f_thm.clone())?;
                lg.not_intro(ctx, d)?
            }
            None => lg.ccontr(ctx, lit, f_thm.clone())?,
        };
        let asms: Vec<FolLit> = fol_lits
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, l)| negate_lit(l))
            .collect();
        db.push(FolRule {
            asms,
            concl: fol_lits[i].clone(),
            vars: qvars.clone(),
            thm: thm_i,
        });
    }

    // support clauses additionally provide the refutation-head rule
    if support {
        db.push(FolRule {
            asms: fol_lits.iter().map(negate_lit).collect(),
            concl: (FALSE_CODE, vec![]),
            vars: qvars.clone(),
            thm: f_thm,
        });
    }
    Ok(())
}

// split a theorem into its conjuncts, recursively
fn split_conj_thms(ctx: &mut Ctx, lg: &Logic, th: Thm, out: &mut Vec<Thm>) -> Result<()> {
    if logic::dest_conj(th.concl()).is_some() {
        let (a, b) = lg.conj_pair(ctx, th)?;
        split_conj_thms(ctx, lg, a, out)?;
        split_conj_thms(ctx, lg, b, out)?;
    } else {
        out.push(th);
    }
    Ok(())
}

// ---- equality axioms (optional) ----

fn collect_symbols(
    t: &Term,
    is_atom: bool,
    preds: &mut Vec<(Term, usize)>,
    funs: &mut Vec<(Term, usize)>,
) {
    let (hd, args) = t.unfold_app();
    if hd.as_lambda().is_some() {
        return;
    }
    let entry = (hd.clone(), args.len());
    let tgt = if is_atom { &mut *preds } else { &mut *funs };
    if !args.is_empty() && !tgt.contains(&entry) {
        tgt.push(entry);
    }
    for a in args {
        collect_symbols(a, false, preds, funs);
    }
}

// `x1 = y1 ==> … ==> f xs = f ys`, universally quantified
fn congruence_thm(ctx: &mut Ctx, lg: &Logic, hd: &Term, arity: usize) -> Result<Thm> {
    let (arg_tys, _) = hd.ty().unfold_fun();
    if arg_tys.len() < arity {
        return Err(Error::new("congruence: arity exceeds the symbol's type"));
    }
    let mut xs = vec![];
    let mut ys = vec![];
    for (i, ty) in arg_tys.iter().take(arity).enumerate() {
        xs.push(Var::from_str(&format!("x{}", i), (*ty).clone()));
        ys.push(Var::from_str(&format!("y{}", i), (*ty).clone()));
    }
    let mut th = ctx.thm_refl(hd.clone());
    let mut eqs = vec![];
    for (x, y) in xs.iter().zip(ys.iter()) {
        let eq = {
            let ex = ctx.mk_var(x.clone());
            let ey = ctx.mk_var(y.clone());
            ctx.mk_eq_app(ex, ey)?
        };
        let a = ctx.thm_assume(eq.clone())?;
        th = ctx.thm_congr(th, a)?;
        eqs.push(eq);
    }
    // predicates conclude `P xs ==> P ys` instead of an equation
    if th.concl().ty().is_bool() && hd.ty().unfold_fun().0.len() == arity {
        if let Some((l, _)) = th.concl().unfold_eq() {
            if l.ty().is_bool() {
                let a = ctx.thm_assume(l.clone())?;
                let l = l.clone();
                let moved = ctx.thm_bool_eq(a, th)?;
                th = lg.disch(ctx, &l, moved)?;
            }
        }
    }
    for eq in eqs.iter().rev() {
        th = lg.disch(ctx, eq, th)?;
    }
    let mut vars = xs;
    vars.extend(ys);
    lg.gen_l(ctx, &vars, th)
}

fn eq_axiom_thms(ctx: &mut Ctx, lg: &Logic, clause_thms: &[Thm]) -> Result<Vec<Thm>> {
    let mut preds = vec![];
    let mut funs = vec![];
    for th in clause_thms {
        let stripped = {
            let (_, b) = logic::strip_forall(th.concl());
            b
        };
        for lit in logic::disjuncts(&stripped) {
            let atom = logic::dest_neg(&lit).cloned().unwrap_or(lit);
            collect_symbols(&atom, true, &mut preds, &mut funs);
        }
    }
    let mut out = vec![];
    // reflexivity at every function argument type
    let mut tys = vec![];
    for (hd, ar) in funs.iter().chain(preds.iter()) {
        for ty in hd.ty().unfold_fun().0.iter().take(*ar) {
            if !tys.contains(*ty) {
                tys.push((*ty).clone());
            }
        }
    }
    for ty in tys {
        let x = Var::from_str("x", ty);
        let r = {
            let e = ctx.mk_var(x.clone());
            ctx.thm_refl(e)
        };
        out.push(lg.gen(ctx, &x, r)?);
    }
    for (hd, ar) in funs.iter().chain(preds.iter()) {
        out.push(congruence_thm(ctx, lg, hd, *ar)?);
    }
    Ok(out)
}

// ---- the search proper ----

#[derive(Debug)]
enum ProofKind {
    /// Closed against an ancestor (replayed as an assumption).
    Ancestor,
    /// Expanded with a rule instance at the given offset.
    Rule(usize, i64),
}

#[derive(Debug)]
struct FolProof {
    lit: FolLit,
    kind: ProofKind,
    subs: Vec<FolProof>,
}

// persistent ancestor list
struct AncCell {
    lit: FolLit,
    next: Option<Rc<AncCell>>,
}

type Ancestors = Option<Rc<AncCell>>;

fn anc_iter(a: &Ancestors) -> impl Iterator<Item = &FolLit> {
    std::iter::successors(a.as_ref(), |c| c.next.as_ref()).map(|c| &c.lit)
}

struct GoalEntry {
    lit: FolLit,
    anc: Ancestors,
    /// per-branch bound, used when the metric is depth
    depth: usize,
}

// outcome of exploring one goal's alternatives; `Cut` prunes the
// remaining alternatives of the current goal (a "free" ancestor
// closure already failed, nothing else can do better), keeping the
// control flow in the result type rather than in unwinding
enum SRes {
    Found(Vec<FolProof>, usize),
    Fail,
    Cut,
}

struct Search<'a> {
    db: &'a RuleDb,
    params: &'a MesonParams,
    env: FnvHashMap<i64, FolTerm>,
    trail: Vec<i64>,
    offset: i64,
    offset_rules: FnvHashMap<i64, usize>,
}

impl<'a> Search<'a> {
    fn new(db: &'a RuleDb, params: &'a MesonParams) -> Self {
        Search {
            db,
            params,
            env: fnv::new_table_with_cap(64),
            trail: vec![],
            offset: OFF_INC,
            offset_rules: fnv::new_table_with_cap(16),
        }
    }

    fn bind(&mut self, v: i64, t: FolTerm) {
        self.env.insert(v, t);
        self.trail.push(v);
    }

    fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let v = self.trail.pop().expect("trail");
            self.env.remove(&v);
        }
    }

    // resolve the top of a term through the instantiation graph
    fn deref(&self, t: &FolTerm) -> FolTerm {
        let mut t = t.clone();
        while let FolTerm::V(v) = t {
            match self.env.get(&v) {
                Some(u) => t = u.clone(),
                None => return FolTerm::V(v),
            }
        }
        t
    }

    fn occurs(&self, v: i64, t: &FolTerm) -> bool {
        match self.deref(t) {
            FolTerm::V(w) => w == v,
            FolTerm::Fn(_, args) => args.iter().any(|a| self.occurs(v, a)),
        }
    }

    fn unify(&mut self, a: &FolTerm, b: &FolTerm) -> bool {
        let a = self.deref(a);
        let b = self.deref(b);
        match (&a, &b) {
            (FolTerm::V(v), FolTerm::V(w)) if v == w => true,
            (FolTerm::V(v), _) => {
                if self.occurs(*v, &b) {
                    false
                } else {
                    self.bind(*v, b.clone());
                    true
                }
            }
            (_, FolTerm::V(w)) => {
                if self.occurs(*w, &a) {
                    false
                } else {
                    self.bind(*w, a.clone());
                    true
                }
            }
            (FolTerm::Fn(c1, args1), FolTerm::Fn(c2, args2)) => {
                c1 == c2
                    && args1.len() == args2.len()
                    && args1.iter().zip(args2.iter()).all(|(x, y)| self.unify(x, y))
            }
        }
    }

    fn unify_lit(&mut self, l1: &FolLit, l2: &FolLit) -> bool {
        l1.0 == l2.0
            && l1.1.len() == l2.1.len()
            && l1.1.iter().zip(l2.1.iter()).all(|(x, y)| self.unify(x, y))
    }

    fn resolve_deep(&self, t: &FolTerm) -> FolTerm {
        match self.deref(t) {
            FolTerm::V(v) => FolTerm::V(v),
            FolTerm::Fn(c, args) => {
                FolTerm::Fn(c, args.iter().map(|a| self.resolve_deep(a)).collect())
            }
        }
    }

    fn lits_identical(&self, l1: &FolLit, l2: &FolLit) -> bool {
        l1.0 == l2.0
            && l1.1.len() == l2.1.len()
            && l1
                .1
                .iter()
                .zip(l2.1.iter())
                .all(|(a, b)| self.resolve_deep(a) == self.resolve_deep(b))
    }

    // solve a whole goal list, threading the shared inference budget
    fn solve_list(&mut self, goals: &[GoalEntry], budget: usize) -> SRes {
        let Some((g, rest)) = goals.split_first() else {
            return SRes::Found(vec![], budget);
        };

        // divide and conquer on long conjunctive lists
        if !self.params.depth && goals.len() >= self.params.split_limit && self.params.skew > 1 {
            let half = goals.len() / 2;
            let (left, right) = goals.split_at(half);
            let caps = {
                let b1 = budget * (self.params.skew - 1) / self.params.skew;
                [b1, budget / self.params.skew]
            };
            for cap in caps {
                let mark = self.trail.len();
                match self.solve_list(left, cap.min(budget)) {
                    SRes::Found(mut ps, rem_l) => {
                        let spent = cap.min(budget) - rem_l;
                        match self.solve_list(right, budget - spent) {
                            SRes::Found(ps_r, rem) => {
                                ps.extend(ps_r);
                                return SRes::Found(ps, rem);
                            }
                            _ => self.undo_to(mark),
                        }
                    }
                    _ => self.undo_to(mark),
                }
            }
            return SRes::Fail;
        }

        // cycle check: an identical same-sign ancestor means a loop
        for a in anc_iter(&g.anc) {
            if self.lits_identical(&g.lit, a) {
                return SRes::Fail;
            }
        }

        // ancestor closure: unify the negation against an ancestor
        let neg = negate_lit(&g.lit);
        for a in anc_iter(&g.anc) {
            if a.0 != neg.0 {
                continue;
            }
            let mark = self.trail.len();
            if self.unify_lit(&neg, a) {
                let free = self.trail.len() == mark;
                match self.solve_list(rest, budget) {
                    SRes::Found(mut ps, rem) => {
                        let node = FolProof {
                            lit: g.lit.clone(),
                            kind: ProofKind::Ancestor,
                            subs: vec![],
                        };
                        ps.insert(0, node);
                        return SRes::Found(ps, rem);
                    }
                    _ => {
                        self.undo_to(mark);
                        if free {
                            // a free closure failed only because of the
                            // remaining goals; other alternatives for
                            // this goal cannot help them
                            return SRes::Cut;
                        }
                    }
                }
            } else {
                self.undo_to(mark);
            }
        }

        // rule expansions
        let db = self.db;
        for &ridx in db.candidates(g.lit.0) {
            if budget == 0 {
                return SRes::Fail;
            }
            if self.params.depth && g.depth == 0 {
                return SRes::Fail;
            }
            let mark = self.trail.len();
            let off = self.offset;
            let concl_o = offset_lit(&db.rules[ridx].concl, off);
            if !self.unify_lit(&concl_o, &g.lit) {
                self.undo_to(mark);
                continue;
            }
            self.offset += OFF_INC;
            self.offset_rules.insert(off, ridx);
            let child_anc = Some(Rc::new(AncCell {
                lit: g.lit.clone(),
                next: g.anc.clone(),
            }));
            let child_depth = if self.params.depth { g.depth - 1 } else { g.depth };
            let mut new_goals: Vec<GoalEntry> = db.rules[ridx]
                .asms
                .iter()
                .map(|l| GoalEntry {
                    lit: offset_lit(l, off),
                    anc: child_anc.clone(),
                    depth: child_depth,
                })
                .collect();
            let n_asms = new_goals.len();
            for r in rest {
                new_goals.push(GoalEntry {
                    lit: r.lit.clone(),
                    anc: r.anc.clone(),
                    depth: r.depth,
                });
            }
            let child_budget = if self.params.depth { budget } else { budget - 1 };
            match self.solve_list(&new_goals, child_budget) {
                SRes::Found(mut ps, rem) => {
                    let rest_ps = ps.split_off(n_asms);
                    let node = FolProof {
                        lit: g.lit.clone(),
                        kind: ProofKind::Rule(ridx, off),
                        subs: ps,
                    };
                    let mut out = vec![node];
                    out.extend(rest_ps);
                    return SRes::Found(out, rem);
                }
                SRes::Cut | SRes::Fail => {
                    self.undo_to(mark);
                }
            }
        }
        SRes::Fail
    }
}

// ---- replay ----

struct Replay<'a> {
    intern: &'a Interner,
    db: &'a RuleDb,
    search: &'a Search<'a>,
}

impl<'a> Replay<'a> {
    fn hol_var(&self, code: i64) -> Result<Var> {
        let local = code % OFF_INC;
        let off = code - local;
        let ridx = self
            .search
            .offset_rules
            .get(&off)
            .ok_or_else(|| Error::new("meson replay: unknown variable offset"))?;
        self.db.rules[*ridx]
            .vars
            .get(local as usize)
            .cloned()
            .ok_or_else(|| Error::new("meson replay: variable code out of range"))
    }

    fn hol_of_term(&self, ctx: &Ctx, t: &FolTerm) -> Result<Term> {
        match self.search.deref(t) {
            FolTerm::V(v) => Ok(ctx.mk_var(self.hol_var(v)?)),
            FolTerm::Fn(c, args) => {
                let hd = self.intern.head_term(c).clone();
                let mut e = hd;
                for a in &args {
                    let ha = self.hol_of_term(ctx, a)?;
                    e = ctx.mk_app(e, ha)?;
                }
                Ok(e)
            }
        }
    }

    fn hol_of_lit(&self, ctx: &Ctx, l: &FolLit) -> Result<Term> {
        let code = l.0.abs();
        let hd = self.intern.head_term(code).clone();
        let mut atom = hd;
        for a in &l.1 {
            let ha = self.hol_of_term(ctx, a)?;
            atom = ctx.mk_app(atom, ha)?;
        }
        if l.0 < 0 {
            logic::mk_not(ctx, atom)
        } else {
            Ok(atom)
        }
    }

    fn replay(&self, ctx: &mut Ctx, lg: &Logic, p: &FolProof) -> Result<Thm> {
        match p.kind {
            ProofKind::Ancestor => {
                let t = self.hol_of_lit(ctx, &p.lit)?;
                ctx.thm_assume(t)
            }
            ProofKind::Rule(ridx, off) => {
                let rule = &self.db.rules[ridx];
                let mut s = Subst::new();
                for (i, v) in rule.vars.iter().enumerate() {
                    let code = i as i64 + off;
                    if let Some(t) = self.search.env.get(&code) {
                        let ht = self.hol_of_term(ctx, t)?;
                        s.add_binding(v.clone(), ht);
                    }
                }
                let mut th = ctx.thm_instantiate(rule.thm.clone(), &s)?;
                for sub in &p.subs {
                    let child = self.replay(ctx, lg, sub)?;
                    th = lg.prove_hyp(ctx, child, th)?;
                }
                // discharge a self-negation left by ancestor closures
                let neg_c = neg_term(ctx, th.concl())?;
                if th.hyps().iter().any(|h| alpha_eq(h, &neg_c)) {
                    th = discharge_self_neg(ctx, lg, th, &neg_c)?;
                }
                Ok(th)
            }
        }
    }
}

// from `A, neg c |- c` conclude `A |- c`
fn discharge_self_neg(ctx: &mut Ctx, lg: &Logic, th: Thm, neg_c: &Term) -> Result<Thm> {
    let c = th.concl().clone();
    let d = lg.disch(ctx, neg_c, th)?; // A |- neg c ==> c
    match logic::dest_neg(&c) {
        None => lg.from_neg_imp(ctx, d),
        Some(_) => {
            // c = ~m, hypothesis was m: from `m ==> ~m` conclude `~m`
            let m = neg_c.clone();
            let a = ctx.thm_assume(m.clone())?;
            let nm = lg.mp(ctx, d, a)?; // {m} |- ~m
            let ne = lg.not_elim(ctx, nm)?;
            let a2 = ctx.thm_assume(m.clone())?;
            let ff = lg.mp(ctx, ne, a2)?; // {m} |- F
            let d2 = lg.disch(ctx, &m, ff)?;
            lg.not_intro(ctx, d2)
        }
    }
}

// ---- the tactic ----

/// The MESON tactic: strip the goal structurally, refute its negation
/// together with the given assumption clauses, and rebuild the proof
/// through the kernel.
#[derive(Debug)]
pub struct MesonTactic {
    lg: Logic,
    assumptions: Vec<Thm>,
    params: MesonParams,
}

/// Build a MESON tactic with the standard iterative-deepening bounds.
pub fn meson(
    lg: &Logic,
    assumptions: Vec<Thm>,
    min_size: usize,
    max_size: usize,
    step: usize,
) -> MesonTactic {
    MesonTactic {
        lg: lg.clone(),
        assumptions,
        params: MesonParams {
            min_size,
            max_size,
            step,
            ..MesonParams::default()
        },
    }
}

impl MesonTactic {
    pub fn new(lg: &Logic, assumptions: Vec<Thm>, params: MesonParams) -> Self {
        MesonTactic {
            lg: lg.clone(),
            assumptions,
            params,
        }
    }

    fn solve_term(&self, ctx: &mut Ctx, concl: &Term, extra: &[Thm]) -> Result<Thm> {
        let lg = &self.lg;

        enum StripOp {
            Gen(Var),
            Disch(Term),
        }

        // structural stripping only; NNF/Skolemization belong to the caller
        let mut ops = vec![];
        let mut asm_thms: Vec<Thm> = vec![];
        let mut c = concl.clone();
        let mut avoid: Vars = c.free_vars();
        loop {
            if let Some((v, body)) = logic::dest_forall(&c) {
                let (v, body) = (v.clone(), body.clone());
                let v2 = ctx.variant(&avoid, &v);
                avoid.push(v2.clone());
                let mut s = Subst::new();
                s.add_binding(v.clone(), ctx.mk_var(v2.clone()));
                c = ctx.subst(&body, &s)?;
                ops.push(StripOp::Gen(v2));
                continue;
            }
            if let Some((a, b)) = logic::dest_imp(&c) {
                let (a, b) = (a.clone(), b.clone());
                let th_a = ctx.thm_assume(a.clone())?;
                split_conj_thms(ctx, lg, th_a, &mut asm_thms)?;
                ops.push(StripOp::Disch(a));
                c = b;
                continue;
            }
            break;
        }

        // clause set: user assumptions, goal-local assumptions, and the
        // negated conclusion (the support set)
        let mut clause_thms: Vec<Thm> = vec![];
        for th in self.assumptions.iter().chain(extra.iter()) {
            split_conj_thms(ctx, lg, th.clone(), &mut clause_thms)?;
        }
        clause_thms.extend(asm_thms.iter().cloned());
        let neg_goal = {
            let nt = logic::mk_not(ctx, c.clone())?;
            ctx.thm_assume(nt)?
        };
        if self.params.eq_axioms {
            let mut all = clause_thms.clone();
            all.push(neg_goal.clone());
            let eqs = eq_axiom_thms(ctx, lg, &all)?;
            clause_thms.extend(eqs);
        }

        let mut intern = Interner::new();
        let mut db = RuleDb::default();
        for th in &clause_thms {
            rules_of_thm(ctx, lg, &mut intern, &mut db, th.clone(), false)?;
        }
        rules_of_thm(ctx, lg, &mut intern, &mut db, neg_goal, true)?;

        // iterative deepening
        let params = &self.params;
        let mut bound = params.min_size;
        let proofs = loop {
            let mut search = Search::new(&db, params);
            let goals = [GoalEntry {
                lit: (FALSE_CODE, vec![]),
                anc: None,
                depth: bound,
            }];
            match search.solve_list(&goals, bound.max(1)) {
                SRes::Found(ps, _) => break Some((search, ps)),
                SRes::Fail | SRes::Cut => (),
            }
            if bound >= params.max_size {
                break None;
            }
            bound = (bound + params.step.max(1)).min(params.max_size);
        };
        let (search, proofs) = proofs.ok_or_else(|| Error::exhausted(params.max_size))?;

        // replay to `… |- F`, then close classically
        let replayer = Replay {
            intern: &intern,
            db: &db,
            search: &search,
        };
        let th_f = replayer.replay(ctx, lg, &proofs[0])?;
        if !logic::is_false(th_f.concl()) {
            return Err(Error::new("meson replay: expected a refutation"));
        }
        let mut th = lg.ccontr(ctx, &c, th_f)?;

        // rebuild the original statement
        for op in ops.iter().rev() {
            th = match op {
                StripOp::Disch(a) => lg.disch(ctx, a, th)?,
                StripOp::Gen(v) => lg.gen(ctx, v, th)?,
            };
        }
        if !alpha_eq(th.concl(), concl) {
            return Err(Error::new("meson: rebuilt a different statement"));
        }
        let al = logic::alpha_thm(ctx, th.concl(), concl)?;
        ctx.thm_bool_eq(th, al)
    }
}

impl Tactic for MesonTactic {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        let extra: Vec<Thm> = goal.hyps.iter().map(|(_, th)| th.clone()).collect();
        let th = self.solve_term(ctx, &goal.concl, &extra)?;
        Ok(Progress::done(th))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algo::tactic::prove;
    use crate::kernel::Type;
    use crate::logic::{mk_forall_l, mk_imp};

    fn setup() -> (Ctx, Logic, Type, Term) {
        let mut ctx = Ctx::new();
        let lg = Logic::install(&mut ctx).unwrap();
        ctx.new_ty_const("num", 0).unwrap();
        let num = ctx.mk_ty_app("num", vec![]).unwrap();
        let le_ty = ctx.mk_arrow(num.clone(), ctx.mk_arrow(num.clone(), ctx.mk_bool()));
        ctx.new_const("<=", le_ty.clone()).unwrap();
        let le = ctx.mk_const("<=", le_ty).unwrap();
        (ctx, lg, num, le)
    }

    fn mk_le(ctx: &Ctx, le: &Term, a: Term, b: Term) -> Term {
        let t = ctx.mk_app(le.clone(), a).unwrap();
        ctx.mk_app(t, b).unwrap()
    }

    #[test]
    fn test_meson_transitivity() {
        // assumptions: !x. x <= x  and  !x y z. x <= y /\ y <= z ==> x <= z
        // goal: !x y z. x <= y /\ y <= z ==> x <= z (size 0 suffices)
        let (mut ctx, lg, num, le) = setup();
        let x = Var::from_str("x", num.clone());
        let y = Var::from_str("y", num.clone());
        let z = Var::from_str("z", num.clone());

        let refl_thm = {
            let t = mk_le(&ctx, &le, ctx.mk_var(x.clone()), ctx.mk_var(x.clone()));
            let t = crate::logic::mk_forall(&ctx, x.clone(), t).unwrap();
            ctx.thm_axiom("le_refl", t).unwrap()
        };
        let trans_t = {
            let xy = mk_le(&ctx, &le, ctx.mk_var(x.clone()), ctx.mk_var(y.clone()));
            let yz = mk_le(&ctx, &le, ctx.mk_var(y.clone()), ctx.mk_var(z.clone()));
            let xz = mk_le(&ctx, &le, ctx.mk_var(x.clone()), ctx.mk_var(z.clone()));
            let ante = crate::logic::mk_conj(&ctx, xy, yz).unwrap();
            let imp = mk_imp(&ctx, ante, xz).unwrap();
            mk_forall_l(&ctx, &[x.clone(), y.clone(), z.clone()], imp).unwrap()
        };
        let trans_thm = ctx.thm_axiom("le_trans", trans_t.clone()).unwrap();

        let tac = meson(&lg, vec![refl_thm, trans_thm], 0, 10, 1);
        let th = prove(&mut ctx, &trans_t, &tac).unwrap();
        assert_eq!(th.concl(), &trans_t);
        assert!(th.hyps().is_empty());
    }

    #[test]
    fn test_meson_modus_ponens() {
        // p, p ==> q  |-  q  (propositional)
        let (mut ctx, lg, _num, _le) = setup();
        let b = ctx.mk_bool();
        ctx.new_const("p0", b.clone()).unwrap();
        ctx.new_const("q0", b.clone()).unwrap();
        let p = ctx.mk_const("p0", b.clone()).unwrap();
        let q = ctx.mk_const("q0", b).unwrap();
        let th_p = ctx.thm_axiom("ax_p", p.clone()).unwrap();
        let imp_t = mk_imp(&ctx, p, q.clone()).unwrap();
        let th_imp = ctx.thm_axiom("ax_pq", imp_t).unwrap();
        let tac = meson(&lg, vec![th_p, th_imp], 0, 10, 1);
        let th = prove(&mut ctx, &q, &tac).unwrap();
        assert_eq!(th.concl(), &q);
    }

    #[test]
    fn test_meson_exhaustion_is_typed() {
        // an unprovable goal exhausts the budget rather than claiming
        // a disproof
        let (mut ctx, lg, _num, _le) = setup();
        let b = ctx.mk_bool();
        ctx.new_const("r0", b.clone()).unwrap();
        let r = ctx.mk_const("r0", b).unwrap();
        let tac = meson(&lg, vec![], 0, 3, 1);
        let err = prove(&mut ctx, &r, &tac).unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::error::ErrorKind::SearchExhausted(3)
        ));
    }

    #[test]
    fn test_meson_uses_goal_assumptions() {
        // a ==> a, with the antecedent stripped into the clause set
        let (mut ctx, lg, _num, _le) = setup();
        let b = ctx.mk_bool();
        ctx.new_const("a0", b.clone()).unwrap();
        let a = ctx.mk_const("a0", b).unwrap();
        let goal_t = mk_imp(&ctx, a.clone(), a).unwrap();
        let tac = meson(&lg, vec![], 0, 5, 1);
        let th = prove(&mut ctx, &goal_t, &tac).unwrap();
        assert_eq!(th.concl(), &goal_t);
    }

    #[test]
    fn test_meson_quantified_goal() {
        // !x. P x ==> P x
        let (mut ctx, lg, num, _le) = setup();
        let pt = ctx.mk_arrow(num.clone(), ctx.mk_bool());
        ctx.new_const("P0", pt.clone()).unwrap();
        let p = ctx.mk_const("P0", pt).unwrap();
        let x = Var::from_str("x", num);
        let goal_t = {
            let px = ctx.mk_app(p, ctx.mk_var(x.clone())).unwrap();
            let imp = mk_imp(&ctx, px.clone(), px).unwrap();
            crate::logic::mk_forall(&ctx, x, imp).unwrap()
        };
        let tac = meson(&lg, vec![], 0, 5, 1);
        let th = prove(&mut ctx, &goal_t, &tac).unwrap();
        assert_eq!(th.concl(), &goal_t);
    }

    #[test]
    fn test_meson_equality_axioms() {
        // f a = f b from a = b, using the congruence axioms
        let (mut ctx, lg, num, _le) = setup();
        let n2n = ctx.mk_arrow(num.clone(), num.clone());
        ctx.new_const("fa", n2n.clone()).unwrap();
        ctx.new_const("ca", num.clone()).unwrap();
        ctx.new_const("cb", num.clone()).unwrap();
        let f = ctx.mk_const("fa", n2n).unwrap();
        let a = ctx.mk_const("ca", num.clone()).unwrap();
        let b = ctx.mk_const("cb", num).unwrap();
        let ab = ctx.mk_eq_app(a.clone(), b.clone()).unwrap();
        let th_ab = ctx.thm_axiom("ax_ab", ab).unwrap();
        let goal_t = {
            let fa_ = ctx.mk_app(f.clone(), a).unwrap();
            let fb = ctx.mk_app(f, b).unwrap();
            ctx.mk_eq_app(fa_, fb).unwrap()
        };
        let mut params = MesonParams::default();
        params.max_size = 20;
        params.eq_axioms = true;
        let tac = MesonTactic::new(&lg, vec![th_ab], params);
        let th = prove(&mut ctx, &goal_t, &tac).unwrap();
        assert_eq!(th.concl(), &goal_t);
    }
}
