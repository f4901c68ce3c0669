//! Goal-directed proof: tactics.
//!
//! A goal pairs a list of labelled assumptions (each available as a
//! theorem) with a boolean conclusion. A tactic reduces a goal to
//! subgoals together with a *justification*: a function that, given
//! theorems proving the subgoals in order, rebuilds a theorem proving
//! the original goal through ordinary kernel calls. Tactics can
//! therefore never produce a wrong theorem; a malformed tactic simply
//! fails when its justification tries to compose.

use super::conv::Converter;
use crate::error::{Error, Result};
use crate::kernel::{alpha_eq, Ctx, Subst, Symbol, Term, Thm, Vars};
use crate::logic::{self, Logic};
use std::fmt;

/// A proof goal: labelled assumptions plus a conclusion to establish.
#[derive(Clone, Debug)]
pub struct Goal {
    pub hyps: Vec<(Symbol, Thm)>,
    pub concl: Term,
}

impl Goal {
    /// A goal with no assumptions.
    pub fn new(concl: Term) -> Self {
        Goal {
            hyps: vec![],
            concl,
        }
    }

    /// Add a labelled assumption.
    pub fn assume(&self, label: impl Into<Symbol>, th: Thm) -> Goal {
        let mut g = self.clone();
        g.hyps.push((label.into(), th));
        g
    }

    fn fresh_label(&self) -> Symbol {
        Symbol::from_str(&format!("H{}", self.hyps.len()))
    }

    // all variables free in the goal (assumption conclusions + concl)
    fn free_vars(&self) -> Vars {
        let mut out: Vars = self.concl.free_vars();
        for (_, th) in &self.hyps {
            for v in th.concl().free_vars() {
                if !out.contains(&v) {
                    out.push(v)
                }
            }
        }
        out
    }
}

/// Rebuilds the parent theorem from the subgoal theorems, in order.
pub type Justification = Box<dyn Fn(&mut Ctx, &[Thm]) -> Result<Thm>>;

/// The result of applying a tactic: subgoals plus the justification.
pub struct Progress {
    pub subgoals: Vec<Goal>,
    pub justify: Justification,
}

impl fmt::Debug for Progress {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        write!(out, "<{} subgoals>", self.subgoals.len())
    }
}

impl Progress {
    /// No subgoals: the justification closes the goal on its own.
    pub fn done(th: Thm) -> Self {
        Progress {
            subgoals: vec![],
            justify: Box::new(move |_, ths| {
                if !ths.is_empty() {
                    return Err(Error::new("justification: expected no theorems"));
                }
                Ok(th.clone())
            }),
        }
    }

    /// One subgoal passed through unchanged.
    fn identity(g: Goal) -> Self {
        Progress {
            subgoals: vec![g],
            justify: Box::new(|_, ths| match ths {
                [th] => Ok(th.clone()),
                _ => Err(Error::new("justification: expected exactly one theorem")),
            }),
        }
    }
}

/// A goal-reduction step.
pub trait Tactic: fmt::Debug {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress>;
}

impl<'a, T: Tactic + ?Sized> Tactic for &'a T {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        (**self).apply(ctx, goal)
    }
}

// realign `th` (whose conclusion is alpha-equivalent to `target`) so
// its conclusion is exactly `target`
fn align_concl(ctx: &mut Ctx, th: Thm, target: &Term) -> Result<Thm> {
    if th.concl() == target {
        return Ok(th);
    }
    let al = logic::alpha_thm(ctx, th.concl(), target)?;
    ctx.thm_bool_eq(th, al)
}

// ---- combinators ----

/// Apply the first tactic, then the second to every subgoal it left.
#[derive(Debug)]
pub struct Then<A, B>(pub A, pub B);

impl<A: Tactic, B: Tactic> Tactic for Then<A, B> {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        let p1 = self.0.apply(ctx, goal)?;
        let mut subgoals = vec![];
        let mut parts: Vec<(usize, Justification)> = vec![];
        for g in &p1.subgoals {
            let p2 = self.1.apply(ctx, g)?;
            parts.push((p2.subgoals.len(), p2.justify));
            subgoals.extend(p2.subgoals);
        }
        let j1 = p1.justify;
        let justify: Justification = Box::new(move |ctx, ths| {
            let total: usize = parts.iter().map(|(n, _)| n).sum();
            if ths.len() != total {
                return Err(Error::new("justification: wrong number of theorems"));
            }
            let mut mid = Vec::with_capacity(parts.len());
            let mut i = 0;
            for (n, j) in &parts {
                let chunk = &ths[i..i + n];
                i += n;
                mid.push(j(ctx, chunk)?);
            }
            j1(ctx, &mid)
        });
        Ok(Progress { subgoals, justify })
    }
}

/// Try the first tactic; if it fails recoverably, apply the second.
#[derive(Debug)]
pub struct OrElse<A, B>(pub A, pub B);

impl<A: Tactic, B: Tactic> Tactic for OrElse<A, B> {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        match self.0.apply(ctx, goal) {
            Ok(p) => Ok(p),
            Err(e) if e.is_recoverable() => self.1.apply(ctx, goal),
            Err(e) => Err(e),
        }
    }
}

/// A tactic that never fails: recoverable failure leaves the goal as is.
#[derive(Debug)]
pub struct TryTac<T>(pub T);

impl<T: Tactic> Tactic for TryTac<T> {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        match self.0.apply(ctx, goal) {
            Ok(p) => Ok(p),
            Err(e) if e.is_recoverable() => Ok(Progress::identity(goal.clone())),
            Err(e) => Err(e),
        }
    }
}

/// Apply the tactic repeatedly to the goal and all resulting subgoals
/// until it no longer applies. Never fails. A step that returns the
/// goal unchanged counts as "no longer applies".
#[derive(Debug)]
pub struct Repeat<T>(pub T);

impl<T: Tactic> Tactic for Repeat<T> {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        fn go(t: &dyn Tactic, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
            let p = match t.apply(ctx, goal) {
                Ok(p) => p,
                Err(e) if e.is_recoverable() => return Ok(Progress::identity(goal.clone())),
                Err(e) => return Err(e),
            };
            // no-progress guard
            if p.subgoals.len() == 1
                && alpha_eq(&p.subgoals[0].concl, &goal.concl)
                && p.subgoals[0].hyps.len() == goal.hyps.len()
            {
                return Ok(Progress::identity(goal.clone()));
            }
            // recurse into every subgoal, composing like `Then`
            let mut subgoals = vec![];
            let mut parts: Vec<(usize, Justification)> = vec![];
            for g in &p.subgoals {
                let p2 = go(t, ctx, g)?;
                parts.push((p2.subgoals.len(), p2.justify));
                subgoals.extend(p2.subgoals);
            }
            let j1 = p.justify;
            let justify: Justification = Box::new(move |ctx, ths| {
                let mut mid = Vec::with_capacity(parts.len());
                let mut i = 0;
                for (n, j) in &parts {
                    let chunk = ths
                        .get(i..i + n)
                        .ok_or_else(|| Error::new("justification: wrong number of theorems"))?;
                    i += n;
                    mid.push(j(ctx, chunk)?);
                }
                j1(ctx, &mid)
            });
            Ok(Progress { subgoals, justify })
        }
        go(&self.0, ctx, goal)
    }
}

// ---- basic tactics ----

/// Close the goal with an already-proved theorem.
#[derive(Debug)]
pub struct AcceptTac(pub Thm);

impl Tactic for AcceptTac {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        if !alpha_eq(self.0.concl(), &goal.concl) {
            return Err(Error::no_apply("accept: theorem does not prove the goal"));
        }
        let th = align_concl(ctx, self.0.clone(), &goal.concl)?;
        Ok(Progress::done(th))
    }
}

/// Close the goal with one of its assumptions.
#[derive(Debug)]
pub struct AssumptionTac;

impl Tactic for AssumptionTac {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        for (_, th) in &goal.hyps {
            if alpha_eq(th.concl(), &goal.concl) {
                let th = align_concl(ctx, th.clone(), &goal.concl)?;
                return Ok(Progress::done(th));
            }
        }
        Err(Error::no_apply("assumption: no assumption matches the goal"))
    }
}

/// Split a conjunction goal into its two halves.
#[derive(Debug)]
pub struct ConjTac(pub Logic);

impl Tactic for ConjTac {
    fn apply(&self, _ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        let (p, q) = logic::dest_conj(&goal.concl)
            .ok_or_else(|| Error::no_apply("conj_tac: goal is not a conjunction"))?;
        let g1 = Goal {
            hyps: goal.hyps.clone(),
            concl: p.clone(),
        };
        let g2 = Goal {
            hyps: goal.hyps.clone(),
            concl: q.clone(),
        };
        let lg = self.0.clone();
        let target = goal.concl.clone();
        Ok(Progress {
            subgoals: vec![g1, g2],
            justify: Box::new(move |ctx, ths| match ths {
                [th1, th2] => {
                    let th = lg.conj(ctx, th1.clone(), th2.clone())?;
                    align_concl(ctx, th, &target)
                }
                _ => Err(Error::new("conj_tac: expected two theorems")),
            }),
        })
    }
}

/// Move the antecedent of an implication goal into the assumptions.
#[derive(Debug)]
pub struct DischTac(pub Logic);

impl Tactic for DischTac {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        let (p, q) = logic::dest_imp(&goal.concl)
            .ok_or_else(|| Error::no_apply("disch_tac: goal is not an implication"))?;
        let (p, q) = (p.clone(), q.clone());
        let th_p = ctx.thm_assume(p.clone())?;
        let g = Goal {
            hyps: {
                let mut h = goal.hyps.clone();
                h.push((goal.fresh_label(), th_p));
                h
            },
            concl: q,
        };
        let lg = self.0.clone();
        let target = goal.concl.clone();
        Ok(Progress {
            subgoals: vec![g],
            justify: Box::new(move |ctx, ths| match ths {
                [th] => {
                    let d = lg.disch(ctx, &p, th.clone())?;
                    align_concl(ctx, d, &target)
                }
                _ => Err(Error::new("disch_tac: expected one theorem")),
            }),
        })
    }
}

/// Strip a universal quantifier, renaming the bound variable to a fresh
/// variant of itself.
#[derive(Debug)]
pub struct GenTac(pub Logic);

impl Tactic for GenTac {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        let (x, body) = logic::dest_forall(&goal.concl)
            .ok_or_else(|| Error::no_apply("gen_tac: goal is not universally quantified"))?;
        let (x, body) = (x.clone(), body.clone());
        let avoid = goal.free_vars();
        let x2 = ctx.variant(&avoid, &x);
        let body2 = {
            let mut s = Subst::new();
            s.add_binding(x.clone(), ctx.mk_var(x2.clone()));
            ctx.subst(&body, &s)?
        };
        let g = Goal {
            hyps: goal.hyps.clone(),
            concl: body2,
        };
        let lg = self.0.clone();
        let target = goal.concl.clone();
        Ok(Progress {
            subgoals: vec![g],
            justify: Box::new(move |ctx, ths| match ths {
                [th] => {
                    let gth = lg.gen(ctx, &x2, th.clone())?;
                    align_concl(ctx, gth, &target)
                }
                _ => Err(Error::new("gen_tac: expected one theorem")),
            }),
        })
    }
}

/// Provide a witness for an existential goal.
#[derive(Debug)]
pub struct ExistsTac(pub Logic, pub Term);

impl Tactic for ExistsTac {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        let (x, body) = logic::dest_exists(&goal.concl)
            .ok_or_else(|| Error::no_apply("exists_tac: goal is not an existential"))?;
        let (x, body) = (x.clone(), body.clone());
        let w = self.1.clone();
        if &x.ty != w.ty() {
            return Err(Error::no_apply("exists_tac: witness has the wrong type"));
        }
        let inst = {
            let mut s = Subst::new();
            s.add_binding(x, w.clone());
            ctx.subst(&body, &s)?
        };
        let g = Goal {
            hyps: goal.hyps.clone(),
            concl: inst,
        };
        let lg = self.0.clone();
        let target = goal.concl.clone();
        Ok(Progress {
            subgoals: vec![g],
            justify: Box::new(move |ctx, ths| match ths {
                [th] => lg.exists_intro(ctx, &target, &w, th.clone()),
                _ => Err(Error::new("exists_tac: expected one theorem")),
            }),
        })
    }
}

/// Rewrite the goal's conclusion with a conversion; closes the goal
/// outright when the conclusion converts to `T`.
pub struct ConvTac<C>(pub Logic, pub C);

impl<C: fmt::Debug> fmt::Debug for ConvTac<C> {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        write!(out, "ConvTac({:?})", self.1)
    }
}

impl<C: Converter> Tactic for ConvTac<C> {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        let th = match self.1.try_conv(ctx, &goal.concl)? {
            None => return Err(Error::no_apply("conv_tac: conversion did not apply")),
            Some(th) => th,
        };
        let (_, g2) = th
            .concl()
            .unfold_eq()
            .ok_or_else(|| Error::new("conv_tac: conversion returned a non-equation"))?;
        let g2 = g2.clone();
        let lg = self.0.clone();
        if logic::is_true(&g2) {
            // `|- g = T` closes the goal by itself
            let out = lg.eqt_elim(ctx, th)?;
            let out = align_concl(ctx, out, &goal.concl)?;
            return Ok(Progress::done(out));
        }
        let g = Goal {
            hyps: goal.hyps.clone(),
            concl: g2,
        };
        let target = goal.concl.clone();
        Ok(Progress {
            subgoals: vec![g],
            justify: Box::new(move |ctx, ths| match ths {
                [th2] => {
                    let back = logic::sym(ctx, th.clone())?;
                    let out = ctx.thm_bool_eq(th2.clone(), back)?;
                    align_concl(ctx, out, &target)
                }
                _ => Err(Error::new("conv_tac: expected one theorem")),
            }),
        })
    }
}

/// Case split on a disjunction theorem: one subgoal per disjunct, each
/// with the disjunct available as an assumption.
#[derive(Debug)]
pub struct DisjCasesTac(pub Logic, pub Thm);

impl Tactic for DisjCasesTac {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        let (p, q) = logic::dest_disj(self.1.concl())
            .ok_or_else(|| Error::no_apply("disj_cases_tac: theorem is not a disjunction"))?;
        let (p, q) = (p.clone(), q.clone());
        let th_p = ctx.thm_assume(p)?;
        let th_q = ctx.thm_assume(q)?;
        let g1 = goal.assume(goal.fresh_label(), th_p);
        let g2 = goal.assume(goal.fresh_label(), th_q);
        let lg = self.0.clone();
        let th_disj = self.1.clone();
        let target = goal.concl.clone();
        Ok(Progress {
            subgoals: vec![g1, g2],
            justify: Box::new(move |ctx, ths| match ths {
                [th1, th2] => {
                    let out = lg.disj_cases(ctx, th_disj.clone(), th1.clone(), th2.clone())?;
                    align_concl(ctx, out, &target)
                }
                _ => Err(Error::new("disj_cases_tac: expected two theorems")),
            }),
        })
    }
}

/// Eliminate an existential theorem: continue with a fresh witness
/// variable and the instantiated body as an assumption.
#[derive(Debug)]
pub struct ChooseTac(pub Logic, pub Thm);

impl Tactic for ChooseTac {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        let (x, body) = logic::dest_exists(self.1.concl())
            .ok_or_else(|| Error::no_apply("choose_tac: theorem is not an existential"))?;
        let (x, body) = (x.clone(), body.clone());
        let mut avoid = goal.free_vars();
        for v in self.1.concl().free_vars() {
            if !avoid.contains(&v) {
                avoid.push(v)
            }
        }
        let v = ctx.variant(&avoid, &x);
        let inst = {
            let mut s = Subst::new();
            s.add_binding(x, ctx.mk_var(v.clone()));
            ctx.subst(&body, &s)?
        };
        let th_inst = ctx.thm_assume(inst)?;
        let g = goal.assume(goal.fresh_label(), th_inst);
        let lg = self.0.clone();
        let th_ex = self.1.clone();
        Ok(Progress {
            subgoals: vec![g],
            justify: Box::new(move |ctx, ths| match ths {
                [th] => lg.choose(ctx, &v, th_ex.clone(), th.clone()),
                _ => Err(Error::new("choose_tac: expected one theorem")),
            }),
        })
    }
}

/// Split a conjunction theorem into both conjuncts, added as
/// assumptions.
#[derive(Debug)]
pub struct ConjCasesTac(pub Logic, pub Thm);

impl Tactic for ConjCasesTac {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        let lg = &self.0;
        if logic::dest_conj(self.1.concl()).is_none() {
            return Err(Error::no_apply("conj_cases_tac: theorem is not a conjunction"));
        }
        let (c1, c2) = lg.conj_pair(ctx, self.1.clone())?;
        let g = goal
            .assume(goal.fresh_label(), c1)
            .assume(Symbol::from_str(&format!("H{}", goal.hyps.len() + 1)), c2);
        Ok(Progress::identity(g))
    }
}

/// Backward chaining: match the conclusion of a (universally
/// quantified) implication against the goal, leaving its instantiated
/// antecedent as the subgoal. A theorem without an antecedent closes
/// the goal by instantiation.
#[derive(Debug)]
pub struct RuleTac(pub Logic, pub Thm);

impl Tactic for RuleTac {
    fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
        let lg = &self.0;
        let th_i = lg.spec_all(ctx, self.1.clone())?;
        match logic::dest_imp(th_i.concl()) {
            None => {
                let th = lg.part_match(ctx, self.1.clone(), &goal.concl)?;
                let th = align_concl(ctx, th, &goal.concl)?;
                Ok(Progress::done(th))
            }
            Some((_, c)) => {
                let m = super::unif::term_match(c, &goal.concl)
                    .ok_or_else(|| Error::no_apply("rule_tac: conclusion does not match"))?;
                let th_m = m.apply(ctx, &th_i)?;
                let (ante, _) = logic::dest_imp(th_m.concl())
                    .ok_or_else(|| Error::new("rule_tac: instantiation lost the implication"))?;
                let g = Goal {
                    hyps: goal.hyps.clone(),
                    concl: ante.clone(),
                };
                let lg = lg.clone();
                let target = goal.concl.clone();
                Ok(Progress {
                    subgoals: vec![g],
                    justify: Box::new(move |ctx, ths| match ths {
                        [th] => {
                            let out = lg.mp(ctx, th_m.clone(), th.clone())?;
                            align_concl(ctx, out, &target)
                        }
                        _ => Err(Error::new("rule_tac: expected one theorem")),
                    }),
                })
            }
        }
    }
}

// ---- the goal state ----

/// A worklist of pending goals plus the composed justification.
/// Terminal when the goal list is empty, at which point
/// [`GoalState::finish`] yields the final theorem.
pub struct GoalState {
    goals: Vec<Goal>,
    justify: Justification,
}

impl fmt::Debug for GoalState {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        write!(out, "<goal state: {} pending>", self.goals.len())
    }
}

impl GoalState {
    /// Start from a single goal.
    pub fn new(goal: Goal) -> Self {
        GoalState {
            goals: vec![goal],
            justify: Box::new(|_, ths| match ths {
                [th] => Ok(th.clone()),
                _ => Err(Error::new("goal state: expected exactly one theorem")),
            }),
        }
    }

    /// The pending goals, first goal is the current one.
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// No goals left?
    pub fn is_done(&self) -> bool {
        self.goals.is_empty()
    }

    /// Apply a tactic to the current (first) goal.
    pub fn apply(&mut self, ctx: &mut Ctx, tac: &dyn Tactic) -> Result<()> {
        let g = self
            .goals
            .first()
            .cloned()
            .ok_or_else(|| Error::new("goal state: no goal left"))?;
        let p = tac.apply(ctx, &g)?;
        let n = p.subgoals.len();
        let mut goals = p.subgoals;
        goals.extend(self.goals[1..].iter().cloned());
        let old_j = std::mem::replace(
            &mut self.justify,
            Box::new(|_, _| Err(Error::new("goal state: consumed"))),
        );
        let p_j = p.justify;
        self.justify = Box::new(move |ctx, ths| {
            if ths.len() < n {
                return Err(Error::new("goal state: wrong number of theorems"));
            }
            let th0 = p_j(ctx, &ths[..n])?;
            let mut rest = Vec::with_capacity(1 + ths.len() - n);
            rest.push(th0);
            rest.extend_from_slice(&ths[n..]);
            old_j(ctx, &rest)
        });
        self.goals = goals;
        Ok(())
    }

    /// Extract the final theorem once every goal is closed.
    pub fn finish(self, ctx: &mut Ctx) -> Result<Thm> {
        if !self.goals.is_empty() {
            return Err(crate::errorstr!(
                "goal state: {} goals still pending",
                self.goals.len()
            ));
        }
        (self.justify)(ctx, &[])
    }
}

/// Prove `concl` outright with the given tactic.
///
/// Fails unless the tactic closes the goal completely and the resulting
/// theorem has exactly the requested conclusion and no hypotheses.
pub fn prove(ctx: &mut Ctx, concl: &Term, tac: &dyn Tactic) -> Result<Thm> {
    if !concl.ty().is_bool() {
        return Err(Error::malformed("prove: conclusion must be boolean"));
    }
    let mut st = GoalState::new(Goal::new(concl.clone()));
    st.apply(ctx, tac)?;
    if !st.is_done() {
        return Err(crate::errorstr!(
            "prove: tactic left {} subgoals",
            st.goals().len()
        ));
    }
    let th = st.finish(ctx)?;
    if !alpha_eq(th.concl(), concl) {
        return Err(Error::new("prove: justification proved a different conclusion"));
    }
    let th = align_concl(ctx, th, concl)?;
    if !th.hyps().is_empty() {
        return Err(Error::new("prove: leftover hypotheses"));
    }
    Ok(th)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kernel::Var;
    use crate::logic::{mk_conj, mk_imp};

    fn setup() -> (Ctx, Logic) {
        let mut ctx = Ctx::new();
        let lg = Logic::install(&mut ctx).unwrap();
        (ctx, lg)
    }

    #[test]
    fn test_prove_conj_swap() {
        // p /\ q ==> q /\ p
        let (mut ctx, lg) = setup();
        let b = ctx.mk_bool();
        let p = ctx.mk_var_str("p", b.clone());
        let q = ctx.mk_var_str("q", b);
        let pq = mk_conj(&ctx, p.clone(), q.clone()).unwrap();
        let qp = mk_conj(&ctx, q.clone(), p.clone()).unwrap();
        let goal = mk_imp(&ctx, pq, qp).unwrap();

        // disch, split the hypothesis, split the goal, close by assumption
        let tac = Then(
            DischTac(lg.clone()),
            Then(
                SplitFirstHyp(lg.clone()),
                Then(ConjTac(lg.clone()), AssumptionTac),
            ),
        );
        let th = prove(&mut ctx, &goal, &tac).unwrap();
        assert_eq!(th.concl(), &goal);
        assert!(th.hyps().is_empty());
    }

    // helper tactic: split the most recent hypothesis (a conjunction)
    #[derive(Debug)]
    struct SplitFirstHyp(Logic);
    impl Tactic for SplitFirstHyp {
        fn apply(&self, ctx: &mut Ctx, goal: &Goal) -> Result<Progress> {
            let th = goal
                .hyps
                .last()
                .map(|(_, th)| th.clone())
                .ok_or_else(|| Error::no_apply("no hypothesis"))?;
            ConjCasesTac(self.0.clone(), th).apply(ctx, goal)
        }
    }

    #[test]
    fn test_justification_hyps_subset() {
        let (mut ctx, lg) = setup();
        let b = ctx.mk_bool();
        let p = ctx.mk_var_str("p", b.clone());
        let q = ctx.mk_var_str("q", b);
        let goal_t = mk_imp(&ctx, p.clone(), mk_imp(&ctx, q.clone(), p.clone()).unwrap()).unwrap();
        let tac = Then(DischTac(lg.clone()), Then(DischTac(lg.clone()), AssumptionTac));
        let th = prove(&mut ctx, &goal_t, &tac).unwrap();
        assert!(th.hyps().is_empty());
        assert_eq!(th.concl(), &goal_t);
    }

    #[test]
    fn test_orelse_and_repeat() {
        let (mut ctx, lg) = setup();
        let b = ctx.mk_bool();
        let p = ctx.mk_var_str("p", b.clone());
        let q = ctx.mk_var_str("q", b.clone());
        let r = ctx.mk_var_str("r", b);
        // p ==> q ==> r ==> r, with REPEAT disch then assumption
        let goal_t = mk_imp(
            &ctx,
            p,
            mk_imp(&ctx, q, mk_imp(&ctx, r.clone(), r.clone()).unwrap()).unwrap(),
        )
        .unwrap();
        let tac = Then(Repeat(DischTac(lg.clone())), AssumptionTac);
        let th = prove(&mut ctx, &goal_t, &tac).unwrap();
        assert_eq!(th.concl(), &goal_t);
    }

    #[test]
    fn test_gen_tac() {
        let (mut ctx, lg) = setup();
        let b = ctx.mk_bool();
        let x = Var::from_str("x", b);
        let body = {
            let e = ctx.mk_var(x.clone());
            mk_imp(&ctx, e.clone(), e).unwrap()
        };
        let goal_t = crate::logic::mk_forall(&ctx, x, body).unwrap();
        let tac = Then(GenTac(lg.clone()), Then(DischTac(lg.clone()), AssumptionTac));
        let th = prove(&mut ctx, &goal_t, &tac).unwrap();
        assert_eq!(th.concl(), &goal_t);
    }

    #[test]
    fn test_tactic_failure_is_recoverable() {
        let (mut ctx, lg) = setup();
        let b = ctx.mk_bool();
        let p = ctx.mk_var_str("p", b);
        // ConjTac on a non-conjunction: recoverable, so OrElse falls through
        let g = Goal::new(p.clone());
        let err = ConjTac(lg.clone()).apply(&mut ctx, &g).unwrap_err();
        assert!(err.is_recoverable());
    }
}
