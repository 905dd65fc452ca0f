use ndarray::{Array1, ArrayView2};
use rayon::prelude::*;
use tracing::debug;

use crate::algebra::Algebra;
use crate::error::{EvalError, EvalResult};
use crate::evaluate::{EvalOptions, check_finite};
use crate::graph::Graph;
use crate::node::{NodeIdx, NodeKind, VariableId};
use crate::operators::OpKind;
use crate::values::Values;

/// Operand of an instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Src {
    Var(VariableId),
    Const(u32),
    Slot(u32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Instr {
    pub op: OpKind,
    pub args: Vec<Src>,
    pub dst: u32,
    /// Graph node this instruction was compiled from, for error reports.
    pub origin: NodeIdx,
}

/// Flattened, reference-free form of a subtree.
///
/// Instructions run in order, each writing one scratch slot. Slots are recycled once every
/// consumer of a value has run, so `n_slots` is usually far below the node count.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeData {
    pub instrs: Vec<Instr>,
    pub consts: Vec<f64>,
    const_origins: Vec<NodeIdx>,
    pub n_slots: usize,
    pub root: Src,
    root_origin: NodeIdx,
    num_variables: usize,
}

impl TreeData {
    /// Compile the subtree of `graph` rooted at `root`.
    ///
    /// `num_variables` pre-sizes variable-indexed buffers; pass 0 when unknown and it is derived
    /// from the leaves. It never ends up smaller than the largest variable index plus one.
    pub fn compile(graph: &Graph, root: NodeIdx, num_variables: usize) -> Self {
        let order = graph.subtree(root);

        let mut remaining_uses = vec![0u32; root.index() + 1];
        for &idx in &order {
            for c in graph.node(idx).children() {
                remaining_uses[c.index()] += 1;
            }
        }

        let mut srcs: Vec<Option<Src>> = vec![None; root.index() + 1];
        let mut instrs: Vec<Instr> = Vec::new();
        let mut consts: Vec<f64> = Vec::new();
        let mut const_origins: Vec<NodeIdx> = Vec::new();
        let mut num_variables = num_variables;

        let mut free_slots: Vec<u32> = Vec::new();
        let mut next_slot: u32 = 0;
        let mut max_slot: u32 = 0;

        let alloc_slot = |free_slots: &mut Vec<u32>, next_slot: &mut u32, max_slot: &mut u32| -> u32 {
            let s = free_slots.pop().unwrap_or_else(|| {
                let s = *next_slot;
                *next_slot += 1;
                s
            });
            *max_slot = (*max_slot).max(s + 1);
            s
        };

        for idx in order {
            let src = match graph.node(idx).kind() {
                NodeKind::Variable(v) => {
                    num_variables = num_variables.max(v.index() + 1);
                    Src::Var(*v)
                }
                NodeKind::Constant(c) => {
                    let k = u32::try_from(consts.len()).expect("too many constants");
                    consts.push(*c);
                    const_origins.push(idx);
                    Src::Const(k)
                }
                NodeKind::Operator { op, children } => {
                    let args: Vec<Src> = children
                        .iter()
                        .map(|c| srcs[c.index()].expect("children precede parents"))
                        .collect();

                    let dst = alloc_slot(&mut free_slots, &mut next_slot, &mut max_slot);
                    instrs.push(Instr {
                        op: op.clone(),
                        args,
                        dst,
                        origin: idx,
                    });

                    for c in children {
                        let uses = &mut remaining_uses[c.index()];
                        *uses -= 1;
                        if *uses == 0 {
                            if let Some(Src::Slot(s)) = srcs[c.index()] {
                                free_slots.push(s);
                            }
                        }
                    }
                    Src::Slot(dst)
                }
            };
            srcs[idx.index()] = Some(src);
        }

        let root_src = srcs[root.index()].expect("root is part of its own subtree");
        debug!(%root, instrs = instrs.len(), n_slots = max_slot, num_variables, "compiled tree data");
        Self {
            instrs,
            consts,
            const_origins,
            n_slots: max_slot as usize,
            root: root_src,
            root_origin: root,
            num_variables,
        }
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    fn run<A: Algebra>(
        &self,
        lookup: impl Fn(VariableId) -> Option<A>,
        slots: &mut Vec<A>,
        args: &mut Vec<A>,
        opts: &EvalOptions,
    ) -> EvalResult<A> {
        slots.clear();
        slots.resize(self.n_slots, A::zero());

        let resolve = |src: Src, origin: NodeIdx, slots: &[A]| -> EvalResult<A> {
            match src {
                Src::Var(v) => {
                    let value = lookup(v).ok_or(EvalError::UnboundVariable { variable: v, node: origin })?;
                    check_finite(value, origin, "variable", opts)
                }
                Src::Const(k) => check_finite(
                    A::constant(self.consts[k as usize]),
                    self.const_origins[k as usize],
                    "constant",
                    opts,
                ),
                Src::Slot(s) => Ok(slots[s as usize].clone()),
            }
        };

        for instr in &self.instrs {
            args.clear();
            for &src in &instr.args {
                args.push(resolve(src, instr.origin, slots)?);
            }
            let out = check_finite(instr.op.apply(args), instr.origin, instr.op.name(), opts)?;
            slots[instr.dst as usize] = out;
        }
        resolve(self.root, self.root_origin, slots)
    }

    pub fn eval<A: Algebra>(&self, values: &Values<A>, opts: &EvalOptions) -> EvalResult<A> {
        let mut slots = Vec::with_capacity(self.n_slots);
        let mut args = Vec::new();
        self.run(|v| values.get(v).cloned(), &mut slots, &mut args, opts)
    }

    pub fn eval_points_par<A: Algebra>(&self, points: &[Values<A>], opts: &EvalOptions) -> Vec<EvalResult<A>> {
        points.par_iter().map(|values| self.eval(values, opts)).collect()
    }

    /// Evaluate over a batch of points stored column-wise: `x_columns[[variable, row]]`.
    ///
    /// Variables beyond `x_columns.nrows()` are unbound.
    pub fn eval_rows(&self, x_columns: ArrayView2<'_, f64>, opts: &EvalOptions) -> EvalResult<Array1<f64>> {
        let n_rows = x_columns.ncols();
        let mut out = Array1::zeros(n_rows);
        let mut slots = Vec::with_capacity(self.n_slots);
        let mut args = Vec::new();
        for (row, point) in x_columns.columns().into_iter().enumerate() {
            out[row] = self.run(|v| point.get(v.index()).copied(), &mut slots, &mut args, opts)?;
        }
        Ok(out)
    }
}
