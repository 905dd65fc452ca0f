pub mod builtin;

use crate::algebra::Algebra;
use crate::degree::PolynomialDegree;
use builtin::{Abs, Acos, Asin, Atan, Cos, Exp, Log, Sin, Sqrt, Tan};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exactly(k) => n == k,
            Arity::AtLeast(k) => n >= k,
        }
    }
}

/// Operator carried by an expression node.
///
/// Children are ordered; for `Division` and `Power` the first child is the numerator/base.
#[derive(Clone, Debug, PartialEq)]
pub enum OpKind {
    Negation,
    Sum,
    /// `constant + sum(coefficients[i] * child[i])`
    Linear {
        coefficients: Vec<f64>,
        constant: f64,
    },
    Product,
    Division,
    Power,
    Abs,
    Sqrt,
    Exp,
    Log,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
}

impl OpKind {
    pub fn name(&self) -> &'static str {
        use builtin::UnaryFunction;
        match self {
            OpKind::Negation => "negation",
            OpKind::Sum => "sum",
            OpKind::Linear { .. } => "linear",
            OpKind::Product => "product",
            OpKind::Division => "division",
            OpKind::Power => "power",
            OpKind::Abs => Abs::NAME,
            OpKind::Sqrt => Sqrt::NAME,
            OpKind::Exp => Exp::NAME,
            OpKind::Log => Log::NAME,
            OpKind::Sin => Sin::NAME,
            OpKind::Cos => Cos::NAME,
            OpKind::Tan => Tan::NAME,
            OpKind::Asin => Asin::NAME,
            OpKind::Acos => Acos::NAME,
            OpKind::Atan => Atan::NAME,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            OpKind::Sum => Arity::AtLeast(1),
            OpKind::Linear { coefficients, .. } => Arity::Exactly(coefficients.len()),
            OpKind::Product | OpKind::Division | OpKind::Power => Arity::Exactly(2),
            _ => Arity::Exactly(1),
        }
    }

    /// Local evaluation rule. `args` are the children's values in child order.
    ///
    /// Under [`Dual`](crate::Dual) every arithmetic step carries its own derivative rule, so this
    /// single definition is also the chain-rule propagation for the node.
    pub fn apply<A: Algebra>(&self, args: &[A]) -> A {
        debug_assert!(self.arity().accepts(args.len()), "{} got {} args", self.name(), args.len());
        let unary = || args[0].clone();
        match self {
            OpKind::Negation => -unary(),
            OpKind::Sum => args.iter().cloned().fold(A::zero(), |acc, x| acc + x),
            OpKind::Linear { coefficients, constant } => args
                .iter()
                .zip(coefficients)
                .fold(A::constant(*constant), |acc, (x, &c)| acc + x.clone().scale(c)),
            OpKind::Product => args[0].clone() * args[1].clone(),
            OpKind::Division => args[0].clone() / args[1].clone(),
            OpKind::Power => args[0].clone().powf(args[1].clone()),
            OpKind::Abs => unary().apply::<Abs>(),
            OpKind::Sqrt => unary().apply::<Sqrt>(),
            OpKind::Exp => unary().apply::<Exp>(),
            OpKind::Log => unary().apply::<Log>(),
            OpKind::Sin => unary().apply::<Sin>(),
            OpKind::Cos => unary().apply::<Cos>(),
            OpKind::Tan => unary().apply::<Tan>(),
            OpKind::Asin => unary().apply::<Asin>(),
            OpKind::Acos => unary().apply::<Acos>(),
            OpKind::Atan => unary().apply::<Atan>(),
        }
    }

    /// Local degree rule. `constant_exponent` is the value of the exponent child when it is a
    /// constant node (only consulted for `Power`).
    pub fn polynomial_degree(&self, children: &[PolynomialDegree], constant_exponent: Option<f64>) -> PolynomialDegree {
        use PolynomialDegree::Known;
        match self {
            OpKind::Negation => children[0],
            OpKind::Sum => children.iter().fold(Known(0), |acc, &d| acc.max(d)),
            OpKind::Linear { coefficients, .. } => children
                .iter()
                .zip(coefficients)
                .filter(|&(_, &c)| c != 0.0)
                .fold(Known(0), |acc, (&d, _)| acc.max(d)),
            OpKind::Product => children[0].product(children[1]),
            OpKind::Division => match children[1] {
                Known(0) => children[0],
                _ => PolynomialDegree::Unknown,
            },
            OpKind::Power => match (children[0], children[1], constant_exponent) {
                (Known(0), Known(0), _) => Known(0),
                (base, _, Some(p)) if p >= 0.0 && p.fract() == 0.0 && p <= u32::MAX as f64 => base.power(p as u32),
                _ => PolynomialDegree::Unknown,
            },
            // A transcendental function of a constant subexpression is still constant.
            _ => match children[0] {
                Known(0) => Known(0),
                _ => PolynomialDegree::Unknown,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::Dual;
    use crate::node::VariableId;

    #[test]
    fn arity_table() {
        assert!(OpKind::Sum.arity().accepts(5));
        assert!(!OpKind::Sum.arity().accepts(0));
        assert!(OpKind::Division.arity().accepts(2));
        assert!(!OpKind::Sin.arity().accepts(2));
        let linear = OpKind::Linear {
            coefficients: vec![1.0, 2.0, 3.0],
            constant: 0.0,
        };
        assert_eq!(linear.arity(), Arity::Exactly(3));
    }

    #[test]
    fn subtraction_order_follows_children() {
        let linear = OpKind::Linear {
            coefficients: vec![1.0, -1.0],
            constant: 0.5,
        };
        assert_eq!(linear.apply(&[5.0, 2.0]), 3.5);
        assert_eq!(OpKind::Division.apply(&[1.0, 4.0]), 0.25);
        assert_eq!(OpKind::Power.apply(&[2.0, 3.0]), 8.0);
    }

    #[test]
    fn linear_passes_coefficients_to_gradient() {
        let linear = OpKind::Linear {
            coefficients: vec![2.0, -3.0],
            constant: 1.0,
        };
        let x = Dual::variable(VariableId::new(0), 1.0);
        let y = Dual::variable(VariableId::new(1), 1.0);
        let out = linear.apply(&[x, y]);
        assert_eq!(out.value, 0.0);
        assert_eq!(out.derivative(VariableId::new(0)), 2.0);
        assert_eq!(out.derivative(VariableId::new(1)), -3.0);
    }

    #[test]
    fn power_degree_needs_integral_constant_exponent() {
        use PolynomialDegree::{Known, Unknown};
        assert_eq!(OpKind::Power.polynomial_degree(&[Known(2), Known(0)], Some(3.0)), Known(6));
        assert_eq!(OpKind::Power.polynomial_degree(&[Known(1), Known(0)], Some(0.5)), Unknown);
        assert_eq!(OpKind::Power.polynomial_degree(&[Known(1), Known(0)], None), Unknown);
        assert_eq!(OpKind::Power.polynomial_degree(&[Known(1), Known(1)], None), Unknown);
    }
}
