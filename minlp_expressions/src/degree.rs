use std::fmt;

use crate::graph::Graph;
use crate::node::{NodeIdx, NodeKind};

/// Polynomial degree of a subtree.
///
/// `Unknown` means "not known to be a polynomial". A reported `Known(d)` is never lower than the
/// true degree; it may be higher (e.g. `x * 0`), which is the safe direction for relaxation choice.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PolynomialDegree {
    Known(u32),
    Unknown,
}

impl PolynomialDegree {
    pub fn is_polynomial(self) -> bool {
        matches!(self, PolynomialDegree::Known(_))
    }

    pub fn known(self) -> Option<u32> {
        match self {
            PolynomialDegree::Known(d) => Some(d),
            PolynomialDegree::Unknown => None,
        }
    }

    /// Degree of a sum.
    pub fn max(self, other: Self) -> Self {
        match (self, other) {
            (PolynomialDegree::Known(a), PolynomialDegree::Known(b)) => PolynomialDegree::Known(a.max(b)),
            _ => PolynomialDegree::Unknown,
        }
    }

    /// Degree of a product.
    pub fn product(self, other: Self) -> Self {
        match (self, other) {
            (PolynomialDegree::Known(a), PolynomialDegree::Known(b)) => {
                a.checked_add(b).map_or(PolynomialDegree::Unknown, PolynomialDegree::Known)
            }
            _ => PolynomialDegree::Unknown,
        }
    }

    /// Degree of an integral power.
    pub fn power(self, k: u32) -> Self {
        match self {
            PolynomialDegree::Known(a) => a.checked_mul(k).map_or(PolynomialDegree::Unknown, PolynomialDegree::Known),
            PolynomialDegree::Unknown => PolynomialDegree::Unknown,
        }
    }
}

impl fmt::Display for PolynomialDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolynomialDegree::Known(d) => write!(f, "{d}"),
            PolynomialDegree::Unknown => f.write_str("unknown"),
        }
    }
}

impl Graph {
    /// Degree of the subtree rooted at `root`.
    pub fn polynomial_degree(&self, root: NodeIdx) -> PolynomialDegree {
        let mut memo: Vec<Option<PolynomialDegree>> = vec![None; root.index() + 1];
        let mut children_degrees = Vec::new();
        for idx in self.subtree(root) {
            let degree = match self.node(idx).kind() {
                NodeKind::Variable(_) => PolynomialDegree::Known(1),
                NodeKind::Constant(_) => PolynomialDegree::Known(0),
                NodeKind::Operator { op, children } => {
                    children_degrees.clear();
                    children_degrees.extend(children.iter().map(|c| memo[c.index()].expect("children precede parents")));
                    let constant_exponent = children.get(1).and_then(|&c| self.node(c).constant_value());
                    op.polynomial_degree(&children_degrees, constant_exponent)
                }
            };
            memo[idx.index()] = Some(degree);
        }
        memo[root.index()].expect("root is part of its own subtree")
    }
}
