//! Numeric algebras a graph can be evaluated under.
//!
//! Operator rules are written once against [`Algebra`]; plain `f64` gives values only, [`Dual`]
//! carries a sparse first-derivative map alongside each value and [`Dual2`] adds the lower
//! triangle of the Hessian.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_traits::{One, Zero};

use crate::node::VariableId;
use crate::operators::builtin::UnaryFunction;

pub trait Algebra:
    Clone
    + Debug
    + Send
    + Sync
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    fn constant(value: f64) -> Self;

    /// An independent variable: unit first derivative with respect to itself where the algebra
    /// tracks derivatives.
    fn seed(variable: VariableId, value: f64) -> Self;

    fn value(&self) -> f64;

    /// Multiply by a plain scalar.
    fn scale(self, factor: f64) -> Self;

    fn apply<F: UnaryFunction>(self) -> Self;

    fn powf(self, exponent: Self) -> Self;

    fn is_finite(&self) -> bool {
        self.value().is_finite()
    }
}

impl Algebra for f64 {
    #[inline]
    fn constant(value: f64) -> Self {
        value
    }

    #[inline]
    fn seed(_variable: VariableId, value: f64) -> Self {
        value
    }

    #[inline]
    fn value(&self) -> f64 {
        *self
    }

    #[inline]
    fn scale(self, factor: f64) -> Self {
        self * factor
    }

    #[inline]
    fn apply<F: UnaryFunction>(self) -> Self {
        F::eval(self)
    }

    #[inline]
    fn powf(self, exponent: Self) -> Self {
        f64::powf(self, exponent)
    }
}

/// Sparse gradient: partial derivatives keyed by variable, absent entries are zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gradient(BTreeMap<VariableId, f64>);

impl Gradient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(variable: VariableId) -> Self {
        Self(BTreeMap::from([(variable, 1.0)]))
    }

    pub fn get(&self, variable: VariableId) -> f64 {
        self.0.get(&variable).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableId, f64)> + '_ {
        self.0.iter().map(|(&v, &d)| (v, d))
    }

    fn scaled(mut self, factor: f64) -> Self {
        for d in self.0.values_mut() {
            *d *= factor;
        }
        self
    }

    /// `a * self + b * other`
    fn combine(self, a: f64, other: Self, b: f64) -> Self {
        let mut out = self.scaled(a);
        for (v, d) in other.0 {
            *out.0.entry(v).or_insert(0.0) += b * d;
        }
        out
    }
}

/// Value plus sparse first derivatives.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dual {
    pub value: f64,
    pub gradient: Gradient,
}

impl Dual {
    pub fn constant(value: f64) -> Self {
        Self {
            value,
            gradient: Gradient::new(),
        }
    }

    /// Seed an independent variable: derivative one with respect to itself.
    pub fn variable(variable: VariableId, value: f64) -> Self {
        Self {
            value,
            gradient: Gradient::unit(variable),
        }
    }

    pub fn derivative(&self, variable: VariableId) -> f64 {
        self.gradient.get(variable)
    }

    /// Chain rule for `f(self)` given `f(value)` and `f'(value)`.
    fn chain(self, value: f64, slope: f64) -> Self {
        Self {
            value,
            gradient: self.gradient.scaled(slope),
        }
    }
}

impl Add for Dual {
    type Output = Dual;

    fn add(self, rhs: Dual) -> Dual {
        Dual {
            value: self.value + rhs.value,
            gradient: self.gradient.combine(1.0, rhs.gradient, 1.0),
        }
    }
}

impl Sub for Dual {
    type Output = Dual;

    fn sub(self, rhs: Dual) -> Dual {
        Dual {
            value: self.value - rhs.value,
            gradient: self.gradient.combine(1.0, rhs.gradient, -1.0),
        }
    }
}

impl Mul for Dual {
    type Output = Dual;

    fn mul(self, rhs: Dual) -> Dual {
        let (a, b) = (self.value, rhs.value);
        Dual {
            value: a * b,
            gradient: self.gradient.combine(b, rhs.gradient, a),
        }
    }
}

impl Div for Dual {
    type Output = Dual;

    fn div(self, rhs: Dual) -> Dual {
        let (a, b) = (self.value, rhs.value);
        Dual {
            value: a / b,
            gradient: self.gradient.combine(1.0 / b, rhs.gradient, -a / (b * b)),
        }
    }
}

impl Neg for Dual {
    type Output = Dual;

    fn neg(self) -> Dual {
        Dual {
            value: -self.value,
            gradient: self.gradient.scaled(-1.0),
        }
    }
}

impl Zero for Dual {
    fn zero() -> Self {
        Dual::constant(0.0)
    }

    fn is_zero(&self) -> bool {
        self.value == 0.0 && self.gradient.0.values().all(|d| *d == 0.0)
    }
}

impl One for Dual {
    fn one() -> Self {
        Dual::constant(1.0)
    }
}

impl Algebra for Dual {
    fn constant(value: f64) -> Self {
        Dual::constant(value)
    }

    fn seed(variable: VariableId, value: f64) -> Self {
        Dual::variable(variable, value)
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn scale(self, factor: f64) -> Self {
        Dual {
            value: self.value * factor,
            gradient: self.gradient.scaled(factor),
        }
    }

    fn apply<F: UnaryFunction>(self) -> Self {
        let x = self.value;
        self.chain(F::eval(x), F::derivative(x))
    }

    fn powf(self, exponent: Self) -> Self {
        let (x, p) = (self.value, exponent.value);
        let value = x.powf(p);
        if exponent.gradient.is_empty() {
            if p == 0.0 || self.gradient.is_empty() {
                return Dual::constant(value);
            }
            // d(x^p) = p x^(p-1) dx; avoids ln(x) for negative bases with integer exponents.
            return self.chain(value, p * x.powf(p - 1.0));
        }
        let dx = p * x.powf(p - 1.0);
        let dp = value * x.ln();
        Dual {
            value,
            gradient: self.gradient.combine(dx, exponent.gradient, dp),
        }
    }

    fn is_finite(&self) -> bool {
        self.value.is_finite() && self.gradient.0.values().all(|d| d.is_finite())
    }
}

/// Sparse symmetric matrix stored as its lower triangle: keys are `(row, col)` with `row >= col`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hessian(BTreeMap<(VariableId, VariableId), f64>);

fn lower(i: VariableId, j: VariableId) -> (VariableId, VariableId) {
    if i >= j { (i, j) } else { (j, i) }
}

impl Hessian {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry `(i, j)`; symmetric, so argument order does not matter.
    pub fn get(&self, i: VariableId, j: VariableId) -> f64 {
        self.0.get(&lower(i, j)).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Lower-triangle entries in `(row, col)` order.
    pub fn iter(&self) -> impl Iterator<Item = ((VariableId, VariableId), f64)> + '_ {
        self.0.iter().map(|(&k, &d)| (k, d))
    }

    fn scaled(mut self, factor: f64) -> Self {
        for d in self.0.values_mut() {
            *d *= factor;
        }
        self
    }

    fn combine(self, a: f64, other: Self, b: f64) -> Self {
        let mut out = self.scaled(a);
        for (k, d) in other.0 {
            *out.0.entry(k).or_insert(0.0) += b * d;
        }
        out
    }

    /// `self += factor * (u v^T + v u^T)`
    fn add_outer(&mut self, u: &Gradient, v: &Gradient, factor: f64) {
        if factor == 0.0 {
            return;
        }
        for (&i, &a) in &u.0 {
            for (&j, &b) in &v.0 {
                let c = factor * a * b;
                let c = if i == j { 2.0 * c } else { c };
                *self.0.entry(lower(i, j)).or_insert(0.0) += c;
            }
        }
    }
}

/// Value with sparse first and second derivatives (forward mode over forward mode).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dual2 {
    pub value: f64,
    pub gradient: Gradient,
    pub hessian: Hessian,
}

impl Dual2 {
    pub fn constant(value: f64) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    pub fn variable(variable: VariableId, value: f64) -> Self {
        Self {
            value,
            gradient: Gradient::unit(variable),
            hessian: Hessian::new(),
        }
    }

    pub fn derivative(&self, variable: VariableId) -> f64 {
        self.gradient.get(variable)
    }

    pub fn second_derivative(&self, i: VariableId, j: VariableId) -> f64 {
        self.hessian.get(i, j)
    }

    fn is_constant(&self) -> bool {
        self.gradient.is_empty() && self.hessian.is_empty()
    }

    /// Chain rule for `f(self)` given `f`, `f'` and `f''` at the value.
    fn chain(self, value: f64, slope: f64, curvature: f64) -> Self {
        if self.is_constant() {
            return Dual2::constant(value);
        }
        let mut hessian = self.hessian.scaled(slope);
        hessian.add_outer(&self.gradient, &self.gradient, 0.5 * curvature);
        Self {
            value,
            gradient: self.gradient.scaled(slope),
            hessian,
        }
    }

    fn recip(self) -> Self {
        let x = self.value;
        self.chain(1.0 / x, -1.0 / (x * x), 2.0 / (x * x * x))
    }

    fn ln(self) -> Self {
        let x = self.value;
        self.chain(x.ln(), 1.0 / x, -1.0 / (x * x))
    }

    fn exp(self) -> Self {
        let e = self.value.exp();
        self.chain(e, e, e)
    }
}

impl Add for Dual2 {
    type Output = Dual2;

    fn add(self, rhs: Dual2) -> Dual2 {
        Dual2 {
            value: self.value + rhs.value,
            gradient: self.gradient.combine(1.0, rhs.gradient, 1.0),
            hessian: self.hessian.combine(1.0, rhs.hessian, 1.0),
        }
    }
}

impl Sub for Dual2 {
    type Output = Dual2;

    fn sub(self, rhs: Dual2) -> Dual2 {
        Dual2 {
            value: self.value - rhs.value,
            gradient: self.gradient.combine(1.0, rhs.gradient, -1.0),
            hessian: self.hessian.combine(1.0, rhs.hessian, -1.0),
        }
    }
}

impl Mul for Dual2 {
    type Output = Dual2;

    fn mul(self, rhs: Dual2) -> Dual2 {
        let (a, b) = (self.value, rhs.value);
        let mut hessian = self.hessian.combine(b, rhs.hessian, a);
        hessian.add_outer(&self.gradient, &rhs.gradient, 1.0);
        Dual2 {
            value: a * b,
            gradient: self.gradient.combine(b, rhs.gradient, a),
            hessian,
        }
    }
}

impl Div for Dual2 {
    type Output = Dual2;

    fn div(self, rhs: Dual2) -> Dual2 {
        if rhs.is_constant() {
            return self.scale(1.0 / rhs.value);
        }
        self * rhs.recip()
    }
}

impl Neg for Dual2 {
    type Output = Dual2;

    fn neg(self) -> Dual2 {
        self.scale(-1.0)
    }
}

impl Zero for Dual2 {
    fn zero() -> Self {
        Dual2::constant(0.0)
    }

    fn is_zero(&self) -> bool {
        self.value == 0.0
            && self.gradient.0.values().all(|d| *d == 0.0)
            && self.hessian.0.values().all(|d| *d == 0.0)
    }
}

impl One for Dual2 {
    fn one() -> Self {
        Dual2::constant(1.0)
    }
}

impl Algebra for Dual2 {
    fn constant(value: f64) -> Self {
        Dual2::constant(value)
    }

    fn seed(variable: VariableId, value: f64) -> Self {
        Dual2::variable(variable, value)
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn scale(self, factor: f64) -> Self {
        Dual2 {
            value: self.value * factor,
            gradient: self.gradient.scaled(factor),
            hessian: self.hessian.scaled(factor),
        }
    }

    fn apply<F: UnaryFunction>(self) -> Self {
        let x = self.value;
        self.chain(F::eval(x), F::derivative(x), F::second_derivative(x))
    }

    fn powf(self, exponent: Self) -> Self {
        let (x, p) = (self.value, exponent.value);
        if exponent.is_constant() {
            let value = x.powf(p);
            if p == 0.0 {
                return Dual2::constant(value);
            }
            if p == 1.0 {
                return self;
            }
            let slope = p * x.powf(p - 1.0);
            let curvature = if p == 2.0 { 2.0 } else { p * (p - 1.0) * x.powf(p - 2.0) };
            return self.chain(value, slope, curvature);
        }
        // x^p = exp(p ln x)
        (exponent * self.ln()).exp()
    }

    fn is_finite(&self) -> bool {
        self.value.is_finite()
            && self.gradient.0.values().all(|d| d.is_finite())
            && self.hessian.0.values().all(|d| d.is_finite())
    }
}
