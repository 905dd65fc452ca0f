/// A scalar function with known first and second derivatives.
///
/// The derivatives are what the dual algebras use for the chain rule; the plain floating-point
/// algebra only ever calls `eval`.
pub trait UnaryFunction {
    const NAME: &'static str;

    fn eval(x: f64) -> f64;
    fn derivative(x: f64) -> f64;
    fn second_derivative(x: f64) -> f64;
}

macro_rules! unary_function {
    (@name $Op:ident, $name:literal) => {
        $name
    };
    (@name $Op:ident) => {
        crate::paste::paste! { stringify!([<$Op:snake>]) }
    };
    (
        $(#[$meta:meta])*
        $Op:ident {
            $(name: $name:literal,)?
            eval($x:ident) $eval:block,
            derivative($dx:ident) $derivative:block,
            second_derivative($d2x:ident) $second:block $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug)]
        pub struct $Op;

        impl UnaryFunction for $Op {
            const NAME: &'static str = unary_function!(@name $Op $(, $name)?);

            #[inline]
            fn eval($x: f64) -> f64 $eval

            #[inline]
            fn derivative($dx: f64) -> f64 $derivative

            #[inline]
            fn second_derivative($d2x: f64) -> f64 $second
        }
    };
}

unary_function!(
    /// Subgradient convention: the derivative at zero is zero.
    Abs {
        eval(x) { x.abs() },
        derivative(x) {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        },
        second_derivative(_x) { 0.0 },
    }
);

unary_function!(Sqrt {
    eval(x) { x.sqrt() },
    derivative(x) { 0.5 / x.sqrt() },
    second_derivative(x) { -0.25 / (x * x.sqrt()) },
});

unary_function!(Exp {
    eval(x) { x.exp() },
    derivative(x) { x.exp() },
    second_derivative(x) { x.exp() },
});

unary_function!(Log {
    eval(x) { x.ln() },
    derivative(x) { 1.0 / x },
    second_derivative(x) { -1.0 / (x * x) },
});

unary_function!(Sin {
    eval(x) { x.sin() },
    derivative(x) { x.cos() },
    second_derivative(x) { -x.sin() },
});

unary_function!(Cos {
    eval(x) { x.cos() },
    derivative(x) { -x.sin() },
    second_derivative(x) { -x.cos() },
});

unary_function!(Tan {
    eval(x) { x.tan() },
    derivative(x) {
        let c = x.cos();
        1.0 / (c * c)
    },
    second_derivative(x) {
        let c = x.cos();
        2.0 * x.tan() / (c * c)
    },
});

unary_function!(Asin {
    eval(x) { x.asin() },
    derivative(x) { 1.0 / (1.0 - x * x).sqrt() },
    second_derivative(x) { x / (1.0 - x * x).powf(1.5) },
});

unary_function!(Acos {
    eval(x) { x.acos() },
    derivative(x) { -1.0 / (1.0 - x * x).sqrt() },
    second_derivative(x) { -x / (1.0 - x * x).powf(1.5) },
});

unary_function!(Atan {
    eval(x) { x.atan() },
    derivative(x) { 1.0 / (1.0 + x * x) },
    second_derivative(x) {
        let d = 1.0 + x * x;
        -2.0 * x / (d * d)
    },
});
