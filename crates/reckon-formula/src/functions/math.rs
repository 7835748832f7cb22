//! Math and trigonometry functions

use super::{numeric, numeric_arg, numeric_scalars, paired_ranges, Registry};
use crate::criteria::Criteria;
use crate::value::{flatten, Value};
use rand::Rng;
use reckon_core::ErrorKind;

pub(crate) fn register(registry: &mut Registry) {
    registry.register("ABS", fn_abs);
    registry.register("ACOS", fn_acos);
    registry.register("ACOSH", fn_acosh);
    registry.register("ASIN", fn_asin);
    registry.register("ASINH", fn_asinh);
    registry.register("ATAN", fn_atan);
    registry.register("ATAN2", fn_atan2);
    registry.register("ATANH", fn_atanh);
    registry.register("CEILING", fn_ceiling);
    registry.register("CEILING.MATH", fn_ceiling_math);
    registry.register("CEILING.PRECISE", fn_ceiling_precise);
    registry.register("COS", fn_cos);
    registry.register("COSH", fn_cosh);
    registry.register("COT", fn_cot);
    registry.register("CSC", fn_csc);
    registry.register("DEGREES", fn_degrees);
    registry.register("EVEN", fn_even);
    registry.register("EXP", fn_exp);
    registry.register("FACT", fn_fact);
    registry.register("FACTDOUBLE", fn_factdouble);
    registry.register("FLOOR", fn_floor);
    registry.register("FLOOR.MATH", fn_floor_math);
    registry.register("FLOOR.PRECISE", fn_floor_precise);
    registry.register("GCD", fn_gcd);
    registry.register("INT", fn_int);
    registry.register("LCM", fn_lcm);
    registry.register("LN", fn_ln);
    registry.register("LOG", fn_log);
    registry.register("LOG10", fn_log10);
    registry.register("MOD", fn_mod);
    registry.register("MROUND", fn_mround);
    registry.register("ODD", fn_odd);
    registry.register("PI", fn_pi);
    registry.register("POWER", fn_power);
    registry.register("PRODUCT", fn_product);
    registry.register("QUOTIENT", fn_quotient);
    registry.register("RADIANS", fn_radians);
    registry.register("RAND", fn_rand);
    registry.register("RANDBETWEEN", fn_randbetween);
    registry.register("ROUND", fn_round);
    registry.register("ROUNDDOWN", fn_rounddown);
    registry.register("ROUNDUP", fn_roundup);
    registry.register("SEC", fn_sec);
    registry.register("SIGN", fn_sign);
    registry.register("SIN", fn_sin);
    registry.register("SINH", fn_sinh);
    registry.register("SQRT", fn_sqrt);
    registry.register("SQRTPI", fn_sqrtpi);
    registry.register("SUM", fn_sum);
    registry.register("SUMIF", fn_sumif);
    registry.register("SUMIFS", fn_sumifs);
    registry.register("SUMPRODUCT", fn_sumproduct);
    registry.register("SUMSQ", fn_sumsq);
    registry.register("TAN", fn_tan);
    registry.register("TANH", fn_tanh);
    registry.register("TRUNC", fn_trunc);
}

/// One numeric argument, one numeric result
fn unary(args: &[Value], name: &str, f: impl Fn(f64) -> Value) -> Value {
    if args.len() != 1 {
        return Value::value_error(format!("{name} requires one argument"));
    }
    match numeric(&args[0]) {
        Ok(n) => f(n),
        Err(e) => e,
    }
}

fn finite(n: f64) -> Value {
    if n.is_nan() || n.is_infinite() {
        Value::error(ErrorKind::Num, "result out of range")
    } else {
        Value::number(n)
    }
}

fn fn_abs(args: &[Value]) -> Value {
    unary(args, "ABS", |n| Value::number(n.abs()))
}

fn fn_sign(args: &[Value]) -> Value {
    unary(args, "SIGN", |n| {
        Value::number(if n > 0.0 {
            1.0
        } else if n < 0.0 {
            -1.0
        } else {
            0.0
        })
    })
}

fn fn_sqrt(args: &[Value]) -> Value {
    unary(args, "SQRT", |n| {
        if n < 0.0 {
            Value::error(ErrorKind::Num, "SQRT of a negative number")
        } else {
            Value::number(n.sqrt())
        }
    })
}

fn fn_sqrtpi(args: &[Value]) -> Value {
    unary(args, "SQRTPI", |n| {
        if n < 0.0 {
            Value::error(ErrorKind::Num, "SQRTPI of a negative number")
        } else {
            Value::number((n * std::f64::consts::PI).sqrt())
        }
    })
}

fn fn_exp(args: &[Value]) -> Value {
    unary(args, "EXP", |n| finite(n.exp()))
}

fn fn_ln(args: &[Value]) -> Value {
    unary(args, "LN", |n| {
        if n <= 0.0 {
            Value::error(ErrorKind::Num, "LN requires a positive number")
        } else {
            Value::number(n.ln())
        }
    })
}

fn fn_log10(args: &[Value]) -> Value {
    unary(args, "LOG10", |n| {
        if n <= 0.0 {
            Value::error(ErrorKind::Num, "LOG10 requires a positive number")
        } else {
            Value::number(n.log10())
        }
    })
}

fn fn_log(args: &[Value]) -> Value {
    if args.is_empty() || args.len() > 2 {
        return Value::value_error("LOG requires one or two arguments");
    }
    let x = match numeric(&args[0]) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let base = match numeric_arg(args, 1, Some(10.0)) {
        Ok(n) => n,
        Err(e) => return e,
    };
    if x <= 0.0 || base <= 0.0 {
        return Value::error(ErrorKind::Num, "LOG requires positive arguments");
    }
    if base == 1.0 {
        return Value::error(ErrorKind::DivideByZero, "LOG base cannot be 1");
    }
    Value::number(x.log(base))
}

fn fn_pi(args: &[Value]) -> Value {
    if !args.is_empty() {
        return Value::value_error("PI takes no arguments");
    }
    Value::number(std::f64::consts::PI)
}

fn fn_power(args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::value_error("POWER requires two arguments");
    }
    let (base, exp) = match (numeric(&args[0]), numeric(&args[1])) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    if base == 0.0 && exp == 0.0 {
        return Value::error(ErrorKind::Num, "0^0 is undefined");
    }
    finite(base.powf(exp))
}

fn fn_int(args: &[Value]) -> Value {
    unary(args, "INT", |n| Value::number(n.floor()))
}

/// MOD(n, d) = n - d*INT(n/d); the result carries the divisor's sign
fn fn_mod(args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::value_error("MOD requires two arguments");
    }
    let (n, d) = match (numeric(&args[0]), numeric(&args[1])) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    if d == 0.0 {
        return Value::error(ErrorKind::DivideByZero, "MOD divisor is zero");
    }
    Value::number(n - d * (n / d).floor())
}

fn fn_quotient(args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::value_error("QUOTIENT requires two arguments");
    }
    let (n, d) = match (numeric(&args[0]), numeric(&args[1])) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    if d == 0.0 {
        return Value::error(ErrorKind::DivideByZero, "QUOTIENT divisor is zero");
    }
    Value::number((n / d).trunc())
}

// === Rounding ===

#[derive(Clone, Copy)]
enum RoundMode {
    /// Half away from zero
    Nearest,
    /// Away from zero
    Up,
    /// Toward zero
    Down,
}

/// The single rounding routine behind ROUND, ROUNDUP and ROUNDDOWN
fn round_to_digits(x: f64, digits: f64, mode: RoundMode) -> f64 {
    let factor = 10f64.powi(digits.trunc() as i32);
    let scaled = x.abs() * factor;
    let rounded = match mode {
        RoundMode::Nearest => (scaled + 0.5).floor(),
        RoundMode::Up => scaled.ceil(),
        RoundMode::Down => scaled.floor(),
    };
    x.signum() * rounded / factor
}

fn round_fn(args: &[Value], name: &str, mode: RoundMode) -> Value {
    if args.is_empty() || args.len() > 2 {
        return Value::value_error(format!("{name} requires one or two arguments"));
    }
    let x = match numeric(&args[0]) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let digits = match numeric_arg(args, 1, Some(0.0)) {
        Ok(n) => n,
        Err(e) => return e,
    };
    Value::number(round_to_digits(x, digits, mode))
}

fn fn_round(args: &[Value]) -> Value {
    round_fn(args, "ROUND", RoundMode::Nearest)
}

fn fn_roundup(args: &[Value]) -> Value {
    round_fn(args, "ROUNDUP", RoundMode::Up)
}

fn fn_rounddown(args: &[Value]) -> Value {
    round_fn(args, "ROUNDDOWN", RoundMode::Down)
}

fn fn_trunc(args: &[Value]) -> Value {
    round_fn(args, "TRUNC", RoundMode::Down)
}

/// Plain CEILING: significance must share the number's sign
fn fn_ceiling(args: &[Value]) -> Value {
    if args.is_empty() || args.len() > 2 {
        return Value::value_error("CEILING requires one or two arguments");
    }
    let x = match numeric(&args[0]) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let sig = match numeric_arg(args, 1, Some(if x < 0.0 { -1.0 } else { 1.0 })) {
        Ok(n) => n,
        Err(e) => return e,
    };
    if x > 0.0 && sig < 0.0 {
        return Value::error(ErrorKind::Num, "CEILING significance sign mismatch");
    }
    if sig == 0.0 {
        return Value::number(0.0);
    }
    Value::number((x / sig).ceil() * sig)
}

fn fn_floor(args: &[Value]) -> Value {
    if args.is_empty() || args.len() > 2 {
        return Value::value_error("FLOOR requires one or two arguments");
    }
    let x = match numeric(&args[0]) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let sig = match numeric_arg(args, 1, Some(if x < 0.0 { -1.0 } else { 1.0 })) {
        Ok(n) => n,
        Err(e) => return e,
    };
    if x > 0.0 && sig < 0.0 {
        return Value::error(ErrorKind::Num, "FLOOR significance sign mismatch");
    }
    if sig == 0.0 {
        return Value::error(ErrorKind::DivideByZero, "FLOOR significance is zero");
    }
    Value::number((x / sig).floor() * sig)
}

/// CEILING.MATH: negative numbers round toward zero by default; a non-zero
/// mode rounds them away from zero instead
fn fn_ceiling_math(args: &[Value]) -> Value {
    if args.is_empty() || args.len() > 3 {
        return Value::value_error("CEILING.MATH requires one to three arguments");
    }
    let x = match numeric(&args[0]) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let sig = match numeric_arg(args, 1, Some(1.0)) {
        Ok(n) => n.abs(),
        Err(e) => return e,
    };
    let mode = match numeric_arg(args, 2, Some(0.0)) {
        Ok(n) => n,
        Err(e) => return e,
    };
    if sig == 0.0 {
        return Value::number(0.0);
    }
    let result = if x >= 0.0 {
        (x / sig).ceil() * sig
    } else if mode == 0.0 {
        -((x.abs() / sig).floor() * sig)
    } else {
        -((x.abs() / sig).ceil() * sig)
    };
    Value::number(result)
}

/// FLOOR.MATH: negative numbers round away from zero by default; a non-zero
/// mode rounds them toward zero instead
fn fn_floor_math(args: &[Value]) -> Value {
    if args.is_empty() || args.len() > 3 {
        return Value::value_error("FLOOR.MATH requires one to three arguments");
    }
    let x = match numeric(&args[0]) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let sig = match numeric_arg(args, 1, Some(1.0)) {
        Ok(n) => n.abs(),
        Err(e) => return e,
    };
    let mode = match numeric_arg(args, 2, Some(0.0)) {
        Ok(n) => n,
        Err(e) => return e,
    };
    if sig == 0.0 {
        return Value::number(0.0);
    }
    let result = if x >= 0.0 {
        (x / sig).floor() * sig
    } else if mode == 0.0 {
        -((x.abs() / sig).ceil() * sig)
    } else {
        -((x.abs() / sig).floor() * sig)
    };
    Value::number(result)
}

fn fn_ceiling_precise(args: &[Value]) -> Value {
    if args.is_empty() || args.len() > 2 {
        return Value::value_error("CEILING.PRECISE requires one or two arguments");
    }
    let x = match numeric(&args[0]) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let sig = match numeric_arg(args, 1, Some(1.0)) {
        Ok(n) => n.abs(),
        Err(e) => return e,
    };
    if sig == 0.0 {
        return Value::number(0.0);
    }
    Value::number((x / sig).ceil() * sig)
}

fn fn_floor_precise(args: &[Value]) -> Value {
    if args.is_empty() || args.len() > 2 {
        return Value::value_error("FLOOR.PRECISE requires one or two arguments");
    }
    let x = match numeric(&args[0]) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let sig = match numeric_arg(args, 1, Some(1.0)) {
        Ok(n) => n.abs(),
        Err(e) => return e,
    };
    if sig == 0.0 {
        return Value::number(0.0);
    }
    Value::number((x / sig).floor() * sig)
}

fn fn_mround(args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::value_error("MROUND requires two arguments");
    }
    let (x, multiple) = match (numeric(&args[0]), numeric(&args[1])) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    if multiple == 0.0 {
        return Value::number(0.0);
    }
    if (x > 0.0) != (multiple > 0.0) && x != 0.0 {
        return Value::error(ErrorKind::Num, "MROUND arguments must share a sign");
    }
    Value::number(round_to_digits(x / multiple, 0.0, RoundMode::Nearest) * multiple)
}

fn fn_even(args: &[Value]) -> Value {
    unary(args, "EVEN", |n| {
        let mut m = n.abs().ceil();
        if m % 2.0 != 0.0 {
            m += 1.0;
        }
        Value::number(if n < 0.0 { -m } else { m })
    })
}

fn fn_odd(args: &[Value]) -> Value {
    unary(args, "ODD", |n| {
        let mut m = n.abs().ceil();
        if m % 2.0 == 0.0 {
            m += 1.0;
        }
        Value::number(if n < 0.0 { -m } else { m })
    })
}

// === Trigonometry ===

fn fn_sin(args: &[Value]) -> Value {
    unary(args, "SIN", |n| Value::number(n.sin()))
}

fn fn_cos(args: &[Value]) -> Value {
    unary(args, "COS", |n| Value::number(n.cos()))
}

fn fn_tan(args: &[Value]) -> Value {
    unary(args, "TAN", |n| Value::number(n.tan()))
}

fn fn_sinh(args: &[Value]) -> Value {
    unary(args, "SINH", |n| finite(n.sinh()))
}

fn fn_cosh(args: &[Value]) -> Value {
    unary(args, "COSH", |n| finite(n.cosh()))
}

fn fn_tanh(args: &[Value]) -> Value {
    unary(args, "TANH", |n| Value::number(n.tanh()))
}

fn fn_cot(args: &[Value]) -> Value {
    unary(args, "COT", |n| {
        let t = n.tan();
        if t == 0.0 {
            Value::error(ErrorKind::DivideByZero, "COT undefined here")
        } else {
            Value::number(1.0 / t)
        }
    })
}

fn fn_csc(args: &[Value]) -> Value {
    unary(args, "CSC", |n| {
        let s = n.sin();
        if s == 0.0 {
            Value::error(ErrorKind::DivideByZero, "CSC undefined here")
        } else {
            Value::number(1.0 / s)
        }
    })
}

fn fn_sec(args: &[Value]) -> Value {
    unary(args, "SEC", |n| {
        let c = n.cos();
        if c == 0.0 {
            Value::error(ErrorKind::DivideByZero, "SEC undefined here")
        } else {
            Value::number(1.0 / c)
        }
    })
}

fn fn_asin(args: &[Value]) -> Value {
    unary(args, "ASIN", |n| {
        if !(-1.0..=1.0).contains(&n) {
            Value::error(ErrorKind::Num, "ASIN argument out of range")
        } else {
            Value::number(n.asin())
        }
    })
}

fn fn_acos(args: &[Value]) -> Value {
    unary(args, "ACOS", |n| {
        if !(-1.0..=1.0).contains(&n) {
            Value::error(ErrorKind::Num, "ACOS argument out of range")
        } else {
            Value::number(n.acos())
        }
    })
}

fn fn_atan(args: &[Value]) -> Value {
    unary(args, "ATAN", |n| Value::number(n.atan()))
}

fn fn_asinh(args: &[Value]) -> Value {
    unary(args, "ASINH", |n| Value::number(n.asinh()))
}

fn fn_acosh(args: &[Value]) -> Value {
    unary(args, "ACOSH", |n| {
        if n < 1.0 {
            Value::error(ErrorKind::Num, "ACOSH argument below 1")
        } else {
            Value::number(n.acosh())
        }
    })
}

fn fn_atanh(args: &[Value]) -> Value {
    unary(args, "ATANH", |n| {
        if n <= -1.0 || n >= 1.0 {
            Value::error(ErrorKind::Num, "ATANH argument out of range")
        } else {
            Value::number(n.atanh())
        }
    })
}

/// ATAN2(x, y) takes x first, matching the spreadsheet argument order
fn fn_atan2(args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::value_error("ATAN2 requires two arguments");
    }
    let (x, y) = match (numeric(&args[0]), numeric(&args[1])) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    if x == 0.0 && y == 0.0 {
        return Value::error(ErrorKind::DivideByZero, "ATAN2(0,0) is undefined");
    }
    Value::number(y.atan2(x))
}

fn fn_degrees(args: &[Value]) -> Value {
    unary(args, "DEGREES", |n| Value::number(n.to_degrees()))
}

fn fn_radians(args: &[Value]) -> Value {
    unary(args, "RADIANS", |n| Value::number(n.to_radians()))
}

// === Combinatorics ===

fn fn_fact(args: &[Value]) -> Value {
    unary(args, "FACT", |n| {
        let n = n.floor();
        if n < 0.0 {
            return Value::error(ErrorKind::Num, "FACT of a negative number");
        }
        if n > 170.0 {
            return Value::error(ErrorKind::Num, "FACT argument too large");
        }
        let mut product = 1.0;
        let mut i = 2.0;
        while i <= n {
            product *= i;
            i += 1.0;
        }
        Value::number(product)
    })
}

fn fn_factdouble(args: &[Value]) -> Value {
    unary(args, "FACTDOUBLE", |n| {
        let n = n.floor();
        if n < 0.0 {
            return Value::error(ErrorKind::Num, "FACTDOUBLE of a negative number");
        }
        let mut product = 1.0;
        let mut i = n;
        while i > 1.0 {
            product *= i;
            i -= 2.0;
        }
        finite(product)
    })
}

fn gcd2(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd2(b, a % b)
    }
}

fn fn_gcd(args: &[Value]) -> Value {
    let numbers = match numeric_scalars(args) {
        Ok(ns) => ns,
        Err(e) => return e,
    };
    if numbers.is_empty() {
        return Value::value_error("GCD requires at least one number");
    }
    let mut acc: u64 = 0;
    for n in numbers {
        if n < 0.0 {
            return Value::error(ErrorKind::Num, "GCD of a negative number");
        }
        acc = gcd2(acc, n.trunc() as u64);
    }
    Value::number(acc as f64)
}

fn fn_lcm(args: &[Value]) -> Value {
    let numbers = match numeric_scalars(args) {
        Ok(ns) => ns,
        Err(e) => return e,
    };
    if numbers.is_empty() {
        return Value::value_error("LCM requires at least one number");
    }
    let mut acc: u64 = 1;
    for n in numbers {
        if n < 0.0 {
            return Value::error(ErrorKind::Num, "LCM of a negative number");
        }
        let m = n.trunc() as u64;
        if m == 0 {
            return Value::number(0.0);
        }
        acc = acc / gcd2(acc, m) * m;
    }
    Value::number(acc as f64)
}

// === Random ===

fn fn_rand(args: &[Value]) -> Value {
    if !args.is_empty() {
        return Value::value_error("RAND takes no arguments");
    }
    Value::number(rand::thread_rng().gen::<f64>())
}

fn fn_randbetween(args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::value_error("RANDBETWEEN requires two arguments");
    }
    let (lo, hi) = match (numeric(&args[0]), numeric(&args[1])) {
        (Ok(a), Ok(b)) => (a.ceil() as i64, b.floor() as i64),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    if lo > hi {
        return Value::error(ErrorKind::Num, "RANDBETWEEN bounds are inverted");
    }
    Value::number(rand::thread_rng().gen_range(lo..=hi) as f64)
}

// === Aggregates ===

fn fn_sum(args: &[Value]) -> Value {
    match numeric_scalars(args) {
        Ok(numbers) => Value::number(numbers.iter().sum()),
        Err(e) => e,
    }
}

fn fn_sumsq(args: &[Value]) -> Value {
    match numeric_scalars(args) {
        Ok(numbers) => Value::number(numbers.iter().map(|n| n * n).sum()),
        Err(e) => e,
    }
}

fn fn_product(args: &[Value]) -> Value {
    match numeric_scalars(args) {
        Ok(numbers) => {
            if numbers.is_empty() {
                Value::number(0.0)
            } else {
                Value::number(numbers.iter().product())
            }
        }
        Err(e) => e,
    }
}

fn fn_sumproduct(args: &[Value]) -> Value {
    if args.is_empty() {
        return Value::value_error("SUMPRODUCT requires at least one argument");
    }
    let shapes: Vec<Vec<Value>> = args
        .iter()
        .map(|a| flatten(std::slice::from_ref(a)))
        .collect();
    let len = shapes[0].len();
    if shapes.iter().any(|s| s.len() != len) {
        return Value::value_error("SUMPRODUCT ranges must have the same shape");
    }
    let mut total = 0.0;
    for i in 0..len {
        let mut product = 1.0;
        for shape in &shapes {
            match &shape[i] {
                Value::Error(_) => return shape[i].clone(),
                // Non-numeric entries count as zero
                v => product *= v.number_value().unwrap_or(0.0),
            }
        }
        total += product;
    }
    Value::number(total)
}

fn fn_sumif(args: &[Value]) -> Value {
    if args.len() < 2 || args.len() > 3 {
        return Value::value_error("SUMIF requires two or three arguments");
    }
    let criteria = Criteria::parse(&args[1]);
    let sum_source = args.get(2).unwrap_or(&args[0]);
    let (values, tests) = match paired_ranges(sum_source, &args[0]) {
        Ok(pair) => pair,
        Err(e) => return e,
    };
    let mut total = 0.0;
    for (value, test) in values.iter().zip(&tests) {
        if criteria.matches(test) {
            total += value.number_value().unwrap_or(0.0);
        }
    }
    Value::number(total)
}

fn fn_sumifs(args: &[Value]) -> Value {
    if args.len() < 3 || args.len() % 2 == 0 {
        return Value::value_error("SUMIFS requires a sum range and criteria pairs");
    }
    let values = flatten(std::slice::from_ref(&args[0]));
    let mut keep = vec![true; values.len()];
    for pair in args[1..].chunks(2) {
        let criteria = Criteria::parse(&pair[1]);
        let tests = flatten(std::slice::from_ref(&pair[0]));
        if tests.len() != values.len() {
            return Value::value_error("SUMIFS ranges must have the same shape");
        }
        for (i, test) in tests.iter().enumerate() {
            keep[i] = keep[i] && criteria.matches(test);
        }
    }
    let total = values
        .iter()
        .zip(&keep)
        .filter(|(_, &k)| k)
        .map(|(v, _)| v.number_value().unwrap_or(0.0))
        .sum();
    Value::number(total)
}
