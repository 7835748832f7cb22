//! Statistical functions

use super::{numeric, numeric_scalars, paired_ranges, Registry};
use crate::criteria::Criteria;
use crate::value::{flatten, for_each_scalar, Value};
use reckon_core::ErrorKind;

pub(crate) fn register(registry: &mut Registry) {
    registry.register("AVERAGE", fn_average);
    registry.register("AVERAGEA", fn_averagea);
    registry.register("AVERAGEIF", fn_averageif);
    registry.register("AVERAGEIFS", fn_averageifs);
    registry.register("COUNT", fn_count);
    registry.register("COUNTA", fn_counta);
    registry.register("COUNTBLANK", fn_countblank);
    registry.register("COUNTIF", fn_countif);
    registry.register("COUNTIFS", fn_countifs);
    registry.register("LARGE", fn_large);
    registry.register("MAX", fn_max);
    registry.register("MAXA", fn_maxa);
    registry.register("MEDIAN", fn_median);
    registry.register("MIN", fn_min);
    registry.register("MINA", fn_mina);
    registry.register("SMALL", fn_small);
    registry.register("STDEV", fn_stdev);
    registry.register("STDEV.P", fn_stdev_p);
    registry.register("VAR", fn_var);
    registry.register("VAR.P", fn_var_p);
}

fn fn_average(args: &[Value]) -> Value {
    let numbers = match numeric_scalars(args) {
        Ok(ns) => ns,
        Err(e) => return e,
    };
    if numbers.is_empty() {
        return Value::error(ErrorKind::DivideByZero, "AVERAGE of no numbers");
    }
    Value::number(numbers.iter().sum::<f64>() / numbers.len() as f64)
}

/// AVERAGEA counts text entries as zero
fn fn_averagea(args: &[Value]) -> Value {
    let mut sum = 0.0;
    let mut count = 0usize;
    let mut error: Option<Value> = None;
    for_each_scalar(args.iter(), &mut |v| {
        if error.is_some() {
            return;
        }
        match v {
            Value::Error(_) => error = Some(v.clone()),
            Value::Number { value, .. } => {
                sum += value;
                count += 1;
            }
            Value::String(_) => count += 1,
            _ => {}
        }
    });
    if let Some(e) = error {
        return e;
    }
    if count == 0 {
        return Value::error(ErrorKind::DivideByZero, "AVERAGEA of no values");
    }
    Value::number(sum / count as f64)
}

fn fn_count(args: &[Value]) -> Value {
    let mut count = 0usize;
    for_each_scalar(args.iter(), &mut |v| {
        if matches!(v, Value::Number { .. }) {
            count += 1;
        }
    });
    Value::number(count as f64)
}

fn fn_counta(args: &[Value]) -> Value {
    let mut count = 0usize;
    for_each_scalar(args.iter(), &mut |v| {
        if !v.is_empty() {
            count += 1;
        }
    });
    Value::number(count as f64)
}

fn fn_countblank(args: &[Value]) -> Value {
    let mut count = 0usize;
    for_each_scalar(args.iter(), &mut |v| match v {
        Value::Empty => count += 1,
        Value::String(s) if s.is_empty() => count += 1,
        _ => {}
    });
    Value::number(count as f64)
}

fn fn_countif(args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::value_error("COUNTIF requires two arguments");
    }
    let criteria = Criteria::parse(&args[1]);
    let tests = flatten(std::slice::from_ref(&args[0]));
    let count = tests.iter().filter(|v| criteria.matches(v)).count();
    Value::number(count as f64)
}

fn fn_countifs(args: &[Value]) -> Value {
    if args.len() < 2 || args.len() % 2 != 0 {
        return Value::value_error("COUNTIFS requires range/criteria pairs");
    }
    let first = flatten(std::slice::from_ref(&args[0]));
    let mut keep = vec![true; first.len()];
    for pair in args.chunks(2) {
        let criteria = Criteria::parse(&pair[1]);
        let tests = flatten(std::slice::from_ref(&pair[0]));
        if tests.len() != keep.len() {
            return Value::value_error("COUNTIFS ranges must have the same shape");
        }
        for (i, test) in tests.iter().enumerate() {
            keep[i] = keep[i] && criteria.matches(test);
        }
    }
    Value::number(keep.iter().filter(|&&k| k).count() as f64)
}

fn fn_averageif(args: &[Value]) -> Value {
    if args.len() < 2 || args.len() > 3 {
        return Value::value_error("AVERAGEIF requires two or three arguments");
    }
    let criteria = Criteria::parse(&args[1]);
    let source = args.get(2).unwrap_or(&args[0]);
    let (values, tests) = match paired_ranges(source, &args[0]) {
        Ok(pair) => pair,
        Err(e) => return e,
    };
    let mut sum = 0.0;
    let mut count = 0usize;
    for (value, test) in values.iter().zip(&tests) {
        if criteria.matches(test) {
            if let Some(n) = value.number_value() {
                sum += n;
                count += 1;
            }
        }
    }
    if count == 0 {
        return Value::error(ErrorKind::DivideByZero, "no cells matched AVERAGEIF");
    }
    Value::number(sum / count as f64)
}

fn fn_averageifs(args: &[Value]) -> Value {
    if args.len() < 3 || args.len() % 2 == 0 {
        return Value::value_error("AVERAGEIFS requires an average range and criteria pairs");
    }
    let values = flatten(std::slice::from_ref(&args[0]));
    let mut keep = vec![true; values.len()];
    for pair in args[1..].chunks(2) {
        let criteria = Criteria::parse(&pair[1]);
        let tests = flatten(std::slice::from_ref(&pair[0]));
        if tests.len() != values.len() {
            return Value::value_error("AVERAGEIFS ranges must have the same shape");
        }
        for (i, test) in tests.iter().enumerate() {
            keep[i] = keep[i] && criteria.matches(test);
        }
    }
    let mut sum = 0.0;
    let mut count = 0usize;
    for (value, &k) in values.iter().zip(&keep) {
        if k {
            if let Some(n) = value.number_value() {
                sum += n;
                count += 1;
            }
        }
    }
    if count == 0 {
        return Value::error(ErrorKind::DivideByZero, "no cells matched AVERAGEIFS");
    }
    Value::number(sum / count as f64)
}

fn fn_max(args: &[Value]) -> Value {
    match numeric_scalars(args) {
        Ok(ns) => {
            if ns.is_empty() {
                Value::number(0.0)
            } else {
                Value::number(ns.into_iter().fold(f64::NEG_INFINITY, f64::max))
            }
        }
        Err(e) => e,
    }
}

fn fn_min(args: &[Value]) -> Value {
    match numeric_scalars(args) {
        Ok(ns) => {
            if ns.is_empty() {
                Value::number(0.0)
            } else {
                Value::number(ns.into_iter().fold(f64::INFINITY, f64::min))
            }
        }
        Err(e) => e,
    }
}

/// MAXA/MINA count text entries as zero
fn extrema_with_text(args: &[Value], pick_max: bool) -> Value {
    let mut best: Option<f64> = None;
    let mut error: Option<Value> = None;
    for_each_scalar(args.iter(), &mut |v| {
        if error.is_some() {
            return;
        }
        let candidate = match v {
            Value::Error(_) => {
                error = Some(v.clone());
                return;
            }
            Value::Number { value, .. } => Some(*value),
            Value::String(_) => Some(0.0),
            _ => None,
        };
        if let Some(c) = candidate {
            best = Some(match best {
                Some(b) => {
                    if pick_max {
                        b.max(c)
                    } else {
                        b.min(c)
                    }
                }
                None => c,
            });
        }
    });
    if let Some(e) = error {
        return e;
    }
    Value::number(best.unwrap_or(0.0))
}

fn fn_maxa(args: &[Value]) -> Value {
    extrema_with_text(args, true)
}

fn fn_mina(args: &[Value]) -> Value {
    extrema_with_text(args, false)
}

fn fn_median(args: &[Value]) -> Value {
    let mut numbers = match numeric_scalars(args) {
        Ok(ns) => ns,
        Err(e) => return e,
    };
    if numbers.is_empty() {
        return Value::error(ErrorKind::Num, "MEDIAN of no numbers");
    }
    numbers.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = numbers.len() / 2;
    if numbers.len() % 2 == 1 {
        Value::number(numbers[mid])
    } else {
        Value::number((numbers[mid - 1] + numbers[mid]) / 2.0)
    }
}

fn kth(args: &[Value], name: &str, largest: bool) -> Value {
    if args.len() != 2 {
        return Value::value_error(format!("{name} requires two arguments"));
    }
    let mut numbers = match numeric_scalars(&args[..1]) {
        Ok(ns) => ns,
        Err(e) => return e,
    };
    let k = match numeric(&args[1]) {
        Ok(n) => n.trunc() as i64,
        Err(e) => return e,
    };
    if k < 1 || k as usize > numbers.len() {
        return Value::error(ErrorKind::Num, format!("{name} index out of range"));
    }
    numbers.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = if largest {
        numbers.len() - k as usize
    } else {
        k as usize - 1
    };
    Value::number(numbers[idx])
}

fn fn_large(args: &[Value]) -> Value {
    kth(args, "LARGE", true)
}

fn fn_small(args: &[Value]) -> Value {
    kth(args, "SMALL", false)
}

fn variance(args: &[Value], sample: bool, name: &str) -> Value {
    let numbers = match numeric_scalars(args) {
        Ok(ns) => ns,
        Err(e) => return e,
    };
    let n = numbers.len();
    let min_count = if sample { 2 } else { 1 };
    if n < min_count {
        return Value::error(
            ErrorKind::DivideByZero,
            format!("{name} requires at least {min_count} numbers"),
        );
    }
    let mean = numbers.iter().sum::<f64>() / n as f64;
    let squares: f64 = numbers.iter().map(|x| (x - mean) * (x - mean)).sum();
    let denom = if sample { n - 1 } else { n } as f64;
    Value::number(squares / denom)
}

fn fn_var(args: &[Value]) -> Value {
    variance(args, true, "VAR")
}

fn fn_var_p(args: &[Value]) -> Value {
    variance(args, false, "VAR.P")
}

fn fn_stdev(args: &[Value]) -> Value {
    match variance(args, true, "STDEV") {
        Value::Number { value, .. } => Value::number(value.sqrt()),
        other => other,
    }
}

fn fn_stdev_p(args: &[Value]) -> Value {
    match variance(args, false, "STDEV.P") {
        Value::Number { value, .. } => Value::number(value.sqrt()),
        other => other,
    }
}
