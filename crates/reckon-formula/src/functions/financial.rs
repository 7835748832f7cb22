//! Financial functions (time-value-of-money family)
//!
//! Sign conventions follow the spreadsheet ones: money you pay out is
//! negative, money you receive is positive.

use super::{numeric, numeric_arg, numeric_scalars, Registry};
use crate::value::Value;
use reckon_core::ErrorKind;

pub(crate) fn register(registry: &mut Registry) {
    registry.register("DDB", fn_ddb);
    registry.register("FV", fn_fv);
    registry.register("IRR", fn_irr);
    registry.register("NPER", fn_nper);
    registry.register("NPV", fn_npv);
    registry.register("PMT", fn_pmt);
    registry.register("PV", fn_pv);
    registry.register("SLN", fn_sln);
    registry.register("SYD", fn_syd);
}

/// Shared argument shape for the FV/PV/PMT/NPER family: three required
/// numbers, then two optional ones defaulting to zero.
fn tvm_args(args: &[Value], name: &str) -> Result<(f64, f64, f64, f64, f64), Value> {
    if args.len() < 3 || args.len() > 5 {
        return Err(Value::value_error(format!(
            "{name} requires three to five arguments"
        )));
    }
    Ok((
        numeric(&args[0])?,
        numeric(&args[1])?,
        numeric(&args[2])?,
        numeric_arg(args, 3, Some(0.0))?,
        numeric_arg(args, 4, Some(0.0))?,
    ))
}

fn fn_fv(args: &[Value]) -> Value {
    let (rate, nper, pmt, pv, due) = match tvm_args(args, "FV") {
        Ok(t) => t,
        Err(e) => return e,
    };
    if rate == 0.0 {
        return Value::number(-(pv + pmt * nper));
    }
    let growth = (1.0 + rate).powf(nper);
    Value::number(-(pv * growth + pmt * (1.0 + rate * due) * (growth - 1.0) / rate))
}

fn fn_pv(args: &[Value]) -> Value {
    let (rate, nper, pmt, fv, due) = match tvm_args(args, "PV") {
        Ok(t) => t,
        Err(e) => return e,
    };
    if rate == 0.0 {
        return Value::number(-(fv + pmt * nper));
    }
    let growth = (1.0 + rate).powf(nper);
    Value::number(-(fv + pmt * (1.0 + rate * due) * (growth - 1.0) / rate) / growth)
}

fn fn_pmt(args: &[Value]) -> Value {
    let (rate, nper, pv, fv, due) = match tvm_args(args, "PMT") {
        Ok(t) => t,
        Err(e) => return e,
    };
    if nper == 0.0 {
        return Value::error(ErrorKind::Num, "PMT over zero periods");
    }
    if rate == 0.0 {
        return Value::number(-(pv + fv) / nper);
    }
    let growth = (1.0 + rate).powf(nper);
    Value::number(-(pv * growth + fv) * rate / ((1.0 + rate * due) * (growth - 1.0)))
}

fn fn_nper(args: &[Value]) -> Value {
    let (rate, pmt, pv, fv, due) = match tvm_args(args, "NPER") {
        Ok(t) => t,
        Err(e) => return e,
    };
    if rate == 0.0 {
        if pmt == 0.0 {
            return Value::error(ErrorKind::Num, "NPER with no payment");
        }
        return Value::number(-(pv + fv) / pmt);
    }
    let adjusted = pmt * (1.0 + rate * due) / rate;
    let numerator = adjusted - fv;
    let denominator = pv + adjusted;
    if denominator == 0.0 || numerator / denominator <= 0.0 {
        return Value::error(ErrorKind::Num, "NPER has no solution");
    }
    Value::number((numerator / denominator).ln() / (1.0 + rate).ln())
}

fn fn_npv(args: &[Value]) -> Value {
    if args.len() < 2 {
        return Value::value_error("NPV requires a rate and at least one value");
    }
    let rate = match numeric(&args[0]) {
        Ok(n) => n,
        Err(e) => return e,
    };
    if rate == -1.0 {
        return Value::error(ErrorKind::DivideByZero, "NPV rate of -100%");
    }
    let values = match numeric_scalars(&args[1..]) {
        Ok(ns) => ns,
        Err(e) => return e,
    };
    let mut total = 0.0;
    for (i, v) in values.iter().enumerate() {
        total += v / (1.0 + rate).powi(i as i32 + 1);
    }
    Value::number(total)
}

/// IRR by Newton iteration over the NPV polynomial; the first cash flow is
/// at time zero
fn fn_irr(args: &[Value]) -> Value {
    if args.is_empty() || args.len() > 2 {
        return Value::value_error("IRR requires values and an optional guess");
    }
    let values = match numeric_scalars(&args[..1]) {
        Ok(ns) => ns,
        Err(e) => return e,
    };
    let guess = match numeric_arg(args, 1, Some(0.1)) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let has_positive = values.iter().any(|&v| v > 0.0);
    let has_negative = values.iter().any(|&v| v < 0.0);
    if !has_positive || !has_negative {
        return Value::error(ErrorKind::Num, "IRR needs both inflows and outflows");
    }

    let npv = |rate: f64| -> f64 {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| v / (1.0 + rate).powi(i as i32))
            .sum()
    };
    let npv_derivative = |rate: f64| -> f64 {
        values
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, v)| -(i as f64) * v / (1.0 + rate).powi(i as i32 + 1))
            .sum()
    };

    let mut rate = guess;
    for _ in 0..100 {
        let f = npv(rate);
        if f.abs() < 1e-10 {
            return Value::number(rate);
        }
        let d = npv_derivative(rate);
        if d == 0.0 || !d.is_finite() {
            break;
        }
        let next = rate - f / d;
        if next <= -1.0 {
            rate = (rate - 1.0) / 2.0;
            continue;
        }
        if (next - rate).abs() < 1e-12 {
            return Value::number(next);
        }
        rate = next;
    }
    Value::error(ErrorKind::Num, "IRR did not converge")
}

fn fn_sln(args: &[Value]) -> Value {
    if args.len() != 3 {
        return Value::value_error("SLN requires three arguments");
    }
    let (cost, salvage, life) = match (numeric(&args[0]), numeric(&args[1]), numeric(&args[2])) {
        (Ok(a), Ok(b), Ok(c)) => (a, b, c),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return e,
    };
    if life == 0.0 {
        return Value::error(ErrorKind::DivideByZero, "SLN life is zero");
    }
    Value::number((cost - salvage) / life)
}

fn fn_syd(args: &[Value]) -> Value {
    if args.len() != 4 {
        return Value::value_error("SYD requires four arguments");
    }
    let values: Result<Vec<f64>, Value> = args.iter().map(numeric).collect();
    let values = match values {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (cost, salvage, life, period) = (values[0], values[1], values[2], values[3]);
    if life <= 0.0 || period < 1.0 || period > life {
        return Value::error(ErrorKind::Num, "SYD period outside the asset life");
    }
    Value::number(
        (cost - salvage) * (life - period + 1.0) * 2.0 / (life * (life + 1.0)),
    )
}

/// Double-declining-balance depreciation, never dipping below salvage
fn fn_ddb(args: &[Value]) -> Value {
    if args.len() < 4 || args.len() > 5 {
        return Value::value_error("DDB requires four or five arguments");
    }
    let (cost, salvage, life, period) = match (
        numeric(&args[0]),
        numeric(&args[1]),
        numeric(&args[2]),
        numeric(&args[3]),
    ) {
        (Ok(a), Ok(b), Ok(c), Ok(d)) => (a, b, c, d),
        (Err(e), _, _, _) | (_, Err(e), _, _) | (_, _, Err(e), _) | (_, _, _, Err(e)) => return e,
    };
    let factor = match numeric_arg(args, 4, Some(2.0)) {
        Ok(n) => n,
        Err(e) => return e,
    };
    if cost < 0.0 || salvage < 0.0 || life <= 0.0 || period < 1.0 || period > life || factor <= 0.0
    {
        return Value::error(ErrorKind::Num, "DDB arguments out of range");
    }
    let rate = factor / life;
    let mut book = cost;
    let mut depreciation = 0.0;
    for _ in 0..period.trunc() as u64 {
        depreciation = (book * rate).min(book - salvage).max(0.0);
        book -= depreciation;
    }
    Value::number(depreciation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testctx::eval;

    fn assert_approx(result: Value, expected: f64) {
        match result {
            Value::Number { value, .. } => assert!(
                (value - expected).abs() < 1e-3,
                "expected {expected}, got {value}"
            ),
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn test_fv_pv_inverse() {
        // Saving 100 per month for a year at 0.5%/month
        assert_approx(eval("=FV(0.005,12,-100)"), 1233.5562);
        assert_approx(eval("=PV(0.005,12,-100)"), 1161.8932);
        // Zero rate degenerates to plain sums
        assert_approx(eval("=FV(0,12,-100)"), 1200.0);
        assert_approx(eval("=PV(0,12,-100)"), 1200.0);
    }

    #[test]
    fn test_pmt_nper() {
        // Paying off 10000 over 24 months at 1%/month
        assert_approx(eval("=PMT(0.01,24,10000)"), -470.7347);
        assert_approx(eval("=PMT(0,24,10000)"), -416.666666666667);
        assert_approx(eval("=NPER(0.01,-470.7347,10000)"), 24.0);
        assert_eq!(
            eval("=PMT(0.01,0,100)").error_kind(),
            Some(ErrorKind::Num)
        );
    }

    #[test]
    fn test_npv() {
        assert_approx(
            eval("=NPV(0.1,100,100)"),
            100.0 / 1.1 + 100.0 / 1.21,
        );
        assert_eq!(
            eval("=NPV(-1,100)").error_kind(),
            Some(ErrorKind::DivideByZero)
        );
    }

    #[test]
    fn test_irr() {
        // NPV at the returned rate is zero
        let rate = eval("=IRR({-1000,300,400,500})").number_value().unwrap();
        let npv = -1000.0
            + 300.0 / (1.0 + rate)
            + 400.0 / (1.0 + rate).powi(2)
            + 500.0 / (1.0 + rate).powi(3);
        assert!(npv.abs() < 1e-6);
        assert_eq!(
            eval("=IRR({100,200})").error_kind(),
            Some(ErrorKind::Num)
        );
    }

    #[test]
    fn test_depreciation() {
        assert_approx(eval("=SLN(10000,1000,5)"), 1800.0);
        assert_approx(eval("=SYD(10000,1000,5,1)"), 3000.0);
        assert_approx(eval("=SYD(10000,1000,5,5)"), 600.0);
        assert_approx(eval("=DDB(10000,1000,5,1)"), 4000.0);
        assert_approx(eval("=DDB(10000,1000,5,2)"), 2400.0);
        assert_eq!(
            eval("=SYD(10000,1000,5,6)").error_kind(),
            Some(ErrorKind::Num)
        );
    }
}
