//! Date and time functions
//!
//! Serial dates use the 1900 date system: day 0 renders as 1899-12-31 and
//! serial 60 is the phantom 1900-02-29 kept for spreadsheet compatibility.
//! Conversions go through [`serial_from_ymd`]/[`ymd_from_serial`] so the
//! phantom day behaves the same everywhere, and DATEDIF/YEARFRAC reproduce
//! the classic basis rules exactly rather than the astronomically correct
//! ones.

use super::{numeric, numeric_arg, text_arg, Registry};
use crate::context::{epoch_1900, Context};
use crate::evaluator::Evaluator;
use crate::value::Value;
use chrono::{Datelike, Duration, Local, NaiveDate, Timelike};
use lazy_regex::regex;
use reckon_core::ErrorKind;

pub(crate) fn register(registry: &mut Registry) {
    registry.register("DATE", fn_date);
    registry.register("DATEDIF", fn_datedif);
    registry.register("DATEVALUE", fn_datevalue);
    registry.register("DAYS", fn_days);
    registry.register("EDATE", fn_edate);
    registry.register("EOMONTH", fn_eomonth);
    registry.register("HOUR", fn_hour);
    registry.register("MINUTE", fn_minute);
    registry.register("SECOND", fn_second);
    registry.register("TIME", fn_time);
    registry.register("TIMEVALUE", fn_timevalue);
    registry.register("WEEKDAY", fn_weekday);
    registry.register("YEARFRAC", fn_yearfrac);
    registry.register_complex("DAY", fn_day);
    registry.register_complex("MONTH", fn_month);
    registry.register_complex("NOW", fn_now);
    registry.register_complex("TODAY", fn_today);
    registry.register_complex("YEAR", fn_year);
}

/// Serial number of the first day of a (possibly unnormalized) month.
/// Month overflow rolls the year; the phantom leap day is handled by serial
/// arithmetic from here.
fn serial_of_month_start(year: i32, month: i32) -> Option<i64> {
    let year = year + (month - 1).div_euclid(12);
    let month = (month - 1).rem_euclid(12) + 1;
    let first = NaiveDate::from_ymd_opt(year, month as u32, 1)?;
    let days = (first - epoch_1900().date()).num_days();
    Some(if days <= 60 { days - 1 } else { days })
}

/// Serial number for a year/month/day triple. Out-of-range days spill into
/// neighboring months by plain serial arithmetic, which is exactly how the
/// phantom 1900-02-29 (serial 60) comes out.
pub(crate) fn serial_from_ymd(year: i32, month: i32, day: i32) -> Option<i64> {
    Some(serial_of_month_start(year, month)? + day as i64 - 1)
}

/// Split a serial into (year, month, day), honoring the phantom leap day
pub(crate) fn ymd_from_serial(serial: i64) -> (i32, u32, u32) {
    if serial == 60 {
        return (1900, 2, 29);
    }
    let days = if serial < 60 { serial + 1 } else { serial };
    let date = epoch_1900().date() + Duration::days(days);
    (date.year(), date.month(), date.day())
}

/// Serial → date triple against the workbook's epoch. The 1900 epoch takes
/// the phantom-day path; other epochs (the 1904 system) are plain offsets.
fn ymd_with_epoch(ctx: &dyn Context, serial: i64) -> (i32, u32, u32) {
    if ctx.epoch() == epoch_1900() {
        ymd_from_serial(serial)
    } else {
        let date = ctx.epoch().date() + Duration::days(serial);
        (date.year(), date.month(), date.day())
    }
}

fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: i32, month: u32) -> i64 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn serial_arg(args: &[Value], idx: usize) -> Result<i64, Value> {
    let n = numeric_arg(args, idx, None)?;
    if n < 0.0 {
        return Err(Value::error(ErrorKind::Num, "negative date serial"));
    }
    Ok(n.trunc() as i64)
}

fn fn_date(args: &[Value]) -> Value {
    if args.len() != 3 {
        return Value::value_error("DATE requires three arguments");
    }
    let (y, m, d) = match (numeric(&args[0]), numeric(&args[1]), numeric(&args[2])) {
        (Ok(a), Ok(b), Ok(c)) => (a.trunc() as i32, b.trunc() as i32, c.trunc() as i32),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return e,
    };
    // Two-digit style years shift into the 1900s
    let y = if (0..=1899).contains(&y) { y + 1900 } else { y };
    if !(1900..=9999).contains(&y) {
        return Value::error(ErrorKind::Num, "DATE year out of range");
    }
    match serial_from_ymd(y, m, d) {
        Some(serial) if serial >= 0 => Value::number(serial as f64),
        _ => Value::error(ErrorKind::Num, "DATE before the epoch"),
    }
}

fn fn_time(args: &[Value]) -> Value {
    if args.len() != 3 {
        return Value::value_error("TIME requires three arguments");
    }
    let (h, m, s) = match (numeric(&args[0]), numeric(&args[1]), numeric(&args[2])) {
        (Ok(a), Ok(b), Ok(c)) => (a.trunc(), b.trunc(), c.trunc()),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return e,
    };
    let total = h * 3600.0 + m * 60.0 + s;
    if total < 0.0 {
        return Value::error(ErrorKind::Num, "TIME before midnight");
    }
    Value::number((total / 86400.0).fract())
}

fn fn_datevalue(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("DATEVALUE requires one argument");
    }
    let text = match text_arg(args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let trimmed = text.trim();
    let iso = regex!(r"^(\d{4})-(\d{1,2})-(\d{1,2})$");
    let us = regex!(r"^(\d{1,2})/(\d{1,2})/(\d{4})$");
    let parts: Option<(i32, i32, i32)> = if let Some(caps) = iso.captures(trimmed) {
        match (caps[1].parse(), caps[2].parse(), caps[3].parse()) {
            (Ok(y), Ok(m), Ok(d)) => Some((y, m, d)),
            _ => None,
        }
    } else if let Some(caps) = us.captures(trimmed) {
        match (caps[3].parse(), caps[1].parse(), caps[2].parse()) {
            (Ok(y), Ok(m), Ok(d)) => Some((y, m, d)),
            _ => None,
        }
    } else {
        None
    };
    let Some((y, m, d)) = parts else {
        return Value::value_error(format!("cannot parse date '{text}'"));
    };
    if !(1..=12).contains(&m) || !(1..=31).contains(&d) || d > days_in_month(y, m as u32) as i32 {
        return Value::value_error(format!("invalid date '{text}'"));
    }
    match serial_from_ymd(y, m, d) {
        Some(serial) if serial >= 0 => Value::number(serial as f64),
        _ => Value::error(ErrorKind::Num, "date before the epoch"),
    }
}

fn fn_timevalue(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("TIMEVALUE requires one argument");
    }
    let text = match text_arg(args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let re = regex!(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?\s*([AaPp][Mm])?$");
    let Some(caps) = re.captures(text.trim()) else {
        return Value::value_error(format!("cannot parse time '{text}'"));
    };
    let mut hours: f64 = caps[1].parse().unwrap_or(0.0);
    let minutes: f64 = caps[2].parse().unwrap_or(0.0);
    let seconds: f64 = caps.get(3).map_or(0.0, |m| m.as_str().parse().unwrap_or(0.0));
    if let Some(half) = caps.get(4) {
        let pm = half.as_str().to_ascii_uppercase() == "PM";
        if hours > 12.0 {
            return Value::value_error(format!("cannot parse time '{text}'"));
        }
        hours = hours % 12.0 + if pm { 12.0 } else { 0.0 };
    }
    if hours >= 24.0 || minutes >= 60.0 || seconds >= 60.0 {
        return Value::value_error(format!("cannot parse time '{text}'"));
    }
    Value::number((hours * 3600.0 + minutes * 60.0 + seconds) / 86400.0)
}

fn fn_year(ctx: &dyn Context, _ev: &Evaluator, args: &[Value]) -> Value {
    match serial_arg(args, 0) {
        Ok(serial) => Value::number(ymd_with_epoch(ctx, serial).0 as f64),
        Err(e) => e,
    }
}

fn fn_month(ctx: &dyn Context, _ev: &Evaluator, args: &[Value]) -> Value {
    match serial_arg(args, 0) {
        Ok(serial) => Value::number(ymd_with_epoch(ctx, serial).1 as f64),
        Err(e) => e,
    }
}

fn fn_day(ctx: &dyn Context, _ev: &Evaluator, args: &[Value]) -> Value {
    match serial_arg(args, 0) {
        Ok(serial) => Value::number(ymd_with_epoch(ctx, serial).2 as f64),
        Err(e) => e,
    }
}

fn now_serial(ctx: &dyn Context) -> f64 {
    let now = Local::now().naive_local();
    let days = (now.date() - ctx.epoch().date()).num_days() as f64;
    let fraction = f64::from(now.time().num_seconds_from_midnight()) / 86400.0;
    days + fraction
}

fn fn_now(ctx: &dyn Context, _ev: &Evaluator, args: &[Value]) -> Value {
    if !args.is_empty() {
        return Value::value_error("NOW takes no arguments");
    }
    Value::number(now_serial(ctx))
}

fn fn_today(ctx: &dyn Context, _ev: &Evaluator, args: &[Value]) -> Value {
    if !args.is_empty() {
        return Value::value_error("TODAY takes no arguments");
    }
    Value::number(now_serial(ctx).trunc())
}

fn fn_days(args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::value_error("DAYS requires two arguments");
    }
    let (end, start) = match (numeric(&args[0]), numeric(&args[1])) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    Value::number(end.trunc() - start.trunc())
}

fn fn_edate(args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::value_error("EDATE requires two arguments");
    }
    let serial = match serial_arg(args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let months = match numeric(&args[1]) {
        Ok(n) => n.trunc() as i32,
        Err(e) => return e,
    };
    let (y, m, d) = ymd_from_serial(serial);
    let target_month = m as i32 + months;
    let year = y + (target_month - 1).div_euclid(12);
    let month = ((target_month - 1).rem_euclid(12) + 1) as u32;
    let day = (d as i64).min(days_in_month(year, month)) as i32;
    match serial_from_ymd(year, month as i32, day) {
        Some(s) if s >= 0 => Value::number(s as f64),
        _ => Value::error(ErrorKind::Num, "EDATE before the epoch"),
    }
}

fn fn_eomonth(args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::value_error("EOMONTH requires two arguments");
    }
    let serial = match serial_arg(args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let months = match numeric(&args[1]) {
        Ok(n) => n.trunc() as i32,
        Err(e) => return e,
    };
    let (y, m, _) = ymd_from_serial(serial);
    let target_month = m as i32 + months;
    let year = y + (target_month - 1).div_euclid(12);
    let month = ((target_month - 1).rem_euclid(12) + 1) as u32;
    match serial_from_ymd(year, month as i32, days_in_month(year, month) as i32) {
        Some(s) if s >= 0 => Value::number(s as f64),
        _ => Value::error(ErrorKind::Num, "EOMONTH before the epoch"),
    }
}

fn time_parts(serial: f64) -> (f64, f64, f64) {
    let seconds = (serial.fract() * 86400.0).round();
    let h = (seconds / 3600.0).floor() % 24.0;
    let m = (seconds / 60.0).floor() % 60.0;
    let s = seconds % 60.0;
    (h, m, s)
}

fn fn_hour(args: &[Value]) -> Value {
    match numeric_arg(args, 0, None) {
        Ok(n) if n >= 0.0 => Value::number(time_parts(n).0),
        Ok(_) => Value::error(ErrorKind::Num, "negative time serial"),
        Err(e) => e,
    }
}

fn fn_minute(args: &[Value]) -> Value {
    match numeric_arg(args, 0, None) {
        Ok(n) if n >= 0.0 => Value::number(time_parts(n).1),
        Ok(_) => Value::error(ErrorKind::Num, "negative time serial"),
        Err(e) => e,
    }
}

fn fn_second(args: &[Value]) -> Value {
    match numeric_arg(args, 0, None) {
        Ok(n) if n >= 0.0 => Value::number(time_parts(n).2),
        Ok(_) => Value::error(ErrorKind::Num, "negative time serial"),
        Err(e) => e,
    }
}

/// WEEKDAY rides on serial arithmetic: serial 1 is a Sunday in this date
/// system (another compatibility artifact of the phantom day)
fn fn_weekday(args: &[Value]) -> Value {
    if args.is_empty() || args.len() > 2 {
        return Value::value_error("WEEKDAY requires one or two arguments");
    }
    let serial = match serial_arg(args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let kind = match numeric_arg(args, 1, Some(1.0)) {
        Ok(n) => n.trunc() as i64,
        Err(e) => return e,
    };
    let value = match kind {
        1 => (serial - 1).rem_euclid(7) + 1,
        2 => (serial - 2).rem_euclid(7) + 1,
        3 => (serial - 2).rem_euclid(7),
        _ => return Value::error(ErrorKind::Num, "WEEKDAY return type out of range"),
    };
    Value::number(value as f64)
}

fn fn_datedif(args: &[Value]) -> Value {
    if args.len() != 3 {
        return Value::value_error("DATEDIF requires three arguments");
    }
    let (start, end) = match (serial_arg(args, 0), serial_arg(args, 1)) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    let unit = match text_arg(args, 2) {
        Ok(s) => s.to_ascii_uppercase(),
        Err(e) => return e,
    };
    if start > end {
        return Value::error(ErrorKind::Num, "DATEDIF start after end");
    }
    let (sy, sm, sd) = ymd_from_serial(start);
    let (ey, em, ed) = ymd_from_serial(end);

    let value = match unit.as_str() {
        "D" => (end - start) as f64,
        "Y" => {
            let mut years = ey - sy;
            if em < sm || (em == sm && ed < sd) {
                years -= 1;
            }
            years as f64
        }
        "M" => {
            let mut months = (ey - sy) * 12 + em as i32 - sm as i32;
            if ed < sd {
                months -= 1;
            }
            months as f64
        }
        "YM" => {
            let mut months = em as i32 - sm as i32;
            if ed < sd {
                months -= 1;
            }
            months.rem_euclid(12) as f64
        }
        "MD" => {
            let mut days = ed as i64 - sd as i64;
            if days < 0 {
                let prev_month = if em == 1 { 12 } else { em - 1 };
                let prev_year = if em == 1 { ey - 1 } else { ey };
                days += days_in_month(prev_year, prev_month);
            }
            days as f64
        }
        "YD" => {
            // Days since the most recent anniversary of the start date
            let anniversary_year = if (em, ed) >= (sm, sd) { ey } else { ey - 1 };
            match serial_from_ymd(anniversary_year, sm as i32, sd as i32) {
                Some(anniversary) => (end - anniversary) as f64,
                None => return Value::error(ErrorKind::Num, "DATEDIF out of range"),
            }
        }
        _ => return Value::error(ErrorKind::Num, format!("unknown DATEDIF unit {unit}")),
    };
    Value::number(value)
}

/// Whether a February 29 falls within [start, end], checking the leap years
/// of both endpoints the way the classic implementation does
fn feb29_between(start: i64, end: i64) -> bool {
    let (sy, _, _) = ymd_from_serial(start);
    let (ey, _, _) = ymd_from_serial(end);
    for year in [sy, ey] {
        if is_leap_year(year) {
            if let Some(leap_day) = serial_from_ymd(year, 2, 29) {
                if start <= leap_day && end >= leap_day {
                    return true;
                }
            }
        }
    }
    false
}

fn fn_yearfrac(args: &[Value]) -> Value {
    if args.len() < 2 || args.len() > 3 {
        return Value::value_error("YEARFRAC requires two or three arguments");
    }
    let (start_f, end_f) = match (numeric(&args[0]), numeric(&args[1])) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    let basis = match numeric_arg(args, 2, Some(0.0)) {
        Ok(n) => n.trunc() as i64,
        Err(e) => return e,
    };
    let (start_f, end_f) = if start_f <= end_f {
        (start_f, end_f)
    } else {
        (end_f, start_f)
    };
    let (start, end) = (start_f.trunc() as i64, end_f.trunc() as i64);
    let (sy, sm, sd) = ymd_from_serial(start);
    let (ey, em, ed) = ymd_from_serial(end);

    let fraction = match basis {
        0 => {
            // 30/360 US (NASD)
            let (mut sd, mut ed) = (sd as i32, ed as i32);
            if sd == 31 && ed == 31 {
                sd = 30;
                ed = 30;
            } else if sd == 31 {
                sd = 30;
            } else if sd == 30 && ed == 31 {
                ed = 30;
            }
            ((ey - sy) * 360 + (em as i32 - sm as i32) * 30 + (ed - sd)) as f64 / 360.0
        }
        1 => {
            // Actual/actual with the classic year-length detection,
            // reproduced as-is for compatibility
            let within_year =
                sy == ey || (sy + 1 == ey && (sm > em || (sm == em && sd >= ed)));
            if within_year {
                let mut year_length = 365.0;
                if sy == ey && is_leap_year(sy) {
                    year_length = 366.0;
                } else if feb29_between(start, end) || (em == 2 && ed == 29) {
                    year_length = 366.0;
                }
                (end_f - start_f) / year_length
            } else {
                let years = (ey - sy + 1) as f64;
                let span = match (serial_from_ymd(ey + 1, 1, 1), serial_from_ymd(sy, 1, 1)) {
                    (Some(to), Some(from)) => (to - from) as f64,
                    _ => return Value::error(ErrorKind::Num, "YEARFRAC out of range"),
                };
                (end_f - start_f) / (span / years)
            }
        }
        2 => (end_f - start_f) / 360.0,
        3 => (end_f - start_f) / 365.0,
        4 => {
            // 30/360 European
            let sd = (sd as i32).min(30);
            let ed = (ed as i32).min(30);
            ((ey - sy) * 360 + (em as i32 - sm as i32) * 30 + (ed - sd)) as f64 / 360.0
        }
        _ => return Value::error(ErrorKind::Num, "YEARFRAC basis out of range"),
    };
    Value::number(fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testctx::eval;
    use pretty_assertions::assert_eq;

    fn assert_approx(result: Value, expected: f64) {
        match result {
            Value::Number { value, .. } => {
                assert!((value - expected).abs() < 1e-9, "expected {expected}, got {value}")
            }
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn test_serial_phantom_leap_day() {
        assert_eq!(serial_from_ymd(1899, 12, 31), Some(0));
        assert_eq!(serial_from_ymd(1900, 1, 1), Some(1));
        assert_eq!(serial_from_ymd(1900, 2, 28), Some(59));
        assert_eq!(serial_from_ymd(1900, 2, 29), Some(60));
        assert_eq!(serial_from_ymd(1900, 3, 1), Some(61));
        assert_eq!(ymd_from_serial(59), (1900, 2, 28));
        assert_eq!(ymd_from_serial(60), (1900, 2, 29));
        assert_eq!(ymd_from_serial(61), (1900, 3, 1));
    }

    #[test]
    fn test_date() {
        assert_eq!(eval("=DATE(1900,2,29)"), Value::number(60.0));
        assert_eq!(eval("=DATE(1900,3,0)"), Value::number(60.0));
        assert_eq!(eval("=DATE(1900,3,1)"), Value::number(61.0));
        assert_eq!(eval("=DATE(2008,1,1)"), Value::number(39448.0));
        // Month overflow rolls the year
        assert_eq!(eval("=DATE(2008,14,2)"), eval("=DATE(2009,2,2)"));
        // Small years shift into the 1900s
        assert_eq!(eval("=DATE(108,1,2)"), eval("=DATE(2008,1,2)"));
        assert_eq!(eval("=DATE(-1,1,1)").error_kind(), Some(ErrorKind::Num));
    }

    #[test]
    fn test_ymd_accessors() {
        assert_eq!(eval("=YEAR(60)"), Value::number(1900.0));
        assert_eq!(eval("=MONTH(60)"), Value::number(2.0));
        assert_eq!(eval("=DAY(60)"), Value::number(29.0));
        assert_eq!(eval("=YEAR(DATE(2012,7,14))"), Value::number(2012.0));
        assert_eq!(eval("=MONTH(DATE(2012,7,14))"), Value::number(7.0));
        assert_eq!(eval("=DAY(DATE(2012,7,14))"), Value::number(14.0));
    }

    #[test]
    fn test_time_and_accessors() {
        assert_approx(eval("=TIME(12,0,0)"), 0.5);
        assert_approx(eval("=TIME(6,30,15)"), (6.0 * 3600.0 + 30.0 * 60.0 + 15.0) / 86400.0);
        assert_eq!(eval("=HOUR(TIME(18,45,30))"), Value::number(18.0));
        assert_eq!(eval("=MINUTE(TIME(18,45,30))"), Value::number(45.0));
        assert_eq!(eval("=SECOND(TIME(18,45,30))"), Value::number(30.0));
    }

    #[test]
    fn test_datevalue_timevalue() {
        assert_eq!(eval("=DATEVALUE(\"2008-01-01\")"), Value::number(39448.0));
        assert_eq!(eval("=DATEVALUE(\"1/1/2008\")"), Value::number(39448.0));
        assert_eq!(
            eval("=DATEVALUE(\"nonsense\")").error_kind(),
            Some(ErrorKind::Value)
        );
        assert_approx(eval("=TIMEVALUE(\"12:00\")"), 0.5);
        assert_approx(eval("=TIMEVALUE(\"6:30:00 PM\")"), 66600.0 / 86400.0);
    }

    #[test]
    fn test_days_edate_eomonth() {
        assert_eq!(
            eval("=DAYS(DATE(2020,3,1),DATE(2020,2,1))"),
            Value::number(29.0)
        );
        assert_eq!(eval("=EDATE(DATE(2020,1,31),1)"), eval("=DATE(2020,2,29)"));
        assert_eq!(eval("=EDATE(DATE(2020,3,15),-1)"), eval("=DATE(2020,2,15)"));
        assert_eq!(eval("=EOMONTH(DATE(2020,2,11),0)"), eval("=DATE(2020,2,29)"));
        assert_eq!(eval("=EOMONTH(DATE(2020,1,1),11)"), eval("=DATE(2020,12,31)"));
    }

    #[test]
    fn test_weekday() {
        // Serial 1 is a Sunday in this date system
        assert_eq!(eval("=WEEKDAY(1)"), Value::number(1.0));
        assert_eq!(eval("=WEEKDAY(7)"), Value::number(7.0));
        assert_eq!(eval("=WEEKDAY(1,2)"), Value::number(7.0));
        assert_eq!(eval("=WEEKDAY(1,3)"), Value::number(6.0));
        // 2012-07-14 was a Saturday
        assert_eq!(eval("=WEEKDAY(DATE(2012,7,14))"), Value::number(7.0));
    }

    #[test]
    fn test_datedif() {
        assert_eq!(
            eval("=DATEDIF(DATE(2001,1,1),DATE(2003,1,1),\"Y\")"),
            Value::number(2.0)
        );
        assert_eq!(
            eval("=DATEDIF(DATE(2001,6,1),DATE(2002,8,15),\"D\")"),
            Value::number(440.0)
        );
        assert_eq!(
            eval("=DATEDIF(DATE(2001,6,1),DATE(2002,8,15),\"YD\")"),
            Value::number(75.0)
        );
        assert_eq!(
            eval("=DATEDIF(DATE(2001,6,1),DATE(2002,8,15),\"MD\")"),
            Value::number(14.0)
        );
        assert_eq!(
            eval("=DATEDIF(DATE(2001,6,1),DATE(2002,8,15),\"M\")"),
            Value::number(14.0)
        );
        assert_eq!(
            eval("=DATEDIF(DATE(2001,6,1),DATE(2002,8,15),\"YM\")"),
            Value::number(2.0)
        );
        assert_eq!(
            eval("=DATEDIF(DATE(2003,1,1),DATE(2001,1,1),\"Y\")").error_kind(),
            Some(ErrorKind::Num)
        );
    }

    #[test]
    fn test_yearfrac_bases() {
        // 30/360 US
        assert_approx(
            eval("=YEARFRAC(DATE(2012,1,1),DATE(2012,7,30))"),
            209.0 / 360.0,
        );
        // Actual/actual within one ordinary year
        assert_approx(
            eval("=YEARFRAC(DATE(2011,1,1),DATE(2011,12,31),1)"),
            364.0 / 365.0,
        );
        // A span containing Feb 29 uses a 366-day year
        assert_approx(
            eval("=YEARFRAC(DATE(2012,1,1),DATE(2012,12,31),1)"),
            365.0 / 366.0,
        );
        // Actual/360 and actual/365
        assert_approx(
            eval("=YEARFRAC(DATE(2012,1,1),DATE(2012,12,31),2)"),
            365.0 / 360.0,
        );
        assert_approx(
            eval("=YEARFRAC(DATE(2012,1,1),DATE(2012,12,31),3)"),
            1.0,
        );
        assert_eq!(
            eval("=YEARFRAC(1,2,9)").error_kind(),
            Some(ErrorKind::Num)
        );
    }
}
