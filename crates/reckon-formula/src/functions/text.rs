//! Text functions
//!
//! Positions and lengths are in characters, not bytes, and are 1-based as
//! the formula surface expects.

use super::{numeric, numeric_arg, text_arg, truthy, Registry};
use crate::criteria::wildcard_index;
use crate::value::{for_each_scalar, Value};

pub(crate) fn register(registry: &mut Registry) {
    registry.register("CHAR", fn_char);
    registry.register("CLEAN", fn_clean);
    registry.register("CODE", fn_code);
    registry.register("CONCAT", fn_concat);
    registry.register("CONCATENATE", fn_concatenate);
    registry.register("EXACT", fn_exact);
    registry.register("FIND", fn_find);
    registry.register("LEFT", fn_left);
    registry.register("LEN", fn_len);
    registry.register("LOWER", fn_lower);
    registry.register("MID", fn_mid);
    registry.register("PROPER", fn_proper);
    registry.register("REPLACE", fn_replace);
    registry.register("REPT", fn_rept);
    registry.register("RIGHT", fn_right);
    registry.register("SEARCH", fn_search);
    registry.register("SUBSTITUTE", fn_substitute);
    registry.register("T", fn_t);
    registry.register("TEXTJOIN", fn_textjoin);
    registry.register("TRIM", fn_trim);
    registry.register("UNICHAR", fn_unichar);
    registry.register("UNICODE", fn_unicode);
    registry.register("UPPER", fn_upper);
    registry.register("VALUE", fn_value);
}

fn fn_char(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("CHAR requires one argument");
    }
    let n = match numeric(&args[0]) {
        Ok(n) => n.trunc() as i64,
        Err(e) => return e,
    };
    if !(1..=255).contains(&n) {
        return Value::value_error("CHAR code out of range");
    }
    match char::from_u32(n as u32) {
        Some(c) => Value::string(c.to_string()),
        None => Value::value_error("CHAR code out of range"),
    }
}

fn fn_unichar(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("UNICHAR requires one argument");
    }
    let n = match numeric(&args[0]) {
        Ok(n) => n.trunc() as i64,
        Err(e) => return e,
    };
    if n < 1 {
        return Value::value_error("UNICHAR code out of range");
    }
    match u32::try_from(n).ok().and_then(char::from_u32) {
        Some(c) => Value::string(c.to_string()),
        None => Value::value_error("UNICHAR code out of range"),
    }
}

fn fn_code(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("CODE requires one argument");
    }
    let s = match text_arg(args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match s.chars().next() {
        Some(c) => Value::number(c as u32 as f64),
        None => Value::value_error("CODE of empty text"),
    }
}

fn fn_unicode(args: &[Value]) -> Value {
    match fn_code(args) {
        Value::Error(e) => Value::Error(crate::value::ErrorValue::new(
            e.kind,
            e.message.replace("CODE", "UNICODE"),
        )),
        other => other,
    }
}

fn fn_clean(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("CLEAN requires one argument");
    }
    match text_arg(args, 0) {
        Ok(s) => Value::string(s.chars().filter(|c| !c.is_control()).collect::<String>()),
        Err(e) => e,
    }
}

/// CONCAT flattens range and array arguments before joining
fn fn_concat(args: &[Value]) -> Value {
    let mut out = String::new();
    let mut error: Option<Value> = None;
    for_each_scalar(args.iter(), &mut |v| {
        if error.is_some() {
            return;
        }
        if v.is_error() {
            error = Some(v.clone());
            return;
        }
        out.push_str(&v.text());
    });
    match error {
        Some(e) => e,
        None => Value::string(out),
    }
}

/// CONCATENATE joins scalar arguments only
fn fn_concatenate(args: &[Value]) -> Value {
    let mut out = String::new();
    for arg in args {
        if arg.is_error() {
            return arg.clone();
        }
        out.push_str(&arg.text());
    }
    Value::string(out)
}

fn fn_exact(args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::value_error("EXACT requires two arguments");
    }
    let (a, b) = match (text_arg(args, 0), text_arg(args, 1)) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    Value::boolean(a == b)
}

/// FIND is case-sensitive and takes no wildcards
fn fn_find(args: &[Value]) -> Value {
    if args.len() < 2 || args.len() > 3 {
        return Value::value_error("FIND requires two or three arguments");
    }
    let (needle, haystack) = match (text_arg(args, 0), text_arg(args, 1)) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    let start = match numeric_arg(args, 2, Some(1.0)) {
        Ok(n) => n.trunc() as i64,
        Err(e) => return e,
    };
    let chars: Vec<char> = haystack.chars().collect();
    if start < 1 || start as usize > chars.len() + 1 {
        return Value::value_error("FIND start position out of range");
    }
    let skip = start as usize - 1;
    let tail: String = chars[skip..].iter().collect();
    match tail.find(&needle) {
        Some(byte_pos) => {
            let chars_before = tail[..byte_pos].chars().count();
            Value::number((skip + chars_before + 1) as f64)
        }
        None => Value::value_error("FIND text not found"),
    }
}

/// SEARCH is case-insensitive and honors `*`/`?` wildcards
fn fn_search(args: &[Value]) -> Value {
    if args.len() < 2 || args.len() > 3 {
        return Value::value_error("SEARCH requires two or three arguments");
    }
    let (needle, haystack) = match (text_arg(args, 0), text_arg(args, 1)) {
        (Ok(a), Ok(b)) => (a.to_lowercase(), b.to_lowercase()),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    let start = match numeric_arg(args, 2, Some(1.0)) {
        Ok(n) => n.trunc() as i64,
        Err(e) => return e,
    };
    let chars: Vec<char> = haystack.chars().collect();
    if start < 1 || start as usize > chars.len() + 1 {
        return Value::value_error("SEARCH start position out of range");
    }
    let skip = start as usize - 1;
    let tail: String = chars[skip..].iter().collect();
    match wildcard_index(&needle, &tail) {
        Some(pos) => Value::number((skip + pos + 1) as f64),
        None => Value::value_error("SEARCH text not found"),
    }
}

fn fn_left(args: &[Value]) -> Value {
    if args.is_empty() || args.len() > 2 {
        return Value::value_error("LEFT requires one or two arguments");
    }
    let s = match text_arg(args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let count = match numeric_arg(args, 1, Some(1.0)) {
        Ok(n) => n.trunc(),
        Err(e) => return e,
    };
    if count < 0.0 {
        return Value::value_error("LEFT count is negative");
    }
    Value::string(s.chars().take(count as usize).collect::<String>())
}

fn fn_right(args: &[Value]) -> Value {
    if args.is_empty() || args.len() > 2 {
        return Value::value_error("RIGHT requires one or two arguments");
    }
    let s = match text_arg(args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let count = match numeric_arg(args, 1, Some(1.0)) {
        Ok(n) => n.trunc(),
        Err(e) => return e,
    };
    if count < 0.0 {
        return Value::value_error("RIGHT count is negative");
    }
    let chars: Vec<char> = s.chars().collect();
    let take = (count as usize).min(chars.len());
    Value::string(chars[chars.len() - take..].iter().collect::<String>())
}

fn fn_mid(args: &[Value]) -> Value {
    if args.len() != 3 {
        return Value::value_error("MID requires three arguments");
    }
    let s = match text_arg(args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let (start, count) = match (numeric(&args[1]), numeric(&args[2])) {
        (Ok(a), Ok(b)) => (a.trunc(), b.trunc()),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    if start < 1.0 || count < 0.0 {
        return Value::value_error("MID position out of range");
    }
    Value::string(
        s.chars()
            .skip(start as usize - 1)
            .take(count as usize)
            .collect::<String>(),
    )
}

fn fn_len(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("LEN requires one argument");
    }
    match text_arg(args, 0) {
        Ok(s) => Value::number(s.chars().count() as f64),
        Err(e) => e,
    }
}

fn fn_lower(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("LOWER requires one argument");
    }
    match text_arg(args, 0) {
        Ok(s) => Value::string(s.to_lowercase()),
        Err(e) => e,
    }
}

fn fn_upper(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("UPPER requires one argument");
    }
    match text_arg(args, 0) {
        Ok(s) => Value::string(s.to_uppercase()),
        Err(e) => e,
    }
}

/// PROPER capitalizes the first letter of each alphabetic run
fn fn_proper(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("PROPER requires one argument");
    }
    let s = match text_arg(args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    Value::string(out)
}

/// TRIM removes leading/trailing spaces and collapses internal runs
fn fn_trim(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("TRIM requires one argument");
    }
    match text_arg(args, 0) {
        Ok(s) => Value::string(s.split_whitespace().collect::<Vec<_>>().join(" ")),
        Err(e) => e,
    }
}

fn fn_replace(args: &[Value]) -> Value {
    if args.len() != 4 {
        return Value::value_error("REPLACE requires four arguments");
    }
    let s = match text_arg(args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let (start, count) = match (numeric(&args[1]), numeric(&args[2])) {
        (Ok(a), Ok(b)) => (a.trunc(), b.trunc()),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    let new = match text_arg(args, 3) {
        Ok(s) => s,
        Err(e) => return e,
    };
    if start < 1.0 || count < 0.0 {
        return Value::value_error("REPLACE position out of range");
    }
    let chars: Vec<char> = s.chars().collect();
    let start = (start as usize - 1).min(chars.len());
    let end = (start + count as usize).min(chars.len());
    let mut out: String = chars[..start].iter().collect();
    out.push_str(&new);
    out.extend(chars[end..].iter());
    Value::string(out)
}

fn fn_rept(args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::value_error("REPT requires two arguments");
    }
    let s = match text_arg(args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let count = match numeric(&args[1]) {
        Ok(n) => n.trunc(),
        Err(e) => return e,
    };
    if count < 0.0 {
        return Value::value_error("REPT count is negative");
    }
    Value::string(s.repeat(count as usize))
}

fn fn_substitute(args: &[Value]) -> Value {
    if args.len() < 3 || args.len() > 4 {
        return Value::value_error("SUBSTITUTE requires three or four arguments");
    }
    let (s, old, new) = match (text_arg(args, 0), text_arg(args, 1), text_arg(args, 2)) {
        (Ok(a), Ok(b), Ok(c)) => (a, b, c),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return e,
    };
    if old.is_empty() {
        return Value::string(s);
    }
    match args.get(3) {
        None | Some(Value::Empty) => Value::string(s.replace(&old, &new)),
        Some(v) => {
            let instance = match numeric(v) {
                Ok(n) => n.trunc() as i64,
                Err(e) => return e,
            };
            if instance < 1 {
                return Value::value_error("SUBSTITUTE instance must be positive");
            }
            let mut seen = 0i64;
            let mut out = String::with_capacity(s.len());
            let mut rest = s.as_str();
            while let Some(pos) = rest.find(&old) {
                seen += 1;
                if seen == instance {
                    out.push_str(&rest[..pos]);
                    out.push_str(&new);
                    out.push_str(&rest[pos + old.len()..]);
                    return Value::string(out);
                }
                out.push_str(&rest[..pos + old.len()]);
                rest = &rest[pos + old.len()..];
            }
            Value::string(s)
        }
    }
}

/// T returns text values unchanged and "" for everything else
fn fn_t(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("T requires one argument");
    }
    match &args[0] {
        Value::Error(_) => args[0].clone(),
        Value::String(s) => Value::string(s.clone()),
        _ => Value::string(""),
    }
}

fn fn_textjoin(args: &[Value]) -> Value {
    if args.len() < 3 {
        return Value::value_error("TEXTJOIN requires a delimiter, a flag, and values");
    }
    let delimiter = match text_arg(args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    if args[1].is_error() {
        return args[1].clone();
    }
    let ignore_empty = truthy(&args[1]).unwrap_or(true);
    let mut pieces: Vec<String> = Vec::new();
    let mut error: Option<Value> = None;
    for_each_scalar(args[2..].iter(), &mut |v| {
        if error.is_some() {
            return;
        }
        if v.is_error() {
            error = Some(v.clone());
            return;
        }
        let text = v.text();
        if !(ignore_empty && text.is_empty()) {
            pieces.push(text);
        }
    });
    match error {
        Some(e) => e,
        None => Value::string(pieces.join(&delimiter)),
    }
}

fn fn_value(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::value_error("VALUE requires one argument");
    }
    if args[0].is_error() {
        return args[0].clone();
    }
    let s = args[0].text();
    let trimmed = s.trim();
    // Percent and thousands-separator forms parse too
    if let Some(stripped) = trimmed.strip_suffix('%') {
        if let Ok(n) = stripped.trim().parse::<f64>() {
            return Value::number(n / 100.0);
        }
    }
    match trimmed.replace(',', "").parse::<f64>() {
        Ok(n) => Value::number(n),
        Err(_) => Value::value_error(format!("cannot convert '{s}' to a number")),
    }
}
