//! Format-spec mini-language shared by f-strings, `str.format` and `format()`
//!
//! Supports `[[fill]align][sign][0][width][,|_][.precision][type]` with the
//! presentation types `s d x X o b f F e E g G %`.

use super::error::{ScriptError, ScriptResult};
use super::value::Value;

/// Widths and precisions above this are rejected
const MAX_SPEC_NUMBER: usize = 10_000;

#[derive(Debug, Default, Clone, PartialEq)]
struct Spec {
    fill: Option<char>,
    align: Option<char>,
    sign: Option<char>,
    zero: bool,
    width: usize,
    grouping: Option<char>,
    precision: Option<usize>,
    kind: Option<char>,
}

fn spec_number(digits: &[char]) -> ScriptResult<usize> {
    let digits: String = digits.iter().collect();
    digits
        .parse::<usize>()
        .ok()
        .filter(|&n| n <= MAX_SPEC_NUMBER)
        .ok_or_else(|| ScriptError::value_error("Too many decimal digits in format string"))
}

fn parse_spec(spec: &str) -> ScriptResult<Spec> {
    let chars: Vec<char> = spec.chars().collect();
    let invalid = || ScriptError::value_error("Invalid format specifier");
    let mut out = Spec::default();
    let mut i = 0;

    let is_align = |c: char| matches!(c, '<' | '>' | '^' | '=');
    if chars.len() >= 2 && is_align(chars[1]) {
        out.fill = Some(chars[0]);
        out.align = Some(chars[1]);
        i = 2;
    } else if chars.first().is_some_and(|&c| is_align(c)) {
        out.align = Some(chars[0]);
        i = 1;
    }

    if let Some(&c) = chars.get(i) {
        if matches!(c, '+' | '-' | ' ') {
            out.sign = Some(c);
            i += 1;
        }
    }
    if chars.get(i) == Some(&'0') {
        out.zero = true;
        i += 1;
    }

    let start = i;
    while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
        i += 1;
    }
    if i > start {
        out.width = spec_number(&chars[start..i])?;
    }

    if let Some(&c) = chars.get(i) {
        if c == ',' || c == '_' {
            out.grouping = Some(c);
            i += 1;
        }
    }

    if chars.get(i) == Some(&'.') {
        i += 1;
        let start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        if i == start {
            return Err(ScriptError::value_error("Format specifier missing precision"));
        }
        out.precision = Some(spec_number(&chars[start..i])?);
    }

    match &chars[i..] {
        [] => {}
        [c] if "sdxXobfFeEgG%".contains(*c) => out.kind = Some(*c),
        _ => return Err(invalid()),
    }
    Ok(out)
}

/// Format a value according to a format spec
pub fn format_value(value: &Value, spec: &str) -> ScriptResult<String> {
    if spec.is_empty() {
        return Ok(value.to_str());
    }
    let spec = parse_spec(spec)?;
    let unknown = |code: char| {
        ScriptError::value_error(format!(
            "Unknown format code '{}' for object of type '{}'",
            code,
            value.type_name()
        ))
    };

    match (value, spec.kind) {
        (Value::Str(s), None | Some('s')) => {
            let text: String = match spec.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s.clone(),
            };
            if spec.sign.is_some() {
                return Err(ScriptError::value_error(
                    "Sign not allowed in string format specifier",
                ));
            }
            Ok(pad(&spec, "", &text, '<'))
        }
        (Value::Int(_) | Value::Bool(_), None | Some('d')) if spec.precision.is_none() => {
            let n = value.as_int().unwrap_or(0);
            let digits = group(&n.unsigned_abs().to_string(), spec.grouping);
            Ok(pad(&spec, sign_prefix(n < 0, spec.sign), &digits, '>'))
        }
        (Value::Int(_) | Value::Bool(_), Some(code @ ('x' | 'X' | 'o' | 'b'))) => {
            let n = value.as_int().unwrap_or(0);
            let abs = n.unsigned_abs();
            let digits = match code {
                'x' => format!("{:x}", abs),
                'X' => format!("{:X}", abs),
                'o' => format!("{:o}", abs),
                _ => format!("{:b}", abs),
            };
            Ok(pad(&spec, sign_prefix(n < 0, spec.sign), &digits, '>'))
        }
        (Value::Float(_), Some('d')) => Err(unknown('d')),
        (v, kind) if v.is_number() => {
            let x = v.as_float().unwrap_or(0.0);
            let kind = kind.unwrap_or(if spec.precision.is_some() { 'g' } else { 'r' });
            let body = format_float_body(x.abs(), kind, spec.precision);
            let body = match kind {
                'f' | 'F' | '%' | 'r' => group_float(&body, spec.grouping),
                _ => body,
            };
            Ok(pad(
                &spec,
                sign_prefix(x.is_sign_negative() && !x.is_nan(), spec.sign),
                &body,
                '>',
            ))
        }
        (_, Some(code)) => Err(unknown(code)),
        (v, None) => Ok(pad(&spec, "", &v.to_str(), '<')),
    }
}

fn sign_prefix(negative: bool, sign: Option<char>) -> &'static str {
    match (negative, sign) {
        (true, _) => "-",
        (false, Some('+')) => "+",
        (false, Some(' ')) => " ",
        _ => "",
    }
}

/// Format a non-negative float body (no sign)
fn format_float_body(x: f64, kind: char, precision: Option<usize>) -> String {
    if x.is_nan() {
        return if kind.is_ascii_uppercase() { "NAN" } else { "nan" }.to_string();
    }
    if x.is_infinite() {
        return if kind.is_ascii_uppercase() { "INF" } else { "inf" }.to_string();
    }
    match kind {
        'f' | 'F' => format!("{:.*}", precision.unwrap_or(6), x),
        '%' => format!("{:.*}%", precision.unwrap_or(6), x * 100.0),
        'e' | 'E' => {
            let text = exponent_form(x, precision.unwrap_or(6));
            if kind == 'E' {
                text.to_uppercase()
            } else {
                text
            }
        }
        'g' | 'G' => {
            let text = general_form(x, precision.unwrap_or(6));
            if kind == 'G' {
                text.to_uppercase()
            } else {
                text
            }
        }
        _ => super::value::format_float(x),
    }
}

fn exponent_form(x: f64, precision: usize) -> String {
    let text = format!("{:.*e}", precision, x);
    let (mantissa, exponent) = text.split_once('e').unwrap_or((&text, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exponent.abs())
}

fn general_form(x: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if x == 0.0 {
        return "0".to_string();
    }
    let rounded = format!("{:.*e}", precision - 1, x);
    let exponent: i32 = rounded
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);
    let text = if exponent < -4 || exponent >= precision as i32 {
        exponent_form(x, precision - 1)
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        format!("{:.*}", decimals, x)
    };
    strip_trailing_zeros(&text)
}

fn strip_trailing_zeros(text: &str) -> String {
    let (mantissa, exponent) = match text.find('e') {
        Some(i) => (&text[..i], &text[i..]),
        None => (text, ""),
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{}{}", mantissa, exponent)
}

fn group(digits: &str, separator: Option<char>) -> String {
    let Some(sep) = separator else {
        return digits.to_string();
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

fn group_float(body: &str, separator: Option<char>) -> String {
    if separator.is_none() || !body.starts_with(|c: char| c.is_ascii_digit()) {
        return body.to_string();
    }
    let split = body
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len());
    format!("{}{}", group(&body[..split], separator), &body[split..])
}

fn pad(spec: &Spec, sign: &str, body: &str, default_align: char) -> String {
    let (fill, align) = match (spec.fill, spec.align, spec.zero) {
        (fill, Some(align), _) => (fill.unwrap_or(' '), align),
        (_, None, true) => ('0', '='),
        (_, None, false) => (' ', default_align),
    };
    let len = sign.chars().count() + body.chars().count();
    if len >= spec.width {
        return format!("{}{}", sign, body);
    }
    let padding = spec.width - len;
    let fill_str = |n: usize| fill.to_string().repeat(n);
    match align {
        '<' => format!("{}{}{}", sign, body, fill_str(padding)),
        '^' => {
            let left = padding / 2;
            format!("{}{}{}{}", fill_str(left), sign, body, fill_str(padding - left))
        }
        '=' => format!("{}{}{}", sign, fill_str(padding), body),
        _ => format!("{}{}{}", fill_str(padding), sign, body),
    }
}
