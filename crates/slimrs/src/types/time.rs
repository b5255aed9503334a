//! `Time` (spec §4.2), UTC-only seconds-since-epoch as documented in spec's
//! Open Questions. `strftime` is ported from `original_source/include/slim/
//! types/Time.cpp`'s anonymous-namespace `Format`/`fmt_token`/`strftime`: a
//! `<flags><width><modifier>` prefix parsed per-directive, every directive
//! (numeric or string) rendered through the same `fmt_num`/`fmt_str` padding
//! machinery, and the combination directives (`%c %D %x %F %v %r %R %T %X`)
//! built by composing a sub-`Format` with neutral (unflagged) defaults and
//! then re-padding the whole composed string through the outer flags.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

use crate::error::{argument_error, SlimResult};
use crate::intern::Symbol;
use crate::object::SlimObject;
use crate::value::Value;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap())
}

#[must_use]
pub fn to_display_string(secs: i64) -> String {
    strftime(secs, "%Y-%m-%d %H:%M:%S +0000").unwrap_or_default()
}

fn month_index(v: &Value) -> SlimResult<u32> {
    match v {
        Value::Number(n) => Ok(*n as u32),
        Value::Str(s) => MONTH_ABBREV
            .iter()
            .position(|m| m.eq_ignore_ascii_case(&s.text))
            .map(|i| i as u32 + 1)
            .ok_or_else(|| argument_error(format!("invalid month name {:?}", s.text))),
        other => Err(argument_error(format!("month must be a Number or String, got {}", other.type_name()))),
    }
}

fn as_i64(v: Option<&Value>, default: i64) -> SlimResult<i64> {
    match v {
        None => Ok(default),
        Some(Value::Number(n)) => Ok(*n as i64),
        Some(other) => Err(argument_error(format!("expected a Number, got {}", other.type_name()))),
    }
}

/// Parses the optional 7th `new(...)` argument: `"+HH:MM"`/`"-HH:MM"` or a
/// signed number of seconds (spec §4.2 Time).
fn parse_utc_offset(v: &Value) -> SlimResult<i64> {
    match v {
        Value::Number(n) => Ok(*n as i64),
        Value::Str(s) => {
            let t = s.text.trim();
            let (sign, rest) = match t.strip_prefix('-') {
                Some(r) => (-1, r),
                None => (1, t.strip_prefix('+').unwrap_or(t)),
            };
            let (h, m) = rest.split_once(':').ok_or_else(|| argument_error("invalid utc_offset string"))?;
            let h: i64 = h.parse().map_err(|_| argument_error("invalid utc_offset string"))?;
            let m: i64 = m.parse().map_err(|_| argument_error("invalid utc_offset string"))?;
            Ok(sign * (h * 3600 + m * 60))
        }
        other => Err(argument_error(format!("utc_offset must be a Number or String, got {}", other.type_name()))),
    }
}

fn build(args: &[Value]) -> SlimResult<Value> {
    let year = as_i64(args.first(), 1970)?;
    let month = args.get(1).map(month_index).transpose()?.unwrap_or(1);
    let day = as_i64(args.get(2), 1)? as u32;
    let hour = as_i64(args.get(3), 0)?;
    let min = as_i64(args.get(4), 0)?;
    let sec = as_i64(args.get(5), 0)?;
    let dt = Utc
        .with_ymd_and_hms(year as i32, month.max(1), day.max(1), 0, 0, 0)
        .single()
        .ok_or_else(|| argument_error("invalid date components"))?;
    let mut secs = dt.timestamp() + hour * 3600 + min * 60 + sec;
    if let Some(offset_arg) = args.get(6) {
        secs -= parse_utc_offset(offset_arg)?;
    }
    Ok(Value::Time(secs))
}

/// The `Time` constant's class-level method table (`Time.now`, `Time.at`,
/// ...), registered on the `ViewModel` as a `UserObject` (spec §6's
/// registration contract applied to the engine's own built-in class
/// objects, since ViewModel constants only ever hold plain `Value`s).
#[derive(Debug)]
pub struct TimeClass;

impl SlimObject for TimeClass {
    fn type_name(&self) -> &'static str {
        "Time"
    }

    fn to_display_string(&self) -> String {
        "Time".to_owned()
    }

    fn call_method(&self, name: Symbol, args: &[Value]) -> Option<SlimResult<Value>> {
        Some(match name.as_str() {
            "now" => Err(argument_error(
                "Time.now requires a host-provided clock; use Time.at(seconds) in a deterministic embedding",
            )),
            "at" => match args.first() {
                Some(Value::Number(n)) => Ok(Value::Time(*n as i64)),
                _ => Err(argument_error("Time.at requires a Number of seconds")),
            },
            "utc" | "gm" | "local" | "mktime" | "new" => build(args),
            _ => return None,
        })
    }
}

pub fn call(receiver: &Value, name: Symbol, args: &[Value]) -> SlimResult<Value> {
    let Value::Time(secs) = receiver else {
        unreachable!("time::call always receives a Value::Time");
    };
    let secs = *secs;
    match name.as_str() {
        "to_i" => Ok(Value::Number(secs as f64)),
        "to_f" => Ok(Value::Number(secs as f64)),
        "+" => match args.first() {
            Some(Value::Number(n)) => Ok(Value::Time(secs + *n as i64)),
            _ => Err(argument_error("Time#+ requires a Number of seconds")),
        },
        "-" => match args.first() {
            Some(Value::Number(n)) => Ok(Value::Time(secs - *n as i64)),
            Some(Value::Time(other)) => Ok(Value::Number((secs - other) as f64)),
            _ => Err(argument_error("Time#- requires a Number or Time")),
        },
        "year" => Ok(Value::Number(at(secs).year() as f64)),
        "month" | "mon" => Ok(Value::Number(at(secs).month() as f64)),
        "day" | "mday" => Ok(Value::Number(at(secs).day() as f64)),
        "hour" => Ok(Value::Number(at(secs).hour() as f64)),
        "min" => Ok(Value::Number(at(secs).minute() as f64)),
        "sec" => Ok(Value::Number(at(secs).second() as f64)),
        "wday" => Ok(Value::Number(at(secs).weekday().num_days_from_sunday() as f64)),
        "yday" => Ok(Value::Number(at(secs).ordinal() as f64)),
        "to_s" | "inspect" => Ok(Value::str(to_display_string(secs))),
        "strftime" => {
            let fmt = match args.first() {
                Some(Value::Str(s)) => s.text.clone(),
                _ => return Err(argument_error("strftime requires a String format")),
            };
            strftime(secs, &fmt).map(Value::str)
        }
        _ => Err(crate::error::no_such_method(format!("undefined method `{name}' for Time"))),
    }
}

const MONTH_ABBREV: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];
const MONTH_FULL: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September", "October", "November", "December",
];
const DAY_FULL: [&str; 7] = ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];
const DAY_ABBREV: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Clone, Copy, PartialEq)]
enum Padding {
    Default,
    Spaces,
    Zeros,
}

/// One `%`-directive's `<flags><width><modifier>` prefix (`Format` in the
/// original). `width` is capped at two digits (0-99) exactly like the
/// original's `parse_width` — it reads at most a first and a possible second
/// digit, never more, so `%999Y` parses as width 99 followed by literal `9Y`.
struct Flags {
    not_numeric: bool,
    padding: Padding,
    upcase: bool,
    colon_tz: bool,
    width: Option<u32>,
}

impl Flags {
    fn neutral() -> Self {
        Flags {
            not_numeric: false,
            padding: Padding::Default,
            upcase: false,
            colon_tz: false,
            width: None,
        }
    }

    fn parse(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Self {
        let mut flags = Flags::neutral();
        loop {
            match chars.peek() {
                Some('-') => {
                    flags.not_numeric = true;
                    chars.next();
                }
                Some('_') => {
                    flags.padding = Padding::Spaces;
                    chars.next();
                }
                Some('0') => {
                    flags.padding = Padding::Zeros;
                    chars.next();
                }
                Some('^') => {
                    flags.upcase = true;
                    chars.next();
                }
                Some(':') => {
                    flags.colon_tz = true;
                    chars.next();
                }
                _ => break,
            }
        }
        if let Some(d1) = chars.peek().copied().filter(char::is_ascii_digit) {
            chars.next();
            let mut width = d1.to_digit(10).expect("filtered ascii digit");
            if let Some(d2) = chars.peek().copied().filter(char::is_ascii_digit) {
                chars.next();
                width = width * 10 + d2.to_digit(10).expect("filtered ascii digit");
            }
            flags.width = Some(width);
        }
        if matches!(chars.peek(), Some('E' | 'O')) {
            chars.next();
        }
        flags
    }
}

/// Spec §4.2 `strftime`. Ported from `Time.cpp`'s `Format::fmt_num`: pads a
/// non-negative integer to `width` (the directive's own width flag, else
/// `default_width`) with the effective padding mode, unless `-` (no_pad in
/// `flags.not_numeric`) suppresses padding entirely.
fn fmt_num(out: &mut String, default_width: u32, default_padding: Padding, value: i64, flags: &Flags) {
    let s = value.unsigned_abs().to_string();
    let width = flags.width.unwrap_or(default_width) as usize;
    if s.len() < width && !flags.not_numeric {
        let mode = if flags.padding == Padding::Default { default_padding } else { flags.padding };
        let ch = if mode == Padding::Zeros { '0' } else { ' ' };
        for _ in 0..(width - s.len()) {
            out.push(ch);
        }
    }
    out.push_str(&s);
}

/// `Format::fmt_str`: pads a name/word to `width` (only if a width flag was
/// given — unlike `fmt_num` there is no implicit default) and upcases it if
/// `^` was given.
fn fmt_str(out: &mut String, s: &str, flags: &Flags) {
    if let Some(width) = flags.width {
        let width = width as usize;
        if s.len() < width {
            let ch = if flags.padding == Padding::Zeros { '0' } else { ' ' };
            for _ in 0..(width - s.len()) {
                out.push(ch);
            }
        }
    }
    if flags.upcase {
        out.push_str(&s.to_uppercase());
    } else {
        out.push_str(s);
    }
}

fn fmt_12_hour(out: &mut String, default_padding: Padding, hour24: u32, flags: &Flags) {
    let h = match hour24 % 12 {
        0 => 12,
        h => h,
    };
    fmt_num(out, 2, default_padding, h as i64, flags);
}

fn fmt_zone_offset(out: &mut String, flags: &Flags) {
    out.push_str(if flags.colon_tz { "+00:00" } else { "+0000" });
}

/// `%c`: `%a %b %e %T %Y`, each inner field formatted with neutral flags and
/// the whole composed string then padded/upcased by the directive's own
/// `flags` (`Format::fmt_date_and_time`).
fn fmt_date_and_time(out: &mut String, dt: &DateTime<Utc>, flags: &Flags) {
    let n = Flags::neutral();
    let mut tmp = String::new();
    fmt_str(&mut tmp, DAY_ABBREV[dt.weekday().num_days_from_sunday() as usize], &n);
    tmp.push(' ');
    fmt_str(&mut tmp, &MONTH_FULL[dt.month0() as usize][..3], &n);
    tmp.push(' ');
    fmt_num(&mut tmp, 2, Padding::Spaces, dt.day() as i64, &n);
    tmp.push(' ');
    fmt_24_time_seconds_into(&mut tmp, dt, &n);
    tmp.push(' ');
    fmt_num(&mut tmp, 4, Padding::Zeros, dt.year() as i64, &n);
    fmt_str(out, &tmp, flags);
}

/// `%D`/`%x`: `%m/%d/%y` (`Format::fmt_date`).
fn fmt_date(out: &mut String, dt: &DateTime<Utc>, flags: &Flags) {
    let n = Flags::neutral();
    let mut tmp = String::new();
    fmt_num(&mut tmp, 2, Padding::Zeros, dt.month() as i64, &n);
    tmp.push('/');
    fmt_num(&mut tmp, 2, Padding::Zeros, dt.day() as i64, &n);
    tmp.push('/');
    fmt_num(&mut tmp, 2, Padding::Zeros, (dt.year() % 100).abs() as i64, &n);
    fmt_str(out, &tmp, flags);
}

/// `%F`: `%Y-%m-%d` (`Format::fmt_iso_8601`).
fn fmt_iso_8601(out: &mut String, dt: &DateTime<Utc>, flags: &Flags) {
    let n = Flags::neutral();
    let mut tmp = String::new();
    fmt_num(&mut tmp, 4, Padding::Zeros, dt.year() as i64, &n);
    tmp.push('-');
    fmt_num(&mut tmp, 2, Padding::Zeros, dt.month() as i64, &n);
    tmp.push('-');
    fmt_num(&mut tmp, 2, Padding::Zeros, dt.day() as i64, &n);
    fmt_str(out, &tmp, flags);
}

/// `%v`: `%e-%^b-%4Y` (`Format::fmt_vms_date`) — the month abbreviation is
/// upcased unconditionally by the inner format, independent of the outer
/// directive's own `^` flag.
fn fmt_vms_date(out: &mut String, dt: &DateTime<Utc>, flags: &Flags) {
    let mut upcased = Flags::neutral();
    upcased.upcase = true;
    let n = Flags::neutral();
    let mut tmp = String::new();
    fmt_num(&mut tmp, 2, Padding::Spaces, dt.day() as i64, &n);
    tmp.push('-');
    fmt_str(&mut tmp, &MONTH_FULL[dt.month0() as usize][..3], &upcased);
    tmp.push('-');
    fmt_num(&mut tmp, 4, Padding::Zeros, dt.year() as i64, &n);
    fmt_str(out, &tmp, flags);
}

/// `%r`: `%I:%M:%S %p` (`Format::fmt_12_time`).
fn fmt_12_time(out: &mut String, dt: &DateTime<Utc>, flags: &Flags) {
    let n = Flags::neutral();
    let mut tmp = String::new();
    fmt_12_hour(&mut tmp, Padding::Zeros, dt.hour(), &n);
    tmp.push(':');
    fmt_num(&mut tmp, 2, Padding::Zeros, dt.minute() as i64, &n);
    tmp.push(':');
    fmt_num(&mut tmp, 2, Padding::Zeros, dt.second() as i64, &n);
    tmp.push(' ');
    fmt_str(&mut tmp, if dt.hour() >= 12 { "PM" } else { "AM" }, &n);
    fmt_str(out, &tmp, flags);
}

/// `%R`: `%H:%M` (`Format::fmt_24_time`).
fn fmt_24_time(out: &mut String, dt: &DateTime<Utc>, flags: &Flags) {
    let n = Flags::neutral();
    let mut tmp = String::new();
    fmt_num(&mut tmp, 2, Padding::Zeros, dt.hour() as i64, &n);
    tmp.push(':');
    fmt_num(&mut tmp, 2, Padding::Zeros, dt.minute() as i64, &n);
    fmt_str(out, &tmp, flags);
}

/// `%T`/`%X`: `%H:%M:%S` (`Format::fmt_24_time_seconds`).
fn fmt_24_time_seconds(out: &mut String, dt: &DateTime<Utc>, flags: &Flags) {
    let n = Flags::neutral();
    let mut tmp = String::new();
    fmt_24_time_seconds_into(&mut tmp, dt, &n);
    fmt_str(out, &tmp, flags);
}

fn fmt_24_time_seconds_into(tmp: &mut String, dt: &DateTime<Utc>, n: &Flags) {
    fmt_num(tmp, 2, Padding::Zeros, dt.hour() as i64, n);
    tmp.push(':');
    fmt_num(tmp, 2, Padding::Zeros, dt.minute() as i64, n);
    tmp.push(':');
    fmt_num(tmp, 2, Padding::Zeros, dt.second() as i64, n);
}

/// `Format::fmt_token` / `fmt_token` free function: every directive except
/// `%z` rejects a `:` flag outright (`fmt.flags.colon_tz` is only meaningful
/// for the timezone offset). Returns `false` for an unrecognized directive,
/// mirroring the original's "emit a literal `%`" fallback.
fn fmt_token(out: &mut String, dt: &DateTime<Utc>, flags: &Flags, directive: char) -> bool {
    if directive == 'z' {
        fmt_zone_offset(out, flags);
        return true;
    }
    if flags.colon_tz {
        return false;
    }
    match directive {
        'Y' => fmt_num(out, 4, Padding::Zeros, dt.year() as i64, flags),
        'C' => fmt_num(out, 2, Padding::Zeros, dt.year() as i64 / 100, flags),
        'y' => fmt_num(out, 2, Padding::Zeros, (dt.year() % 100).abs() as i64, flags),
        'm' => fmt_num(out, 2, Padding::Zeros, dt.month() as i64, flags),
        'B' => fmt_str(out, MONTH_FULL[dt.month0() as usize], flags),
        'b' | 'h' => fmt_str(out, &MONTH_FULL[dt.month0() as usize][..3], flags),
        'd' => fmt_num(out, 2, Padding::Zeros, dt.day() as i64, flags),
        'e' => fmt_num(out, 2, Padding::Spaces, dt.day() as i64, flags),
        'j' => fmt_num(out, 3, Padding::Zeros, dt.ordinal() as i64, flags),
        'A' => fmt_str(out, DAY_FULL[dt.weekday().num_days_from_sunday() as usize], flags),
        'a' => fmt_str(out, DAY_ABBREV[dt.weekday().num_days_from_sunday() as usize], flags),
        'u' => fmt_num(out, 1, Padding::Zeros, dt.weekday().number_from_monday() as i64, flags),
        'w' => fmt_num(out, 1, Padding::Zeros, dt.weekday().num_days_from_sunday() as i64, flags),
        'H' => fmt_num(out, 2, Padding::Zeros, dt.hour() as i64, flags),
        'k' => fmt_num(out, 2, Padding::Spaces, dt.hour() as i64, flags),
        'I' => fmt_12_hour(out, Padding::Zeros, dt.hour(), flags),
        'l' => fmt_12_hour(out, Padding::Spaces, dt.hour(), flags),
        'P' => fmt_str(out, if dt.hour() < 12 { "am" } else { "pm" }, flags),
        'p' => fmt_str(out, if dt.hour() < 12 { "AM" } else { "PM" }, flags),
        'M' => fmt_num(out, 2, Padding::Zeros, dt.minute() as i64, flags),
        'S' => fmt_num(out, 2, Padding::Zeros, dt.second() as i64, flags),
        'L' => fmt_num(out, 3, Padding::Zeros, 0, flags),
        'N' => fmt_num(out, 9, Padding::Zeros, 0, flags),
        'Z' => fmt_str(out, "UTC", flags),
        'c' => fmt_date_and_time(out, dt, flags),
        'x' | 'D' => fmt_date(out, dt, flags),
        'F' => fmt_iso_8601(out, dt, flags),
        'v' => fmt_vms_date(out, dt, flags),
        'r' => fmt_12_time(out, dt, flags),
        'R' => fmt_24_time(out, dt, flags),
        'X' | 'T' => fmt_24_time_seconds(out, dt, flags),
        _ => return false,
    }
    true
}

/// Threadsafe, locale- and timezone-independent `strftime` with the Ruby
/// `Time#strftime` extensions the directive set above covers (spec §4.2):
/// `%Y %C %y %m %B %b %h %d %e %j %A %a %u %w %H %k %I %l %P %p %M %S %L %N
/// %z %:z %Z %c %D %x %F %v %r %R %T %X %n %t %%`, flags `- _ 0 ^ :`, width
/// capped at two digits, and `E`/`O` modifiers accepted and ignored.
pub fn strftime(secs: i64, fmt: &str) -> SlimResult<String> {
    let dt = at(secs);
    let mut out = String::new();
    let mut chars = fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => {
                chars.next();
                out.push('\n');
                continue;
            }
            Some('t') => {
                chars.next();
                out.push('\t');
                continue;
            }
            Some('%') => {
                chars.next();
                out.push('%');
                continue;
            }
            None => {
                out.push('%');
                break;
            }
            _ => {}
        }
        let flags = Flags::parse(&mut chars);
        let Some(directive) = chars.next() else {
            out.push('%');
            break;
        };
        if !fmt_token(&mut out, &dt, &flags, directive) {
            out.push('%');
            out.push(directive);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2023-03-05 is a Sunday; 06:07:08 UTC.
    const T: i64 = 1_677_996_428;

    fn s(fmt: &str) -> String {
        strftime(T, fmt).unwrap()
    }

    #[test]
    fn width_is_capped_at_two_digits() {
        // `%999Y` reads width 99, then `9Y` is literal text, matching the
        // original's two-digit `parse_width` rather than parsing "999".
        assert_eq!(s("%999Y"), format!("{:>99}9Y", "2023"));
    }

    #[test]
    fn flags_apply_to_previously_hardcoded_directives() {
        assert_eq!(s("%-e"), "5");
        assert_eq!(s("%0e"), "05");
        assert_eq!(s("%u"), "7");
        assert_eq!(s("%w"), "0");
        assert_eq!(s("%-k"), "6");
        assert_eq!(s("%0k"), "06");
        assert_eq!(s("%-l"), "6");
    }

    #[test]
    fn composite_directives_respect_outer_width_and_upcase() {
        assert_eq!(s("%D"), "03/05/23");
        assert_eq!(s("%x"), "03/05/23");
        assert_eq!(s("%F"), "2023-03-05");
        assert_eq!(s("%v"), " 5-MAR-2023");
        assert_eq!(s("%r"), "06:07:08 AM");
        assert_eq!(s("%R"), "06:07");
        assert_eq!(s("%T"), "06:07:08");
        assert_eq!(s("%X"), "06:07:08");
        assert_eq!(s("%c"), "Sun Mar  5 06:07:08 2023");
    }

    #[test]
    fn colon_flag_is_only_valid_on_z() {
        assert_eq!(s("%:z"), "+00:00");
        assert_eq!(s("%z"), "+0000");
        // `:` on any other directive is rejected outright.
        assert_eq!(s("%:Y"), "%Y");
    }

    #[test]
    fn plain_text_and_escapes_pass_through() {
        assert_eq!(s("%%"), "%");
        assert_eq!(s("%n"), "\n");
        assert_eq!(s("%t"), "\t");
        assert_eq!(s("hi"), "hi");
    }
}
