//! Value extraction from free-text model answers.
//!
//! Extraction never guesses: when the value is not in the text the caller
//! gets `None` and decides how to report it.

/// Find the demand score (1-10) in a free-text answer.
///
/// An explicit "N/10" or "N out of 10" wins, then a number leading the
/// answer, then the only in-range number left. Scale echoes ("1 to 10",
/// "1-10"), numbers inside words ("PS5") and decimals are ignored. Two
/// or more competing candidates give `None`.
pub fn hype_score(text: &str) -> Option<u8> {
    let numbers = numbers(text);
    let in_range = |n: &Number| n.value.filter(|v| (1..=10).contains(v));

    if let Some(score) = numbers
        .iter()
        .filter(|n| is_out_of_ten(text, n))
        .find_map(in_range)
    {
        return Some(score);
    }

    let candidates: Vec<&Number> = numbers
        .iter()
        .filter(|n| !is_range_start(text, n) && !is_range_end(text, n))
        .collect();

    if let Some(&first) = candidates.first() {
        let leading = !text[..first.start].chars().any(|c| c.is_alphanumeric());
        if let (true, Some(score)) = (leading, in_range(first)) {
            return Some(score);
        }
    }

    let mut scores: Vec<u8> = candidates.iter().copied().filter_map(in_range).collect();
    scores.dedup();
    match scores.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

/// Find a valid 15-digit IMEI in a free-text answer.
///
/// Digits may be grouped with spaces, dashes or slashes ("35-209900-176148-1").
/// A candidate is a run of whole adjacent groups totalling 15 digits, so a
/// slot label ("IMEI 1 ...") or a second IMEI next to the first does not
/// spoil the match. Only candidates passing the Luhn check are returned.
pub fn imei(text: &str) -> Option<String> {
    digit_runs(text).iter().find_map(|groups| {
        (0..groups.len()).find_map(|first| {
            let mut candidate = String::new();
            for group in &groups[first..] {
                candidate.push_str(group);
                if candidate.len() >= 15 {
                    break;
                }
            }
            (candidate.len() == 15 && luhn_valid(&candidate)).then_some(candidate)
        })
    })
}

/// Digit groups joined by single separators, e.g. "49-015420 323751/8"
/// yields one run of four groups.
fn digit_runs(text: &str) -> Vec<Vec<&str>> {
    let bytes = text.as_bytes();
    let mut runs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            current.push(&text[start..i]);
            let joined = i + 1 < bytes.len()
                && matches!(bytes[i], b' ' | b'-' | b'/')
                && bytes[i + 1].is_ascii_digit();
            if joined {
                i += 1;
            } else {
                runs.push(std::mem::take(&mut current));
            }
        } else {
            i += 1;
        }
    }
    runs
}

/// Luhn checksum over an ASCII digit string.
pub fn luhn_valid(digits: &str) -> bool {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// A standalone integer in the text and its byte span.
struct Number {
    start: usize,
    end: usize,
    /// `None` when it does not fit a `u8`
    value: Option<u8>,
}

/// Integers that are neither part of a decimal ("7.5") nor glued to a
/// letter ("PS5", "5G").
fn numbers(text: &str) -> Vec<Number> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let before = start.checked_sub(1).map(|b| bytes[b]);
        let after = bytes.get(i).copied();
        let decimal = before == Some(b'.')
            || (after == Some(b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit));
        let in_word = before.is_some_and(|b| b.is_ascii_alphabetic())
            || after.is_some_and(|b| b.is_ascii_alphabetic());
        if !decimal && !in_word {
            out.push(Number {
                start,
                end: i,
                value: text[start..i].parse().ok(),
            });
        }
    }
    out
}

/// "8/10", "8 / 10", "8 out of 10".
fn is_out_of_ten(text: &str, n: &Number) -> bool {
    let rest = text[n.end..].trim_start();
    let rest = rest
        .strip_prefix('/')
        .or_else(|| rest.strip_prefix("out of"))
        .map(str::trim_start);
    rest.is_some_and(|r| r.starts_with("10") && !r[2..].starts_with(|c: char| c.is_ascii_digit()))
}

/// The "1" in "1 to 10" or "1-10".
fn is_range_start(text: &str, n: &Number) -> bool {
    let rest = text[n.end..].trim_start();
    ["to", "-", "–"]
        .iter()
        .filter_map(|sep| rest.strip_prefix(sep))
        .any(|r| r.trim_start().starts_with(|c: char| c.is_ascii_digit()))
}

/// The "10" in "1 to 10", "1-10", "/10" or "out of 10".
fn is_range_end(text: &str, n: &Number) -> bool {
    let before = text[..n.start].trim_end();
    if before.ends_with('/') || before.ends_with("out of") {
        return true;
    }
    ["to", "-", "–"]
        .iter()
        .filter_map(|sep| before.strip_suffix(sep))
        .any(|b| b.trim_end().ends_with(|c: char| c.is_ascii_digit()))
}
