//! Counter extraction from Prometheus-style exposition text.
//!
//! Not a full parser: only enough to read one named counter out of the
//! `/metrics` body. Comment lines (`# HELP`, `# TYPE`, ...) are skipped.

/// Value of `metric_name` in `text`, or `None` if no usable sample line exists.
///
/// The name must match exactly, so `posts_total` never matches
/// `posts_total_created`. Labelled series of the same metric are summed.
/// Values must be non-negative integers, written either as integers or as
/// floats without a fractional part (`42`, `42.0`, `4.2e1`).
pub fn counter_value(text: &str, metric_name: &str) -> Option<u64> {
    if metric_name.is_empty() {
        return None;
    }

    let mut total: Option<u64> = None;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(value) = sample_value(line, metric_name) else {
            continue;
        };
        total = Some(total.unwrap_or(0).saturating_add(value));
    }
    total
}

fn sample_value(line: &str, metric_name: &str) -> Option<u64> {
    let rest = line.strip_prefix(metric_name)?;
    let rest = match rest.strip_prefix('{') {
        Some(labels) => skip_labels(labels)?,
        None => rest,
    };
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    // Anything after the value is an optional timestamp.
    parse_value(rest.split_whitespace().next()?)
}

/// Skip past the closing `}` of a label set, honoring quoted values.
fn skip_labels(labels: &str) -> Option<&str> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in labels.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '}' if !in_quotes => return Some(&labels[i + 1..]),
            _ => {}
        }
    }
    None
}

fn parse_value(raw: &str) -> Option<u64> {
    if let Ok(v) = raw.parse::<u64>() {
        return Some(v);
    }
    let v = raw.parse::<f64>().ok()?;
    if !v.is_finite() || v < 0.0 || v.fract() != 0.0 || v > u64::MAX as f64 {
        return None;
    }
    Some(v as u64)
}
