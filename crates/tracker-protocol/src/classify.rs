//! Reporting-interval command classification
//!
//! The interval directive looks like `AT+TIMEGAP=<p1>,<p2>,...`. A command
//! string may chain several directives with `&`:
//!
//! ```text
//! AT+TIMEGAP=0,600,1,600 & AT+SAMPLEMODE=0,0
//! ```

/// Directive that sets the periodic reporting cadence
pub const INTERVAL_DIRECTIVE: &str = "AT+TIMEGAP";

/// Separator between chained directives
const DIRECTIVE_SEPARATOR: char = '&';

/// Returns true if the command contains the interval directive (any case)
pub fn is_interval_command(command: &str) -> bool {
    command
        .trim()
        .to_ascii_uppercase()
        .contains(INTERVAL_DIRECTIVE)
}

/// Extract the interval directive's parameters
///
/// Captures the text after `AT+TIMEGAP=` up to the next `&`, split on commas
/// and trimmed. Returns `None` if the directive is absent, has no `=`, or
/// carries nothing.
pub fn interval_params(command: &str) -> Option<Vec<String>> {
    // ASCII uppercasing keeps byte offsets, so positions map back to `command`
    let upper = command.to_ascii_uppercase();
    let start = upper.find(INTERVAL_DIRECTIVE)? + INTERVAL_DIRECTIVE.len();
    let rest = command[start..].strip_prefix('=')?;

    let args = match rest.find(DIRECTIVE_SEPARATOR) {
        Some(end) => &rest[..end],
        None => rest,
    };
    if args.trim().is_empty() {
        return None;
    }

    Some(args.split(',').map(|p| p.trim().to_string()).collect())
}

/// Returns true if both commands set the interval to identical parameters
///
/// Parameters compare as strings: `600` and `600.0` differ.
pub fn intervals_equivalent(a: &str, b: &str) -> bool {
    if !is_interval_command(a) || !is_interval_command(b) {
        return false;
    }

    match (interval_params(a), interval_params(b)) {
        (Some(pa), Some(pb)) => pa == pb,
        _ => false,
    }
}
