//! Positional line templates
//!
//! `%s` takes the next argument, `%N$s` takes argument `N` (1-based) without
//! moving the cursor, `%%` is a literal percent sign. Surplus arguments are
//! ignored.

use crate::error::{AssistError, AssistResult};
use std::fmt::{Display, Write};

/// Expand `%s`, `%N$s` and `%%` conversions in `template` against `args`
pub fn expand(template: &str, args: &[&dyn Display]) -> AssistResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next = 0usize;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut digits = String::new();
        while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
            digits.push(d);
            chars.next();
        }

        let index = if digits.is_empty() {
            match chars.next() {
                Some('%') => {
                    out.push('%');
                    continue;
                }
                Some('s') => {
                    next += 1;
                    next - 1
                }
                other => return Err(malformed(template, other)),
            }
        } else {
            if chars.next() != Some('$') {
                return Err(malformed(template, None));
            }
            match chars.next() {
                Some('s') => {}
                other => return Err(malformed(template, other)),
            }
            match digits.parse::<usize>() {
                Ok(n) if n > 0 => n - 1,
                _ => {
                    return Err(AssistError::MalformedTemplate {
                        template: template.to_string(),
                        reason: format!("invalid argument index {}", digits),
                    })
                }
            }
        };

        let arg = args.get(index).ok_or_else(|| AssistError::MissingArgument {
            template: template.to_string(),
            index: index + 1,
        })?;
        // Writing into a String cannot fail
        let _ = write!(out, "{}", arg);
    }

    Ok(out)
}

fn malformed(template: &str, found: Option<char>) -> AssistError {
    let reason = match found {
        Some(c) => format!("unsupported conversion `%{}`", c),
        None => "incomplete conversion".to_string(),
    };
    AssistError::MalformedTemplate {
        template: template.to_string(),
        reason,
    }
}
