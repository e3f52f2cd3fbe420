//! Recursive `${namespace:key=default}` template resolution.
//!
//! A template may contain any number of placeholder spans mixed with literal
//! text. Defaults may themselves contain nested spans; an unconfigured key
//! falls through to its default, recursively, and the remainder of the string
//! past the span is resolved the same way. Resolution happens once per load.

use crate::domain::errors::ContainerError;
use crate::ports::configuration::ConfigSource;

/// Resolve every placeholder span in `template` against `config`.
pub fn resolve_template(
    template: &str,
    config: &dyn ConfigSource,
) -> Result<String, ContainerError> {
    let Some(start) = template.find("${") else {
        return Ok(template.to_string());
    };

    let prefix = &template[..start];
    let body = &template[start + 2..];
    let (span, remainder) = split_span(body, template)?;
    let (key_part, default_part) = split_default(span);

    // The namespace separator is the first `:`; a span without one uses the
    // empty namespace with the whole text as key.
    let (namespace, key) = match key_part.split_once(':') {
        Some((ns, k)) => (ns, k),
        None => ("", key_part),
    };

    let resolved = if config.has_value(namespace, key) {
        config.get_value(namespace, key).unwrap_or_default()
    } else if let Some(default) = default_part {
        resolve_template(default, config)?
    } else {
        return Err(ContainerError::Configuration(format!(
            "no value configured for placeholder `${{{key_part}}}` and no default given"
        )));
    };

    let tail = resolve_template(remainder, config)?;
    Ok(format!("{prefix}{resolved}{tail}"))
}

/// Split `body` (the text after a `${`) into the span inside the braces and
/// the remainder after the matching `}`, honouring nested `${...}` spans.
fn split_span<'a>(body: &'a str, template: &str) -> Result<(&'a str, &'a str), ContainerError> {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            depth += 1;
            i += 2;
            continue;
        }
        if bytes[i] == b'}' {
            if depth == 0 {
                return Ok((&body[..i], &body[i + 1..]));
            }
            depth -= 1;
        }
        i += 1;
    }

    Err(ContainerError::Configuration(format!(
        "unterminated placeholder in `{template}`"
    )))
}

/// Split a span into key and optional default on the first `=` at brace
/// depth zero.
fn split_default(span: &str) -> (&str, Option<&str>) {
    let bytes = span.as_bytes();
    let mut depth = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 1;
            }
            b'}' if depth > 0 => depth -= 1,
            b'=' if depth == 0 => return (&span[..i], Some(&span[i + 1..])),
            _ => {}
        }
        i += 1;
    }

    (span, None)
}
