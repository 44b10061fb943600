//! Scrubbing of passwords from text bound for logs.
//!
//! Two shapes carry secrets in this workspace: the protocol's
//! `password "..."` command and `password@host` strings taken from
//! `MPD_HOST`. Key/value parameters (`password=...`) are covered as well.

use std::borrow::Cow;

const REDACTED: &str = "[REDACTED]";

/// Commands whose every argument is a secret.
const SENSITIVE_COMMANDS: &[&str] = &["password"];

/// Parameters whose value, up to the next delimiter, is a secret.
const SENSITIVE_PARAMS: &[&str] = &["password=", "passwd=", "secret="];

/// Redact secrets from one or more command lines or log messages.
///
/// # Examples
/// ```
/// use quaver_core::redact::redact_secrets;
///
/// let output = redact_secrets("password \"hunter2\"");
/// assert_eq!(output, "password \"[REDACTED]\"");
/// ```
pub fn redact_secrets(input: &str) -> Cow<'_, str> {
    let mut result = Cow::Borrowed(input);

    if input.lines().any(is_sensitive_command) {
        let redacted: Vec<Cow<'_, str>> = input
            .split('\n')
            .map(|line| {
                if is_sensitive_command(line) {
                    Cow::Owned(redact_command_args(line))
                } else {
                    Cow::Borrowed(line)
                }
            })
            .collect();
        result = Cow::Owned(redacted.join("\n"));
    }

    for pattern in SENSITIVE_PARAMS {
        if result.contains(pattern) {
            result = Cow::Owned(redact_param_value(&result, pattern));
        }
    }

    result
}

/// Hide the password part of a `password@host` specification.
pub fn redact_host_spec(spec: &str) -> Cow<'_, str> {
    match spec.rsplit_once('@') {
        Some((password, host)) if !password.is_empty() && !host.is_empty() => {
            Cow::Owned(format!("{REDACTED}@{host}"))
        }
        _ => Cow::Borrowed(spec),
    }
}

fn is_sensitive_command(line: &str) -> bool {
    let mut words = line.trim_start().splitn(2, ' ');
    let name = words.next().unwrap_or("");
    let has_args = words.next().is_some_and(|rest| !rest.trim().is_empty());
    has_args && SENSITIVE_COMMANDS.contains(&name)
}

fn redact_command_args(line: &str) -> String {
    let indent = line.len() - line.trim_start().len();
    let name = line.trim_start().split(' ').next().unwrap_or("");
    format!("{}{name} \"{REDACTED}\"", &line[..indent])
}

/// Replace the value following each occurrence of `pattern`, up to the next
/// delimiter.
fn redact_param_value(input: &str, pattern: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;

    while let Some(pos) = remaining.find(pattern) {
        result.push_str(&remaining[..pos]);
        result.push_str(pattern);
        result.push_str(REDACTED);

        let after = &remaining[pos + pattern.len()..];
        let end = after
            .find(|c: char| c.is_whitespace() || c == '&' || c == '"' || c == '\'')
            .unwrap_or(after.len());
        remaining = &after[end..];
    }

    result.push_str(remaining);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_password_command() {
        let output = redact_secrets("password \"s3cret \\\"quoted\\\"\"");
        assert!(!output.contains("s3cret"));
        assert_eq!(output, "password \"[REDACTED]\"");
    }

    #[test]
    fn redacts_password_inside_command_list() {
        let input = "command_list_begin\npassword \"x1\"\nstatus\ncommand_list_end\n";
        let output = redact_secrets(input);
        assert!(!output.contains("x1"));
        assert_eq!(
            output,
            "command_list_begin\npassword \"[REDACTED]\"\nstatus\ncommand_list_end\n"
        );
    }

    #[test]
    fn other_commands_pass_through() {
        let input = "find Artist \"password\"";
        assert!(matches!(redact_secrets(input), Cow::Borrowed(_)));
        assert!(matches!(redact_secrets("password"), Cow::Borrowed(_)));
    }

    #[test]
    fn redacts_param_values() {
        let output = redact_secrets("login?user=admin&password=hunter2&x=1");
        assert!(!output.contains("hunter2"));
        assert!(output.contains("password=[REDACTED]"));
        assert!(output.contains("x=1"));
    }

    #[test]
    fn redacts_host_spec_password() {
        assert_eq!(redact_host_spec("pw@jukebox"), "[REDACTED]@jukebox");
        assert_eq!(redact_host_spec("jukebox"), "jukebox");
        assert_eq!(redact_host_spec("@jukebox"), "@jukebox");
    }
}
