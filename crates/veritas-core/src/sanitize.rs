//! Error message sanitization
//!
//! Messages that reach the log or an HTTP response pass through
//! [`sanitize_message`] so that credentials embedded in upstream error text
//! (query strings, connection strings, auth headers) are not echoed back.

/// Parameter names whose values are redacted
const SENSITIVE_KEYS: &[&str] = &[
    "key",
    "api_key",
    "apikey",
    "token",
    "access_token",
    "secret",
    "password",
    "sig",
];

const REDACTED: &str = "[REDACTED]";

/// Redact credential-like substrings.
///
/// Handles `name=value` / `name: value` pairs for the sensitive names above
/// (case-insensitive, any prefix such as `aeg-sas-key=`) and `Bearer <token>`.
pub fn sanitize_message(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut rest = message;

    while let Some((_, value_start)) = find_secret(rest) {
        out.push_str(&rest[..value_start]);
        out.push_str(REDACTED);
        let tail = &rest[value_start..];
        let value_len = tail
            .find(|c: char| c.is_whitespace() || matches!(c, '&' | ',' | ';' | '"' | '\'' | ')'))
            .unwrap_or(tail.len());
        rest = &tail[value_len..];
    }
    out.push_str(rest);
    out
}

/// Locate the next secret: returns (match start, value start).
fn find_secret(text: &str) -> Option<(usize, usize)> {
    let lower = text.to_ascii_lowercase();
    let mut best: Option<(usize, usize)> = None;

    let mut consider = |start: usize, value_start: usize| {
        if value_start < text.len() && best.is_none_or(|(s, _)| start < s) {
            best = Some((start, value_start));
        }
    };

    if let Some(pos) = lower.find("bearer ") {
        let value_start = pos + "bearer ".len();
        consider(pos, value_start + leading_spaces(&text[value_start..]));
    }

    for key in SENSITIVE_KEYS {
        let mut from = 0;
        while let Some(found) = lower[from..].find(key) {
            let pos = from + found;
            from = pos + key.len();

            // Whole-word on the right: `key=` / `key:` / `key =`
            let after = &text[from..];
            let gap = leading_spaces(after);
            let Some(sep) = after[gap..].chars().next() else {
                break;
            };
            if sep != '=' && sep != ':' {
                continue;
            }
            // Word boundary on the left: `monkey=` is not a key
            let boundary = lower[..pos]
                .chars()
                .next_back()
                .is_none_or(|c| !c.is_ascii_alphanumeric());
            if !boundary {
                continue;
            }
            let value_start = from + gap + sep.len_utf8();
            consider(pos, value_start + leading_spaces(&text[value_start..]));
            break;
        }
    }

    best
}

fn leading_spaces(text: &str) -> usize {
    text.len() - text.trim_start_matches(' ').len()
}
