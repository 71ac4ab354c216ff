//! `{{name}}` token substitution. Not a templating crate — the substitution
//! surface is exactly one token family, so a small hand-rolled scanner is
//! used instead of pulling in `handlebars`/`tera` for it.
//!
//! Unknown tokens expand to the empty string. A malformed token — an opening
//! `{{` with no matching `}}` before the input ends — is left verbatim.

use std::collections::HashMap;

/// Replace every `{{name}}` occurrence in `input` using `vars`. Keys are
/// looked up trimmed of surrounding whitespace inside the braces.
pub fn expand(input: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'{' && bytes.get(i + 1) == Some(&b'{') {
            match find_closing(input, i + 2) {
                Some(end) => {
                    let name = input[i + 2..end].trim();
                    if let Some(value) = vars.get(name) {
                        out.push_str(value);
                    }
                    i = end + 2;
                }
                None => {
                    out.push_str(&input[i..i + 2]);
                    i += 2;
                }
            }
        } else {
            let ch = input[i..].chars().next().unwrap();
            out.push(ch);
            i += ch.len_utf8();
        }
    }

    out
}

/// Index of the first `}}` at or after `start`, or `None` if the token never closes.
fn find_closing(input: &str, start: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut i = start;
    while i + 1 < bytes.len() {
        if bytes[i] == b'}' && bytes[i + 1] == b'}' {
            return Some(i);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_known_tokens() {
        let out = expand("Hi {{name}}!", &vars(&[("name", "Alice")]));
        assert_eq!(out, "Hi Alice!");
    }

    #[test]
    fn unknown_tokens_expand_to_empty() {
        let out = expand("Hi {{name}}!", &vars(&[]));
        assert_eq!(out, "Hi !");
    }

    #[test]
    fn malformed_unterminated_token_left_verbatim() {
        let out = expand("Hi {{name!", &vars(&[("name", "Alice")]));
        assert_eq!(out, "Hi {{name!");
    }

    #[test]
    fn trims_whitespace_inside_braces() {
        let out = expand("Hi {{ name }}!", &vars(&[("name", "Alice")]));
        assert_eq!(out, "Hi Alice!");
    }

    #[test]
    fn multiple_tokens_in_one_string() {
        let out = expand(
            "{{greeting}}, {{name}}!",
            &vars(&[("greeting", "Hello"), ("name", "Bob")]),
        );
        assert_eq!(out, "Hello, Bob!");
    }
}
