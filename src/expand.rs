//! Filesystem expansion of word tokens: `~`-home substitution, brace
//! alternation, and wildcard globbing. A pattern that matches nothing is
//! kept as its literal text, so a mistyped or quoted pattern is never
//! silently discarded.

use crate::lexer::{self, Token};

/// Expand every word token in place, leaving operators untouched. Each
/// word may produce several arguments; their order follows the pattern
/// order in the original line.
pub fn expand_tokens(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::new();
    for token in tokens {
        match token {
            Token::Word(w) => out.extend(expand_word(&w).into_iter().map(Token::Word)),
            op => out.push(op),
        }
    }
    out
}

/// Expand a single word. The input carries backslash escapes for quoted
/// metacharacters; the escapes are honored at every stage and stripped
/// from the final literal fallback.
pub fn expand_word(word: &str) -> Vec<String> {
    let word = expand_tilde(word);

    let mut results = Vec::new();
    for alternative in expand_braces(&word) {
        results.extend(expand_glob(&alternative));
    }
    results
}

/// Replace a leading unquoted `~` (alone or followed by `/`) with the home
/// directory. A quoted tilde arrives as `\~` and is left alone.
fn expand_tilde(word: &str) -> String {
    let rest = match word.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => rest,
        _ => return word.to_string(),
    };

    match dirs::home_dir() {
        Some(home) => format!("{}{}", home.display(), rest),
        None => word.to_string(),
    }
}

/// Expand the first unquoted `{a,b,...}` group and recurse on each
/// alternative. A group without a top-level comma, or with no closing
/// brace, stays literal.
fn expand_braces(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();

    let mut open = None;
    let mut depth = 0usize;
    let mut commas = Vec::new();
    let mut close = None;

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '{' => {
                if depth == 0 {
                    open = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            ',' if depth == 1 => commas.push(i),
            _ => {}
        }
        i += 1;
    }

    let (open, close) = match (open, close) {
        (Some(o), Some(c)) => (o, c),
        _ => return vec![word.to_string()],
    };

    let prefix: String = chars[..open].iter().collect();
    let suffix: String = chars[close + 1..].iter().collect();

    if commas.is_empty() {
        // a comma-less group stays literal, but later groups may expand
        let group: String = chars[open..=close].iter().collect();
        return expand_braces(&suffix)
            .into_iter()
            .map(|rest| format!("{}{}{}", prefix, group, rest))
            .collect();
    }

    let mut results = Vec::new();
    let mut start = open + 1;
    for end in commas.into_iter().chain(std::iter::once(close)) {
        let alt: String = chars[start..end].iter().collect();
        results.extend(expand_braces(&format!("{}{}{}", prefix, alt, suffix)));
        start = end + 1;
    }
    results
}

/// Glob-expand one pattern. Escaped characters are converted to the glob
/// engine's literal form; if nothing on the filesystem matches, the
/// unescaped pattern text is returned unchanged.
fn expand_glob(pattern: &str) -> Vec<String> {
    let mut glob_pattern = String::with_capacity(pattern.len());
    let mut has_wildcard = false;
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next) => glob_pattern.push_str(&glob::Pattern::escape(&next.to_string())),
                None => glob_pattern.push_str(&glob::Pattern::escape("\\")),
            },
            '*' | '?' | '[' => {
                has_wildcard = true;
                glob_pattern.push(c);
            }
            _ => glob_pattern.push(c),
        }
    }

    if !has_wildcard {
        return vec![lexer::literal(pattern)];
    }

    let mut matches = Vec::new();
    if let Ok(paths) = glob::glob(&glob_pattern) {
        for path in paths.flatten() {
            matches.push(path.to_string_lossy().to_string());
        }
    }

    if matches.is_empty() {
        vec![lexer::literal(pattern)]
    } else {
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_no_match_returns_input_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/none-*", dir.path().display());
        assert_eq!(expand_word(&pattern), vec![pattern]);
    }

    #[test]
    fn test_glob_matches_files() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("a.txt")).unwrap();
        File::create(dir.path().join("b.txt")).unwrap();
        File::create(dir.path().join("c.log")).unwrap();

        let expanded = expand_word(&format!("{}/*.txt", dir.path().display()));
        assert_eq!(
            expanded,
            vec![
                dir.path().join("a.txt").display().to_string(),
                dir.path().join("b.txt").display().to_string(),
            ]
        );
    }

    #[test]
    fn test_escaped_wildcard_stays_literal() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("a.txt")).unwrap();

        // a quoted `*` arrives escaped and must not match anything
        let expanded = expand_word(&format!("{}/\\*", dir.path().display()));
        assert_eq!(expanded, vec![format!("{}/*", dir.path().display())]);
    }

    #[test]
    fn test_brace_alternation() {
        assert_eq!(expand_word("x{a,b}y"), vec!["xay", "xby"]);
        assert_eq!(expand_word("{1,2}{3,4}"), vec!["13", "14", "23", "24"]);
    }

    #[test]
    fn test_brace_without_comma_is_literal() {
        assert_eq!(expand_word("x{ab}y"), vec!["x{ab}y"]);
        assert_eq!(expand_word("x{open"), vec!["x{open"]);
        // a comma-less group does not stop later groups from expanding
        assert_eq!(expand_word("{a}{b,c}"), vec!["{a}b", "{a}c"]);
    }

    #[test]
    fn test_escaped_brace_is_literal() {
        assert_eq!(expand_word("x\\{a,b\\}y"), vec!["x{a,b}y"]);
    }

    #[test]
    fn test_tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_word("~"), vec![home.display().to_string()]);
            let expanded = expand_word("~/nonexistent-zzz");
            assert_eq!(expanded, vec![format!("{}/nonexistent-zzz", home.display())]);
        }
    }

    #[test]
    fn test_quoted_tilde_is_literal() {
        assert_eq!(expand_word("\\~"), vec!["~"]);
    }
}
