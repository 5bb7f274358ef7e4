//! Splits a raw input line into words and operators.
//!
//! Quoting rules: single quotes enter verbatim mode, where operator and
//! whitespace characters lose their meaning; a backslash outside quotes
//! makes the next character behave as if it were quoted. Characters that
//! are special to the glob expander are carried backslash-escaped inside a
//! `Word` when they were quoted, so the expander can tell a literal `*`
//! from a wildcard. `literal()` undoes that escaping.

/// One element of the tokenized line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Pipe,
    RedirectIn,
    RedirectOut,
    RedirectAppend,
}

/// Whether a logical line still needs more input to be complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    Complete,
    /// A single quote is still open; the next physical line belongs to it.
    Quote,
    /// The line ended in an unquoted backslash.
    Backslash,
}

/// Characters the glob expander treats specially. Quoted occurrences get a
/// backslash prefix so they survive expansion as literals.
const GLOB_SPECIALS: &[char] = &['\\', '~', '?', '*', '[', ']', '{', '}'];

fn push_quoted(word: &mut String, c: char) {
    if GLOB_SPECIALS.contains(&c) {
        word.push('\\');
    }
    word.push(c);
}

/// Tokenize one statement. An unterminated quote swallows the rest of the
/// line as verbatim text rather than dropping it; the reader normally
/// prevents that case by continuing the logical line first.
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = line.chars().peekable();

    let flush = |word: &mut String, in_word: &mut bool, tokens: &mut Vec<Token>| {
        if *in_word {
            tokens.push(Token::Word(std::mem::take(word)));
            *in_word = false;
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                for q in chars.by_ref() {
                    if q == '\'' {
                        break;
                    }
                    push_quoted(&mut word, q);
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(next) => push_quoted(&mut word, next),
                    None => push_quoted(&mut word, '\\'),
                }
            }
            ' ' | '\t' | '\n' => flush(&mut word, &mut in_word, &mut tokens),
            '|' => {
                flush(&mut word, &mut in_word, &mut tokens);
                tokens.push(Token::Pipe);
            }
            '<' => {
                flush(&mut word, &mut in_word, &mut tokens);
                tokens.push(Token::RedirectIn);
            }
            '>' => {
                flush(&mut word, &mut in_word, &mut tokens);
                if chars.peek() == Some(&'>') {
                    chars.next();
                    tokens.push(Token::RedirectAppend);
                } else {
                    tokens.push(Token::RedirectOut);
                }
            }
            _ => {
                in_word = true;
                word.push(c);
            }
        }
    }
    flush(&mut word, &mut in_word, &mut tokens);

    tokens
}

/// Strip the internal backslash escaping from a word, recovering the text
/// the user actually typed.
pub fn literal(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut chars = word.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Cut the input at the first unquoted `;` or `&`. Returns the statement
/// text, whether it was marked for background execution, and the remainder
/// to be processed on the next loop iteration.
pub fn split_statement(input: &str) -> (&str, bool, Option<&str>) {
    let mut in_quote = false;
    let mut iter = input.char_indices();

    while let Some((i, c)) = iter.next() {
        match c {
            '\'' => in_quote = !in_quote,
            '\\' if !in_quote => {
                iter.next();
            }
            ';' if !in_quote => return (&input[..i], false, Some(&input[i + 1..])),
            '&' if !in_quote => return (&input[..i], true, Some(&input[i + 1..])),
            _ => {}
        }
    }

    (input, false, None)
}

/// Decide whether the accumulated logical line is complete, still inside a
/// quote, or spliced by a trailing backslash.
pub fn needs_continuation(line: &str) -> Continuation {
    let mut in_quote = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => in_quote = !in_quote,
            '\\' if !in_quote => {
                if chars.next().is_none() {
                    return Continuation::Backslash;
                }
            }
            _ => {}
        }
    }

    if in_quote {
        Continuation::Quote
    } else {
        Continuation::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    #[test]
    fn test_words_and_operators() {
        assert_eq!(
            tokenize("cat < in | sort > out"),
            vec![
                word("cat"),
                Token::RedirectIn,
                word("in"),
                Token::Pipe,
                word("sort"),
                Token::RedirectOut,
                word("out"),
            ]
        );
    }

    #[test]
    fn test_operators_without_spaces() {
        assert_eq!(
            tokenize("a|b>c"),
            vec![word("a"), Token::Pipe, word("b"), Token::RedirectOut, word("c")]
        );
    }

    #[test]
    fn test_append_is_one_operator() {
        assert_eq!(
            tokenize("echo hi >> log"),
            vec![word("echo"), word("hi"), Token::RedirectAppend, word("log")]
        );
        // three '>' in a row: append followed by truncate
        assert_eq!(
            tokenize(">>>"),
            vec![Token::RedirectAppend, Token::RedirectOut]
        );
    }

    #[test]
    fn test_quotes_disable_operators() {
        assert_eq!(tokenize("echo 'a|b > c'"), vec![word("echo"), word("a|b > c")]);
    }

    #[test]
    fn test_quoted_metachars_are_escaped() {
        assert_eq!(tokenize("'*'"), vec![word("\\*")]);
        assert_eq!(tokenize("'a{b}'"), vec![word("a\\{b\\}")]);
    }

    #[test]
    fn test_escape_acts_like_quoting() {
        assert_eq!(tokenize("a\\|b"), vec![word("a|b")]);
        assert_eq!(tokenize("\\*"), vec![word("\\*")]);
    }

    #[test]
    fn test_roundtrip_of_quoted_text() {
        let original = "|<> *?[]{}~ \\ end";
        let tokens = tokenize(&format!("'{}'", original));
        assert_eq!(tokens.len(), 1);
        match &tokens[0] {
            Token::Word(w) => assert_eq!(literal(w), original),
            other => panic!("expected a word, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_quote_keeps_rest_verbatim() {
        assert_eq!(tokenize("echo 'ab cd"), vec![word("echo"), word("ab cd")]);
    }

    #[test]
    fn test_empty_quotes_make_empty_word() {
        assert_eq!(tokenize("''"), vec![word("")]);
    }

    #[test]
    fn test_whitespace_only_line() {
        assert!(tokenize("   \t ").is_empty());
    }

    #[test]
    fn test_split_statement_semicolon() {
        assert_eq!(split_statement("echo a; echo b"), ("echo a", false, Some(" echo b")));
    }

    #[test]
    fn test_split_statement_background() {
        assert_eq!(split_statement("sleep 1 &"), ("sleep 1 ", true, Some("")));
    }

    #[test]
    fn test_split_statement_quoted_terminator() {
        assert_eq!(split_statement("echo 'a;b'"), ("echo 'a;b'", false, None));
        assert_eq!(split_statement("echo a\\;b"), ("echo a\\;b", false, None));
    }

    #[test]
    fn test_continuation_detection() {
        assert_eq!(needs_continuation("echo done"), Continuation::Complete);
        assert_eq!(needs_continuation("echo 'open"), Continuation::Quote);
        assert_eq!(needs_continuation("echo next \\"), Continuation::Backslash);
        // backslash inside quotes is literal, not a splice
        assert_eq!(needs_continuation("echo 'a\\'"), Continuation::Complete);
    }
}
