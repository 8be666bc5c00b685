use logos::Logos;

/// Coarse token classes for TypeScript/JavaScript source. Only identifiers
/// matter downstream; the other classes exist so identifiers inside comments
/// and literals are not reported.
#[derive(Logos, Debug, PartialEq, Clone, Copy)]
#[logos(error = ())]
enum Token {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"//.*", allow_greedy = true)]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    Comment,

    #[regex(r#"'([^'\\\n]|\\[\s\S])*'"#)]
    #[regex(r#""([^"\\\n]|\\[\s\S])*""#)]
    String,

    #[regex(r"`([^`\\]|\\[\s\S])*`")]
    Template,

    #[regex(r"[0-9][0-9A-Za-z_]*")]
    Number,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Identifier,

    /// Division or the start of a regular expression literal, depending on
    /// the token before it.
    #[token("/")]
    Slash,

    #[token(")")]
    #[token("]")]
    #[token("}")]
    Close,

    #[regex(r#"[^ \t\r\n\f/A-Za-z0-9_$'"`)\]}]"#)]
    Punct,
}

/// An identifier occurrence; offsets are bytes into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Identifiers that can name a declaration. Reserved words and keywords that
/// only appear in keyword position are skipped. Identifiers inside template
/// substitutions are not seen.
///
/// A `/` that cannot end an operand opens a regular expression literal, which
/// is skipped whole so its body never reads as a comment.
pub fn identifiers(source: &str) -> impl Iterator<Item = Identifier<'_>> {
    let mut lexer = Token::lexer(source);
    let mut after_operand = false;
    std::iter::from_fn(move || {
        loop {
            match lexer.next()? {
                Ok(Token::Whitespace | Token::Comment) => {},
                Ok(Token::Slash) => {
                    if !after_operand && let Some(len) = regex_literal_len(lexer.remainder()) {
                        lexer.bump(len);
                        after_operand = true;
                    } else {
                        after_operand = false;
                    }
                },
                Ok(Token::String | Token::Template | Token::Number | Token::Close) => after_operand = true,
                Ok(Token::Punct) | Err(()) => after_operand = false,
                Ok(Token::Identifier) => {
                    let text = lexer.slice();
                    after_operand = !precedes_expression(text);
                    if is_keyword(text) {
                        continue;
                    }
                    let span = lexer.span();
                    return Some(Identifier {
                        text,
                        start: span.start,
                        end: span.end,
                    });
                },
            }
        }
    })
}

/// Length of the regular expression literal following an opening `/`,
/// including the closing `/` and flags. `None` when the line ends first.
fn regex_literal_len(rest: &str) -> Option<usize> {
    let mut chars = rest.char_indices();
    let mut in_class = false;
    while let Some((index, ch)) = chars.next() {
        match ch {
            '\n' | '\r' => return None,
            '\\' => {
                if matches!(chars.next(), None | Some((_, '\n' | '\r'))) {
                    return None;
                }
            },
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => {
                let body = index + 1;
                let flags = rest[body..].find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(rest.len() - body);
                return Some(body + flags);
            },
            _ => {},
        }
    }
    None
}

/// Keywords after which an expression, not an operator, follows.
fn precedes_expression(text: &str) -> bool {
    matches!(
        text,
        "return"
            | "typeof"
            | "instanceof"
            | "in"
            | "of"
            | "new"
            | "delete"
            | "void"
            | "throw"
            | "case"
            | "do"
            | "else"
            | "yield"
            | "await"
    )
}

pub fn is_keyword(text: &str) -> bool {
    matches!(
        text,
        "break"
            | "case"
            | "catch"
            | "class"
            | "const"
            | "continue"
            | "debugger"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "enum"
            | "export"
            | "extends"
            | "false"
            | "finally"
            | "for"
            | "function"
            | "if"
            | "import"
            | "in"
            | "instanceof"
            | "new"
            | "null"
            | "return"
            | "super"
            | "switch"
            | "this"
            | "throw"
            | "true"
            | "try"
            | "typeof"
            | "var"
            | "void"
            | "while"
            | "with"
            | "implements"
            | "interface"
            | "let"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "static"
            | "yield"
            | "abstract"
            | "as"
            | "async"
            | "await"
            | "declare"
            | "from"
            | "infer"
            | "is"
            | "keyof"
            | "module"
            | "namespace"
            | "of"
            | "override"
            | "satisfies"
            | "type"
            | "unique"
            | "readonly"
            | "any"
            | "boolean"
            | "never"
            | "number"
            | "object"
            | "string"
            | "symbol"
            | "unknown"
            | "bigint"
    )
}
