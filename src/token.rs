use logos::Logos;

/// Tokens produced by lexing a node code template.
///
/// Everything outside `{{ … }}` tags is plain text. A lone `{` (common in the
/// JavaScript the templates emit) is text too; only a double brace opens a tag.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    // ── Block tags ─────────────────────────────────────────────────────
    #[regex(r"\{\{[ \t]*#if[ \t]+[A-Za-z_][A-Za-z0-9_.]*[ \t]*\}\}", |lex| tag_key(lex.slice(), "#if"))]
    If(String),
    #[regex(r"\{\{[ \t]*#each[ \t]+[A-Za-z_][A-Za-z0-9_.]*[ \t]*\}\}", |lex| tag_key(lex.slice(), "#each"))]
    Each(String),
    #[regex(r"\{\{[ \t]*else[ \t]*\}\}")]
    Else,
    #[regex(r"\{\{[ \t]*/if[ \t]*\}\}")]
    EndIf,
    #[regex(r"\{\{[ \t]*/each[ \t]*\}\}")]
    EndEach,

    // ── Placeholders ───────────────────────────────────────────────────
    #[regex(r"\{\{[ \t]*[A-Za-z_][A-Za-z0-9_.]*[ \t]*\}\}", |lex| tag_key(lex.slice(), ""))]
    Var(String),

    // ── Errors surfaced by the lexer ───────────────────────────────────
    /// A closed `{{ … }}` whose contents are not a known tag form.
    #[regex(r"\{\{[^}]*\}\}", |lex| lex.slice().to_string(), priority = 1)]
    Malformed(String),
    /// `{{` never closed.
    #[token("{{")]
    Unclosed,

    // ── Text ───────────────────────────────────────────────────────────
    #[regex(r"[^{]+", |lex| lex.slice().to_string())]
    #[token("{", |_| String::from("{"))]
    Text(String),
}

/// Strip the braces and an optional leading keyword from a tag slice.
fn tag_key(slice: &str, keyword: &str) -> String {
    let inner = &slice[2..slice.len() - 2];
    inner.trim().trim_start_matches(keyword).trim().to_string()
}

/// A token with its byte span in the template source.
#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub span: std::ops::Range<usize>,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::If(key) => write!(f, "{{{{#if {key}}}}}"),
            Token::Each(key) => write!(f, "{{{{#each {key}}}}}"),
            Token::Else => write!(f, "{{{{else}}}}"),
            Token::EndIf => write!(f, "{{{{/if}}}}"),
            Token::EndEach => write!(f, "{{{{/each}}}}"),
            Token::Var(key) => write!(f, "{{{{{key}}}}}"),
            Token::Malformed(s) => write!(f, "{s}"),
            Token::Unclosed => write!(f, "{{{{"),
            Token::Text(_) => write!(f, "text"),
        }
    }
}
