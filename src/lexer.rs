use logos::Logos;

use crate::error::{GameError, Result};
use crate::token::{Spanned, Token};

/// Tokenize a node code template into a vector of spanned tokens.
///
/// Adjacent text runs are merged so the parser sees one `Text` token between
/// any two tags.
pub fn lex(source: &str) -> Result<Vec<Spanned>> {
    let mut tokens: Vec<Spanned> = Vec::new();
    let mut lexer = Token::lexer(source);
    // End of the last byte accounted for by a token.
    let mut covered = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        if span.start != covered {
            return Err(unclosed(source, covered));
        }
        covered = span.end;
        match result {
            Ok(Token::Malformed(tag)) => {
                return Err(GameError::malformed_tag(&tag, span));
            }
            Ok(Token::Unclosed) => {
                return Err(GameError::malformed_tag("{{ (never closed)", span));
            }
            Ok(Token::Text(text)) => {
                if let Some(Spanned {
                    token: Token::Text(prev),
                    span: prev_span,
                }) = tokens.last_mut()
                {
                    prev.push_str(&text);
                    prev_span.end = span.end;
                } else {
                    tokens.push(Spanned {
                        token: Token::Text(text),
                        span,
                    });
                }
            }
            Ok(token) => {
                tokens.push(Spanned { token, span });
            }
            Err(()) => {
                let fragment = &source[span.clone()];
                return Err(GameError::malformed_tag(fragment, span));
            }
        }
    }

    if covered < source.len() {
        return Err(unclosed(source, covered));
    }
    Ok(tokens)
}

/// Error for a tag that never closes. The lexer may already have taken the
/// first `{` of it as text, so the search starts one byte before `from`.
fn unclosed(source: &str, from: usize) -> GameError {
    let back = from.saturating_sub(1);
    let search = if source.is_char_boundary(back) { back } else { from };
    let start = source[search..].find("{{").map_or(from, |i| search + i);
    GameError::malformed_tag("{{ (never closed)", start..source.len())
}
