use crate::ast::*;
use crate::error::{GameError, Result};
use crate::token::{Spanned, Token};

/// Recursive descent parser for node code templates.
///
/// Blocks must be balanced: every `{{#if}}` closes with `{{/if}}`, every
/// `{{#each}}` with `{{/each}}`, and `{{else}}` only appears directly inside
/// an `{{#if}}`.
pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

/// What ended a run of segments.
enum Terminator {
    Eof,
    Else,
    EndIf,
    EndEach,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Self { tokens, pos: 0 }
    }

    // ── Helpers ────────────────────────────────────────────────────────

    fn advance(&mut self) -> Option<&Spanned> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn last_span(&self) -> Option<std::ops::Range<usize>> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|s| s.span.clone())
    }

    // ── Grammar ────────────────────────────────────────────────────────

    /// Parse the whole token stream into a template.
    pub fn parse(&mut self) -> Result<Template> {
        let (segments, end) = self.parse_run()?;
        match end {
            Terminator::Eof => Ok(Template { segments }),
            Terminator::Else => Err(GameError::unbalanced("end of template", "{{else}}", self.last_span())),
            Terminator::EndIf => Err(GameError::unbalanced("end of template", "{{/if}}", self.last_span())),
            Terminator::EndEach => Err(GameError::unbalanced("end of template", "{{/each}}", self.last_span())),
        }
    }

    /// Parse segments until end of input or a block-structure token, which is
    /// consumed and reported.
    fn parse_run(&mut self) -> Result<(Vec<Segment>, Terminator)> {
        let mut segments = Vec::new();

        loop {
            let Some(spanned) = self.advance().cloned() else {
                return Ok((segments, Terminator::Eof));
            };

            match spanned.token {
                Token::Text(text) => segments.push(Segment::Text(text)),
                Token::Var(key) => segments.push(Segment::Var {
                    raw: format!("{{{{{key}}}}}"),
                    key,
                    span: spanned.span,
                }),
                Token::If(key) => segments.push(self.parse_if(key, spanned.span)?),
                Token::Each(key) => segments.push(self.parse_each(key, spanned.span)?),
                Token::Else => return Ok((segments, Terminator::Else)),
                Token::EndIf => return Ok((segments, Terminator::EndIf)),
                Token::EndEach => return Ok((segments, Terminator::EndEach)),
                Token::Malformed(tag) => return Err(GameError::malformed_tag(&tag, spanned.span)),
                Token::Unclosed => return Err(GameError::malformed_tag("{{", spanned.span)),
            }
        }
    }

    fn parse_if(&mut self, key: String, open: std::ops::Range<usize>) -> Result<Segment> {
        let (then, end) = self.parse_run()?;
        let otherwise = match end {
            Terminator::EndIf => Vec::new(),
            Terminator::Else => {
                let (otherwise, end) = self.parse_run()?;
                match end {
                    Terminator::EndIf => otherwise,
                    Terminator::Eof => return Err(GameError::unbalanced("{{/if}}", "end of template", Some(open))),
                    Terminator::Else => return Err(GameError::unbalanced("{{/if}}", "second {{else}}", self.last_span())),
                    Terminator::EndEach => return Err(GameError::unbalanced("{{/if}}", "{{/each}}", self.last_span())),
                }
            }
            Terminator::Eof => return Err(GameError::unbalanced("{{/if}}", "end of template", Some(open))),
            Terminator::EndEach => return Err(GameError::unbalanced("{{/if}}", "{{/each}}", self.last_span())),
        };
        Ok(Segment::If {
            key,
            then,
            otherwise,
        })
    }

    fn parse_each(&mut self, key: String, open: std::ops::Range<usize>) -> Result<Segment> {
        let (body, end) = self.parse_run()?;
        match end {
            Terminator::EndEach => Ok(Segment::Each { key, body }),
            Terminator::Eof => Err(GameError::unbalanced("{{/each}}", "end of template", Some(open))),
            Terminator::Else => Err(GameError::unbalanced("{{/each}}", "{{else}}", self.last_span())),
            Terminator::EndIf => Err(GameError::unbalanced("{{/each}}", "{{/if}}", self.last_span())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;

    fn parse(src: &str) -> Result<Template> {
        let tokens = lexer::lex(src)?;
        Parser::new(tokens).parse()
    }

    #[test]
    fn parse_flat_template() {
        let tpl = parse("const {{var}} = {{value}};").expect("parse failed");
        assert_eq!(tpl.segments.len(), 5);
        assert!(matches!(&tpl.segments[0], Segment::Text(t) if t == "const "));
        assert!(matches!(&tpl.segments[1], Segment::Var { key, raw, .. } if key == "var" && raw == "{{var}}"));
    }

    #[test]
    fn parse_nested_blocks() {
        let tpl = parse("{{#if a}}{{#each items}}[{{this}}]{{/each}}{{else}}none{{/if}}")
            .expect("parse failed");
        assert_eq!(tpl.segments.len(), 1);
        let Segment::If { key, then, otherwise } = &tpl.segments[0] else {
            panic!("expected if block");
        };
        assert_eq!(key, "a");
        assert!(matches!(&then[0], Segment::Each { key, body } if key == "items" && body.len() == 3));
        assert_eq!(otherwise, &vec![Segment::Text("none".into())]);
    }

    #[test]
    fn parse_rejects_unclosed_if() {
        let err = parse("{{#if a}}never closed").unwrap_err();
        assert!(err.to_string().contains("expected {{/if}}"), "{err}");
        assert_eq!(err.span, Some(0..9));
    }

    #[test]
    fn parse_rejects_mismatched_close() {
        let err = parse("{{#each a}}x{{/if}}").unwrap_err();
        assert!(err.to_string().contains("expected {{/each}}, got {{/if}}"), "{err}");
    }

    #[test]
    fn parse_rejects_stray_close_and_else() {
        assert!(parse("text{{/each}}").is_err());
        assert!(parse("text{{else}}").is_err());
        assert!(parse("{{#each a}}{{else}}{{/each}}").is_err());
    }

    #[test]
    fn parse_collects_keys() {
        let tpl = parse("{{a}} {{#if b}}{{a}}{{c}}{{/if}}").expect("parse failed");
        assert_eq!(tpl.keys(), vec!["a", "b", "c"]);
    }
}
