use std::fmt;
use std::ops::Range;

/// All errors produced by the nodegame compiler.
#[derive(Debug)]
pub struct GameError {
    pub kind: ErrorKind,
    /// Byte range inside the template source, for template errors.
    pub span: Option<Range<usize>>,
    /// Node the error was raised for, if any.
    pub node: Option<NodeRef>,
}

/// Human-readable reference to a graph node, attached to errors.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRef {
    pub id: u64,
    pub title: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Template lexer hit a `{{` it could not make sense of.
    #[error("malformed template tag: {0}")]
    MalformedTag(String),
    /// `{{#if}}` / `{{#each}}` without a matching close, or a stray close.
    #[error("unbalanced template block: expected {expected}, got {got}")]
    UnbalancedBlock { expected: String, got: String },
    /// `{{key}}` with no value in the data bag (strict mode).
    #[error("unresolved placeholder '{{{{{0}}}}}'")]
    UnresolvedPlaceholder(String),
    /// A module names a required dependency that was never registered.
    #[error("module '{module}' requires '{dependency}', which is not registered")]
    MissingDependency { module: String, dependency: String },
    /// Module dependencies form a cycle.
    #[error("module dependency cycle: {}", .members.join(" -> "))]
    DependencyCycle { members: Vec<String> },
    /// Node links form a cycle.
    #[error("node graph cycle through nodes {}", fmt_ids(.members))]
    GraphCycle { members: Vec<u64> },
    /// Node `type` tag not in the catalog.
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),
    /// Node properties did not match the node type's schema.
    #[error("invalid properties for node type '{node_type}': {reason}")]
    InvalidProperties { node_type: String, reason: String },
    /// A link references a node id that does not exist.
    #[error("link {link} references missing node {node}")]
    DanglingLink { link: u64, node: u64 },
    /// Dotted layer path not in the z-index table.
    #[error("unknown layer path: {0}")]
    UnknownLayer(String),
    /// JSON input could not be decoded.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Filesystem failure.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    /// General message.
    #[error("{0}")]
    Message(String),
}

fn fmt_ids(ids: &[u64]) -> String {
    ids.iter().map(|id| format!("#{id}")).collect::<Vec<_>>().join(" -> ")
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(node) = &self.node {
            write!(f, "node #{} '{}': ", node.id, node.title)?;
        }
        write!(f, "{}", self.kind)?;

        if let Some(span) = &self.span {
            write!(f, " (at byte {}..{})", span.start, span.end)?;
        }

        Ok(())
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Json(e) => Some(e),
            ErrorKind::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ErrorKind> for GameError {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            span: None,
            node: None,
        }
    }
}

impl From<serde_json::Error> for GameError {
    fn from(e: serde_json::Error) -> Self {
        ErrorKind::Json(e).into()
    }
}

pub type Result<T> = std::result::Result<T, GameError>;

/// Shorthand constructors.
impl GameError {
    pub fn malformed_tag(tag: &str, span: Range<usize>) -> Self {
        Self {
            kind: ErrorKind::MalformedTag(tag.to_string()),
            span: Some(span),
            node: None,
        }
    }

    pub fn unbalanced(expected: &str, got: &str, span: Option<Range<usize>>) -> Self {
        Self {
            kind: ErrorKind::UnbalancedBlock {
                expected: expected.to_string(),
                got: got.to_string(),
            },
            span,
            node: None,
        }
    }

    pub fn unresolved(key: &str, span: Range<usize>) -> Self {
        Self {
            kind: ErrorKind::UnresolvedPlaceholder(key.to_string()),
            span: Some(span),
            node: None,
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ErrorKind::Io {
            context: context.into(),
            source,
        }
        .into()
    }

    /// General error with a message.
    pub fn message(msg: impl Into<String>) -> Self {
        ErrorKind::Message(msg.into()).into()
    }

    /// Attach the node an error originated from.
    pub fn at_node(mut self, id: u64, title: &str) -> Self {
        self.node = Some(NodeRef {
            id,
            title: title.to_string(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_node_and_span() {
        let err = GameError::unresolved("speed", 4..13).at_node(7, "Player");
        assert_eq!(
            err.to_string(),
            "node #7 'Player': unresolved placeholder '{{speed}}' (at byte 4..13)"
        );
    }

    #[test]
    fn cycle_lists_members_in_order() {
        let err: GameError = ErrorKind::DependencyCycle {
            members: vec!["a".into(), "b".into(), "a".into()],
        }
        .into();
        assert_eq!(err.to_string(), "module dependency cycle: a -> b -> a");

        let err: GameError = ErrorKind::GraphCycle { members: vec![1, 2, 1] }.into();
        assert_eq!(err.to_string(), "node graph cycle through nodes #1 -> #2 -> #1");
    }
}
