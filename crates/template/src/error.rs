use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// An opening tag (`<%`, `<%=`, ...) with no `%>` after it.
    #[error("Could not find matching close tag for \"{0}\".")]
    UnclosedTag(&'static str),

    /// The evaluator rejected or failed on a tag body.
    #[error("line {line}: {message}")]
    Expression { line: usize, message: String },
}
