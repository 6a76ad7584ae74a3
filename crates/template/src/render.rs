//! Template evaluation.

use jexl_eval::Evaluator;
use serde_json::{json, Map, Value};

use crate::display::{escape_html, to_display};
use crate::error::RenderError;
use crate::parse::{Segment, parse};

/// Render `template` with `data` as the expression context.
///
/// Every tag body is evaluated as an expression. A non-object `data` is
/// replaced by an empty context.
pub fn render(template: &str, data: &Value) -> Result<String, RenderError> {
    let segments = parse(template)?;

    let empty = Value::Object(Map::new());
    let context = if data.is_object() { data } else { &empty };

    let evaluator = evaluator();
    let mut out = String::with_capacity(template.len());

    for segment in &segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Escaped { expr, line } => {
                let value = evaluate(&evaluator, expr, context, *line)?;
                out.push_str(&escape_html(&to_display(&value)));
            }
            Segment::Raw { expr, line } => {
                let value = evaluate(&evaluator, expr, context, *line)?;
                out.push_str(&to_display(&value));
            }
            Segment::Scriptlet { expr, line } => {
                evaluate(&evaluator, expr, context, *line)?;
            }
        }
    }

    Ok(out)
}

fn evaluate(evaluator: &Evaluator<'_>, expr: &str, context: &Value, line: usize) -> Result<Value, RenderError> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Ok(Value::Null);
    }

    evaluator
        .eval_in_context(expr, context)
        .map_err(|e| RenderError::Expression {
            line,
            message: e.to_string(),
        })
}

/// Evaluator with the transforms templates may pipe values through.
fn evaluator() -> Evaluator<'static> {
    Evaluator::new()
        .with_transform("upper", |args: &[Value]| {
            let s = args.first().and_then(|v| v.as_str()).unwrap_or("");
            Ok(json!(s.to_uppercase()))
        })
        .with_transform("lower", |args: &[Value]| {
            let s = args.first().and_then(|v| v.as_str()).unwrap_or("");
            Ok(json!(s.to_lowercase()))
        })
        .with_transform("trim", |args: &[Value]| {
            let s = args.first().and_then(|v| v.as_str()).unwrap_or("");
            Ok(json!(s.trim()))
        })
        .with_transform("length", |args: &[Value]| {
            let len = match args.first() {
                Some(Value::String(s)) => s.chars().count(),
                Some(Value::Array(a)) => a.len(),
                Some(Value::Object(o)) => o.len(),
                _ => 0,
            };
            Ok(json!(len as f64))
        })
        .with_transform("json", |args: &[Value]| {
            let value = args.first().cloned().unwrap_or(Value::Null);
            Ok(json!(value.to_string()))
        })
        .with_transform("join", |args: &[Value]| {
            let sep = args.get(1).and_then(|v| v.as_str()).unwrap_or(",");
            let joined = match args.first() {
                Some(Value::Array(items)) => items.iter().map(to_display).collect::<Vec<_>>().join(sep),
                Some(other) => to_display(other),
                None => String::new(),
            };
            Ok(json!(joined))
        })
}
