//! qs-style parsing of urlencoded bodies.
//!
//! `a[b][c]=1` becomes `{"a":{"b":{"c":"1"}}}`, `a[]=1&a[]=2` becomes
//! `{"a":["1","2"]}` and repeated keys collect into arrays. Nesting depth is
//! unbounded and keys are never filtered, so `__proto__`, `constructor` and
//! friends come through verbatim.

use std::collections::{BTreeMap, HashMap};

use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use thiserror::Error;

/// Bodies with this many `&` separators or more are refused.
pub const PARAMETER_LIMIT: usize = 1000;

/// Floor for the largest `[n]` index that still builds an array; bodies with
/// more separators than this raise the limit to their separator count.
pub const MIN_ARRAY_LIMIT: usize = 100;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("too many parameters")]
pub struct TooManyParameters;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf(String),
    /// A scalar merged into an object becomes a key flagged `true`.
    Flag,
    /// Sparse until [`Node::into_value`] compacts it.
    List(Vec<Option<Node>>),
    Map(BTreeMap<String, Node>),
}

impl Node {
    fn is_container(&self) -> bool {
        matches!(self, Node::List(_) | Node::Map(_))
    }

    fn into_value(self) -> Value {
        match self {
            Node::Leaf(s) => Value::String(s),
            Node::Flag => Value::Bool(true),
            Node::List(items) => Value::Array(items.into_iter().flatten().map(Node::into_value).collect()),
            Node::Map(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.into_value()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

/// Parse a raw `application/x-www-form-urlencoded` body into a nested JSON object.
pub fn parse_urlencoded(body: &str) -> Result<Value, TooManyParameters> {
    let separators = body.matches('&').count();
    if separators >= PARAMETER_LIMIT {
        return Err(TooManyParameters);
    }
    let array_limit = separators.max(MIN_ARRAY_LIMIT);

    let mut root = Node::Map(BTreeMap::new());
    for (key, value) in group_pairs(body) {
        if key.is_empty() {
            continue;
        }
        let chain = split_key(&key);
        root = merge(root, build(&chain, value, array_limit));
    }

    Ok(root.into_value())
}

/// Decode every `key=value` part, folding repeated raw keys into one list.
///
/// The result is in property-enumeration order: integer-like keys first,
/// ascending, then the rest as first seen.
fn group_pairs(body: &str) -> Vec<(String, Node)> {
    let mut grouped: Vec<(String, Node)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for part in body.split('&') {
        // `a[b=c]=d` splits after the `]`, not at the first `=`.
        let split_at = match part.find("]=") {
            Some(i) => Some(i + 1),
            None => part.find('='),
        };
        let (key, value) = match split_at {
            Some(i) => (decode(&part[..i]), decode(&part[i + 1..])),
            None => (decode(part), String::new()),
        };

        match positions.get(&key) {
            Some(&i) => {
                let slot = &mut grouped[i].1;
                let existing = std::mem::replace(slot, Node::Flag);
                *slot = combine(existing, value);
            }
            None => {
                positions.insert(key.clone(), grouped.len());
                grouped.push((key, Node::Leaf(value)));
            }
        }
    }

    grouped.sort_by_key(|(key, _)| match integer_key(key) {
        Some(n) => (0, n),
        None => (1, 0),
    });
    grouped
}

fn combine(existing: Node, value: String) -> Node {
    let mut items = match existing {
        Node::List(items) => items,
        other => vec![Some(other)],
    };
    items.push(Some(Node::Leaf(value)));
    Node::List(items)
}

/// Canonical array-index property name (`0`, `17`, never `017` or `+1`).
fn integer_key(key: &str) -> Option<u32> {
    let n: u32 = key.parse().ok()?;
    (n != u32::MAX && n.to_string() == key).then_some(n)
}

/// `+` is a space; a malformed escape leaves the whole text undecoded.
fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    if !escapes_are_well_formed(&spaced) {
        return spaced;
    }

    let decoded = percent_decode_str(&spaced)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned());
    decoded.unwrap_or(spaced)
}

fn escapes_are_well_formed(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'%')
        .all(|(i, _)| {
            bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
        })
}

/// Split `a[b][c]` into `["a", "[b]", "[c]"]`.
fn split_key(key: &str) -> Vec<String> {
    let parent = match next_group(key, 0) {
        Some((start, _)) => &key[..start],
        None => key,
    };

    let mut chain = Vec::new();
    if !parent.is_empty() {
        chain.push(parent.to_string());
    }

    let mut cursor = 0;
    while let Some((start, end)) = next_group(key, cursor) {
        chain.push(key[start..end].to_string());
        cursor = end;
    }

    chain
}

/// Next `[...]` group (no nested brackets) at or after `from`, as a byte range.
fn next_group(key: &str, from: usize) -> Option<(usize, usize)> {
    let mut open = None;
    for (i, b) in key.bytes().enumerate().skip(from) {
        match b {
            b'[' => open = Some(i),
            b']' => {
                if let Some(start) = open {
                    return Some((start, i + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Build the node for one grouped key, innermost segment first.
fn build(chain: &[String], value: Node, array_limit: usize) -> Node {
    let mut leaf = value;

    for segment in chain.iter().rev() {
        leaf = if segment == "[]" {
            match leaf {
                Node::List(_) => leaf,
                other => Node::List(vec![Some(other)]),
            }
        } else {
            let clean = segment
                .strip_prefix('[')
                .and_then(|s| s.strip_suffix(']'))
                .unwrap_or(segment);

            match array_index(segment, clean, array_limit) {
                Some(index) => {
                    let mut items: Vec<Option<Node>> = vec![None; index];
                    items.push(Some(leaf));
                    Node::List(items)
                }
                None => Node::Map(BTreeMap::from([(clean.to_string(), leaf)])),
            }
        };
    }

    leaf
}

fn array_index(segment: &str, clean: &str, array_limit: usize) -> Option<usize> {
    // A bare parent like `0` is an object key; only `[0]` indexes.
    if segment == clean {
        return None;
    }
    let index: usize = clean.parse().ok()?;
    (index.to_string() == clean && index <= array_limit).then_some(index)
}

fn merge(target: Node, source: Node) -> Node {
    match (target, source) {
        // An empty value never displaces what is already there.
        (target, Node::Leaf(value)) if value.is_empty() => target,

        // Scalar into something.
        (Node::List(mut items), source @ (Node::Leaf(_) | Node::Flag)) => {
            items.push(Some(source));
            Node::List(items)
        }
        (Node::Map(mut entries), source @ (Node::Leaf(_) | Node::Flag)) => {
            let key = match source {
                Node::Leaf(key) => key,
                _ => "true".to_string(),
            };
            entries.insert(key, Node::Flag);
            Node::Map(entries)
        }

        // Something into a scalar.
        (target @ (Node::Leaf(_) | Node::Flag), source) => {
            let mut items = vec![Some(target)];
            match source {
                Node::List(more) => items.extend(more),
                other => items.push(Some(other)),
            }
            Node::List(items)
        }

        (Node::List(mut items), Node::List(incoming)) => {
            for (i, item) in incoming.into_iter().enumerate() {
                let Some(item) = item else { continue };
                match items.get_mut(i) {
                    Some(slot) => match slot.take() {
                        Some(existing) if existing.is_container() && item.is_container() => {
                            *slot = Some(merge(existing, item));
                        }
                        Some(existing) => {
                            *slot = Some(existing);
                            items.push(Some(item));
                        }
                        None => *slot = Some(item),
                    },
                    None => {
                        items.resize(i, None);
                        items.push(Some(item));
                    }
                }
            }
            Node::List(items)
        }

        (Node::List(items), source @ Node::Map(_)) => merge(Node::Map(list_to_map(items)), source),

        (Node::Map(mut entries), source) => {
            let incoming = match source {
                Node::Map(incoming) => incoming,
                Node::List(items) => list_to_map(items),
                Node::Leaf(_) | Node::Flag => BTreeMap::new(),
            };

            for (key, value) in incoming {
                let merged = match entries.remove(&key) {
                    Some(existing) => merge(existing, value),
                    None => value,
                };
                entries.insert(key, merged);
            }
            Node::Map(entries)
        }
    }
}

fn list_to_map(items: Vec<Option<Node>>) -> BTreeMap<String, Node> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| item.map(|node| (i.to_string(), node)))
        .collect()
}
