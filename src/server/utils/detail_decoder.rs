// detail pages ship their hydration state as one flat json array where every container holds
// indices into that same array instead of values. Resolving it back means chasing indices until
// we land on leaves.
use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

use super::normalize::truthy;

// nesting deeper than this is either garbage or a reference loop we didn't catch
const MAX_DEPTH: usize = 64;

/// most values a single decode will build. Shared references fan out, a few hundred bytes of
/// blob can describe a tree with millions of nodes.
pub const MAX_NODES: usize = 50_000;

static JSON_SCRIPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<script type="application/json"[^>]*>(.*?)</script>"#)
        .expect("Static regex should compile")
});

/// body of the first `<script type="application/json">` tag
pub fn extract_json_script(html: &str) -> Option<&str> {
    JSON_SCRIPT
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|body| body.as_str())
        .filter(|body| !body.trim().is_empty())
}

pub struct DetailDecoder<'a> {
    data: &'a [Value],
    // indices currently being expanded, seeing one again means a cycle
    visiting: HashSet<usize>,
    // fully expanded indices with the number of nodes they hold
    resolved: HashMap<usize, (Value, usize)>,
    nodes: usize,
    // set whenever a cycle, the depth limit or the node budget cut something short, those
    // results depend on the path taken and can't be reused
    truncated: bool,
}

impl<'a> DetailDecoder<'a> {
    pub fn new(data: &'a [Value]) -> Self {
        Self {
            data,
            visiting: HashSet::new(),
            resolved: HashMap::new(),
            nodes: 0,
            truncated: false,
        }
    }

    /// values built so far, never more than `MAX_NODES`
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// resolves every index held by `value`, leaves come back untouched
    pub fn resolve(&mut self, value: &Value) -> Value {
        self.resolve_at(value, 0)
    }

    /// resolves the fields of the top level entry sitting at `index`
    pub fn resolve_entry(&mut self, index: usize, entry: &Value) -> Value {
        self.visiting.insert(index);
        let resolved = self.resolve_at(entry, 0);
        self.visiting.remove(&index);
        resolved
    }

    fn cut(&mut self) -> Value {
        self.truncated = true;
        Value::Null
    }

    fn resolve_at(&mut self, value: &Value, depth: usize) -> Value {
        if depth > MAX_DEPTH || self.nodes >= MAX_NODES {
            return self.cut();
        }
        self.nodes += 1;

        match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve_slot(item, depth + 1))
                    .collect(),
            ),
            Value::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, slot)| (key.clone(), self.resolve_slot(slot, depth + 1)))
                    .collect(),
            ),
            leaf => leaf.clone(),
        }
    }

    // numbers inside containers are references, anything else is inline
    fn resolve_slot(&mut self, slot: &Value, depth: usize) -> Value {
        match slot {
            Value::Number(index) => self.dereference(index, depth),
            inline => self.resolve_at(inline, depth),
        }
    }

    // negative, fractional, out of range and cyclic references all come back as null
    fn dereference(&mut self, index: &Number, depth: usize) -> Value {
        let Some(index) = index.as_u64().and_then(|i| usize::try_from(i).ok()) else {
            return Value::Null;
        };
        let data = self.data;
        let Some(target) = data.get(index) else {
            return Value::Null;
        };

        if let Some((value, size)) = self.resolved.get(&index) {
            if self.nodes + size > MAX_NODES {
                return self.cut();
            }
            self.nodes += size;
            return value.clone();
        }

        if !self.visiting.insert(index) {
            return self.cut();
        }

        let outer_truncated = std::mem::replace(&mut self.truncated, false);
        let before = self.nodes;
        let resolved = self.resolve_at(target, depth);
        self.visiting.remove(&index);

        if !self.truncated {
            self.resolved
                .insert(index, (resolved.clone(), self.nodes - before));
        }
        self.truncated |= outer_truncated;
        resolved
    }
}

/// rebuilds the detail object from the raw blob
///
/// first top level object that resolves to something with `metadata` or `title` wins, otherwise
/// the first object at all. `None` when the blob isn't an array or holds no objects.
pub fn decode_detail_blob(raw: &Value) -> Option<Value> {
    let Value::Array(data) = raw else {
        return None;
    };

    let mut decoder = DetailDecoder::new(data);
    let mut fallback: Option<Value> = None;

    for (index, entry) in data.iter().enumerate() {
        if !entry.is_object() {
            continue;
        }

        let resolved = decoder.resolve_entry(index, entry);
        if truthy(resolved.get("metadata")) || truthy(resolved.get("title")) {
            return Some(resolved);
        }
        if fallback.is_none() {
            fallback = Some(resolved);
        }
    }

    fallback
}
