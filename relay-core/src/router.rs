//! Route table: (method, path pattern) -> RouteId. Built once at startup.
//! Patterns are `/`-separated; a `{name}` segment captures one path segment.

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct RouteId(pub u32);

/// Values captured by `{name}` segments, percent-decoded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Clone, Debug)]
struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    fn parse(path: &str) -> Self {
        let segments = split(path)
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => Segment::Param(name.to_owned()),
                None => Segment::Literal(s.to_owned()),
            })
            .collect();
        Self { segments }
    }

    fn matches(&self, parts: &[&str]) -> Option<PathParams> {
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    let value = urlencoding::decode(part)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| (*part).to_owned());
                    params.insert(name.clone(), value);
                }
            }
        }
        Some(PathParams(params))
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.trim_matches('/').split('/').filter(|s| !s.is_empty())
}

/// Outcome of a lookup.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteMatch {
    Found(RouteId, PathParams),
    /// The path is known, but not under this method.
    MethodNotAllowed,
    NotFound,
}

/// Ordered route table. The first registered route that matches wins.
pub struct Router {
    table: Vec<(String, Pattern, RouteId)>,
}

impl Router {
    pub fn new() -> Self {
        Self { table: Vec::new() }
    }

    pub fn add(&mut self, method: &str, path: &str, id: RouteId) {
        self.table
            .push((method.to_uppercase(), Pattern::parse(path), id));
    }

    pub fn match_route(&self, method: &str, path: &str) -> RouteMatch {
        let method = method.to_uppercase();
        let parts: Vec<&str> = split(path).collect();
        let mut path_known = false;
        for (m, pattern, id) in &self.table {
            if let Some(params) = pattern.matches(&parts) {
                if *m == method {
                    return RouteMatch::Found(*id, params);
                }
                path_known = true;
            }
        }
        if path_known {
            RouteMatch::MethodNotAllowed
        } else {
            RouteMatch::NotFound
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
