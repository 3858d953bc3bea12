//! bucketgate-router: Zero-dependency segment trie HTTP router
//!
//! Maps `(method, path)` pairs to a caller-chosen route value. Used by
//! bucketgate-core to dispatch the upload, multi-upload and download
//! endpoints.
//!
//! ## Path Syntax
//! - `:name` - Named parameter (captures one segment)
//! - `*` or `*name` - Wildcard (captures the raw remaining path, possibly empty)
//!
//! ## Priority
//! 1. Exact static match (highest)
//! 2. Parameter match
//! 3. Wildcard match (lowest)
//!
//! ## Example
//! ```
//! use bucketgate_router::Router;
//!
//! let mut router = Router::new();
//! router.insert("GET", "/", "index");
//! router.insert("GET", "/download/*path", "download");
//!
//! let m = router.find("GET", "/download/docs/a.txt").unwrap();
//! assert_eq!(m.value, "download");
//! assert_eq!(m.param("path"), Some("docs/a.txt"));
//! ```

use std::collections::HashMap;

/// Route match result
#[derive(Debug, Clone, PartialEq)]
pub struct Match<T> {
    /// The matched route value
    pub value: T,
    /// Captured path parameters as (name, value) pairs
    pub params: Vec<(String, String)>,
}

impl<T> Match<T> {
    /// Look up a captured parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get params as HashMap for convenient access
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params.iter().cloned().collect()
    }
}

/// Trie node for path segment matching
#[derive(Debug)]
struct Node<T> {
    /// Static children (key = path segment)
    children: HashMap<String, Node<T>>,
    /// Parameter child (:id)
    param_child: Option<Box<ParamNode<T>>>,
    /// Wildcard child (*path)
    wildcard_child: Option<Box<WildcardNode<T>>>,
    /// Route value if this is a terminal node
    value: Option<T>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            param_child: None,
            wildcard_child: None,
            value: None,
        }
    }
}

#[derive(Debug)]
struct ParamNode<T> {
    name: String,
    node: Node<T>,
}

#[derive(Debug)]
struct WildcardNode<T> {
    name: String,
    value: T,
}

/// A non-empty path segment and its byte offset in the original path
#[derive(Debug, Clone, Copy)]
struct Segment<'a> {
    start: usize,
    text: &'a str,
}

fn segments(path: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    for text in path.split('/') {
        if !text.is_empty() {
            out.push(Segment { start, text });
        }
        start += text.len() + 1;
    }
    out
}

/// Segment trie router
///
/// Routes are organized by HTTP method, then matched segment by segment.
#[derive(Debug)]
pub struct Router<T> {
    /// Method -> Trie root
    trees: HashMap<String, Node<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self {
            trees: HashMap::new(),
        }
    }
}

impl<T: Clone> Router<T> {
    /// Create a new router
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, PUT, etc.)
    /// * `path` - URL path with optional params (:id) and wildcards (*)
    /// * `value` - Value returned when the route matches
    pub fn insert(&mut self, method: &str, path: &str, value: T) {
        let tree = self.trees.entry(method.to_uppercase()).or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        Self::insert_node(tree, &segments, value);
    }

    fn insert_node(node: &mut Node<T>, segments: &[&str], value: T) {
        let Some((&segment, rest)) = segments.split_first() else {
            node.value = Some(value);
            return;
        };

        if let Some(name) = segment.strip_prefix(':') {
            let param = node.param_child.get_or_insert_with(|| {
                Box::new(ParamNode {
                    name: name.to_string(),
                    node: Node::default(),
                })
            });
            Self::insert_node(&mut param.node, rest, value);
        } else if let Some(name) = segment.strip_prefix('*') {
            let wildcard_name = if name.is_empty() { "*" } else { name };
            node.wildcard_child = Some(Box::new(WildcardNode {
                name: wildcard_name.to_string(),
                value,
            }));
        } else {
            let child = node.children.entry(segment.to_string()).or_default();
            Self::insert_node(child, rest, value);
        }
    }

    /// Find a matching route
    ///
    /// A wildcard captures the remaining path exactly as it appears in the
    /// request (inner and trailing slashes included), or `""` when nothing
    /// follows the wildcard's parent segment.
    pub fn find(&self, method: &str, path: &str) -> Option<Match<T>> {
        let tree = self.trees.get(&method.to_uppercase())?;
        let segments = segments(path);
        let mut params = Vec::new();
        Self::find_node(tree, path, &segments, &mut params)
    }

    fn find_node(
        node: &Node<T>,
        path: &str,
        segments: &[Segment<'_>],
        params: &mut Vec<(String, String)>,
    ) -> Option<Match<T>> {
        if let Some((segment, rest)) = segments.split_first() {
            // Priority 1: exact static match
            if let Some(child) = node.children.get(segment.text) {
                if let Some(m) = Self::find_node(child, path, rest, params) {
                    return Some(m);
                }
            }

            // Priority 2: parameter match
            if let Some(ref param) = node.param_child {
                params.push((param.name.clone(), segment.text.to_string()));
                if let Some(m) = Self::find_node(&param.node, path, rest, params) {
                    return Some(m);
                }
                params.pop();
            }
        } else if let Some(ref value) = node.value {
            return Some(Match {
                value: value.clone(),
                params: params.clone(),
            });
        }

        // Priority 3: wildcard, captures everything left (possibly nothing)
        let wildcard = node.wildcard_child.as_ref()?;
        let rest = segments.first().map_or("", |s| &path[s.start..]);
        let mut params = params.clone();
        params.push((wildcard.name.clone(), rest.to_string()));
        Some(Match {
            value: wildcard.value.clone(),
            params,
        })
    }
}
