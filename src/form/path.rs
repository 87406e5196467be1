//! Key paths
//!
//! Every node and field in a form tree is addressed by a key path built from the
//! optional global prefix, the group names and repetition indices of its ancestors
//! and its own local name:
//!
//! ```text
//! order:                      root with prefix "order"
//! order:lines[0]              first child of group "lines"
//! order:lines[0][sku]         field "sku" inside it
//! order:lines[0][meta][tag]   field "meta[tag]" inside it
//! ```
//!
//! Without a prefix the root path is empty and names pass through unchanged.

/// Path of a root node
pub fn root_path(prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:"),
        _ => String::new(),
    }
}

/// Path of the `index`-th child of `group` under a node at `parent`
pub fn child_path(parent: &str, group: &str, index: usize) -> String {
    join(parent, &format!("{group}[{index}]"))
}

/// Instance name of a field with local name `local` under a node at `parent`
///
/// The local name is not parsed beyond its leading segment; any bracketed tail
/// such as `person[name]` passes through verbatim.
pub fn field_path(parent: &str, local: &str) -> String {
    join(parent, local)
}

fn join(parent: &str, local: &str) -> String {
    if parent.is_empty() || parent.ends_with(':') {
        return format!("{parent}{local}");
    }
    let (head, tail) = match local.find('[') {
        Some(at) => local.split_at(at),
        None => (local, ""),
    };
    format!("{parent}[{head}]{tail}")
}

/// Split a key path into its lookup segments
///
/// `order:lines[0][sku]` becomes `["order:lines", "0", "sku"]`. Empty bracket
/// pairs (`tags[]`) contribute nothing.
pub fn segments(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let (head, mut rest) = match path.find('[') {
        Some(at) => path.split_at(at),
        None => (path, ""),
    };
    if !head.is_empty() {
        out.push(head);
    }
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        let Some(close) = after.find(']') else {
            // Unbalanced tail, keep it as a literal segment
            out.push(after);
            break;
        };
        let segment = &after[..close];
        if !segment.is_empty() {
            out.push(segment);
        }
        rest = &after[close + 1..];
    }
    out
}
