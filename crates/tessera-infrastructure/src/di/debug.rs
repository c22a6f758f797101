//! Dependency tree rendering
//!
//! ```text
//! service [singleton] factory (app)
//!   db [singleton] value (app)
//!   tenant scope variable (version 2) (app)
//! ```

use std::fmt::Write as _;
use std::sync::Arc;

use tessera_domain::Key;
use tessera_domain::error::{Error, Result};

use super::layer::{Access, Layer};

const INDENT: &str = "  ";

pub(crate) fn render_tree(layer: &Arc<Layer>, key: &Key, access: Access) -> Result<String> {
    let mut out = String::new();
    let mut path = Vec::new();
    if !describe(layer, key, access, 0, &mut path, &mut out) {
        return Err(Error::not_found(key.clone()));
    }
    Ok(out)
}

fn describe(
    layer: &Arc<Layer>,
    key: &Key,
    access: Access,
    depth: usize,
    path: &mut Vec<Key>,
    out: &mut String,
) -> bool {
    let indent = INDENT.repeat(depth);
    let Some((owner, node)) = layer.debug_node(key, access) else {
        if depth > 0 {
            let _ = writeln!(out, "{indent}{key} <missing>");
        }
        return false;
    };

    let _ = write!(out, "{indent}{key}");
    if let Some(lifetime) = node.lifetime {
        let _ = write!(out, " [{lifetime}]");
    }
    let _ = write!(out, " {} ({})", node.description, owner.identity());
    if path.contains(key) {
        let _ = writeln!(out, " <cycle>");
        return true;
    }
    out.push('\n');

    path.push(key.clone());
    for dependency in &node.dependencies {
        describe(&owner, dependency, Access::Full, depth + 1, path, out);
    }
    path.pop();
    true
}
