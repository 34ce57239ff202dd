//! Operation: display the dependency tree.

use std::fmt::Write;
use std::path::Path;

use graft_resolver::ResolutionResult;

/// Options for `graft tree`.
#[derive(Debug, Default)]
pub struct TreeOptions {
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show the path from the root to a module, and its conflicts.
    pub why: Option<String>,
    /// Show version conflicts.
    pub conflicts: bool,
    /// Show the modules depending on this one, up to the root.
    pub inverted: Option<String>,
}

/// Display the dependency tree for the project.
pub fn tree(
    manifest_path: &Path,
    config_path: Option<&Path>,
    opts: &TreeOptions,
) -> miette::Result<()> {
    let result = crate::load_and_resolve(manifest_path, config_path)?;
    print!("{}", render(&result, opts));
    for unresolved in &result.unresolved {
        graft_util::status::status_warn("Unresolved", &unresolved.to_string());
    }
    Ok(())
}

/// Render what `opts` asks for.
pub fn render(result: &ResolutionResult, opts: &TreeOptions) -> String {
    let mut out = String::new();

    if let Some(ref target) = opts.why {
        match result.graph.find_path(target) {
            Some(path) => {
                let _ = writeln!(out, "Path to {target}:");
                for (i, node) in path.iter().enumerate() {
                    let indent = "  ".repeat(i);
                    let _ = writeln!(out, "{indent}{node}");
                }
                if let Some(node) = path.last() {
                    let module = node.id.module();
                    for conflict in result.conflicts.for_module(&module) {
                        let _ = writeln!(out, "Conflict: {conflict}");
                    }
                }
            }
            None => {
                let _ = writeln!(out, "Dependency '{target}' not found in the graph.");
            }
        }
        return out;
    }

    if opts.conflicts {
        if result.conflicts.is_empty() {
            let _ = writeln!(out, "{}", result.conflicts);
        } else {
            let _ = write!(out, "{}", result.conflicts);
        }
        return out;
    }

    if let Some(ref target) = opts.inverted {
        let inverted = result.graph.print_inverted_tree(target);
        if inverted.is_empty() {
            let _ = writeln!(out, "Dependency '{target}' not found in the graph.");
        } else {
            out.push_str(&inverted);
        }
        return out;
    }

    out.push_str(&result.graph.print_tree(opts.depth));
    out
}
