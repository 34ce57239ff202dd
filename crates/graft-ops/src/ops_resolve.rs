//! Operation: resolve the project and list the selected versions.

use std::fmt::Write;
use std::path::Path;

use graft_resolver::ResolutionResult;
use graft_util::status;

/// Resolve the project and print one selected module version per line.
///
/// Unresolved declarations are reported, then turned into an error.
pub fn resolve(manifest_path: &Path, config_path: Option<&Path>) -> miette::Result<()> {
    let result = crate::load_and_resolve(manifest_path, config_path)?;
    status::status("Resolved", &summary(&result));
    print!("{}", render(&result));

    for rejected in &result.rejected {
        status::status_warn("Rejected", &rejected.to_string());
    }
    if !result.conflicts.is_empty() {
        status::status_warn(
            "Conflicts",
            &format!("{} (see `graft tree --conflicts`)", result.conflicts.len()),
        );
    }
    crate::ensure_complete(&result)
}

fn summary(result: &ResolutionResult) -> String {
    let rounds = if result.rounds == 1 { "round" } else { "rounds" };
    format!(
        "{} ({} modules in {} {rounds})",
        result.root,
        result.selected.len(),
        result.rounds
    )
}

/// Selected versions in discovery order.
pub fn render(result: &ResolutionResult) -> String {
    let mut out = String::new();
    for id in result.selected.values() {
        let _ = writeln!(out, "{id}");
    }
    out
}
