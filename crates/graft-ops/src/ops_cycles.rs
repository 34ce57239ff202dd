//! Operation: report dependency cycles.

use std::fmt::Write;
use std::path::Path;

use graft_resolver::ResolutionResult;

/// Print each cycle among the selected module versions.
pub fn cycles(manifest_path: &Path, config_path: Option<&Path>) -> miette::Result<()> {
    let result = crate::load_and_resolve(manifest_path, config_path)?;
    print!("{}", render(&result));
    Ok(())
}

pub fn render(result: &ResolutionResult) -> String {
    let mut out = String::new();
    if result.cycles.is_empty() {
        out.push_str("No dependency cycles.\n");
        return out;
    }
    let _ = writeln!(out, "Dependency cycles ({}):", result.cycles.len());
    for cycle in &result.cycles {
        let members: Vec<String> = cycle.iter().map(ToString::to_string).collect();
        let _ = writeln!(out, "  {}", members.join(" -> "));
    }
    out
}
