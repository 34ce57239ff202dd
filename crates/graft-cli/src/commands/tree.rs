//! Handler for `graft tree`.

use std::path::Path;

use miette::Result;

use graft_ops::ops_tree::{self, TreeOptions};

pub fn exec(
    manifest: &Path,
    config: Option<&Path>,
    depth: Option<usize>,
    why: Option<String>,
    conflicts: bool,
    inverted: Option<String>,
) -> Result<()> {
    let opts = TreeOptions {
        depth,
        why,
        conflicts,
        inverted,
    };
    ops_tree::tree(manifest, config, &opts)
}
