//! Handler for `graft cycles`.

use std::path::Path;

use miette::Result;

pub fn exec(manifest: &Path, config: Option<&Path>) -> Result<()> {
    graft_ops::ops_cycles::cycles(manifest, config)
}
