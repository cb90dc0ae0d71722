//! Tag command handlers

use anyhow::Result;

use qeta_core::Store;

use crate::output::Output;

/// List all tags with the number of questions using them
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let tags = store.get_tags()?;
    output.print_tags(&tags)
}
