// src/exec/merge.rs

//! Built-in identifier-list union task.
//!
//! QC pipelines collect several "failed identifier" lists (sex check,
//! missingness, heterozygosity, relatedness) and need their union as a
//! single exclusion list. This is the one genuine data operation the engine
//! performs itself: a set union over identifier lists, order-independent,
//! duplicates removed. The written output is sorted so the artifact is
//! deterministic regardless of input arrival order.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

/// Union the identifier lists in `inputs` and write the deduplicated,
/// sorted result to `output`, one identifier per line. Blank lines and
/// surrounding whitespace are ignored.
///
/// Returns the number of distinct identifiers written.
pub async fn merge_id_lists(inputs: &[PathBuf], output: &Path) -> Result<usize> {
    let mut ids: BTreeSet<String> = BTreeSet::new();

    for path in inputs {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("reading identifier list {:?}", path))?;

        for line in contents.lines() {
            let line = line.trim();
            if !line.is_empty() {
                ids.insert(line.to_string());
            }
        }
    }

    let mut rendered = ids.iter().cloned().collect::<Vec<_>>().join("\n");
    rendered.push('\n');

    fs::write(output, rendered)
        .await
        .with_context(|| format!("writing merged identifier list {:?}", output))?;

    Ok(ids.len())
}
