//! Local help-center theme synchronization.
//!
//! Theme files embed production ticket field ids as literals. After a field
//! migration, this rewrites each production id to its sandbox counterpart in
//! the files the theme references fields from. Fields without a usable
//! sandbox mapping are skipped and reported, never rewritten to garbage.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::migrate::{FieldMapper, LogSink};

/// Theme files that reference ticket fields by id.
pub const THEME_FILES: [&str; 2] = ["script.js", "templates/new_request_page.hbs"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThemeSyncReport {
    /// Count of (field, file) pairs rewritten.
    pub replacements: usize,
    /// Fields skipped because no sandbox mapping resolved.
    pub skipped_fields: usize,
}

/// Rewrite production field ids to sandbox ids inside the theme directory.
pub fn sync_theme_files(
    theme_dir: &Path,
    mapper: &FieldMapper,
    log: &LogSink,
) -> Result<ThemeSyncReport> {
    let mut report = ThemeSyncReport::default();

    // Resolve once up front so a field skipped in one file is not retried
    // and re-reported per file.
    let mut resolved: Vec<(i64, i64)> = Vec::new();
    for field in mapper.production_fields() {
        match mapper.resolve(field.id).sandbox_id() {
            Some(sandbox_id) => resolved.push((field.id, sandbox_id)),
            None => {
                log.error(format!(
                    "No sandbox mapping for field {} ({}); skipping",
                    field.id, field.title
                ));
                report.skipped_fields += 1;
            }
        }
    }

    for relative in THEME_FILES {
        let path = theme_dir.join(relative);
        let mut contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read theme file: {:?}", path))?;

        for &(production_id, sandbox_id) in &resolved {
            let needle = production_id.to_string();
            if contents.contains(&needle) {
                log.info(format!(
                    "Replacing {production_id} with {sandbox_id} in {relative}"
                ));
                contents = contents.replace(&needle, &sandbox_id.to_string());
                report.replacements += 1;
            }
        }

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write theme file: {:?}", path))?;
    }

    Ok(report)
}
