use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::model::{DisplayDomain, Metadata};
use crate::selection::{PickerSettings, Selection};
use crate::snapshot::PlotSnapshot;

/// Version tag written into every selection document.
pub const SCHEMA_VERSION: &str = "1";

pub const PNG_WIDTH: u32 = 1200;
pub const PNG_HEIGHT: u32 = 800;

// ---------------------------------------------------------------------------
// JSON document
// ---------------------------------------------------------------------------

/// On-disk layout of a committed selection.
#[derive(Debug, Serialize)]
pub struct SelectionDocument<'a> {
    pub schema_version: &'static str,
    pub selected_hz: &'a [f64],
    pub selected_idx: &'a [usize],
    pub settings: &'a PickerSettings,
    pub spectrum_meta: &'a Metadata,
    /// Stored domain of the spectrum, not the view toggled during the session.
    pub display_domain: DisplayDomain,
}

impl<'a> SelectionDocument<'a> {
    pub fn new(selection: &'a Selection, display_domain: DisplayDomain) -> Self {
        SelectionDocument {
            schema_version: SCHEMA_VERSION,
            selected_hz: &selection.selected_hz,
            selected_idx: &selection.selected_idx,
            settings: &selection.settings,
            spectrum_meta: &selection.meta,
            display_domain,
        }
    }
}

/// Pretty JSON with sorted keys and a trailing newline.
pub fn write_selection_json<W: Write>(
    mut writer: W,
    selection: &Selection,
    display_domain: DisplayDomain,
) -> Result<()> {
    // Round-trip through `Value` so object keys come out sorted.
    let value = serde_json::to_value(SelectionDocument::new(selection, display_domain))
        .context("serializing selection")?;
    serde_json::to_writer_pretty(&mut writer, &value).context("writing selection JSON")?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn write_selection_json_file(
    path: &Path,
    selection: &Selection,
    display_domain: DisplayDomain,
) -> Result<()> {
    ensure_parent(path)?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_selection_json(std::io::BufWriter::new(file), selection, display_domain)
}

// ---------------------------------------------------------------------------
// PNG snapshot
// ---------------------------------------------------------------------------

pub fn write_png(path: &Path, snapshot: &PlotSnapshot) -> Result<()> {
    ensure_parent(path)?;
    snapshot
        .render(PNG_WIDTH, PNG_HEIGHT)?
        .save(path)
        .with_context(|| format!("writing {}", path.display()))
}

// ---------------------------------------------------------------------------
// Both artifacts
// ---------------------------------------------------------------------------

/// Paths produced by [`write_artifacts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub png: PathBuf,
    pub json: PathBuf,
}

impl ArtifactPaths {
    pub fn for_stem(dir: &Path, stem: &str) -> Self {
        ArtifactPaths {
            png: dir.join(format!("{stem}_pick.png")),
            json: dir.join(format!("{stem}_pick.json")),
        }
    }
}

/// Write `<stem>_pick.png` and `<stem>_pick.json` into `dir`.
pub fn write_artifacts(
    dir: &Path,
    stem: &str,
    snapshot: &PlotSnapshot,
    selection: &Selection,
    display_domain: DisplayDomain,
) -> Result<ArtifactPaths> {
    let paths = ArtifactPaths::for_stem(dir, stem);
    write_png(&paths.png, snapshot)?;
    write_selection_json_file(&paths.json, selection, display_domain)?;
    log::info!(
        "Wrote artifacts {} and {}",
        paths.png.display(),
        paths.json.display()
    );
    Ok(paths)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    Ok(())
}
