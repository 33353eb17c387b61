use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use wfc_core::Grid;
use wfc_rules::Tile;

/// Written for cells that were not decided.
pub const UNDECIDED: &str = "?";

/// Renders the grid as text: one line per row, a blank line between
/// layers. Tiles are separated by spaces unless every tile renders as a
/// single character.
pub fn render_grid(grid: &Grid<Option<Tile>>) -> String {
    let cells: Vec<String> = grid
        .as_slice()
        .iter()
        .map(|cell| cell.as_ref().map_or_else(|| UNDECIDED.to_string(), ToString::to_string))
        .collect();
    let separator = if cells.iter().all(|cell| cell.chars().count() == 1) {
        ""
    } else {
        " "
    };

    let width = grid.width.max(1);
    let layer = width * grid.height;
    let mut out = String::new();
    for (z, layer_cells) in cells.chunks(layer.max(1)).enumerate() {
        if z > 0 {
            out.push('\n');
        }
        for row in layer_cells.chunks(width) {
            out.push_str(&row.join(separator));
            out.push('\n');
        }
    }
    out
}

/// Saves the grid to a file in the format of [`render_grid`].
pub fn save_grid_to_file(grid: &Grid<Option<Tile>>, output_path: &Path) -> Result<()> {
    log::info!("Saving grid to {}...", output_path.display());
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;
    let mut writer = io::BufWriter::new(file);
    writer
        .write_all(render_grid(grid).as_bytes())
        .context("Failed to write output grid")?;
    writer
        .flush()
        .context("Failed to flush writer for output file")?;
    log::info!("Successfully saved grid to {}", output_path.display());
    Ok(())
}
