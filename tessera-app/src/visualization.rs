use crate::output::UNDECIDED;
use colored::{Color, Colorize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use wfc_core::Grid;
use wfc_rules::Tile;

const PALETTE: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::Blue,
    Color::Red,
];

/// Trait for types that can present a solver's tile grid.
pub trait Visualizer {
    /// Displays the given grid. Undecided cells are `None`.
    fn display_state(&mut self, grid: &Grid<Option<Tile>>) -> Result<(), anyhow::Error>;
}

/// Prints the grid as coloured text, one colour per distinct tile.
pub struct TerminalVisualizer<W: Write> {
    writer: W,
    colours: BTreeMap<Tile, Color>,
}

impl TerminalVisualizer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalVisualizer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            colours: BTreeMap::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn colour(&mut self, tile: &Tile) -> Color {
        let next = PALETTE[self.colours.len() % PALETTE.len()];
        *self.colours.entry(tile.clone()).or_insert(next)
    }
}

impl<W: Write> Visualizer for TerminalVisualizer<W> {
    fn display_state(&mut self, grid: &Grid<Option<Tile>>) -> Result<(), anyhow::Error> {
        writeln!(
            self.writer,
            "{}",
            format!("--- {}x{}x{} ---", grid.width, grid.height, grid.depth)
                .as_str()
                .bold()
        )?;
        for z in 0..grid.depth {
            if z > 0 {
                writeln!(self.writer)?;
            }
            for row in grid.rows(z) {
                let mut line = String::new();
                for cell in row {
                    let text = match cell {
                        Some(tile) => {
                            let colour = self.colour(tile);
                            tile.to_string().as_str().color(colour).to_string()
                        }
                        None => UNDECIDED.dimmed().to_string(),
                    };
                    line.push_str(&text);
                }
                writeln!(self.writer, "{line}")?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_every_row() {
        colored::control::set_override(false);
        let grid = Grid::from_vec(
            2,
            2,
            1,
            vec![
                Some(Tile::from_char('a')),
                None,
                Some(Tile::from_char('b')),
                Some(Tile::from_char('a')),
            ],
        )
        .unwrap();
        let mut visualizer = TerminalVisualizer::new(Vec::new());
        visualizer.display_state(&grid).unwrap();
        let text = String::from_utf8(visualizer.into_inner()).unwrap();
        assert_eq!(text, "--- 2x2x1 ---\na?\nba\n");
        assert_eq!(visualizer_colours(&grid), 2);
    }

    fn visualizer_colours(grid: &Grid<Option<Tile>>) -> usize {
        let mut visualizer = TerminalVisualizer::new(io::sink());
        visualizer.display_state(grid).unwrap();
        visualizer.colours.len()
    }
}
