//! Plain tile maps: level generation, fixtures and text snapshots
//!
//! The text form has one line per row, top row first. Tile types 0..25 are
//! written `A`..`Z` and an empty cell is `.`.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::grid::{CellIndex, TileType};

/// Largest number of tile types the text form can express
pub const MAX_TILE_TYPES: u8 = 26;

const EMPTY_CHAR: char = '.';

/// Tile map without visuals, row 0 at the bottom
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    width: usize,
    height: usize,
    cells: Vec<Option<TileType>>,
}

impl Layout {
    /// Layout from a flat cell list (`row * width + col`)
    pub fn from_cells(width: usize, height: usize, cells: Vec<Option<TileType>>) -> Result<Self, LayoutError> {
        if width == 0 || height == 0 {
            return Err(LayoutError::Empty);
        }
        if cells.len() != width * height {
            return Err(LayoutError::CellCount {
                expected: width * height,
                found: cells.len(),
            });
        }
        Ok(Self { width, height, cells })
    }

    /// Layout built cell by cell
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(CellIndex) -> Option<TileType>) -> Self {
        Self {
            width,
            height,
            cells: (0..width * height).map(&mut f).collect(),
        }
    }

    /// Completely filled layout with uniformly random tile types in `0..tile_types`
    pub fn random<R: Rng>(width: usize, height: usize, tile_types: TileType, rng: &mut R) -> Self {
        Self::from_fn(width, height, |_| Some(rng.gen_range(0..tile_types.max(1))))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[Option<TileType>] {
        &self.cells
    }

    /// Tile at (`col`, `row`)
    pub fn get(&self, col: usize, row: usize) -> Option<TileType> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.cells[row * self.width + col]
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// One more than the largest tile type present (0 for an empty layout)
    pub fn tile_type_bound(&self) -> u16 {
        self.cells
            .iter()
            .flatten()
            .map(|&t| u16::from(t) + 1)
            .max()
            .unwrap_or(0)
    }
}

fn tile_char(tile: Option<TileType>) -> char {
    match tile {
        None => EMPTY_CHAR,
        Some(t) if t < MAX_TILE_TYPES => char::from(b'A' + t),
        Some(_) => '?',
    }
}

fn char_tile(ch: char) -> Option<Option<TileType>> {
    match ch {
        EMPTY_CHAR => Some(None),
        'A'..='Z' => Some(Some(ch as u8 - b'A')),
        _ => None,
    }
}

impl FromStr for Layout {
    type Err = LayoutError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let width = rows.first().map(|r| r.chars().count()).ok_or(LayoutError::Empty)?;
        let height = rows.len();
        let mut cells = vec![None; width * height];

        for (line, text_row) in rows.iter().enumerate() {
            let found = text_row.chars().count();
            if found != width {
                return Err(LayoutError::Ragged {
                    line,
                    expected: width,
                    found,
                });
            }
            let row = height - 1 - line;
            for (col, ch) in text_row.chars().enumerate() {
                cells[row * width + col] = char_tile(ch).ok_or(LayoutError::InvalidChar { ch, line })?;
            }
        }

        Ok(Self { width, height, cells })
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..self.height).rev() {
            let line: String = (0..self.width).map(|col| tile_char(self.get(col, row))).collect();
            f.write_str(&line)?;
            if row > 0 {
                f.write_str("\n")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_parse_puts_last_line_at_row_zero() {
        let layout: Layout = "AB.\nCDE".parse().unwrap();
        assert_eq!(layout.width(), 3);
        assert_eq!(layout.height(), 2);
        assert_eq!(layout.get(0, 0), Some(2));
        assert_eq!(layout.get(2, 1), None);
        assert_eq!(layout.get(1, 1), Some(1));
        assert_eq!(layout.occupied(), 5);
        assert_eq!(layout.to_string(), "AB.\nCDE");
    }

    #[test]
    fn test_parse_ignores_indentation_and_blank_lines() {
        let layout: Layout = "\n    AA\n    BB\n".parse().unwrap();
        assert_eq!(layout.to_string(), "AA\nBB");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Layout>().unwrap_err(), LayoutError::Empty);
        assert_eq!(
            "AB\nA".parse::<Layout>().unwrap_err(),
            LayoutError::Ragged { line: 1, expected: 2, found: 1 }
        );
        assert_eq!(
            "Ab".parse::<Layout>().unwrap_err(),
            LayoutError::InvalidChar { ch: 'b', line: 0 }
        );
    }

    #[test]
    fn test_from_cells_checks_length() {
        assert!(Layout::from_cells(2, 2, vec![Some(0); 4]).is_ok());
        assert_eq!(
            Layout::from_cells(2, 2, vec![None; 3]).unwrap_err(),
            LayoutError::CellCount { expected: 4, found: 3 }
        );
    }

    #[test]
    fn test_random_is_full_and_seeded() {
        let a = Layout::random(6, 5, 3, &mut ChaCha8Rng::seed_from_u64(9));
        let b = Layout::random(6, 5, 3, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
        assert_eq!(a.occupied(), 30);
        assert!(a.tile_type_bound() <= 3);
    }
}
