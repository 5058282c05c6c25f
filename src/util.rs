use std::collections::HashSet;

use itertools::Itertools;
use rand::seq::index;
use rand::Rng;

use crate::internal_util::{all_cells, neighbours, parse_grid};
use crate::{Cell, InconsistencyError, KnowledgeBase};

/// Ground truth for a game: where the mines are, and which of them have been
/// flagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minefield {
    height: usize,
    width: usize,
    mines: HashSet<Cell>,
    flagged: HashSet<Cell>,
}
impl Minefield {
    /// Scatter `mines` mines uniformly at random over a `height` x `width`
    /// board.
    ///
    /// # Errors
    ///
    /// If the board is empty, or can't hold that many mines.
    pub fn random<R: Rng + ?Sized>(
        height: usize,
        width: usize,
        mines: usize,
        rng: &mut R,
    ) -> Result<Self, String> {
        if height == 0 || width == 0 {
            return Err("Board must have at least one row and one column".to_string());
        }
        let total_cells = height * width;
        if mines > total_cells {
            return Err(format!(
                "Too many mines ({mines}) for a {height}x{width} board",
            ));
        }
        let mines = index::sample(rng, total_cells, mines)
            .into_iter()
            .map(|i| Cell::new(i / width, i % width))
            .collect();
        Ok(Self {
            height,
            width,
            mines,
            flagged: HashSet::new(),
        })
    }

    /// Create a minefield from an ASCII-encoded description, where `*` is a
    /// mine and `.` is a clear cell.
    ///
    /// # Errors
    ///
    /// If the board is not rectangular, is empty, or contains any other
    /// character.
    pub fn from_ascii(encoded: &str) -> Result<Self, String> {
        let (rows, height, width) = parse_grid(encoded, |c| {
            match c {
                '*' => Some(true),
                '.' => Some(false),
                _ => None,
            }
        })?;
        let mines = all_cells(height, width)
            .filter(|cell| rows[cell.row][cell.col])
            .collect();
        Ok(Self {
            height,
            width,
            mines,
            flagged: HashSet::new(),
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn num_mines(&self) -> usize {
        self.mines.len()
    }

    pub fn is_mine(&self, cell: Cell) -> bool {
        self.mines.contains(&cell)
    }

    /// Number of mines adjacent to `cell`, not counting `cell` itself
    pub fn nearby_mines(&self, cell: Cell) -> usize {
        neighbours(cell, self.height, self.width)
            .filter(|c| self.mines.contains(c))
            .count()
    }

    pub fn flag(&mut self, cell: Cell) {
        self.flagged.insert(cell);
    }

    pub fn flagged(&self) -> &HashSet<Cell> {
        &self.flagged
    }

    /// The game is won once exactly the mines have been flagged
    pub fn won(&self) -> bool {
        self.flagged == self.mines
    }
}

/// A cell of a partially-played board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardCell {
    /// A cell that has been revealed, with its count of adjacent mines
    Revealed(usize),
    /// A cell that has been flagged as a mine
    Flagged,
    /// A cell that is completely unknown
    Unknown,
}

/// Simple representation of what a player can see (no game logic!)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Vec<BoardCell>>,
    height: usize,
    width: usize,
}
impl Board {
    /// Create a game board from an ASCII-encoded description, where:
    /// - `*` is a flagged mine
    /// - `x` is an unknown cell
    /// - `0`-`8` is a revealed cell with that many adjacent mines
    /// - `.` can be used in place of `0`
    /// - Trailing or leading whitespace is ignored
    ///
    /// # Errors
    ///
    /// If the board is not rectangular, or has a width or height of 0, an error
    /// is returned.
    pub fn new(encoded: &str) -> Result<Self, String> {
        let (cells, height, width) = parse_grid(encoded, |c| {
            match c {
                '*' => Some(BoardCell::Flagged),
                'x' => Some(BoardCell::Unknown),
                '.' => Some(BoardCell::Revealed(0)),
                n @ '0'..='8' => n.to_digit(10).map(|n| BoardCell::Revealed(n as usize)),
                _ => None,
            }
        })?;
        Ok(Self {
            cells,
            height,
            width,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, cell: Cell) -> Option<BoardCell> {
        self.cells.get(cell.row)?.get(cell.col).copied()
    }

    /// Teach `kb` everything this board shows: flags first, so that revealed
    /// counts are built with them already accounted for.
    ///
    /// # Errors
    ///
    /// If the board contradicts itself or what `kb` already knows.
    pub fn feed(&self, kb: &mut KnowledgeBase) -> Result<(), InconsistencyError> {
        let cells = all_cells(self.height, self.width)
            .map(|cell| (cell, self.cells[cell.row][cell.col]))
            .collect_vec();
        for &(cell, _) in cells.iter().filter(|(_, c)| *c == BoardCell::Flagged) {
            kb.assert_mine(cell)?;
        }
        for &(cell, c) in &cells {
            if let BoardCell::Revealed(count) = c {
                kb.record_observation(cell, count)?;
            }
        }
        Ok(())
    }
}

/// Draw what `kb` knows about `field`: revealed counts, `*` for proven mines,
/// `o` for proven-safe cells not yet played and `x` for everything else.
pub fn render(field: &Minefield, kb: &KnowledgeBase) -> String {
    (0..field.height())
        .map(|row| {
            (0..field.width())
                .map(|col| {
                    let cell = Cell::new(row, col);
                    if kb.moves_made().contains(&cell) {
                        char::from_digit(field.nearby_mines(cell) as u32, 10).unwrap_or('?')
                    } else if kb.mines().contains(&cell) {
                        '*'
                    } else if kb.safes().contains(&cell) {
                        'o'
                    } else {
                        'x'
                    }
                })
                .collect::<String>()
        })
        .join("\n")
}
