use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use frozenset::Freeze;
use itertools::Itertools;

/// The state of the game is logically inconsistent.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct InconsistencyError(pub &'static str);
impl fmt::Display for InconsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inconsistent knowledge: {}", self.0)
    }
}
impl std::error::Error for InconsistencyError {
}

/// A cell on the board, addressed by 0-indexed row and column.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}
impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
        }
    }
}
impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A logical statement about the board: exactly `count` of `cells` are mines,
/// and the rest are safe.
///
/// Cells are removed from the statement as their status becomes known, so a
/// statement only ever talks about cells that are still undetermined from its
/// own point of view.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statement {
    cells: HashSet<Cell>,
    count: usize,
}
impl Statement {
    /// # Errors
    ///
    /// A statement claiming more mines than it has cells can never be true.
    pub fn new(
        cells: impl IntoIterator<Item = Cell>,
        count: usize,
    ) -> Result<Self, InconsistencyError> {
        let cells = cells.into_iter().collect::<HashSet<_>>();
        if count > cells.len() {
            return Err(InconsistencyError("Statement with more mines than cells"));
        }
        Ok(Self {
            cells,
            count,
        })
    }

    pub fn cells(&self) -> &HashSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// A statement with no cells left carries no information
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: &Cell) -> bool {
        self.cells.contains(cell)
    }

    /// If N cells hold exactly N mines, every one of them is a mine
    pub fn known_mines(&self) -> HashSet<Cell> {
        if self.cells.len() == self.count {
            self.cells.clone()
        } else {
            HashSet::new()
        }
    }

    /// If the cells hold no mines, every one of them is safe
    pub fn known_safes(&self) -> HashSet<Cell> {
        if self.count == 0 {
            self.cells.clone()
        } else {
            HashSet::new()
        }
    }

    /// Account for `cell` being a mine: drop it from the statement and take
    /// its mine out of the count. No-op if `cell` isn't part of the statement.
    ///
    /// # Errors
    ///
    /// If the statement already has no mines left to give up.
    pub fn mark_mine(&mut self, cell: &Cell) -> Result<(), InconsistencyError> {
        if !self.cells.contains(cell) {
            return Ok(());
        }
        self.count = self
            .count
            .checked_sub(1)
            .ok_or(InconsistencyError("Mine marked in a statement with no mines"))?;
        self.cells.remove(cell);
        Ok(())
    }

    /// Account for `cell` being safe: drop it from the statement, leaving the
    /// count untouched. No-op if `cell` isn't part of the statement.
    ///
    /// # Errors
    ///
    /// If the remaining cells could no longer hold the statement's mines.
    pub fn mark_safe(&mut self, cell: &Cell) -> Result<(), InconsistencyError> {
        if !self.cells.contains(cell) {
            return Ok(());
        }
        if self.cells.len() == self.count {
            return Err(InconsistencyError(
                "Safe cell marked in a statement of known mines",
            ));
        }
        self.cells.remove(cell);
        Ok(())
    }

    /// Is this statement's cell set a strict subset of `other`'s?
    pub fn is_strict_subset_of(&self, other: &Self) -> bool {
        self.cells.len() < other.cells.len() && self.cells.is_subset(&other.cells)
    }

    /// Given that `other` covers a subset of this statement's cells, the mines
    /// in the remaining cells are exactly the difference of the two counts.
    ///
    /// # Errors
    ///
    /// If `other` isn't a subset of this statement, or the counts can't be
    /// reconciled.
    pub fn subtract(&self, other: &Self) -> Result<Self, InconsistencyError> {
        if !other.cells.is_subset(&self.cells) {
            return Err(InconsistencyError("Subtraction of non-substatement"));
        }
        let count = self
            .count
            .checked_sub(other.count)
            .ok_or(InconsistencyError("Substatement with more mines than its superset"))?;
        Self::new(self.cells.difference(&other.cells).copied(), count)
    }
}
impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.cells == other.cells
    }
}
impl Eq for Statement {
}
impl Hash for Statement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cells.clone().freeze().hash(state);
        self.count.hash(state);
    }
}
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}} = {}",
            self.cells.iter().sorted().join(", "),
            self.count
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn cells(coords: &[(usize, usize)]) -> HashSet<Cell> {
        coords.iter().copied().map(Cell::from).collect()
    }

    fn statement(coords: &[(usize, usize)], count: usize) -> Statement {
        Statement::new(cells(coords), count).unwrap()
    }

    #[test]
    fn rejects_more_mines_than_cells() {
        assert_eq!(
            Statement::new(cells(&[(0, 0)]), 2),
            Err(InconsistencyError("Statement with more mines than cells"))
        );
        assert!(Statement::new(HashSet::new(), 0).unwrap().is_empty());
    }

    #[test]
    fn full_statement_is_all_mines() {
        let s = statement(&[(0, 0), (0, 1)], 2);
        assert_eq!(s.known_mines(), cells(&[(0, 0), (0, 1)]));
        assert_eq!(s.known_safes(), HashSet::new());

        let s = statement(&[(1, 1)], 1);
        assert_eq!(s.known_mines(), cells(&[(1, 1)]));
    }

    #[test]
    fn zero_statement_is_all_safe() {
        let s = statement(&[(0, 0), (0, 1), (1, 0)], 0);
        assert_eq!(s.known_safes(), cells(&[(0, 0), (0, 1), (1, 0)]));
        assert_eq!(s.known_mines(), HashSet::new());
    }

    #[test]
    fn partial_statement_knows_nothing() {
        let s = statement(&[(0, 0), (0, 1), (1, 0)], 1);
        assert!(s.known_mines().is_empty());
        assert!(s.known_safes().is_empty());
    }

    #[test]
    fn mark_mine_shrinks_and_decrements() {
        let mut s = statement(&[(0, 0), (0, 1), (1, 0)], 2);
        s.mark_mine(&Cell::new(0, 1)).unwrap();
        assert_eq!(s, statement(&[(0, 0), (1, 0)], 1));

        // Second call, and a call for an unrelated cell, change nothing
        s.mark_mine(&Cell::new(0, 1)).unwrap();
        s.mark_mine(&Cell::new(5, 5)).unwrap();
        assert_eq!(s, statement(&[(0, 0), (1, 0)], 1));
    }

    #[test]
    fn mark_safe_keeps_count() {
        let mut s = statement(&[(0, 0), (0, 1), (1, 0)], 1);
        s.mark_safe(&Cell::new(1, 0)).unwrap();
        assert_eq!(s, statement(&[(0, 0), (0, 1)], 1));

        s.mark_safe(&Cell::new(1, 0)).unwrap();
        assert_eq!(s.count(), 1);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn marks_that_break_the_count_are_rejected() {
        let mut s = statement(&[(0, 0), (0, 1)], 0);
        assert!(s.mark_mine(&Cell::new(0, 0)).is_err());
        assert_eq!(s, statement(&[(0, 0), (0, 1)], 0));

        let mut s = statement(&[(0, 0), (0, 1)], 2);
        assert!(s.mark_safe(&Cell::new(0, 0)).is_err());
        assert_eq!(s, statement(&[(0, 0), (0, 1)], 2));
    }

    #[test]
    fn subtract_subset() {
        let a = statement(&[(0, 0), (0, 1)], 1);
        let b = statement(&[(0, 0), (0, 1), (0, 2)], 2);
        assert!(a.is_strict_subset_of(&b));
        assert!(!b.is_strict_subset_of(&a));
        assert!(!a.is_strict_subset_of(&a));
        assert_eq!(b.subtract(&a), Ok(statement(&[(0, 2)], 1)));
        assert!(a.subtract(&b).is_err());
    }

    #[test]
    fn equality_is_structural() {
        let a = statement(&[(0, 0), (0, 1), (2, 2)], 1);
        let b = statement(&[(2, 2), (0, 1), (0, 0)], 1);
        let c = statement(&[(2, 2), (0, 1), (0, 0)], 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!([a, b, c].into_iter().collect::<HashSet<_>>().len(), 2);
    }

    #[test]
    fn display_sorts_cells() {
        let s = statement(&[(1, 0), (0, 2), (0, 1)], 1);
        assert_eq!(s.to_string(), "{(0, 1), (0, 2), (1, 0)} = 1");
    }
}
