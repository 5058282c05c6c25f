use std::collections::HashSet;
use std::mem;

use itertools::Itertools;
use log::{debug, trace};
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::internal_util::{all_cells, neighbours};
use crate::solve::{Cell, InconsistencyError, Statement};

/// How hard the engine works to combine statements after each new fact.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq)]
pub enum InferenceMode {
    /// One subset-inference pass followed by one propagation per call. Some
    /// derivable facts may only surface on the next call.
    #[default]
    SinglePass,
    /// Repeat subset inference and propagation until no new statement appears
    Closure,
}

/// A move chosen by [`KnowledgeBase::next_move`]
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Move {
    /// The cell is proven safe
    Safe(Cell),
    /// Nothing is proven safe; the cell is a guess among the cells not known
    /// to be mines
    Random(Cell),
}
impl Move {
    pub fn cell(self) -> Cell {
        match self {
            Move::Safe(cell) | Move::Random(cell) => cell,
        }
    }
}

/// Everything known about a board of fixed dimensions, learned only from the
/// counts reported for revealed cells.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    height: usize,
    width: usize,
    mode: InferenceMode,
    /// Cells that have been played
    moves_made: HashSet<Cell>,
    /// Cells proven to be mines
    mines: HashSet<Cell>,
    /// Cells proven to be safe
    safes: HashSet<Cell>,
    knowledge: Vec<Statement>,
}
impl KnowledgeBase {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            mode: InferenceMode::default(),
            moves_made: HashSet::new(),
            mines: HashSet::new(),
            safes: HashSet::new(),
            knowledge: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: InferenceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn mode(&self) -> InferenceMode {
        self.mode
    }

    pub fn moves_made(&self) -> &HashSet<Cell> {
        &self.moves_made
    }

    pub fn mines(&self) -> &HashSet<Cell> {
        &self.mines
    }

    pub fn safes(&self) -> &HashSet<Cell> {
        &self.safes
    }

    pub fn knowledge(&self) -> &[Statement] {
        &self.knowledge
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    /// Record `cell` as a mine and remove it from every statement.
    ///
    /// Doesn't run any further deduction; see [`Self::assert_mine`].
    ///
    /// # Errors
    ///
    /// If `cell` is already known to be safe, or a statement can't spare the
    /// mine.
    pub fn mark_mine(&mut self, cell: Cell) -> Result<(), InconsistencyError> {
        if self.safes.contains(&cell) {
            return Err(InconsistencyError("Cell proven both mine and safe"));
        }
        if self.mines.insert(cell) {
            debug!("{cell} is a mine");
        }
        for statement in &mut self.knowledge {
            statement.mark_mine(&cell)?;
        }
        Ok(())
    }

    /// Record `cell` as safe and remove it from every statement.
    ///
    /// Doesn't run any further deduction; see [`Self::assert_safe`].
    ///
    /// # Errors
    ///
    /// If `cell` is already known to be a mine, or a statement needs it to be
    /// one.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<(), InconsistencyError> {
        if self.mines.contains(&cell) {
            return Err(InconsistencyError("Cell proven both mine and safe"));
        }
        if self.safes.insert(cell) {
            debug!("{cell} is safe");
        }
        for statement in &mut self.knowledge {
            statement.mark_safe(&cell)?;
        }
        Ok(())
    }

    /// Mark `cell` as a mine (e.g. a flag placed by hand) and deduce whatever
    /// follows.
    ///
    /// # Errors
    ///
    /// If the new fact contradicts what is already known.
    pub fn assert_mine(&mut self, cell: Cell) -> Result<(), InconsistencyError> {
        if !self.in_bounds(cell) {
            return Err(InconsistencyError("Cell lies outside the board"));
        }
        self.mark_mine(cell)?;
        self.deduce()
    }

    /// Mark `cell` as safe without playing it, and deduce whatever follows.
    ///
    /// # Errors
    ///
    /// If the new fact contradicts what is already known.
    pub fn assert_safe(&mut self, cell: Cell) -> Result<(), InconsistencyError> {
        if !self.in_bounds(cell) {
            return Err(InconsistencyError("Cell lies outside the board"));
        }
        self.mark_safe(cell)?;
        self.deduce()
    }

    /// Learn from a revealed cell: `cell` is safe, and exactly `count` of its
    /// neighbours are mines.
    ///
    /// # Errors
    ///
    /// If the observation contradicts what is already known. The knowledge
    /// base should not be used further after an error.
    pub fn record_observation(
        &mut self,
        cell: Cell,
        count: usize,
    ) -> Result<(), InconsistencyError> {
        if !self.in_bounds(cell) {
            return Err(InconsistencyError("Cell lies outside the board"));
        }
        debug!("Observed {cell} with {count} adjacent mines");
        self.mark_safe(cell)?;
        self.moves_made.insert(cell);

        if let Some(statement) = self.neighbour_statement(cell, count)? {
            trace!("New statement {statement}");
            self.knowledge.push(statement);
        }
        self.deduce()
    }

    /// Add a statement known from outside the board's counts, and deduce
    /// whatever follows.
    ///
    /// # Errors
    ///
    /// If the statement contradicts what is already known.
    pub fn add_statement(
        &mut self,
        mut statement: Statement,
    ) -> Result<(), InconsistencyError> {
        if statement.cells().iter().any(|&cell| !self.in_bounds(cell)) {
            return Err(InconsistencyError("Cell lies outside the board"));
        }
        for cell in &self.mines {
            statement.mark_mine(cell)?;
        }
        for cell in &self.safes {
            statement.mark_safe(cell)?;
        }
        if !statement.is_empty() {
            self.knowledge.push(statement);
        }
        self.deduce()
    }

    /// Build the statement about the still-unknown neighbours of `cell`.
    /// Neighbours already known to be mines are taken out of the count.
    fn neighbour_statement(
        &self,
        cell: Cell,
        mut count: usize,
    ) -> Result<Option<Statement>, InconsistencyError> {
        let mut unknown = HashSet::new();
        for neighbour in neighbours(cell, self.height, self.width) {
            if self.mines.contains(&neighbour) {
                count = count.checked_sub(1).ok_or(InconsistencyError(
                    "Count smaller than the number of known adjacent mines",
                ))?;
            } else if !self.safes.contains(&neighbour) {
                unknown.insert(neighbour);
            }
        }
        if unknown.is_empty() {
            return if count == 0 {
                Ok(None)
            } else {
                Err(InconsistencyError(
                    "Count larger than the number of unknown adjacent cells",
                ))
            };
        }
        Statement::new(unknown, count).map(Some)
    }

    fn deduce(&mut self) -> Result<(), InconsistencyError> {
        self.propagate()?;
        match self.mode {
            InferenceMode::SinglePass => {
                self.infer()?;
                self.propagate()?;
            },
            InferenceMode::Closure => loop {
                let added = self.infer()?;
                self.propagate()?;
                if !added {
                    break;
                }
            },
        }
        debug_assert!(self.mines.is_disjoint(&self.safes));
        debug_assert!(self.moves_made.is_subset(&self.safes));
        debug_assert!(self.knowledge.iter().all(|s| s.count() <= s.len()));
        Ok(())
    }

    /// Apply every certainty the statements expose until none are left.
    fn propagate(&mut self) -> Result<(), InconsistencyError> {
        loop {
            let mut new_mines = HashSet::new();
            let mut new_safes = HashSet::new();
            for statement in &self.knowledge {
                new_mines.extend(
                    statement
                        .known_mines()
                        .into_iter()
                        .filter(|cell| !self.mines.contains(cell)),
                );
                new_safes.extend(
                    statement
                        .known_safes()
                        .into_iter()
                        .filter(|cell| !self.safes.contains(cell)),
                );
            }
            trace!(
                "Propagating {} new mines and {} new safes through {} statements",
                new_mines.len(),
                new_safes.len(),
                self.knowledge.len(),
            );
            if new_mines.is_empty() && new_safes.is_empty() {
                break;
            }
            for cell in new_mines {
                self.mark_mine(cell)?;
            }
            for cell in new_safes {
                self.mark_safe(cell)?;
            }
            self.prune();
        }
        self.prune();
        Ok(())
    }

    /// Drop resolved and duplicate statements, keeping the first occurrence of
    /// each.
    fn prune(&mut self) {
        self.knowledge = mem::take(&mut self.knowledge)
            .into_iter()
            .filter(|statement| !statement.is_empty())
            .unique()
            .collect();
    }

    /// One pass of subset inference over every ordered pair of statements.
    ///
    /// Returns whether any statement not already known was added.
    fn infer(&mut self) -> Result<bool, InconsistencyError> {
        let mut inferred = Vec::new();
        for (subset, superset) in self
            .knowledge
            .iter()
            .cartesian_product(&self.knowledge)
            .filter(|(a, b)| a.is_strict_subset_of(b))
        {
            inferred.push(superset.subtract(subset)?);
        }

        let known = self.knowledge.iter().cloned().collect::<HashSet<_>>();
        let mut added = false;
        for statement in inferred {
            if !known.contains(&statement) {
                trace!("Inferred {statement}");
                added = true;
            }
            self.knowledge.push(statement);
        }
        Ok(added)
    }

    /// A cell proven safe that hasn't been played yet, if any. The lowest such
    /// cell is chosen so that play is reproducible.
    pub fn request_safe_move(&self) -> Option<Cell> {
        self.safes.difference(&self.moves_made).min().copied()
    }

    /// A uniformly random cell that hasn't been played and isn't known to be a
    /// mine, if any remain.
    pub fn request_random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        all_cells(self.height, self.width)
            .filter(|cell| !self.moves_made.contains(cell) && !self.mines.contains(cell))
            .collect_vec()
            .choose(rng)
            .copied()
    }

    /// A safe move if one is known, otherwise a random one
    pub fn next_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Move> {
        self.request_safe_move()
            .map(Move::Safe)
            .or_else(|| self.request_random_move(rng).map(Move::Random))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn cells(coords: &[(usize, usize)]) -> HashSet<Cell> {
        coords.iter().copied().map(Cell::from).collect()
    }

    fn statement(coords: &[(usize, usize)], count: usize) -> Statement {
        Statement::new(cells(coords), count).unwrap()
    }

    #[test]
    fn empty_corner_clears_its_neighbours() {
        let mut kb = KnowledgeBase::new(3, 3);
        kb.record_observation(Cell::new(0, 0), 0).unwrap();

        assert_eq!(kb.moves_made(), &cells(&[(0, 0)]));
        assert_eq!(kb.safes(), &cells(&[(0, 0), (0, 1), (1, 0), (1, 1)]));
        assert!(kb.mines().is_empty());
        assert!(kb.knowledge().is_empty());
        assert_eq!(kb.request_safe_move(), Some(Cell::new(0, 1)));
    }

    #[test]
    fn single_cell_statement_is_a_mine() {
        let mut kb = KnowledgeBase::new(3, 3);
        kb.add_statement(statement(&[(1, 1)], 1)).unwrap();
        assert_eq!(kb.mines(), &cells(&[(1, 1)]));
        assert!(kb.knowledge().is_empty());
    }

    #[test]
    fn subset_inference_finds_mine() {
        let mut kb = KnowledgeBase::new(3, 3);
        kb.add_statement(statement(&[(0, 0), (0, 1)], 1)).unwrap();
        assert!(kb.mines().is_empty());
        kb.add_statement(statement(&[(0, 0), (0, 1), (0, 2)], 2))
            .unwrap();

        assert_eq!(kb.mines(), &cells(&[(0, 2)]));
        assert!(kb.safes().is_empty());
        // The superset collapses onto the subset once (0, 2) is resolved
        assert_eq!(kb.knowledge(), &[statement(&[(0, 0), (0, 1)], 1)]);
    }

    #[test]
    fn propagation_chains_through_statements() {
        let mut kb = KnowledgeBase::new(3, 3);
        kb.add_statement(statement(&[(0, 0), (0, 1)], 1)).unwrap();
        kb.add_statement(statement(&[(0, 1), (0, 2)], 1)).unwrap();
        kb.assert_safe(Cell::new(0, 2)).unwrap();

        // (0, 2) safe -> (0, 1) mine -> (0, 0) safe
        assert_eq!(kb.mines(), &cells(&[(0, 1)]));
        assert_eq!(kb.safes(), &cells(&[(0, 0), (0, 2)]));
        assert!(kb.knowledge().is_empty());
        assert!(kb.moves_made().is_empty());
    }

    #[test]
    fn known_mines_are_taken_out_of_new_counts() {
        let mut kb = KnowledgeBase::new(3, 3);
        kb.assert_mine(Cell::new(0, 1)).unwrap();
        kb.record_observation(Cell::new(0, 0), 1).unwrap();

        assert_eq!(kb.mines(), &cells(&[(0, 1)]));
        assert_eq!(kb.safes(), &cells(&[(0, 0), (1, 0), (1, 1)]));
    }

    #[test]
    fn closure_finds_what_a_single_pass_misses() {
        let build = |mode| {
            let mut kb = KnowledgeBase::new(3, 3).with_mode(mode);
            kb.add_statement(statement(&[(0, 0), (0, 1)], 1)).unwrap();
            kb.add_statement(statement(&[(0, 2), (1, 0), (1, 1)], 1))
                .unwrap();
            kb.add_statement(statement(&[(0, 0), (0, 1), (0, 2), (1, 0)], 2))
                .unwrap();
            kb
        };

        // One pass only produces {(0, 2), (1, 0)} = 1
        let single = build(InferenceMode::SinglePass);
        assert!(single.safes().is_empty());
        assert!(single
            .knowledge()
            .contains(&statement(&[(0, 2), (1, 0)], 1)));

        let closure = build(InferenceMode::Closure);
        assert_eq!(closure.safes(), &cells(&[(1, 1)]));
        assert!(closure.mines().is_empty());
    }

    #[test]
    fn contradictions_are_reported() {
        let mut kb = KnowledgeBase::new(3, 3);
        assert!(kb.record_observation(Cell::new(0, 0), 4).is_err());

        let mut kb = KnowledgeBase::new(3, 3);
        assert!(kb.record_observation(Cell::new(3, 0), 0).is_err());

        let mut kb = KnowledgeBase::new(3, 3);
        kb.assert_mine(Cell::new(1, 1)).unwrap();
        assert!(kb.record_observation(Cell::new(1, 1), 0).is_err());
        assert!(kb.record_observation(Cell::new(0, 0), 0).is_err());

        let mut kb = KnowledgeBase::new(3, 3);
        kb.record_observation(Cell::new(0, 0), 0).unwrap();
        assert_eq!(
            kb.assert_mine(Cell::new(1, 1)),
            Err(InconsistencyError("Cell proven both mine and safe"))
        );
    }

    #[test]
    fn random_move_avoids_mines_and_played_cells() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut kb = KnowledgeBase::new(1, 3);
        kb.assert_mine(Cell::new(0, 2)).unwrap();
        kb.record_observation(Cell::new(0, 0), 0).unwrap();

        // (0, 1) is the only cell left, and it's proven safe
        assert_eq!(kb.next_move(&mut rng), Some(Move::Safe(Cell::new(0, 1))));
        for _ in 0..10 {
            assert_eq!(kb.request_random_move(&mut rng), Some(Cell::new(0, 1)));
        }

        kb.record_observation(Cell::new(0, 1), 1).unwrap();
        assert_eq!(kb.request_safe_move(), None);
        assert_eq!(kb.request_random_move(&mut rng), None);
        assert_eq!(kb.next_move(&mut rng), None);
    }
}
