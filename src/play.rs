use log::{debug, info};
use rand::Rng;

use crate::util::Minefield;
use crate::{Cell, InconsistencyError, KnowledgeBase, Move};

/// How a game ended
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Outcome {
    /// Every mine was flagged
    Won,
    /// A guess landed on this mine
    Lost(Cell),
    /// No cell is left to play, but not every mine could be identified
    Stuck,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Report {
    pub outcome: Outcome,
    /// Cells revealed, guesses included
    pub moves: usize,
    /// Moves that had to be guessed because nothing was proven safe
    pub guesses: usize,
}

/// Play `field` to the end, revealing proven-safe cells whenever there are any
/// and guessing otherwise. Every mine `kb` proves is flagged as it goes.
///
/// # Errors
///
/// If `kb` already holds knowledge that contradicts `field`.
pub fn play<R: Rng + ?Sized>(
    field: &mut Minefield,
    kb: &mut KnowledgeBase,
    rng: &mut R,
) -> Result<Report, InconsistencyError> {
    let mut moves = 0;
    let mut guesses = 0;
    let outcome = loop {
        for &mine in kb.mines() {
            field.flag(mine);
        }
        if field.won() {
            break Outcome::Won;
        }
        let Some(next) = kb.next_move(rng) else {
            break Outcome::Stuck;
        };
        let cell = next.cell();
        moves += 1;
        match next {
            Move::Safe(_) => debug!("Playing safe move {cell}"),
            Move::Random(_) => {
                guesses += 1;
                debug!("No safe moves left, guessing {cell}");
            },
        }
        if field.is_mine(cell) {
            break Outcome::Lost(cell);
        }
        kb.record_observation(cell, field.nearby_mines(cell))?;
    };
    let report = Report {
        outcome,
        moves,
        guesses,
    };
    info!("Game over: {report:?}");
    Ok(report)
}
