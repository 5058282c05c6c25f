use std::cmp::min;

use itertools::iproduct;

use crate::Cell;

/// Cells adjacent to `cell` (diagonals included) that lie on a
/// `height` x `width` board. `cell` itself is never yielded.
pub(crate) fn neighbours(
    cell: Cell,
    height: usize,
    width: usize,
) -> impl Iterator<Item = Cell> {
    let rows = cell.row.saturating_sub(1)..=min(cell.row + 1, height.saturating_sub(1));
    let cols = cell.col.saturating_sub(1)..=min(cell.col + 1, width.saturating_sub(1));
    iproduct!(rows, cols)
        .map(Cell::from)
        .filter(move |&c| c != cell && c.row < height && c.col < width)
}

/// Every cell of a `height` x `width` board, in row-major order
pub(crate) fn all_cells(height: usize, width: usize) -> impl Iterator<Item = Cell> {
    iproduct!(0..height, 0..width).map(Cell::from)
}

/// Parse a rectangular ASCII grid, one row per line, handing each character
/// to `decode`.
///
/// Trailing or leading whitespace is ignored. Returns the decoded rows along
/// with the grid's `(height, width)`.
pub(crate) fn parse_grid<T>(
    encoded: &str,
    mut decode: impl FnMut(char) -> Option<T>,
) -> Result<(Vec<Vec<T>>, usize, usize), String> {
    let lines = encoded.trim().lines().map(str::trim).collect::<Vec<_>>();
    let height = lines.len();
    if height == 0 {
        return Err("Board must have at least one row".to_string());
    }
    let width = lines[0].chars().count();
    if width == 0 {
        return Err("Board must have at least one column".to_string());
    }
    if let Some(line) = lines.iter().find(|l| l.chars().count() != width) {
        return Err(format!(
            concat!(
                "Board must be rectangular (found line with length {},",
                " expected length {})",
            ),
            line.chars().count(),
            width,
        ));
    }
    let mut rows = Vec::with_capacity(height);
    for (row, line) in lines.into_iter().enumerate() {
        let mut decoded = Vec::with_capacity(width);
        for (col, c) in line.chars().enumerate() {
            decoded.push(
                decode(c)
                    .ok_or_else(|| format!("Invalid character '{c}' at ({row}, {col})"))?,
            );
        }
        rows.push(decoded);
    }
    Ok((rows, height, width))
}
