//! Same-type group selection over the 4-neighbourhood

use crate::grid::{CellIndex, Grid};
use crate::presenter::Presenter;

/// Maximal 4-connected group of cells sharing the tile type of `start`.
///
/// Returns an empty selection when `start` is out of range or empty. The
/// result includes `start` and is sorted by index.
pub fn select_group<P: Presenter>(grid: &Grid<P>, start: CellIndex) -> Vec<CellIndex> {
    let mut visited = vec![false; grid.len()];
    let mut group = flood(grid, start, &mut visited);
    group.sort_unstable();
    group
}

/// Every distinct group with at least `min_size` cells, ordered by the
/// lowest index of each group. Each cell belongs to at most one group.
pub fn legal_groups<P: Presenter>(grid: &Grid<P>, min_size: usize) -> Vec<Vec<CellIndex>> {
    let mut visited = vec![false; grid.len()];
    let mut groups = Vec::new();

    for (index, _) in grid.tiles() {
        if visited[index] {
            continue;
        }
        let mut group = flood(grid, index, &mut visited);
        if group.len() >= min_size {
            group.sort_unstable();
            groups.push(group);
        }
    }

    groups
}

/// Depth-first fill from `start`, marking every reached cell in `visited`
fn flood<P: Presenter>(grid: &Grid<P>, start: CellIndex, visited: &mut [bool]) -> Vec<CellIndex> {
    let Some(tile) = grid.tile(start) else {
        return Vec::new();
    };

    let mut group = vec![start];
    let mut stack = vec![start];
    visited[start] = true;

    while let Some(current) = stack.pop() {
        for next in grid.adjacent4(current).into_iter().flatten() {
            if !visited[next] && grid.tile(next) == Some(tile) {
                visited[next] = true;
                stack.push(next);
                group.push(next);
            }
        }
    }

    group
}
