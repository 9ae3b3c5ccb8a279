use super::Grid;

/// The 11x11 reference maze: player in the centre with a wall above it,
/// ghosts in two corners.
pub const REFERENCE_MAZE: &str = "\
###########
#G........#
#.##.#.##.#
#.#.....#.#
#...###...#
#.#..P..#.#
#...#.#...#
#.#.....#.#
#.##.#.##.#
#........G#
###########
";

pub(super) fn reference() -> Grid {
    match Grid::parse(REFERENCE_MAZE) {
        Ok(grid) => grid,
        Err(err) => unreachable!("reference maze is well-formed: {err}"),
    }
}
