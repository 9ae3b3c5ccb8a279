//! Maze grid: cell kinds, coordinates, and adjacency queries.
//!
//! The grid is stored row-major; `y` selects the row and `x` the column.
//! Out-of-grid lookups are never undefined: checked accessors return
//! [`GridError::OutOfBounds`], and adjacency queries treat anything outside
//! the grid as a wall.

mod maze;

use std::fmt;

use crate::error::{ErrorSeverity, GameError};

pub use maze::REFERENCE_MAZE;

/// Discrete grid position expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent position one cell away in `direction`.
    pub fn neighbor(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned movement direction. "Up" decreases `y` (towards row 0).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }
}

/// Kind occupying a single grid position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Cell {
    Wall,
    Empty,
    Pellet,
    Ghost,
    Player,
}

impl Cell {
    /// Anything but a wall counts as open for adjacency.
    pub const fn is_open(self) -> bool {
        !matches!(self, Cell::Wall)
    }

    /// Character used by the text form of a grid.
    pub const fn glyph(self) -> char {
        match self {
            Cell::Wall => '#',
            Cell::Empty => '_',
            Cell::Pellet => '.',
            Cell::Ghost => 'G',
            Cell::Player => 'P',
        }
    }

    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '#' => Some(Cell::Wall),
            '_' => Some(Cell::Empty),
            '.' => Some(Cell::Pellet),
            'G' => Some(Cell::Ghost),
            'P' => Some(Cell::Player),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("position {position} is outside the {width}x{height} grid")]
    OutOfBounds {
        position: Position,
        width: u32,
        height: u32,
    },

    #[error("grid has no cells")]
    Empty,

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown cell glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph {
        glyph: char,
        row: usize,
        column: usize,
    },
}

impl GameError for GridError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            GridError::OutOfBounds { .. } => ErrorSeverity::Internal,
            GridError::Empty | GridError::RaggedRow { .. } | GridError::UnknownGlyph { .. } => {
                ErrorSeverity::Validation
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            GridError::OutOfBounds { .. } => "OUT_OF_BOUNDS",
            GridError::Empty => "EMPTY_GRID",
            GridError::RaggedRow { .. } => "RAGGED_ROW",
            GridError::UnknownGlyph { .. } => "UNKNOWN_GLYPH",
        }
    }
}

/// Fixed-size rectangular maze, mutated in place as the player moves.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Vec<Cell>>", into = "Vec<Vec<Cell>>")
)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Builds a grid from rows of equal length.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, GridError> {
        let expected = rows.first().map(Vec::len).unwrap_or(0);
        if expected == 0 {
            return Err(GridError::Empty);
        }

        let mut cells = Vec::with_capacity(expected * rows.len());
        for (row, line) in rows.iter().enumerate() {
            if line.len() != expected {
                return Err(GridError::RaggedRow {
                    row,
                    expected,
                    found: line.len(),
                });
            }
            cells.extend_from_slice(line);
        }

        Ok(Self {
            width: expected as u32,
            height: rows.len() as u32,
            cells,
        })
    }

    /// Parses the text form: one line per row, blank lines and surrounding
    /// whitespace ignored. See [`Cell::glyph`] for the alphabet.
    pub fn parse(text: &str) -> Result<Self, GridError> {
        let mut rows = Vec::new();
        for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let row = rows.len();
            let cells = line
                .chars()
                .enumerate()
                .map(|(column, glyph)| {
                    Cell::from_glyph(glyph).ok_or(GridError::UnknownGlyph { glyph, row, column })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(cells);
        }
        Self::from_rows(rows)
    }

    /// The 11x11 maze the puzzle ships with.
    pub fn reference_maze() -> Self {
        maze::reference()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < self.width as i32
            && position.y < self.height as i32
    }

    fn index(&self, position: Position) -> Result<usize, GridError> {
        if !self.contains(position) {
            return Err(GridError::OutOfBounds {
                position,
                width: self.width,
                height: self.height,
            });
        }
        Ok(position.y as usize * self.width as usize + position.x as usize)
    }

    /// Cell kind at `position`, failing with `OutOfBounds` outside the grid.
    pub fn cell_at(&self, position: Position) -> Result<Cell, GridError> {
        self.index(position).map(|index| self.cells[index])
    }

    /// Like [`Grid::cell_at`] but returns `None` outside the grid.
    pub fn get(&self, position: Position) -> Option<Cell> {
        self.cell_at(position).ok()
    }

    /// Overwrites the cell at `position`. No validation beyond bounds.
    pub fn set_cell_at(&mut self, position: Position, cell: Cell) -> Result<(), GridError> {
        let index = self.index(position)?;
        self.cells[index] = cell;
        Ok(())
    }

    /// Number of the four axis-aligned neighbours that are not walls.
    /// Neighbours outside the grid count as walls.
    pub fn count_open_neighbors(&self, position: Position) -> usize {
        Direction::ALL
            .iter()
            .filter(|&&direction| {
                self.get(position.neighbor(direction))
                    .is_some_and(Cell::is_open)
            })
            .count()
    }

    /// A crossroad has more than two open neighbours.
    pub fn is_crossroad(&self, position: Position) -> bool {
        self.count_open_neighbors(position) > 2
    }

    /// True if `position` is a wall or lies outside the grid.
    pub fn is_blocked(&self, position: Position) -> bool {
        !self.get(position).is_some_and(Cell::is_open)
    }

    /// All positions holding `kind`, in row-major order.
    pub fn positions_of(&self, kind: Cell) -> impl Iterator<Item = Position> + '_ {
        let width = self.width as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, cell)| **cell == kind)
            .map(move |(index, _)| Position::new((index % width) as i32, (index / width) as i32))
    }

    pub fn count(&self, kind: Cell) -> usize {
        self.cells.iter().filter(|cell| **cell == kind).count()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width as usize)
    }
}

impl TryFrom<Vec<Vec<Cell>>> for Grid {
    type Error = GridError;

    fn try_from(rows: Vec<Vec<Cell>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<Grid> for Vec<Vec<Cell>> {
    fn from(grid: Grid) -> Self {
        grid.rows().map(<[Cell]>::to_vec).collect()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for cell in row {
                write!(f, "{}", cell.glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
