// The eight compass directions around a starting cell (s):
//
//   8 1 2
//   7 s 3
//   6 5 4
//
// North = 1, Northeast = 2, East = 3, Southeast = 4, South = 5,
// Southwest = 6, West = 7, Northwest = 8. Rows increase southward.
//
// Flux bookkeeping arrays are indexed by "source" 0..=10 where 0 is a
// point source/sink, 1..8 are the compass directions, 9 is the
// floodplain transfer and 10 is the domain boundary.

/// Source index of a point source or sink.
pub const SRC_POINT: usize = 0;
/// Source index of the overland/channel floodplain transfer.
pub const SRC_FLOODPLAIN: usize = 9;
/// Source index of the domain boundary.
pub const SRC_BOUNDARY: usize = 10;
/// Number of source slots (0..=10).
pub const N_SOURCES: usize = 11;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// The four axial directions used for overland cell-to-cell routing.
    pub const AXIAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Compass code 1..=8, which doubles as the source index of this
    /// direction in the 0..=10 flux arrays.
    pub fn code(&self) -> usize {
        match self {
            Direction::North => 1,
            Direction::NorthEast => 2,
            Direction::East => 3,
            Direction::SouthEast => 4,
            Direction::South => 5,
            Direction::SouthWest => 6,
            Direction::West => 7,
            Direction::NorthWest => 8,
        }
    }

    pub fn from_code(code: usize) -> Option<Direction> {
        match code {
            1 => Some(Direction::North),
            2 => Some(Direction::NorthEast),
            3 => Some(Direction::East),
            4 => Some(Direction::SouthEast),
            5 => Some(Direction::South),
            6 => Some(Direction::SouthWest),
            7 => Some(Direction::West),
            8 => Some(Direction::NorthWest),
            _ => None,
        }
    }

    /// (row, col) offset of the neighbor this direction points at.
    pub fn offset(&self) -> (i64, i64) {
        match self {
            Direction::North => (-1, 0),
            Direction::NorthEast => (-1, 1),
            Direction::East => (0, 1),
            Direction::SouthEast => (1, 1),
            Direction::South => (1, 0),
            Direction::SouthWest => (1, -1),
            Direction::West => (0, -1),
            Direction::NorthWest => (-1, -1),
        }
    }

    /// Direction from a cell to a neighbor with the given offsets, or
    /// None if the offsets do not describe one of the 8 neighbors.
    pub fn from_offset(drow: i64, dcol: i64) -> Option<Direction> {
        match (drow, dcol) {
            (-1, 0) => Some(Direction::North),
            (-1, 1) => Some(Direction::NorthEast),
            (0, 1) => Some(Direction::East),
            (1, 1) => Some(Direction::SouthEast),
            (1, 0) => Some(Direction::South),
            (1, -1) => Some(Direction::SouthWest),
            (0, -1) => Some(Direction::West),
            (-1, -1) => Some(Direction::NorthWest),
            _ => None,
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::NorthEast => Direction::SouthWest,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::South => Direction::North,
            Direction::SouthWest => Direction::NorthEast,
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
        }
    }

    pub fn is_diagonal(&self) -> bool {
        matches!(
            self,
            Direction::NorthEast
                | Direction::SouthEast
                | Direction::SouthWest
                | Direction::NorthWest
        )
    }
}
