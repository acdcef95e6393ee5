use std::fmt;

/// Logical maze position. Coordinates outside `0..16` address neighbouring segments.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_local(self) -> bool {
        (0..16).contains(&self.x) && (0..16).contains(&self.y)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Compass direction. North grows `y`, east grows `x`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn turn_right(self) -> Self {
        Self::ALL[usize::from((self.index() + 1) & 3)]
    }

    pub fn turn_left(self) -> Self {
        Self::ALL[usize::from((self.index() + 3) & 3)]
    }

    pub fn reverse(self) -> Self {
        Self::ALL[usize::from((self.index() + 2) & 3)]
    }

    /// `other` as seen by someone facing `self`: 0 ahead, 1 right, 2 behind, 3 left.
    pub fn relative(self, other: Direction) -> u8 {
        (other.index() + 4 - self.index()) & 3
    }

    pub fn dx(self) -> i32 {
        match self {
            Self::East => 1,
            Self::West => -1,
            _ => 0,
        }
    }

    pub fn dy(self) -> i32 {
        match self {
            Self::North => 1,
            Self::South => -1,
            _ => 0,
        }
    }

    /// Moves `forward` cells along this direction and `lateral` cells to its right
    /// (negative goes left).
    pub fn move_by(self, pos: Pos, lateral: i32, forward: i32) -> Pos {
        let right = self.turn_right();
        Pos::new(
            pos.x + self.dx() * forward + right.dx() * lateral,
            pos.y + self.dy() * forward + right.dy() * lateral,
        )
    }

    pub fn advance(self, pos: Pos) -> Pos {
        self.move_by(pos, 0, 1)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turns_cycle() {
        for dir in Direction::ALL {
            assert_eq!(dir.turn_right().turn_left(), dir);
            assert_eq!(dir.reverse().reverse(), dir);
            assert_eq!(dir.turn_right().turn_right(), dir.reverse());
        }
        assert_eq!(Direction::West.turn_right(), Direction::North);
        assert_eq!(Direction::from_index(4), None);
    }

    #[test]
    fn move_by_is_egocentric() {
        let origin = Pos::new(5, 5);
        assert_eq!(Direction::North.move_by(origin, 1, 2), Pos::new(6, 7));
        assert_eq!(Direction::East.move_by(origin, 1, 2), Pos::new(7, 4));
        assert_eq!(Direction::South.move_by(origin, -1, 1), Pos::new(6, 4));
        assert_eq!(Direction::West.advance(origin), Pos::new(4, 5));
    }

    #[test]
    fn relative_facing() {
        assert_eq!(Direction::North.relative(Direction::North), 0);
        assert_eq!(Direction::North.relative(Direction::West), 3);
        assert_eq!(Direction::West.relative(Direction::North), 1);
        assert_eq!(Direction::East.relative(Direction::West), 2);
    }
}
