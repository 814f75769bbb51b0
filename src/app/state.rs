//! Costume state: wing position, laser flag, strobe flag.

/// The two servo set-points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// Wings extended (horizontal).
    Primary,
    /// Wings at rest (vertical).  Matches the physical pose at power-up.
    Secondary,
}

impl Position {
    pub fn other(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
        }
    }
}

/// Primary state of the machine, 1:1 with [`Position`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Stowed,
    Deployed,
}

impl From<Position> for Mode {
    fn from(p: Position) -> Self {
        match p {
            Position::Primary => Self::Deployed,
            Position::Secondary => Self::Stowed,
        }
    }
}

/// Mutable aggregate owned by [`CostumeMachine`](super::machine::CostumeMachine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostumeState {
    pub position: Position,
    pub indicator_on: bool,
    pub strobe_active: bool,
}

impl Default for CostumeState {
    fn default() -> Self {
        Self {
            position: Position::Secondary,
            indicator_on: false,
            strobe_active: false,
        }
    }
}

impl CostumeState {
    pub fn mode(&self) -> Mode {
        self.position.into()
    }
}
