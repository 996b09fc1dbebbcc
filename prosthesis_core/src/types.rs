//! Small value types shared by the driver, tracker and orchestrator.

/// Direction of travel. Opening moves toward `min`, closing toward `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Open,
    Close,
}

impl Direction {
    /// Level of the driver's direction-phase output for this direction.
    #[inline]
    pub const fn phase_level(self) -> bool {
        matches!(self, Direction::Close)
    }

    #[inline]
    pub const fn from_phase_level(high: bool) -> Self {
        if high {
            Direction::Close
        } else {
            Direction::Open
        }
    }
}

/// Closed interval of valid encoder positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TravelLimits {
    /// Fully open.
    pub min: u16,
    /// Fully closed.
    pub max: u16,
}

impl TravelLimits {
    pub const fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn clamp(&self, p: u16) -> u16 {
        p.clamp(self.min, self.max)
    }

    /// Midpoint of the travel range, rounded down.
    #[inline]
    pub const fn midpoint(&self) -> u16 {
        ((self.min as u32 + self.max as u32) / 2) as u16
    }

    /// The limit reached when travelling in `direction`.
    #[inline]
    pub const fn limit_for(&self, direction: Direction) -> u16 {
        match direction {
            Direction::Open => self.min,
            Direction::Close => self.max,
        }
    }
}

impl Default for TravelLimits {
    fn default() -> Self {
        Self { min: 0, max: 4230 }
    }
}

/// Snapshot of the motor drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveState {
    pub direction: Direction,
    pub duty: u8,
    pub sleeping: bool,
    /// Only `Some` while `seeking`.
    pub target: Option<u16>,
    pub seeking: bool,
}

/// What the orchestrator asked the motor to do on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorCommand {
    Open,
    Close,
    Hold,
}
