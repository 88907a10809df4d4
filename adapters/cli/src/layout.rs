use std::{error::Error, fmt, str::FromStr};

use glam::Vec2;
use tower_siege_core::TowerKind;

/// Separates the tower kind from its coordinates.
const KIND_DELIMITER: char = '@';
/// Separates the two coordinates.
const AXIS_DELIMITER: char = ',';

/// Tower requested on the command line as `KIND@X,Y`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TowerPlacement {
    /// Type of tower to build.
    pub(crate) kind: TowerKind,
    /// Centre of the tower in world units.
    pub(crate) position: Vec2,
}

impl FromStr for TowerPlacement {
    type Err = LayoutError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutError::Empty);
        }

        let (kind, coordinates) = trimmed
            .split_once(KIND_DELIMITER)
            .ok_or(LayoutError::MissingPosition)?;
        let kind = parse_kind(kind.trim())?;
        let position = parse_position(coordinates)?;

        Ok(Self { kind, position })
    }
}

/// Errors that can occur while parsing a tower placement argument.
#[derive(Debug, PartialEq)]
pub(crate) enum LayoutError {
    /// The argument was empty or contained only whitespace.
    Empty,
    /// The argument had no `@X,Y` part.
    MissingPosition,
    /// The tower kind is not one of the known kinds.
    UnknownKind(String),
    /// The coordinates could not be parsed as two finite numbers.
    InvalidPosition(String),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "tower placement was empty"),
            Self::MissingPosition => write!(f, "tower placement must look like KIND@X,Y"),
            Self::UnknownKind(kind) => {
                let known: Vec<&str> = TowerKind::ALL.iter().map(|kind| kind.name()).collect();
                write!(
                    f,
                    "unknown tower kind '{kind}', expected one of {}",
                    known.join(", ")
                )
            }
            Self::InvalidPosition(position) => {
                write!(f, "could not parse tower position '{position}'")
            }
        }
    }
}

impl Error for LayoutError {}

fn parse_kind(name: &str) -> Result<TowerKind, LayoutError> {
    TowerKind::ALL
        .into_iter()
        .find(|kind| kind.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| LayoutError::UnknownKind(name.to_owned()))
}

fn parse_position(coordinates: &str) -> Result<Vec2, LayoutError> {
    let invalid = || LayoutError::InvalidPosition(coordinates.to_owned());
    let (x, y) = coordinates.split_once(AXIS_DELIMITER).ok_or_else(invalid)?;
    let x = x.trim().parse::<f32>().map_err(|_| invalid())?;
    let y = y.trim().parse::<f32>().map_err(|_| invalid())?;
    if !x.is_finite() || !y.is_finite() {
        return Err(invalid());
    }
    Ok(Vec2::new(x, y))
}
