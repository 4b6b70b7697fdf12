use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use grid_siege_core::{CellCoord, TowerKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LAYOUT_DOMAIN: &str = "siege";
const LAYOUT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded layout payload.
pub(crate) const LAYOUT_HEADER: &str = "siege:v1";
/// Delimiter used to separate the prefix, grid dimensions, and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of the blocking occupants placed on a board, for single-line
/// clipboard transfer between sessions.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BoardLayout {
    /// Number of cell columns laid out in the grid.
    pub(crate) columns: u32,
    /// Number of cell rows laid out in the grid.
    pub(crate) rows: u32,
    /// Cells holding walls.
    pub(crate) walls: Vec<CellCoord>,
    /// Towers composing the layout.
    pub(crate) towers: Vec<LayoutTower>,
}

/// Tower description captured within a board layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct LayoutTower {
    /// Type of tower represented by the layout entry.
    pub(crate) kind: TowerKind,
    /// Cell the tower occupies.
    pub(crate) cell: CellCoord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializablePayload {
    walls: Vec<CellCoord>,
    towers: Vec<LayoutTower>,
}

impl BoardLayout {
    /// Encodes the layout into a single-line string.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = SerializablePayload {
            walls: self.walls.clone(),
            towers: self.towers.clone(),
        };
        let json = serde_json::to_vec(&payload).expect("board layout serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{LAYOUT_HEADER}:{}x{}:{encoded}", self.columns, self.rows)
    }

    /// Decodes a layout from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutError::MissingSegment("prefix"))?;
        let version = parts.next().ok_or(LayoutError::MissingSegment("version"))?;
        let dimensions = parts
            .next()
            .ok_or(LayoutError::MissingSegment("dimensions"))?;
        let payload = parts.next().ok_or(LayoutError::MissingSegment("payload"))?;

        if domain != LAYOUT_DOMAIN {
            return Err(LayoutError::InvalidPrefix(domain.to_owned()));
        }
        if version != LAYOUT_VERSION {
            return Err(LayoutError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
        let decoded: SerializablePayload = serde_json::from_slice(&bytes)?;

        Ok(Self {
            columns,
            rows,
            walls: decoded.walls,
            towers: decoded.towers,
        })
    }
}

/// Errors that can occur while decoding layout transfer strings.
#[derive(Debug, Error)]
pub(crate) enum LayoutError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout string was empty")]
    EmptyPayload,
    /// A mandatory segment was missing from the encoded layout.
    #[error("layout string is missing the {0} segment")]
    MissingSegment(&'static str),
    /// The encoded layout used an unexpected prefix segment.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded layout used an unsupported version identifier.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded layout.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse layout payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutError> {
    let (columns, rows) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| LayoutError::InvalidDimensions(dimensions.to_owned()))?;

    let columns = columns
        .trim()
        .parse::<u32>()
        .map_err(|_| LayoutError::InvalidDimensions(dimensions.to_owned()))?;
    let rows = rows
        .trim()
        .parse::<u32>()
        .map_err(|_| LayoutError::InvalidDimensions(dimensions.to_owned()))?;

    if columns == 0 || rows == 0 {
        return Err(LayoutError::InvalidDimensions(dimensions.to_owned()));
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_empty_layout() {
        let layout = BoardLayout {
            columns: 12,
            rows: 8,
            walls: Vec::new(),
            towers: Vec::new(),
        };

        let encoded = layout.encode();
        assert!(encoded.starts_with(&format!("{LAYOUT_HEADER}:12x8:")));

        let decoded = BoardLayout::decode(&encoded).expect("layout decodes");
        assert_eq!(layout, decoded);
    }

    #[test]
    fn round_trip_populated_layout() {
        let layout = BoardLayout {
            columns: 20,
            rows: 15,
            walls: vec![CellCoord::new(3, 3), CellCoord::new(4, 3)],
            towers: vec![
                LayoutTower {
                    kind: TowerKind::Laser,
                    cell: CellCoord::new(5, 7),
                },
                LayoutTower {
                    kind: TowerKind::Mortar,
                    cell: CellCoord::new(12, 4),
                },
            ],
        };

        let encoded = layout.encode();
        assert!(encoded.starts_with(&format!("{LAYOUT_HEADER}:20x15:")));

        let decoded = BoardLayout::decode(&encoded).expect("layout decodes");
        assert_eq!(layout, decoded);
    }

    #[test]
    fn rejects_foreign_prefixes_and_zero_dimensions() {
        assert!(matches!(
            BoardLayout::decode("castle:v1:3x3:e30"),
            Err(LayoutError::InvalidPrefix(_))
        ));
        assert!(matches!(
            BoardLayout::decode("siege:v2:3x3:e30"),
            Err(LayoutError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            BoardLayout::decode("siege:v1:0x3:e30"),
            Err(LayoutError::InvalidDimensions(_))
        ));
        assert!(matches!(
            BoardLayout::decode("   "),
            Err(LayoutError::EmptyPayload)
        ));
        assert!(matches!(
            BoardLayout::decode("siege:v1:3x3:!!!"),
            Err(LayoutError::InvalidEncoding(_))
        ));
    }
}
