#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grid Siege engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams
//! and immutable views, and respond exclusively with new command batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Grid Siege: hold the line.";

/// Sentinel hop distance marking a cell the path solver has not reached.
pub const UNREACHABLE: u32 = u32::MAX;

/// Cardinal travel directions, ordered so that `ordinal + 1 (mod 4)` is one
/// clockwise rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward increasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward decreasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in clockwise order, starting at north.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Position of the direction within the clockwise ordering.
    #[must_use]
    pub const fn ordinal(self) -> usize {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Yaw angle of the direction in degrees.
    ///
    /// Angles grow without wrapping so that callers can interpolate across
    /// turns by applying explicit `±90`/`±180` deltas instead of deriving
    /// them from modular subtraction.
    #[must_use]
    pub fn angle(self) -> f32 {
        self.ordinal() as f32 * 90.0
    }

    /// Unit step toward the direction scaled by half a cell width.
    ///
    /// Adding this to a cell center lands on the midpoint of the edge shared
    /// with the neighboring cell in that direction.
    #[must_use]
    pub fn half_vector(self) -> Vec2 {
        match self {
            Self::North => Vec2::new(0.0, 0.5),
            Self::East => Vec2::new(0.5, 0.0),
            Self::South => Vec2::new(0.0, -0.5),
            Self::West => Vec2::new(-0.5, 0.0),
        }
    }

    /// Classifies the rotation required to face `next` when facing `self`.
    #[must_use]
    pub fn change_to(self, next: Self) -> DirectionChange {
        match (4 + next.ordinal() - self.ordinal()) % 4 {
            0 => DirectionChange::None,
            1 => DirectionChange::TurnRight,
            2 => DirectionChange::TurnAround,
            _ => DirectionChange::TurnLeft,
        }
    }
}

/// Rotation classification between two travel directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectionChange {
    /// The directions match; no rotation is required.
    None,
    /// One clockwise quarter turn.
    TurnRight,
    /// One counter-clockwise quarter turn.
    TurnLeft,
    /// A half turn back the way the mover came.
    TurnAround,
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Unique identifier assigned to a creep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreepId(u32);

impl CreepId {
    /// Creates a new creep identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Fixed per-creep locomotion parameters assigned at spawn time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CreepStats {
    /// Linear speed along the traveled path, in tiles per second.
    pub speed: f32,
    /// Perpendicular displacement from the path centerline, fixed for the
    /// creep's lifetime; also varies individual turn radii.
    pub path_offset: f32,
    /// Hit points the creep spawns with.
    pub health: f32,
}

/// Types of towers that can be constructed on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerKind {
    /// Beam tower that damages a locked target continuously.
    Laser,
    /// Lobbing tower that deals burst damage on a cooldown.
    Mortar,
}

impl TowerKind {
    /// Targeting radius measured in tiles from the tower's cell center.
    #[must_use]
    pub const fn range(self) -> f32 {
        match self {
            Self::Laser => 2.5,
            Self::Mortar => 3.5,
        }
    }
}

/// Content placed on a cell; exactly one occupant exists per cell at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OccupantKind {
    /// Nothing occupies the cell.
    Empty,
    /// Creeps exit the board here; seeds the path solver.
    Destination,
    /// Impassable blocker.
    Wall,
    /// Creeps enter the board here.
    SpawnPoint,
    /// Tower of the given kind; impassable like a wall.
    Tower(TowerKind),
}

impl OccupantKind {
    /// Reports whether the occupant blocks the path solver.
    #[must_use]
    pub const fn blocks_path(self) -> bool {
        matches!(self, Self::Wall | Self::Tower(_))
    }
}

/// Reasons an occupant edit may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditRejection {
    /// The edit would leave a non-blocking cell with no route to any
    /// destination.
    DisconnectsField,
    /// The edit would remove the last registered spawn point.
    LastSpawnPoint,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Rebuilds the board with the provided dimensions and default markers.
    ConfigureBoard {
        /// Number of cell columns laid out in the grid.
        columns: u32,
        /// Number of cell rows laid out in the grid.
        rows: u32,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Toggles a wall on the addressed cell.
    ToggleWall {
        /// Cell targeted by the edit.
        cell: CellCoord,
    },
    /// Toggles or replaces a tower on the addressed cell.
    ToggleTower {
        /// Cell targeted by the edit.
        cell: CellCoord,
        /// Kind of tower requested.
        kind: TowerKind,
    },
    /// Toggles a destination marker on the addressed cell.
    ToggleDestination {
        /// Cell targeted by the edit.
        cell: CellCoord,
    },
    /// Toggles a spawn point marker on the addressed cell.
    ToggleSpawnPoint {
        /// Cell targeted by the edit.
        cell: CellCoord,
    },
    /// Requests that a creep enter the board at the provided spawn point.
    SpawnCreep {
        /// Spawn point cell the creep should appear on.
        cell: CellCoord,
        /// Locomotion parameters assigned to the creep.
        stats: CreepStats,
    },
    /// Reports that a creep finished its outro segment at a destination.
    CreepReachedGoal {
        /// Identifier of the arriving creep.
        creep: CreepId,
    },
    /// Applies damage to a creep.
    DamageCreep {
        /// Identifier of the creep taking damage.
        creep: CreepId,
        /// Amount of health removed; never negative.
        amount: f32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the board was rebuilt.
    BoardConfigured {
        /// Number of cell columns in the new grid.
        columns: u32,
        /// Number of cell rows in the new grid.
        rows: u32,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an occupant edit was applied and the field resolved.
    OccupantChanged {
        /// Cell whose occupant changed.
        cell: CellCoord,
        /// Occupant now present on the cell.
        occupant: OccupantKind,
    },
    /// Reports that an occupant edit was rejected and rolled back.
    EditRejected {
        /// Cell targeted by the rejected edit.
        cell: CellCoord,
        /// Specific reason the edit failed.
        reason: EditRejection,
    },
    /// Confirms that a creep entered the board.
    CreepSpawned {
        /// Identifier assigned to the new creep.
        creep: CreepId,
        /// Spawn point cell the creep appeared on.
        cell: CellCoord,
        /// Locomotion parameters assigned to the creep.
        stats: CreepStats,
    },
    /// Reports that a creep's health was depleted.
    CreepKilled {
        /// Identifier of the removed creep.
        creep: CreepId,
    },
    /// Reports that a creep reached a destination and was removed.
    DestinationReached {
        /// Identifier of the arriving creep.
        creep: CreepId,
        /// Lives remaining after the arrival.
        lives_left: u32,
    },
}

/// Read-only view into the dense per-cell pathfinding state.
///
/// Index-based accessors expect indices produced by this view (or by the
/// world's own arena); feeding indices from a differently sized board is a
/// programmer error.
#[derive(Clone, Copy, Debug)]
pub struct PathFieldView<'a> {
    columns: u32,
    rows: u32,
    distances: &'a [u32],
    next_hops: &'a [Option<u32>],
    exit_points: &'a [Vec2],
    path_directions: &'a [Direction],
}

impl<'a> PathFieldView<'a> {
    /// Captures a new view backed by the provided dense slices.
    #[must_use]
    pub fn new(
        columns: u32,
        rows: u32,
        distances: &'a [u32],
        next_hops: &'a [Option<u32>],
        exit_points: &'a [Vec2],
        path_directions: &'a [Direction],
    ) -> Self {
        debug_assert_eq!(distances.len(), next_hops.len());
        debug_assert_eq!(distances.len(), exit_points.len());
        debug_assert_eq!(distances.len(), path_directions.len());
        Self {
            columns,
            rows,
            distances,
            next_hops,
            exit_points,
            path_directions,
        }
    }

    /// Number of columns covered by the field.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows covered by the field.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Flat arena index of the provided cell, if it lies within the field.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    /// Hop distance of the provided cell, if it lies within the field.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> Option<u32> {
        self.index(cell)
            .and_then(|index| self.distances.get(index).copied())
    }

    /// Reports whether the provided cell currently has a route to a
    /// destination.
    #[must_use]
    pub fn has_path(&self, cell: CellCoord) -> bool {
        self.distance(cell)
            .map_or(false, |distance| distance != UNREACHABLE)
    }

    /// Arena index of the neighbor one hop closer to a destination.
    #[must_use]
    pub fn next_hop(&self, index: usize) -> Option<usize> {
        self.next_hops[index].map(|hop| hop as usize)
    }

    /// Point where a mover exits the cell, in world units.
    #[must_use]
    pub fn exit_point(&self, index: usize) -> Vec2 {
        self.exit_points[index]
    }

    /// Orientation a mover uses to enter the next cell on the path.
    #[must_use]
    pub fn path_direction(&self, index: usize) -> Direction {
        self.path_directions[index]
    }

    /// World-space center of the cell at the provided arena index.
    #[must_use]
    pub fn center(&self, index: usize) -> Vec2 {
        let width = self.columns.max(1) as usize;
        let column = (index % width) as f32;
        let row = (index / width) as f32;
        Vec2::new(
            column - (self.columns.saturating_sub(1)) as f32 * 0.5,
            row - (self.rows.saturating_sub(1)) as f32 * 0.5,
        )
    }

    /// Dense hop distances stored in row-major order.
    #[must_use]
    pub fn distances(&self) -> &'a [u32] {
        self.distances
    }

    /// Dense next-hop indices stored in row-major order.
    #[must_use]
    pub fn next_hops(&self) -> &'a [Option<u32>] {
        self.next_hops
    }

    /// Dense exit points stored in row-major order.
    #[must_use]
    pub fn exit_points(&self) -> &'a [Vec2] {
        self.exit_points
    }

    /// Dense path directions stored in row-major order.
    #[must_use]
    pub fn path_directions(&self) -> &'a [Direction] {
        self.path_directions
    }
}

/// Immutable representation of a single creep's transit state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CreepSnapshot {
    /// Unique identifier assigned to the creep.
    pub id: CreepId,
    /// Continuous position sampled at the end of the last tick.
    pub position: Vec2,
    /// Yaw angle in degrees sampled at the end of the last tick.
    pub facing: f32,
}

/// Read-only snapshot describing all creeps in transit.
#[derive(Clone, Debug, Default)]
pub struct CreepView {
    snapshots: Vec<CreepSnapshot>,
}

impl CreepView {
    /// Creates a new creep view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CreepSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured creep snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &CreepSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CreepSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Cell the tower occupies; towers are identified by their cell.
    pub cell: CellCoord,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// World-space center of the tower's cell.
    pub center: Vec2,
}

/// Read-only snapshot describing all towers placed on the board.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.cell);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn direction_change_covers_all_ordered_pairs() {
        for current in Direction::ALL {
            for next in Direction::ALL {
                let change = current.change_to(next);
                let expected = match (4 + next.ordinal() - current.ordinal()) % 4 {
                    0 => DirectionChange::None,
                    1 => DirectionChange::TurnRight,
                    2 => DirectionChange::TurnAround,
                    3 => DirectionChange::TurnLeft,
                    _ => unreachable!(),
                };
                assert_eq!(change, expected, "{current:?} -> {next:?}");
            }
        }
    }

    #[test]
    fn identical_directions_never_turn() {
        for direction in Direction::ALL {
            assert_eq!(direction.change_to(direction), DirectionChange::None);
        }
    }

    #[test]
    fn distinct_directions_always_turn() {
        for current in Direction::ALL {
            for next in Direction::ALL {
                if current != next {
                    assert_ne!(current.change_to(next), DirectionChange::None);
                }
            }
        }
    }

    #[test]
    fn wraparound_pairs_classify_as_quarter_turns() {
        assert_eq!(
            Direction::West.change_to(Direction::North),
            DirectionChange::TurnRight
        );
        assert_eq!(
            Direction::North.change_to(Direction::West),
            DirectionChange::TurnLeft
        );
    }

    #[test]
    fn angles_grow_clockwise_in_quarter_steps() {
        assert_eq!(Direction::North.angle(), 0.0);
        assert_eq!(Direction::East.angle(), 90.0);
        assert_eq!(Direction::South.angle(), 180.0);
        assert_eq!(Direction::West.angle(), 270.0);
    }

    #[test]
    fn half_vectors_of_opposites_cancel() {
        for direction in Direction::ALL {
            let sum = direction.half_vector() + direction.opposite().half_vector();
            assert_eq!(sum, Vec2::ZERO);
        }
    }

    #[test]
    fn half_vectors_have_half_tile_length() {
        for direction in Direction::ALL {
            assert!((direction.half_vector().length() - 0.5).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn blocking_occupants_are_walls_and_towers() {
        assert!(OccupantKind::Wall.blocks_path());
        assert!(OccupantKind::Tower(TowerKind::Laser).blocks_path());
        assert!(OccupantKind::Tower(TowerKind::Mortar).blocks_path());
        assert!(!OccupantKind::Empty.blocks_path());
        assert!(!OccupantKind::Destination.blocks_path());
        assert!(!OccupantKind::SpawnPoint.blocks_path());
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn cell_coord_round_trips_through_bincode() {
        assert_round_trip(&CellCoord::new(5, 7));
    }

    #[test]
    fn occupant_kind_round_trips_through_bincode() {
        assert_round_trip(&OccupantKind::Tower(TowerKind::Mortar));
        assert_round_trip(&OccupantKind::Wall);
    }

    #[test]
    fn path_field_view_bounds_checks_lookups() {
        let distances = vec![0, 1, 1, 2];
        let next_hops = vec![None, Some(0), Some(0), Some(1)];
        let exit_points = vec![Vec2::ZERO; 4];
        let path_directions = vec![Direction::North; 4];
        let view = PathFieldView::new(2, 2, &distances, &next_hops, &exit_points, &path_directions);

        assert_eq!(view.distance(CellCoord::new(1, 1)), Some(2));
        assert_eq!(view.distance(CellCoord::new(2, 0)), None);
        assert_eq!(view.index(CellCoord::new(0, 2)), None);
        assert!(view.has_path(CellCoord::new(0, 1)));
    }

    #[test]
    fn path_field_view_centers_straddle_the_origin() {
        let distances = vec![0; 4];
        let next_hops = vec![None; 4];
        let exit_points = vec![Vec2::ZERO; 4];
        let path_directions = vec![Direction::North; 4];
        let view = PathFieldView::new(2, 2, &distances, &next_hops, &exit_points, &path_directions);

        assert_eq!(view.center(0), Vec2::new(-0.5, -0.5));
        assert_eq!(view.center(3), Vec2::new(0.5, 0.5));
    }

    #[test]
    fn creep_view_orders_snapshots_by_identifier() {
        let view = CreepView::from_snapshots(vec![
            CreepSnapshot {
                id: CreepId::new(4),
                position: Vec2::ZERO,
                facing: 0.0,
            },
            CreepSnapshot {
                id: CreepId::new(1),
                position: Vec2::ONE,
                facing: 90.0,
            },
        ]);
        let ids: Vec<u32> = view.iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(ids, vec![1, 4]);
    }
}
