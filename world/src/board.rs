//! Tile graph and multi-source path solver backing the world crate.

use std::collections::VecDeque;

use glam::Vec2;
use grid_siege_core::{
    CellCoord, Direction, EditRejection, OccupantKind, PathFieldView, TowerKind, UNREACHABLE,
};

/// Expansion order used by parity-true cells.
const NORTH_FIRST: [Direction; 4] = [
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
];

/// Expansion order used by parity-false cells.
const WEST_FIRST: [Direction; 4] = [
    Direction::West,
    Direction::East,
    Direction::South,
    Direction::North,
];

/// Fixed-size tile grid carrying per-cell occupants and pathfinding state.
///
/// Cells live in a flat row-major arena; neighbor links are stored as arena
/// indices, established once during construction and immutable afterwards.
/// All path state is rewritten wholesale by [`Board::find_paths`], which is
/// only ever invoked from the edit operations below so the field observable
/// through [`Board::field_view`] is always the result of a complete solve.
#[derive(Debug)]
pub(crate) struct Board {
    columns: u32,
    rows: u32,
    neighbors: Vec<[Option<u32>; 4]>,
    is_alternative: Vec<bool>,
    occupants: Vec<OccupantKind>,
    distances: Vec<u32>,
    next_hops: Vec<Option<u32>>,
    exit_points: Vec<Vec2>,
    path_directions: Vec<Direction>,
    spawn_points: Vec<u32>,
    frontier: VecDeque<u32>,
}

impl Board {
    /// Builds a board with the provided dimensions, linking each cell to its
    /// west and south neighbor as it is created.
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        let cell_count = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        let mut neighbors: Vec<[Option<u32>; 4]> = Vec::with_capacity(cell_count);
        let mut is_alternative = Vec::with_capacity(cell_count);

        for row in 0..rows {
            for column in 0..columns {
                let index = (row * columns + column) as usize;
                neighbors.push([None; 4]);
                if column > 0 {
                    neighbors[index][Direction::West.ordinal()] = Some(index as u32 - 1);
                    neighbors[index - 1][Direction::East.ordinal()] = Some(index as u32);
                }
                if row > 0 {
                    let south = index - columns as usize;
                    neighbors[index][Direction::South.ordinal()] = Some(south as u32);
                    neighbors[south][Direction::North.ordinal()] = Some(index as u32);
                }
                let mut alternative = (column & 1) == 0;
                if (row & 1) == 0 {
                    alternative = !alternative;
                }
                is_alternative.push(alternative);
            }
        }

        let mut board = Self {
            columns,
            rows,
            neighbors,
            is_alternative,
            occupants: vec![OccupantKind::Empty; cell_count],
            distances: vec![UNREACHABLE; cell_count],
            next_hops: vec![None; cell_count],
            exit_points: vec![Vec2::ZERO; cell_count],
            path_directions: vec![Direction::North; cell_count],
            spawn_points: Vec::new(),
            frontier: VecDeque::new(),
        };
        board.reset_default_markers();
        board
    }

    /// Empties every cell, then places the default destination at the middle
    /// tile and the default spawn point at tile zero.
    fn reset_default_markers(&mut self) {
        self.occupants.fill(OccupantKind::Empty);
        self.spawn_points.clear();

        let cell_count = self.occupants.len();
        if cell_count >= 2 {
            self.occupants[cell_count / 2] = OccupantKind::Destination;
            self.occupants[0] = OccupantKind::SpawnPoint;
            self.spawn_points.push(0);
        }
        let _ = self.find_paths();
    }

    /// Number of columns in the grid.
    pub(crate) const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    pub(crate) const fn rows(&self) -> u32 {
        self.rows
    }

    /// Flat arena index of the provided cell, if it lies within the grid.
    pub(crate) fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    /// Coordinate of the cell at the provided arena index.
    pub(crate) fn cell(&self, index: usize) -> CellCoord {
        let width = self.columns.max(1) as usize;
        CellCoord::new((index % width) as u32, (index / width) as u32)
    }

    /// World-space center of the cell at the provided arena index.
    pub(crate) fn center(&self, index: usize) -> Vec2 {
        let width = self.columns.max(1) as usize;
        Vec2::new(
            (index % width) as f32 - (self.columns.saturating_sub(1)) as f32 * 0.5,
            (index / width) as f32 - (self.rows.saturating_sub(1)) as f32 * 0.5,
        )
    }

    /// Occupant of the provided cell, if it lies within the grid.
    pub(crate) fn occupant(&self, cell: CellCoord) -> Option<OccupantKind> {
        self.index(cell).map(|index| self.occupants[index])
    }

    /// Cells currently holding spawn points, in registration order.
    pub(crate) fn spawn_points(&self) -> Vec<CellCoord> {
        self.spawn_points
            .iter()
            .map(|&index| self.cell(index as usize))
            .collect()
    }

    /// Cells currently holding towers, in arena order.
    pub(crate) fn towers(&self) -> impl Iterator<Item = (CellCoord, TowerKind, Vec2)> + '_ {
        self.occupants
            .iter()
            .enumerate()
            .filter_map(|(index, occupant)| match occupant {
                OccupantKind::Tower(kind) => Some((self.cell(index), *kind, self.center(index))),
                _ => None,
            })
    }

    /// Resolves a world-space point to the cell containing it.
    pub(crate) fn cell_at_point(&self, point: Vec2) -> Option<CellCoord> {
        let column = (point.x + self.columns as f32 * 0.5).floor();
        let row = (point.y + self.rows as f32 * 0.5).floor();
        if column < 0.0 || row < 0.0 || column >= self.columns as f32 || row >= self.rows as f32 {
            return None;
        }
        Some(CellCoord::new(column as u32, row as u32))
    }

    /// Borrowed view over the dense pathfinding state.
    pub(crate) fn field_view(&self) -> PathFieldView<'_> {
        PathFieldView::new(
            self.columns,
            self.rows,
            &self.distances,
            &self.next_hops,
            &self.exit_points,
            &self.path_directions,
        )
    }

    /// Recomputes the whole path field from scratch.
    ///
    /// Seeds a FIFO frontier with every destination cell in arena order, then
    /// grows the field one hop at a time. Parity-true cells expand north,
    /// south, east, west; parity-false cells expand west, east, south, north.
    /// The order never changes hop distances, but it decides which neighbor
    /// claims a contested cell first and therefore which shape the walked
    /// paths take, so it must stay stable.
    ///
    /// Returns `false` when no destinations exist or when some cell ends up
    /// without a route. Blocking cells receive route fields too (see
    /// [`Board::grow_path`]), so only a cell sealed off on all four sides
    /// fails the check.
    pub(crate) fn find_paths(&mut self) -> bool {
        self.frontier.clear();
        for index in 0..self.occupants.len() {
            if self.occupants[index] == OccupantKind::Destination {
                self.distances[index] = 0;
                self.next_hops[index] = None;
                self.exit_points[index] = self.center(index);
                self.frontier.push_back(index as u32);
            } else {
                self.distances[index] = UNREACHABLE;
                self.next_hops[index] = None;
            }
        }

        if self.frontier.is_empty() {
            return false;
        }

        while let Some(index) = self.frontier.pop_front() {
            let index = index as usize;
            let order = if self.is_alternative[index] {
                NORTH_FIRST
            } else {
                WEST_FIRST
            };
            for toward in order {
                self.grow_path(index, toward);
            }
        }

        self.distances.iter().all(|&distance| distance != UNREACHABLE)
    }

    /// Attempts to extend the path from `index` into its neighbor `toward`.
    ///
    /// The neighbor's path direction points back into `index`, i.e. the way a
    /// mover standing on the neighbor must travel to get one hop closer to a
    /// destination, and its exit point sits on the edge shared with `index`.
    ///
    /// Blocking neighbors get their route fields written but never join the
    /// frontier: a creep that committed to entering a cell before it was
    /// built on still finds a hop there and walks through.
    fn grow_path(&mut self, index: usize, toward: Direction) {
        let Some(neighbor) = self.neighbors[index][toward.ordinal()] else {
            return;
        };
        let neighbor = neighbor as usize;
        if self.distances[neighbor] != UNREACHABLE {
            return;
        }

        let entry = toward.opposite();
        self.distances[neighbor] = self.distances[index] + 1;
        self.next_hops[neighbor] = Some(index as u32);
        self.path_directions[neighbor] = entry;
        self.exit_points[neighbor] = self.center(neighbor) + entry.half_vector();
        if self.occupants[neighbor].blocks_path() {
            return;
        }
        self.frontier.push_back(neighbor as u32);
    }

    /// Toggles a wall on the provided cell.
    ///
    /// Returns the new occupant when the edit stuck, `Ok(None)` when the cell
    /// was out of range or held an untoggleable occupant, and the rejection
    /// reason after a rollback.
    pub(crate) fn toggle_wall(
        &mut self,
        cell: CellCoord,
    ) -> Result<Option<OccupantKind>, EditRejection> {
        let Some(index) = self.index(cell) else {
            return Ok(None);
        };
        match self.occupants[index] {
            OccupantKind::Wall => {
                self.occupants[index] = OccupantKind::Empty;
                let _ = self.find_paths();
                Ok(Some(OccupantKind::Empty))
            }
            OccupantKind::Empty => {
                self.apply_blocking_edit(index, OccupantKind::Wall)
            }
            _ => Ok(None),
        }
    }

    /// Toggles or replaces a tower on the provided cell.
    ///
    /// Replacing a tower with a different kind, or a wall with a tower, swaps
    /// one blocker for another in a single edit; the field is untouched and
    /// no transient Empty state is ever observable.
    pub(crate) fn toggle_tower(
        &mut self,
        cell: CellCoord,
        kind: TowerKind,
    ) -> Result<Option<OccupantKind>, EditRejection> {
        let Some(index) = self.index(cell) else {
            return Ok(None);
        };
        match self.occupants[index] {
            OccupantKind::Tower(existing) if existing == kind => {
                self.occupants[index] = OccupantKind::Empty;
                let _ = self.find_paths();
                Ok(Some(OccupantKind::Empty))
            }
            OccupantKind::Tower(_) | OccupantKind::Wall => {
                self.occupants[index] = OccupantKind::Tower(kind);
                Ok(Some(OccupantKind::Tower(kind)))
            }
            OccupantKind::Empty => self.apply_blocking_edit(index, OccupantKind::Tower(kind)),
            _ => Ok(None),
        }
    }

    /// Toggles a destination marker on the provided cell.
    pub(crate) fn toggle_destination(
        &mut self,
        cell: CellCoord,
    ) -> Result<Option<OccupantKind>, EditRejection> {
        let Some(index) = self.index(cell) else {
            return Ok(None);
        };
        match self.occupants[index] {
            OccupantKind::Destination => {
                self.occupants[index] = OccupantKind::Empty;
                if self.find_paths() {
                    Ok(Some(OccupantKind::Empty))
                } else {
                    self.occupants[index] = OccupantKind::Destination;
                    let _ = self.find_paths();
                    Err(EditRejection::DisconnectsField)
                }
            }
            OccupantKind::Empty => {
                self.occupants[index] = OccupantKind::Destination;
                let _ = self.find_paths();
                Ok(Some(OccupantKind::Destination))
            }
            _ => Ok(None),
        }
    }

    /// Toggles a spawn point marker on the provided cell.
    ///
    /// Spawn points never block movement, so the field is left untouched;
    /// removing the last registered spawn point is rejected.
    pub(crate) fn toggle_spawn_point(
        &mut self,
        cell: CellCoord,
    ) -> Result<Option<OccupantKind>, EditRejection> {
        let Some(index) = self.index(cell) else {
            return Ok(None);
        };
        match self.occupants[index] {
            OccupantKind::SpawnPoint => {
                if self.spawn_points.len() <= 1 {
                    return Err(EditRejection::LastSpawnPoint);
                }
                self.spawn_points.retain(|&point| point != index as u32);
                self.occupants[index] = OccupantKind::Empty;
                Ok(Some(OccupantKind::Empty))
            }
            OccupantKind::Empty => {
                self.occupants[index] = OccupantKind::SpawnPoint;
                self.spawn_points.push(index as u32);
                Ok(Some(OccupantKind::SpawnPoint))
            }
            _ => Ok(None),
        }
    }

    /// Places a blocking occupant on an empty cell, validating the solve and
    /// rolling the cell back when the edit disconnects the field.
    fn apply_blocking_edit(
        &mut self,
        index: usize,
        occupant: OccupantKind,
    ) -> Result<Option<OccupantKind>, EditRejection> {
        self.occupants[index] = occupant;
        if self.find_paths() {
            Ok(Some(occupant))
        } else {
            self.occupants[index] = OccupantKind::Empty;
            let _ = self.find_paths();
            Err(EditRejection::DisconnectsField)
        }
    }
}
