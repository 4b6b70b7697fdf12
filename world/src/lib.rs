#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Grid Siege.
//!
//! The world owns the tile graph, its path field, and the creep registry.
//! Every mutation flows through [`apply`]; in particular no other code path
//! may write the per-cell pathfinding state, which is only ever replaced by
//! a complete, validated solve (or a rollback to the previous valid one).

mod board;

use std::collections::BTreeMap;

use grid_siege_core::{
    CellCoord, Command, CreepId, CreepStats, EditRejection, Event, OccupantKind, WELCOME_BANNER,
};

use crate::board::Board;

const DEFAULT_COLUMNS: u32 = 11;
const DEFAULT_ROWS: u32 = 11;
const STARTING_LIVES: u32 = 10;

/// Represents the authoritative Grid Siege world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    board: Board,
    creeps: BTreeMap<CreepId, CreepState>,
    next_creep: u32,
    lives: u32,
}

#[derive(Clone, Copy, Debug)]
struct CreepState {
    stats: CreepStats,
    health: f32,
}

impl World {
    /// Creates a new Grid Siege world ready for simulation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            board: Board::new(DEFAULT_COLUMNS, DEFAULT_ROWS),
            creeps: BTreeMap::new(),
            next_creep: 0,
            lives: STARTING_LIVES,
        }
    }

    fn allocate_creep(&mut self, stats: CreepStats) -> CreepId {
        let creep = CreepId::new(self.next_creep);
        self.next_creep = self.next_creep.wrapping_add(1);
        let _ = self.creeps.insert(
            creep,
            CreepState {
                stats,
                health: stats.health,
            },
        );
        creep
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureBoard { columns, rows } => {
            world.board = Board::new(columns, rows);
            world.creeps.clear();
            world.next_creep = 0;
            world.lives = STARTING_LIVES;
            out_events.push(Event::BoardConfigured { columns, rows });
        }
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::ToggleWall { cell } => {
            report_edit(cell, world.board.toggle_wall(cell), out_events);
        }
        Command::ToggleTower { cell, kind } => {
            report_edit(cell, world.board.toggle_tower(cell, kind), out_events);
        }
        Command::ToggleDestination { cell } => {
            report_edit(cell, world.board.toggle_destination(cell), out_events);
        }
        Command::ToggleSpawnPoint { cell } => {
            report_edit(cell, world.board.toggle_spawn_point(cell), out_events);
        }
        Command::SpawnCreep { cell, stats } => {
            let occupant = world.board.occupant(cell);
            let connected = world.board.field_view().has_path(cell);
            debug_assert!(
                occupant == Some(OccupantKind::SpawnPoint),
                "creep spawn requested on a non-spawn cell"
            );
            debug_assert!(connected, "creep spawn requested on a path-less cell");
            if occupant != Some(OccupantKind::SpawnPoint) || !connected {
                return;
            }
            let creep = world.allocate_creep(stats);
            out_events.push(Event::CreepSpawned { creep, cell, stats });
        }
        Command::CreepReachedGoal { creep } => {
            if world.creeps.remove(&creep).is_some() {
                world.lives = world.lives.saturating_sub(1);
                out_events.push(Event::DestinationReached {
                    creep,
                    lives_left: world.lives,
                });
            }
        }
        Command::DamageCreep { creep, amount } => {
            debug_assert!(amount >= 0.0, "negative damage applied");
            if let Some(state) = world.creeps.get_mut(&creep) {
                state.health -= amount;
                if state.health <= 0.0 {
                    let _ = world.creeps.remove(&creep);
                    out_events.push(Event::CreepKilled { creep });
                }
            }
        }
    }
}

fn report_edit(
    cell: CellCoord,
    outcome: Result<Option<OccupantKind>, EditRejection>,
    out_events: &mut Vec<Event>,
) {
    match outcome {
        Ok(Some(occupant)) => out_events.push(Event::OccupantChanged { cell, occupant }),
        Ok(None) => {}
        Err(reason) => out_events.push(Event::EditRejected { cell, reason }),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use grid_siege_core::{
        CellCoord, CreepId, CreepStats, OccupantKind, PathFieldView, TowerSnapshot, TowerView,
    };

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Dimensions of the board as `(columns, rows)`.
    #[must_use]
    pub fn board_dimensions(world: &World) -> (u32, u32) {
        (world.board.columns(), world.board.rows())
    }

    /// Borrowed view over the dense per-cell pathfinding state.
    #[must_use]
    pub fn path_field(world: &World) -> PathFieldView<'_> {
        world.board.field_view()
    }

    /// Occupant of the provided cell, or `None` when it is out of range.
    #[must_use]
    pub fn occupant(world: &World, cell: CellCoord) -> Option<OccupantKind> {
        world.board.occupant(cell)
    }

    /// Cells currently holding spawn points, in registration order.
    #[must_use]
    pub fn spawn_points(world: &World) -> Vec<CellCoord> {
        world.board.spawn_points()
    }

    /// Captures a read-only view of the towers placed on the board.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(
            world
                .board
                .towers()
                .map(|(cell, kind, center)| TowerSnapshot { cell, kind, center })
                .collect(),
        )
    }

    /// Resolves a world-space point to the cell containing it.
    ///
    /// Used by input handling to pick a cell for editing; a point outside
    /// the grid yields `None` rather than an error.
    #[must_use]
    pub fn cell_at_point(world: &World, point: Vec2) -> Option<CellCoord> {
        world.board.cell_at_point(point)
    }

    /// Lives the defender has left.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Number of creeps currently registered with the world.
    #[must_use]
    pub fn creep_count(world: &World) -> usize {
        world.creeps.len()
    }

    /// Stats the provided creep was spawned with, while it is still alive.
    #[must_use]
    pub fn creep_stats(world: &World, creep: CreepId) -> Option<CreepStats> {
        world.creeps.get(&creep).map(|state| state.stats)
    }

    /// Remaining health of the provided creep, while it is still alive.
    #[must_use]
    pub fn creep_health(world: &World, creep: CreepId) -> Option<f32> {
        world.creeps.get(&creep).map(|state| state.health)
    }
}
