#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic locomotion system that moves creeps along the path field.
//!
//! Each creep walks the next-hop chain one cell at a time. Discrete hops are
//! converted into continuous position and yaw samples, with the per-segment
//! rate chosen so that the linear speed along the traveled curve stays at the
//! creep's base speed through straights, quarter-circle corners, and
//! reversals alike.

use std::f32::consts::PI;

use glam::Vec2;
use grid_siege_core::{
    CellCoord, Command, CreepId, CreepSnapshot, CreepStats, CreepView, Direction, DirectionChange,
    Event, PathFieldView,
};

/// Pure system that reacts to world events and emits locomotion commands.
#[derive(Debug, Default)]
pub struct Locomotion {
    travelers: Vec<Traveler>,
}

impl Locomotion {
    /// Consumes world events and the live path field, advancing every creep
    /// and emitting arrival commands for those that finish their outro.
    pub fn handle(&mut self, events: &[Event], field: &PathFieldView<'_>, out: &mut Vec<Command>) {
        let mut elapsed = 0.0_f32;
        for event in events {
            match event {
                Event::BoardConfigured { .. } => self.travelers.clear(),
                Event::CreepSpawned { creep, cell, stats } => {
                    if let Some(traveler) = Traveler::spawn_on(*creep, *cell, *stats, field) {
                        self.travelers.push(traveler);
                    }
                }
                Event::TimeAdvanced { dt } => elapsed += dt.as_secs_f32(),
                _ => {}
            }
        }

        if elapsed <= 0.0 {
            return;
        }
        self.travelers
            .retain_mut(|traveler| traveler.update(elapsed, field, out));
    }

    /// Drops travelers for creeps the world reports as removed.
    ///
    /// Must run after the arrival and damage commands of the current tick
    /// were applied, so a killed creep stops moving within the same tick.
    pub fn retire(&mut self, events: &[Event]) {
        for event in events {
            let removed = match event {
                Event::CreepKilled { creep } => *creep,
                Event::DestinationReached { creep, .. } => *creep,
                _ => continue,
            };
            self.travelers.retain(|traveler| traveler.id != removed);
        }
    }

    /// Captures a read-only view of every creep in transit.
    #[must_use]
    pub fn creep_view(&self) -> CreepView {
        CreepView::from_snapshots(
            self.travelers
                .iter()
                .map(|traveler| CreepSnapshot {
                    id: traveler.id,
                    position: traveler.position,
                    facing: traveler.facing,
                })
                .collect(),
        )
    }
}

/// Transit state of a single creep between spawn and arrival.
#[derive(Clone, Copy, Debug)]
struct Traveler {
    id: CreepId,
    tile_from: usize,
    tile_to: Option<usize>,
    position_from: Vec2,
    position_to: Vec2,
    direction: Direction,
    direction_change: DirectionChange,
    angle_from: f32,
    angle_to: f32,
    progress: f32,
    progress_factor: f32,
    pivot: Vec2,
    path_offset: f32,
    speed: f32,
    position: Vec2,
    facing: f32,
}

impl Traveler {
    /// Places a fresh traveler on the provided spawn cell.
    ///
    /// Spawning on a path-less cell is a programmer error upstream; the
    /// world refuses to emit such a spawn, so this returns `None` only when
    /// the field shrank between the emission and the handling of the event.
    fn spawn_on(
        id: CreepId,
        cell: CellCoord,
        stats: CreepStats,
        field: &PathFieldView<'_>,
    ) -> Option<Self> {
        let tile_from = field.index(cell)?;
        let tile_to = field.next_hop(tile_from)?;

        let mut traveler = Self {
            id,
            tile_from,
            tile_to: Some(tile_to),
            position_from: Vec2::ZERO,
            position_to: Vec2::ZERO,
            direction: Direction::North,
            direction_change: DirectionChange::None,
            angle_from: 0.0,
            angle_to: 0.0,
            progress: 0.0,
            progress_factor: 0.0,
            pivot: Vec2::ZERO,
            path_offset: stats.path_offset,
            speed: stats.speed,
            position: field.center(tile_from),
            facing: 0.0,
        };
        traveler.prepare_intro(field);
        traveler.facing = traveler.direction.angle();
        Some(traveler)
    }

    /// Advances the traveler by `dt` seconds of simulated time.
    ///
    /// Returns `false` once the outro segment completes; the caller drops
    /// the traveler after pushing the arrival command.
    fn update(&mut self, dt: f32, field: &PathFieldView<'_>, out: &mut Vec<Command>) -> bool {
        self.progress += dt * self.progress_factor;
        while self.progress >= 1.0 {
            if self.tile_to.is_none() {
                out.push(Command::CreepReachedGoal { creep: self.id });
                return false;
            }
            // Normalize leftover progress into seconds, switch segments, and
            // re-scale by the new rate so large ticks stay deterministic.
            self.progress = (self.progress - 1.0) / self.progress_factor;
            self.prepare_next_state(field);
            self.progress *= self.progress_factor;
        }

        if self.direction_change == DirectionChange::None {
            self.position = self.position_from.lerp(self.position_to, self.progress);
        } else {
            self.facing = lerp(self.angle_from, self.angle_to, self.progress);
            self.position = self.pivot;
        }
        true
    }

    fn prepare_next_state(&mut self, field: &PathFieldView<'_>) {
        let Some(next) = self.tile_to else {
            return;
        };
        self.tile_from = next;
        self.tile_to = field.next_hop(self.tile_from);
        self.position_from = self.position_to;
        if self.tile_to.is_none() {
            self.prepare_outro(field);
            return;
        }
        self.position_to = field.exit_point(self.tile_from);
        let entry = field.path_direction(self.tile_from);
        self.direction_change = self.direction.change_to(entry);
        self.direction = entry;
        self.angle_from = self.angle_to;

        match self.direction_change {
            DirectionChange::None => self.prepare_forward(),
            DirectionChange::TurnRight => self.prepare_turn_right(),
            DirectionChange::TurnLeft => self.prepare_turn_left(),
            DirectionChange::TurnAround => self.prepare_turn_around(),
        }
    }

    // The intro runs from the spawn cell's center to its exit point, half a
    // normal step, so its rate is doubled to preserve wall-clock timing.
    fn prepare_intro(&mut self, field: &PathFieldView<'_>) {
        self.position_from = field.center(self.tile_from);
        self.position_to = field.exit_point(self.tile_from);
        self.direction = field.path_direction(self.tile_from);
        self.direction_change = DirectionChange::None;
        self.angle_from = self.direction.angle();
        self.angle_to = self.angle_from;
        self.progress_factor = 2.0 * self.speed;
    }

    // The outro mirrors the intro: a half step from the destination cell's
    // entry edge to its center, after which the traveler is reclaimed.
    fn prepare_outro(&mut self, field: &PathFieldView<'_>) {
        self.position_to = field.center(self.tile_from);
        self.direction_change = DirectionChange::None;
        self.angle_to = self.direction.angle();
        self.facing = self.angle_to;
        self.progress_factor = 2.0 * self.speed;
    }

    fn prepare_forward(&mut self) {
        self.angle_to = self.direction.angle();
        self.facing = self.angle_to;
        self.progress_factor = self.speed;
    }

    // A quarter-circle arc around the corner shared by the two cells. The
    // radius shrinks by the lateral offset on the inside of the bend, so the
    // rate compensates to keep linear speed along the arc constant.
    fn prepare_turn_right(&mut self) {
        self.angle_to = self.angle_from + 90.0;
        self.pivot = self.position_from + self.direction.half_vector();
        self.progress_factor = self.speed / (PI * 0.5 * (0.5 - self.path_offset));
    }

    fn prepare_turn_left(&mut self) {
        self.angle_to = self.angle_from - 90.0;
        self.pivot = self.position_from + self.direction.half_vector();
        self.progress_factor = self.speed / (PI * 0.5 * (0.5 + self.path_offset));
    }

    // A reversal pivots in place on the entry edge. Clamping the radius keeps
    // near-centerline travelers from whipping around a near-zero circle.
    fn prepare_turn_around(&mut self) {
        self.angle_to = self.angle_from + if self.path_offset < 0.0 { 180.0 } else { -180.0 };
        self.pivot = self.position_from;
        self.progress_factor = self.speed / (PI * self.path_offset.abs().max(0.2));
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}
