#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower damage from world snapshots.
//!
//! Runs after locomotion within a tick so that range checks observe
//! post-move creep positions, never positions a full tick stale.

use std::collections::BTreeMap;

use glam::Vec2;
use grid_siege_core::{
    CellCoord, Command, CreepId, CreepSnapshot, CreepView, Event, TowerKind, TowerView,
};

const LASER_DAMAGE_PER_SECOND: f32 = 10.0;
const MORTAR_SHELL_DAMAGE: f32 = 25.0;
const MORTAR_SHOTS_PER_SECOND: f32 = 1.0;

/// Tower targeting system that tracks per-tower lock and cooldown state.
#[derive(Debug, Default)]
pub struct Targeting {
    tracks: BTreeMap<CellCoord, TowerTrack>,
}

#[derive(Clone, Copy, Debug, Default)]
struct TowerTrack {
    locked: Option<CreepId>,
    launch_progress: f32,
}

impl Targeting {
    /// Creates a new targeting system with no tracked towers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes events and post-move snapshots to emit damage commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        towers: &TowerView,
        creeps: &CreepView,
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = 0.0_f32;
        for event in events {
            match event {
                Event::BoardConfigured { .. } => self.tracks.clear(),
                Event::TimeAdvanced { dt } => elapsed += dt.as_secs_f32(),
                _ => {}
            }
        }
        self.prune_stale_tracks(towers);
        if elapsed <= 0.0 {
            return;
        }

        for snapshot in towers.iter() {
            let track = self.tracks.entry(snapshot.cell).or_default();
            match snapshot.kind {
                TowerKind::Laser => laser_update(
                    track,
                    snapshot.center,
                    snapshot.kind.range(),
                    creeps,
                    elapsed,
                    out,
                ),
                TowerKind::Mortar => mortar_update(
                    track,
                    snapshot.center,
                    snapshot.kind.range(),
                    creeps,
                    elapsed,
                    out,
                ),
            }
        }
    }

    // Towers are identified by their cell; a demolished or replaced tower
    // must not inherit the previous occupant's lock or cooldown.
    fn prune_stale_tracks(&mut self, towers: &TowerView) {
        let live: Vec<CellCoord> = towers.iter().map(|snapshot| snapshot.cell).collect();
        self.tracks.retain(|cell, _| live.binary_search(cell).is_ok());
    }
}

/// Keeps shooting the locked creep while it stays in range, otherwise
/// acquires the nearest creep and locks on.
fn laser_update(
    track: &mut TowerTrack,
    center: Vec2,
    range: f32,
    creeps: &CreepView,
    elapsed: f32,
    out: &mut Vec<Command>,
) {
    let target = track
        .locked
        .and_then(|locked| {
            creeps
                .iter()
                .find(|creep| creep.id == locked && in_range(center, range, creep))
        })
        .or_else(|| acquire_target(center, range, creeps));

    track.locked = target.map(|creep| creep.id);
    if let Some(creep) = target {
        out.push(Command::DamageCreep {
            creep: creep.id,
            amount: LASER_DAMAGE_PER_SECOND * elapsed,
        });
    }
}

/// Fires one shell per cooldown interval at the nearest creep in range.
///
/// With nothing in range the progress holds just below the firing
/// threshold, so a creep wandering into range draws fire almost instantly.
fn mortar_update(
    track: &mut TowerTrack,
    center: Vec2,
    range: f32,
    creeps: &CreepView,
    elapsed: f32,
    out: &mut Vec<Command>,
) {
    track.launch_progress += MORTAR_SHOTS_PER_SECOND * elapsed;
    while track.launch_progress >= 1.0 {
        if let Some(creep) = acquire_target(center, range, creeps) {
            out.push(Command::DamageCreep {
                creep: creep.id,
                amount: MORTAR_SHELL_DAMAGE,
            });
            track.launch_progress -= 1.0;
        } else {
            track.launch_progress = 0.999;
        }
    }
}

/// Nearest creep within range; ties break toward the lowest identifier
/// because the view iterates in identifier order.
fn acquire_target<'a>(
    center: Vec2,
    range: f32,
    creeps: &'a CreepView,
) -> Option<&'a CreepSnapshot> {
    let mut best: Option<(&CreepSnapshot, f32)> = None;
    for creep in creeps.iter() {
        let distance_squared = center.distance_squared(creep.position);
        if distance_squared > range * range {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance_squared >= best_distance => {}
            _ => best = Some((creep, distance_squared)),
        }
    }
    best.map(|(creep, _)| creep)
}

fn in_range(center: Vec2, range: f32, creep: &CreepSnapshot) -> bool {
    center.distance_squared(creep.position) <= range * range
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_siege_core::TowerSnapshot;
    use std::time::Duration;

    fn time_advanced(millis: u64) -> Event {
        Event::TimeAdvanced {
            dt: Duration::from_millis(millis),
        }
    }

    fn tower(cell: CellCoord, kind: TowerKind, center: Vec2) -> TowerView {
        TowerView::from_snapshots(vec![TowerSnapshot { cell, kind, center }])
    }

    fn creep(id: u32, position: Vec2) -> CreepSnapshot {
        CreepSnapshot {
            id: CreepId::new(id),
            position,
            facing: 0.0,
        }
    }

    #[test]
    fn laser_damage_scales_with_elapsed_time() {
        let mut targeting = Targeting::new();
        let towers = tower(CellCoord::new(2, 2), TowerKind::Laser, Vec2::ZERO);
        let creeps = CreepView::from_snapshots(vec![creep(0, Vec2::new(1.0, 0.0))]);
        let mut out = Vec::new();

        targeting.handle(&[time_advanced(250)], &towers, &creeps, &mut out);
        assert_eq!(
            out,
            vec![Command::DamageCreep {
                creep: CreepId::new(0),
                amount: LASER_DAMAGE_PER_SECOND * 0.25,
            }]
        );
    }

    #[test]
    fn laser_keeps_its_lock_while_the_target_stays_in_range() {
        let mut targeting = Targeting::new();
        let towers = tower(CellCoord::new(2, 2), TowerKind::Laser, Vec2::ZERO);
        let mut out = Vec::new();

        // Lock onto the nearest creep first.
        let creeps = CreepView::from_snapshots(vec![
            creep(0, Vec2::new(2.0, 0.0)),
            creep(1, Vec2::new(1.0, 0.0)),
        ]);
        targeting.handle(&[time_advanced(100)], &towers, &creeps, &mut out);
        assert_eq!(out.len(), 1);
        assert!(matches!(
            out[0],
            Command::DamageCreep { creep, .. } if creep == CreepId::new(1)
        ));

        // The other creep is now closer, but the lock holds.
        out.clear();
        let creeps = CreepView::from_snapshots(vec![
            creep(0, Vec2::new(0.5, 0.0)),
            creep(1, Vec2::new(2.0, 0.0)),
        ]);
        targeting.handle(&[time_advanced(100)], &towers, &creeps, &mut out);
        assert!(matches!(
            out[0],
            Command::DamageCreep { creep, .. } if creep == CreepId::new(1)
        ));

        // Once the locked creep leaves the radius the lock transfers.
        out.clear();
        let creeps = CreepView::from_snapshots(vec![
            creep(0, Vec2::new(0.5, 0.0)),
            creep(1, Vec2::new(5.0, 0.0)),
        ]);
        targeting.handle(&[time_advanced(100)], &towers, &creeps, &mut out);
        assert!(matches!(
            out[0],
            Command::DamageCreep { creep, .. } if creep == CreepId::new(0)
        ));
    }

    #[test]
    fn mortar_fires_on_its_cooldown_cadence() {
        let mut targeting = Targeting::new();
        let towers = tower(CellCoord::new(2, 2), TowerKind::Mortar, Vec2::ZERO);
        let creeps = CreepView::from_snapshots(vec![creep(0, Vec2::new(1.0, 1.0))]);
        let mut out = Vec::new();

        // Half a second of charge: no shell yet.
        targeting.handle(&[time_advanced(500)], &towers, &creeps, &mut out);
        assert!(out.is_empty());

        // The next half second completes the interval.
        targeting.handle(&[time_advanced(500)], &towers, &creeps, &mut out);
        assert_eq!(
            out,
            vec![Command::DamageCreep {
                creep: CreepId::new(0),
                amount: MORTAR_SHELL_DAMAGE,
            }]
        );

        // A large tick drains several intervals in one update.
        out.clear();
        targeting.handle(&[time_advanced(3_000)], &towers, &creeps, &mut out);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn mortar_holds_charge_while_nothing_is_in_range() {
        let mut targeting = Targeting::new();
        let towers = tower(CellCoord::new(2, 2), TowerKind::Mortar, Vec2::ZERO);
        let far = CreepView::from_snapshots(vec![creep(0, Vec2::new(10.0, 0.0))]);
        let mut out = Vec::new();

        targeting.handle(&[time_advanced(5_000)], &towers, &far, &mut out);
        assert!(out.is_empty());

        // The charge held just below the threshold, so a creep entering
        // range is shelled on the very next update.
        let near = CreepView::from_snapshots(vec![creep(0, Vec2::new(1.0, 0.0))]);
        targeting.handle(&[time_advanced(10)], &towers, &near, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn empty_views_emit_nothing() {
        let mut targeting = Targeting::new();
        let mut out = Vec::new();
        targeting.handle(
            &[time_advanced(1_000)],
            &TowerView::default(),
            &CreepView::default(),
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn demolished_towers_lose_their_state() {
        let mut targeting = Targeting::new();
        let towers = tower(CellCoord::new(2, 2), TowerKind::Mortar, Vec2::ZERO);
        let creeps = CreepView::from_snapshots(vec![creep(0, Vec2::new(1.0, 0.0))]);
        let mut out = Vec::new();

        targeting.handle(&[time_advanced(900)], &towers, &creeps, &mut out);
        assert!(out.is_empty());

        // Remove the tower, then rebuild it: the cooldown restarts.
        targeting.handle(&[], &TowerView::default(), &creeps, &mut out);
        targeting.handle(&[time_advanced(900)], &towers, &creeps, &mut out);
        assert!(out.is_empty());
    }
}
