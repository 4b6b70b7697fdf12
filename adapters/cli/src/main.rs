#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless Grid Siege sessions.

mod layout;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use grid_siege_core::{CellCoord, Command, Event, OccupantKind};
use grid_siege_system_locomotion::Locomotion;
use grid_siege_system_spawning::{Config as SpawnConfig, Spawning, StatProfile};
use grid_siege_system_targeting::Targeting;
use grid_siege_world::{self as world, query, World};

use crate::layout::{BoardLayout, LayoutTower};

/// Command-line arguments accepted by the Grid Siege binary.
#[derive(Clone, Debug, Parser)]
#[command(name = "grid-siege", about = "Headless Grid Siege simulation")]
struct Args {
    /// Number of cell columns laid out in the grid.
    #[arg(long, default_value_t = 11)]
    columns: u32,
    /// Number of cell rows laid out in the grid.
    #[arg(long, default_value_t = 11)]
    rows: u32,
    /// Simulated seconds to run before reporting.
    #[arg(long, default_value_t = 30.0)]
    seconds: f32,
    /// Fixed tick length in milliseconds.
    #[arg(long, default_value_t = 100)]
    step_ms: u64,
    /// Seed shared by the spawner and the wall scatter.
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Milliseconds between creep spawns.
    #[arg(long, default_value_t = 1_000)]
    spawn_interval_ms: u64,
    /// Encoded board layout to load instead of the default board.
    #[arg(long)]
    layout: Option<String>,
    /// Print the encoded layout of the loaded board and exit.
    #[arg(long, default_value_t = false)]
    export_layout: bool,
    /// Number of random wall edits attempted before the run starts.
    #[arg(long, default_value_t = 6)]
    scatter_walls: u32,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut session = Session::new(&args).context("could not start the session")?;
    println!("{}", query::welcome_banner(&session.world));

    if args.export_layout {
        println!("{}", session.export_layout().encode());
        return Ok(());
    }

    session.scatter_walls(args.scatter_walls, args.seed);

    let dt = Duration::from_millis(args.step_ms.max(1));
    let tick_count = (args.seconds.max(0.0) * 1_000.0 / args.step_ms.max(1) as f32).ceil() as u64;
    let mut outcome = Outcome::Holding;
    let mut ticks_run = 0;
    for _ in 0..tick_count {
        ticks_run += 1;
        outcome = session.tick(dt);
        if outcome == Outcome::Overrun {
            break;
        }
    }

    let tally = &session.tally;
    println!(
        "simulated {ticks_run} ticks ({:.1}s of game time)",
        ticks_run as f32 * dt.as_secs_f32()
    );
    println!(
        "creeps spawned: {}, killed: {}, leaked: {}",
        tally.spawned, tally.killed, tally.leaked
    );
    if tally.rejected_edits > 0 {
        println!("rejected edits: {}", tally.rejected_edits);
    }
    println!("lives left: {}", query::lives(&session.world));
    if outcome == Outcome::Overrun {
        println!("the defense was overrun");
    }
    Ok(())
}

/// Result of advancing the session by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    /// The defense still has lives left.
    Holding,
    /// Every life is gone; the session is over.
    Overrun,
}

/// Running totals accumulated from world events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Tally {
    spawned: u32,
    killed: u32,
    leaked: u32,
    rejected_edits: u32,
}

/// Owns the world and the pure systems, and drives them through the
/// documented tick contract: pending edits resolve first, then time
/// advances, then spawning, locomotion, and finally targeting against
/// post-move creep positions.
struct Session {
    world: World,
    spawning: Spawning,
    locomotion: Locomotion,
    targeting: Targeting,
    pending_edits: Vec<Command>,
    events: Vec<Event>,
    tally: Tally,
}

impl Session {
    fn new(args: &Args) -> Result<Self, layout::LayoutError> {
        let mut session = Self {
            world: World::new(),
            spawning: Spawning::new(SpawnConfig::new(
                Duration::from_millis(args.spawn_interval_ms),
                args.seed,
                StatProfile::default(),
            )),
            locomotion: Locomotion::default(),
            targeting: Targeting::new(),
            pending_edits: Vec::new(),
            events: Vec::new(),
            tally: Tally::default(),
        };

        let mut events = Vec::new();
        match args.layout.as_deref() {
            Some(encoded) => {
                let board = BoardLayout::decode(encoded)?;
                world::apply(
                    &mut session.world,
                    Command::ConfigureBoard {
                        columns: board.columns,
                        rows: board.rows,
                    },
                    &mut events,
                );
                for cell in board.walls {
                    world::apply(&mut session.world, Command::ToggleWall { cell }, &mut events);
                }
                for tower in board.towers {
                    world::apply(
                        &mut session.world,
                        Command::ToggleTower {
                            cell: tower.cell,
                            kind: tower.kind,
                        },
                        &mut events,
                    );
                }
            }
            None => {
                world::apply(
                    &mut session.world,
                    Command::ConfigureBoard {
                        columns: args.columns,
                        rows: args.rows,
                    },
                    &mut events,
                );
            }
        }
        session.count_events(&events);
        Ok(session)
    }

    /// Queues random wall edits; they resolve at the next tick boundary.
    fn scatter_walls(&mut self, count: u32, seed: u64) {
        let (columns, rows) = query::board_dimensions(&self.world);
        if columns == 0 || rows == 0 {
            return;
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..count {
            let cell = CellCoord::new(rng.gen_range(0..columns), rng.gen_range(0..rows));
            self.pending_edits.push(Command::ToggleWall { cell });
        }
    }

    fn tick(&mut self, dt: Duration) -> Outcome {
        self.events.clear();
        let mut commands = Vec::new();

        for command in self.pending_edits.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
        world::apply(&mut self.world, Command::Tick { dt }, &mut self.events);

        let spawners = query::spawn_points(&self.world);
        self.spawning.handle(&self.events, &spawners, &mut commands);
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }

        {
            let field = query::path_field(&self.world);
            self.locomotion.handle(&self.events, &field, &mut commands);
        }
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }

        let towers = query::tower_view(&self.world);
        let creeps = self.locomotion.creep_view();
        self.targeting.handle(&self.events, &towers, &creeps, &mut commands);
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
        self.locomotion.retire(&self.events);

        let events = std::mem::take(&mut self.events);
        self.count_events(&events);
        self.events = events;

        if query::lives(&self.world) == 0 {
            Outcome::Overrun
        } else {
            Outcome::Holding
        }
    }

    fn count_events(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::CreepSpawned { .. } => self.tally.spawned += 1,
                Event::CreepKilled { .. } => self.tally.killed += 1,
                Event::DestinationReached { .. } => self.tally.leaked += 1,
                Event::EditRejected { .. } => self.tally.rejected_edits += 1,
                _ => {}
            }
        }
    }

    /// Captures the blocking occupants of the current board.
    fn export_layout(&self) -> BoardLayout {
        let (columns, rows) = query::board_dimensions(&self.world);
        let mut walls = Vec::new();
        let mut towers = Vec::new();
        for row in 0..rows {
            for column in 0..columns {
                let cell = CellCoord::new(column, row);
                match query::occupant(&self.world, cell) {
                    Some(OccupantKind::Wall) => walls.push(cell),
                    Some(OccupantKind::Tower(kind)) => towers.push(LayoutTower { kind, cell }),
                    _ => {}
                }
            }
        }
        BoardLayout {
            columns,
            rows,
            walls,
            towers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_siege_core::TowerKind;

    fn args() -> Args {
        Args {
            columns: 7,
            rows: 7,
            seconds: 10.0,
            step_ms: 100,
            seed: 7,
            spawn_interval_ms: 1_000,
            layout: None,
            export_layout: false,
            scatter_walls: 4,
        }
    }

    fn run(session: &mut Session, ticks: u32, dt: Duration) -> Outcome {
        let mut outcome = Outcome::Holding;
        for _ in 0..ticks {
            outcome = session.tick(dt);
            if outcome == Outcome::Overrun {
                break;
            }
        }
        outcome
    }

    #[test]
    fn sessions_with_the_same_seed_are_identical() {
        let arguments = args();
        let dt = Duration::from_millis(100);

        let mut first = Session::new(&arguments).unwrap();
        first.scatter_walls(arguments.scatter_walls, arguments.seed);
        let _ = run(&mut first, 100, dt);

        let mut second = Session::new(&arguments).unwrap();
        second.scatter_walls(arguments.scatter_walls, arguments.seed);
        let _ = run(&mut second, 100, dt);

        assert_eq!(first.tally, second.tally);
        assert_eq!(query::lives(&first.world), query::lives(&second.world));
    }

    #[test]
    fn an_undefended_board_is_eventually_overrun() {
        let mut arguments = args();
        arguments.columns = 5;
        arguments.rows = 5;
        arguments.spawn_interval_ms = 500;
        let mut session = Session::new(&arguments).unwrap();

        let outcome = run(&mut session, 400, Duration::from_millis(100));

        assert_eq!(outcome, Outcome::Overrun);
        assert_eq!(query::lives(&session.world), 0);
        assert!(session.tally.leaked >= 10);
    }

    #[test]
    fn layouts_round_trip_through_a_session() {
        let reference = BoardLayout {
            columns: 9,
            rows: 9,
            walls: vec![CellCoord::new(1, 1), CellCoord::new(2, 1)],
            towers: vec![LayoutTower {
                kind: TowerKind::Laser,
                cell: CellCoord::new(3, 5),
            }],
        };
        let mut arguments = args();
        arguments.layout = Some(reference.encode());

        let session = Session::new(&arguments).unwrap();
        assert_eq!(session.tally.rejected_edits, 0);
        assert_eq!(session.export_layout(), reference);
    }

    /// Ticks a session for a fixed stretch of time, overrun or not, so two
    /// runs stay comparable tally for tally.
    fn run_out_the_clock(session: &mut Session, ticks: u32, dt: Duration) {
        for _ in 0..ticks {
            let _ = session.tick(dt);
        }
    }

    #[test]
    fn towers_thin_the_creep_wave() {
        let mut arguments = args();
        arguments.spawn_interval_ms = 800;
        let mut defended = Session::new(&arguments).unwrap();
        // Ring the default center destination with mortars; their shells
        // converge on the leading creep.
        for cell in [CellCoord::new(2, 3), CellCoord::new(4, 3), CellCoord::new(3, 2)] {
            defended.pending_edits.push(Command::ToggleTower {
                cell,
                kind: TowerKind::Mortar,
            });
        }
        run_out_the_clock(&mut defended, 300, Duration::from_millis(100));

        let mut undefended = Session::new(&arguments).unwrap();
        run_out_the_clock(&mut undefended, 300, Duration::from_millis(100));

        assert!(defended.tally.killed > 0, "mortars never scored a kill");
        assert!(defended.tally.leaked < undefended.tally.leaked);
    }
}
