#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting creep spawn
//! commands on a fixed cadence with seeded stat variation.

use std::time::Duration;

use grid_siege_core::{CellCoord, Command, CreepStats, Event};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Inclusive range a stat is uniformly sampled from per spawned creep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatRange {
    min: f32,
    max: f32,
}

impl FloatRange {
    /// Creates a range spanning `min..=max`.
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        debug_assert!(min <= max, "inverted stat range");
        Self { min, max }
    }

    /// Creates a degenerate range that always yields `value`.
    #[must_use]
    pub const fn fixed(value: f32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    fn sample(&self, rng: &mut ChaCha8Rng) -> f32 {
        if self.min < self.max {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }
}

/// Stat ranges rolled for every spawned creep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatProfile {
    /// Base linear speed in cells per second.
    pub speed: FloatRange,
    /// Fixed lateral displacement from the path centerline.
    pub path_offset: FloatRange,
    /// Starting health.
    pub health: FloatRange,
}

impl Default for StatProfile {
    fn default() -> Self {
        Self {
            speed: FloatRange::fixed(1.0),
            path_offset: FloatRange::new(-0.4, 0.4),
            health: FloatRange::fixed(100.0),
        }
    }
}

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
    rng_seed: u64,
    profile: StatProfile,
}

impl Config {
    /// Creates a new configuration using the provided cadence, seed, and
    /// stat profile.
    #[must_use]
    pub const fn new(spawn_interval: Duration, rng_seed: u64, profile: StatProfile) -> Self {
        Self {
            spawn_interval,
            rng_seed,
            profile,
        }
    }
}

/// Pure system that deterministically emits creep spawn commands.
#[derive(Debug)]
pub struct Spawning {
    spawn_interval: Duration,
    accumulator: Duration,
    rng: ChaCha8Rng,
    profile: StatProfile,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            spawn_interval: config.spawn_interval,
            accumulator: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            profile: config.profile,
        }
    }

    /// Consumes events and the registered spawn points to emit spawn
    /// commands, one per elapsed cadence interval.
    pub fn handle(&mut self, events: &[Event], spawners: &[CellCoord], out: &mut Vec<Command>) {
        if self.spawn_interval.is_zero() || spawners.is_empty() {
            return;
        }

        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }
        if accumulated.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        while self.accumulator >= self.spawn_interval {
            self.accumulator -= self.spawn_interval;
            let cell = self.select_spawner(spawners);
            let stats = self.roll_stats();
            out.push(Command::SpawnCreep { cell, stats });
        }
    }

    fn select_spawner(&mut self, spawners: &[CellCoord]) -> CellCoord {
        debug_assert!(!spawners.is_empty(), "select_spawner requires spawners");
        spawners[self.rng.gen_range(0..spawners.len())]
    }

    fn roll_stats(&mut self) -> CreepStats {
        CreepStats {
            speed: self.profile.speed.sample(&mut self.rng),
            path_offset: self.profile.path_offset.sample(&mut self.rng),
            health: self.profile.health.sample(&mut self.rng),
        }
    }
}
