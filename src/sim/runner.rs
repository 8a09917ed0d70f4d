use std::path::PathBuf;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use super::context::TickContext;
use super::system::{SimSystem, TickFrequency};
use crate::flush::flush_to_jsonl;
use crate::model::date::{SEASONS_PER_YEAR, WEEKS_PER_SEASON};
use crate::model::{GameDate, GameState, Season};

/// Configuration for a simulation run.
pub struct SimConfig {
    pub start_year: u32,
    pub num_years: u32,
    pub seed: u64,
    /// If set, flush game state every N years.
    pub flush_interval: Option<u32>,
    /// Directory to write flush checkpoints into.
    pub output_dir: Option<PathBuf>,
}

impl SimConfig {
    pub fn new(start_year: u32, num_years: u32, seed: u64) -> Self {
        Self {
            start_year,
            num_years,
            seed,
            flush_interval: None,
            output_dir: None,
        }
    }
}

/// Returns true if a system with the given frequency should fire at this date.
pub fn should_fire(freq: TickFrequency, date: GameDate) -> bool {
    match freq {
        TickFrequency::Weekly => true,
        TickFrequency::Seasonal => date.is_season_start(),
        TickFrequency::Yearly => date.is_year_start(),
    }
}

/// Set `state.current_date` and call each system whose frequency matches.
///
/// Signal delivery is **single-pass, non-cascading**:
///
/// 1. **Phase 1 (tick):** Each system's `tick()` runs in registration order.
///    All signals emitted during this phase are collected into a shared buffer.
/// 2. **Phase 2 (react):** If any signals were emitted, each system's
///    `handle_signals()` is called with the full signal buffer as `ctx.inbox`.
///    Systems may mutate the state and push new signals during this phase,
///    but those new signals are **not** delivered — they are discarded at the
///    end of the dispatch cycle.
///
/// A signal emitted in Phase 2 therefore never triggers further reactions
/// within the same tick, which keeps each tick's side-effects bounded. If a
/// reaction needs to propagate, it should mutate state that a later tick's
/// Phase 1 will observe (the escalation ladder works exactly this way:
/// penalties land on the loan record and the next seasonal tick sees them).
pub fn dispatch_systems(
    state: &mut GameState,
    systems: &mut [Box<dyn SimSystem>],
    rng: &mut dyn RngCore,
    date: GameDate,
) {
    state.current_date = date;

    // Phase 1: tick systems, collecting signals
    let mut signals = Vec::new();
    for system in systems.iter_mut() {
        if should_fire(system.frequency(), date) {
            let mut ctx = TickContext {
                state,
                rng,
                signals: &mut signals,
                inbox: &[],
            };
            system.tick(&mut ctx);
        }
    }

    // Phase 2: deliver signals for reaction (only if any were emitted)
    if !signals.is_empty() {
        for system in systems.iter_mut() {
            if should_fire(system.frequency(), date) {
                let mut new_signals = Vec::new();
                let mut ctx = TickContext {
                    state,
                    rng,
                    signals: &mut new_signals,
                    inbox: &signals,
                };
                system.handle_signals(&mut ctx);
            }
        }
    }
}

/// Run the simulation for the configured number of years.
///
/// Creates a deterministic RNG from `config.seed`, so the same seed always
/// produces the same run. The loop iterates at the finest granularity needed
/// by any registered system, avoiding wasted cycles when all systems are
/// coarse.
pub fn run(state: &mut GameState, systems: &mut [Box<dyn SimSystem>], config: SimConfig) {
    if systems.is_empty() || config.num_years == 0 {
        return;
    }

    let mut rng = SmallRng::seed_from_u64(config.seed);
    let finest = systems.iter().map(|s| s.frequency()).max().unwrap();

    for year_offset in 0..config.num_years {
        let year = config.start_year + year_offset;
        match finest {
            TickFrequency::Yearly => {
                dispatch_systems(state, systems, &mut rng, GameDate::from_year(year));
            }
            TickFrequency::Seasonal => {
                for season in 0..SEASONS_PER_YEAR {
                    let date = GameDate::new(year, Season::from_index(season), 1);
                    dispatch_systems(state, systems, &mut rng, date);
                }
            }
            TickFrequency::Weekly => {
                for season in 0..SEASONS_PER_YEAR {
                    for week in 1..=WEEKS_PER_SEASON {
                        let date = GameDate::new(year, Season::from_index(season), week);
                        dispatch_systems(state, systems, &mut rng, date);
                    }
                }
            }
        }

        // Flush checkpoint at configured interval
        if let (Some(interval), Some(dir)) = (config.flush_interval, &config.output_dir) {
            let is_last_year = year_offset == config.num_years - 1;
            if is_last_year || (year_offset > 0 && (year_offset + 1) % interval == 0) {
                let checkpoint_dir = dir.join(format!("year_{year:06}"));
                flush_to_jsonl(state, &checkpoint_dir).expect("failed to write flush checkpoint");
            }
        }
    }
}
