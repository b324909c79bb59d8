#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave state machine that paces enemy spawns.
//!
//! Every wave starts in [`WavePhase::Spawning`]. Regular waves emit their
//! spawn requests on a fixed cadence; boss waves emit their single boss the
//! moment they begin. Once every request fired the director waits in
//! [`WavePhase::AwaitingCompletion`] until the last live enemy left play,
//! then rests in [`WavePhase::InterWaveDelay`] before starting the next wave.

use std::time::Duration;

use castle_defence_core::{Command, Event, SpawnKind, SpawnRequest, WaveNumber};
use tracing::info;

const DEFAULT_SPAWN_INTERVAL: Duration = Duration::from_millis(400);
const DEFAULT_INTER_WAVE_DELAY: Duration = Duration::from_millis(200);

/// Configuration parameters required to construct the wave director.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
    inter_wave_delay: Duration,
    first_wave: WaveNumber,
}

impl Config {
    /// Creates a configuration with the provided cadence and pause, starting at wave 1.
    #[must_use]
    pub const fn new(spawn_interval: Duration, inter_wave_delay: Duration) -> Self {
        Self {
            spawn_interval,
            inter_wave_delay,
            first_wave: WaveNumber::FIRST,
        }
    }

    /// Starts the director at `wave` instead of the first wave.
    #[must_use]
    pub const fn with_first_wave(mut self, wave: WaveNumber) -> Self {
        self.first_wave = wave;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SPAWN_INTERVAL, DEFAULT_INTER_WAVE_DELAY)
    }
}

/// Phase of the wave currently in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WavePhase {
    /// Spawn requests are still being issued.
    Spawning,
    /// All requests fired; waiting for the field to clear.
    AwaitingCompletion,
    /// Short pause before the next wave begins.
    InterWaveDelay,
}

/// Progress of the current wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveState {
    /// Number of the wave in progress.
    pub wave: WaveNumber,
    /// Spawn requests the wave issues in total.
    pub total_to_spawn: u32,
    /// Spawn requests issued so far.
    pub spawned: u32,
    /// Time accumulated since the previous spawn request.
    pub elapsed_since_last_spawn: Duration,
    /// Whether the wave consists of a single boss.
    pub is_boss_wave: bool,
}

impl WaveState {
    fn for_wave(wave: WaveNumber) -> Self {
        Self {
            wave,
            total_to_spawn: wave.spawn_count(),
            spawned: 0,
            elapsed_since_last_spawn: Duration::ZERO,
            is_boss_wave: wave.is_boss_wave(),
        }
    }

    fn all_spawned(&self) -> bool {
        self.spawned >= self.total_to_spawn
    }
}

/// Pure system that turns elapsed time into wave and spawn commands.
#[derive(Debug)]
pub struct WaveDirector {
    config: Config,
    state: WaveState,
    phase: WavePhase,
    live_units: u32,
    delay_elapsed: Duration,
    started: bool,
}

impl WaveDirector {
    /// Creates a director that will open with the configured first wave.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: WaveState::for_wave(config.first_wave),
            phase: WavePhase::Spawning,
            live_units: 0,
            delay_elapsed: Duration::ZERO,
            started: false,
        }
    }

    /// Opens the first wave if it has not been opened yet.
    pub fn start(&mut self, out: &mut Vec<Command>) {
        if self.started {
            return;
        }
        self.started = true;
        self.enter_wave(self.config.first_wave, out);
    }

    /// Consumes world events, then advances by the time they report.
    ///
    /// Removals are processed before time so a wave whose last enemy died
    /// this tick can complete within the same tick. A spawn the world
    /// refused counts as removed.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::UnitRemoved { .. } | Event::SpawnRejected { .. } => {
                    self.notify_unit_removed();
                }
                Event::TimeAdvanced { dt } => accumulated = accumulated.saturating_add(*dt),
                _ => {}
            }
        }

        if accumulated.is_zero() && self.started {
            return;
        }
        self.on_tick(accumulated, out);
    }

    /// Advances timers by `dt`, emitting any commands that fall due.
    ///
    /// Time left over after a transition carries into the next phase.
    pub fn on_tick(&mut self, dt: Duration, out: &mut Vec<Command>) {
        self.start(out);

        let mut budget = dt;
        loop {
            match self.phase {
                WavePhase::Spawning => {
                    let due_in = self
                        .config
                        .spawn_interval
                        .saturating_sub(self.state.elapsed_since_last_spawn);
                    if budget < due_in {
                        self.state.elapsed_since_last_spawn += budget;
                        return;
                    }
                    budget -= due_in;
                    self.state.elapsed_since_last_spawn = Duration::ZERO;
                    let ordinal = self.state.spawned;
                    self.request_spawn(SpawnKind::Regular { ordinal }, out);
                    if self.state.all_spawned() {
                        self.phase = WavePhase::AwaitingCompletion;
                    }
                }
                WavePhase::AwaitingCompletion => {
                    if self.live_units > 0 {
                        return;
                    }
                    self.phase = WavePhase::InterWaveDelay;
                    self.delay_elapsed = Duration::ZERO;
                }
                WavePhase::InterWaveDelay => {
                    let due_in = self
                        .config
                        .inter_wave_delay
                        .saturating_sub(self.delay_elapsed);
                    if budget < due_in {
                        self.delay_elapsed += budget;
                        return;
                    }
                    budget -= due_in;
                    let next = self.state.wave.next();
                    self.enter_wave(next, out);
                }
            }
        }
    }

    /// Records that a requested enemy left play or never entered it.
    pub fn notify_unit_removed(&mut self) {
        self.live_units = self.live_units.saturating_sub(1);
    }

    /// Progress of the current wave.
    #[must_use]
    pub fn state(&self) -> &WaveState {
        &self.state
    }

    /// Current phase of the state machine.
    #[must_use]
    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Number of the wave in progress.
    #[must_use]
    pub fn wave(&self) -> WaveNumber {
        self.state.wave
    }

    /// Enemies spawned by the director that have not been reported removed.
    #[must_use]
    pub fn live_units(&self) -> u32 {
        self.live_units
    }

    fn enter_wave(&mut self, wave: WaveNumber, out: &mut Vec<Command>) {
        self.state = WaveState::for_wave(wave);
        self.phase = WavePhase::Spawning;
        self.delay_elapsed = Duration::ZERO;
        info!(
            wave = wave.get(),
            spawns = self.state.total_to_spawn,
            boss = self.state.is_boss_wave,
            "wave started"
        );
        out.push(Command::BeginWave { wave });

        if self.state.is_boss_wave {
            self.request_spawn(SpawnKind::Boss, out);
            self.phase = WavePhase::AwaitingCompletion;
        }
    }

    fn request_spawn(&mut self, kind: SpawnKind, out: &mut Vec<Command>) {
        out.push(Command::SpawnEnemy {
            request: SpawnRequest {
                wave: self.state.wave,
                kind,
            },
        });
        self.state.spawned += 1;
        self.live_units = self.live_units.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castle_defence_core::{EnemyKind, RemovalCause, UnitId};

    const CADENCE: Duration = Duration::from_millis(400);

    fn director_at(wave: u32) -> WaveDirector {
        WaveDirector::new(Config::default().with_first_wave(WaveNumber::new(wave)))
    }

    fn spawn_requests(commands: &[Command]) -> Vec<SpawnRequest> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::SpawnEnemy { request } => Some(*request),
                _ => None,
            })
            .collect()
    }

    fn began_waves(commands: &[Command]) -> Vec<u32> {
        commands
            .iter()
            .filter_map(|command| match command {
                Command::BeginWave { wave } => Some(wave.get()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn first_tick_opens_the_first_wave() {
        let mut director = WaveDirector::new(Config::default());
        let mut out = Vec::new();
        director.on_tick(Duration::ZERO, &mut out);
        assert_eq!(began_waves(&out), vec![1]);
        assert!(spawn_requests(&out).is_empty());
        assert_eq!(director.phase(), WavePhase::Spawning);
        assert_eq!(director.state().total_to_spawn, 7);
    }

    #[test]
    fn wave_seven_spawns_sixteen_requests_every_400ms() {
        let mut director = director_at(7);
        let mut out = Vec::new();
        director.start(&mut out);
        out.clear();

        for step in 1..=16 {
            director.on_tick(CADENCE - Duration::from_millis(1), &mut out);
            assert_eq!(spawn_requests(&out).len(), step - 1, "spawned early");
            director.on_tick(Duration::from_millis(1), &mut out);
            assert_eq!(spawn_requests(&out).len(), step, "spawn {step} missing");
        }

        let requests = spawn_requests(&out);
        assert_eq!(requests.len(), 16);
        for (ordinal, request) in requests.iter().enumerate() {
            assert_eq!(request.wave, WaveNumber::new(7));
            assert_eq!(
                request.kind,
                SpawnKind::Regular {
                    ordinal: ordinal as u32
                }
            );
        }
        assert_eq!(director.phase(), WavePhase::AwaitingCompletion);
        assert_eq!(director.live_units(), 16);
    }

    #[test]
    fn completion_waits_for_the_last_live_unit() {
        let mut director = director_at(7);
        let mut out = Vec::new();
        director.on_tick(CADENCE * 16, &mut out);
        assert_eq!(spawn_requests(&out).len(), 16);
        assert_eq!(director.phase(), WavePhase::AwaitingCompletion);

        for _ in 0..15 {
            director.notify_unit_removed();
        }
        director.on_tick(Duration::from_secs(5), &mut out);
        assert_eq!(director.phase(), WavePhase::AwaitingCompletion);

        director.notify_unit_removed();
        director.on_tick(Duration::from_millis(1), &mut out);
        assert_eq!(director.phase(), WavePhase::InterWaveDelay);
        assert_eq!(director.wave(), WaveNumber::new(7));
    }

    #[test]
    fn next_wave_begins_after_the_delay() {
        let mut director = director_at(7);
        let mut out = Vec::new();
        director.on_tick(CADENCE * 16, &mut out);
        for _ in 0..16 {
            director.notify_unit_removed();
        }
        out.clear();

        director.on_tick(Duration::from_millis(199), &mut out);
        assert!(began_waves(&out).is_empty());
        director.on_tick(Duration::from_millis(1), &mut out);
        assert_eq!(began_waves(&out), vec![8]);
        assert_eq!(director.phase(), WavePhase::Spawning);
        assert_eq!(director.state().total_to_spawn, 18);
        assert_eq!(director.state().spawned, 0);
    }

    #[test]
    fn boss_wave_issues_exactly_one_boss() {
        let mut director = director_at(10);
        let mut out = Vec::new();
        director.on_tick(Duration::ZERO, &mut out);
        director.on_tick(Duration::from_secs(10), &mut out);

        let requests = spawn_requests(&out);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].kind, SpawnKind::Boss);
        assert_eq!(requests[0].wave, WaveNumber::new(10));
        assert!(director.state().is_boss_wave);
        assert_eq!(director.phase(), WavePhase::AwaitingCompletion);
    }

    #[test]
    fn large_ticks_carry_leftover_time() {
        let mut director = director_at(1);
        let mut out = Vec::new();
        director.on_tick(Duration::from_millis(1_000), &mut out);
        assert_eq!(spawn_requests(&out).len(), 2);
        assert_eq!(
            director.state().elapsed_since_last_spawn,
            Duration::from_millis(200)
        );
    }

    #[test]
    fn removals_never_underflow() {
        let mut director = director_at(1);
        director.notify_unit_removed();
        assert_eq!(director.live_units(), 0);
    }

    #[test]
    fn handle_counts_removals_before_time() {
        let mut director = director_at(5);
        let mut out = Vec::new();
        director.start(&mut out);
        assert_eq!(director.live_units(), 1);
        out.clear();

        let events = vec![
            Event::TimeAdvanced {
                dt: Duration::from_millis(250),
            },
            Event::UnitRemoved {
                unit: UnitId::new(0),
                kind: EnemyKind::Warlord,
                cause: RemovalCause::Killed,
            },
        ];
        director.handle(&events, &mut out);
        assert_eq!(began_waves(&out), vec![6]);
    }

    #[test]
    fn refused_spawns_do_not_hold_the_wave_open() {
        let mut director = director_at(1);
        let mut out = Vec::new();
        director.on_tick(CADENCE * 7, &mut out);
        let requests = spawn_requests(&out);
        assert_eq!(requests.len(), 7);
        assert_eq!(director.phase(), WavePhase::AwaitingCompletion);
        out.clear();

        let mut events: Vec<Event> = requests
            .into_iter()
            .map(|request| Event::SpawnRejected { request })
            .collect();
        events.push(Event::TimeAdvanced {
            dt: Duration::from_millis(200),
        });
        director.handle(&events, &mut out);

        assert_eq!(director.live_units(), 0);
        assert_eq!(began_waves(&out), vec![2]);
    }

    #[test]
    fn cleared_units_count_as_removed() {
        let mut director = director_at(1);
        let mut out = Vec::new();
        director.on_tick(CADENCE * 7, &mut out);
        out.clear();

        let events: Vec<Event> = (0..7)
            .map(|id| Event::UnitRemoved {
                unit: UnitId::new(id),
                kind: EnemyKind::Grunt,
                cause: RemovalCause::Cleared,
            })
            .chain([Event::TimeAdvanced {
                dt: Duration::from_millis(1),
            }])
            .collect();
        director.handle(&events, &mut out);

        assert_eq!(director.live_units(), 0);
        assert_eq!(director.phase(), WavePhase::InterWaveDelay);
    }
}
