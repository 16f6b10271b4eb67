//! Game engine: owns the simulation and its collaborators
//!
//! The host calls the operations below unconditionally from its input
//! handlers and frame loop; anything arriving in the wrong phase is ignored.
//! Sound, persistence and the game-over callback are driven from the events
//! the simulation emits.

use serde::Serialize;

use crate::audio::{AudioSink, SoundEffect};
use crate::characters::{self, CharacterDescriptor};
use crate::persistence::{Progress, ProgressStore, keys, write_or_warn};
use crate::platform::Clock;
use crate::renderer::{Frame, build_frame};
use crate::settings::Settings;
use crate::shop::{self, Consumable, ShopError, Upgrade};
use crate::sim::{GameEvent, GamePhase, GameState, StartOptions, StepSource, Viewport, tick};

/// Summary handed to the host once the game-over delay has elapsed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverReport {
    pub score: u64,
    pub high_score: u64,
    /// Characters whose unlock score was crossed by this run
    pub new_unlocks: Vec<CharacterDescriptor>,
    /// Coins credited for this run (multiplier applied)
    pub earned_coins: u64,
    pub total_coins: u64,
}

pub type GameOverCallback = Box<dyn FnMut(&GameOverReport)>;

/// Orchestrator for runs, input, persistence and audio
pub struct GameEngine {
    state: GameState,
    store: Box<dyn ProgressStore>,
    audio: Box<dyn AudioSink>,
    clock: Box<dyn Clock>,
    progress: Progress,
    settings: Settings,
    roster: Vec<CharacterDescriptor>,
    character: CharacterDescriptor,
    on_game_over: Option<GameOverCallback>,
    /// Built at game over, delivered when the notice comes due
    pending_report: Option<GameOverReport>,
    base_seed: u64,
    runs_started: u64,
    destroyed: bool,
}

impl GameEngine {
    pub fn new(
        seed: u64,
        viewport: Viewport,
        store: Box<dyn ProgressStore>,
        mut audio: Box<dyn AudioSink>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let progress = Progress::load(store.as_ref());
        let settings = Settings::load(store.as_ref());
        let roster = characters::roster();

        let character = progress
            .selected_char
            .as_deref()
            .and_then(|id| characters::find(&roster, id))
            .filter(|c| c.is_unlocked(progress.high_score, &progress.purchased_chars))
            .cloned()
            .unwrap_or_default();

        let mut state = GameState::new(seed, viewport, character.theme.clone());
        state.high_score = progress.high_score;
        state.body_color = character.colors.body;
        settings.apply_to(&mut state.effects);
        audio.apply_settings(&settings);

        log::info!(
            "Engine ready (high score {}, {} coins, character {})",
            progress.high_score,
            progress.total_coins,
            character.id
        );

        Self {
            state,
            store,
            audio,
            clock,
            progress,
            settings,
            roster,
            character,
            on_game_over: None,
            pending_report: None,
            base_seed: seed,
            runs_started: 0,
            destroyed: false,
        }
    }

    /// Register the host's game-over handler (replaces any previous one)
    pub fn on_game_over(&mut self, callback: impl FnMut(&GameOverReport) + 'static) {
        self.on_game_over = Some(Box::new(callback));
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn character(&self) -> &CharacterDescriptor {
        &self.character
    }

    pub fn roster(&self) -> &[CharacterDescriptor] {
        &self.roster
    }

    /// Seed for the next run; each run gets its own
    fn next_seed(&mut self) -> u64 {
        let seed = self
            .base_seed
            .wrapping_add(self.runs_started.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        self.runs_started += 1;
        seed
    }

    /// Start a fresh run with explicit options
    pub fn start_game(&mut self, options: StartOptions) {
        if self.destroyed {
            return;
        }
        let seed = self.next_seed();
        self.pending_report = None;
        self.state.high_score = self.state.high_score.max(self.progress.high_score);
        self.state.begin_run(seed, options);
        self.settings.apply_to(&mut self.state.effects);
        self.dispatch_events();
    }

    /// Start a run from the owned upgrades, using up one of each consumable
    pub fn start_game_with_inventory(&mut self) -> StartOptions {
        let options = shop::prepare_run(&mut self.progress);
        if !self.destroyed {
            self.progress.save(self.store.as_mut());
        }
        self.start_game(options);
        options
    }

    /// Advance the simulation by one fixed tick
    pub fn update(&mut self) {
        if self.destroyed {
            return;
        }
        let now = self.clock.now_ms();
        tick(&mut self.state, now);
        self.dispatch_events();
    }

    /// Draw commands for the current state
    pub fn render(&self) -> Frame {
        build_frame(&self.state, &self.character)
    }

    /// Step up in the facing direction
    pub fn handle_step(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let now = self.clock.now_ms();
        let accepted = self.state.request_step(now, StepSource::Player);
        self.dispatch_events();
        accepted
    }

    /// Turn around and step
    pub fn handle_direction_change(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let now = self.clock.now_ms();
        let accepted = self.state.request_direction_change(now);
        self.dispatch_events();
        accepted
    }

    /// Pay for a second chance. `Ok(false)` when no revive is possible right
    /// now; the wallet is only charged when the revive happens.
    pub fn revive(&mut self) -> Result<bool, ShopError> {
        if self.destroyed || !self.state.can_revive() {
            return Ok(false);
        }
        if let Err(e) = shop::pay_for_revive(&mut self.progress) {
            log::warn!("Revive refused: {}", e);
            return Err(e);
        }

        self.state.revive();
        self.pending_report = None;
        self.progress.save_scores(self.store.as_mut());
        self.dispatch_events();
        Ok(true)
    }

    /// Switch character. Locked characters are refused.
    pub fn set_character(&mut self, descriptor: CharacterDescriptor) -> bool {
        if self.destroyed {
            return false;
        }
        if let Err(e) = shop::select_character(&mut self.progress, &descriptor) {
            log::warn!("Character change refused: {}", e);
            return false;
        }
        write_or_warn(self.store.as_mut(), keys::SELECTED_CHAR, &descriptor.id);

        self.state.theme = descriptor.theme.clone();
        self.state.body_color = descriptor.colors.body;
        self.state.effects.target_bg_hue = descriptor.theme.bg.h;
        self.state.effects.rebuild_stars(self.state.viewport);
        self.settings.apply_to(&mut self.state.effects);
        log::info!("Character changed to {}", descriptor.id);
        self.character = descriptor;
        true
    }

    /// Fit the logical viewport to a new canvas size (physical pixels)
    pub fn resize(&mut self, width: f32, height: f32) {
        if self.destroyed {
            return;
        }
        let viewport = Viewport::fit(width, height);
        self.state.viewport = viewport;
        self.state.effects.rebuild_stars(viewport);
        self.settings.apply_to(&mut self.state.effects);
        log::debug!(
            "Resized to {}x{} (logical height {:.0}, scale {:.2})",
            width,
            height,
            viewport.height,
            viewport.scale
        );
    }

    /// Drop the host callback and any pending delayed work. Every operation
    /// is a no-op afterwards.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.on_game_over = None;
        self.pending_report = None;
        self.state.scheduler.cancel_all();
        log::info!("Engine destroyed");
    }

    /// Test mode: always face the way the path goes
    pub fn set_auto_direction(&mut self, enabled: bool) {
        self.state.auto_direction = enabled;
    }

    pub fn activate_shield(&mut self) -> bool {
        let activated = !self.destroyed && self.state.activate_shield();
        self.dispatch_events();
        activated
    }

    pub fn activate_fever(&mut self) -> bool {
        let activated = !self.destroyed && self.state.activate_fever();
        self.dispatch_events();
        activated
    }

    pub fn activate_rocket(&mut self) -> bool {
        let activated = !self.destroyed && self.state.activate_rocket();
        self.dispatch_events();
        activated
    }

    pub fn buy_upgrade(&mut self, upgrade: Upgrade) -> Result<(), ShopError> {
        shop::buy_upgrade(&mut self.progress, upgrade)?;
        self.progress.save(self.store.as_mut());
        Ok(())
    }

    pub fn buy_consumable(&mut self, consumable: Consumable) -> Result<u32, ShopError> {
        let count = shop::buy_consumable(&mut self.progress, consumable)?;
        self.progress.save(self.store.as_mut());
        Ok(count)
    }

    pub fn buy_character(&mut self, id: &str) -> Result<(), ShopError> {
        let Some(character) = characters::find(&self.roster, id) else {
            return Err(ShopError::NotPurchasable(id.to_string()));
        };
        shop::buy_character(&mut self.progress, character)?;
        self.progress.save(self.store.as_mut());
        Ok(())
    }

    /// Store new preferences and push them to effects and audio
    pub fn apply_settings(&mut self, settings: Settings) {
        settings.apply_to(&mut self.state.effects);
        self.audio.apply_settings(&settings);
        settings.save(self.store.as_mut());
        self.settings = settings;
    }

    fn dispatch_events(&mut self) {
        for event in self.state.drain_events() {
            match event {
                GameEvent::RunStarted | GameEvent::Revived => {
                    self.audio.play(SoundEffect::StartGame)
                }
                GameEvent::Stepped { floor } => self.audio.play(SoundEffect::Step { floor }),
                GameEvent::DirectionChanged | GameEvent::ShieldSaved => {
                    self.audio.play(SoundEffect::DirectionChange)
                }
                GameEvent::FallStarted => self.audio.play(SoundEffect::GameOver),
                GameEvent::ItemPicked(_) => self.audio.play(SoundEffect::ItemPickup),
                GameEvent::ScoreMilestone { .. } | GameEvent::CoinBurst { .. } => {
                    self.audio.play(SoundEffect::Milestone)
                }
                GameEvent::RunEnded => {
                    self.audio.play(SoundEffect::GameOver);
                    self.finish_run();
                }
                GameEvent::GameOverNoticeDue => self.deliver_report(),
                GameEvent::MonsterHit
                | GameEvent::ComboMilestone { .. }
                | GameEvent::CoinCollected => {}
            }
        }
    }

    /// Credit the run and persist scores; the report waits for the notice
    fn finish_run(&mut self) {
        let high_score = self.progress.high_score.max(self.state.high_score);
        let new_unlocks =
            characters::newly_unlocked(&self.roster, self.progress.prev_high_score, high_score);
        let earned_coins = self.state.session_coins * self.state.coin_multiplier;

        self.progress.high_score = high_score;
        self.progress.prev_high_score = high_score;
        self.progress.total_coins += earned_coins;
        self.progress.save_scores(self.store.as_mut());

        if !new_unlocks.is_empty() {
            self.audio.play(SoundEffect::Unlock);
            log::info!(
                "Unlocked: {}",
                new_unlocks
                    .iter()
                    .map(|c| c.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        log::info!(
            "Run credited: score {}, earned {} coins, total {}",
            self.state.score,
            earned_coins,
            self.progress.total_coins
        );

        self.pending_report = Some(GameOverReport {
            score: self.state.score,
            high_score,
            new_unlocks,
            earned_coins,
            total_coins: self.progress.total_coins,
        });
    }

    fn deliver_report(&mut self) {
        let Some(report) = self.pending_report.take() else {
            return;
        };
        match self.on_game_over.as_mut() {
            Some(callback) => callback(&report),
            None => log::debug!("Game over with no handler registered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::audio::RecordingAudio;
    use crate::consts::*;
    use crate::persistence::MemoryStore;
    use crate::platform::ManualClock;
    use crate::sim::{ItemKind, Motion};

    struct Harness {
        engine: GameEngine,
        store: MemoryStore,
        audio: RecordingAudio,
        clock: ManualClock,
        reports: Rc<RefCell<Vec<GameOverReport>>>,
    }

    fn harness_with(store: MemoryStore) -> Harness {
        let audio = RecordingAudio::default();
        let clock = ManualClock::new(0.0);
        let mut engine = GameEngine::new(
            42,
            Viewport::default(),
            Box::new(store.clone()),
            Box::new(audio.clone()),
            Box::new(clock.clone()),
        );
        let reports = Rc::new(RefCell::new(Vec::new()));
        let sink = reports.clone();
        engine.on_game_over(move |report| sink.borrow_mut().push(report.clone()));
        Harness {
            engine,
            store,
            audio,
            clock,
            reports,
        }
    }

    fn harness() -> Harness {
        harness_with(MemoryStore::new())
    }

    impl Harness {
        fn tick(&mut self) {
            self.clock.advance(TICK_MS);
            self.engine.update();
        }

        fn settle(&mut self) {
            for _ in 0..60 {
                if self.engine.state().player.motion == Motion::Idle {
                    return;
                }
                self.tick();
            }
        }

        /// Step the right way, turning first when needed
        fn correct_step(&mut self) {
            let state = self.engine.state();
            let expected = state.expected_direction(state.player.stair_index);
            if state.player.facing == expected {
                self.engine.handle_step();
            } else {
                self.engine.handle_direction_change();
            }
        }

        fn wrong_step(&mut self) {
            let state = self.engine.state();
            let expected = state.expected_direction(state.player.stair_index);
            if state.player.facing == expected {
                self.engine.handle_direction_change();
            } else {
                self.engine.handle_step();
            }
        }

        fn run_until_report(&mut self) {
            let before = self.reports.borrow().len();
            for _ in 0..600 {
                if self.reports.borrow().len() > before {
                    return;
                }
                self.tick();
            }
        }
    }

    #[test]
    fn test_five_quick_steps() {
        let mut h = harness();
        h.engine.start_game(StartOptions::default());
        assert_eq!(h.engine.state().score, 0);
        assert_eq!(h.engine.state().energy, MAX_ENERGY);

        for i in 1..=5 {
            h.clock.advance(50.0);
            h.correct_step();
            assert_eq!(h.engine.state().score, i);
            assert_eq!(h.engine.state().energy, MAX_ENERGY);
            if i < 5 {
                h.settle();
            }
        }

        let state = h.engine.state();
        assert_eq!(state.combo, 5);
        assert!(state.player.momentum > 0.0);
        assert_eq!(h.audio.count(SoundEffect::StartGame), 1);
        assert_eq!(
            h.audio
                .played()
                .iter()
                .filter(|e| matches!(e, SoundEffect::Step { .. }))
                .count(),
            5
        );
    }

    #[test]
    fn test_wrong_step_falls_then_reports_once() {
        let mut h = harness();
        h.engine.start_game(StartOptions::default());
        h.wrong_step();
        assert_eq!(h.engine.phase(), GamePhase::Falling);

        for _ in 0..400 {
            h.tick();
            assert_ne!(h.engine.phase(), GamePhase::Playing);
        }
        assert_eq!(h.engine.phase(), GamePhase::GameOver);
        assert_eq!(h.reports.borrow().len(), 1);
        assert_eq!(h.reports.borrow()[0].score, 0);
        // Once for the fall and once for the game over
        assert_eq!(h.audio.count(SoundEffect::GameOver), 2);
    }

    #[test]
    fn test_report_waits_for_notice_delay() {
        let mut h = harness();
        h.engine.start_game(StartOptions::default());
        h.wrong_step();
        while h.engine.phase() == GamePhase::Falling {
            h.tick();
        }
        for _ in 0..GAME_OVER_NOTICE_DELAY_TICKS - 1 {
            h.tick();
        }
        assert!(h.reports.borrow().is_empty());
        h.tick();
        assert_eq!(h.reports.borrow().len(), 1);
    }

    #[test]
    fn test_fever_step_scores_two() {
        let mut h = harness();
        h.engine.start_game(StartOptions::default());
        let next = h.engine.state.player.stair_index + 1;
        h.engine.state.stairs[next].item = Some(ItemKind::Fever.descriptor());

        h.correct_step();
        assert!(h.engine.state().powerups.fever_active());
        assert_eq!(h.audio.count(SoundEffect::ItemPickup), 1);
        h.settle();

        let score = h.engine.state().score;
        let fever = h.engine.state().powerups.fever_ticks;
        h.engine.handle_step();
        h.engine.update();
        assert_eq!(h.engine.state().score, score + 2);
        assert_eq!(h.engine.state().powerups.fever_ticks, fever - 1);
    }

    #[test]
    fn test_combo_coin_bursts() {
        let mut h = harness();
        h.engine.start_game(StartOptions::default());

        h.engine.state.combo = 9;
        h.correct_step();
        assert_eq!(h.engine.state().magnet_coins.len(), 2);
        h.settle();

        h.engine.state.magnet_coins.clear();
        h.engine.state.combo = 19;
        h.correct_step();
        assert_eq!(h.engine.state().magnet_coins.len(), 4);
        assert_eq!(h.audio.count(SoundEffect::Milestone), 2);
    }

    #[test]
    fn test_revive_outside_frozen_state_is_noop() {
        let mut h = harness();
        h.engine.progress.total_coins = 500;
        assert_eq!(h.engine.revive(), Ok(false));

        h.engine.start_game(StartOptions::default());
        h.correct_step();
        let (score, energy, phase) = (
            h.engine.state().score,
            h.engine.state().energy,
            h.engine.phase(),
        );
        assert_eq!(h.engine.revive(), Ok(false));
        assert_eq!(h.engine.state().score, score);
        assert_eq!(h.engine.state().energy, energy);
        assert_eq!(h.engine.phase(), phase);
        assert_eq!(h.engine.progress().total_coins, 500);
    }

    #[test]
    fn test_revive_requires_coins() {
        let mut h = harness();
        h.engine.start_game(StartOptions::default());
        h.wrong_step();
        assert!(matches!(
            h.engine.revive(),
            Err(ShopError::InsufficientCoins { needed: 50, .. })
        ));
        assert_eq!(h.engine.phase(), GamePhase::Falling);
    }

    #[test]
    fn test_coins_round_trip_over_runs() {
        let mut h = harness();
        let mut earned = 0;

        // Plain run
        h.engine.start_game(StartOptions::default());
        h.engine.state.session_coins = 70;
        h.wrong_step();
        h.run_until_report();
        earned += h.reports.borrow().last().map(|r| r.earned_coins).unwrap_or(0);
        assert_eq!(earned, 70);

        // Paid revive after the report, then end again
        assert_eq!(h.engine.revive(), Ok(true));
        assert_eq!(h.engine.phase(), GamePhase::Playing);
        h.engine.state.session_coins = 5;
        h.wrong_step();
        h.run_until_report();
        earned += h.reports.borrow().last().map(|r| r.earned_coins).unwrap_or(0);

        // Doubled coins
        h.engine.start_game(StartOptions {
            coin_booster: true,
            ..StartOptions::default()
        });
        h.engine.state.session_coins = 8;
        h.wrong_step();
        h.run_until_report();
        let last = h.reports.borrow().last().cloned();
        assert_eq!(last.as_ref().map(|r| r.earned_coins), Some(16));
        earned += 16;

        assert_eq!(h.reports.borrow().len(), 3);
        assert_eq!(h.engine.progress().total_coins, earned - REVIVE_COST);
        assert_eq!(
            Progress::load(&h.store).total_coins,
            earned - REVIVE_COST
        );
    }

    #[test]
    fn test_unlocks_reported_once() {
        let mut h = harness();
        h.engine.start_game(StartOptions::default());
        h.engine.state.score = 120;
        h.wrong_step();
        h.run_until_report();

        let report = h.reports.borrow()[0].clone();
        assert_eq!(report.high_score, 120);
        let ids: Vec<_> = report.new_unlocks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["ninja"]);
        assert_eq!(h.audio.count(SoundEffect::Unlock), 1);

        // Same high score again unlocks nothing new
        h.engine.start_game(StartOptions::default());
        h.engine.state.score = 110;
        h.wrong_step();
        h.run_until_report();
        assert!(h.reports.borrow()[1].new_unlocks.is_empty());
        assert_eq!(h.reports.borrow()[1].high_score, 120);
    }

    #[test]
    fn test_progress_survives_restart() {
        let store = MemoryStore::new();
        {
            let mut h = harness_with(store.clone());
            h.engine.start_game(StartOptions::default());
            h.engine.state.score = 150;
            h.engine.state.session_coins = 12;
            h.wrong_step();
            h.run_until_report();
            let ninja = characters::find(h.engine.roster(), "ninja").cloned();
            assert!(ninja.is_some_and(|c| h.engine.set_character(c)));
        }

        let h = harness_with(store);
        assert_eq!(h.engine.progress().high_score, 150);
        assert_eq!(h.engine.progress().total_coins, 12);
        assert_eq!(h.engine.state().high_score, 150);
        assert_eq!(h.engine.character().id, "ninja");
    }

    #[test]
    fn test_locked_character_refused() {
        let mut h = harness();
        let robot = characters::find(h.engine.roster(), "robot").cloned();
        assert!(robot.is_some_and(|c| !h.engine.set_character(c)));
        assert_eq!(h.engine.character().id, "default");
        assert!(h.store.get(keys::SELECTED_CHAR).is_none());
    }

    #[test]
    fn test_inventory_start_consumes_and_persists() {
        let mut h = harness();
        h.engine.progress.total_coins = 300;
        h.engine.buy_consumable(Consumable::StartShield).unwrap();
        h.engine.buy_upgrade(Upgrade::EnergyMaster).unwrap();
        assert_eq!(h.engine.progress().total_coins, 70);

        let options = h.engine.start_game_with_inventory();
        assert!(options.start_shield && options.energy_master);
        assert!(h.engine.state().powerups.shield);

        let stored = Progress::load(&h.store);
        assert_eq!(stored.consumable_count("startShield"), 0);
        assert!(stored.has_upgrade("energyMaster"));
    }

    #[test]
    fn test_resize_keeps_logical_width() {
        let mut h = harness();
        h.engine.resize(1080.0, 2400.0);
        let vp = h.engine.state().viewport;
        assert_eq!(vp.width, BASE_WIDTH);
        assert!((vp.scale - 3.0).abs() < 1e-6);
        assert!((vp.height - 800.0).abs() < 1e-3);
    }

    #[test]
    fn test_destroy_silences_engine() {
        let mut h = harness();
        h.engine.start_game(StartOptions::default());
        h.wrong_step();
        h.engine.destroy();
        for _ in 0..400 {
            h.tick();
        }
        assert!(h.reports.borrow().is_empty());
        assert!(!h.engine.handle_step());
        assert_eq!(h.engine.phase(), GamePhase::Falling);
    }

    #[test]
    fn test_settings_persist_and_apply() {
        let mut h = harness();
        h.engine.apply_settings(Settings {
            particles: false,
            ..Settings::default()
        });
        assert_eq!(h.engine.state().effects.max_particles, 0);
        assert!(!Settings::load(&h.store).particles);
    }
}
