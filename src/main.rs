//! Infinite Stairs entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

    use infinite_stairs::audio::AudioManager;
    use infinite_stairs::consts::*;
    use infinite_stairs::persistence::LocalStorageStore;
    use infinite_stairs::platform::BrowserClock;
    use infinite_stairs::renderer::{DrawCmd, Frame, RenderState};
    use infinite_stairs::sim::Viewport;
    use infinite_stairs::{GameEngine, GameOverReport, GamePhase};

    /// Game instance holding the engine and the GPU state
    struct Game {
        engine: GameEngine,
        render_state: Option<RenderState>,
        /// 2D canvas over the WebGPU one for glyphs and labels
        overlay: Option<CanvasRenderingContext2d>,
        accumulator: f64,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        last_phase: GamePhase,
    }

    impl Game {
        fn new(engine: GameEngine) -> Self {
            Self {
                engine,
                render_state: None,
                overlay: None,
                accumulator: 0.0,
                last_time: 0.0,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
                last_phase: GamePhase::Ready,
            }
        }

        /// Run fixed simulation ticks for the elapsed wall time
        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                (time - self.last_time).min(100.0)
            } else {
                TICK_MS
            };
            self.last_time = time;
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= TICK_MS && substeps < MAX_SUBSTEPS {
                self.engine.update();
                self.accumulator -= TICK_MS;
                substeps += 1;
            }
            if substeps == MAX_SUBSTEPS {
                // Drop the backlog instead of spiralling
                self.accumulator = self.accumulator.min(TICK_MS);
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            let frame = self.engine.render();
            if let Some(render_state) = self.render_state.as_mut() {
                match render_state.render(&frame) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
            if let Some(ctx) = &self.overlay {
                draw_overlay(ctx, &frame);
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&mut self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let state = self.engine.state();
            let progress = self.engine.progress();

            set_text(&document, "#hud-score .hud-value", &state.score.to_string());
            set_text(&document, "#hud-best .hud-value", &state.high_score.to_string());
            set_text(
                &document,
                "#hud-coins .hud-value",
                &(progress.total_coins + state.session_coins).to_string(),
            );
            set_text(&document, "#hud-fps .hud-value", &self.fps.to_string());

            if let Some(el) = document.get_element_by_id("hud-combo") {
                if state.combo > 1 {
                    let _ = el.set_attribute("class", "hud-item");
                    set_text(&document, "#hud-combo .hud-value", &state.combo.to_string());
                } else {
                    let _ = el.set_attribute("class", "hud-item hidden");
                }
            }

            let phase = state.phase;
            if phase != self.last_phase {
                show(&document, "controls", phase == GamePhase::Playing);
                show(&document, "start-prompt", phase == GamePhase::Ready);
                if phase != GamePhase::GameOver {
                    show(&document, "game-over", false);
                }
                self.last_phase = phase;
            }
        }
    }

    fn set_text(document: &Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    fn show(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    fn css_color(color: [f32; 4]) -> String {
        format!(
            "rgba({}, {}, {}, {:.3})",
            (color[0] * 255.0) as u8,
            (color[1] * 255.0) as u8,
            (color[2] * 255.0) as u8,
            color[3]
        )
    }

    /// Glyphs and labels the GPU path leaves out
    fn draw_overlay(ctx: &CanvasRenderingContext2d, frame: &Frame) {
        let Some(canvas) = ctx.canvas() else { return };
        let scale = frame.viewport.scale as f64;
        ctx.clear_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");

        for cmd in frame.overlay() {
            match cmd {
                DrawCmd::Glyph {
                    glyph,
                    center,
                    size,
                    alpha,
                } => {
                    ctx.set_global_alpha(*alpha as f64);
                    ctx.set_font(&format!("{}px sans-serif", (*size as f64 * scale).round()));
                    let _ = ctx.fill_text(
                        &glyph.to_string(),
                        center.x as f64 * scale,
                        center.y as f64 * scale,
                    );
                }
                DrawCmd::Text {
                    text,
                    center,
                    size,
                    color,
                } => {
                    ctx.set_global_alpha(1.0);
                    ctx.set_font(&format!("bold {}px sans-serif", (*size as f64 * scale).round()));
                    ctx.set_fill_style_str(&css_color(*color));
                    let _ = ctx.fill_text(text, center.x as f64 * scale, center.y as f64 * scale);
                }
                _ => {}
            }
        }
        ctx.set_global_alpha(1.0);
    }

    /// Fill in and reveal the game-over panel
    fn show_game_over(report: &GameOverReport) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        set_text(&document, "#final-score", &report.score.to_string());
        set_text(&document, "#final-best", &report.high_score.to_string());
        set_text(&document, "#earned-coins", &format!("+{}", report.earned_coins));
        set_text(&document, "#total-coins", &report.total_coins.to_string());
        let unlocks = report
            .new_unlocks
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        set_text(&document, "#new-unlocks", &unlocks);
        show(&document, "game-over", true);
    }

    fn canvas_size(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        (width.max(1), height.max(1))
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {}", e).into());
        }

        log::info!("Infinite Stairs starting...");

        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Hide loading indicator
        show(&document, "loading", false);

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #canvas element");
            return;
        };

        let (width, height) = canvas_size(&window, &canvas);
        canvas.set_width(width);
        canvas.set_height(height);

        let seed = js_sys::Date::now() as u64;
        let mut engine = GameEngine::new(
            seed,
            Viewport::fit(width as f32, height as f32),
            Box::new(LocalStorageStore),
            Box::new(AudioManager::new()),
            Box::new(BrowserClock),
        );
        engine.on_game_over(show_game_over);
        let game = Rc::new(RefCell::new(Game::new(engine)));
        log::info!("Game initialized with seed: {}", seed);

        // Optional 2D overlay canvas for emoji and text
        if let Some(overlay) = document
            .get_element_by_id("overlay")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        {
            overlay.set_width(width);
            overlay.set_height(height);
            game.borrow_mut().overlay = overlay
                .get_context("2d")
                .ok()
                .flatten()
                .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok());
        }

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("Failed to create surface: {}", e);
                return;
            }
        };

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                log::error!("Failed to get adapter: {}", e);
                return;
            }
        };

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        match RenderState::new(surface, &adapter, width, height).await {
            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
            Err(e) => log::error!("Failed to create device: {}", e),
        }

        setup_input_handlers(game.clone());
        setup_buttons(game.clone());
        setup_resize(&canvas, game.clone());

        show(&document, "hud", true);
        show(&document, "start-prompt", true);

        request_animation_frame(game);

        log::info!("Infinite Stairs running!");
    }

    fn start_run(game: &Rc<RefCell<Game>>) {
        let mut g = game.borrow_mut();
        if g.engine.phase() == GamePhase::Playing {
            return;
        }
        let options = g.engine.start_game_with_inventory();
        log::info!("Run options: {:?}", options);
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                match event.key().as_str() {
                    "ArrowUp" | "w" | "W" | " " => {
                        event.prevent_default();
                        if game.borrow().engine.phase() == GamePhase::Ready {
                            start_run(&game);
                        } else {
                            game.borrow_mut().engine.handle_step();
                        }
                    }
                    "ArrowLeft" | "ArrowRight" | "a" | "A" | "d" | "D" => {
                        event.prevent_default();
                        game.borrow_mut().engine.handle_direction_change();
                    }
                    "Enter" => start_run(&game),
                    "`" => {
                        let mut g = game.borrow_mut();
                        let enabled = !g.engine.state().auto_direction;
                        g.engine.set_auto_direction(enabled);
                        log::info!("Auto direction: {}", enabled);
                    }
                    "m" | "M" => {
                        let mut g = game.borrow_mut();
                        let mut settings = g.engine.settings().clone();
                        settings.muted = !settings.muted;
                        g.engine.apply_settings(settings);
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        let Some(document) = window.document() else {
            return;
        };

        // Touch: left half turns, right half climbs
        if let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        {
            let game = game.clone();
            let target = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::TouchEvent| {
                event.prevent_default();
                let rect = target.get_bounding_client_rect();
                let mut g = game.borrow_mut();
                if g.engine.phase() == GamePhase::Ready {
                    drop(g);
                    start_run(&game);
                    return;
                }
                let touches = event.changed_touches();
                for i in 0..touches.length() {
                    let Some(touch) = touches.get(i) else {
                        continue;
                    };
                    let x = touch.client_x() as f64 - rect.left();
                    if x < rect.width() / 2.0 {
                        g.engine.handle_direction_change();
                    } else {
                        g.engine.handle_step();
                    }
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // On-screen buttons
        for (id, turn) in [("btn-step", false), ("btn-direction", true)] {
            let Some(btn) = document.get_element_by_id(id) else {
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                if turn {
                    g.engine.handle_direction_change();
                } else {
                    g.engine.handle_step();
                }
            });
            let _ =
                btn.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        for id in ["start-btn", "restart-btn"] {
            let Some(btn) = document.get_element_by_id(id) else {
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                start_run(&game);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("revive-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let result = game.borrow_mut().engine.revive();
                match result {
                    Ok(true) => {
                        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                            show(&document, "game-over", false);
                        }
                    }
                    Ok(false) => {}
                    Err(e) => log::warn!("Revive failed: {}", e),
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let (width, height) = canvas_size(&window, &canvas);
            canvas.set_width(width);
            canvas.set_height(height);

            let mut g = game.borrow_mut();
            g.engine.resize(width as f32, height as f32);
            if let Some(render_state) = g.render_state.as_mut() {
                render_state.resize(width, height);
            }
            if let Some(overlay) = g.overlay.as_ref().and_then(|ctx| ctx.canvas()) {
                overlay.set_width(width);
                overlay.set_height(height);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Headless autopilot: climbs with a seeded chance of a misstep per step
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use infinite_stairs::audio::NullAudio;
    use infinite_stairs::consts::TICK_MS;
    use infinite_stairs::persistence::MemoryStore;
    use infinite_stairs::platform::ManualClock;
    use infinite_stairs::sim::{Motion, Viewport};
    use infinite_stairs::{GameEngine, GameOverReport, GamePhase, StartOptions};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed: u64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0x5EED);
    let misstep_chance: f32 = std::env::args()
        .nth(2)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0.005);
    log::info!("Infinite Stairs (headless) starting with seed {}", seed);

    let clock = ManualClock::new(0.0);
    let mut engine = GameEngine::new(
        seed,
        Viewport::default(),
        Box::new(MemoryStore::new()),
        Box::new(NullAudio),
        Box::new(clock.clone()),
    );
    let report: Rc<RefCell<Option<GameOverReport>>> = Rc::new(RefCell::new(None));
    let sink = report.clone();
    engine.on_game_over(move |r| *sink.borrow_mut() = Some(r.clone()));
    engine.start_game(StartOptions::default());

    let mut rng = Pcg32::seed_from_u64(seed);
    // Ten minutes of simulated play at most
    let max_ticks = 60 * 60 * 10;
    let mut ticks = 0;
    while ticks < max_ticks && report.borrow().is_none() {
        clock.advance(TICK_MS);
        let state = engine.state();
        // Tap roughly every 80ms when standing still
        if state.phase == GamePhase::Playing && state.player.motion == Motion::Idle && ticks % 5 == 0 {
            let expected = state.expected_direction(state.player.stair_index);
            let stumble = rng.random::<f32>() < misstep_chance;
            let turn = (state.player.facing != expected) != stumble;
            if turn {
                engine.handle_direction_change();
            } else {
                engine.handle_step();
            }
        }
        engine.update();
        ticks += 1;
    }

    let frame = engine.render();
    log::debug!(
        "Final frame: {} commands, {} vertices",
        frame.commands.len(),
        frame.tessellate().len()
    );

    let report = report.borrow().clone();
    match report {
        Some(r) => {
            println!(
                "Run over after {:.1}s: floor {}, best {}, +{} coins ({} total)",
                ticks as f64 * TICK_MS / 1000.0,
                r.score,
                r.high_score,
                r.earned_coins,
                r.total_coins
            );
            for unlock in &r.new_unlocks {
                println!("Unlocked {}", unlock.name);
            }
        }
        None => println!(
            "Still climbing after {} ticks at floor {}",
            ticks,
            engine.state().score
        ),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
