//! Eskilaum entry point
//!
//! In the browser this wires the DOM (buttons, keyboard, focus) to the app
//! and draws each committed frame on a 2D canvas. Natively it runs a headless
//! session driven by a simple autopilot, which is handy for eyeballing the
//! logs of a full game.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, MouseEvent};

    use eskilaum::consts::*;
    use eskilaum::persistence::LocalStore;
    use eskilaum::platform::{BrowserClock, Clock};
    use eskilaum::sim::{GamePhase, ObstacleKind, Snapshot};
    use eskilaum::{App, AudioManager, Screen, SoundConfig};

    /// Background tint per level
    const PALETTE: [&str; LEVEL_PALETTE_LEN as usize] = [
        "#2f4f2f", "#3b5323", "#4a5d23", "#5c4b2a", "#4b3b47", "#2b3a55",
    ];
    const SNAKE_HEAD: &str = "#c8641e";
    const SNAKE_HEAD_EATING: &str = "#ffb347";
    const SNAKE_BODY: &str = "#a0522d";
    const FOOD: &str = "#d2a35b";
    const ROCK: &str = "#8a8a8a";
    const BRICK: &str = "#9c4a3a";

    /// Game instance holding all state
    struct Game {
        app: App<LocalStore, AudioManager>,
        clock: BrowserClock,
        ctx: CanvasRenderingContext2d,
        canvas: HtmlCanvasElement,
        /// Last screen pushed to the DOM
        shown: Option<(Screen, Option<GamePhase>)>,
    }

    impl Game {
        fn now(&self) -> u64 {
            self.clock.now_ms()
        }

        /// Canvas is redrawn only when the session commits a frame or the
        /// screen changes
        fn frame(&mut self) {
            let now = self.now();
            let dirty = self.app.update(now);
            let screen = (self.app.screen(), self.app.session().map(|s| s.phase()));
            let changed = self.shown != Some(screen);
            if dirty || changed {
                if let Some(snapshot) = self.app.snapshot() {
                    self.draw(&snapshot);
                }
                self.update_hud();
                self.shown = Some(screen);
            }
        }

        fn draw(&self, snapshot: &Snapshot) {
            let ctx = &self.ctx;
            let size = f64::from(self.canvas.width());
            let cell = size / f64::from(GRID_SIZE);

            let tint = PALETTE
                .get(snapshot.palette as usize)
                .copied()
                .unwrap_or(PALETTE[0]);
            ctx.set_fill_style_str(tint);
            ctx.fill_rect(0.0, 0.0, size, size);

            for obstacle in &snapshot.obstacles {
                let colour = match obstacle.kind {
                    ObstacleKind::Rock => ROCK,
                    ObstacleKind::Brick => BRICK,
                };
                ctx.set_global_alpha(if obstacle.is_solid() { 1.0 } else { 0.45 });
                ctx.set_fill_style_str(colour);
                ctx.fill_rect(
                    f64::from(obstacle.position.x) * cell + 1.0,
                    f64::from(obstacle.position.y) * cell + 1.0,
                    cell - 2.0,
                    cell - 2.0,
                );
            }
            ctx.set_global_alpha(1.0);

            ctx.set_fill_style_str(FOOD);
            ctx.begin_path();
            let _ = ctx.arc(
                (f64::from(snapshot.food.x) + 0.5) * cell,
                (f64::from(snapshot.food.y) + 0.5) * cell,
                cell * 0.35,
                0.0,
                std::f64::consts::TAU,
            );
            ctx.fill();

            for (i, segment) in snapshot.snake.iter().enumerate() {
                let colour = match (i, snapshot.eating) {
                    (0, true) => SNAKE_HEAD_EATING,
                    (0, false) => SNAKE_HEAD,
                    _ => SNAKE_BODY,
                };
                ctx.set_fill_style_str(colour);
                ctx.fill_rect(
                    f64::from(segment.x) * cell + 1.0,
                    f64::from(segment.y) * cell + 1.0,
                    cell - 2.0,
                    cell - 2.0,
                );
            }
        }

        /// Update HUD elements and overlays in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let screen = self.app.screen();
            let phase = self.app.session().map(|s| s.phase());

            if let Some(session) = self.app.session() {
                set_text(&document, "hud-score", &session.score().to_string());
                set_text(&document, "hud-level", &session.level().to_string());
            }

            show(&document, "start-screen", screen == Screen::Start);
            show(&document, "hud", screen == Screen::Playing);
            show(
                &document,
                "pause-menu",
                screen == Screen::Playing && phase == Some(GamePhase::Paused),
            );
            let transition = screen == Screen::Playing && phase == Some(GamePhase::LevelTransition);
            show(&document, "level-popup", transition);
            if transition {
                set_text(&document, "popup-level", &self.app.level().to_string());
            }
            if let Screen::GameOver { score, level } = screen {
                set_text(&document, "final-score", &score.to_string());
                set_text(&document, "final-level", &level.to_string());
            }
            show(&document, "game-over", matches!(screen, Screen::GameOver { .. }));
            show(&document, "exit-screen", screen == Screen::Exit);

            let sound = if self.app.sound_config().effects {
                "Sound: On"
            } else {
                "Sound: Off"
            };
            set_text(&document, "sound-btn", sound);
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    /// Toggle only `hidden`; panels keep their other classes
    fn show(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Eskilaum starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        // Square backing store at device resolution
        let dpr = window.device_pixel_ratio();
        let side = (f64::from(canvas.client_width().min(canvas.client_height())) * dpr) as u32;
        let side = side.max(GRID_SIZE as u32);
        canvas.set_width(side);
        canvas.set_height(side);

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .expect("no 2d context")
            .dyn_into()
            .expect("not a 2d context");

        let store = LocalStore::open();
        let audio = AudioManager::new(&SoundConfig::default());
        let seed = js_sys::Date::now() as u64;
        let app = App::new(store, audio, seed);

        let game = Rc::new(RefCell::new(Game {
            app,
            clock: BrowserClock::default(),
            ctx,
            canvas,
            shown: None,
        }));
        log::info!("Game initialized with seed: {}", seed);

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }
        game.borrow().update_hud();

        setup_keyboard(game.clone());
        setup_buttons(&document, game.clone());
        setup_auto_pause(game.clone());

        request_animation_frame(game);

        log::info!("Eskilaum running!");
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            let key = event.key();
            if key.starts_with("Arrow") {
                // Keep the page from scrolling
                event.prevent_default();
            }
            let mut g = game.borrow_mut();
            g.app.audio().resume();
            let now = g.now();
            g.app.key(&key, now);
        });
        let _ = window
            .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Attach a click handler to a button by id
    fn on_click(document: &Document, id: &str, game: Rc<RefCell<Game>>, action: fn(&mut Game)) {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("Missing button #{}", id);
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            let mut g = game.borrow_mut();
            g.app.audio().resume();
            action(&mut g);
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        on_click(document, "start-btn", game.clone(), |g| {
            let now = g.now();
            g.app.start(now);
        });
        on_click(document, "retry-btn", game.clone(), |g| {
            let now = g.now();
            g.app.retry(now);
        });
        on_click(document, "menu-btn", game.clone(), |g| g.app.back_to_menu());
        on_click(document, "pause-btn", game.clone(), |g| {
            let now = g.now();
            g.app.toggle_pause(now);
        });
        on_click(document, "continue-btn", game.clone(), |g| {
            let now = g.now();
            g.app.toggle_pause(now);
        });
        on_click(document, "reset-btn", game.clone(), |g| g.app.back_to_menu());
        on_click(document, "sound-btn", game.clone(), |g| {
            g.app.toggle_sound();
            g.update_hud();
        });
        on_click(document, "exit-btn", game.clone(), |g| {
            let now = g.now();
            g.app.exit(now);
        });
        on_click(document, "new-game-btn", game, |g| g.app.back_to_menu());
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().app.auto_pause();
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().app.auto_pause();
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            game_loop(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>) {
        game.borrow_mut().frame();
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Eskilaum (native) starting...");
    log::info!("Native mode is headless - build for wasm32 to play in the browser");

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0xE5C1_u64);
    autopilot::run(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless game with a greedy nut-chasing driver
#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use eskilaum::persistence::MemoryStore;
    use eskilaum::platform::{Clock, ManualClock};
    use eskilaum::sim::tick::collision_at;
    use eskilaum::sim::{Direction, GamePhase, Session};
    use eskilaum::{App, AudioManager, Screen, SoundConfig, tick_interval_ms};

    /// Give up after this much simulated time
    const MAX_SIM_MS: u64 = 10 * 60 * 1000;

    pub fn run(seed: u64) {
        let clock = ManualClock::new(0);
        let mut app = App::new(
            MemoryStore::new(),
            AudioManager::new(&SoundConfig::default()),
            seed,
        );
        app.start(clock.now_ms());

        while clock.now_ms() < MAX_SIM_MS {
            if let Some(session) = app.session()
                && session.phase() == GamePhase::Playing
                && let Some(direction) = choose(session)
            {
                app.key(key_for(direction), clock.now_ms());
            }

            let step = app
                .session()
                .map_or(1, |s| tick_interval_ms(s.level()));
            clock.advance(step);
            app.update(clock.now_ms());

            if let Screen::GameOver { score, level } = app.screen() {
                log::info!("Autopilot crashed on level {} with {} points", level, score);
                return;
            }
        }
        log::info!(
            "Autopilot still alive after {}s, reached level {}",
            MAX_SIM_MS / 1000,
            app.level()
        );
    }

    /// Safe heading closest to the nut, if any
    fn choose(session: &Session) -> Option<Direction> {
        let state = session.state();
        let head = state.head();
        Direction::ALL
            .into_iter()
            .filter(|&d| d == state.direction || d.is_perpendicular(state.direction))
            .filter(|&d| collision_at(state, head + d.vector()).is_none())
            .min_by_key(|&d| {
                let next = head + d.vector();
                (next - state.food).abs().element_sum()
            })
    }

    fn key_for(direction: Direction) -> &'static str {
        match direction {
            Direction::Up => "ArrowUp",
            Direction::Down => "ArrowDown",
            Direction::Left => "ArrowLeft",
            Direction::Right => "ArrowRight",
        }
    }
}
