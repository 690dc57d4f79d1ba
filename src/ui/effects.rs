use rand::seq::SliceRandom;
use rand::Rng;
use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use tracing::debug;

use crate::observer::SessionObserver;

/// Fixed animation timestep, one per app tick.
pub const EFFECT_DT: f64 = 0.1;

const FLASH_SECS: f64 = 0.3;
const POPUP_SECS: f64 = 1.2;
const POPUP_RISE: f64 = 2.0;
const SPARKS_PER_WORD: usize = 12;
const SPARK_SYMBOLS: [char; 5] = ['*', '+', '.', 'o', '✦'];

/// "+N" text floating up from the sentence after a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ScorePopup {
    pub text: String,
    pub age: f64,
}

impl ScorePopup {
    /// Rows above the anchor the popup has drifted so far.
    pub fn rise(&self) -> u16 {
        ((self.age / POPUP_SECS) * POPUP_RISE).round() as u16
    }

    pub fn fading(&self) -> bool {
        self.age > POPUP_SECS * 0.6
    }
}

/// Burst particle, positioned relative to the sentence centre in cells.
#[derive(Debug, Clone)]
pub struct Spark {
    pub dx: f64,
    pub dy: f64,
    vel_x: f64,
    vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
}

impl Spark {
    fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            vel_x: rng.gen_range(-12.0..12.0),
            vel_y: rng.gen_range(-6.0..-1.0),
            symbol: *SPARK_SYMBOLS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..6),
            age: 0.0,
            max_age: rng.gen_range(0.6..1.2),
        }
    }

    fn update(&mut self, dt: f64) -> bool {
        self.dx += self.vel_x * dt;
        self.dy += self.vel_y * dt;
        self.vel_y += 15.0 * dt;
        self.age += dt;
        self.age < self.max_age
    }

    pub fn alpha(&self) -> f64 {
        1.0 - (self.age / self.max_age)
    }
}

/// Visual feedback driven by session signals: a red flash on mistakes, a score popup
/// and a burst of sparks on each completed sentence.
#[derive(Debug, Default)]
pub struct FeedbackEffects {
    flash: Cell<f64>,
    popups: RefCell<Vec<ScorePopup>>,
    sparks: RefCell<Vec<Spark>>,
}

impl FeedbackEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ages every effect by one timestep and drops the expired ones.
    pub fn advance(&self, dt: f64) {
        self.flash.set((self.flash.get() - dt).max(0.0));
        self.popups.borrow_mut().retain_mut(|p| {
            p.age += dt;
            p.age < POPUP_SECS
        });
        self.sparks.borrow_mut().retain_mut(|s| s.update(dt));
    }

    pub fn flash_active(&self) -> bool {
        self.flash.get() > 0.0
    }

    pub fn popups(&self) -> Vec<ScorePopup> {
        self.popups.borrow().clone()
    }

    pub fn sparks(&self) -> Vec<Spark> {
        self.sparks.borrow().clone()
    }

    pub fn is_idle(&self) -> bool {
        !self.flash_active() && self.popups.borrow().is_empty() && self.sparks.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.flash.set(0.0);
        self.popups.borrow_mut().clear();
        self.sparks.borrow_mut().clear();
    }
}

impl SessionObserver for FeedbackEffects {
    fn on_mistake(&self) {
        self.flash.set(FLASH_SECS);
    }

    fn on_word_complete(&self, chars_completed: usize) {
        self.popups.borrow_mut().push(ScorePopup {
            text: format!("+{chars_completed}"),
            age: 0.0,
        });
        let mut rng = rand::thread_rng();
        self.sparks
            .borrow_mut()
            .extend((0..SPARKS_PER_WORD).map(|_| Spark::new(&mut rng)));
    }

    fn on_session_end(&self) {
        self.sparks.borrow_mut().clear();
    }
}

/// Rings the terminal bell on mistakes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl SessionObserver for TerminalBell {
    fn on_mistake(&self) {
        let mut out = io::stdout();
        if let Err(e) = out.write_all(b"\x07").and_then(|()| out.flush()) {
            debug!(error = %e, "bell failed");
        }
    }
}
