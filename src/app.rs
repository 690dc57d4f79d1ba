use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info};

use crate::catalog::ContentCatalog;
use crate::config::Config;
use crate::observer::{CompositeObserver, SessionObserver, TracingObserver};
use crate::record::{HighScoreRecord, RecordStore};
use crate::runtime::{Clock, GameEvent};
use crate::session::{KeyInput, SessionContext, TypingSession};
use crate::ui::effects::{FeedbackEffects, EFFECT_DT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Menu,
    Playing,
    GameOver,
    Review,
}

/// Top-level state machine: owns the collaborators and the current session.
pub struct App {
    catalog: Rc<ContentCatalog>,
    clock: Rc<dyn Clock>,
    record: Rc<dyn RecordStore>,
    effects: Rc<FeedbackEffects>,
    extra_observers: Vec<Rc<dyn SessionObserver>>,
    config: Config,
    best: HighScoreRecord,
    state: AppState,
    session: Option<TypingSession>,
    should_quit: bool,
}

impl App {
    pub fn new(
        catalog: ContentCatalog,
        record: Rc<dyn RecordStore>,
        clock: Rc<dyn Clock>,
        config: Config,
    ) -> Self {
        let best = record.load();
        Self {
            catalog: Rc::new(catalog),
            clock,
            record,
            effects: Rc::new(FeedbackEffects::new()),
            extra_observers: Vec::new(),
            config,
            best,
            state: AppState::Menu,
            session: None,
            should_quit: false,
        }
    }

    /// Attach another observer to every session this app starts.
    pub fn with_observer(mut self, observer: Rc<dyn SessionObserver>) -> Self {
        self.extra_observers.push(observer);
        self
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn session(&self) -> Option<&TypingSession> {
        self.session.as_ref()
    }

    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn best_record(&self) -> &HighScoreRecord {
        &self.best
    }

    pub fn effects(&self) -> &FeedbackEffects {
        &self.effects
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Key(key) => self.handle_key(key),
            GameEvent::Tick => self.tick(),
            GameEvent::Resize => {}
        }
    }

    /// Advances animations and checks the session clock. Call once per loop iteration.
    pub fn tick(&mut self) {
        self.effects.advance(EFFECT_DT);
        if self.state == AppState::Playing {
            if let Some(session) = self.session.as_mut() {
                session.check_time();
            }
            self.sync_session_end();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.state {
            AppState::Menu => match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => self.start_session(),
                KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            },
            AppState::Playing => self.handle_playing_key(key),
            AppState::GameOver => match key.code {
                KeyCode::Char(' ') => self.start_session(),
                KeyCode::Char('i') => {
                    if self.session.as_ref().is_some_and(|s| !s.review().is_empty()) {
                        self.state = AppState::Review;
                    }
                }
                KeyCode::Esc => self.back_to_menu(),
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            },
            AppState::Review => match key.code {
                KeyCode::Char('a') | KeyCode::Left => {
                    if let Some(review) = self.session.as_mut().and_then(TypingSession::review_mut) {
                        review.previous();
                    }
                }
                KeyCode::Char('d') | KeyCode::Right => {
                    if let Some(review) = self.session.as_mut().and_then(TypingSession::review_mut) {
                        review.next();
                    }
                }
                KeyCode::Esc => self.state = AppState::GameOver,
                _ => {}
            },
        }
    }

    fn handle_playing_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            if let Some(session) = self.session.take() {
                session.abort();
            }
            self.back_to_menu();
            return;
        }

        let input = match key.code {
            KeyCode::Backspace => KeyInput::Backspace,
            KeyCode::Enter => KeyInput::Confirm,
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                KeyInput::Char(c)
            }
            _ => return,
        };

        if let Some(session) = self.session.as_mut() {
            let outcome = session.handle(input);
            debug!(?input, ?outcome, "key handled");
        }
        self.sync_session_end();
    }

    fn start_session(&mut self) {
        let mut observer = CompositeObserver::new()
            .with(self.effects.clone())
            .with(Rc::new(TracingObserver));
        for extra in &self.extra_observers {
            observer = observer.with(extra.clone());
        }

        let ctx = SessionContext {
            catalog: self.catalog.clone(),
            clock: self.clock.clone(),
            observer: Rc::new(observer),
            record: self.record.clone(),
        };
        self.effects.clear();
        self.session = Some(TypingSession::start(ctx, self.config.session_config()));
        self.state = AppState::Playing;
    }

    fn sync_session_end(&mut self) {
        if self.state == AppState::Playing && self.session.as_ref().is_some_and(TypingSession::is_ended) {
            self.best = self.record.load();
            self.state = AppState::GameOver;
            info!(high_score = self.best.high_score, "game over");
        }
    }

    fn back_to_menu(&mut self) {
        self.session = None;
        self.effects.clear();
        self.best = self.record.load();
        self.state = AppState::Menu;
    }
}
