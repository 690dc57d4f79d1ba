use ratatui::{buffer::Buffer, layout::Rect};

use crate::app::{App, AppState};
use crate::ui::{render_game_over, render_menu, render_playing, review::render_review};

/// A UI Screen boundary: draws one application state
pub trait Screen {
    fn title(&self) -> &'static str;
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

pub struct MenuScreen;

impl Screen for MenuScreen {
    fn title(&self) -> &'static str {
        "menu"
    }

    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_menu(app, area, buf);
    }
}

pub struct PlayingScreen;

impl Screen for PlayingScreen {
    fn title(&self) -> &'static str {
        "typing"
    }

    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_playing(app, area, buf);
    }
}

pub struct GameOverScreen;

impl Screen for GameOverScreen {
    fn title(&self) -> &'static str {
        "results"
    }

    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_game_over(app, area, buf);
    }
}

pub struct ReviewScreen;

impl Screen for ReviewScreen {
    fn title(&self) -> &'static str {
        "review"
    }

    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_review(app, area, buf);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Menu => Box::new(MenuScreen),
        AppState::Playing => Box::new(PlayingScreen),
        AppState::GameOver => Box::new(GameOverScreen),
        AppState::Review => Box::new(ReviewScreen),
    }
}
