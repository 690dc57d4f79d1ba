use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use cloudtype::catalog::{ContentCatalog, Sentence};
use cloudtype::config::Config;
use cloudtype::observer::{RecordingObserver, Signal};
use cloudtype::record::MemoryRecordStore;
use cloudtype::runtime::{FixedTicker, GameEvent, ManualClock, Runner, TestEventSource};
use cloudtype::{App, AppState};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

fn key(code: KeyCode) -> GameEvent {
    GameEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn send_text(tx: &mpsc::Sender<GameEvent>, text: &str) {
    for c in text.chars() {
        tx.send(key(KeyCode::Char(c))).unwrap();
    }
}

fn build_app(clock: &ManualClock, record: Rc<MemoryRecordStore>) -> (App, Rc<RecordingObserver>) {
    let catalog = ContentCatalog::from_sentences(vec![Sentence::new("My EC2 instance", "EC2")
        .unwrap()
        .with_description("virtual servers")]);
    let observer = Rc::new(RecordingObserver::new());
    let app = App::new(catalog, record, Rc::new(clock.clone()), Config::default())
        .with_observer(observer.clone());
    (app, observer)
}

/// One loop iteration the way the binary runs it: drain a batch, then tick.
fn pump<T: cloudtype::runtime::Ticker>(runner: &Runner<TestEventSource, T>, app: &mut App) {
    for event in runner.next_batch() {
        app.handle_event(event);
    }
    app.tick();
}

// Headless run through the event runtime without a TTY
#[test]
fn headless_round_completes_and_records_score() {
    let clock = ManualClock::new();
    let record = Rc::new(MemoryRecordStore::new());
    let (mut app, observer) = build_app(&clock, record.clone());

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));

    tx.send(key(KeyCode::Char(' '))).unwrap();
    pump(&runner, &mut app);
    assert_eq!(app.state(), AppState::Playing);

    clock.advance(Duration::from_secs(6));
    send_text(&tx, "My EC2 instance");
    pump(&runner, &mut app);

    let session = app.session().unwrap();
    assert_eq!(session.completed_terms(), ["EC2"]);
    assert_eq!(session.score(), 30);

    clock.advance(Duration::from_secs(54));
    pump(&runner, &mut app);
    assert_eq!(app.state(), AppState::GameOver);

    // 3 words over the whole minute
    assert_eq!(app.session().unwrap().score(), 3);
    assert_eq!(record.writes(), 1);
    assert_eq!(observer.count(Signal::SessionEnd), 1);
    assert_eq!(observer.count(Signal::WordComplete(15)), 1);

    // further ticks do not end the session again
    pump(&runner, &mut app);
    pump(&runner, &mut app);
    assert_eq!(record.writes(), 1);
    assert_eq!(observer.count(Signal::SessionEnd), 1);
}

#[test]
fn headless_events_in_one_batch_keep_order() {
    let clock = ManualClock::new();
    let (mut app, _) = build_app(&clock, Rc::new(MemoryRecordStore::new()));

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));

    tx.send(key(KeyCode::Enter)).unwrap();
    // accept, reject, erase, then retype
    send_text(&tx, "Mx");
    tx.send(key(KeyCode::Backspace)).unwrap();
    send_text(&tx, "My");
    pump(&runner, &mut app);

    let session = app.session().unwrap();
    // backspace removed the accepted 'M', so "My" retyped cleanly
    assert_eq!(session.typed_prefix(), "My");
    assert_eq!(session.mistakes(), 1);
    assert_eq!(session.correct_chars(), 2);
}

#[test]
fn headless_abort_does_not_persist() {
    let clock = ManualClock::new();
    let record = Rc::new(MemoryRecordStore::new());
    let (mut app, observer) = build_app(&clock, record.clone());

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));

    tx.send(key(KeyCode::Char(' '))).unwrap();
    clock.advance(Duration::from_secs(3));
    send_text(&tx, "My EC2 instance");
    tx.send(key(KeyCode::Esc)).unwrap();
    pump(&runner, &mut app);

    assert_eq!(app.state(), AppState::Menu);
    clock.advance(Duration::from_secs(120));
    pump(&runner, &mut app);

    assert_eq!(record.writes(), 0);
    assert_eq!(observer.count(Signal::SessionEnd), 0);
}

#[test]
fn headless_review_navigation() {
    let clock = ManualClock::new();
    let catalog = ContentCatalog::from_sentences(vec![
        Sentence::new("Put it in S3", "S3").unwrap(),
        Sentence::new("Put it in S3", "S3").unwrap(),
    ]);
    let mut app = App::new(
        catalog,
        Rc::new(MemoryRecordStore::new()),
        Rc::new(clock.clone()),
        Config::default(),
    );

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));

    tx.send(key(KeyCode::Char(' '))).unwrap();
    send_text(&tx, "Put it in S3Put it in S3");
    pump(&runner, &mut app);
    clock.advance(Duration::from_secs(60));
    pump(&runner, &mut app);

    tx.send(key(KeyCode::Char('i'))).unwrap();
    tx.send(key(KeyCode::Char('d'))).unwrap();
    pump(&runner, &mut app);

    assert_eq!(app.state(), AppState::Review);
    let review = app.session().unwrap().review();
    assert_eq!(review.terms(), ["S3"]);
    assert_eq!(review.cursor(), 0);

    tx.send(key(KeyCode::Char('q'))).unwrap();
    pump(&runner, &mut app);
    assert!(!app.should_quit());
    tx.send(key(KeyCode::Esc)).unwrap();
    tx.send(key(KeyCode::Char('q'))).unwrap();
    pump(&runner, &mut app);
    assert!(app.should_quit());
}
