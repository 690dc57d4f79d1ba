use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

/// Receives fire-and-forget signals from a typing session.
///
/// Every method defaults to a no-op so audio, animation or logging collaborators only
/// implement what they react to. The session calls these unconditionally.
pub trait SessionObserver {
    fn on_correct_keystroke(&self) {}
    fn on_mistake(&self) {}
    fn on_word_complete(&self, _chars_completed: usize) {}
    fn on_new_word(&self) {}
    fn on_session_end(&self) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Logs each signal through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn on_correct_keystroke(&self) {
        trace!("correct keystroke");
    }

    fn on_mistake(&self) {
        debug!("mistake");
    }

    fn on_word_complete(&self, chars_completed: usize) {
        debug!(chars_completed, "word complete");
    }

    fn on_new_word(&self) {
        trace!("new word");
    }

    fn on_session_end(&self) {
        debug!("session end");
    }
}

/// Fans every signal out to several observers in insertion order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Rc<dyn SessionObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Rc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl SessionObserver for CompositeObserver {
    fn on_correct_keystroke(&self) {
        self.observers.iter().for_each(|o| o.on_correct_keystroke());
    }

    fn on_mistake(&self) {
        self.observers.iter().for_each(|o| o.on_mistake());
    }

    fn on_word_complete(&self, chars_completed: usize) {
        self.observers
            .iter()
            .for_each(|o| o.on_word_complete(chars_completed));
    }

    fn on_new_word(&self) {
        self.observers.iter().for_each(|o| o.on_new_word());
    }

    fn on_session_end(&self) {
        self.observers.iter().for_each(|o| o.on_session_end());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    CorrectKeystroke,
    Mistake,
    WordComplete(usize),
    NewWord,
    SessionEnd,
}

/// Keeps every signal it sees; used by headless tests.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    signals: RefCell<Vec<Signal>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.signals.borrow().clone()
    }

    pub fn count(&self, signal: Signal) -> usize {
        self.signals.borrow().iter().filter(|s| **s == signal).count()
    }

    pub fn clear(&self) {
        self.signals.borrow_mut().clear();
    }

    fn push(&self, signal: Signal) {
        self.signals.borrow_mut().push(signal);
    }
}

impl SessionObserver for RecordingObserver {
    fn on_correct_keystroke(&self) {
        self.push(Signal::CorrectKeystroke);
    }

    fn on_mistake(&self) {
        self.push(Signal::Mistake);
    }

    fn on_word_complete(&self, chars_completed: usize) {
        self.push(Signal::WordComplete(chars_completed));
    }

    fn on_new_word(&self) {
        self.push(Signal::NewWord);
    }

    fn on_session_end(&self) {
        self.push(Signal::SessionEnd);
    }
}
