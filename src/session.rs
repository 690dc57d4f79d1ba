use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::catalog::{ContentCatalog, Sentence};
use crate::observer::SessionObserver;
use crate::progress::ProgressPoint;
use crate::record::RecordStore;
use crate::review::SessionReviewList;
use crate::runtime::Clock;
use crate::scoring::{self, Tier};

pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    Ended,
}

/// One key-level input, already decoded from the terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    /// Explicit enter. Completes the sentence only when the typed text already matches.
    Confirm,
}

/// What a single input did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Character appended to the typed prefix.
    Accepted,
    /// Wrong character or premature confirm; counted as a mistake.
    Rejected,
    /// The sentence was finished and a new one drawn.
    Completed,
    /// Backspace removed a character.
    Erased,
    /// No effect: backspace on empty prefix or input after the session ended.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub time_limit: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT,
        }
    }
}

impl SessionConfig {
    pub fn with_time_limit(time_limit: Duration) -> Self {
        Self { time_limit }
    }
}

/// Collaborators a session is built with. Owned by the application, shared per session.
#[derive(Clone)]
pub struct SessionContext {
    pub catalog: Rc<ContentCatalog>,
    pub clock: Rc<dyn Clock>,
    pub observer: Rc<dyn SessionObserver>,
    pub record: Rc<dyn RecordStore>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("catalog_len", &self.catalog.len())
            .finish_non_exhaustive()
    }
}

/// Final numbers, fixed at the moment the session ends.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub score: u32,
    pub tier: Tier,
    pub previous_high_score: u32,
    pub new_high_score: bool,
    pub completed_sentences: usize,
    pub completed_chars: usize,
    pub correct_chars: usize,
    pub mistakes: usize,
    pub elapsed: Duration,
    pub wpm: f64,
    pub cpm: f64,
    pub keystroke_accuracy: f64,
    pub terms: Vec<String>,
}

/// A single timed play-through.
///
/// The typed prefix only ever holds characters that matched the target, so it is
/// always a prefix of the current sentence. Once the time limit passes the session
/// moves to [`Phase::Ended`] exactly once and ignores further input.
#[derive(Debug)]
pub struct TypingSession {
    ctx: SessionContext,
    config: SessionConfig,
    sentence: Sentence,
    typed: String,
    correct_chars: usize,
    mistakes: usize,
    completed_chars: usize,
    completed_sentences: usize,
    score: u32,
    started_at: Instant,
    ended_at: Option<Instant>,
    phase: Phase,
    review: SessionReviewList,
    progress: Vec<ProgressPoint>,
    summary: Option<SessionSummary>,
}

impl TypingSession {
    pub fn start(ctx: SessionContext, config: SessionConfig) -> Self {
        let sentence = ctx.catalog.sample_sentence();
        let started_at = ctx.clock.now();
        info!(
            time_limit_secs = config.time_limit.as_secs_f64(),
            sentences = ctx.catalog.len(),
            "session started"
        );

        Self {
            ctx,
            config,
            sentence,
            typed: String::new(),
            correct_chars: 0,
            mistakes: 0,
            completed_chars: 0,
            completed_sentences: 0,
            score: 0,
            started_at,
            ended_at: None,
            phase: Phase::Active,
            review: SessionReviewList::new(),
            progress: Vec::new(),
            summary: None,
        }
    }

    /// Checks the clock, then applies `input` if the session is still active.
    pub fn handle(&mut self, input: KeyInput) -> KeyOutcome {
        if self.check_time() == Phase::Ended {
            return KeyOutcome::Ignored;
        }
        match input {
            KeyInput::Char(c) => self.type_char(c),
            KeyInput::Backspace => self.backspace(),
            KeyInput::Confirm => self.confirm(),
        }
    }

    fn type_char(&mut self, c: char) -> KeyOutcome {
        if self.expected_char() != Some(c) {
            self.mistakes += 1;
            debug!(typed = %c, expected = ?self.expected_char(), "rejected keystroke");
            self.ctx.observer.on_mistake();
            return KeyOutcome::Rejected;
        }

        self.typed.push(c);
        self.correct_chars += 1;
        self.ctx.observer.on_correct_keystroke();

        if self.typed == self.sentence.text() {
            self.complete_sentence();
            KeyOutcome::Completed
        } else {
            KeyOutcome::Accepted
        }
    }

    fn backspace(&mut self) -> KeyOutcome {
        if self.typed.pop().is_none() {
            return KeyOutcome::Ignored;
        }
        self.correct_chars = self.correct_chars.saturating_sub(1);
        KeyOutcome::Erased
    }

    fn confirm(&mut self) -> KeyOutcome {
        if self.typed == self.sentence.text() {
            self.complete_sentence();
            return KeyOutcome::Completed;
        }
        self.mistakes += 1;
        self.ctx.observer.on_mistake();
        KeyOutcome::Rejected
    }

    fn complete_sentence(&mut self) {
        let len = self.sentence.char_len();
        self.completed_chars += len;
        self.completed_sentences += 1;

        let elapsed = self.elapsed();
        self.score = scoring::score(self.correct_chars, self.completed_chars, elapsed);
        self.progress.push(ProgressPoint::new(
            elapsed.as_secs_f64(),
            scoring::wpm(self.correct_chars, elapsed),
            self.score,
        ));
        self.review.push_term(self.sentence.term());
        debug!(
            term = self.sentence.term(),
            chars = len,
            score = self.score,
            "sentence completed"
        );
        self.ctx.observer.on_word_complete(len);

        self.sentence = self.ctx.catalog.sample_sentence();
        self.typed.clear();
        self.ctx.observer.on_new_word();
    }

    /// Ends the session if the time limit has passed. Safe to call on every tick.
    pub fn check_time(&mut self) -> Phase {
        if self.phase == Phase::Active && self.elapsed() >= self.config.time_limit {
            self.end();
        }
        self.phase
    }

    fn end(&mut self) {
        let now = self.ctx.clock.now();
        self.ended_at = Some(now);
        self.phase = Phase::Ended;

        let elapsed = self.elapsed();
        self.score = scoring::score(self.correct_chars, self.completed_chars, elapsed);
        self.ctx.observer.on_session_end();

        let previous_high_score = self.ctx.record.load().high_score;
        let new_high_score = self.ctx.record.record_if_higher(self.score);

        let summary = SessionSummary {
            score: self.score,
            tier: Tier::for_score(self.score),
            previous_high_score,
            new_high_score,
            completed_sentences: self.completed_sentences,
            completed_chars: self.completed_chars,
            correct_chars: self.correct_chars,
            mistakes: self.mistakes,
            elapsed,
            wpm: scoring::wpm(self.correct_chars, elapsed),
            cpm: scoring::cpm(self.completed_chars, elapsed),
            keystroke_accuracy: self.keystroke_accuracy(),
            terms: self.review.terms().to_vec(),
        };
        info!(
            score = summary.score,
            tier = %summary.tier,
            mistakes = summary.mistakes,
            completed_sentences = summary.completed_sentences,
            new_high_score,
            "session ended"
        );
        self.summary = Some(summary);
    }

    /// Leaves the session without recording its score.
    pub fn abort(self) {
        info!(
            phase = ?self.phase,
            score = self.score,
            "session aborted"
        );
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    pub fn sentence(&self) -> &Sentence {
        &self.sentence
    }

    pub fn current_sentence_text(&self) -> &str {
        self.sentence.text()
    }

    pub fn typed_prefix(&self) -> &str {
        &self.typed
    }

    pub fn term(&self) -> &str {
        self.sentence.term()
    }

    /// The next character the player has to type.
    pub fn expected_char(&self) -> Option<char> {
        self.sentence.text()[self.typed.len()..].chars().next()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn mistakes(&self) -> usize {
        self.mistakes
    }

    pub fn correct_chars(&self) -> usize {
        self.correct_chars
    }

    pub fn completed_chars(&self) -> usize {
        self.completed_chars
    }

    pub fn completed_sentences(&self) -> usize {
        self.completed_sentences
    }

    pub fn time_limit(&self) -> Duration {
        self.config.time_limit
    }

    /// Time since start; frozen once the session has ended.
    pub fn elapsed(&self) -> Duration {
        let until = self.ended_at.unwrap_or_else(|| self.ctx.clock.now());
        until.saturating_duration_since(self.started_at)
    }

    pub fn remaining_secs(&self) -> f64 {
        if self.is_ended() {
            return 0.0;
        }
        self.config
            .time_limit
            .saturating_sub(self.elapsed())
            .as_secs_f64()
    }

    pub fn evaluation(&self) -> Tier {
        Tier::for_score(self.score)
    }

    pub fn completed_terms(&self) -> &[String] {
        self.review.terms()
    }

    pub fn wpm(&self) -> f64 {
        scoring::wpm(self.correct_chars, self.elapsed())
    }

    pub fn cpm(&self) -> f64 {
        scoring::cpm(self.completed_chars, self.elapsed())
    }

    pub fn keystroke_accuracy(&self) -> f64 {
        scoring::keystroke_accuracy(self.correct_chars, self.mistakes)
    }

    pub fn progress(&self) -> &[ProgressPoint] {
        &self.progress
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn catalog(&self) -> &ContentCatalog {
        &self.ctx.catalog
    }

    pub fn review(&self) -> &SessionReviewList {
        &self.review
    }

    /// Cursor control for the review screen; only available after the session ended.
    pub fn review_mut(&mut self) -> Option<&mut SessionReviewList> {
        match self.phase {
            Phase::Ended => Some(&mut self.review),
            Phase::Active => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{RecordingObserver, Signal};
    use crate::record::MemoryRecordStore;
    use crate::runtime::ManualClock;
    use assert_matches::assert_matches;

    struct Harness {
        clock: ManualClock,
        observer: Rc<RecordingObserver>,
        record: Rc<MemoryRecordStore>,
        session: TypingSession,
    }

    fn harness_with(catalog: ContentCatalog, high_score: u32) -> Harness {
        let clock = ManualClock::new();
        let observer = Rc::new(RecordingObserver::new());
        let record = Rc::new(MemoryRecordStore::with_high_score(high_score));
        let ctx = SessionContext {
            catalog: Rc::new(catalog),
            clock: Rc::new(clock.clone()),
            observer: observer.clone(),
            record: record.clone(),
        };
        Harness {
            clock,
            observer,
            record,
            session: TypingSession::start(ctx, SessionConfig::default()),
        }
    }

    fn ec2_catalog() -> ContentCatalog {
        ContentCatalog::from_sentences(vec![Sentence::new("My EC2 instance", "EC2")
            .unwrap()
            .with_description("virtual servers")])
    }

    fn harness() -> Harness {
        harness_with(ec2_catalog(), 0)
    }

    fn type_str(session: &mut TypingSession, s: &str) -> Vec<KeyOutcome> {
        s.chars().map(|c| session.handle(KeyInput::Char(c))).collect()
    }

    #[test]
    fn test_start_state() {
        let h = harness();
        let s = &h.session;
        assert_eq!(s.phase(), Phase::Active);
        assert_eq!(s.current_sentence_text(), "My EC2 instance");
        assert_eq!(s.term(), "EC2");
        assert_eq!(s.typed_prefix(), "");
        assert_eq!((s.score(), s.mistakes(), s.correct_chars()), (0, 0, 0));
        assert_eq!(s.remaining_secs(), 60.0);
        assert_eq!(s.expected_char(), Some('M'));
        assert!(s.summary().is_none());
    }

    #[test]
    fn test_full_sentence_completes_automatically() {
        let mut h = harness();
        let outcomes = type_str(&mut h.session, "My EC2 instance");

        assert!(outcomes[..14].iter().all(|o| *o == KeyOutcome::Accepted));
        assert_eq!(outcomes[14], KeyOutcome::Completed);
        assert_eq!(h.session.correct_chars(), 15);
        assert_eq!(h.session.completed_chars(), 15);
        assert_eq!(h.session.completed_terms(), ["EC2"]);
        assert_eq!(h.session.typed_prefix(), "");
        assert_eq!(h.session.completed_sentences(), 1);

        let signals = h.observer.signals();
        assert_eq!(h.observer.count(Signal::CorrectKeystroke), 15);
        assert_eq!(
            signals[signals.len() - 2..],
            [Signal::WordComplete(15), Signal::NewWord]
        );
    }

    #[test]
    fn test_wrong_char_is_rejected_and_counted() {
        let mut h = harness();
        type_str(&mut h.session, "My");

        assert_eq!(h.session.handle(KeyInput::Char('x')), KeyOutcome::Rejected);
        assert_eq!(h.session.typed_prefix(), "My");
        assert_eq!(h.session.mistakes(), 1);

        assert_eq!(h.session.handle(KeyInput::Char(' ')), KeyOutcome::Accepted);
        assert_eq!(h.session.typed_prefix(), "My ");
        assert_eq!(h.session.correct_chars(), 3);
        assert_eq!(h.observer.count(Signal::Mistake), 1);
    }

    #[test]
    fn test_case_sensitive_match() {
        let mut h = harness();
        assert_eq!(h.session.handle(KeyInput::Char('m')), KeyOutcome::Rejected);
        assert_eq!(h.session.typed_prefix(), "");
    }

    #[test]
    fn test_backspace() {
        let mut h = harness();
        assert_eq!(h.session.handle(KeyInput::Backspace), KeyOutcome::Ignored);
        assert_eq!(h.session.correct_chars(), 0);

        type_str(&mut h.session, "My E");
        assert_eq!(h.session.handle(KeyInput::Backspace), KeyOutcome::Erased);
        assert_eq!(h.session.typed_prefix(), "My ");
        assert_eq!(h.session.correct_chars(), 3);
        // mistakes are never undone
        h.session.handle(KeyInput::Char('!'));
        h.session.handle(KeyInput::Backspace);
        assert_eq!(h.session.mistakes(), 1);
    }

    #[test]
    fn test_confirm_before_match_is_a_mistake() {
        let mut h = harness();
        type_str(&mut h.session, "My EC2");
        assert_eq!(h.session.handle(KeyInput::Confirm), KeyOutcome::Rejected);
        assert_eq!(h.session.mistakes(), 1);
        assert_eq!(h.session.typed_prefix(), "My EC2");
    }

    #[test]
    fn test_score_recomputed_on_completion() {
        let mut h = harness();
        h.clock.advance(Duration::from_secs(6));
        type_str(&mut h.session, "My EC2 instance");

        // 15 chars = 3 words in 0.1 minutes, perfect accuracy
        assert_eq!(h.session.score(), 30);
        assert_eq!(h.session.evaluation(), Tier::Associate);
        assert_eq!(h.session.progress().len(), 1);
        assert_eq!(h.session.progress()[0].score, 30);
        assert_eq!(h.session.progress()[0].secs, 6.0);
    }

    #[test]
    fn test_partial_sentence_does_not_score() {
        let mut h = harness();
        h.clock.advance(Duration::from_secs(6));
        type_str(&mut h.session, "My EC2");
        assert_eq!(h.session.score(), 0);
        assert!(h.session.wpm() > 0.0);
    }

    #[test]
    fn test_time_limit_mid_sentence() {
        let mut h = harness();
        type_str(&mut h.session, "My E");
        h.clock.advance(Duration::from_secs(60));

        assert_eq!(h.session.check_time(), Phase::Ended);
        assert_eq!(h.session.correct_chars(), 4);
        assert_eq!(h.session.completed_chars(), 0);
        assert_eq!(h.session.score(), 0);
        assert_eq!(h.session.remaining_secs(), 0.0);

        assert_eq!(h.session.handle(KeyInput::Char('C')), KeyOutcome::Ignored);
        assert_eq!(h.session.handle(KeyInput::Backspace), KeyOutcome::Ignored);
        assert_eq!(h.session.typed_prefix(), "My E");
        assert_eq!(h.session.correct_chars(), 4);
        // zero does not beat the stored zero
        assert_eq!(h.record.writes(), 0);
    }

    #[test]
    fn test_input_after_deadline_ends_session_first() {
        let mut h = harness();
        h.clock.advance(Duration::from_secs(61));
        assert_eq!(h.session.handle(KeyInput::Char('M')), KeyOutcome::Ignored);
        assert!(h.session.is_ended());
        assert_eq!(h.session.correct_chars(), 0);
    }

    #[test]
    fn test_end_is_idempotent() {
        let mut h = harness();
        h.clock.advance(Duration::from_secs(6));
        type_str(&mut h.session, "My EC2 instance");
        h.clock.advance(Duration::from_secs(54));

        assert_eq!(h.session.check_time(), Phase::Ended);
        let summary = h.session.summary().cloned().unwrap();
        h.clock.advance(Duration::from_secs(30));
        assert_eq!(h.session.check_time(), Phase::Ended);
        assert_eq!(h.session.check_time(), Phase::Ended);

        // 3 words in a full minute
        assert_eq!(summary.score, 3);
        assert_eq!(h.session.score(), 3);
        assert_eq!(h.session.summary(), Some(&summary));
        assert_eq!(h.session.elapsed(), Duration::from_secs(60));
        assert_eq!(h.record.writes(), 1);
        assert_eq!(h.observer.count(Signal::SessionEnd), 1);
    }

    #[test]
    fn test_summary_reports_previous_record() {
        let mut h = harness_with(ec2_catalog(), 25);
        h.clock.advance(Duration::from_secs(6));
        type_str(&mut h.session, "My EC2 instance");
        h.clock.set(Duration::from_secs(6) + DEFAULT_TIME_LIMIT);
        h.session.check_time();

        let summary = h.session.summary().unwrap();
        assert_eq!(summary.previous_high_score, 25);
        assert!(!summary.new_high_score);
        assert_eq!(summary.tier, Tier::Foundational);
        assert_eq!(summary.terms, ["EC2"]);
        assert_eq!(summary.keystroke_accuracy, 1.0);
        assert_eq!(h.record.load().high_score, 25);
    }

    #[test]
    fn test_completed_terms_deduplicate() {
        let mut h = harness();
        type_str(&mut h.session, "My EC2 instance");
        type_str(&mut h.session, "My EC2 instance");
        assert_eq!(h.session.completed_sentences(), 2);
        assert_eq!(h.session.completed_terms(), ["EC2"]);
        assert_eq!(h.session.completed_chars(), 30);
    }

    #[test]
    fn test_keystroke_accuracy() {
        let mut h = harness();
        assert_eq!(h.session.keystroke_accuracy(), 1.0);
        type_str(&mut h.session, "My");
        h.session.handle(KeyInput::Char('?'));
        h.session.handle(KeyInput::Char('?'));
        assert_eq!(h.session.keystroke_accuracy(), 0.5);
    }

    #[test]
    fn test_review_mut_only_after_end() {
        let mut h = harness();
        type_str(&mut h.session, "My EC2 instance");
        assert!(h.session.review_mut().is_none());

        h.clock.advance(Duration::from_secs(60));
        h.session.check_time();
        let review = h.session.review_mut().unwrap();
        assert_eq!(review.current(), Some("EC2"));
    }

    #[test]
    fn test_empty_catalog_uses_fallback() {
        let mut h = harness_with(ContentCatalog::default(), 0);
        assert_eq!(h.session.term(), "EC2");
        let text = h.session.current_sentence_text().to_string();
        let outcomes = type_str(&mut h.session, &text);
        assert_matches!(outcomes.last(), Some(KeyOutcome::Completed));
    }

    #[test]
    fn test_prefix_invariant_under_mixed_input() {
        let mut h = harness();
        let inputs = [
            KeyInput::Char('M'),
            KeyInput::Char('Y'),
            KeyInput::Backspace,
            KeyInput::Backspace,
            KeyInput::Char('M'),
            KeyInput::Char('y'),
            KeyInput::Confirm,
            KeyInput::Char(' '),
        ];
        for input in inputs {
            h.session.handle(input);
            let text = h.session.current_sentence_text();
            assert!(text.starts_with(h.session.typed_prefix()));
            assert!(h.session.typed_prefix().len() < text.len());
        }
        assert_eq!(h.session.typed_prefix(), "My ");
        assert_eq!(h.session.mistakes(), 2);
    }
}
