//! Typewriter intro: one character or line break per tick, then a single
//! delayed hand-off to the 3D view.

use std::time::Duration;

use crate::settings::RevealSettings;

/// A line of intro text, held as characters so ticks never split a
/// code point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealLine(Box<[char]>);

impl RevealLine {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<char> {
        self.0.get(index).copied()
    }
}

impl From<&str> for RevealLine {
    fn from(line: &str) -> Self {
        Self(line.chars().collect())
    }
}

/// Progress through the lines. Only [`RevealState::tick`] produces new states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealState {
    pub line_index: usize,
    pub char_index: usize,
    pub text: String,
}

impl RevealState {
    pub fn is_terminal(&self, lines: &[RevealLine]) -> bool {
        self.line_index >= lines.len()
    }

    /// Next state: the next character of the current line, or a line break
    /// when the line is exhausted. Terminal states map to themselves.
    pub fn tick(&self, lines: &[RevealLine]) -> RevealState {
        let Some(line) = lines.get(self.line_index) else {
            return self.clone();
        };

        let mut next = self.clone();
        match line.get(self.char_index) {
            Some(c) => {
                next.text.push(c);
                next.char_index += 1;
            }
            None => {
                next.text.push('\n');
                next.line_index += 1;
                next.char_index = 0;
            }
        }
        next
    }
}

/// Something the host must do after a [`RevealSequencer::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEffect {
    /// Replace the intro surface's text.
    Text(String),
    /// Hide the intro surface and show the 3D view at full opacity.
    HandOff,
}

/// Drives [`RevealState`] from an external clock. Call
/// [`poll`](Self::poll) whenever convenient; overdue ticks are replayed
/// at their scheduled times so the result does not depend on how often
/// the host polls.
#[derive(Debug, Clone)]
pub struct RevealSequencer {
    lines: Vec<RevealLine>,
    state: RevealState,
    interval: Duration,
    handoff_delay: Duration,
    next_tick_at: Option<Duration>,
    handoff_at: Option<Duration>,
    ticks: usize,
    handoffs_scheduled: usize,
    handed_off: bool,
}

impl RevealSequencer {
    pub fn new(lines: Vec<RevealLine>, interval: Duration, handoff_delay: Duration) -> Self {
        Self {
            lines,
            state: RevealState::default(),
            interval,
            handoff_delay,
            next_tick_at: None,
            handoff_at: None,
            ticks: 0,
            handoffs_scheduled: 0,
            handed_off: false,
        }
    }

    pub fn from_settings(settings: &RevealSettings) -> Self {
        Self::new(
            settings.lines.iter().map(|l| RevealLine::from(l.as_str())).collect(),
            Duration::from_millis(settings.tick_interval_ms),
            Duration::from_millis(settings.handoff_delay_ms),
        )
    }

    /// Ticks needed to type everything: every character plus one line
    /// break per line.
    pub fn total_ticks(&self) -> usize {
        self.lines.iter().map(|l| l.len() + 1).sum()
    }

    /// Begin at `now`; the first tick is due immediately.
    pub fn start(&mut self, now: Duration) {
        if self.next_tick_at.is_some() || self.handoff_at.is_some() || self.handed_off {
            return;
        }
        log::info!(
            "Reveal started: {} lines, {} ticks",
            self.lines.len(),
            self.total_ticks()
        );
        if self.state.is_terminal(&self.lines) {
            self.schedule_handoff(now);
        } else {
            self.next_tick_at = Some(now);
        }
    }

    fn schedule_handoff(&mut self, at: Duration) {
        self.handoff_at = Some(at + self.handoff_delay);
        self.handoffs_scheduled += 1;
        log::debug!("Reveal finished, hand-off at {:?}", self.handoff_at);
    }

    /// Run every tick due by `now` and report what changed.
    pub fn poll(&mut self, now: Duration) -> Vec<RevealEffect> {
        let mut effects = Vec::new();
        let mut text_changed = false;

        while let Some(due) = self.next_tick_at.filter(|due| *due <= now) {
            self.state = self.state.tick(&self.lines);
            self.ticks += 1;
            text_changed = true;

            if self.state.is_terminal(&self.lines) {
                self.next_tick_at = None;
                self.schedule_handoff(due);
            } else {
                self.next_tick_at = Some(due + self.interval);
            }
        }
        if text_changed {
            effects.push(RevealEffect::Text(self.state.text.clone()));
        }

        if let Some(at) = self.handoff_at.filter(|at| *at <= now) {
            log::info!("Reveal hand-off at {:?}", at);
            self.handoff_at = None;
            self.handed_off = true;
            effects.push(RevealEffect::HandOff);
        }
        effects
    }

    /// When the next poll has work to do, if ever.
    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.next_tick_at, self.handoff_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn state(&self) -> &RevealState {
        &self.state
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn handoffs_scheduled(&self) -> usize {
        self.handoffs_scheduled
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal(&self.lines)
    }

    pub fn handed_off(&self) -> bool {
        self.handed_off
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{Clock, ManualClock};

    fn lines(raw: &[&str]) -> Vec<RevealLine> {
        raw.iter().map(|l| RevealLine::from(*l)).collect()
    }

    #[test]
    fn tick_appends_char_then_line_break() {
        let lines = lines(&["ab"]);
        let s1 = RevealState::default().tick(&lines);
        assert_eq!(s1.text, "a");
        let s2 = s1.tick(&lines).tick(&lines);
        assert_eq!(s2.text, "ab\n");
        assert_eq!((s2.line_index, s2.char_index), (1, 0));
        assert!(s2.is_terminal(&lines));
        assert_eq!(s2.tick(&lines), s2);
    }

    #[test]
    fn ticks_never_split_characters() {
        let lines = lines(&["é~"]);
        let s = RevealState::default().tick(&lines);
        assert_eq!(s.text, "é");
    }

    #[test]
    fn text_is_a_prefix_after_every_tick() {
        let raw = ["> Annie", "...", "> Happy New Year!"];
        let lines = lines(&raw);
        let full: String = raw.iter().map(|l| format!("{}\n", l)).collect();

        let mut state = RevealState::default();
        let mut breaks = 0;
        let total: usize = raw.iter().map(|l| l.chars().count()).sum();
        for n in 1..total {
            state = state.tick(&lines);
            if state.text.ends_with('\n') {
                breaks += 1;
            }
            assert!(full.starts_with(&state.text));
            assert_eq!(state.text.chars().count(), n);
            let typed = state.text.chars().filter(|c| *c != '\n').count();
            assert_eq!(typed + breaks, n);
        }
    }

    #[test]
    fn sequencer_hands_off_once_after_delay() {
        let clock = ManualClock::new();
        let mut seq = RevealSequencer::new(
            lines(&["hi", "!"]),
            Duration::from_millis(40),
            Duration::from_millis(1000),
        );
        seq.start(clock.now());

        let first = seq.poll(clock.now());
        assert_eq!(first, vec![RevealEffect::Text("h".into())]);

        // 5 ticks in total; the last one is due at 4 * 40ms.
        clock.advance(Duration::from_millis(160));
        let effects = seq.poll(clock.now());
        assert_eq!(effects, vec![RevealEffect::Text("hi\n!\n".into())]);
        assert_eq!(seq.ticks(), seq.total_ticks());
        assert!(seq.is_terminal());
        assert_eq!(seq.handoffs_scheduled(), 1);
        assert_eq!(seq.next_deadline(), Some(Duration::from_millis(1160)));

        clock.advance(Duration::from_millis(999));
        assert!(seq.poll(clock.now()).is_empty());

        clock.advance(Duration::from_millis(1));
        assert_eq!(seq.poll(clock.now()), vec![RevealEffect::HandOff]);
        assert!(seq.handed_off());

        clock.advance(Duration::from_secs(10));
        assert!(seq.poll(clock.now()).is_empty());
        assert_eq!(seq.handoffs_scheduled(), 1);
        assert_eq!(seq.next_deadline(), None);
    }

    #[test]
    fn no_lines_hands_off_without_ticking() {
        let mut seq = RevealSequencer::new(Vec::new(), Duration::from_millis(40), Duration::from_millis(1000));
        seq.start(Duration::ZERO);
        assert!(seq.poll(Duration::from_millis(999)).is_empty());
        assert_eq!(seq.poll(Duration::from_millis(1000)), vec![RevealEffect::HandOff]);
        assert_eq!(seq.ticks(), 0);
    }

    #[test]
    fn polling_before_start_does_nothing() {
        let mut seq = RevealSequencer::from_settings(&RevealSettings::default());
        assert!(seq.poll(Duration::from_secs(100)).is_empty());
        assert_eq!(seq.next_deadline(), None);
    }
}
