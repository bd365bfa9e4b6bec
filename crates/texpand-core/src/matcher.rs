use std::time::{Duration, Instant};

use crate::config::{is_boundary_char, MATCH_TIMEOUT};

/// The keystroke that terminated a candidate abbreviation. Space, Enter
/// and Tab arrive as dedicated keys; punctuation arrives as a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKey {
    Space,
    Tab,
    Enter,
    Char(char),
}

impl BoundaryKey {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ' ' => Some(BoundaryKey::Space),
            '\t' => Some(BoundaryKey::Tab),
            '\n' | '\r' => Some(BoundaryKey::Enter),
            c if is_boundary_char(c) => Some(BoundaryKey::Char(c)),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            BoundaryKey::Space => ' ',
            BoundaryKey::Tab => '\t',
            BoundaryKey::Enter => '\n',
            BoundaryKey::Char(c) => *c,
        }
    }
}

/// A raw key-press reduced to the matcher's input alphabet. Keys that carry
/// no matching semantics (modifiers, function keys) map to `Other` and are
/// ignored by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyInput {
    Char(char),
    Boundary(BoundaryKey),
    Backspace,
    Other,
}

/// A completed match: the boundary keystroke arrived while a listener held
/// a fully typed source token.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchEvent {
    pub source: String,
    pub replacement: String,
    pub boundary: BoundaryKey,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ListenerState {
    Idle,
    /// `matched` source characters consumed so far. Reaching the source
    /// length means the token is complete and awaits its boundary. The
    /// deadline is fixed when the first character matches.
    Matching { matched: usize, deadline: Instant },
}

/// One uniform listener record per active abbreviation, processed by a
/// single matching routine.
#[derive(Debug, Clone)]
struct Listener {
    source: String,
    replacement: String,
    state: ListenerState,
}

impl Listener {
    fn new(source: &str, replacement: &str) -> Self {
        Self {
            source: source.to_string(),
            replacement: replacement.to_string(),
            state: ListenerState::Idle,
        }
    }

    fn source_len(&self) -> usize {
        self.source.chars().count()
    }

    fn expire(&mut self, now: Instant) {
        if let ListenerState::Matching { deadline, .. } = self.state {
            if now >= deadline {
                self.state = ListenerState::Idle;
            }
        }
    }

    fn on_char(&mut self, c: char, word_start: bool, now: Instant, timeout: Duration) {
        self.expire(now);

        match self.state {
            ListenerState::Matching { matched, deadline } => {
                match self.source.chars().nth(matched) {
                    // Next expected source character.
                    Some(expected) if expected == c => {
                        self.state = ListenerState::Matching {
                            matched: matched + 1,
                            deadline,
                        };
                    }
                    // Mismatch, or a trailing character after a complete
                    // token ("brbx"): the token is not boundary-flanked.
                    _ => self.state = ListenerState::Idle,
                }
            }
            ListenerState::Idle => {
                // A candidate may only start at a word boundary.
                if word_start && self.source.chars().next() == Some(c) {
                    self.state = ListenerState::Matching {
                        matched: 1,
                        deadline: now + timeout,
                    };
                }
            }
        }
    }

    fn is_complete(&self, now: Instant) -> bool {
        match self.state {
            ListenerState::Matching { matched, deadline } => {
                now < deadline && matched == self.source_len()
            }
            ListenerState::Idle => false,
        }
    }

    fn is_partial(&self) -> bool {
        matches!(self.state, ListenerState::Matching { .. })
    }

    fn reset(&mut self) {
        self.state = ListenerState::Idle;
    }
}

/// The active listener set: the keystroke buffer and matcher for every
/// non-ignored abbreviation. Listeners track the same input stream
/// independently; the first complete listener in registration order wins
/// the triggering boundary, and a fire invalidates everyone's partial
/// state.
#[derive(Debug)]
pub struct ListenerSet {
    listeners: Vec<Listener>,
    timeout: Duration,
    word_start: bool,
}

impl Default for ListenerSet {
    fn default() -> Self {
        Self::new(MATCH_TIMEOUT)
    }
}

impl ListenerSet {
    pub fn new(timeout: Duration) -> Self {
        Self {
            listeners: Vec::new(),
            timeout,
            // Start-of-input counts as a word boundary.
            word_start: true,
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn contains(&self, source: &str) -> bool {
        self.listeners.iter().any(|l| l.source == source)
    }

    pub fn sources(&self) -> Vec<String> {
        self.listeners.iter().map(|l| l.source.clone()).collect()
    }

    pub fn replacement_of(&self, source: &str) -> Option<&str> {
        self.listeners
            .iter()
            .find(|l| l.source == source)
            .map(|l| l.replacement.as_str())
    }

    /// Whether a listener currently holds partial-match state. Used to
    /// verify that reconfiguration leaves untouched listeners undisturbed.
    pub fn is_matching(&self, source: &str) -> bool {
        self.listeners
            .iter()
            .any(|l| l.source == source && l.is_partial())
    }

    pub fn register(&mut self, source: &str, replacement: &str) {
        if !self.contains(source) {
            self.listeners.push(Listener::new(source, replacement));
        }
    }

    pub fn unregister(&mut self, source: &str) {
        self.listeners.retain(|l| l.source != source);
    }

    /// Update the replacement of a registered listener in place, leaving
    /// its in-flight match state alone: the source is unchanged, so a
    /// partially typed token is still valid.
    pub fn update_replacement(&mut self, source: &str, replacement: &str) {
        if let Some(listener) = self.listeners.iter_mut().find(|l| l.source == source) {
            listener.replacement = replacement.to_string();
        }
    }

    /// Feed one keystroke through every listener. Returns a match when a
    /// boundary completes a fully typed source token.
    pub fn handle(&mut self, input: KeyInput) -> Option<MatchEvent> {
        let now = Instant::now();

        match input {
            KeyInput::Char(c) => {
                let word_start = self.word_start;
                for listener in &mut self.listeners {
                    listener.on_char(c, word_start, now, self.timeout);
                }
                self.word_start = false;
                None
            }
            KeyInput::Boundary(boundary) => {
                let hit = self
                    .listeners
                    .iter()
                    .find(|l| l.is_complete(now))
                    .map(|l| MatchEvent {
                        source: l.source.clone(),
                        replacement: l.replacement.clone(),
                        boundary,
                    });

                // The boundary consumes the match: whether or not anything
                // fired, no partial state survives it.
                for listener in &mut self.listeners {
                    listener.reset();
                }
                self.word_start = true;
                hit
            }
            KeyInput::Backspace => {
                // The deleted character is unknowable from here, so drop
                // all partial matches; tracking resumes at the next word
                // boundary.
                for listener in &mut self.listeners {
                    listener.reset();
                }
                self.word_start = false;
                None
            }
            KeyInput::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn set_with(entries: &[(&str, &str)]) -> ListenerSet {
        let mut set = ListenerSet::default();
        for (source, replacement) in entries {
            set.register(source, replacement);
        }
        set
    }

    fn type_word(set: &mut ListenerSet, word: &str) -> Option<MatchEvent> {
        let mut hit = None;
        for c in word.chars() {
            let input = match BoundaryKey::from_char(c) {
                Some(b) => KeyInput::Boundary(b),
                None => KeyInput::Char(c),
            };
            if let Some(m) = set.handle(input) {
                hit = Some(m);
            }
        }
        hit
    }

    #[test]
    fn boundary_completes_match() {
        let mut set = set_with(&[("brb", "be right back")]);
        let hit = type_word(&mut set, "brb ").expect("should fire");

        assert_eq!(hit.source, "brb");
        assert_eq!(hit.replacement, "be right back");
        assert_eq!(hit.boundary, BoundaryKey::Space);
    }

    #[test]
    fn enter_and_punctuation_are_boundaries() {
        let mut set = set_with(&[("brb", "be right back")]);
        assert!(type_word(&mut set, "brb\n").is_some());

        let hit = type_word(&mut set, "brb!").expect("should fire");
        assert_eq!(hit.boundary, BoundaryKey::Char('!'));
    }

    #[test]
    fn trailing_character_blocks_match() {
        let mut set = set_with(&[("brb", "be right back")]);
        assert!(type_word(&mut set, "brbx ").is_none());
    }

    #[test]
    fn leading_character_blocks_match() {
        // "brb" inside a longer word is not boundary-flanked on the left.
        let mut set = set_with(&[("brb", "be right back")]);
        assert!(type_word(&mut set, "xbrb ").is_none());

        // After a boundary the same token matches again.
        assert!(type_word(&mut set, "brb ").is_some());
    }

    #[test]
    fn no_match_without_boundary() {
        let mut set = set_with(&[("brb", "be right back")]);
        assert!(type_word(&mut set, "brb").is_none());
    }

    #[test]
    fn partial_match_expires_after_timeout() {
        let mut set = ListenerSet::new(Duration::from_millis(20));
        set.register("brb", "be right back");

        assert!(type_word(&mut set, "b").is_none());
        thread::sleep(Duration::from_millis(40));
        assert!(type_word(&mut set, "rb ").is_none());

        // A fresh attempt inside the window still fires.
        assert!(type_word(&mut set, "brb ").is_some());
    }

    #[test]
    fn fire_invalidates_all_partial_state() {
        let mut set = set_with(&[("brb", "be right back"), ("b", "bee")]);

        // "b" completes first in registration order irrelevant here: after
        // "br", only "brb" still tracks. The space fires "brb" and resets
        // everything.
        let hit = type_word(&mut set, "brb ").expect("should fire");
        assert_eq!(hit.source, "brb");
        assert!(!set.is_matching("brb"));
        assert!(!set.is_matching("b"));
    }

    #[test]
    fn first_registered_listener_wins() {
        let mut set = set_with(&[("b", "bee"), ("brb", "be right back")]);
        let hit = type_word(&mut set, "b ").expect("should fire");
        assert_eq!(hit.source, "b");
    }

    #[test]
    fn backspace_discards_partial_matches() {
        let mut set = set_with(&[("brb", "be right back")]);

        type_word(&mut set, "br");
        assert!(set.is_matching("brb"));

        set.handle(KeyInput::Backspace);
        assert!(!set.is_matching("brb"));

        // Not at a word boundary after a backspace, so the token must be
        // retyped from a fresh boundary.
        assert!(type_word(&mut set, "brb ").is_none());
        assert!(type_word(&mut set, "brb ").is_some());
    }

    #[test]
    fn other_keys_do_not_disturb_matching() {
        let mut set = set_with(&[("brb", "be right back")]);

        type_word(&mut set, "br");
        set.handle(KeyInput::Other);
        assert!(type_word(&mut set, "b ").is_some());
    }

    #[test]
    fn unregister_stops_matching() {
        let mut set = set_with(&[("brb", "be right back")]);
        set.unregister("brb");
        assert!(type_word(&mut set, "brb ").is_none());
    }

    #[test]
    fn update_replacement_preserves_partial_state() {
        let mut set = set_with(&[("brb", "old")]);

        type_word(&mut set, "br");
        set.update_replacement("brb", "new");
        assert!(set.is_matching("brb"));

        let hit = type_word(&mut set, "b ").expect("should fire");
        assert_eq!(hit.replacement, "new");
    }

    #[test]
    fn unicode_sources_match_per_character() {
        let mut set = set_with(&[("café", "coffee")]);
        let hit = type_word(&mut set, "café ").expect("should fire");
        assert_eq!(hit.source, "café");
    }
}
