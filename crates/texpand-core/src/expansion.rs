use enigo::{Direction, Enigo, Key, Keyboard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::error::{Result, TexpandError};
use crate::keyboard::{create_keyboard_controller, send_backspace};
use crate::matcher::{BoundaryKey, MatchEvent};

// Serializes whole delete/insert sequences: two expansions must never
// interleave their synthetic events.
static INJECTION_LOCK: Mutex<()> = Mutex::new(());
static INJECTING: AtomicBool = AtomicBool::new(false);

/// True while synthetic keystrokes are being sent. The input listener
/// checks this so our own injected events never feed back into the matcher.
pub fn injection_in_progress() -> bool {
    INJECTING.load(Ordering::SeqCst)
}

/// The concrete keystroke sequence that rewrites a fired match: delete the
/// typed source token together with the echoed boundary, type the
/// replacement, then reinsert the boundary so expansion never swallows the
/// user's terminating punctuation or whitespace.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionPlan {
    pub backspaces: usize,
    pub text: String,
    pub boundary: BoundaryKey,
}

pub fn plan_expansion(event: &MatchEvent) -> ExpansionPlan {
    ExpansionPlan {
        // The boundary keystroke has already been echoed by the OS, so it
        // is deleted along with the source and replayed afterwards.
        backspaces: event.source.chars().count() + 1,
        text: event.replacement.clone(),
        boundary: event.boundary,
    }
}

/// Replay an expansion plan as synthetic input. Aborts on the first
/// rejected event with `InjectionFailed`; a partially-applied edit is an
/// accepted risk surface and is never retried, since replaying injection
/// can duplicate visible characters.
pub fn perform_expansion(plan: &ExpansionPlan) -> Result<()> {
    let _guard = INJECTION_LOCK.lock().unwrap();
    INJECTING.store(true, Ordering::SeqCst);
    let result = inject(plan);
    INJECTING.store(false, Ordering::SeqCst);
    result
}

fn inject(plan: &ExpansionPlan) -> Result<()> {
    let mut keyboard = create_keyboard_controller()?;

    send_backspace(&mut keyboard, plan.backspaces)?;

    // Small delay before typing the replacement
    thread::sleep(Duration::from_millis(10));

    type_text_with_formatting(&mut keyboard, &plan.text)?;
    reinsert_boundary(&mut keyboard, plan.boundary)
}

fn reinsert_boundary(keyboard: &mut Enigo, boundary: BoundaryKey) -> Result<()> {
    let result = match boundary {
        BoundaryKey::Enter => keyboard.key(Key::Return, Direction::Click),
        BoundaryKey::Tab => keyboard.key(Key::Tab, Direction::Click),
        BoundaryKey::Space => keyboard.text(" "),
        BoundaryKey::Char(c) => keyboard.text(&c.to_string()),
    };

    result.map_err(|err| {
        TexpandError::InjectionFailed(format!("failed to reinsert boundary: {}", err))
    })
}

/// Type replacement text exactly as written: explicit Return keys between
/// lines, long lines chunked so the keyboard buffer is not overwhelmed.
pub fn type_text_with_formatting(keyboard: &mut impl Keyboard, text: &str) -> Result<()> {
    const CHUNK_SIZE: usize = 512;

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            keyboard
                .key(Key::Return, Direction::Click)
                .map_err(|err| {
                    TexpandError::InjectionFailed(format!("failed to type newline: {}", err))
                })?;

            // Let the newline register before continuing
            thread::sleep(Duration::from_millis(15));
        }

        if line.chars().count() > CHUNK_SIZE {
            for chunk in line.chars().collect::<Vec<_>>().chunks(CHUNK_SIZE) {
                let chunk_str: String = chunk.iter().collect();
                keyboard.text(&chunk_str).map_err(|err| {
                    TexpandError::InjectionFailed(format!("failed to type text: {}", err))
                })?;

                thread::sleep(Duration::from_millis(20));
            }
        } else if !line.is_empty() {
            keyboard.text(line).map_err(|err| {
                TexpandError::InjectionFailed(format!("failed to type text: {}", err))
            })?;
        }

        thread::sleep(Duration::from_millis(10));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_event(source: &str, replacement: &str, boundary: BoundaryKey) -> MatchEvent {
        MatchEvent {
            source: source.to_string(),
            replacement: replacement.to_string(),
            boundary,
        }
    }

    #[test]
    fn plan_deletes_source_and_echoed_boundary() {
        let plan = plan_expansion(&match_event("brb", "be right back", BoundaryKey::Space));

        assert_eq!(plan.backspaces, 4);
        assert_eq!(plan.text, "be right back");
        assert_eq!(plan.boundary, BoundaryKey::Space);
    }

    #[test]
    fn plan_counts_characters_not_bytes() {
        let plan = plan_expansion(&match_event("café", "coffee", BoundaryKey::Enter));
        assert_eq!(plan.backspaces, 5);
    }

    #[test]
    fn plan_preserves_multiline_replacement() {
        let plan = plan_expansion(&match_event(
            "sig",
            "Best regards,\nAda",
            BoundaryKey::Char('.'),
        ));

        assert_eq!(plan.text, "Best regards,\nAda");
        assert_eq!(plan.boundary, BoundaryKey::Char('.'));
    }

    #[test]
    fn injection_flag_is_clear_at_rest() {
        assert!(!injection_in_progress());
    }
}
