use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use texpand_core::expansion::{injection_in_progress, perform_expansion, plan_expansion};
use texpand_core::hook::HookManager;
use texpand_core::keyboard::key_input_from_event;
use texpand_core::matcher::KeyInput;

/// Start the global input hook and feed every keystroke through the
/// listener set. Blocks inside `rdev::listen` on its own thread; after the
/// bounded retries are exhausted the hook is marked dead so refresh
/// surfaces `HookUnavailable` instead of silently registering listeners
/// that will never fire.
pub fn start_keyboard_listener(
    hooks: HookManager,
    running: Arc<Mutex<bool>>,
) -> JoinHandle<()> {
    let hooks_cb = hooks.clone();
    let running_cb = Arc::clone(&running);

    thread::spawn(move || {
        let callback = move |event: rdev::Event| {
            if !*running_cb.lock().unwrap() {
                return;
            }

            // Our own synthetic keystrokes must not feed back into the
            // matcher while an expansion is being replayed.
            if injection_in_progress() {
                return;
            }

            let input = key_input_from_event(&event);
            if matches!(input, KeyInput::Other) {
                return;
            }

            if let Some(hit) = hooks_cb.dispatch(input) {
                let plan = plan_expansion(&hit);
                if let Err(e) = perform_expansion(&plan) {
                    // Surfaced once per occurrence, never retried: replaying
                    // injection can duplicate visible characters.
                    eprintln!("Expansion of '{}' failed: {}", hit.source, e);
                }
            }
        };

        let mut retry_count = 0;
        let max_retries = 5;

        while *running.lock().unwrap() && retry_count < max_retries {
            match rdev::listen(callback.clone()) {
                Ok(_) => {
                    // listen() blocks for the life of the hook; returning
                    // at all means the hook was torn down.
                    break;
                }
                Err(e) => {
                    eprintln!("Error in keyboard listener: {:?}", e);
                    retry_count += 1;
                    eprintln!(
                        "Retrying keyboard listener ({}/{})...",
                        retry_count, max_retries
                    );
                    thread::sleep(Duration::from_secs(1));
                }
            }
        }

        if retry_count >= max_retries {
            hooks.mark_hook_dead();
            eprintln!(
                "Failed to install the keyboard hook after {} attempts; \
                 abbreviation matching is disabled until the daemon restarts",
                max_retries
            );
        }
    })
}
