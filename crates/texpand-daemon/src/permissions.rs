use texpand_core::{Result, TexpandError};

/// Check that the platform will let us install a global input hook, and
/// walk the user through granting access when it won't. Runs in the
/// foreground `start` command, before the worker is spawned.
pub fn check_and_request_permissions() -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        if !has_accessibility_permission() {
            request_macos_permissions()?;
        }
    }

    #[cfg(target_os = "linux")]
    {
        if !has_input_permission() {
            request_linux_permissions()?;
        }
    }

    #[cfg(target_os = "windows")]
    {
        // No explicit permission model for keyboard monitoring, but
        // security software may flag it.
        println!("texpand monitors keyboard input to detect abbreviations.");
        println!("If expansion does not work, check your antivirus settings");
        println!("for blocked keyboard monitoring.");
    }

    Ok(())
}

#[cfg(target_os = "macos")]
fn has_accessibility_permission() -> bool {
    use std::process::Command;

    // Talking to System Events only works once Accessibility is granted
    let test = Command::new("osascript")
        .arg("-e")
        .arg("tell application \"System Events\" to return name of first process")
        .output();

    match test {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

#[cfg(target_os = "macos")]
fn request_macos_permissions() -> Result<()> {
    println!("texpand needs accessibility permissions to watch keyboard input");
    println!("---------------------------------------------------------------");
    println!("1. Open System Settings > Privacy & Security > Accessibility");
    println!("2. Enable the checkbox for your terminal application");
    println!("3. On macOS 14 or newer, also grant Input Monitoring");
    println!();
    println!("Would you like to open System Settings now? (y/n)");

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim().eq_ignore_ascii_case("y") {
        use std::process::Command;
        let _ = Command::new("open")
            .arg("x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility")
            .status();
    }

    println!("\nPress Enter once you've granted permission...");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if !has_accessibility_permission() {
        return Err(TexpandError::PermissionDenied(
            "accessibility permission not granted; restart texpand after granting it".to_string(),
        ));
    }

    println!("Permission granted.");
    Ok(())
}

#[cfg(target_os = "linux")]
fn has_input_permission() -> bool {
    use std::path::Path;

    if Path::new("/dev/input/event0").exists() {
        return std::fs::File::open("/dev/input/event0").is_ok();
    }

    // No event device to probe; fall back to group membership
    let groups = std::process::Command::new("groups")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok());

    groups.map(|g| g.contains("input")).unwrap_or(false)
}

#[cfg(target_os = "linux")]
fn request_linux_permissions() -> Result<()> {
    println!("texpand needs permission to read input devices");
    println!("----------------------------------------------");
    println!("Add your user to the 'input' group (recommended):");
    println!("    sudo usermod -a -G input $USER");
    println!("then log out and back in, or run texpand with sudo as a");
    println!("temporary workaround.");

    Err(TexpandError::PermissionDenied(
        "texpand needs input device permissions to function".to_string(),
    ))
}
