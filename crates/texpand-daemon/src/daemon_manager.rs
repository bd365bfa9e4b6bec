use std::fs::{self, File};
use std::io::Write;
use std::process;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::keyboard_listener::start_keyboard_listener;
use crate::permissions::check_and_request_permissions;
use crate::process::verify_process_running;
use texpand_core::config::{
    ensure_config_dir, get_db_file_path, get_pid_file_path, DAEMON_LOG_FILENAME,
};
use texpand_core::{get_config_dir, is_daemon_running, Engine, HookManager, Result, TexpandError};
use texpand_server::server::http_server::start_api_server;
use texpand_server::server::utils::{get_api_server_port, port_is_available, remove_api_port};

/// Start the daemon as a detached background process
pub fn start_daemon(api_port: u16) -> Result<()> {
    if let Some(pid) = is_daemon_running()? {
        if verify_process_running(pid) {
            println!("Daemon is already running with PID {}.", pid);
            return Ok(());
        }
        println!("Found stale PID file. Cleaning up and starting a new daemon...");
        let _ = fs::remove_file(get_pid_file_path());
    }

    println!("Starting texpand daemon...");
    ensure_config_dir()?;
    check_and_request_permissions()?;

    // Pick a free port for the control-plane API
    let mut port = api_port;
    for _ in 0..10 {
        if port_is_available(port) {
            break;
        }
        println!("Port {} is busy, trying {}...", port, port + 1);
        port += 1;
    }

    let current_exe = std::env::current_exe()?;
    let log_file = get_config_dir().join(DAEMON_LOG_FILENAME);

    #[cfg(unix)]
    {
        use std::process::Command;

        let cmd = format!(
            "nohup {} daemon-worker --port {} > {} 2>&1 &",
            current_exe.to_string_lossy(),
            port,
            log_file.to_string_lossy()
        );
        Command::new("sh").arg("-c").arg(&cmd).status()?;
    }

    #[cfg(windows)]
    {
        use std::process::Command;

        let cmd = format!(
            "START /B \"texpand daemon\" \"{}\" daemon-worker --port {} > \"{}\" 2>&1",
            current_exe.to_string_lossy(),
            port,
            log_file.to_string_lossy()
        );
        Command::new("cmd").arg("/C").arg(&cmd).status()?;
    }

    #[cfg(not(any(unix, windows)))]
    {
        return Err(TexpandError::Other(
            "starting the daemon is not supported on this platform".to_string(),
        ));
    }

    // Wait for the worker to come up and write its PID file
    for _ in 0..20 {
        thread::sleep(Duration::from_millis(100));
        if is_daemon_running()?.is_some() {
            break;
        }
    }

    match is_daemon_running()? {
        Some(pid) if verify_process_running(pid) => {
            println!("Daemon started successfully with PID {}.", pid);
            println!("Editor API available at: http://localhost:{}", port);
            Ok(())
        }
        _ => Err(TexpandError::Other(format!(
            "Daemon failed to start. Check logs at {}",
            log_file.display()
        ))),
    }
}

/// Stop the daemon if it's running
pub fn stop_daemon() -> Result<()> {
    let pid_file = get_pid_file_path();

    if !pid_file.exists() {
        return Err(TexpandError::DaemonNotRunning);
    }

    let pid_str = match fs::read_to_string(&pid_file) {
        Ok(content) => content,
        Err(e) => {
            let _ = fs::remove_file(&pid_file);
            return Err(TexpandError::Other(format!(
                "Failed to read PID file: {}",
                e
            )));
        }
    };

    let pid = match pid_str.trim().parse::<u32>() {
        Ok(pid) => pid,
        Err(_) => {
            let _ = fs::remove_file(&pid_file);
            return Err(TexpandError::InvalidPid);
        }
    };

    println!("Attempting to stop daemon with PID {}...", pid);

    // The API server dies with the daemon process; drop its port file
    let _ = remove_api_port();

    if !verify_process_running(pid) {
        println!("Process with PID {} is not running.", pid);
        let _ = fs::remove_file(&pid_file);
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::process::Command;

        // SIGTERM first for a graceful shutdown
        let _ = Command::new("kill").arg(pid.to_string()).status();
        thread::sleep(Duration::from_millis(500));

        if verify_process_running(pid) {
            println!("Daemon didn't terminate gracefully, using force kill...");
            let _ = Command::new("kill").args(["-9", &pid.to_string()]).status();
        }
    }

    #[cfg(windows)]
    {
        use std::process::Command;

        let _ = Command::new("taskkill")
            .args(["/PID", &pid.to_string()])
            .status();
        thread::sleep(Duration::from_millis(500));

        if verify_process_running(pid) {
            println!("Daemon didn't terminate gracefully, using force kill...");
            let _ = Command::new("taskkill")
                .args(["/F", "/T", "/PID", &pid.to_string()])
                .status();
        }
    }

    let _ = fs::remove_file(&pid_file);
    println!("Daemon stopped.");
    Ok(())
}

/// Check daemon status
pub fn daemon_status() -> Result<()> {
    match is_daemon_running()? {
        Some(pid) => {
            if verify_process_running(pid) {
                println!("texpand daemon is running with PID {}", pid);

                if let Ok(port) = get_api_server_port() {
                    println!("Editor API is listening on port {}", port);
                    println!("UI available at: http://localhost:{}", port);
                }
                Ok(())
            } else {
                println!("PID file exists but process {} is not running", pid);
                println!("The daemon may have crashed; run 'texpand stop' then 'texpand start'");
                Ok(())
            }
        }
        None => {
            println!("texpand daemon is not running");
            Ok(())
        }
    }
}

/// Entry point of the detached daemon process: writes the PID file, runs
/// the worker, and cleans up on exit.
pub fn daemon_worker_entry(api_port: u16) -> Result<()> {
    let pid_file = get_pid_file_path();
    let mut file = File::create(&pid_file)?;
    write!(file, "{}", process::id())?;

    let result = run_daemon_worker(api_port);

    let _ = fs::remove_file(&pid_file);
    result
}

/// The daemon worker: engine, keyboard listener, control-plane API and
/// store watcher, all in one process so a mutation returns only after the
/// listener set is consistent.
pub fn run_daemon_worker(api_port: u16) -> Result<()> {
    ensure_config_dir()?;

    let hooks = HookManager::default();
    let engine = Engine::bootstrap(get_db_file_path(), hooks.clone())?;
    println!(
        "Loaded {} abbreviations ({} active)",
        engine.table().len(),
        engine.hooks().active_count()
    );
    let engine = Arc::new(Mutex::new(engine));

    let running = Arc::new(Mutex::new(true));
    let keyboard_thread = start_keyboard_listener(hooks.clone(), Arc::clone(&running));

    // The API server gets its own thread and runtime; handlers share the
    // engine lock with the store watcher below.
    let server_engine = Arc::clone(&engine);
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                eprintln!("Failed to build API server runtime: {}", e);
                return;
            }
        };

        if let Err(e) = runtime.block_on(start_api_server(server_engine, api_port)) {
            eprintln!("API server stopped: {}", e);
        }
    });

    // Watch the store file so edits from another process (the CLI) are
    // picked up. Our own saves bump the mtime too; those reloads are
    // no-ops.
    let db_path = get_db_file_path();
    let mut last_modified = fs::metadata(&db_path).ok().and_then(|m| m.modified().ok());
    let mut last_check = Instant::now();
    let check_interval = Duration::from_secs(1);
    let mut warned_degraded = false;

    while *running.lock().unwrap() {
        thread::sleep(Duration::from_millis(100));

        if !warned_degraded && !hooks.is_hook_alive() {
            eprintln!("Running in degraded mode: abbreviation matching is disabled");
            warned_degraded = true;
        }

        if last_check.elapsed() < check_interval {
            continue;
        }
        last_check = Instant::now();

        let modified = fs::metadata(&db_path).ok().and_then(|m| m.modified().ok());
        if modified == last_modified {
            continue;
        }
        last_modified = modified;

        match engine.lock().unwrap().reload() {
            Ok(stats) if !stats.is_noop() => {
                println!(
                    "Reloaded abbreviation store ({} added, {} removed, {} updated)",
                    stats.added, stats.removed, stats.updated
                );
            }
            Ok(_) => {}
            Err(e) => eprintln!("Failed to reload abbreviation store: {}", e),
        }
    }

    if let Err(e) = keyboard_thread.join() {
        eprintln!("Error joining keyboard thread: {:?}", e);
    }

    Ok(())
}
