use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // ACCRUAL_DATABASE_URL is left out on purpose. It may carry credentials.
    const DISPLAY_ENVS: [&str; 8] = [
        "RUST_LOG",
        "ACCRUAL_HOST",
        "ACCRUAL_PORT",
        "ACCRUAL_SYSTEM_ADDRESS",
        "ACCRUAL_POLL_INTERVAL_SECS",
        "ACCRUAL_DEFAULT_RETRY_AFTER_SECS",
        "ACCRUAL_REQUEST_TIMEOUT_SECS",
        "ACCRUAL_RUN_MIGRATIONS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
