use std::{env, env::VarError};

/// The server takes no arguments. Any argument prints the help and the current settings.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
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
    // Secrets (the Stripe key) are never printed
    const DISPLAY_ENVS: [&str; 9] = [
        "RUST_LOG",
        "BO_HOST",
        "BO_PORT",
        "BO_DATABASE_URL",
        "BO_EVENT_BUFFER",
        "BO_SHEET_SYNC_URL",
        "BO_RECEIPT_FROM",
        "BO_STRIPE_API_URL",
        "BO_CURRENCY",
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
