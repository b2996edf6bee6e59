//! Interactive mode for the server.
//!
//! Prompts the user for bind address and port before starting the server.

use dialoguer::{Confirm, Input};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Asks the user for a bind address and port, sets the corresponding
/// environment variables (`BIND_ADDR`, `PORT`), and delegates to
/// [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Healthcare Chat Server");
    println!();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(super::DEFAULT_BIND_ADDR.to_string())
        .interact_text()
        .unwrap_or_else(|_| super::DEFAULT_BIND_ADDR.to_string());

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(super::DEFAULT_PORT)
        .interact_text()
        .unwrap_or(super::DEFAULT_PORT);
    let port_str = port.to_string();

    // SAFETY: We are single-threaded at this point (before server starts) and
    // these variables are only read once during server initialisation.
    unsafe {
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", &port_str);
    }

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port_str}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server().await
}
