// Entrypoint for the console.
// - Logs go to stderr so they never interleave with the menus.
// - Configuration comes from `CONSOLE_BACKEND_URL` / `CONSOLE_TOKEN_FILE`,
//   see `ConsoleConfig::from_env`.

use dummy_console::{ui::main_menu, Console, ConsoleConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = ConsoleConfig::from_env();
    let console = Console::new(&config)?;

    // Blocks until the user picks "Exit".
    main_menu(&console).await?;
    Ok(())
}
