use anyhow::Context;
use myshell::{ShellConfig, ShellStatus, handle_line, input};
use std::io::{self, Write};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = ShellConfig::from_env();
    let interactive = termion::is_tty(&io::stdin());

    if interactive && config.banner {
        print!("{}", input::banner());
    }

    loop {
        let line = if interactive {
            input::read_line_interactive(&input::prompt(&config))
                .context("failed to read from terminal")?
        } else {
            input::read_line(&mut io::stdin().lock()).context("failed to read stdin")?
        };

        // End of input
        let Some(line) = line else {
            break;
        };

        match handle_line(&line, &config, &mut io::stdout(), &mut io::stderr()) {
            ShellStatus::Continue => continue,
            ShellStatus::Exit(code) => {
                io::stdout().flush()?;
                process::exit(code)
            }
        }
    }

    io::stdout().flush()?;
    Ok(())
}
