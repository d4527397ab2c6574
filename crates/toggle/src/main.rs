//! Toggle
//!
//! Mounts the demo component with props from config, environment and flags,
//! then plays a script of clicks and prop changes against it.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use toggle::{OutputFormat, Session, Step, ToggleConfig, ToggleProps};

/// Auto-controlled toggle demo
#[derive(Parser, Debug)]
#[command(name = "toggle")]
#[command(about = "Auto-controlled toggle demo", long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name shown above the button
    #[arg(long)]
    name: Option<String>,

    /// Control `active` from outside
    #[arg(long)]
    active: Option<bool>,

    /// Control `level` from outside
    #[arg(long)]
    level: Option<i64>,

    /// Initial `active` when uncontrolled
    #[arg(long)]
    default_active: Option<bool>,

    /// Initial `level` when uncontrolled
    #[arg(long)]
    default_level: Option<i64>,

    /// Clicks appended to the configured script
    #[arg(long, default_value = "0")]
    clicks: usize,

    /// Read further steps from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,
}

impl Args {
    fn props(&self) -> ToggleProps {
        ToggleProps {
            name: self.name.clone(),
            active: self.active,
            level: self.level,
            default_active: self.default_active,
            default_level: self.default_level,
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout only carries frames
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("toggle=info,auto_controlled=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let mut config = ToggleConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    config.props.merge(args.props());
    if let Some(format) = args.format {
        config.format = format;
    }
    config
        .steps
        .extend(std::iter::repeat("click".to_string()).take(args.clicks));

    let steps = config.parsed_steps()?;
    info!("Loaded {} steps", steps.len());

    let mut session = Session::new(config.props.to_props(), config.format);
    let mut stdout = io::stdout().lock();
    print_output(&session, &mut stdout)?;

    for step in &steps {
        session.apply(step);
        print_output(&session, &mut stdout)?;
    }

    if args.interactive {
        run_interactive(&mut session, &mut stdout)?;
    }

    info!(
        "Session finished after {} renders",
        session.host().render_count()
    );
    Ok(())
}

/// Write the session's current output. A frame that cannot be formatted is
/// logged and skipped so the run carries on.
fn print_output(session: &Session, out: &mut impl Write) -> io::Result<()> {
    match session.output() {
        Ok(output) => writeln!(out, "{output}"),
        Err(e) => {
            warn!("Failed to format output: {}", e);
            Ok(())
        }
    }
}

/// Read steps line by line until EOF or `quit`
fn run_interactive(session: &mut Session, out: &mut impl Write) -> Result<()> {
    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        match line.parse::<Step>() {
            Ok(step) => {
                session.apply(&step);
                print_output(session, out)?;
            }
            Err(e) => warn!("Ignoring step {:?}: {}", line, e),
        }
        out.flush()?;
    }
    Ok(())
}
