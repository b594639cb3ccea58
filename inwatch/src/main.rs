use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use inwatch_sdk::{EventKind, EventMask, EventStream, Notification, StopToken, WatchConfig};
use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

const RET_CODE_ERROR: u8 = 255;

#[derive(Parser, Debug)]
#[command(version, about = "Stream change notifications for files and directories.")]
struct Cli {
    /// Files or directories to watch. Directories report changes to their
    /// direct children, not recursively.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Only report these kinds of changes (comma separated). Defaults to all.
    #[arg(short, long, value_enum, value_delimiter = ',')]
    events: Vec<EventArg>,
    /// Longest single wait for activity, in milliseconds.
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: u64,
    /// Prefix every line with the local time.
    #[arg(short, long)]
    timestamps: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EventArg {
    Create,
    Delete,
    Modify,
    Attrib,
    Open,
    Access,
    CloseWrite,
    CloseNowrite,
}

impl From<EventArg> for EventKind {
    fn from(arg: EventArg) -> Self {
        match arg {
            EventArg::Create => EventKind::Created,
            EventArg::Delete => EventKind::Deleted,
            EventArg::Modify => EventKind::Modified,
            EventArg::Attrib => EventKind::AttributeChanged,
            EventArg::Open => EventKind::Opened,
            EventArg::Access => EventKind::Accessed,
            EventArg::CloseWrite => EventKind::ClosedWithWrite,
            EventArg::CloseNowrite => EventKind::ClosedWithoutWrite,
        }
    }
}

impl Cli {
    fn watch_config(&self) -> WatchConfig {
        let mask = if self.events.is_empty() {
            EventMask::DEFAULT_WATCH
        } else {
            self.events
                .iter()
                .map(|&arg| EventKind::from(arg).mask())
                .fold(EventMask::IsDir, |mask, bit| mask | bit)
        };
        WatchConfig::default()
            .with_mask(mask)
            .with_poll_interval(Duration::from_millis(self.poll_interval))
    }
}

fn main() -> ExitCode {
    let builder = tracing_subscriber::fmt().with_writer(io::stderr);
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        builder.with_env_filter(filter).init();
    } else {
        builder.with_max_level(LevelFilter::WARN).init();
    }

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Something went wrong {e:#}");
            ExitCode::from(RET_CODE_ERROR)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let stop = StopToken::new();
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || handler_stop.stop()).context("failed to install signal handler")?;

    let config = cli.watch_config();
    let mut stream = EventStream::watch(&cli.paths, &config).context("failed to watch paths")?;
    info!(paths = cli.paths.len(), mask = ?config.mask, "event stream ready");

    let mut stdout = io::stdout().lock();
    let timestamps = cli.timestamps;
    stream
        .run(
            |notification| write_line(&mut stdout, &notification, timestamps),
            &stop,
        )
        .context("event loop failed")?;
    Ok(())
}

fn write_line(out: &mut impl Write, notification: &Notification, timestamps: bool) -> io::Result<()> {
    if timestamps {
        write!(out, "[{}] ", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    }
    writeln!(out, "{notification}")?;
    out.flush()
}
