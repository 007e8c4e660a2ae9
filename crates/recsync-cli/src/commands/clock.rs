//! Boundary clock command implementation.

use anyhow::{Result, bail};
use chrono::{Local, NaiveTime};
use clap::Args;
use colored::Colorize;
use tokio::sync::broadcast::error::RecvError;

use recsync::{BoundaryConfig, BoundaryEvent, BoundaryWatcher, BoundaryWindow, SystemClock};

use crate::output;

#[derive(Args, Debug)]
pub struct ClockArgs {
    /// Window start (HH:MM or HH:MM:SS, local time)
    #[arg(long, default_value = "00:00", value_parser = parse_time)]
    pub start: NaiveTime,

    /// Window end (HH:MM or HH:MM:SS, local time)
    #[arg(long, default_value = "01:00", value_parser = parse_time)]
    pub end: NaiveTime,

    /// Sampling period in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub tick_ms: u64,

    /// Print the current state and countdown, then exit
    #[arg(long)]
    pub once: bool,
}

pub async fn run(args: ClockArgs) -> Result<()> {
    if args.tick_ms == 0 {
        bail!("--tick-ms must be positive");
    }

    let config = BoundaryConfig {
        start: args.start,
        end: args.end,
        tick_ms: args.tick_ms,
    };
    let window = config.window();

    if args.once {
        print_state(&window);
        return Ok(());
    }

    let watcher = BoundaryWatcher::new(&config, SystemClock);
    let mut events = watcher.subscribe();
    let _handle = watcher.spawn();

    eprintln!("{} {}", "Watching window".dimmed(), window);
    eprintln!("{}", "Press Ctrl+C to stop.".dimmed());

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => print_event(event, &window),
                Err(RecvError::Lagged(n)) => output::warning(&format!("missed {} events", n)),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

fn print_state(window: &BoundaryWindow) {
    let now = Local::now();
    let state = if window.contains_at(&now) {
        "inside".green()
    } else {
        "outside".normal()
    };
    output::field("Window", &window.to_string());
    output::field("Now", &format!("{} ({})", now.format("%H:%M:%S"), state));
    match window.countdown(&now) {
        Some(countdown) => output::field("Next", &format!("{} in {}", countdown.next, countdown)),
        None => output::field("Next", "never (empty window)"),
    }
}

fn print_event(event: BoundaryEvent, window: &BoundaryWindow) {
    let now = Local::now();
    let label = match event {
        BoundaryEvent::Entered => "ENTERED".green(),
        BoundaryEvent::Exited => "EXITED".yellow(),
    };
    match window.countdown(&now) {
        Some(countdown) => println!(
            "{} {} {} {} in {}",
            now.format("%H:%M:%S").to_string().dimmed(),
            label,
            window,
            countdown.next,
            countdown
        ),
        None => println!("{} {} {}", now.format("%H:%M:%S").to_string().dimmed(), label, window),
    }
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|e| format!("invalid time '{}': {}", s, e))
}
