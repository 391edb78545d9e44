//! `devpick watch`
//!
//! Polls the getter on a fixed interval and reprints the list whenever
//! something other than elapsed connection time changes. Runs until
//! Ctrl-C.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

use super::{DeviceView, apply_filter, discovery, list, views};

fn unchanged(previous: &[DeviceView], current: &[DeviceView]) -> bool {
    previous.len() == current.len()
        && previous.iter().zip(current).all(|(a, b)| a.same_state(b))
}

pub async fn handle(args: WatchArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let mut discovery = discovery(cfg).await?;
    let interval = args
        .interval
        .map_or(discovery.timing.poll_interval, Duration::from_millis);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let table = config::output_format(global, cfg) == OutputFormat::Table;
    let color = output::should_color(&config::color_mode(global, cfg));
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last: Option<Vec<DeviceView>> = None;

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(devices) = discovery.getter.get()? else {
            continue;
        };
        let current = views(&apply_filter(devices, &args.filter));
        if last.as_deref().is_some_and(|prev| unchanged(prev, &current)) {
            continue;
        }

        if table {
            let heading = format!("── {} device(s) ──", current.len());
            output::print_output(&output::paint_heading(&heading, color), global.quiet);
        }
        output::print_output(&list::render(&current, global, cfg)?, global.quiet);
        last = Some(current);
    }

    debug!("watch stopped");
    Ok(())
}
