//! `devpick list`

use tabled::Tabled;

use crate::cli::{GlobalOpts, ListArgs};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

use super::{DeviceView, apply_filter, discovery, format_uptime, views};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(super) struct DeviceRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    dtype: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Compat")]
    compat: String,
    #[tabled(rename = "Connected for")]
    uptime: String,
    #[tabled(rename = "Targets")]
    targets: String,
}

impl DeviceRow {
    pub(super) fn new(v: &DeviceView, color: bool) -> Self {
        let kind = if v.kind == "virtual" { "Virtual" } else { "Physical" };
        Self {
            key: v.key.to_string(),
            name: v.name.clone(),
            dtype: format!("{kind} {}", v.device_type),
            state: if v.connected { "Running" } else { "Stopped" }.into(),
            compat: output::paint_compatibility(&v.compatibility, color),
            uptime: format_uptime(v.connected_for_secs),
            targets: v.targets.join(", "),
        }
    }
}

pub(super) fn render(
    views: &[DeviceView],
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<String, CliError> {
    let color = output::should_color(&config::color_mode(global, cfg));
    output::render_list(
        &config::output_format(global, cfg),
        views,
        |v| DeviceRow::new(v, color),
        |v| v.key.to_string(),
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ListArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let mut discovery = discovery(cfg).await?;
    let devices = discovery.getter.wait_for_devices(&discovery.timing).await?;
    let devices = apply_filter(devices, &args.filter);

    let out = render(&views(&devices), global, cfg)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
