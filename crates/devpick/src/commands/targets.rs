//! `devpick targets <device>`

use devpick_core::Device;

use crate::cli::{GlobalOpts, TargetsArgs};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

use super::{DeviceView, discovery, format_uptime};

/// Device summary followed by its targets, the default one starred.
fn detail(d: &DeviceView, color: bool) -> String {
    let mut lines = vec![
        output::paint_heading(&d.name, color),
        format!("Key:        {} ({})", d.key, d.key.kind()),
        format!("Type:       {} {}", d.kind, d.device_type),
        format!(
            "State:      {}",
            if d.connected { "Running" } else { "Stopped" }
        ),
        format!(
            "Compat:     {}",
            output::paint_compatibility(&d.compatibility, color)
        ),
        format!("Up for:     {}", format_uptime(d.connected_for_secs)),
        String::new(),
        "Targets:".into(),
    ];
    for target in &d.targets {
        let marker = if *target == d.default_target { "*" } else { " " };
        lines.push(format!("  {marker} {target}"));
    }
    lines.join("\n")
}

/// First device answering to `query` by key, secondary key, or name.
pub fn find<'a>(devices: &'a [Device], query: &str) -> Option<&'a Device> {
    devices.iter().find(|d| d.answers_to(query))
}

pub async fn handle(args: TargetsArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let mut discovery = discovery(cfg).await?;
    let devices = discovery.getter.wait_for_devices(&discovery.timing).await?;

    let device = find(&devices, &args.device).ok_or_else(|| CliError::NotFound {
        resource_type: "device".into(),
        identifier: args.device.clone(),
        list_command: "list".into(),
    })?;

    let view = DeviceView::new(device, std::time::Instant::now());
    let color = output::should_color(&config::color_mode(global, cfg));
    let out = output::render_single(
        &config::output_format(global, cfg),
        &view,
        |v| detail(v, color),
        |v| v.targets.join("\n"),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
