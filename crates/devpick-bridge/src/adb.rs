// ── adb client ──
//
// Thin async wrapper over the `adb` executable. Every call spawns one
// `adb` process bounded by the configured timeout; parsing of the text
// output lives in free functions so it can be tested without a device.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::config::BridgeConfig;
use crate::error::Error;

const EMULATOR_SERIAL_PREFIX: &str = "emulator-";

/// Connection state reported by `adb devices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AdbState {
    Device,
    Offline,
    Unauthorized,
    Other(String),
}

impl AdbState {
    fn parse(raw: &str) -> Self {
        match raw {
            "device" => Self::Device,
            "offline" => Self::Offline,
            "unauthorized" => Self::Unauthorized,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// One line of `adb devices -l`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdbDevice {
    pub serial: String,
    pub state: AdbState,
    /// `key:value` qualifiers (`model`, `product`, `transport_id`, ...).
    pub attributes: BTreeMap<String, String>,
}

impl AdbDevice {
    pub fn is_online(&self) -> bool {
        self.state == AdbState::Device
    }

    pub fn is_emulator(&self) -> bool {
        is_emulator_serial(&self.serial)
    }
}

/// Whether a connection serial belongs to a locally running emulator.
pub fn is_emulator_serial(serial: &str) -> bool {
    serial.starts_with(EMULATOR_SERIAL_PREFIX)
}

/// Async `adb` client.
#[derive(Debug, Clone)]
pub struct AdbClient {
    config: BridgeConfig,
}

impl AdbClient {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// `adb version`, first line. Fails fast when adb is missing.
    pub async fn version(&self) -> Result<String, Error> {
        let out = self.run(&["version"]).await?;
        out.lines()
            .next()
            .map(|l| l.trim().to_owned())
            .ok_or_else(|| Error::Parse {
                message: "empty `adb version` output".into(),
            })
    }

    /// Every device `adb` currently knows about, in any state.
    pub async fn list_all(&self) -> Result<Vec<AdbDevice>, Error> {
        let out = self.run(&["devices", "-l"]).await?;
        Ok(parse_devices(&out))
    }

    /// Devices in the `device` state; offline and unauthorized entries are skipped.
    pub async fn devices(&self) -> Result<Vec<AdbDevice>, Error> {
        let all = self.list_all().await?;
        Ok(all
            .into_iter()
            .filter(|d| {
                if !d.is_online() {
                    debug!(serial = %d.serial, state = ?d.state, "skipping device that is not online");
                }
                d.is_online()
            })
            .collect())
    }

    /// AVD name as reported by the emulator console (`emu avd name`).
    pub async fn avd_name(&self, serial: &str) -> Result<Option<String>, Error> {
        let out = self.run(&["-s", serial, "emu", "avd", "name"]).await?;
        Ok(parse_emu_reply(&out))
    }

    /// AVD data folder as reported by the emulator console (`emu avd path`).
    ///
    /// Older emulators do not support this query and answer `KO`, which
    /// surfaces as `Ok(None)`.
    pub async fn avd_path(&self, serial: &str) -> Result<Option<PathBuf>, Error> {
        let out = self.run(&["-s", serial, "emu", "avd", "path"]).await?;
        Ok(parse_emu_reply(&out).map(PathBuf::from))
    }

    /// A single system property (`getprop <name>`); empty values are `None`.
    pub async fn property(&self, serial: &str, name: &str) -> Result<Option<String>, Error> {
        let out = self.run(&["-s", serial, "shell", "getprop", name]).await?;
        let value = out.trim();
        Ok((!value.is_empty()).then(|| value.to_owned()))
    }

    async fn run(&self, args: &[&str]) -> Result<String, Error> {
        let command = args.join(" ");
        trace!(adb = %self.config.adb_path.display(), %command, "running adb");

        let mut cmd = Command::new(&self.config.adb_path);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.config.command_timeout, cmd.output())
            .await
            .map_err(|_| Error::Timeout {
                command: command.clone(),
                timeout_secs: self.config.command_timeout.as_secs(),
            })?
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    Error::AdbNotFound {
                        path: self.config.adb_path.display().to_string(),
                    }
                } else {
                    Error::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(Error::CommandFailed {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ── Output parsing ──────────────────────────────────────────────────

/// Parse `adb devices -l` output.
pub fn parse_devices(output: &str) -> Vec<AdbDevice> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("List of devices") && !l.starts_with('*'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let serial = fields.next()?.to_owned();
            let state = AdbState::parse(fields.next()?);
            let attributes = fields
                .filter_map(|f| f.split_once(':'))
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            Some(AdbDevice {
                serial,
                state,
                attributes,
            })
        })
        .collect()
}

/// Parse an emulator console reply: the payload line followed by `OK`,
/// or a `KO: ...` line when the query is unsupported.
pub fn parse_emu_reply(output: &str) -> Option<String> {
    let first = output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && *l != "OK")?;
    if first.starts_with("KO") {
        return None;
    }
    Some(first.to_owned())
}
