use crate::error::{Error, Result};
use std::fs;
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IdentifierKind {
    Cpu,
    Board,
}

impl IdentifierKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Board => "mb",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub kind: IdentifierKind,
    pub value: String,
}

impl Identifier {
    pub fn labelled(&self) -> String {
        format!("{}:{}", self.kind.label(), self.value)
    }
}

/// A source of hardware identifiers for one platform.
///
/// Implementations never fail: unavailable sources are simply absent from
/// the returned list.
pub trait Probe: Send + Sync {
    fn name(&self) -> &'static str;
    fn probe(&self) -> Vec<Identifier>;
}

/// One fallible way to read a single identifier.
struct Strategy {
    kind: IdentifierKind,
    name: &'static str,
    read: fn() -> Result<String>,
}

/// Runs `strategies` in order. Within a kind the first success wins; every
/// kind that produced a value is kept, CPU before board.
fn run_strategies(strategies: &[Strategy]) -> Vec<Identifier> {
    let mut identifiers: Vec<Identifier> = Vec::new();

    for strategy in strategies {
        if identifiers.iter().any(|id| id.kind == strategy.kind) {
            continue;
        }

        match (strategy.read)().and_then(|v| non_empty(strategy.name, v)) {
            Ok(value) => {
                log::debug!("probe {} succeeded", strategy.name);
                identifiers.push(Identifier {
                    kind: strategy.kind,
                    value,
                });
            }
            Err(e) => log::debug!("{e}"),
        }
    }

    identifiers.sort_by_key(|id| id.kind);
    identifiers
}

fn non_empty(name: &'static str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::probe(name, "empty value"))
    } else {
        Ok(trimmed.to_string())
    }
}

fn run(probe: &'static str, program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| Error::probe(probe, e))?;

    if !output.status.success() {
        return Err(Error::probe(probe, format!("{program} exited with {}", output.status)));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn read_hostname() -> Result<String> {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .map_err(|e| Error::probe("linux.hostname", e))
}

/// Value of the first `key : value` line of `/proc/cpuinfo` naming the CPU.
pub fn parse_cpuinfo(text: &str) -> Option<String> {
    const KEYS: [&str; 4] = ["model name", "Hardware", "Processor", "cpu model"];

    KEYS.iter().find_map(|wanted| {
        text.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            let value = value.trim();
            (key.trim() == *wanted && !value.is_empty()).then(|| value.to_string())
        })
    })
}

/// Value of `Key=Value` in `wmic ... /value` output.
pub fn parse_wmic_value(text: &str, key: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let (k, v) = line.trim().split_once('=')?;
        let v = v.trim();
        (k.trim() == key && !v.is_empty()).then(|| v.to_string())
    })
}

/// Hardware serial from `system_profiler SPHardwareDataType` output.
pub fn parse_system_profiler_serial(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        let v = v.trim();
        (k.contains("Serial Number") && !v.is_empty()).then(|| v.to_string())
    })
}

pub struct LinuxProbe;

impl LinuxProbe {
    // The hostname stands in for the board serial when DMI needs root.
    const STRATEGIES: [Strategy; 4] = [
        Strategy {
            kind: IdentifierKind::Cpu,
            name: "linux.cpuinfo",
            read: || {
                let text = fs::read_to_string("/proc/cpuinfo")
                    .map_err(|e| Error::probe("linux.cpuinfo", e))?;
                parse_cpuinfo(&text).ok_or_else(|| Error::probe("linux.cpuinfo", "no CPU model line"))
            },
        },
        Strategy {
            kind: IdentifierKind::Board,
            name: "linux.dmi",
            read: || {
                fs::read_to_string("/sys/class/dmi/id/board_serial")
                    .map_err(|e| Error::probe("linux.dmi", e))
            },
        },
        Strategy {
            kind: IdentifierKind::Board,
            name: "linux.dmidecode",
            read: || run("linux.dmidecode", "dmidecode", &["-s", "baseboard-serial-number"]),
        },
        Strategy {
            kind: IdentifierKind::Board,
            name: "linux.hostname",
            read: read_hostname,
        },
    ];
}

impl Probe for LinuxProbe {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn probe(&self) -> Vec<Identifier> {
        run_strategies(&Self::STRATEGIES)
    }
}

pub struct WindowsProbe;

impl WindowsProbe {
    const STRATEGIES: [Strategy; 2] = [
        Strategy {
            kind: IdentifierKind::Cpu,
            name: "windows.wmic.cpu",
            read: || {
                let out = run("windows.wmic.cpu", "wmic", &["cpu", "get", "ProcessorId", "/value"])?;
                parse_wmic_value(&out, "ProcessorId")
                    .ok_or_else(|| Error::probe("windows.wmic.cpu", "no ProcessorId"))
            },
        },
        Strategy {
            kind: IdentifierKind::Board,
            name: "windows.wmic.baseboard",
            read: || {
                let out = run(
                    "windows.wmic.baseboard",
                    "wmic",
                    &["baseboard", "get", "SerialNumber", "/value"],
                )?;
                parse_wmic_value(&out, "SerialNumber")
                    .ok_or_else(|| Error::probe("windows.wmic.baseboard", "no SerialNumber"))
            },
        },
    ];
}

impl Probe for WindowsProbe {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn probe(&self) -> Vec<Identifier> {
        run_strategies(&Self::STRATEGIES)
    }
}

pub struct MacOsProbe;

impl MacOsProbe {
    const STRATEGIES: [Strategy; 2] = [
        Strategy {
            kind: IdentifierKind::Cpu,
            name: "macos.sysctl",
            read: || run("macos.sysctl", "sysctl", &["-n", "machdep.cpu.brand_string"]),
        },
        Strategy {
            kind: IdentifierKind::Board,
            name: "macos.system_profiler",
            read: || {
                let out = run(
                    "macos.system_profiler",
                    "system_profiler",
                    &["SPHardwareDataType"],
                )?;
                parse_system_profiler_serial(&out)
                    .ok_or_else(|| Error::probe("macos.system_profiler", "no Serial Number"))
            },
        },
    ];
}

impl Probe for MacOsProbe {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn probe(&self) -> Vec<Identifier> {
        run_strategies(&Self::STRATEGIES)
    }
}

/// Used on platforms without a dedicated probe, and in tests.
pub struct NullProbe;

impl Probe for NullProbe {
    fn name(&self) -> &'static str {
        "none"
    }

    fn probe(&self) -> Vec<Identifier> {
        Vec::new()
    }
}

pub fn platform_probe() -> Box<dyn Probe> {
    match std::env::consts::OS {
        "linux" | "android" => Box::new(LinuxProbe),
        "windows" => Box::new(WindowsProbe),
        "macos" => Box::new(MacOsProbe),
        _ => Box::new(NullProbe),
    }
}
