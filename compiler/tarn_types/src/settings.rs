//! Compilation settings.
//!
//! Read once by the driver and passed to the operations that depend on the
//! target, such as [`MetaType::byte_size`](crate::MetaType::byte_size).

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Target architecture.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Platform {
    X86,
    #[default]
    Amd64,
    AArch32,
    AArch64,
    Rv32,
    Rv64,
}

impl Platform {
    /// Size of a pointer in bytes.
    pub const fn pointer_size(self) -> u64 {
        match self {
            Platform::X86 | Platform::AArch32 | Platform::Rv32 => 4,
            Platform::Amd64 | Platform::AArch64 | Platform::Rv64 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Platform::X86 => "x86",
            Platform::Amd64 => "amd64",
            Platform::AArch32 => "aarch32",
            Platform::AArch64 => "aarch64",
            Platform::Rv32 => "rv32",
            Platform::Rv64 => "rv64",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error when parsing an unknown platform name.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct UnknownPlatform(pub String);

impl fmt::Display for UnknownPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown target platform `{}` (expected x86, amd64, aarch32, aarch64, rv32 or rv64)",
            self.0
        )
    }
}

impl std::error::Error for UnknownPlatform {}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x86" | "i686" => Ok(Platform::X86),
            "amd64" | "x86_64" | "x64" => Ok(Platform::Amd64),
            "aarch32" | "arm" => Ok(Platform::AArch32),
            "aarch64" | "arm64" => Ok(Platform::AArch64),
            "rv32" | "riscv32" => Ok(Platform::Rv32),
            "rv64" | "riscv64" => Ok(Platform::Rv64),
            _ => Err(UnknownPlatform(s.to_owned())),
        }
    }
}

static CURRENT: OnceLock<Settings> = OnceLock::new();

/// Settings for one compilation.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Settings {
    pub platform: Platform,
    /// Emit an info-level event for every committed specialization.
    pub trace_inference: bool,
}

impl Settings {
    /// Read `TARN_TARGET` and `TARN_TRACE_INFERENCE`.
    ///
    /// An unknown target is reported as a warning and the default platform
    /// is used.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("TARN_TARGET").ok().as_deref(),
            std::env::var("TARN_TRACE_INFERENCE").ok().as_deref(),
        )
    }

    /// Install these settings for the process. Returns `false` when settings
    /// were already installed or read.
    pub fn install(self) -> bool {
        CURRENT.set(self).is_ok()
    }

    /// The installed settings, read from the environment on first use.
    pub fn current() -> &'static Settings {
        CURRENT.get_or_init(Settings::from_env)
    }

    fn from_vars(target: Option<&str>, trace: Option<&str>) -> Self {
        let platform = match target.map(str::parse::<Platform>) {
            Some(Ok(platform)) => platform,
            Some(Err(err)) => {
                tracing::warn!(%err, "falling back to the default platform");
                Platform::default()
            }
            None => Platform::default(),
        };
        let trace_inference = matches!(
            trace.map(str::trim),
            Some("1" | "true" | "yes" | "on")
        );
        Settings {
            platform,
            trace_inference,
        }
    }
}
