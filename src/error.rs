//! Unified error types for the TankMon firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! boot orchestrator's error handling uniform. All variants are `Copy` so
//! they can be passed through the update state machine without allocation;
//! offending paths are logged at the failure site rather than carried here.

use core::fmt;
use std::io;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A version token could not be parsed.
    Version(ParseVersionError),
    /// An update source could not be queried or read.
    Source(SourceError),
    /// Snapshot capture or restore failed.
    Backup(BackupError),
    /// Applying a candidate file set failed.
    Apply(ApplyError),
    /// Persisted device state could not be read or written.
    State(StateError),
    /// A communication subsystem failed.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version(e) => write!(f, "version: {e}"),
            Self::Source(e) => write!(f, "source: {e}"),
            Self::Backup(e) => write!(f, "backup: {e}"),
            Self::Apply(e) => write!(f, "apply: {e}"),
            Self::State(e) => write!(f, "state: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Version parse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseVersionError {
    /// Token is empty after trimming and prefix stripping.
    Empty,
    /// A component is not a decimal number.
    Malformed,
}

impl fmt::Display for ParseVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty version token"),
            Self::Malformed => write!(f, "malformed version token"),
        }
    }
}

impl From<ParseVersionError> for Error {
    fn from(e: ParseVersionError) -> Self {
        Self::Version(e)
    }
}

// ---------------------------------------------------------------------------
// Update source errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceError {
    /// The source cannot be reached (no network, no card).
    Unreachable,
    /// The source payload could not be decoded.
    Malformed,
    /// Reading from the source failed mid-transfer.
    Read(io::ErrorKind),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "source unreachable"),
            Self::Malformed => write!(f, "source payload malformed"),
            Self::Read(kind) => write!(f, "source read failed: {kind}"),
        }
    }
}

impl From<SourceError> for Error {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

// ---------------------------------------------------------------------------
// Backup errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupError {
    /// Rollback requested but no valid snapshot exists.
    NoBackupFound,
    /// Copying the active set into the snapshot failed.
    Capture(io::ErrorKind),
    /// Copying the snapshot back over the active set failed.
    Restore(io::ErrorKind),
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoBackupFound => write!(f, "no backup found"),
            Self::Capture(kind) => write!(f, "capture failed: {kind}"),
            Self::Restore(kind) => write!(f, "restore failed: {kind}"),
        }
    }
}

impl From<BackupError> for Error {
    fn from(e: BackupError) -> Self {
        Self::Backup(e)
    }
}

// ---------------------------------------------------------------------------
// Apply errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyError {
    /// Retrieving an entry's bytes from the source failed.
    Fetch(SourceError),
    /// Writing an entry into the active set failed.
    Write(io::ErrorKind),
    /// The apply marker could not be written or removed.
    Marker(io::ErrorKind),
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "entry fetch failed: {e}"),
            Self::Write(kind) => write!(f, "entry write failed: {kind}"),
            Self::Marker(kind) => write!(f, "apply marker failed: {kind}"),
        }
    }
}

impl From<ApplyError> for Error {
    fn from(e: ApplyError) -> Self {
        Self::Apply(e)
    }
}

// ---------------------------------------------------------------------------
// Persisted state errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// The version marker or journal could not be read.
    Read(io::ErrorKind),
    /// The version marker or journal could not be written.
    Write(io::ErrorKind),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(kind) => write!(f, "state read failed: {kind}"),
            Self::Write(kind) => write!(f, "state write failed: {kind}"),
        }
    }
}

impl From<StateError> for Error {
    fn from(e: StateError) -> Self {
        Self::State(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    WifiConnectFailed,
    WifiDisconnected,
    HttpRequestFailed,
    SdMountFailed,
    VfsMountFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::WifiDisconnected => write!(f, "WiFi disconnected"),
            Self::HttpRequestFailed => write!(f, "HTTP request failed"),
            Self::SdMountFailed => write!(f, "SD card mount failed"),
            Self::VfsMountFailed => write!(f, "data partition mount failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation; the message names the field.
    ValidationFailed(&'static str),
    /// The config file could not be read.
    Load,
    /// The config file is not valid JSON.
    Malformed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(field) => write!(f, "validation failed: {field}"),
            Self::Load => write!(f, "config load failed"),
            Self::Malformed => write!(f, "config file malformed"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
