//! Shared test doubles for the integration suite.
//!
//! Everything here runs on the host: time is simulated, the button
//! follows a scripted timeline, the lamp records frames, and HTTP
//! serves canned responses keyed by URL.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use tankmon::config::SystemConfig;
use tankmon::error::SourceError;
use tankmon::ports::{
    ButtonProbe, Clock, HttpFetch, HttpResponse, StatusLamp, VolumeMount, WatchdogFeed,
};
use tankmon::update::Layout;
use tempfile::TempDir;

// ── Clock ─────────────────────────────────────────────────────

/// Clock whose `sleep_ms` advances time instantly.
pub struct SimClock {
    now: Cell<u64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self { now: Cell::new(0) }
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: u32) {
        self.now.set(self.now.get() + u64::from(ms));
    }
}

// ── Watchdog ──────────────────────────────────────────────────

/// The host has no TWDT to satisfy.
pub struct SimWatchdog;

impl WatchdogFeed for SimWatchdog {
    fn feed(&self) {}
}

// ── Button ────────────────────────────────────────────────────

/// Button whose level follows `(at_ms, pressed)` changes against a
/// shared [`SimClock`].
pub struct ScriptButton<'c> {
    changes: Vec<(u64, bool)>,
    clock: &'c SimClock,
}

impl<'c> ScriptButton<'c> {
    pub fn new(clock: &'c SimClock, changes: Vec<(u64, bool)>) -> Self {
        Self { changes, clock }
    }

    /// Press-release-press-release inside the double-press window.
    pub fn double_press(clock: &'c SimClock) -> Self {
        Self::new(
            clock,
            vec![(0, true), (100, false), (400, true), (500, false)],
        )
    }

    /// A single press-and-release.
    pub fn single_press(clock: &'c SimClock) -> Self {
        Self::new(clock, vec![(0, true), (100, false)])
    }

    pub fn idle(clock: &'c SimClock) -> Self {
        Self::new(clock, Vec::new())
    }
}

impl ButtonProbe for ScriptButton<'_> {
    fn is_pressed(&mut self) -> bool {
        let now = self.clock.now_ms();
        self.changes
            .iter()
            .filter(|(at, _)| *at <= now)
            .next_back()
            .is_some_and(|(_, level)| *level)
    }
}

// ── Lamp ──────────────────────────────────────────────────────

/// Records every level write.
pub struct RecordingLamp {
    pub writes: Vec<bool>,
}

impl RecordingLamp {
    pub fn new() -> Self {
        Self { writes: Vec::new() }
    }
}

impl StatusLamp for RecordingLamp {
    fn set(&mut self, on: bool) {
        self.writes.push(on);
    }
}

// ── HTTP ──────────────────────────────────────────────────────

/// One recorded request: URL plus its headers.
pub type RequestLog = std::rc::Rc<std::cell::RefCell<Vec<(String, Vec<(String, String)>)>>>;

/// Serves canned responses keyed by exact URL; unknown URLs are
/// unreachable.  The request log is shared so tests can assert on
/// headers after a source has taken ownership of the client.
pub struct CannedHttp {
    routes: Vec<(String, HttpResponse)>,
    requests: RequestLog,
}

impl CannedHttp {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            requests: RequestLog::default(),
        }
    }

    pub fn route(mut self, url: &str, status: u16, body: &[u8]) -> Self {
        self.routes.push((
            url.to_string(),
            HttpResponse {
                status,
                body: body.to_vec(),
            },
        ));
        self
    }

    pub fn request_log(&self) -> RequestLog {
        self.requests.clone()
    }
}

impl HttpFetch for CannedHttp {
    fn get(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        _timeout_ms: u32,
    ) -> Result<HttpResponse, SourceError> {
        self.requests.borrow_mut().push((
            url.to_string(),
            headers
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        ));
        self.routes
            .iter()
            .find(|(route, _)| route == url)
            .map(|(_, response)| response.clone())
            .ok_or(SourceError::Unreachable)
    }
}

// ── Volume ────────────────────────────────────────────────────

/// Directory-backed card that can also simulate an absent card.
pub struct DirVolume {
    root: PathBuf,
    present: bool,
}

impl DirVolume {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            present: true,
        }
    }

    pub fn absent(root: PathBuf) -> Self {
        Self {
            root,
            present: false,
        }
    }
}

impl VolumeMount for DirVolume {
    fn mount(&mut self) -> bool {
        self.present && self.root.is_dir()
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

// ── Filesystem fixture ────────────────────────────────────────

/// Temp data partition plus a temp "SD card", with write helpers.
pub struct Fixture {
    pub data_dir: TempDir,
    pub sd_dir: TempDir,
    pub layout: Layout,
    pub config: SystemConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let data_dir = TempDir::new().unwrap();
        let sd_dir = TempDir::new().unwrap();
        let layout = Layout::under(data_dir.path());
        fs::create_dir_all(&layout.active_root).unwrap();
        Self {
            data_dir,
            sd_dir,
            layout,
            config: SystemConfig::default(),
        }
    }

    pub fn write_active(&self, rel: &str, contents: &str) {
        write_under(&self.layout.active_root, rel, contents);
    }

    pub fn read_active(&self, rel: &str) -> String {
        fs::read_to_string(self.layout.active_root.join(rel)).unwrap()
    }

    pub fn active_exists(&self, rel: &str) -> bool {
        self.layout.active_root.join(rel).exists()
    }

    /// Populate `update/` on the card: a version token plus files.
    pub fn write_sd_update(&self, token: &str, files: &[(&str, &str)]) {
        let update_dir = self.sd_dir.path().join("update");
        write_under(&update_dir, "version.txt", &format!("{token}\n"));
        for (rel, contents) in files {
            write_under(&update_dir, rel, contents);
        }
    }

    pub fn sd_volume(&self) -> DirVolume {
        DirVolume::new(self.sd_dir.path().to_path_buf())
    }
}

pub fn write_under(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

// ── Boot pass runner ──────────────────────────────────────────

/// One full controller pass over the fixture with a scripted button.
pub fn run_boot(
    fixture: &Fixture,
    arbiter: &mut tankmon::update::source::SourceArbiter,
    presses: Vec<(u64, bool)>,
) -> tankmon::orchestrator::BootReport {
    use tankmon::orchestrator::RollbackController;
    use tankmon::status::StatusReporter;
    use tankmon::update::state;

    let clock = SimClock::new();
    let mut button = ScriptButton::new(&clock, presses);
    let mut lamp = RecordingLamp::new();
    let watchdog = SimWatchdog;
    let reporter = StatusReporter::new(&mut lamp, &clock);

    let device = state::load(&fixture.layout);
    let mut controller = RollbackController::new(
        &fixture.config,
        &fixture.layout,
        arbiter,
        &mut button,
        &clock,
        &watchdog,
        reporter,
    );
    controller.run(device)
}
