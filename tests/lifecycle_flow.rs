use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use fivemind_shell::{
    HostInfo, LifecycleState, LoadFailure, ShellConfig, ShellCoordinator, ShellEvent, ShellHandle,
    ShellSnapshot, ShellSurfaces, SurfaceTarget, TaskError, TaskOutput, WindowBounds, WindowState,
};
use serde_json::json;
use tokio::task::JoinHandle;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    CreateSplash,
    BeginHideSplash,
    DestroySplash,
    CreateMain,
    ShowMain,
    Navigate(String, SurfaceTarget),
    Exit,
}

#[derive(Default)]
struct FakeState {
    splash: bool,
    main: bool,
    calls: Vec<Call>,
}

#[derive(Default)]
struct FakeSurfaces {
    state: Mutex<FakeState>,
}

impl FakeSurfaces {
    fn with_main_window() -> Self {
        let fake = Self::default();
        fake.state.lock().expect("fake state").main = true;
        fake
    }

    fn record(&self, call: Call) {
        self.state.lock().expect("fake state").calls.push(call);
    }

    fn count(&self, call: &Call) -> usize {
        self.state
            .lock()
            .expect("fake state")
            .calls
            .iter()
            .filter(|recorded| *recorded == call)
            .count()
    }

    fn close_splash(&self) {
        self.state.lock().expect("fake state").splash = false;
    }

    fn close_all(&self) {
        let mut state = self.state.lock().expect("fake state");
        state.splash = false;
        state.main = false;
    }
}

impl ShellSurfaces for FakeSurfaces {
    fn create_splash(&self) -> Result<(), String> {
        self.state.lock().expect("fake state").splash = true;
        self.record(Call::CreateSplash);
        Ok(())
    }

    fn splash_exists(&self) -> bool {
        self.state.lock().expect("fake state").splash
    }

    fn begin_hide_splash(&self) -> Result<(), String> {
        self.record(Call::BeginHideSplash);
        Ok(())
    }

    fn destroy_splash(&self) -> Result<(), String> {
        self.state.lock().expect("fake state").splash = false;
        self.record(Call::DestroySplash);
        Ok(())
    }

    fn main_window_exists(&self) -> bool {
        self.state.lock().expect("fake state").main
    }

    fn create_main_window(&self, _state: &WindowState, _target: &Url) -> Result<(), String> {
        self.state.lock().expect("fake state").main = true;
        self.record(Call::CreateMain);
        Ok(())
    }

    fn show_main_window(&self) -> Result<(), String> {
        self.record(Call::ShowMain);
        Ok(())
    }

    fn window_alive(&self, label: &str) -> bool {
        label == "main" && self.main_window_exists()
    }

    fn navigate(&self, label: &str, target: &SurfaceTarget) -> Result<(), String> {
        if !self.window_alive(label) {
            return Err(format!("window '{label}' not found"));
        }
        self.record(Call::Navigate(label.to_string(), target.clone()));
        Ok(())
    }

    fn open_window_count(&self) -> usize {
        let state = self.state.lock().expect("fake state");
        usize::from(state.splash) + usize::from(state.main)
    }

    fn exit_process(&self) {
        self.record(Call::Exit);
    }
}

struct Harness {
    handle: ShellHandle,
    surfaces: Arc<FakeSurfaces>,
    task: JoinHandle<()>,
    _data_dir: tempfile::TempDir,
}

impl Harness {
    fn start(surfaces: FakeSurfaces, persistent_platform: bool) -> Self {
        let data_dir = tempfile::tempdir().expect("tempdir");
        Self::start_in(data_dir, surfaces, persistent_platform)
    }

    fn start_in(data_dir: tempfile::TempDir, surfaces: FakeSurfaces, persistent_platform: bool) -> Self {
        let surfaces = Arc::new(surfaces);
        let config = ShellConfig {
            trusted_origin: origin(),
            data_dir: data_dir.path().to_path_buf(),
            persistent_platform,
        };
        let host = HostInfo {
            app_version: "1.0.0".to_string(),
            runtime_version: "2.0.0".to_string(),
        };
        let (coordinator, handle) = ShellCoordinator::new(config, host, surfaces.clone());
        let task = tokio::spawn(coordinator.run());
        Self {
            handle,
            surfaces,
            task,
            _data_dir: data_dir,
        }
    }

    fn data_dir(&self) -> &Path {
        self._data_dir.path()
    }

    fn send(&self, event: ShellEvent) {
        assert!(self.handle.send(event), "coordinator stopped unexpectedly");
    }

    async fn snapshot(&self) -> ShellSnapshot {
        self.handle.snapshot().await.expect("coordinator running")
    }

    async fn wait_until<F>(&self, condition: F) -> ShellSnapshot
    where
        F: Fn(&ShellSnapshot, &FakeSurfaces) -> bool,
    {
        for _ in 0..300 {
            let snapshot = self.snapshot().await;
            if condition(&snapshot, &self.surfaces) {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached; last snapshot: {:?}", self.snapshot().await);
    }

    async fn drive_to_main_loading(&self) {
        self.send(ShellEvent::ProcessReady);
        self.send(ShellEvent::SplashReady);
        assert_eq!(self.snapshot().await.lifecycle, LifecycleState::MainLoading);
    }
}

fn origin() -> Url {
    Url::parse("https://5mind.com/").expect("origin")
}

fn trusted_failure() -> LoadFailure {
    LoadFailure {
        url: "https://5mind.com/".to_string(),
        code: -106,
        description: "ERR_INTERNET_DISCONNECTED".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn timeout_forces_a_single_show_even_if_ready_fires_afterwards() {
    let harness = Harness::start(FakeSurfaces::default(), false);
    harness.drive_to_main_loading().await;

    tokio::time::sleep(Duration::from_millis(9_900)).await;
    assert_eq!(harness.snapshot().await.lifecycle, LifecycleState::MainLoading);
    assert_eq!(harness.surfaces.count(&Call::ShowMain), 0);

    tokio::time::sleep(Duration::from_secs(1)).await;
    harness.send(ShellEvent::MainContentReady);
    tokio::time::sleep(Duration::from_secs(5)).await;

    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.lifecycle, LifecycleState::TimedOutForcedShow);
    assert_eq!(harness.surfaces.count(&Call::ShowMain), 1);
    assert_eq!(harness.surfaces.count(&Call::BeginHideSplash), 1);
    assert_eq!(harness.surfaces.count(&Call::DestroySplash), 1);
    assert!(!harness.surfaces.splash_exists());
}

#[tokio::test(start_paused = true)]
async fn ready_before_deadline_shows_once_and_disarms_the_timeout() {
    let harness = Harness::start(FakeSurfaces::default(), false);
    harness.drive_to_main_loading().await;

    harness.send(ShellEvent::MainContentReady);
    harness.send(ShellEvent::MainContentReady);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(harness.surfaces.count(&Call::DestroySplash), 0);

    tokio::time::sleep(Duration::from_secs(30)).await;
    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.lifecycle, LifecycleState::Ready);
    assert_eq!(harness.surfaces.count(&Call::ShowMain), 1);
    assert_eq!(harness.surfaces.count(&Call::DestroySplash), 1);
}

#[tokio::test]
async fn rapid_splash_ready_signals_create_one_main_window() {
    let harness = Harness::start(FakeSurfaces::default(), false);
    harness.send(ShellEvent::ProcessReady);
    harness.send(ShellEvent::SplashReady);
    harness.send(ShellEvent::SplashReady);

    harness.snapshot().await;
    assert_eq!(harness.surfaces.count(&Call::CreateSplash), 1);
    assert_eq!(harness.surfaces.count(&Call::CreateMain), 1);
}

#[tokio::test]
async fn process_ready_with_existing_main_window_stays_idle() {
    let harness = Harness::start(FakeSurfaces::with_main_window(), false);
    harness.send(ShellEvent::ProcessReady);

    assert_eq!(harness.snapshot().await.lifecycle, LifecycleState::Init);
    assert_eq!(harness.surfaces.count(&Call::CreateSplash), 0);
}

#[tokio::test]
async fn bogus_operation_is_rejected_without_spawning_a_worker() {
    let harness = Harness::start(FakeSurfaces::default(), false);

    let result = harness.handle.execute("bogus-op", vec![]).await;

    assert_eq!(result, Err(TaskError::UnknownOperation("bogus-op".to_string())));
    assert_eq!(harness.snapshot().await.workers_spawned, 0);
}

#[tokio::test]
async fn execute_log_error_returns_the_entry_and_exposes_it_in_diagnostics() {
    let harness = Harness::start(FakeSurfaces::default(), false);

    let result = harness
        .handle
        .execute("log-error", vec![json!("Export failed"), json!("disk full")])
        .await;

    let Ok(TaskOutput::Logged { entry, persisted }) = result else {
        panic!("expected a logged entry, got {result:?}");
    };
    assert!(persisted);
    assert_eq!(entry.message, "Export failed");

    let report = harness.handle.fetch_diagnostics().await.expect("diagnostics");
    assert_eq!(report.logs, vec![entry]);
    assert_eq!(report.app_version, "1.0.0");
    assert!(report.log_file.ends_with("error.log"));
    let written = fs::read_to_string(harness.data_dir().join("error.log")).expect("error log");
    assert!(written.contains("] Export failed\ndisk full\n\n"));
}

#[tokio::test]
async fn untrusted_load_failure_changes_nothing() {
    let harness = Harness::start(FakeSurfaces::with_main_window(), false);

    harness.send(ShellEvent::MainLoadFailed(LoadFailure {
        url: "https://cdn.example.com/app.js".to_string(),
        code: -105,
        description: "ERR_NAME_NOT_RESOLVED".to_string(),
    }));

    let snapshot = harness.snapshot().await;
    assert_eq!(snapshot.log_entries, 0);
    assert_eq!(snapshot.workers_spawned, 0);
    assert_eq!(
        harness
            .surfaces
            .count(&Call::Navigate("main".to_string(), SurfaceTarget::Offline)),
        0
    );
}

#[tokio::test]
async fn trusted_load_failure_logs_shows_offline_and_forces_show_after_grace() {
    let harness = Harness::start(FakeSurfaces::default(), false);
    harness.drive_to_main_loading().await;

    harness.send(ShellEvent::MainLoadFailed(trusted_failure()));

    let snapshot = harness
        .wait_until(|snapshot, surfaces| {
            snapshot.log_entries == 1 && surfaces.count(&Call::ShowMain) == 1
        })
        .await;
    assert_eq!(snapshot.lifecycle, LifecycleState::TimedOutForcedShow);
    assert_eq!(
        harness
            .surfaces
            .count(&Call::Navigate("main".to_string(), SurfaceTarget::Offline)),
        1
    );

    let report = harness.handle.fetch_diagnostics().await.expect("diagnostics");
    assert_eq!(report.logs[0].message, "Page load failed: https://5mind.com/");
    assert_eq!(
        report.logs[0].stack_or_detail,
        "Code: -106, Desc: ERR_INTERNET_DISCONNECTED"
    );
}

#[tokio::test(start_paused = true)]
async fn load_failure_forces_show_exactly_at_the_grace_deadline() {
    let harness = Harness::start(FakeSurfaces::default(), false);
    harness.drive_to_main_loading().await;

    harness.send(ShellEvent::MainLoadFailed(trusted_failure()));
    harness.snapshot().await;

    tokio::time::sleep(Duration::from_millis(499)).await;
    assert_eq!(harness.snapshot().await.lifecycle, LifecycleState::MainLoading);
    assert_eq!(harness.surfaces.count(&Call::ShowMain), 0);

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(
        harness.snapshot().await.lifecycle,
        LifecycleState::TimedOutForcedShow
    );
    assert_eq!(harness.surfaces.count(&Call::ShowMain), 1);
    assert_eq!(harness.surfaces.count(&Call::BeginHideSplash), 1);
}

#[tokio::test(start_paused = true)]
async fn splash_already_gone_is_not_destroyed_again() {
    let harness = Harness::start(FakeSurfaces::default(), false);
    harness.drive_to_main_loading().await;

    harness.send(ShellEvent::MainContentReady);
    harness.snapshot().await;
    harness.surfaces.close_splash();

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(harness.snapshot().await.lifecycle, LifecycleState::Ready);
    assert_eq!(harness.surfaces.count(&Call::BeginHideSplash), 1);
    assert_eq!(harness.surfaces.count(&Call::DestroySplash), 0);
    assert_eq!(harness.surfaces.count(&Call::ShowMain), 1);
}

#[tokio::test]
async fn renderer_crash_logs_once_and_opens_the_error_surface_once() {
    let harness = Harness::start(FakeSurfaces::with_main_window(), false);
    let error_navigation = Call::Navigate("main".to_string(), SurfaceTarget::Error);

    harness.send(ShellEvent::RendererCrashed);

    harness
        .wait_until(|snapshot, surfaces| {
            snapshot.log_entries == 1 && surfaces.count(&error_navigation) == 1
        })
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let report = harness.handle.fetch_diagnostics().await.expect("diagnostics");
    assert_eq!(report.logs.len(), 1);
    assert_eq!(report.logs[0].message, "Renderer process crashed");
    assert_eq!(harness.surfaces.count(&error_navigation), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn stuck_log_write_does_not_hold_back_the_error_surface() {
    let harness = Harness::start(FakeSurfaces::with_main_window(), false);
    let log_path = harness.data_dir().join("error.log");
    // A FIFO with no reader blocks the appending worker on open.
    let status = std::process::Command::new("mkfifo")
        .arg(&log_path)
        .status()
        .expect("run mkfifo");
    assert!(status.success());
    let error_navigation = Call::Navigate("main".to_string(), SurfaceTarget::Error);

    harness.send(ShellEvent::RendererCrashed);

    let snapshot = harness
        .wait_until(|_, surfaces| surfaces.count(&error_navigation) == 1)
        .await;
    assert_eq!(snapshot.log_entries, 0);

    let written = tokio::task::spawn_blocking(move || fs::read_to_string(log_path))
        .await
        .expect("reader task")
        .expect("read log fifo");
    assert!(written.contains("] Renderer process crashed\n"));
    harness
        .wait_until(|snapshot, _| snapshot.log_entries == 1)
        .await;
}

#[tokio::test]
async fn uncaught_fault_is_logged_and_routed_to_the_error_surface() {
    let harness = Harness::start(FakeSurfaces::with_main_window(), false);
    let error_navigation = Call::Navigate("main".to_string(), SurfaceTarget::Error);

    harness.send(ShellEvent::UncaughtFault {
        message: "index out of bounds".to_string(),
        detail: "src/main.rs:10:5".to_string(),
    });

    harness
        .wait_until(|snapshot, surfaces| {
            snapshot.log_entries == 1 && surfaces.count(&error_navigation) == 1
        })
        .await;
    let report = harness.handle.fetch_diagnostics().await.expect("diagnostics");
    assert_eq!(report.logs[0].message, "Uncaught fault");
    assert_eq!(
        report.logs[0].stack_or_detail,
        "index out of bounds\nsrc/main.rs:10:5"
    );
}

#[tokio::test]
async fn retry_navigates_to_the_trusted_origin_every_time() {
    let harness = Harness::start(FakeSurfaces::with_main_window(), false);

    harness.send(ShellEvent::RetryLoad);
    harness.send(ShellEvent::RetryLoad);

    assert_eq!(harness.snapshot().await.retry_attempts, 2);
    assert_eq!(
        harness.surfaces.count(&Call::Navigate(
            "main".to_string(),
            SurfaceTarget::Remote(origin())
        )),
        2
    );
}

fn read_persisted_state(dir: &Path) -> Option<WindowState> {
    let raw = fs::read_to_string(dir.join("window-state.json")).ok()?;
    serde_json::from_str(&raw).ok()
}

#[tokio::test]
async fn geometry_is_persisted_and_survives_maximize() {
    let harness = Harness::start(FakeSurfaces::with_main_window(), false);
    let normal = WindowBounds {
        x: 30,
        y: 40,
        width: 1024,
        height: 700,
    };

    harness.send(ShellEvent::MainWindowGeometry {
        bounds: normal,
        is_maximized: false,
        is_full_screen: false,
    });
    let data_dir = harness.data_dir().to_path_buf();
    harness
        .wait_until(|_, _| read_persisted_state(&data_dir).is_some_and(|s| s.width == 1024))
        .await;

    harness.send(ShellEvent::MainWindowGeometry {
        bounds: WindowBounds {
            x: 0,
            y: 0,
            width: 2560,
            height: 1400,
        },
        is_maximized: true,
        is_full_screen: false,
    });
    harness
        .wait_until(|_, _| read_persisted_state(&data_dir).is_some_and(|s| s.is_maximized))
        .await;

    let persisted = read_persisted_state(&data_dir).expect("persisted state");
    assert_eq!(
        persisted,
        WindowState {
            x: Some(30),
            y: Some(40),
            width: 1024,
            height: 700,
            is_maximized: true,
            is_full_screen: false,
        }
    );
}

#[tokio::test]
async fn state_persisted_by_a_caller_is_kept_across_a_later_maximize() {
    let harness = Harness::start(FakeSurfaces::with_main_window(), false);
    let requested = WindowState {
        x: Some(5),
        y: Some(6),
        width: 900,
        height: 600,
        is_maximized: false,
        is_full_screen: false,
    };

    let result = harness
        .handle
        .execute(
            "persist-window-state",
            vec![json!({
                "x": 5,
                "y": 6,
                "width": 900,
                "height": 600,
                "isMaximized": false,
                "isFullScreen": false
            })],
        )
        .await;
    let Ok(TaskOutput::WindowStatePersisted { state, .. }) = result else {
        panic!("expected persisted state, got {result:?}");
    };
    assert_eq!(state, requested);
    assert_eq!(harness.snapshot().await.window_state, requested);

    harness.send(ShellEvent::MainWindowGeometry {
        bounds: WindowBounds {
            x: 0,
            y: 0,
            width: 2560,
            height: 1400,
        },
        is_maximized: true,
        is_full_screen: false,
    });
    let data_dir = harness.data_dir().to_path_buf();
    harness
        .wait_until(|_, _| read_persisted_state(&data_dir).is_some_and(|s| s.is_maximized))
        .await;

    assert_eq!(
        read_persisted_state(&data_dir).expect("persisted state"),
        WindowState {
            is_maximized: true,
            ..requested
        }
    );
}

#[tokio::test]
async fn persisted_state_is_used_for_the_next_launch() {
    let data_dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        data_dir.path().join("window-state.json"),
        r#"{"width":1000,"height":700,"isMaximized":true}"#,
    )
    .expect("seed state");

    let harness = Harness::start_in(data_dir, FakeSurfaces::default(), false);

    assert_eq!(
        harness.snapshot().await.window_state,
        WindowState {
            x: None,
            y: None,
            width: 1000,
            height: 700,
            is_maximized: true,
            is_full_screen: false,
        }
    );
}

#[tokio::test]
async fn closing_last_window_exits_on_non_persistent_platforms() {
    let harness = Harness::start(FakeSurfaces::default(), false);
    harness.drive_to_main_loading().await;
    harness.send(ShellEvent::MainContentReady);
    harness.surfaces.close_all();

    harness.send(ShellEvent::AllWindowsClosed);

    tokio::time::timeout(Duration::from_secs(2), harness.task)
        .await
        .expect("coordinator stops after exit")
        .expect("coordinator task");
    assert_eq!(harness.surfaces.count(&Call::Exit), 1);
}

#[tokio::test]
async fn persistent_platform_reshows_splash_on_reactivation() {
    let harness = Harness::start(FakeSurfaces::default(), true);
    harness.drive_to_main_loading().await;
    harness.send(ShellEvent::MainContentReady);
    harness.surfaces.close_all();

    harness.send(ShellEvent::AllWindowsClosed);
    assert_eq!(harness.snapshot().await.lifecycle, LifecycleState::Init);
    assert_eq!(harness.surfaces.count(&Call::Exit), 0);

    harness.send(ShellEvent::Reactivated);
    assert_eq!(harness.snapshot().await.lifecycle, LifecycleState::SplashShown);
    assert_eq!(harness.surfaces.count(&Call::CreateSplash), 2);

    harness.send(ShellEvent::SplashReady);
    assert_eq!(harness.snapshot().await.lifecycle, LifecycleState::MainLoading);
    assert_eq!(harness.surfaces.count(&Call::CreateMain), 2);
}
