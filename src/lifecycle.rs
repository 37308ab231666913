use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleState {
    Init,
    SplashShown,
    MainLoading,
    Ready,
    TimedOutForcedShow,
    Closed,
}

/// Effects requested by a transition, applied by the coordinator in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    CreateSplash,
    CreateMainWindow,
    StartReadyTimeout,
    ScheduleForcedShow,
    CancelReadyTimeout,
    BeginHideSplash,
    ScheduleSplashDestroy,
    ShowMainWindow,
    ExitProcess,
}

const HANDOFF: [LifecycleAction; 4] = [
    LifecycleAction::CancelReadyTimeout,
    LifecycleAction::BeginHideSplash,
    LifecycleAction::ScheduleSplashDestroy,
    LifecycleAction::ShowMainWindow,
];

/// Splash → main window handoff as a pure state machine.
///
/// Every cycle (process start, or dock reactivation) gets a new `epoch`; timer
/// events carry the epoch they were scheduled in and are dropped if stale.
#[derive(Debug)]
pub struct LifecycleMachine {
    state: LifecycleState,
    epoch: u64,
    splash_ready_armed: bool,
    forced_show_pending: bool,
}

impl Default for LifecycleMachine {
    fn default() -> Self {
        Self {
            state: LifecycleState::Init,
            epoch: 0,
            splash_ready_armed: false,
            forced_show_pending: false,
        }
    }
}

impl LifecycleMachine {
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn on_process_ready(&mut self, main_window_exists: bool) -> Vec<LifecycleAction> {
        if self.state != LifecycleState::Init || main_window_exists {
            return Vec::new();
        }
        self.begin_cycle()
    }

    /// Single-use: only the first signal after the splash is shown counts.
    pub fn on_splash_ready(&mut self) -> Vec<LifecycleAction> {
        if !std::mem::take(&mut self.splash_ready_armed) {
            return Vec::new();
        }
        self.state = LifecycleState::MainLoading;
        vec![
            LifecycleAction::CreateMainWindow,
            LifecycleAction::StartReadyTimeout,
        ]
    }

    pub fn on_main_ready(&mut self) -> Vec<LifecycleAction> {
        if self.state != LifecycleState::MainLoading {
            return Vec::new();
        }
        self.state = LifecycleState::Ready;
        self.forced_show_pending = false;
        HANDOFF.to_vec()
    }

    pub fn on_ready_timeout(&mut self, epoch: u64) -> Vec<LifecycleAction> {
        self.force_show(epoch)
    }

    /// A trusted load failure while loading shortens the wait to the grace delay.
    pub fn on_load_failure(&mut self) -> Vec<LifecycleAction> {
        if self.state != LifecycleState::MainLoading || self.forced_show_pending {
            return Vec::new();
        }
        self.forced_show_pending = true;
        vec![LifecycleAction::ScheduleForcedShow]
    }

    pub fn on_forced_show_due(&mut self, epoch: u64) -> Vec<LifecycleAction> {
        self.force_show(epoch)
    }

    pub fn is_current_epoch(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    pub fn on_all_windows_closed(&mut self, persistent_platform: bool) -> Vec<LifecycleAction> {
        self.state = LifecycleState::Closed;
        self.splash_ready_armed = false;
        self.forced_show_pending = false;
        if persistent_platform {
            self.state = LifecycleState::Init;
            return vec![LifecycleAction::CancelReadyTimeout];
        }
        vec![
            LifecycleAction::CancelReadyTimeout,
            LifecycleAction::ExitProcess,
        ]
    }

    /// Dock/taskbar reactivation re-runs the splash only with nothing open.
    pub fn on_reactivate(&mut self, open_windows: usize) -> Vec<LifecycleAction> {
        if self.state != LifecycleState::Init || open_windows > 0 {
            return Vec::new();
        }
        self.begin_cycle()
    }

    fn begin_cycle(&mut self) -> Vec<LifecycleAction> {
        self.epoch += 1;
        self.state = LifecycleState::SplashShown;
        self.splash_ready_armed = true;
        self.forced_show_pending = false;
        vec![LifecycleAction::CreateSplash]
    }

    fn force_show(&mut self, epoch: u64) -> Vec<LifecycleAction> {
        if epoch != self.epoch || self.state != LifecycleState::MainLoading {
            return Vec::new();
        }
        self.state = LifecycleState::TimedOutForcedShow;
        self.forced_show_pending = false;
        HANDOFF.to_vec()
    }
}
