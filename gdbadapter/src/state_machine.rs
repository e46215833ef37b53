/// Finite-state boot/attach/run state machine. One MI command is issued
/// per transition; each state is visited in an "issue" phase (send the
/// command) then an "await" phase (wait for its reply to land in the
/// `RecordStore`) before advancing.
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Init,
    SpawnGdb,
    ScanProbe,
    GdbVersion,
    LoadFile,
    TargetSelect,
    IdentifyProbe,
    QueryMonitorCmds,
    ConnectSrst,
    TpwrEnable,
    ScanTarget,
    AsyncMode,
    Attach,
    QueryMonitorCmds2,
    GetSources,
    MemAccessOff,
    MemRemapScript,
    PartIdQuery,
    Verify,
    Download,
    CheckEntryPoint,
    InsertEntryBreak,
    ExecRun,
    Running,
    Stopped,
}

impl State {
    /// The state that follows this one on success, for the boot/attach
    /// chain. `Download` is conditional (only entered when flashing is
    /// requested); callers skip straight from `Verify` to `CheckEntryPoint`
    /// otherwise.
    pub fn next(self, download_requested: bool) -> State {
        match self {
            State::Init => State::SpawnGdb,
            State::SpawnGdb => State::ScanProbe,
            State::ScanProbe => State::GdbVersion,
            State::GdbVersion => State::LoadFile,
            State::LoadFile => State::TargetSelect,
            State::TargetSelect => State::IdentifyProbe,
            State::IdentifyProbe => State::QueryMonitorCmds,
            State::QueryMonitorCmds => State::ConnectSrst,
            State::ConnectSrst => State::TpwrEnable,
            State::TpwrEnable => State::ScanTarget,
            State::ScanTarget => State::AsyncMode,
            State::AsyncMode => State::Attach,
            State::Attach => State::QueryMonitorCmds2,
            State::QueryMonitorCmds2 => State::GetSources,
            State::GetSources => State::MemAccessOff,
            State::MemAccessOff => State::MemRemapScript,
            State::MemRemapScript => State::PartIdQuery,
            State::PartIdQuery => State::Verify,
            State::Verify => {
                if download_requested {
                    State::Download
                } else {
                    State::CheckEntryPoint
                }
            }
            State::Download => State::CheckEntryPoint,
            State::CheckEntryPoint => State::InsertEntryBreak,
            State::InsertEntryBreak => State::ExecRun,
            State::ExecRun => State::Running,
            State::Running => State::Running,
            State::Stopped => State::Stopped,
        }
    }

    /// The MI/monitor command this state issues, if any. `None` means the
    /// state performs purely local work (no round trip). States whose
    /// command depends on session parameters (the ELF path, the target
    /// index on a multi-device scan) return `None` here; `StateMachine`
    /// fills those in from its own fields.
    pub fn command(self) -> Option<&'static str> {
        match self {
            State::SpawnGdb => None,
            State::ScanProbe => Some("interpreter-exec console \"monitor swdp_scan\""),
            State::GdbVersion => Some("interpreter-exec console \"show version\""),
            State::LoadFile => None, // filled in with the ELF path by the caller
            State::TargetSelect => Some("target-select extended-remote /dev/ttyBmpGdb"),
            State::IdentifyProbe => Some("interpreter-exec console \"monitor version\""),
            State::QueryMonitorCmds | State::QueryMonitorCmds2 => Some("interpreter-exec console \"monitor help\""),
            State::ConnectSrst => Some("interpreter-exec console \"monitor connect_srst enable\""),
            State::TpwrEnable => Some("interpreter-exec console \"monitor tpwr enable\""),
            State::ScanTarget => Some("interpreter-exec console \"monitor swdp_scan\""),
            State::AsyncMode => Some("gdb-set mi-async on"),
            State::Attach => None, // filled in with the target index by the caller
            State::GetSources => Some("file-list-exec-source-files"),
            State::MemAccessOff => Some("interpreter-exec console \"monitor mem_access off\""),
            State::MemRemapScript => None,
            State::PartIdQuery => Some("interpreter-exec console \"monitor part_id\""),
            State::Verify => Some("interpreter-exec console \"compare-sections\""),
            State::Download => Some("target-download"),
            State::CheckEntryPoint => Some("data-evaluate-expression $pc"),
            State::InsertEntryBreak => Some("break-insert -t *$pc"),
            State::ExecRun => Some("exec-run"),
            State::Init | State::Running | State::Stopped => None,
        }
    }

    /// States whose command is filled in by the caller rather than fixed:
    /// `LoadFile` needs the ELF path, `Attach` needs the scanned target
    /// index.
    pub fn needs_caller_supplied_command(self) -> bool {
        matches!(self, State::LoadFile | State::Attach)
    }
}

/// Drives the boot/attach chain and the running/stopped loop. Issues at
/// most one command per `step`, and waits for that command's reply before
/// advancing — `marked` guards against re-issuing the same state's command
/// while its reply is still in flight.
pub struct StateMachine {
    state: State,
    marked: bool,
    download_requested: bool,
    /// Target index on a multi-device scan, used for `Attach`'s
    /// `target-attach N` (the `-t`/`--target` CLI option).
    target_index: u32,
    ctrl_c_presses: Vec<Instant>,
}

const DOUBLE_CTRL_C_WINDOW: Duration = Duration::from_secs(3);

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(false, 1)
    }
}

impl StateMachine {
    pub fn new(download_requested: bool, target_index: u32) -> Self {
        Self {
            state: State::Init,
            marked: false,
            download_requested,
            target_index,
            ctrl_c_presses: Vec::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Issue-phase entry: call once per frame while `!marked`. Returns the
    /// command to send, if this state has one; the caller marks the
    /// transition pending once it has actually sent it. `Attach`'s target
    /// index is filled in here; `LoadFile` still returns `None` since only
    /// the caller (which owns the ELF path) can fill it in.
    pub fn command_to_issue(&self) -> Option<String> {
        if self.marked {
            return None;
        }
        match self.state {
            State::Attach => Some(format!("target-attach {}", self.target_index)),
            _ => self.state.command().map(str::to_string),
        }
    }

    pub fn mark_issued(&mut self) {
        self.marked = true;
    }

    /// True while the current state's command has been issued but its reply
    /// hasn't landed yet.
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    /// Await-phase entry: call once the issued command's reply has arrived.
    /// Advances to the next state and clears the mark.
    pub fn advance(&mut self) {
        self.state = self.state.next(self.download_requested);
        self.marked = false;
    }

    /// Force a hard-reset re-entry into the boot chain, e.g. after a
    /// `TPWR` power cycle or an escalated double Ctrl+C.
    pub fn reset_to_init(&mut self) {
        self.state = State::Init;
        self.marked = false;
        self.ctrl_c_presses.clear();
    }

    pub fn is_running_loop(&self) -> bool {
        matches!(self.state, State::Running)
    }

    pub fn is_stopped_loop(&self) -> bool {
        matches!(self.state, State::Stopped)
    }

    pub fn enter_running(&mut self) {
        self.state = State::Running;
        self.marked = false;
    }

    pub fn enter_stopped(&mut self) {
        self.state = State::Stopped;
        self.marked = false;
    }

    /// Record a Ctrl+C press `now`; returns true if this is the second
    /// press within `DOUBLE_CTRL_C_WINDOW`, signalling a hard-reset
    /// escalation rather than a plain interrupt.
    pub fn register_ctrl_c(&mut self, now: Instant) -> bool {
        self.ctrl_c_presses.retain(|t| now.duration_since(*t) <= DOUBLE_CTRL_C_WINDOW);
        self.ctrl_c_presses.push(now);
        self.ctrl_c_presses.len() >= 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_chain_skips_download_when_not_requested() {
        assert_eq!(State::Verify.next(false), State::CheckEntryPoint);
        assert_eq!(State::Verify.next(true), State::Download);
        assert_eq!(State::Download.next(true), State::CheckEntryPoint);
    }

    #[test]
    fn full_chain_reaches_running_via_exec_run() {
        let mut state = State::Init;
        for _ in 0..40 {
            if state == State::Running {
                break;
            }
            state = state.next(false);
        }
        assert_eq!(state, State::Running);
    }

    #[test]
    fn state_machine_does_not_reissue_while_marked() {
        let mut sm = StateMachine::new(false, 1);
        sm.state = State::ScanProbe;
        assert!(sm.command_to_issue().is_some());
        sm.mark_issued();
        assert!(sm.command_to_issue().is_none());
        sm.advance();
        assert_eq!(sm.state(), State::GdbVersion);
    }

    #[test]
    fn attach_command_uses_configured_target_index() {
        let mut sm = StateMachine::new(false, 3);
        sm.state = State::Attach;
        assert_eq!(sm.command_to_issue().as_deref(), Some("target-attach 3"));
    }

    #[test]
    fn second_ctrl_c_within_window_escalates() {
        let mut sm = StateMachine::new(false, 1);
        let t0 = Instant::now();
        assert!(!sm.register_ctrl_c(t0));
        assert!(sm.register_ctrl_c(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn ctrl_c_outside_window_does_not_escalate() {
        let mut sm = StateMachine::new(false, 1);
        let t0 = Instant::now();
        assert!(!sm.register_ctrl_c(t0));
        assert!(!sm.register_ctrl_c(t0 + Duration::from_secs(5)));
    }

    #[test]
    fn reset_to_init_clears_ctrl_c_history() {
        let mut sm = StateMachine::new(false, 1);
        let t0 = Instant::now();
        sm.register_ctrl_c(t0);
        sm.reset_to_init();
        assert!(!sm.register_ctrl_c(t0 + Duration::from_millis(1)));
    }
}
