// Process-supervisor notifications (systemd notify protocol).

use sd_notify::NotifyState;

/// Receives readiness and liveness signals. Missing liveness is the supervisor's only
/// indication that the daemon is unhealthy.
pub trait Supervisor: Send + Sync {
    /// Sent once, after startup completes.
    fn ready(&self) -> std::io::Result<()>;
    /// Sent after every successful health probe.
    fn alive(&self) -> std::io::Result<()>;
}

/// Talks to systemd through `$NOTIFY_SOCKET`; a no-op when the variable is unset.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemdSupervisor;

impl Supervisor for SystemdSupervisor {
    fn ready(&self) -> std::io::Result<()> {
        sd_notify::notify(false, &[NotifyState::Ready])
    }

    fn alive(&self) -> std::io::Result<()> {
        sd_notify::notify(false, &[NotifyState::Watchdog])
    }
}
