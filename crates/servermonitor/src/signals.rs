//! Shutdown signals that stop the `watch` loop

use std::fmt;
use tokio::signal;

/// What asked the console to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Interrupt => f.write_str("interrupt (Ctrl+C)"),
            ShutdownReason::Terminate => f.write_str("terminate"),
        }
    }
}

/// Resolves with the first SIGINT or SIGTERM; Ctrl+C only on Windows
pub async fn wait_for_shutdown() -> anyhow::Result<ShutdownReason> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        let reason = tokio::select! {
            _ = interrupt.recv() => ShutdownReason::Interrupt,
            _ = terminate.recv() => ShutdownReason::Terminate,
        };
        Ok(reason)
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        Ok(ShutdownReason::Interrupt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_display() {
        assert_eq!(ShutdownReason::Interrupt.to_string(), "interrupt (Ctrl+C)");
        assert_eq!(ShutdownReason::Terminate.to_string(), "terminate");
    }
}
