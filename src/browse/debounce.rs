/// Trailing-edge debounce of search input
///
/// Every keystroke-level change goes through `on_input`. A search command is
/// emitted with the latest text once the input has been quiet for the
/// configured interval. Clearing the input emits a reset immediately.
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Quiet interval used when none is configured
pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(300);

/// What the debouncer asks the browsing layer to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryCommand {
    /// Run a search for the settled query
    Search(String),
    /// Input was cleared: go back to browse mode
    ResetToBrowse,
}

/// Owns the single pending timer; dropping it cancels the timer.
#[derive(Debug)]
pub struct QueryDebouncer {
    interval: Duration,
    commands: mpsc::UnboundedSender<QueryCommand>,
    pending: Option<JoinHandle<()>>,
}

impl QueryDebouncer {
    /// Create a debouncer and the receiving end of its command stream
    pub fn new(interval: Duration) -> (Self, mpsc::UnboundedReceiver<QueryCommand>) {
        let (commands, receiver) = mpsc::unbounded_channel();
        let debouncer = Self {
            interval,
            commands,
            pending: None,
        };
        (debouncer, receiver)
    }

    /// Feed the current input text.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_input(&mut self, text: &str) {
        self.cancel();

        if text.is_empty() {
            tracing::debug!("Search input cleared, resetting to browse");
            let _ = self.commands.send(QueryCommand::ResetToBrowse);
            return;
        }

        let commands = self.commands.clone();
        let deadline = Instant::now() + self.interval;
        let text = text.to_string();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let command = if text.trim().is_empty() {
                QueryCommand::ResetToBrowse
            } else {
                QueryCommand::Search(text)
            };
            let _ = commands.send(command);
        }));
    }

    /// A timer is armed and has not fired yet
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Discard the pending timer, if any. Its command is never delivered.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Cancel the timer and drop any command it already delivered to `commands`.
    ///
    /// Used when another action takes over the result list.
    pub fn discard(&mut self, commands: &mut mpsc::UnboundedReceiver<QueryCommand>) {
        self.cancel();
        let mut dropped = 0;
        while commands.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::debug!(dropped, "Discarded delivered search commands");
        }
    }
}

impl Drop for QueryDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::time::{advance, sleep};

    const QUIET: Duration = DEFAULT_QUIET_INTERVAL;

    #[tokio::test(start_paused = true)]
    async fn test_only_last_input_fires_once() {
        let (mut debouncer, mut rx) = QueryDebouncer::new(QUIET);

        for text in ["a", "al", "ali", "alie", "alien"] {
            debouncer.on_input(text);
            sleep(Duration::from_millis(100)).await;
        }

        assert_eq!(rx.recv().await, Some(QueryCommand::Search("alien".to_string())));

        sleep(Duration::from_secs(5)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_interval_from_last_input() {
        let (mut debouncer, mut rx) = QueryDebouncer::new(QUIET);
        let start = Instant::now();

        debouncer.on_input("heat");
        advance(Duration::from_millis(250)).await;
        debouncer.on_input("heat 1995");

        assert_eq!(
            rx.recv().await,
            Some(QueryCommand::Search("heat 1995".to_string()))
        );
        assert!(start.elapsed() >= Duration::from_millis(550));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_leading_edge() {
        let (mut debouncer, mut rx) = QueryDebouncer::new(QUIET);

        debouncer.on_input("x");
        tokio::task::yield_now().await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        assert!(debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_input_resets_immediately() {
        let (mut debouncer, mut rx) = QueryDebouncer::new(QUIET);

        debouncer.on_input("dune");
        debouncer.on_input("");

        assert_eq!(rx.try_recv(), Ok(QueryCommand::ResetToBrowse));
        assert!(!debouncer.is_pending());

        // The earlier "dune" timer was discarded
        sleep(Duration::from_secs(1)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_whitespace_settles_to_browse() {
        let (mut debouncer, mut rx) = QueryDebouncer::new(QUIET);

        debouncer.on_input("   ");
        assert_eq!(rx.recv().await, Some(QueryCommand::ResetToBrowse));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending() {
        let (mut debouncer, mut rx) = QueryDebouncer::new(QUIET);

        debouncer.on_input("brazil");
        debouncer.cancel();

        sleep(Duration::from_secs(1)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_drops_already_delivered_command() {
        let (mut debouncer, mut rx) = QueryDebouncer::new(QUIET);

        debouncer.on_input("alien");
        sleep(QUIET + Duration::from_millis(10)).await;
        // The timer fired but nobody has read the command yet
        assert!(!debouncer.is_pending());

        debouncer.on_input("aliens");
        debouncer.discard(&mut rx);

        sleep(Duration::from_secs(1)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        let (mut debouncer, mut rx) = QueryDebouncer::new(QUIET);

        debouncer.on_input("vertigo");
        drop(debouncer);

        // All senders are gone and nothing was delivered
        assert_eq!(rx.recv().await, None);
    }
}
