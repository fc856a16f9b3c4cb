// ─── Progress Reporting ───
// Human-readable status strings emitted at install milestones.

use std::sync::Arc;

use tokio::sync::mpsc;

/// A single milestone message. Consumed immediately, never buffered by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub message: String,
}

/// Destination for progress messages.
///
/// Implementations must tolerate being called from a worker task.
pub trait ProgressSink: Send + Sync {
    fn report(&self, message: &str);
}

/// Any `Fn(&str)` closure is a sink.
impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message)
    }
}

pub type SharedProgress = Arc<dyn ProgressSink>;

/// Writes each message to stdout as it arrives.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn report(&self, message: &str) {
        println!("{message}");
    }
}

/// Forwards messages over a channel to whoever owns the UI thread.
///
/// A dropped receiver is not an error: the install keeps going.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, message: &str) {
        let _ = self.tx.send(ProgressEvent {
            message: message.to_string(),
        });
    }
}

// ── Milestone messages ──────────────────────────────────

pub fn installing_server(loader_version: &str, game_version: Option<&str>) -> String {
    match game_version {
        Some(game) => format!("Installing Fabric server {loader_version}({game})"),
        None => format!("Installing Fabric server {loader_version}"),
    }
}

pub fn extracting_archive(archive: &str) -> String {
    format!("Extracting {archive}")
}

pub fn downloading_libraries() -> String {
    "Downloading libraries".to_string()
}

pub fn downloading_library(name: &str) -> String {
    format!("Downloading library {name}")
}

pub fn generating_launch_jar() -> String {
    "Generating server launch jar".to_string()
}

pub fn downloading_server_jar() -> String {
    "Downloading Minecraft server jar".to_string()
}

pub fn existing_server_jar_valid() -> String {
    "Existing server jar is valid, not downloading".to_string()
}

pub fn staging_cleanup_warning(staging: &str, err: &std::io::Error) -> String {
    format!("Warning: could not delete staging file {staging}: {err}")
}

pub fn done() -> String {
    "Done".to_string()
}

pub fn done_start_server(launch_jar: &str) -> String {
    format!("Done, start server by running {launch_jar}")
}

pub fn failed(err: &dyn std::fmt::Display) -> String {
    format!("Installation failed: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn closure_acts_as_sink() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |msg: &str| seen.lock().unwrap().push(msg.to_string())
        };

        sink.report("Extracting bundle-0.14.9.zip");

        assert_eq!(
            seen.lock().unwrap().as_slice(),
            ["Extracting bundle-0.14.9.zip".to_string()]
        );
    }

    #[tokio::test]
    async fn channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelProgress::new();
        sink.report("one");
        sink.report("two");
        drop(sink);

        assert_eq!(rx.recv().await.unwrap().message, "one");
        assert_eq!(rx.recv().await.unwrap().message, "two");
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelProgress::new();
        drop(rx);
        sink.report("still fine");
    }

    #[test]
    fn final_message_names_launch_jar() {
        assert_eq!(
            done_start_server("fabric-server-launch.jar"),
            "Done, start server by running fabric-server-launch.jar"
        );
    }
}
