//! Shared utilities for integration testing.

use std::fmt;
use std::io;
use std::net::TcpListener as StdTcpListener;
use std::sync::{Arc, Mutex};

use minimal_server::{ServeError, Transport};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// A port that was free a moment ago.
#[allow(dead_code)]
pub fn free_port() -> u16 {
    let listener = StdTcpListener::bind("0.0.0.0:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Whether something is listening on `0.0.0.0:port` right now.
#[allow(dead_code)]
pub fn port_in_use(port: u16) -> bool {
    StdTcpListener::bind(("0.0.0.0", port)).is_err()
}

/// Log events emitted by the library, captured by level.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    events: Arc<Mutex<Vec<(Level, String)>>>,
}

#[allow(dead_code)]
impl CapturedLogs {
    /// Capture events on the current thread until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::set_default(subscriber)
    }

    pub fn at(&self, level: Level) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn containing(&self, needle: &str) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, m)| m.contains(needle))
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !event.metadata().target().starts_with("minimal_server") {
            return;
        }
        let mut line = EventLine::default();
        event.record(&mut line);
        self.events
            .lock()
            .unwrap()
            .push((*event.metadata().level(), line.0));
    }
}

#[derive(Default)]
struct EventLine(String);

impl Visit for EventLine {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0.insert_str(0, &format!("{value:?}"));
        } else {
            self.0.push_str(&format!(" {}={:?}", field.name(), value));
        }
    }
}

/// What happened to a [`ScriptedTransport`], in order.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events.lock().unwrap().iter().filter(|e| *e == event).count()
    }
}

/// How the scripted serve loop behaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Script {
    /// Serve until stopped, drain promptly.
    #[default]
    WellBehaved,
    /// Graceful stop never drains; only a forced stop ends serving.
    StuckDrain,
    /// Serve fails right away with a transport error.
    FailImmediately,
    /// Serve keeps going until stopped, then reports an error.
    FailOnStop,
    /// Serve keeps going until stopped, then panics.
    PanicOnStop,
    /// Graceful stop never drains; a forced stop ends serving with an error.
    FailAfterForce,
}

impl Script {
    /// Stop level (1 draining, 2 halted) that ends the serve loop.
    fn ends_at(self) -> u8 {
        match self {
            Script::StuckDrain | Script::FailAfterForce => 2,
            _ => 1,
        }
    }
}

/// Builder for the test double; registrations configure it.
#[derive(Default)]
pub struct ScriptBuilder {
    pub script: Script,
    pub recorder: Recorder,
}

/// Transport double driven entirely by its [`Script`].
pub struct ScriptedTransport {
    script: Script,
    recorder: Recorder,
    // 0 running, 1 draining, 2 halted
    stop: watch::Sender<u8>,
}

impl Transport for ScriptedTransport {
    type Builder = ScriptBuilder;

    fn builder() -> ScriptBuilder {
        ScriptBuilder::default()
    }

    fn from_builder(builder: ScriptBuilder) -> Self {
        let (stop, _) = watch::channel(0);
        Self {
            script: builder.script,
            recorder: builder.recorder,
            stop,
        }
    }

    async fn serve(&self, listener: TcpListener) -> Result<(), ServeError> {
        self.recorder.record("serve");
        if self.script == Script::FailImmediately {
            drop(listener);
            self.recorder.record("serve_exit");
            return Err(ServeError::Accept(io::Error::other("listener closed externally")));
        }

        let needed = self.script.ends_at();
        let mut stop = self.stop.subscribe();
        let _ = stop.wait_for(|state| *state >= needed).await;
        drop(listener);
        self.recorder.record("serve_exit");

        match self.script {
            Script::FailOnStop | Script::FailAfterForce => {
                Err(ServeError::Accept(io::Error::other("transport broke")))
            }
            Script::PanicOnStop => panic!("serve loop blew up"),
            _ => Ok(()),
        }
    }

    async fn graceful_stop(&self) {
        self.recorder.record("graceful_stop");
        self.stop.send_if_modified(|state| {
            if *state == 0 {
                *state = 1;
                true
            } else {
                false
            }
        });
        let needed = self.script.ends_at();
        let mut stop = self.stop.subscribe();
        let _ = stop.wait_for(|state| *state >= needed).await;
    }

    fn force_stop(&self) {
        self.recorder.record("force_stop");
        self.stop.send_replace(2);
    }
}
