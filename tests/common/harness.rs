use loop_timers::{BackendKind, EventLoopConfig, FireContext, TimerConfig};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "loop_timers=debug,event_loop=info".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// A config using the given backend and an optional tick limit.
pub fn config(backend: BackendKind, max_ticks: Option<u64>) -> TimerConfig {
    TimerConfig {
        backend,
        event_loop: EventLoopConfig { max_ticks },
        ..TimerConfig::default()
    }
}

/// Shared log of fired callbacks, in firing order.
#[derive(Clone, Default)]
pub struct FireLog(Rc<RefCell<Vec<String>>>);

impl FireLog {
    pub fn push(&self, label: impl Into<String>) {
        self.0.borrow_mut().push(label.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// A callback that appends `label` each time it fires.
    pub fn recorder(
        &self,
        label: &'static str,
    ) -> impl FnMut(&FireContext<'_>) -> loop_timers::timer::CallbackResult + 'static {
        let log = self.clone();
        move |_: &FireContext<'_>| {
            log.push(label);
            Ok(())
        }
    }
}
