//! Scripted in-memory browser backend

use async_trait::async_trait;
use lab_analysis::collector::BUFFER_NAME;
use lab_analysis::config::DeviceProfile;
use lab_analysis::session::{BrowserSession, SessionLauncher};
use lab_analysis::SessionError;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// How `goto` behaves for a URL
#[derive(Debug, Clone)]
pub enum PageScript {
    /// Loads and reports these long-task durations
    Tasks(Vec<f64>),
    /// Load fails with a protocol error
    Fail,
    /// Load never completes
    Hang,
    /// Loads, but the buffer holds something that is not an array
    Garbage,
}

/// Operations a session should fail
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub instrumentation: bool,
    pub lookups: bool,
    pub typing: bool,
    pub scrolls: bool,
    pub close: bool,
}

#[derive(Debug, Default)]
pub struct Counters {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub live: AtomicUsize,
    pub max_live: AtomicUsize,
}

impl Counters {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
pub struct FakeLauncher {
    pages: Arc<HashMap<String, PageScript>>,
    pub counters: Arc<Counters>,
    /// Event log per session, indexed by acquisition order
    pub events: Arc<Mutex<Vec<Arc<Mutex<Vec<String>>>>>>,
    fail_acquire: bool,
    faults: Faults,
    /// Element ids whose click fails
    broken_clicks: Arc<HashSet<usize>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, script: PageScript) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.to_string(), script);
        self
    }

    pub fn failing_acquire(mut self) -> Self {
        self.fail_acquire = true;
        self
    }

    pub fn failing_instrumentation(mut self) -> Self {
        self.faults.instrumentation = true;
        self
    }

    pub fn failing_lookups(mut self) -> Self {
        self.faults.lookups = true;
        self
    }

    pub fn failing_typing(mut self) -> Self {
        self.faults.typing = true;
        self
    }

    pub fn failing_scrolls(mut self) -> Self {
        self.faults.scrolls = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.faults.close = true;
        self
    }

    pub fn broken_click(mut self, id: usize) -> Self {
        Arc::make_mut(&mut self.broken_clicks).insert(id);
        self
    }

    pub fn session_events(&self, index: usize) -> Vec<String> {
        let sessions = self.events.lock().unwrap();
        let events = sessions[index].lock().unwrap().clone();
        events
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    type Session = FakeSession;

    async fn acquire(&self, _profile: &DeviceProfile) -> Result<FakeSession, SessionError> {
        if self.fail_acquire {
            return Err(SessionError::Launch("no browser available".into()));
        }

        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_live.fetch_max(live, Ordering::SeqCst);

        let events = Arc::new(Mutex::new(Vec::new()));
        self.events.lock().unwrap().push(events.clone());

        Ok(FakeSession {
            pages: self.pages.clone(),
            counters: self.counters.clone(),
            events,
            current: Mutex::new(None),
            armed: Mutex::new(false),
            faults: self.faults,
            broken_clicks: self.broken_clicks.clone(),
        })
    }
}

pub struct FakeSession {
    pages: Arc<HashMap<String, PageScript>>,
    counters: Arc<Counters>,
    events: Arc<Mutex<Vec<String>>>,
    current: Mutex<Option<String>>,
    armed: Mutex<bool>,
    faults: Faults,
    broken_clicks: Arc<HashSet<usize>>,
}

impl FakeSession {
    fn log(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    fn current_script(&self) -> Option<PageScript> {
        let current = self.current.lock().unwrap().clone()?;
        self.pages.get(&current).cloned()
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Element = usize;

    async fn add_init_script(&self, source: &str) -> Result<(), SessionError> {
        if self.faults.instrumentation {
            return Err(SessionError::Protocol("Page.addScriptToEvaluateOnNewDocument failed".into()));
        }
        assert!(source.contains(BUFFER_NAME));
        *self.armed.lock().unwrap() = true;
        self.log("arm");
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<(), SessionError> {
        self.log(format!("goto {}", url));
        match self.pages.get(url) {
            Some(PageScript::Fail) | None => {
                Err(SessionError::Protocol(format!("net::ERR_NAME_NOT_RESOLVED at {}", url)))
            }
            Some(PageScript::Hang) => std::future::pending().await,
            Some(_) => {
                *self.current.lock().unwrap() = Some(url.to_string());
                Ok(())
            }
        }
    }

    async fn visible_elements(&self, selector: &str) -> Result<Vec<usize>, SessionError> {
        if self.faults.lookups {
            return Err(SessionError::Protocol("DOM.querySelectorAll failed".into()));
        }
        if selector.contains("button") {
            Ok(vec![0, 1])
        } else {
            Ok(vec![10])
        }
    }

    async fn click(&self, element: &usize) -> Result<(), SessionError> {
        self.log("click");
        if self.broken_clicks.contains(element) {
            return Err(SessionError::Protocol("element is detached".into()));
        }
        Ok(())
    }

    async fn type_text(&self, _element: &usize, text: &str) -> Result<(), SessionError> {
        self.log(format!("type {}", text));
        if self.faults.typing {
            return Err(SessionError::Protocol("element is not focusable".into()));
        }
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, SessionError> {
        if !expression.contains(BUFFER_NAME) {
            self.log("scroll");
            if self.faults.scrolls {
                return Err(SessionError::Evaluation("Execution context was destroyed".into()));
            }
            return Ok(Value::Bool(true));
        }

        self.log("extract");
        if !*self.armed.lock().unwrap() {
            return Ok(Value::Null);
        }
        match self.current_script() {
            Some(PageScript::Tasks(durations)) => Ok(json!(durations)),
            Some(PageScript::Garbage) => Ok(json!("not-a-list")),
            _ => Ok(Value::Null),
        }
    }

    async fn close(self) -> Result<(), SessionError> {
        self.log("close");
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
        if self.faults.close {
            return Err(SessionError::Teardown("browser process already gone".into()));
        }
        Ok(())
    }
}
