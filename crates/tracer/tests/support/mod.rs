#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use tracerec_core_types::HandleId;
use tracerec_event_bus::{Listeners, Subscription};
use tracerec_tracer::{
    ActionListener, ActionMetadata, ActionResult, ActionTarget, BrowserContext, CloseCallback,
    ContextOptions, ContextRef, ElementHandle, Page, PageCallback, PageRef, PageSnapshot,
    Snapshotter, SnapshotterDelegate, SnapshotterFactory, TracerError, VideoCallback,
    VideoStarted,
};

pub struct FakePage {
    handle: HandleId,
    timeout: Option<Duration>,
    video: Listeners<VideoStarted>,
    close: Listeners<()>,
    closed: AtomicBool,
}

impl FakePage {
    pub fn new(timeout: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            handle: HandleId::next(),
            timeout,
            video: Listeners::new(),
            close: Listeners::new(),
            closed: AtomicBool::new(false),
        })
    }

    pub fn start_video(&self, path: impl Into<PathBuf>) {
        self.video.emit(&VideoStarted { path: path.into() });
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.close.emit(&());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.video.len() + self.close.len()
    }
}

impl Page for FakePage {
    fn handle(&self) -> HandleId {
        self.handle
    }

    fn default_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn on_video_started(&self, callback: VideoCallback) -> Subscription {
        self.video.on(move |video| callback(video))
    }

    fn once_close(&self, callback: CloseCallback) -> Subscription {
        self.close.once(move |_| callback())
    }
}

#[derive(Default)]
struct ActionSlots {
    next_id: u64,
    entries: Vec<(u64, Arc<dyn ActionListener>)>,
}

pub struct FakeContext {
    handle: HandleId,
    browser: String,
    options: ContextOptions,
    pages: Listeners<PageRef>,
    actions: Arc<Mutex<ActionSlots>>,
}

impl FakeContext {
    pub fn new(options: ContextOptions) -> Arc<Self> {
        Arc::new(Self {
            handle: HandleId::next(),
            browser: "chromium".to_string(),
            options,
            pages: Listeners::new(),
            actions: Arc::new(Mutex::new(ActionSlots::default())),
        })
    }

    pub fn traced(trace_file: &Path) -> Arc<Self> {
        Self::new(ContextOptions {
            trace_path: Some(trace_file.to_path_buf()),
            viewport: Some(tracerec_trace_log::ViewportSize {
                width: 1280,
                height: 720,
            }),
            ..Default::default()
        })
    }

    pub fn as_context(self: &Arc<Self>) -> ContextRef {
        Arc::clone(self) as ContextRef
    }

    pub fn open_page(&self, timeout: Option<Duration>) -> Arc<FakePage> {
        let page = FakePage::new(timeout);
        let page_ref: PageRef = page.clone();
        self.pages.emit(&page_ref);
        page
    }

    pub async fn complete_action(&self, result: ActionResult, metadata: ActionMetadata) {
        let listeners: Vec<Arc<dyn ActionListener>> = self
            .actions
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener.on_after_action(&result, &metadata).await;
        }
    }

    pub fn page_listener_count(&self) -> usize {
        self.pages.len()
    }

    pub fn action_listener_count(&self) -> usize {
        self.actions.lock().entries.len()
    }
}

impl BrowserContext for FakeContext {
    fn handle(&self) -> HandleId {
        self.handle
    }

    fn browser_name(&self) -> String {
        self.browser.clone()
    }

    fn options(&self) -> ContextOptions {
        self.options.clone()
    }

    fn on_page(&self, callback: PageCallback) -> Subscription {
        self.pages.on(move |page| callback(page))
    }

    fn add_action_listener(&self, listener: Arc<dyn ActionListener>) -> Subscription {
        let id = {
            let mut slots = self.actions.lock();
            slots.next_id += 1;
            let id = slots.next_id;
            slots.entries.push((id, listener));
            id
        };
        let weak: Weak<Mutex<ActionSlots>> = Arc::downgrade(&self.actions);
        Subscription::new(move || {
            if let Some(slots) = weak.upgrade() {
                slots.lock().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }
}

#[derive(Clone, Debug)]
pub enum CaptureMode {
    Returns(Value),
    Hangs,
    Fails,
    Nothing,
}

pub struct FakeSnapshotter {
    mode: CaptureMode,
    calls: Mutex<Vec<(Option<ElementHandle>, Duration)>>,
    disposed: AtomicBool,
}

#[async_trait]
impl Snapshotter for FakeSnapshotter {
    async fn take_snapshot(
        &self,
        _page: &PageRef,
        target: Option<&ElementHandle>,
        timeout: Duration,
    ) -> Result<Option<PageSnapshot>, TracerError> {
        self.calls.lock().push((target.cloned(), timeout));
        match &self.mode {
            CaptureMode::Returns(value) => Ok(Some(value.clone())),
            CaptureMode::Hangs => {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Ok(None)
            }
            CaptureMode::Fails => Err(TracerError::Capture("page crashed".into())),
            CaptureMode::Nothing => Ok(None),
        }
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }
}

pub struct FakeSnapshotterFactory {
    mode: CaptureMode,
    created: Mutex<Vec<(Arc<FakeSnapshotter>, Arc<dyn SnapshotterDelegate>)>>,
    count: AtomicU64,
}

impl FakeSnapshotterFactory {
    pub fn new(mode: CaptureMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            created: Mutex::new(Vec::new()),
            count: AtomicU64::new(0),
        })
    }

    pub fn last(&self) -> (Arc<FakeSnapshotter>, Arc<dyn SnapshotterDelegate>) {
        let created = self.created.lock();
        let (snapshotter, delegate) = created.last().expect("no snapshotter created");
        (Arc::clone(snapshotter), Arc::clone(delegate))
    }

    pub fn created(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}

impl FakeSnapshotter {
    pub fn calls(&self) -> Vec<(Option<ElementHandle>, Duration)> {
        self.calls.lock().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl SnapshotterFactory for FakeSnapshotterFactory {
    fn create(
        &self,
        _context: &ContextRef,
        delegate: Arc<dyn SnapshotterDelegate>,
    ) -> Arc<dyn Snapshotter> {
        let snapshotter = Arc::new(FakeSnapshotter {
            mode: self.mode.clone(),
            calls: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        });
        self.created
            .lock()
            .push((Arc::clone(&snapshotter), delegate));
        self.count.fetch_add(1, Ordering::SeqCst);
        snapshotter
    }
}

pub fn selector_action(page: &Arc<FakePage>, selector: &str) -> ActionMetadata {
    ActionMetadata {
        action_type: "click".to_string(),
        target: Some(ActionTarget::Selector(selector.to_string())),
        value: None,
        page: Arc::clone(page) as PageRef,
        stack: Some("at script.js:12:5".to_string()),
    }
}

pub fn ok_result(logs: &[&str]) -> ActionResult {
    ActionResult {
        start_time: 10.0,
        end_time: 25.0,
        logs: logs.iter().map(|line| line.to_string()).collect(),
        error: None,
    }
}

pub fn read_lines(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

pub fn kinds(lines: &[Value]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line["type"].as_str().unwrap_or_default().to_string())
        .collect()
}
