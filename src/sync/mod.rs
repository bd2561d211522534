//! Catalog and stage download orchestration
//!
//! Each content type runs a small state machine:
//!
//! ```text
//! Idle -> CatalogDownloading -> CatalogReady -> StageDownloading -> StageReady
//!   \__________________\______________\______________\______________> Failed
//! ```
//!
//! Downloads run as spawned tokio tasks. A task never touches content state;
//! it reports its result over a channel tagged with a ticket. The coordinator
//! drains the channel and asks [`ContentSyncOrchestrator::accept`] whether the
//! result is still current before applying it. Forgetting a type aborts its
//! tasks and invalidates any result already queued.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::AbortHandle;

use crate::ContentType;
use crate::error::{LevelError, Result};
use crate::store::Downloader;

/// Sync progress of one content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    CatalogDownloading,
    CatalogReady,
    StageDownloading,
    StageReady,
    /// Last attempt failed; only an explicit update check retries
    Failed(String),
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Idle => "idle",
            SyncPhase::CatalogDownloading => "catalog-downloading",
            SyncPhase::CatalogReady => "catalog-ready",
            SyncPhase::StageDownloading => "stage-downloading",
            SyncPhase::StageReady => "stage-ready",
            SyncPhase::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncPhase::Failed(reason) => write!(f, "failed: {}", reason),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// What a download fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadKind {
    Catalog,
    Stage,
}

/// One download to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    /// Local store path the downloader writes to
    pub dest: String,
    /// Level the download was requested for
    pub level: u32,
}

/// Completion report sent by a download task
#[derive(Debug)]
pub struct SyncEvent {
    pub content_type: ContentType,
    pub kind: DownloadKind,
    ticket: u64,
    pub result: Result<()>,
}

/// Sends the task's result when dropped, so a panicking or aborted download
/// still frees its slot
struct Report {
    tx: UnboundedSender<SyncEvent>,
    content_type: ContentType,
    kind: DownloadKind,
    ticket: u64,
    result: Option<Result<()>>,
}

impl Drop for Report {
    fn drop(&mut self) {
        let result = self
            .result
            .take()
            .unwrap_or_else(|| Err(LevelError::DownloadFailed("download task did not finish".to_string())));
        let _ = self.tx.send(SyncEvent {
            content_type: self.content_type,
            kind: self.kind,
            ticket: self.ticket,
            result,
        });
    }
}

struct InFlight {
    ticket: u64,
    request: DownloadRequest,
    handle: AbortHandle,
}

struct SyncSlot {
    phase: SyncPhase,
    catalog: Option<InFlight>,
    stage: Option<InFlight>,
}

impl SyncSlot {
    fn new() -> Self {
        Self {
            phase: SyncPhase::Idle,
            catalog: None,
            stage: None,
        }
    }

    fn in_flight(&mut self, kind: DownloadKind) -> &mut Option<InFlight> {
        match kind {
            DownloadKind::Catalog => &mut self.catalog,
            DownloadKind::Stage => &mut self.stage,
        }
    }

    fn abort_all(&mut self) {
        for in_flight in [self.catalog.take(), self.stage.take()].into_iter().flatten() {
            in_flight.handle.abort();
        }
    }
}

/// Runs at most one catalog and one stage download per content type
pub struct ContentSyncOrchestrator {
    downloader: Arc<dyn Downloader>,
    slots: HashMap<ContentType, SyncSlot>,
    next_ticket: u64,
    tx: UnboundedSender<SyncEvent>,
    rx: UnboundedReceiver<SyncEvent>,
}

impl ContentSyncOrchestrator {
    pub fn new(downloader: Arc<dyn Downloader>) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            downloader,
            slots: HashMap::new(),
            next_ticket: 1,
            tx,
            rx,
        }
    }

    /// Start tracking a content type
    pub fn track(&mut self, content_type: ContentType) {
        self.slots.entry(content_type).or_insert_with(SyncSlot::new);
    }

    /// Stop tracking a content type, aborting its downloads
    pub fn forget(&mut self, content_type: ContentType) {
        if let Some(mut slot) = self.slots.remove(&content_type) {
            slot.abort_all();
        }
    }

    /// Abort one download; its result, if already queued, becomes stale
    pub fn cancel(&mut self, content_type: ContentType, kind: DownloadKind) {
        if let Some(in_flight) = self
            .slots
            .get_mut(&content_type)
            .and_then(|slot| slot.in_flight(kind).take())
        {
            tracing::debug!("[{}] cancelled {:?} download", content_type.tag(), kind);
            in_flight.handle.abort();
        }
    }

    pub fn phase(&self, content_type: ContentType) -> Option<&SyncPhase> {
        self.slots.get(&content_type).map(|slot| &slot.phase)
    }

    pub fn set_phase(&mut self, content_type: ContentType, phase: SyncPhase) {
        if let Some(slot) = self.slots.get_mut(&content_type) {
            tracing::debug!("[{}] sync {} -> {}", content_type.tag(), slot.phase, phase);
            slot.phase = phase;
        }
    }

    pub fn fail(&mut self, content_type: ContentType, reason: impl Into<String>) {
        self.set_phase(content_type, SyncPhase::Failed(reason.into()));
    }

    pub fn is_in_flight(&self, content_type: ContentType, kind: DownloadKind) -> bool {
        self.slots.get(&content_type).is_some_and(|slot| match kind {
            DownloadKind::Catalog => slot.catalog.is_some(),
            DownloadKind::Stage => slot.stage.is_some(),
        })
    }

    /// Any download of this type in flight
    pub fn is_busy(&self, content_type: ContentType) -> bool {
        self.is_in_flight(content_type, DownloadKind::Catalog)
            || self.is_in_flight(content_type, DownloadKind::Stage)
    }

    pub fn any_in_flight(&self) -> bool {
        self.slots
            .values()
            .any(|slot| slot.catalog.is_some() || slot.stage.is_some())
    }

    /// Spawn a download unless one of the same kind is already running.
    ///
    /// Returns whether a task was started. Must be called from within a
    /// tokio runtime.
    pub fn start(&mut self, content_type: ContentType, kind: DownloadKind, request: DownloadRequest) -> bool {
        let ticket = self.next_ticket;
        let Some(slot) = self.slots.get_mut(&content_type) else {
            tracing::warn!("[{}] cannot start {:?} download: type not tracked", content_type.tag(), kind);
            return false;
        };
        if slot.in_flight(kind).is_some() {
            tracing::debug!("[{}] {:?} download already in flight", content_type.tag(), kind);
            return false;
        }
        self.next_ticket += 1;

        tracing::info!(
            "[{}] downloading {:?} from {} to {}",
            content_type.tag(),
            kind,
            request.url,
            request.dest
        );

        let downloader = Arc::clone(&self.downloader);
        let url = request.url.clone();
        let dest = request.dest.clone();
        let mut report = Report {
            tx: self.tx.clone(),
            content_type,
            kind,
            ticket,
            result: None,
        };
        let task = tokio::spawn(async move {
            report.result = Some(downloader.download(&url, &dest).await);
        });

        *slot.in_flight(kind) = Some(InFlight {
            ticket,
            request,
            handle: task.abort_handle(),
        });
        slot.phase = match kind {
            DownloadKind::Catalog => SyncPhase::CatalogDownloading,
            DownloadKind::Stage => SyncPhase::StageDownloading,
        };
        true
    }

    /// Next completed download, if one is already queued
    pub fn try_next(&mut self) -> Option<SyncEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next completed download; `None` when nothing is pending
    pub async fn next(&mut self) -> Option<SyncEvent> {
        if !self.any_in_flight() {
            return self.try_next();
        }
        self.rx.recv().await
    }

    /// Claim a completed download if it is still the current one for its type.
    ///
    /// Clears the in-flight marker and hands back the request it was started with. Stale
    /// results (type forgotten, or superseded) yield `None`.
    pub fn accept(&mut self, event: &SyncEvent) -> Option<DownloadRequest> {
        let slot = self.slots.get_mut(&event.content_type)?;
        let current = slot.in_flight(event.kind);
        if current.as_ref().map(|f| f.ticket) != Some(event.ticket) {
            return None;
        }
        current.take().map(|f| f.request)
    }
}

impl Drop for ContentSyncOrchestrator {
    fn drop(&mut self) {
        for slot in self.slots.values_mut() {
            slot.abort_all();
        }
    }
}
