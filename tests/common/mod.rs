#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bmsview::{
    AdapterEvent, BackendError, BleBackend, LinkParams, Notification, Notifier, Peripheral, PeripheralId,
    PromptResponse,
};
use futures_util::stream;
use futures_util::stream::LocalBoxStream;
use futures_util::StreamExt;
use tokio::time::Duration;
use uuid::Uuid;

/// One scan report, delivered `after` the previous one
pub struct Report {
    pub after: Duration,
    pub result: Result<Peripheral, String>,
}

pub fn found(after_ms: u64, id: &str) -> Report {
    Report { after: Duration::from_millis(after_ms), result: Ok(Peripheral::new(id)) }
}

pub fn failure(after_ms: u64, message: &str) -> Report {
    Report { after: Duration::from_millis(after_ms), result: Err(message.to_string()) }
}

/// Sets the flag when dropped along with the scan stream
struct StopGuard(Rc<Cell<bool>>);

impl Drop for StopGuard {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

#[derive(Default)]
pub struct MockBackend {
    pub reports: Vec<Report>,
    /// Keep the scan stream open after the last report
    pub keep_open: bool,
    pub fail_start: bool,
    pub adapter_events: Vec<AdapterEvent>,
    /// Peripheral ids that accept a connection; all others are rejected
    pub accepting: Vec<&'static str>,

    pub scans_started: Cell<usize>,
    pub scan_stopped: Rc<Cell<bool>>,
    pub scan_filters: RefCell<Vec<Vec<Uuid>>>,
    pub connects: RefCell<Vec<(PeripheralId, LinkParams)>>,
    pub disconnects: RefCell<Vec<String>>,
    pub enables: Cell<usize>,
}

impl MockBackend {
    pub fn with_reports(reports: Vec<Report>) -> Self {
        Self { reports, ..Self::default() }
    }
}

impl BleBackend for MockBackend {
    type Handle = String;

    async fn adapter_events(&self) -> Result<LocalBoxStream<'_, AdapterEvent>, BackendError> {
        Ok(stream::iter(self.adapter_events.clone()).boxed_local())
    }

    async fn start_scan<'a>(
        &'a self,
        services: &'a [Uuid],
    ) -> Result<LocalBoxStream<'a, Result<Peripheral, BackendError>>, BackendError> {
        if self.fail_start {
            return Err(BackendError::Other("adapter is off".to_string()));
        }
        self.scans_started.set(self.scans_started.get() + 1);
        self.scan_filters.borrow_mut().push(services.to_vec());
        self.scan_stopped.set(false);

        let guard = StopGuard(self.scan_stopped.clone());
        let reports = stream::iter(self.reports.iter()).then(|report| async move {
            tokio::time::sleep(report.after).await;
            report.result.clone().map_err(BackendError::Other)
        });
        let tail: LocalBoxStream<'a, Result<Peripheral, BackendError>> = if self.keep_open {
            stream::pending().boxed_local()
        } else {
            stream::empty().boxed_local()
        };

        Ok(reports
            .chain(tail)
            .map(move |report| {
                let _ = &guard;
                report
            })
            .boxed_local())
    }

    async fn connect(&self, id: &PeripheralId, params: &LinkParams) -> Result<String, BackendError> {
        self.connects.borrow_mut().push((id.clone(), *params));
        if self.accepting.contains(&id.as_str()) {
            Ok(format!("handle-{id}"))
        } else {
            Err(BackendError::Other("rejected".to_string()))
        }
    }

    async fn disconnect(&self, handle: &String) -> Result<(), BackendError> {
        self.disconnects.borrow_mut().push(handle.clone());
        Ok(())
    }

    async fn enable(&self) -> Result<(), BackendError> {
        self.enables.set(self.enables.get() + 1);
        Err(BackendError::Unsupported("powering on the adapter"))
    }
}

pub struct RecordingNotifier {
    pub notifications: RefCell<Vec<Notification>>,
    pub prompts: Cell<usize>,
    pub response: PromptResponse,
}

impl RecordingNotifier {
    pub fn new(response: PromptResponse) -> Self {
        Self { notifications: RefCell::new(Vec::new()), prompts: Cell::new(0), response }
    }

    pub fn count(&self, predicate: impl Fn(&Notification) -> bool) -> usize {
        self.notifications.borrow().iter().filter(|n| predicate(n)).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.borrow_mut().push(notification);
    }

    fn prompt_enable_adapter(&self) -> PromptResponse {
        self.prompts.set(self.prompts.get() + 1);
        self.response
    }
}
