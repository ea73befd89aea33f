use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::annotation::domain::pipeline_state::{Completion, Outcome, RequestKind, RequestTicket};
use crate::detection::domain::face_detector::FaceDetector;
use crate::matching::domain::face_matcher::FaceMatcher;
use crate::shared::frame::Frame;
use crate::shared::service_error::ServiceError;

/// One service round trip to perform off the session thread.
pub struct ServiceJob {
    pub ticket: RequestTicket,
    pub kind: RequestKind,
    /// Full frame for detection, the face crop for matching.
    pub image: Frame,
}

/// Runs blocking detection/matching calls on a dedicated thread.
///
/// Jobs are handled strictly one at a time in submission order; each
/// produces exactly one [`Completion`] on the completion channel.
pub struct ServiceWorker {
    job_tx: Option<Sender<ServiceJob>>,
    handle: Option<JoinHandle<()>>,
}

impl ServiceWorker {
    pub fn spawn(
        detector: Box<dyn FaceDetector>,
        matcher: Box<dyn FaceMatcher>,
        completion_tx: Sender<Completion>,
    ) -> Self {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<ServiceJob>();
        let handle = std::thread::Builder::new()
            .name("face-service".into())
            .spawn(move || run(detector, matcher, job_rx, completion_tx));

        match handle {
            Ok(handle) => Self {
                job_tx: Some(job_tx),
                handle: Some(handle),
            },
            Err(e) => {
                log::error!("Failed to spawn service worker: {e}");
                Self {
                    job_tx: None,
                    handle: None,
                }
            }
        }
    }

    /// Queues `job`. Fails if the worker thread is gone.
    pub fn submit(&self, job: ServiceJob) -> Result<(), Box<dyn std::error::Error>> {
        let tx = self.job_tx.as_ref().ok_or("Service worker is not running")?;
        tx.send(job)
            .map_err(|_| "Service worker stopped unexpectedly".into())
    }

    /// Closes the job queue and waits for the current call to finish.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.job_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Service worker panicked");
            }
        }
    }
}

impl Drop for ServiceWorker {
    fn drop(&mut self) {
        self.close();
    }
}

fn run(
    detector: Box<dyn FaceDetector>,
    matcher: Box<dyn FaceMatcher>,
    job_rx: Receiver<ServiceJob>,
    completion_tx: Sender<Completion>,
) {
    for job in job_rx {
        let call = panic::catch_unwind(AssertUnwindSafe(|| match job.kind {
            RequestKind::Detect => Outcome::Detected(detector.detect(&job.image)),
            RequestKind::Match { .. } => Outcome::Matched(matcher.identify(&job.image)),
        }));
        let outcome = call.unwrap_or_else(|payload| {
            let reason = panic_message(payload.as_ref());
            log::error!("Service call for request #{} panicked: {reason}", job.ticket.0);
            Outcome::failure(job.kind, ServiceError::Unavailable(reason))
        });
        let completion = Completion {
            ticket: job.ticket,
            outcome,
        };
        if completion_tx.send(completion).is_err() {
            break;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
