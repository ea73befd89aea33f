use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{select, Receiver, Sender};

use crate::annotation::domain::annotation_controller::AnnotationController;
use crate::annotation::domain::annotation_state::AnnotationState;
use crate::annotation::domain::pipeline_state::{
    Completion, Outcome, PendingRequest, RequestKind,
};
use crate::annotation::infrastructure::service_worker::{ServiceJob, ServiceWorker};
use crate::detection::domain::face_detector::FaceDetector;
use crate::matching::domain::face_matcher::FaceMatcher;
use crate::rendering::domain::frame_presenter::FramePresenter;
use crate::rendering::domain::overlay_renderer::OverlayRenderer;
use crate::rendering::infrastructure::raster_surface::RasterSurface;
use crate::shared::frame::Frame;
use crate::shared::service_error::ServiceError;
use crate::video::domain::frame_source::FrameSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Control {
    Start,
    Stop,
    Shutdown,
}

/// Everything a session needs, moved onto the session thread.
pub struct SessionParts {
    pub source: Box<dyn FrameSource>,
    pub detector: Box<dyn FaceDetector>,
    pub matcher: Box<dyn FaceMatcher>,
    pub renderer: OverlayRenderer,
    pub surface: RasterSurface,
    pub presenter: Box<dyn FramePresenter>,
    pub render_interval: Duration,
}

/// Counters reported when a session shuts down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_rendered: usize,
    pub detections: usize,
    pub matches: usize,
    pub failures: usize,
    /// Most boxes held at once.
    pub peak_boxes: usize,
    /// Identities attached over the whole session.
    pub identified: usize,
}

/// Control surface for a running [`OverlaySession`].
pub struct SessionHandle {
    control_tx: Sender<Control>,
    handle: JoinHandle<SessionStats>,
}

impl SessionHandle {
    /// Begins annotating. No-op while already active.
    pub fn start(&self) {
        self.send(Control::Start);
    }

    /// Stops annotating and clears all boxes. Rendering continues.
    pub fn stop(&self) {
        self.send(Control::Stop);
    }

    /// Ends the session and returns its counters.
    pub fn shutdown(self) -> Result<SessionStats, Box<dyn std::error::Error>> {
        self.send(Control::Shutdown);
        self.handle
            .join()
            .map_err(|_| "Session thread panicked".into())
    }

    fn send(&self, control: Control) {
        if self.control_tx.send(control).is_err() {
            log::warn!("Session already ended, ignoring {control:?}");
        }
    }
}

/// The live overlay: renders at a steady cadence while the annotation
/// controller cycles through detection and matching in the background.
///
/// One thread owns the annotation state, the controller and the surface, so
/// rendering and completions never race. Service calls run on a separate
/// [`ServiceWorker`] and come back as [`Completion`]s.
pub struct OverlaySession {
    source: Box<dyn FrameSource>,
    renderer: OverlayRenderer,
    surface: RasterSurface,
    presenter: Box<dyn FramePresenter>,
    controller: AnnotationController,
    state: AnnotationState,
    worker: ServiceWorker,
    stats: SessionStats,
}

impl OverlaySession {
    pub fn spawn(parts: SessionParts) -> Result<SessionHandle, Box<dyn std::error::Error>> {
        let (control_tx, control_rx) = crossbeam_channel::unbounded::<Control>();
        let render_interval = parts.render_interval.max(Duration::from_millis(1));

        let handle = std::thread::Builder::new()
            .name("overlay-session".into())
            .spawn(move || {
                let (completion_tx, completion_rx) = crossbeam_channel::unbounded();
                let session = OverlaySession {
                    source: parts.source,
                    renderer: parts.renderer,
                    surface: parts.surface,
                    presenter: parts.presenter,
                    controller: AnnotationController::new(),
                    state: AnnotationState::new(),
                    worker: ServiceWorker::spawn(parts.detector, parts.matcher, completion_tx),
                    stats: SessionStats::default(),
                };
                session.run(control_rx, completion_rx, render_interval)
            })?;

        Ok(SessionHandle { control_tx, handle })
    }

    fn run(
        mut self,
        control_rx: Receiver<Control>,
        completion_rx: Receiver<Completion>,
        render_interval: Duration,
    ) -> SessionStats {
        let ticker = crossbeam_channel::tick(render_interval);
        let never = crossbeam_channel::never::<Completion>();
        let mut worker_alive = true;
        log::info!("Overlay session running, rendering every {render_interval:?}");

        loop {
            let completions = if worker_alive { &completion_rx } else { &never };
            select! {
                recv(control_rx) -> msg => match msg {
                    Ok(Control::Start) => {
                        self.controller.start(&mut self.state);
                        self.dispatch();
                    }
                    Ok(Control::Stop) => self.controller.stop(&mut self.state),
                    Ok(Control::Shutdown) | Err(_) => break,
                },
                recv(completions) -> msg => match msg {
                    Ok(completion) => {
                        self.apply(completion);
                        self.dispatch();
                    }
                    Err(_) => {
                        log::error!("Service worker ended; continuing without annotations");
                        worker_alive = false;
                        self.fail_in_flight("service worker ended");
                    }
                },
                recv(ticker) -> _ => {
                    self.render_tick();
                    self.dispatch();
                },
            }
        }

        self.controller.stop(&mut self.state);
        let stats = self.stats;
        self.worker.shutdown();
        log::info!(
            "Overlay session ended: {} frames, {} detections, {} matches, {} failures",
            stats.frames_rendered,
            stats.detections,
            stats.matches,
            stats.failures
        );
        stats
    }

    /// Issues the controller's next request, if it has one.
    ///
    /// When the image cannot be taken or the worker is gone, the request is
    /// completed on the spot as failed and left for the next tick to retry.
    fn dispatch(&mut self) {
        let Some(PendingRequest { ticket, kind }) = self.controller.poll(&self.state) else {
            return;
        };

        let image = match kind {
            RequestKind::Detect => self.source.current_frame(),
            RequestKind::Match { crop, .. } => self.source.current_region(crop),
        };

        let failure = match image {
            Ok(image) => match self.worker.submit(ServiceJob {
                ticket,
                kind,
                image,
            }) {
                Ok(()) => return,
                Err(e) => ServiceError::Unavailable(e.to_string()),
            },
            Err(e) => ServiceError::FrameUnavailable(e.to_string()),
        };

        self.apply(Completion {
            ticket,
            outcome: Outcome::failure(kind, failure),
        });
    }

    /// Completes the outstanding request, if any, as failed.
    fn fail_in_flight(&mut self, reason: &str) {
        if let Some(PendingRequest { ticket, kind }) = self.controller.in_flight_request() {
            self.apply(Completion {
                ticket,
                outcome: Outcome::failure(kind, ServiceError::Unavailable(reason.to_string())),
            });
        }
    }

    fn apply(&mut self, completion: Completion) {
        self.record(&completion);
        let identified_before = self.state.identified_count();
        self.controller.complete(&mut self.state, completion);

        let identified_after = self.state.identified_count();
        if identified_after > identified_before {
            self.stats.identified += identified_after - identified_before;
        }
        self.stats.peak_boxes = self.stats.peak_boxes.max(self.state.boxes().len());
    }

    fn render_tick(&mut self) {
        let frame = match self.source.current_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("No frame to render: {e}");
                return;
            }
        };

        self.renderer.render(&frame, &self.state, &mut self.surface);
        self.stats.frames_rendered += 1;

        if let Err(e) = self.present(&frame) {
            log::warn!("Failed to present frame {}: {e}", frame.index());
        }
    }

    fn present(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let composed = self.surface.to_frame(frame.index());
        self.presenter.present(&composed)
    }

    fn record(&mut self, completion: &Completion) {
        match &completion.outcome {
            Outcome::Detected(_) => self.stats.detections += 1,
            Outcome::Matched(_) => self.stats.matches += 1,
        }
        if !completion.outcome.is_ok() {
            self.stats.failures += 1;
        }
    }
}
