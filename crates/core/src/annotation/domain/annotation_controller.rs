use crate::annotation::domain::annotation_state::AnnotationState;
use crate::annotation::domain::pipeline_state::{
    Completion, Outcome, PendingRequest, PipelineState, RequestKind, RequestTicket,
};
use crate::shared::face_box::FaceBox;
use crate::shared::identity::Identity;
use crate::shared::service_error::ServiceError;

#[derive(Clone, Copy, Debug)]
struct InFlight {
    ticket: RequestTicket,
    kind: RequestKind,
    /// Set by `stop`: the request is allowed to finish but its result is dropped.
    stale: bool,
}

/// Drives the detect → match → match → … cycle.
///
/// The controller performs no I/O. [`poll`](Self::poll) hands out the next
/// request when one may be issued and [`complete`](Self::complete) applies
/// its result. At most one request is ever in flight: `poll` returns `None`
/// until the outstanding request has been completed.
///
/// Matching walks the detected boxes from the highest index down to 0 and
/// then starts a new detection. Service failures never stop the cycle; they
/// only end the current step.
#[derive(Debug)]
pub struct AnnotationController {
    pipeline: PipelineState,
    in_flight: Option<InFlight>,
    next_ticket: u64,
}

impl AnnotationController {
    pub fn new() -> Self {
        Self {
            pipeline: PipelineState::Idle,
            in_flight: None,
            next_ticket: 0,
        }
    }

    pub fn pipeline_state(&self) -> PipelineState {
        self.pipeline
    }

    pub fn match_index(&self) -> Option<usize> {
        match self.pipeline {
            PipelineState::AwaitingMatch { match_index } => Some(match_index),
            _ => None,
        }
    }

    pub fn in_flight(&self) -> Option<RequestTicket> {
        self.in_flight.map(|f| f.ticket)
    }

    /// The outstanding request, for callers that must fail it themselves.
    pub fn in_flight_request(&self) -> Option<PendingRequest> {
        self.in_flight.map(|f| PendingRequest {
            ticket: f.ticket,
            kind: f.kind,
        })
    }

    pub fn start(&mut self, state: &mut AnnotationState) {
        if state.active {
            return;
        }
        state.active = true;
        self.pipeline = PipelineState::AwaitingDetection;
        log::info!("Annotation started");
    }

    /// Deactivates the pipeline and clears the box list. A request still in
    /// flight completes normally but its result is discarded.
    pub fn stop(&mut self, state: &mut AnnotationState) {
        state.active = false;
        state.boxes.clear();
        self.pipeline = PipelineState::Idle;
        if let Some(in_flight) = self.in_flight.as_mut() {
            in_flight.stale = true;
        }
        log::info!("Annotation stopped");
    }

    /// Returns the next request to issue, marking it in flight, or `None`
    /// while inactive or while another request is outstanding.
    pub fn poll(&mut self, state: &AnnotationState) -> Option<PendingRequest> {
        if !state.active || self.in_flight.is_some() {
            return None;
        }

        let kind = match self.pipeline {
            PipelineState::Idle => return None,
            PipelineState::AwaitingDetection => RequestKind::Detect,
            PipelineState::AwaitingMatch { match_index } => {
                match next_unidentified(&state.boxes, match_index) {
                    Some(index) => {
                        self.pipeline = PipelineState::AwaitingMatch { match_index: index };
                        RequestKind::Match {
                            index,
                            crop: state.boxes[index].crop_rect(),
                        }
                    }
                    None => {
                        self.pipeline = PipelineState::AwaitingDetection;
                        RequestKind::Detect
                    }
                }
            }
        };

        let ticket = RequestTicket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some(InFlight {
            ticket,
            kind,
            stale: false,
        });
        log::debug!("Issuing {kind:?} as request #{}", ticket.0);
        Some(PendingRequest { ticket, kind })
    }

    /// Applies the result of the in-flight request.
    ///
    /// Completions for anything but the in-flight request, and completions
    /// arriving after `stop`, are dropped.
    pub fn complete(&mut self, state: &mut AnnotationState, completion: Completion) {
        let in_flight = match self.in_flight.take() {
            Some(f) if f.ticket == completion.ticket => f,
            other => {
                self.in_flight = other;
                log::warn!(
                    "Ignoring completion for request #{} which is not in flight",
                    completion.ticket.0
                );
                return;
            }
        };

        if in_flight.stale || !state.active {
            log::debug!("Discarding result of request #{} after stop", in_flight.ticket.0);
            return;
        }

        match (in_flight.kind, completion.outcome) {
            (RequestKind::Detect, Outcome::Detected(result)) => {
                self.apply_detection(state, result)
            }
            (RequestKind::Match { index, .. }, Outcome::Matched(result)) => {
                self.apply_match(state, index, result)
            }
            (kind, outcome) => {
                log::warn!("Request #{} was {kind:?} but got {outcome:?}", in_flight.ticket.0);
            }
        }
    }

    fn apply_detection(
        &mut self,
        state: &mut AnnotationState,
        result: Result<Vec<FaceBox>, ServiceError>,
    ) {
        let boxes = match result {
            Ok(boxes) => boxes,
            Err(ServiceError::FrameUnavailable(reason)) => {
                log::debug!("Skipping detection this cycle: {reason}");
                self.pipeline = PipelineState::AwaitingDetection;
                return;
            }
            Err(e) => {
                log::warn!("Detection failed, treating as no faces: {e}");
                Vec::new()
            }
        };

        log::debug!("Detected {} face(s)", boxes.len());
        state.boxes = boxes;
        self.pipeline = match state.boxes.len() {
            0 => PipelineState::AwaitingDetection,
            n => PipelineState::AwaitingMatch { match_index: n - 1 },
        };
    }

    fn apply_match(
        &mut self,
        state: &mut AnnotationState,
        index: usize,
        result: Result<Identity, ServiceError>,
    ) {
        match result {
            Ok(identity) => match state.boxes.get(index).map(FaceBox::has_identity) {
                Some(false) => {
                    log::debug!("Box {index} identified as {:?}", identity.name());
                    let face = state.boxes[index].clone();
                    state.boxes[index] = face.with_identity(identity);
                }
                Some(true) => log::debug!("Box {index} already identified"),
                None => log::warn!("Match result for box {index} which no longer exists"),
            },
            Err(e) => log::warn!("Matching box {index} failed, leaving it unidentified: {e}"),
        }

        self.pipeline = match index.checked_sub(1) {
            Some(below) => match next_unidentified(&state.boxes, below) {
                Some(match_index) => PipelineState::AwaitingMatch { match_index },
                None => PipelineState::AwaitingDetection,
            },
            None => PipelineState::AwaitingDetection,
        };
    }
}

impl Default for AnnotationController {
    fn default() -> Self {
        Self::new()
    }
}

/// Highest index at or below `from` whose box has no identity.
///
/// `from` is clamped to the last index of `boxes`.
fn next_unidentified(boxes: &[FaceBox], from: usize) -> Option<usize> {
    let last = boxes.len().checked_sub(1)?;
    (0..=from.min(last)).rev().find(|&i| !boxes[i].has_identity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelRect;

    fn identity(pairs: &[(&str, &str)]) -> Identity {
        pairs.iter().copied().collect()
    }

    fn boxes(n: usize) -> Vec<FaceBox> {
        (0..n)
            .map(|i| {
                let offset = (i * 100) as i32;
                FaceBox::new(10, offset + 60, 70, offset + 10)
            })
            .collect()
    }

    fn detected(ticket: RequestTicket, boxes: Vec<FaceBox>) -> Completion {
        Completion {
            ticket,
            outcome: Outcome::Detected(Ok(boxes)),
        }
    }

    fn matched(ticket: RequestTicket, identity: Identity) -> Completion {
        Completion {
            ticket,
            outcome: Outcome::Matched(Ok(identity)),
        }
    }

    fn match_failed(ticket: RequestTicket) -> Completion {
        Completion {
            ticket,
            outcome: Outcome::Matched(Err(ServiceError::Parse("bad".into()))),
        }
    }

    fn started() -> (AnnotationController, AnnotationState) {
        let mut controller = AnnotationController::new();
        let mut state = AnnotationState::new();
        controller.start(&mut state);
        (controller, state)
    }

    fn expect_detect(controller: &mut AnnotationController, state: &AnnotationState) -> RequestTicket {
        let request = controller.poll(state).expect("a request should be issued");
        assert_eq!(request.kind, RequestKind::Detect);
        request.ticket
    }

    fn expect_match(
        controller: &mut AnnotationController,
        state: &AnnotationState,
        expected_index: usize,
    ) -> RequestTicket {
        let request = controller.poll(state).expect("a request should be issued");
        match request.kind {
            RequestKind::Match { index, .. } => assert_eq!(index, expected_index),
            other => panic!("expected match request, got {other:?}"),
        }
        request.ticket
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    #[test]
    fn test_new_controller_is_idle_and_silent() {
        let mut controller = AnnotationController::new();
        let state = AnnotationState::new();
        assert_eq!(controller.pipeline_state(), PipelineState::Idle);
        assert!(controller.poll(&state).is_none());
    }

    #[test]
    fn test_start_enters_awaiting_detection() {
        let (mut controller, state) = started();
        assert!(state.is_active());
        assert_eq!(controller.pipeline_state(), PipelineState::AwaitingDetection);
        expect_detect(&mut controller, &state);
    }

    #[test]
    fn test_start_twice_is_noop() {
        let (mut controller, mut state) = started();
        let ticket = expect_detect(&mut controller, &state);
        controller.start(&mut state);
        assert_eq!(controller.in_flight(), Some(ticket));
        assert!(controller.poll(&state).is_none());
    }

    // ── Scenarios ────────────────────────────────────────────────────

    #[test]
    fn test_single_box_detect_then_match_cycle() {
        let (mut controller, mut state) = started();

        let t = expect_detect(&mut controller, &state);
        controller.complete(&mut state, detected(t, vec![FaceBox::from_edges([10, 50, 60, 5])]));
        assert_eq!(
            controller.pipeline_state(),
            PipelineState::AwaitingMatch { match_index: 0 }
        );

        let request = controller.poll(&state).unwrap();
        assert_eq!(
            request.kind,
            RequestKind::Match {
                index: 0,
                crop: PixelRect {
                    x: 5,
                    y: 10,
                    width: 45,
                    height: 50
                }
            }
        );

        let id = identity(&[("Name", "A"), ("Title", "B")]);
        controller.complete(&mut state, matched(request.ticket, id.clone()));

        assert_eq!(state.boxes()[0].edges(), [10, 50, 60, 5]);
        assert_eq!(state.boxes()[0].identity(), Some(&id));
        assert_eq!(controller.match_index(), None);
        assert_eq!(controller.pipeline_state(), PipelineState::AwaitingDetection);
        expect_detect(&mut controller, &state);
    }

    #[test]
    fn test_empty_detection_redetects_without_matching() {
        let (mut controller, mut state) = started();

        let t = expect_detect(&mut controller, &state);
        controller.complete(&mut state, detected(t, Vec::new()));

        assert_eq!(controller.pipeline_state(), PipelineState::AwaitingDetection);
        assert!(state.boxes().is_empty());
        expect_detect(&mut controller, &state);
    }

    #[test]
    fn test_stop_mid_match_discards_result() {
        let (mut controller, mut state) = started();

        let t = expect_detect(&mut controller, &state);
        controller.complete(&mut state, detected(t, boxes(2)));
        let match_ticket = expect_match(&mut controller, &state, 1);

        controller.stop(&mut state);
        assert!(state.boxes().is_empty());
        assert!(!state.is_active());

        controller.complete(&mut state, matched(match_ticket, identity(&[("Name", "A")])));
        assert!(state.boxes().is_empty());
        assert_eq!(controller.in_flight(), None);
        assert!(controller.poll(&state).is_none());
        assert_eq!(controller.pipeline_state(), PipelineState::Idle);
    }

    #[test]
    fn test_restart_waits_for_stale_request() {
        let (mut controller, mut state) = started();
        let stale = expect_detect(&mut controller, &state);

        controller.stop(&mut state);
        controller.start(&mut state);

        // The old request is still outstanding, so nothing new may be issued.
        assert!(controller.poll(&state).is_none());

        controller.complete(&mut state, detected(stale, boxes(3)));
        assert!(state.boxes().is_empty());
        assert_eq!(controller.pipeline_state(), PipelineState::AwaitingDetection);
        expect_detect(&mut controller, &state);
    }

    // ── Ordering and in-flight invariant ────────────────────────────

    #[test]
    fn test_matches_from_highest_index_down() {
        let (mut controller, mut state) = started();
        let t = expect_detect(&mut controller, &state);
        controller.complete(&mut state, detected(t, boxes(4)));

        let mut visited = Vec::new();
        while let Some(index) = controller.match_index() {
            visited.push(index);
            let t = expect_match(&mut controller, &state, index);
            controller.complete(&mut state, matched(t, identity(&[("Name", "X")])));
        }

        assert_eq!(visited, vec![3, 2, 1, 0]);
        assert_eq!(state.identified_count(), 4);
        assert_eq!(controller.pipeline_state(), PipelineState::AwaitingDetection);
    }

    #[test]
    fn test_match_index_strictly_decreases() {
        let (mut controller, mut state) = started();
        let t = expect_detect(&mut controller, &state);
        controller.complete(&mut state, detected(t, boxes(5)));

        let mut previous: Option<usize> = None;
        loop {
            let current = match controller.pipeline_state() {
                PipelineState::AwaitingMatch { match_index } => match_index,
                PipelineState::AwaitingDetection => break,
                PipelineState::Idle => panic!("controller went idle while active"),
            };
            if let Some(p) = previous {
                assert!(current < p, "{current} should be below {p}");
            }
            previous = Some(current);
            let t = expect_match(&mut controller, &state, current);
            controller.complete(&mut state, match_failed(t));
        }
        assert_eq!(previous, Some(0));
    }

    #[test]
    fn test_never_two_requests_in_flight() {
        let (mut controller, mut state) = started();

        let t = expect_detect(&mut controller, &state);
        assert!(controller.poll(&state).is_none());
        controller.complete(&mut state, detected(t, boxes(2)));

        let t = expect_match(&mut controller, &state, 1);
        assert!(controller.poll(&state).is_none());
        assert!(controller.poll(&state).is_none());
        controller.complete(&mut state, matched(t, identity(&[("Name", "A")])));

        let t = expect_match(&mut controller, &state, 0);
        assert!(controller.poll(&state).is_none());
        controller.complete(&mut state, matched(t, identity(&[("Name", "B")])));

        expect_detect(&mut controller, &state);
        assert!(controller.poll(&state).is_none());
    }

    #[test]
    fn test_in_flight_request_can_be_failed_by_caller() {
        let (mut controller, mut state) = started();
        assert!(controller.in_flight_request().is_none());

        let t = expect_detect(&mut controller, &state);
        let pending = controller.in_flight_request().unwrap();
        assert_eq!(pending.ticket, t);
        assert_eq!(pending.kind, RequestKind::Detect);

        controller.complete(
            &mut state,
            Completion {
                ticket: pending.ticket,
                outcome: Outcome::failure(pending.kind, ServiceError::Unavailable("gone".into())),
            },
        );
        assert!(controller.in_flight_request().is_none());
        expect_detect(&mut controller, &state);
    }

    #[test]
    fn test_unknown_completion_is_ignored() {
        let (mut controller, mut state) = started();
        let t = expect_detect(&mut controller, &state);

        controller.complete(&mut state, detected(RequestTicket(t.0 + 100), boxes(2)));

        assert!(state.boxes().is_empty());
        assert_eq!(controller.in_flight(), Some(t));
    }

    #[test]
    fn test_mismatched_outcome_clears_in_flight_without_applying() {
        let (mut controller, mut state) = started();
        let t = expect_detect(&mut controller, &state);

        controller.complete(&mut state, matched(t, identity(&[("Name", "A")])));

        assert_eq!(controller.in_flight(), None);
        assert_eq!(controller.pipeline_state(), PipelineState::AwaitingDetection);
    }

    // ── Failures ─────────────────────────────────────────────────────

    #[test]
    fn test_detection_failure_means_no_faces() {
        let (mut controller, mut state) = started();
        let t = expect_detect(&mut controller, &state);
        controller.complete(&mut state, detected(t, boxes(2)));

        // Finish the cycle so a new detection is due.
        for index in [1, 0] {
            let t = expect_match(&mut controller, &state, index);
            controller.complete(&mut state, match_failed(t));
        }
        let t = expect_detect(&mut controller, &state);
        controller.complete(
            &mut state,
            Completion {
                ticket: t,
                outcome: Outcome::Detected(Err(ServiceError::Parse("garbage".into()))),
            },
        );

        assert!(state.boxes().is_empty());
        assert_eq!(controller.pipeline_state(), PipelineState::AwaitingDetection);
        expect_detect(&mut controller, &state);
    }

    #[test]
    fn test_frame_unavailable_keeps_previous_boxes() {
        let (mut controller, mut state) = started();
        let t = expect_detect(&mut controller, &state);
        controller.complete(&mut state, detected(t, boxes(1)));
        let t = expect_match(&mut controller, &state, 0);
        controller.complete(&mut state, matched(t, identity(&[("Name", "A")])));

        let t = expect_detect(&mut controller, &state);
        controller.complete(
            &mut state,
            Completion {
                ticket: t,
                outcome: Outcome::Detected(Err(ServiceError::FrameUnavailable("no signal".into()))),
            },
        );

        assert_eq!(state.boxes().len(), 1);
        assert!(state.boxes()[0].has_identity());
        expect_detect(&mut controller, &state);
    }

    #[test]
    fn test_match_failure_skips_box_for_rest_of_cycle() {
        let (mut controller, mut state) = started();
        let t = expect_detect(&mut controller, &state);
        controller.complete(&mut state, detected(t, boxes(3)));

        let t = expect_match(&mut controller, &state, 2);
        controller.complete(&mut state, match_failed(t));
        assert_eq!(controller.match_index(), Some(1));

        let t = expect_match(&mut controller, &state, 1);
        controller.complete(&mut state, matched(t, identity(&[("Name", "B")])));
        let t = expect_match(&mut controller, &state, 0);
        controller.complete(&mut state, matched(t, identity(&[("Name", "C")])));

        assert!(!state.boxes()[2].has_identity());
        assert!(state.boxes()[1].has_identity());
        assert!(state.boxes()[0].has_identity());
        expect_detect(&mut controller, &state);
    }

    // ── Guards ───────────────────────────────────────────────────────

    #[test]
    fn test_next_unidentified_clamps_out_of_bounds_index() {
        assert_eq!(next_unidentified(&boxes(3), 10), Some(2));
    }

    #[test]
    fn test_next_unidentified_skips_identified_boxes() {
        let mut list = boxes(4);
        list[3] = list[3].clone().with_identity(identity(&[("Name", "A")]));
        list[2] = list[2].clone().with_identity(identity(&[("Name", "B")]));
        assert_eq!(next_unidentified(&list, 3), Some(1));
    }

    #[test]
    fn test_next_unidentified_none_when_all_identified() {
        let list: Vec<FaceBox> = boxes(2)
            .into_iter()
            .map(|b| b.with_identity(identity(&[("Name", "A")])))
            .collect();
        assert_eq!(next_unidentified(&list, 1), None);
        assert_eq!(next_unidentified(&[], 0), None);
    }

    #[test]
    fn test_poll_clamps_cursor_when_list_shrank() {
        let (mut controller, mut state) = started();
        let t = expect_detect(&mut controller, &state);
        controller.complete(&mut state, detected(t, boxes(3)));

        state.boxes.truncate(1);
        expect_match(&mut controller, &state, 0);
    }

    #[test]
    fn test_poll_redetects_when_no_unidentified_box_remains() {
        let (mut controller, mut state) = started();
        let t = expect_detect(&mut controller, &state);
        controller.complete(&mut state, detected(t, boxes(2)));

        state.boxes = std::mem::take(&mut state.boxes)
            .into_iter()
            .map(|b| b.with_identity(identity(&[("Name", "A")])))
            .collect();
        expect_detect(&mut controller, &state);
    }
}
