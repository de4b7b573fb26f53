//! Capture attempt state machine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::error::CaptureError;
use crate::extraction::{CccdExtractor, DocumentExtractor};
use crate::models::config::ExtractionConfig;
use crate::models::document::{DocumentRecord, ImageHandle, Locale};
use crate::ocr::TextRecognizer;

use super::{
    AttemptOutcome, CameraService, CaptureOutcome, CaptureResult, CaptureState, FlowOutcome,
    Navigator, PermissionChecker, RetryChoice, permission_required_message,
    recognition_failed_message,
};

/// Close flag for the screen hosting a pipeline.
///
/// Recognition cannot be cancelled; once the screen is closed, whatever it
/// resolves to is dropped. A closed guard stays closed.
#[derive(Debug, Clone, Default)]
pub struct ScreenGuard(Arc<AtomicBool>);

impl ScreenGuard {
    pub fn close(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs capture attempts one at a time.
///
/// Each attempt builds a fresh record; nothing from a previous attempt is
/// carried over.
pub struct CapturePipeline<R, E = CccdExtractor> {
    recognizer: R,
    extractor: E,
    state: CaptureState,
    /// States visited by the current (or last) attempt.
    trace: Vec<CaptureState>,
    screen: ScreenGuard,
}

impl<R: TextRecognizer> CapturePipeline<R, CccdExtractor> {
    /// Pipeline with a CCCD extractor configured from `config`.
    pub fn for_cccd(recognizer: R, config: &ExtractionConfig) -> Self {
        Self::new(recognizer, CccdExtractor::from_config(config))
    }
}

impl<R: TextRecognizer, E: DocumentExtractor> CapturePipeline<R, E> {
    pub fn new(recognizer: R, extractor: E) -> Self {
        Self {
            recognizer,
            extractor,
            state: CaptureState::Idle,
            trace: Vec::new(),
            screen: ScreenGuard::default(),
        }
    }

    /// Language of user-facing messages, taken from the extractor so
    /// messages and missing-field labels always agree.
    pub fn locale(&self) -> Locale {
        self.extractor.locale()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// States visited by the current or most recent attempt.
    pub fn trace(&self) -> &[CaptureState] {
        &self.trace
    }

    /// Guard the hosting screen flips when it goes away.
    pub fn screen_guard(&self) -> ScreenGuard {
        self.screen.clone()
    }

    /// Force the pipeline back to `Idle`.
    ///
    /// Needed only when an attempt future was dropped before it resolved.
    pub fn reset(&mut self) {
        if self.state != CaptureState::Idle {
            debug!("Resetting capture pipeline from {}", self.state);
        }
        self.state = CaptureState::Idle;
    }

    fn transition(&mut self, next: CaptureState) {
        debug!("Capture state: {} -> {}", self.state, next);
        self.state = next;
        self.trace.push(next);
    }

    fn ensure_ready(&self) -> Result<(), CaptureError> {
        if self.state.accepts_capture() {
            Ok(())
        } else {
            Err(CaptureError::Busy(self.state.to_string()))
        }
    }

    /// Recognize, extract, and validate an already captured image.
    pub async fn process_capture(
        &mut self,
        image: ImageHandle,
    ) -> Result<CaptureOutcome, CaptureError> {
        self.ensure_ready()?;
        self.trace.clear();
        Ok(self.process(image).await)
    }

    async fn process(&mut self, image: ImageHandle) -> CaptureOutcome {
        self.transition(CaptureState::Recognizing);

        let result = self.recognizer.recognize(&image).await;
        let recognized = match result {
            Ok(recognized) => recognized,
            Err(e) => {
                warn!("Text recognition failed for {}: {}", image, e);
                self.transition(CaptureState::RecognitionFailed);
                self.transition(CaptureState::Idle);
                return CaptureOutcome::RecognitionFailed {
                    message: recognition_failed_message(self.locale()),
                };
            }
        };

        debug!(
            "Recognized {} characters in {}ms",
            recognized.text.len(),
            recognized.processing_time_ms
        );

        self.transition(CaptureState::Extracting);
        let fields = self.extractor.extract_fields(&recognized.text);

        self.transition(CaptureState::Validating);
        let missing_labels = self.extractor.validate(&fields);

        if !missing_labels.is_empty() {
            info!("Incomplete extraction, missing: {}", missing_labels.join(", "));
            return self.incomplete(missing_labels);
        }

        match DocumentRecord::from_partial(fields, image, self.locale()) {
            Ok(record) => {
                info!("Document captured for {}", record.id_number());
                self.transition(CaptureState::Complete);
                CaptureOutcome::Complete { record }
            }
            // The extractor accepted a record the model rejects.
            Err(crate::error::ExtractionError::MissingFields(labels)) => self.incomplete(labels),
        }
    }

    fn incomplete(&mut self, missing_labels: Vec<String>) -> CaptureOutcome {
        self.transition(CaptureState::Incomplete);
        self.transition(CaptureState::Idle);
        CaptureOutcome::Incomplete { missing_labels }
    }

    /// Run one attempt: permission check, camera, then processing.
    pub async fn attempt<C, P>(
        &mut self,
        camera: &C,
        permission: &P,
    ) -> Result<AttemptOutcome, CaptureError>
    where
        C: CameraService + ?Sized,
        P: PermissionChecker + ?Sized,
    {
        self.ensure_ready()?;
        self.trace.clear();

        if self.screen.is_closed() {
            return Ok(AttemptOutcome::Discarded);
        }

        if !permission.has_camera_permission().await {
            warn!("Camera permission denied");
            self.state = CaptureState::Idle;
            return Ok(AttemptOutcome::PermissionDenied {
                message: permission_required_message(self.locale()),
            });
        }

        self.transition(CaptureState::Capturing);

        let image = match camera.capture().await {
            Ok(CaptureResult::Captured(image)) => image,
            Ok(CaptureResult::Cancelled) => {
                debug!("Capture cancelled by user");
                self.transition(CaptureState::Idle);
                return Ok(AttemptOutcome::Cancelled);
            }
            Err(e) => {
                self.transition(CaptureState::Idle);
                return Err(e);
            }
        };

        let outcome = self.process(image).await;

        if self.screen.is_closed() {
            debug!("Capture screen closed, dropping {:?}", self.state);
            self.state = CaptureState::Idle;
            return Ok(AttemptOutcome::Discarded);
        }

        Ok(AttemptOutcome::Processed { outcome })
    }

    /// Drive attempts until a record is confirmed or the user gives up.
    pub async fn run<C, P, N>(
        &mut self,
        camera: &C,
        permission: &P,
        navigator: &N,
    ) -> Result<FlowOutcome, CaptureError>
    where
        C: CameraService + ?Sized,
        P: PermissionChecker + ?Sized,
        N: Navigator + ?Sized,
    {
        loop {
            match self.attempt(camera, permission).await? {
                AttemptOutcome::PermissionDenied { message } => {
                    navigator.permission_required(&message).await;
                    return Ok(FlowOutcome::PermissionDenied);
                }
                AttemptOutcome::Cancelled | AttemptOutcome::Discarded => {
                    return Ok(FlowOutcome::Cancelled);
                }
                AttemptOutcome::Processed {
                    outcome: CaptureOutcome::Complete { record },
                } => {
                    navigator.confirm(record).await;
                    return Ok(FlowOutcome::Confirmed);
                }
                AttemptOutcome::Processed { outcome } => {
                    match navigator.offer_retry(&outcome).await {
                        RetryChoice::Recapture => {
                            info!("Recapture requested");
                        }
                        RetryChoice::Cancel => return Ok(FlowOutcome::Cancelled),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::time::Duration;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use crate::capture::StaticPermission;
    use crate::error::OcrError;
    use crate::ocr::RecognizedText;

    const SCENARIO_A: &str = "No.123456789012\n\
        Name JOHN DOE\n\
        Date of birth 01/01/1990\n\
        Sex MALE\n\
        Nationality VIETNAMESE\n\
        Place of origin HANOI\n\
        Place of residence HANOI";

    const NO_BIRTH_DATE: &str = "No.987654321098\n\
        Name FIRST TRY\n\
        Sex FEMALE\n\
        Nationality VIETNAMESE\n\
        Place of origin HUE\n\
        Place of residence DA NANG";

    struct FakeRecognizer {
        results: RefCell<VecDeque<Result<String, OcrError>>>,
        calls: Cell<usize>,
        close_on_call: Option<ScreenGuard>,
    }

    impl FakeRecognizer {
        fn new(results: Vec<Result<&str, OcrError>>) -> Self {
            Self {
                results: RefCell::new(
                    results.into_iter().map(|r| r.map(str::to_string)).collect(),
                ),
                calls: Cell::new(0),
                close_on_call: None,
            }
        }
    }

    #[async_trait(?Send)]
    impl TextRecognizer for FakeRecognizer {
        async fn recognize(&self, _image: &ImageHandle) -> Result<RecognizedText, OcrError> {
            self.calls.set(self.calls.get() + 1);
            if let Some(guard) = &self.close_on_call {
                guard.close();
            }
            let next = self.results.borrow_mut().pop_front().unwrap_or(Err(OcrError::NoText));
            next.map(RecognizedText::from_text)
        }
    }

    struct PendingRecognizer;

    #[async_trait(?Send)]
    impl TextRecognizer for PendingRecognizer {
        async fn recognize(&self, _image: &ImageHandle) -> Result<RecognizedText, OcrError> {
            std::future::pending().await
        }
    }

    struct FakeCamera {
        shots: RefCell<VecDeque<CaptureResult>>,
        calls: Cell<usize>,
    }

    impl FakeCamera {
        fn new(shots: Vec<CaptureResult>) -> Self {
            Self {
                shots: RefCell::new(shots.into()),
                calls: Cell::new(0),
            }
        }

        fn shots(paths: &[&str]) -> Self {
            Self::new(
                paths
                    .iter()
                    .map(|p| CaptureResult::Captured(ImageHandle::new(p)))
                    .collect(),
            )
        }
    }

    #[async_trait(?Send)]
    impl CameraService for FakeCamera {
        async fn capture(&self) -> Result<CaptureResult, CaptureError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self
                .shots
                .borrow_mut()
                .pop_front()
                .unwrap_or(CaptureResult::Cancelled))
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        confirmed: RefCell<Vec<DocumentRecord>>,
        retries_offered: RefCell<Vec<CaptureOutcome>>,
        choices: RefCell<VecDeque<RetryChoice>>,
        permission_messages: RefCell<Vec<String>>,
    }

    impl RecordingNavigator {
        fn choosing(choices: Vec<RetryChoice>) -> Self {
            Self {
                choices: RefCell::new(choices.into()),
                ..Self::default()
            }
        }
    }

    #[async_trait(?Send)]
    impl Navigator for RecordingNavigator {
        async fn confirm(&self, record: DocumentRecord) {
            self.confirmed.borrow_mut().push(record);
        }

        async fn offer_retry(&self, outcome: &CaptureOutcome) -> RetryChoice {
            self.retries_offered.borrow_mut().push(outcome.clone());
            self.choices
                .borrow_mut()
                .pop_front()
                .unwrap_or(RetryChoice::Cancel)
        }

        async fn permission_required(&self, message: &str) {
            self.permission_messages.borrow_mut().push(message.to_string());
        }
    }

    fn pipeline(recognizer: &FakeRecognizer) -> CapturePipeline<&FakeRecognizer> {
        CapturePipeline::new(recognizer, CccdExtractor::new())
    }

    #[tokio::test]
    async fn test_scenario_a_complete() {
        let recognizer = FakeRecognizer::new(vec![Ok(SCENARIO_A)]);
        let mut pipeline = pipeline(&recognizer);

        let outcome = pipeline
            .process_capture(ImageHandle::new("file:///tmp/cccd.jpg"))
            .await
            .unwrap();

        let CaptureOutcome::Complete { record } = outcome else {
            panic!("expected complete outcome, got {:?}", outcome);
        };
        assert_eq!(record.id_number(), "123456789012");
        assert_eq!(record.full_name(), "JOHN DOE");
        assert_eq!(record.date_of_birth(), "01/01/1990");
        assert_eq!(record.sex(), "MALE");
        assert_eq!(record.nationality(), "VIETNAMESE");
        assert_eq!(record.place_of_origin(), "HANOI");
        assert_eq!(record.place_of_residence(), "HANOI");
        assert_eq!(record.image().path().to_str(), Some("/tmp/cccd.jpg"));
        assert_eq!(pipeline.state(), CaptureState::Complete);
        assert_eq!(
            pipeline.trace(),
            &[
                CaptureState::Recognizing,
                CaptureState::Extracting,
                CaptureState::Validating,
                CaptureState::Complete,
            ]
        );
    }

    #[tokio::test]
    async fn test_scenario_b_missing_birth_date() {
        let recognizer = FakeRecognizer::new(vec![Ok(NO_BIRTH_DATE)]);
        let mut pipeline = pipeline(&recognizer);

        let outcome = pipeline.process_capture(ImageHandle::new("a.jpg")).await.unwrap();

        assert_eq!(
            outcome,
            CaptureOutcome::Incomplete {
                missing_labels: vec!["Ngày sinh".to_string()]
            }
        );
        assert_eq!(pipeline.state(), CaptureState::Idle);
        assert!(pipeline.trace().contains(&CaptureState::Incomplete));
    }

    #[tokio::test]
    async fn test_scenario_c_recognition_failed() {
        let recognizer =
            FakeRecognizer::new(vec![Err(OcrError::InvalidImage("corrupt".into()))]);
        let mut pipeline =
            CapturePipeline::new(&recognizer, CccdExtractor::new().with_locale(Locale::En));

        let outcome = pipeline.process_capture(ImageHandle::new("a.jpg")).await.unwrap();

        assert_eq!(
            outcome,
            CaptureOutcome::RecognitionFailed {
                message: "Failed to recognize text from image. Please try again.".to_string()
            }
        );
        assert_eq!(pipeline.state(), CaptureState::Idle);
        assert_eq!(
            pipeline.trace(),
            &[
                CaptureState::Recognizing,
                CaptureState::RecognitionFailed,
                CaptureState::Idle,
            ]
        );
    }

    #[tokio::test]
    async fn test_scenario_d_recapture_after_incomplete() {
        let recognizer = FakeRecognizer::new(vec![Ok(NO_BIRTH_DATE), Ok(SCENARIO_A)]);
        let camera = FakeCamera::shots(&["first.jpg", "second.jpg"]);
        let navigator = RecordingNavigator::choosing(vec![RetryChoice::Recapture]);
        let mut pipeline = pipeline(&recognizer);

        let flow = pipeline
            .run(&camera, &StaticPermission(true), &navigator)
            .await
            .unwrap();

        assert_eq!(flow, FlowOutcome::Confirmed);
        assert_eq!(camera.calls.get(), 2);
        assert_eq!(navigator.retries_offered.borrow().len(), 1);

        let confirmed = navigator.confirmed.borrow();
        assert_eq!(confirmed.len(), 1);
        let record = &confirmed[0];
        // Nothing from the first attempt leaks into the second.
        assert_eq!(record.id_number(), "123456789012");
        assert_eq!(record.full_name(), "JOHN DOE");
        assert_eq!(record.place_of_residence(), "HANOI");
        assert_eq!(record.image().path().to_str(), Some("second.jpg"));
    }

    #[tokio::test]
    async fn test_cancel_after_failure() {
        let recognizer = FakeRecognizer::new(vec![Err(OcrError::NoText)]);
        let camera = FakeCamera::shots(&["a.jpg"]);
        let navigator = RecordingNavigator::choosing(vec![RetryChoice::Cancel]);
        let mut pipeline = pipeline(&recognizer);

        let flow = pipeline
            .run(&camera, &StaticPermission(true), &navigator)
            .await
            .unwrap();

        assert_eq!(flow, FlowOutcome::Cancelled);
        assert!(navigator.confirmed.borrow().is_empty());
        assert!(matches!(
            navigator.retries_offered.borrow()[0],
            CaptureOutcome::RecognitionFailed { .. }
        ));
        assert_eq!(pipeline.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_permission_denied_never_opens_camera() {
        let recognizer = FakeRecognizer::new(vec![Ok(SCENARIO_A)]);
        let camera = FakeCamera::shots(&["a.jpg"]);
        let navigator = RecordingNavigator::default();
        let mut pipeline = pipeline(&recognizer);

        let flow = pipeline
            .run(&camera, &StaticPermission(false), &navigator)
            .await
            .unwrap();

        assert_eq!(flow, FlowOutcome::PermissionDenied);
        assert_eq!(camera.calls.get(), 0);
        assert_eq!(recognizer.calls.get(), 0);
        assert_eq!(
            navigator.permission_messages.borrow().as_slice(),
            &["Cần cấp quyền camera để quét giấy tờ.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_camera_cancel_is_not_an_error() {
        let recognizer = FakeRecognizer::new(vec![]);
        let camera = FakeCamera::new(vec![CaptureResult::Cancelled]);
        let mut pipeline = pipeline(&recognizer);

        let outcome = pipeline
            .attempt(&camera, &StaticPermission(true))
            .await
            .unwrap();

        assert_eq!(outcome, AttemptOutcome::Cancelled);
        assert_eq!(recognizer.calls.get(), 0);
        assert_eq!(pipeline.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_closed_screen_discards_result() {
        let mut recognizer = FakeRecognizer::new(vec![Ok(SCENARIO_A)]);
        let camera = FakeCamera::shots(&["a.jpg"]);
        let guard = ScreenGuard::default();
        recognizer.close_on_call = Some(guard.clone());

        let mut pipeline = pipeline(&recognizer);
        pipeline.screen = guard;

        let outcome = pipeline
            .attempt(&camera, &StaticPermission(true))
            .await
            .unwrap();

        assert_eq!(outcome, AttemptOutcome::Discarded);
        assert_eq!(recognizer.calls.get(), 1);
        assert_eq!(pipeline.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_dropped_attempt_blocks_until_reset() {
        let mut pipeline = CapturePipeline::new(PendingRecognizer, CccdExtractor::new());

        let pending = tokio::time::timeout(
            Duration::from_millis(10),
            pipeline.process_capture(ImageHandle::new("a.jpg")),
        )
        .await;
        assert!(pending.is_err());
        assert_eq!(pipeline.state(), CaptureState::Recognizing);

        let camera = FakeCamera::shots(&["b.jpg"]);
        let busy = pipeline.attempt(&camera, &StaticPermission(true)).await;
        assert!(matches!(busy, Err(CaptureError::Busy(_))));
        assert_eq!(camera.calls.get(), 0);

        pipeline.reset();
        assert_eq!(pipeline.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_new_attempt_allowed_after_complete() {
        let recognizer = FakeRecognizer::new(vec![Ok(SCENARIO_A), Ok(SCENARIO_A)]);
        let mut pipeline = pipeline(&recognizer);

        let first = pipeline.process_capture(ImageHandle::new("a.jpg")).await.unwrap();
        let second = pipeline.process_capture(ImageHandle::new("b.jpg")).await.unwrap();

        assert!(first.is_complete());
        assert!(second.is_complete());
        assert_eq!(recognizer.calls.get(), 2);
    }

    #[tokio::test]
    async fn test_for_cccd_uses_config_locale() {
        let recognizer = FakeRecognizer::new(vec![Ok("Name JOHN DOE")]);
        let config = ExtractionConfig {
            locale: Locale::En,
            extract_expiry: false,
        };
        let mut pipeline = CapturePipeline::for_cccd(&recognizer, &config);

        let outcome = pipeline.process_capture(ImageHandle::new("a.jpg")).await.unwrap();

        let CaptureOutcome::Incomplete { missing_labels } = outcome else {
            panic!("expected incomplete outcome");
        };
        assert_eq!(missing_labels[0], "ID number");
        assert!(!missing_labels.contains(&"Full name".to_string()));
    }

    #[tokio::test]
    async fn test_messages_follow_extractor_locale() {
        let recognizer = FakeRecognizer::new(vec![Ok(NO_BIRTH_DATE)]);
        let mut pipeline =
            CapturePipeline::new(&recognizer, CccdExtractor::new().with_locale(Locale::En));
        assert_eq!(pipeline.locale(), Locale::En);

        let outcome = pipeline.process_capture(ImageHandle::new("a.jpg")).await.unwrap();

        assert_eq!(
            outcome,
            CaptureOutcome::Incomplete {
                missing_labels: vec!["Date of birth".to_string()]
            }
        );
        let message = outcome.user_message(pipeline.locale()).unwrap();
        assert!(message.contains("Date of birth"), "{}", message);
        assert!(message.starts_with("Could not read"), "{}", message);
    }
}
