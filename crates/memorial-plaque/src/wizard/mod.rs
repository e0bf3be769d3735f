//! The three-step order wizard.
//!
//! An [`OrderWizard`] walks a customer through material and design, memorial
//! details, and checkout. Forward navigation is gated by pure completeness
//! predicates over the [`OrderDraft`]; a blocked advance is reported as a
//! [`Transition`], not an error.
//!
//! Entering the memorial-details step, or editing the name while on it,
//! starts QR generation for the memorial page in the background. At most one
//! generation runs per wizard; a trigger while one is outstanding does
//! nothing. Finished results are merged with [`OrderWizard::poll_qr`] or
//! [`OrderWizard::settle_qr`].

mod draft;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::catalog::{price_of, MaterialType, SizeId};
use crate::error::{Error, Result};
use crate::preview::{self, PlaquePreview, PreviewInput};
use crate::qr::{MemorialQr, Palette, QrGenerator};

pub use draft::{
    apply_patch, DraftPatch, OrderDraft, PlaqueColor, Privacy, Shape, NAME_PLACEHOLDER,
    WORDS_PLACEHOLDER,
};

/// A wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Material, size, shape, colors and font.
    MaterialAndDesign = 1,
    /// Name, dates, memorial words and privacy.
    MemorialDetails = 2,
    /// Review and payment.
    PaymentAndCheckout = 3,
}

impl Step {
    /// One-based step number.
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Display title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::MaterialAndDesign => "Material & Design",
            Self::MemorialDetails => "Memorial Details",
            Self::PaymentAndCheckout => "Payment & Checkout",
        }
    }

    const fn next(self) -> Option<Self> {
        match self {
            Self::MaterialAndDesign => Some(Self::MemorialDetails),
            Self::MemorialDetails => Some(Self::PaymentAndCheckout),
            Self::PaymentAndCheckout => None,
        }
    }

    const fn previous(self) -> Option<Self> {
        match self {
            Self::MaterialAndDesign => None,
            Self::MemorialDetails => Some(Self::MaterialAndDesign),
            Self::PaymentAndCheckout => Some(Self::MemorialDetails),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.title())
    }
}

/// Fields `draft` still needs before leaving `step`, in form order.
#[must_use]
pub fn missing_fields(draft: &OrderDraft, step: Step) -> Vec<&'static str> {
    let checks = match step {
        Step::MaterialAndDesign => vec![
            ("material", draft.material().is_some()),
            ("size", draft.size().is_some()),
            ("qr_color", draft.qr_color().is_some()),
            ("text_color", draft.text_color().is_some()),
        ],
        Step::MemorialDetails => vec![
            ("full_name", draft.full_name().is_some()),
            ("few_words", draft.few_words().is_some()),
        ],
        Step::PaymentAndCheckout => Vec::new(),
    };
    checks
        .into_iter()
        .filter(|(_, present)| !present)
        .map(|(field, _)| field)
        .collect()
}

/// Whether `draft` is complete enough to leave `step`.
#[must_use]
pub fn can_advance(draft: &OrderDraft, step: Step) -> bool {
    missing_fields(draft, step).is_empty()
}

/// Outcome of [`OrderWizard::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Moved forward to the given step.
    Advanced(Step),
    /// The current step is incomplete.
    Blocked {
        /// Fields still required.
        missing: Vec<&'static str>,
    },
    /// The final step was completed and the draft handed off.
    Completed,
}

type CompletionCallback = Box<dyn FnMut(&OrderDraft) + Send>;

/// Clears the in-flight flag when the generation task ends, even by panic.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// An order being configured by one customer.
pub struct OrderWizard {
    step: Step,
    draft: OrderDraft,
    generator: QrGenerator,
    qr: Option<MemorialQr>,
    last_qr_error: Option<String>,
    in_flight: Arc<AtomicBool>,
    pending: Option<oneshot::Receiver<Result<MemorialQr>>>,
    on_complete: Option<CompletionCallback>,
}

impl fmt::Debug for OrderWizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderWizard")
            .field("step", &self.step)
            .field("draft", &self.draft)
            .field("qr_slug", &self.qr.as_ref().map(|qr| &qr.slug))
            .field("generating_qr", &self.is_generating_qr())
            .field("last_qr_error", &self.last_qr_error)
            .finish_non_exhaustive()
    }
}

impl OrderWizard {
    /// A wizard on the first step with an empty draft.
    #[must_use]
    pub fn new(generator: QrGenerator) -> Self {
        Self {
            step: Step::MaterialAndDesign,
            draft: OrderDraft::new(),
            generator,
            qr: None,
            last_qr_error: None,
            in_flight: Arc::new(AtomicBool::new(false)),
            pending: None,
            on_complete: None,
        }
    }

    /// Register the hand-off invoked when the last step completes.
    pub fn on_complete(&mut self, callback: impl FnMut(&OrderDraft) + Send + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Current step.
    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    /// Current draft.
    #[must_use]
    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    /// The QR code for the draft's current name, if one has been merged.
    #[must_use]
    pub fn qr(&self) -> Option<&MemorialQr> {
        let slug = self.draft.slug()?;
        self.qr.as_ref().filter(|qr| qr.slug == slug)
    }

    /// Whether a QR generation is running.
    #[must_use]
    pub fn is_generating_qr(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Message of the most recent failed generation, cleared on success.
    #[must_use]
    pub fn last_qr_error(&self) -> Option<&str> {
        self.last_qr_error.as_deref()
    }

    /// Fields the current step still needs.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        missing_fields(&self.draft, self.step)
    }

    /// Whether the current step is complete.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        can_advance(&self.draft, self.step)
    }

    /// Merge `patch` into the draft.
    ///
    /// A name edit on the memorial-details step drops any QR code made for
    /// the previous name and starts generation for the new one.
    pub fn update(&mut self, patch: &DraftPatch) {
        self.draft = apply_patch(&self.draft, patch);

        if patch.touches_name() && self.step == Step::MemorialDetails {
            let slug = self.draft.slug();
            if self.qr.as_ref().is_some_and(|qr| Some(&qr.slug) != slug.as_ref()) {
                debug!("Discarding QR code for previous name");
                self.qr = None;
            }
            self.trigger_qr_generation();
        }
    }

    /// Try to move to the next step.
    ///
    /// On the last step this invokes the completion callback with the draft.
    pub fn advance(&mut self) -> Transition {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            debug!(step = %self.step, ?missing, "Advance blocked");
            return Transition::Blocked { missing };
        }

        let Some(next) = self.step.next() else {
            info!("Order wizard completed");
            if let Some(callback) = self.on_complete.as_mut() {
                callback(&self.draft);
            }
            return Transition::Completed;
        };

        self.step = next;
        debug!(step = %next, "Advanced");
        if next == Step::MemorialDetails {
            self.trigger_qr_generation();
        }
        Transition::Advanced(next)
    }

    /// Go back one step, keeping everything entered so far.
    pub fn back(&mut self) -> Step {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Start over with an empty draft.
    ///
    /// A running generation finishes on its own; its result is ignored.
    pub fn restart(&mut self) {
        self.step = Step::MaterialAndDesign;
        self.draft = OrderDraft::new();
        self.qr = None;
        self.last_qr_error = None;
        self.pending = None;
        self.in_flight = Arc::new(AtomicBool::new(false));
        debug!("Order wizard restarted");
    }

    /// Price `quantity` plaques of the current design, zero while incomplete.
    #[must_use]
    pub fn quote(&self, quantity: u32) -> Decimal {
        let material = self.draft.material().map_or("", MaterialType::as_str);
        let size = self.draft.size().map_or("", SizeId::as_str);
        price_of(material, size, quantity)
    }

    /// Render the current draft.
    #[must_use]
    pub fn preview(&self) -> PlaquePreview {
        let qr_svg = self.qr().map(|qr| qr.image.svg.as_str());
        preview::render(&PreviewInput::from_draft(&self.draft, qr_svg))
    }

    /// Start QR generation for the current name if needed.
    ///
    /// Does nothing when there is no usable name, when a code for the
    /// current name is already held, or when a generation is already
    /// running. Returns whether a generation was started.
    pub fn trigger_qr_generation(&mut self) -> bool {
        if let Some(result) = self.take_finished() {
            // Failures are recorded in `last_qr_error`.
            let _ = self.merge(result);
        }

        let Some(slug) = self.draft.slug() else {
            debug!("No slug for QR generation");
            return false;
        };
        if self.qr().is_some() {
            return false;
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!(%slug, "QR generation already in flight");
            return false;
        }
        let Ok(handle) = Handle::try_current() else {
            self.in_flight.store(false, Ordering::SeqCst);
            warn!(%slug, "No Tokio runtime, skipping QR generation");
            return false;
        };

        let palette = self
            .draft
            .qr_color()
            .map_or_else(Palette::default, Palette::for_engraving);
        let generator = self.generator.clone();
        let guard = InFlight(Arc::clone(&self.in_flight));
        let (tx, rx) = oneshot::channel();

        debug!(%slug, "Starting QR generation");
        handle.spawn(async move {
            let result = generator.generate_for_slug(&slug, palette).await;
            drop(guard);
            let _ = tx.send(result);
        });
        self.pending = Some(rx);
        true
    }

    /// Merge a finished generation without waiting.
    ///
    /// # Errors
    ///
    /// Returns the generation error if the finished generation failed.
    pub fn poll_qr(&mut self) -> Result<Option<&MemorialQr>> {
        if let Some(result) = self.take_finished() {
            self.merge(result)?;
        }
        Ok(self.qr())
    }

    /// Wait for outstanding generations and merge their results.
    ///
    /// # Errors
    ///
    /// Returns the generation error if a generation failed.
    pub async fn settle_qr(&mut self) -> Result<Option<&MemorialQr>> {
        while let Some(rx) = self.pending.take() {
            let result = rx.await.unwrap_or_else(|_| Err(task_lost()));
            self.merge(result)?;
        }
        Ok(self.qr())
    }

    fn take_finished(&mut self) -> Option<Result<MemorialQr>> {
        let rx = self.pending.as_mut()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(task_lost()),
        };
        self.pending = None;
        Some(result)
    }

    fn merge(&mut self, result: Result<MemorialQr>) -> Result<()> {
        match result {
            Ok(qr) => {
                self.last_qr_error = None;
                let stale = self.draft.slug().as_deref() != Some(qr.slug.as_str());
                self.qr = Some(qr);
                if stale && self.step == Step::MemorialDetails {
                    debug!("Name changed during QR generation, regenerating");
                    self.trigger_qr_generation();
                }
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "QR generation failed");
                self.last_qr_error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

fn task_lost() -> Error {
    Error::qr_generation("generation task ended without a result")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::qr::{QrEncoder, QrImage, QrOptions};

    /// Counts encodes and holds each one until released.
    #[derive(Debug, Default)]
    struct GatedEncoder {
        calls: AtomicUsize,
        gate: Notify,
        fail: AtomicBool,
    }

    impl GatedEncoder {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn release(&self) {
            self.gate.notify_one();
        }
    }

    #[async_trait]
    impl QrEncoder for GatedEncoder {
        async fn encode(&self, text: &str, _options: &QrOptions) -> Result<QrImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::qr_generation("data too long"));
            }
            Ok(QrImage {
                svg: format!("<svg>{text}</svg>"),
                png: "data:image/png;base64,".to_string(),
            })
        }
    }

    fn wizard_with(encoder: &Arc<GatedEncoder>) -> OrderWizard {
        let generator = QrGenerator::with_encoder(encoder.clone(), "https://plaques.example");
        OrderWizard::new(generator)
    }

    fn design() -> DraftPatch {
        DraftPatch {
            material: Some(MaterialType::Brass),
            size: Some(SizeId::QrName),
            qr_color: Some(PlaqueColor::Black),
            text_color: Some(PlaqueColor::Gold),
            ..DraftPatch::default()
        }
    }

    fn name(full_name: &str) -> DraftPatch {
        DraftPatch {
            full_name: Some(full_name.to_string()),
            ..DraftPatch::default()
        }
    }

    #[test]
    fn test_step_one_guard_covers_every_combination() {
        for mask in 0u8..16 {
            let patch = DraftPatch {
                material: (mask & 1 != 0).then_some(MaterialType::Steel),
                size: (mask & 2 != 0).then_some(SizeId::QrOnly),
                qr_color: (mask & 4 != 0).then_some(PlaqueColor::Silver),
                text_color: (mask & 8 != 0).then_some(PlaqueColor::White),
                ..DraftPatch::default()
            };
            let draft = OrderDraft::new().patched(&patch);
            assert_eq!(
                can_advance(&draft, Step::MaterialAndDesign),
                mask == 15,
                "mask {mask:04b}"
            );
            assert_eq!(
                missing_fields(&draft, Step::MaterialAndDesign).len(),
                4 - mask.count_ones() as usize
            );
        }
    }

    #[test]
    fn test_step_two_guard() {
        let draft = OrderDraft::new();
        assert_eq!(
            missing_fields(&draft, Step::MemorialDetails),
            vec!["full_name", "few_words"]
        );

        let draft = draft.patched(&name("Ada Lovelace"));
        assert!(!can_advance(&draft, Step::MemorialDetails));

        let draft = draft.patched(&DraftPatch {
            few_words: Some("Poet of numbers".to_string()),
            ..DraftPatch::default()
        });
        assert!(can_advance(&draft, Step::MemorialDetails));
        assert!(can_advance(&OrderDraft::new(), Step::PaymentAndCheckout));
    }

    #[test]
    fn test_blocked_advance_is_a_state() {
        let mut wizard = OrderWizard::new(QrGenerator::new("https://plaques.example"));
        let transition = wizard.advance();
        assert_eq!(
            transition,
            Transition::Blocked {
                missing: vec!["material", "size", "qr_color", "text_color"]
            }
        );
        assert_eq!(wizard.step(), Step::MaterialAndDesign);
    }

    #[test]
    fn test_advance_without_runtime_skips_generation() {
        let mut wizard = OrderWizard::new(QrGenerator::new("https://plaques.example"));
        wizard.update(&design());
        wizard.update(&name("Ada"));

        assert_eq!(wizard.advance(), Transition::Advanced(Step::MemorialDetails));
        assert!(!wizard.is_generating_qr());
        assert!(wizard.qr().is_none());
    }

    #[test]
    fn test_back_preserves_data() {
        let mut wizard = OrderWizard::new(QrGenerator::new("https://plaques.example"));
        wizard.update(&design());
        wizard.advance();
        wizard.update(&name("Grace Hopper"));

        assert_eq!(wizard.back(), Step::MaterialAndDesign);
        assert_eq!(wizard.back(), Step::MaterialAndDesign);
        assert_eq!(wizard.draft().material(), Some(MaterialType::Brass));
        assert_eq!(wizard.draft().full_name(), Some("Grace Hopper"));
    }

    #[tokio::test]
    async fn test_double_trigger_encodes_once() {
        let encoder = Arc::new(GatedEncoder::default());
        let mut wizard = wizard_with(&encoder);
        wizard.update(&design());
        wizard.update(&name("Ada Lovelace"));

        assert_eq!(wizard.advance(), Transition::Advanced(Step::MemorialDetails));
        assert!(wizard.is_generating_qr());
        assert!(!wizard.trigger_qr_generation());
        tokio::task::yield_now().await;

        encoder.release();
        let qr = wizard.settle_qr().await.unwrap().unwrap();
        assert_eq!(qr.slug, "ada-lovelace");
        assert_eq!(qr.url, "https://plaques.example/memorial/ada-lovelace");
        assert_eq!(encoder.calls(), 1);
        assert!(!wizard.is_generating_qr());

        // A code for the current name is cached.
        assert!(!wizard.trigger_qr_generation());
        assert_eq!(encoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_name_change_regenerates() {
        let encoder = Arc::new(GatedEncoder::default());
        let mut wizard = wizard_with(&encoder);
        wizard.update(&design());
        wizard.update(&name("Ada"));
        wizard.advance();
        encoder.release();
        wizard.settle_qr().await.unwrap();
        assert_eq!(wizard.qr().map(|qr| qr.slug.as_str()), Some("ada"));

        wizard.update(&name("Ada King"));
        assert!(wizard.qr().is_none());
        assert!(wizard.is_generating_qr());

        encoder.release();
        let qr = wizard.settle_qr().await.unwrap().unwrap();
        assert_eq!(qr.slug, "ada-king");
        assert_eq!(encoder.calls(), 2);
    }

    #[tokio::test]
    async fn test_name_edit_on_step_one_does_not_generate() {
        let encoder = Arc::new(GatedEncoder::default());
        let mut wizard = wizard_with(&encoder);
        wizard.update(&name("Ada"));

        assert!(!wizard.is_generating_qr());
        assert_eq!(encoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_leaves_qr_unset_and_retries() {
        let encoder = Arc::new(GatedEncoder::default());
        encoder.fail.store(true, Ordering::SeqCst);
        let mut wizard = wizard_with(&encoder);
        wizard.update(&design());
        wizard.update(&name("Ada"));
        wizard.advance();

        encoder.release();
        let err = wizard.settle_qr().await.unwrap_err();
        assert!(err.is_qr_generation());
        assert!(wizard.qr().is_none());
        assert!(!wizard.is_generating_qr());
        assert!(wizard.last_qr_error().is_some());

        encoder.fail.store(false, Ordering::SeqCst);
        assert!(wizard.trigger_qr_generation());
        encoder.release();
        assert!(wizard.settle_qr().await.unwrap().is_some());
        assert!(wizard.last_qr_error().is_none());
        assert_eq!(encoder.calls(), 2);
    }

    #[tokio::test]
    async fn test_poll_does_not_wait() {
        let encoder = Arc::new(GatedEncoder::default());
        let mut wizard = wizard_with(&encoder);
        wizard.update(&design());
        wizard.update(&name("Ada"));
        wizard.advance();

        assert!(wizard.poll_qr().unwrap().is_none());
        assert!(wizard.is_generating_qr());

        encoder.release();
        wizard.settle_qr().await.unwrap();
        assert!(wizard.poll_qr().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_restart_discards_pending_generation() {
        let encoder = Arc::new(GatedEncoder::default());
        let mut wizard = wizard_with(&encoder);
        wizard.update(&design());
        wizard.update(&name("Ada"));
        wizard.advance();
        assert!(wizard.is_generating_qr());

        wizard.restart();
        assert_eq!(wizard.step(), Step::MaterialAndDesign);
        assert_eq!(wizard.draft(), &OrderDraft::new());
        assert!(!wizard.is_generating_qr());

        encoder.release();
        assert!(wizard.settle_qr().await.unwrap().is_none());
    }

    #[test]
    fn test_completion_hands_off_draft() {
        let completed = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&completed);
        let mut wizard = OrderWizard::new(QrGenerator::new("https://plaques.example"));
        wizard.on_complete(move |draft| {
            *sink.lock().unwrap() = Some(draft.clone());
        });

        wizard.update(&design());
        wizard.advance();
        wizard.update(&name("Ada"));
        wizard.update(&DraftPatch {
            few_words: Some("Remembered".to_string()),
            ..DraftPatch::default()
        });
        assert_eq!(wizard.advance(), Transition::Advanced(Step::PaymentAndCheckout));
        assert_eq!(wizard.advance(), Transition::Completed);

        let draft = completed.lock().unwrap().clone().unwrap();
        assert_eq!(draft.full_name(), Some("Ada"));
        assert_eq!(draft.few_words(), Some("Remembered"));
    }

    #[test]
    fn test_quote_follows_draft() {
        let mut wizard = OrderWizard::new(QrGenerator::new("https://plaques.example"));
        assert_eq!(wizard.quote(1), Decimal::ZERO);

        wizard.update(&design());
        assert_eq!(wizard.quote(2), "199.98".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_step_display() {
        assert_eq!(Step::MemorialDetails.to_string(), "2. Memorial Details");
        assert_eq!(Step::PaymentAndCheckout.number(), 3);
    }
}
