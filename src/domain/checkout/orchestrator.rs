//! Checkout state machine:
//! `Idle -> WidgetLoading -> WidgetOpen -> TokenReceived -> Processing -> Succeeded | Failed`.
//!
//! Each pay press gets its own one-shot completion and an immutable snapshot of the form. The
//! widget result can only reach the attempt it was opened for, and the charge is built from that
//! snapshot.

use std::{fmt, sync::Arc, time::Duration};

use tokio::sync::oneshot;
use tracing::{error, info, instrument, warn};

use crate::{
    domain::{
        catalog::Product,
        notifier::SharedNotifier,
        payments::ProcessPaymentRequest,
        validation::is_valid_email,
    },
    infra::{CheckoutSettings, PaymentSettings},
};

use super::{
    CheckoutAttempt, CheckoutError, PaymentWidget, SharedChargeClient, WidgetCompletion,
    WidgetConfig, WidgetResult,
};

const EMAIL_REQUIRED: &str = "Por favor ingresa tu email";
const EMAIL_INVALID: &str = "Por favor ingresa un email válido";
const WIDGET_UNAVAILABLE: &str = "Error al cargar Culqi. Por favor recarga la página.";
const PAYMENT_FAILED: &str = "Error al procesar el pago. Por favor, intenta nuevamente.";
const PAYMENT_TIMED_OUT: &str = "El pago está tardando demasiado. Por favor, intenta nuevamente.";
const PAYMENT_SUCCEEDED: &str = "¡Pago procesado exitosamente!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    WidgetLoading,
    WidgetOpen,
    TokenReceived,
    Processing,
    Succeeded,
    Failed { reason: String },
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckoutState::Idle => write!(f, "idle"),
            CheckoutState::WidgetLoading => write!(f, "loading the widget"),
            CheckoutState::WidgetOpen => write!(f, "the widget is open"),
            CheckoutState::TokenReceived => write!(f, "a token was received"),
            CheckoutState::Processing => write!(f, "processing"),
            CheckoutState::Succeeded => write!(f, "succeeded"),
            CheckoutState::Failed { .. } => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Succeeded { sale_id: Option<String>, charge_id: Option<String> },
    Failed { reason: String },
    /// The buyer closed the widget without paying.
    Dismissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutOptions {
    /// Upper bound on the charge call.
    pub charge_timeout: Duration,
    /// How long the success acknowledgment shows before the caller is signalled.
    pub success_display: Duration,
}

impl From<&CheckoutSettings> for CheckoutOptions {
    fn from(settings: &CheckoutSettings) -> Self {
        Self {
            charge_timeout: Duration::from_secs(settings.charge_timeout_secs),
            success_display: Duration::from_millis(settings.success_display_ms),
        }
    }
}

struct PendingAttempt {
    attempt: CheckoutAttempt,
    result: oneshot::Receiver<WidgetResult>,
}

pub struct CheckoutOrchestrator {
    product: Product,
    payments: PaymentSettings,
    options: CheckoutOptions,
    widget: Arc<dyn PaymentWidget>,
    charges: SharedChargeClient,
    notifier: SharedNotifier,
    state: CheckoutState,
    widget_ready: bool,
    pending: Option<PendingAttempt>,
}

impl CheckoutOrchestrator {
    pub fn new(
        product: Product,
        payments: PaymentSettings,
        options: CheckoutOptions,
        widget: Arc<dyn PaymentWidget>,
        charges: SharedChargeClient,
        notifier: SharedNotifier,
    ) -> Self {
        Self {
            product,
            payments,
            options,
            widget,
            charges,
            notifier,
            state: CheckoutState::Idle,
            widget_ready: false,
            pending: None,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Opens the payment modal: configures and loads the widget.
    #[instrument(skip(self), fields(product_id = %self.product.id))]
    pub async fn start(&mut self) -> Result<(), CheckoutError> {
        let can_start = matches!(self.state, CheckoutState::Idle | CheckoutState::Failed { .. });
        if !can_start || self.widget_ready {
            let state = self.state.to_string();
            return Err(CheckoutError::InvalidTransition("load the widget", state));
        }
        self.state = CheckoutState::WidgetLoading;

        let config = match WidgetConfig::for_product(&self.payments, &self.product) {
            Ok(config) => config,
            Err(e) => {
                self.fail(&e.to_string());
                return Err(e);
            }
        };
        if let Err(e) = self.widget.load(&config).await {
            error!("Payment widget failed to load: {e}");
            self.fail(WIDGET_UNAVAILABLE);
            return Err(e);
        }

        self.widget_ready = true;
        self.state = CheckoutState::WidgetOpen;
        Ok(())
    }

    /// Validates the email and opens the widget for a new attempt. An invalid email leaves the
    /// state untouched and never reaches the widget.
    #[instrument(skip(self), fields(product_id = %self.product.id))]
    pub async fn submit(&mut self, email: &str) -> Result<(), CheckoutError> {
        if self.pending.is_some() {
            return Err(CheckoutError::AttemptInProgress);
        }
        let can_submit =
            matches!(self.state, CheckoutState::WidgetOpen | CheckoutState::Failed { .. });
        if !self.widget_ready || !can_submit {
            return Err(CheckoutError::InvalidTransition("submit", self.state.to_string()));
        }

        let email = email.trim();
        if email.is_empty() {
            self.notifier.error(EMAIL_REQUIRED);
            return Err(CheckoutError::InvalidEmail(EMAIL_REQUIRED.to_owned()));
        }
        if !is_valid_email(email) {
            self.notifier.error(EMAIL_INVALID);
            return Err(CheckoutError::InvalidEmail(EMAIL_INVALID.to_owned()));
        }

        let attempt = CheckoutAttempt {
            email: email.to_owned(),
            product_id: self.product.id.clone(),
            product_title: self.product.title.clone(),
            amount: self.product.price,
        };
        let (completion, result) = WidgetCompletion::channel();
        if let Err(e) = self.widget.open(&attempt, completion).await {
            error!("Payment widget failed to open: {e}");
            self.fail(WIDGET_UNAVAILABLE);
            return Err(e);
        }

        self.pending = Some(PendingAttempt { attempt, result });
        self.state = CheckoutState::WidgetOpen;
        Ok(())
    }

    /// Waits for the widget result of the pending attempt and, given a token, makes the single
    /// charge call. `on_success` receives the token and runs at most once.
    #[instrument(skip_all, fields(product_id = %self.product.id))]
    pub async fn complete<F>(&mut self, on_success: F) -> Result<CheckoutOutcome, CheckoutError>
    where
        F: FnOnce(String) + Send,
    {
        let PendingAttempt { attempt, result } = self
            .pending
            .take()
            .ok_or_else(|| {
                CheckoutError::InvalidTransition("complete", "no attempt is pending".to_owned())
            })?;

        let token = match result.await {
            Err(_) => {
                info!("Payment widget closed without a result.");
                self.state = CheckoutState::WidgetOpen;
                return Ok(CheckoutOutcome::Dismissed);
            }
            Ok(WidgetResult::Error(message)) => {
                warn!("Payment widget reported: {message}");
                let reason =
                    if message.trim().is_empty() { PAYMENT_FAILED.to_owned() } else { message };
                return Ok(self.fail(&reason));
            }
            Ok(WidgetResult::Token(token)) => token,
        };
        self.state = CheckoutState::TokenReceived;

        let request = ProcessPaymentRequest {
            token: token.clone(),
            product_id: attempt.product_id,
            email: attempt.email,
            amount: attempt.amount,
        };
        self.state = CheckoutState::Processing;
        let response = tokio::time::timeout(
            self.options.charge_timeout,
            self.charges.process_payment(&request),
        )
        .await;

        match response {
            Err(_) => {
                error!("Charge call exceeded {:?}.", self.options.charge_timeout);
                Ok(self.fail(PAYMENT_TIMED_OUT))
            }
            Ok(Err(e)) => {
                error!("Charge call failed: {e}");
                Ok(self.fail(PAYMENT_FAILED))
            }
            Ok(Ok(body)) if !body.success => {
                let reason = body.error.filter(|e| !e.trim().is_empty());
                Ok(self.fail(reason.as_deref().unwrap_or(PAYMENT_FAILED)))
            }
            Ok(Ok(body)) => {
                self.notifier.success(PAYMENT_SUCCEEDED);
                tokio::time::sleep(self.options.success_display).await;
                on_success(token);
                self.state = CheckoutState::Succeeded;
                info!("Checkout succeeded with sale {:?}.", body.sale_id);
                Ok(CheckoutOutcome::Succeeded { sale_id: body.sale_id, charge_id: body.charge_id })
            }
        }
    }

    /// [`submit`](Self::submit) followed by [`complete`](Self::complete).
    pub async fn pay<F>(
        &mut self,
        email: &str,
        on_success: F,
    ) -> Result<CheckoutOutcome, CheckoutError>
    where
        F: FnOnce(String) + Send,
    {
        self.submit(email).await?;
        self.complete(on_success).await
    }

    /// Closes the modal. A result that arrives for the abandoned attempt goes nowhere.
    pub fn close(&mut self) {
        self.pending = None;
        self.widget_ready = false;
        self.state = CheckoutState::Idle;
    }

    fn fail(&mut self, reason: &str) -> CheckoutOutcome {
        self.notifier.error(reason);
        self.state = CheckoutState::Failed { reason: reason.to_owned() };
        CheckoutOutcome::Failed { reason: reason.to_owned() }
    }
}

//-------------------------- Tests -------------------------------

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use crate::domain::{
        checkout::ChargeClient,
        notifier::testing::RecordingNotifier,
        payments::ProcessPaymentResponse,
    };

    use super::*;

    /// What the fake widget does with the next completion it is handed.
    enum Script {
        Resolve(WidgetResult),
        Close,
        Hold,
    }

    #[derive(Default)]
    struct FakeWidget {
        scripts: Mutex<VecDeque<Script>>,
        opened: Mutex<Vec<CheckoutAttempt>>,
        held: Mutex<Option<WidgetCompletion>>,
        fail_load: bool,
    }

    impl FakeWidget {
        fn scripted(scripts: impl IntoIterator<Item = Script>) -> Self {
            Self { scripts: Mutex::new(scripts.into_iter().collect()), ..Default::default() }
        }

        fn opened(&self) -> Vec<CheckoutAttempt> {
            self.opened.lock().expect("widget lock").clone()
        }

        fn resolve_held(&self, result: WidgetResult) {
            let completion = self.held.lock().expect("widget lock").take().expect("a held completion");
            completion.resolve(result);
        }
    }

    #[async_trait]
    impl PaymentWidget for FakeWidget {
        async fn load(&self, _config: &WidgetConfig) -> Result<(), CheckoutError> {
            if self.fail_load {
                return Err(CheckoutError::Widget("script blocked".to_owned()));
            }
            Ok(())
        }

        async fn open(
            &self,
            attempt: &CheckoutAttempt,
            completion: WidgetCompletion,
        ) -> Result<(), CheckoutError> {
            self.opened.lock().expect("widget lock").push(attempt.clone());
            let script = self.scripts.lock().expect("widget lock").pop_front().unwrap_or(Script::Close);
            match script {
                Script::Resolve(result) => {
                    completion.resolve(result);
                }
                Script::Close => drop(completion),
                Script::Hold => *self.held.lock().expect("widget lock") = Some(completion),
            }
            Ok(())
        }
    }

    enum Reply {
        Respond(ProcessPaymentResponse),
        Hang,
    }

    struct FakeCharges {
        reply: Reply,
        requests: Mutex<Vec<ProcessPaymentRequest>>,
    }

    impl FakeCharges {
        fn replying(reply: Reply) -> Arc<Self> {
            Arc::new(Self { reply, requests: Mutex::default() })
        }

        fn requests(&self) -> Vec<ProcessPaymentRequest> {
            self.requests.lock().expect("charges lock").clone()
        }
    }

    #[async_trait]
    impl ChargeClient for FakeCharges {
        async fn process_payment(
            &self,
            request: &ProcessPaymentRequest,
        ) -> Result<ProcessPaymentResponse, CheckoutError> {
            self.requests.lock().expect("charges lock").push(request.clone());
            match &self.reply {
                Reply::Respond(response) => Ok(response.clone()),
                Reply::Hang => std::future::pending().await,
            }
        }
    }

    fn approved() -> Reply {
        Reply::Respond(ProcessPaymentResponse {
            success: true,
            message: Some("Pago procesado exitosamente".to_owned()),
            sale_id: Some("sale-1".to_owned()),
            charge_id: Some("chr_1".to_owned()),
            error: None,
        })
    }

    fn declined(error: Option<&str>) -> Reply {
        Reply::Respond(ProcessPaymentResponse {
            success: false,
            message: None,
            sale_id: None,
            charge_id: None,
            error: error.map(str::to_owned),
        })
    }

    fn payments(public_key: Option<&str>) -> PaymentSettings {
        PaymentSettings {
            api_base_url: "https://api.culqi.com".to_owned(),
            public_key: public_key.map(str::to_owned),
            secret_key: None,
            currency: "PEN".to_owned(),
            currency_symbol: "S/".to_owned(),
            provider: "culqi".to_owned(),
            widget_title: "CodeMarket Pro".to_owned(),
            lang: "es".to_owned(),
        }
    }

    fn product() -> Product {
        serde_json::from_value(serde_json::json!({
            "id": "lp-001", "title": "Academia Pro", "category": "escuela", "type": "landing",
            "price": 49.99, "image": "img.jpg"
        }))
        .expect("product should parse")
    }

    struct Harness {
        checkout: CheckoutOrchestrator,
        widget: Arc<FakeWidget>,
        charges: Arc<FakeCharges>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness_with(public_key: Option<&str>, widget: FakeWidget, reply: Reply, timeout: Duration) -> Harness {
        let widget = Arc::new(widget);
        let charges = FakeCharges::replying(reply);
        let notifier = Arc::new(RecordingNotifier::default());
        let options = CheckoutOptions { charge_timeout: timeout, success_display: Duration::ZERO };
        let checkout = CheckoutOrchestrator::new(
            product(),
            payments(public_key),
            options,
            widget.clone(),
            charges.clone(),
            notifier.clone(),
        );
        Harness { checkout, widget, charges, notifier }
    }

    fn harness(widget: FakeWidget, reply: Reply) -> Harness {
        harness_with(Some("pk_test"), widget, reply, Duration::from_secs(5))
    }

    fn token() -> Script {
        Script::Resolve(WidgetResult::Token("tkn_live_1".to_owned()))
    }

    #[tokio::test]
    async fn successful_charge_signals_success_once_with_the_token() {
        let mut h = harness(FakeWidget::scripted([token()]), approved());
        h.checkout.start().await.expect("widget should load");
        assert_eq!(h.checkout.state(), &CheckoutState::WidgetOpen);

        let calls = AtomicUsize::new(0);
        let mut received = None;
        let outcome = h
            .checkout
            .pay("buyer@example.com", |token| {
                calls.fetch_add(1, Ordering::SeqCst);
                received = Some(token);
            })
            .await
            .expect("checkout should run");

        assert_eq!(
            outcome,
            CheckoutOutcome::Succeeded { sale_id: Some("sale-1".to_owned()), charge_id: Some("chr_1".to_owned()) }
        );
        assert_eq!(h.checkout.state(), &CheckoutState::Succeeded);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(received.as_deref(), Some("tkn_live_1"));
        assert_eq!(h.notifier.successes(), vec![PAYMENT_SUCCEEDED.to_owned()]);
        assert!(h.notifier.errors().is_empty());

        let requests = h.charges.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].token, "tkn_live_1");
        assert_eq!(requests[0].product_id, "lp-001");
        assert_eq!(requests[0].amount, Decimal::new(4999, 2));
    }

    #[tokio::test]
    async fn declined_charge_shows_the_server_message_and_allows_a_retry() {
        let mut h = harness(FakeWidget::scripted([token(), token()]), declined(Some("Tarjeta declinada")));
        h.checkout.start().await.expect("widget should load");

        let mut successes = 0;
        let outcome = h
            .checkout
            .pay("buyer@example.com", |_| successes += 1)
            .await
            .expect("checkout should run");

        assert_eq!(outcome, CheckoutOutcome::Failed { reason: "Tarjeta declinada".to_owned() });
        assert_eq!(successes, 0);
        assert_eq!(h.notifier.errors(), vec!["Tarjeta declinada".to_owned()]);
        assert!(h.notifier.successes().is_empty());

        // The modal stays usable: a second submission opens the widget again.
        h.checkout.submit("buyer@example.com").await.expect("retry should be accepted");
        assert_eq!(h.widget.opened().len(), 2);
    }

    #[tokio::test]
    async fn failure_without_a_message_uses_the_generic_one() {
        let mut h = harness(FakeWidget::scripted([token()]), declined(None));
        h.checkout.start().await.expect("widget should load");

        let outcome = h.checkout.pay("buyer@example.com", |_| {}).await.expect("checkout should run");

        assert_eq!(outcome, CheckoutOutcome::Failed { reason: PAYMENT_FAILED.to_owned() });
    }

    #[tokio::test]
    async fn invalid_emails_never_open_the_widget_or_charge() {
        let mut h = harness(FakeWidget::scripted([token()]), approved());
        h.checkout.start().await.expect("widget should load");

        for email in ["", "   ", "buyer", "buyer@example", "buyer @example.com"] {
            let result = h.checkout.submit(email).await;
            assert!(matches!(result, Err(CheckoutError::InvalidEmail(_))), "{email:?} should be rejected");
            assert_eq!(h.checkout.state(), &CheckoutState::WidgetOpen);
        }

        assert!(h.widget.opened().is_empty());
        assert!(h.charges.requests().is_empty());
        assert_eq!(h.notifier.errors()[0], EMAIL_REQUIRED);
        assert_eq!(h.notifier.errors()[2], EMAIL_INVALID);
    }

    #[tokio::test]
    async fn missing_public_key_fails_before_the_widget_opens() {
        let mut h = harness_with(None, FakeWidget::scripted([token()]), approved(), Duration::from_secs(5));

        let result = h.checkout.start().await;

        assert!(matches!(result, Err(CheckoutError::Configuration(_))));
        assert!(matches!(h.checkout.state(), CheckoutState::Failed { .. }));
        assert_eq!(
            h.notifier.errors(),
            vec!["Error de configuración: Llave pública de Culqi no encontrada".to_owned()]
        );
        assert!(matches!(
            h.checkout.submit("buyer@example.com").await,
            Err(CheckoutError::InvalidTransition(..))
        ));
        assert!(h.widget.opened().is_empty());
    }

    #[tokio::test]
    async fn widget_load_failure_is_reported() {
        let widget = FakeWidget { fail_load: true, ..Default::default() };
        let mut h = harness(widget, approved());

        assert!(h.checkout.start().await.is_err());
        assert_eq!(h.notifier.errors(), vec![WIDGET_UNAVAILABLE.to_owned()]);
    }

    #[tokio::test]
    async fn widget_errors_fail_without_charging() {
        let script = Script::Resolve(WidgetResult::Error("Fondos insuficientes".to_owned()));
        let mut h = harness(FakeWidget::scripted([script]), approved());
        h.checkout.start().await.expect("widget should load");

        let outcome = h.checkout.pay("buyer@example.com", |_| {}).await.expect("checkout should run");

        assert_eq!(outcome, CheckoutOutcome::Failed { reason: "Fondos insuficientes".to_owned() });
        assert!(h.charges.requests().is_empty());
    }

    #[tokio::test]
    async fn closing_the_widget_returns_to_open_without_notifying() {
        let mut h = harness(FakeWidget::scripted([Script::Close]), approved());
        h.checkout.start().await.expect("widget should load");

        let outcome = h.checkout.pay("buyer@example.com", |_| {}).await.expect("checkout should run");

        assert_eq!(outcome, CheckoutOutcome::Dismissed);
        assert_eq!(h.checkout.state(), &CheckoutState::WidgetOpen);
        assert!(h.notifier.notifications().is_empty());
        assert!(h.charges.requests().is_empty());
    }

    #[tokio::test]
    async fn the_charge_uses_the_email_captured_when_the_widget_opened() {
        let mut h = harness(FakeWidget::scripted([Script::Hold]), approved());
        h.checkout.start().await.expect("widget should load");

        h.checkout.submit("first@example.com").await.expect("submit should succeed");
        // A second press while the widget is up neither reopens it nor replaces the snapshot.
        assert!(matches!(
            h.checkout.submit("second@example.com").await,
            Err(CheckoutError::AttemptInProgress)
        ));

        h.widget.resolve_held(WidgetResult::Token("tkn_held".to_owned()));
        h.checkout.complete(|_| {}).await.expect("checkout should run");

        assert_eq!(h.widget.opened().len(), 1);
        let requests = h.charges.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].email, "first@example.com");
        assert_eq!(requests[0].token, "tkn_held");
    }

    #[tokio::test]
    async fn a_hung_charge_times_out_into_failed() {
        let mut h = harness_with(
            Some("pk_test"),
            FakeWidget::scripted([token()]),
            Reply::Hang,
            Duration::from_millis(50),
        );
        h.checkout.start().await.expect("widget should load");

        let outcome = h.checkout.pay("buyer@example.com", |_| {}).await.expect("checkout should run");

        assert_eq!(outcome, CheckoutOutcome::Failed { reason: PAYMENT_TIMED_OUT.to_owned() });
        assert_eq!(h.charges.requests().len(), 1);
        assert_eq!(h.notifier.errors(), vec![PAYMENT_TIMED_OUT.to_owned()]);
    }

    #[tokio::test]
    async fn closed_modals_drop_the_pending_attempt() {
        let mut h = harness(FakeWidget::scripted([Script::Hold]), approved());
        h.checkout.start().await.expect("widget should load");
        h.checkout.submit("buyer@example.com").await.expect("submit should succeed");

        h.checkout.close();

        assert_eq!(h.checkout.state(), &CheckoutState::Idle);
        assert!(matches!(h.checkout.complete(|_| {}).await, Err(CheckoutError::InvalidTransition(..))));
    }
}
