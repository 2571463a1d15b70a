//! Process bootstrap (out of scope per spec §1, wired up here only far
//! enough to exercise the core): argument parsing for the `-g` flag,
//! `tracing-subscriber` logging init, and construction of a `Controller`
//! backed by stub external collaborators until the real transport/backend
//! crates are wired in.

use netctrl_core::backend::{BackendError, BackendReply, ControllerBackend, SubscriptionHandle};
use netctrl_core::domain::{DeviceName, TransportKind};
use netctrl_core::transport::{DeviceTransport, EstablishedTransport, TransportError};
use netctrl_core::{cli, Controller};
use std::rc::Rc;

/// Placeholder backend until the real IPC client is wired in. Every call
/// reports "no data" rather than panicking, so the CLI loop stays usable
/// for grammar-resolution testing without a live device fleet.
struct StubBackend;

#[async_trait::async_trait]
impl ControllerBackend for StubBackend {
    async fn get_config(&self, _xpath: &str) -> Result<BackendReply, BackendError> {
        Ok(BackendReply::default())
    }

    async fn get(&self, _xpath: &str) -> Result<BackendReply, BackendError> {
        Ok(BackendReply::default())
    }

    async fn create_subscription(&self, name: &str) -> Result<SubscriptionHandle, BackendError> {
        let handle = SubscriptionHandle::new();
        tracing::info!(subscription = name, %handle, "opened stub subscription");
        Ok(handle)
    }

    async fn close_transaction_feed(&self, handle: SubscriptionHandle) -> Result<(), BackendError> {
        tracing::info!(%handle, "closed stub subscription");
        Ok(())
    }
}

struct StubTransport;

#[async_trait::async_trait]
impl DeviceTransport for StubTransport {
    async fn connect(
        &self,
        device: &DeviceName,
        _kind: TransportKind,
    ) -> Result<EstablishedTransport, TransportError> {
        Err(TransportError::ConnectFailed(
            device.clone(),
            "no transport backend configured".to_string(),
        ))
    }

    async fn disconnect(&self, _device: &DeviceName) -> Result<(), TransportError> {
        Ok(())
    }
}

fn eager_grammar_requested() -> bool {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--" {
            return args.any(|rest| rest == "-g");
        }
    }
    false
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let backend: Rc<dyn ControllerBackend> = Rc::new(StubBackend);
    let transport: Rc<dyn DeviceTransport> = Rc::new(StubTransport);

    let mut controller = Controller::builder()
        .backend(backend.clone())
        .transport(transport)
        .eager_grammar(eager_grammar_requested())
        .build();

    match backend.open_transaction_feed().await {
        Ok(handle) => tracing::info!(%handle, "controller-transaction feed open"),
        Err(err) => {
            tracing::error!(error = %err, "failed to open controller-transaction subscription");
            std::process::exit(1);
        }
    }

    cli::run(&mut controller).await
}
