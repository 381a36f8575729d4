//! The PoDA device: a Proof-of-Authority quorum gate sitting in front of
//! process message execution, `spec.md` §§4, 6.
//!
//! The four collaborator modules map straight onto spec sections:
//! [`options`] (§4.1 Options Parser), [`discriminator`] (§4.2), [`verifier`]
//! (§4.3 three-stage Verifier), [`gate`] (§4.4–§4.5 Pre-Execution Gate) and
//! [`aggregator`] (§4.6–§4.7 Attestation Aggregator). [`Device`] wires them
//! together behind the trait a host dispatches against.

pub mod aggregator;
pub mod discriminator;
pub mod errors;
pub mod gate;
pub mod options;
pub mod verifier;

pub use aggregator::PeerTransport;
pub use errors::{OptionsError, VerifyError};
pub use gate::Outcome;
pub use options::DeviceOptions;

use async_trait::async_trait;
use poda_bundle::Item;
use poda_exec_state::{ExecState, Pass};
use poda_executor::PodaExecutor;
use poda_wallet::Wallet;

/// The interface a host dispatches `ao`-style device calls against,
/// `spec.md` §6. `PodaDevice` is this device's implementation.
///
/// Per §6, `init` is the host's job to call once — against the tags of the
/// process it is hosting, at process boot — and the resulting
/// `DeviceOptions` is threaded into every later `execute` call. `execute`
/// itself never re-derives options from a cache lookup keyed off the
/// inbound message: that lookup (`find_process`, §4.7) belongs to the
/// Aggregator's push path, not the gate.
#[async_trait]
pub trait Device {
    /// Resolves a process's declared tags into `DeviceOptions`. Errors here
    /// are fatal and propagate straight to the host — unlike a failed
    /// [`VerifyError`], a malformed `Options` tag set is not something a
    /// single message can be skipped past.
    fn init(&self, process: &Item, wallet: &Wallet) -> Result<DeviceOptions, OptionsError>;

    /// Runs the device for whatever pass `state.pass` names, against the
    /// `DeviceOptions` the host obtained from [`Device::init`]. Only
    /// `Pass::PreExecution` (the gate) and `Pass::PostResults` (the
    /// aggregator) do anything; every other pass is a no-op passthrough.
    async fn execute(
        &self,
        outer: &Item,
        state: ExecState,
        options: &DeviceOptions,
    ) -> (Outcome, ExecState);

    /// Runs the Attestation Aggregator directly, bypassing the pass
    /// dispatch in [`Device::execute`]. Exposed separately because a host
    /// may invoke push outside the normal pass sequence.
    async fn push(&self, item: &Item, state: ExecState) -> ExecState;

    fn is_user_signed(&self, item: &Item) -> bool;
}

/// The concrete PoDA device. Owns the executor and peer transport the
/// aggregator needs; the rest of its collaborators are free functions.
pub struct PodaDevice {
    executor: PodaExecutor,
    transport: PeerTransport,
}

impl PodaDevice {
    pub fn new(executor: PodaExecutor, transport: PeerTransport) -> Self {
        Self { executor, transport }
    }
}

#[async_trait]
impl Device for PodaDevice {
    fn init(&self, process: &Item, wallet: &Wallet) -> Result<DeviceOptions, OptionsError> {
        options::parse_options(&process.tags, wallet)
    }

    async fn execute(
        &self,
        outer: &Item,
        state: ExecState,
        options: &DeviceOptions,
    ) -> (Outcome, ExecState) {
        match state.pass {
            Pass::PreExecution => gate::run(outer, state, options),
            Pass::PostResults => {
                let state = self.push(outer, state).await;
                (Outcome::Ok, state)
            }
            Pass::Other(_) => (Outcome::Ok, state),
        }
    }

    async fn push(&self, item: &Item, state: ExecState) -> ExecState {
        aggregator::push(item, state, &self.executor, &self.transport).await
    }

    fn is_user_signed(&self, item: &Item) -> bool {
        discriminator::is_user_signed(item)
    }
}
