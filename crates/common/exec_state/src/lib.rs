//! `ExecState` (`spec.md` §3 `S`): the bag of heterogeneous state the host
//! threads through every device call. This crate models only the
//! well-known slots the PoDA device reads or writes; everything else a host
//! might carry lives in `extensions`, a type-erased grab bag other devices
//! own and this one never inspects.

use std::{any::Any, collections::BTreeMap, sync::Arc};

use poda_bundle::{Item, ItemData};
use poda_storage::ProcessCache;
use poda_wallet::Wallet;

/// The numeric execution phase. Only `Pass::PreExecution` and
/// `Pass::PostResults` are meaningful to this device; every other value is a
/// passthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    PreExecution,
    PostResults,
    Other(u32),
}

impl From<u32> for Pass {
    fn from(value: u32) -> Self {
        match value {
            1 => Pass::PreExecution,
            3 => Pass::PostResults,
            other => Pass::Other(other),
        }
    }
}

/// A mapping the executing program can read. Populated by the gate at
/// `/Attestations/<EncodedSigner>`.
pub type Vfs = BTreeMap<String, Vec<u8>>;

/// An opaque extension slot owned by some other device. The core never
/// constructs or reads these; it only has to not clobber them.
pub type Extension = Arc<dyn Any + Send + Sync>;

#[derive(Clone)]
pub struct ExecState {
    pub pass: Pass,
    pub vfs: Vfs,
    pub arg_prefix: Vec<Item>,
    pub wallet: Wallet,
    pub assignment: Option<Item>,
    pub store: Arc<ProcessCache>,
    /// A mapping item: `data` is a map from virtual output path (`/Outbox`,
    /// `/Spawn`, ...) to an item whose own `data` maps sub-keys to outbound
    /// message items. The error-skip path (`spec.md` §4.5) is the one
    /// exception — it replaces a path entry wholesale with a plain signed
    /// item instead of a sub-keyed map.
    pub results: Item,
    pub extensions: BTreeMap<String, Extension>,
}

impl ExecState {
    pub fn new(wallet: Wallet, store: Arc<ProcessCache>) -> Self {
        Self {
            pass: Pass::Other(0),
            vfs: Vfs::new(),
            arg_prefix: Vec::new(),
            wallet,
            assignment: None,
            store,
            results: Item::new(ItemData::Map(BTreeMap::new())),
            extensions: BTreeMap::new(),
        }
    }

    pub fn with_pass(mut self, pass: impl Into<Pass>) -> Self {
        self.pass = pass.into();
        self
    }

    pub fn result(&self, path: &str) -> Option<&Item> {
        self.results.data.as_map().and_then(|map| map.get(path))
    }

    pub fn set_result(&mut self, path: &str, item: Item) {
        if let ItemData::Map(map) = &mut self.results.data {
            map.insert(path.to_string(), item);
        }
    }
}
