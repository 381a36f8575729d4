//! Free-function form of the bundle codec, mirroring the collaborator
//! contract in `spec.md` §6 (`id/signer/verify_item/sign_item/normalize/
//! member/print`). The core device talks to items through these rather than
//! calling inherent methods directly, so swapping in a different codec
//! backend later only touches this module.

use poda_wallet::{Address, Wallet};

use crate::item::{IdKind, Item};

pub fn id(item: &Item, kind: IdKind) -> [u8; 32] {
    item.id(kind)
}

pub fn signer(item: &Item) -> Option<Address> {
    item.signer()
}

pub fn verify_item(item: &Item) -> bool {
    item.verify_item()
}

pub fn sign_item(item: &mut Item, wallet: &Wallet) {
    item.sign_item(wallet);
}

pub fn normalize(item: &Item) -> Item {
    item.normalize()
}

pub fn member(id: &[u8; 32], item: &Item) -> bool {
    item.member(id)
}

pub fn print(item: &Item) -> String {
    format!("{item:#?}")
}
