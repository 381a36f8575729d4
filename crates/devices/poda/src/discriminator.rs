use poda_bundle::{Item, tags};

/// Classifies an item as user-originated (`true`, no attestations required)
/// or process-originated (`false`, the Verifier must run), per `spec.md`
/// §4.2.
///
/// Any shape other than "a mapping wrapping a `Message`" is treated as
/// user-signed: this discriminator fails open, leaving well-formed process
/// messages to the Verifier as the actual enforcer.
pub fn is_user_signed(item: &Item) -> bool {
    let Some(map) = item.data.as_map() else {
        return true;
    };
    let Some(message) = map.get("Message") else {
        return true;
    };
    message.tag(tags::FROM_PROCESS).is_none()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use poda_bundle::ItemData;

    use super::*;

    #[test]
    fn raw_item_is_user_signed() {
        let item = Item::new(ItemData::Bytes(b"hello".to_vec()));
        assert!(is_user_signed(&item));
    }

    #[test]
    fn wrapped_message_without_from_process_is_user_signed() {
        let message = Item::new(ItemData::Bytes(b"hello".to_vec()));
        let mut map = BTreeMap::new();
        map.insert("Message".to_string(), message);
        let outer = Item::new(ItemData::Map(map));

        assert!(is_user_signed(&outer));
    }

    #[test]
    fn wrapped_message_with_from_process_is_not_user_signed() {
        let message = Item::new(ItemData::Bytes(b"hello".to_vec()))
            .with_tag(tags::FROM_PROCESS, "some-process-id");
        let mut map = BTreeMap::new();
        map.insert("Message".to_string(), message);
        let outer = Item::new(ItemData::Map(map));

        assert!(!is_user_signed(&outer));
    }
}
