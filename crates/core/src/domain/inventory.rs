use std::fmt;

use serde::{Deserialize, Serialize};

/// Store-assigned row id. Positive, monotonic, never reused within a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: ItemId,
    pub name: String,
    pub quantity: i64,
}

impl InventoryRecord {
    pub fn listing_line(&self) -> String {
        format!("ID: {}, Name: {}, Quantity: {}", self.id, self.name, self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::{InventoryRecord, ItemId};

    #[test]
    fn listing_line_matches_console_format() {
        let record = InventoryRecord { id: ItemId(3), name: "Bolt".to_string(), quantity: -2 };
        assert_eq!(record.listing_line(), "ID: 3, Name: Bolt, Quantity: -2");
    }

    #[test]
    fn item_id_serializes_as_bare_integer() {
        let encoded = serde_json::to_string(&ItemId(7)).expect("serialize");
        assert_eq!(encoded, "7");
    }
}
