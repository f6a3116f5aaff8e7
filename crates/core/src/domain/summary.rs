use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    #[serde(alias = "is inventory")]
    IsInventory,
    #[serde(alias = "not inventory")]
    NotInventory,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsInventory => "is_inventory",
            Self::NotInventory => "not_inventory",
        }
    }
}

/// Structured value the model collaborator ends every run with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalSummary {
    #[serde(alias = "response_type")]
    pub classification: Classification,
    #[serde(default, alias = "inventory_data")]
    pub summary: String,
}

impl FinalSummary {
    pub fn new(classification: Classification, summary: impl Into<String>) -> Self {
        Self { classification, summary: summary.into() }
    }
}

/// Decided after the run completed; has no bearing on whether a mutation happened.
pub fn should_list_inventory(summary: &FinalSummary) -> bool {
    summary.classification == Classification::IsInventory
}

#[cfg(test)]
mod tests {
    use super::{should_list_inventory, Classification, FinalSummary};

    #[test]
    fn only_inventory_summaries_trigger_listing() {
        assert!(should_list_inventory(&FinalSummary::new(Classification::IsInventory, "ok")));
        assert!(!should_list_inventory(&FinalSummary::new(
            Classification::NotInventory,
            "the weather is sunny"
        )));
    }

    #[test]
    fn classification_does_not_sniff_summary_text() {
        let summary = FinalSummary::new(Classification::NotInventory, "this is inventory");
        assert!(!should_list_inventory(&summary));
    }

    #[test]
    fn legacy_field_names_and_spellings_are_accepted() {
        let summary: FinalSummary = serde_json::from_str(
            r#"{"response_type":"is inventory","inventory_data":"Deleted item ID 2."}"#,
        )
        .expect("legacy shape should deserialize");
        assert_eq!(summary.classification, Classification::IsInventory);
        assert_eq!(summary.summary, "Deleted item ID 2.");
    }
}
