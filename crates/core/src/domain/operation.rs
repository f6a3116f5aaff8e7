use std::fmt;

use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::inventory::ItemId;
use crate::errors::ValidationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [Self::Create, Self::Update, Self::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Required fields in canonical order.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Create => &["name", "quantity"],
            Self::Update => &["id", "name", "quantity"],
            Self::Delete => &["id"],
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool-call arguments as the model sends them. Every field may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOperationRequest {
    #[serde(default, alias = "kind")]
    pub operation: String,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub quantity: Option<i64>,
}

/// Reads integers, integral floats (`10.0`) and numeric strings (`"10"`).
/// Any other value is treated as absent so validation decides whether the
/// field was required.
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientIntegerVisitor)
}

struct LenientIntegerVisitor;

impl<'de> Visitor<'de> for LenientIntegerVisitor {
    type Value = Option<i64>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an integer, an integral number, or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(Some(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(i64::try_from(value).ok())
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(integral(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        let trimmed = value.trim();
        Ok(trimmed
            .parse::<i64>()
            .ok()
            .or_else(|| trimmed.parse::<f64>().ok().and_then(integral)))
    }

    fn visit_bool<E: de::Error>(self, _value: bool) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(None)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(None)
    }
}

fn integral(value: f64) -> Option<i64> {
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationRequest {
    Create { name: String, quantity: i64 },
    Update { id: ItemId, name: String, quantity: i64 },
    Delete { id: ItemId },
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Update { .. } => OperationKind::Update,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }
}

pub fn validate(raw: RawOperationRequest) -> Result<OperationRequest, ValidationError> {
    let kind = OperationKind::parse(&raw.operation)
        .ok_or_else(|| ValidationError::UnknownOperation(raw.operation.clone()))?;

    let name = raw.name.filter(|name| !name.trim().is_empty());
    let mut missing = Vec::new();
    for field in kind.required_fields() {
        let present = match *field {
            "id" => raw.id.is_some(),
            "name" => name.is_some(),
            _ => raw.quantity.is_some(),
        };
        if !present {
            missing.push(*field);
        }
    }
    if !missing.is_empty() {
        return Err(ValidationError::MissingField { kind, fields: missing });
    }

    // All required fields were checked above.
    let request = match (kind, raw.id, name, raw.quantity) {
        (OperationKind::Create, _, Some(name), Some(quantity)) => {
            OperationRequest::Create { name, quantity }
        }
        (OperationKind::Update, Some(id), Some(name), Some(quantity)) => {
            OperationRequest::Update { id: ItemId(id), name, quantity }
        }
        (OperationKind::Delete, Some(id), _, _) => OperationRequest::Delete { id: ItemId(id) },
        _ => {
            return Err(ValidationError::MissingField {
                kind,
                fields: kind.required_fields().to_vec(),
            })
        }
    };

    Ok(request)
}
