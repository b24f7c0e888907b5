use serde::{Serialize, Serializer};

/// Placeholder the card list uses for "no value".
pub const PLACEHOLDER: &str = "-";

/// A numeric card stat that may be absent on the listing (rendered as `"-"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Value(u64),
    Placeholder,
}

impl Serialize for Stat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Stat::Value(v) => serializer.serialize_u64(*v),
            Stat::Placeholder => serializer.serialize_str(PLACEHOLDER),
        }
    }
}

/// Card traits, either a list or the `"-"` placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Traits {
    List(Vec<String>),
    Placeholder,
}

impl Serialize for Traits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Traits::List(items) => items.serialize(serializer),
            Traits::Placeholder => serializer.serialize_str(PLACEHOLDER),
        }
    }
}

/// One concrete printing of a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardVersion {
    #[serde(rename = "id")]
    pub printed_number: String,
    pub rarity: String,
}

/// Fields extracted from a single listing row
#[derive(Debug, Clone, PartialEq)]
pub struct RawCard {
    pub key: String,
    pub name: String,
    pub printed_number: String,
    pub rarity: String,
    pub product_name_raw: String,
    pub product_name: String,
    pub image_url: String,
    pub card_type: String,
    pub level: Stat,
    pub power: Stat,
    pub cost: Stat,
    pub soul: Stat,
    pub trigger_soul_count: u32,
    pub traits: Traits,
    pub color: String,
    pub effect: String,
}

impl RawCard {
    pub fn version(&self) -> CardVersion {
        CardVersion {
            printed_number: self.printed_number.clone(),
            rarity: self.rarity.clone(),
        }
    }
}

/// A logical card with every printed variant observed for it.
///
/// `key` and `image_url` are kept for bookkeeping and never written out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardRecord {
    #[serde(skip)]
    pub key: String,
    pub name: String,
    pub product_name_raw: String,
    pub product_name: String,
    #[serde(rename = "type")]
    pub card_type: String,
    pub level: Stat,
    pub power: Stat,
    pub cost: Stat,
    pub soul: Stat,
    pub trigger_soul_count: u32,
    #[serde(rename = "trait")]
    pub traits: Traits,
    pub color: String,
    pub effect: String,
    #[serde(skip)]
    pub image_url: String,
    #[serde(rename = "all_cards")]
    pub versions: Vec<CardVersion>,
}

impl From<RawCard> for CardRecord {
    fn from(raw: RawCard) -> Self {
        let versions = vec![raw.version()];
        CardRecord {
            key: raw.key,
            name: raw.name,
            product_name_raw: raw.product_name_raw,
            product_name: raw.product_name,
            card_type: raw.card_type,
            level: raw.level,
            power: raw.power,
            cost: raw.cost,
            soul: raw.soul,
            trigger_soul_count: raw.trigger_soul_count,
            traits: raw.traits,
            color: raw.color,
            effect: raw.effect,
            image_url: raw.image_url,
            versions,
        }
    }
}

pub mod catalog;
pub mod ws;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stats_and_traits_serialize_as_value_or_dash() {
        assert_eq!(serde_json::to_value(Stat::Value(12)).unwrap(), json!(12));
        assert_eq!(serde_json::to_value(Stat::Placeholder).unwrap(), json!("-"));
        assert_eq!(
            serde_json::to_value(Traits::List(vec!["人物".into(), "学生".into()])).unwrap(),
            json!(["人物", "学生"])
        );
        assert_eq!(serde_json::to_value(Traits::Placeholder).unwrap(), json!("-"));
    }
}
