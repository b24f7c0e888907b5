use super::{CardRecord, RawCard};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

const PROMO_MARKER: &str = "PR";
const THEME_DECK_MARKER: &str = "TD";

/// Canonical key -> card, in first-seen order
pub type ProductGroup = IndexMap<String, CardRecord>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProduct {
    pub id: String,
    /// Leading token of the card number, for reporting only
    pub prefix: String,
}

/// Product grouping id for a card, e.g. `ABC01-001` + `PR` -> `abc01-pr`
pub fn resolve_product_id(key: &str, product_name_raw: &str, rarity: &str) -> ResolvedProduct {
    let base_id = key.split('-').next().unwrap_or(key).replace('/', "-");
    let prefix = base_id.split('-').next().unwrap_or(&base_id).to_string();
    let base_id = base_id.to_lowercase();

    let name = product_name_raw.to_uppercase();
    let rarity = rarity.to_uppercase();

    let id = if name.contains(PROMO_MARKER) || rarity.contains(PROMO_MARKER) {
        format!("{}-pr", base_id)
    } else if name.contains(THEME_DECK_MARKER) || rarity.contains(THEME_DECK_MARKER) {
        format!("{}-td", base_id)
    } else {
        base_id
    };

    ResolvedProduct { id, prefix }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub source_url: String,
    pub destination: PathBuf,
}

impl DownloadTask {
    /// `<image_root>/<product_id>/<printed number with '/' as '-'>.png`
    pub fn for_card(image_root: &Path, product_id: &str, card: &RawCard) -> Option<Self> {
        if card.image_url.is_empty() {
            return None;
        }
        let file_name = format!("{}.png", card.printed_number.replace('/', "-"));
        Some(Self {
            source_url: card.image_url.clone(),
            destination: image_root.join(product_id).join(file_name),
        })
    }
}

/// Cards grouped per product, merging printings that share a canonical key
#[derive(Debug, Default)]
pub struct Catalog {
    products: IndexMap<String, ProductGroup>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// First encounter of a key creates the record, later ones only add a version
    pub fn ingest(&mut self, product_id: &str, card: RawCard) {
        let group = self.products.entry(product_id.to_string()).or_default();

        match group.get_mut(&card.key) {
            Some(record) => record.versions.push(card.version()),
            None => {
                group.insert(card.key.clone(), CardRecord::from(card));
            }
        }
    }

    pub fn product(&self, product_id: &str) -> Option<&ProductGroup> {
        self.products.get(product_id)
    }

    pub fn products(&self) -> impl Iterator<Item = (&String, &ProductGroup)> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn card_count(&self) -> usize {
        self.products.values().map(|group| group.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcg::{CardVersion, Stat, Traits};

    fn card(printed_number: &str, rarity: &str, name: &str) -> RawCard {
        RawCard {
            key: crate::tcg::ws::canonical_key(printed_number),
            name: name.to_string(),
            printed_number: printed_number.to_string(),
            rarity: rarity.to_string(),
            product_name_raw: String::new(),
            product_name: "-".to_string(),
            image_url: format!("https://ws-tcg.com/img/{}.png", printed_number),
            card_type: "角色卡".to_string(),
            level: Stat::Value(1),
            power: Stat::Value(5000),
            cost: Stat::Value(0),
            soul: Stat::Value(1),
            trigger_soul_count: 0,
            traits: Traits::Placeholder,
            color: "黄色".to_string(),
            effect: String::new(),
        }
    }

    fn version(printed_number: &str, rarity: &str) -> CardVersion {
        CardVersion {
            printed_number: printed_number.to_string(),
            rarity: rarity.to_string(),
        }
    }

    #[test]
    fn resolves_product_ids() {
        assert_eq!(resolve_product_id("ABC01-001", "", "PR").id, "abc01-pr");
        assert_eq!(resolve_product_id("ABC01-001", "", "R").id, "abc01");
        assert_eq!(resolve_product_id("ABC01-001", "", "TD").id, "abc01-td");
        assert_eq!(
            resolve_product_id("ABC01-001", "-トライアルデッキ＋ td", "RR").id,
            "abc01-td"
        );
        assert_eq!(resolve_product_id("ABC01-001", "-PR card", "TD").id, "abc01-pr");
    }

    #[test]
    fn slash_in_set_code_becomes_hyphen() {
        let resolved = resolve_product_id("AMG/S01-001", "", "RR");
        assert_eq!(resolved.id, "amg-s01");
        assert_eq!(resolved.prefix, "AMG");
    }

    #[test]
    fn merges_variants_under_one_key() {
        let mut catalog = Catalog::new();
        catalog.ingest("abc01", card("ABC01-001SP", "SP", "first"));
        catalog.ingest("abc01", card("ABC01-001R", "R", "second"));

        let group = catalog.product("abc01").unwrap();
        assert_eq!(group.len(), 1);

        let record = &group["ABC01-001"];
        assert_eq!(record.name, "first");
        assert_eq!(record.image_url, "https://ws-tcg.com/img/ABC01-001SP.png");
        assert_eq!(
            record.versions,
            vec![version("ABC01-001SP", "SP"), version("ABC01-001R", "R")]
        );
    }

    #[test]
    fn keeps_duplicate_versions_and_insertion_order() {
        let mut catalog = Catalog::new();
        catalog.ingest("abc01", card("ABC01-002R", "R", "b"));
        catalog.ingest("abc01-pr", card("ABC01-P01PR", "PR", "promo"));
        catalog.ingest("abc01", card("ABC01-001C", "C", "a"));
        catalog.ingest("abc01", card("ABC01-002R", "R", "b again"));

        let ids: Vec<&String> = catalog.products().map(|(id, _)| id).collect();
        assert_eq!(ids, ["abc01", "abc01-pr"]);

        let group = catalog.product("abc01").unwrap();
        let keys: Vec<&String> = group.keys().collect();
        assert_eq!(keys, ["ABC01-002", "ABC01-001"]);
        assert_eq!(group["ABC01-002"].versions.len(), 2);
        assert_eq!(catalog.card_count(), 3);
    }

    #[test]
    fn download_task_paths() {
        let root = Path::new("/tmp/card-images");
        let mut slashed = card("AMG/S01-001SP", "SP", "x");
        let task = DownloadTask::for_card(root, "amg-s01", &slashed).unwrap();
        assert_eq!(task.destination, root.join("amg-s01").join("AMG-S01-001SP.png"));
        assert_eq!(task.source_url, "https://ws-tcg.com/img/AMG/S01-001SP.png");

        slashed.image_url.clear();
        assert!(DownloadTask::for_card(root, "amg-s01", &slashed).is_none());
    }
}
