use crate::error::FetchError;
use crate::tcg::catalog::Catalog;
use chrono::Local;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory layout of one scraper run
#[derive(Debug, Clone)]
pub struct RunLayout {
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub image_dir: PathBuf,
    pub log_file: PathBuf,
}

impl RunLayout {
    pub fn new(root: PathBuf) -> Self {
        Self {
            data_dir: root.join("card-data"),
            image_dir: root.join("card-images"),
            log_file: root.join("scraper.log"),
            root,
        }
    }

    /// A fresh `<output_root>/<YYYYmmdd_HHMMSS>` run
    pub fn timestamped(output_root: &Path) -> Self {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        Self::new(output_root.join(stamp))
    }
}

/// Ensure the run directory and its data/image subdirectories exist
pub fn ensure_directories(layout: &RunLayout) -> io::Result<()> {
    let dirs_to_create = vec![
        layout.root.clone(),
        layout.data_dir.clone(),
        layout.image_dir.clone(),
    ];

    let missing_dirs: Vec<PathBuf> = dirs_to_create
        .into_par_iter()
        .filter(|dir| !dir.exists())
        .collect();

    missing_dirs
        .par_iter()
        .try_for_each(|dir| -> io::Result<()> {
            fs::create_dir_all(dir)?;
            Ok(())
        })
}

/// Write one `<product_id>.json` document per product
pub fn write_catalog(catalog: &Catalog, data_dir: &Path) -> Result<Vec<PathBuf>, FetchError> {
    fs::create_dir_all(data_dir)?;

    let mut written = Vec::with_capacity(catalog.len());
    for (product_id, group) in catalog.products() {
        let path = data_dir.join(format!("{}.json", product_id));
        let json = serde_json::to_string_pretty(group)?;
        fs::write(&path, json)?;
        info!("Wrote {} ({} cards)", path.display(), group.len());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcg::{RawCard, Stat, Traits};
    use serde_json::{json, Value};

    fn raw(printed_number: &str, rarity: &str) -> RawCard {
        RawCard {
            key: "ABC01-001".to_string(),
            name: "天神 朝姫".to_string(),
            printed_number: printed_number.to_string(),
            rarity: rarity.to_string(),
            product_name_raw: "-甘神さんちの縁結び".to_string(),
            product_name: "甘神さんちの縁結び".to_string(),
            image_url: "https://ws-tcg.com/a.png".to_string(),
            card_type: "角色卡".to_string(),
            level: Stat::Value(0),
            power: Stat::Value(3000),
            cost: Stat::Placeholder,
            soul: Stat::Value(1),
            trigger_soul_count: 0,
            traits: Traits::List(vec!["人物".to_string()]),
            color: "红色".to_string(),
            effect: String::new(),
        }
    }

    #[test]
    fn layout_paths() {
        let layout = RunLayout::new(PathBuf::from("data/20250101_000000"));
        assert!(layout.data_dir.ends_with("20250101_000000/card-data"));
        assert!(layout.image_dir.ends_with("20250101_000000/card-images"));
        assert!(layout.log_file.ends_with("20250101_000000/scraper.log"));
    }

    #[test]
    fn creates_run_directories() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::timestamped(dir.path());
        ensure_directories(&layout).unwrap();
        assert!(layout.data_dir.is_dir());
        assert!(layout.image_dir.is_dir());
        // idempotent
        ensure_directories(&layout).unwrap();
    }

    #[test]
    fn writes_product_documents_without_internal_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::new();
        catalog.ingest("abc01", raw("ABC01-001SP", "SP"));
        catalog.ingest("abc01", raw("ABC01-001R", "R"));

        let written = write_catalog(&catalog, dir.path()).unwrap();
        assert_eq!(written, vec![dir.path().join("abc01.json")]);

        let content = fs::read_to_string(&written[0]).unwrap();
        assert!(content.contains("天神 朝姫"));
        let doc: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(
            doc,
            json!({
                "ABC01-001": {
                    "name": "天神 朝姫",
                    "product_name_raw": "-甘神さんちの縁結び",
                    "product_name": "甘神さんちの縁結び",
                    "type": "角色卡",
                    "level": 0,
                    "power": 3000,
                    "cost": "-",
                    "soul": 1,
                    "trigger_soul_count": 0,
                    "trait": ["人物"],
                    "color": "红色",
                    "effect": "",
                    "all_cards": [
                        {"id": "ABC01-001SP", "rarity": "SP"},
                        {"id": "ABC01-001R", "rarity": "R"}
                    ]
                }
            })
        );
    }
}
