//! Weiß Schwarz card list row parsing.
//!
//! Each result page of the official card list is a table where one `<tr>`
//! describes one printing. The title `h4` carries the card name and printed
//! number, the `td span.unit` cells carry labelled attributes.

use super::{RawCard, Stat, Traits, PLACEHOLDER};
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

pub const BASE_URL: &str = "https://ws-tcg.com";

const FULL_WIDTH_SPACE: char = '\u{3000}';
const FULL_WIDTH_DASH: &str = "－";
const TRAIT_DELIMITER: char = '・';
const SOUL_ICON: &str = "soul.gif";

const LEGACY_ICON_PATH: &str = "/wordpress/wp-content/images/cardlist/_partimages";
const EFFECT_ICON_PATH: &str = "/effect-icons";

const COLOR_MAP: [(&str, &str); 4] = [
    ("yellow.gif", "黄色"),
    ("red.gif", "红色"),
    ("green.gif", "绿色"),
    ("blue.gif", "蓝色"),
];

const TYPE_MAP: [(&str, &str); 3] = [
    ("キャラ", "角色卡"),
    ("クライマックス", "高潮卡"),
    ("イベント", "事件卡"),
];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must be valid")
}

static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h4"));
static HIGHLIGHT: LazyLock<Selector> = LazyLock::new(|| selector("span.highlight_target"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static CARD_IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("th a img"));
static ATTRIBUTE: LazyLock<Selector> = LazyLock::new(|| selector("td span.unit"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static EFFECT: LazyLock<Selector> = LazyLock::new(|| selector("td > span.highlight_target"));

static RARITY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]+\+?$").expect("static regex must be valid"));

/// Classification of a single table row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Parsed(RawCard),
    /// Header or decorative row
    NotData,
    Malformed(String),
}

/// Attribute cell values collected before decoding
#[derive(Debug, Default)]
struct Attributes {
    card_type: Option<String>,
    level: Option<String>,
    power: Option<String>,
    cost: Option<String>,
    rarity: Option<String>,
    traits: Option<String>,
    color_icon: Option<String>,
    soul_count: Option<usize>,
    trigger_count: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct RowParser {
    base_url: String,
}

impl Default for RowParser {
    fn default() -> Self {
        Self::new(BASE_URL)
    }
}

impl RowParser {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Parse every row of a result-table fragment, in document order
    pub fn parse_page(&self, html: &str) -> Vec<RowOutcome> {
        // Bare <tr> markup outside a table is dropped by the HTML parser
        let document = if html.contains("<table") {
            Html::parse_fragment(html)
        } else {
            Html::parse_fragment(&format!("<table>{}</table>", html))
        };

        document
            .select(&ROW)
            .map(|row| self.parse_row(row))
            .collect()
    }

    pub fn parse_row(&self, row: ElementRef) -> RowOutcome {
        let Some(title) = row.select(&TITLE).next() else {
            return RowOutcome::NotData;
        };
        let spans: Vec<ElementRef> = title.select(&HIGHLIGHT).collect();
        if spans.len() < 2 {
            return RowOutcome::NotData;
        }

        match self.extract(row, title, &spans) {
            Ok(card) => RowOutcome::Parsed(card),
            Err(reason) => RowOutcome::Malformed(reason),
        }
    }

    fn extract(
        &self,
        row: ElementRef,
        title: ElementRef,
        spans: &[ElementRef],
    ) -> Result<RawCard, String> {
        let name = normalize_spaces(element_text(spans[0]).trim());
        let printed_number = element_text(spans[1]).trim().to_string();
        if printed_number.is_empty() {
            return Err(format!("empty card number for '{}'", name));
        }

        let key = canonical_key(&printed_number);
        if key.is_empty() {
            return Err(format!("card number '{}' has no canonical key", printed_number));
        }

        let product_name_raw = title
            .select(&ANCHOR)
            .next()
            .map(|anchor| following_text(anchor).trim().to_string())
            .unwrap_or_default();
        let product_name = clean_product_name(&product_name_raw);

        let image_url = match row.select(&CARD_IMAGE).next() {
            Some(img) => {
                let src = img
                    .value()
                    .attr("src")
                    .ok_or_else(|| format!("card image of '{}' has no src", printed_number))?;
                format!("{}{}", self.base_url, src.trim())
            }
            None => String::new(),
        };

        let attrs = collect_attributes(row)?;

        Ok(RawCard {
            key,
            name,
            printed_number,
            rarity: attrs
                .rarity
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            product_name_raw,
            product_name,
            image_url,
            card_type: lookup(&TYPE_MAP, attrs.card_type.as_deref()),
            level: parse_stat(attrs.level.as_deref().unwrap_or(PLACEHOLDER)),
            power: parse_stat(attrs.power.as_deref().unwrap_or(PLACEHOLDER)),
            cost: parse_stat(attrs.cost.as_deref().unwrap_or(PLACEHOLDER)),
            soul: match attrs.soul_count.unwrap_or(0) {
                0 => Stat::Placeholder,
                n => Stat::Value(n as u64),
            },
            trigger_soul_count: attrs.trigger_count.unwrap_or(0) as u32,
            traits: parse_traits(attrs.traits.as_deref().unwrap_or(PLACEHOLDER)),
            color: lookup(&COLOR_MAP, attrs.color_icon.as_deref()),
            effect: row.select(&EFFECT).next().map(parse_effect).unwrap_or_default(),
        })
    }
}

fn collect_attributes(row: ElementRef) -> Result<Attributes, String> {
    let mut attrs = Attributes::default();

    for span in row.select(&ATTRIBUTE) {
        let text = element_text(span);
        let text = text.trim();
        let markup = span.html();

        if let Some(value) = labelled(text, "種類：") {
            attrs.card_type = Some(value);
        } else if let Some(value) = labelled(text, "レベル：") {
            attrs.level = Some(value);
        } else if let Some(value) = labelled(text, "パワー：") {
            attrs.power = Some(value);
        } else if let Some(value) = labelled(text, "コスト：") {
            attrs.cost = Some(value);
        } else if let Some(value) = labelled(text, "レアリティ：") {
            attrs.rarity = Some(value);
        } else if let Some(value) = labelled(text, "特徴：") {
            attrs.traits = Some(value);
        } else if let Some(icon) = markup
            .contains("色：")
            .then(|| span.select(&IMAGE).next())
            .flatten()
        {
            let src = icon
                .value()
                .attr("src")
                .ok_or_else(|| "color icon has no src".to_string())?;
            attrs.color_icon = Some(file_name(src).to_string());
        } else if markup.contains("ソウル：") {
            attrs.soul_count = Some(markup.matches(SOUL_ICON).count());
        } else if markup.contains("トリガー：") {
            attrs.trigger_count = Some(markup.matches(SOUL_ICON).count());
        }
    }

    Ok(attrs)
}

fn labelled(text: &str, label: &str) -> Option<String> {
    text.strip_prefix(label).map(|value| value.trim().to_string())
}

fn element_text(element: ElementRef) -> String {
    element.text().collect()
}

/// Text of the node right after `anchor`, e.g. the `-Product Name` suffix
fn following_text(anchor: ElementRef) -> String {
    let Some(sibling) = anchor.next_sibling() else {
        return String::new();
    };
    match sibling.value() {
        Node::Text(text) => (**text).to_string(),
        Node::Element(_) => ElementRef::wrap(sibling)
            .map(|element| element.html())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn file_name(src: &str) -> &str {
    src.rsplit('/').next().unwrap_or(src)
}

fn lookup(table: &[(&str, &str)], value: Option<&str>) -> String {
    value
        .and_then(|v| table.iter().find(|(from, _)| *from == v))
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn normalize_spaces(text: &str) -> String {
    text.replace(FULL_WIDTH_SPACE, " ")
}

fn is_none_marker(text: &str) -> bool {
    text == PLACEHOLDER || text == FULL_WIDTH_DASH
}

/// Card number without its rarity suffix, e.g. `ABC01-001SP` -> `ABC01-001`
pub fn canonical_key(printed_number: &str) -> String {
    RARITY_SUFFIX.replace(printed_number, "").into_owned()
}

pub fn clean_product_name(raw: &str) -> String {
    let name = normalize_spaces(raw.trim_start_matches('-').trim());
    if name.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        name
    }
}

/// Integer when the text is purely digits (ASCII or full-width), else `"-"`
pub fn parse_stat(text: &str) -> Stat {
    if text.is_empty() {
        return Stat::Placeholder;
    }

    let mut ascii = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '0'..='9' => ascii.push(c),
            '０'..='９' => ascii.push(char::from(b'0' + (c as u32 - '０' as u32) as u8)),
            _ => return Stat::Placeholder,
        }
    }

    ascii.parse().map(Stat::Value).unwrap_or(Stat::Placeholder)
}

pub fn parse_traits(text: &str) -> Traits {
    if is_none_marker(text) {
        return Traits::Placeholder;
    }
    Traits::List(
        text.split(TRAIT_DELIMITER)
            .map(|t| t.trim().to_string())
            .collect(),
    )
}

fn parse_effect(span: ElementRef) -> String {
    let effect = span
        .inner_html()
        .trim()
        .replace('\n', "")
        .replace(LEGACY_ICON_PATH, EFFECT_ICON_PATH)
        .replace(".gif", ".webp");

    if is_none_marker(&effect) {
        String::new()
    } else {
        normalize_spaces(&effect)
    }
}
