//! Tag-aware price capture over a lenient streaming tokenizer.
//!
//! Capture starts at any element whose `class` contains a pricing keyword and
//! ends at the next closing tag of *any* element. Nested markup therefore cuts
//! capture short: `<span class="price"><b>$10</b> per seat</span>` yields only
//! `$10`. Kept as-is; callers also run the regex pass over the raw document.

use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use tracing::debug;

/// Substrings of a lowercased `class` value that mark a price element.
pub const PRICE_CLASS_KEYWORDS: &[&str] = &["price", "cost", "amount", "plan", "tier"];

#[derive(Debug, Default)]
struct PriceTagCollector {
    in_price: bool,
    current_text: String,
    prices: Vec<String>,
}

impl PriceTagCollector {
    fn open(&mut self, tag: &BytesStart) {
        if class_attr(tag).is_some_and(|class| is_price_class(&class)) {
            self.in_price = true;
        }
    }

    fn close(&mut self) {
        let text = self.current_text.trim();
        if self.in_price && !text.is_empty() {
            self.prices.push(text.to_string());
        }
        self.in_price = false;
        self.current_text.clear();
    }

    fn text(&mut self, text: &str) {
        if self.in_price {
            self.current_text.push_str(text);
        }
    }
}

/// Collect trimmed text of price-classed elements, in document order.
///
/// Markup the tokenizer rejects (`<! x >`, `<![if !IE]>`) is skipped up to its
/// closing `>` and scanning resumes, with capture state carried over.
pub fn extract_tag_prices(html: &str) -> Vec<String> {
    let mut collector = PriceTagCollector::default();
    let mut offset = 0;
    while let Some(rest) = html.get(offset..) {
        let Err(at) = scan(rest, &mut collector) else {
            break;
        };
        let start = offset + at;
        let Some(gt) = html
            .as_bytes()
            .get(start..)
            .and_then(|b| b.iter().position(|&c| c == b'>'))
        else {
            break;
        };
        // always moves past `offset`
        offset = start + gt + 1;
    }
    collector.prices
}

/// Feed events into `collector` until EOF, or return the byte offset of the
/// markup that failed to tokenize.
fn scan(html: &str, collector: &mut PriceTagCollector) -> Result<(), usize> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.check_comments = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => collector.open(&e),
            // `<br/>` opens and closes in one token
            Ok(Event::Empty(e)) => {
                collector.open(&e);
                collector.close();
            }
            Ok(Event::End(_)) => collector.close(),
            Ok(Event::Text(e)) => collector.text(&decode_text(&e)),
            Ok(Event::CData(e)) => collector.text(&String::from_utf8_lossy(&e[..])),
            Ok(Event::Eof) => return Ok(()),
            Err(e) => {
                let at = reader.error_position() as usize;
                debug!("Skipping bad markup at byte {}: {}", at, e);
                return Err(at);
            }
            _ => {}
        }
    }
}

fn is_price_class(class: &str) -> bool {
    let lower = class.to_lowercase();
    PRICE_CLASS_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Last `class` attribute wins.
fn class_attr(tag: &BytesStart) -> Option<String> {
    tag.html_attributes()
        .filter_map(Result::ok)
        .filter(|a| a.key.as_ref().eq_ignore_ascii_case(b"class"))
        .last()
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn decode_text(e: &BytesText) -> String {
    match e.unescape_with(resolve_html5_entity) {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(&e[..]).into_owned(),
    }
}
