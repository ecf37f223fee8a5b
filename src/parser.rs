use crate::model::CountryIndicators;
use anyhow::{Context, Result, bail};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

// The index page groups country links under this heading. The whole crawl is
// meaningless if the heading disappears, so extraction fails fast on it.
pub const INDEX_HEADING: &str = "Demographics of Countries";

// Extracted in discovery order; duplicate link texts update the stored url
// in place (last write wins) without moving the entry.
pub fn extract_country_links(index_html: &str, base_url: &str) -> Result<Vec<(String, String)>> {
    let doc = Html::parse_document(index_html);
    let headings = Selector::parse("h1, h2, h3, h4, h5, h6").expect("heading selector must parse");
    let needle = INDEX_HEADING.to_lowercase();

    let heading = doc
        .select(&headings)
        .find(|h| h.text().collect::<String>().to_lowercase().contains(&needle));
    let Some(heading) = heading else {
        bail!("index heading containing {INDEX_HEADING:?} not found");
    };

    let Some(section) = elements_after(&doc, heading).next() else {
        bail!("no content follows the {INDEX_HEADING:?} heading");
    };

    let base = Url::parse(base_url).with_context(|| format!("invalid base url {base_url}"))?;
    let anchors = Selector::parse("a[href]").expect("anchor selector must parse");

    let mut links: Vec<(String, String)> = Vec::new();
    for anchor in section.select(&anchors) {
        let name = anchor.text().collect::<String>().trim().to_string();
        if name.is_empty() {
            continue;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(absolute) = base.join(href) else {
            debug!(country = %name, href, "skipping link with unresolvable href");
            continue;
        };

        match links.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, url)) => *url = absolute.to_string(),
            None => links.push((name, absolute.to_string())),
        }
    }

    Ok(links)
}

// Best-effort per-country extraction: every field defaults to absent, and a
// page missing any of the expected markers yields absent fields rather than
// an error.
pub fn parse_country_page(html: &str) -> CountryIndicators {
    let doc = Html::parse_document(html);
    let mut out = CountryIndicators::default();

    parse_life_expectancy(&doc, &mut out);
    parse_urbanization(&doc, &mut out);
    parse_population_density(&doc, &mut out);

    out
}

// Life expectancy cards: a div.bg-zinc-50 per series, labelled by its first
// span, with the value in the next "large text" div after the card.
fn parse_life_expectancy(doc: &Html, out: &mut CountryIndicators) {
    let cards = Selector::parse("div.bg-zinc-50").expect("card selector must parse");
    let spans = Selector::parse("span").expect("span selector must parse");

    for card in doc.select(&cards) {
        let Some(label) = card.select(&spans).next() else {
            continue;
        };
        let label_text = label.text().collect::<String>().trim().to_string();
        let slot = match label_text.as_str() {
            "Both Sexes" => &mut out.life_expectancy_both,
            "Females" => &mut out.life_expectancy_female,
            "Males" => &mut out.life_expectancy_male,
            _ => continue,
        };

        let value = elements_after(doc, card).find(|el| {
            el.value().name() == "div" && el.value().classes().any(|c| c.contains("text-2xl"))
        });
        if let Some(value) = value {
            *slot = parse_number(value.text().collect::<String>().trim());
        }
    }
}

fn parse_urbanization(doc: &Html, out: &mut CountryIndicators) {
    let marker = Selector::parse("#urb").expect("urb selector must parse");
    let Some(anchor) = doc.select(&marker).next() else {
        return;
    };
    let Some(paragraph) = next_paragraph(doc, anchor) else {
        return;
    };
    let text = joined_text(paragraph);

    let pct = Regex::new(r"([0-9][0-9.,]*)%").expect("percentage regex must compile");
    let abs = Regex::new(r"\(([0-9][0-9,]*)\s*people").expect("absolute regex must compile");

    out.urban_population_percentage = pct
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_number(m.as_str()));
    out.urban_population_absolute = abs
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse::<u64>().ok());
}

fn parse_population_density(doc: &Html, out: &mut CountryIndicators) {
    let marker = Selector::parse("#population-density").expect("density selector must parse");
    let Some(anchor) = doc.select(&marker).next() else {
        return;
    };
    let Some(paragraph) = next_paragraph(doc, anchor) else {
        return;
    };
    let text = paragraph.text().collect::<String>();

    let density =
        Regex::new(r"\b([0-9][0-9.,]*)\s*people per Km").expect("density regex must compile");
    out.population_density = density
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_number(m.as_str()));
}

// All elements after `element` in document order, its own descendants
// included, matching the way the source layout is navigated: the value or
// paragraph that belongs to a marker is the next matching element in the
// document, wherever it nests.
fn elements_after<'a>(
    doc: &'a Html,
    element: ElementRef<'a>,
) -> impl Iterator<Item = ElementRef<'a>> {
    let target = element.id();
    doc.tree
        .root()
        .descendants()
        .skip_while(move |node| node.id() != target)
        .skip(1)
        .filter_map(ElementRef::wrap)
}

fn next_paragraph<'a>(doc: &'a Html, element: ElementRef<'a>) -> Option<ElementRef<'a>> {
    elements_after(doc, element).find(|el| el.value().name() == "p")
}

fn joined_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}
