//! Record extraction from archive pages
//!
//! Three page shapes are understood:
//! - catalogue listing rows (`div.weblib-item-row`), one record per row
//! - article listings (`article`), one record per article block
//! - catalogue detail pages (`span.weblib-item-content-element` pairs), one record per page
//!
//! A fragment that is missing part of its expected structure still produces a
//! record; the failure is described in the record's Error field.
//!
//! The extractor also locates navigation: the "previous" cursor link on article
//! listings, seed links for archive/region discovery, and the download button on
//! indirection pages.

use crate::crawler::fetcher::Page;
use crate::record::{fields, Record};
use scraper::{ElementRef, Node, Selector};
use thiserror::Error;
use url::Url;

/// Text marking the content element that carries the download link
const DOWNLOAD_MARKER: &str = "Download Item";

/// Separator between a listing row's call-number label and value
const CALL_NUMBER_SEPARATOR: char = '\u{a0}';

/// Menu entry whose submenu lists the regional collections
const COLLECTION_MENU_LABEL: &str = "The Collection";

/// Errors describing why part of a fragment could not be extracted
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    #[error("Missing element: {0}")]
    MissingElement(&'static str),

    #[error("Missing `{attr}` attribute on {element}")]
    MissingAttribute {
        element: &'static str,
        attr: &'static str,
    },
}

/// Result of extracting a catalogue detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPage {
    pub record: Record,

    /// Link found in the "Download Item" content element
    pub download_link: Option<String>,
}

/// Compiled selectors for every page shape the archive uses
#[derive(Debug)]
pub struct Extractor {
    listing_row: Selector,
    span: Selector,
    anchor: Selector,
    line_break: Selector,
    article: Selector,
    published: Selector,
    category: Selector,
    content_element: Selector,
    heading: Selector,
    inline_value: Selector,
    block_value: Selector,
    keyword_list: Selector,
    cursor: Selector,
    download_button: Selector,
    archive_links: Selector,
    menu_item: Selector,
    submenu: Selector,
    linked_anchor: Selector,
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

impl Extractor {
    /// Compiles all selectors
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            listing_row: selector("div.weblib-item-row")?,
            span: selector("span")?,
            anchor: selector("a")?,
            line_break: selector("br")?,
            article: selector("article")?,
            published: selector("time.entry-date.published")?,
            category: selector("span.category")?,
            content_element: selector("span.weblib-item-content-element")?,
            heading: selector("span.weblib-item-left-head")?,
            inline_value: selector("span.weblib-item-left-content")?,
            block_value: selector("div.weblib-item-left-content")?,
            keyword_list: selector("p.weblib-item-keyword-list")?,
            cursor: selector("li.previous a")?,
            download_button: selector("a.wpfb-flatbtn[href]")?,
            archive_links: selector("div#secondary a[href]")?,
            menu_item: selector("li.menu-item")?,
            submenu: selector("ul")?,
            linked_anchor: selector("a[href]")?,
        })
    }

    /// Extracts one record per catalogue listing row
    ///
    /// Fields: Title and URL from the link in the row's third `span`, Source from
    /// the text after the first `<br>`, Call Number from the text after the second
    /// `<br>` (the part after a non-breaking space; empty if there is none).
    pub fn extract_listing_rows(&self, page: &Page) -> Vec<Record> {
        page.document()
            .select(&self.listing_row)
            .map(|row| self.listing_row_record(row, &page.url))
            .collect()
    }

    fn listing_row_record(&self, row: ElementRef, base: &Url) -> Record {
        let mut record = Record::new();

        match row
            .select(&self.span)
            .nth(2)
            .and_then(|span| span.select(&self.anchor).next())
        {
            Some(link) => {
                record.set(fields::TITLE, element_text(link).trim());
                match link.value().attr("href") {
                    Some(href) => record.set(fields::URL, resolve_href(base, href)),
                    None => record.push_error(
                        ExtractError::MissingAttribute {
                            element: "listing link",
                            attr: "href",
                        }
                        .to_string(),
                    ),
                }
            }
            None => record.push_error(ExtractError::MissingElement("listing link").to_string()),
        }

        let breaks: Vec<ElementRef> = row.select(&self.line_break).collect();

        match breaks.first().and_then(|br| text_after(*br)) {
            Some(source) => record.set(fields::SOURCE, source.trim()),
            None => record.push_error(ExtractError::MissingElement("source text").to_string()),
        }

        match breaks.get(1).and_then(|br| text_after(*br)) {
            Some(text) => {
                let parts: Vec<&str> = text.split(CALL_NUMBER_SEPARATOR).collect();
                let call_number = if parts.len() == 2 { parts[1].trim() } else { "" };
                record.set(fields::CALL_NUMBER, call_number);
            }
            None => {
                record.push_error(ExtractError::MissingElement("call number text").to_string())
            }
        }

        record
    }

    /// Extracts one record per `article` block
    ///
    /// Fields: URL and Title from the first link (the `title` attribute, or the link
    /// text when there is none), Date from the published `time` element (empty when
    /// absent), Categories as the `;`-joined category link texts (absent when there
    /// are none).
    pub fn extract_articles(&self, page: &Page) -> Vec<Record> {
        page.document()
            .select(&self.article)
            .map(|article| self.article_record(article, &page.url))
            .collect()
    }

    fn article_record(&self, article: ElementRef, base: &Url) -> Record {
        let mut record = Record::new();

        match article.select(&self.anchor).next() {
            Some(link) => {
                match link.value().attr("href") {
                    Some(href) => record.set(fields::URL, resolve_href(base, href)),
                    None => record.push_error(
                        ExtractError::MissingAttribute {
                            element: "article link",
                            attr: "href",
                        }
                        .to_string(),
                    ),
                }
                let title = match link.value().attr("title") {
                    Some(title) => title.trim().to_string(),
                    None => element_text(link).trim().to_string(),
                };
                record.set(fields::TITLE, title);
            }
            None => record.push_error(ExtractError::MissingElement("article link").to_string()),
        }

        let date = article
            .select(&self.published)
            .next()
            .and_then(|time| time.value().attr("datetime"))
            .unwrap_or("");
        record.set(fields::DATE, date);

        if let Some(category) = article.select(&self.category).next() {
            let names: Vec<String> = category
                .select(&self.anchor)
                .map(|link| element_text(link).trim().to_string())
                .collect();
            if !names.is_empty() {
                record.set(fields::CATEGORIES, names.join(";"));
            }
        }

        record
    }

    /// Extracts the single record on a catalogue detail page
    ///
    /// Each heading becomes a field name (after [`clean_text`]); its value comes from
    /// the inline content element, or the block element for "Description". The
    /// keyword list, when present, becomes a newline-joined Keywords field.
    pub fn extract_detail(&self, page: &Page) -> DetailPage {
        let document = page.document();
        let mut record = Record::new();
        record.set(fields::URL, page.url.as_str());
        let mut download_link = None;

        for item in document.select(&self.content_element) {
            let Some(head) = item.select(&self.heading).next() else {
                record.push_error(ExtractError::MissingElement("detail heading").to_string());
                continue;
            };

            let heading = clean_text(&element_text(head));
            if heading.is_empty() {
                continue;
            }

            let value_selector = if heading == fields::DESCRIPTION {
                &self.block_value
            } else {
                &self.inline_value
            };

            let value = match item.select(value_selector).next() {
                Some(content) => {
                    let text = element_text(content);
                    if download_link.is_none() && text.contains(DOWNLOAD_MARKER) {
                        download_link = content
                            .select(&self.linked_anchor)
                            .next()
                            .and_then(|a| a.value().attr("href"))
                            .map(|href| resolve_href(&page.url, href));
                        if download_link.is_none() {
                            record.push_error(
                                ExtractError::MissingAttribute {
                                    element: "download link",
                                    attr: "href",
                                }
                                .to_string(),
                            );
                        }
                    }
                    clean_text(&text)
                }
                None => String::new(),
            };

            record.set(heading, value);
        }

        if let Some(list) = document.select(&self.keyword_list).next() {
            let keywords: Vec<String> = list
                .text()
                .map(clean_text)
                .filter(|k| !k.is_empty())
                .collect();
            record.set(fields::KEYWORDS, keywords.join("\n"));
        }

        if let Some(title) = record.get(fields::TITLE) {
            tracing::info!("-- Retrieved title: {}", title);
        }

        DetailPage {
            record,
            download_link,
        }
    }

    /// Finds the "previous" cursor link on an article listing page
    pub fn find_cursor(&self, page: &Page) -> Option<String> {
        page.document()
            .select(&self.cursor)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| resolve_href(&page.url, href))
    }

    /// Finds the real file link on a download indirection page
    pub fn find_download_button(&self, page: &Page) -> Option<String> {
        page.document()
            .select(&self.download_button)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| resolve_href(&page.url, href))
    }

    /// Monthly archive links from the sidebar
    pub fn archive_links(&self, page: &Page) -> Vec<String> {
        collect_hrefs(page.document().select(&self.archive_links), &page.url)
    }

    /// Regional collection links: the submenu under the "The Collection" menu entry
    pub fn region_links(&self, page: &Page) -> Vec<String> {
        for item in page.document().select(&self.menu_item) {
            let is_collection = item
                .select(&self.anchor)
                .any(|link| element_text(link).trim() == COLLECTION_MENU_LABEL);
            if !is_collection {
                continue;
            }

            if let Some(submenu) = item.select(&self.submenu).next() {
                return collect_hrefs(submenu.select(&self.linked_anchor), &page.url);
            }
        }
        Vec::new()
    }
}

/// Trims surrounding whitespace (including non-breaking spaces), `:` and control
/// characters from a scraped label or value
pub fn clean_text(s: &str) -> String {
    s.trim_matches(|c: char| c.is_whitespace() || c == ':' || c.is_control())
        .to_string()
}

fn element_text(element: ElementRef) -> String {
    element.text().collect()
}

/// Text of the node immediately following `element`
fn text_after(element: ElementRef) -> Option<String> {
    let sibling = element.next_sibling()?;
    match sibling.value() {
        Node::Text(text) => {
            let text: &str = text;
            Some(text.to_string())
        }
        Node::Element(_) => ElementRef::wrap(sibling).map(element_text),
        _ => None,
    }
}

fn resolve_href(base: &Url, href: &str) -> String {
    let href = href.trim();
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

fn collect_hrefs<'a>(links: impl Iterator<Item = ElementRef<'a>>, base: &Url) -> Vec<String> {
    links
        .filter_map(|a| a.value().attr("href"))
        .map(|href| resolve_href(base, href))
        .collect()
}
