use crate::{
    catalog::{RawCell, RawRow, RowKind, Subject},
    utils::{non_blank, normalize},
    Landmark, PageInfo,
};
use lazy_regex::regex;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

const E: &str = "Invalid selector";
lazy_static! {
    static ref SUBJECT_SELECT: Selector =
        Selector::parse(r#"select[name="selectedSubjects"]"#).expect(E);
    static ref SUBJECT_OPTIONS: Selector =
        Selector::parse(r#"select[name="selectedSubjects"] option"#).expect(E);
    static ref SELECTED_TERM: Selector =
        Selector::parse(r#"select#selectedTerm option[selected]"#).expect(E);
    static ref TERM_OPTIONS: Selector = Selector::parse(r#"select#selectedTerm option"#).expect(E);
    static ref RESULTS_TABLE: Selector = Selector::parse("table.tbrdr").expect(E);
    static ref RESULT_ROWS: Selector = Selector::parse("table.tbrdr tr").expect(E);
    static ref HEADER_CELL: Selector = Selector::parse("td.crsheader").expect(E);
    static ref NO_RESULTS: Selector = Selector::parse("div.centeralign").expect(E);
    static ref PAGE_INDICATOR: Selector = Selector::parse(r#"td[align="right"]"#).expect(E);
    static ref LINKS: Selector = Selector::parse("a[href]").expect(E);
    static ref TITLED: Selector = Selector::parse("[title]").expect(E);
    static ref SPAN: Selector = Selector::parse("span").expect(E);
}

const SECTION_ROW_CLASSES: [&str; 2] = ["sectxt", "nonenrtxt"];

pub fn has_landmark(html: &str, landmark: Landmark) -> bool {
    let doc = Html::parse_document(html);
    let present = match landmark {
        Landmark::SearchForm => doc.select(&SUBJECT_SELECT).next().is_some(),
        Landmark::ResultsTable => doc.select(&RESULTS_TABLE).next().is_some(),
        Landmark::NoResults => doc
            .select(&NO_RESULTS)
            .any(|el| text(&el).contains("No Result Found")),
    };
    present
}

pub fn subjects(html: &str) -> Vec<Subject> {
    let doc = Html::parse_document(html);
    doc.select(&SUBJECT_OPTIONS)
        .filter_map(|option| {
            let code = non_blank(option.value().attr("value")?)?;
            let label = non_blank(text(&option))?;
            Some(Subject { code, label })
        })
        .collect()
}

/// Term preselected on the search form, or its first option.
pub fn selected_term(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let term = doc
        .select(&SELECTED_TERM)
        .chain(doc.select(&TERM_OPTIONS))
        .find_map(|option| option.value().attr("value").and_then(non_blank));
    term
}

pub fn rows(html: &str) -> Vec<RawRow> {
    let doc = Html::parse_document(html);
    doc.select(&RESULT_ROWS).map(row).collect()
}

fn row(tr: ElementRef) -> RawRow {
    let classes = tr.value().attr("class").unwrap_or("");
    let kind = if tr.select(&HEADER_CELL).next().is_some() {
        RowKind::Header
    } else if classes
        .split_whitespace()
        .any(|c| SECTION_ROW_CLASSES.contains(&c))
    {
        RowKind::Section
    } else {
        RowKind::Other
    };

    let cells = tr
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .map(|td| RawCell {
            text: text(&td),
            hint: td
                .select(&TITLED)
                .find_map(|el| el.value().attr("title"))
                .and_then(non_blank),
            marker: td.select(&SPAN).next().and_then(|span| non_blank(text(&span))),
        })
        .collect();

    RawRow { kind, cells }
}

/// Reads the `Page (n of m)` indicator.
pub fn page_info(html: &str) -> Option<PageInfo> {
    let doc = Html::parse_document(html);
    let info = doc.select(&PAGE_INDICATOR).find_map(|td| {
        let t = text(&td);
        let caps = regex!(r"Page\s*\(\s*(\d+)\s*of\s*(\d+)\s*\)").captures(&t)?;
        Some(PageInfo {
            current: caps.get(1)?.as_str().parse().ok()?,
            total: caps.get(2)?.as_str().parse().ok()?,
        })
    });
    info
}

pub fn has_page_link(html: &str, page: u32) -> bool {
    let doc = Html::parse_document(html);
    let found = doc
        .select(&LINKS)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| regex!(r"[?&]page=(\d+)").captures(href))
        .any(|caps| caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) == Some(page));
    found
}

fn text(el: &ElementRef) -> String {
    normalize(el.text().collect::<String>())
}
