//! Branch availability parser
//!
//! Availability is published as a heading ("Ubicación de este libro") followed
//! by a list whose items read `<branch name> <stock>`. The same grammar is used
//! by every layout revision, so the parser is a single strategy.

use crate::extract::dom::{contains_any, element_text, find_next, select, select_within};
use crate::extract::PageContext;
use crate::record::Location;
use regex::Regex;
use std::sync::LazyLock;

const LOCATION_MARKERS: &[&str] = &["ubicación", "ubicacion"];

/// Lazy branch name, optional whitespace, trailing digit run
static ITEM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*(\d+)$").expect("availability pattern is valid"));

/// Extracts positive-stock branch entries, in list order
///
/// A page without a location heading (or without a list after it) yields an
/// empty sequence; that is the normal "no data" state.
pub fn extract_locations(ctx: &PageContext<'_>) -> Vec<Location> {
    let Some(heading) = select(ctx.document, "h3, h4, h5")
        .into_iter()
        .find(|heading| contains_any(&element_text(*heading), LOCATION_MARKERS))
    else {
        tracing::debug!("No location heading on {}", ctx.url);
        return Vec::new();
    };

    let Some(list) = find_next(ctx.document, heading, "ul") else {
        tracing::debug!("Location heading without a following list on {}", ctx.url);
        return Vec::new();
    };

    select_within(list, "li")
        .into_iter()
        .filter_map(|item| {
            let text = element_text(item);
            let parsed = parse_location_item(&text);
            if parsed.is_none() {
                tracing::debug!("Dropped availability item {:?} on {}", text, ctx.url);
            }
            parsed
        })
        .collect()
}

/// Parses one normalized list item such as `"Baquedano 1"`
///
/// Returns `None` for items without a trailing count, without a branch name,
/// or with zero stock.
pub fn parse_location_item(text: &str) -> Option<Location> {
    let text = text.replace('\u{a0}', " ");
    let captures = ITEM_PATTERN.captures(text.trim())?;

    let branch = captures.get(1)?.as_str().trim();
    let digits = captures.get(2)?.as_str();
    let stock = match digits.parse::<u64>() {
        Ok(stock) => stock,
        Err(e) => {
            tracing::debug!("Stock {:?} for {:?} out of range: {}", digits, branch, e);
            return None;
        }
    };

    if branch.is_empty() || stock == 0 {
        return None;
    }

    Some(Location {
        branch: branch.to_string(),
        stock,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tests::with_page;

    fn loc(branch: &str, stock: u64) -> Location {
        Location {
            branch: branch.to_string(),
            stock,
        }
    }

    #[test]
    fn test_parse_simple_item() {
        assert_eq!(parse_location_item("Baquedano 1"), Some(loc("Baquedano", 1)));
    }

    #[test]
    fn test_zero_stock_dropped() {
        assert_eq!(parse_location_item("Bellavista 0"), None);
        assert_eq!(parse_location_item("Bellavista 000"), None);
    }

    #[test]
    fn test_multiword_branch_and_glued_digits() {
        assert_eq!(
            parse_location_item("Universidad de Chile\u{a0}12"),
            Some(loc("Universidad de Chile", 12))
        );
        assert_eq!(parse_location_item("Los Héroes3"), Some(loc("Los Héroes", 3)));
    }

    #[test]
    fn test_branch_name_keeps_inner_digits() {
        assert_eq!(
            parse_location_item("Línea 5 Plaza de Armas 2"),
            Some(loc("Línea 5 Plaza de Armas", 2))
        );
    }

    #[test]
    fn test_items_without_count_or_branch_dropped() {
        assert_eq!(parse_location_item("Sin ejemplares"), None);
        assert_eq!(parse_location_item("7"), None);
        assert_eq!(parse_location_item(""), None);
    }

    #[test]
    fn test_large_stock_kept() {
        assert_eq!(
            parse_location_item("Baquedano 99999999999"),
            Some(loc("Baquedano", 99_999_999_999))
        );
        assert_eq!(parse_location_item("Baquedano 99999999999999999999999"), None);
    }

    #[test]
    fn test_extract_from_page() {
        let html = r#"
            <div class="col">
                <h4>Ubicación de este libro</h4>
            </div>
            <div class="col">
                <ul>
                    <li>Baquedano&nbsp;1</li>
                    <li>Bellavista <span>0</span></li>
                    <li>Tobalaba 4</li>
                    <li>Consultar en mesón</li>
                </ul>
            </div>
        "#;
        with_page(html, |ctx| {
            assert_eq!(
                extract_locations(ctx),
                vec![loc("Baquedano", 1), loc("Tobalaba", 4)]
            );
        });
    }

    #[test]
    fn test_h5_heading_accepted() {
        let html = "<h5>UBICACIÓN</h5><ul><li>Baquedano 2</li></ul>";
        with_page(html, |ctx| {
            assert_eq!(extract_locations(ctx), vec![loc("Baquedano", 2)]);
        });
    }

    #[test]
    fn test_lists_before_heading_ignored() {
        let html = "<ul><li>Menú 1</li></ul><h4>Ubicación de este libro</h4><ul><li>Baquedano 1</li></ul>";
        with_page(html, |ctx| {
            assert_eq!(extract_locations(ctx), vec![loc("Baquedano", 1)]);
        });
    }

    #[test]
    fn test_page_without_location_heading_is_empty() {
        let html = "<h4>Comentarios</h4><ul><li>Baquedano 1</li></ul>";
        with_page(html, |ctx| {
            assert!(extract_locations(ctx).is_empty());
        });
    }

    #[test]
    fn test_heading_without_list_is_empty() {
        with_page("<h4>Ubicación de este libro</h4><p>Sin stock</p>", |ctx| {
            assert!(extract_locations(ctx).is_empty());
        });
    }
}
