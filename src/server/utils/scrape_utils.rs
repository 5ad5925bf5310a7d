// html scraping for the pages that don't have a json api behind them
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::database::catalog::{MovieboxItem, SflixItem};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("Static selector should parse")
}

static PC_CARD: Lazy<Selector> = Lazy::new(|| selector(".pc-card"));
static PC_CARD_TITLE: Lazy<Selector> = Lazy::new(|| selector(".pc-card-title"));
static PC_LAZY_COVER: Lazy<Selector> = Lazy::new(|| selector(".pc-img-cot span"));
static PC_RATE: Lazy<Selector> = Lazy::new(|| selector(".pc-rate"));
static IMG: Lazy<Selector> = Lazy::new(|| selector("img"));

static FLW_ITEM: Lazy<Selector> = Lazy::new(|| selector(".flw-item"));
static FILM_NAME_LINK: Lazy<Selector> = Lazy::new(|| selector(".film-name a"));
static FILM_POSTER_IMG: Lazy<Selector> = Lazy::new(|| selector(".film-poster img"));
static FILM_POSTER_LINK: Lazy<Selector> = Lazy::new(|| selector(".film-poster a"));
static FDI_ITEM: Lazy<Selector> = Lazy::new(|| selector(".fdi-item"));

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// cards off the moviebox search result page
///
/// card hrefs look like `/detail/zootopia-SxDV9XZ5kg6?id=5256777509147918584`, the slug and the
/// id both come out of it. Cards missing a title, href, slug or id are skipped.
pub fn parse_moviebox_search(html: &str, site_base: &str) -> Vec<MovieboxItem> {
    let document = Html::parse_document(html);
    let Ok(base) = url::Url::parse(site_base) else {
        return Vec::new();
    };

    document
        .select(&PC_CARD)
        .filter_map(|card| {
            let title = card.select(&PC_CARD_TITLE).next().map(text_of)?;
            let href = card.value().attr("href")?;

            let subject_id = base
                .join(href)
                .ok()?
                .query_pairs()
                .find(|(key, _)| key == "id")
                .map(|(_, value)| value.into_owned())
                .filter(|id| !id.is_empty())?;

            let slug = href
                .split('?')
                .next()
                .unwrap_or_default()
                .replace("/detail/", "");
            if slug.is_empty() {
                return None;
            }

            let cover = card
                .select(&PC_LAZY_COVER)
                .next()
                .and_then(|span| non_empty(span.value().attr("data-src")))
                .or_else(|| {
                    card.select(&IMG)
                        .next()
                        .and_then(|img| non_empty(img.value().attr("src")))
                });

            let rating = card
                .select(&PC_RATE)
                .next()
                .map(text_of)
                .filter(|r| !r.is_empty());

            Some(MovieboxItem {
                title,
                id: slug,
                subject_id,
                cover,
                rating,
            })
        })
        .collect()
}

/// `.flw-item` cards off the sflix search page
pub fn parse_sflix_search(html: &str, base_url: &str) -> Vec<SflixItem> {
    let document = Html::parse_document(html);
    let base_url = base_url.trim_end_matches('/');

    document
        .select(&FLW_ITEM)
        .filter_map(|item| {
            let title = item.select(&FILM_NAME_LINK).next().map(text_of)?;
            let href = item.select(&FILM_POSTER_LINK).next()?.value().attr("href")?;

            let poster = item
                .select(&FILM_POSTER_IMG)
                .next()
                .and_then(|img| non_empty(img.value().attr("data-src")));

            let year = item
                .select(&FDI_ITEM)
                .next()
                .map(text_of)
                .filter(|y| !y.is_empty())
                .unwrap_or_else(|| "N/A".to_string());

            Some(SflixItem {
                title,
                link: format!("{}{}", base_url, href),
                poster,
                year,
            })
        })
        .collect()
}
