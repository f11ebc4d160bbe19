use crate::error::CoreError;
use pollme_db::polls::{PollFilter, PollOrder};
use pollme_db::DbPool;
use pollme_models::poll::Poll;
use serde::Serialize;

pub const PAGE_SIZE: i64 = 6;

/// Query modifiers accepted by the poll listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub order: PollOrder,
    /// Raw search term; empty when absent.
    pub search: String,
    pub page: Option<String>,
    /// The incoming query string minus every `page` key, for building
    /// pagination links.
    pub passthrough: String,
}

impl ListParams {
    /// Parse a raw query string.
    ///
    /// `name`, `date` and `vote` are presence flags applied in that order,
    /// each replacing the previous ordering, so `vote` beats `date` beats
    /// `name` regardless of where they appear in the URL. For repeated
    /// keys the last value wins.
    pub fn from_query(raw: Option<&str>) -> Self {
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw.unwrap_or("").as_bytes())
            .into_owned()
            .collect();
        let has = |key: &str| pairs.iter().any(|(k, _)| k == key);
        let last = |key: &str| {
            pairs
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        let mut order = PollOrder::default();
        if has("name") {
            order = PollOrder::Text;
        }
        if has("date") {
            order = PollOrder::PubDate;
        }
        if has("vote") {
            order = PollOrder::VoteCount;
        }

        let passthrough = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs.iter().filter(|(k, _)| k != "page"))
            .finish();

        Self {
            order,
            search: last("search").unwrap_or_default(),
            page: last("page"),
            passthrough,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub per_page: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

pub fn page_count(count: i64, per_page: i64) -> i64 {
    if count <= 0 {
        return 1;
    }
    (count + per_page - 1) / per_page
}

/// Clamp a requested page: unparsable → first page, out of range (including
/// zero and negatives) → last page.
pub fn resolve_page_number(requested: Option<&str>, num_pages: i64) -> i64 {
    let Some(raw) = requested.map(str::trim) else {
        return 1;
    };
    match raw.parse::<i64>() {
        Ok(n) if (1..=num_pages).contains(&n) => n,
        Ok(_) => num_pages,
        Err(_) => 1,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PollListing {
    pub polls: Page<Poll>,
    pub params: String,
    pub search_term: String,
}

/// One page of polls, optionally restricted to a single owner.
pub async fn list_polls(
    pool: &DbPool,
    params: &ListParams,
    owner_id: Option<i64>,
) -> Result<PollListing, CoreError> {
    let filter = PollFilter {
        owner_id,
        search: Some(params.search.clone()).filter(|s| !s.is_empty()),
        order: params.order,
    };

    let count = pollme_db::polls::count_polls(pool, &filter).await?;
    let num_pages = page_count(count, PAGE_SIZE);
    let number = resolve_page_number(params.page.as_deref(), num_pages);
    let offset = (number - 1) * PAGE_SIZE;

    let items: Vec<Poll> = pollme_db::polls::list_polls(pool, &filter, PAGE_SIZE, offset)
        .await?
        .into_iter()
        .map(Poll::from)
        .collect();

    Ok(PollListing {
        polls: Page {
            items,
            number,
            num_pages,
            count,
            per_page: PAGE_SIZE,
            has_next: number < num_pages,
            has_previous: number > 1,
        },
        params: params.passthrough.clone(),
        search_term: params.search.clone(),
    })
}
