//! HAL-style hypermedia wrappers for joke responses.

use crate::{
    errors::JokeError,
    models::{Joke, Page, PageRequest},
    service::JokeService,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

pub const JOKES_PATH: &str = "/api/v1/jokes";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Link {
    pub href: String,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

pub type Links = BTreeMap<&'static str, Link>;

/// A joke plus its `self` link and, when the following day has a joke, a
/// `nextDay` link.
#[derive(Debug, Serialize)]
pub struct JokeModel {
    #[serde(flatten)]
    pub joke: Joke,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Debug, Serialize)]
pub struct Embedded {
    pub jokes: Vec<JokeModel>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
    pub number: u32,
}

#[derive(Debug, Serialize)]
pub struct PagedModel {
    #[serde(rename = "_embedded", skip_serializing_if = "Option::is_none")]
    pub embedded: Option<Embedded>,
    #[serde(rename = "_links")]
    pub links: Links,
    pub page: PageMetadata,
}

#[derive(Debug, Clone, Default)]
pub struct JokeModelAssembler {
    base_url: String,
}

impl JokeModelAssembler {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn joke_href(&self, id: Uuid) -> String {
        format!("{}{}/{}", self.base_url, JOKES_PATH, id)
    }

    fn collection_href(&self, date_from: Option<NaiveDate>, page: u32, request: &PageRequest) -> String {
        let mut href = format!("{}{}?", self.base_url, JOKES_PATH);
        if let Some(date) = date_from {
            href.push_str(&format!("date={}&", date));
        }
        href.push_str(&format!("page={}&size={}", page, request.size));
        for order in &request.sort {
            href.push_str(&format!("&sort={}", order));
        }
        href
    }

    pub async fn to_model(&self, service: &JokeService, joke: Joke) -> Result<JokeModel, JokeError> {
        let mut links = Links::new();
        links.insert("self", Link::new(self.joke_href(joke.id)));

        if let Some(next_date) = joke.date.succ_opt() {
            if let Some(next) = service.get_for_date(next_date).await? {
                links.insert("nextDay", Link::new(self.joke_href(next.id)));
            }
        }

        Ok(JokeModel { joke, links })
    }

    pub async fn to_paged_model(
        &self,
        service: &JokeService,
        page: Page<Joke>,
        date_from: Option<NaiveDate>,
        request: &PageRequest,
    ) -> Result<PagedModel, JokeError> {
        let metadata = PageMetadata {
            size: page.size,
            total_elements: page.total_elements,
            total_pages: page.total_pages(),
            number: page.number,
        };

        let mut links = Links::new();
        links.insert("self", Link::new(self.collection_href(date_from, page.number, request)));
        if page.has_previous() {
            links.insert("first", Link::new(self.collection_href(date_from, 0, request)));
            links.insert("prev", Link::new(self.collection_href(date_from, page.number - 1, request)));
        }
        if page.has_next() {
            let last = u32::try_from(metadata.total_pages.saturating_sub(1)).unwrap_or(u32::MAX);
            links.insert("next", Link::new(self.collection_href(date_from, page.number + 1, request)));
            links.insert("last", Link::new(self.collection_href(date_from, last, request)));
        }

        let mut jokes = Vec::with_capacity(page.content.len());
        for joke in page.content {
            jokes.push(self.to_model(service, joke).await?);
        }
        let embedded = (!jokes.is_empty()).then_some(Embedded { jokes });

        Ok(PagedModel {
            embedded,
            links,
            page: metadata,
        })
    }
}
