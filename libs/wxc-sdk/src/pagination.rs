//! `Link`-header pagination as a `Stream`.
//!
//! List endpoints answer with one page of items and, when more exist, an
//! RFC 8288 `Link: <url>; rel="next"` header. [`LinkPager`] turns a page
//! fetcher into a stream of items and [`PagesPager`] into a stream of whole
//! pages. Both are lazy: the next page is requested only once the consumer
//! polls past the last buffered item, and the first page only on the first
//! poll.

use std::collections::VecDeque;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use http::HeaderMap;
use pin_project_lite::pin_project;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::SdkError;
use crate::params::QueryParams;

/// What to fetch next. Query parameters go only on the first request; later
/// pages carry them inside the next link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,
    pub params: Option<QueryParams>,
}

/// One fetched page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<Value>,
    pub next: Option<String>,
}

impl Page {
    /// Splits a response payload into items.
    ///
    /// With `item_key` the items are the array under that key (missing or
    /// `null` means none). Without it an array payload is the item list and
    /// any other non-null payload is a single item.
    #[must_use]
    pub fn from_payload(payload: Value, item_key: Option<&str>, next: Option<String>) -> Self {
        let items = match item_key {
            Some(key) => match payload {
                Value::Object(mut map) => match map.remove(key) {
                    Some(Value::Array(items)) => items,
                    Some(Value::Null) | None => Vec::new(),
                    Some(other) => vec![other],
                },
                _ => Vec::new(),
            },
            None => match payload {
                Value::Array(items) => items,
                Value::Null => Vec::new(),
                other => vec![other],
            },
        };
        Self { items, next }
    }
}

/// Target of the `rel="next"` link, resolved against `current` when
/// relative.
#[must_use]
pub fn next_link(headers: &HeaderMap, current: &str) -> Option<String> {
    let target = headers
        .get_all(http::header::LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(parse_link_header)
        .find(|(_, rel)| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("next")))
        .map(|(target, _)| target)?;

    match Url::parse(&target) {
        Ok(url) => Some(url.into()),
        Err(_) => Url::parse(current)
            .and_then(|base| base.join(&target))
            .ok()
            .map(Into::into),
    }
}

/// `(target, rel)` pairs of one `Link` header value.
fn parse_link_header(value: &str) -> Vec<(String, String)> {
    let mut links = Vec::new();
    let mut rest = value;
    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        let target = &rest[start + 1..start + len];
        rest = &rest[start + len + 1..];

        let params_end = rest.find('<').unwrap_or(rest.len());
        let rel = rest[..params_end]
            .split(';')
            .filter_map(|param| param.split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("rel"))
            .map(|(_, value)| {
                value
                    .trim()
                    .trim_end_matches(',')
                    .trim()
                    .trim_matches('"')
                    .to_owned()
            });
        if let Some(rel) = rel {
            links.push((target.to_owned(), rel));
        }
        rest = &rest[params_end..];
    }
    links
}

pin_project! {
    /// Stream of items across all pages.
    ///
    /// An error (fetch or item validation) is yielded once and ends the
    /// stream.
    pub struct LinkPager<T, F, Fut>
    where
        F: FnMut(PageRequest) -> Fut,
        Fut: Future<Output = Result<Page, SdkError>>,
    {
        pending: Option<PageRequest>,
        buffer: VecDeque<Value>,
        done: bool,
        fetcher: F,
        #[pin]
        current_fetch: Option<Fut>,
        _item: PhantomData<fn() -> T>,
    }
}

impl<T, F, Fut> LinkPager<T, F, Fut>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page, SdkError>>,
{
    #[must_use]
    pub fn new(first: PageRequest, fetcher: F) -> Self {
        Self {
            pending: Some(first),
            buffer: VecDeque::new(),
            done: false,
            fetcher,
            current_fetch: None,
            _item: PhantomData,
        }
    }
}

impl<T, F, Fut> Stream for LinkPager<T, F, Fut>
where
    T: DeserializeOwned,
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page, SdkError>>,
{
    type Item = Result<T, SdkError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if *this.done {
                return Poll::Ready(None);
            }

            if let Some(item) = this.buffer.pop_front() {
                return match serde_json::from_value(item) {
                    Ok(item) => Poll::Ready(Some(Ok(item))),
                    Err(e) => {
                        this.buffer.clear();
                        *this.done = true;
                        Poll::Ready(Some(Err(SdkError::Validation(e))))
                    }
                };
            }

            if let Some(fut) = this.current_fetch.as_mut().as_pin_mut() {
                match fut.poll(cx) {
                    Poll::Ready(Ok(page)) => {
                        this.current_fetch.set(None);
                        *this.pending = page.next.map(|url| PageRequest { url, params: None });
                        this.buffer.extend(page.items);
                        continue;
                    }
                    Poll::Ready(Err(e)) => {
                        this.current_fetch.set(None);
                        *this.done = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                    Poll::Pending => return Poll::Pending,
                }
            }

            let Some(request) = this.pending.take() else {
                *this.done = true;
                return Poll::Ready(None);
            };
            let fut = (this.fetcher)(request);
            this.current_fetch.set(Some(fut));
        }
    }
}

pin_project! {
    /// Stream of whole pages, each deserialized as a `Vec<T>`.
    pub struct PagesPager<T, F, Fut>
    where
        F: FnMut(PageRequest) -> Fut,
        Fut: Future<Output = Result<Page, SdkError>>,
    {
        pending: Option<PageRequest>,
        done: bool,
        fetcher: F,
        #[pin]
        current_fetch: Option<Fut>,
        _item: PhantomData<fn() -> T>,
    }
}

impl<T, F, Fut> PagesPager<T, F, Fut>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page, SdkError>>,
{
    #[must_use]
    pub fn new(first: PageRequest, fetcher: F) -> Self {
        Self {
            pending: Some(first),
            done: false,
            fetcher,
            current_fetch: None,
            _item: PhantomData,
        }
    }
}

impl<T, F, Fut> Stream for PagesPager<T, F, Fut>
where
    T: DeserializeOwned,
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page, SdkError>>,
{
    type Item = Result<Vec<T>, SdkError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if *this.done {
                return Poll::Ready(None);
            }

            if let Some(fut) = this.current_fetch.as_mut().as_pin_mut() {
                return match fut.poll(cx) {
                    Poll::Ready(Ok(page)) => {
                        this.current_fetch.set(None);
                        *this.pending = page.next.map(|url| PageRequest { url, params: None });
                        let items = page
                            .items
                            .into_iter()
                            .map(serde_json::from_value)
                            .collect::<Result<Vec<T>, _>>();
                        if items.is_err() {
                            *this.done = true;
                        }
                        Poll::Ready(Some(items.map_err(SdkError::Validation)))
                    }
                    Poll::Ready(Err(e)) => {
                        this.current_fetch.set(None);
                        *this.done = true;
                        Poll::Ready(Some(Err(e)))
                    }
                    Poll::Pending => Poll::Pending,
                };
            }

            let Some(request) = this.pending.take() else {
                *this.done = true;
                return Poll::Ready(None);
            };
            let fut = (this.fetcher)(request);
            this.current_fetch.set(Some(fut));
        }
    }
}
