// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use futures::stream::{self, unfold};
use futures::{Stream, StreamExt};
use pin_project::pin_project;
use std::future::Future;
use std::pin::Pin;

/// Describes a type that can be iterated over asyncly when used with [Paginator].
pub trait PageableResponse {
    type PageItem: Send;

    /// Consumes the page, returning the items it contains.
    fn items(self) -> Vec<Self::PageItem>;

    /// The token to fetch the next page. Empty when this is the last page.
    fn next_page_token(&self) -> String;
}

/// An adapter that converts list requests into a [futures::Stream] of pages.
///
/// The stream fetches one page per poll, using the token returned by the
/// previous page. It ends after the page with an empty token. If fetching a
/// page fails the stream yields the error once and then ends.
#[pin_project]
pub struct Paginator<T, E> {
    #[pin]
    stream: Pin<Box<dyn Stream<Item = Result<T, E>> + Send>>,
}

type ControlFlow = std::ops::ControlFlow<(), String>;

impl<T, E> Paginator<T, E>
where
    T: PageableResponse + Send + 'static,
    E: Send + 'static,
{
    /// Creates a new [Paginator] given the initial page token and a function
    /// to fetch the next [PageableResponse].
    pub fn new<F>(
        seed_token: String,
        execute: impl Fn(String) -> F + Clone + Send + 'static,
    ) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let stream = unfold(ControlFlow::Continue(seed_token), move |state| {
            let execute = execute.clone();
            async move {
                let token = match state {
                    ControlFlow::Continue(token) => token,
                    ControlFlow::Break(_) => return None,
                };
                match execute(token).await {
                    Ok(page_resp) => {
                        let tok = page_resp.next_page_token();
                        let next_state = if tok.is_empty() {
                            ControlFlow::Break(())
                        } else {
                            ControlFlow::Continue(tok)
                        };
                        Some((Ok(page_resp), next_state))
                    }
                    Err(e) => Some((Err(e), ControlFlow::Break(()))),
                }
            }
        });
        Self {
            stream: Box::pin(stream),
        }
    }

    /// Returns the next mutation of the wrapped stream.
    pub fn next(&mut self) -> futures::stream::Next<'_, Self> {
        StreamExt::next(self)
    }

    /// Converts the stream of pages into a stream of items.
    pub fn items(self) -> ItemPaginator<T, E> {
        ItemPaginator::new(self)
    }
}

impl<T, E> Stream for Paginator<T, E> {
    type Item = Result<T, E>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.project().stream.poll_next(cx)
    }
}

/// A [futures::Stream] over the items of every page returned by a [Paginator].
///
/// Pages are fetched lazily, only once the items of the previous page are
/// consumed.
#[pin_project]
pub struct ItemPaginator<T, E>
where
    T: PageableResponse,
{
    #[pin]
    stream: Pin<Box<dyn Stream<Item = Result<T::PageItem, E>> + Send>>,
}

impl<T, E> ItemPaginator<T, E>
where
    T: PageableResponse + Send + 'static,
    E: Send + 'static,
{
    fn new(pages: Paginator<T, E>) -> Self {
        let stream = pages
            .map(|page| match page {
                Ok(page) => stream::iter(page.items().into_iter().map(Ok)).left_stream(),
                Err(e) => stream::iter(vec![Err(e)]).right_stream(),
            })
            .flatten();
        Self {
            stream: Box::pin(stream),
        }
    }

    /// Returns the next mutation of the wrapped stream.
    pub fn next(&mut self) -> futures::stream::Next<'_, Self> {
        StreamExt::next(self)
    }
}

impl<T, E> Stream for ItemPaginator<T, E>
where
    T: PageableResponse,
{
    type Item = Result<T::PageItem, E>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.project().stream.poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug)]
    struct TestResponse {
        items: Vec<String>,
        next_page_token: String,
    }

    impl PageableResponse for TestResponse {
        type PageItem = String;

        fn items(self) -> Vec<String> {
            self.items
        }

        fn next_page_token(&self) -> String {
            self.next_page_token.clone()
        }
    }

    fn page(items: &[&str], token: &str) -> TestResponse {
        TestResponse {
            items: items.iter().map(|s| s.to_string()).collect(),
            next_page_token: token.to_string(),
        }
    }

    type Fake = Arc<Mutex<VecDeque<(String, crate::Result<TestResponse>)>>>;

    // Returns a function that verifies the page token and returns the next
    // canned response.
    fn fake(responses: Vec<(&str, crate::Result<TestResponse>)>) -> Fake {
        Arc::new(Mutex::new(
            responses
                .into_iter()
                .map(|(t, r)| (t.to_string(), r))
                .collect(),
        ))
    }

    fn paginator(data: Fake) -> Paginator<TestResponse, Error> {
        let execute = move |token: String| {
            let (want, resp) = data
                .lock()
                .unwrap()
                .pop_front()
                .expect("too many page requests");
            assert_eq!(token, want);
            async move { resp }
        };
        Paginator::new(String::new(), execute)
    }

    #[tokio::test]
    async fn pages() -> anyhow::Result<()> {
        let data = fake(vec![
            ("", Ok(page(&["item1", "item2"], "token1"))),
            ("token1", Ok(page(&[], "token2"))),
            ("token2", Ok(page(&["item3"], ""))),
        ]);
        let mut stream = paginator(data.clone());
        let mut got = Vec::new();
        while let Some(resp) = stream.next().await {
            got.push(resp?);
        }
        assert_eq!(got.len(), 3);
        assert_eq!(got[0].items, vec!["item1", "item2"]);
        assert!(got[1].items.is_empty());
        assert_eq!(got[2].items, vec!["item3"]);
        assert!(data.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn items() -> anyhow::Result<()> {
        let data = fake(vec![
            ("", Ok(page(&["item1", "item2"], "token1"))),
            ("token1", Ok(page(&[], "token2"))),
            ("token2", Ok(page(&["item3"], ""))),
        ]);
        let mut stream = paginator(data).items();
        let mut got = Vec::new();
        while let Some(item) = stream.next().await {
            got.push(item?);
        }
        assert_eq!(got, vec!["item1", "item2", "item3"]);
        Ok(())
    }

    #[tokio::test]
    async fn error_ends_stream() {
        let data = fake(vec![
            ("", Ok(page(&["item1"], "token1"))),
            ("token1", Err(Error::io("broken pipe"))),
        ]);
        let mut stream = paginator(data).items();
        let first = stream.next().await;
        assert!(matches!(&first, Some(Ok(s)) if s == "item1"), "{first:?}");
        let second = stream.next().await;
        assert!(matches!(&second, Some(Err(e)) if e.is_io()), "{second:?}");
        let third = stream.next().await;
        assert!(third.is_none(), "{third:?}");
    }

    #[tokio::test]
    async fn seed_token() -> anyhow::Result<()> {
        let execute = |token: String| async move {
            assert_eq!(token, "seed");
            Ok::<_, Error>(page(&["item1"], ""))
        };
        let mut stream = Paginator::new("seed".to_string(), execute).items();
        let mut got = Vec::new();
        while let Some(item) = stream.next().await {
            got.push(item?);
        }
        assert_eq!(got, vec!["item1"]);
        Ok(())
    }
}
