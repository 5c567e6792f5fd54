//! The tiered resolution chain.

use std::{sync::Arc, time::Duration};

use {lagebot_common::types::ResolutionResult, tracing::debug};

use crate::{
    gazetteer::RegionIndex,
    lookup::{PlaceLookupService, find_bounded},
    normalize::{is_conversational_noise, strip_location_link, tokenize},
};

/// Gazetteer windows never exceed three tokens: place names are 1–3 words.
const MAX_WINDOW: usize = 3;

/// At three or more candidates a window is too ambiguous to trust; one or two
/// candidates are an exact or near-exact name hit and the first is accepted.
const MAX_TRUSTED_CANDIDATES: usize = 2;

/// Maps free-form text to exactly one region, or decides that none can be
/// found. Stateless across calls: a pure function of the input, the immutable
/// gazetteer and the lookup service's current answer.
pub struct QueryResolver {
    index: Arc<dyn RegionIndex>,
    lookup: Arc<dyn PlaceLookupService>,
    lookup_timeout: Duration,
}

impl QueryResolver {
    pub fn new(
        index: Arc<dyn RegionIndex>,
        lookup: Arc<dyn PlaceLookupService>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            index,
            lookup,
            lookup_timeout,
        }
    }

    /// Resolve `text` to a single region.
    ///
    /// Runs the tiers in order and short-circuits on the first unique hit.
    /// A terminal ambiguity is collapsed to `NotFound`: callers only ever
    /// distinguish "resolved" from "could not understand".
    pub async fn resolve(&self, text: &str) -> ResolutionResult {
        let tokens = tokenize(strip_location_link(text));
        if is_conversational_noise(&tokens) {
            debug!(?tokens, "discarding text as conversational noise");
            return ResolutionResult::NotFound;
        }

        let gazetteer = self.gazetteer_tier(&tokens);
        if gazetteer.is_unique() {
            return gazetteer;
        }

        match self.geocoder_tier(&tokens).await {
            unique @ ResolutionResult::Unique { .. } => unique,
            ResolutionResult::Ambiguous { candidates } => {
                debug!(candidates, "geocoder stayed ambiguous after narrowing");
                ResolutionResult::NotFound
            },
            ResolutionResult::NotFound => ResolutionResult::NotFound,
        }
    }

    /// Gazetteer match, longest window first. A window of the first `i`
    /// tokens is trusted when it yields one or two candidates; zero or three
    /// and more shrink the window instead.
    fn gazetteer_tier(&self, tokens: &[String]) -> ResolutionResult {
        for i in (1..=tokens.len().min(MAX_WINDOW)).rev() {
            let window = tokens[..i].join(" ");
            let matches = self.index.search_by_name(&window);
            match matches.len() {
                0 => continue,
                n if n <= MAX_TRUSTED_CANDIDATES => {
                    debug!(window = %window, candidates = n, "gazetteer hit");
                    return ResolutionResult::Unique {
                        region: matches[0].id,
                    };
                },
                n => {
                    debug!(window = %window, candidates = n, "window too ambiguous, shrinking");
                },
            }
        }
        ResolutionResult::NotFound
    }

    /// External geocoder fallback over the full remaining text; an ambiguous
    /// free search is retried restricted to administrative place types.
    async fn geocoder_tier(&self, tokens: &[String]) -> ResolutionResult {
        let query = tokens.join(" ");
        let hits = find_bounded(self.lookup.as_ref(), &query, false, self.lookup_timeout).await;
        match hits.len() {
            1 => ResolutionResult::Unique { region: hits[0] },
            0 => ResolutionResult::NotFound,
            _ => {
                let narrowed =
                    find_bounded(self.lookup.as_ref(), &query, true, self.lookup_timeout).await;
                match narrowed.len() {
                    1 => ResolutionResult::Unique { region: narrowed[0] },
                    0 => ResolutionResult::NotFound,
                    n => ResolutionResult::Ambiguous { candidates: n },
                }
            },
        }
    }
}
