use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tantivy::{
    DocAddress, Searcher, TantivyDocument, Term,
    collector::{DocSetCollector, TopDocs},
    query::{BooleanQuery, FuzzyTermQuery, Occur, Query, TermQuery},
    schema::{IndexRecordOption, Value},
    tokenizer::TokenStream,
};

use crate::search::config::{
    DEFAULT_SEARCH_LIMIT, DEFAULT_THRESHOLD, MAX_FUZZY_DISTANCE, MAX_QUERY_LENGTH,
};
use crate::search::indexer::{IndexedEntry, SearchIndex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Worst accepted score; also bounds the edit distance per query term
    pub threshold: f32,
    /// Maximum number of results to return
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// A matching entry; lower scores are better, `0.0` is an exact match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub entry: IndexedEntry,
    pub score: f32,
}

/// Ranking key of a candidate before it is turned into a result
struct Candidate {
    score: f32,
    relevance: f32,
    ordinal: usize,
}

impl SearchIndex {
    /// Search the index, best match first.
    ///
    /// Each query term matches entry tokens, or their leading part, within an
    /// edit distance of `floor(len * threshold)` (at most 2). An entry's score
    /// is the mean over query terms of `edits / len`, with unmatched terms
    /// counting as 1.0; entries scoring above the threshold are dropped.
    pub fn query(&self, text: &str) -> Result<Vec<SearchResult>> {
        if text.chars().count() > MAX_QUERY_LENGTH {
            bail!("Query too long (max {} characters)", MAX_QUERY_LENGTH);
        }

        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let terms = self.query_terms(text)?;
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let distances = self.term_distances(&searcher, &terms)?;
        let relevance = self.exact_relevance(&searcher, &terms)?;

        let mut candidates = Vec::new();
        for (address, per_term) in distances {
            let score = per_term
                .iter()
                .zip(&terms)
                .map(|(distance, term)| match distance {
                    Some(d) => f32::from(*d) / term.chars().count() as f32,
                    None => 1.0,
                })
                .sum::<f32>()
                / terms.len() as f32;

            if score > self.options.threshold {
                continue;
            }

            candidates.push(Candidate {
                score,
                relevance: relevance.get(&address).copied().unwrap_or(0.0),
                ordinal: self.ordinal_of(&searcher, address)?,
            });
        }

        candidates.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then_with(|| b.relevance.total_cmp(&a.relevance))
                .then_with(|| a.ordinal.cmp(&b.ordinal))
        });
        candidates.truncate(self.options.limit);

        tracing::debug!(
            "Query {:?} ({} terms) matched {} entries",
            text,
            terms.len(),
            candidates.len()
        );

        candidates
            .into_iter()
            .map(|candidate| {
                let entry = self
                    .entries
                    .get(candidate.ordinal)
                    .cloned()
                    .ok_or_else(|| anyhow!("Index refers to unknown entry {}", candidate.ordinal))?;
                Ok(SearchResult {
                    entry,
                    score: candidate.score,
                })
            })
            .collect()
    }

    /// Best match for `text`, if any
    pub fn best_match(&self, text: &str) -> Result<Option<SearchResult>> {
        Ok(self.query(text)?.into_iter().next())
    }

    /// Tokenize a query the same way the text field was indexed
    fn query_terms(&self, text: &str) -> Result<Vec<String>> {
        let mut analyzer = self
            .index
            .tokenizer_for_field(self.fields.text)
            .context("Failed to get tokenizer for text field")?;

        let mut terms: Vec<String> = Vec::new();
        let mut stream = analyzer.token_stream(text);
        while stream.advance() {
            let token = &stream.token().text;
            if !terms.contains(token) {
                terms.push(token.clone());
            }
        }
        Ok(terms)
    }

    /// Edit budget for one query term
    fn max_distance(&self, term: &str) -> u8 {
        let budget = (term.chars().count() as f32 * self.options.threshold).floor();
        (budget.max(0.0) as u8).min(MAX_FUZZY_DISTANCE)
    }

    /// Smallest edit distance at which each query term matches the start of
    /// some token of each entry, so "config" finds "configuration"
    fn term_distances(
        &self,
        searcher: &Searcher,
        terms: &[String],
    ) -> Result<HashMap<DocAddress, Vec<Option<u8>>>> {
        let mut distances: HashMap<DocAddress, Vec<Option<u8>>> = HashMap::new();

        for (position, term_text) in terms.iter().enumerate() {
            let term = Term::from_field_text(self.fields.text, term_text);

            for distance in 0..=self.max_distance(term_text) {
                // A prefix query also accepts whole-token matches
                let query = FuzzyTermQuery::new_prefix(term.clone(), distance, true);

                let matched = searcher
                    .search(&query, &DocSetCollector)
                    .with_context(|| format!("Failed to search for term '{term_text}'"))?;

                for address in matched {
                    let slot = &mut distances
                        .entry(address)
                        .or_insert_with(|| vec![None; terms.len()])[position];
                    if slot.is_none() {
                        *slot = Some(distance);
                    }
                }
            }
        }

        Ok(distances)
    }

    /// BM25 relevance of the exact query terms, used to break score ties
    fn exact_relevance(
        &self,
        searcher: &Searcher,
        terms: &[String],
    ) -> Result<HashMap<DocAddress, f32>> {
        let clauses: Vec<(Occur, Box<dyn Query>)> = terms
            .iter()
            .map(|term_text| {
                let term = Term::from_field_text(self.fields.text, term_text);
                let query: Box<dyn Query> =
                    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                (Occur::Should, query)
            })
            .collect();

        let top_docs = searcher
            .search(&BooleanQuery::new(clauses), &TopDocs::with_limit(self.entries.len()))
            .context("Failed to score exact matches")?;

        Ok(top_docs
            .into_iter()
            .map(|(score, address)| (address, score))
            .collect())
    }

    fn ordinal_of(&self, searcher: &Searcher, address: DocAddress) -> Result<usize> {
        let doc: TantivyDocument = searcher.doc(address)?;
        let ordinal = doc
            .get_first(self.fields.ordinal)
            .and_then(|value| value.as_u64())
            .ok_or_else(|| anyhow!("Indexed document is missing its ordinal"))?;
        Ok(ordinal as usize)
    }
}
