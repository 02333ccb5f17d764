use nucleo_matcher::pattern::{Atom, AtomKind, CaseMatching, Normalization};
use nucleo_matcher::{Config, Matcher, Utf32String};
use storymap_core::{ParagraphId, ParagraphKind};

pub const DEFAULT_RESULT_LIMIT: usize = 5;

/// Anything that can be found by id, title or type label.
pub trait Searchable {
    fn search_id(&self) -> ParagraphId;
    fn search_title(&self) -> &str;
    fn search_kind(&self) -> ParagraphKind;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    pub id: ParagraphId,
    pub title: String,
    pub kind: ParagraphKind,
    /// Higher is better. Exact id matches get a fixed bonus on top.
    pub score: u32,
}

const EXACT_ID_BONUS: u32 = 1 << 16;

pub struct NodeSearch {
    matcher: Matcher,
    limit: usize,
}

impl Default for NodeSearch {
    fn default() -> Self {
        Self::new(DEFAULT_RESULT_LIMIT)
    }
}

impl NodeSearch {
    pub fn new(limit: usize) -> Self {
        Self {
            matcher: Matcher::new(Config::DEFAULT),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Case-insensitive substring search over id, title and type label.
    ///
    /// A blank query returns nothing rather than everything.
    pub fn search<T: Searchable>(&mut self, items: &[T], query: &str) -> Vec<SearchMatch> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        // One literal atom: whitespace is part of the needle and accents are kept.
        let atom = Atom::new(
            query,
            CaseMatching::Ignore,
            Normalization::Never,
            AtomKind::Substring,
            false,
        );

        let mut matches = Vec::new();
        for item in items {
            let id_text = item.search_id().to_string();
            let fields = [
                id_text.as_str(),
                item.search_title(),
                item.search_kind().label(),
            ];
            let best = fields
                .iter()
                .filter_map(|field| {
                    let haystack = Utf32String::from(*field);
                    atom.score(haystack.slice(..), &mut self.matcher)
                })
                .map(u32::from)
                .max();
            let Some(mut score) = best else {
                continue;
            };
            if id_text == query {
                score = score.saturating_add(EXACT_ID_BONUS);
            }
            matches.push(SearchMatch {
                id: item.search_id(),
                title: item.search_title().to_string(),
                kind: item.search_kind(),
                score,
            });
        }

        // Ties resolve by ascending id so results are stable between frames.
        matches.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
        matches.truncate(self.limit);
        tracing::trace!(query, hits = matches.len(), "node search");
        matches
    }
}

/// Search box state: query text, current dropdown, keyboard cursor.
pub struct SearchSession {
    engine: NodeSearch,
    query: String,
    results: Vec<SearchMatch>,
    selected_index: usize,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new(DEFAULT_RESULT_LIMIT)
    }
}

impl SearchSession {
    pub fn new(limit: usize) -> Self {
        Self {
            engine: NodeSearch::new(limit),
            query: String::new(),
            results: Vec::new(),
            selected_index: 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[SearchMatch] {
        &self.results
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    /// The dropdown only shows while there is something to pick.
    pub fn show_dropdown(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn set_query<T: Searchable>(&mut self, items: &[T], query: impl Into<String>) {
        self.query = query.into();
        self.refresh(items);
    }

    /// Re-run the current query, e.g. after the node set was rebuilt.
    pub fn refresh<T: Searchable>(&mut self, items: &[T]) {
        self.results = self.engine.search(items, &self.query);
        if self.selected_index >= self.results.len() {
            self.selected_index = 0;
        }
    }

    pub fn move_selection(&mut self, forward: bool) {
        if self.results.is_empty() {
            return;
        }
        let len = self.results.len();
        self.selected_index = if forward {
            (self.selected_index + 1) % len
        } else {
            (self.selected_index + len - 1) % len
        };
    }

    /// Pick a result; the query is cleared and the id returned for focusing.
    pub fn select(&mut self, index: usize) -> Option<ParagraphId> {
        let id = self.results.get(index).map(|m| m.id)?;
        self.clear();
        Some(id)
    }

    pub fn select_current(&mut self) -> Option<ParagraphId> {
        self.select(self.selected_index)
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
        self.selected_index = 0;
    }
}
