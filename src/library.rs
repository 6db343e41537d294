use crate::models::Manga;
use std::cmp::Ordering;
use std::collections::BTreeSet;

pub const ALL_GENRES: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    Rating,
    Views,
    Title,
}

#[derive(Debug, Clone, Default)]
pub struct LibraryQuery {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub sort: SortBy,
}

/// Substring match on title, author or any genre, ignoring case.
pub fn search(list: Vec<Manga>, query: &str) -> Vec<Manga> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return list;
    }

    list.into_iter()
        .filter(|m| {
            m.title.to_lowercase().contains(&needle)
                || m.author.to_lowercase().contains(&needle)
                || m.genres.iter().any(|g| g.to_lowercase().contains(&needle))
        })
        .collect()
}

pub fn filter_by_genre(list: Vec<Manga>, genre: &str) -> Vec<Manga> {
    if genre.is_empty() || genre == ALL_GENRES {
        return list;
    }
    list.into_iter()
        .filter(|m| m.genres.iter().any(|g| g == genre))
        .collect()
}

/// `"all"` followed by every distinct genre in sorted order.
pub fn all_genres(list: &[Manga]) -> Vec<String> {
    let genres: BTreeSet<&str> = list
        .iter()
        .flat_map(|m| m.genres.iter().map(String::as_str))
        .collect();

    std::iter::once(ALL_GENRES.to_string())
        .chain(genres.into_iter().map(str::to_string))
        .collect()
}

pub fn sort(mut list: Vec<Manga>, by: SortBy) -> Vec<Manga> {
    match by {
        SortBy::Rating => list.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal)),
        SortBy::Views => list.sort_by(|a, b| b.views.cmp(&a.views)),
        SortBy::Title => list.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase())),
    }
    list
}

pub fn browse(list: Vec<Manga>, query: &LibraryQuery) -> Vec<Manga> {
    let list = match &query.search {
        Some(text) => search(list, text),
        None => list,
    };
    let list = match &query.genre {
        Some(genre) => filter_by_genre(list, genre),
        None => list,
    };
    sort(list, query.sort)
}

pub fn top_rated(list: Vec<Manga>, limit: usize) -> Vec<Manga> {
    let mut sorted = sort(list, SortBy::Rating);
    sorted.truncate(limit);
    sorted
}

pub fn trending(list: Vec<Manga>) -> Vec<Manga> {
    list.into_iter().filter(|m| m.is_trending).collect()
}

pub fn featured(list: Vec<Manga>) -> Vec<Manga> {
    list.into_iter().filter(|m| m.is_featured).collect()
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rating" => Ok(SortBy::Rating),
            "views" => Ok(SortBy::Views),
            "title" => Ok(SortBy::Title),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}
