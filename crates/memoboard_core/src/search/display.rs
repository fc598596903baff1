//! Filter, sort and search over memo lists.
//!
//! Stage order is fixed: color filter, then sort, then text search.

use crate::model::memo::{Memo, MemoColor};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Board ordering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Newest first.
    CreatedAt,
    /// Palette hue order; unknown colors last.
    Color,
    /// Manual drag-and-drop order.
    #[default]
    Position,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Color => "color",
            Self::Position => "position",
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortKey(pub String);

impl Display for UnknownSortKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown sort key `{}`; expected created_at|color|position",
            self.0
        )
    }
}

impl Error for UnknownSortKey {}

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created_at" | "created" => Ok(Self::CreatedAt),
            "color" => Ok(Self::Color),
            "position" => Ok(Self::Position),
            other => Err(UnknownSortKey(other.to_string())),
        }
    }
}

/// Everything the board needs to derive its visible list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    pub sort: SortKey,
    /// `None` shows every color.
    pub color_filter: Option<MemoColor>,
    /// Case-insensitive substring query; empty matches everything.
    pub query: String,
}

/// Keeps only memos of `color`. `None` keeps everything.
pub fn filter_by_color(memos: &[Memo], color: Option<&MemoColor>) -> Vec<Memo> {
    match color {
        Some(color) => memos
            .iter()
            .filter(|memo| &memo.color == color)
            .cloned()
            .collect(),
        None => memos.to_vec(),
    }
}

/// Returns a sorted copy. Sorting is stable.
pub fn sort_memos(memos: &[Memo], sort: SortKey) -> Vec<Memo> {
    let mut sorted = memos.to_vec();
    match sort {
        SortKey::CreatedAt => sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Color => sorted.sort_by(|a, b| {
            compare_color(&a.color, &b.color).then_with(|| a.position.cmp(&b.position))
        }),
        SortKey::Position => sorted.sort_by_key(|memo| memo.position),
    }
    sorted
}

/// Keeps memos whose title or content contains `query`, ignoring case.
pub fn search_memos(memos: &[Memo], query: &str) -> Vec<Memo> {
    if query.is_empty() {
        return memos.to_vec();
    }
    memos
        .iter()
        .filter(|memo| memo.matches_query(query))
        .cloned()
        .collect()
}

/// Full pipeline: filter, sort, search.
///
/// Idempotent: feeding the output back in yields the same list.
pub fn process_memos_for_display(memos: &[Memo], options: &DisplayOptions) -> Vec<Memo> {
    let filtered = filter_by_color(memos, options.color_filter.as_ref());
    let sorted = sort_memos(&filtered, options.sort);
    search_memos(&sorted, &options.query)
}

/// Total order over colors following the palette priority table.
pub fn compare_color(a: &MemoColor, b: &MemoColor) -> Ordering {
    match (a.priority(), b.priority()) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.hex().cmp(b.hex()),
    }
}

#[cfg(test)]
mod tests {
    use super::{compare_color, process_memos_for_display, DisplayOptions, SortKey};
    use crate::model::memo::{Memo, MemoColor};
    use std::cmp::Ordering;
    use uuid::Uuid;

    fn memo(title: &str, color: MemoColor, position: i64, created_at: i64) -> Memo {
        let mut memo = Memo::new(Uuid::nil(), title, "", color, position);
        memo.created_at = created_at;
        memo
    }

    fn titles(memos: &[Memo]) -> Vec<&str> {
        memos.iter().map(|memo| memo.title.as_str()).collect()
    }

    #[test]
    fn sort_key_parses_known_values() {
        assert_eq!("created_at".parse::<SortKey>().unwrap(), SortKey::CreatedAt);
        assert_eq!(" Color ".parse::<SortKey>().unwrap(), SortKey::Color);
        assert!("title".parse::<SortKey>().is_err());
    }

    #[test]
    fn created_at_sort_is_newest_first() {
        let memos = vec![
            memo("old", MemoColor::Red, 0, 100),
            memo("new", MemoColor::Red, 1, 300),
            memo("mid", MemoColor::Red, 2, 200),
        ];
        let options = DisplayOptions {
            sort: SortKey::CreatedAt,
            ..DisplayOptions::default()
        };
        assert_eq!(
            titles(&process_memos_for_display(&memos, &options)),
            ["new", "mid", "old"]
        );
    }

    #[test]
    fn color_sort_follows_palette_and_puts_unknown_last() {
        let memos = vec![
            memo("legacy", MemoColor::Other("#FFE4B5".to_string()), 0, 0),
            memo("purple", MemoColor::Purple, 1, 0),
            memo("red", MemoColor::Red, 2, 0),
            memo("green", MemoColor::Green, 3, 0),
        ];
        let options = DisplayOptions {
            sort: SortKey::Color,
            ..DisplayOptions::default()
        };
        assert_eq!(
            titles(&process_memos_for_display(&memos, &options)),
            ["red", "green", "purple", "legacy"]
        );
    }

    #[test]
    fn compare_color_is_consistent_with_priority_table() {
        let palette = MemoColor::palette();
        for (i, left) in palette.iter().enumerate() {
            for (j, right) in palette.iter().enumerate() {
                assert_eq!(compare_color(left, right), i.cmp(&j));
            }
            let unknown = MemoColor::Other("#000000".to_string());
            assert_eq!(compare_color(left, &unknown), Ordering::Less);
            assert_eq!(compare_color(&unknown, left), Ordering::Greater);
        }
    }

    #[test]
    fn search_is_case_insensitive_and_combines_with_color_filter() {
        let mut shopping = memo("Shopping", MemoColor::Blue, 0, 0);
        shopping.content = "Buy MILK".to_string();
        let memos = vec![
            shopping,
            memo("milk tea recipe", MemoColor::Red, 1, 0),
            memo("Ideas", MemoColor::Blue, 2, 0),
        ];

        let options = DisplayOptions {
            sort: SortKey::Position,
            color_filter: Some(MemoColor::Blue),
            query: "milk".to_string(),
        };
        assert_eq!(
            titles(&process_memos_for_display(&memos, &options)),
            ["Shopping"]
        );
    }

    #[test]
    fn empty_query_returns_filtered_sorted_list_unchanged() {
        let memos = vec![
            memo("b", MemoColor::Yellow, 1, 0),
            memo("a", MemoColor::Yellow, 0, 0),
        ];
        let without_query = DisplayOptions::default();
        let sorted = process_memos_for_display(&memos, &without_query);
        assert_eq!(titles(&sorted), ["a", "b"]);
        assert_eq!(super::search_memos(&sorted, ""), sorted);
    }

    #[test]
    fn pipeline_is_idempotent_for_every_sort_key() {
        let memos = vec![
            memo("one", MemoColor::Blue, 2, 5),
            memo("two", MemoColor::Red, 0, 5),
            memo("three", MemoColor::Other("#123456".to_string()), 1, 9),
            memo("four", MemoColor::Blue, 3, 1),
        ];
        for sort in [SortKey::CreatedAt, SortKey::Color, SortKey::Position] {
            let options = DisplayOptions {
                sort,
                color_filter: None,
                query: "o".to_string(),
            };
            let once = process_memos_for_display(&memos, &options);
            let twice = process_memos_for_display(&once, &options);
            assert_eq!(once, twice, "sort={sort}");
        }
    }
}
