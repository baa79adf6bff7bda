//! Blog Content
//!
//! Blog post model, validation of raw data-file entries, and body rendering.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::FetchError;
use crate::fetch::{ContentFetcher, FetchOptions};
use crate::markdown::{escape_html, MarkdownRenderer};

/// Fields every blog entry must carry with a truthy value
pub const REQUIRED_FIELDS: [&str; 4] = ["id", "title", "content", "date"];

// == Blog Post ==
/// One entry of the blog data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    /// Numeric or string identifier
    pub id: Value,
    #[serde(deserialize_with = "scalar_text")]
    pub title: String,
    #[serde(deserialize_with = "scalar_text")]
    pub date: String,
    pub content: BlogContent,
    /// Render `content` as Markdown instead of plain text
    #[serde(default, deserialize_with = "truthy_flag")]
    pub is_markdown: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub related_projects: Vec<String>,
}

/// Post body: a single text field or a list of structured blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlogContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A structured content block. Its remaining fields depend on the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Paragraph,
    Heading,
    List,
    Image,
    Code,
}

impl BlogPost {
    /// HTML for the post body.
    ///
    /// Markdown-flagged text is rendered, other text is escaped. Structured
    /// blocks return `None`; page templates lay those out.
    pub fn body_html(&self, renderer: &MarkdownRenderer) -> Option<String> {
        match &self.content {
            BlogContent::Text(text) if self.is_markdown => Some(renderer.render(text.as_str())),
            BlogContent::Text(text) => Some(escape_html(text)),
            BlogContent::Blocks(_) => None,
        }
    }
}

// == Data File Shape ==
/// The blog data file: either a bare array or wrapped in `{"data": [...]}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum BlogFeed {
    Bare(Vec<Value>),
    Wrapped { data: Vec<Value> },
}

impl BlogFeed {
    pub fn into_entries(self) -> Vec<Value> {
        match self {
            BlogFeed::Wrapped { data } => data,
            BlogFeed::Bare(entries) => entries,
        }
    }
}

// == Lenient Fields ==
// Data files are hand-edited; accept what the page templates would display.

/// Strings as-is; numbers and booleans in their JSON spelling.
fn scalar_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected text, found {}", other))),
    }
}

fn truthy_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(is_truthy(&Value::deserialize(deserializer)?))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// == Validation ==
/// JavaScript truthiness, which the data files were authored against.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Keeps the entries that carry every required field and decode as a post.
///
/// Rejected entries are logged and skipped, never fatal.
pub fn validate_blogs(raw: &[Value]) -> Vec<BlogPost> {
    let posts: Vec<BlogPost> = raw
        .iter()
        .filter_map(|entry| {
            if let Some(field) = REQUIRED_FIELDS
                .iter()
                .find(|field| !entry.get(**field).is_some_and(is_truthy))
            {
                warn!(field, entry = %entry, "Blog entry missing required field");
                return None;
            }

            serde_json::from_value(entry.clone())
                .map_err(|e| warn!(error = %e, entry = %entry, "Invalid blog entry"))
                .ok()
        })
        .collect();

    if posts.is_empty() {
        warn!("No valid blog entries found in the data source.");
    }
    posts
}

// == Loading ==
/// Fetches the blog data file through `fetcher` and validates it.
pub async fn load_blogs(
    fetcher: &ContentFetcher,
    url: &str,
    options: FetchOptions,
) -> Result<Vec<BlogPost>, FetchError> {
    let feed: BlogFeed = fetcher.fetch_json(url, options).await?;
    Ok(validate_blogs(&feed.into_entries()))
}
