//! HTML rendering
//!
//! Builds the directory page and the not-found page with `maud`, which
//! escapes every interpolated name and message. Link targets are
//! percent-encoded per segment.

use maud::{DOCTYPE, Markup, PreEscaped, html};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::storage::{BrowseResult, EntryKind, Listing};

/// Characters left unescaped in a URL path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const STYLE: &str = "body { font-family: Arial, sans-serif; margin:2rem; }
      h1, h2 { color: #333; }
      .messages { color: red; }
      .messages .ok { color: green; }
      ul.items { list-style: none; padding: 0; }
      ul.items li { margin: 0.5rem 0; }
      a.dir { font-weight: bold; }";

/// A message shown above the upload form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    fn class(&self) -> Option<&'static str> {
        match self {
            Notice::Info(_) => Some("ok"),
            Notice::Error(_) => None,
        }
    }

    fn text(&self) -> &str {
        match self {
            Notice::Info(text) | Notice::Error(text) => text,
        }
    }
}

/// Percent-encodes each `/`-separated segment of a relative path
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| utf8_percent_encode(s, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Joins a directory path and a child name, `""` being the root
pub fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), name)
    }
}

fn browse_href(path: &str) -> String {
    format!("/{}", encode_path(path))
}

fn download_href(path: &str) -> String {
    format!("/download/{}", encode_path(path))
}

/// Renders the directory page for `result` with any outcome notices
pub fn render_directory(result: &BrowseResult, notices: &[Notice]) -> Markup {
    let advisory = result.advisory.clone().map(Notice::Error);
    let messages: Vec<&Notice> = notices.iter().chain(advisory.as_ref()).collect();
    let listing = Listing {
        dirs: result.dirs.clone(),
        files: result.files.clone(),
    };

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "File Upload & Browser" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                h1 { "Directory: /" (result.path) }
                @if let Some(parent) = &result.parent {
                    p { a href=(browse_href(parent)) { (PreEscaped("&#x2B06;")) " Up" } }
                }
                @if !messages.is_empty() {
                    div class="messages" {
                        ul {
                            @for notice in &messages {
                                li class=[notice.class()] { (notice.text()) }
                            }
                        }
                    }
                }
                form method="post" enctype="multipart/form-data" action=(browse_href(&result.path)) {
                    input type="file" name="file";
                    button type="submit" { "Upload to /" (result.path) }
                }
                h2 { "Contents" }
                ul class="items" {
                    @for entry in listing.entries() {
                        @let child = join_path(&result.path, &entry.name);
                        li {
                            @match entry.kind {
                                EntryKind::Directory => {
                                    a class="dir" href=(browse_href(&child)) { (entry.name) "/" }
                                }
                                EntryKind::File => {
                                    a href=(download_href(&child)) { (entry.name) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Page returned for every unresolvable, hidden or outside-root target
pub fn render_not_found() -> Markup {
    html! {
        (DOCTYPE)
        html {
            head { title { "404 Not Found" } }
            body {
                h1 { "Not Found" }
                p { "The requested URL was not found on the server." }
            }
        }
    }
}
