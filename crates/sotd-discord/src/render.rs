//! Message rendering: one heading line plus a single embed.

use chrono::NaiveDate;
use serde::Serialize;
use sotd_core::{announce::PickKind, track::Track};

const EMBED_COLOR: u32 = 0x3498DB;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
  pub content: String,
  pub embeds:  Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
  pub title:       String,
  pub url:         String,
  pub description: String,
  pub color:       u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub thumbnail:   Option<EmbedImage>,
  pub footer:      EmbedFooter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedImage {
  pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
  pub text: String,
}

/// Build the announcement for `track` on `day`.
pub fn announcement(heading: &str, track: &Track, kind: PickKind, day: NaiveDate) -> Message {
  let footer = match kind {
    PickKind::Random => "Automatically selected • No repeats",
    PickKind::Scheduled => "Scheduled pick",
  };

  Message {
    content: format!("🎶 **{heading} — {}** 🎶", day.format("%A, %B %d, %Y")),
    embeds:  vec![Embed {
      title:       track.title.clone(),
      url:         track.url.clone(),
      description: format!("**Artist:** {}", track.artist_line()),
      color:       EMBED_COLOR,
      thumbnail:   track
        .artwork_url
        .clone()
        .map(|url| EmbedImage { url }),
      footer:      EmbedFooter { text: footer.to_owned() },
    }],
  }
}
