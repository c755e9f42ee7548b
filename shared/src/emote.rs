/// Emote token handling for Kick chat text.
///
/// Kick embeds emotes inline as `[emote:<id>:<name>]`. For the page they become
/// `<img>` tags pointing at the emote CDN; for search and export they carry no
/// visible text.
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Default base URL for emote images.
pub const DEFAULT_EMOTE_BASE: &str = "https://files.kick.com/emotes";

/// Rendered emote edge length in pixels.
const EMOTE_SIZE: u32 = 28;

static EMOTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[emote:(\d+):([A-Za-z0-9]*)\]").unwrap()
});

/// Image URL for an emote id.
pub fn emote_url(base: &str, id: &str) -> String {
    format!("{}/{}/fullsize", base.trim_end_matches('/'), id)
}

/// Render chat text as HTML: escape the text, turn emote tokens into `<img>` tags.
pub fn render_html(content: &str, emote_base: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut last = 0;

    for caps in EMOTE_RE.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&escape_html(&content[last..whole.start()]));
        out.push_str(&img_tag(&caps, emote_base));
        last = whole.end();
    }
    out.push_str(&escape_html(&content[last..]));
    out
}

/// Visible text of a message: emote tokens removed, everything else kept.
pub fn plain_text(content: &str) -> String {
    EMOTE_RE.replace_all(content, "").into_owned()
}

fn img_tag(caps: &Captures<'_>, emote_base: &str) -> String {
    let id = &caps[1];
    format!(
        r#"<img src="{}" alt="{}" width="{size}" height="{size}" />"#,
        emote_url(emote_base, id),
        id,
        size = EMOTE_SIZE,
    )
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
