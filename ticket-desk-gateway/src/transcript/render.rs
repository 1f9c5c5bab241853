//! Self-contained HTML rendering of a ticket's message history.

use chrono::{FixedOffset, Utc};

use super::{TranscriptContext, TranscriptMessage};

const PAGE_STYLE: &str = "body{margin:0;background:#313338;color:#dbdee1;\
font-family:'gg sans','Noto Sans','Helvetica Neue',Helvetica,Arial,sans-serif;}\
header{padding:16px 24px;background:#2b2d31;border-bottom:1px solid #1e1f22;}\
header h1{margin:0 0 4px;font-size:20px;color:#f2f3f5;}\
header p{margin:0;font-size:13px;color:#949ba4;}\
main{padding:8px 24px 24px;}\
.message{padding:8px 0;border-bottom:1px solid #3f4147;}\
.author{font-weight:600;color:#f2f3f5;}\
.bot{margin-left:6px;padding:1px 4px;border-radius:3px;background:#5865f2;color:#fff;font-size:10px;}\
.time{margin-left:8px;font-size:12px;color:#949ba4;}\
.content{margin-top:4px;white-space:pre-wrap;word-wrap:break-word;}\
.embed{margin-top:6px;padding:8px 12px;border-left:4px solid #1e1f22;background:#2b2d31;border-radius:4px;}\
.attachment{display:block;margin-top:4px;color:#00a8fc;}\
.attachment img{max-width:400px;max-height:300px;border-radius:4px;}";

/// Renders transcripts with timestamps in a fixed UTC offset.
#[derive(Debug, Clone)]
pub struct HtmlTranscriptRenderer {
    offset: FixedOffset,
}

impl HtmlTranscriptRenderer {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Render the page, or `None` when there is nothing to render.
    pub fn render(
        &self,
        context: &TranscriptContext,
        messages: &[TranscriptMessage],
    ) -> Option<String> {
        if messages.is_empty() {
            return None;
        }

        let mut html = String::with_capacity(4096 + messages.len() * 256);
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!(
            "<title>Transcript - {}</title>\n",
            escape_html(&context.channel_name)
        ));
        html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", PAGE_STYLE));

        html.push_str(&format!(
            "<header>\n<h1>#{}</h1>\n<p>{} messages &middot; channel {} &middot; closed by user {} &middot; generated {}</p>\n</header>\n<main>\n",
            escape_html(&context.channel_name),
            messages.len(),
            context.channel_id,
            context.closed_by,
            Utc::now()
                .with_timezone(&self.offset)
                .format("%Y-%m-%d %H:%M:%S %:z")
        ));

        for message in messages {
            self.render_message(&mut html, message);
        }

        html.push_str("</main>\n</body>\n</html>\n");
        Some(html)
    }

    fn render_message(&self, html: &mut String, message: &TranscriptMessage) {
        html.push_str(&format!(
            "<div class=\"message\" id=\"m{}\">\n<span class=\"author\" title=\"{}\">{}</span>",
            message.id,
            message.author_id,
            escape_html(&message.author_name)
        ));
        if message.author_is_bot {
            html.push_str("<span class=\"bot\">BOT</span>");
        }
        html.push_str(&format!(
            "<span class=\"time\">{}</span>\n",
            message
                .timestamp
                .with_timezone(&self.offset)
                .format("%Y-%m-%d %H:%M:%S")
        ));

        if !message.content.is_empty() {
            html.push_str(&format!(
                "<div class=\"content\">{}</div>\n",
                escape_html(&message.content)
            ));
        }

        for embed in &message.embeds {
            html.push_str("<div class=\"embed\">");
            if let Some(title) = &embed.title {
                html.push_str(&format!("<strong>{}</strong>", escape_html(title)));
            }
            if let Some(description) = &embed.description {
                if embed.title.is_some() {
                    html.push_str("<br>");
                }
                html.push_str(&escape_html(description));
            }
            html.push_str("</div>\n");
        }

        for attachment in &message.attachments {
            let url = escape_html(&attachment.url);
            let name = escape_html(&attachment.filename);
            if attachment.is_image() {
                html.push_str(&format!(
                    "<a class=\"attachment\" href=\"{url}\"><img src=\"{url}\" alt=\"{name}\"></a>\n"
                ));
            } else {
                html.push_str(&format!(
                    "<a class=\"attachment\" href=\"{url}\">{name}</a>\n"
                ));
            }
        }

        html.push_str("</div>\n");
    }
}

/// Escape text for use in HTML content and quoted attributes.
fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
