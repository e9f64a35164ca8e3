//! Minimal HTML helpers: escaping and the document shell.
//!
//! Views build markup with `format!`; every interpolated user or database
//! value goes through [`escape`].

use std::fmt::Write;

const HTMX_SRC: &str = "https://unpkg.com/htmx.org@2.0.4";
const PICO_CSS: &str = "https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css";

/// Escape text for use in element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap a body fragment in a full document with the htmx script and styles.
pub fn document(title: &str, body: &str) -> String {
    let title = escape(title);
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n\
         <link rel=\"stylesheet\" href=\"{PICO_CSS}\">\n\
         <script src=\"{HTMX_SRC}\"></script>\n\
         </head>\n<body>\n<main class=\"container\">\n<h1>{title}</h1>\n{body}\n</main>\n</body>\n</html>\n"
    )
}

/// Render `items` as a `<ul>` using `item` for each `<li>` body, or `empty`
/// as a paragraph when there are none.
pub fn list<T>(items: &[T], empty: &str, item: impl Fn(&T) -> String) -> String {
    if items.is_empty() {
        return format!("<p>{}</p>", escape(empty));
    }
    let mut out = String::from("<ul>");
    for it in items {
        let _ = write!(out, "<li>{}</li>", item(it));
    }
    out.push_str("</ul>");
    out
}

/// A link styled as a button.
pub fn button_link(href: &str, label: &str) -> String {
    format!(
        "<a href=\"{}\" role=\"button\">{}</a>",
        escape(href),
        escape(label)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn document_escapes_title_and_loads_htmx() {
        let doc = document("A < B", "<p>body</p>");
        assert!(doc.contains("<title>A &lt; B</title>"));
        assert!(doc.contains("htmx.org"));
        assert!(doc.contains("<p>body</p>"));
    }

    #[test]
    fn list_renders_placeholder_when_empty() {
        let empty: Vec<&str> = Vec::new();
        assert_eq!(list(&empty, "Nothing yet", |s| escape(s)), "<p>Nothing yet</p>");
        assert_eq!(list(&["a", "b"], "x", |s| escape(s)), "<ul><li>a</li><li>b</li></ul>");
    }
}
