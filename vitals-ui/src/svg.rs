use std::fmt::Write as _;

/// Compact number formatting for coordinates: at most two decimals, no trailing zeros.
pub fn fmt_num(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Escape text for use in XML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

/// Minimal append-only markup writer. Attribute values are escaped.
#[derive(Default)]
pub struct Markup {
    buf: String,
}

impl Markup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, tag: &str, attrs: &[(&str, String)]) -> &mut Self {
        self.start_tag(tag, attrs);
        self.buf.push('>');
        self
    }

    pub fn close(&mut self, tag: &str) -> &mut Self {
        let _ = write!(self.buf, "</{tag}>");
        self
    }

    pub fn empty(&mut self, tag: &str, attrs: &[(&str, String)]) -> &mut Self {
        self.start_tag(tag, attrs);
        self.buf.push_str("/>");
        self
    }

    /// `<tag attrs>text</tag>` with `text` escaped.
    pub fn element(&mut self, tag: &str, attrs: &[(&str, String)], text: &str) -> &mut Self {
        self.open(tag, attrs);
        self.buf.push_str(&escape(text));
        self.close(tag)
    }

    pub fn finish(self) -> String {
        self.buf
    }

    fn start_tag(&mut self, tag: &str, attrs: &[(&str, String)]) {
        let _ = write!(self.buf, "<{tag}");
        for (name, value) in attrs {
            let _ = write!(self.buf, " {name}=\"{}\"", escape(value));
        }
    }
}
