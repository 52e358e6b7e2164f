use std::borrow::Cow;
use std::fmt::Display;
use std::fmt::Write;

/// Minimal streaming XML writer. Elements with no children are self-closed.
pub(crate) struct XmlWriter {
    out: String,
    stack: Vec<String>,
    tag_open: bool,
}

impl XmlWriter {
    pub(crate) fn new() -> Self {
        Self {
            out: String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"),
            stack: Vec::new(),
            tag_open: false,
        }
    }

    fn close_start_tag(&mut self) {
        if self.tag_open {
            self.out.push('>');
            self.tag_open = false;
        }
    }

    pub(crate) fn start(&mut self, name: &str) -> &mut Self {
        self.close_start_tag();
        self.out.push('<');
        self.out.push_str(name);
        self.stack.push(name.to_string());
        self.tag_open = true;
        self
    }

    pub(crate) fn attr(&mut self, name: &str, value: impl Display) -> &mut Self {
        debug_assert!(self.tag_open, "attribute {name} written outside a start tag");
        let value = value.to_string();
        let _ = write!(self.out, " {}=\"{}\"", name, escape(&value));
        self
    }

    pub(crate) fn attr_opt(&mut self, name: &str, value: Option<impl Display>) -> &mut Self {
        if let Some(v) = value {
            self.attr(name, v);
        }
        self
    }

    pub(crate) fn text(&mut self, text: &str) -> &mut Self {
        self.close_start_tag();
        self.out.push_str(&escape(text));
        self
    }

    pub(crate) fn end(&mut self) -> &mut Self {
        let Some(name) = self.stack.pop() else {
            debug_assert!(false, "end() without matching start()");
            return self;
        };
        if self.tag_open {
            self.out.push_str("/>");
            self.tag_open = false;
        } else {
            let _ = write!(self.out, "</{name}>");
        }
        self
    }

    /// Start and immediately close an element carrying the given attributes.
    pub(crate) fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> &mut Self {
        self.start(name);
        for (k, v) in attrs {
            self.attr(k, v);
        }
        self.end()
    }

    pub(crate) fn finish(mut self) -> String {
        while !self.stack.is_empty() {
            self.end();
        }
        self.out
    }
}

pub(crate) fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Points with two decimals, the unit every length in the package uses.
pub(crate) fn pt(value: f32) -> String {
    format!("{value:.2}pt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_elements_and_escaping() {
        let mut w = XmlWriter::new();
        w.start("a").attr("x", "1 < 2").start("b").text("Tom & Jerry").end();
        w.empty("c", &[("k", "\"v\"")]);
        let xml = w.finish();
        assert!(xml.ends_with(
            "<a x=\"1 &lt; 2\"><b>Tom &amp; Jerry</b><c k=\"&quot;v&quot;\"/></a>"
        ));
    }

    #[test]
    fn lengths_are_points() {
        assert_eq!(pt(12.0), "12.00pt");
        assert_eq!(pt(56.7), "56.70pt");
    }
}
