#![forbid(unsafe_code)]

/// Served page templates, compiled into the binary.
pub mod assets {
    pub const INDEX_HTML: &str = include_str!("web/index.html");
    pub const ASSESSMENT_HTML: &str = include_str!("web/assessment.html");
    pub const FEEDBACK_HTML: &str = include_str!("web/feedback.html");
    pub const FEEDBACK_THANKS_HTML: &str = include_str!("web/feedback_thanks.html");
    pub const THANKS_HTML: &str = include_str!("web/thanks.html");
    pub const MESSAGE_HTML: &str = include_str!("web/message.html");
    pub const LOGIN_HTML: &str = include_str!("web/login.html");
    pub const DASHBOARD_HTML: &str = include_str!("web/dashboard.html");
    pub const SPECIALISTS_HTML: &str = include_str!("web/specialists.html");
    pub const SPECIALIST_ADD_HTML: &str = include_str!("web/specialist_add.html");
    pub const GENERATE_LINK_HTML: &str = include_str!("web/generate_link.html");
}

/// Replaces each `{{name}}` slot with its value. Values must already be
/// escaped where they carry user input.
pub fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in slots {
        out = out.replace(&format!("{{{{{name}}}}}"), value);
    }
    out
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
