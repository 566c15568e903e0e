//! Rich-text (HTML) to chat markup.
//!
//! Broadcast bodies are authored in a rich-text editor; chat clients only
//! understand `*bold*`, `_italic_` and `~strike~`.

use std::sync::LazyLock;

use regex::Regex;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rule {
    Rule {
        // Patterns are static literals covered by tests.
        pattern: Regex::new(pattern).expect("static markup pattern"),
        replacement,
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"(?i)<br\s*/?>", "\n"),
        rule(r"(?i)</p\s*>", "\n\n"),
        rule(r"(?i)<p(\s[^>]*)?>", ""),
        rule(r"(?is)<(?:b|strong)(?:\s[^>]*)?>(.*?)</(?:b|strong)\s*>", "*${1}*"),
        rule(r"(?is)<(?:i|em)(?:\s[^>]*)?>(.*?)</(?:i|em)\s*>", "_${1}_"),
        rule(r"(?is)<(?:s|strike|del)(?:\s[^>]*)?>(.*?)</(?:s|strike|del)\s*>", "~${1}~"),
        rule(r"(?i)</?[uo]l(\s[^>]*)?>", "\n"),
        rule(r"(?i)<li(\s[^>]*)?>", "• "),
        rule(r"(?i)</li\s*>", "\n"),
        rule(r"<[^>]*>", ""),
    ]
});

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&rsquo;", "\u{2019}"),
    ("&lsquo;", "\u{2018}"),
    ("&ldquo;", "\u{201C}"),
    ("&rdquo;", "\u{201D}"),
    ("&ndash;", "-"),
    ("&mdash;", "--"),
    // Last, so "&amp;lt;" decodes to "&lt;" and not "<".
    ("&amp;", "&"),
];

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("static markup pattern"));

/// Convert editor HTML into chat markup.  Plain text passes through trimmed.
pub fn html_to_chat(html: &str) -> String {
    let mut out = html.to_owned();
    for r in RULES.iter() {
        out = r.pattern.replace_all(&out, r.replacement).into_owned();
    }
    for (entity, text) in ENTITIES {
        out = out.replace(entity, text);
    }
    BLANK_RUNS.replace_all(&out, "\n\n").trim().to_owned()
}
