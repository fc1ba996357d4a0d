//! Homepage feature cards.
//!
//! DESIGN
//! ======
//! `FEATURE_LIST` is a compile-time literal. `render_features` maps it to
//! one `FeatureBlock` per descriptor, preserving order, and
//! `render_section` serializes the blocks into the markup served at `/`.
//! Both are pure: the same input always yields the same output.

use std::fmt::Write;

use serde::Serialize;

// =============================================================================
// DESCRIPTORS
// =============================================================================

/// A single marketing card: title, icon reference, and description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub title: &'static str,
    /// Path of the icon image, relative to the static asset root.
    pub icon: &'static str,
    pub description: &'static str,
}

pub const FEATURE_LIST: [Feature; 3] = [
    Feature {
        title: "Duplicate Detection",
        icon: "img/undraw_docusaurus_mountain.svg",
        description: "Doppelgänger embeds each GitHub issue into a vector, using a locally hosted LLM, \
                      to compare for similarity",
    },
    Feature {
        title: "Pull Request Feedback",
        icon: "img/undraw_docusaurus_tree.svg",
        description: "Doppelgänger helps avoid easy mistakes by analyzing each pull request and asks \
                      the PR author to address any feedback or concerns",
    },
    Feature {
        title: "Open Source",
        icon: "img/undraw_docusaurus_react.svg",
        description: "Doppelgänger will always remain open-source, providing an easy way to locally \
                      host, extend, and customize your own doppelganger",
    },
];

// =============================================================================
// RENDERED TREE
// =============================================================================

/// Icon region of a rendered card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconRegion {
    pub src: String,
    pub role: &'static str,
}

/// One rendered card: an icon region plus a heading and a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureBlock {
    pub icon: IconRegion,
    pub heading: String,
    pub paragraph: String,
}

impl FeatureBlock {
    fn from_feature(feature: &Feature) -> Self {
        Self {
            icon: IconRegion { src: feature.icon.to_owned(), role: "img" },
            heading: feature.title.to_owned(),
            paragraph: feature.description.to_owned(),
        }
    }

    fn write_html(&self, out: &mut String) {
        let _ = write!(
            out,
            r#"<div class="col col--4"><div class="text--center"><img class="featureSvg" role="{role}" src="/{src}" alt=""></div><div class="text--center padding-horiz--md"><h3>{heading}</h3><p>{paragraph}</p></div></div>"#,
            role = self.icon.role,
            src = escape_html(&self.icon.src),
            heading = escape_html(&self.heading),
            paragraph = escape_html(&self.paragraph),
        );
    }
}

/// Map descriptors to rendered blocks, one per descriptor, in input order.
#[must_use]
pub fn render_features(features: &[Feature]) -> Vec<FeatureBlock> {
    features.iter().map(FeatureBlock::from_feature).collect()
}

/// Render the features section markup.
#[must_use]
pub fn render_section(features: &[Feature]) -> String {
    let mut out = String::from(r#"<section class="features"><div class="container"><div class="row">"#);
    for block in render_features(features) {
        block.write_html(&mut out);
    }
    out.push_str("</div></div></section>");
    out
}

/// Render a standalone homepage wrapping the features section.
#[must_use]
pub fn render_homepage(features: &[Feature]) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>Doppelgänger</title></head>\
         <body><main>{}</main></body></html>",
        render_section(features)
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
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

#[cfg(test)]
#[path = "features_test.rs"]
mod tests;
