//! Utility rule table and CSS generation
//!
//! A class is `variant:variant:utility`. Utilities resolve through the
//! custom rules first, then the static table, then the parametric families
//! (spacing scale and color palette). Unknown classes produce no CSS.

use crate::config::StyleConfig;
use indexmap::IndexMap;

const PREFLIGHT: &str = "*,::before,::after{box-sizing:border-box}\
body{margin:0;font-family:ui-sans-serif,system-ui,sans-serif;line-height:1.5}\
img,svg{display:block;max-width:100%}";

const STATIC_RULES: &[(&str, &str)] = &[
    ("block", "display:block"),
    ("inline-block", "display:inline-block"),
    ("flex", "display:flex"),
    ("inline-flex", "display:inline-flex"),
    ("grid", "display:grid"),
    ("hidden", "display:none"),
    ("flex-row", "flex-direction:row"),
    ("flex-col", "flex-direction:column"),
    ("flex-wrap", "flex-wrap:wrap"),
    ("items-start", "align-items:flex-start"),
    ("items-center", "align-items:center"),
    ("items-end", "align-items:flex-end"),
    ("justify-start", "justify-content:flex-start"),
    ("justify-center", "justify-content:center"),
    ("justify-between", "justify-content:space-between"),
    ("justify-end", "justify-content:flex-end"),
    ("text-left", "text-align:left"),
    ("text-center", "text-align:center"),
    ("text-right", "text-align:right"),
    ("text-xs", "font-size:0.75rem;line-height:1rem"),
    ("text-sm", "font-size:0.875rem;line-height:1.25rem"),
    ("text-base", "font-size:1rem;line-height:1.5rem"),
    ("text-lg", "font-size:1.125rem;line-height:1.75rem"),
    ("text-xl", "font-size:1.25rem;line-height:1.75rem"),
    ("text-2xl", "font-size:1.5rem;line-height:2rem"),
    ("text-3xl", "font-size:1.875rem;line-height:2.25rem"),
    ("font-normal", "font-weight:400"),
    ("font-medium", "font-weight:500"),
    ("font-semibold", "font-weight:600"),
    ("font-bold", "font-weight:700"),
    ("italic", "font-style:italic"),
    ("underline", "text-decoration-line:underline"),
    ("rounded", "border-radius:0.25rem"),
    ("rounded-md", "border-radius:0.375rem"),
    ("rounded-lg", "border-radius:0.5rem"),
    ("rounded-full", "border-radius:9999px"),
    ("border", "border-width:1px;border-style:solid"),
    ("shadow", "box-shadow:0 1px 3px 0 rgb(0 0 0 / 0.1),0 1px 2px -1px rgb(0 0 0 / 0.1)"),
    ("w-full", "width:100%"),
    ("h-full", "height:100%"),
    ("mx-auto", "margin-left:auto;margin-right:auto"),
    ("cursor-pointer", "cursor:pointer"),
];

const SPACING: &[(&str, &[&str])] = &[
    ("p", &["padding"]),
    ("px", &["padding-left", "padding-right"]),
    ("py", &["padding-top", "padding-bottom"]),
    ("pt", &["padding-top"]),
    ("pr", &["padding-right"]),
    ("pb", &["padding-bottom"]),
    ("pl", &["padding-left"]),
    ("m", &["margin"]),
    ("mx", &["margin-left", "margin-right"]),
    ("my", &["margin-top", "margin-bottom"]),
    ("mt", &["margin-top"]),
    ("mr", &["margin-right"]),
    ("mb", &["margin-bottom"]),
    ("ml", &["margin-left"]),
    ("gap", &["gap"]),
];

const MAX_SPACING_STEP: u32 = 96;

const PALETTE: &[(&str, &[(&str, &str)])] = &[
    (
        "gray",
        &[
            ("100", "#f3f4f6"),
            ("300", "#d1d5db"),
            ("500", "#6b7280"),
            ("700", "#374151"),
            ("900", "#111827"),
        ],
    ),
    (
        "red",
        &[
            ("100", "#fee2e2"),
            ("300", "#fca5a5"),
            ("500", "#ef4444"),
            ("700", "#b91c1c"),
            ("900", "#7f1d1d"),
        ],
    ),
    (
        "green",
        &[
            ("100", "#dcfce7"),
            ("300", "#86efac"),
            ("500", "#22c55e"),
            ("700", "#15803d"),
            ("900", "#14532d"),
        ],
    ),
    (
        "blue",
        &[
            ("100", "#dbeafe"),
            ("300", "#93c5fd"),
            ("500", "#3b82f6"),
            ("700", "#1d4ed8"),
            ("900", "#1e3a8a"),
        ],
    ),
];

const COLOR_PROPERTIES: &[(&str, &str)] = &[
    ("text", "color"),
    ("bg", "background-color"),
    ("border", "border-color"),
];

const PSEUDO_VARIANTS: &[&str] = &["hover", "focus", "active"];

const BREAKPOINTS: &[(&str, &str)] = &[("sm", "640px"), ("md", "768px"), ("lg", "1024px")];

fn spacing_value(step: &str) -> Option<String> {
    if step == "px" {
        return Some("1px".to_string());
    }
    let n: u32 = step.parse().ok()?;
    if n > MAX_SPACING_STEP {
        return None;
    }
    if n == 0 {
        return Some("0px".to_string());
    }
    Some(format!("{}rem", f64::from(n) * 0.25))
}

fn color_value(name: &str) -> Option<&'static str> {
    match name {
        "white" => return Some("#fff"),
        "black" => return Some("#000"),
        "transparent" => return Some("transparent"),
        _ => {}
    }
    let (hue, shade) = name.rsplit_once('-')?;
    PALETTE
        .iter()
        .find(|(h, _)| *h == hue)?
        .1
        .iter()
        .find(|(s, _)| *s == shade)
        .map(|(_, value)| *value)
}

/// Escape a class name for use in a selector
fn escape_selector(class: &str) -> String {
    let mut out = String::with_capacity(class.len() + 1);
    out.push('.');
    for ch in class.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
    out
}

/// Rules installed by the style plugin's setup.
#[derive(Debug, Clone)]
pub struct RuleTable {
    preflight: bool,
    rules: IndexMap<String, String>,
}

impl RuleTable {
    pub fn new(config: &StyleConfig) -> Self {
        let mut rules: IndexMap<String, String> = STATIC_RULES
            .iter()
            .map(|(class, decls)| (class.to_string(), decls.to_string()))
            .collect();
        for (class, decls) in &config.rules {
            rules.insert(class.clone(), decls.trim().trim_end_matches(';').to_string());
        }
        Self {
            preflight: config.preflight,
            rules,
        }
    }

    /// Declarations of a bare utility (no variants)
    pub fn declarations(&self, utility: &str) -> Option<String> {
        if let Some(decls) = self.rules.get(utility) {
            return Some(decls.clone());
        }

        let (prefix, rest) = utility.split_once('-')?;

        if let Some((_, properties)) = SPACING.iter().find(|(p, _)| *p == prefix) {
            let value = spacing_value(rest)?;
            return Some(
                properties
                    .iter()
                    .map(|property| format!("{property}:{value}"))
                    .collect::<Vec<_>>()
                    .join(";"),
            );
        }

        if let Some((_, property)) = COLOR_PROPERTIES.iter().find(|(p, _)| *p == prefix) {
            return color_value(rest).map(|value| format!("{property}:{value}"));
        }

        None
    }

    /// Full CSS rule for a class, including its variants
    fn rule(&self, class: &str) -> Option<Rule> {
        let mut parts: Vec<&str> = class.split(':').collect();
        let utility = parts.pop()?;
        let declarations = self.declarations(utility)?;

        let mut pseudo = String::new();
        let mut media = None;
        for variant in parts {
            if PSEUDO_VARIANTS.contains(&variant) {
                pseudo.push(':');
                pseudo.push_str(variant);
            } else if let Some((_, width)) = BREAKPOINTS.iter().find(|(b, _)| *b == variant) {
                if media.is_some() {
                    return None;
                }
                media = Some(*width);
            } else {
                return None;
            }
        }

        Some(Rule {
            css: format!("{}{pseudo}{{{declarations}}}", escape_selector(class)),
            media,
        })
    }

    /// Stylesheet for the given classes.
    ///
    /// Base rules come first in class order, then responsive rules grouped
    /// by breakpoint from narrow to wide so wider screens win.
    pub fn stylesheet<'c>(&self, classes: impl IntoIterator<Item = &'c str>) -> Option<String> {
        let mut base = Vec::new();
        let mut responsive: IndexMap<&str, Vec<String>> = BREAKPOINTS
            .iter()
            .map(|(_, width)| (*width, Vec::new()))
            .collect();

        for class in classes {
            let Some(rule) = self.rule(class) else {
                continue;
            };
            match rule.media {
                None => base.push(rule.css),
                Some(width) => responsive.entry(width).or_default().push(rule.css),
            }
        }

        if base.is_empty() && responsive.values().all(Vec::is_empty) {
            return None;
        }

        let mut css = String::new();
        if self.preflight {
            css.push_str(PREFLIGHT);
        }
        css.push_str(&base.concat());
        for (width, rules) in responsive {
            if !rules.is_empty() {
                css.push_str(&format!("@media (min-width:{width}){{{}}}", rules.concat()));
            }
        }
        Some(css)
    }
}

struct Rule {
    css: String,
    media: Option<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RuleTable {
        RuleTable::new(&StyleConfig::new().preflight(false))
    }

    #[test]
    fn static_utilities() {
        assert_eq!(table().declarations("flex").as_deref(), Some("display:flex"));
        assert_eq!(
            table().declarations("text-center").as_deref(),
            Some("text-align:center")
        );
    }

    #[test]
    fn spacing_scale() {
        let t = table();
        assert_eq!(t.declarations("p-4").as_deref(), Some("padding:1rem"));
        assert_eq!(t.declarations("mt-0").as_deref(), Some("margin-top:0px"));
        assert_eq!(t.declarations("gap-px").as_deref(), Some("gap:1px"));
        assert_eq!(
            t.declarations("px-2").as_deref(),
            Some("padding-left:0.5rem;padding-right:0.5rem")
        );
        assert_eq!(t.declarations("p-1000"), None);
        assert_eq!(t.declarations("p-x"), None);
    }

    #[test]
    fn palette_colors() {
        let t = table();
        assert_eq!(
            t.declarations("bg-blue-500").as_deref(),
            Some("background-color:#3b82f6")
        );
        assert_eq!(t.declarations("text-white").as_deref(), Some("color:#fff"));
        assert_eq!(t.declarations("text-purple-500"), None);
        assert_eq!(t.declarations("border-gray-300").as_deref(), Some("border-color:#d1d5db"));
    }

    #[test]
    fn custom_rules_override_builtins() {
        let t = RuleTable::new(
            &StyleConfig::new()
                .rule("flex", "display:flex;gap:1rem;")
                .rule("btn", "padding:0.5rem 1rem"),
        );
        assert_eq!(t.declarations("flex").as_deref(), Some("display:flex;gap:1rem"));
        assert_eq!(t.declarations("btn").as_deref(), Some("padding:0.5rem 1rem"));
    }

    #[test]
    fn variants_escape_the_selector() {
        let css = table().stylesheet(["hover:bg-red-500"]).unwrap();
        assert_eq!(css, ".hover\\:bg-red-500:hover{background-color:#ef4444}");
    }

    #[test]
    fn responsive_rules_follow_base_rules() {
        let css = table()
            .stylesheet(["md:flex", "lg:hidden", "sm:block", "p-2"])
            .unwrap();
        assert_eq!(
            css,
            ".p-2{padding:0.5rem}\
             @media (min-width:640px){.sm\\:block{display:block}}\
             @media (min-width:768px){.md\\:flex{display:flex}}\
             @media (min-width:1024px){.lg\\:hidden{display:none}}"
        );
    }

    #[test]
    fn unknown_classes_produce_nothing() {
        assert_eq!(table().stylesheet(["card", "wobble:flex", "sm:md:flex"]), None);
    }

    #[test]
    fn preflight_leads_the_stylesheet() {
        let css = RuleTable::new(&StyleConfig::default())
            .stylesheet(["flex"])
            .unwrap();
        assert!(css.starts_with("*,::before,::after{box-sizing:border-box}"));
        assert!(css.ends_with(".flex{display:flex}"));
    }
}
