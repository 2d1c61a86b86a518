//! CSS serialization for evaluated rules.

use super::eval::CssRule;
use super::{Options, OutputStyle};

pub(crate) fn print(rules: &[CssRule], options: &Options) -> String {
    let mut css = String::new();
    for rule in rules {
        if rule.declarations.is_empty() {
            continue;
        }
        match options.style {
            OutputStyle::Expanded => {
                css.push_str(&rule.selectors.join(",\n"));
                css.push_str(" {\n");
                for declaration in &rule.declarations {
                    css.push_str("  ");
                    css.push_str(&declaration.property);
                    css.push_str(": ");
                    css.push_str(&declaration.value);
                    css.push_str(";\n");
                }
                css.push_str("}\n");
            }
            OutputStyle::Compressed => {
                css.push_str(&rule.selectors.join(","));
                css.push('{');
                let mut first = true;
                for declaration in &rule.declarations {
                    if !first {
                        css.push(';');
                    }
                    first = false;
                    css.push_str(&declaration.property);
                    css.push(':');
                    css.push_str(&declaration.value);
                }
                css.push('}');
            }
        }
    }
    if let Some(url) = &options.source_map_url {
        css.push_str("/*# sourceMappingURL=");
        css.push_str(url);
        css.push_str(" */");
        if options.style == OutputStyle::Expanded {
            css.push('\n');
        }
    }
    css
}

#[cfg(test)]
mod tests {
    use super::super::eval::CssDeclaration;
    use super::*;

    fn rule(selectors: &[&str], declarations: &[(&str, &str)]) -> CssRule {
        CssRule {
            selectors: selectors.iter().map(ToString::to_string).collect(),
            declarations: declarations
                .iter()
                .map(|(property, value)| CssDeclaration {
                    property: (*property).to_string(),
                    value: (*value).to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_expanded_layout() {
        let rules = vec![rule(&[".a"], &[("color", "red"), ("margin", "0")])];
        let options = Options::default();
        assert_eq!(
            print(&rules, &options),
            ".a {\n  color: red;\n  margin: 0;\n}\n"
        );
    }

    #[test]
    fn test_expanded_selector_group_one_per_line() {
        let rules = vec![rule(&["h1", "h2"], &[("color", "red")])];
        let options = Options::default();
        assert_eq!(print(&rules, &options), "h1,\nh2 {\n  color: red;\n}\n");
    }

    #[test]
    fn test_compressed_layout() {
        let rules = vec![
            rule(&["h1", "h2"], &[("color", "red"), ("margin", "0")]),
            rule(&[".b"], &[("top", "1px")]),
        ];
        let options = Options {
            style: OutputStyle::Compressed,
            source_map_url: None,
        };
        assert_eq!(
            print(&rules, &options),
            "h1,h2{color:red;margin:0}.b{top:1px}"
        );
    }

    #[test]
    fn test_empty_rule_is_omitted() {
        let rules = vec![rule(&[".a"], &[]), rule(&[".b"], &[("color", "red")])];
        let options = Options::default();
        assert_eq!(print(&rules, &options), ".b {\n  color: red;\n}\n");
    }

    #[test]
    fn test_source_map_comment_trails_output() {
        let rules = vec![rule(&[".a"], &[("color", "red")])];
        let options = Options {
            style: OutputStyle::Expanded,
            source_map_url: Some("style.css.map".to_string()),
        };
        assert_eq!(
            print(&rules, &options),
            ".a {\n  color: red;\n}\n/*# sourceMappingURL=style.css.map */\n"
        );
    }

    #[test]
    fn test_no_rules_prints_nothing() {
        let options = Options::default();
        assert_eq!(print(&[], &options), "");
    }
}
