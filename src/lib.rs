pub mod builder;
pub mod config;
pub mod emit;
pub mod error;
pub mod ir;
pub mod literal;
pub mod logging;
pub mod markup;
pub mod node;
pub mod semantics;
pub mod structure;

use builder::Builder;
use config::{Config, OutputFormat};
use error::{Error, Result};
use ir::{Expr, Module};
use markup::Element;
use std::io;
use std::path::PathBuf;

pub fn parse(root: &Element) -> Result<Module> {
    parse_with(root, &Config::default())
}

pub fn parse_with(root: &Element, config: &Config) -> Result<Module> {
    // Stage 1
    let (mut tree, layout) = structure::walk(root);

    // Stage 2
    Builder::new(config).build_module(&mut tree, &layout)
}

pub fn build(element: &Element) -> Result<Expr> {
    let wrapper = Element::new("module").with_child(element.clone());
    let module = parse(&wrapper)?;
    match module.body.into_iter().next() {
        Some(ir::Stmt::Expr { value }) => Ok(value),
        Some(ir::Stmt::Assign { target, value }) => Ok(Expr::assign(target, value)),
        None => Err(Error::malformed(element.tag.clone(), "produced no statement")),
    }
}

pub fn compile(text: &str, config: &Config) -> Result<String> {
    // Stage 0
    let root = markup::load(text)?;

    // Stages 1+2
    let module = parse_with(&root, config)?;

    // Stage 3
    match config.format {
        OutputFormat::Source => Ok(emit::to_source(&module)),
        OutputFormat::Json => {
            let mut json = if config.pretty {
                serde_json::to_string_pretty(&module)?
            } else {
                serde_json::to_string(&module)?
            };
            json.push('\n');
            Ok(json)
        }
    }
}

pub fn list_files(inputs: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let is_xml = |p: &PathBuf| {
        p.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
    };
    let mut out: Vec<PathBuf> = Vec::new();

    for p in inputs {
        if p.is_dir() {
            for entry in std::fs::read_dir(p)? {
                let sub_path = entry?.path();
                if sub_path.is_dir() {
                    out.extend(list_files(&[sub_path])?);
                } else if sub_path.is_file() && is_xml(&sub_path) {
                    out.push(sub_path);
                }
            }
        } else if p.is_file() {
            // Explicitly named files are taken regardless of extension
            out.push(p.clone());
        }
    }

    out.sort();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ExprContext, Literal, SequenceKind};

    #[test]
    fn test_simple_compile() {
        let result = compile("<m><age>15</age><age/></m>", &Config::default()).unwrap();
        assert_eq!(result, "age = 15\nage\n");
    }

    #[test]
    fn test_determinism() {
        let input = "<m><list><e>1</e><e>x</e></list><dict><item name=\"a\">1</item></dict></m>";
        let config = Config::default();
        let r1 = compile(input, &config).unwrap();
        let r2 = compile(input, &config).unwrap();
        assert_eq!(r1, r2);
    }

    #[test]
    fn test_compile_json() {
        let config = Config {
            format: OutputFormat::Json,
            pretty: false,
            ..Config::default()
        };
        let result = compile("<m><e>1</e></m>", &config).unwrap();
        assert_eq!(
            result,
            "{\"body\":[{\"stmt\":\"expr\",\"value\":{\"node\":\"literal\",\"value\":{\"type\":\"int\",\"value\":1}}}]}\n"
        );
    }

    #[test]
    fn test_compile_json_every_node() {
        let config = Config {
            format: OutputFormat::Json,
            ..Config::default()
        };
        let input = concat!(
            "<m>",
            "<list><e>1</e></list>",
            "<dict><item name=\"a\">1</item></dict>",
            "<f call=\"1\"><item name=\"k\">x</item></f>",
            "<o><attr name=\"p\"/></o>",
            "<fstring>Hi <who/></fstring>",
            "<x>...</x>",
            "</m>"
        );
        let result = compile(input, &config).unwrap();
        let json: serde_json::Value = serde_json::from_str(&result).unwrap();
        let one = serde_json::json!({"node": "literal", "value": {"type": "int", "value": 1}});
        assert_eq!(
            json,
            serde_json::json!({"body": [
                {"stmt": "expr", "value": {
                    "node": "sequence", "kind": "list", "elts": [one], "ctx": "load"
                }},
                {"stmt": "expr", "value": {"node": "mapping", "entries": [["a", one]]}},
                {"stmt": "expr", "value": {
                    "node": "call",
                    "func": {"node": "name", "id": "f", "ctx": "load"},
                    "args": [],
                    "keywords": [{
                        "arg": "k",
                        "value": {"node": "literal", "value": {"type": "str", "value": "x"}}
                    }]
                }},
                {"stmt": "expr", "value": {
                    "node": "attribute",
                    "value": {"node": "name", "id": "o", "ctx": "load"},
                    "attr": "p",
                    "ctx": "load"
                }},
                {"stmt": "expr", "value": {"node": "interpolated", "parts": [
                    {"segment": "text", "value": "Hi"},
                    {"segment": "expr", "value": {"node": "name", "id": "who", "ctx": "load"}}
                ]}},
                {"stmt": "assign",
                    "target": {"node": "name", "id": "x", "ctx": "store"},
                    "value": {"node": "literal", "value": {"type": "ellipsis"}}
                }
            ]})
        );
    }

    #[test]
    fn test_build_subtree() {
        let element = Element::new("list")
            .with_child(Element::new("e").with_text("1"))
            .with_child(Element::new("e").with_text("2"));
        let expr = build(&element).unwrap();
        assert_eq!(
            expr,
            Expr::Sequence {
                kind: SequenceKind::List,
                elts: vec![
                    Expr::literal(Literal::Int(1)),
                    Expr::literal(Literal::Int(2)),
                ],
                ctx: ExprContext::Load,
            }
        );
    }

    #[test]
    fn test_build_assignment_subtree() {
        let expr = build(&Element::new("x").with_text("1")).unwrap();
        assert_eq!(
            expr,
            Expr::assign(
                Expr::name("x", ExprContext::Store),
                Expr::literal(Literal::Int(1))
            )
        );
    }

    #[test]
    fn test_markup_errors_propagate() {
        assert!(matches!(
            compile("<m><e>", &Config::default()),
            Err(Error::Markup(_))
        ));
    }
}
