use crate::config::Config;
use crate::error::{Error, Result};
use crate::ir::{Module, Stmt};
use crate::node::NodeTree;
use crate::semantics::{Evaluator, Value};
use crate::structure::Layout;

pub struct Builder<'c> {
    config: &'c Config,
}

impl<'c> Builder<'c> {
    pub fn new(config: &'c Config) -> Self {
        Builder { config }
    }

    // Children always resolve before the containers that read them.
    pub fn evaluate(&self, tree: &mut NodeTree<'_>, layout: &Layout) -> Result<()> {
        for (depth, level) in layout.deepest_first() {
            tracing::trace!(depth, containers = level.len(), "evaluating level");
            for (container, leaves) in level {
                for leaf in leaves.iter().filter(|leaf| *leaf != container) {
                    let value = Evaluator::new(tree, self.config).evaluate(*leaf)?;
                    tree.set_value(*leaf, value);
                }
                let value = Evaluator::new(tree, self.config).evaluate(*container)?;
                tree.set_value(*container, value);
            }
        }
        Ok(())
    }

    pub fn build_module(&self, tree: &mut NodeTree<'_>, layout: &Layout) -> Result<Module> {
        self.evaluate(tree, layout)?;
        let mut body = Vec::new();
        for root in layout.roots() {
            match tree.value(root)? {
                Value::Expr(expr) => body.push(Stmt::from(expr.clone())),
                _ => {
                    return Err(Error::malformed(
                        tree.path(root),
                        "top-level element does not produce a value",
                    ))
                }
            }
        }
        tracing::debug!(statements = body.len(), "module assembled");
        Ok(Module { body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Expr, ExprContext, Literal, SequenceKind};
    use crate::markup::load;
    use crate::structure::walk;

    fn module(xml: &str) -> Result<Module> {
        let root = load(xml).unwrap();
        let (mut tree, layout) = walk(&root);
        Builder::new(&Config::default()).build_module(&mut tree, &layout)
    }

    #[test]
    fn test_single_leaf_statement() {
        let m = module("<m><e>15</e></m>").unwrap();
        assert_eq!(
            m.body,
            vec![Stmt::Expr {
                value: Expr::literal(Literal::Int(15))
            }]
        );
    }

    #[test]
    fn test_children_resolved_before_parent() {
        let m = module("<m><list><e>1</e><e>2</e></list></m>").unwrap();
        assert_eq!(
            m.body,
            vec![Stmt::Expr {
                value: Expr::Sequence {
                    kind: SequenceKind::List,
                    elts: vec![
                        Expr::literal(Literal::Int(1)),
                        Expr::literal(Literal::Int(2)),
                    ],
                    ctx: ExprContext::Load,
                }
            }]
        );
    }

    #[test]
    fn test_statements_in_document_order() {
        let m = module("<m><a/><b>1</b><c/></m>").unwrap();
        assert_eq!(m.body.len(), 3);
        assert!(matches!(&m.body[1], Stmt::Assign { .. }));
    }

    #[test]
    fn test_top_level_item_is_malformed() {
        let err = module(r#"<m><item name="k">1</item></m>"#).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
    }

    #[test]
    fn test_empty_document() {
        let m = module("<m/>").unwrap();
        assert!(m.body.is_empty());
    }
}
