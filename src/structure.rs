use crate::markup::Element;
use crate::node::{NodeId, NodeTree};
use indexmap::IndexMap;
use std::collections::BTreeMap;

type Levels = BTreeMap<usize, IndexMap<NodeId, Vec<NodeId>>>;

// depth -> container -> bound leaves, document order within each depth
#[derive(Debug, Default)]
pub struct Layout {
    levels: Levels,
}

impl Layout {
    pub fn deepest_first(&self) -> impl Iterator<Item = (usize, &IndexMap<NodeId, Vec<NodeId>>)> {
        self.levels.iter().rev().map(|(depth, level)| (*depth, level))
    }

    pub fn roots(&self) -> Vec<NodeId> {
        self.levels
            .get(&0)
            .map(|level| level.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }
}

fn merge(into: &mut Levels, from: Levels) {
    for (depth, level) in from {
        into.entry(depth).or_default().extend(level);
    }
}

pub fn walk(root: &Element) -> (NodeTree<'_>, Layout) {
    let mut tree = NodeTree::new();
    let (levels, _) = walk_children(&mut tree, root, None, 0);
    tracing::debug!(
        nodes = tree.len(),
        depth = levels.len(),
        "structural parse complete"
    );
    (tree, Layout { levels })
}

// Returns the levels found below `element` and the leaves bound to `parent`.
// A top-level leaf has no container and is bound to itself.
fn walk_children<'a>(
    tree: &mut NodeTree<'a>,
    element: &'a Element,
    parent: Option<NodeId>,
    depth: usize,
) -> (Levels, Vec<NodeId>) {
    let mut levels = Levels::new();
    let mut bound = Vec::new();

    for child in &element.children {
        let id = tree.push(child, parent);
        inherit_ctx(tree, id, element);

        if child.is_leaf() {
            match parent {
                Some(_) => bound.push(id),
                None => {
                    levels.entry(depth).or_default().insert(id, vec![id]);
                }
            }
        } else {
            levels.entry(depth).or_default().insert(id, Vec::new());
            let (nested, leaves) = walk_children(tree, child, Some(id), depth + 1);
            if let Some(slot) = levels.get_mut(&depth).and_then(|level| level.get_mut(&id)) {
                *slot = leaves;
            }
            merge(&mut levels, nested);
        }
    }

    (levels, bound)
}

fn inherit_ctx(tree: &mut NodeTree<'_>, id: NodeId, parent_element: &Element) {
    let inherited = match tree.get(id).parent {
        Some(p) => parent_element
            .attr("ctx")
            .map(str::to_string)
            .or_else(|| tree.get(p).meta.get("ctx").cloned()),
        None => None,
    };
    if let Some(ctx) = inherited {
        tree.get_mut(id).meta.insert("ctx".to_string(), ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::load;

    fn tags(tree: &NodeTree<'_>, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|id| tree.element(*id).tag.clone()).collect()
    }

    #[test]
    fn test_top_level_leaf_binds_to_itself() {
        let root = load("<m><foo/></m>").unwrap();
        let (tree, layout) = walk(&root);
        let levels: Vec<_> = layout.deepest_first().collect();
        assert_eq!(levels.len(), 1);
        let (depth, level) = levels[0];
        assert_eq!(depth, 0);
        let (container, leaves) = level.get_index(0).unwrap();
        assert_eq!(leaves, &vec![*container]);
        assert_eq!(tree.element(*container).tag, "foo");
    }

    #[test]
    fn test_leaves_bound_to_parent() {
        let root = load("<m><list><e>1</e><e>2</e></list></m>").unwrap();
        let (tree, layout) = walk(&root);
        let roots = layout.roots();
        assert_eq!(tags(&tree, &roots), vec!["list"]);
        let (_, level) = layout.deepest_first().last().unwrap();
        assert_eq!(tags(&tree, &level[&roots[0]]), vec!["e", "e"]);
    }

    #[test]
    fn test_depths_are_true_nesting_depths() {
        let root = load(
            "<m><list><e>1</e><list><tuple><e>a</e><set><e>1</e></set></tuple></list></list></m>",
        )
        .unwrap();
        let (tree, layout) = walk(&root);
        let order: Vec<(usize, Vec<String>)> = layout
            .deepest_first()
            .map(|(d, level)| (d, tags(&tree, &level.keys().copied().collect::<Vec<_>>())))
            .collect();
        assert_eq!(
            order,
            vec![
                (3, vec!["set".to_string()]),
                (2, vec!["tuple".to_string()]),
                (1, vec!["list".to_string()]),
                (0, vec!["list".to_string()]),
            ]
        );
        assert_eq!(layout.depth(), 4);
    }

    #[test]
    fn test_document_order_within_depth() {
        let root = load("<m><a><x/></a><b/><c><y/></c></m>").unwrap();
        let (tree, layout) = walk(&root);
        assert_eq!(tags(&tree, &layout.roots()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ctx_hint_inherited() {
        let root = load(r#"<m><tuple ctx="store"><list><e>1</e></list></tuple></m>"#).unwrap();
        let (tree, layout) = walk(&root);
        let tuple = layout.roots()[0];
        let list = tree.children(tuple)[0];
        let e = tree.children(list)[0];
        assert_eq!(tree.get(tuple).meta.get("ctx"), None);
        assert_eq!(tree.get(list).meta.get("ctx").map(String::as_str), Some("store"));
        assert_eq!(tree.get(e).meta.get("ctx").map(String::as_str), Some("store"));
    }
}
