//! Sponsorship tree.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::index::MemberIndex;
use crate::person::Member;

/// One node of the sponsorship tree. The root node has no sponsor and lists
/// every member without a resolvable sponsor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SponsorTree {
    pub sponsor: Option<Arc<Member>>,
    pub sponsored: Vec<SponsorTree>,
}

impl SponsorTree {
    /// Build the full tree from an index.
    pub fn build(index: &MemberIndex) -> Self {
        let groups = group_by_sponsor(index);
        let mut path = HashSet::new();
        Self {
            sponsor: None,
            sponsored: expand(&groups, None, &mut path),
        }
    }

    /// Build the subtree rooted at `member`.
    pub fn subtree(index: &MemberIndex, member: &Arc<Member>) -> Self {
        let groups = group_by_sponsor(index);
        let mut path = HashSet::new();
        path.insert(member.id().to_string());
        Self {
            sponsor: Some(member.clone()),
            sponsored: expand(&groups, Some(member.id()), &mut path),
        }
    }

    /// Total number of members in the tree, counting repeats across branches.
    pub fn len(&self) -> usize {
        self.sponsored
            .iter()
            .map(|child| 1 + child.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sponsored.is_empty()
    }

    /// Depth-first walk yielding `(depth, member)` for every non-root node.
    pub fn walk(&self) -> Vec<(usize, &Arc<Member>)> {
        let mut out = Vec::new();
        self.walk_into(0, &mut out);
        out
    }

    fn walk_into<'a>(&'a self, depth: usize, out: &mut Vec<(usize, &'a Arc<Member>)>) {
        for child in &self.sponsored {
            if let Some(member) = &child.sponsor {
                out.push((depth, member));
            }
            child.walk_into(depth + 1, out);
        }
    }
}

/// Members grouped by the id of their resolved sponsor. `None` collects roots.
fn group_by_sponsor(index: &MemberIndex) -> BTreeMap<Option<String>, Vec<Arc<Member>>> {
    let mut groups: BTreeMap<Option<String>, Vec<Arc<Member>>> = BTreeMap::new();
    for member in index.iter() {
        let key = index.sponsor_of(member).map(|s| s.id().to_string());
        groups.entry(key).or_default().push(member.clone());
    }
    groups
}

/// Expand the children of `sponsor`. Members already on the current
/// root-to-node path are left out, which bounds recursion on cycles.
fn expand(
    groups: &BTreeMap<Option<String>, Vec<Arc<Member>>>,
    sponsor: Option<&str>,
    path: &mut HashSet<String>,
) -> Vec<SponsorTree> {
    let key = sponsor.map(str::to_string);
    let Some(children) = groups.get(&key) else {
        return Vec::new();
    };

    let mut nodes = Vec::with_capacity(children.len());
    for child in children {
        if path.contains(child.id()) {
            continue;
        }
        path.insert(child.id().to_string());
        let sponsored = expand(groups, Some(child.id()), path);
        path.remove(child.id());
        nodes.push(SponsorTree {
            sponsor: Some(child.clone()),
            sponsored,
        });
    }
    nodes
}
