//! Lookup indices over the member collection.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::person::Member;

/// Members indexed by id, number, GitHub handle, checksum and canonical path.
///
/// Built once from a finished member list and never mutated afterwards.
#[derive(Debug, Default)]
pub struct MemberIndex {
    by_id: HashMap<String, Arc<Member>>,
    by_num: BTreeMap<u32, Arc<Member>>,
    by_github: HashMap<String, Arc<Member>>,
    by_checksum: HashMap<String, Arc<Member>>,
    by_path: HashMap<PathBuf, Arc<Member>>,
}

impl MemberIndex {
    /// Index `members`. Later entries replace earlier ones on key collisions,
    /// so callers pass members in their final order.
    pub fn build(members: impl IntoIterator<Item = Member>) -> Self {
        let mut index = Self::default();

        for member in members {
            let member = Arc::new(member);

            index.by_id.insert(member.id().to_string(), member.clone());
            if let Some(previous) = index.by_num.insert(member.num(), member.clone()) {
                warn!(
                    num = member.num(),
                    replaced = %previous.id(),
                    kept = %member.id(),
                    "duplicate member number"
                );
            }
            if let Some(github) = member.github() {
                index.by_github.insert(github.to_string(), member.clone());
            }
            index
                .by_checksum
                .insert(member.checksum().to_string(), member.clone());
            index.by_path.insert(member.path().to_path_buf(), member);
        }

        index
    }

    /// Members in ascending number order, one per number.
    ///
    /// A member whose number was taken over by a later entry is only
    /// reachable through the other indices.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Member>> {
        self.by_num.values()
    }

    pub fn len(&self) -> usize {
        self.by_num.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_num.is_empty()
    }

    pub fn by_id(&self, id: &str) -> Option<&Arc<Member>> {
        self.by_id.get(id)
    }

    pub fn by_num(&self, num: u32) -> Option<&Arc<Member>> {
        self.by_num.get(&num)
    }

    pub fn by_github(&self, handle: &str) -> Option<&Arc<Member>> {
        self.by_github.get(handle)
    }

    pub fn by_checksum(&self, checksum: &str) -> Option<&Arc<Member>> {
        self.by_checksum.get(checksum)
    }

    /// Look up by canonical path.
    pub fn by_path(&self, path: &Path) -> Option<&Arc<Member>> {
        self.by_path.get(path)
    }

    /// Resolve a member's sponsor by GitHub handle. Unknown handles resolve to `None`.
    pub fn sponsor_of(&self, member: &Member) -> Option<&Arc<Member>> {
        member
            .sponsor_handle()
            .and_then(|handle| self.by_github(handle))
    }
}
