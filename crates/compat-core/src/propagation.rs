//! Committing compatible sets and cascading them to dependents.
//!
//! A commit writes one product's set, then recomputes and writes every
//! product that transitively depends on it. The walk is an explicit
//! worklist, never recursion, and each product is written at most once
//! per top-level commit.
//!
//! Dependents are ordered with Kahn's algorithm over the affected
//! subgraph: a product is recomputed only once every affected product it
//! depends on has been written, so diamonds settle in one pass. When the
//! affected subgraph contains a cycle, no member is ever ready; one member
//! of a cycle with nothing pending upstream of it is then committed as-is
//! and the walk continues. Products outside the cycle still wait for it.
//! Cycle members keep the first value computed for them, which may be
//! stale until a caller breaks the cycle and re-issues the affected update.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::engine::derive_compatibility;
use crate::error::Result;
use crate::ids::ProductId;
use crate::spec::{SpecSet, format_set};
use crate::store::Store;

/// One write performed during a cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub product: ProductId,
    pub previous: SpecSet,
    pub current: SpecSet,
}

impl CommitRecord {
    /// Whether the write altered the stored set.
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Every write performed by one top-level commit, in commit order.
///
/// The first record is the product the commit was issued for; the rest are
/// its transitive dependents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    commits: Vec<CommitRecord>,
    /// Products committed while still waiting on a dependency (cycles).
    forced: Vec<ProductId>,
}

impl CascadeReport {
    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    /// The record for the product the commit was issued for.
    pub fn root(&self) -> Option<&CommitRecord> {
        self.commits.first()
    }

    /// Records for the dependents reached by the cascade.
    pub fn dependents(&self) -> &[CommitRecord] {
        self.commits.get(1..).unwrap_or(&[])
    }

    pub fn contains(&self, product: ProductId) -> bool {
        self.commits.iter().any(|c| c.product == product)
    }

    /// Products whose stored set actually changed.
    pub fn changed_products(&self) -> Vec<ProductId> {
        self.commits
            .iter()
            .filter(|c| c.changed())
            .map(|c| c.product)
            .collect()
    }

    /// Products committed ahead of a dependency because of a cycle.
    pub fn forced(&self) -> &[ProductId] {
        &self.forced
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

/// Forward and reverse product-level dependency edges of a store.
struct DependencyIndex {
    /// dependency -> owners of versions that depend on it
    dependents: HashMap<ProductId, BTreeSet<ProductId>>,
    /// owner -> products its versions depend on
    requires: HashMap<ProductId, BTreeSet<ProductId>>,
}

impl DependencyIndex {
    fn build(store: &Store) -> Self {
        let mut dependents: HashMap<ProductId, BTreeSet<ProductId>> = HashMap::new();
        let mut requires: HashMap<ProductId, BTreeSet<ProductId>> = HashMap::new();
        for version in store.versions() {
            for dependency in version.dependencies() {
                dependents
                    .entry(*dependency)
                    .or_default()
                    .insert(version.product());
                requires
                    .entry(version.product())
                    .or_default()
                    .insert(*dependency);
            }
        }
        Self {
            dependents,
            requires,
        }
    }

    fn dependents_of(&self, product: ProductId) -> impl Iterator<Item = ProductId> + '_ {
        self.dependents.get(&product).into_iter().flatten().copied()
    }

    fn requirements_of(&self, product: ProductId) -> impl Iterator<Item = ProductId> + '_ {
        self.requires.get(&product).into_iter().flatten().copied()
    }

    /// Products transitively depending on `root`, in breadth-first order.
    fn reachable_from(&self, root: ProductId) -> Vec<ProductId> {
        let mut seen = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);
        let mut order = Vec::new();
        while let Some(current) = queue.pop_front() {
            for owner in self.dependents_of(current) {
                if seen.insert(owner) {
                    order.push(owner);
                    queue.push_back(owner);
                }
            }
        }
        order
    }
}

/// Commit `new_set` as the compatible set of `product` and cascade.
///
/// Every product owning a version that (transitively) depends on `product`
/// is recomputed with [`derive_compatibility`] and written, each at most
/// once. `product` itself is written with `new_set` and never revisited.
///
/// # Errors
///
/// Returns `Error::UnknownProduct` if `product` is not in the store; in
/// that case nothing is written. Errors from derivation of a dependent
/// indicate a store with dangling references.
pub fn commit_compatibility(
    store: &mut Store,
    product: ProductId,
    new_set: SpecSet,
) -> Result<CascadeReport> {
    store.require_product(product)?;

    let index = DependencyIndex::build(store);
    let affected = index.reachable_from(product);
    let position: HashMap<ProductId, usize> =
        affected.iter().enumerate().map(|(i, p)| (*p, i)).collect();

    // Unwritten affected dependencies per affected product. The root is
    // written first, so it counts like any other affected dependency.
    let mut waiting: HashMap<ProductId, usize> = HashMap::new();
    for owner in &affected {
        let count = index
            .requirements_of(*owner)
            .filter(|dep| dep != owner && (*dep == product || position.contains_key(dep)))
            .count();
        waiting.insert(*owner, count);
    }

    // Keyed by discovery position so ties resolve deterministically.
    let mut pending: BTreeMap<usize, ProductId> = affected.iter().copied().enumerate().collect();
    let mut ready: BTreeSet<usize> = BTreeSet::new();
    let mut report = CascadeReport::default();

    write(store, product, new_set, &mut report)?;
    release(&index, product, &position, &mut waiting, &pending, &mut ready);

    while !pending.is_empty() {
        let next = match ready.pop_first() {
            Some(slot) => slot,
            None => {
                let Some(slot) = break_cycle(&index, &position, &pending) else {
                    break;
                };
                let Some(stuck) = pending.get(&slot).copied() else {
                    break;
                };
                tracing::debug!(product = %stuck, "Dependency cycle, committing without waiting");
                report.forced.push(stuck);
                slot
            }
        };
        let Some(owner) = pending.remove(&next) else {
            continue;
        };

        let derived = derive_compatibility(store, owner)?;
        write(store, owner, derived, &mut report)?;
        release(&index, owner, &position, &mut waiting, &pending, &mut ready);
    }

    tracing::debug!(
        product = %product,
        written = report.len(),
        changed = report.changed_products().len(),
        forced = report.forced().len(),
        "Cascade complete"
    );
    Ok(report)
}

/// Pick the product to force when nothing is ready.
///
/// Every pending product then waits on another pending product, so the
/// pending subgraph has a cycle with no pending dependencies outside it.
/// Starting from the earliest-discovered product, walk upstream until such
/// a cycle is found and return the slot of its earliest-discovered member.
/// Products outside that cycle keep waiting.
fn break_cycle(
    index: &DependencyIndex,
    position: &HashMap<ProductId, usize>,
    pending: &BTreeMap<usize, ProductId>,
) -> Option<usize> {
    let is_pending = |product: &ProductId| {
        position
            .get(product)
            .is_some_and(|slot| pending.contains_key(slot))
    };

    // Pending products `start` waits on, directly or transitively.
    let upstream = |start: ProductId| -> HashSet<ProductId> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for dependency in index.requirements_of(current) {
                if dependency != current && is_pending(&dependency) && seen.insert(dependency) {
                    queue.push_back(dependency);
                }
            }
        }
        seen
    };

    let (_, first) = pending.first_key_value()?;
    let mut current = *first;
    let mut ancestors = upstream(current);
    loop {
        // An ancestor that cannot reach back lies strictly further upstream.
        let further = ancestors
            .iter()
            .copied()
            .filter(|ancestor| !upstream(*ancestor).contains(&current))
            .min_by_key(|ancestor| position.get(ancestor).copied().unwrap_or(usize::MAX));
        match further {
            Some(ancestor) => {
                current = ancestor;
                ancestors = upstream(current);
            }
            None => break,
        }
    }

    ancestors.insert(current);
    ancestors
        .iter()
        .filter_map(|product| position.get(product).copied())
        .min()
}

/// Mark `written` as done for every pending dependent, queueing those that
/// have nothing left to wait for.
fn release(
    index: &DependencyIndex,
    written: ProductId,
    position: &HashMap<ProductId, usize>,
    waiting: &mut HashMap<ProductId, usize>,
    pending: &BTreeMap<usize, ProductId>,
    ready: &mut BTreeSet<usize>,
) {
    for owner in index.dependents_of(written) {
        if owner == written {
            continue;
        }
        let Some(slot) = position.get(&owner).copied() else {
            continue;
        };
        if !pending.contains_key(&slot) {
            continue;
        }
        if let Some(count) = waiting.get_mut(&owner) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                ready.insert(slot);
            }
        }
    }
}

fn write(
    store: &mut Store,
    product: ProductId,
    set: SpecSet,
    report: &mut CascadeReport,
) -> Result<()> {
    tracing::debug!(product = %product, compatible = %format_set(&set), "Committing compatibility");
    let previous = store.product_mut(product)?.set_compatible(set.clone());
    report.commits.push(CommitRecord {
        product,
        previous,
        current: set,
    });
    Ok(())
}
