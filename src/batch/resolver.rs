//! Target resolution: from a raw specification to concrete resources.
//!
//! Resolution runs against a single inventory snapshot and is the only
//! stage whose errors are fatal for the whole command: if any explicit
//! identifier is invalid the user's intended scope cannot be trusted, so
//! no partial target set is ever acted upon.

use crate::core::domain::{
    error::ResolveError,
    model::{
        inventory::{GuestResource, InventorySnapshot},
        target::{ResolvedTarget, ResourceKind, TargetQuery, TargetSpec},
    },
};

/// Expands a [`TargetSpec`] into an ordered set of unique targets.
pub struct TargetResolver<'a> {
    inventory: &'a InventorySnapshot,
}

impl<'a> TargetResolver<'a> {
    /// Creates a resolver over one inventory snapshot.
    pub fn new(inventory: &'a InventorySnapshot) -> Self {
        Self { inventory }
    }

    /// Resolves the spec into concrete targets.
    ///
    /// Explicit lists deduplicate while preserving first-seen order. Tag
    /// filters keep the snapshot's listing order. An empty interactive
    /// selection fails with [`ResolveError::EmptySelection`].
    pub fn resolve(&self, spec: &TargetSpec) -> Result<Vec<ResolvedTarget>, ResolveError> {
        match spec {
            TargetSpec::Ids(queries) => self.resolve_queries(queries),
            TargetSpec::List(raw) => {
                let queries = parse_id_list(raw)?;
                self.resolve_queries(&queries)
            }
            TargetSpec::Tag(tag) => {
                let targets: Vec<ResolvedTarget> = self
                    .inventory
                    .guests_with_tag(tag)
                    .map(|(kind, guest)| guest_target(kind, guest))
                    .collect();
                if targets.is_empty() {
                    return Err(ResolveError::UnknownTarget(format!("tag:{}", tag)));
                }
                Ok(targets)
            }
            TargetSpec::Selection(queries) => {
                if queries.is_empty() {
                    return Err(ResolveError::EmptySelection);
                }
                self.resolve_queries(queries)
            }
        }
    }

    fn resolve_queries(
        &self,
        queries: &[TargetQuery],
    ) -> Result<Vec<ResolvedTarget>, ResolveError> {
        let mut targets: Vec<ResolvedTarget> = Vec::with_capacity(queries.len());
        for query in queries {
            let target = self.resolve_one(query)?;
            // Dedup on identity, first occurrence wins.
            if !targets.iter().any(|t| {
                t.kind == target.kind && t.id == target.id && t.node == target.node
            }) {
                targets.push(target);
            }
        }
        Ok(targets)
    }

    fn resolve_one(&self, query: &TargetQuery) -> Result<ResolvedTarget, ResolveError> {
        let vmid: u32 = query
            .id
            .parse()
            .map_err(|_| ResolveError::InvalidId(query.id.clone()))?;

        let mut matches = self.inventory.guests_by_vmid(vmid);
        if let Some(kind) = query.kind {
            matches.retain(|(k, _)| *k == kind);
        }

        match matches.as_slice() {
            [] => Err(ResolveError::UnknownTarget(query.id.clone())),
            [(kind, guest)] => Ok(guest_target(*kind, guest)),
            _ => Err(ResolveError::AmbiguousTarget(query.id.clone())),
        }
    }
}

/// Parses a comma-separated ID string (e.g. `"100,101,vm:102"`).
///
/// Empty elements are skipped; a list with no valid elements is an error.
pub fn parse_id_list(raw: &str) -> Result<Vec<TargetQuery>, ResolveError> {
    let mut queries = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        queries.push(TargetQuery::parse(part)?);
    }
    if queries.is_empty() {
        return Err(ResolveError::InvalidId(raw.to_string()));
    }
    Ok(queries)
}

fn guest_target(kind: ResourceKind, guest: &GuestResource) -> ResolvedTarget {
    ResolvedTarget {
        kind,
        id: guest.vmid.to_string(),
        node: guest.node.clone(),
        name: guest.name.clone().unwrap_or_default(),
    }
}
