use crate::{Export, IndexerRegistry, PluginModule, PluginSource, RegistryError, Result};
use crate::INDEXER_CLASS_MARKER;
use media_indexer::IndexerType;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

/// Scan `source` and build a registry of every exported indexer type.
///
/// Candidates are visited in name order. Hidden candidates (names not
/// starting with an ASCII letter or digit) are never loaded. The first load
/// failure, invalid export or duplicate type name aborts the scan; no partial
/// registry is ever returned.
pub fn discover(source: &dyn PluginSource) -> Result<IndexerRegistry> {
    log::debug!("Searching for indexer plugins in {}", source.location());

    let mut candidates = source.candidates()?;
    candidates.sort();
    candidates.dedup();

    let mut types: BTreeMap<String, IndexerType> = BTreeMap::new();
    let mut owners: BTreeMap<&'static str, String> = BTreeMap::new();

    for candidate in &candidates {
        if !is_candidate_name(candidate) {
            log::debug!("Skipping hidden candidate: {candidate}");
            continue;
        }

        log::debug!("Attempting load of: {candidate}");
        let module = source.load(candidate)?;

        for kind in exported_types(candidate, &module)? {
            match owners.entry(kind.name()) {
                Entry::Occupied(owner) => {
                    return Err(RegistryError::export(
                        candidate,
                        format!(
                            "indexer type {} is already registered by `{}`",
                            kind.name(),
                            owner.get()
                        ),
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(candidate.clone());
                }
            }
            types.insert(kind.name().to_string(), kind);
        }
    }

    log::debug!(
        "Discovered {} indexer type(s): {:?}",
        types.len(),
        types.keys().collect::<Vec<_>>()
    );
    Ok(IndexerRegistry::from_types(types))
}

/// Names starting with anything but an ASCII letter or digit are hidden.
fn is_candidate_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
}

/// Indexer types exported by `module`, in declaration order.
fn exported_types(candidate: &str, module: &PluginModule) -> Result<Vec<IndexerType>> {
    if let Some(marker) = module.symbol(INDEXER_CLASS_MARKER) {
        return match marker {
            Export::Indexer(kind) => {
                log::debug!(
                    "[{candidate}] Loaded type via {INDEXER_CLASS_MARKER}: {}",
                    kind.name()
                );
                Ok(vec![*kind])
            }
            Export::List(items) => {
                let mut kinds = items
                    .iter()
                    .map(|item| match item {
                        Export::Indexer(kind) => Ok(*kind),
                        other => Err(RegistryError::export(
                            candidate,
                            format!("{INDEXER_CLASS_MARKER} lists {other}, not an indexer type"),
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;

                // Repeats inside one list name the same type; keep the first.
                let mut seen = BTreeSet::new();
                kinds.retain(|kind| seen.insert(kind.name()));
                if kinds.len() != items.len() {
                    log::debug!(
                        "[{candidate}] {INDEXER_CLASS_MARKER} repeats a type; ignoring repeats"
                    );
                }
                if kinds.is_empty() {
                    log::warn!("[{candidate}] {INDEXER_CLASS_MARKER} is empty; no types exported");
                } else {
                    log::debug!(
                        "[{candidate}] Loaded list of types via {INDEXER_CLASS_MARKER}: {:?}",
                        kinds.iter().map(IndexerType::name).collect::<Vec<_>>()
                    );
                }
                Ok(kinds)
            }
            Export::Opaque(what) => Err(RegistryError::export(
                candidate,
                format!("{INDEXER_CLASS_MARKER} variable not set to a valid value ({what})"),
            )),
        };
    }

    match module.symbol(candidate) {
        Some(Export::Indexer(kind)) => {
            log::debug!("[{candidate}] Loaded type by module name: {}", kind.name());
            Ok(vec![*kind])
        }
        Some(other) => Err(RegistryError::export(
            candidate,
            format!("symbol `{candidate}` is {other}, not an indexer type"),
        )),
        None => Err(RegistryError::export(
            candidate,
            format!("exports neither {INDEXER_CLASS_MARKER} nor a symbol named `{candidate}`"),
        )),
    }
}
