//! Registry of the normalization passes

use std::collections::BTreeMap;

use super::coerce::CoercePass;
use super::compact::CompactPass;
use super::gather::GatherPass;
use super::ids::IdsPass;
use super::maneuvers::{ManeuverPolicy, ManeuversPass};
use super::order::{OrderPass, FIELD_ORDERS};
use super::references::{ReferencesPass, RefreshIdsPass};
use super::rename::RenamePass;
use super::Pass;
use crate::config::Config;
use crate::store::RecordStore;

/// A registered pass and the passes that must run before it
#[derive(Debug, Clone)]
pub struct PassInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub depends_on: &'static [&'static str],
    /// Only runs when asked for explicitly
    pub opt_in: bool,
}

/// Every pass, in default run order
pub static ALL_PASSES: &[PassInfo] = &[
    PassInfo {
        name: "ids",
        description: "Assign ids to records that have none",
        depends_on: &[],
        opt_in: false,
    },
    PassInfo {
        name: "rename",
        description: "Rename legacy fields (faction, size, ship)",
        depends_on: &[],
        opt_in: false,
    },
    PassInfo {
        name: "coerce",
        description: "Fix scalar types of range, attack and energy",
        depends_on: &[],
        opt_in: false,
    },
    PassInfo {
        name: "maneuvers",
        description: "Shape maneuver tables per ship size",
        depends_on: &[],
        opt_in: false,
    },
    PassInfo {
        name: "references",
        description: "Resolve cross-collection references",
        depends_on: &["ids", "rename"],
        opt_in: false,
    },
    PassInfo {
        name: "refresh-ids",
        description: "Re-point resolved references by name after renumbering",
        depends_on: &["references"],
        opt_in: true,
    },
    PassInfo {
        name: "fill-gaps",
        description: "Ask for missing slots and dates",
        depends_on: &["ids"],
        opt_in: false,
    },
    PassInfo {
        name: "order",
        description: "Put fields in canonical order",
        depends_on: &["references"],
        opt_in: true,
    },
    PassInfo {
        name: "compact",
        description: "Write collections in the same-line layout",
        depends_on: &["maneuvers", "references"],
        opt_in: false,
    },
];

pub fn get_pass(name: &str) -> Option<&'static PassInfo> {
    ALL_PASSES.iter().find(|p| p.name == name)
}

pub fn pass_names() -> Vec<&'static str> {
    ALL_PASSES.iter().map(|p| p.name).collect()
}

/// What a pass needs to be built
pub struct PassContext<'a> {
    pub config: &'a Config,
    pub store: &'a RecordStore,
    /// Collection -> name -> reserved id
    pub reserved_ids: BTreeMap<String, BTreeMap<String, i64>>,
}

/// Build the passes for a registry entry. `ids` expands to one pass per
/// id collection.
pub fn build_pass(info: &PassInfo, ctx: &PassContext<'_>) -> Vec<Box<dyn Pass>> {
    match info.name {
        "ids" => ctx
            .config
            .id_collections
            .iter()
            .map(|collection| {
                let reserved = ctx.reserved_ids.get(collection).cloned().unwrap_or_default();
                Box::new(IdsPass::new(collection.clone(), reserved)) as Box<dyn Pass>
            })
            .collect(),
        "rename" => vec![Box::new(RenamePass::standard())],
        "coerce" => vec![Box::new(CoercePass::standard())],
        "maneuvers" => vec![Box::new(ManeuversPass::new(ManeuverPolicy::standard(
            &ctx.config.maneuvers,
        )))],
        "references" => vec![Box::new(ReferencesPass::standard())],
        "refresh-ids" => vec![Box::new(RefreshIdsPass::standard())],
        "fill-gaps" => vec![Box::new(GatherPass::standard(ctx.config.prompt.max_attempts))],
        "order" => {
            let orders = FIELD_ORDERS
                .iter()
                .filter(|o| ctx.store.exists(o.collection))
                .collect();
            vec![Box::new(OrderPass::new(orders))]
        }
        "compact" => vec![Box::new(CompactPass::standard())],
        _ => Vec::new(),
    }
}
