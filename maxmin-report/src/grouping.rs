use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Electrically coincident feeders: double-circuit line pairs and the ICT bank.
///
/// Names are the registry names used on the max/min sheets.
pub static FEEDER_GROUPS: &[&[&str]] = &[
    &["400KV MAHESHWARAM-1", "400KV MAHESHWARAM-2"],
    &["400KV NARSAPUR-1", "400KV NARSAPUR-2"],
    &["400KV KETHIREDDYPALLY-1", "400KV KETHIREDDYPALLY-2"],
    &["400KV NIZAMABAD-1", "400KV NIZAMABAD-2"],
    &["220KV PARIGI-1", "220KV PARIGI-2"],
    &["220KV GACHIBOWLI-1", "220KV GACHIBOWLI-2"],
    &["220KV YEDDUMAILARAM-1", "220KV YEDDUMAILARAM-2"],
    &["220KV SADASIVAPET-1", "220KV SADASIVAPET-2"],
    &[
        "ICT-1 (315MVA)",
        "ICT-2 (315MVA)",
        "ICT-3 (315MVA)",
        "ICT-4 (500MVA)",
    ],
];

fn key(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

static GROUP_INDEX: Lazy<HashMap<String, &'static [&'static str]>> = Lazy::new(|| {
    FEEDER_GROUPS
        .iter()
        .flat_map(|group| group.iter().map(move |name| (key(name), *group)))
        .collect()
});

/// Full member list of the group `name` belongs to, itself included.
pub fn group_of(name: &str) -> Option<&'static [&'static str]> {
    GROUP_INDEX.get(&key(name)).copied()
}

pub fn is_grouped(name: &str) -> bool {
    group_of(name).is_some()
}

/// The other members of `name`'s group; empty when it is not grouped.
pub fn partners_of(name: &str) -> Vec<&'static str> {
    let own = key(name);
    group_of(name)
        .map(|members| {
            members
                .iter()
                .copied()
                .filter(|member| key(member) != own)
                .collect()
        })
        .unwrap_or_default()
}
