//! Grouping of series names into subplot rows.

/// Prefix of a series name: text before the first `/`, else before the
/// first `_`, else the whole name.
pub fn guess_prefix(name: &str) -> &str {
    ['/', '_']
        .iter()
        .find_map(|sep| name.split_once(*sep).map(|(prefix, _)| prefix))
        .unwrap_or(name)
}

/// One subplot row: a key and the series drawn in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatGroup {
    /// Prefix, `""` when fully flattened, or the series name when not consolidating.
    pub key: String,
    /// Sorted, deduplicated member names.
    pub names: Vec<String>,
}

/// Ordered subplot rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidatedStats {
    /// Groups in first-appearance order.
    pub groups: Vec<StatGroup>,
}

impl ConsolidatedStats {
    /// Group `names` at the given consolidation `level`, skipping `x_axis`.
    ///
    /// Level 0 keys every name by itself, level 1 groups by [`guess_prefix`],
    /// level 2 and above put everything under `""`.
    pub fn build(names: impl IntoIterator<Item = String>, level: u8, x_axis: &str) -> Self {
        let mut groups: Vec<StatGroup> = Vec::new();
        for name in names.into_iter().filter(|n| n != x_axis) {
            let key = match level {
                0 => name.clone(),
                1 => guess_prefix(&name).to_owned(),
                _ => String::new(),
            };
            match groups.iter_mut().find(|g| g.key == key) {
                Some(group) => group.names.push(name),
                None => groups.push(StatGroup {
                    key,
                    names: vec![name],
                }),
            }
        }
        for group in &mut groups {
            group.names.sort();
            group.names.dedup();
        }
        Self { groups }
    }

    /// Number of groups (subplot rows).
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate over the groups in order.
    pub fn iter(&self) -> std::slice::Iter<'_, StatGroup> {
        self.groups.iter()
    }
}
