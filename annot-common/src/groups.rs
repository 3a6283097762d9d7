//! Reviewer groups and sample partitioning

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::keys;
use crate::metadata::GroupMap;

/// Reviewer group id; only "1" and "2" exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupId {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
}

impl GroupId {
    pub const ALL: [GroupId; 2] = [GroupId::One, GroupId::Two];

    pub fn as_str(self) -> &'static str {
        match self {
            GroupId::One => "1",
            GroupId::Two => "2",
        }
    }

    /// Interpret a side-file or lock value: strings are trimmed, integers
    /// are taken by their decimal form, anything else is rejected
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.to_string().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(GroupId::One),
            "2" => Ok(GroupId::Two),
            other => Err(Error::Config(format!("Unknown group id: {:?}", other))),
        }
    }
}

/// Samples split per group, each list in scan order
#[derive(Debug, Clone, Default)]
pub struct GroupedSamples {
    one: Vec<String>,
    two: Vec<String>,
}

impl GroupedSamples {
    /// Partition by group map; samples with no matching entry are dropped
    pub fn partition(samples: &[String], group_map: &GroupMap) -> Self {
        let mut grouped = Self::default();
        let mut unmatched = 0usize;
        for sample in samples {
            match group_map.resolve(sample) {
                Some(group) => grouped.list_mut(*group).push(sample.clone()),
                None => unmatched += 1,
            }
        }
        if unmatched > 0 {
            tracing::info!("{} samples have no group and are excluded from review", unmatched);
        }
        grouped
    }

    /// Every sample in group "1" (used when no group side-file exists)
    pub fn single(samples: Vec<String>) -> Self {
        Self {
            one: samples,
            two: Vec::new(),
        }
    }

    pub fn samples(&self, group: GroupId) -> &[String] {
        match group {
            GroupId::One => &self.one,
            GroupId::Two => &self.two,
        }
    }

    /// Lookup by raw group string; unknown ids behave as an empty group
    pub fn samples_for(&self, group: &str) -> &[String] {
        group
            .parse::<GroupId>()
            .map(|g| self.samples(g))
            .unwrap_or_default()
    }

    /// Groups that contain at least one sample
    pub fn non_empty(&self) -> impl Iterator<Item = (GroupId, &[String])> + '_ {
        GroupId::ALL
            .into_iter()
            .map(|g| (g, self.samples(g)))
            .filter(|(_, samples)| !samples.is_empty())
    }

    fn list_mut(&mut self, group: GroupId) -> &mut Vec<String> {
        match group {
            GroupId::One => &mut self.one,
            GroupId::Two => &mut self.two,
        }
    }
}

/// Episode ids of a sample list
pub fn episode_ids(samples: &[String]) -> impl Iterator<Item = &str> {
    samples.iter().map(|s| keys::episode_id(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn samples(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_group_id_parse() {
        assert_eq!("1".parse::<GroupId>().unwrap(), GroupId::One);
        assert_eq!("2".parse::<GroupId>().unwrap(), GroupId::Two);
        assert!("3".parse::<GroupId>().is_err());
        assert!(" 1".parse::<GroupId>().is_err());
    }

    #[test]
    fn test_group_id_from_json() {
        assert_eq!(GroupId::from_json(&json!(" 1 ")), Some(GroupId::One));
        assert_eq!(GroupId::from_json(&json!(2)), Some(GroupId::Two));
        assert_eq!(GroupId::from_json(&json!(2.0)), None);
        assert_eq!(GroupId::from_json(&json!("3")), None);
        assert_eq!(GroupId::from_json(&json!(false)), None);
    }

    #[test]
    fn test_partition_preserves_order_and_excludes_unmatched() {
        let mut map = GroupMap::new();
        map.insert_expanded("d.png", GroupId::One);
        map.insert_expanded("a", GroupId::One);
        map.insert_expanded("x/b.png", GroupId::Two);

        let all = samples(&["a.png", "c.png", "d.png", "x/b.png", "y/b2.png"]);
        let grouped = GroupedSamples::partition(&all, &map);

        assert_eq!(grouped.samples(GroupId::One), &["a.png", "d.png"]);
        assert_eq!(grouped.samples(GroupId::Two), &["x/b.png"]);
    }

    #[test]
    fn test_partition_key_priority() {
        let mut map = GroupMap::new();
        map.insert_expanded("img", GroupId::Two);
        map.insert_expanded("cam/img.png", GroupId::One);

        let grouped = GroupedSamples::partition(&samples(&["cam/img.png"]), &map);
        assert_eq!(grouped.samples(GroupId::One), &["cam/img.png"]);
        assert!(grouped.samples(GroupId::Two).is_empty());
    }

    #[test]
    fn test_unknown_group_is_empty() {
        let grouped = GroupedSamples::single(samples(&["a.png"]));
        assert_eq!(grouped.samples_for("1"), &["a.png"]);
        assert!(grouped.samples_for("3").is_empty());
        assert!(grouped.samples_for("").is_empty());
    }

    #[test]
    fn test_non_empty_groups() {
        let grouped = GroupedSamples::single(samples(&["a.png"]));
        let ids: Vec<GroupId> = grouped.non_empty().map(|(g, _)| g).collect();
        assert_eq!(ids, vec![GroupId::One]);
    }
}
