//! Ordered document groups for homogeneity tests.
//!
//! Groups arrive as a JSON object `{groupName: [docId, ...]}`. Column order of the
//! prepared table follows the object's key order, so the map is decoded into a
//! `Vec` instead of a sorted map.

use crate::EntityRef;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct DocGroup {
    pub name: String,
    pub documents: Vec<EntityRef>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocGroups(pub Vec<DocGroup>);

impl DocGroups {
    pub fn iter(&self) -> impl Iterator<Item = &DocGroup> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|g| g.name.clone()).collect()
    }
}

impl FromIterator<(String, Vec<EntityRef>)> for DocGroups {
    fn from_iter<I: IntoIterator<Item = (String, Vec<EntityRef>)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, documents)| DocGroup { name, documents })
                .collect(),
        )
    }
}

impl Serialize for DocGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for group in &self.0 {
            map.serialize_entry(&group.name, &group.documents)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DocGroups {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = DocGroups;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping group names to document id lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut groups = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, documents)) =
                    access.next_entry::<String, Vec<EntityRef>>()?
                {
                    groups.push(DocGroup { name, documents });
                }
                Ok(DocGroups(groups))
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keeps_declaration_order() {
        let groups: DocGroups =
            serde_json::from_str(r#"{"Zeta": ["d1"], "Alpha": ["d2", "d3"]}"#).expect("groups");
        assert_eq!(groups.names(), vec!["Zeta".to_string(), "Alpha".to_string()]);
        assert_eq!(groups.0[1].documents.len(), 2);
    }

    #[test]
    fn serializes_back_to_an_object() {
        let groups: DocGroups = [("X".to_string(), vec![EntityRef::from("d1")])]
            .into_iter()
            .collect();
        let raw = serde_json::to_string(&groups).expect("json");
        assert_eq!(raw, r#"{"X":["d1"]}"#);
    }

    #[test]
    fn rejects_non_object_groups() {
        assert!(serde_json::from_str::<DocGroups>(r#"["d1"]"#).is_err());
    }
}
