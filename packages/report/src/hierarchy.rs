//! Two-level category tree (top category to sub-category counts).

use std::collections::HashMap;

use incident_report_models::{Category, CategoryNode, IncidentSummary, SubCategoryCount};

/// Counts incidents per category id. Incidents without a category are
/// skipped.
#[must_use]
pub fn count_by_category<'a>(
    incidents: impl IntoIterator<Item = &'a IncidentSummary>,
) -> HashMap<i64, u64> {
    let mut counts = HashMap::new();
    for category in incidents.into_iter().filter_map(|i| i.category) {
        *counts.entry(category).or_insert(0) += 1;
    }
    counts
}

/// Builds the category tree over the whole `taxonomy`, zero-filling
/// sub-categories nothing matched.
///
/// Consecutive taxonomy entries sharing a top category form one node, so a
/// top category that reappears later in taxonomy order starts a second node.
#[must_use]
pub fn build_category_tree<'a>(
    taxonomy: &[Category],
    incidents: impl IntoIterator<Item = &'a IncidentSummary>,
) -> Vec<CategoryNode> {
    let counts = count_by_category(incidents);
    let mut nodes: Vec<CategoryNode> = Vec::new();

    for category in taxonomy {
        let sub_category = SubCategoryCount {
            name: category.sn_sub_category.clone(),
            count: counts.get(&category.id).copied().unwrap_or(0),
        };

        match nodes.last_mut() {
            Some(node) if node.top_category == category.top_category => {
                node.sub_categories.push(sub_category);
            }
            _ => nodes.push(CategoryNode {
                top_category: category.top_category.clone(),
                category_name_sinhala: category.sn_top_category.clone(),
                category_name_tamil: category.tm_top_category.clone(),
                sub_categories: vec![sub_category],
            }),
        }
    }

    nodes
}

#[cfg(test)]
mod tests {
    use incident_report_store::fixtures::category;

    use super::*;
    use crate::test_support::ts;

    fn incident(id: &str, category: Option<i64>) -> IncidentSummary {
        IncidentSummary {
            id: id.to_string(),
            category,
            district: None,
            severity: None,
            current_status: None,
            incident_type: None,
            created_by: None,
            created_date: ts("2020-04-20 10:00:00"),
        }
    }

    fn shape(nodes: &[CategoryNode]) -> Vec<(&str, Vec<(&str, u64)>)> {
        nodes
            .iter()
            .map(|node| {
                (
                    node.top_category.as_str(),
                    node.sub_categories
                        .iter()
                        .map(|s| (s.name.as_str(), s.count))
                        .collect(),
                )
            })
            .collect()
    }

    #[test]
    fn groups_and_zero_fills_in_taxonomy_order() {
        let taxonomy = vec![
            category(1, "TopA", "Sub1"),
            category(2, "TopA", "Sub2"),
            category(3, "TopB", "Sub3"),
        ];
        let incidents = vec![
            incident("a", Some(1)),
            incident("b", Some(1)),
            incident("c", Some(3)),
            incident("d", None),
        ];

        let tree = build_category_tree(&taxonomy, &incidents);

        assert_eq!(
            shape(&tree),
            vec![
                ("TopA", vec![("Sub1", 2), ("Sub2", 0)]),
                ("TopB", vec![("Sub3", 1)]),
            ]
        );
        assert_eq!(tree[0].total(), 2);
    }

    #[test]
    fn non_contiguous_top_category_yields_duplicate_nodes() {
        let taxonomy = vec![
            category(1, "TopA", "Sub1"),
            category(2, "TopB", "Sub2"),
            category(3, "TopA", "Sub3"),
        ];

        let tree = build_category_tree(&taxonomy, &[incident("a", Some(3))]);

        assert_eq!(
            shape(&tree),
            vec![
                ("TopA", vec![("Sub1", 0)]),
                ("TopB", vec![("Sub2", 0)]),
                ("TopA", vec![("Sub3", 1)]),
            ]
        );
    }

    #[test]
    fn empty_taxonomy_yields_empty_tree() {
        assert!(build_category_tree(&[], &[incident("a", Some(1))]).is_empty());
    }

    #[test]
    fn uses_localized_names() {
        let mut assault = category(1, "Violence", "Assault");
        assault.sn_top_category = "ප්‍රචණ්ඩත්වය".to_string();
        assault.tm_top_category = "வன்முறை".to_string();
        assault.sn_sub_category = "පහරදීම".to_string();

        let tree = build_category_tree(&[assault], &[] as &[IncidentSummary]);

        assert_eq!(tree[0].category_name_sinhala, "ප්‍රචණ්ඩත්වය");
        assert_eq!(tree[0].category_name_tamil, "வன்முறை");
        assert_eq!(tree[0].sub_categories[0].name, "පහරදීම");
    }
}
