use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::schema::Schema;

/// Summary of FK graph structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Report for FK dependency ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphReport {
    pub summary: FkGraphSummary,
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Build a deterministic FK dependency report for a schema.
///
/// Referenced tables come before the tables that reference them. Keys that
/// point at their own table do not constrain the order. Keys that point at a
/// table missing from the schema still add that table as a node.
pub fn build_fk_graph_report(schema: &Schema) -> FkGraphReport {
    let graph = build_adjacency(schema);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();
    let summary = FkGraphSummary { nodes, edges };

    match toposort(&graph) {
        Ok(order) => FkGraphReport {
            summary,
            topo_order: Some(order),
            cycle: None,
        },
        Err(cycle) => FkGraphReport {
            summary,
            topo_order: None,
            cycle: Some(cycle),
        },
    }
}

fn build_adjacency(schema: &Schema) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for table in schema.tables() {
        graph.entry(table.name().to_string()).or_default();

        for fk in table.foreign_keys() {
            if fk.is_self_referencing() {
                continue;
            }
            graph
                .entry(fk.foreign_table.clone())
                .or_default()
                .insert(table.name().to_string());
        }
    }

    graph
}

/// Order tables so every table follows the tables it references.
///
/// Tables are peeled off once nothing they reference is left; ties go to the
/// smallest name. If some tables never free up, the error lists the ones that
/// sit on a cycle, leaving out tables that only hang off one.
fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, Vec<String>> {
    let mut pending: BTreeMap<&str, usize> =
        graph.keys().map(|node| (node.as_str(), 0)).collect();
    for dependents in graph.values() {
        for dependent in dependents {
            *pending.entry(dependent.as_str()).or_default() += 1;
        }
    }

    let mut ready: BTreeSet<&str> = pending
        .iter()
        .filter(|(_, waiting_on)| **waiting_on == 0)
        .map(|(node, _)| *node)
        .collect();
    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        pending.remove(node);
        for dependent in dependents_of(graph, node) {
            if let Some(waiting_on) = pending.get_mut(dependent) {
                *waiting_on -= 1;
                if *waiting_on == 0 {
                    ready.insert(dependent);
                }
            }
        }
        order.push(node.to_string());
    }

    if pending.is_empty() {
        return Ok(order);
    }

    let stuck: BTreeSet<&str> = pending.into_keys().collect();
    Err(stuck
        .iter()
        .filter(|node| reaches_itself(graph, &stuck, node))
        .map(|node| node.to_string())
        .collect())
}

/// Whether a walk from `start` through `within` leads back to `start`.
fn reaches_itself(
    graph: &BTreeMap<String, BTreeSet<String>>,
    within: &BTreeSet<&str>,
    start: &str,
) -> bool {
    let mut seen = BTreeSet::new();
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        for next in dependents_of(graph, node) {
            if next == start {
                return true;
            }
            if within.contains(next) && seen.insert(next) {
                stack.push(next);
            }
        }
    }
    false
}

fn dependents_of<'g>(
    graph: &'g BTreeMap<String, BTreeSet<String>>,
    node: &str,
) -> impl Iterator<Item = &'g str> {
    graph
        .get(node)
        .into_iter()
        .flat_map(|dependents| dependents.iter().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ForeignKeyOptions;
    use crate::types::ColumnType;

    fn link(schema: &mut Schema, name: &str, from: &str, to: &str) {
        let table = schema.table_mut(from).expect("local table");
        if !table.has_column("ref_id") {
            table
                .add_column("ref_id", ColumnType::integer())
                .expect("ref column");
        }
        table
            .add_foreign_key(
                name,
                vec!["ref_id".to_string()],
                to,
                vec!["id".to_string()],
                ForeignKeyOptions::default(),
            )
            .expect("foreign key");
    }

    fn schema_with(tables: &[&str]) -> Schema {
        let mut schema = Schema::new();
        for name in tables {
            let table = schema.create_table(name).expect("table");
            table.add_column("id", ColumnType::integer()).expect("id");
            table.set_primary_key(&["id"]).expect("pk");
        }
        schema
    }

    #[test]
    fn toposort_orders_dependencies() {
        let mut schema = schema_with(&["orders", "users"]);
        link(&mut schema, "fk_orders_user", "orders", "users");

        let report = build_fk_graph_report(&schema);
        assert_eq!(report.summary.nodes, 2);
        assert_eq!(report.summary.edges, 1);
        let order = report.topo_order.expect("expected toposort");
        let users_idx = order.iter().position(|item| item == "users").unwrap();
        let orders_idx = order.iter().position(|item| item == "orders").unwrap();
        assert!(users_idx < orders_idx);
    }

    #[test]
    fn self_reference_does_not_block_order() {
        let mut schema = schema_with(&["employees"]);
        link(&mut schema, "fk_manager", "employees", "employees");

        let report = build_fk_graph_report(&schema);
        assert_eq!(report.topo_order, Some(vec!["employees".to_string()]));
        assert_eq!(report.summary.edges, 0);
    }

    #[test]
    fn toposort_reports_cycle() {
        let mut schema = schema_with(&["a", "b", "c"]);
        link(&mut schema, "fk_a_b", "a", "b");
        link(&mut schema, "fk_b_a", "b", "a");
        link(&mut schema, "fk_c_a", "c", "a");

        let report = build_fk_graph_report(&schema);
        assert!(report.topo_order.is_none());
        assert_eq!(
            report.cycle,
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn cycle_excludes_tables_between_cycles() {
        let mut schema = schema_with(&["a", "b", "bridge", "x", "y", "root"]);
        link(&mut schema, "fk_a_b", "a", "b");
        link(&mut schema, "fk_b_a", "b", "a");
        link(&mut schema, "fk_bridge_a", "bridge", "a");
        link(&mut schema, "fk_x_bridge", "x", "bridge");
        link(&mut schema, "fk_x_y", "x", "y");
        link(&mut schema, "fk_y_x", "y", "x");
        link(&mut schema, "fk_b_root", "b", "root");

        let report = build_fk_graph_report(&schema);
        assert_eq!(
            report.cycle,
            Some(vec![
                "a".to_string(),
                "b".to_string(),
                "x".to_string(),
                "y".to_string()
            ])
        );
    }
}
