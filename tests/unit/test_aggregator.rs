//! Unit tests for the technical-detail aggregator

use diagram_api::aggregator::{
    AggregateError, DetailItem, DiagramData, MatchPolicy, Node, PayloadItem, TechnicalDetails,
    TechnicalStats, extract_connections, extract_nodes, has_technical_details,
    matches_technical_detail, nodes_with_technical_details, technical_items_count,
    technical_stats,
};
use serde_json::{Value, json};

fn data(value: Value) -> DiagramData {
    DiagramData::from_value(&value).expect("valid diagram document")
}

fn sample() -> DiagramData {
    data(json!({
        "nodes": [
            {
                "id": "calc",
                "label": "Calculate overtime",
                "details": {
                    "variables": [{"name": "total_ot"}, {"name": "rate"}],
                    "parameters": [{"name": "employee_id"}],
                    "payloads": [
                        {"direction": "incoming", "schema": "Timesheet"},
                        {"direction": "outgoing"}
                    ]
                }
            },
            {"id": 2, "label": "Start", "details": {}},
            {"id": "notify", "details": {"arguments": [{"name": "channel"}]}}
        ],
        "connections": [{"from": "calc", "to": "notify"}],
        "viewport": {"zoom": 1.5}
    }))
}

#[test]
fn test_scenario_a_counts_variables() {
    let d = data(json!({
        "nodes": [
            {"details": {"variables": [{"name": "x"}]}},
            {"details": {}}
        ]
    }));

    assert_eq!(
        technical_stats(&d),
        TechnicalStats {
            total_nodes: 2,
            nodes_with_details: 1,
            total_variables: 1,
            ..TechnicalStats::default()
        }
    );
}

#[test]
fn test_scenario_b_payload_directions() {
    let d = data(json!({
        "nodes": [{"details": {"payloads": [
            {"direction": "incoming"},
            {"direction": "outgoing"},
            {"direction": "sideways"}
        ]}}]
    }));

    let stats = technical_stats(&d);
    assert_eq!(stats.total_payloads, 3);
    assert_eq!(stats.incoming_payloads, 1);
    assert_eq!(stats.outgoing_payloads, 1);
}

#[test]
fn test_scenario_c_missing_nodes() {
    let d = data(json!({"connections": []}));

    assert!(extract_nodes(&d).is_empty());
    assert!(nodes_with_technical_details(&d).is_empty());
    assert_eq!(technical_items_count(&d), 0);
    assert_eq!(technical_stats(&d).total_nodes, 0);
}

#[test]
fn test_null_collections_are_empty() {
    let d = data(json!({"nodes": null, "connections": null}));
    assert!(extract_nodes(&d).is_empty());
    assert!(extract_connections(&d).is_empty());

    let d = data(json!({"nodes": [{"details": null}, {"details": {"variables": null}}]}));
    assert_eq!(technical_stats(&d).nodes_with_details, 0);
    assert_eq!(technical_items_count(&d), 0);
}

#[test]
fn test_sample_document_stats() {
    let d = sample();
    let stats = technical_stats(&d);

    assert_eq!(stats.total_nodes, 3);
    assert_eq!(stats.nodes_with_details, 2);
    assert_eq!(stats.total_variables, 2);
    assert_eq!(stats.total_parameters, 1);
    assert_eq!(stats.total_arguments, 1);
    assert_eq!(stats.total_payloads, 2);
    assert_eq!(technical_items_count(&d), 6);
    assert_eq!(extract_connections(&d).len(), 1);
}

#[test]
fn test_nodes_with_details_preserves_order() {
    let d = sample();
    let ids: Vec<String> = nodes_with_technical_details(&d)
        .iter()
        .filter_map(|node| node.id.as_ref().map(|id| id.to_string()))
        .collect();
    assert_eq!(ids, vec!["calc".to_string(), "notify".to_string()]);
}

#[test]
fn test_has_details_agrees_with_single_node_count() {
    let nodes = vec![
        Node::new("a", "A"),
        Node::new("b", "B").with_details(TechnicalDetails::default()),
        Node::new("c", "C").with_details(TechnicalDetails {
            payloads: Some(vec![PayloadItem::with_direction("incoming")].into()),
            ..TechnicalDetails::default()
        }),
        Node::new("d", "D").with_details(TechnicalDetails {
            arguments: Some(vec![DetailItem::named("x")].into()),
            ..TechnicalDetails::default()
        }),
    ];

    for node in nodes {
        let single = DiagramData::with_nodes(vec![node.clone()]);
        assert_eq!(has_technical_details(&node), technical_items_count(&single) > 0);
    }
}

#[test]
fn test_nodes_with_details_matches_stats() {
    let d = sample();
    assert_eq!(
        technical_stats(&d).nodes_with_details,
        nodes_with_technical_details(&d).len()
    );
}

#[test]
fn test_payload_totals_bound_directions() {
    let d = data(json!({
        "nodes": [{"details": {"payloads": [
            {"direction": "incoming"},
            {"direction": "INCOMING"},
            {"direction": 7},
            {}
        ]}}]
    }));
    let stats = technical_stats(&d);
    assert!(stats.total_payloads > stats.incoming_payloads + stats.outgoing_payloads);

    let d = sample();
    let stats = technical_stats(&d);
    assert_eq!(stats.total_payloads, stats.incoming_payloads + stats.outgoing_payloads);
}

#[test]
fn test_operations_are_idempotent() {
    let d = sample();
    assert_eq!(technical_stats(&d), technical_stats(&d));
    assert_eq!(technical_items_count(&d), technical_items_count(&d));
    assert_eq!(nodes_with_technical_details(&d), nodes_with_technical_details(&d));
}

#[test]
fn test_unknown_keys_survive_round_trip() {
    let original = json!({
        "nodes": [{"id": "n1", "position": {"x": 10, "y": 20}, "details": {"notes": "keep me"}}],
        "viewport": {"zoom": 2}
    });
    assert_eq!(serde_json::to_value(data(original.clone())).unwrap(), original);
}

#[test]
fn test_malformed_documents() {
    for bad in [
        json!({"nodes": "not a list"}),
        json!({"connections": {"from": "a"}}),
        json!([1, 2, 3]),
        json!(null),
    ] {
        assert!(matches!(
            DiagramData::from_value(&bad),
            Err(AggregateError::MalformedDocument(_))
        ));
    }
}

#[test]
fn test_odd_node_shapes_are_counted_not_rejected() {
    let d = data(json!({
        "nodes": [
            {"id": true, "label": 5, "details": []},
            {"details": {"variables": ["total", {"name": "rate"}]}},
            {"details": {"variables": "x", "payloads": [{"direction": "outgoing"}]}},
            42
        ]
    }));

    assert_eq!(
        technical_stats(&d),
        TechnicalStats {
            total_nodes: 4,
            nodes_with_details: 2,
            total_variables: 2,
            total_payloads: 1,
            outgoing_payloads: 1,
            ..TechnicalStats::default()
        }
    );
    assert_eq!(technical_items_count(&d), 3);
    assert!(!matches_technical_detail(&d, "total", MatchPolicy::CaseInsensitive));
    assert!(matches_technical_detail(&d, "rate", MatchPolicy::CaseInsensitive));
}

#[test]
fn test_odd_node_shapes_survive_round_trip() {
    let original = json!({
        "nodes": [{"id": true, "label": 5, "details": []}, 42, {"details": {"variables": "x"}}],
        "connections": ["a->b"]
    });
    assert_eq!(serde_json::to_value(data(original.clone())).unwrap(), original);
}
