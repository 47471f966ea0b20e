#![allow(clippy::expect_used)]

use rankscope::application::services::topology::load_topology;
use rankscope::domain::topology::{
    Application, GlobalRank, GroupId, MembershipId, TopologySnapshot, TopologyType,
};

fn fixture_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Adds `count` instances starting at `first_rank` to a new group.
fn group_of(
    app: &mut Application,
    name: &str,
    first_rank: GlobalRank,
    count: u32,
) -> (GroupId, Vec<MembershipId>) {
    let program = app.add_program("worker");
    let group = app.add_group(name);
    let members = (0..count)
        .map(|local| {
            let instance = app
                .add_instance(program, first_rank + local)
                .expect("instance");
            app.add_membership(group, local, instance)
                .expect("membership")
        })
        .collect();
    (group, members)
}

// ---------------------------------------------------------------------------
// Loading descriptions
// ---------------------------------------------------------------------------

#[test]
fn wordcount_description_builds_the_graph() {
    let app = load_topology(&fixture_path("wordcount.toml")).expect("load");
    assert_eq!(app.name(), "wordcount");

    let names: Vec<&str> = app.catalog().programs().map(|p| p.name()).collect();
    assert_eq!(names, vec!["mapper", "reducer"]);

    let rank2 = app.resolve_program_instance(2).expect("rank 2");
    let reducer = app.program(rank2.program()).expect("program");
    assert_eq!(reducer.name(), "reducer");

    let node = app.node_by_host("10.0.0.1").expect("node");
    assert_eq!(node.instances().count(), 2);
    assert_eq!(app.deployment().nodes().count(), 2);
}

#[test]
fn wordcount_shuffle_routes_every_mapper_to_the_reducer() {
    let app = load_topology(&fixture_path("wordcount.toml")).expect("load");
    let shuffle = app.connection_by_name("shuffle").expect("connection");
    assert_eq!(shuffle.topology(), TopologyType::AllToOne);

    let mappers = app.group_by_name("mappers").expect("mappers").members().to_vec();
    let reducers = app.group_by_name("reducers").expect("reducers").members().to_vec();
    assert_eq!(mappers.len(), 2);

    for mapper in &mappers {
        assert_eq!(app.receivers_of(shuffle.id(), *mapper), reducers);
    }
    assert_eq!(app.senders_of(shuffle.id(), reducers[0]), mappers);
}

#[test]
fn json_and_toml_descriptions_agree() {
    let toml_app = load_topology(&fixture_path("wordcount.toml")).expect("toml");
    let text = std::fs::read_to_string(fixture_path("wordcount.toml")).expect("read");
    let description: toml::Value = toml::from_str(&text).expect("parse");

    let dir = tempfile::tempdir().expect("tempdir");
    let json_path = dir.path().join("wordcount.json");
    std::fs::write(&json_path, serde_json::to_string(&description).expect("json"))
        .expect("write");
    let json_app = load_topology(&json_path).expect("json");

    let a = TopologySnapshot::from(&toml_app);
    let b = TopologySnapshot::from(&json_app);
    assert_eq!(a.programs.len(), b.programs.len());
    assert_eq!(a.groups.len(), b.groups.len());
    assert_eq!(a.connections.len(), b.connections.len());
}

#[test]
fn missing_description_is_an_error() {
    assert!(load_topology(&fixture_path("nope.toml")).is_err());
}

// ---------------------------------------------------------------------------
// Building by hand
// ---------------------------------------------------------------------------

#[test]
fn symmetric_routing_pairs_by_local_rank() {
    let mut app = Application::new("pipeline");
    let (senders_group, senders) = group_of(&mut app, "stage1", 0, 3);
    let (receivers_group, receivers) = group_of(&mut app, "stage2", 10, 2);
    let conn = app
        .add_connection("pipe", senders_group, receivers_group, TopologyType::Symmetric)
        .expect("connection");

    assert_eq!(app.receivers_of(conn, senders[0]), vec![receivers[0]]);
    assert_eq!(app.receivers_of(conn, senders[1]), vec![receivers[1]]);
    assert!(app.receivers_of(conn, senders[2]).is_empty());
    assert_eq!(app.senders_of(conn, receivers[1]), vec![senders[1]]);
}

#[test]
fn one_to_all_and_all_to_all() {
    let mut app = Application::new("broadcast");
    let (root, roots) = group_of(&mut app, "root", 0, 2);
    let (leaves, leaf_members) = group_of(&mut app, "leaves", 10, 3);
    let scatter = app
        .add_connection("scatter", root, leaves, TopologyType::OneToAll)
        .expect("scatter");
    let mesh = app
        .add_connection("mesh", root, leaves, TopologyType::AllToAll)
        .expect("mesh");

    assert_eq!(app.receivers_of(scatter, roots[1]), leaf_members);
    assert_eq!(app.senders_of(scatter, leaf_members[2]), vec![roots[0]]);
    assert_eq!(app.senders_of(mesh, leaf_members[0]), roots);
}

#[test]
fn routing_from_a_non_member_is_empty() {
    let mut app = Application::new("app");
    let (a, a_members) = group_of(&mut app, "a", 0, 1);
    let (b, b_members) = group_of(&mut app, "b", 10, 1);
    let conn = app
        .add_connection("ab", a, b, TopologyType::AllToAll)
        .expect("connection");
    assert!(app.receivers_of(conn, b_members[0]).is_empty());
    assert_eq!(app.receivers_of(conn, a_members[0]), b_members);
}

#[test]
fn entities_are_deduplicated_by_key() {
    let mut app = Application::new("app");
    let first = app.add_node("10.0.0.1");
    assert_eq!(app.add_node("10.0.0.1"), first);
    assert_ne!(app.add_node("10.0.0.2"), first);

    let program = app.add_program("p");
    let instance = app.add_instance(program, 4).expect("instance");
    assert_eq!(app.add_instance(program, 4), Some(instance));

    let group = app.add_group("g");
    assert_eq!(app.add_group("g"), group);
    let conn = app
        .add_connection("c", group, group, TopologyType::AllToAll)
        .expect("connection");
    assert_eq!(
        app.add_connection("c", group, group, TopologyType::Symmetric),
        Some(conn)
    );
}

#[test]
fn entity_identities_are_stable() {
    let app = load_topology(&fixture_path("wordcount.toml")).expect("load");
    let first = TopologySnapshot::from(&app);
    let second = TopologySnapshot::from(&app);
    assert_eq!(first, second);
    assert_ne!(first.programs[0].id, first.programs[1].id);
}
