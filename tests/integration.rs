use nodegeo_engine::Engine;
use nodegeo_engine::blocks::BlockKind;
use nodegeo_engine::blocks::boolean::BooleanBlock;
use nodegeo_engine::blocks::collection::CollectionBlock;
use nodegeo_engine::blocks::convert::{self, VectorConverterBlock};
use nodegeo_engine::blocks::input::{ContextualSource, InputBlock};
use nodegeo_engine::blocks::instantiate::{
    self, InstantiateLinearBlock, InstantiateOnVerticesBlock, InstantiateOnVolumeBlock,
};
use nodegeo_engine::blocks::output::OutputBlock;
use nodegeo_engine::blocks::sources::{self, BoxBlock};
use nodegeo_engine::geom::{BooleanOperation, VertexData};
use nodegeo_engine::graph::Graph;
use nodegeo_engine::graph::block::{Block, BlockId};
use nodegeo_engine::graph::value::Value;
use nodegeo_engine::graph::wire::Wire;

#[test]
fn eager_blocks_cache_their_build_value() {
    let mut graph = Graph::new();
    let source = graph
        .add_block(Block::new(BlockKind::Source(sources::BlockKind::Box(
            BoxBlock {
                evaluate_context: false,
            },
        ))))
        .unwrap();
    let sink = graph.add_block(output_block()).unwrap();
    graph
        .add_wire(Wire::new(source, "output", sink, "geometry"))
        .unwrap();

    let mut engine = engine_with(graph, 0);
    engine.build().expect("build slaagt");

    engine
        .graph_mut()
        .unwrap()
        .block_mut(source)
        .unwrap()
        .set_default("width", Value::Float(3.0))
        .unwrap();

    // De mutatie komt na de build; het gecachte blok blijft bij zijn waarde.
    let Value::Geometry(data) = engine.pull(source, "output").expect("pull slaagt") else {
        panic!("geometrie verwacht");
    };
    let size = data.bounding_box().expect("bbox").size();
    assert!((size.x - 1.0).abs() < 1e-9);
}

#[test]
fn lazy_blocks_observe_upstream_mutation() {
    let mut graph = Graph::new();
    let source = graph.add_block(box_block()).unwrap();
    let sink = graph.add_block(output_block()).unwrap();
    graph
        .add_wire(Wire::new(source, "output", sink, "geometry"))
        .unwrap();

    let mut engine = engine_with(graph, 0);
    engine.build().expect("build slaagt");

    engine
        .graph_mut()
        .unwrap()
        .block_mut(source)
        .unwrap()
        .set_default("width", Value::Float(3.0))
        .unwrap();

    let Value::Geometry(data) = engine.pull(source, "output").expect("pull slaagt") else {
        panic!("geometrie verwacht");
    };
    let size = data.bounding_box().expect("bbox").size();
    assert!((size.x - 3.0).abs() < 1e-9);
}

#[test]
fn linear_instantiation_places_copies_along_direction() {
    let mut graph = Graph::new();
    let source = graph.add_block(box_block()).unwrap();
    let mut linear = Block::new(BlockKind::Instantiate(instantiate::BlockKind::Linear(
        InstantiateLinearBlock::default(),
    )));
    linear.set_default("count", Value::Int(3)).unwrap();
    let linear = graph.add_block(linear).unwrap();
    let sink = graph.add_block(output_block()).unwrap();
    graph
        .add_wire(Wire::new(source, "output", linear, "instance"))
        .unwrap();
    graph
        .add_wire(Wire::new(linear, "output", sink, "geometry"))
        .unwrap();

    let mut engine = engine_with(graph, 0);
    engine.build().expect("build slaagt");

    let data = engine.vertex_data().unwrap().expect("geometrie aanwezig");
    assert_eq!(data.vertex_count(), 3 * 24);

    // Kopieën op x = 0, 1 en 2; de eenheidskubus steekt er een halve uit.
    let bbox = data.bounding_box().expect("bbox");
    assert!((bbox.min.x + 0.5).abs() < 1e-9);
    assert!((bbox.max.x - 2.5).abs() < 1e-9);
    assert!((bbox.min.y + 0.5).abs() < 1e-9);
    assert!((bbox.max.y - 0.5).abs() < 1e-9);
}

#[test]
fn on_vertices_dedup_uses_original_vertex_indices() {
    // Twee unieke posities, waarvan de tweede pas op index 2 verschijnt.
    let tri = VertexData::new(
        vec![[5.0, 0.0, 0.0], [5.0, 0.0, 0.0], [9.0, 0.0, 0.0]],
        vec![0, 1, 2],
    );

    let mut graph = Graph::new();
    let geometry = graph
        .add_block(Block::new(BlockKind::Input(InputBlock::literal(
            Value::Geometry(tri),
        ))))
        .unwrap();
    let instance = graph.add_block(box_block()).unwrap();
    let vertex_id = graph
        .add_block(Block::new(BlockKind::Input(InputBlock::contextual(
            ContextualSource::VertexId,
        ))))
        .unwrap();
    let converter = graph
        .add_block(Block::new(BlockKind::Convert(convert::BlockKind::Vector(
            VectorConverterBlock::default(),
        ))))
        .unwrap();
    let scatter = graph
        .add_block(Block::new(BlockKind::Instantiate(
            instantiate::BlockKind::OnVertices(InstantiateOnVerticesBlock::default()),
        )))
        .unwrap();
    let sink = graph.add_block(output_block()).unwrap();

    graph
        .add_wire(Wire::new(geometry, "output", scatter, "geometry"))
        .unwrap();
    graph
        .add_wire(Wire::new(instance, "output", scatter, "instance"))
        .unwrap();
    graph
        .add_wire(Wire::new(vertex_id, "output", converter, "x"))
        .unwrap();
    graph
        .add_wire(Wire::new(converter, "xyz", scatter, "offset"))
        .unwrap();
    graph
        .add_wire(Wire::new(scatter, "output", sink, "geometry"))
        .unwrap();

    let mut engine = engine_with(graph, 0);
    engine.build().expect("build slaagt");

    let data = engine.vertex_data().unwrap().expect("geometrie aanwezig");
    // Eén instantie per unieke positie; de offset uit de context draagt de
    // oorspronkelijke vertex-index (0 en 2), niet de index na het wellen.
    assert_eq!(data.vertex_count(), 2 * 24);
    let bbox = data.bounding_box().expect("bbox");
    assert!((bbox.min.x - 4.5).abs() < 1e-9);
    assert!((bbox.max.x - 11.5).abs() < 1e-9);
}

#[test]
fn on_volume_samples_stay_inside_the_source() {
    let mut engine = engine_with(volume_graph(), 11);
    engine.build().expect("build slaagt");

    let data = engine.vertex_data().unwrap().expect("geometrie aanwezig");
    assert_eq!(data.vertex_count(), 8 * 24);

    // Monsterpunten liggen in de broncel; de mini-instantie steekt er
    // hooguit een halve schaalstap uit.
    for position in &data.positions {
        for component in position {
            assert!(
                component.abs() <= 0.5 + 0.006,
                "positie buiten de bron: {position:?}"
            );
        }
    }
}

#[test]
fn on_volume_placement_is_reproducible_per_seed() {
    let mut first = engine_with(volume_graph(), 5);
    let mut second = engine_with(volume_graph(), 5);
    let mut other = engine_with(volume_graph(), 6);
    first.build().expect("build slaagt");
    second.build().expect("build slaagt");
    other.build().expect("build slaagt");

    let base = built_positions(&first);
    assert_eq!(base, built_positions(&second));
    assert_ne!(base, built_positions(&other));
}

#[test]
fn union_of_identical_boxes_keeps_the_extent() {
    let (graph, _) = boolean_graph(BooleanOperation::Union);
    let mut engine = engine_with(graph, 0);
    engine.build().expect("build slaagt");

    let data = engine.vertex_data().unwrap().expect("geometrie aanwezig");
    assert!(data.triangle_count() > 0);

    let bbox = data.bounding_box().expect("bbox");
    for (low, high) in [
        (bbox.min.x, bbox.max.x),
        (bbox.min.y, bbox.max.y),
        (bbox.min.z, bbox.max.z),
    ] {
        assert!((low + 0.5).abs() < 1e-6);
        assert!((high - 0.5).abs() < 1e-6);
    }
}

#[test]
fn subtracting_a_shape_from_itself_leaves_nothing() {
    let (graph, boolean) = boolean_graph(BooleanOperation::Subtract);
    let mut engine = engine_with(graph, 0);
    engine.build().expect("build slaagt");

    assert!(engine.vertex_data().unwrap().is_none());
    assert_eq!(
        engine.pull(boolean, "output").expect("pull slaagt"),
        Value::Null
    );
}

#[test]
fn serialized_graph_rebuilds_identically() {
    let mut graph = Graph::new();
    let mut source = box_block().named("basis");
    source
        .set_default("size", Value::Vector3([2.0, 1.0, 1.0]))
        .unwrap();
    let source = graph.add_block(source).unwrap();
    let mut linear = Block::new(BlockKind::Instantiate(instantiate::BlockKind::Linear(
        InstantiateLinearBlock::default(),
    )));
    linear.set_default("count", Value::Int(2)).unwrap();
    let linear = graph.add_block(linear).unwrap();
    let sink = graph.add_block(output_block()).unwrap();
    graph
        .add_wire(Wire::new(source, "output", linear, "instance"))
        .unwrap();
    graph
        .add_wire(Wire::new(linear, "output", sink, "geometry"))
        .unwrap();

    let mut first = engine_with(graph, 3);
    first.build().expect("build slaagt");
    let json = first.to_json().expect("schrijven slaagt");

    let mut second = Engine::new();
    second.set_seed(3);
    second.load_json(&json).expect("laden slaagt");
    second.build().expect("build slaagt");

    let original = first.graph().unwrap();
    let reloaded = second.graph().unwrap();
    assert_eq!(original.block_count(), reloaded.block_count());
    for (a, b) in original.blocks().iter().zip(reloaded.blocks()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.name, b.name);
        assert_eq!(a.kind(), b.kind());
        assert_eq!(a.inputs(), b.inputs());
    }
    assert_eq!(original.wires(), reloaded.wires());
    assert_eq!(built_positions(&first), built_positions(&second));
}

#[test]
fn collection_chooses_one_connected_member_per_seed() {
    for seed in 0..6 {
        let (graph, collection) = collection_graph();
        let mut engine = engine_with(graph, seed);
        engine.build().expect("build slaagt");

        let Value::Geometry(chosen) = engine.pull(collection, "output").expect("pull slaagt")
        else {
            panic!("geometrie verwacht");
        };

        // Altijd een van de drie gevulde slots, getagd met zijn slot-id.
        let slot = chosen.metadata.collection_id.expect("slot-id aanwezig");
        let expected_size = match slot {
            1 => 1.0,
            4 => 2.0,
            7 => 3.0,
            other => panic!("onverwacht slot {other}"),
        };
        let size = chosen.bounding_box().expect("bbox").size().x;
        assert!((size - expected_size).abs() < 1e-9);

        let data = engine.vertex_data().unwrap().expect("geometrie aanwezig");
        let delivered = data.bounding_box().expect("bbox").size().x;
        assert!((delivered - expected_size).abs() < 1e-9);

        // Zelfde seed, zelfde keuze.
        let (replay_graph, replay_collection) = collection_graph();
        let mut replay = engine_with(replay_graph, seed);
        replay.build().expect("build slaagt");
        let Value::Geometry(repeat) = replay
            .pull(replay_collection, "output")
            .expect("pull slaagt")
        else {
            panic!("geometrie verwacht");
        };
        assert_eq!(repeat.metadata.collection_id, Some(slot));
    }
}

fn box_block() -> Block {
    Block::new(BlockKind::Source(sources::BlockKind::Box(
        BoxBlock::default(),
    )))
}

fn output_block() -> Block {
    Block::new(BlockKind::Output(OutputBlock::default()))
}

fn engine_with(graph: Graph, seed: u64) -> Engine {
    let mut engine = Engine::new();
    engine.set_graph(graph);
    engine.set_seed(seed);
    engine
}

fn built_positions(engine: &Engine) -> Vec<[f64; 3]> {
    engine
        .vertex_data()
        .unwrap()
        .expect("geometrie aanwezig")
        .positions
        .clone()
}

/// Eén kubus die zowel bron als instantie is; acht mini-kopieën binnenin.
fn volume_graph() -> Graph {
    let mut graph = Graph::new();
    let source = graph.add_block(box_block()).unwrap();
    let mut scatter = Block::new(BlockKind::Instantiate(instantiate::BlockKind::OnVolume(
        InstantiateOnVolumeBlock::default(),
    )));
    scatter.set_default("count", Value::Int(8)).unwrap();
    scatter
        .set_default("scaling", Value::Vector3([0.01, 0.01, 0.01]))
        .unwrap();
    let scatter = graph.add_block(scatter).unwrap();
    let sink = graph.add_block(output_block()).unwrap();
    graph
        .add_wire(Wire::new(source, "output", scatter, "geometry"))
        .unwrap();
    graph
        .add_wire(Wire::new(source, "output", scatter, "instance"))
        .unwrap();
    graph
        .add_wire(Wire::new(scatter, "output", sink, "geometry"))
        .unwrap();
    graph
}

fn boolean_graph(operation: BooleanOperation) -> (Graph, BlockId) {
    let mut graph = Graph::new();
    let source = graph.add_block(box_block()).unwrap();
    let boolean = graph
        .add_block(Block::new(BlockKind::Boolean(BooleanBlock {
            operation,
            evaluate_context: true,
        })))
        .unwrap();
    let sink = graph.add_block(output_block()).unwrap();
    graph
        .add_wire(Wire::new(source, "output", boolean, "geometry0"))
        .unwrap();
    graph
        .add_wire(Wire::new(source, "output", boolean, "geometry1"))
        .unwrap();
    graph
        .add_wire(Wire::new(boolean, "output", sink, "geometry"))
        .unwrap();
    (graph, boolean)
}

/// Drie gevulde slots van de tien, elk met een herkenbare maat.
fn collection_graph() -> (Graph, BlockId) {
    let mut graph = Graph::new();
    let mut members = Vec::new();
    for (size, pin) in [(1.0, "geometry1"), (2.0, "geometry4"), (3.0, "geometry7")] {
        let mut block = box_block();
        block
            .set_default("size", Value::Vector3([size, size, size]))
            .unwrap();
        members.push((graph.add_block(block).unwrap(), pin));
    }
    let collection = graph
        .add_block(Block::new(BlockKind::Collection(CollectionBlock {
            evaluate_context: false,
        })))
        .unwrap();
    let sink = graph.add_block(output_block()).unwrap();
    for (id, pin) in members {
        graph
            .add_wire(Wire::new(id, "output", collection, pin))
            .unwrap();
    }
    graph
        .add_wire(Wire::new(collection, "output", sink, "geometry"))
        .unwrap();
    (graph, collection)
}
