use posmap::{Bias, Consumer, Generator, MappingRecord, Position, SourceNode};
use serde_json::json;

fn consumer_for(generator: &mut Generator) -> Consumer {
    Consumer::from_json(generator.to_vec().unwrap()).unwrap()
}

#[test]
fn test_reconstruct_then_flatten_is_inverse() {
    // "a" on line 1 originates from x.ts 5:0, "b" is unmapped
    let mut generator = Generator::new();
    generator
        .add_mapping(MappingRecord::new(
            Position::new(1, 0),
            Position::new(5, 0),
            "x.ts",
            None,
        ))
        .unwrap();
    let consumer = consumer_for(&mut generator);

    let node = SourceNode::from_text_and_consumer("a\nb", &consumer, None).unwrap();
    assert_eq!(node.to_string(), "a\nb");

    let (code, mut rebuilt) = node.to_text_and_map(None).unwrap();
    assert_eq!(code, "a\nb");

    let rebuilt = consumer_for(&mut rebuilt);
    let position = rebuilt
        .original_position_for(1, 0, Bias::default())
        .unwrap()
        .unwrap();
    assert_eq!(position.source, "x.ts");
    assert_eq!((position.line, position.column), (5, 0));
    // line 2 stays unmapped
    assert_eq!(
        rebuilt.original_position_for(2, 0, Bias::default()).unwrap(),
        None
    );
}

#[test]
fn test_reconstruct_splits_within_a_line() {
    let mut generator = Generator::new();
    generator
        .add_mapping(MappingRecord::new(
            Position::new(1, 0),
            Position::new(1, 0),
            "x.ts",
            None,
        ))
        .unwrap();
    generator
        .add_mapping(MappingRecord::new(
            Position::new(1, 1),
            Position::new(1, 0),
            "y.ts",
            Some("b".to_owned()),
        ))
        .unwrap();
    let consumer = consumer_for(&mut generator);

    let node = SourceNode::from_text_and_consumer("ab", &consumer, None).unwrap();
    assert_eq!(node.to_string(), "ab");

    let (_, mut rebuilt) = node.to_text_and_map(None).unwrap();
    let rebuilt = consumer_for(&mut rebuilt);
    let first = rebuilt
        .original_position_for(1, 0, Bias::default())
        .unwrap()
        .unwrap();
    assert_eq!(first.source, "x.ts");
    let second = rebuilt
        .original_position_for(1, 1, Bias::default())
        .unwrap()
        .unwrap();
    assert_eq!(second.source, "y.ts");
    assert_eq!(second.name.as_deref(), Some("b"));
}

#[test]
fn test_reconstruct_keeps_leading_and_trailing_text_untagged() {
    let mut generator = Generator::new();
    generator
        .add_mapping(MappingRecord::new(
            Position::new(2, 0),
            Position::new(1, 0),
            "x.ts",
            None,
        ))
        .unwrap();
    let consumer = consumer_for(&mut generator);

    let text = "// banner\nmapped\ntrailing\n";
    let node = SourceNode::from_text_and_consumer(text, &consumer, None).unwrap();
    assert_eq!(node.to_string(), text);

    let (code, mut rebuilt) = node.to_text_and_map(None).unwrap();
    assert_eq!(code, text);
    let rebuilt = consumer_for(&mut rebuilt);
    assert_eq!(
        rebuilt.original_position_for(1, 0, Bias::default()).unwrap(),
        None
    );
    let position = rebuilt
        .original_position_for(2, 0, Bias::default())
        .unwrap()
        .unwrap();
    assert_eq!(position.source, "x.ts");
    assert_eq!(
        rebuilt.original_position_for(3, 0, Bias::default()).unwrap(),
        None
    );
}

#[test]
fn test_reconstruct_imports_source_contents() {
    let map = json!({
        "version": 3,
        "sources": ["x.ts"],
        "sourcesContent": ["original text"],
        "names": [],
        "mappings": "AAAA"
    })
    .to_string()
    .into_bytes();
    let consumer = Consumer::from_json(map).unwrap();

    let node = SourceNode::from_text_and_consumer("x", &consumer, None).unwrap();
    let (_, mut rebuilt) = node.to_text_and_map(None).unwrap();
    let rebuilt = consumer_for(&mut rebuilt);
    assert_eq!(
        rebuilt.source_content_for("x.ts", false).unwrap(),
        Some("original text")
    );
}

#[test]
fn test_relative_base_rewrites_sources() {
    let map = json!({
        "version": 3,
        "sources": ["x.ts"],
        "names": [],
        "mappings": "AAAA"
    })
    .to_string()
    .into_bytes();
    let consumer = Consumer::from_json(map).unwrap();

    let node = SourceNode::from_text_and_consumer("x", &consumer, Some("lib/sub")).unwrap();
    let (_, mut rebuilt) = node.to_text_and_map(None).unwrap();
    let rebuilt = consumer_for(&mut rebuilt);
    let position = rebuilt
        .original_position_for(1, 0, Bias::default())
        .unwrap()
        .unwrap();
    assert_eq!(position.source, "lib/sub/x.ts");
}

#[test]
fn test_flatten_tracks_lines_through_nested_nodes() {
    let mut root = SourceNode::new();
    root.add_text("head\n");
    let mut inner = SourceNode::tagged("x.ts", Position::new(3, 1), None);
    inner.add_text("body");
    let mut wrapper = SourceNode::new();
    wrapper.add_node(inner);
    wrapper.add_text(";\n");
    root.add_node(wrapper);

    let (code, mut generator) = root.to_text_and_map(Some("out.js")).unwrap();
    assert_eq!(code, "head\nbody;\n");

    let consumer = consumer_for(&mut generator);
    assert_eq!(consumer.file(), Some("out.js"));
    let position = consumer
        .original_position_for(2, 2, Bias::default())
        .unwrap()
        .unwrap();
    assert_eq!(position.source, "x.ts");
    assert_eq!((position.line, position.column), (3, 1));
    // the ";" after the tagged run is generated-only again
    assert_eq!(
        consumer
            .original_position_for(2, 4, Bias::default())
            .unwrap()
            .map(|p| p.source),
        None
    );
}
