use posmap::{Bias, Consumer, IterOrder, ParseError};
use serde_json::json;

// two sections, one generated line each, offset at line 1 (0-based)
fn indexed_map() -> Vec<u8> {
    json!({
        "version": 3,
        "file": "min.js",
        "sections": [
            {
                "offset": {"line": 0, "column": 0},
                "map": {
                    "version": 3,
                    "sources": ["one.js"],
                    "sourcesContent": [" ONE.foo = function (bar) {\n   return baz(bar);\n };"],
                    "names": ["bar", "baz"],
                    "mappings": "CAAC,IAAI,IAAM,SAAUA,GAClB,OAAOC,IAAID",
                    "file": "min.js",
                    "sourceRoot": "/the/root"
                }
            },
            {
                "offset": {"line": 1, "column": 0},
                "map": {
                    "version": 3,
                    "sources": ["two.js"],
                    "sourcesContent": [" TWO.inc = function (n) {\n   return n + 1;\n };"],
                    "names": ["n"],
                    "mappings": "CAAC,IAAI,IAAM,SAAUA,GAClB,OAAOA",
                    "file": "min.js",
                    "sourceRoot": "/the/root"
                }
            }
        ]
    })
    .to_string()
    .into_bytes()
}

#[test]
fn test_original_position_across_sections() {
    let consumer = Consumer::from_json(indexed_map()).unwrap();

    let position = consumer
        .original_position_for(1, 1, Bias::default())
        .unwrap()
        .unwrap();
    assert_eq!(position.source, "/the/root/one.js");
    assert_eq!((position.line, position.column), (1, 1));

    // line 2 lands in the second section, queried with local line 1
    let position = consumer
        .original_position_for(2, 1, Bias::default())
        .unwrap()
        .unwrap();
    assert_eq!(position.source, "/the/root/two.js");
    assert_eq!((position.line, position.column), (1, 1));

    let position = consumer
        .original_position_for(2, 18, Bias::default())
        .unwrap()
        .unwrap();
    assert_eq!(position.name.as_deref(), Some("n"));

    // before any section content
    assert_eq!(
        consumer.original_position_for(1, 0, Bias::default()).unwrap(),
        None
    );
}

#[test]
fn test_generated_position_across_sections() {
    let consumer = Consumer::from_json(indexed_map()).unwrap();

    let position = consumer
        .generated_position_for("/the/root/two.js", 1, 1, Bias::default())
        .unwrap()
        .unwrap();
    assert_eq!((position.line, position.column), (2, 1));

    let position = consumer
        .generated_position_for("/the/root/one.js", 2, 10, Bias::default())
        .unwrap()
        .unwrap();
    assert_eq!((position.line, position.column), (1, 28));

    assert_eq!(
        consumer
            .generated_position_for("three.js", 1, 1, Bias::default())
            .unwrap(),
        None
    );
}

#[test]
fn test_column_offset_shifts_first_line_only() {
    let consumer = Consumer::from_json(
        json!({
            "version": 3,
            "sections": [{
                "offset": {"line": 2, "column": 4},
                "map": {
                    "version": 3,
                    "sources": ["x.js"],
                    "names": [],
                    // (1,0) -> x.js 1:0 and (2,0) -> x.js 2:0
                    "mappings": "AAAA;AACA"
                }
            }]
        })
        .to_string()
        .into_bytes(),
    )
    .unwrap();

    // the section's first line is shifted by the column offset
    let position = consumer
        .original_position_for(3, 4, Bias::default())
        .unwrap()
        .unwrap();
    assert_eq!((position.line, position.column), (1, 0));
    // later lines are not
    let position = consumer
        .original_position_for(4, 0, Bias::default())
        .unwrap()
        .unwrap();
    assert_eq!((position.line, position.column), (2, 0));

    let forward = consumer
        .generated_position_for("x.js", 1, 0, Bias::default())
        .unwrap()
        .unwrap();
    assert_eq!((forward.line, forward.column), (3, 4));
}

#[test]
fn test_merged_iteration_and_all_generated_positions() {
    let consumer = Consumer::from_json(indexed_map()).unwrap();

    let mappings: Vec<_> = consumer.mappings(IterOrder::Generated).unwrap().collect();
    assert_eq!(mappings.len(), 13);
    assert_eq!(mappings[0].generated.line, 1);
    assert_eq!(mappings[12].generated.line, 2);

    let positions = consumer
        .all_generated_positions_for("/the/root/two.js", 1, None)
        .unwrap();
    let positions: Vec<(u32, u32)> = positions.iter().map(|p| (p.line, p.column)).collect();
    assert_eq!(positions, vec![(2, 1), (2, 5), (2, 9), (2, 18)]);
}

#[test]
fn test_source_contents_across_sections() {
    let consumer = Consumer::from_json(indexed_map()).unwrap();
    assert!(consumer.has_contents_of_all_sources());
    assert_eq!(
        consumer
            .source_content_for("/the/root/two.js", false)
            .unwrap(),
        Some(" TWO.inc = function (n) {\n   return n + 1;\n };")
    );
    assert!(consumer.source_content_for("nope.js", false).is_err());
}

#[test]
fn test_section_validation() {
    let unordered = json!({
        "version": 3,
        "sections": [
            {"offset": {"line": 2, "column": 0},
             "map": {"version": 3, "sources": [], "names": [], "mappings": ""}},
            {"offset": {"line": 1, "column": 0},
             "map": {"version": 3, "sources": [], "names": [], "mappings": ""}}
        ]
    });
    assert!(matches!(
        Consumer::from_json(unordered.to_string().into_bytes()),
        Err(ParseError::SectionsUnordered)
    ));

    let with_url = json!({
        "version": 3,
        "sections": [{"offset": {"line": 0, "column": 0}, "url": "map.json"}]
    });
    assert!(matches!(
        Consumer::from_json(with_url.to_string().into_bytes()),
        Err(ParseError::SectionUrlUnsupported)
    ));

    let missing_map = json!({
        "version": 3,
        "sections": [{"offset": {"line": 0, "column": 0}}]
    });
    assert!(matches!(
        Consumer::from_json(missing_map.to_string().into_bytes()),
        Err(ParseError::SectionMissingMap)
    ));
}
