use posmap::{Generator, MappingRecord, Position};

/// Builds an encoded map with a predictable mapping density, so benches
/// need no checked-in data files.
pub fn synthetic_map(lines: u32, segments_per_line: u32, sources: u32) -> Vec<u8> {
    let mut generator = Generator::new().with_file("big.js");
    for line in 1..=lines {
        for segment in 0..segments_per_line {
            let source = format!("src/module_{}.ts", (line + segment) % sources);
            let name = (segment % 5 == 0).then(|| format!("name_{}", segment % 64));
            let record = MappingRecord::new(
                Position::new(line, segment * 7),
                Position::new((line % 500) + 1, segment * 3),
                source,
                name,
            );
            generator.add_mapping(record).unwrap();
        }
    }
    generator.to_vec().unwrap()
}
