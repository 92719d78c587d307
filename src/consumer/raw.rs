#[derive(Debug, simd_json_derive::Deserialize)]
#[simd_json(rename_all = "camelCase")]
pub(crate) struct RawSourceMap<'a> {
    pub version: Option<u32>,
    pub file: Option<&'a str>,
    pub sources: Option<Vec<Option<&'a str>>>,
    pub source_root: Option<&'a str>,
    pub sources_content: Option<Vec<Option<&'a str>>>,
    pub names: Option<Vec<&'a str>>,
    pub mappings: Option<&'a str>,
    pub sections: Option<Vec<RawSection<'a>>>,
}

#[derive(Debug, simd_json_derive::Deserialize)]
pub(crate) struct RawSection<'a> {
    pub offset: RawOffset,
    pub map: Option<RawSourceMap<'a>>,
    pub url: Option<&'a str>,
}

#[derive(Debug, simd_json_derive::Deserialize)]
pub(crate) struct RawOffset {
    pub line: u32,
    pub column: u32,
}
