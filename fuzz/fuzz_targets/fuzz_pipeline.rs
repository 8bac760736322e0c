#![no_main]

use libfuzzer_sys::fuzz_target;
use rg_core::RenderOptions;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(parsed) = rg_parser::parse_source(input) {
        let graph = &parsed.graph;
        for edge in graph.edges() {
            assert!(graph.contains(&edge.source));
            assert!(graph.contains(&edge.target));
        }
        let options = RenderOptions::default();
        let _ = rg_render_text::render_dot(graph, &options, "fuzz");
        let _ = rg_render_text::render_listing(graph, &options);
        let _ = rg_render_text::render_json(graph, &options, false);
    }
});
