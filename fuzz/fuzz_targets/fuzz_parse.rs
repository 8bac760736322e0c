#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    for line in input.lines() {
        if let Ok(record) = rg_parser::parse_record(line) {
            // A parsed record prints back to something that parses the same.
            let reparsed = rg_parser::parse_record(&record.to_string());
            assert_eq!(reparsed.as_ref(), Ok(&record));
        }
    }
    if let Ok(records) = rg_parser::load_records(input) {
        let last_line = input.lines().count().max(1);
        for record in &records {
            assert!((1..=last_line).contains(&record.line));
        }
    }
});
